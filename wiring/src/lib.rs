//! Application framework based on [wiring_di] dependency resolution.
//!
//! Traditional applications start in the `main()` function and often explicitly initialize and pass
//! around various domain/application services or other components. With dependency resolution in
//! place, `main()` becomes a composition root: it registers application components in containers,
//! binds configuration values and hands the root container over to an
//! [Application](application::Application). The application then configures supporting
//! infrastructure, e.g. logging, resolves the entry point [runner](runner::ApplicationRunner) and
//! runs it.

pub mod application;
pub mod config;
pub mod runner;
