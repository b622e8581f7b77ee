//! Dependency resolution engine with type- and name-keyed bindings.
//!
//! Producers (components, factories and ready values) are registered in a
//! [Container](container::Container) and bound to [Key](instance::Key)s. Resolving a key recursively
//! resolves the parameters of its producer, inferring the source of every parameter from explicit
//! values, name bindings, declared types, parameter names and defaults.

pub mod component;
pub mod container;
pub mod error;
pub mod instance;
pub mod instantiation;
pub mod producer;
pub mod record;
pub mod registry;
mod resolution;
pub mod signature;
