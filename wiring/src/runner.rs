//! Runners executing actual application logic.

#[cfg(test)]
use mockall::automock;
pub use wiring_di::error::ErrorPtr;

/// Runs application logic. The [Application](crate::application::Application) resolves a single
/// runner, bound to the name of the configured entry point, and runs it.
///
/// Runners are registered like any other dependency, most often as a callable depending on the
/// application services:
///
/// ```
/// use wiring::runner::{ApplicationRunner, ErrorPtr};
/// use wiring_di::container::Container;
/// use wiring_di::instance::InstancePtr;
/// use wiring_di::signature::{Parameter, Signature};
///
/// struct GreetingRunner {
///     greeting: InstancePtr<String>,
/// }
///
/// impl ApplicationRunner for GreetingRunner {
///     fn run(&self) -> Result<(), ErrorPtr> {
///         println!("{}", self.greeting);
///         Ok(())
///     }
/// }
///
/// let container = Container::new("main");
/// container.register_value("Hello world!".to_string()).to_name("greeting")?;
/// container
///     .register_callable(
///         Signature::new().param(Parameter::new("greeting")),
///         |arguments| {
///             Ok(InstancePtr::new(GreetingRunner {
///                 greeting: arguments.get("greeting")?,
///             }) as InstancePtr<dyn ApplicationRunner>)
///         },
///     )
///     .to_name("main")?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[cfg_attr(test, automock)]
pub trait ApplicationRunner {
    /// Runs any application code.
    fn run(&self) -> Result<(), ErrorPtr>;
}
