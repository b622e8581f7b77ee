//! One of the basic blocks of dependency resolution is a [Component]: a type which knows how to
//! construct itself from resolved [Arguments]. Components are registered with
//! [Container::register_type](crate::container::Container::register_type).
//!
//! ```
//! use wiring_di::component::Component;
//! use wiring_di::container::Container;
//! use wiring_di::error::ProducerError;
//! use wiring_di::instance::{Instance, InstancePtr};
//! use wiring_di::signature::{Arguments, Parameter, Signature};
//!
//! struct Database {
//!     url: InstancePtr<String>,
//!     pool_size: InstancePtr<u8>,
//! }
//!
//! impl Component for Database {
//!     fn signature() -> Signature {
//!         Signature::new()
//!             .param(Parameter::new("database_url").typed::<String>())
//!             .param(Parameter::new("pool_size").with_default(Instance::new(4_u8)))
//!     }
//!
//!     fn construct(arguments: Arguments) -> Result<Self, ProducerError> {
//!         Ok(Self {
//!             url: arguments.get("database_url")?,
//!             pool_size: arguments.get("pool_size")?,
//!         })
//!     }
//! }
//!
//! let container = Container::new("main");
//! container.register_value("localhost".to_string()).to_name("database_url").unwrap();
//! container.register_type::<Database>().to_type::<Database>().unwrap();
//!
//! let database = container.resolve_type::<Database>().unwrap();
//! assert_eq!(*database.url, "localhost");
//! assert_eq!(*database.pool_size, 4);
//! ```

use crate::error::ProducerError;
use crate::signature::{Arguments, Signature};

/// Base trait for constructible types.
///
/// The [Signature] describes constructor parameters, which get resolved by the container and
/// passed to [Component::construct].
pub trait Component: Sized + 'static {
    /// Describes the parameters [Component::construct] expects.
    fn signature() -> Signature;

    /// Creates an instance of this component from resolved arguments.
    fn construct(arguments: Arguments) -> Result<Self, ProducerError>;
}
