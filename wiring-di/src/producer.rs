//! [Producer]s are the things registration records actually invoke to build instances: component
//! constructors, factory callables and pre-built values.

use crate::component::Component;
use crate::error::ProducerError;
use crate::instance::{Instance, InstancePtr, TypeKey};
use crate::signature::{Arguments, Signature};
use derivative::Derivative;
#[cfg(test)]
use mockall::automock;
use std::any::type_name;
use std::marker::PhantomData;

/// Something able to produce an instance given resolved arguments.
#[cfg_attr(test, automock)]
pub trait Producer {
    /// Human-readable producer name used in messages.
    fn description(&self) -> String;

    /// Type of produced instances, used for compatibility checks when binding. `None` disables the
    /// checks.
    fn exposed_type(&self) -> Option<TypeKey>;

    /// Parameters expected by [Producer::produce].
    fn signature(&self) -> &Signature;

    /// Creates a new instance.
    fn produce(&self, arguments: Arguments) -> Result<Instance, ProducerError>;

    /// A pre-built instance, available without resolution. Producers with a preset instance do not
    /// accept parameter configuration.
    fn preset(&self) -> Option<Instance> {
        None
    }
}

/// Produces instances of a [Component].
pub struct TypeBinding<C: Component> {
    signature: Signature,
    _component: PhantomData<fn() -> C>,
}

impl<C: Component> TypeBinding<C> {
    pub fn new() -> Self {
        Self {
            signature: C::signature(),
            _component: PhantomData,
        }
    }
}

impl<C: Component> Default for TypeBinding<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Component> Producer for TypeBinding<C> {
    fn description(&self) -> String {
        type_name::<C>().to_string()
    }

    fn exposed_type(&self) -> Option<TypeKey> {
        Some(TypeKey::of::<C>())
    }

    fn signature(&self) -> &Signature {
        &self.signature
    }

    fn produce(&self, arguments: Arguments) -> Result<Instance, ProducerError> {
        C::construct(arguments).map(Instance::new)
    }
}

/// Produces instances by calling a factory with a declared return type `T`.
#[derive(Derivative)]
#[derivative(Debug(bound = ""))]
pub struct CallableBinding<T: ?Sized, F> {
    signature: Signature,
    #[derivative(Debug = "ignore")]
    factory: F,
    _output: PhantomData<fn() -> InstancePtr<T>>,
}

impl<T, F> CallableBinding<T, F>
where
    T: ?Sized + 'static,
    F: Fn(Arguments) -> Result<InstancePtr<T>, ProducerError> + 'static,
{
    pub fn new(signature: Signature, factory: F) -> Self {
        Self {
            signature,
            factory,
            _output: PhantomData,
        }
    }
}

impl<T, F> Producer for CallableBinding<T, F>
where
    T: ?Sized + 'static,
    F: Fn(Arguments) -> Result<InstancePtr<T>, ProducerError> + 'static,
{
    fn description(&self) -> String {
        type_name::<F>().to_string()
    }

    fn exposed_type(&self) -> Option<TypeKey> {
        Some(TypeKey::of::<T>())
    }

    fn signature(&self) -> &Signature {
        &self.signature
    }

    fn produce(&self, arguments: Arguments) -> Result<Instance, ProducerError> {
        (self.factory)(arguments).map(Instance::from_ptr)
    }
}

/// Produces instances by calling a factory without a declared return type. Records using it skip
/// type compatibility checks when binding.
#[derive(Derivative)]
#[derivative(Debug(bound = ""))]
pub struct DynamicCallableBinding<F> {
    signature: Signature,
    #[derivative(Debug = "ignore")]
    factory: F,
}

impl<F> DynamicCallableBinding<F>
where
    F: Fn(Arguments) -> Result<Instance, ProducerError> + 'static,
{
    pub fn new(signature: Signature, factory: F) -> Self {
        Self { signature, factory }
    }
}

impl<F> Producer for DynamicCallableBinding<F>
where
    F: Fn(Arguments) -> Result<Instance, ProducerError> + 'static,
{
    fn description(&self) -> String {
        type_name::<F>().to_string()
    }

    fn exposed_type(&self) -> Option<TypeKey> {
        None
    }

    fn signature(&self) -> &Signature {
        &self.signature
    }

    fn produce(&self, arguments: Arguments) -> Result<Instance, ProducerError> {
        (self.factory)(arguments)
    }
}

/// Holds a pre-built value.
#[derive(Debug)]
pub struct ValueBinding {
    value: Instance,
    signature: Signature,
}

impl ValueBinding {
    pub fn new(value: Instance) -> Self {
        Self {
            value,
            signature: Signature::new(),
        }
    }
}

impl Producer for ValueBinding {
    fn description(&self) -> String {
        format!("value of {}", self.value.type_key())
    }

    fn exposed_type(&self) -> Option<TypeKey> {
        Some(self.value.type_key())
    }

    fn signature(&self) -> &Signature {
        &self.signature
    }

    fn produce(&self, _arguments: Arguments) -> Result<Instance, ProducerError> {
        Ok(self.value.clone())
    }

    fn preset(&self) -> Option<Instance> {
        Some(self.value.clone())
    }
}
