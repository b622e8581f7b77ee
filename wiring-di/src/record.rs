//! Registration records define and configure the details of a single registration. A record is
//! created unbound by a [Container](crate::container::Container), configured fluently through a
//! [PendingRecord] and becomes queryable once bound to a [Key]:
//!
//! ```
//! use wiring_di::container::Container;
//! use wiring_di::instance::{Instance, InstancePtr};
//! use wiring_di::instantiation::Instantiation;
//! use wiring_di::record::{NameBindings, Params};
//! use wiring_di::signature::{Parameter, Signature};
//!
//! let container = Container::new("main");
//! let signature = Signature::new()
//!     .param(Parameter::new("greeting"))
//!     .param(Parameter::new("name"));
//!
//! container
//!     .register_callable(signature, |arguments| {
//!         let greeting = arguments.get::<String>("greeting")?;
//!         let name = arguments.get::<String>("name")?;
//!         Ok(InstancePtr::new(format!("{greeting}, {name}!")))
//!     })
//!     .with_instantiation(Instantiation::MultiInstance)?
//!     .with_params(Params::new().kwarg("greeting", "Hello".to_string()))?
//!     .with_name_bindings(NameBindings::new().kwarg("name", "user_name"))?
//!     .to_name("greeter")?;
//!
//! container.register_value("World".to_string()).to_name("user_name")?;
//!
//! assert_eq!(*container.resolve_name::<String>("greeter")?, "Hello, World!");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Records follow a simple state machine: `Unbound → Bound → Invalidated`. A record can be bound
//! to at most one key, and becomes invalidated when another record replaces it under that key.
//! Invalidated records reject every operation.

use crate::error::{RegistrationError, ResolutionError};
use crate::instance::{Instance, InstancePtr, Key, TypeKey};
use crate::instantiation::Instantiation;
use crate::producer::Producer;
use crate::registry::{AliasCast, RegistryPtr};
use crate::resolution;
use derivative::Derivative;
use fxhash::FxHashMap;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use tracing::{debug, error};

pub(crate) type RecordPtr = Rc<RefCell<RegistrationRecord>>;

/// Conversion of produced instances to the type a record is bound as.
#[derive(Clone)]
pub(crate) struct View {
    target: TypeKey,
    cast: AliasCast,
}

impl View {
    pub(crate) fn apply(&self, instance: &Instance) -> Result<Instance, ResolutionError> {
        (self.cast)(instance).ok_or(ResolutionError::IncompatibleInstance {
            expected: self.target,
            actual: instance.type_key(),
        })
    }
}

/// Explicitly given inputs for producer parameters, by position and by keyword.
#[derive(Clone, Debug)]
pub struct GivenArguments<T> {
    positional: Vec<T>,
    keyword: FxHashMap<String, T>,
}

impl<T> Default for GivenArguments<T> {
    fn default() -> Self {
        Self {
            positional: Vec::new(),
            keyword: Default::default(),
        }
    }
}

impl<T> GivenArguments<T> {
    /// Inputs in order of the corresponding parameters, starting from the first.
    #[inline]
    pub fn positional_inputs(&self) -> &[T] {
        &self.positional
    }

    /// Inputs by parameter name.
    #[inline]
    pub fn keyword_inputs(&self) -> &FxHashMap<String, T> {
        &self.keyword
    }

    /// Returns the input for a parameter at given position, or with given name.
    pub(crate) fn input_for(&self, index: Option<usize>, name: &str) -> Option<&T> {
        index
            .and_then(|index| self.positional.get(index))
            .or_else(|| self.keyword.get(name))
    }
}

/// Explicit parameter values, used as-is during resolution.
pub type Params = GivenArguments<Instance>;

/// Explicit parameter name bindings: keys to look up and resolve for given parameters.
pub type NameBindings = GivenArguments<Key>;

impl GivenArguments<Instance> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a positional value.
    pub fn arg<V: 'static>(self, value: V) -> Self {
        self.arg_instance(Instance::new(value))
    }

    /// Appends a positional value given as a pointer, e.g. to a `dyn Trait`.
    pub fn arg_ptr<V: ?Sized + 'static>(self, value: InstancePtr<V>) -> Self {
        self.arg_instance(Instance::from_ptr(value))
    }

    pub fn arg_instance(mut self, value: Instance) -> Self {
        self.positional.push(value);
        self
    }

    /// Sets a keyword value.
    pub fn kwarg<N: ToString, V: 'static>(self, name: N, value: V) -> Self {
        self.kwarg_instance(name, Instance::new(value))
    }

    /// Sets a keyword value given as a pointer, e.g. to a `dyn Trait`.
    pub fn kwarg_ptr<N: ToString, V: ?Sized + 'static>(self, name: N, value: InstancePtr<V>) -> Self {
        self.kwarg_instance(name, Instance::from_ptr(value))
    }

    pub fn kwarg_instance<N: ToString>(mut self, name: N, value: Instance) -> Self {
        self.keyword.insert(name.to_string(), value);
        self
    }
}

impl GivenArguments<Key> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a positional binding.
    pub fn arg<K: Into<Key>>(mut self, key: K) -> Self {
        self.positional.push(key.into());
        self
    }

    /// Sets a keyword binding.
    pub fn kwarg<N: ToString, K: Into<Key>>(mut self, name: N, key: K) -> Self {
        self.keyword.insert(name.to_string(), key.into());
        self
    }
}

/// State of a single registration.
#[derive(Derivative)]
#[derivative(Debug)]
pub(crate) struct RegistrationRecord {
    valid: bool,
    key: Option<Key>,
    instantiation: Instantiation,
    cached: Option<Instance>,
    params: Params,
    name_bindings: NameBindings,
    param_names_as_bindings: bool,
    #[derivative(Debug = "ignore")]
    registry: Weak<RefCell<crate::registry::Registry>>,
    #[derivative(Debug = "ignore")]
    producer: Rc<dyn Producer>,
    #[derivative(Debug = "ignore")]
    view: Option<View>,
}

impl RegistrationRecord {
    pub(crate) fn new(
        registry: &RegistryPtr,
        producer: Rc<dyn Producer>,
        instantiation: Instantiation,
        param_names_as_bindings: bool,
    ) -> Self {
        let cached = producer.preset();
        Self {
            valid: true,
            key: None,
            // preset values are always shared
            instantiation: if cached.is_some() {
                Instantiation::Singleton
            } else {
                instantiation
            },
            cached,
            params: Default::default(),
            name_bindings: Default::default(),
            param_names_as_bindings,
            registry: Rc::downgrade(registry),
            producer,
            view: None,
        }
    }

    pub(crate) fn check_validity(&self) -> Result<(), RegistrationError> {
        if self.valid {
            Ok(())
        } else {
            reject(RegistrationError::Invalidated)
        }
    }

    #[inline]
    pub(crate) fn is_valid(&self) -> bool {
        self.valid
    }

    #[inline]
    pub(crate) fn key(&self) -> Option<&Key> {
        self.key.as_ref()
    }

    #[inline]
    pub(crate) fn instantiation(&self) -> Instantiation {
        self.instantiation
    }

    #[inline]
    pub(crate) fn cached(&self) -> Option<&Instance> {
        self.cached.as_ref()
    }

    #[inline]
    pub(crate) fn cache_mut(&mut self) -> &mut Option<Instance> {
        &mut self.cached
    }

    #[inline]
    pub(crate) fn params(&self) -> &Params {
        &self.params
    }

    #[inline]
    pub(crate) fn name_bindings(&self) -> &NameBindings {
        &self.name_bindings
    }

    #[inline]
    pub(crate) fn param_names_as_bindings(&self) -> bool {
        self.param_names_as_bindings
    }

    #[inline]
    pub(crate) fn producer(&self) -> &Rc<dyn Producer> {
        &self.producer
    }

    #[inline]
    pub(crate) fn view(&self) -> Option<&View> {
        self.view.as_ref()
    }

    pub(crate) fn registry(&self) -> Option<RegistryPtr> {
        self.registry.upgrade()
    }

    fn check_configurable(&self, operation: &'static str) -> Result<(), RegistrationError> {
        self.check_validity()?;
        if self.producer.preset().is_some() {
            return reject(RegistrationError::UnsupportedOperation {
                operation,
                producer: self.producer.description(),
            });
        }

        Ok(())
    }

    fn invalidate(&mut self) {
        self.valid = false;
        self.cached = None;
    }
}

fn reject<T>(error: RegistrationError) -> Result<T, RegistrationError> {
    error!("{}", error);
    Err(error)
}

/// Handle for configuring and binding a registration record.
#[derive(Clone, Debug)]
pub struct PendingRecord {
    record: RecordPtr,
}

impl PendingRecord {
    pub(crate) fn new(record: RecordPtr) -> Self {
        Self { record }
    }

    /// Assigns values to parameters of the producer, replacing previously given ones. Fails if
    /// positional name bindings are already given.
    pub fn with_params(self, params: Params) -> Result<Self, RegistrationError> {
        {
            let mut record = self.record.borrow_mut();
            record.check_configurable("with_params")?;

            if !params.positional.is_empty() && !record.name_bindings.positional.is_empty() {
                return reject(RegistrationError::MixedPositionalInputs);
            }

            record.params = params;
        }

        Ok(self)
    }

    /// Assigns name bindings to parameters of the producer, replacing previously given ones. Fails
    /// if positional params are already given.
    pub fn with_name_bindings(self, name_bindings: NameBindings) -> Result<Self, RegistrationError> {
        {
            let mut record = self.record.borrow_mut();
            record.check_configurable("with_name_bindings")?;

            if !name_bindings.positional.is_empty() && !record.params.positional.is_empty() {
                return reject(RegistrationError::MixedPositionalInputs);
            }

            record.name_bindings = name_bindings;
        }

        Ok(self)
    }

    /// Changes the instantiation multiplicity. Drops a cached instance, if any.
    pub fn with_instantiation(
        self,
        instantiation: Instantiation,
    ) -> Result<Self, RegistrationError> {
        {
            let mut record = self.record.borrow_mut();
            record.check_configurable("with_instantiation")?;

            if record.instantiation != instantiation {
                record.instantiation = instantiation;
                record.cached = None;
            }
        }

        Ok(self)
    }

    /// Binds the record to the type `B`. The produced type must be `B` or have an alias to `B`.
    pub fn to_type<B: ?Sized + 'static>(self) -> Result<Self, RegistrationError> {
        let required = TypeKey::of::<B>();
        self.bind(Key::Type(required), Some(required), false)
    }

    /// Like [PendingRecord::to_type], but replaces an existing registration for `B`.
    pub fn replace_type<B: ?Sized + 'static>(self) -> Result<Self, RegistrationError> {
        let required = TypeKey::of::<B>();
        self.bind(Key::Type(required), Some(required), true)
    }

    /// Binds the record to given name, without checking the produced type.
    pub fn to_name<N: ToString>(self, name: N) -> Result<Self, RegistrationError> {
        self.bind(Key::name(name), None, false)
    }

    /// Like [PendingRecord::to_name], but replaces an existing registration for the name.
    pub fn replace_name<N: ToString>(self, name: N) -> Result<Self, RegistrationError> {
        self.bind(Key::name(name), None, true)
    }

    /// Binds the record to given name. The produced type must be `B` or have an alias to `B`.
    pub fn to_name_as<B: ?Sized + 'static, N: ToString>(
        self,
        name: N,
    ) -> Result<Self, RegistrationError> {
        self.bind(Key::name(name), Some(TypeKey::of::<B>()), false)
    }

    /// Like [PendingRecord::to_name_as], but replaces an existing registration for the name.
    pub fn replace_name_as<B: ?Sized + 'static, N: ToString>(
        self,
        name: N,
    ) -> Result<Self, RegistrationError> {
        self.bind(Key::name(name), Some(TypeKey::of::<B>()), true)
    }

    /// Key this record is bound to, if any.
    pub fn key(&self) -> Option<Key> {
        self.record.borrow().key().cloned()
    }

    /// Checks if the record has not been invalidated.
    pub fn is_valid(&self) -> bool {
        self.record.borrow().is_valid()
    }

    /// Resolves this record directly, bypassing key lookup.
    pub fn resolve(&self) -> Result<Instance, ResolutionError> {
        resolution::resolve(&self.record, false)
    }

    /// Like [PendingRecord::resolve], but preferring parameter defaults.
    pub fn resolve_preferring_defaults(&self) -> Result<Instance, ResolutionError> {
        resolution::resolve(&self.record, true)
    }

    fn bind(
        self,
        key: Key,
        required: Option<TypeKey>,
        replace: bool,
    ) -> Result<Self, RegistrationError> {
        let (registry, producer) = {
            let record = self.record.borrow();
            record.check_validity()?;

            if let Some(bound) = record.key() {
                return reject(RegistrationError::AlreadyBound { key: bound.clone() });
            }

            let registry = match record.registry() {
                Some(registry) => registry,
                None => return reject(RegistrationError::RegistryDropped),
            };

            (registry, record.producer.clone())
        };

        if !replace {
            if let Some(existing) = registry.borrow().lookup(&key) {
                let existing = existing.borrow().producer.description();
                return reject(RegistrationError::KeyConflict { key, existing });
            }
        }

        let view = match (producer.exposed_type(), required) {
            (Some(exposed), Some(required)) if exposed != required => {
                match registry.borrow().find_alias(exposed, required) {
                    Some(cast) => Some(View {
                        target: required,
                        cast,
                    }),
                    None => return reject(RegistrationError::TypeMismatch { exposed, required }),
                }
            }
            _ => None,
        };

        let replaced = registry
            .borrow_mut()
            .register(key.clone(), self.record.clone());

        if let Some(replaced) = replaced {
            debug!(key = %key, replaced = %replaced.borrow().producer.description(), "Replacing registration.");
            replaced.borrow_mut().invalidate();
        }

        {
            let mut record = self.record.borrow_mut();
            let converted = match (&view, record.cached()) {
                (Some(view), Some(cached)) => Some(view.apply(cached).ok()),
                _ => None,
            };
            if let Some(converted) = converted {
                record.cached = converted;
            }

            debug!(key = %key, producer = %producer.description(), container = %registry.borrow().name(), "Bound registration.");

            record.key = Some(key);
            record.view = view;
        }

        Ok(self)
    }
}
