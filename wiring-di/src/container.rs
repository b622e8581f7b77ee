//! The [Container] is the entry point of dependency resolution: producers are registered with it,
//! bound to keys through the returned [PendingRecord]s, and resolved back by type or name.
//!
//! Containers can be composed: a container attached with [Container::add_sub_container] takes part
//! in lookups of its parent, after the parent's own registrations. Containers are cheap handles,
//! so the same container can be attached to multiple parents.
//!
//! ```
//! use wiring_di::container::Container;
//! use wiring_di::instance::InstancePtr;
//! use wiring_di::signature::{Parameter, Signature};
//!
//! trait Logger {
//!     fn prefix(&self) -> &str;
//! }
//!
//! struct ConsoleLogger;
//!
//! impl Logger for ConsoleLogger {
//!     fn prefix(&self) -> &str {
//!         "console"
//!     }
//! }
//!
//! let infrastructure = Container::new("infrastructure");
//! infrastructure.register_alias::<ConsoleLogger, dyn Logger>(|logger| logger as InstancePtr<dyn Logger>);
//! infrastructure
//!     .register_value(ConsoleLogger)
//!     .to_type::<dyn Logger>()?;
//!
//! let main = Container::new("main");
//! main.add_sub_container(&infrastructure)?;
//! main.register_callable(
//!     Signature::new().param(Parameter::new("logger").typed::<dyn Logger>()),
//!     |arguments| {
//!         let logger = arguments.get::<dyn Logger>("logger")?;
//!         Ok(InstancePtr::new(format!("{}: started", logger.prefix())))
//!     },
//! )
//! .to_name("status")?;
//!
//! assert_eq!(*main.resolve_name::<String>("status")?, "console: started");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::component::Component;
use crate::error::{ContainerError, ProducerError, ResolutionError};
use crate::instance::{Instance, InstancePtr, Key, TypeKey};
use crate::instantiation::Instantiation;
use crate::producer::{CallableBinding, DynamicCallableBinding, Producer, TypeBinding, ValueBinding};
use crate::record::{PendingRecord, RegistrationRecord};
use crate::registry::{Registry, RegistryPtr};
use crate::resolution;
use crate::signature::{Arguments, Signature};
use indexmap::IndexMap;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, error};

#[derive(Debug)]
struct ContainerInner {
    name: String,
    registry: RegistryPtr,
    sub_containers: RefCell<IndexMap<String, Container>>,
    param_names_as_bindings: bool,
}

/// Named set of registrations, composable with other containers.
#[derive(Clone, Debug)]
pub struct Container {
    inner: Rc<ContainerInner>,
}

impl Container {
    /// Creates an empty container, which uses parameter names as implicit name bindings.
    pub fn new<T: ToString>(name: T) -> Self {
        ContainerBuilder::new(name).build()
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Checks if the key is registered in this container or any sub-container.
    pub fn contains(&self, key: &Key) -> bool {
        self.inner.registry.borrow().contains(key)
    }

    /// Names of attached sub-containers, in attachment order.
    pub fn sub_container_names(&self) -> Vec<String> {
        self.inner
            .sub_containers
            .borrow()
            .keys()
            .cloned()
            .collect()
    }

    /// Registers a custom [Producer]. The returned record needs to be bound to a key to become
    /// resolvable.
    pub fn register_producer(&self, producer: Rc<dyn Producer>) -> PendingRecord {
        debug!(producer = %producer.description(), container = %self.name(), "Registering producer.");

        PendingRecord::new(Rc::new(RefCell::new(RegistrationRecord::new(
            &self.inner.registry,
            producer,
            Instantiation::default(),
            self.inner.param_names_as_bindings,
        ))))
    }

    /// Registers a [Component], constructed with resolved arguments.
    pub fn register_type<C: Component>(&self) -> PendingRecord {
        self.register_producer(Rc::new(TypeBinding::<C>::new()))
    }

    /// Registers a factory producing instances of `T`.
    pub fn register_callable<T, F>(&self, signature: Signature, factory: F) -> PendingRecord
    where
        T: ?Sized + 'static,
        F: Fn(Arguments) -> Result<InstancePtr<T>, ProducerError> + 'static,
    {
        self.register_producer(Rc::new(CallableBinding::new(signature, factory)))
    }

    /// Registers a factory with no declared result type. Records using such factories can be
    /// bound to any type.
    pub fn register_dynamic_callable<F>(&self, signature: Signature, factory: F) -> PendingRecord
    where
        F: Fn(Arguments) -> Result<Instance, ProducerError> + 'static,
    {
        self.register_producer(Rc::new(DynamicCallableBinding::new(signature, factory)))
    }

    /// Registers a ready value. Values are always singletons.
    pub fn register_value<T: 'static>(&self, value: T) -> PendingRecord {
        self.register_instance(Instance::new(value))
    }

    /// Registers a ready value given as a pointer, e.g. to a `dyn Trait`.
    pub fn register_value_ptr<T: ?Sized + 'static>(&self, value: InstancePtr<T>) -> PendingRecord {
        self.register_instance(Instance::from_ptr(value))
    }

    /// Registers a ready type-erased value.
    pub fn register_instance(&self, value: Instance) -> PendingRecord {
        self.register_producer(Rc::new(ValueBinding::new(value)))
    }

    /// Declares that `C` can be used where `B` is required, converting instances with given cast.
    /// Usually `B` is a trait implemented by `C`. Aliases are visible to parent containers.
    pub fn register_alias<C: ?Sized + 'static, B: ?Sized + 'static>(
        &self,
        cast: fn(InstancePtr<C>) -> InstancePtr<B>,
    ) {
        debug!(from = %TypeKey::of::<C>(), to = %TypeKey::of::<B>(), container = %self.name(), "Registering alias.");

        self.inner.registry.borrow_mut().register_alias(
            TypeKey::of::<C>(),
            TypeKey::of::<B>(),
            Rc::new(move |instance: &Instance| {
                instance
                    .downcast::<C>()
                    .map(|ptr| Instance::from_ptr(cast(ptr)))
            }),
        );
    }

    /// Resolves the instance registered for given key.
    pub fn resolve(&self, key: &Key) -> Result<Instance, ResolutionError> {
        self.resolve_key(key, false)
    }

    /// Like [Container::resolve], but preferring declared parameter defaults over lookups.
    pub fn resolve_preferring_defaults(&self, key: &Key) -> Result<Instance, ResolutionError> {
        self.resolve_key(key, true)
    }

    /// Resolves the instance registered for type `T`.
    pub fn resolve_type<T: ?Sized + 'static>(&self) -> Result<InstancePtr<T>, ResolutionError> {
        self.resolve(&Key::of::<T>()).and_then(downcast)
    }

    pub fn resolve_type_preferring_defaults<T: ?Sized + 'static>(
        &self,
    ) -> Result<InstancePtr<T>, ResolutionError> {
        self.resolve_preferring_defaults(&Key::of::<T>())
            .and_then(downcast)
    }

    /// Resolves the instance registered for given name, expecting it to be of type `T`.
    pub fn resolve_name<T: ?Sized + 'static>(
        &self,
        name: &str,
    ) -> Result<InstancePtr<T>, ResolutionError> {
        self.resolve(&Key::name(name)).and_then(downcast)
    }

    pub fn resolve_name_preferring_defaults<T: ?Sized + 'static>(
        &self,
        name: &str,
    ) -> Result<InstancePtr<T>, ResolutionError> {
        self.resolve_preferring_defaults(&Key::name(name))
            .and_then(downcast)
    }

    /// Attaches a sub-container, whose registrations become visible in this container. A
    /// sub-container with the same name is replaced, keeping its position in the lookup order.
    /// Fails if this container is reachable from the sub-container.
    pub fn add_sub_container(&self, sub_container: &Container) -> Result<(), ContainerError> {
        if sub_container.reaches(self) {
            let error = ContainerError::ContainerCycle {
                parent: self.name().to_string(),
                child: sub_container.name().to_string(),
            };

            error!("{}", error);
            return Err(error);
        }

        debug!(container = %self.name(), sub_container = %sub_container.name(), "Adding sub container.");

        self.inner
            .registry
            .borrow_mut()
            .add_sub_registry(sub_container.inner.registry.clone());
        self.inner
            .sub_containers
            .borrow_mut()
            .insert(sub_container.name().to_string(), sub_container.clone());

        Ok(())
    }

    /// Detaches the sub-container with given name.
    pub fn remove_sub_container(&self, name: &str) -> Result<Container, ContainerError> {
        let removed = self
            .inner
            .sub_containers
            .borrow_mut()
            .shift_remove(name)
            .ok_or_else(|| ContainerError::UnknownSubContainer {
                parent: self.name().to_string(),
                name: name.to_string(),
            })?;

        debug!(container = %self.name(), sub_container = %name, "Removing sub container.");

        self.inner.registry.borrow_mut().remove_sub_registry(name);
        Ok(removed)
    }

    fn reaches(&self, target: &Container) -> bool {
        Rc::ptr_eq(&self.inner, &target.inner)
            || self
                .inner
                .sub_containers
                .borrow()
                .values()
                .any(|container| container.reaches(target))
    }

    fn resolve_key(&self, key: &Key, prefer_defaults: bool) -> Result<Instance, ResolutionError> {
        debug!(key = %key, container = %self.name(), prefer_defaults, "Resolving.");

        let record = self.inner.registry.borrow().lookup(key);
        match record {
            Some(record) => resolution::resolve(&record, prefer_defaults),
            None => Err(ResolutionError::UnknownKey {
                key: key.clone(),
                container: self.name().to_string(),
            }),
        }
    }
}

fn downcast<T: ?Sized + 'static>(instance: Instance) -> Result<InstancePtr<T>, ResolutionError> {
    instance
        .downcast::<T>()
        .ok_or_else(|| ResolutionError::IncompatibleInstance {
            expected: TypeKey::of::<T>(),
            actual: instance.type_key(),
        })
}

/// Builder for [Container]s with custom configuration.
#[derive(Clone, Debug)]
pub struct ContainerBuilder {
    name: String,
    param_names_as_bindings: bool,
}

impl ContainerBuilder {
    pub fn new<T: ToString>(name: T) -> Self {
        Self {
            name: name.to_string(),
            param_names_as_bindings: true,
        }
    }

    /// Sets whether parameter names are looked up as keys, when no explicit value, name binding or
    /// registered type is available.
    pub fn with_param_names_as_bindings(mut self, param_names_as_bindings: bool) -> Self {
        self.param_names_as_bindings = param_names_as_bindings;
        self
    }

    pub fn build(self) -> Container {
        let registry = Rc::new(RefCell::new(Registry::new(self.name.clone())));
        Container {
            inner: Rc::new(ContainerInner {
                name: self.name,
                registry,
                sub_containers: Default::default(),
                param_names_as_bindings: self.param_names_as_bindings,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::container::{Container, ContainerBuilder};
    use crate::error::{ContainerError, ResolutionError};
    use crate::instance::{Instance, Key, TypeKey};
    use crate::producer::MockProducer;
    use crate::signature::{Parameter, Signature};
    use std::rc::Rc;

    fn create_producer(signature: Signature, times: usize) -> MockProducer {
        let mut producer = MockProducer::new();
        producer.expect_preset().return_const_st(None);
        producer.expect_exposed_type().return_const(None);
        producer
            .expect_description()
            .return_const("producer".to_string());
        producer.expect_signature().return_const(signature);
        producer
            .expect_produce()
            .times(times)
            .returning(|_| Ok(Instance::new(0_u8)));
        producer
    }

    #[test]
    fn should_report_unknown_keys() {
        let container = Container::new("main");

        assert!(matches!(
            container.resolve(&Key::from("missing")).unwrap_err(),
            ResolutionError::UnknownKey { key, container } if key == Key::from("missing") && container == "main"
        ));
    }

    #[test]
    fn should_resolve_custom_producers() {
        let container = Container::new("main");
        container
            .register_producer(Rc::new(create_producer(Signature::new(), 1)))
            .to_name("a")
            .unwrap();

        assert!(container.contains(&Key::from("a")));
        assert_eq!(*container.resolve_name::<u8>("a").unwrap(), 0);
        assert_eq!(*container.resolve_name::<u8>("a").unwrap(), 0);
    }

    #[test]
    fn should_report_incompatible_instances() {
        let container = Container::new("main");
        container.register_value(1_i32).to_name("a").unwrap();

        assert!(matches!(
            container.resolve_name::<String>("a").unwrap_err(),
            ResolutionError::IncompatibleInstance { expected, actual }
                if expected == TypeKey::of::<String>() && actual == TypeKey::of::<i32>()
        ));
    }

    #[test]
    fn should_disable_parameter_names_as_bindings() {
        let container = ContainerBuilder::new("main")
            .with_param_names_as_bindings(false)
            .build();
        container.register_value(1_i32).to_name("value").unwrap();
        container
            .register_producer(Rc::new(create_producer(
                Signature::new().param(Parameter::new("value")),
                0,
            )))
            .to_name("a")
            .unwrap();

        assert!(matches!(
            container.resolve(&Key::from("a")).unwrap_err(),
            ResolutionError::UnresolvableParameters { .. }
        ));
    }

    #[test]
    fn should_reject_self_as_sub_container() {
        let container = Container::new("main");

        assert_eq!(
            container.add_sub_container(&container.clone()).unwrap_err(),
            ContainerError::ContainerCycle {
                parent: "main".to_string(),
                child: "main".to_string(),
            }
        );
        assert!(container.sub_container_names().is_empty());
    }

    #[test]
    fn should_remove_sub_containers() {
        let container = Container::new("main");
        let sub_container = Container::new("sub");
        sub_container.register_value(1_i32).to_name("a").unwrap();

        container.add_sub_container(&sub_container).unwrap();
        assert_eq!(container.sub_container_names(), vec!["sub".to_string()]);
        assert!(container.contains(&Key::from("a")));

        assert_eq!(container.remove_sub_container("sub").unwrap().name(), "sub");
        assert!(!container.contains(&Key::from("a")));
        assert!(matches!(
            container.remove_sub_container("sub").unwrap_err(),
            ContainerError::UnknownSubContainer { .. }
        ));
    }

    #[test]
    fn should_replace_sub_containers_with_same_name() {
        let container = Container::new("main");
        let replaced = Container::new("sub");
        replaced.register_value(1_i32).to_name("a").unwrap();
        let other = Container::new("other");
        let replacement = Container::new("sub");
        replacement.register_value(2_i32).to_name("b").unwrap();

        container.add_sub_container(&replaced).unwrap();
        container.add_sub_container(&other).unwrap();
        container.add_sub_container(&replacement).unwrap();

        assert_eq!(
            container.sub_container_names(),
            vec!["sub".to_string(), "other".to_string()]
        );
        assert!(!container.contains(&Key::from("a")));
        assert!(container.contains(&Key::from("b")));

        container.remove_sub_container("sub").unwrap();
        assert_eq!(container.sub_container_names(), vec!["other".to_string()]);
        assert!(!container.contains(&Key::from("b")));
    }

    #[test]
    fn should_attach_same_sub_container_once() {
        let container = Container::new("main");
        let sub_container = Container::new("sub");
        sub_container.register_value(1_i32).to_name("a").unwrap();

        container.add_sub_container(&sub_container).unwrap();
        container.add_sub_container(&sub_container).unwrap();
        assert_eq!(container.sub_container_names(), vec!["sub".to_string()]);

        container.remove_sub_container("sub").unwrap();
        assert!(!container.contains(&Key::from("a")));
    }
}
