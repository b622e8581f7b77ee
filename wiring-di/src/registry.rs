//! Storage of registration records. Each [Container](crate::container::Container) owns exactly one
//! [Registry], which delegates lookups to the registries of its sub-containers on a local miss.

use crate::instance::{Instance, Key, TypeKey};
use crate::record::RecordPtr;
use derivative::Derivative;
use fxhash::FxHashMap;
use indexmap::IndexMap;
use std::cell::RefCell;
use std::rc::Rc;

pub(crate) type RegistryPtr = Rc<RefCell<Registry>>;

/// Type-erased conversion of an instance to a compatible type, e.g. from a concrete type to a
/// `dyn Trait` it implements. Returns `None` when given an instance of a different source type.
pub type AliasCast = Rc<dyn Fn(&Instance) -> Option<Instance>>;

/// Key to record store with hierarchical delegation to sub-registries.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct Registry {
    name: String,
    records: FxHashMap<Key, RecordPtr>,
    #[derivative(Debug = "ignore")]
    aliases: FxHashMap<(TypeKey, TypeKey), AliasCast>,
    sub_registries: IndexMap<String, RegistryPtr>,
}

impl Registry {
    pub(crate) fn new(name: String) -> Self {
        Self {
            name,
            records: Default::default(),
            aliases: Default::default(),
            sub_registries: Default::default(),
        }
    }

    /// Name of the owning container.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the local record for given key, or the first one found in sub-registries,
    /// depth-first, in attachment order.
    pub(crate) fn lookup(&self, key: &Key) -> Option<RecordPtr> {
        self.records.get(key).cloned().or_else(|| {
            self.sub_registries
                .values()
                .find_map(|sub_registry| sub_registry.borrow().lookup(key))
        })
    }

    /// Checks if given key is registered here or in any sub-registry.
    pub fn contains(&self, key: &Key) -> bool {
        self.records.contains_key(key)
            || self
                .sub_registries
                .values()
                .any(|sub_registry| sub_registry.borrow().contains(key))
    }

    /// Inserts a record locally, returning the local record it replaced.
    pub(crate) fn register(&mut self, key: Key, record: RecordPtr) -> Option<RecordPtr> {
        self.records.insert(key, record)
    }

    pub(crate) fn register_alias(&mut self, exposed: TypeKey, required: TypeKey, cast: AliasCast) {
        self.aliases.insert((exposed, required), cast);
    }

    /// Finds a conversion from `exposed` to `required`, searching sub-registries like
    /// [Registry::lookup] does.
    pub(crate) fn find_alias(&self, exposed: TypeKey, required: TypeKey) -> Option<AliasCast> {
        self.aliases.get(&(exposed, required)).cloned().or_else(|| {
            self.sub_registries
                .values()
                .find_map(|sub_registry| sub_registry.borrow().find_alias(exposed, required))
        })
    }

    /// Attaches a sub-registry under its name. A sub-registry with the same name is replaced in
    /// place, keeping its position in the lookup order.
    pub(crate) fn add_sub_registry(&mut self, sub_registry: RegistryPtr) -> Option<RegistryPtr> {
        let name = sub_registry.borrow().name.clone();
        self.sub_registries.insert(name, sub_registry)
    }

    pub(crate) fn remove_sub_registry(&mut self, name: &str) -> Option<RegistryPtr> {
        self.sub_registries.shift_remove(name)
    }
}
