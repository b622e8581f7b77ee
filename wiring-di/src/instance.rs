//! Keys under which records are registered and the type-erased [Instance]s flowing through
//! resolution.

use std::any::{type_name, Any, TypeId};
use std::cmp::Ordering;
use std::fmt::{Debug, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// Pointer type for resolved instances. Singleton identity can be checked with [Rc::ptr_eq].
pub type InstancePtr<T> = Rc<T>;

/// Identifies a type used as a registration key or for compatibility checks. Equality and hashing
/// only consider the [TypeId]; the name is kept for messages.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    /// Returns the key for given type, which might be unsized, e.g. `dyn Trait`.
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    #[inline]
    pub fn id(&self) -> TypeId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for TypeKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TypeKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl Debug for TypeKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}

impl Display for TypeKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}

/// Lookup key of a registration: either a type or a name.
#[derive(Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Debug)]
pub enum Key {
    Type(TypeKey),
    Name(String),
}

impl Key {
    /// Creates a type key for `T`.
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Key::Type(TypeKey::of::<T>())
    }

    /// Creates a name key.
    #[inline]
    pub fn name<T: ToString>(name: T) -> Self {
        Key::Name(name.to_string())
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Key::Name(value.to_string())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Key::Name(value)
    }
}

impl From<TypeKey> for Key {
    fn from(value: TypeKey) -> Self {
        Key::Type(value)
    }
}

impl Display for Key {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Key::Type(type_key) => Display::fmt(type_key, f),
            Key::Name(name) => f.write_str(name),
        }
    }
}

/// A type-erased, reference-counted value. Holds an [InstancePtr] of any `'static` type, including
/// unsized ones, so trait objects can be passed around as easily as concrete values.
#[derive(Clone)]
pub struct Instance {
    // always an InstancePtr<T> where TypeKey::of::<T>() == type_key
    ptr: Rc<dyn Any>,
    address: *const (),
    type_key: TypeKey,
}

impl Instance {
    /// Wraps a new value.
    #[inline]
    pub fn new<T: 'static>(value: T) -> Self {
        Self::from_ptr(InstancePtr::new(value))
    }

    /// Wraps an existing pointer, keeping its identity.
    #[inline]
    pub fn from_ptr<T: ?Sized + 'static>(ptr: InstancePtr<T>) -> Self {
        Self {
            address: InstancePtr::as_ptr(&ptr) as *const (),
            ptr: Rc::new(ptr),
            type_key: TypeKey::of::<T>(),
        }
    }

    /// The type of the contained value.
    #[inline]
    pub fn type_key(&self) -> TypeKey {
        self.type_key
    }

    /// Returns the contained pointer, if it points to `T`.
    #[inline]
    pub fn downcast<T: ?Sized + 'static>(&self) -> Option<InstancePtr<T>> {
        self.ptr.downcast_ref::<InstancePtr<T>>().cloned()
    }

    /// Checks if both instances point to the same value.
    pub fn ptr_eq(&self, other: &Instance) -> bool {
        self.type_key == other.type_key && self.address == other.address
    }
}

impl Debug for Instance {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instance")
            .field("type_key", &self.type_key)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use crate::instance::{Instance, InstancePtr, Key, TypeKey};
    use fxhash::FxHashSet;
    use std::fmt::Debug;

    #[test]
    fn should_compare_keys_by_kind_and_value() {
        assert_eq!(Key::of::<i8>(), Key::of::<i8>());
        assert_ne!(Key::of::<i8>(), Key::of::<u8>());
        assert_eq!(Key::from("i8"), Key::name("i8"));
        assert_ne!(Key::from("i8"), Key::of::<i8>());

        let keys: FxHashSet<Key> = [Key::of::<i8>(), Key::from("a"), Key::of::<i8>()]
            .into_iter()
            .collect();
        assert_eq!(keys.len(), 2);
    }

    #[test]
    fn should_downcast_sized_instances() {
        let instance = Instance::new(5_i32);

        assert_eq!(*instance.downcast::<i32>().unwrap(), 5);
        assert!(instance.downcast::<i64>().is_none());
        assert_eq!(instance.type_key(), TypeKey::of::<i32>());
    }

    #[test]
    fn should_downcast_unsized_instances() {
        let ptr = InstancePtr::new(7_u8) as InstancePtr<dyn Debug>;
        let instance = Instance::from_ptr(ptr.clone());

        let downcast = instance.downcast::<dyn Debug>().unwrap();
        assert!(InstancePtr::ptr_eq(&ptr, &downcast));
        assert!(instance.downcast::<u8>().is_none());
    }

    #[test]
    fn should_keep_identity_on_clone() {
        let instance = Instance::new("value".to_string());
        let other = Instance::new("value".to_string());

        assert!(instance.ptr_eq(&instance.clone()));
        assert!(!instance.ptr_eq(&other));

        let ptr = InstancePtr::new(1_i8);
        assert!(Instance::from_ptr(ptr.clone()).ptr_eq(&Instance::from_ptr(ptr)));
    }
}
