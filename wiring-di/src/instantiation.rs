//! Instances produced by a registration record are either cached and reused, or created anew on
//! every resolve. The choice is made per record with an [Instantiation] policy.
//!
//! Note: the policy applies at resolution time of the record itself, which can lead to unexpected
//! consequences if policies are mixed, e.g. a [Singleton](Instantiation::Singleton) depending on a
//! [MultiInstance](Instantiation::MultiInstance) record. In such case a new instance of the
//! dependency is created for the singleton, but then that single instance lives as long as the
//! singleton lives.

use crate::instance::Instance;

/// Instantiation multiplicity of a registration record.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug, Default)]
pub enum Instantiation {
    /// A single instance is created on first resolve and returned on subsequent resolves.
    #[default]
    Singleton,
    /// A new instance is created for every resolve.
    MultiInstance,
}

impl Instantiation {
    /// Returns the cached instance, if this policy allows reusing it.
    #[inline]
    pub(crate) fn reuse(&self, cached: Option<&Instance>) -> Option<Instance> {
        match self {
            Instantiation::Singleton => cached.cloned(),
            Instantiation::MultiInstance => None,
        }
    }

    /// Stores a freshly produced instance, if this policy caches instances.
    #[inline]
    pub(crate) fn store(&self, cache: &mut Option<Instance>, instance: &Instance) {
        if *self == Instantiation::Singleton {
            *cache = Some(instance.clone());
        }
    }
}
