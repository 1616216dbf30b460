//! Const-constructible type identity.
//!
//! Operation descriptors are built in const contexts, where
//! `core::any::TypeId::of` cannot be called on our MSRV. The computation is
//! deferred behind a function pointer instead, the device of dtolnay's
//! `typeid` crate.

use core::any::TypeId;
use core::fmt;
use core::hash::{Hash, Hasher};

/// TypeId equivalent usable in const contexts.
#[derive(Clone, Copy)]
pub struct ConstTypeId {
    type_id_fn: fn() -> TypeId,
}

impl ConstTypeId {
    /// Create a [`ConstTypeId`] for a type.
    #[must_use]
    pub const fn of<T: 'static>() -> Self {
        ConstTypeId {
            type_id_fn: TypeId::of::<T>,
        }
    }

    /// Get the underlying [`TypeId`] for this `ConstTypeId`.
    #[inline]
    pub fn get(self) -> TypeId {
        (self.type_id_fn)()
    }
}

impl fmt::Debug for ConstTypeId {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.get(), f)
    }
}

impl PartialEq for ConstTypeId {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.get() == other.get()
    }
}

impl Eq for ConstTypeId {}

impl Hash for ConstTypeId {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Hash the function pointer directly - much faster than calling it
        // to get TypeId. The function pointer is unique per type within a process.
        (self.type_id_fn as usize).hash(state);
    }
}
