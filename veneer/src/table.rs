//! Dispatch table construction and the process-wide table registry.
//!
//! A table is built at most once per key: (concrete type, signature,
//! storage mode) for direct dispatch, (source signature, target signature)
//! for adapters. It then lives, immutable, for the rest of the process.
//! First-use construction is serialized by the registry lock so every
//! thread observes the same fully-built table; reads after that are plain
//! map lookups.

use core::any::TypeId;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Mutex, OnceLock, PoisonError};

use crate::error::Error;
use crate::sig::{self, Conforms, Signature};
use crate::trampoline::{FORWARDERS, Trampoline};
use crate::{debug, trace};

/// The table half of a handle: a borrowed run of a registered table, or a
/// single entry embedded by value.
#[derive(Clone, Copy)]
pub(crate) enum TableSlot {
    /// Borrowed run of a registered table; its length is the handle's arity.
    Shared(&'static [Trampoline]),
    /// The sole entry of a single-operation handle, held by value to skip
    /// the indirection.
    Single(Trampoline),
}

impl TableSlot {
    /// Entry at declaration-order position `index`.
    #[inline]
    pub(crate) fn entry(&self, index: usize) -> Trampoline {
        match *self {
            TableSlot::Shared(run) => run[index],
            TableSlot::Single(entry) => {
                assert!(index == 0, "operation index out of bounds");
                entry
            }
        }
    }
}

/// Identity of one registered table.
#[derive(PartialEq, Eq, Hash)]
enum TableKey {
    /// Dispatch on a concrete type under a signature, per storage mode.
    /// Storage mode is part of the identity because the trampolines bake
    /// the cell resolution.
    Direct {
        ty: TypeId,
        sig: TypeId,
        inline: bool,
    },
    /// Adapter forwarding one signature through another signature's handle.
    Forward { from: TypeId, to: TypeId },
}

fn registry() -> &'static Mutex<HashMap<TableKey, &'static [Trampoline]>> {
    static REGISTRY: OnceLock<Mutex<HashMap<TableKey, &'static [Trampoline]>>> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Build or look up the dispatch table for `T` under `S`.
///
/// Single-operation signatures skip the registry entirely: their one entry
/// is embedded in the handle by value. Everything else is published through
/// the registry so all handles for one key share one table by reference.
pub(crate) fn direct<T, S>(inline: bool) -> Result<TableSlot, Error>
where
    T: Conforms<S> + 'static,
    S: Signature,
{
    if let Some(operation) = sig::duplicate(S::OPS) {
        return Err(Error::DuplicateOperation { operation });
    }
    let entries = if inline {
        T::INLINE_TABLE
    } else {
        T::BORROWED_TABLE
    };
    if S::ARITY == 1 {
        return Ok(TableSlot::Single(entries[0]));
    }
    let key = TableKey::Direct {
        ty: TypeId::of::<T>(),
        sig: TypeId::of::<S>(),
        inline,
    };
    let mut tables = registry().lock().unwrap_or_else(PoisonError::into_inner);
    let table = *tables.entry(key).or_insert_with(|| {
        trace!(arity = S::ARITY, inline, "registering dispatch table");
        entries
    });
    Ok(TableSlot::Shared(table))
}

/// Build or look up the adapter table converting a handle of signature
/// `Src` into signature `Dst`.
///
/// Each target operation maps to the lowest matching source position; the
/// entry is the forwarder for that position, which re-enters the source
/// handle's own table at call time.
pub(crate) fn adapter<Src, Dst>() -> Result<TableSlot, Error>
where
    Src: Signature,
    Dst: Signature,
{
    if let Some(operation) = sig::duplicate(Dst::OPS) {
        return Err(Error::DuplicateOperation { operation });
    }
    let key = TableKey::Forward {
        from: TypeId::of::<Src>(),
        to: TypeId::of::<Dst>(),
    };
    let mut tables = registry().lock().unwrap_or_else(PoisonError::into_inner);
    let table = match tables.entry(key) {
        Entry::Occupied(slot) => *slot.get(),
        Entry::Vacant(slot) => {
            let mut entries = Vec::with_capacity(Dst::ARITY);
            for desc in Dst::OPS {
                let position = sig::position(Src::OPS, desc).ok_or(Error::UnmatchedOperation {
                    operation: desc.name,
                })?;
                entries.push(FORWARDERS[position]);
            }
            debug!(
                from = Src::ARITY,
                to = Dst::ARITY,
                "synthesized adapter table"
            );
            *slot.insert(Box::leak(entries.into_boxed_slice()))
        }
    };
    Ok(if Dst::ARITY == 1 {
        TableSlot::Single(table[0])
    } else {
        TableSlot::Shared(table)
    })
}
