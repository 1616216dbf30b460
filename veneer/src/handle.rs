//! The externally visible value type: a storage cell bound to a dispatch
//! table.

use core::fmt;
use core::marker::PhantomData;
use core::mem::MaybeUninit;

use crate::cell::{StorageCell, inline_eligible};
use crate::error::Error;
use crate::op::{Access, Op, OpDesc, OpMut};
use crate::sig::{Conforms, HasOp, Mut, Ref, Signature, locate};
use crate::table::{self, TableSlot};
use crate::trampoline::Trampoline;

/// Signature- and lifetime-erased interior of a [`Handle`].
///
/// Adapter trampolines re-enter a source handle through this type: the
/// adapter's cell borrows the source handle's `RawHandle`, and the layout
/// is identical whatever the signature parameter of the public wrapper.
#[derive(Clone, Copy)]
pub(crate) struct RawHandle {
    cell: StorageCell,
    table: TableSlot,
}

impl RawHandle {
    /// Call the entry at `index` with the cell's address.
    ///
    /// # Safety
    ///
    /// `args` and `ret` must match the entry's operation as described on
    /// [`Trampoline`].
    #[inline]
    pub(crate) unsafe fn enter(&self, index: usize, args: *mut (), ret: *mut ()) {
        let entry = self.table.entry(index);
        unsafe { entry(self.cell.addr(), args, ret) }
    }
}

/// A value-like view of one concrete object under capability signature `S`.
///
/// Two words: a [`StorageCell`] holding the object (inline bit-copy or
/// borrowed address, fixed at construction) and the object's dispatch table
/// (shared by reference, or a single entry embedded by value). The handle is
/// `Copy`: copies duplicate inline values and alias borrowed ones. Raw
/// pointers keep it `!Send` and `!Sync`; whatever thread-safety the wrapped
/// object has is its own.
///
/// Every operation `S` declares is backed by a table entry; the table's
/// length always equals the signature's arity.
pub struct Handle<'a, S: Signature> {
    raw: RawHandle,
    _borrow: PhantomData<&'a ()>,
    _signature: PhantomData<S>,
}

impl<S: Signature> Clone for Handle<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: Signature> Copy for Handle<'_, S> {}

impl<'a, S: Signature> Handle<'a, S> {
    fn assemble(cell: StorageCell, table: TableSlot) -> Self {
        Handle {
            raw: RawHandle { cell, table },
            _borrow: PhantomData,
            _signature: PhantomData,
        }
    }

    /// First exclusive operation in the signature, if any.
    fn exclusive_op() -> Option<&'static str> {
        S::OPS
            .iter()
            .find(|desc| desc.access == Access::Exclusive)
            .map(|desc| desc.name)
    }

    /// Wrap a small trivially-copyable value inline.
    ///
    /// The value is bit-copied into the handle's own cell; every copy of
    /// the handle carries its own copy of the value, and the value's
    /// observable address is the cell's, not the original's. That address
    /// lives exactly as long as the handle: an operation that returns it is
    /// violating its contract, since the pointee dies with (or before) the
    /// caller's frame.
    ///
    /// # Errors
    ///
    /// [`Error::Oversized`] when `T` exceeds the one-word cell, and
    /// [`Error::InlineMutation`] when `S` declares an exclusive operation,
    /// since an inline copy is reachable through shared views only. Lifting by
    /// reference sidesteps both.
    pub fn lift<T>(value: T) -> Result<Self, Error>
    where
        T: Conforms<S> + Copy + 'static,
    {
        if !inline_eligible::<T>() {
            return Err(Error::Oversized {
                size: size_of::<T>(),
                align: align_of::<T>(),
            });
        }
        if let Some(operation) = Self::exclusive_op() {
            return Err(Error::InlineMutation { operation });
        }
        let table = table::direct::<T, S>(true)?;
        Ok(Self::assemble(StorageCell::inline(value), table))
    }

    /// Wrap a shared borrow of `source`.
    ///
    /// Storage is the object's address; the handle and all its copies alias
    /// `source` for as long as `'a` lasts.
    ///
    /// # Errors
    ///
    /// [`Error::SharedMutation`] when `S` declares an exclusive operation.
    pub fn lift_ref<T>(source: &'a T) -> Result<Self, Error>
    where
        T: Conforms<S> + 'static,
    {
        if let Some(operation) = Self::exclusive_op() {
            return Err(Error::SharedMutation { operation });
        }
        let table = table::direct::<T, S>(false)?;
        let cell = StorageCell::borrowed((source as *const T).cast_mut().cast());
        Ok(Self::assemble(cell, table))
    }

    /// Wrap an exclusive borrow of `source`.
    ///
    /// The full signature is available, including exclusive operations.
    ///
    /// # Errors
    ///
    /// Table construction can still reject the signature itself
    /// ([`Error::DuplicateOperation`]).
    pub fn lift_mut<T>(source: &'a mut T) -> Result<Self, Error>
    where
        T: Conforms<S> + 'static,
    {
        let table = table::direct::<T, S>(false)?;
        let cell = StorageCell::borrowed((source as *mut T).cast());
        Ok(Self::assemble(cell, table))
    }

    /// Invoke a shared operation.
    ///
    /// A direct forward: the entry at the operation's declared position is
    /// called with the cell's address, and whatever the concrete operation
    /// returns (or panics) propagates unchanged.
    pub fn invoke<O, P>(&self, args: O::Args) -> O::Ret
    where
        O: Op,
        S: HasOp<Ref<O>, P>,
    {
        let mut args = MaybeUninit::new(args);
        let mut ret = MaybeUninit::<O::Ret>::uninit();
        // The entry at INDEX was instantiated for exactly this operation's
        // argument and return types: tables are built slot by slot in
        // declaration order, and conversions only ever bind entries whose
        // descriptors compare equal.
        unsafe {
            self.raw.enter(
                <S as HasOp<Ref<O>, P>>::INDEX,
                args.as_mut_ptr().cast(),
                ret.as_mut_ptr().cast(),
            );
            ret.assume_init()
        }
    }

    /// Invoke an exclusive operation, mutating the wrapped object.
    pub fn invoke_mut<O, P>(&mut self, args: O::Args) -> O::Ret
    where
        O: OpMut,
        S: HasOp<Mut<O>, P>,
    {
        let mut args = MaybeUninit::new(args);
        let mut ret = MaybeUninit::<O::Ret>::uninit();
        unsafe {
            self.raw.enter(
                <S as HasOp<Mut<O>, P>>::INDEX,
                args.as_mut_ptr().cast(),
                ret.as_mut_ptr().cast(),
            );
            ret.assume_init()
        }
    }

    /// Re-view this handle under a narrower signature, sharing storage and
    /// table.
    ///
    /// Succeeds iff `S2`'s descriptor sequence occurs as a contiguous,
    /// order-preserving block inside `S`'s, taking the lowest-offset block
    /// when there are several. The new handle copies the cell and borrows the
    /// same table run, offset to the match; no entries are resynthesized.
    /// Single-operation targets embed the matched entry by value.
    #[must_use]
    pub fn narrow<S2: Signature>(&self) -> Option<Handle<'a, S2>> {
        let offset = locate(S::OPS, S2::OPS)?;
        let table = match self.raw.table {
            TableSlot::Shared(run) => {
                if S2::ARITY == 1 {
                    TableSlot::Single(run[offset])
                } else {
                    TableSlot::Shared(&run[offset..offset + S2::ARITY])
                }
            }
            // A single-entry handle only narrows to itself, at offset zero.
            TableSlot::Single(entry) => TableSlot::Single(entry),
        };
        Some(Handle::assemble(self.raw.cell, table))
    }

    /// Convert into signature `S2`, sharing when possible and synthesizing
    /// an adapter otherwise.
    ///
    /// When [`narrow`](Self::narrow) applies, this is that conversion. A
    /// satisfiable but non-contiguous target (reordered, or with gaps) gets
    /// a handle that borrows `self` and dispatches through an adapter table
    /// whose entries re-enter this handle's own operations. This is the one
    /// conversion that grows the table population.
    ///
    /// # Errors
    ///
    /// [`Error::UnmatchedOperation`] when some target operation has no
    /// equal-descriptor counterpart in `S`, and
    /// [`Error::DuplicateOperation`] for ill-formed targets.
    pub fn convert<S2: Signature>(&self) -> Result<Handle<'_, S2>, Error> {
        if let Some(narrowed) = self.narrow::<S2>() {
            return Ok(narrowed);
        }
        let table = table::adapter::<S, S2>()?;
        let cell = StorageCell::borrowed((&self.raw as *const RawHandle).cast_mut().cast());
        Ok(Handle::assemble(cell, table))
    }

    /// Descriptors of the operations this handle exposes, in declaration
    /// order.
    #[must_use]
    pub fn operations(&self) -> &'static [OpDesc] {
        S::OPS
    }

    /// The raw word held by the storage cell: a borrowed object's address,
    /// or an inline value's bytes. Handles sharing storage hold equal
    /// words.
    #[must_use]
    pub fn storage_word(&self) -> *const () {
        self.raw.cell.word()
    }

    /// Base address of the shared table run, or `None` when the sole entry
    /// is embedded by value.
    #[must_use]
    pub fn table_ptr(&self) -> Option<*const Trampoline> {
        match self.raw.table {
            TableSlot::Shared(run) => Some(run.as_ptr()),
            TableSlot::Single(_) => None,
        }
    }

    /// Table entry at declaration-order position `index`.
    ///
    /// # Panics
    ///
    /// Panics when `index` is out of bounds for the signature.
    #[must_use]
    pub fn entry(&self, index: usize) -> Trampoline {
        assert!(index < S::ARITY, "operation index out of bounds");
        self.raw.table.entry(index)
    }
}

impl<S: Signature> fmt::Debug for Handle<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = S::OPS.iter().map(|desc| desc.name).collect();
        f.debug_struct("Handle")
            .field("operations", &names)
            .field("storage", &self.raw.cell)
            .finish()
    }
}
