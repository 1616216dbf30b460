//! Forwarding entry points bridging the erased calling convention.
//!
//! A trampoline is synthesized per (concrete type, operation, storage mode).
//! It resolves the concrete object from the cell address, then runs the
//! operation with the argument tuple moved in and the result written out.
//! It neither wraps nor swallows failures: a panic in the concrete operation
//! unwinds through it unchanged.

use crate::handle::RawHandle;
use crate::op::{Call, CallMut, Op, OpMut};
use crate::sig::MAX_ARITY;

/// A forwarding entry point: one slot of a dispatch table.
///
/// The first pointer is the address of the invoking handle's storage cell;
/// the second is the operation's argument tuple (moved in), the third the
/// result slot (written out).
///
/// # Safety
///
/// Callers pass a cell built for the concrete type and storage mode the
/// entry was instantiated for, an initialized argument tuple of the
/// operation's `Args` type, and a result slot valid for writes of its `Ret`
/// type. Invocation through [`crate::Handle`] upholds all three by
/// construction.
pub type Trampoline = unsafe fn(cell: *mut (), args: *mut (), ret: *mut ());

/// Resolve the concrete object from the cell address.
///
/// `INLINE` is fixed per instantiation: an inline cell *is* the value's
/// storage, a borrowed cell holds the value's address.
#[inline(always)]
unsafe fn resolve<T, const INLINE: bool>(cell: *mut ()) -> *mut T {
    if INLINE {
        cell.cast()
    } else {
        unsafe { *cell.cast::<*mut T>() }
    }
}

/// Forwarding entry for a shared-receiver operation on `T`.
pub(crate) unsafe fn shared_trampoline<T, O, const INLINE: bool>(
    cell: *mut (),
    args: *mut (),
    ret: *mut (),
) where
    T: Call<O>,
    O: Op,
{
    let object = unsafe { resolve::<T, INLINE>(cell) };
    let args = unsafe { args.cast::<O::Args>().read() };
    let out = T::call(unsafe { &*object }, args);
    unsafe { ret.cast::<O::Ret>().write(out) };
}

/// Forwarding entry for an exclusive-receiver operation on `T`.
pub(crate) unsafe fn exclusive_trampoline<T, O, const INLINE: bool>(
    cell: *mut (),
    args: *mut (),
    ret: *mut (),
) where
    T: CallMut<O>,
    O: OpMut,
{
    let object = unsafe { resolve::<T, INLINE>(cell) };
    let args = unsafe { args.cast::<O::Args>().read() };
    let out = T::call_mut(unsafe { &mut *object }, args);
    unsafe { ret.cast::<O::Ret>().write(out) };
}

/// Adapter entry: re-enters a source handle's own table at position `J`.
///
/// An adapter handle's cell borrows the source handle itself, so resolution
/// lands on a [`RawHandle`] rather than a concrete object; argument and
/// result slots pass through untouched (the matched descriptors are equal,
/// so the erased convention is identical on both sides).
unsafe fn forward<const J: usize>(cell: *mut (), args: *mut (), ret: *mut ()) {
    let source = unsafe { &*resolve::<RawHandle, false>(cell) };
    unsafe { source.enter(J, args, ret) };
}

/// Adapter entries for every representable source position.
pub(crate) const FORWARDERS: [Trampoline; MAX_ARITY] = [
    forward::<0>,
    forward::<1>,
    forward::<2>,
    forward::<3>,
    forward::<4>,
    forward::<5>,
    forward::<6>,
    forward::<7>,
];
