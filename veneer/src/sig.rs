//! Capability signatures: ordered slot tuples and the sequence matcher.
//!
//! A signature is written as a tuple of [`Ref`] / [`Mut`] slot markers, one
//! per declared operation, in declaration order: `(Mut<Bump>, Ref<Peek>)`.
//! The tuple type carries everything the engine needs: the descriptor
//! sequence for matching, the trampoline constants for table construction,
//! and compile-time slot indices for invocation.

use core::marker::PhantomData;

use crate::op::{Access, Call, CallMut, Op, OpDesc, OpMut};
use crate::trampoline::{Trampoline, exclusive_trampoline, shared_trampoline};

/// Largest supported signature arity. Bounds the slot tuple impls and the
/// adapter forwarder family in `trampoline.rs`.
pub(crate) const MAX_ARITY: usize = 8;

mod sealed {
    pub trait Sealed {}
}

//////////////////////////////////////////////////////////////////////
// Slots
//////////////////////////////////////////////////////////////////////

/// A shared view of operation `O` inside a signature.
pub struct Ref<O>(PhantomData<O>);

/// An exclusive view of operation `O` inside a signature.
pub struct Mut<O>(PhantomData<O>);

/// One slot of a capability signature.
///
/// Sealed: the only implementors are [`Ref`] and [`Mut`].
///
/// # Safety
///
/// `DESC` must describe exactly the operation the slot's trampolines are
/// instantiated for; handles trust it when sharing tables across
/// conversions. Both impls live in this module; there is nothing to
/// implement downstream.
pub unsafe trait Slot: sealed::Sealed + 'static {
    /// The slot's operation descriptor.
    const DESC: OpDesc;
}

impl<O: Op> sealed::Sealed for Ref<O> {}

unsafe impl<O: Op> Slot for Ref<O> {
    const DESC: OpDesc = OpDesc::new::<O::Args, O::Ret>(O::NAME, Access::Shared);
}

impl<O: OpMut> sealed::Sealed for Mut<O> {}

unsafe impl<O: OpMut> Slot for Mut<O> {
    const DESC: OpDesc = OpDesc::new::<O::Args, O::Ret>(O::NAME, Access::Exclusive);
}

/// Trampoline synthesis for one slot and one concrete type.
///
/// The two constants are the same forwarding entry specialized for the two
/// storage modes; the constructor that builds a table picks one side for the
/// whole table.
///
/// # Safety
///
/// The trampolines must forward to `T`'s own implementation of the slot's
/// operation under the erased calling convention of
/// [`Trampoline`](crate::Trampoline). The blanket impls below are the only
/// ones that can exist: anything else would overlap them.
pub unsafe trait Bind<T>: Slot {
    /// Entry resolving the cell as the value's own storage.
    const INLINE: Trampoline;
    /// Entry resolving the cell as a borrowed address.
    const BORROWED: Trampoline;
}

unsafe impl<O: Op, T: Call<O>> Bind<T> for Ref<O> {
    const INLINE: Trampoline = shared_trampoline::<T, O, true>;
    const BORROWED: Trampoline = shared_trampoline::<T, O, false>;
}

unsafe impl<O: OpMut, T: CallMut<O>> Bind<T> for Mut<O> {
    const INLINE: Trampoline = exclusive_trampoline::<T, O, true>;
    const BORROWED: Trampoline = exclusive_trampoline::<T, O, false>;
}

//////////////////////////////////////////////////////////////////////
// Signatures
//////////////////////////////////////////////////////////////////////

/// An ordered sequence of operation slots: a handle type's contract.
///
/// Implemented for slot tuples of arity 1 through 8. Equality between
/// signatures is structural: two distinct tuple types whose descriptor
/// sequences are element-wise equal are interchangeable for conversions.
///
/// # Safety
///
/// `OPS` must list the slots' descriptors in tuple order and `ARITY` must be
/// the tuple arity; handles derive table offsets from them. Implemented for
/// you; the trait is sealed to the tuple impls in this module.
pub unsafe trait Signature: sealed::Sealed + Sized + 'static {
    /// Descriptors of every declared operation, in declaration order.
    const OPS: &'static [OpDesc];
    /// Number of declared operations.
    const ARITY: usize;
}

/// Conformance of a concrete type to every slot of a signature.
///
/// Holds whenever `T` implements [`Call`] / [`CallMut`] for each operation
/// the signature declares; the unsatisfied bound names the missing
/// operation at the construction call site.
///
/// # Safety
///
/// The tables must hold each slot's trampoline for `T`, in declaration
/// order. The blanket tuple impls are the only possible ones.
pub unsafe trait Conforms<S: Signature> {
    /// Dispatch entries for inline storage, in declaration order.
    const INLINE_TABLE: &'static [Trampoline];
    /// Dispatch entries for borrowed storage, in declaration order.
    const BORROWED_TABLE: &'static [Trampoline];
}

/// Compile-time position of slot `E` inside a signature.
///
/// The `P` parameter is inference plumbing (see [`At`]): it keeps the
/// per-position impls apart, and the compiler resolves it (and with it the
/// index) exactly when the slot occurs once in the tuple. A duplicated
/// slot makes invocation ambiguous, mirroring the duplicate rejection at
/// table build.
///
/// # Safety
///
/// `INDEX` must be the position whose slot type is `E`; invocation casts
/// the erased argument and return slots based on it.
pub unsafe trait HasOp<E, P>: Signature {
    /// Declaration-order index of the slot.
    const INDEX: usize;
}

/// Position disambiguator for [`HasOp`]; only ever inferred.
pub struct At<const N: usize>;

macro_rules! impl_signature {
    ($($arity:literal => ($($S:ident),+);)+) => {$(
        impl<$($S: Slot),+> sealed::Sealed for ($($S,)+) {}

        unsafe impl<$($S: Slot),+> Signature for ($($S,)+) {
            const OPS: &'static [OpDesc] = &[$($S::DESC),+];
            const ARITY: usize = $arity;
        }

        unsafe impl<T, $($S: Bind<T>),+> Conforms<($($S,)+)> for T {
            const INLINE_TABLE: &'static [Trampoline] = &[$($S::INLINE),+];
            const BORROWED_TABLE: &'static [Trampoline] = &[$($S::BORROWED),+];
        }
    )+};
}

impl_signature! {
    1 => (S0);
    2 => (S0, S1);
    3 => (S0, S1, S2);
    4 => (S0, S1, S2, S3);
    5 => (S0, S1, S2, S3, S4);
    6 => (S0, S1, S2, S3, S4, S5);
    7 => (S0, S1, S2, S3, S4, S5, S6);
    8 => (S0, S1, S2, S3, S4, S5, S6, S7);
}

macro_rules! impl_has_op {
    ($(($($S:ident),+) @ $E:ident => $n:literal;)+) => {$(
        unsafe impl<$($S: Slot),+> HasOp<$E, At<$n>> for ($($S,)+) {
            const INDEX: usize = $n;
        }
    )+};
}

impl_has_op! {
    (S0) @ S0 => 0;

    (S0, S1) @ S0 => 0;
    (S0, S1) @ S1 => 1;

    (S0, S1, S2) @ S0 => 0;
    (S0, S1, S2) @ S1 => 1;
    (S0, S1, S2) @ S2 => 2;

    (S0, S1, S2, S3) @ S0 => 0;
    (S0, S1, S2, S3) @ S1 => 1;
    (S0, S1, S2, S3) @ S2 => 2;
    (S0, S1, S2, S3) @ S3 => 3;

    (S0, S1, S2, S3, S4) @ S0 => 0;
    (S0, S1, S2, S3, S4) @ S1 => 1;
    (S0, S1, S2, S3, S4) @ S2 => 2;
    (S0, S1, S2, S3, S4) @ S3 => 3;
    (S0, S1, S2, S3, S4) @ S4 => 4;

    (S0, S1, S2, S3, S4, S5) @ S0 => 0;
    (S0, S1, S2, S3, S4, S5) @ S1 => 1;
    (S0, S1, S2, S3, S4, S5) @ S2 => 2;
    (S0, S1, S2, S3, S4, S5) @ S3 => 3;
    (S0, S1, S2, S3, S4, S5) @ S4 => 4;
    (S0, S1, S2, S3, S4, S5) @ S5 => 5;

    (S0, S1, S2, S3, S4, S5, S6) @ S0 => 0;
    (S0, S1, S2, S3, S4, S5, S6) @ S1 => 1;
    (S0, S1, S2, S3, S4, S5, S6) @ S2 => 2;
    (S0, S1, S2, S3, S4, S5, S6) @ S3 => 3;
    (S0, S1, S2, S3, S4, S5, S6) @ S4 => 4;
    (S0, S1, S2, S3, S4, S5, S6) @ S5 => 5;
    (S0, S1, S2, S3, S4, S5, S6) @ S6 => 6;

    (S0, S1, S2, S3, S4, S5, S6, S7) @ S0 => 0;
    (S0, S1, S2, S3, S4, S5, S6, S7) @ S1 => 1;
    (S0, S1, S2, S3, S4, S5, S6, S7) @ S2 => 2;
    (S0, S1, S2, S3, S4, S5, S6, S7) @ S3 => 3;
    (S0, S1, S2, S3, S4, S5, S6, S7) @ S4 => 4;
    (S0, S1, S2, S3, S4, S5, S6, S7) @ S5 => 5;
    (S0, S1, S2, S3, S4, S5, S6, S7) @ S6 => 6;
    (S0, S1, S2, S3, S4, S5, S6, S7) @ S7 => 7;
}

//////////////////////////////////////////////////////////////////////
// Matcher
//////////////////////////////////////////////////////////////////////

/// Lowest offset at which `needle` occurs as a contiguous, order-preserving
/// block of `haystack`, comparing descriptors element-wise. Small-N window
/// scan; runs at conversion time only.
pub(crate) fn locate(haystack: &[OpDesc], needle: &[OpDesc]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    (0..=haystack.len() - needle.len()).find(|&k| haystack[k..k + needle.len()] == *needle)
}

/// Lowest index of a single descriptor, if present.
pub(crate) fn position(ops: &[OpDesc], desc: &OpDesc) -> Option<usize> {
    ops.iter().position(|d| d == desc)
}

/// Name of the first operation declared twice with an identical
/// description, if any.
pub(crate) fn duplicate(ops: &[OpDesc]) -> Option<&'static str> {
    ops.iter()
        .enumerate()
        .find_map(|(i, d)| ops[..i].contains(d).then_some(d.name))
}
