//! Operation descriptors and the marker traits that declare them.
//!
//! An operation is declared once, as a zero-sized marker type implementing
//! [`Op`] or [`OpMut`] (usually through the [`ops!`](crate::ops) macro), and
//! from then on exists in two forms: as a type, for statically-checked
//! invocation, and as an [`OpDesc`] value, for signature matching at
//! conversion time.

use crate::ConstTypeId;

/// How an operation reaches the wrapped object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Access {
    /// `&self` receiver; may not mutate the wrapped object.
    Shared,
    /// `&mut self` receiver; may mutate the wrapped object.
    Exclusive,
}

/// Description of one named operation: name, receiver access, return type
/// and parameter types. Built once, at declaration, and never mutated.
///
/// Two descriptors are equal iff every field is: same name, same access,
/// same return type, same parameter list. There is no covariance and no
/// implicit conversion; this exact equality is what signature matching runs
/// on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OpDesc {
    /// Operation name, as declared.
    pub name: &'static str,
    /// Receiver access.
    pub access: Access,
    /// Return type identity.
    pub ret: ConstTypeId,
    /// Parameter type identities, in order.
    pub params: &'static [ConstTypeId],
}

impl OpDesc {
    /// Describe an operation from its argument tuple and return type.
    #[must_use]
    pub const fn new<A: ArgPack, R: 'static>(name: &'static str, access: Access) -> Self {
        OpDesc {
            name,
            access,
            ret: ConstTypeId::of::<R>(),
            params: A::TYPES,
        }
    }
}

/// An argument tuple that can cross the erased calling convention.
///
/// Implemented for tuples of up to eight elements. Elements are `'static`
/// and pass by value: the trampoline moves the whole tuple in and the result
/// out through type-erased slots.
pub trait ArgPack: 'static {
    /// Type identities of the tuple elements, in order.
    const TYPES: &'static [ConstTypeId];
}

impl ArgPack for () {
    const TYPES: &'static [ConstTypeId] = &[];
}

macro_rules! impl_arg_pack {
    ($($($ty:ident)+;)+) => {$(
        impl<$($ty: 'static),+> ArgPack for ($($ty,)+) {
            const TYPES: &'static [ConstTypeId] = &[$(ConstTypeId::of::<$ty>()),+];
        }
    )+};
}

impl_arg_pack! {
    A;
    A B;
    A B C;
    A B C D;
    A B C D E;
    A B C D E F;
    A B C D E F G;
    A B C D E F G H;
}

/// A named operation with a shared (`&self`) receiver.
///
/// Implemented by zero-sized marker types; see [`ops!`](crate::ops).
pub trait Op: 'static {
    /// Argument tuple.
    type Args: ArgPack;
    /// Return type.
    type Ret: 'static;
    /// Operation name, as it appears in capability signatures.
    const NAME: &'static str;
}

/// A named operation with an exclusive (`&mut self`) receiver.
///
/// Implemented by zero-sized marker types; see [`ops!`](crate::ops).
pub trait OpMut: 'static {
    /// Argument tuple.
    type Args: ArgPack;
    /// Return type.
    type Ret: 'static;
    /// Operation name, as it appears in capability signatures.
    const NAME: &'static str;
}

/// Conformance of a concrete type to a shared operation.
///
/// This is the structural interface check: a type satisfies an operation by
/// providing this impl, and a missing impl surfaces as an unsatisfied bound
/// at the call site that builds the dispatch table.
pub trait Call<O: Op> {
    /// Run the operation against `self`.
    fn call(&self, args: O::Args) -> O::Ret;
}

/// Conformance of a concrete type to an exclusive operation.
pub trait CallMut<O: OpMut> {
    /// Run the operation against `self`, possibly mutating it.
    fn call_mut(&mut self, args: O::Args) -> O::Ret;
}
