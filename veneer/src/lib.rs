#![warn(missing_docs)]
#![warn(clippy::std_instead_of_core)]
#![doc = include_str!("../README.md")]

// Const-constructible type identity
mod typeid;
pub use typeid::*;

// Operation descriptors, markers, conformance traits
mod op;
pub use op::*;

// Signatures: slot tuples, compile-time indexing, the matcher
mod sig;
pub use sig::*;

// The one-word storage cell and the inline-eligibility policy
mod cell;
pub use cell::*;

// Forwarding entry points
mod trampoline;
pub use trampoline::Trampoline;

// Dispatch table construction and the process-wide registry
mod table;

// The handle itself
mod handle;
pub use handle::*;

// Construction-time diagnostics
mod error;
pub use error::*;

// The `ops!` declaration helper
mod macros;

#[cfg(feature = "tracing")]
#[allow(unused_imports)]
pub(crate) use tracing::{debug, trace};

#[cfg(not(feature = "tracing"))]
#[macro_export]
#[doc(hidden)]
/// Forwards to tracing::trace when the tracing feature is enabled
macro_rules! trace {
    ($($tt:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
#[macro_export]
#[doc(hidden)]
/// Forwards to tracing::debug when the tracing feature is enabled
macro_rules! debug {
    ($($tt:tt)*) => {};
}
