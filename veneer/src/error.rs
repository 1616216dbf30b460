//! Construction-time diagnostics.
//!
//! Every failure the engine reports is surfaced while a handle or dispatch
//! table is being built. Invocation has no error path of its own: it is a
//! direct forward, and whatever the concrete operation raises propagates
//! unchanged.

use core::fmt;

/// A contract violation detected while building a handle or a dispatch
/// table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// The value is too large or too aligned for the one-word inline cell,
    /// and inline storage was requested by lifting it by value.
    Oversized {
        /// Size of the rejected type, in bytes.
        size: usize,
        /// Alignment of the rejected type, in bytes.
        align: usize,
    },
    /// The signature declares an exclusive operation, but storage would be
    /// an inline copy, which is reachable through shared views only.
    InlineMutation {
        /// Name of the offending operation.
        operation: &'static str,
    },
    /// The signature declares an exclusive operation, but the object was
    /// lifted from a shared borrow.
    SharedMutation {
        /// Name of the offending operation.
        operation: &'static str,
    },
    /// Two declared operations carry an identical description: same name,
    /// parameters, return type and receiver access.
    DuplicateOperation {
        /// Name of the duplicated operation.
        operation: &'static str,
    },
    /// Adapter synthesis found no source operation matching a target
    /// declaration.
    UnmatchedOperation {
        /// Name of the unmatched operation.
        operation: &'static str,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Oversized { size, align } => write!(
                f,
                "value of size {size} and alignment {align} does not fit the one-word inline cell; lift it by reference instead"
            ),
            Error::InlineMutation { operation } => write!(
                f,
                "operation `{operation}` mutates, but an inline copy is reachable through shared views only; lift the value by mutable reference instead"
            ),
            Error::SharedMutation { operation } => write!(
                f,
                "operation `{operation}` mutates, but the object was lifted from a shared borrow"
            ),
            Error::DuplicateOperation { operation } => write!(
                f,
                "operation `{operation}` is declared twice with an identical description"
            ),
            Error::UnmatchedOperation { operation } => write!(
                f,
                "source signature has no operation matching `{operation}`"
            ),
        }
    }
}

impl core::error::Error for Error {}
