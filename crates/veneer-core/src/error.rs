//! Model error taxonomy
//!
//! Every variant here is fatal to generation: continuing after any of them
//! would emit routines whose frame offsets are wrong for every argument that
//! follows the offending one. Configuration problems (unknown targets,
//! malformed directives) are deliberately *not* errors; the generator warns
//! and skips those.

use thiserror::Error;

/// A shape or kind the requested calling convention cannot marshal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// `Void` used as an argument type
    #[error("argument `{name}` has void type")]
    VoidArgument {
        /// Offending argument name
        name: String,
    },

    /// Composite argument on the sequential convention
    #[error("argument `{name}` is a composite; the sequential convention only marshals scalars")]
    CompositeNotSupported {
        /// Offending argument name
        name: String,
    },

    /// Composite larger than the two-register limit on AAPCS64.
    ///
    /// The procedure-call standard passes these by reference to a
    /// caller-allocated copy; no copy-allocation scheme is implemented, so
    /// they are rejected outright.
    #[error("argument `{name}` is a {size}-byte composite; composites above 16 bytes are passed by reference, which is not supported")]
    CompositeTooLarge {
        /// Offending argument name
        name: String,
        /// Composite size in bytes
        size: usize,
    },

    /// Composite return value (either convention)
    #[error("composite return values are not supported")]
    CompositeReturn,

    /// Integer register list exhausted on the sequential convention.
    ///
    /// That convention never spills to the stack; the list length is a hard
    /// argument-count ceiling.
    #[error("argument `{name}` exhausts the integer register list ({limit} integer arguments max)")]
    IntRegisterExhausted {
        /// Offending argument name
        name: String,
        /// Register list length
        limit: usize,
    },

    /// Float register list exhausted on the sequential convention.
    #[error("argument `{name}` exhausts the float register list ({limit} float arguments max)")]
    FloatRegisterExhausted {
        /// Offending argument name
        name: String,
        /// Register list length
        limit: usize,
    },
}
