//! Veneer core: the function/type model and ABI layout engine
//!
//! This crate holds everything the trampoline generator consumes but does not
//! itself generate:
//! - **Model**: the closed type-kind set, typed function signatures, and the
//!   deserialization entry point for the extractor handoff (`model` module)
//! - **Layout**: byte size and natural alignment for any model type
//!   (`layout` module)
//! - **Targets**: the (operating system, architecture) pairs the generator is
//!   keyed by (`target` module)
//! - **Errors**: the model-error taxonomy shared by every classifier
//!   (`error` module)
//!
//! The model is immutable once built. Classifiers never write back into the
//! type tree; anything they derive (ABI padding, register assignments) lives
//! in their own state.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

/// Model error taxonomy
pub mod error;

/// Size and alignment engine
pub mod layout;

/// Function/type model
pub mod model;

/// Target descriptors
pub mod target;

pub use error::ModelError;
pub use model::{Function, Model, Type, TypeKind};
pub use target::{Arch, Os, ParseTargetError, Target};
