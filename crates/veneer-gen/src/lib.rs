//! Veneer generator: per-target calling-convention classifiers and
//! trampoline emission
//!
//! Given a function model (from `veneer-core`) and a per-target library
//! configuration, this crate renders, per target, one compilation unit
//! containing a trampoline routine per function and the initialization
//! routine that resolves each function's symbol into its dispatch slot.
//!
//! # Example
//!
//! ```rust,ignore
//! use veneer_core::{Function, Model, Type, TypeKind};
//! use veneer_gen::{generate, LibraryDirective, TargetConfig};
//!
//! let model = Model::new(vec![Function::new(
//!     "frob",
//!     vec![Type::new("n", TypeKind::U32), Type::new("p", TypeKind::Pointer)],
//!     Type::unnamed(TypeKind::I32),
//! )]);
//!
//! let mut config = TargetConfig::new();
//! config.push(LibraryDirective::new("darwin", "arm64", "libfrob.dylib"));
//!
//! let output = generate(&model, &config)?;
//! for unit in &output.units {
//!     println!("{unit}");
//! }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

/// Assembly text model
pub mod asm;

/// Calling-convention emitters
pub mod conv;

/// Generation driver
pub mod generate;

/// Initialization routine emission
pub mod init;

/// Target registry
pub mod registry;

pub use asm::{Routine, Unit};
pub use conv::{Aapcs64Emitter, Aapcs64State, ConvEmitter, SequentialEmitter};
pub use generate::{generate, generate_with, GenError, LibraryDirective, Output, TargetConfig};
pub use registry::TargetRegistry;
