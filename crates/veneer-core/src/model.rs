//! Function/type model handed over by the binding extractor
//!
//! The extractor parses annotated source text, builds one [`Function`] per
//! declared native binding, and hands the whole batch to the generator as a
//! [`Model`] (usually serialized as JSON). The kind set is closed: every
//! argument and return type uses exactly one [`TypeKind`] variant, and the
//! layout engine covers all of them.

use serde::{Deserialize, Serialize};

use crate::layout;

/// The closed set of type kinds the generator understands.
///
/// Scalar widths are fixed; `Int`/`Uint` and `Pointer` are pointer-width.
/// `Struct` and `Array` are the only composites, and only the AAPCS64
/// classifier accepts them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeKind {
    /// No value; only meaningful as a return type
    Void,
    /// Untyped pointer, pointer-width
    Pointer,
    /// Signed 8-bit integer
    I8,
    /// Signed 16-bit integer
    I16,
    /// Signed 32-bit integer
    I32,
    /// Signed 64-bit integer
    I64,
    /// Unsigned 8-bit integer
    U8,
    /// Unsigned 16-bit integer
    U16,
    /// Unsigned 32-bit integer
    U32,
    /// Unsigned 64-bit integer
    U64,
    /// Native-width signed integer
    Int,
    /// Native-width unsigned integer
    Uint,
    /// 32-bit float
    F32,
    /// 64-bit float
    F64,
    /// Ordered fields, laid out in declaration order
    Struct {
        /// Field types, in declaration order
        fields: Vec<Type>,
    },
    /// Fixed-length array
    Array {
        /// Element type
        elem: Box<Type>,
        /// Element count
        len: usize,
    },
}

impl TypeKind {
    /// True for the no-value kind.
    pub fn is_void(&self) -> bool {
        matches!(self, TypeKind::Void)
    }

    /// True for the integer family, signed or unsigned, any width.
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            TypeKind::I8
                | TypeKind::I16
                | TypeKind::I32
                | TypeKind::I64
                | TypeKind::U8
                | TypeKind::U16
                | TypeKind::U32
                | TypeKind::U64
                | TypeKind::Int
                | TypeKind::Uint
        )
    }

    /// True for signed integers (controls sign-extending loads).
    pub fn is_signed(&self) -> bool {
        matches!(
            self,
            TypeKind::I8 | TypeKind::I16 | TypeKind::I32 | TypeKind::I64 | TypeKind::Int
        )
    }

    /// True for the pointer kind.
    pub fn is_pointer(&self) -> bool {
        matches!(self, TypeKind::Pointer)
    }

    /// True for floating-point scalars.
    pub fn is_float(&self) -> bool {
        matches!(self, TypeKind::F32 | TypeKind::F64)
    }

    /// True for struct and array kinds.
    pub fn is_composite(&self) -> bool {
        matches!(self, TypeKind::Struct { .. } | TypeKind::Array { .. })
    }
}

/// A model type: a kind plus the source parameter identifier.
///
/// The name is used only to label the caller-frame slot the trampoline reads
/// from; it carries no ABI meaning. Size and alignment are never stored here,
/// they are recomputed by [`layout`] on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Type {
    /// Source parameter identifier (frame slot label)
    pub name: String,
    /// Type kind
    pub kind: TypeKind,
}

impl Type {
    /// Create a named type (arguments).
    pub fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Type {
            name: name.into(),
            kind,
        }
    }

    /// Create an unnamed type (return types, composite members).
    pub fn unnamed(kind: TypeKind) -> Self {
        Type {
            name: String::new(),
            kind,
        }
    }

    /// Byte size, recomputed from the kind.
    pub fn size(&self) -> usize {
        layout::size_of(&self.kind)
    }

    /// Natural alignment, recomputed from the kind.
    pub fn align(&self) -> usize {
        layout::align_of(&self.kind)
    }
}

/// A native function binding.
///
/// Argument order is call-site left-to-right and fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Function {
    /// Declared identifier; also names the dispatch slot
    pub name: String,
    /// Symbol to resolve in the library, when it differs from `name`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_name: Option<String>,
    /// Arguments, in declaration order
    pub args: Vec<Type>,
    /// Return type; kind `Void` marks no return value
    pub ret: Type,
}

impl Function {
    /// Create a function whose link name equals its declared name.
    pub fn new(name: impl Into<String>, args: Vec<Type>, ret: Type) -> Self {
        Function {
            name: name.into(),
            link_name: None,
            args,
            ret,
        }
    }

    /// Override the symbol resolved in the library.
    pub fn with_link_name(mut self, link_name: impl Into<String>) -> Self {
        self.link_name = Some(link_name.into());
        self
    }

    /// The symbol resolved at initialization time.
    ///
    /// Defaults to the declared name unless a link-name directive overrode it.
    pub fn symbol(&self) -> &str {
        self.link_name.as_deref().unwrap_or(&self.name)
    }
}

/// The ordered function list handed over by the extractor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    /// Functions, in source order
    pub functions: Vec<Function>,
}

impl Model {
    /// Create a model from an ordered function list.
    pub fn new(functions: Vec<Function>) -> Self {
        Model { functions }
    }

    /// Deserialize a model from the extractor's JSON handoff.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
