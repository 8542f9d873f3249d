//! Size and alignment engine
//!
//! Pure, total functions over the closed kind set. Nothing here mutates the
//! type tree, so the same model can be laid out for any number of targets.
//!
//! Layout rules: scalars are 1/2/4/8 bytes by width and align to their size;
//! pointers and native ints are pointer-width; an array is `len` copies of its
//! element; a struct is the plain sum of its field sizes and aligns to the
//! largest field alignment. ABI rounding (padding to an 8-byte multiple for
//! composites, widening of sub-8-byte stack arguments) is a classification
//! concern and is reported by the classifiers as a side value, never folded
//! into these numbers.

use crate::model::TypeKind;

/// Pointer width in bytes on every supported target.
pub const POINTER_SIZE: usize = 8;

/// Round `n` up to the next multiple of `align`.
///
/// `align` of zero or one is a no-op.
pub fn round_up(n: usize, align: usize) -> usize {
    if align <= 1 {
        return n;
    }
    n.div_ceil(align) * align
}

/// Byte size of a type kind.
pub fn size_of(kind: &TypeKind) -> usize {
    match kind {
        TypeKind::Void => 0,
        TypeKind::I8 | TypeKind::U8 => 1,
        TypeKind::I16 | TypeKind::U16 => 2,
        TypeKind::I32 | TypeKind::U32 | TypeKind::F32 => 4,
        TypeKind::I64 | TypeKind::U64 | TypeKind::F64 => 8,
        TypeKind::Int | TypeKind::Uint | TypeKind::Pointer => POINTER_SIZE,
        TypeKind::Struct { fields } => fields.iter().map(|f| size_of(&f.kind)).sum(),
        TypeKind::Array { elem, len } => size_of(&elem.kind) * len,
    }
}

/// Natural alignment of a type kind.
///
/// Scalars align to their size; composites to the maximum alignment of their
/// members; `Void` and the empty struct degenerate to 1.
pub fn align_of(kind: &TypeKind) -> usize {
    match kind {
        TypeKind::Void => 1,
        TypeKind::Struct { fields } => fields
            .iter()
            .map(|f| align_of(&f.kind))
            .max()
            .unwrap_or(1),
        TypeKind::Array { elem, .. } => align_of(&elem.kind),
        scalar => size_of(scalar),
    }
}
