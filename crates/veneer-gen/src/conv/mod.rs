//! Calling-convention emitters
//!
//! Each convention implements [`ConvEmitter`]: the five-step capability set
//! the trampoline driver composes into one routine per function. The registry
//! constructs one emitter instance **per (function, target) pair**, so the
//! classification counters inside an emitter can never leak across functions;
//! isolation is structural, not conventional.

use veneer_core::layout::round_up;
use veneer_core::{Function, ModelError, Type, TypeKind};

use crate::asm::{float_mov, frame, int_store, slot, Routine, SCRATCH_REG};

pub mod aapcs64;
pub mod sequential;

pub use aapcs64::{Aapcs64Emitter, Aapcs64State};
pub use sequential::SequentialEmitter;

/// Runtime symbol notified before a blocking native call.
///
/// Tells the scheduler the current logical task is entering native code and
/// may be unscheduled from its carrier thread.
pub const PRE_CALL_SYMBOL: &str = "runtime.native_call_enter";

/// Runtime symbol notified after the native call returns.
pub const POST_CALL_SYMBOL: &str = "runtime.native_call_exit";

/// The capability set a calling convention exposes to the driver.
///
/// The safepoint bracket and the slot dispatch are identical on every
/// supported convention, so they have default bodies; conventions only have
/// to decide where arguments and return values live.
pub trait ConvEmitter {
    /// Notify the scheduler that a blocking native call is about to start.
    fn emit_pre_call(&mut self, out: &mut Routine) {
        out.inst(format!("CALL {PRE_CALL_SYMBOL}"));
    }

    /// Marshal one argument from the caller's frame into its register or
    /// stack slot. Arguments must be presented in declaration order.
    fn emit_arg_move(&mut self, out: &mut Routine, arg: &Type) -> Result<(), ModelError>;

    /// Dispatch through the function's resolved-pointer slot.
    fn emit_call(&mut self, out: &mut Routine, func: &Function) {
        out.inst(format!("MOVD {}, {}", slot(&func.name), SCRATCH_REG));
        out.inst(format!("CALL {SCRATCH_REG}"));
    }

    /// Marshal the return value back into the caller's frame.
    ///
    /// Never called for `Void` returns; the driver omits the move entirely.
    fn emit_return_move(&mut self, out: &mut Routine, func: &Function) -> Result<(), ModelError>;

    /// Notify the scheduler that managed execution has resumed.
    fn emit_post_call(&mut self, out: &mut Routine) {
        out.inst(format!("CALL {POST_CALL_SYMBOL}"));
    }
}

/// Caller-frame read cursor.
///
/// The caller's frame layout is fixed and supplied: arguments sit at
/// consecutive naturally-aligned offsets in declaration order. The cursor
/// aligns up, hands out the slot offset, and advances by the raw size.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct FrameCursor {
    offset: usize,
}

impl FrameCursor {
    /// Align the cursor up without taking a slot (composite bases).
    pub(crate) fn align_to(&mut self, align: usize) {
        self.offset = round_up(self.offset, align);
    }

    /// Take the naturally-aligned slot for `ty` and advance past it.
    pub(crate) fn take(&mut self, ty: &Type) -> usize {
        self.offset = round_up(self.offset, ty.align());
        let slot = self.offset;
        self.offset += ty.size();
        slot
    }

    /// Current cursor position.
    pub(crate) fn position(&self) -> usize {
        self.offset
    }

    /// Advance past `ty` without emitting anything, using the same rules as
    /// the emitters' reads: scalars at natural alignment, composites aligned
    /// to the aggregate then walked member by member. Keeping this walk
    /// identical is what makes an independently replayed cursor land on the
    /// same offsets as the emitted moves.
    pub(crate) fn skip(&mut self, ty: &Type) {
        match &ty.kind {
            TypeKind::Struct { fields } => {
                self.align_to(ty.align());
                for field in fields {
                    self.skip(field);
                }
            }
            TypeKind::Array { elem, len } => {
                self.align_to(ty.align());
                for _ in 0..*len {
                    self.skip(elem);
                }
            }
            _ => {
                self.take(ty);
            }
        }
    }
}

/// Frame offset of the return-value slot.
///
/// Deliberately recomputed from scratch — a fresh cursor replayed over every
/// argument, rounded up to 8 at the end — rather than derived from any
/// classifier's running cursor. A classifier cursor that drifted would
/// silently corrupt the return value; this way the drift shows up as a test
/// failure instead. Composites must be walked member by member here exactly
/// as the emitters read them: internal alignment padding (a `{U8, U64}`
/// struct spans 16 frame bytes, not 9) is part of the frame extent.
pub(crate) fn return_offset(args: &[Type]) -> usize {
    let mut cursor = FrameCursor::default();
    for arg in args {
        cursor.skip(arg);
    }
    round_up(cursor.position(), 8)
}

/// Shared return-value move: scalar results come back in `R0` (integer
/// family, pointers) or `F0` (floats) on every supported convention.
pub(crate) fn emit_scalar_return(out: &mut Routine, func: &Function) -> Result<(), ModelError> {
    let ret = &func.ret;
    let offset = return_offset(&func.args);
    match &ret.kind {
        TypeKind::Void => Ok(()),
        TypeKind::Struct { .. } | TypeKind::Array { .. } => Err(ModelError::CompositeReturn),
        TypeKind::F32 | TypeKind::F64 => {
            out.inst(format!(
                "{} F0, {}",
                float_mov(ret.size()),
                frame("ret", offset),
            ));
            Ok(())
        }
        _ => {
            out.inst(format!(
                "{} R0, {}",
                int_store(ret.size()),
                frame("ret", offset),
            ));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veneer_core::TypeKind;

    #[test]
    fn frame_cursor_aligns_then_advances() {
        let mut cursor = FrameCursor::default();
        assert_eq!(cursor.take(&Type::new("a", TypeKind::U8)), 0);
        assert_eq!(cursor.take(&Type::new("b", TypeKind::Pointer)), 8);
        assert_eq!(cursor.position(), 16);
    }

    #[test]
    fn return_offset_rounds_to_eight() {
        let args = vec![
            Type::new("a", TypeKind::U32),
            Type::new("b", TypeKind::Pointer),
        ];
        assert_eq!(return_offset(&args), 16);

        let args = vec![Type::new("a", TypeKind::U8)];
        assert_eq!(return_offset(&args), 8);

        assert_eq!(return_offset(&[]), 0);
    }

    #[test]
    fn return_offset_counts_composite_internal_padding() {
        let s = Type::new(
            "s",
            TypeKind::Struct {
                fields: vec![Type::unnamed(TypeKind::U8), Type::unnamed(TypeKind::U64)],
            },
        );
        assert_eq!(s.size(), 9);
        // Members sit at frame 0 and 8, so the struct's frame extent is 16
        // and the following byte argument lands at 16, not 9.
        assert_eq!(return_offset(&[s.clone()]), 16);
        assert_eq!(return_offset(&[s, Type::new("x", TypeKind::U8)]), 24);
    }
}
