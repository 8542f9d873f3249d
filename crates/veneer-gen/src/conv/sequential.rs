//! Sequential register convention
//!
//! The simple convention: integer-family arguments consume a fixed ordered
//! integer-register list, floats a fixed float-register list, each with its
//! own running counter, in declaration order. There is no stack spill —
//! exhausting a list is a fatal model error, which makes the list lengths a
//! hard argument-count ceiling — and composites are not marshaled at all;
//! callers with composite signatures must target the full convention.

use veneer_core::{Function, ModelError, Type, TypeKind};

use crate::asm::{float_mov, frame, int_load, Routine};
use crate::conv::{emit_scalar_return, ConvEmitter, FrameCursor};

/// Integer register list, consumed in order.
pub const INT_REGS: [&str; 7] = ["R0", "R1", "R2", "R3", "R4", "R5", "R6"];

/// Float register list, consumed in order.
pub const FLOAT_REGS: [&str; 4] = ["F0", "F1", "F2", "F3"];

/// Sequential-convention classifier and emitter.
///
/// One instance marshals exactly one function; the registry constructs a
/// fresh one per function.
#[derive(Debug, Default)]
pub struct SequentialEmitter {
    frame: FrameCursor,
    next_int: usize,
    next_float: usize,
}

impl SequentialEmitter {
    /// Fresh emitter with all registers free and the frame cursor at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Final frame-cursor position, for offset-agreement checks.
    #[cfg(test)]
    pub(crate) fn frame_position(&self) -> usize {
        self.frame.position()
    }
}

impl ConvEmitter for SequentialEmitter {
    fn emit_arg_move(&mut self, out: &mut Routine, arg: &Type) -> Result<(), ModelError> {
        match &arg.kind {
            TypeKind::Void => Err(ModelError::VoidArgument {
                name: arg.name.clone(),
            }),
            TypeKind::Struct { .. } | TypeKind::Array { .. } => {
                Err(ModelError::CompositeNotSupported {
                    name: arg.name.clone(),
                })
            }
            TypeKind::F32 | TypeKind::F64 => {
                if self.next_float >= FLOAT_REGS.len() {
                    return Err(ModelError::FloatRegisterExhausted {
                        name: arg.name.clone(),
                        limit: FLOAT_REGS.len(),
                    });
                }
                let offset = self.frame.take(arg);
                out.inst(format!(
                    "{} {}, {}",
                    float_mov(arg.size()),
                    frame(&arg.name, offset),
                    FLOAT_REGS[self.next_float],
                ));
                self.next_float += 1;
                Ok(())
            }
            kind => {
                // Integer family and pointers share the integer list.
                if self.next_int >= INT_REGS.len() {
                    return Err(ModelError::IntRegisterExhausted {
                        name: arg.name.clone(),
                        limit: INT_REGS.len(),
                    });
                }
                let offset = self.frame.take(arg);
                out.inst(format!(
                    "{} {}, {}",
                    int_load(arg.size(), kind.is_signed()),
                    frame(&arg.name, offset),
                    INT_REGS[self.next_int],
                ));
                self.next_int += 1;
                Ok(())
            }
        }
    }

    fn emit_return_move(&mut self, out: &mut Routine, func: &Function) -> Result<(), ModelError> {
        emit_scalar_return(out, func)
    }
}
