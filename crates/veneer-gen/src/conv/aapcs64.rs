//! AAPCS64 calling convention
//!
//! The full ARM 64-bit procedure-call standard, as far as the model's kind
//! set reaches: separate general and SIMD/float register files, homogeneous
//! floating-point aggregates, composite decomposition into consecutive
//! registers, and stack spill once a file is exhausted.
//!
//! Classification threads three counters through the argument list:
//! `ngrn` (next general register), `nsrn` (next SIMD/float register) and
//! `nsaa` (next stack argument byte address). The rules below are evaluated
//! in a fixed order for every argument; the first rule that allocates wins.
//! One emitter instance classifies exactly one function, so the counters can
//! never leak into the next routine.

use veneer_core::layout::round_up;
use veneer_core::{Function, ModelError, Type, TypeKind};

use crate::asm::{float_mov, frame, int_load, int_store, stack, Routine, SCRATCH_REG};
use crate::conv::{emit_scalar_return, ConvEmitter, FrameCursor};

/// General register file, `x0`–`x7` in the standard's numbering.
pub const GP_REGS: [&str; 8] = ["R0", "R1", "R2", "R3", "R4", "R5", "R6", "R7"];

/// SIMD/float register file, `v0`–`v7`.
pub const FP_REGS: [&str; 8] = ["F0", "F1", "F2", "F3", "F4", "F5", "F6", "F7"];

/// Base of the outgoing stack argument area.
pub const NSAA_BASE: usize = 16;

/// The three classification counters.
///
/// A fresh value per (function, target) pair; exposed so tests can assert
/// counter invariants directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Aapcs64State {
    /// Next general register index
    pub ngrn: usize,
    /// Next SIMD/float register index
    pub nsrn: usize,
    /// Next stack argument byte address
    pub nsaa: usize,
}

impl Default for Aapcs64State {
    fn default() -> Self {
        Aapcs64State {
            ngrn: 0,
            nsrn: 0,
            nsaa: NSAA_BASE,
        }
    }
}

/// ABI rounding applied to composite arguments: their size is padded up to
/// the nearest multiple of 8 bytes before register or stack placement.
///
/// Reported as a side value — the type tree itself is never annotated, so
/// re-deriving the padding for another target always yields the same number.
pub fn abi_padding(ty: &Type) -> usize {
    if ty.kind.is_composite() {
        round_up(ty.size(), 8) - ty.size()
    } else {
        0
    }
}

/// Homogeneous floating-point aggregate: 2–4 identical `F32`/`F64` members,
/// declared as either an array or a struct. Returns (member size, count).
fn hfa(ty: &Type) -> Option<(usize, usize)> {
    match &ty.kind {
        TypeKind::Array { elem, len } if elem.kind.is_float() && (2..=4).contains(len) => {
            Some((elem.size(), *len))
        }
        TypeKind::Struct { fields }
            if (2..=4).contains(&fields.len())
                && fields[0].kind.is_float()
                && fields.iter().all(|f| f.kind == fields[0].kind) =>
        {
            Some((fields[0].size(), fields.len()))
        }
        _ => None,
    }
}

/// Flatten a composite into its scalar leaves, in layout order.
fn scalar_members<'a>(ty: &'a Type, out: &mut Vec<&'a Type>) {
    match &ty.kind {
        TypeKind::Struct { fields } => {
            for field in fields {
                scalar_members(field, out);
            }
        }
        TypeKind::Array { elem, len } => {
            for _ in 0..*len {
                scalar_members(elem, out);
            }
        }
        _ => out.push(ty),
    }
}

/// AAPCS64 classifier and emitter.
#[derive(Debug, Default)]
pub struct Aapcs64Emitter {
    frame: FrameCursor,
    state: Aapcs64State,
}

impl Aapcs64Emitter {
    /// Fresh emitter: empty register files, stack cursor at [`NSAA_BASE`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Current counter values.
    pub fn state(&self) -> Aapcs64State {
        self.state
    }

    /// Final frame-cursor position, for offset-agreement checks.
    #[cfg(test)]
    pub(crate) fn frame_position(&self) -> usize {
        self.frame.position()
    }

    /// Spill one scalar to the stack, widened to a full double-word.
    ///
    /// The extending load leaves the value in the low bits of the scratch
    /// register and the 8-byte store writes the whole word, so sub-8-byte
    /// arguments occupy a full slot with unspecified high bits.
    fn spill_scalar(&mut self, out: &mut Routine, arg: &Type) {
        self.state.nsaa = round_up(self.state.nsaa, arg.align().max(8));
        let offset = self.frame.take(arg);
        out.inst(format!(
            "{} {}, {}",
            int_load(arg.size(), arg.kind.is_signed()),
            frame(&arg.name, offset),
            SCRATCH_REG,
        ));
        out.inst(format!("MOVD {}, {}", SCRATCH_REG, stack(self.state.nsaa)));
        self.state.nsaa += arg.size().max(8);
    }

    /// Copy a composite to the stack member by member through the scratch
    /// register. `align` is the placement alignment of the whole aggregate;
    /// the stack cursor advances by the 8-byte-rounded size.
    fn spill_composite(&mut self, out: &mut Routine, arg: &Type, align: usize) {
        self.state.nsaa = round_up(self.state.nsaa, align);
        self.frame.align_to(arg.align());
        let mut members = Vec::new();
        scalar_members(arg, &mut members);
        let mut store_at = self.state.nsaa;
        for member in members {
            let offset = self.frame.take(member);
            store_at = round_up(store_at, member.align());
            out.inst(format!(
                "{} {}, {}",
                int_load(member.size(), member.kind.is_signed()),
                frame(&arg.name, offset),
                SCRATCH_REG,
            ));
            out.inst(format!(
                "{} {}, {}",
                int_store(member.size()),
                SCRATCH_REG,
                stack(store_at),
            ));
            store_at += member.size();
        }
        self.state.nsaa += arg.size() + abi_padding(arg);
    }
}

impl ConvEmitter for Aapcs64Emitter {
    fn emit_arg_move(&mut self, out: &mut Routine, arg: &Type) -> Result<(), ModelError> {
        if arg.kind.is_void() {
            return Err(ModelError::VoidArgument {
                name: arg.name.clone(),
            });
        }

        // Floating-point scalars: next SIMD/float register, else widened to
        // the stack.
        if arg.kind.is_float() {
            if self.state.nsrn < FP_REGS.len() {
                let offset = self.frame.take(arg);
                out.inst(format!(
                    "{} {}, {}",
                    float_mov(arg.size()),
                    frame(&arg.name, offset),
                    FP_REGS[self.state.nsrn],
                ));
                self.state.nsrn += 1;
                return Ok(());
            }
            self.spill_scalar(out, arg);
            return Ok(());
        }

        // Homogeneous floating-point aggregates: one register per member if
        // enough of the SIMD file is left, otherwise the file is closed and
        // the aggregate goes to the stack, rounded to an 8-byte multiple and
        // aligned to the larger of 8 and its (rounded) size.
        if let Some((member_size, count)) = hfa(arg) {
            if self.state.nsrn + count <= FP_REGS.len() {
                self.frame.align_to(arg.align());
                let mut members = Vec::new();
                scalar_members(arg, &mut members);
                for member in members {
                    let offset = self.frame.take(member);
                    out.inst(format!(
                        "{} {}, {}",
                        float_mov(member_size),
                        frame(&arg.name, offset),
                        FP_REGS[self.state.nsrn],
                    ));
                    self.state.nsrn += 1;
                }
                return Ok(());
            }
            self.state.nsrn = FP_REGS.len();
            let padded = arg.size() + abi_padding(arg);
            self.spill_composite(out, arg, padded.max(8));
            return Ok(());
        }

        // Composites above two double-words are passed by reference to a
        // caller-allocated copy per the standard; rejected here.
        if arg.kind.is_composite() && arg.size() > 16 {
            return Err(ModelError::CompositeTooLarge {
                name: arg.name.clone(),
                size: arg.size(),
            });
        }

        // Integer and pointer scalars: next general register.
        if (arg.kind.is_integer() || arg.kind.is_pointer()) && arg.size() <= 8 {
            if self.state.ngrn < GP_REGS.len() {
                let offset = self.frame.take(arg);
                out.inst(format!(
                    "{} {}, {}",
                    int_load(arg.size(), arg.kind.is_signed()),
                    frame(&arg.name, offset),
                    GP_REGS[self.state.ngrn],
                ));
                self.state.ngrn += 1;
                return Ok(());
            }
        }

        // 16-byte-aligned arguments start at an even register index.
        if arg.align() == 16 && self.state.ngrn % 2 == 1 {
            self.state.ngrn += 1;
        }

        // 16-byte integral values occupy a register pair, low double-word
        // first. (No current kind is this wide; kept for rule completeness.)
        if arg.kind.is_integer() && arg.size() == 16 && self.state.ngrn < GP_REGS.len() - 1 {
            self.frame.align_to(arg.align());
            let half = Type::unnamed(TypeKind::U64);
            for _ in 0..2 {
                let offset = self.frame.take(&half);
                out.inst(format!(
                    "MOVD {}, {}",
                    frame(&arg.name, offset),
                    GP_REGS[self.state.ngrn],
                ));
                self.state.ngrn += 1;
            }
            return Ok(());
        }

        // Small composites decompose member by member into consecutive
        // general registers when the remaining file holds their double-word
        // count.
        if arg.kind.is_composite() {
            let dwords = (arg.size() + abi_padding(arg)) / 8;
            if dwords <= GP_REGS.len() - self.state.ngrn {
                self.frame.align_to(arg.align());
                let mut members = Vec::new();
                scalar_members(arg, &mut members);
                if self.state.ngrn + members.len() <= GP_REGS.len() {
                    for member in members {
                        let offset = self.frame.take(member);
                        out.inst(format!(
                            "{} {}, {}",
                            int_load(member.size(), member.kind.is_signed()),
                            frame(&arg.name, offset),
                            GP_REGS[self.state.ngrn],
                        ));
                        self.state.ngrn += 1;
                    }
                    return Ok(());
                }
            }
            self.state.ngrn = GP_REGS.len();
            self.spill_composite(out, arg, arg.align().max(8));
            return Ok(());
        }

        // Stack fallthrough: the general file is exhausted.
        self.state.ngrn = GP_REGS.len();
        self.spill_scalar(out, arg);
        Ok(())
    }

    fn emit_return_move(&mut self, out: &mut Routine, func: &Function) -> Result<(), ModelError> {
        emit_scalar_return(out, func)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conv::return_offset;

    fn arg(name: &str, kind: TypeKind) -> Type {
        Type::new(name, kind)
    }

    fn padded_struct(name: &str) -> Type {
        arg(
            name,
            TypeKind::Struct {
                fields: vec![Type::unnamed(TypeKind::U8), Type::unnamed(TypeKind::U64)],
            },
        )
    }

    fn float_pair(name: &str) -> Type {
        arg(
            name,
            TypeKind::Struct {
                fields: vec![Type::unnamed(TypeKind::F32), Type::unnamed(TypeKind::F32)],
            },
        )
    }

    fn emit_args(args: &[Type]) -> (Aapcs64Emitter, Routine) {
        let mut emitter = Aapcs64Emitter::new();
        let mut routine = Routine::new("t");
        for a in args {
            emitter.emit_arg_move(&mut routine, a).unwrap();
        }
        (emitter, routine)
    }

    #[test]
    fn counters_after_mixed_scalars() {
        let args = vec![
            arg("a", TypeKind::U32),
            arg("b", TypeKind::F32),
            arg("c", TypeKind::Pointer),
        ];
        let (emitter, routine) = emit_args(&args);
        let state = emitter.state();
        assert_eq!(state.ngrn, 2);
        assert_eq!(state.nsrn, 1);
        assert_eq!(state.nsaa, NSAA_BASE);

        let text = routine.to_string();
        assert!(text.contains("\tMOVWU a+0(FP), R0\n"));
        assert!(text.contains("\tFMOVS b+4(FP), F0\n"));
        assert!(text.contains("\tMOVD c+8(FP), R1\n"));
    }

    #[test]
    fn register_files_are_independent() {
        let args = vec![
            arg("a", TypeKind::I64),
            arg("x", TypeKind::F64),
            arg("b", TypeKind::I8),
            arg("y", TypeKind::F64),
        ];
        let (emitter, routine) = emit_args(&args);
        assert_eq!(emitter.state().ngrn, 2);
        assert_eq!(emitter.state().nsrn, 2);

        let text = routine.to_string();
        assert!(text.contains("\tMOVB b+16(FP), R1\n"));
        assert!(text.contains("\tFMOVD y+24(FP), F1\n"));
    }

    #[test]
    fn hfa_takes_one_register_per_member() {
        let args = vec![float_pair("p")];
        let (emitter, routine) = emit_args(&args);
        assert_eq!(emitter.state().nsrn, 2);
        assert_eq!(emitter.state().ngrn, 0);

        let text = routine.to_string();
        assert!(text.contains("\tFMOVS p+0(FP), F0\n"));
        assert!(text.contains("\tFMOVS p+4(FP), F1\n"));
    }

    #[test]
    fn hfa_array_form_is_recognized() {
        let triple = arg(
            "v",
            TypeKind::Array {
                elem: Box::new(Type::unnamed(TypeKind::F64)),
                len: 3,
            },
        );
        let (emitter, routine) = emit_args(&[triple]);
        assert_eq!(emitter.state().nsrn, 3);
        let text = routine.to_string();
        assert!(text.contains("\tFMOVD v+0(FP), F0\n"));
        assert!(text.contains("\tFMOVD v+8(FP), F1\n"));
        assert!(text.contains("\tFMOVD v+16(FP), F2\n"));
    }

    #[test]
    fn hfa_overflow_closes_simd_file_and_spills() {
        let mut args: Vec<Type> = (0..7)
            .map(|i| arg(&format!("f{i}"), TypeKind::F64))
            .collect();
        args.push(float_pair("p"));
        let (emitter, routine) = emit_args(&args);

        let state = emitter.state();
        assert_eq!(state.nsrn, FP_REGS.len());
        // Two 4-byte members copied to the stack; cursor advances by the
        // 8-byte-rounded aggregate size.
        assert_eq!(state.nsaa, NSAA_BASE + 8);

        let text = routine.to_string();
        assert!(text.contains("\tMOVWU p+56(FP), R16\n"));
        assert!(text.contains("\tMOVW R16, 16(SP)\n"));
        assert!(text.contains("\tMOVW R16, 20(SP)\n"));
    }

    #[test]
    fn small_composite_decomposes_into_general_registers() {
        let s = arg(
            "s",
            TypeKind::Struct {
                fields: vec![Type::unnamed(TypeKind::U32), Type::unnamed(TypeKind::U32)],
            },
        );
        let (emitter, routine) = emit_args(&[s]);
        assert_eq!(emitter.state().ngrn, 2);

        let text = routine.to_string();
        assert!(text.contains("\tMOVWU s+0(FP), R0\n"));
        assert!(text.contains("\tMOVWU s+4(FP), R1\n"));
    }

    #[test]
    fn composite_above_sixteen_bytes_is_fatal() {
        let s = arg(
            "big",
            TypeKind::Struct {
                fields: vec![
                    Type::unnamed(TypeKind::U64),
                    Type::unnamed(TypeKind::U64),
                    Type::unnamed(TypeKind::U64),
                ],
            },
        );
        let mut emitter = Aapcs64Emitter::new();
        let mut routine = Routine::new("t");
        assert_eq!(
            emitter.emit_arg_move(&mut routine, &s),
            Err(ModelError::CompositeTooLarge {
                name: "big".to_string(),
                size: 24,
            }),
        );
    }

    #[test]
    fn ninth_integer_argument_spills_widened() {
        let mut args: Vec<Type> = (0..8)
            .map(|i| arg(&format!("a{i}"), TypeKind::I64))
            .collect();
        args.push(arg("tail", TypeKind::U16));
        let (emitter, routine) = emit_args(&args);

        let state = emitter.state();
        assert_eq!(state.ngrn, GP_REGS.len());
        // Widened to a full double-word despite being 2 bytes.
        assert_eq!(state.nsaa, NSAA_BASE + 8);

        let text = routine.to_string();
        assert!(text.contains("\tMOVHU tail+64(FP), R16\n"));
        assert!(text.contains("\tMOVD R16, 16(SP)\n"));
    }

    #[test]
    fn spilled_arguments_pack_the_stack_in_order() {
        let mut args: Vec<Type> = (0..8)
            .map(|i| arg(&format!("a{i}"), TypeKind::I64))
            .collect();
        args.push(arg("s0", TypeKind::U64));
        args.push(arg("s1", TypeKind::U8));
        let (emitter, routine) = emit_args(&args);

        assert_eq!(emitter.state().nsaa, NSAA_BASE + 16);
        let text = routine.to_string();
        assert!(text.contains("\tMOVD R16, 16(SP)\n"));
        assert!(text.contains("\tMOVD R16, 24(SP)\n"));
    }

    #[test]
    fn padded_composite_members_read_at_aligned_offsets() {
        // {U8, U64} spans 16 frame bytes (members at 0 and 8), so the byte
        // argument after it sits at 16 and the return slot clears it at 24.
        let args = vec![padded_struct("s"), arg("x", TypeKind::U8)];
        let (emitter, routine) = emit_args(&args);
        assert_eq!(emitter.state().ngrn, 3);

        let text = routine.to_string();
        assert!(text.contains("\tMOVBU s+0(FP), R0\n"));
        assert!(text.contains("\tMOVD s+8(FP), R1\n"));
        assert!(text.contains("\tMOVBU x+16(FP), R2\n"));
        assert_eq!(return_offset(&args), 24);
    }

    #[test]
    fn return_offset_agrees_with_frame_cursor() {
        let scalar_args = vec![
            arg("flag", TypeKind::U8),
            arg("buf", TypeKind::Pointer),
            arg("n", TypeKind::I16),
        ];
        let (emitter, _) = emit_args(&scalar_args);
        assert_eq!(
            return_offset(&scalar_args),
            round_up(emitter.frame_position(), 8),
        );

        let composite_args = vec![padded_struct("s"), float_pair("p"), arg("tail", TypeKind::U32)];
        let (emitter, _) = emit_args(&composite_args);
        assert_eq!(
            return_offset(&composite_args),
            round_up(emitter.frame_position(), 8),
        );
    }

    #[test]
    fn padding_derivation_is_idempotent() {
        let s = arg(
            "s",
            TypeKind::Struct {
                fields: vec![Type::unnamed(TypeKind::U32), Type::unnamed(TypeKind::U8)],
            },
        );
        assert_eq!(s.size(), 5);
        assert_eq!(abi_padding(&s), 3);
        // Unmutated tree: re-deriving yields the same value.
        assert_eq!(abi_padding(&s), 3);
        assert_eq!(s.size() + abi_padding(&s), 8);

        assert_eq!(abi_padding(&arg("x", TypeKind::U8)), 0);
    }
}
