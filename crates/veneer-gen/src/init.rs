//! Initialization routine emission
//!
//! Each generated unit carries, besides its trampolines, the data symbols and
//! the `veneer.init` routine that makes them dispatchable: one 8-byte slot
//! per function, the library handle, and the string constants the resolver
//! needs. `veneer.init` opens the configured library and resolves every
//! function's link name into its slot, in declaration order, branching to a
//! shared failure label on the first symbol that does not resolve. It returns
//! 0 only after the last store, so no trampoline can ever dispatch through an
//! unresolved slot.

use veneer_core::Function;

use crate::asm::{Routine, Unit};

/// Label of the per-unit initialization routine.
pub const INIT_LABEL: &str = "veneer.init";

/// Emit slot/string declarations and the init routine into `unit`.
pub(crate) fn emit_init(unit: &mut Unit, functions: &[Function], library: &str) {
    unit.decl("GLOBL lib.handle, 8");
    for func in functions {
        unit.decl(format!("GLOBL fn.{}, 8", func.name));
    }
    unit.decl(format!("STRING str.lib_path, {:?}", library));
    for func in functions {
        unit.decl(format!("STRING str.{}, {:?}", func.name, func.symbol()));
    }

    let mut routine = Routine::new(INIT_LABEL);
    routine.inst("MOVD $str.lib_path(SB), R0");
    routine.inst("CALL runtime.dlopen");
    routine.inst("CBZ R0, init.fail");
    routine.inst("MOVD R0, lib.handle(SB)");
    for func in functions {
        routine.inst("MOVD lib.handle(SB), R0");
        routine.inst(format!("MOVD $str.{}(SB), R1", func.name));
        routine.inst("CALL runtime.dlsym");
        routine.inst("CBZ R0, init.fail");
        routine.inst(format!("MOVD R0, fn.{}(SB)", func.name));
    }
    routine.inst("MOVD $0, R0");
    routine.inst("RET");
    routine.local_label("init.fail");
    routine.inst("MOVD $1, R0");
    routine.inst("RET");
    unit.push(routine);
}

#[cfg(test)]
mod tests {
    use super::*;
    use veneer_core::{Arch, Os, Target, Type, TypeKind};

    #[test]
    fn init_resolves_link_names_in_declaration_order() {
        let functions = vec![
            Function::new("sine", vec![], Type::unnamed(TypeKind::F64)).with_link_name("sin"),
            Function::new("floor", vec![], Type::unnamed(TypeKind::F64)),
        ];
        let mut unit = Unit::new(Target::new(Os::Darwin, Arch::Arm64));
        emit_init(&mut unit, &functions, "libm.dylib");

        let text = unit.to_string();
        assert!(text.contains("GLOBL fn.sine, 8\n"));
        assert!(text.contains("GLOBL fn.floor, 8\n"));
        assert!(text.contains("STRING str.lib_path, \"libm.dylib\"\n"));
        // The slot is keyed by the declared name, the resolved symbol by the
        // link name.
        assert!(text.contains("STRING str.sine, \"sin\"\n"));
        assert!(text.contains("STRING str.floor, \"floor\"\n"));

        let sine = text.find("MOVD R0, fn.sine(SB)").unwrap();
        let floor = text.find("MOVD R0, fn.floor(SB)").unwrap();
        assert!(sine < floor);
    }

    #[test]
    fn init_fails_fast_and_succeeds_only_after_last_store() {
        let functions = vec![Function::new("frob", vec![], Type::unnamed(TypeKind::Void))];
        let mut unit = Unit::new(Target::new(Os::Linux, Arch::Amd64));
        emit_init(&mut unit, &functions, "libfrob.so");

        let text = unit.routine(INIT_LABEL).unwrap().to_string();
        // Every resolution step branches to the shared failure label.
        assert_eq!(text.matches("CBZ R0, init.fail").count(), 2);
        let store = text.find("MOVD R0, fn.frob(SB)").unwrap();
        let success = text.find("MOVD $0, R0").unwrap();
        let fail = text.find("init.fail:").unwrap();
        assert!(store < success);
        assert!(success < fail);
    }
}
