//! Target registry
//!
//! Maps an (operating system, architecture) pair to the emitter constructor
//! for that platform's calling convention. The registry hands out a **fresh**
//! emitter per lookup, one per function, so classifier counters are scoped to
//! a single routine by construction.

use rustc_hash::FxHashMap;
use veneer_core::{Arch, Os, Target};

use crate::conv::{Aapcs64Emitter, ConvEmitter, SequentialEmitter};

/// Constructor for one per-function emitter instance.
pub type EmitterCtor = fn() -> Box<dyn ConvEmitter>;

fn new_aapcs64() -> Box<dyn ConvEmitter> {
    Box::new(Aapcs64Emitter::new())
}

fn new_sequential() -> Box<dyn ConvEmitter> {
    Box::new(SequentialEmitter::new())
}

/// Registry of supported (OS, architecture) pairs.
///
/// Lookup only — iteration order of the underlying map never reaches the
/// emitted output; the generation driver walks targets in sorted order.
pub struct TargetRegistry {
    entries: FxHashMap<Target, EmitterCtor>,
}

impl TargetRegistry {
    /// Registry with no targets.
    pub fn empty() -> Self {
        TargetRegistry {
            entries: FxHashMap::default(),
        }
    }

    /// Registry with the built-in conventions: AAPCS64 on `arm64`, the
    /// sequential convention on `amd64`, for both supported systems.
    pub fn with_builtin_targets() -> Self {
        let mut registry = Self::empty();
        for os in [Os::Darwin, Os::Linux] {
            registry.register(Target::new(os, Arch::Arm64), new_aapcs64);
            registry.register(Target::new(os, Arch::Amd64), new_sequential);
        }
        registry
    }

    /// Register (or replace) the constructor for a target.
    pub fn register(&mut self, target: Target, ctor: EmitterCtor) {
        self.entries.insert(target, ctor);
    }

    /// Whether the target has a registered convention.
    pub fn supports(&self, target: Target) -> bool {
        self.entries.contains_key(&target)
    }

    /// Construct a fresh emitter for one function on `target`.
    pub fn emitter_for(&self, target: Target) -> Option<Box<dyn ConvEmitter>> {
        self.entries.get(&target).map(|ctor| ctor())
    }
}

impl Default for TargetRegistry {
    fn default() -> Self {
        Self::with_builtin_targets()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_pairs_are_supported() {
        let registry = TargetRegistry::with_builtin_targets();
        assert!(registry.supports(Target::new(Os::Darwin, Arch::Arm64)));
        assert!(registry.supports(Target::new(Os::Linux, Arch::Amd64)));
    }

    #[test]
    fn each_lookup_is_a_fresh_emitter() {
        use crate::asm::Routine;
        use veneer_core::{Type, TypeKind};

        let registry = TargetRegistry::with_builtin_targets();
        let target = Target::new(Os::Darwin, Arch::Arm64);
        let arg = Type::new("a", TypeKind::I64);

        // Same first-register assignment both times: no counter survives.
        for _ in 0..2 {
            let mut emitter = registry.emitter_for(target).unwrap();
            let mut routine = Routine::new("t");
            emitter.emit_arg_move(&mut routine, &arg).unwrap();
            assert!(routine.to_string().contains("\tMOVD a+0(FP), R0\n"));
        }
    }
}
