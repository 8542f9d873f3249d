//! Generation driver
//!
//! Walks the requested targets in sorted order and, per target, renders one
//! trampoline routine per function plus the unit's init routine. Output is
//! deterministic: identical (model, configuration) input yields byte-identical
//! units, regardless of directive order or how often generation runs.
//!
//! Error policy follows the taxonomy split: configuration problems (malformed
//! directives, unsupported pairs) are warned about and skipped, because the
//! remaining targets are still generable; model errors abort the whole run
//! with no output, because every argument after a misclassified one would be
//! read from the wrong offset.

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::warn;
use veneer_core::{Arch, Function, Model, ModelError, Os, Target};

use crate::asm::{Routine, Unit};
use crate::init::emit_init;
use crate::registry::TargetRegistry;

/// A model error, tagged with the function being generated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenError {
    /// A function's signature cannot be marshaled on a requested target
    #[error("function `{function}` on {target}: {source}")]
    Model {
        /// Function being generated
        function: String,
        /// Target being generated
        target: Target,
        /// Underlying model error
        source: ModelError,
    },
}

/// One raw library directive, as the extractor found it.
///
/// Unparsed on purpose: directive validation is a generation-time concern, so
/// a typo in one directive costs that target a warning, not the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryDirective {
    /// Operating system spelling
    pub os: String,
    /// Architecture spelling
    pub arch: String,
    /// Native library path for this target
    pub library: String,
}

impl LibraryDirective {
    /// Build a directive from its three raw components.
    pub fn new(
        os: impl Into<String>,
        arch: impl Into<String>,
        library: impl Into<String>,
    ) -> Self {
        LibraryDirective {
            os: os.into(),
            arch: arch.into(),
            library: library.into(),
        }
    }
}

/// The per-target library configuration, as an ordered directive list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetConfig {
    directives: Vec<LibraryDirective>,
}

impl TargetConfig {
    /// Empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one directive, keeping extractor order.
    pub fn push(&mut self, directive: LibraryDirective) {
        self.directives.push(directive);
    }

    /// Parse the directives into a sorted target → library map.
    ///
    /// Malformed entries are skipped with a warning; a later directive for
    /// the same target replaces an earlier one.
    fn resolve(&self) -> BTreeMap<Target, String> {
        let mut targets = BTreeMap::new();
        for directive in &self.directives {
            let os: Os = match directive.os.parse() {
                Ok(os) => os,
                Err(err) => {
                    warn!(os = %directive.os, "skipping malformed target directive: {err}");
                    continue;
                }
            };
            let arch: Arch = match directive.arch.parse() {
                Ok(arch) => arch,
                Err(err) => {
                    warn!(arch = %directive.arch, "skipping malformed target directive: {err}");
                    continue;
                }
            };
            targets.insert(Target::new(os, arch), directive.library.clone());
        }
        targets
    }
}

/// Generated output: one unit per successfully generated target, in sorted
/// target order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    /// Per-target compilation units
    pub units: Vec<Unit>,
}

impl Output {
    /// Find the unit generated for `target`.
    pub fn unit(&self, target: Target) -> Option<&Unit> {
        self.units.iter().find(|u| u.target == target)
    }
}

/// Generate trampolines for every function on every configured target, using
/// the built-in registry.
pub fn generate(model: &Model, config: &TargetConfig) -> Result<Output, GenError> {
    generate_with(&TargetRegistry::with_builtin_targets(), model, config)
}

/// Generate with an explicit registry.
pub fn generate_with(
    registry: &TargetRegistry,
    model: &Model,
    config: &TargetConfig,
) -> Result<Output, GenError> {
    let mut units = Vec::new();
    for (target, library) in config.resolve() {
        if !registry.supports(target) {
            warn!(%target, "target pair is not supported, skipping");
            continue;
        }
        let mut unit = Unit::new(target);
        for func in &model.functions {
            // Fresh emitter per function: classifier counters are scoped to
            // this one routine.
            let mut emitter = registry
                .emitter_for(target)
                .unwrap_or_else(|| unreachable!("support checked above"));
            let routine =
                emit_trampoline(emitter.as_mut(), func).map_err(|source| GenError::Model {
                    function: func.name.clone(),
                    target,
                    source,
                })?;
            unit.push(routine);
        }
        emit_init(&mut unit, &model.functions, &library);
        units.push(unit);
    }
    Ok(Output { units })
}

/// Render one trampoline: safepoint bracket, argument moves in declaration
/// order, slot dispatch, and the return move (omitted entirely for `Void`).
fn emit_trampoline(
    emitter: &mut dyn crate::conv::ConvEmitter,
    func: &Function,
) -> Result<Routine, ModelError> {
    let mut routine = Routine::new(&func.name);
    emitter.emit_pre_call(&mut routine);
    for arg in &func.args {
        emitter.emit_arg_move(&mut routine, arg)?;
    }
    emitter.emit_call(&mut routine, func);
    if !func.ret.kind.is_void() {
        emitter.emit_return_move(&mut routine, func)?;
    }
    emitter.emit_post_call(&mut routine);
    routine.inst("RET");
    Ok(routine)
}
