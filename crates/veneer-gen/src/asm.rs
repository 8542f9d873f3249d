//! Assembly text model
//!
//! Emitted routines accumulate as structured text and render through the
//! `Display` impls; this is the only rendering path, so one routine always
//! serializes the same way. The dialect is the host runtime's portable
//! assembler syntax: `MNEMONIC src, dst`, caller-frame operands spelled
//! `name+offset(FP)`, outgoing stack slots `offset(SP)`, and process-wide
//! data symbols `name(SB)`.

use std::fmt;

use veneer_core::Target;

/// Scratch register used for stack spills and indirect dispatch.
pub const SCRATCH_REG: &str = "R16";

/// Integer load mnemonic for a scalar width.
///
/// Sub-word loads are sign- or zero-extending by mnemonic, so the register
/// always holds the full value.
pub fn int_load(size: usize, signed: bool) -> &'static str {
    match (size, signed) {
        (1, true) => "MOVB",
        (1, false) => "MOVBU",
        (2, true) => "MOVH",
        (2, false) => "MOVHU",
        (4, true) => "MOVW",
        (4, false) => "MOVWU",
        (8, _) => "MOVD",
        _ => unreachable!("no scalar kind has width {size}"),
    }
}

/// Integer store mnemonic for a scalar width (stores do not extend).
pub fn int_store(size: usize) -> &'static str {
    match size {
        1 => "MOVB",
        2 => "MOVH",
        4 => "MOVW",
        8 => "MOVD",
        _ => unreachable!("no scalar kind has width {size}"),
    }
}

/// Float move mnemonic for a scalar width, usable as load or store.
pub fn float_mov(size: usize) -> &'static str {
    match size {
        4 => "FMOVS",
        8 => "FMOVD",
        _ => unreachable!("no float kind has width {size}"),
    }
}

/// Caller-frame operand: `name+offset(FP)`.
pub fn frame(name: &str, offset: usize) -> String {
    format!("{name}+{offset}(FP)")
}

/// Outgoing stack operand: `offset(SP)`.
pub fn stack(offset: usize) -> String {
    format!("{offset}(SP)")
}

/// Process-wide dispatch slot for a function: `fn.name(SB)`.
pub fn slot(name: &str) -> String {
    format!("fn.{name}(SB)")
}

/// One emitted routine: a label plus its instruction lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routine {
    label: String,
    lines: Vec<Line>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
    Inst(String),
    Label(String),
}

impl Routine {
    /// Start a routine with the given label.
    pub fn new(label: impl Into<String>) -> Self {
        Routine {
            label: label.into(),
            lines: Vec::new(),
        }
    }

    /// Append one instruction line.
    pub fn inst(&mut self, text: impl Into<String>) {
        self.lines.push(Line::Inst(text.into()));
    }

    /// Append a local label (rendered unindented).
    pub fn local_label(&mut self, label: impl Into<String>) {
        self.lines.push(Line::Label(label.into()));
    }

    /// The routine's label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Instruction count, labels excluded.
    pub fn inst_count(&self) -> usize {
        self.lines
            .iter()
            .filter(|l| matches!(l, Line::Inst(_)))
            .count()
    }
}

impl fmt::Display for Routine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "TEXT {}:", self.label)?;
        for line in &self.lines {
            match line {
                Line::Inst(text) => writeln!(f, "\t{text}")?,
                Line::Label(label) => writeln!(f, "{label}:")?,
            }
        }
        Ok(())
    }
}

/// One per-target compilation unit: declarations followed by routines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    /// Target this unit was generated for
    pub target: Target,
    decls: Vec<String>,
    routines: Vec<Routine>,
}

impl Unit {
    /// Start an empty unit for a target.
    pub fn new(target: Target) -> Self {
        Unit {
            target,
            decls: Vec::new(),
            routines: Vec::new(),
        }
    }

    /// Append a data declaration (slots, string constants).
    pub fn decl(&mut self, text: impl Into<String>) {
        self.decls.push(text.into());
    }

    /// Append a finished routine.
    pub fn push(&mut self, routine: Routine) {
        self.routines.push(routine);
    }

    /// Routines emitted so far, in order.
    pub fn routines(&self) -> &[Routine] {
        &self.routines
    }

    /// Find a routine by label.
    pub fn routine(&self, label: &str) -> Option<&Routine> {
        self.routines.iter().find(|r| r.label() == label)
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "// Generated by veneer for {}. DO NOT EDIT.", self.target)?;
        writeln!(f)?;
        for decl in &self.decls {
            writeln!(f, "{decl}")?;
        }
        if !self.decls.is_empty() {
            writeln!(f)?;
        }
        for routine in &self.routines {
            writeln!(f, "{routine}")?;
        }
        Ok(())
    }
}
