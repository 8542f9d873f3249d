//! Target descriptors
//!
//! A [`Target`] is the (operating system, architecture) pair the registry is
//! keyed by. Both halves parse from the lowercase directive spelling used in
//! annotated source; unknown spellings are configuration errors that the
//! generator warns about and skips.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure to parse a target directive component.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseTargetError {
    /// Unknown operating system spelling
    #[error("unknown operating system `{0}`")]
    Os(String),
    /// Unknown architecture spelling
    #[error("unknown architecture `{0}`")]
    Arch(String),
}

/// Operating system half of a target pair.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Os {
    /// Directive spelling `darwin`
    Darwin,
    /// Directive spelling `linux`
    Linux,
}

impl Os {
    /// Directive spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            Os::Darwin => "darwin",
            Os::Linux => "linux",
        }
    }
}

impl FromStr for Os {
    type Err = ParseTargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "darwin" => Ok(Os::Darwin),
            "linux" => Ok(Os::Linux),
            other => Err(ParseTargetError::Os(other.to_string())),
        }
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Architecture half of a target pair.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Arch {
    /// Directive spelling `amd64`
    Amd64,
    /// Directive spelling `arm64`
    Arm64,
}

impl Arch {
    /// Directive spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            Arch::Amd64 => "amd64",
            Arch::Arm64 => "arm64",
        }
    }
}

impl FromStr for Arch {
    type Err = ParseTargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "amd64" => Ok(Arch::Amd64),
            "arm64" => Ok(Arch::Arm64),
            other => Err(ParseTargetError::Arch(other.to_string())),
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An (operating system, architecture) registry key.
///
/// Ordering is derived so generation can iterate requested targets in a
/// deterministic order regardless of how they were configured.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Target {
    /// Operating system
    pub os: Os,
    /// Architecture
    pub arch: Arch,
}

impl Target {
    /// Pair an operating system with an architecture.
    pub fn new(os: Os, arch: Arch) -> Self {
        Target { os, arch }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os, self.arch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directive_spellings_parse() {
        assert_eq!("darwin".parse::<Os>().unwrap(), Os::Darwin);
        assert_eq!("arm64".parse::<Arch>().unwrap(), Arch::Arm64);
        assert_eq!(
            Target::new(Os::Linux, Arch::Amd64).to_string(),
            "linux/amd64"
        );
    }

    #[test]
    fn unknown_spellings_are_errors() {
        assert!(matches!(
            "windows".parse::<Os>(),
            Err(ParseTargetError::Os(_))
        ));
        assert!(matches!(
            "riscv64".parse::<Arch>(),
            Err(ParseTargetError::Arch(_))
        ));
    }
}
