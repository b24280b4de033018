//! Compiler options, supplied by the driver.

use std::fmt;
use std::str::FromStr;

/// How aggressively contracts are enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationLevel {
    /// No proofs, no runtime checks.
    None,
    /// Every contract becomes a runtime check.
    Runtime,
    /// Proven contracts are dropped, the rest become runtime checks.
    Hybrid,
    /// Any unproven contract is a compile-time error.
    Full,
}

impl Default for VerificationLevel {
    fn default() -> Self {
        VerificationLevel::Hybrid
    }
}

impl FromStr for VerificationLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(VerificationLevel::None),
            "runtime" => Ok(VerificationLevel::Runtime),
            "hybrid" => Ok(VerificationLevel::Hybrid),
            "full" => Ok(VerificationLevel::Full),
            _ => Err(format!(
                "Unknown verification level '{}' (expected none, runtime, hybrid or full)",
                s
            )),
        }
    }
}

impl fmt::Display for VerificationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VerificationLevel::None => "none",
            VerificationLevel::Runtime => "runtime",
            VerificationLevel::Hybrid => "hybrid",
            VerificationLevel::Full => "full",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone)]
pub struct Options {
    pub verification_level: VerificationLevel,
    /// Budget handed to the oracle per query.
    pub verification_timeout_ms: u64,
    pub indent_width: usize,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            verification_level: VerificationLevel::Hybrid,
            verification_timeout_ms: 1000,
            indent_width: 2,
        }
    }
}
