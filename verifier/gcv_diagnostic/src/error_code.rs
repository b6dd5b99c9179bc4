//! Error codes for all verifier diagnostics.
//!
//! Each code is a unique identifier (e.g. `G2001`) with the first digit
//! indicating the rule family. Used for searchability and suppression
//! tooling.

use std::fmt;

/// Error codes for all verifier diagnostics.
///
/// Format: G#### where the first digit indicates the rule family:
/// - G1xxx: Structural rules (derivation shape, allocation, vtable safety)
/// - G2xxx: Tracing completeness
/// - G3xxx: Field shape
/// - G4xxx: GC roots
/// - G5xxx: Finalization
/// - G6xxx: Manual dispatch
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ErrorCode {
    // Structural rules (G1xxx)
    /// Class must left-most derive from a collectable base.
    G1001,
    /// Left-most base must be polymorphic.
    G1002,
    /// Left-most base must declare a virtual trace method.
    G1003,
    /// Stack-allocated class derives a non-stack-allocated base.
    G1004,
    /// Collectable class overrides `operator new`.
    G1005,
    /// Class declares a pure-virtual trace method.
    G1006,

    // Tracing completeness (G2xxx)
    /// Class requires a trace method but declares none.
    G2001,
    /// Trace method fails to trace one or more fields.
    G2002,
    /// Trace method fails to trace a base class.
    G2003,
    /// Non-virtual trace method overridden in a derived class.
    G2004,
    /// Mixin-derived class fails to declare a local trace method.
    G2005,

    // Field shape (G3xxx)
    /// Class contains invalid fields.
    G3001,

    // GC roots (G4xxx)
    /// Class contains a GC root.
    G4001,

    // Finalization (G5xxx)
    /// Class requires finalization but does not derive a finalized base.
    G5001,
    /// Finalizer accesses a potentially finalized field.
    G5002,
    /// Finalizer accesses an eagerly finalized field.
    G5003,
    /// Finalizer exists but is provably unneeded (advisory).
    G5004,

    // Manual dispatch (G6xxx)
    /// Trace dispatch method does not dispatch to a receiver subtype.
    G6001,
    /// Finalize dispatch method does not dispatch to a receiver subtype.
    G6002,
    /// Manual dispatch declared on a polymorphic class.
    G6003,
    /// Class requires a finalize dispatch method but declares none.
    G6004,
}

impl ErrorCode {
    /// Short human-readable description of the rule behind the code.
    pub fn description(self) -> &'static str {
        match self {
            ErrorCode::G1001 => "class must left-most derive from a collectable base",
            ErrorCode::G1002 => "left-most base must be polymorphic",
            ErrorCode::G1003 => "left-most base must declare a virtual trace method",
            ErrorCode::G1004 => "stack-allocated class derives a non-stack-allocated base",
            ErrorCode::G1005 => "collectable class overrides operator new",
            ErrorCode::G1006 => "class declares a pure-virtual trace method",
            ErrorCode::G2001 => "class requires a trace method",
            ErrorCode::G2002 => "trace method fails to trace required fields",
            ErrorCode::G2003 => "trace method fails to trace a base class",
            ErrorCode::G2004 => "non-virtual trace method overridden in a derived class",
            ErrorCode::G2005 => "mixin-derived class must locally declare a trace method",
            ErrorCode::G3001 => "class contains invalid fields",
            ErrorCode::G4001 => "class contains a GC root",
            ErrorCode::G5001 => "class requires finalization",
            ErrorCode::G5002 => "finalizer accesses a potentially finalized field",
            ErrorCode::G5003 => "finalizer accesses an eagerly finalized field",
            ErrorCode::G5004 => "finalizer is unneeded",
            ErrorCode::G6001 => "missing trace dispatch",
            ErrorCode::G6002 => "missing finalize dispatch",
            ErrorCode::G6003 => "manual dispatch on a polymorphic class",
            ErrorCode::G6004 => "class requires a finalize dispatch method",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_debug() {
        assert_eq!(ErrorCode::G2001.to_string(), "G2001");
        assert_eq!(ErrorCode::G5004.to_string(), "G5004");
    }

    #[test]
    fn descriptions_are_nonempty() {
        for code in [
            ErrorCode::G1001,
            ErrorCode::G2002,
            ErrorCode::G3001,
            ErrorCode::G4001,
            ErrorCode::G5002,
            ErrorCode::G6001,
        ] {
            assert!(!code.description().is_empty());
        }
    }
}
