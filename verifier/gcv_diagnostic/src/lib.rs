//! Diagnostic system for the GC verifier.
//!
//! Findings surface exactly like native compiler diagnostics: a primary
//! message with a source location, plus chained notes explaining the
//! contributing causes (which base is untraced, which part-object contains
//! the root, ...). Design goals:
//!
//! - Error codes for searchability
//! - Clear messages (what invariant is violated)
//! - Primary span (where)
//! - Chained notes (why)

mod diagnostic;
pub mod emitter;
mod error_code;
pub mod queue;

pub use diagnostic::{Diagnostic, Label, Severity};
pub use error_code::ErrorCode;
pub use queue::{DiagnosticQueue, QueueConfig};
