//! Checks and rule engine for the GC verifier.
//!
//! [`GcVerifier`] drives one pass over a parsed translation unit: it
//! collects trace-shaped methods, runs the structural rules over every
//! class, checks trace-method bodies for completeness, and returns the
//! ordered findings. The individual rules live in [`checks`]; diagnostic
//! phrasing is centralized in the reporting module; [`VerifierOptions`]
//! carries the host-provided flags.

pub mod checks;
mod config;
mod dump;
mod engine;
mod reporting;
mod traversal;

pub use config::{FlagError, VerifierOptions};
pub use dump::{dump_graph, DumpError};
pub use engine::GcVerifier;
pub use traversal::{walk_edge, EdgePath, EdgeVisitor};
