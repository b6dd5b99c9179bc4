//! The body- and structure-level checks.

pub mod dispatch;
pub mod fields;
pub mod finalizer;
pub mod roots;
pub mod trace_body;

pub use dispatch::dispatches_to_receiver;
pub use fields::{check_fields, FieldError, FieldFault};
pub use finalizer::{check_finalizer_body, FinalizerAccess};
pub use roots::{check_gc_roots, RootPathStep};
pub use trace_body::{check_trace_body, untraced_bases, untraced_fields, TraceBodyOutcome};
