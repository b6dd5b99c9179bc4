//! Record and ownership-edge model for the GC verifier.
//!
//! This crate derives, lazily and memoized per translation-unit pass, the
//! facts every check queries:
//!
//! - **Edge model** ([`Edge`]): how one aggregate type refers to another:
//!   value embedding, raw/ref-counted/owning pointers, strong/weak managed
//!   references, GC roots, and heterogeneous collections. A strict ownership
//!   tree: each edge uniquely owns its children.
//! - **Tracing-status lattice** ([`TracingStatus`]): `Unneeded < Unknown <
//!   Needed` with a least-upper-bound join, so partial knowledge during
//!   recursive computation over cyclic class graphs never under-approximates
//!   the need for tracing.
//! - **Record model** ([`RecordInfo`], [`RecordCache`]): per-class derived
//!   facts (bases, fields, allocation class, finalization, trace/dispatch
//!   methods), computed on demand and cached for the lifetime of the pass.

mod edge;
mod record;
mod status;
pub mod well_known;

pub use edge::{create_edge, CollectionEdge, Edge, LivenessKind, PtrKind};
pub use record::{
    is_trace_method, BasePoint, FieldPoint, GcBaseKinds, RecordCache, RecordInfo, TracingMethods,
};
pub use status::{TracingContext, TracingStatus};
