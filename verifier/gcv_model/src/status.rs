//! The tracing-status lattice.
//!
//! A three-point lattice `Unneeded < Unknown < Needed` with a least-upper-
//! bound join. During recursive computation over mutually-referential class
//! graphs, a class's status may need to be provisionally `Unknown` before
//! all its dependencies are resolved; joining partial knowledge through
//! `lub` guarantees the combination never silently drops a `Needed`.

/// Whether a record's or edge's referent needs tracing.
///
/// Ordered: `Unneeded < Unknown < Needed`.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum TracingStatus {
    Unneeded,
    Unknown,
    Needed,
}

impl TracingStatus {
    pub fn is_unneeded(self) -> bool {
        self == TracingStatus::Unneeded
    }

    pub fn is_unknown(self) -> bool {
        self == TracingStatus::Unknown
    }

    pub fn is_needed(self) -> bool {
        self == TracingStatus::Needed
    }

    /// Least upper bound: the greater of the two statuses.
    #[must_use]
    pub fn lub(self, other: TracingStatus) -> TracingStatus {
        self.max(other)
    }
}

/// Bounds the depth of a [`TracingStatus`] derivation.
///
/// A recursive query consults a record's fields in addition to its
/// allocation class and bases; a non-recursive query stops at the record
/// itself, which bounds recursion when deriving the status of field edges.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum TracingContext {
    Recursive,
    NonRecursive,
}
