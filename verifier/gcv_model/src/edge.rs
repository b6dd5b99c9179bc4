//! Ownership edges between aggregate types.
//!
//! An [`Edge`] describes how one type refers to another: by value, through
//! a pointer wrapper, through a managed reference, or through a collection.
//! Edges form a strict ownership tree mirroring the nesting of the written
//! type; `Member<Vector<RefPtr<T>>>` becomes `Member(Collection(RefPtr(
//! Value)))`. The [`create_edge`] factory derives the tree from a field
//! type; a type the verifier does not model yields no edge and the field is
//! excluded from the tracing graph.

use gcv_ir::{RecordId, TranslationUnit, TypeId, TypeKind};

use crate::record::RecordCache;
use crate::status::{TracingContext, TracingStatus};
use crate::well_known;

/// Classification of a pointer-shaped edge, for reporting.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum PtrKind {
    /// `T*`, `T&`, or `RawPtr<T>`.
    Raw,
    /// `RefPtr<T>`.
    RefCounted,
    /// `OwnPtr<T>` or `std::unique_ptr<T>`.
    Owning,
}

/// How an edge keeps its referent alive.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum LivenessKind {
    /// Keeps the referent alive through marking.
    Strong,
    /// Does not keep the referent alive; cleared when it dies.
    Weak,
    /// Keeps the referent alive from outside the managed heap.
    Root,
}

/// A recognized collection specialization and its element edges.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct CollectionEdge {
    pub decl: RecordId,
    /// True when the collection's backing store lives on the managed heap.
    pub on_heap: bool,
    /// True for the persistent (root) collection families.
    pub is_root: bool,
    /// Element edges; two for map-like collections, else one. Elements the
    /// verifier does not model are absent.
    pub members: Vec<Edge>,
}

/// One ownership edge.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum Edge {
    /// The referent is embedded by value.
    Value(RecordId),
    /// `T*`, `T&`, or `RawPtr<T>`.
    RawPtr(Box<Edge>),
    /// `RefPtr<T>`.
    RefPtr(Box<Edge>),
    /// `OwnPtr<T>` or `std::unique_ptr<T>`.
    UniquePtr(Box<Edge>),
    /// `Member<T>`, a strong traced reference.
    Member(Box<Edge>),
    /// `WeakMember<T>`, a weak traced reference.
    WeakMember(Box<Edge>),
    /// `Persistent<T>`, a GC root.
    Persistent(Box<Edge>),
    Collection(Box<CollectionEdge>),
}

impl Edge {
    pub fn is_value(&self) -> bool {
        matches!(self, Edge::Value(_))
    }

    pub fn is_raw_ptr(&self) -> bool {
        matches!(self, Edge::RawPtr(_))
    }

    pub fn is_ref_ptr(&self) -> bool {
        matches!(self, Edge::RefPtr(_))
    }

    pub fn is_unique_ptr(&self) -> bool {
        matches!(self, Edge::UniquePtr(_))
    }

    pub fn is_member(&self) -> bool {
        matches!(self, Edge::Member(_))
    }

    pub fn is_weak_member(&self) -> bool {
        matches!(self, Edge::WeakMember(_))
    }

    pub fn is_persistent(&self) -> bool {
        matches!(self, Edge::Persistent(_))
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, Edge::Collection(_))
    }

    /// The wrapped edge of a single-argument wrapper.
    pub fn inner(&self) -> Option<&Edge> {
        match self {
            Edge::RawPtr(e)
            | Edge::RefPtr(e)
            | Edge::UniquePtr(e)
            | Edge::Member(e)
            | Edge::WeakMember(e)
            | Edge::Persistent(e) => Some(e),
            Edge::Value(_) | Edge::Collection(_) => None,
        }
    }

    /// The referent record of a value edge.
    pub fn value_decl(&self) -> Option<RecordId> {
        match self {
            Edge::Value(decl) => Some(*decl),
            _ => None,
        }
    }

    pub fn collection(&self) -> Option<&CollectionEdge> {
        match self {
            Edge::Collection(c) => Some(c),
            _ => None,
        }
    }

    pub fn ptr_kind(&self) -> Option<PtrKind> {
        match self {
            Edge::RawPtr(_) => Some(PtrKind::Raw),
            Edge::RefPtr(_) => Some(PtrKind::RefCounted),
            Edge::UniquePtr(_) => Some(PtrKind::Owning),
            _ => None,
        }
    }

    pub fn liveness_kind(&self) -> LivenessKind {
        match self {
            Edge::WeakMember(_) => LivenessKind::Weak,
            Edge::Persistent(_) => LivenessKind::Root,
            Edge::Collection(c) if c.is_root => LivenessKind::Root,
            _ => LivenessKind::Strong,
        }
    }

    /// Short label for graph dumps.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Edge::Value(_) => "value",
            Edge::RawPtr(_) => "raw",
            Edge::RefPtr(_) => "ref",
            Edge::UniquePtr(_) => "unique",
            Edge::Member(_) => "member",
            Edge::WeakMember(_) => "weak",
            Edge::Persistent(_) => "persistent",
            Edge::Collection(_) => "collection",
        }
    }

    /// Whether the edge must be visited by a trace method.
    ///
    /// Managed references always need tracing. Pointer wrappers and roots
    /// never do. Value and off-heap-collection edges defer to their
    /// referents, which is where `ctx` and the `Unknown` lattice point come
    /// in: a referent still being computed answers provisionally.
    pub fn needs_tracing(&self, cache: &RecordCache<'_>, ctx: TracingContext) -> TracingStatus {
        match self {
            Edge::Value(decl) => cache.lookup(*decl).needs_tracing(cache, ctx),
            Edge::Member(_) | Edge::WeakMember(_) => TracingStatus::Needed,
            Edge::RawPtr(_) | Edge::RefPtr(_) | Edge::UniquePtr(_) | Edge::Persistent(_) => {
                TracingStatus::Unneeded
            }
            Edge::Collection(c) => {
                if c.is_root {
                    return TracingStatus::Unneeded;
                }
                if c.on_heap {
                    return TracingStatus::Needed;
                }
                c.members.iter().fold(TracingStatus::Unneeded, |acc, m| {
                    acc.lub(m.needs_tracing(cache, TracingContext::Recursive))
                })
            }
        }
    }

    /// Whether destroying the edge runs nontrivial cleanup.
    pub fn needs_finalization(&self, cache: &RecordCache<'_>) -> bool {
        match self {
            Edge::Value(decl) => cache.lookup(*decl).needs_finalization(cache),
            Edge::RawPtr(_) | Edge::Member(_) | Edge::WeakMember(_) => false,
            Edge::RefPtr(_) | Edge::UniquePtr(_) | Edge::Persistent(_) => true,
            Edge::Collection(c) => {
                if c.on_heap {
                    c.members.iter().any(|m| m.needs_finalization(cache))
                } else {
                    true
                }
            }
        }
    }
}

/// Derive the ownership edge for a written type.
///
/// Returns `None` for types outside the model: builtins, dependent types,
/// pointers to non-class types, and wrapper specializations whose shape the
/// verifier does not recognize (e.g. wrong arity). Such fields are silently
/// excluded from the tracing graph.
pub fn create_edge(tu: &TranslationUnit, ty: TypeId) -> Option<Edge> {
    match tu.type_kind(ty) {
        TypeKind::Builtin(_) | TypeKind::Dependent(_) => None,
        TypeKind::Pointer(pointee) | TypeKind::Reference(pointee) => {
            let inner = create_edge(tu, *pointee)?;
            Some(Edge::RawPtr(Box::new(inner)))
        }
        TypeKind::Class { decl, args } => class_edge(tu, *decl, args),
    }
}

fn class_edge(tu: &TranslationUnit, decl: RecordId, args: &[TypeId]) -> Option<Edge> {
    let record = tu.record(decl);
    let name = tu.name_str(record.name);
    let in_heap_ns = record
        .namespace
        .is_some_and(|ns| tu.name_str(ns) == well_known::HEAP_NAMESPACE);

    let wrap = |make: fn(Box<Edge>) -> Edge| {
        let [arg] = args else { return None };
        let inner = create_edge(tu, *arg)?;
        Some(make(Box::new(inner)))
    };

    match name {
        well_known::RAW_PTR => return wrap(Edge::RawPtr),
        well_known::REF_PTR => return wrap(Edge::RefPtr),
        well_known::MEMBER => return wrap(Edge::Member),
        well_known::WEAK_MEMBER => return wrap(Edge::WeakMember),
        well_known::PERSISTENT if in_heap_ns => return wrap(Edge::Persistent),
        n if well_known::is_owning_ptr(n) => return wrap(Edge::UniquePtr),
        _ => {}
    }

    if well_known::is_collection(name) {
        let is_root = well_known::is_persistent_heap_collection(name);
        let on_heap =
            is_root || well_known::is_heap_collection(name) || has_heap_allocator(tu, args);
        let mut members = Vec::new();
        for &arg in args.iter().take(well_known::collection_dimension(name)) {
            if let Some(member) = create_edge(tu, arg) {
                members.push(member);
            }
        }
        return Some(Edge::Collection(Box::new(CollectionEdge {
            decl,
            on_heap,
            is_root,
            members,
        })));
    }

    Some(Edge::Value(decl))
}

/// `Vector<T, 0, HeapAllocator>` and friends are heap-backed despite their
/// off-heap template name.
fn has_heap_allocator(tu: &TranslationUnit, args: &[TypeId]) -> bool {
    args.iter().any(|&arg| {
        tu.class_decl(arg)
            .is_some_and(|decl| tu.name_str(tu.record(decl).name) == well_known::HEAP_ALLOCATOR)
    })
}

#[cfg(test)]
mod tests;
