//! Field-validity check.
//!
//! Walks every field edge of a record and flags shapes the managed heap
//! cannot support. Severity of the smart-pointer faults depends on
//! configuration; the structural faults are always errors.

use gcv_ir::{FieldId, RecordId, Span};
use gcv_model::{CollectionEdge, Edge, RecordCache, RecordInfo};

use crate::config::VerifierOptions;
use crate::traversal::{walk_edge, EdgePath, EdgeVisitor};

/// Classification of one invalid field occurrence.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum FieldFault {
    RawPtrToGcManaged,
    RefPtrToGcManaged,
    UniquePtrToGcManaged,
    UniquePtrToHeapCollection,
    MemberInUnmanagedHost,
    MemberToUnmanagedType,
    GcDerivedPartObject,
    PtrToStackAllocated,
}

impl FieldFault {
    pub fn describe(self) -> &'static str {
        match self {
            FieldFault::RawPtrToGcManaged => "raw pointer to GC-managed class",
            FieldFault::RefPtrToGcManaged => "reference-counted pointer to GC-managed class",
            FieldFault::UniquePtrToGcManaged => "owning pointer to GC-managed class",
            FieldFault::UniquePtrToHeapCollection => "owning pointer to on-heap collection",
            FieldFault::MemberInUnmanagedHost => "member reference in an unmanaged class",
            FieldFault::MemberToUnmanagedType => {
                "member reference to a non-collectable class in a stack-allocated host"
            }
            FieldFault::GcDerivedPartObject => "collectable class embedded as a part-object",
            FieldFault::PtrToStackAllocated => "pointer to a stack-allocated class",
        }
    }

    /// Smart-pointer faults are configuration-dependent; the rest are
    /// always errors.
    pub fn is_error(self, options: &VerifierOptions) -> bool {
        match self {
            FieldFault::RawPtrToGcManaged => {
                options.enable_transition_mode && !options.warn_raw_ptr
            }
            FieldFault::RefPtrToGcManaged | FieldFault::UniquePtrToGcManaged => {
                options.enable_transition_mode
            }
            _ => true,
        }
    }
}

/// One invalid field of the checked record.
#[derive(Copy, Clone, Debug)]
pub struct FieldError {
    pub field: FieldId,
    pub span: Span,
    pub fault: FieldFault,
}

/// Flag every invalid field of `info`.
pub fn check_fields(cache: &RecordCache<'_>, info: &RecordInfo) -> Vec<FieldError> {
    let mut errors = Vec::new();
    let host_stack_allocated = info.is_stack_allocated(cache);
    let host_managed = info.is_gc_allocated(cache) || host_stack_allocated;

    for point in info.fields(cache) {
        let mut checker = FieldChecker {
            cache,
            host_stack_allocated,
            host_managed,
            faults: Vec::new(),
        };
        walk_edge(&mut checker, &point.edge);
        errors.extend(checker.faults.into_iter().map(|fault| FieldError {
            field: point.field,
            span: point.span,
            fault,
        }));
    }
    errors
}

struct FieldChecker<'a, 'tu> {
    cache: &'a RecordCache<'tu>,
    host_stack_allocated: bool,
    host_managed: bool,
    faults: Vec<FieldFault>,
}

impl EdgeVisitor for FieldChecker<'_, '_> {
    fn at_value(&mut self, path: &EdgePath<'_>, decl: RecordId) {
        let pointee = self.cache.lookup(decl);

        match path.enclosing() {
            None => {
                // Part-objects must not embed a collectable base by value;
                // pure mixins are the sanctioned exception.
                if pointee.is_gc_derived(self.cache) && !pointee.is_gc_mixin(self.cache) {
                    self.faults.push(FieldFault::GcDerivedPartObject);
                }
            }
            Some(enclosing) => {
                if pointee.is_gc_allocated(self.cache) {
                    match enclosing {
                        Edge::RawPtr(_) => self.faults.push(FieldFault::RawPtrToGcManaged),
                        Edge::RefPtr(_) => self.faults.push(FieldFault::RefPtrToGcManaged),
                        Edge::UniquePtr(_) => self.faults.push(FieldFault::UniquePtrToGcManaged),
                        _ => {}
                    }
                } else if enclosing.is_member()
                    && self.host_stack_allocated
                    && self.cache.tu().record(decl).has_definition
                {
                    // Stack hosts cannot rely on a trace call to validate
                    // the wrapped pointer at run time.
                    self.faults.push(FieldFault::MemberToUnmanagedType);
                }

                if !self.host_stack_allocated
                    && enclosing.ptr_kind().is_some()
                    && pointee.is_stack_allocated(self.cache)
                {
                    self.faults.push(FieldFault::PtrToStackAllocated);
                }
            }
        }
    }

    fn at_member(&mut self, path: &EdgePath<'_>, _edge: &Edge) {
        if !self.host_managed && !path.within_root() {
            self.faults.push(FieldFault::MemberInUnmanagedHost);
        }
    }

    fn at_weak_member(&mut self, path: &EdgePath<'_>, edge: &Edge) {
        self.at_member(path, edge);
    }

    fn at_collection(&mut self, path: &EdgePath<'_>, collection: &CollectionEdge) {
        if collection.on_heap && path.enclosing().is_some_and(Edge::is_unique_ptr) {
            self.faults.push(FieldFault::UniquePtrToHeapCollection);
        }
    }
}
