//! Per-record derived facts, computed lazily and memoized per pass.
//!
//! [`RecordCache`] hands out one shared [`RecordInfo`] per record for the
//! lifetime of a verifier pass. Every fact on [`RecordInfo`] is computed on
//! first query and cached. The class graph can be cyclic through field
//! types, so the two queries that recurse through fields
//! ([`RecordInfo::fields_need_tracing`] and
//! [`RecordInfo::needs_finalization`]) carry an in-progress sentinel: a
//! re-entrant tracing query answers the provisional lattice point
//! `Unknown`, a re-entrant finalization query answers `false`. Joining
//! through the lattice keeps the fixpoint sound. Base hierarchies are
//! acyclic, so base-directed facts use plain once-cells.

use std::cell::{Cell, OnceCell, RefCell};
use std::rc::Rc;

use bitflags::bitflags;
use rustc_hash::FxHashMap;

use gcv_ir::{
    Access, Annotations, FieldId, MethodDecl, MethodId, MethodKind, RecordId, Span,
    TranslationUnit, TypeKind,
};

use crate::edge::{create_edge, Edge};
use crate::status::{TracingContext, TracingStatus};
use crate::well_known;

bitflags! {
    /// Which GC base markers a record transitively derives from.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct GcBaseKinds: u8 {
        const COLLECTED = 1 << 0;
        const FINALIZED = 1 << 1;
        const MIXIN = 1 << 2;
    }
}

/// One direct class base of a record.
#[derive(Debug)]
pub struct BasePoint {
    pub decl: RecordId,
    /// Index into the record's written base clause.
    pub spec_index: usize,
    pub span: Span,
    pub access: Access,
    pub is_virtual: bool,
    traced: Cell<bool>,
}

impl BasePoint {
    pub fn mark_traced(&self) {
        self.traced.set(true);
    }

    pub fn is_traced(&self) -> bool {
        self.traced.get()
    }
}

/// One field of a record that participates in the tracing graph.
#[derive(Debug)]
pub struct FieldPoint {
    pub field: FieldId,
    pub span: Span,
    pub edge: Edge,
    traced: Cell<bool>,
}

impl FieldPoint {
    pub fn mark_traced(&self) {
        self.traced.set(true);
    }

    pub fn is_traced(&self) -> bool {
        self.traced.get()
    }
}

/// The trace-family methods a record declares.
///
/// `trace` is the method whose body must visit the record's fields; when a
/// forwarding `traceImpl`/`traceAfterDispatchImpl` exists it is that one.
/// `dispatch` is set when the record participates in manual dispatch: the
/// outer `trace` whose body must switch on the concrete type.
#[derive(Copy, Clone, Debug, Default)]
pub struct TracingMethods {
    pub trace: Option<MethodId>,
    pub dispatch: Option<MethodId>,
    pub finalize_dispatch: Option<MethodId>,
    /// The class declares the mixin marker methods (the mixin
    /// participation macro was expanded in it).
    pub declares_mixin_methods: bool,
}

#[derive(Copy, Clone)]
enum FieldsState {
    NotComputed,
    Computing,
    Done(TracingStatus),
}

#[derive(Copy, Clone)]
enum FinalizationState {
    NotComputed,
    Computing,
    Done(bool),
}

/// Lazily computed facts about one record.
pub struct RecordInfo {
    id: RecordId,
    bases: OnceCell<Vec<BasePoint>>,
    gc_base_kinds: OnceCell<GcBaseKinds>,
    tracing_methods: OnceCell<TracingMethods>,
    stack_allocated: OnceCell<bool>,
    polymorphic: OnceCell<bool>,
    fields: OnceCell<Box<[FieldPoint]>>,
    fields_state: Cell<FieldsState>,
    finalization: Cell<FinalizationState>,
}

/// Shared per-pass store of [`RecordInfo`]s.
pub struct RecordCache<'tu> {
    tu: &'tu TranslationUnit,
    map: RefCell<FxHashMap<RecordId, Rc<RecordInfo>>>,
}

impl<'tu> RecordCache<'tu> {
    pub fn new(tu: &'tu TranslationUnit) -> Self {
        RecordCache {
            tu,
            map: RefCell::new(FxHashMap::default()),
        }
    }

    pub fn tu(&self) -> &'tu TranslationUnit {
        self.tu
    }

    /// The shared info for a record, created on first use.
    pub fn lookup(&self, id: RecordId) -> Rc<RecordInfo> {
        if let Some(info) = self.map.borrow().get(&id) {
            return Rc::clone(info);
        }
        let info = Rc::new(RecordInfo::new(id));
        self.map.borrow_mut().insert(id, Rc::clone(&info));
        info
    }
}

impl RecordInfo {
    fn new(id: RecordId) -> Self {
        RecordInfo {
            id,
            bases: OnceCell::new(),
            gc_base_kinds: OnceCell::new(),
            tracing_methods: OnceCell::new(),
            stack_allocated: OnceCell::new(),
            polymorphic: OnceCell::new(),
            fields: OnceCell::new(),
            fields_state: Cell::new(FieldsState::NotComputed),
            finalization: Cell::new(FinalizationState::NotComputed),
        }
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    // === Hierarchy ===

    /// Direct bases that resolve to a class declaration.
    pub fn bases(&self, cache: &RecordCache<'_>) -> &[BasePoint] {
        self.bases.get_or_init(|| {
            let tu = cache.tu();
            tu.record(self.id)
                .bases
                .iter()
                .enumerate()
                .filter_map(|(i, b)| {
                    let decl = tu.class_decl(b.ty)?;
                    Some(BasePoint {
                        decl,
                        spec_index: i,
                        span: b.span,
                        access: b.access,
                        is_virtual: b.is_virtual,
                        traced: Cell::new(false),
                    })
                })
                .collect()
        })
    }

    /// The GC base markers reachable through the base hierarchy.
    pub fn gc_base_kinds(&self, cache: &RecordCache<'_>) -> GcBaseKinds {
        *self.gc_base_kinds.get_or_init(|| {
            let tu = cache.tu();
            let mut kinds = GcBaseKinds::empty();
            for base in self.bases(cache) {
                let name = tu.name_str(tu.record(base.decl).name);
                if well_known::is_gc_base(name) {
                    kinds |= if well_known::is_gc_mixin_base(name) {
                        GcBaseKinds::MIXIN
                    } else if well_known::is_gc_finalized_base(name) {
                        GcBaseKinds::COLLECTED | GcBaseKinds::FINALIZED
                    } else {
                        GcBaseKinds::COLLECTED
                    };
                } else {
                    kinds |= cache.lookup(base.decl).gc_base_kinds(cache);
                }
            }
            kinds
        })
    }

    pub fn is_gc_derived(&self, cache: &RecordCache<'_>) -> bool {
        !self.gc_base_kinds(cache).is_empty()
    }

    /// Derives a mixin marker and nothing collectable.
    pub fn is_gc_mixin(&self, cache: &RecordCache<'_>) -> bool {
        self.gc_base_kinds(cache) == GcBaseKinds::MIXIN
    }

    pub fn is_gc_finalized(&self, cache: &RecordCache<'_>) -> bool {
        self.gc_base_kinds(cache).contains(GcBaseKinds::FINALIZED)
    }

    /// The record's instances live on the managed heap. Mixins count: a
    /// mixin pointer always refers into some collected object.
    pub fn is_gc_allocated(&self, cache: &RecordCache<'_>) -> bool {
        if self.is_gc_derived(cache) {
            return true;
        }
        let tu = cache.tu();
        let name = tu.name_str(tu.record(self.id).name);
        well_known::is_heap_collection(name)
    }

    // === Allocation shape ===

    pub fn is_stack_allocated(&self, cache: &RecordCache<'_>) -> bool {
        *self.stack_allocated.get_or_init(|| {
            let tu = cache.tu();
            let rec = tu.record(self.id);
            if rec.annotations.contains(Annotations::STACK_ALLOCATED) {
                return true;
            }
            for &mid in &rec.methods {
                let m = tu.method(mid);
                if matches!(m.kind, MethodKind::OperatorNew { placement: false })
                    && m.is_deleted
                    && m.annotations.contains(Annotations::STACK_ALLOCATED)
                {
                    return true;
                }
            }
            self.bases(cache)
                .iter()
                .any(|b| cache.lookup(b.decl).is_stack_allocated(cache))
        })
    }

    /// Heap allocation is disabled: at least one non-placement
    /// `operator new` is declared, and every one of them is deleted.
    pub fn is_non_newable(&self, cache: &RecordCache<'_>) -> bool {
        let tu = cache.tu();
        let mut any_deleted = false;
        for &mid in &tu.record(self.id).methods {
            let m = tu.method(mid);
            if matches!(m.kind, MethodKind::OperatorNew { placement: false }) {
                if !m.is_deleted {
                    return false;
                }
                any_deleted = true;
            }
        }
        any_deleted
    }

    /// Only a placement `operator new` is declared.
    pub fn is_only_placement_newable(&self, cache: &RecordCache<'_>) -> bool {
        let tu = cache.tu();
        let mut placement = false;
        for &mid in &tu.record(self.id).methods {
            let m = tu.method(mid);
            match m.kind {
                MethodKind::OperatorNew { placement: true } if !m.is_deleted => placement = true,
                MethodKind::OperatorNew { placement: false } if !m.is_deleted => return false,
                _ => {}
            }
        }
        placement
    }

    /// Pure-virtual, or not instantiable through any public constructor or
    /// `create` factory.
    pub fn is_considered_abstract(&self, cache: &RecordCache<'_>) -> bool {
        let tu = cache.tu();
        let rec = tu.record(self.id);
        let mut has_ctor = false;
        let mut has_public_ctor = false;
        for &mid in &rec.methods {
            let m = tu.method(mid);
            if m.is_pure {
                return true;
            }
            if let MethodKind::Constructor { is_copy_or_move } = m.kind {
                has_ctor = true;
                if !is_copy_or_move && m.access == Access::Public && !m.is_deleted {
                    has_public_ctor = true;
                }
            }
        }
        if !has_ctor || has_public_ctor {
            return false;
        }
        !rec.methods.iter().any(|&mid| {
            let m = tu.method(mid);
            m.is_static
                && m.access == Access::Public
                && tu.name_str(m.name) == well_known::CREATE
        })
    }

    pub fn is_polymorphic(&self, cache: &RecordCache<'_>) -> bool {
        *self.polymorphic.get_or_init(|| {
            let tu = cache.tu();
            tu.record(self.id)
                .methods
                .iter()
                .any(|&mid| tu.method(mid).is_virtual)
                || self
                    .bases(cache)
                    .iter()
                    .any(|b| cache.lookup(b.decl).is_polymorphic(cache))
        })
    }

    /// Opts into eager finalization via the nested marker alias.
    pub fn is_eagerly_finalized(&self, cache: &RecordCache<'_>) -> bool {
        let tu = cache.tu();
        tu.record(self.id)
            .type_aliases
            .iter()
            .any(|&alias| tu.name_str(alias) == well_known::EAGERLY_FINALIZED_MARKER)
    }

    // === Fields ===

    /// The record's fields that participate in the tracing graph.
    pub fn fields(&self, cache: &RecordCache<'_>) -> &[FieldPoint] {
        self.ensure_fields(cache);
        match self.fields.get() {
            Some(points) => &points[..],
            None => &[],
        }
    }

    /// Join of the tracing statuses of all modeled fields.
    pub fn fields_need_tracing(&self, cache: &RecordCache<'_>) -> TracingStatus {
        match self.fields_state.get() {
            FieldsState::Done(status) => status,
            // Mid-computation on this very record: answer provisionally.
            FieldsState::Computing => TracingStatus::Unknown,
            FieldsState::NotComputed => {
                self.ensure_fields(cache);
                match self.fields_state.get() {
                    FieldsState::Done(status) => status,
                    _ => TracingStatus::Unknown,
                }
            }
        }
    }

    fn ensure_fields(&self, cache: &RecordCache<'_>) {
        if self.fields.get().is_some()
            || matches!(self.fields_state.get(), FieldsState::Computing)
        {
            return;
        }
        self.fields_state.set(FieldsState::Computing);
        let tu = cache.tu();
        let rec = tu.record(self.id);
        tracing::trace!(record = tu.name_str(rec.name), "computing field points");

        let mut points = Vec::new();
        let mut status = TracingStatus::Unneeded;
        for &fid in &rec.fields {
            let field = tu.field(fid);
            if field.annotations.contains(Annotations::IGNORE) {
                continue;
            }
            if let Some(edge) = create_edge(tu, field.ty) {
                status = status.lub(edge.needs_tracing(cache, TracingContext::Recursive));
                points.push(FieldPoint {
                    field: fid,
                    span: field.span,
                    edge,
                    traced: Cell::new(false),
                });
            }
        }
        self.fields_state.set(FieldsState::Done(status));
        let _ = self.fields.set(points.into_boxed_slice());
    }

    // === Tracing ===

    /// Whether objects of this record need tracing.
    ///
    /// Heap-allocated records always do; stack-allocated records never do.
    /// Otherwise the answer joins the bases' statuses, plus the fields'
    /// when `ctx` is recursive. Forward declarations answer `Unknown`.
    pub fn needs_tracing(&self, cache: &RecordCache<'_>, ctx: TracingContext) -> TracingStatus {
        let tu = cache.tu();
        if !tu.record(self.id).has_definition {
            return TracingStatus::Unknown;
        }
        if self.is_gc_allocated(cache) {
            return TracingStatus::Needed;
        }
        if self.is_stack_allocated(cache) {
            return TracingStatus::Unneeded;
        }
        let mut status = TracingStatus::Unneeded;
        for base in self.bases(cache) {
            status = status.lub(cache.lookup(base.decl).needs_tracing(cache, ctx));
        }
        if ctx == TracingContext::Recursive {
            status = status.lub(self.fields_need_tracing(cache));
        }
        status
    }

    /// Whether the record must declare (or inherit and extend) a trace
    /// method: more than one traceable base forces one, otherwise the
    /// fields decide.
    pub fn requires_trace_method(&self, cache: &RecordCache<'_>) -> bool {
        if self.is_stack_allocated(cache) {
            return false;
        }
        let traceable_bases = self
            .bases(cache)
            .iter()
            .filter(|b| {
                cache
                    .lookup(b.decl)
                    .needs_tracing(cache, TracingContext::Recursive)
                    .is_needed()
            })
            .count();
        if traceable_bases > 1 {
            return true;
        }
        self.fields_need_tracing(cache).is_needed()
    }

    pub fn tracing_methods(&self, cache: &RecordCache<'_>) -> &TracingMethods {
        self.tracing_methods
            .get_or_init(|| determine_tracing_methods(cache.tu(), self.id))
    }

    /// The class itself declares the mixin marker methods.
    pub fn declares_gc_mixin_methods(&self, cache: &RecordCache<'_>) -> bool {
        self.tracing_methods(cache).declares_mixin_methods
    }

    /// The trace method whose body covers this record, declared here or
    /// inherited from a base.
    pub fn inherits_trace(&self, cache: &RecordCache<'_>) -> Option<MethodId> {
        if let Some(trace) = self.tracing_methods(cache).trace {
            return Some(trace);
        }
        self.bases(cache)
            .iter()
            .find_map(|b| cache.lookup(b.decl).inherits_trace(cache))
    }

    /// The manual trace dispatch covering this record, if any.
    pub fn trace_dispatch(&self, cache: &RecordCache<'_>) -> Option<MethodId> {
        if let Some(dispatch) = self.tracing_methods(cache).dispatch {
            return Some(dispatch);
        }
        let mut found = None;
        for base in self.bases(cache) {
            if let Some(dispatch) = cache.lookup(base.decl).trace_dispatch(cache) {
                debug_assert!(found.is_none(), "dispatch inherited from multiple bases");
                found.get_or_insert(dispatch);
            }
        }
        found
    }

    /// The manual finalize dispatch covering this record, if any.
    pub fn finalize_dispatch(&self, cache: &RecordCache<'_>) -> Option<MethodId> {
        if let Some(dispatch) = self.tracing_methods(cache).finalize_dispatch {
            return Some(dispatch);
        }
        let mut found = None;
        for base in self.bases(cache) {
            if let Some(dispatch) = cache.lookup(base.decl).finalize_dispatch(cache) {
                debug_assert!(found.is_none(), "dispatch inherited from multiple bases");
                found.get_or_insert(dispatch);
            }
        }
        found
    }

    // === Finalization ===

    /// Whether destroying an instance runs nontrivial cleanup.
    pub fn needs_finalization(&self, cache: &RecordCache<'_>) -> bool {
        match self.finalization.get() {
            FinalizationState::Done(v) => return v,
            // Re-entry through a field cycle: provisionally trivial.
            FinalizationState::Computing => return false,
            FinalizationState::NotComputed => {}
        }
        self.finalization.set(FinalizationState::Computing);
        let v = self.compute_needs_finalization(cache);
        self.finalization.set(FinalizationState::Done(v));
        v
    }

    fn compute_needs_finalization(&self, cache: &RecordCache<'_>) -> bool {
        let tu = cache.tu();
        let rec = tu.record(self.id);
        for &mid in &rec.methods {
            let m = tu.method(mid);
            if matches!(m.kind, MethodKind::Destructor) && m.is_user_provided {
                return true;
            }
        }
        if self
            .fields(cache)
            .iter()
            .any(|p| p.edge.needs_finalization(cache))
        {
            return true;
        }
        self.bases(cache).iter().any(|base| {
            let name = tu.name_str(tu.record(base.decl).name);
            if well_known::is_gc_base(name) || well_known::is_ignorable_destructor_base(name) {
                return false;
            }
            cache.lookup(base.decl).needs_finalization(cache)
        })
    }
}

/// True for a method with a trace-family name and a visitor parameter.
pub fn is_trace_method(tu: &TranslationUnit, method: &MethodDecl) -> bool {
    well_known::is_trace_family(tu.name_str(method.name))
        && method.params.len() == 1
        && is_visitor_param(tu, method.params[0])
}

fn is_visitor_param(tu: &TranslationUnit, ty: gcv_ir::TypeId) -> bool {
    match tu.type_kind(ty) {
        TypeKind::Pointer(pointee) | TypeKind::Reference(pointee) => {
            tu.class_decl(*pointee).is_some_and(|decl| {
                let name = tu.name_str(tu.record(decl).name);
                name == well_known::VISITOR || name == well_known::VISITOR_DISPATCHER
            })
        }
        TypeKind::Dependent(name) => tu.name_str(*name) == well_known::VISITOR_DISPATCHER,
        _ => false,
    }
}

fn determine_tracing_methods(tu: &TranslationUnit, id: RecordId) -> TracingMethods {
    let mut trace = None;
    let mut trace_impl = None;
    let mut after_dispatch = None;
    let mut after_dispatch_impl = None;
    let mut finalize_dispatch = None;
    let mut declares_mixin_methods = false;

    for &mid in &tu.record(id).methods {
        let m = tu.method(mid);
        let name = tu.name_str(m.name);
        if name == well_known::FINALIZE_DISPATCH {
            finalize_dispatch = Some(mid);
            continue;
        }
        if well_known::is_mixin_marker_method(name) {
            declares_mixin_methods = true;
            continue;
        }
        if !is_trace_method(tu, m) {
            continue;
        }
        match name {
            well_known::TRACE => trace = Some(mid),
            well_known::TRACE_IMPL => trace_impl = Some(mid),
            well_known::TRACE_AFTER_DISPATCH => after_dispatch = Some(mid),
            well_known::TRACE_AFTER_DISPATCH_IMPL => after_dispatch_impl = Some(mid),
            _ => {}
        }
    }

    // With manual dispatch the body to check is the after-dispatch method
    // and the outer trace becomes the dispatcher. A forwarding *Impl
    // supersedes its wrapper as the body holder.
    let (trace, dispatch) = if after_dispatch.is_some() || after_dispatch_impl.is_some() {
        (after_dispatch_impl.or(after_dispatch), trace_impl.or(trace))
    } else {
        (trace_impl.or(trace), None)
    };

    TracingMethods {
        trace,
        dispatch,
        finalize_dispatch,
        declares_mixin_methods,
    }
}

#[cfg(test)]
mod tests;
