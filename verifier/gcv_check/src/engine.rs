//! The rule engine: one pass over a translation unit.
//!
//! Phases:
//! 1. **Collect**: force late parsing of deferred trace-method bodies so
//!    the body-level checks can see them.
//! 2. **Check records**: structural rules per class, in a fixed order so
//!    findings are deterministic.
//! 3. **Check trace methods**: body completeness for every trace-shaped
//!    method with a visible body, expanding template patterns into their
//!    specializations.
//!
//! No finding aborts the pass; everything accumulates in the diagnostic
//! queue and is sorted, promoted, and flushed at the end.

use std::fs::File;

use gcv_diagnostic::{Diagnostic, DiagnosticQueue, QueueConfig};
use gcv_ir::{
    Annotations, Body, MethodId, MethodKind, RecordDecl, RecordId, StmtKind, TranslationUnit,
};
use gcv_model::{
    is_trace_method, well_known, GcBaseKinds, RecordCache, RecordInfo, TracingContext,
};

use crate::checks;
use crate::config::VerifierOptions;
use crate::dump;
use crate::reporting;

/// The verifier pass over one translation unit.
pub struct GcVerifier {
    options: VerifierOptions,
}

impl GcVerifier {
    pub fn new(options: VerifierOptions) -> Self {
        GcVerifier { options }
    }

    pub fn options(&self) -> &VerifierOptions {
        &self.options
    }

    /// Run every check over `tu` and return the ordered findings.
    ///
    /// Takes the unit mutably for the late-parse hook; all checking is over
    /// a shared reborrow.
    #[tracing::instrument(level = "debug", skip_all, fields(file = %tu.file_name))]
    pub fn check_translation_unit(&self, tu: &mut TranslationUnit) -> Vec<Diagnostic> {
        if tu.has_fatal_errors {
            return Vec::new();
        }

        let pending: Vec<MethodId> = tu
            .methods()
            .filter(|(_, m)| is_trace_method(tu, m) && matches!(m.body, Body::Unparsed))
            .map(|(mid, _)| mid)
            .collect();
        tu.force_late_parsed_bodies(&pending);

        let tu = &*tu;
        let cache = RecordCache::new(tu);
        let mut queue = DiagnosticQueue::with_config(QueueConfig {
            error_limit: 0,
            warnings_as_errors: self.options.warnings_as_errors,
        });

        for (id, record) in tu.records() {
            if !record.has_definition || self.is_ignored(tu, record) {
                continue;
            }
            if record.is_template {
                // Patterns are checked through their specializations.
                for &spec in &record.specializations {
                    self.check_record(&cache, &mut queue, spec);
                }
                continue;
            }
            if !record.template_args.is_empty() {
                continue;
            }
            self.check_record(&cache, &mut queue, id);
        }

        self.check_trace_methods(&cache, &mut queue);

        if let Some(path) = &self.options.dump_graph {
            let result = File::create(path)
                .map_err(dump::DumpError::Io)
                .and_then(|mut file| dump::dump_graph(&cache, &mut file));
            if let Err(err) = result {
                tracing::warn!(path = %path.display(), %err, "graph dump failed");
            }
        }

        queue.flush()
    }

    fn is_ignored(&self, tu: &TranslationUnit, record: &RecordDecl) -> bool {
        record.annotations.contains(Annotations::IGNORE)
            || self.options.is_ignored_class(tu.name_str(record.name))
            || self.options.is_ignored_file(tu.name_str(record.file))
    }

    fn check_record(&self, cache: &RecordCache<'_>, queue: &mut DiagnosticQueue, id: RecordId) {
        let tu = cache.tu();
        let info = cache.lookup(id);

        if info.is_stack_allocated(cache) {
            for base in info.bases(cache) {
                let name = tu.name_str(tu.record(base.decl).name);
                if !well_known::is_gc_base(name)
                    && !cache.lookup(base.decl).is_stack_allocated(cache)
                {
                    queue.push(reporting::stack_allocated_hierarchy(tu, &info, base));
                }
            }
        }

        if let Some(trace) = info.tracing_methods(cache).trace {
            if tu.method(trace).is_pure {
                queue.push(reporting::pure_virtual_trace(tu, &info, trace));
            }
        }

        if info.requires_trace_method(cache) && info.tracing_methods(cache).trace.is_none() {
            let fields = info.fields(cache).iter().filter(|p| {
                p.edge
                    .needs_tracing(cache, TracingContext::Recursive)
                    .is_needed()
            });
            queue.push(reporting::missing_trace_method(tu, &info, fields));
        }

        self.check_polymorphic(cache, queue, &info);

        let field_errors = checks::check_fields(cache, &info);
        if !field_errors.is_empty() {
            queue.push(reporting::invalid_fields(
                tu,
                &info,
                &field_errors,
                &self.options,
            ));
        }

        if info.is_gc_derived(cache) {
            // Roots in off-heap classes are the sanctioned way to keep
            // managed objects alive; roots inside managed objects leak.
            for path in checks::check_gc_roots(cache, &info) {
                queue.push(reporting::gc_root(tu, &info, &path));
            }
        }

        if !info.is_gc_derived(cache) || info.is_gc_mixin(cache) {
            return;
        }

        if !left_most_derives_gc(tu, id) {
            queue.push(reporting::left_most_derivation(tu, &info));
        }

        self.check_dispatch(cache, queue, &info);

        for &mid in &tu.record(id).methods {
            let m = tu.method(mid);
            if matches!(m.kind, MethodKind::OperatorNew { placement: false }) && !m.is_deleted {
                queue.push(reporting::operator_new_override(tu, &info, mid));
            }
        }

        // A base's trace cannot cover the mixin side of the hierarchy, so
        // inheriting one is not enough here.
        let mixin_derived = info.gc_base_kinds(cache).contains(GcBaseKinds::MIXIN)
            || info.declares_gc_mixin_methods(cache);
        if mixin_derived
            && info.tracing_methods(cache).trace.is_none()
            && info.tracing_methods(cache).dispatch.is_none()
        {
            queue.push(reporting::missing_mixin_trace(tu, &info));
        }

        self.check_trace_override(cache, queue, &info);
        self.check_finalization(cache, queue, &info);
    }

    /// Vtable safety: a virtual trace on a polymorphic class is only sound
    /// when the left-most ancestor guarantees the vtable is set before any
    /// GC can run during construction.
    fn check_polymorphic(
        &self,
        cache: &RecordCache<'_>,
        queue: &mut DiagnosticQueue,
        info: &RecordInfo,
    ) {
        let Some(own_trace) = info.tracing_methods(cache).trace else {
            return;
        };
        if !info.is_polymorphic(cache) {
            return;
        }
        let tu = cache.tu();
        let mut current = info.id();
        loop {
            let Some(first) = tu.record(current).bases.first() else {
                break;
            };
            let Some(decl) = tu.class_decl(first.ty) else {
                // Dependent left-most base; assume the instantiation is safe.
                return;
            };
            let base = tu.record(decl);
            if well_known::is_safe_polymorphic_base(tu.name_str(base.name)) {
                return;
            }
            if !base.has_definition {
                return;
            }
            current = decl;
        }
        if current == info.id() {
            return;
        }
        let left_most = cache.lookup(current);
        if tu.method(own_trace).is_virtual {
            let left_trace_virtual = left_most
                .tracing_methods(cache)
                .trace
                .is_some_and(|m| tu.method(m).is_virtual);
            if !left_trace_virtual {
                queue.push(reporting::left_most_base_trace_not_virtual(
                    tu, info, &left_most, own_trace,
                ));
            }
        } else if !left_most.is_polymorphic(cache) {
            queue.push(reporting::left_most_base_not_polymorphic(
                tu, info, &left_most,
            ));
        }
    }

    fn check_dispatch(
        &self,
        cache: &RecordCache<'_>,
        queue: &mut DiagnosticQueue,
        info: &RecordInfo,
    ) {
        let tu = cache.tu();
        let Some(dispatch) = info.trace_dispatch(cache) else {
            return;
        };
        if info.is_polymorphic(cache) {
            queue.push(reporting::dispatch_on_polymorphic(tu, info, dispatch));
            return;
        }
        if info.is_considered_abstract(cache) {
            // Never the concrete type of an allocation; no dispatch arm
            // required.
            return;
        }
        if !checks::dispatches_to_receiver(tu, info.id(), dispatch) {
            queue.push(reporting::missing_trace_dispatch(tu, info, dispatch));
        }
        if info.is_gc_finalized(cache) {
            match info.finalize_dispatch(cache) {
                None => queue.push(reporting::missing_finalize_dispatch_method(tu, info)),
                Some(finalize) => {
                    if !checks::dispatches_to_receiver(tu, info.id(), finalize) {
                        queue.push(reporting::missing_finalize_dispatch(tu, info, finalize));
                    }
                }
            }
        }
    }

    /// A derived `trace` hiding a base's non-virtual `trace` silently
    /// disconnects the base's fields from marking.
    fn check_trace_override(
        &self,
        cache: &RecordCache<'_>,
        queue: &mut DiagnosticQueue,
        info: &RecordInfo,
    ) {
        let tu = cache.tu();
        let Some(own) = info.tracing_methods(cache).trace else {
            return;
        };
        if tu.name_str(tu.method(own).name) != well_known::TRACE {
            return;
        }
        for base in info.bases(cache) {
            if let Some(base_trace) = cache.lookup(base.decl).inherits_trace(cache) {
                let m = tu.method(base_trace);
                if !m.is_virtual && tu.name_str(m.name) == well_known::TRACE {
                    queue.push(reporting::trace_override(tu, info, own, base_trace));
                }
            }
        }
    }

    fn check_finalization(
        &self,
        cache: &RecordCache<'_>,
        queue: &mut DiagnosticQueue,
        info: &RecordInfo,
    ) {
        let tu = cache.tu();
        if info.needs_finalization(cache) && !info.is_gc_finalized(cache) {
            queue.push(reporting::missing_finalized_base(cache, info));
        }
        if !info.is_gc_finalized(cache) {
            return;
        }
        let Some(destructor) = user_destructor(tu, info.id()) else {
            return;
        };
        for access in checks::check_finalizer_body(cache, info, destructor) {
            queue.push(reporting::finalizer_access(tu, info, &access));
        }
        if self.options.warn_unneeded_finalizer && finalizer_is_unneeded(cache, info, destructor) {
            queue.push(reporting::unneeded_finalizer(tu, info, destructor));
        }
    }

    fn check_trace_methods(&self, cache: &RecordCache<'_>, queue: &mut DiagnosticQueue) {
        let tu = cache.tu();
        for (mid, method) in tu.methods() {
            if !is_trace_method(tu, method) || !matches!(method.body, Body::Parsed(_)) {
                continue;
            }
            let owner = tu.record(method.parent);
            if !owner.has_definition || self.is_ignored(tu, owner) {
                continue;
            }
            if owner.is_template {
                for &spec in &owner.specializations {
                    self.check_one_trace_method(cache, queue, spec, mid);
                }
                continue;
            }
            self.check_one_trace_method(cache, queue, method.parent, mid);
        }
    }

    fn check_one_trace_method(
        &self,
        cache: &RecordCache<'_>,
        queue: &mut DiagnosticQueue,
        record: RecordId,
        method: MethodId,
    ) {
        let tu = cache.tu();
        let info = cache.lookup(record);
        // The dispatcher's body switches on the concrete type; completeness
        // is checked on the after-dispatch method instead.
        if info.tracing_methods(cache).dispatch == Some(method) {
            return;
        }
        let outcome = checks::check_trace_body(cache, &info, method);
        if outcome.delegated {
            return;
        }
        let untraced = checks::untraced_fields(cache, &info);
        if !untraced.is_empty() {
            queue.push(reporting::untraced_fields(tu, &info, method, &untraced));
        }
        for base in checks::untraced_bases(cache, &info) {
            queue.push(reporting::untraced_base(tu, &info, method, base));
        }
    }
}

fn user_destructor(tu: &TranslationUnit, id: RecordId) -> Option<MethodId> {
    tu.record(id).methods.iter().copied().find(|&mid| {
        let m = tu.method(mid);
        matches!(m.kind, MethodKind::Destructor) && m.is_user_provided
    })
}

/// The left-most derivation chain must reach a GC base marker. An
/// unresolved (dependent) base along the chain passes conservatively.
fn left_most_derives_gc(tu: &TranslationUnit, id: RecordId) -> bool {
    let mut current = id;
    loop {
        let Some(first) = tu.record(current).bases.first() else {
            return false;
        };
        let Some(decl) = tu.class_decl(first.ty) else {
            return true;
        };
        if well_known::is_gc_base(tu.name_str(tu.record(decl).name)) {
            return true;
        }
        if !tu.record(decl).has_definition {
            return true;
        }
        current = decl;
    }
}

/// An empty finalizer in a class nothing else forces to be finalized.
fn finalizer_is_unneeded(
    cache: &RecordCache<'_>,
    info: &RecordInfo,
    destructor: MethodId,
) -> bool {
    let tu = cache.tu();
    let Body::Parsed(body) = tu.method(destructor).body else {
        return false;
    };
    let StmtKind::Compound(stmts) = &tu.stmt(body).kind else {
        return false;
    };
    if !stmts.is_empty() {
        return false;
    }
    if info
        .fields(cache)
        .iter()
        .any(|p| p.edge.needs_finalization(cache))
    {
        return false;
    }
    !info.bases(cache).iter().any(|base| {
        let name = tu.name_str(tu.record(base.decl).name);
        if well_known::is_gc_base(name) || well_known::is_ignorable_destructor_base(name) {
            return false;
        }
        cache.lookup(base.decl).needs_finalization(cache)
    })
}
