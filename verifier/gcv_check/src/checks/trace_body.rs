//! Trace-method-body check.
//!
//! Walks a trace method's body marking each base and field of the checked
//! record that it properly traces, handling both resolved and
//! template-dependent call forms:
//!
//! - `visitor->trace(m_field)` marks the field,
//! - `TraceIfNeeded<T>::trace(visitor, &m_field)` marks the field,
//! - `Base::trace(visitor)` (resolved or dependent `Super<T>::trace`)
//!   marks the base, tolerating omitted intermediate ancestors that do not
//!   declare a trace of their own,
//! - `visitor->registerWeakMembers(...)` enters a weak-callback mode over
//!   the named callback body where any mention marks weak edges only,
//! - a wholesale delegation to a `traceImpl` variant defers the check to
//!   the impl method, which is checked in its own right.
//!
//! The untraced remainder is what reporting turns into findings.

use gcv_ir::{
    Body, FieldId, MemberTarget, MethodId, Name, RecordId, StmtId, StmtKind, TranslationUnit,
};
use gcv_model::{well_known, BasePoint, FieldPoint, RecordCache, RecordInfo, TracingContext};

/// What the body walk concluded.
#[derive(Copy, Clone, Debug)]
pub struct TraceBodyOutcome {
    /// The body delegates wholesale to an impl variant; completeness is
    /// checked there instead.
    pub delegated: bool,
}

/// Walk `method`'s body and mark the traced points of `info`.
pub fn check_trace_body(
    cache: &RecordCache<'_>,
    info: &RecordInfo,
    method: MethodId,
) -> TraceBodyOutcome {
    let tu = cache.tu();
    let Body::Parsed(body) = tu.method(method).body else {
        // Invisible body, skip conservatively.
        return TraceBodyOutcome { delegated: true };
    };
    let mut checker = TraceChecker {
        cache,
        tu,
        info,
        delegated: false,
    };
    checker.walk(body);
    TraceBodyOutcome {
        delegated: checker.delegated,
    }
}

/// The fields of `info` that need tracing but were not marked.
pub fn untraced_fields<'a>(
    cache: &RecordCache<'_>,
    info: &'a RecordInfo,
) -> Vec<&'a FieldPoint> {
    info.fields(cache)
        .iter()
        .filter(|p| {
            !p.is_traced()
                && p.edge
                    .needs_tracing(cache, TracingContext::Recursive)
                    .is_needed()
        })
        .collect()
}

/// The bases of `info` whose hierarchy declares a trace but which were not
/// marked.
pub fn untraced_bases<'a>(
    cache: &RecordCache<'_>,
    info: &'a RecordInfo,
) -> Vec<&'a BasePoint> {
    info.bases(cache)
        .iter()
        .filter(|b| !b.is_traced() && cache.lookup(b.decl).inherits_trace(cache).is_some())
        .collect()
}

struct TraceChecker<'a, 'tu> {
    cache: &'a RecordCache<'tu>,
    tu: &'tu TranslationUnit,
    info: &'a RecordInfo,
    delegated: bool,
}

impl TraceChecker<'_, '_> {
    fn walk(&mut self, stmt: StmtId) {
        let node = self.tu.stmt(stmt);
        if let StmtKind::Call { callee, args } = &node.kind {
            self.handle_call(*callee, args);
        }
        for child in node.children() {
            self.walk(child);
        }
    }

    fn handle_call(&mut self, callee: StmtId, args: &[StmtId]) {
        match &self.tu.stmt(callee).kind {
            StmtKind::UnresolvedMember {
                base,
                qualifier,
                name,
            } => {
                let name = self.tu.name_str(*name);
                match qualifier {
                    Some(qualifier) => self.handle_qualified(*qualifier, name, args),
                    None => self.handle_plain(base.is_some(), name, args),
                }
            }
            StmtKind::Member {
                base,
                qualifier,
                target: MemberTarget::Method(mid),
                ..
            } => {
                let name = self.tu.name_str(self.tu.method(*mid).name);
                match qualifier {
                    Some(qualifier) => {
                        if well_known::is_trace_family(name) {
                            self.mark_base(|decl| decl == *qualifier);
                        }
                    }
                    None => self.handle_plain(base.is_some(), name, args),
                }
            }
            _ => {}
        }
    }

    /// `Qualifier<T>::name(...)` in dependent form, matched by name string.
    fn handle_qualified(&mut self, qualifier: Name, name: &str, args: &[StmtId]) {
        let qualifier = self.tu.name_str(qualifier);
        if qualifier == well_known::TRACE_IF_NEEDED && name == well_known::TRACE {
            // TraceIfNeeded<T>::trace(visitor, &field).
            if let Some(field) = args.get(1).and_then(|&a| self.argument_field(a)) {
                self.mark_field(field, false);
            }
            return;
        }
        if well_known::is_trace_family(name) {
            self.mark_base(|decl| self.tu.name_str(self.tu.record(decl).name) == qualifier);
        }
    }

    /// `receiver->name(...)` or an implicit-this `name(...)` call.
    fn handle_plain(&mut self, has_receiver: bool, name: &str, args: &[StmtId]) {
        match name {
            well_known::TRACE if has_receiver => {
                // visitor->trace(field): the single-argument shape.
                if let [arg] = args {
                    if let Some(field) = self.argument_field(*arg) {
                        self.mark_field(field, false);
                    }
                }
            }
            well_known::REGISTER_WEAK_MEMBERS => self.handle_weak_registration(args),
            well_known::TRACE_IMPL | well_known::TRACE_AFTER_DISPATCH_IMPL if !has_receiver => {
                self.delegated = true;
            }
            _ => {}
        }
    }

    /// Weak members are traced through a registered callback; its body is
    /// walked in a relaxed mode where any mention marks weak edges.
    fn handle_weak_registration(&mut self, args: &[StmtId]) {
        let callback = args.iter().find_map(|&arg| match self.tu.stmt(arg).kind {
            StmtKind::MethodRef(mid) => Some(mid),
            _ => None,
        });
        match callback {
            Some(mid) => {
                if let Body::Parsed(body) = self.tu.method(mid).body {
                    self.walk_weak(body);
                }
            }
            None => {
                // Callback not resolvable pre-instantiation; accept the
                // registration for every weak point.
                for point in self.info.fields(self.cache) {
                    if point.edge.is_weak_member() {
                        point.mark_traced();
                    }
                }
            }
        }
    }

    fn walk_weak(&mut self, stmt: StmtId) {
        let node = self.tu.stmt(stmt);
        if let StmtKind::Member {
            target: MemberTarget::Field(fid),
            ..
        } = node.kind
        {
            self.mark_field(fid, true);
        }
        for child in node.children() {
            self.walk_weak(child);
        }
    }

    /// Resolve a call argument to a field of the checked record,
    /// unwrapping one address-of.
    fn argument_field(&self, arg: StmtId) -> Option<FieldId> {
        match self.tu.stmt(arg).kind {
            StmtKind::Member {
                target: MemberTarget::Field(fid),
                ..
            } => Some(fid),
            StmtKind::AddrOf(inner) => self.argument_field(inner),
            _ => None,
        }
    }

    fn mark_field(&self, field: FieldId, weak_only: bool) {
        // When checking a specialization against its pattern's body, the
        // body references the pattern's field handles; match by name then.
        let name = self.tu.field(field).name;
        if let Some(point) = self
            .info
            .fields(self.cache)
            .iter()
            .find(|p| p.field == field || self.tu.field(p.field).name == name)
        {
            if !weak_only || point.edge.is_weak_member() {
                point.mark_traced();
            }
        }
    }

    /// Mark the direct base matching the predicate, or one whose hierarchy
    /// reaches a match through ancestors that declare no trace of their
    /// own (a derived trace may legitimately skip them).
    fn mark_base<F: Fn(RecordId) -> bool>(&self, matches: F) {
        for base in self.info.bases(self.cache) {
            if matches(base.decl) || self.reachable_past_untraced(base.decl, &matches) {
                base.mark_traced();
                return;
            }
        }
    }

    fn reachable_past_untraced<F: Fn(RecordId) -> bool>(
        &self,
        from: RecordId,
        matches: &F,
    ) -> bool {
        let info = self.cache.lookup(from);
        if info.tracing_methods(self.cache).trace.is_some() {
            return false;
        }
        info.bases(self.cache)
            .iter()
            .any(|b| matches(b.decl) || self.reachable_past_untraced(b.decl, matches))
    }
}
