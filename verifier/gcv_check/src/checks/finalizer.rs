//! Finalizer-body check.
//!
//! When a finalizer runs, any object it references through the managed
//! heap may already have been swept. The check finds every field access in
//! the destructor body that occurs in a call-receiver position (function
//! call, `->`, `[]`, or anywhere in a call's argument list) and flags it
//! when the field's edge might reference an already-collected object.
//!
//! Eager finalization narrows the rule: an eagerly finalized class may
//! touch fields whose referents are themselves eagerly finalized, since
//! eager finalizers run before any sweeping. Such accesses are still
//! reported, but as a distinct finding.

use gcv_ir::{Body, FieldId, MemberTarget, MethodId, Span, StmtId, StmtKind, TranslationUnit};
use gcv_model::{Edge, RecordCache, RecordInfo};

/// One unsafe field access inside a finalizer body.
#[derive(Copy, Clone, Debug)]
pub struct FinalizerAccess {
    pub field: FieldId,
    /// Location of the offending access expression.
    pub span: Span,
    /// The access is unsafe only under the eager-finalization narrowing.
    pub eagerly_finalized: bool,
}

/// Flag unsafe field accesses in the destructor body of `info`.
pub fn check_finalizer_body(
    cache: &RecordCache<'_>,
    info: &RecordInfo,
    destructor: MethodId,
) -> Vec<FinalizerAccess> {
    let tu = cache.tu();
    let Body::Parsed(body) = tu.method(destructor).body else {
        return Vec::new();
    };
    let mut checker = FinalizerChecker {
        cache,
        tu,
        info,
        host_eagerly_finalized: info.is_eagerly_finalized(cache),
        accesses: Vec::new(),
    };
    checker.walk(body, false);
    checker.accesses
}

struct FinalizerChecker<'a, 'tu> {
    cache: &'a RecordCache<'tu>,
    tu: &'tu TranslationUnit,
    info: &'a RecordInfo,
    host_eagerly_finalized: bool,
    accesses: Vec<FinalizerAccess>,
}

enum Collected {
    No,
    Yes,
    EagerlyFinalized,
}

impl FinalizerChecker<'_, '_> {
    /// `blacklist` is true inside a call-receiver or call-argument context.
    fn walk(&mut self, stmt: StmtId, blacklist: bool) {
        let node = self.tu.stmt(stmt);
        match &node.kind {
            StmtKind::Compound(stmts) => {
                for &s in stmts {
                    self.walk(s, false);
                }
            }
            StmtKind::Call { callee, args } => {
                self.walk(*callee, true);
                for &arg in args {
                    self.walk(arg, true);
                }
            }
            StmtKind::Subscript { base, index } => {
                self.walk(*base, true);
                self.walk(*index, blacklist);
            }
            StmtKind::Member {
                base,
                target,
                is_arrow,
                ..
            } => {
                if blacklist {
                    if let MemberTarget::Field(fid) = target {
                        self.check_field_access(*fid, node.span);
                    }
                }
                if let Some(base) = base {
                    self.walk(*base, blacklist || *is_arrow);
                }
            }
            StmtKind::UnresolvedMember { base, .. } => {
                if let Some(base) = base {
                    self.walk(*base, blacklist);
                }
            }
            StmtKind::AddrOf(inner) => self.walk(*inner, blacklist),
            StmtKind::DeclRef(_) | StmtKind::MethodRef(_) | StmtKind::This => {}
        }
    }

    fn check_field_access(&mut self, field: FieldId, span: Span) {
        let Some(point) = self
            .info
            .fields(self.cache)
            .iter()
            .find(|p| p.field == field)
        else {
            return;
        };
        match self.might_be_collected(&point.edge) {
            Collected::No => {}
            Collected::Yes => self.accesses.push(FinalizerAccess {
                field,
                span,
                eagerly_finalized: false,
            }),
            Collected::EagerlyFinalized => self.accesses.push(FinalizerAccess {
                field,
                span,
                eagerly_finalized: true,
            }),
        }
    }

    fn might_be_collected(&self, edge: &Edge) -> Collected {
        match edge {
            Edge::Member(inner) | Edge::WeakMember(inner) => {
                if self.host_eagerly_finalized && self.referent_eagerly_finalized(inner) {
                    Collected::EagerlyFinalized
                } else {
                    Collected::Yes
                }
            }
            Edge::Collection(collection) => {
                if !collection.on_heap || collection.is_root {
                    return Collected::No;
                }
                if self.host_eagerly_finalized {
                    // The collection object itself survives until the eager
                    // finalizer runs; its elements decide.
                    for member in &collection.members {
                        match self.might_be_collected(member) {
                            Collected::No => {}
                            hit @ (Collected::Yes | Collected::EagerlyFinalized) => return hit,
                        }
                    }
                    Collected::No
                } else {
                    Collected::Yes
                }
            }
            _ => Collected::No,
        }
    }

    fn referent_eagerly_finalized(&self, inner: &Edge) -> bool {
        inner
            .value_decl()
            .is_some_and(|decl| self.cache.lookup(decl).is_eagerly_finalized(self.cache))
    }
}

#[cfg(test)]
mod tests;
