//! Manual-dispatch check.
//!
//! A class family using manual dispatch routes `trace` (and, when
//! finalized, `finalizeGarbageCollectedObject`) through a hand-written
//! switch on the concrete type. For each participating class the dispatch
//! body must mention a member of that class; a syntactic check, not
//! reachability analysis.

use gcv_ir::{Body, MemberTarget, MethodId, RecordId, StmtId, StmtKind, TranslationUnit};

/// True when the dispatch method's body mentions a member of `receiver`.
pub fn dispatches_to_receiver(
    tu: &TranslationUnit,
    receiver: RecordId,
    dispatch: MethodId,
) -> bool {
    let Body::Parsed(body) = tu.method(dispatch).body else {
        // Body not visible in this unit; nothing to prove.
        return true;
    };
    mentions_receiver(tu, receiver, body)
}

fn mentions_receiver(tu: &TranslationUnit, receiver: RecordId, stmt: StmtId) -> bool {
    let node = tu.stmt(stmt);
    match &node.kind {
        StmtKind::Member { target, .. } => {
            let parent = match target {
                MemberTarget::Field(fid) => tu.field(*fid).parent,
                MemberTarget::Method(mid) => tu.method(*mid).parent,
            };
            if parent == receiver {
                return true;
            }
        }
        StmtKind::MethodRef(mid) => {
            if tu.method(*mid).parent == receiver {
                return true;
            }
        }
        StmtKind::UnresolvedMember {
            qualifier: Some(qualifier),
            ..
        } => {
            // Dependent Receiver<T>::member form, matched by name.
            if tu.name_str(*qualifier) == tu.name_str(tu.record(receiver).name) {
                return true;
            }
        }
        _ => {}
    }
    node.children()
        .into_iter()
        .any(|child| mentions_receiver(tu, receiver, child))
}
