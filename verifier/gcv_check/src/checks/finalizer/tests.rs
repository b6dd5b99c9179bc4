use gcv_ir::fixture::TuBuilder;
use gcv_ir::MethodId;
use gcv_model::RecordCache;
use pretty_assertions::assert_eq;

use super::*;

struct Fixture {
    b: TuBuilder,
    host: gcv_ir::RecordId,
    dtor: MethodId,
    field: gcv_ir::FieldId,
}

fn finalized_host(eager: bool) -> Fixture {
    let mut b = TuBuilder::new("finalizer.cpp");
    let obj = b.record("HeapObject");
    b.gc_base(obj, "GarbageCollected");
    let host = b.record("Host");
    b.gc_base(host, "GarbageCollectedFinalized");
    if eager {
        b.type_alias(host, "IsEagerlyFinalizedMarker");
    }
    let cls = b.class_ty(obj);
    let member = b.wrapper_ty("Member", &[cls]);
    let field = b.field(host, "m_obj", member);
    let dtor = b.destructor(host);
    Fixture {
        b,
        host,
        dtor,
        field,
    }
}

#[test]
fn dereferencing_a_member_is_flagged() {
    let mut f = finalized_host(false);
    // ~Host() { m_obj->shutdown(); }
    let receiver = f.b.field_ref(f.field);
    let callee = f.b.unresolved(Some(receiver), "shutdown");
    let call = f.b.call(callee, &[]);
    let body = f.b.compound(&[call]);
    f.b.set_body(f.dtor, body);

    let tu = f.b.finish();
    let cache = RecordCache::new(&tu);
    let accesses = check_finalizer_body(&cache, &cache.lookup(f.host), f.dtor);

    assert_eq!(accesses.len(), 1);
    assert_eq!(accesses[0].field, f.field);
    assert!(!accesses[0].eagerly_finalized);
}

#[test]
fn passing_a_member_as_a_call_argument_is_flagged() {
    let mut f = finalized_host(false);
    // ~Host() { release(m_obj); }
    let callee = f.b.decl_ref("release");
    let arg = f.b.field_ref(f.field);
    let call = f.b.call(callee, &[arg]);
    let body = f.b.compound(&[call]);
    f.b.set_body(f.dtor, body);

    let tu = f.b.finish();
    let cache = RecordCache::new(&tu);
    let accesses = check_finalizer_body(&cache, &cache.lookup(f.host), f.dtor);

    assert_eq!(accesses.len(), 1);
}

#[test]
fn plain_mention_outside_call_context_is_allowed() {
    let mut f = finalized_host(false);
    // ~Host() { m_obj; }
    let mention = f.b.field_ref(f.field);
    let body = f.b.compound(&[mention]);
    f.b.set_body(f.dtor, body);

    let tu = f.b.finish();
    let cache = RecordCache::new(&tu);

    assert!(check_finalizer_body(&cache, &cache.lookup(f.host), f.dtor).is_empty());
}

#[test]
fn eager_host_touching_eager_referent_is_reported_distinctly() {
    let mut b = TuBuilder::new("finalizer.cpp");
    let obj = b.record("EagerObject");
    b.gc_base(obj, "GarbageCollectedFinalized");
    b.type_alias(obj, "IsEagerlyFinalizedMarker");
    let host = b.record("Host");
    b.gc_base(host, "GarbageCollectedFinalized");
    b.type_alias(host, "IsEagerlyFinalizedMarker");
    let cls = b.class_ty(obj);
    let member = b.wrapper_ty("Member", &[cls]);
    let field = b.field(host, "m_obj", member);
    let dtor = b.destructor(host);
    let receiver = b.field_ref(field);
    let callee = b.unresolved(Some(receiver), "shutdown");
    let call = b.call(callee, &[]);
    let body = b.compound(&[call]);
    b.set_body(dtor, body);

    let tu = b.finish();
    let cache = RecordCache::new(&tu);
    let accesses = check_finalizer_body(&cache, &cache.lookup(host), dtor);

    assert_eq!(accesses.len(), 1);
    assert!(accesses[0].eagerly_finalized);
}

#[test]
fn heap_collection_access_is_flagged() {
    let mut b = TuBuilder::new("finalizer.cpp");
    let obj = b.record("HeapObject");
    b.gc_base(obj, "GarbageCollected");
    let host = b.record("Host");
    b.gc_base(host, "GarbageCollectedFinalized");
    let cls = b.class_ty(obj);
    let member = b.wrapper_ty("Member", &[cls]);
    let vec = b.wrapper_ty("HeapVector", &[member]);
    let field = b.field(host, "m_vec", vec);
    let dtor = b.destructor(host);
    // ~Host() { m_vec[0]; }
    let base = b.field_ref(field);
    let zero = b.decl_ref("0");
    let subscript = b.subscript(base, zero);
    let body = b.compound(&[subscript]);
    b.set_body(dtor, body);

    let tu = b.finish();
    let cache = RecordCache::new(&tu);
    let accesses = check_finalizer_body(&cache, &cache.lookup(host), dtor);

    assert_eq!(accesses.len(), 1);
    assert_eq!(accesses[0].field, field);
}

#[test]
fn off_heap_fields_are_safe() {
    let mut b = TuBuilder::new("finalizer.cpp");
    let obj = b.record("RefCountedThing");
    let host = b.record("Host");
    b.gc_base(host, "GarbageCollectedFinalized");
    let cls = b.class_ty(obj);
    let refptr = b.wrapper_ty("RefPtr", &[cls]);
    let field = b.field(host, "m_ref", refptr);
    let dtor = b.destructor(host);
    let receiver = b.field_ref(field);
    let callee = b.unresolved(Some(receiver), "clear");
    let call = b.call(callee, &[]);
    let body = b.compound(&[call]);
    b.set_body(dtor, body);

    let tu = b.finish();
    let cache = RecordCache::new(&tu);

    assert!(check_finalizer_body(&cache, &cache.lookup(host), dtor).is_empty());
}
