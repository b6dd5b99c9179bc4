use gcv_ir::fixture::TuBuilder;
use pretty_assertions::assert_eq;

use super::*;
use crate::record::RecordCache;

#[test]
fn builtin_and_dependent_types_have_no_edge() {
    let mut b = TuBuilder::new("edges.cpp");
    let int_ty = b.builtin_ty("int");
    let dep_ty = b.dependent_ty("T");
    let tu = b.finish();

    assert_eq!(create_edge(&tu, int_ty), None);
    assert_eq!(create_edge(&tu, dep_ty), None);
}

#[test]
fn raw_pointer_and_reference_wrap_the_pointee() {
    let mut b = TuBuilder::new("edges.cpp");
    let obj = b.record("HeapObject");
    let cls = b.class_ty(obj);
    let ptr = b.ptr_ty(cls);
    let refty = b.ref_ty(cls);
    let int_ptr = {
        let i = b.builtin_ty("int");
        b.ptr_ty(i)
    };
    let tu = b.finish();

    let edge = create_edge(&tu, ptr).unwrap();
    assert!(edge.is_raw_ptr());
    assert_eq!(edge.inner().unwrap().value_decl(), Some(obj));

    assert!(create_edge(&tu, refty).unwrap().is_raw_ptr());
    assert_eq!(create_edge(&tu, int_ptr), None);
}

#[test]
fn wrapper_templates_produce_their_edge_kinds() {
    let mut b = TuBuilder::new("edges.cpp");
    let obj = b.record("HeapObject");
    let cls = b.class_ty(obj);
    let member = b.wrapper_ty("Member", &[cls]);
    let weak = b.wrapper_ty("WeakMember", &[cls]);
    let persistent = b.wrapper_ty("Persistent", &[cls]);
    let refptr = b.wrapper_ty("RefPtr", &[cls]);
    let unique = b.wrapper_ty("unique_ptr", &[cls]);
    let tu = b.finish();

    assert!(create_edge(&tu, member).unwrap().is_member());
    assert!(create_edge(&tu, weak).unwrap().is_weak_member());
    assert!(create_edge(&tu, persistent).unwrap().is_persistent());
    assert!(create_edge(&tu, refptr).unwrap().is_ref_ptr());
    assert!(create_edge(&tu, unique).unwrap().is_unique_ptr());
}

#[test]
fn persistent_outside_heap_namespace_is_plain_value() {
    let mut b = TuBuilder::new("edges.cpp");
    let other = b.record("Persistent");
    let obj = b.record("HeapObject");
    let cls = b.class_ty(obj);
    let ty = b.class_ty_args(other, &[cls]);
    let tu = b.finish();

    let edge = create_edge(&tu, ty).unwrap();
    assert_eq!(edge.value_decl(), Some(other));
}

#[test]
fn wrapper_with_unexpected_arity_yields_no_edge() {
    let mut b = TuBuilder::new("edges.cpp");
    let obj = b.record("HeapObject");
    let cls = b.class_ty(obj);
    let zero = b.wrapper_ty("Member", &[]);
    let two = b.wrapper_ty("Member", &[cls, cls]);
    let tu = b.finish();

    assert_eq!(create_edge(&tu, zero), None);
    assert_eq!(create_edge(&tu, two), None);
}

#[test]
fn nested_wrappers_form_an_ownership_tree() {
    let mut b = TuBuilder::new("edges.cpp");
    let obj = b.record("HeapObject");
    let cls = b.class_ty(obj);
    let refptr = b.wrapper_ty("RefPtr", &[cls]);
    let vec = b.wrapper_ty("Vector", &[refptr]);
    let member = b.wrapper_ty("Member", &[vec]);
    let tu = b.finish();

    let edge = create_edge(&tu, member).unwrap();
    let collection = edge.inner().unwrap().collection().unwrap();
    assert!(!collection.on_heap);
    assert_eq!(collection.members.len(), 1);
    assert!(collection.members[0].is_ref_ptr());
}

#[test]
fn heap_collections_and_heap_allocator_are_on_heap() {
    let mut b = TuBuilder::new("edges.cpp");
    let obj = b.record("HeapObject");
    let cls = b.class_ty(obj);
    let member = b.wrapper_ty("Member", &[cls]);
    let heap_vec = b.wrapper_ty("HeapVector", &[member]);
    let capacity = b.builtin_ty("size_t");
    let allocator = {
        let decl = b.wrapper_decl("HeapAllocator");
        b.class_ty(decl)
    };
    let wtf_vec = b.wrapper_ty("Vector", &[member, capacity, allocator]);
    let persistent_set = b.wrapper_ty("PersistentHeapHashSet", &[member]);
    let tu = b.finish();

    let heap = create_edge(&tu, heap_vec).unwrap();
    assert!(heap.collection().unwrap().on_heap);
    assert!(!heap.collection().unwrap().is_root);

    let wtf = create_edge(&tu, wtf_vec).unwrap();
    assert!(wtf.collection().unwrap().on_heap);

    let root = create_edge(&tu, persistent_set).unwrap();
    let c = root.collection().unwrap();
    assert!(c.on_heap);
    assert!(c.is_root);
    assert_eq!(root.liveness_kind(), LivenessKind::Root);
}

#[test]
fn map_collections_carry_two_member_edges() {
    let mut b = TuBuilder::new("edges.cpp");
    let obj = b.record("HeapObject");
    let cls = b.class_ty(obj);
    let key = b.wrapper_ty("Member", &[cls]);
    let value = b.wrapper_ty("WeakMember", &[cls]);
    let map = b.wrapper_ty("HeapHashMap", &[key, value]);
    let tu = b.finish();

    let edge = create_edge(&tu, map).unwrap();
    let c = edge.collection().unwrap();
    assert_eq!(c.members.len(), 2);
    assert!(c.members[0].is_member());
    assert!(c.members[1].is_weak_member());
}

#[test]
fn collection_skips_unmodeled_element_types() {
    let mut b = TuBuilder::new("edges.cpp");
    let int_ty = b.builtin_ty("int");
    let vec = b.wrapper_ty("Vector", &[int_ty]);
    let tu = b.finish();

    let edge = create_edge(&tu, vec).unwrap();
    assert!(edge.collection().unwrap().members.is_empty());
}

#[test]
fn tracing_status_per_edge_kind() {
    let mut b = TuBuilder::new("edges.cpp");
    let obj = b.record("HeapObject");
    b.gc_base(obj, "GarbageCollected");
    let cls = b.class_ty(obj);
    let member = b.wrapper_ty("Member", &[cls]);
    let weak = b.wrapper_ty("WeakMember", &[cls]);
    let persistent = b.wrapper_ty("Persistent", &[cls]);
    let raw = b.ptr_ty(cls);
    let member_vec = {
        let m = b.wrapper_ty("Member", &[cls]);
        b.wrapper_ty("Vector", &[m])
    };
    let root_vec = b.wrapper_ty("PersistentHeapVector", &[member]);
    let tu = b.finish();
    let cache = RecordCache::new(&tu);

    let status = |ty| {
        create_edge(&tu, ty)
            .unwrap()
            .needs_tracing(&cache, TracingContext::Recursive)
    };
    assert_eq!(status(member), TracingStatus::Needed);
    assert_eq!(status(weak), TracingStatus::Needed);
    assert_eq!(status(persistent), TracingStatus::Unneeded);
    assert_eq!(status(raw), TracingStatus::Unneeded);
    assert_eq!(status(member_vec), TracingStatus::Needed);
    assert_eq!(status(root_vec), TracingStatus::Unneeded);
}

#[test]
fn finalization_per_edge_kind() {
    let mut b = TuBuilder::new("edges.cpp");
    let obj = b.record("HeapObject");
    b.gc_base(obj, "GarbageCollected");
    let cls = b.class_ty(obj);
    let member = b.wrapper_ty("Member", &[cls]);
    let refptr = b.wrapper_ty("RefPtr", &[cls]);
    let unique = b.wrapper_ty("unique_ptr", &[cls]);
    let raw = b.ptr_ty(cls);
    let off_heap_vec = b.wrapper_ty("Vector", &[member]);
    let heap_vec = b.wrapper_ty("HeapVector", &[member]);
    let tu = b.finish();
    let cache = RecordCache::new(&tu);

    let needs = |ty| create_edge(&tu, ty).unwrap().needs_finalization(&cache);
    assert!(!needs(member));
    assert!(needs(refptr));
    assert!(needs(unique));
    assert!(!needs(raw));
    assert!(needs(off_heap_vec));
    assert!(!needs(heap_vec));
}

#[test]
fn liveness_kinds() {
    let mut b = TuBuilder::new("edges.cpp");
    let obj = b.record("HeapObject");
    let cls = b.class_ty(obj);
    let member = b.wrapper_ty("Member", &[cls]);
    let weak = b.wrapper_ty("WeakMember", &[cls]);
    let persistent = b.wrapper_ty("Persistent", &[cls]);
    let tu = b.finish();

    let kind = |ty| create_edge(&tu, ty).unwrap().liveness_kind();
    assert_eq!(kind(member), LivenessKind::Strong);
    assert_eq!(kind(weak), LivenessKind::Weak);
    assert_eq!(kind(persistent), LivenessKind::Root);
}
