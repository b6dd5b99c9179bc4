use std::rc::Rc;

use gcv_ir::fixture::TuBuilder;
use gcv_ir::{Access, Annotations};
use pretty_assertions::assert_eq;

use super::*;

#[test]
fn cache_returns_the_same_info_per_record() {
    let mut b = TuBuilder::new("records.cpp");
    let obj = b.record("HeapObject");
    let tu = b.finish();
    let cache = RecordCache::new(&tu);

    let a = cache.lookup(obj);
    let b = cache.lookup(obj);
    assert!(Rc::ptr_eq(&a, &b));
}

#[test]
fn gc_base_kinds_walk_the_hierarchy() {
    let mut b = TuBuilder::new("records.cpp");
    let base = b.record("Base");
    b.gc_base(base, "GarbageCollectedFinalized");
    let mixin = b.record("Mixin");
    b.gc_base(mixin, "GarbageCollectedMixin");
    let derived = b.record("Derived");
    let base_ty = b.class_ty(base);
    let mixin_ty = b.class_ty(mixin);
    b.base(derived, base_ty);
    b.base(derived, mixin_ty);
    let plain = b.record("Plain");
    let tu = b.finish();
    let cache = RecordCache::new(&tu);

    let kinds = cache.lookup(derived).gc_base_kinds(&cache);
    assert_eq!(
        kinds,
        GcBaseKinds::COLLECTED | GcBaseKinds::FINALIZED | GcBaseKinds::MIXIN
    );
    assert!(cache.lookup(derived).is_gc_derived(&cache));
    assert!(cache.lookup(derived).is_gc_finalized(&cache));
    assert!(!cache.lookup(derived).is_gc_mixin(&cache));

    assert!(cache.lookup(mixin).is_gc_mixin(&cache));
    // A mixin pointer always refers into some collected object.
    assert!(cache.lookup(mixin).is_gc_allocated(&cache));

    assert!(!cache.lookup(plain).is_gc_derived(&cache));
}

#[test]
fn stack_allocation_is_inherited() {
    let mut b = TuBuilder::new("records.cpp");
    let base = b.record("StackBase");
    b.deleted_operator_new(base, true);
    let derived = b.record("Derived");
    let base_ty = b.class_ty(base);
    b.base(derived, base_ty);
    let plain = b.record("Plain");
    b.deleted_operator_new(plain, false);
    let tu = b.finish();
    let cache = RecordCache::new(&tu);

    assert!(cache.lookup(base).is_stack_allocated(&cache));
    assert!(cache.lookup(derived).is_stack_allocated(&cache));
    // A deleted operator new without the annotation is non-newable only.
    assert!(!cache.lookup(plain).is_stack_allocated(&cache));
    assert!(cache.lookup(plain).is_non_newable(&cache));
}

#[test]
fn non_newable_requires_every_overload_deleted() {
    let mut b = TuBuilder::new("records.cpp");
    let closed = b.record("Closed");
    b.deleted_operator_new(closed, false);
    let reopened = b.record("Reopened");
    b.deleted_operator_new(reopened, false);
    b.operator_new(reopened, false);
    let untouched = b.record("Untouched");
    let tu = b.finish();
    let cache = RecordCache::new(&tu);

    assert!(cache.lookup(closed).is_non_newable(&cache));
    assert!(!cache.lookup(reopened).is_non_newable(&cache));
    assert!(!cache.lookup(untouched).is_non_newable(&cache));
}

#[test]
fn placement_new_classification() {
    let mut b = TuBuilder::new("records.cpp");
    let only_placement = b.record("OnlyPlacement");
    b.operator_new(only_placement, true);
    let both = b.record("Both");
    b.operator_new(both, true);
    b.operator_new(both, false);
    let tu = b.finish();
    let cache = RecordCache::new(&tu);

    assert!(cache.lookup(only_placement).is_only_placement_newable(&cache));
    assert!(!cache.lookup(both).is_only_placement_newable(&cache));
}

#[test]
fn considered_abstract() {
    let mut b = TuBuilder::new("records.cpp");

    let pure = b.record("Pure");
    let m = b.method(pure, "frob");
    b.make_pure(m);

    let hidden = b.record("Hidden");
    let ctor = b.constructor(hidden, false);
    b.set_access(ctor, Access::Private);

    let factory = b.record("Factory");
    let ctor = b.constructor(factory, false);
    b.set_access(ctor, Access::Private);
    let create = b.method(factory, "create");
    b.make_static(create);

    let open = b.record("Open");
    b.constructor(open, false);

    let implicit = b.record("Implicit");

    let tu = b.finish();
    let cache = RecordCache::new(&tu);

    assert!(cache.lookup(pure).is_considered_abstract(&cache));
    assert!(cache.lookup(hidden).is_considered_abstract(&cache));
    assert!(!cache.lookup(factory).is_considered_abstract(&cache));
    assert!(!cache.lookup(open).is_considered_abstract(&cache));
    assert!(!cache.lookup(implicit).is_considered_abstract(&cache));
}

#[test]
fn eagerly_finalized_marker_alias() {
    let mut b = TuBuilder::new("records.cpp");
    let eager = b.record("Eager");
    b.type_alias(eager, "IsEagerlyFinalizedMarker");
    let lazy = b.record("Lazy");
    b.type_alias(lazy, "ValueType");
    let tu = b.finish();
    let cache = RecordCache::new(&tu);

    assert!(cache.lookup(eager).is_eagerly_finalized(&cache));
    assert!(!cache.lookup(lazy).is_eagerly_finalized(&cache));
}

#[test]
fn fields_skip_ignored_and_unmodeled_types() {
    let mut b = TuBuilder::new("records.cpp");
    let obj = b.record("HeapObject");
    b.gc_base(obj, "GarbageCollected");
    let holder = b.record("Holder");
    let cls = b.class_ty(obj);
    let member = b.wrapper_ty("Member", &[cls]);
    b.field(holder, "m_obj", member);
    let int_ty = b.builtin_ty("int");
    b.field(holder, "m_count", int_ty);
    let member2 = b.wrapper_ty("Member", &[cls]);
    b.field_annotated(holder, "m_ignored", member2, Annotations::IGNORE);
    let tu = b.finish();
    let cache = RecordCache::new(&tu);

    let info = cache.lookup(holder);
    assert_eq!(info.fields(&cache).len(), 1);
    assert_eq!(info.fields_need_tracing(&cache), TracingStatus::Needed);
}

#[test]
fn needs_tracing_by_allocation_class() {
    let mut b = TuBuilder::new("records.cpp");
    let gc = b.record("OnHeap");
    b.gc_base(gc, "GarbageCollected");
    let stack = b.record("OnStack");
    b.deleted_operator_new(stack, true);
    let fwd = b.forward_decl("Elsewhere");
    let plain = b.record("Plain");
    let tu = b.finish();
    let cache = RecordCache::new(&tu);

    let status = |id| {
        cache
            .lookup(id)
            .needs_tracing(&cache, TracingContext::Recursive)
    };
    assert_eq!(status(gc), TracingStatus::Needed);
    assert_eq!(status(stack), TracingStatus::Unneeded);
    assert_eq!(status(fwd), TracingStatus::Unknown);
    assert_eq!(status(plain), TracingStatus::Unneeded);
}

#[test]
fn part_objects_propagate_tracing_through_value_fields() {
    let mut b = TuBuilder::new("records.cpp");
    let obj = b.record("HeapObject");
    b.gc_base(obj, "GarbageCollected");
    let part = b.record("Part");
    let cls = b.class_ty(obj);
    let member = b.wrapper_ty("Member", &[cls]);
    b.field(part, "m_obj", member);
    let holder = b.record("Holder");
    let part_ty = b.class_ty(part);
    b.field(holder, "m_part", part_ty);
    let tu = b.finish();
    let cache = RecordCache::new(&tu);

    // Recursive: the embedded part object carries a traced reference.
    assert_eq!(
        cache
            .lookup(holder)
            .needs_tracing(&cache, TracingContext::Recursive),
        TracingStatus::Needed
    );
    // Non-recursive stops at the record itself.
    assert_eq!(
        cache
            .lookup(holder)
            .needs_tracing(&cache, TracingContext::NonRecursive),
        TracingStatus::Unneeded
    );
}

#[test]
fn cyclic_part_objects_answer_unknown_provisionally() {
    let mut b = TuBuilder::new("records.cpp");
    let a = b.record("A");
    let c = b.record("C");
    let c_ty = b.class_ty(c);
    b.field(a, "m_c", c_ty);
    let a_ty = b.class_ty(a);
    b.field(c, "m_a", a_ty);
    let tu = b.finish();
    let cache = RecordCache::new(&tu);

    // Neither side holds a traced reference, so the fixpoint must not
    // escalate the provisional Unknown into Needed.
    let status = cache
        .lookup(a)
        .needs_tracing(&cache, TracingContext::Recursive);
    assert_eq!(status, TracingStatus::Unknown);
    assert!(!status.is_needed());
}

#[test]
fn requires_trace_method_counts_traceable_bases() {
    let mut b = TuBuilder::new("records.cpp");
    let left = b.record("Left");
    b.gc_base(left, "GarbageCollected");
    let right = b.record("RightMixin");
    b.gc_base(right, "GarbageCollectedMixin");
    let derived = b.record("Derived");
    let left_ty = b.class_ty(left);
    let right_ty = b.class_ty(right);
    b.base(derived, left_ty);
    b.base(derived, right_ty);
    let tu = b.finish();
    let cache = RecordCache::new(&tu);

    assert!(cache.lookup(derived).requires_trace_method(&cache));
}

#[test]
fn trace_method_classification() {
    let mut b = TuBuilder::new("records.cpp");
    let plain = b.record("Plain");
    b.trace_method(plain);
    // Same name, wrong signature.
    let decoy = b.record("Decoy");
    b.method(decoy, "trace");

    let dispatching = b.record("Dispatching");
    let outer = b.trace_method(dispatching);
    let after = b.trace_method_named(dispatching, "traceAfterDispatch");
    b.method(dispatching, "finalizeGarbageCollectedObject");

    let tu = b.finish();
    let cache = RecordCache::new(&tu);

    assert!(cache.lookup(plain).tracing_methods(&cache).trace.is_some());
    assert!(cache.lookup(plain).tracing_methods(&cache).dispatch.is_none());
    assert!(cache.lookup(decoy).tracing_methods(&cache).trace.is_none());

    let methods = *cache.lookup(dispatching).tracing_methods(&cache);
    assert_eq!(methods.trace, Some(after));
    assert_eq!(methods.dispatch, Some(outer));
    assert!(methods.finalize_dispatch.is_some());
}

#[test]
fn mixin_marker_methods_are_classified() {
    let mut b = TuBuilder::new("records.cpp");
    let using = b.record("UsingMixin");
    b.method(using, "adjustAndMark");
    b.method(using, "isHeapObjectAlive");
    let plain = b.record("Plain");
    b.method(plain, "adjust");
    let tu = b.finish();
    let cache = RecordCache::new(&tu);

    assert!(cache.lookup(using).declares_gc_mixin_methods(&cache));
    assert!(!cache.lookup(plain).declares_gc_mixin_methods(&cache));
}

#[test]
fn dispatch_is_inherited_from_the_base() {
    let mut b = TuBuilder::new("records.cpp");
    let base = b.record("Base");
    let outer = b.trace_method(base);
    b.trace_method_named(base, "traceAfterDispatch");
    let derived = b.record("Derived");
    let base_ty = b.class_ty(base);
    b.base(derived, base_ty);
    b.trace_method_named(derived, "traceAfterDispatch");
    let tu = b.finish();
    let cache = RecordCache::new(&tu);

    assert_eq!(cache.lookup(derived).trace_dispatch(&cache), Some(outer));
}

#[test]
fn inherits_trace_searches_bases() {
    let mut b = TuBuilder::new("records.cpp");
    let base = b.record("Base");
    let trace = b.trace_method(base);
    let derived = b.record("Derived");
    let base_ty = b.class_ty(base);
    b.base(derived, base_ty);
    let orphan = b.record("Orphan");
    let tu = b.finish();
    let cache = RecordCache::new(&tu);

    assert_eq!(cache.lookup(derived).inherits_trace(&cache), Some(trace));
    assert_eq!(cache.lookup(orphan).inherits_trace(&cache), None);
}

#[test]
fn finalization_from_destructor_fields_and_bases() {
    let mut b = TuBuilder::new("records.cpp");
    let obj = b.record("HeapObject");
    b.gc_base(obj, "GarbageCollected");
    let cls = b.class_ty(obj);

    let with_dtor = b.record("WithDtor");
    b.gc_base(with_dtor, "GarbageCollectedFinalized");
    b.destructor(with_dtor);

    let with_refptr = b.record("WithRefPtr");
    let refptr = b.wrapper_ty("RefPtr", &[cls]);
    b.field(with_refptr, "m_ref", refptr);

    let derived = b.record("Derived");
    let base_ty = b.class_ty(with_refptr);
    b.base(derived, base_ty);

    let trivial = b.record("Trivial");
    let member = b.wrapper_ty("Member", &[cls]);
    b.field(trivial, "m_obj", member);

    let legacy = b.record("Legacy");
    b.gc_base(legacy, "RefCountedGarbageCollected");

    let tu = b.finish();
    let cache = RecordCache::new(&tu);

    assert!(cache.lookup(with_dtor).needs_finalization(&cache));
    assert!(cache.lookup(with_refptr).needs_finalization(&cache));
    assert!(cache.lookup(derived).needs_finalization(&cache));
    assert!(!cache.lookup(trivial).needs_finalization(&cache));
    // The legacy ref-counted base's own teardown does not count.
    assert!(!cache.lookup(legacy).needs_finalization(&cache));
}

#[test]
fn finalization_is_idempotent_across_queries() {
    let mut b = TuBuilder::new("records.cpp");
    let a = b.record("A");
    let c = b.record("C");
    let c_ty = b.class_ty(c);
    b.field(a, "m_c", c_ty);
    let a_ty = b.class_ty(a);
    b.field(c, "m_a", a_ty);
    b.destructor(c);
    let tu = b.finish();
    let cache = RecordCache::new(&tu);

    let first = cache.lookup(a).needs_finalization(&cache);
    let second = cache.lookup(a).needs_finalization(&cache);
    assert_eq!(first, second);
    assert!(first);
}

#[test]
fn polymorphism_is_inherited() {
    let mut b = TuBuilder::new("records.cpp");
    let base = b.record("Base");
    let m = b.method(base, "frob");
    b.make_virtual(m);
    let derived = b.record("Derived");
    let base_ty = b.class_ty(base);
    b.base(derived, base_ty);
    let plain = b.record("Plain");
    b.method(plain, "frob");
    let tu = b.finish();
    let cache = RecordCache::new(&tu);

    assert!(cache.lookup(base).is_polymorphic(&cache));
    assert!(cache.lookup(derived).is_polymorphic(&cache));
    assert!(!cache.lookup(plain).is_polymorphic(&cache));
}
