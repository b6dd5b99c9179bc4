//! The closed set of wrapper, collection, and marker names the verifier
//! recognizes.
//!
//! All recognition is by unqualified name string, matching how the host
//! frontend surfaces template names. The one namespace-sensitive case is
//! `Persistent`, which must live in the managed-heap namespace to guard
//! against unrelated same-named types.

/// The managed-heap namespace.
pub const HEAP_NAMESPACE: &str = "blink";

// === GC base markers ===

pub const GARBAGE_COLLECTED: &str = "GarbageCollected";
pub const GARBAGE_COLLECTED_FINALIZED: &str = "GarbageCollectedFinalized";
pub const GARBAGE_COLLECTED_MIXIN: &str = "GarbageCollectedMixin";
pub const REF_COUNTED_GARBAGE_COLLECTED: &str = "RefCountedGarbageCollected";
pub const THREAD_SAFE_REF_COUNTED_GARBAGE_COLLECTED: &str =
    "ThreadSafeRefCountedGarbageCollected";

/// True for any recognized collectable-base marker.
pub fn is_gc_base(name: &str) -> bool {
    is_gc_finalized_base(name) || name == GARBAGE_COLLECTED || name == GARBAGE_COLLECTED_MIXIN
}

/// True for the finalized-base marker variants.
pub fn is_gc_finalized_base(name: &str) -> bool {
    matches!(
        name,
        GARBAGE_COLLECTED_FINALIZED
            | REF_COUNTED_GARBAGE_COLLECTED
            | THREAD_SAFE_REF_COUNTED_GARBAGE_COLLECTED
    )
}

/// True for the mixin-base marker.
pub fn is_gc_mixin_base(name: &str) -> bool {
    name == GARBAGE_COLLECTED_MIXIN
}

/// Base classes guaranteed not to trigger a GC during their own
/// construction; the polymorphic vtable-safety walk stops at them.
pub fn is_safe_polymorphic_base(name: &str) -> bool {
    is_gc_base(name)
}

/// Legacy base classes whose non-trivial destructor is known safe to
/// discount when deriving finalization requirements.
pub fn is_ignorable_destructor_base(name: &str) -> bool {
    matches!(
        name,
        REF_COUNTED_GARBAGE_COLLECTED | THREAD_SAFE_REF_COUNTED_GARBAGE_COLLECTED
    )
}

// === Pointer wrappers ===

pub const RAW_PTR: &str = "RawPtr";
pub const REF_PTR: &str = "RefPtr";
pub const OWN_PTR: &str = "OwnPtr";
pub const UNIQUE_PTR: &str = "unique_ptr";
pub const MEMBER: &str = "Member";
pub const WEAK_MEMBER: &str = "WeakMember";
pub const PERSISTENT: &str = "Persistent";

/// True for the exclusive-ownership smart-pointer templates.
pub fn is_owning_ptr(name: &str) -> bool {
    name == OWN_PTR || name == UNIQUE_PTR
}

// === Collections ===

const OFF_HEAP_COLLECTIONS: &[&str] = &[
    "Vector",
    "Deque",
    "HashSet",
    "ListHashSet",
    "LinkedHashSet",
    "HashCountedSet",
    "HashMap",
];

const HEAP_COLLECTIONS: &[&str] = &[
    "HeapVector",
    "HeapDeque",
    "HeapHashSet",
    "HeapListHashSet",
    "HeapLinkedHashSet",
    "HeapHashCountedSet",
    "HeapHashMap",
];

const PERSISTENT_HEAP_COLLECTIONS: &[&str] = &[
    "PersistentHeapVector",
    "PersistentHeapDeque",
    "PersistentHeapHashSet",
    "PersistentHeapListHashSet",
    "PersistentHeapLinkedHashSet",
    "PersistentHeapHashCountedSet",
    "PersistentHeapHashMap",
];

pub const HEAP_ALLOCATOR: &str = "HeapAllocator";

pub fn is_off_heap_collection(name: &str) -> bool {
    OFF_HEAP_COLLECTIONS.contains(&name)
}

pub fn is_heap_collection(name: &str) -> bool {
    HEAP_COLLECTIONS.contains(&name)
}

pub fn is_persistent_heap_collection(name: &str) -> bool {
    PERSISTENT_HEAP_COLLECTIONS.contains(&name)
}

/// True for any recognized collection template, on- or off-heap.
pub fn is_collection(name: &str) -> bool {
    is_off_heap_collection(name) || is_heap_collection(name) || is_persistent_heap_collection(name)
}

/// Map-like collections carry two member edges (key and value).
pub fn collection_dimension(name: &str) -> usize {
    if name.ends_with("HashMap") {
        2
    } else {
        1
    }
}

// === Trace-method family ===

pub const TRACE: &str = "trace";
pub const TRACE_IMPL: &str = "traceImpl";
pub const TRACE_AFTER_DISPATCH: &str = "traceAfterDispatch";
pub const TRACE_AFTER_DISPATCH_IMPL: &str = "traceAfterDispatchImpl";
pub const REGISTER_WEAK_MEMBERS: &str = "registerWeakMembers";
pub const FINALIZE_DISPATCH: &str = "finalizeGarbageCollectedObject";
pub const TRACE_IF_NEEDED: &str = "TraceIfNeeded";

/// The two methods a mixin declares to participate in marking.
pub fn is_mixin_marker_method(name: &str) -> bool {
    matches!(name, "adjustAndMark" | "isHeapObjectAlive")
}

pub fn is_trace_family(name: &str) -> bool {
    matches!(
        name,
        TRACE | TRACE_IMPL | TRACE_AFTER_DISPATCH | TRACE_AFTER_DISPATCH_IMPL
    )
}

/// The visitor parameter shapes a trace method accepts.
pub const VISITOR: &str = "Visitor";
pub const VISITOR_DISPATCHER: &str = "VisitorDispatcher";

// === Conventions ===

/// Factory-method naming convention; a class with only non-public
/// constructors but a `create` factory is still instantiable.
pub const CREATE: &str = "create";

/// Nested type-alias marker for eager finalization.
pub const EAGERLY_FINALIZED_MARKER: &str = "IsEagerlyFinalizedMarker";
