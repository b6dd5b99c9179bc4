//! Arena-backed model of one parsed C++ translation unit.
//!
//! All declarations live in flat arenas on [`TranslationUnit`] and refer to
//! each other by 32-bit index handles. The model covers exactly what the
//! verifier queries: class/struct definitions with bases, fields, and
//! methods; enough of the type system to recognize pointer and template
//! wrapper shapes; and a statement/expression tree for the method bodies the
//! body-level checks walk.

use bitflags::bitflags;
use smallvec::SmallVec;

use crate::{Name, Span, StringInterner};

macro_rules! define_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            #[inline]
            pub const fn from_raw(raw: u32) -> Self {
                Self(raw)
            }

            #[inline]
            pub const fn raw(self) -> u32 {
                self.0
            }

            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }
    };
}

define_id!(
    /// Handle to a [`RecordDecl`] in the translation unit.
    RecordId
);
define_id!(
    /// Handle to a [`FieldDecl`].
    FieldId
);
define_id!(
    /// Handle to a [`MethodDecl`].
    MethodId
);
define_id!(
    /// Handle to a [`Type`].
    TypeId
);
define_id!(
    /// Handle to a [`Stmt`] node.
    StmtId
);

bitflags! {
    /// Source-level annotations recognized by the verifier (a closed set).
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct Annotations: u8 {
        /// The `STACK_ALLOCATED()` annotation on a deleted `operator new`.
        const STACK_ALLOCATED = 1 << 0;
        /// Suppresses all verifier checks for the annotated entity.
        const IGNORE = 1 << 1;
        /// Suppresses cycle findings for the annotated field.
        const IGNORE_CYCLE = 1 << 2;
    }
}

/// C++ access specifier.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Access {
    Public,
    Protected,
    Private,
}

/// One type as seen by the verifier.
///
/// Only the shapes the edge factory and the checks distinguish are modeled;
/// everything else is `Builtin` and excluded from the tracing graph.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum TypeKind {
    /// A non-class type (primitive, enum, function type, ...). Untracked.
    Builtin(Name),
    /// `T*`.
    Pointer(TypeId),
    /// `T&`. Treated like a raw pointer by the field checks.
    Reference(TypeId),
    /// A class/struct type, possibly a template specialization (`args`
    /// non-empty). `decl` is the canonical record declaration.
    Class { decl: RecordId, args: Vec<TypeId> },
    /// An unresolved dependent type (a template parameter use).
    Dependent(Name),
}

/// A type arena entry.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Type {
    pub kind: TypeKind,
}

/// One base-clause entry of a record.
#[derive(Clone, Debug)]
pub struct BaseSpecifier {
    pub ty: TypeId,
    pub span: Span,
    pub access: Access,
    pub is_virtual: bool,
    pub annotations: Annotations,
}

/// A class or struct declaration.
#[derive(Clone, Debug)]
pub struct RecordDecl {
    pub name: Name,
    /// Innermost enclosing namespace, if any.
    pub namespace: Option<Name>,
    /// File the declaration was written in (records may come from headers).
    pub file: Name,
    pub span: Span,
    pub bases: Vec<BaseSpecifier>,
    pub fields: Vec<FieldId>,
    pub methods: Vec<MethodId>,
    /// Nested `typedef`/`using` alias names declared directly in the class.
    /// The finalization checks look for the eager-finalization marker here.
    pub type_aliases: Vec<Name>,
    pub annotations: Annotations,
    /// False for forward declarations; such records cannot be verified.
    pub has_definition: bool,
    /// True for a class template's pattern declaration.
    pub is_template: bool,
    /// Specializations of a template pattern, checked in its place.
    pub specializations: Vec<RecordId>,
    /// Template arguments when this record is itself a specialization.
    pub template_args: Vec<TypeId>,
}

/// What kind of member function a [`MethodDecl`] is.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum MethodKind {
    Plain,
    Constructor { is_copy_or_move: bool },
    Destructor,
    /// `operator new`. `placement` distinguishes the two-argument form.
    OperatorNew { placement: bool },
}

/// State of a method body.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Body {
    /// No body in this translation unit (declaration only).
    None,
    /// A template body the host deferred parsing for. The late-parse hook
    /// must be invoked before this body becomes visible.
    Unparsed,
    /// A parsed body rooted at the given statement.
    Parsed(StmtId),
}

/// A member function declaration.
#[derive(Clone, Debug)]
pub struct MethodDecl {
    pub name: Name,
    pub parent: RecordId,
    pub span: Span,
    pub kind: MethodKind,
    /// Parameter types, in order.
    pub params: Vec<TypeId>,
    pub access: Access,
    pub is_virtual: bool,
    pub is_pure: bool,
    pub is_deleted: bool,
    /// True when the user wrote the body (vs. implicitly declared).
    pub is_user_provided: bool,
    pub is_static: bool,
    pub is_template: bool,
    pub annotations: Annotations,
    pub body: Body,
}

/// A non-static data member declaration.
#[derive(Clone, Debug)]
pub struct FieldDecl {
    pub name: Name,
    pub parent: RecordId,
    pub ty: TypeId,
    pub span: Span,
    pub annotations: Annotations,
}

/// Target of a resolved member expression.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum MemberTarget {
    Field(FieldId),
    Method(MethodId),
}

/// Statement/expression tree node kinds.
///
/// Bodies are trees of these nodes; the distinction between statements and
/// expressions is irrelevant to the verifier, which only pattern-matches
/// call and member-access shapes.
#[derive(Clone, Debug)]
pub enum StmtKind {
    /// `{ ... }` or any sequencing construct.
    Compound(Vec<StmtId>),
    /// A resolved member access: `base.member`, `base->member`, or
    /// `Qualifier::member` (qualified call receiver). `base == None`
    /// means an implicit `this->` access.
    Member {
        base: Option<StmtId>,
        qualifier: Option<RecordId>,
        target: MemberTarget,
        is_arrow: bool,
    },
    /// A member access the host could not resolve pre-instantiation
    /// (dependent-scope or overloaded). Matched by name string; `qualifier`
    /// carries the written template/class name for `Q<T>::member` forms.
    UnresolvedMember {
        base: Option<StmtId>,
        qualifier: Option<Name>,
        name: Name,
    },
    /// A call; `callee` is usually a member access node.
    Call { callee: StmtId, args: Vec<StmtId> },
    /// `base[index]`.
    Subscript { base: StmtId, index: StmtId },
    /// `&operand`.
    AddrOf(StmtId),
    /// A reference to a local variable or parameter, by name.
    DeclRef(Name),
    /// A reference to a method, e.g. `&T::clearWeakMembers`.
    MethodRef(MethodId),
    /// `this`.
    This,
}

/// A statement arena entry.
#[derive(Clone, Debug)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    /// Child nodes, for generic recursive walks.
    pub fn children(&self) -> SmallVec<[StmtId; 4]> {
        let mut out = SmallVec::new();
        match &self.kind {
            StmtKind::Compound(stmts) => out.extend(stmts.iter().copied()),
            StmtKind::Member { base, .. } | StmtKind::UnresolvedMember { base, .. } => {
                if let Some(b) = base {
                    out.push(*b);
                }
            }
            StmtKind::Call { callee, args } => {
                out.push(*callee);
                out.extend(args.iter().copied());
            }
            StmtKind::Subscript { base, index } => {
                out.push(*base);
                out.push(*index);
            }
            StmtKind::AddrOf(inner) => out.push(*inner),
            StmtKind::DeclRef(_) | StmtKind::MethodRef(_) | StmtKind::This => {}
        }
        out
    }
}

/// Host hook that force-parses a deferred template method body.
///
/// When the host defers parsing of template bodies, trace-method-shaped
/// bodies are invisible to the verifier until eagerly instantiated. The
/// host installs this hook; the verifier invokes it once per pending
/// method before running body-level checks. The hook is expected to append
/// statements to the unit and set the method's body to [`Body::Parsed`].
pub type LateParseHook = Box<dyn Fn(&mut TranslationUnit, MethodId)>;

/// One fully parsed translation unit, as handed over by the host frontend.
pub struct TranslationUnit {
    pub file_name: String,
    pub interner: StringInterner,
    records: Vec<RecordDecl>,
    fields: Vec<FieldDecl>,
    methods: Vec<MethodDecl>,
    types: Vec<Type>,
    stmts: Vec<Stmt>,
    /// Set when the host already reported a fatal error before the verifier
    /// pass begins; the verifier must then do nothing.
    pub has_fatal_errors: bool,
    late_parse_hook: Option<LateParseHook>,
}

impl TranslationUnit {
    pub fn new(file_name: impl Into<String>) -> Self {
        TranslationUnit {
            file_name: file_name.into(),
            interner: StringInterner::new(),
            records: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            types: Vec::new(),
            stmts: Vec::new(),
            has_fatal_errors: false,
            late_parse_hook: None,
        }
    }

    // === Population (host / fixture side) ===

    pub fn add_record(&mut self, record: RecordDecl) -> RecordId {
        let id = RecordId::from_raw(self.next_index(self.records.len()));
        self.records.push(record);
        id
    }

    pub fn add_field(&mut self, field: FieldDecl) -> FieldId {
        let parent = field.parent;
        let id = FieldId::from_raw(self.next_index(self.fields.len()));
        self.fields.push(field);
        self.records[parent.index()].fields.push(id);
        id
    }

    pub fn add_method(&mut self, method: MethodDecl) -> MethodId {
        let parent = method.parent;
        let id = MethodId::from_raw(self.next_index(self.methods.len()));
        self.methods.push(method);
        self.records[parent.index()].methods.push(id);
        id
    }

    pub fn add_type(&mut self, ty: Type) -> TypeId {
        let id = TypeId::from_raw(self.next_index(self.types.len()));
        self.types.push(ty);
        id
    }

    pub fn add_stmt(&mut self, stmt: Stmt) -> StmtId {
        let id = StmtId::from_raw(self.next_index(self.stmts.len()));
        self.stmts.push(stmt);
        id
    }

    /// Mutable access for fixture building and the late-parse hook.
    pub fn record_mut(&mut self, id: RecordId) -> &mut RecordDecl {
        &mut self.records[id.index()]
    }

    pub fn method_mut(&mut self, id: MethodId) -> &mut MethodDecl {
        &mut self.methods[id.index()]
    }

    /// Install the host's late-template-parsing hook.
    pub fn set_late_parse_hook(&mut self, hook: LateParseHook) {
        self.late_parse_hook = Some(hook);
    }

    /// Force parsing of deferred bodies for the given methods.
    ///
    /// Without an installed hook this is a no-op: unparsed bodies stay
    /// invisible and body-level checks skip them conservatively.
    pub fn force_late_parsed_bodies(&mut self, pending: &[MethodId]) {
        if let Some(hook) = self.late_parse_hook.take() {
            for &mid in pending {
                if matches!(self.methods[mid.index()].body, Body::Unparsed) {
                    hook(self, mid);
                }
            }
            self.late_parse_hook = Some(hook);
        }
    }

    // === Queries (verifier side) ===

    pub fn record(&self, id: RecordId) -> &RecordDecl {
        &self.records[id.index()]
    }

    pub fn field(&self, id: FieldId) -> &FieldDecl {
        &self.fields[id.index()]
    }

    pub fn method(&self, id: MethodId) -> &MethodDecl {
        &self.methods[id.index()]
    }

    pub fn type_kind(&self, id: TypeId) -> &TypeKind {
        &self.types[id.index()].kind
    }

    pub fn stmt(&self, id: StmtId) -> &Stmt {
        &self.stmts[id.index()]
    }

    /// Iterate all records with their handles.
    pub fn records(&self) -> impl Iterator<Item = (RecordId, &RecordDecl)> {
        self.records
            .iter()
            .enumerate()
            .map(|(i, r)| (RecordId::from_raw(u32::try_from(i).unwrap_or(u32::MAX)), r))
    }

    /// Iterate all methods with their handles.
    pub fn methods(&self) -> impl Iterator<Item = (MethodId, &MethodDecl)> {
        self.methods
            .iter()
            .enumerate()
            .map(|(i, m)| (MethodId::from_raw(u32::try_from(i).unwrap_or(u32::MAX)), m))
    }

    /// Resolve an interned name.
    pub fn name_str(&self, name: Name) -> &'static str {
        self.interner.lookup(name)
    }

    /// The record behind a class type, unwrapping nothing.
    pub fn class_decl(&self, ty: TypeId) -> Option<RecordId> {
        match self.type_kind(ty) {
            TypeKind::Class { decl, .. } => Some(*decl),
            _ => None,
        }
    }

    /// The template arguments of a class type (one unwrap level).
    pub fn template_args(&self, ty: TypeId) -> &[TypeId] {
        match self.type_kind(ty) {
            TypeKind::Class { args, .. } => args,
            _ => &[],
        }
    }

    fn next_index(&self, len: usize) -> u32 {
        u32::try_from(len).unwrap_or_else(|_| panic!("translation unit arena overflow: {len}"))
    }
}

impl std::fmt::Debug for TranslationUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslationUnit")
            .field("file_name", &self.file_name)
            .field("records", &self.records.len())
            .field("fields", &self.fields.len())
            .field("methods", &self.methods.len())
            .finish()
    }
}

#[cfg(test)]
mod tests;
