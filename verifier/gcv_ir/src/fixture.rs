//! Translation-unit fixture builder.
//!
//! Builds [`TranslationUnit`]s the way the host frontend would populate
//! them. Used by unit and scenario tests across the verifier crates, and
//! useful for embedders writing conformance fixtures.
//!
//! Wrapper templates (`Member`, `Persistent`, `HeapVector`, ...) are
//! auto-declared on first use in the `blink` namespace, so a fixture only
//! spells out the classes under test.

use rustc_hash::FxHashMap;

use crate::{
    Access, Annotations, BaseSpecifier, Body, FieldDecl, FieldId, MemberTarget, MethodDecl,
    MethodId, MethodKind, RecordDecl, RecordId, Span, Stmt, StmtId, StmtKind, TranslationUnit,
    Type, TypeId, TypeKind,
};

/// Builder over a [`TranslationUnit`].
pub struct TuBuilder {
    tu: TranslationUnit,
    wrappers: FxHashMap<String, RecordId>,
    next_offset: u32,
}

impl TuBuilder {
    pub fn new(file_name: &str) -> Self {
        TuBuilder {
            tu: TranslationUnit::new(file_name),
            wrappers: FxHashMap::default(),
            next_offset: 0,
        }
    }

    /// Fresh span; each declaration gets a distinct location so diagnostics
    /// sort deterministically.
    pub fn span(&mut self) -> Span {
        let start = self.next_offset;
        self.next_offset += 16;
        Span::new(start, start + 8)
    }

    // === Records ===

    /// Declare a complete record (class/struct with a definition).
    pub fn record(&mut self, name: &str) -> RecordId {
        self.record_full(name, None, true)
    }

    /// Declare a complete record inside a namespace.
    pub fn record_in(&mut self, namespace: &str, name: &str) -> RecordId {
        self.record_full(name, Some(namespace), true)
    }

    /// Declare a forward declaration (no definition).
    pub fn forward_decl(&mut self, name: &str) -> RecordId {
        self.record_full(name, None, false)
    }

    fn record_full(&mut self, name: &str, namespace: Option<&str>, defined: bool) -> RecordId {
        let span = self.span();
        let name = self.tu.interner.intern(name);
        let namespace = namespace.map(|ns| self.tu.interner.intern(ns));
        let file = self.tu.interner.intern(&self.tu.file_name.clone());
        self.tu.add_record(RecordDecl {
            name,
            namespace,
            file,
            span,
            bases: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            type_aliases: Vec::new(),
            annotations: Annotations::empty(),
            has_definition: defined,
            is_template: false,
            specializations: Vec::new(),
            template_args: Vec::new(),
        })
    }

    /// Mark a record as a template pattern.
    pub fn make_template(&mut self, record: RecordId) {
        self.tu.record_mut(record).is_template = true;
    }

    /// Declare a specialization of a template pattern.
    pub fn specialization(&mut self, pattern: RecordId, args: &[TypeId]) -> RecordId {
        let name = self.tu.record(pattern).name;
        let name_str = self.tu.name_str(name);
        let id = self.record_full(name_str, None, true);
        self.tu.record_mut(id).template_args = args.to_vec();
        self.tu.record_mut(pattern).specializations.push(id);
        id
    }

    pub fn annotate_record(&mut self, record: RecordId, annotations: Annotations) {
        self.tu.record_mut(record).annotations |= annotations;
    }

    /// Declare a nested type alias on a record.
    pub fn type_alias(&mut self, record: RecordId, name: &str) {
        let name = self.tu.interner.intern(name);
        self.tu.record_mut(record).type_aliases.push(name);
    }

    /// Set the declaring file of a record (for ignored-directory tests).
    pub fn set_record_file(&mut self, record: RecordId, file: &str) {
        let file = self.tu.interner.intern(file);
        self.tu.record_mut(record).file = file;
    }

    // === Types ===

    pub fn builtin_ty(&mut self, name: &str) -> TypeId {
        let name = self.tu.interner.intern(name);
        self.tu.add_type(Type {
            kind: TypeKind::Builtin(name),
        })
    }

    pub fn class_ty(&mut self, decl: RecordId) -> TypeId {
        self.tu.add_type(Type {
            kind: TypeKind::Class {
                decl,
                args: Vec::new(),
            },
        })
    }

    pub fn class_ty_args(&mut self, decl: RecordId, args: &[TypeId]) -> TypeId {
        self.tu.add_type(Type {
            kind: TypeKind::Class {
                decl,
                args: args.to_vec(),
            },
        })
    }

    pub fn ptr_ty(&mut self, pointee: TypeId) -> TypeId {
        self.tu.add_type(Type {
            kind: TypeKind::Pointer(pointee),
        })
    }

    pub fn ref_ty(&mut self, pointee: TypeId) -> TypeId {
        self.tu.add_type(Type {
            kind: TypeKind::Reference(pointee),
        })
    }

    pub fn dependent_ty(&mut self, name: &str) -> TypeId {
        let name = self.tu.interner.intern(name);
        self.tu.add_type(Type {
            kind: TypeKind::Dependent(name),
        })
    }

    /// A specialization type of a well-known wrapper template, auto-declared
    /// in the `blink` namespace on first use.
    pub fn wrapper_ty(&mut self, template: &str, args: &[TypeId]) -> TypeId {
        let decl = self.wrapper_decl(template);
        self.class_ty_args(decl, args)
    }

    /// The auto-declared record behind a wrapper template name.
    pub fn wrapper_decl(&mut self, template: &str) -> RecordId {
        if let Some(&id) = self.wrappers.get(template) {
            return id;
        }
        let id = self.record_full(template, Some("blink"), true);
        self.wrappers.insert(template.to_owned(), id);
        id
    }

    // === Bases and fields ===

    pub fn base(&mut self, record: RecordId, ty: TypeId) {
        let span = self.span();
        self.tu.record_mut(record).bases.push(BaseSpecifier {
            ty,
            span,
            access: Access::Public,
            is_virtual: false,
            annotations: Annotations::empty(),
        });
    }

    /// Derive `record : public Marker<record>` for a GC base marker.
    pub fn gc_base(&mut self, record: RecordId, marker: &str) {
        let self_ty = self.class_ty(record);
        let base_ty = self.wrapper_ty(marker, &[self_ty]);
        self.base(record, base_ty);
    }

    pub fn field(&mut self, record: RecordId, name: &str, ty: TypeId) -> FieldId {
        self.field_annotated(record, name, ty, Annotations::empty())
    }

    pub fn field_annotated(
        &mut self,
        record: RecordId,
        name: &str,
        ty: TypeId,
        annotations: Annotations,
    ) -> FieldId {
        let span = self.span();
        let name = self.tu.interner.intern(name);
        self.tu.add_field(FieldDecl {
            name,
            parent: record,
            ty,
            span,
            annotations,
        })
    }

    // === Methods ===

    fn add_method(&mut self, record: RecordId, name: &str, kind: MethodKind) -> MethodId {
        let span = self.span();
        let name = self.tu.interner.intern(name);
        self.tu.add_method(MethodDecl {
            name,
            parent: record,
            span,
            kind,
            params: Vec::new(),
            access: Access::Public,
            is_virtual: false,
            is_pure: false,
            is_deleted: false,
            is_user_provided: true,
            is_static: false,
            is_template: false,
            annotations: Annotations::empty(),
            body: Body::None,
        })
    }

    /// A plain public method with no parameters.
    pub fn method(&mut self, record: RecordId, name: &str) -> MethodId {
        self.add_method(record, name, MethodKind::Plain)
    }

    /// The `Visitor*` parameter type used by trace methods.
    pub fn visitor_ptr_ty(&mut self) -> TypeId {
        let visitor = self.wrapper_decl("Visitor");
        let cls = self.class_ty(visitor);
        self.ptr_ty(cls)
    }

    /// A `void name(Visitor*)` method.
    pub fn trace_method_named(&mut self, record: RecordId, name: &str) -> MethodId {
        let param = self.visitor_ptr_ty();
        let mid = self.add_method(record, name, MethodKind::Plain);
        self.tu.method_mut(mid).params.push(param);
        mid
    }

    /// A `void trace(Visitor*)` method.
    pub fn trace_method(&mut self, record: RecordId) -> MethodId {
        self.trace_method_named(record, "trace")
    }

    /// A user-provided destructor.
    pub fn destructor(&mut self, record: RecordId) -> MethodId {
        self.add_method(record, "~", MethodKind::Destructor)
    }

    /// A constructor; copy/move constructors do not make a class concrete.
    pub fn constructor(&mut self, record: RecordId, is_copy_or_move: bool) -> MethodId {
        self.add_method(record, "", MethodKind::Constructor { is_copy_or_move })
    }

    /// A deleted single-argument `operator new`, optionally carrying the
    /// stack-allocated annotation.
    pub fn deleted_operator_new(&mut self, record: RecordId, stack_annotated: bool) -> MethodId {
        let size_t = self.builtin_ty("size_t");
        let mid = self.add_method(record, "operator new", MethodKind::OperatorNew {
            placement: false,
        });
        let m = self.tu.method_mut(mid);
        m.is_deleted = true;
        m.is_static = true;
        m.params.push(size_t);
        if stack_annotated {
            m.annotations |= Annotations::STACK_ALLOCATED;
        }
        mid
    }

    /// A non-deleted `operator new` (single-argument unless `placement`).
    pub fn operator_new(&mut self, record: RecordId, placement: bool) -> MethodId {
        let size_t = self.builtin_ty("size_t");
        let void_ptr = {
            let v = self.builtin_ty("void");
            self.ptr_ty(v)
        };
        let mid = self.add_method(record, "operator new", MethodKind::OperatorNew { placement });
        let m = self.tu.method_mut(mid);
        m.is_static = true;
        m.params.push(size_t);
        if placement {
            m.params.push(void_ptr);
        }
        mid
    }

    pub fn make_virtual(&mut self, method: MethodId) {
        self.tu.method_mut(method).is_virtual = true;
    }

    pub fn make_pure(&mut self, method: MethodId) {
        let m = self.tu.method_mut(method);
        m.is_virtual = true;
        m.is_pure = true;
    }

    pub fn make_static(&mut self, method: MethodId) {
        self.tu.method_mut(method).is_static = true;
    }

    pub fn make_template_method(&mut self, method: MethodId) {
        self.tu.method_mut(method).is_template = true;
    }

    pub fn set_access(&mut self, method: MethodId, access: Access) {
        self.tu.method_mut(method).access = access;
    }

    pub fn set_body(&mut self, method: MethodId, body: StmtId) {
        self.tu.method_mut(method).body = Body::Parsed(body);
    }

    pub fn mark_body_unparsed(&mut self, method: MethodId) {
        self.tu.method_mut(method).body = Body::Unparsed;
    }

    /// An empty `{}` body.
    pub fn empty_body(&mut self, method: MethodId) {
        let body = self.compound(&[]);
        self.set_body(method, body);
    }

    // === Statements ===

    fn add_stmt(&mut self, kind: StmtKind) -> StmtId {
        let span = self.span();
        self.tu.add_stmt(Stmt { kind, span })
    }

    pub fn compound(&mut self, stmts: &[StmtId]) -> StmtId {
        self.add_stmt(StmtKind::Compound(stmts.to_vec()))
    }

    pub fn this(&mut self) -> StmtId {
        self.add_stmt(StmtKind::This)
    }

    pub fn decl_ref(&mut self, name: &str) -> StmtId {
        let name = self.tu.interner.intern(name);
        self.add_stmt(StmtKind::DeclRef(name))
    }

    pub fn method_ref(&mut self, method: MethodId) -> StmtId {
        self.add_stmt(StmtKind::MethodRef(method))
    }

    /// An implicit-`this` field access.
    pub fn field_ref(&mut self, field: FieldId) -> StmtId {
        self.add_stmt(StmtKind::Member {
            base: None,
            qualifier: None,
            target: MemberTarget::Field(field),
            is_arrow: false,
        })
    }

    pub fn member(&mut self, base: StmtId, target: MemberTarget, is_arrow: bool) -> StmtId {
        self.add_stmt(StmtKind::Member {
            base: Some(base),
            qualifier: None,
            target,
            is_arrow,
        })
    }

    /// A `Qualifier::method` qualified member reference.
    pub fn qualified_member(&mut self, qualifier: RecordId, target: MemberTarget) -> StmtId {
        self.add_stmt(StmtKind::Member {
            base: None,
            qualifier: Some(qualifier),
            target,
            is_arrow: false,
        })
    }

    pub fn unresolved(&mut self, base: Option<StmtId>, name: &str) -> StmtId {
        let name = self.tu.interner.intern(name);
        self.add_stmt(StmtKind::UnresolvedMember {
            base,
            qualifier: None,
            name,
        })
    }

    /// An unresolved `Qualifier<T>::name` reference, matched by name string.
    pub fn qualified_unresolved(&mut self, qualifier: &str, name: &str) -> StmtId {
        let qualifier = self.tu.interner.intern(qualifier);
        let name = self.tu.interner.intern(name);
        self.add_stmt(StmtKind::UnresolvedMember {
            base: None,
            qualifier: Some(qualifier),
            name,
        })
    }

    pub fn call(&mut self, callee: StmtId, args: &[StmtId]) -> StmtId {
        self.add_stmt(StmtKind::Call {
            callee,
            args: args.to_vec(),
        })
    }

    pub fn subscript(&mut self, base: StmtId, index: StmtId) -> StmtId {
        self.add_stmt(StmtKind::Subscript { base, index })
    }

    pub fn addr_of(&mut self, inner: StmtId) -> StmtId {
        self.add_stmt(StmtKind::AddrOf(inner))
    }

    // === Body shorthands ===

    /// `visitor->trace(m_field)`.
    pub fn visitor_trace_field(&mut self, field: FieldId) -> StmtId {
        let receiver = self.decl_ref("visitor");
        let callee = self.unresolved(Some(receiver), "trace");
        let arg = self.field_ref(field);
        self.call(callee, &[arg])
    }

    /// `Base::trace(visitor)` in unresolved (dependent) form.
    pub fn base_trace_call(&mut self, base_name: &str) -> StmtId {
        let callee = self.qualified_unresolved(base_name, "trace");
        let arg = self.decl_ref("visitor");
        self.call(callee, &[arg])
    }

    pub fn finish(self) -> TranslationUnit {
        self.tu
    }

    /// Read access to the unit under construction.
    pub fn tu(&self) -> &TranslationUnit {
        &self.tu
    }

    pub fn tu_mut(&mut self) -> &mut TranslationUnit {
        &mut self.tu
    }
}
