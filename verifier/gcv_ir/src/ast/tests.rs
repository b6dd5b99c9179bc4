use pretty_assertions::assert_eq;

use crate::fixture::TuBuilder;
use crate::{Body, MethodId, StmtKind, TranslationUnit, TypeKind};

#[test]
fn records_and_fields_round_trip() {
    let mut b = TuBuilder::new("test.cpp");
    let foo = b.record("Foo");
    let bar = b.record_in("blink", "Bar");
    let bar_ty = b.class_ty(bar);
    let field = b.field(foo, "m_bar", bar_ty);

    let tu = b.finish();
    assert_eq!(tu.name_str(tu.record(foo).name), "Foo");
    assert_eq!(
        tu.record(bar).namespace.map(|n| tu.name_str(n)),
        Some("blink")
    );
    assert_eq!(tu.record(foo).fields, vec![field]);
    assert_eq!(tu.field(field).parent, foo);
    assert_eq!(tu.class_decl(tu.field(field).ty), Some(bar));
}

#[test]
fn template_args_unwrap_one_level() {
    let mut b = TuBuilder::new("test.cpp");
    let bar = b.record("Bar");
    let bar_ty = b.class_ty(bar);
    let member_ty = b.wrapper_ty("Member", &[bar_ty]);

    let tu = b.finish();
    let args = tu.template_args(member_ty);
    assert_eq!(args.len(), 1);
    assert_eq!(tu.class_decl(args[0]), Some(bar));
    match tu.type_kind(member_ty) {
        TypeKind::Class { decl, .. } => {
            assert_eq!(tu.name_str(tu.record(*decl).name), "Member");
        }
        other => panic!("expected class type, got {other:?}"),
    }
}

#[test]
fn stmt_children_cover_call_shapes() {
    let mut b = TuBuilder::new("test.cpp");
    let foo = b.record("Foo");
    let int_ty = b.builtin_ty("int");
    let f = b.field(foo, "m_x", int_ty);
    let call = b.visitor_trace_field(f);

    let tu = b.finish();
    let StmtKind::Call { callee, args } = &tu.stmt(call).kind else {
        panic!("expected call");
    };
    assert_eq!(args.len(), 1);
    let kids = tu.stmt(call).children();
    assert_eq!(kids.len(), 2);
    assert_eq!(kids[0], *callee);
    assert_eq!(kids[1], args[0]);
}

#[test]
fn late_parse_hook_fills_pending_bodies() {
    let mut b = TuBuilder::new("test.cpp");
    let foo = b.record("Foo");
    let trace = b.trace_method(foo);
    b.make_template_method(trace);
    b.mark_body_unparsed(trace);
    let mut tu = b.finish();

    tu.set_late_parse_hook(Box::new(|tu: &mut TranslationUnit, mid: MethodId| {
        let stmt = tu.add_stmt(crate::Stmt {
            kind: StmtKind::Compound(Vec::new()),
            span: crate::Span::DUMMY,
        });
        tu.method_mut(mid).body = Body::Parsed(stmt);
    }));

    tu.force_late_parsed_bodies(&[trace]);
    assert!(matches!(tu.method(trace).body, Body::Parsed(_)));
}

#[test]
fn hook_absent_leaves_bodies_unparsed() {
    let mut b = TuBuilder::new("test.cpp");
    let foo = b.record("Foo");
    let trace = b.trace_method(foo);
    b.mark_body_unparsed(trace);
    let mut tu = b.finish();

    tu.force_late_parsed_bodies(&[trace]);
    assert_eq!(tu.method(trace).body, Body::Unparsed);
}
