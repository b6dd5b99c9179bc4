//! Diagnostic construction for every finding family.
//!
//! One constructor per finding shape. The engine decides *when* to report;
//! this module decides *how* a finding reads: main message on the class,
//! secondary labels forming the note chain on the contributing
//! declarations.

use gcv_diagnostic::{Diagnostic, ErrorCode};
use gcv_ir::{MethodId, TranslationUnit};
use gcv_model::{BasePoint, FieldPoint, RecordCache, RecordInfo};

use crate::checks::{FieldError, FinalizerAccess, RootPathStep};
use crate::config::VerifierOptions;

fn class_name(tu: &TranslationUnit, info: &RecordInfo) -> &'static str {
    tu.name_str(tu.record(info.id()).name)
}

fn field_name(tu: &TranslationUnit, field: gcv_ir::FieldId) -> &'static str {
    tu.name_str(tu.field(field).name)
}

pub(crate) fn stack_allocated_hierarchy(
    tu: &TranslationUnit,
    info: &RecordInfo,
    base: &BasePoint,
) -> Diagnostic {
    let class = class_name(tu, info);
    let base_name = tu.name_str(tu.record(base.decl).name);
    Diagnostic::error(ErrorCode::G1004)
        .with_message(format!(
            "stack-allocated class '{class}' derives non-stack-allocated class '{base_name}'"
        ))
        .with_label(tu.record(info.id()).span, "class defined here")
        .with_secondary_label(base.span, "non-stack-allocated base")
}

pub(crate) fn pure_virtual_trace(
    tu: &TranslationUnit,
    info: &RecordInfo,
    trace: MethodId,
) -> Diagnostic {
    let class = class_name(tu, info);
    Diagnostic::error(ErrorCode::G1006)
        .with_message(format!(
            "class '{class}' declares a pure-virtual trace method"
        ))
        .with_label(tu.method(trace).span, "declared pure here")
}

pub(crate) fn missing_trace_method<'a>(
    tu: &TranslationUnit,
    info: &RecordInfo,
    fields: impl Iterator<Item = &'a FieldPoint>,
) -> Diagnostic {
    let class = class_name(tu, info);
    let mut diag = Diagnostic::error(ErrorCode::G2001)
        .with_message(format!("class '{class}' requires a trace method"))
        .with_label(tu.record(info.id()).span, "class defined here");
    for point in fields {
        diag = diag.with_secondary_label(
            point.span,
            format!("untraced field '{}' declared here", field_name(tu, point.field)),
        );
    }
    diag
}

pub(crate) fn left_most_derivation(tu: &TranslationUnit, info: &RecordInfo) -> Diagnostic {
    let class = class_name(tu, info);
    Diagnostic::error(ErrorCode::G1001)
        .with_message(format!(
            "class '{class}' must derive its GC base in the left-most position"
        ))
        .with_label(tu.record(info.id()).span, "class defined here")
}

pub(crate) fn left_most_base_not_polymorphic(
    tu: &TranslationUnit,
    info: &RecordInfo,
    left_most: &RecordInfo,
) -> Diagnostic {
    let class = class_name(tu, info);
    let base = class_name(tu, left_most);
    Diagnostic::error(ErrorCode::G1002)
        .with_message(format!(
            "left-most base class '{base}' of polymorphic class '{class}' must be polymorphic"
        ))
        .with_label(tu.record(info.id()).span, "class defined here")
        .with_secondary_label(tu.record(left_most.id()).span, "left-most base defined here")
}

pub(crate) fn left_most_base_trace_not_virtual(
    tu: &TranslationUnit,
    info: &RecordInfo,
    left_most: &RecordInfo,
    trace: MethodId,
) -> Diagnostic {
    let class = class_name(tu, info);
    let base = class_name(tu, left_most);
    Diagnostic::error(ErrorCode::G1003)
        .with_message(format!(
            "left-most base class '{base}' of class '{class}' must define a virtual trace method"
        ))
        .with_label(tu.method(trace).span, "virtual trace declared here")
        .with_secondary_label(tu.record(left_most.id()).span, "left-most base defined here")
}

pub(crate) fn invalid_fields(
    tu: &TranslationUnit,
    info: &RecordInfo,
    errors: &[FieldError],
    options: &VerifierOptions,
) -> Diagnostic {
    let class = class_name(tu, info);
    let is_error = errors.iter().any(|e| e.fault.is_error(options));
    let diag = if is_error {
        Diagnostic::error(ErrorCode::G3001)
    } else {
        Diagnostic::warning(ErrorCode::G3001)
    };
    let mut diag = diag
        .with_message(format!("class '{class}' contains invalid fields"))
        .with_label(tu.record(info.id()).span, "class defined here");
    for error in errors {
        diag = diag.with_secondary_label(
            error.span,
            format!(
                "field '{}': {}",
                field_name(tu, error.field),
                error.fault.describe()
            ),
        );
    }
    diag
}

pub(crate) fn gc_root(
    tu: &TranslationUnit,
    info: &RecordInfo,
    path: &[RootPathStep],
) -> Diagnostic {
    let class = class_name(tu, info);
    let outer = path.first().map_or("", |step| field_name(tu, step.field));
    let mut diag = Diagnostic::error(ErrorCode::G4001)
        .with_message(format!("class '{class}' contains GC root in field '{outer}'"))
        .with_label(tu.record(info.id()).span, "class defined here");
    if let Some((root, parts)) = path.split_last() {
        for step in parts {
            diag = diag.with_secondary_label(
                step.span,
                format!(
                    "part-object field '{}' contains a GC root",
                    field_name(tu, step.field)
                ),
            );
        }
        diag = diag.with_secondary_label(
            root.span,
            format!("field '{}' is a GC root", field_name(tu, root.field)),
        );
    }
    diag
}

pub(crate) fn operator_new_override(
    tu: &TranslationUnit,
    info: &RecordInfo,
    method: MethodId,
) -> Diagnostic {
    let class = class_name(tu, info);
    Diagnostic::error(ErrorCode::G1005)
        .with_message(format!("collectable class '{class}' overrides operator new"))
        .with_label(tu.method(method).span, "operator new declared here")
}

pub(crate) fn trace_override(
    tu: &TranslationUnit,
    info: &RecordInfo,
    own_trace: MethodId,
    base_trace: MethodId,
) -> Diagnostic {
    let class = class_name(tu, info);
    let base = tu.name_str(tu.record(tu.method(base_trace).parent).name);
    Diagnostic::error(ErrorCode::G2004)
        .with_message(format!(
            "class '{class}' overrides non-virtual trace of base class '{base}'"
        ))
        .with_label(tu.method(own_trace).span, "overriding trace declared here")
        .with_secondary_label(tu.method(base_trace).span, "non-virtual trace declared here")
}

pub(crate) fn missing_mixin_trace(tu: &TranslationUnit, info: &RecordInfo) -> Diagnostic {
    let class = class_name(tu, info);
    Diagnostic::error(ErrorCode::G2005)
        .with_message(format!(
            "class '{class}' derives a garbage-collected mixin but does not locally declare a trace method"
        ))
        .with_label(tu.record(info.id()).span, "class defined here")
}

pub(crate) fn missing_trace_dispatch(
    tu: &TranslationUnit,
    info: &RecordInfo,
    dispatch: MethodId,
) -> Diagnostic {
    let class = class_name(tu, info);
    Diagnostic::error(ErrorCode::G6001)
        .with_message(format!(
            "missing dispatch to class '{class}' in manual trace dispatch"
        ))
        .with_label(tu.method(dispatch).span, "dispatch method defined here")
        .with_secondary_label(tu.record(info.id()).span, "class defined here")
}

pub(crate) fn missing_finalize_dispatch(
    tu: &TranslationUnit,
    info: &RecordInfo,
    dispatch: MethodId,
) -> Diagnostic {
    let class = class_name(tu, info);
    Diagnostic::error(ErrorCode::G6002)
        .with_message(format!(
            "missing dispatch to class '{class}' in manual finalize dispatch"
        ))
        .with_label(tu.method(dispatch).span, "dispatch method defined here")
        .with_secondary_label(tu.record(info.id()).span, "class defined here")
}

pub(crate) fn dispatch_on_polymorphic(
    tu: &TranslationUnit,
    info: &RecordInfo,
    dispatch: MethodId,
) -> Diagnostic {
    let class = class_name(tu, info);
    Diagnostic::error(ErrorCode::G6003)
        .with_message(format!(
            "polymorphic class '{class}' uses manual trace dispatch"
        ))
        .with_label(tu.method(dispatch).span, "dispatch method defined here")
}

pub(crate) fn missing_finalize_dispatch_method(
    tu: &TranslationUnit,
    info: &RecordInfo,
) -> Diagnostic {
    let class = class_name(tu, info);
    Diagnostic::error(ErrorCode::G6004)
        .with_message(format!(
            "class '{class}' is missing a manual finalize dispatch method"
        ))
        .with_label(tu.record(info.id()).span, "class defined here")
}

pub(crate) fn missing_finalized_base(
    cache: &RecordCache<'_>,
    info: &RecordInfo,
) -> Diagnostic {
    let tu = cache.tu();
    let class = class_name(tu, info);
    let mut diag = Diagnostic::error(ErrorCode::G5001)
        .with_message(format!(
            "class '{class}' requires finalization but does not derive a finalized base"
        ))
        .with_label(tu.record(info.id()).span, "class defined here");
    for &mid in &tu.record(info.id()).methods {
        let m = tu.method(mid);
        if matches!(m.kind, gcv_ir::MethodKind::Destructor) && m.is_user_provided {
            diag = diag.with_secondary_label(m.span, "user-declared destructor");
        }
    }
    for point in info.fields(cache) {
        if point.edge.needs_finalization(cache) {
            diag = diag.with_secondary_label(
                point.span,
                format!(
                    "field '{}' requires finalization",
                    field_name(tu, point.field)
                ),
            );
        }
    }
    diag
}

pub(crate) fn finalizer_access(
    tu: &TranslationUnit,
    info: &RecordInfo,
    access: &FinalizerAccess,
) -> Diagnostic {
    let class = class_name(tu, info);
    let field = field_name(tu, access.field);
    let diag = if access.eagerly_finalized {
        Diagnostic::error(ErrorCode::G5003).with_message(format!(
            "finalizer in eagerly finalized class '{class}' accesses eagerly finalized field '{field}'"
        ))
    } else {
        Diagnostic::error(ErrorCode::G5002).with_message(format!(
            "finalizer in class '{class}' accesses potentially finalized field '{field}'"
        ))
    };
    diag.with_label(access.span, "accessed here")
        .with_secondary_label(tu.field(access.field).span, "field declared here")
}

pub(crate) fn unneeded_finalizer(
    tu: &TranslationUnit,
    info: &RecordInfo,
    destructor: MethodId,
) -> Diagnostic {
    let class = class_name(tu, info);
    Diagnostic::warning(ErrorCode::G5004)
        .with_message(format!("class '{class}' provides an unneeded finalizer"))
        .with_label(tu.method(destructor).span, "destructor declared here")
}

pub(crate) fn untraced_fields(
    tu: &TranslationUnit,
    info: &RecordInfo,
    trace: MethodId,
    fields: &[&FieldPoint],
) -> Diagnostic {
    let class = class_name(tu, info);
    let mut diag = Diagnostic::error(ErrorCode::G2002)
        .with_message(format!(
            "trace method of class '{class}' fails to trace one or more fields"
        ))
        .with_label(tu.method(trace).span, "trace method defined here");
    for point in fields {
        diag = diag.with_secondary_label(
            point.span,
            format!("untraced field '{}' declared here", field_name(tu, point.field)),
        );
    }
    diag
}

pub(crate) fn untraced_base(
    tu: &TranslationUnit,
    info: &RecordInfo,
    trace: MethodId,
    base: &BasePoint,
) -> Diagnostic {
    let class = class_name(tu, info);
    let base_name = tu.name_str(tu.record(base.decl).name);
    Diagnostic::error(ErrorCode::G2003)
        .with_message(format!(
            "trace method of class '{class}' does not trace base class '{base_name}'"
        ))
        .with_label(tu.method(trace).span, "trace method defined here")
        .with_secondary_label(base.span, "untraced base")
}
