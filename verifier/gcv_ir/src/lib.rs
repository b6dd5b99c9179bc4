//! Translation-unit model for the GC verifier.
//!
//! The host compiler frontend (parser, type system, source locations) is an
//! external collaborator. Its capability surface is expressed here as an
//! immutable data model: the host populates a [`TranslationUnit`] (records,
//! fields, methods, types, and method-body statement trees) and the verifier
//! only reads it. Tests populate the same model through [`fixture::TuBuilder`].
//!
//! # Design
//!
//! - Arena storage with 32-bit index handles (`RecordId`, `FieldId`, ...):
//!   O(1) lookup, `Copy` handles, no reference cycles.
//! - Interned identifiers ([`Name`]) for O(1) name comparison.
//! - Byte-offset [`Span`]s, resolved to file/offset form by the diagnostic
//!   emitters.

mod ast;
mod interner;
mod span;

pub mod fixture;

pub use ast::{
    Access, Annotations, BaseSpecifier, Body, FieldDecl, FieldId, LateParseHook, MemberTarget,
    MethodDecl, MethodId, MethodKind, RecordDecl, RecordId, Stmt, StmtId, StmtKind,
    TranslationUnit, Type, TypeId, TypeKind,
};
pub use interner::{Name, StringInterner};
pub use span::Span;
