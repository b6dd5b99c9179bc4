//! Class-graph dump for offline analysis.
//!
//! Serializes every defined class and its ownership edges as JSON. Tooling
//! downstream joins dumps from many translation units to build the global
//! object graph. Written by hand; the format is a flat pair of arrays and
//! keeping the dump dependency-free matches the diagnostic emitters.

use std::fmt::Write as _;
use std::io;

use gcv_ir::RecordId;
use gcv_model::{Edge, PtrKind, RecordCache};
use thiserror::Error;

use crate::traversal::{walk_edge, EdgePath, EdgeVisitor};

/// Failure to serialize or write the graph dump.
#[derive(Debug, Error)]
pub enum DumpError {
    #[error("failed to write graph dump: {0}")]
    Io(#[from] io::Error),
}

/// Write the class/edge graph of the whole unit to `out`.
pub fn dump_graph(cache: &RecordCache<'_>, out: &mut impl io::Write) -> Result<(), DumpError> {
    let tu = cache.tu();
    let mut nodes = String::new();
    let mut edges = String::new();

    for (id, record) in tu.records() {
        if !record.has_definition {
            continue;
        }
        if !nodes.is_empty() {
            nodes.push_str(",\n");
        }
        let _ = write!(
            nodes,
            "    {{\"name\": \"{}\", \"file\": \"{}\", \"offset\": {}}}",
            escape_json(tu.name_str(record.name)),
            escape_json(tu.name_str(record.file)),
            record.span.start,
        );

        let info = cache.lookup(id);
        for point in info.fields(cache) {
            let mut dumper = EdgeDumper {
                cache,
                src: id,
                field: tu.name_str(tu.field(point.field).name),
                out: &mut edges,
            };
            walk_edge(&mut dumper, &point.edge);
        }
    }

    out.write_all(b"{\n  \"nodes\": [\n")?;
    out.write_all(nodes.as_bytes())?;
    out.write_all(b"\n  ],\n  \"edges\": [\n")?;
    out.write_all(edges.as_bytes())?;
    out.write_all(b"\n  ]\n}\n")?;
    Ok(())
}

struct EdgeDumper<'a, 'tu> {
    cache: &'a RecordCache<'tu>,
    src: RecordId,
    field: &'static str,
    out: &'a mut String,
}

impl EdgeVisitor for EdgeDumper<'_, '_> {
    fn at_value(&mut self, path: &EdgePath<'_>, decl: RecordId) {
        let tu = self.cache.tu();
        let kind = path.enclosing().map_or("value", Edge::kind_name);
        let liveness = if path.within_root() {
            "root"
        } else if path.enclosing().is_some_and(Edge::is_weak_member) {
            "weak"
        } else {
            "strong"
        };
        let ptr = match path.enclosing().and_then(Edge::ptr_kind) {
            Some(PtrKind::Raw) => "raw",
            Some(PtrKind::RefCounted) => "ref",
            Some(PtrKind::Owning) => "unique",
            None => "none",
        };
        if !self.out.is_empty() {
            self.out.push_str(",\n");
        }
        let _ = write!(
            self.out,
            "    {{\"src\": \"{}\", \"dst\": \"{}\", \"lbl\": \"{}\", \"kind\": \"{}\", \"liveness\": \"{}\", \"ptr\": \"{}\"}}",
            escape_json(tu.name_str(tu.record(self.src).name)),
            escape_json(tu.name_str(tu.record(decl).name)),
            escape_json(self.field),
            kind,
            liveness,
            ptr,
        );
    }
}

fn escape_json(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => result.push_str("\\\""),
            '\\' => result.push_str("\\\\"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                let _ = write!(result, "\\u{:04x}", c as u32);
            }
            c => result.push(c),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use gcv_ir::fixture::TuBuilder;

    use super::*;

    #[test]
    fn dumps_nodes_and_edges() {
        let mut b = TuBuilder::new("dump.cpp");
        let bar = b.record("Bar");
        b.gc_base(bar, "GarbageCollected");
        let foo = b.record("Foo");
        b.gc_base(foo, "GarbageCollected");
        let cls = b.class_ty(bar);
        let member = b.wrapper_ty("Member", &[cls]);
        b.field(foo, "m_bar", member);

        let tu = b.finish();
        let cache = RecordCache::new(&tu);
        let mut out = Vec::new();
        dump_graph(&cache, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("\"name\": \"Foo\""));
        assert!(text.contains(
            "\"src\": \"Foo\", \"dst\": \"Bar\", \"lbl\": \"m_bar\", \"kind\": \"member\", \"liveness\": \"strong\""
        ));
    }

    #[test]
    fn root_liveness_is_marked() {
        let mut b = TuBuilder::new("dump.cpp");
        let bar = b.record("Bar");
        b.gc_base(bar, "GarbageCollected");
        let holder = b.record("Holder");
        let cls = b.class_ty(bar);
        let persistent = b.wrapper_ty("Persistent", &[cls]);
        b.field(holder, "m_root", persistent);

        let tu = b.finish();
        let cache = RecordCache::new(&tu);
        let mut out = Vec::new();
        dump_graph(&cache, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("\"kind\": \"persistent\", \"liveness\": \"root\""));
    }
}
