//! GC-root containment check.
//!
//! A managed object must not own an unconditional root: a `Persistent`
//! field, a root collection, or a part-object that transitively contains
//! one. The walk recurses into part-objects and nested collections; a
//! visiting set guards against self-referential part-object types. The
//! full field path from the outer class to the offending field is kept so
//! reporting can explain why.

use gcv_ir::{FieldId, RecordId, Span};
use gcv_model::{Edge, RecordCache, RecordInfo};
use rustc_hash::FxHashSet;

/// One step in a root-containment path: the field followed to get deeper.
#[derive(Copy, Clone, Debug)]
pub struct RootPathStep {
    pub field: FieldId,
    pub span: Span,
}

/// Every root-containment path rooted at `info`, outermost field first.
pub fn check_gc_roots(cache: &RecordCache<'_>, info: &RecordInfo) -> Vec<Vec<RootPathStep>> {
    let mut finder = RootFinder {
        cache,
        visiting: FxHashSet::default(),
        path: Vec::new(),
        found: Vec::new(),
    };
    finder.visit_record(info);
    finder.found
}

struct RootFinder<'a, 'tu> {
    cache: &'a RecordCache<'tu>,
    visiting: FxHashSet<RecordId>,
    path: Vec<RootPathStep>,
    found: Vec<Vec<RootPathStep>>,
}

impl RootFinder<'_, '_> {
    fn visit_record(&mut self, info: &RecordInfo) {
        if !self.visiting.insert(info.id()) {
            return;
        }
        for point in info.fields(self.cache) {
            self.path.push(RootPathStep {
                field: point.field,
                span: point.span,
            });
            self.visit_edge(&point.edge);
            self.path.pop();
        }
        self.visiting.remove(&info.id());
    }

    fn visit_edge(&mut self, edge: &Edge) {
        match edge {
            Edge::Persistent(_) => self.found.push(self.path.clone()),
            Edge::Collection(collection) => {
                if collection.is_root {
                    self.found.push(self.path.clone());
                } else {
                    // Element types are not followed, nested collections are.
                    for member in &collection.members {
                        if member.is_collection() {
                            self.visit_edge(member);
                        }
                    }
                }
            }
            Edge::Value(decl) => {
                let part = self.cache.lookup(*decl);
                self.visit_record(&part);
            }
            _ => {}
        }
    }
}
