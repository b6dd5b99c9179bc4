//! Generic recursive edge traversal.
//!
//! Visitors implement [`EdgeVisitor`], overriding the variants they care
//! about; [`walk_edge`] drives the recursion while maintaining the path of
//! enclosing edges front-to-back (front = innermost enclosing wrapper), so
//! visitors can make path-sensitive decisions such as "am I inside a root
//! context" without threading state themselves.

use std::collections::VecDeque;

use gcv_ir::RecordId;
use gcv_model::{CollectionEdge, Edge};

/// The enclosing edges of the currently visited edge, innermost first.
pub struct EdgePath<'e> {
    stack: VecDeque<&'e Edge>,
}

impl<'e> EdgePath<'e> {
    fn new() -> Self {
        EdgePath {
            stack: VecDeque::new(),
        }
    }

    /// The immediately enclosing wrapper, if any.
    pub fn enclosing(&self) -> Option<&'e Edge> {
        self.stack.front().copied()
    }

    /// Enclosing edges, innermost first.
    pub fn iter(&self) -> impl Iterator<Item = &'e Edge> + '_ {
        self.stack.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// True when any enclosing edge is a root (`Persistent` or a root
    /// collection).
    pub fn within_root(&self) -> bool {
        self.iter().any(|e| {
            e.is_persistent() || e.collection().is_some_and(|c| c.is_root)
        })
    }
}

/// One method per edge variant; defaults do nothing. Recursion into
/// children is handled by the walker, after the variant callback.
pub trait EdgeVisitor {
    fn at_value(&mut self, _path: &EdgePath<'_>, _decl: RecordId) {}
    fn at_raw_ptr(&mut self, _path: &EdgePath<'_>, _edge: &Edge) {}
    fn at_ref_ptr(&mut self, _path: &EdgePath<'_>, _edge: &Edge) {}
    fn at_unique_ptr(&mut self, _path: &EdgePath<'_>, _edge: &Edge) {}
    fn at_member(&mut self, _path: &EdgePath<'_>, _edge: &Edge) {}
    fn at_weak_member(&mut self, _path: &EdgePath<'_>, _edge: &Edge) {}
    fn at_persistent(&mut self, _path: &EdgePath<'_>, _edge: &Edge) {}
    fn at_collection(&mut self, _path: &EdgePath<'_>, _collection: &CollectionEdge) {}
}

/// Visit `edge` and all its children depth-first.
pub fn walk_edge<V: EdgeVisitor>(visitor: &mut V, edge: &Edge) {
    let mut path = EdgePath::new();
    walk(visitor, &mut path, edge);
}

fn walk<'e, V: EdgeVisitor>(visitor: &mut V, path: &mut EdgePath<'e>, edge: &'e Edge) {
    match edge {
        Edge::Value(decl) => visitor.at_value(path, *decl),
        Edge::RawPtr(inner) => {
            visitor.at_raw_ptr(path, edge);
            descend(visitor, path, edge, inner);
        }
        Edge::RefPtr(inner) => {
            visitor.at_ref_ptr(path, edge);
            descend(visitor, path, edge, inner);
        }
        Edge::UniquePtr(inner) => {
            visitor.at_unique_ptr(path, edge);
            descend(visitor, path, edge, inner);
        }
        Edge::Member(inner) => {
            visitor.at_member(path, edge);
            descend(visitor, path, edge, inner);
        }
        Edge::WeakMember(inner) => {
            visitor.at_weak_member(path, edge);
            descend(visitor, path, edge, inner);
        }
        Edge::Persistent(inner) => {
            visitor.at_persistent(path, edge);
            descend(visitor, path, edge, inner);
        }
        Edge::Collection(collection) => {
            visitor.at_collection(path, collection);
            path.stack.push_front(edge);
            for member in &collection.members {
                walk(visitor, path, member);
            }
            path.stack.pop_front();
        }
    }
}

fn descend<'e, V: EdgeVisitor>(
    visitor: &mut V,
    path: &mut EdgePath<'e>,
    parent: &'e Edge,
    inner: &'e Edge,
) {
    path.stack.push_front(parent);
    walk(visitor, path, inner);
    path.stack.pop_front();
}
