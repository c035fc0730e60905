//! Abstract Syntax Tree (AST) for C and C++.
//!
//! The AST is a flattened arena: every node lives in one vector and refers to
//! its children through [`NodeRef`] indices, so a deep copy is a plain clone
//! and no subtree is ever shared between two trees.
//!
//! ## Architecture
//!
//! - [`nodes`]: node kinds and the small enums and flag sets they carry
//! - [`visitor`]: capability-flag driven traversal
//! - [`signature`]: textual signatures of declarators, specifiers and types
//! - [`dumper`]: indented text dump used by snapshot tests
//!
//! ## Lifecycle
//!
//! Nodes are appended while the parser runs. Finishing the translation unit
//! freezes the tree: parent links are computed and every later mutation
//! fails with [`AstError::Frozen`]. [`Ast::copy`] returns an unfrozen deep
//! copy.

use std::num::NonZeroU32;

use serde::Serialize;
use thin_vec::ThinVec;

pub use crate::source_manager::{SourceId, SourceLoc, SourceSpan};

/// Interned string, shared with the preprocessor and lexer.
pub type Symbol = symbol_table::GlobalSymbol;

pub mod dumper;
pub mod nodes;
pub mod signature;
pub mod visitor;

pub use nodes::*;
pub use visitor::{AstVisitor, ImplicitNameSource, VisitAction, VisitFlags};

use crate::semantic::BindingId;

/// Errors raised by tree mutation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AstError {
    #[error("attempt to modify a frozen AST")]
    Frozen,
    #[error("invalid node reference {0:?}")]
    InvalidNode(NodeRef),
}

/// Node reference type for referencing child nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, serde::Deserialize)]
pub struct NodeRef(NonZeroU32);

impl NodeRef {
    pub const ROOT: NodeRef = NodeRef(NonZeroU32::new(1).unwrap());

    pub fn new(value: u32) -> Option<Self> {
        NonZeroU32::new(value).map(Self)
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }

    pub fn index(self) -> usize {
        (self.get() - 1) as usize
    }

    fn from_index(index: usize) -> Option<Self> {
        u32::try_from(index + 1).ok().and_then(Self::new)
    }
}

/// Half-open range of parser token indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TokenRange {
    pub start: u32,
    pub end: u32,
}

impl TokenRange {
    pub fn new(start: usize, end: usize) -> Self {
        TokenRange {
            start: start as u32,
            end: end.max(start) as u32,
        }
    }

    pub fn len(&self) -> usize {
        (self.end - self.start) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }

    pub fn as_range(&self) -> std::ops::Range<usize> {
        self.start as usize..self.end as usize
    }
}

/// One arena slot
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub parent: Option<NodeRef>,
    /// File span; macro-expanded tokens contribute their invocation span
    pub span: SourceSpan,
    pub tokens: TokenRange,
    /// Attribute specifiers decorating this node
    pub attributes: ThinVec<NodeRef>,
}

/// Name synthesized for a construct with no literal name token, e.g. the
/// constructor invoked by `new T()` or an overloaded `operator+`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ImplicitName {
    /// Node the name is attached to
    pub owner: NodeRef,
    pub span: SourceSpan,
    pub binding: BindingId,
    /// Second name of a pair, e.g. the closing parenthesis of a call operator
    pub alternate: bool,
}

/// The flattened AST storage.
#[derive(Debug, Clone, Default)]
pub struct Ast {
    nodes: Vec<Node>,
    root: Option<NodeRef>,
    frozen: bool,
}

impl Ast {
    /// Create a new empty AST
    pub fn new() -> Self {
        Ast::default()
    }

    fn check_mutable(&self) -> Result<(), AstError> {
        if self.frozen { Err(AstError::Frozen) } else { Ok(()) }
    }

    /// Add a node to the AST and return its reference
    pub fn push_node(&mut self, kind: NodeKind, tokens: TokenRange, span: SourceSpan) -> Result<NodeRef, AstError> {
        self.check_mutable()?;
        let node_ref = NodeRef::from_index(self.nodes.len()).ok_or(AstError::InvalidNode(NodeRef::ROOT))?;
        self.nodes.push(Node {
            kind,
            parent: None,
            span,
            tokens,
            attributes: ThinVec::new(),
        });
        Ok(node_ref)
    }

    /// Drop nodes appended after a speculative parse was abandoned
    pub(crate) fn truncate(&mut self, len: usize) -> Result<(), AstError> {
        self.check_mutable()?;
        self.nodes.truncate(len);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, node_ref: NodeRef) -> Option<&Node> {
        self.nodes.get(node_ref.index())
    }

    /// Get node kind by reference
    pub fn get_kind(&self, node_ref: NodeRef) -> &NodeKind {
        &self.nodes[node_ref.index()].kind
    }

    /// Get node span by reference
    pub fn get_span(&self, node_ref: NodeRef) -> SourceSpan {
        self.nodes[node_ref.index()].span
    }

    pub fn get_tokens(&self, node_ref: NodeRef) -> TokenRange {
        self.nodes[node_ref.index()].tokens
    }

    pub fn parent(&self, node_ref: NodeRef) -> Option<NodeRef> {
        self.node(node_ref).and_then(|n| n.parent)
    }

    pub fn attributes(&self, node_ref: NodeRef) -> &[NodeRef] {
        self.node(node_ref).map_or(&[], |n| n.attributes.as_slice())
    }

    pub fn root(&self) -> Option<NodeRef> {
        self.root
    }

    pub fn set_root(&mut self, root: NodeRef) -> Result<(), AstError> {
        self.check_mutable()?;
        self.validate(root)?;
        self.root = Some(root);
        Ok(())
    }

    pub fn set_attributes(&mut self, node_ref: NodeRef, attributes: ThinVec<NodeRef>) -> Result<(), AstError> {
        self.check_mutable()?;
        self.validate(node_ref)?;
        self.nodes[node_ref.index()].attributes.extend(attributes);
        Ok(())
    }

    pub fn replace_kind(&mut self, node_ref: NodeRef, kind: NodeKind) -> Result<(), AstError> {
        self.check_mutable()?;
        self.validate(node_ref)?;
        self.nodes[node_ref.index()].kind = kind;
        Ok(())
    }

    pub(crate) fn kind_mut(&mut self, node_ref: NodeRef) -> Result<&mut NodeKind, AstError> {
        self.check_mutable()?;
        self.validate(node_ref)?;
        Ok(&mut self.nodes[node_ref.index()].kind)
    }

    /// Grow a node's extent, used when trailing tokens attach to a finished node
    pub(crate) fn extend(&mut self, node_ref: NodeRef, tokens: TokenRange, span: SourceSpan) -> Result<(), AstError> {
        self.check_mutable()?;
        self.validate(node_ref)?;
        let node = &mut self.nodes[node_ref.index()];
        node.tokens = tokens;
        node.span = span;
        Ok(())
    }

    fn validate(&self, node_ref: NodeRef) -> Result<(), AstError> {
        if node_ref.index() < self.nodes.len() {
            Ok(())
        } else {
            Err(AstError::InvalidNode(node_ref))
        }
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Link parents and make the tree immutable
    pub fn freeze(&mut self) {
        if self.frozen {
            return;
        }
        if let Some(root) = self.root {
            let mut stack = vec![root];
            while let Some(current) = stack.pop() {
                for child in self.children(current) {
                    if child.index() < self.nodes.len() {
                        self.nodes[child.index()].parent = Some(current);
                        stack.push(child);
                    }
                }
            }
        }
        self.frozen = true;
        log::debug!("froze AST with {} nodes", self.nodes.len());
    }

    /// Children in source order, attribute specifiers included
    pub fn children(&self, node_ref: NodeRef) -> Vec<NodeRef> {
        let Some(node) = self.node(node_ref) else {
            return Vec::new();
        };
        let mut children = node.kind.children();
        if !node.attributes.is_empty() {
            children.extend(node.attributes.iter().copied());
            children.sort_by_key(|c| self.node(*c).map_or(0, |n| n.tokens.start));
        }
        children
    }

    /// Pre-order list of `node_ref` and everything below it
    pub fn descendants(&self, node_ref: NodeRef) -> Vec<NodeRef> {
        let mut out = Vec::new();
        let mut stack = vec![node_ref];
        while let Some(current) = stack.pop() {
            out.push(current);
            let children = self.children(current);
            stack.extend(children.into_iter().rev());
        }
        out
    }

    /// Ancestors from the parent up to the root
    pub fn ancestors(&self, node_ref: NodeRef) -> impl Iterator<Item = NodeRef> + '_ {
        std::iter::successors(self.parent(node_ref), move |n| self.parent(*n))
    }

    pub fn depth(&self, node_ref: NodeRef) -> usize {
        self.ancestors(node_ref).count()
    }

    /// Iterate over every node in the arena
    pub fn iter(&self) -> impl Iterator<Item = (NodeRef, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, n)| NodeRef::from_index(i).map(|r| (r, n)))
    }

    /// Deep copy that can be modified again
    pub fn copy(&self) -> Ast {
        Ast {
            nodes: self.nodes.clone(),
            root: self.root,
            frozen: false,
        }
    }

    /// Unfrozen tree holding a copy of the subtree rooted at `node_ref`
    pub fn copy_subtree(&self, node_ref: NodeRef) -> Result<Ast, AstError> {
        self.validate(node_ref)?;
        let old = self.descendants(node_ref);
        let mut mapping = hashbrown::HashMap::with_capacity(old.len());
        for (i, r) in old.iter().enumerate() {
            if let Some(new_ref) = NodeRef::from_index(i) {
                mapping.insert(*r, new_ref);
            }
        }
        let remap = |r: NodeRef| mapping.get(&r).copied().unwrap_or(r);

        let mut copy = Ast::new();
        for r in &old {
            let source = &self.nodes[r.index()];
            let mut kind = source.kind.clone();
            kind.remap_children(remap);
            copy.nodes.push(Node {
                kind,
                parent: source.parent.filter(|_| *r != node_ref).map(remap),
                span: source.span,
                tokens: source.tokens,
                attributes: source.attributes.iter().map(|a| remap(*a)).collect(),
            });
        }
        copy.root = mapping.get(&node_ref).copied();
        Ok(copy)
    }

    /// Structural comparison of two trees. Returns the first mismatch.
    pub fn compare(&self, other: &Ast) -> Result<(), String> {
        match (self.root, other.root) {
            (Some(a), Some(b)) => self.compare_subtree(a, other, b),
            (None, None) => Ok(()),
            _ => Err("only one tree has a root".to_string()),
        }
    }

    fn compare_subtree(&self, a: NodeRef, other: &Ast, b: NodeRef) -> Result<(), String> {
        let (Some(left), Some(right)) = (self.node(a), other.node(b)) else {
            return Err(format!("dangling reference {a:?} / {b:?}"));
        };
        let left_children = self.children(a);
        let right_children = other.children(b);
        if left.kind.name() != right.kind.name() || left_children.len() != right_children.len() {
            return Err(format!(
                "node {:?} is {} with {} children, copy has {} with {} children",
                a,
                left.kind.name(),
                left_children.len(),
                right.kind.name(),
                right_children.len()
            ));
        }
        if left.span != right.span || left.tokens != right.tokens {
            return Err(format!("node {:?} ({}) changed its location", a, left.kind.name()));
        }
        let mut kind = left.kind.clone();
        let left_kind_children = left.kind.children();
        let right_kind_children = right.kind.children();
        let mut pairs = left_kind_children.iter().zip(right_kind_children.iter());
        kind.remap_children(|_| pairs.next().map_or(NodeRef::ROOT, |(_, r)| *r));
        if kind != right.kind {
            return Err(format!("node {:?} ({}) differs in its payload", a, left.kind.name()));
        }
        for (lc, rc) in left_children.iter().zip(right_children.iter()) {
            self.compare_subtree(*lc, other, *rc)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_tree() -> Ast {
        let mut ast = Ast::new();
        let span = SourceSpan::empty();
        let x = ast.push_node(NodeKind::Name(Symbol::from("x")), TokenRange::new(0, 1), span).unwrap();
        let id = ast.push_node(NodeKind::IdExpression { name: x }, TokenRange::new(0, 1), span).unwrap();
        let stmt = ast
            .push_node(NodeKind::ExpressionStatement { expression: id }, TokenRange::new(0, 2), span)
            .unwrap();
        let body = ast
            .push_node(
                NodeKind::CompoundStatement {
                    statements: ThinVec::from(vec![stmt]),
                },
                TokenRange::new(0, 2),
                span,
            )
            .unwrap();
        ast.set_root(body).unwrap();
        ast
    }

    #[test]
    fn freeze_links_parents_and_rejects_mutation() {
        let mut ast = small_tree();
        ast.freeze();
        let x = NodeRef::new(1).unwrap();
        assert_eq!(ast.depth(x), 3);
        assert_eq!(ast.parent(x), NodeRef::new(2));
        assert_eq!(
            ast.push_node(NodeKind::NullStatement, TokenRange::default(), SourceSpan::empty()),
            Err(AstError::Frozen)
        );
        assert_eq!(ast.replace_kind(x, NodeKind::NullStatement), Err(AstError::Frozen));
    }

    #[test]
    fn copy_is_equal_and_mutable() {
        let mut ast = small_tree();
        ast.freeze();
        let mut copy = ast.copy();
        assert!(!copy.is_frozen());
        assert_eq!(ast.compare(&copy), Ok(()));
        copy.replace_kind(NodeRef::new(1).unwrap(), NodeKind::Name(Symbol::from("y")))
            .unwrap();
        assert!(ast.compare(&copy).is_err());
        assert_eq!(ast.get_kind(NodeRef::new(1).unwrap()), &NodeKind::Name(Symbol::from("x")));
    }

    #[test]
    fn subtree_copy_renumbers() {
        let mut ast = small_tree();
        ast.freeze();
        let stmt = NodeRef::new(3).unwrap();
        let sub = ast.copy_subtree(stmt).unwrap();
        assert_eq!(sub.len(), 3);
        let root = sub.root().unwrap();
        assert_eq!(sub.get_kind(root).name(), "ExpressionStatement");
        assert_eq!(sub.parent(root), None);
        let names: Vec<_> = sub.descendants(root).iter().map(|r| sub.get_kind(*r).name()).collect();
        assert_eq!(names, vec!["ExpressionStatement", "IdExpression", "Name"]);
    }
}
