//! Offset based node lookup.
//!
//! Selections are byte ranges of the main file. Nodes from included files
//! and zero-width nodes never match.

use log::trace;

use crate::ast::{Ast, ImplicitName, NodeCategory, NodeRef, SourceId, SourceSpan};
use crate::semantic::BindingResolver;

pub struct NodeSelector<'a> {
    ast: &'a Ast,
    resolver: &'a BindingResolver,
    main_file: SourceId,
}

impl<'a> NodeSelector<'a> {
    pub fn new(ast: &'a Ast, resolver: &'a BindingResolver, main_file: SourceId) -> Self {
        NodeSelector {
            ast,
            resolver,
            main_file,
        }
    }

    fn selection(&self, offset: u32, length: u32) -> SourceSpan {
        SourceSpan::new_with_length(self.main_file, offset, length)
    }

    /// Nodes of the tree located in the main file
    fn candidates(&self, names_only: bool) -> impl Iterator<Item = (NodeRef, SourceSpan)> + '_ {
        let root = self.ast.root();
        self.ast.iter().filter_map(move |(node, data)| {
            let attached = Some(node) == root || data.parent.is_some();
            let located = data.span.source_id() == self.main_file && !data.span.is_empty();
            let wanted = !names_only || data.kind.category() == NodeCategory::Name;
            (attached && located && wanted).then_some((node, data.span))
        })
    }

    fn exact(&self, offset: u32, length: u32, names_only: bool) -> Option<NodeRef> {
        let selection = self.selection(offset, length);
        let found = self
            .candidates(names_only)
            .filter(|(_, span)| *span == selection)
            .min_by_key(|(node, _)| (self.ast.depth(*node), *node))
            .map(|(node, _)| node);
        trace!("find {}+{}: {:?}", offset, length, found);
        found
    }

    fn enclosing(&self, offset: u32, length: u32, names_only: bool) -> Option<NodeRef> {
        let selection = self.selection(offset, length);
        self.candidates(names_only)
            .filter(|(_, span)| span.contains(&selection))
            .min_by_key(|(node, span)| (span.len(), self.ast.depth(*node), *node))
            .map(|(node, _)| node)
    }

    /// Node spanning exactly the selection. Among nodes sharing the span the
    /// outermost one wins.
    pub fn find_node(&self, offset: u32, length: u32) -> Option<NodeRef> {
        self.exact(offset, length, false)
    }

    /// Smallest node containing the selection
    pub fn find_enclosing_node(&self, offset: u32, length: u32) -> Option<NodeRef> {
        self.enclosing(offset, length, false)
    }

    pub fn find_name(&self, offset: u32, length: u32) -> Option<NodeRef> {
        self.exact(offset, length, true)
    }

    pub fn find_enclosing_name(&self, offset: u32, length: u32) -> Option<NodeRef> {
        self.enclosing(offset, length, true)
    }

    /// Implicit name spanning exactly the selection
    pub fn find_implicit_name(&self, offset: u32, length: u32) -> Option<ImplicitName> {
        let selection = self.selection(offset, length);
        self.resolver
            .all_implicit_names()
            .into_iter()
            .filter(|name| name.span == selection)
            .min_by_key(|name| (name.owner, name.alternate))
    }
}
