//! AST traversal.
//!
//! A visitor declares which node categories it wants through [`VisitFlags`];
//! [`walk`] dispatches on the node's category and calls the matching method.
//! Categories that are not requested are walked through silently, except
//! attribute subtrees, which are skipped entirely unless
//! [`VisitFlags::ATTRIBUTES`] is set.

use crate::ast::{Ast, ImplicitName, NodeCategory, NodeRef};

bitflags::bitflags! {
    /// Node categories a visitor wants to see
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct VisitFlags: u32 {
        const TRANSLATION_UNIT = 1 << 0;
        const NAMES = 1 << 1;
        const DECLARATIONS = 1 << 2;
        const DECL_SPECIFIERS = 1 << 3;
        const DECLARATORS = 1 << 4;
        const STATEMENTS = 1 << 5;
        const EXPRESSIONS = 1 << 6;
        const INITIALIZERS = 1 << 7;
        const ATTRIBUTES = 1 << 8;
        const TYPE_IDS = 1 << 9;
        const PARAMETERS = 1 << 10;
        const ENUMERATORS = 1 << 11;
        const TEMPLATE_PARAMETERS = 1 << 12;
        const BASE_SPECIFIERS = 1 << 13;
        const CTOR_INITIALIZERS = 1 << 14;
        const PROBLEMS = 1 << 15;
        const IMPLICIT_NAMES = 1 << 16;
    }
}

/// What the walker does after a callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitAction {
    Continue,
    /// Do not descend into the node's children
    Skip,
    /// Stop the whole traversal
    Abort,
}

/// Supplies implicit names for a node, normally the binding resolver
pub trait ImplicitNameSource {
    fn implicit_names_of(&self, ast: &Ast, node: NodeRef) -> Vec<ImplicitName>;
}

pub trait AstVisitor {
    fn flags(&self) -> VisitFlags;

    fn visit_translation_unit(&mut self, _ast: &Ast, _node: NodeRef) -> VisitAction {
        VisitAction::Continue
    }
    fn visit_name(&mut self, _ast: &Ast, _node: NodeRef) -> VisitAction {
        VisitAction::Continue
    }
    fn visit_declaration(&mut self, _ast: &Ast, _node: NodeRef) -> VisitAction {
        VisitAction::Continue
    }
    fn visit_decl_specifier(&mut self, _ast: &Ast, _node: NodeRef) -> VisitAction {
        VisitAction::Continue
    }
    /// Declarators and their pointer operators, array modifiers and exception specifications
    fn visit_declarator(&mut self, _ast: &Ast, _node: NodeRef) -> VisitAction {
        VisitAction::Continue
    }
    fn visit_statement(&mut self, _ast: &Ast, _node: NodeRef) -> VisitAction {
        VisitAction::Continue
    }
    fn visit_expression(&mut self, _ast: &Ast, _node: NodeRef) -> VisitAction {
        VisitAction::Continue
    }
    fn visit_initializer(&mut self, _ast: &Ast, _node: NodeRef) -> VisitAction {
        VisitAction::Continue
    }
    fn visit_attribute(&mut self, _ast: &Ast, _node: NodeRef) -> VisitAction {
        VisitAction::Continue
    }
    fn visit_type_id(&mut self, _ast: &Ast, _node: NodeRef) -> VisitAction {
        VisitAction::Continue
    }
    fn visit_parameter(&mut self, _ast: &Ast, _node: NodeRef) -> VisitAction {
        VisitAction::Continue
    }
    fn visit_enumerator(&mut self, _ast: &Ast, _node: NodeRef) -> VisitAction {
        VisitAction::Continue
    }
    fn visit_template_parameter(&mut self, _ast: &Ast, _node: NodeRef) -> VisitAction {
        VisitAction::Continue
    }
    fn visit_base_specifier(&mut self, _ast: &Ast, _node: NodeRef) -> VisitAction {
        VisitAction::Continue
    }
    fn visit_ctor_initializer(&mut self, _ast: &Ast, _node: NodeRef) -> VisitAction {
        VisitAction::Continue
    }
    /// Problem nodes, in addition to the category callback
    fn visit_problem(&mut self, _ast: &Ast, _node: NodeRef) -> VisitAction {
        VisitAction::Continue
    }
    fn visit_implicit_name(&mut self, _ast: &Ast, _name: &ImplicitName) -> VisitAction {
        VisitAction::Continue
    }

    /// Called after the children of a visited node
    fn leave(&mut self, _ast: &Ast, _node: NodeRef) {}
}

fn category_flag(category: NodeCategory) -> VisitFlags {
    match category {
        NodeCategory::TranslationUnit => VisitFlags::TRANSLATION_UNIT,
        NodeCategory::Name => VisitFlags::NAMES,
        NodeCategory::DeclSpecifier => VisitFlags::DECL_SPECIFIERS,
        NodeCategory::Declarator
        | NodeCategory::PointerOperator
        | NodeCategory::ArrayModifier
        | NodeCategory::ExceptionSpecification => VisitFlags::DECLARATORS,
        NodeCategory::Parameter => VisitFlags::PARAMETERS,
        NodeCategory::TypeId => VisitFlags::TYPE_IDS,
        NodeCategory::Initializer | NodeCategory::Designator => VisitFlags::INITIALIZERS,
        NodeCategory::Declaration => VisitFlags::DECLARATIONS,
        NodeCategory::BaseSpecifier => VisitFlags::BASE_SPECIFIERS,
        NodeCategory::Enumerator => VisitFlags::ENUMERATORS,
        NodeCategory::TemplateParameter => VisitFlags::TEMPLATE_PARAMETERS,
        NodeCategory::CtorInitializer => VisitFlags::CTOR_INITIALIZERS,
        NodeCategory::Statement | NodeCategory::CatchHandler => VisitFlags::STATEMENTS,
        NodeCategory::Expression | NodeCategory::Capture => VisitFlags::EXPRESSIONS,
        NodeCategory::Attribute => VisitFlags::ATTRIBUTES,
    }
}

fn dispatch(visitor: &mut dyn AstVisitor, ast: &Ast, node: NodeRef, category: NodeCategory) -> VisitAction {
    match category {
        NodeCategory::TranslationUnit => visitor.visit_translation_unit(ast, node),
        NodeCategory::Name => visitor.visit_name(ast, node),
        NodeCategory::DeclSpecifier => visitor.visit_decl_specifier(ast, node),
        NodeCategory::Declarator
        | NodeCategory::PointerOperator
        | NodeCategory::ArrayModifier
        | NodeCategory::ExceptionSpecification => visitor.visit_declarator(ast, node),
        NodeCategory::Parameter => visitor.visit_parameter(ast, node),
        NodeCategory::TypeId => visitor.visit_type_id(ast, node),
        NodeCategory::Initializer | NodeCategory::Designator => visitor.visit_initializer(ast, node),
        NodeCategory::Declaration => visitor.visit_declaration(ast, node),
        NodeCategory::BaseSpecifier => visitor.visit_base_specifier(ast, node),
        NodeCategory::Enumerator => visitor.visit_enumerator(ast, node),
        NodeCategory::TemplateParameter => visitor.visit_template_parameter(ast, node),
        NodeCategory::CtorInitializer => visitor.visit_ctor_initializer(ast, node),
        NodeCategory::Statement | NodeCategory::CatchHandler => visitor.visit_statement(ast, node),
        NodeCategory::Expression | NodeCategory::Capture => visitor.visit_expression(ast, node),
        NodeCategory::Attribute => visitor.visit_attribute(ast, node),
    }
}

/// Depth-first traversal of the subtree at `root`.
///
/// Returns `false` when a callback aborted the walk.
pub fn walk(
    ast: &Ast,
    root: NodeRef,
    visitor: &mut dyn AstVisitor,
    implicit_names: Option<&dyn ImplicitNameSource>,
) -> bool {
    walk_node(ast, root, visitor, implicit_names) != VisitAction::Abort
}

fn walk_node(
    ast: &Ast,
    node: NodeRef,
    visitor: &mut dyn AstVisitor,
    implicit_names: Option<&dyn ImplicitNameSource>,
) -> VisitAction {
    let Some(data) = ast.node(node) else {
        return VisitAction::Continue;
    };
    let flags = visitor.flags();
    let category = data.kind.category();
    let flag = category_flag(category);

    if category == NodeCategory::Attribute && !flags.contains(VisitFlags::ATTRIBUTES) {
        return VisitAction::Continue;
    }

    let visited = flags.contains(flag);
    if visited {
        match dispatch(visitor, ast, node, category) {
            VisitAction::Abort => return VisitAction::Abort,
            VisitAction::Skip => return VisitAction::Continue,
            VisitAction::Continue => {}
        }
    }
    if data.kind.is_problem() && flags.contains(VisitFlags::PROBLEMS) {
        match visitor.visit_problem(ast, node) {
            VisitAction::Abort => return VisitAction::Abort,
            VisitAction::Skip => return VisitAction::Continue,
            VisitAction::Continue => {}
        }
    }
    if flags.contains(VisitFlags::IMPLICIT_NAMES)
        && let Some(source) = implicit_names
    {
        for name in source.implicit_names_of(ast, node) {
            if visitor.visit_implicit_name(ast, &name) == VisitAction::Abort {
                return VisitAction::Abort;
            }
        }
    }

    for child in ast.children(node) {
        if walk_node(ast, child, visitor, implicit_names) == VisitAction::Abort {
            return VisitAction::Abort;
        }
    }
    if visited {
        visitor.leave(ast, node);
    }
    VisitAction::Continue
}

/// Collects every name node of a subtree
#[derive(Debug, Default)]
pub struct NameCollector {
    pub names: Vec<NodeRef>,
    pub include_attributes: bool,
}

impl NameCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collect(ast: &Ast, root: NodeRef) -> Vec<NodeRef> {
        let mut collector = NameCollector::new();
        walk(ast, root, &mut collector, None);
        collector.names
    }
}

impl AstVisitor for NameCollector {
    fn flags(&self) -> VisitFlags {
        if self.include_attributes {
            VisitFlags::NAMES | VisitFlags::ATTRIBUTES
        } else {
            VisitFlags::NAMES
        }
    }

    fn visit_name(&mut self, _ast: &Ast, node: NodeRef) -> VisitAction {
        self.names.push(node);
        VisitAction::Continue
    }
}
