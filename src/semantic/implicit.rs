//! Implicit names: functions a construct invokes without naming them.
//!
//! Only C++ has them. A `new T(1)` expression names the constructor it calls
//! through the span of `T(1)`'s type, a class-typed object declaration
//! through its declarator name, and an overloaded operator through the
//! operator token. Call and subscript operators yield a pair of names, one
//! per bracket.

use crate::ast::signature::declarator_name;
use crate::ast::*;
use crate::source_manager::SourceSpan;

use super::binding::{BindingId, BindingKind, FunctionKind};
use super::resolver::BindingResolver;

impl BindingResolver {
    /// Implicit names owned by a node, in source order
    pub fn implicit_names(&self, node: NodeRef) -> Vec<ImplicitName> {
        if !self.lang().is_cpp() {
            return Vec::new();
        }
        if let Some(names) = self.implicit.borrow().get(&node) {
            return names.clone();
        }
        let names = self.compute_implicit_names(node);
        self.implicit.borrow_mut().entry(node).or_insert(names).clone()
    }

    /// Implicit names of every node in the tree
    pub fn all_implicit_names(&self) -> Vec<ImplicitName> {
        let Some(root) = self.ast().root() else {
            return Vec::new();
        };
        self.ast()
            .descendants(root)
            .into_iter()
            .flat_map(|n| self.implicit_names(n))
            .collect()
    }

    fn token_span(&self, index: u32) -> Option<SourceSpan> {
        self.tokens().get(index as usize).map(|t| t.span)
    }

    fn compute_implicit_names(&self, node: NodeRef) -> Vec<ImplicitName> {
        let ast = self.ast();
        let tokens = ast.get_tokens(node);
        let single = |binding: BindingId, span: Option<SourceSpan>| -> Vec<ImplicitName> {
            span.map(|span| ImplicitName {
                owner: node,
                span,
                binding,
                alternate: false,
            })
            .into_iter()
            .collect()
        };
        // opening and closing bracket of a call or subscript
        let pair = |binding: BindingId, open: u32| -> Vec<ImplicitName> {
            let close = tokens.end.saturating_sub(1);
            [(open, false), (close, true)]
                .into_iter()
                .filter_map(|(index, alternate)| {
                    self.token_span(index).map(|span| ImplicitName {
                        owner: node,
                        span,
                        binding,
                        alternate,
                    })
                })
                .collect()
        };

        match ast.get_kind(node) {
            NodeKind::New {
                type_id, initializer, ..
            } => {
                let Some(class) = self.type_id_type(*type_id).composite_binding() else {
                    return Vec::new();
                };
                let arguments = initializer.map_or(0, |i| self.initializer_argument_count(i));
                match self.constructor(class, arguments) {
                    Some(constructor) => single(constructor, Some(ast.get_span(*type_id))),
                    None => Vec::new(),
                }
            }
            NodeKind::Declarator(data) => {
                let Some(name) = declarator_name(ast, node) else {
                    return Vec::new();
                };
                if data.name != Some(name) || !data.pointer_ops.is_empty() || data.suffix != DeclaratorSuffix::Plain {
                    return Vec::new();
                }
                let binding = self.resolve_binding(name);
                if self.binding_kind(binding) != Some(BindingKind::Variable) || self.is_extern(node) {
                    return Vec::new();
                }
                let Some(class) = self.type_of(binding).composite_binding() else {
                    return Vec::new();
                };
                let arguments = data.initializer.map_or(0, |i| self.initializer_argument_count(i));
                match self.constructor(class, arguments) {
                    Some(constructor) => single(constructor, Some(ast.get_span(name))),
                    None => Vec::new(),
                }
            }
            NodeKind::Unary { op, .. } => match self.overloaded_operator(node) {
                Some(function) => {
                    let index = if op.is_postfix() {
                        tokens.end.saturating_sub(1)
                    } else {
                        tokens.start
                    };
                    single(function, self.token_span(index))
                }
                None => Vec::new(),
            },
            NodeKind::Binary { left, .. } => match self.overloaded_operator(node) {
                Some(function) => single(function, self.token_span(ast.get_tokens(*left).end)),
                None => Vec::new(),
            },
            NodeKind::FunctionCall { function, .. } => match self.overloaded_operator(node) {
                Some(operator) => pair(operator, ast.get_tokens(*function).end),
                None => Vec::new(),
            },
            NodeKind::ArraySubscript { array, .. } => match self.overloaded_operator(node) {
                Some(operator) => pair(operator, ast.get_tokens(*array).end),
                None => Vec::new(),
            },
            _ => Vec::new(),
        }
    }

    fn is_extern(&self, declarator: NodeRef) -> bool {
        let ast = self.ast();
        let Some(declaration) = ast.parent(declarator) else {
            return false;
        };
        match ast.get_kind(declaration) {
            NodeKind::SimpleDeclaration { decl_specifier, .. } => ast
                .get_kind(*decl_specifier)
                .decl_spec_info()
                .is_some_and(|i| i.storage == StorageClass::Extern),
            _ => false,
        }
    }

    /// Arguments an initializer passes to a constructor
    fn initializer_argument_count(&self, initializer: NodeRef) -> usize {
        match self.ast().get_kind(initializer) {
            NodeKind::ConstructorInitializer { arguments } => arguments.len(),
            NodeKind::InitializerList { clauses } => clauses.len(),
            NodeKind::EqualsInitializer { value } => match self.ast().get_kind(*value) {
                NodeKind::InitializerList { clauses } => clauses.len(),
                _ => 1,
            },
            _ => 0,
        }
    }

    /// Constructor of `class` callable with `arguments` arguments
    pub fn constructor(&self, class: BindingId, arguments: usize) -> Option<BindingId> {
        let name = self.binding_name(class)?;
        let constructors: Vec<BindingId> = self
            .members(class, name)
            .into_iter()
            .filter(|b| self.binding_kind(*b) == Some(BindingKind::Function(FunctionKind::Constructor)))
            .collect();
        constructors
            .iter()
            .copied()
            .find(|c| self.parameter_shape(*c).is_some_and(|shape| shape.accepts(arguments)))
    }
}
