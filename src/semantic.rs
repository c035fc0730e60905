//! Name binding for C and C++.
//!
//! Resolution runs in two phases:
//! - [`scope_builder`] walks the frozen tree once and records every
//!   declaration, scope and using-directive in a [`SymbolTable`]
//! - [`BindingResolver`] answers queries lazily: the first query of a name
//!   performs the lookup and memoizes the result
//!
//! Names that cannot be bound resolve to a problem binding carrying a
//! [`ProblemKind`], never to nothing.

pub mod binding;
pub mod builtins;
pub mod implicit;
pub mod resolver;
pub mod scope_builder;
pub mod symbol_table;
pub mod types;
pub mod typing;

pub use binding::{Binding, BindingId, BindingKind, DefinitionState, FunctionKind, Linkage, ProblemKind};
pub use resolver::BindingResolver;
pub use symbol_table::{Lookup, Namespace, ScopeId, ScopeKind, SymbolTable};
pub use types::Type;

use crate::ast::signature::node_signature;
use crate::ast::{Ast, NodeKind, NodeRef, Symbol};
use crate::lexer::Token;

/// Bound on alias chains, base class walks and nested type lookups
pub(crate) const MAX_RESOLUTION_DEPTH: usize = 32;

/// The identifier a name node binds by: the last segment of a qualified
/// name, the template of a template-id, `operator+` for operator names.
pub(crate) fn name_symbol(ast: &Ast, tokens: &[Token], name: NodeRef) -> Option<Symbol> {
    match ast.get_kind(name) {
        NodeKind::Name(symbol) => Some(*symbol),
        NodeKind::OperatorName(op) => Some(Symbol::new(op.function_name().as_str())),
        NodeKind::ConversionName { type_id } => {
            let text = format!("operator {}", node_signature(ast, tokens, *type_id));
            Some(Symbol::new(text.as_str()))
        }
        NodeKind::TemplateId { template_name, .. } => name_symbol(ast, tokens, *template_name),
        NodeKind::QualifiedName { segments, .. } => segments.last().and_then(|s| name_symbol(ast, tokens, *s)),
        _ => None,
    }
}
