//! AST Dumper module
//!
//! Indented one-node-per-line rendering, used for debugging and by snapshot
//! tests.

use std::fmt::Write;

use crate::ast::{Ast, DeclSpecInfo, DeclaratorSuffix, NodeKind, NodeRef, StorageClass};

/// Dumper for AST
pub struct AstDumper;

impl AstDumper {
    /// Dump the whole tree starting at the root
    pub fn dump(ast: &Ast) -> String {
        let mut out = String::new();
        if let Some(root) = ast.root() {
            Self::dump_node(ast, root, 0, &mut out);
        }
        out
    }

    /// Dump the subtree at `node`
    pub fn dump_subtree(ast: &Ast, node: NodeRef) -> String {
        let mut out = String::new();
        Self::dump_node(ast, node, 0, &mut out);
        out
    }

    fn dump_node(ast: &Ast, node: NodeRef, depth: usize, out: &mut String) {
        let Some(data) = ast.node(node) else {
            return;
        };
        let _ = write!(out, "{:indent$}{}", "", data.kind.name(), indent = depth * 2);
        let detail = Self::detail(&data.kind);
        if !detail.is_empty() {
            let _ = write!(out, " {detail}");
        }
        out.push('\n');
        for child in ast.children(node) {
            Self::dump_node(ast, child, depth + 1, out);
        }
    }

    fn spec_detail(info: &DeclSpecInfo) -> Vec<String> {
        let mut parts = Vec::new();
        if info.storage != StorageClass::None {
            parts.push(format!("{:?}", info.storage).to_lowercase());
        }
        if !info.qualifiers.is_empty() {
            parts.push(format!("{:?}", info.qualifiers));
        }
        if !info.specifiers.is_empty() {
            parts.push(format!("{:?}", info.specifiers));
        }
        parts
    }

    fn detail(kind: &NodeKind) -> String {
        match kind {
            NodeKind::Name(name) => format!("'{name}'"),
            NodeKind::OperatorName(op) => format!("'{}'", op.function_name()),
            NodeKind::QualifiedName { fully_qualified: true, .. } => "::".to_string(),
            NodeKind::Literal { kind, value } => format!("{kind:?} {value}"),
            NodeKind::Unary { op, .. } => format!("{op:?}"),
            NodeKind::Binary { op, .. } => format!("{op:?}"),
            NodeKind::Cast { op, .. } => format!("{op:?}"),
            NodeKind::TypeIdExpression { op, .. } => format!("{op:?}"),
            NodeKind::FieldReference { arrow: true, .. } => "->".to_string(),
            NodeKind::SimpleDeclSpecifier {
                info, basic, modifiers, ..
            } => {
                let mut parts = Self::spec_detail(info);
                if !modifiers.is_empty() {
                    parts.push(format!("{modifiers:?}"));
                }
                parts.push(format!("{basic:?}"));
                parts.join(" ")
            }
            NodeKind::NamedTypeSpecifier { info, .. }
            | NodeKind::EnumerationSpecifier { info, .. } => Self::spec_detail(info).join(" "),
            NodeKind::ElaboratedTypeSpecifier { info, key, .. }
            | NodeKind::CompositeTypeSpecifier { info, key, .. } => {
                let mut parts = Self::spec_detail(info);
                parts.push(key.keyword().to_string());
                parts.join(" ")
            }
            NodeKind::Declarator(data) => match &data.suffix {
                DeclaratorSuffix::Plain => String::new(),
                DeclaratorSuffix::Array(_) => "array".to_string(),
                DeclaratorSuffix::Function(f) if f.varargs => "function varargs".to_string(),
                DeclaratorSuffix::Function(_) => "function".to_string(),
                DeclaratorSuffix::KnRFunction { .. } => "k&r function".to_string(),
                DeclaratorSuffix::BitField(_) => "bitfield".to_string(),
            },
            NodeKind::Reference { rvalue: true } => "&&".to_string(),
            NodeKind::ProblemDeclaration(id) | NodeKind::ProblemStatement(id) | NodeKind::ProblemExpression(id) => {
                format!("{id:?}")
            }
            NodeKind::Attribute { name, scope, .. } => match scope {
                Some(scope) => format!("{scope}::{name}"),
                None => name.to_string(),
            },
            NodeKind::LinkageSpecification { linkage, .. } => linkage.to_string(),
            NodeKind::VisibilityLabel(v) => format!("{v:?}"),
            NodeKind::IfStatement { constexpr: true, .. } => "constexpr".to_string(),
            _ => String::new(),
        }
    }
}
