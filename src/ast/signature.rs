//! Textual signatures of AST nodes.
//!
//! Signatures are rebuilt from the parser tokens a node covers, so they are
//! independent of the original whitespace and of macro spelling. All
//! functions are pure.

use crate::ast::{
    Ast, BasicType, DeclSpecInfo, DeclaratorData, DeclaratorSuffix, NodeKind, NodeRef, StorageClass,
    TokenRange, TypeModifiers, TypeQualifiers,
};
use crate::lexer::{Token, TokenKind};

fn needs_space(prev: &TokenKind, current: &TokenKind) -> bool {
    if prev.is_word() && current.is_word() {
        return true;
    }
    if matches!(prev, TokenKind::Comma) {
        return true;
    }
    matches!(current, TokenKind::Star | TokenKind::And | TokenKind::LogicAnd)
        && (prev.is_word() || matches!(prev, TokenKind::RightParen))
}

/// Render tokens with canonical spacing
pub fn token_signature(tokens: &[Token]) -> String {
    render(tokens.iter())
}

fn render<'a>(tokens: impl Iterator<Item = &'a Token>) -> String {
    let mut text = String::new();
    let mut prev: Option<TokenKind> = None;
    for token in tokens {
        if token.kind == TokenKind::EndOfFile {
            continue;
        }
        if let Some(p) = &prev {
            if needs_space(p, &token.kind) {
                text.push(' ');
            }
        }
        text.push_str(token.kind.spelling());
        prev = Some(token.kind);
    }
    text
}

fn tokens_of<'t>(tokens: &'t [Token], range: TokenRange) -> &'t [Token] {
    let r = range.as_range();
    tokens.get(r).unwrap_or(&[])
}

/// Tokens of `range` minus the excluded sub-ranges
fn render_excluding(tokens: &[Token], range: TokenRange, excluded: &[TokenRange]) -> String {
    let iter = range
        .as_range()
        .filter(|i| !excluded.iter().any(|e| e.as_range().contains(i)))
        .filter_map(|i| tokens.get(i));
    render(iter)
}

/// Signature of any node: its tokens with canonical spacing
pub fn node_signature(ast: &Ast, tokens: &[Token], node: NodeRef) -> String {
    match ast.node(node) {
        Some(n) => token_signature(tokens_of(tokens, n.tokens)),
        None => String::new(),
    }
}

fn qualifier_words(qualifiers: TypeQualifiers, words: &mut Vec<&'static str>) {
    if qualifiers.contains(TypeQualifiers::CONST) {
        words.push("const");
    }
    if qualifiers.contains(TypeQualifiers::VOLATILE) {
        words.push("volatile");
    }
    if qualifiers.contains(TypeQualifiers::RESTRICT) {
        words.push("restrict");
    }
    if qualifiers.contains(TypeQualifiers::ATOMIC) {
        words.push("_Atomic");
    }
}

fn basic_type_words(basic: BasicType, modifiers: TypeModifiers, words: &mut Vec<&'static str>) {
    if modifiers.contains(TypeModifiers::SIGNED) {
        words.push("signed");
    }
    if modifiers.contains(TypeModifiers::UNSIGNED) {
        words.push("unsigned");
    }
    if modifiers.contains(TypeModifiers::SHORT) {
        words.push("short");
    }
    if modifiers.contains(TypeModifiers::LONG) {
        words.push("long");
    }
    if modifiers.contains(TypeModifiers::LONG_LONG) {
        words.push("long long");
    }
    if modifiers.contains(TypeModifiers::COMPLEX) {
        words.push("_Complex");
    }
    let word = match basic {
        BasicType::Unspecified => {
            if modifiers.is_empty() {
                "int"
            } else {
                return;
            }
        }
        BasicType::Void => "void",
        BasicType::Char => "char",
        BasicType::Char16 => "char16_t",
        BasicType::Char32 => "char32_t",
        BasicType::WChar => "wchar_t",
        BasicType::Int => "int",
        BasicType::Int128 => "__int128",
        BasicType::Float => "float",
        BasicType::Double => "double",
        BasicType::Bool => "bool",
        BasicType::Auto => "auto",
        BasicType::Typeof => "typeof",
        BasicType::Decltype => "decltype",
    };
    words.push(word);
}

/// Spelling of a basic type with its modifiers, e.g. `unsigned long int`
pub(crate) fn basic_type_name(basic: BasicType, modifiers: TypeModifiers) -> String {
    let mut words = Vec::new();
    basic_type_words(basic, modifiers, &mut words);
    words.join(" ")
}

pub(crate) fn qualifier_names(qualifiers: TypeQualifiers) -> String {
    let mut words = Vec::new();
    qualifier_words(qualifiers, &mut words);
    words.join(" ")
}

fn storage_word(storage: StorageClass) -> Option<&'static str> {
    match storage {
        StorageClass::None => None,
        StorageClass::Typedef => Some("typedef"),
        StorageClass::Extern => Some("extern"),
        StorageClass::Static => Some("static"),
        StorageClass::Auto => Some("auto"),
        StorageClass::Register => Some("register"),
        StorageClass::Mutable => Some("mutable"),
    }
}

/// Structural rendering of a declaration specifier.
///
/// With `with_storage == false` the storage class is left out, which is the
/// form used for type comparisons.
pub fn decl_specifier_signature(ast: &Ast, tokens: &[Token], spec: NodeRef, with_storage: bool) -> String {
    let kind = ast.get_kind(spec);
    let Some(DeclSpecInfo {
        storage, qualifiers, ..
    }) = kind.decl_spec_info()
    else {
        return node_signature(ast, tokens, spec);
    };
    let mut words: Vec<&'static str> = Vec::new();
    if with_storage {
        words.extend(storage_word(storage));
    }
    qualifier_words(qualifiers, &mut words);
    let mut text = words.join(" ");
    let mut push = |part: &str| {
        if !text.is_empty() && !part.is_empty() {
            text.push(' ');
        }
        text.push_str(part);
    };
    match kind {
        NodeKind::SimpleDeclSpecifier {
            basic,
            modifiers,
            type_expr,
            ..
        } => {
            let mut type_words = Vec::new();
            basic_type_words(*basic, *modifiers, &mut type_words);
            push(&type_words.join(" "));
            if let Some(expr) = type_expr {
                let operand = node_signature(ast, tokens, *expr);
                text.push_str(&format!("({operand})"));
            }
        }
        NodeKind::NamedTypeSpecifier { name, .. } => push(&node_signature(ast, tokens, *name)),
        NodeKind::ElaboratedTypeSpecifier { key, name, .. } => {
            push(key.keyword());
            push(&node_signature(ast, tokens, *name));
        }
        NodeKind::CompositeTypeSpecifier { key, name, .. } => {
            push(key.keyword());
            if let Some(name) = name {
                push(&node_signature(ast, tokens, *name));
            }
        }
        NodeKind::EnumerationSpecifier { name, .. } => {
            push("enum");
            if let Some(name) = name {
                push(&node_signature(ast, tokens, *name));
            }
        }
        _ => {}
    }
    text
}

/// Name node a declarator declares, looking through nested declarators
pub fn declarator_name(ast: &Ast, declarator: NodeRef) -> Option<NodeRef> {
    let mut current = declarator;
    loop {
        match ast.get_kind(current) {
            NodeKind::Declarator(DeclaratorData { name: Some(name), .. }) => return Some(*name),
            NodeKind::Declarator(DeclaratorData { nested: Some(nested), .. }) => current = *nested,
            _ => return None,
        }
    }
}

/// Innermost declarator carrying a function suffix, if any
pub fn function_declarator(ast: &Ast, declarator: NodeRef) -> Option<NodeRef> {
    let mut current = declarator;
    let mut found = None;
    loop {
        match ast.get_kind(current) {
            NodeKind::Declarator(data) => {
                if matches!(
                    data.suffix,
                    DeclaratorSuffix::Function(_) | DeclaratorSuffix::KnRFunction { .. }
                ) {
                    found = Some(current);
                }
                match data.nested {
                    Some(nested) => current = nested,
                    None => return found,
                }
            }
            _ => return found,
        }
    }
}

/// Whether the entity a declarator declares is a function, as opposed to a
/// pointer to a function or an array of them.
pub fn declares_function(ast: &Ast, declarator: NodeRef) -> bool {
    let mut layers = Vec::new();
    let mut current = Some(declarator);
    while let Some(node) = current {
        let NodeKind::Declarator(data) = ast.get_kind(node) else {
            break;
        };
        layers.push(data);
        current = data.nested;
    }
    // the suffix binds tighter than the pointer operators of the same layer
    for data in layers.iter().rev() {
        match data.suffix {
            DeclaratorSuffix::Function(_) | DeclaratorSuffix::KnRFunction { .. } => return true,
            DeclaratorSuffix::Array(_) => return false,
            _ => {}
        }
        if !data.pointer_ops.is_empty() {
            return false;
        }
    }
    false
}

/// Declarator text without the declared name and the initializer
pub fn abstract_declarator_signature(ast: &Ast, tokens: &[Token], declarator: NodeRef) -> String {
    let Some(node) = ast.node(declarator) else {
        return String::new();
    };
    let mut excluded = Vec::new();
    if let Some(name) = declarator_name(ast, declarator) {
        excluded.push(ast.get_tokens(name));
    }
    if let NodeKind::Declarator(DeclaratorData {
        initializer: Some(init),
        ..
    }) = &node.kind
    {
        // the `=` of an equals initializer belongs to the initializer node
        excluded.push(ast.get_tokens(*init));
    }
    excluded.extend(ast.attributes(declarator).iter().map(|a| ast.get_tokens(*a)));
    render_excluding(tokens, node.tokens, &excluded)
}

/// `decl-specifier abstract-declarator` of a parameter or type-id
pub fn type_signature(ast: &Ast, tokens: &[Token], decl_specifier: NodeRef, declarator: NodeRef) -> String {
    let is_plain = match ast.get_kind(declarator) {
        NodeKind::Declarator(data) => {
            data.pointer_ops.is_empty() && data.nested.is_none() && data.suffix == DeclaratorSuffix::Plain
        }
        _ => true,
    };
    let mut spec = decl_specifier_signature(ast, tokens, decl_specifier, false);
    if is_plain {
        // top-level qualifiers do not take part in the parameter type
        for q in ["const ", "volatile "] {
            if let Some(rest) = spec.strip_prefix(q) {
                spec = rest.to_string();
            }
        }
    }
    let declarator = abstract_declarator_signature(ast, tokens, declarator);
    match declarator.chars().next() {
        None => spec,
        Some('(') | Some('[') => format!("{spec}{declarator}"),
        Some(_) => format!("{spec} {declarator}"),
    }
}

/// Key identifying a function's parameter types, used to merge redeclarations
/// and to tell overloads apart. `None` when `declarator` is not a function.
pub fn parameter_types_key(ast: &Ast, tokens: &[Token], declarator: NodeRef) -> Option<String> {
    let function = function_declarator(ast, declarator)?;
    let NodeKind::Declarator(data) = ast.get_kind(function) else {
        return None;
    };
    match &data.suffix {
        DeclaratorSuffix::Function(suffix) => {
            let mut parts: Vec<String> = suffix
                .parameters
                .iter()
                .filter_map(|p| match ast.get_kind(*p) {
                    NodeKind::ParameterDeclaration {
                        decl_specifier,
                        declarator,
                    } => Some(type_signature(ast, tokens, *decl_specifier, *declarator)),
                    _ => None,
                })
                .collect();
            if parts.len() == 1 && parts[0] == "void" {
                parts.clear();
            }
            if suffix.varargs {
                parts.push("...".to_string());
            }
            let mut key = format!("({})", parts.join(", "));
            let mut quals = Vec::new();
            qualifier_words(suffix.qualifiers, &mut quals);
            for q in quals {
                key.push(' ');
                key.push_str(q);
            }
            Some(key)
        }
        DeclaratorSuffix::KnRFunction { parameter_names, .. } => {
            Some(format!("({})", vec!["int"; parameter_names.len()].join(", ")))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source_manager::SourceSpan;
    use symbol_table::GlobalSymbol as Symbol;

    fn token(kind: TokenKind) -> Token {
        Token {
            kind,
            span: SourceSpan::empty(),
            expansion: None,
            expansion_index: 0,
            flags: Default::default(),
        }
    }

    #[test]
    fn spacing_rules() {
        let tokens: Vec<_> = [
            TokenKind::Const,
            TokenKind::Char,
            TokenKind::Star,
            TokenKind::LeftParen,
            TokenKind::Star,
            TokenKind::RightParen,
            TokenKind::LeftParen,
            TokenKind::Int,
            TokenKind::Comma,
            TokenKind::Identifier(Symbol::from("T")),
            TokenKind::And,
            TokenKind::RightParen,
        ]
        .into_iter()
        .map(token)
        .collect();
        assert_eq!(token_signature(&tokens), "const char *(*)(int, T &)");
    }
}
