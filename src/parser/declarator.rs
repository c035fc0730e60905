//! Declarator parsing module
//!
//! This module handles the parsing of declarators, which are the most complex
//! part of the declaration syntax. Declarators can be nested and include
//! pointers, references, pointers to members, arrays and functions.
//!
//! The direct part of a declarator is either the declared name or a nested
//! declarator in parenthesis. A `(` that starts a parameter list instead of
//! a nested declarator is recognized by looking at the token that follows it.

use log::{debug, trace};
use thin_vec::ThinVec;

use crate::ast::signature::declares_function;
use crate::ast::*;
use crate::diagnostic::ParseError;
use crate::lexer::TokenKind;

use super::attributes::{at_cpp_attribute, parse_attribute_specifiers, parse_cpp_attributes};
use super::decl_specifier::{DeclSpecOptions, parse_decl_specifier};
use super::initializers::{parse_initializer_clause, parse_initializer_list};
use super::names::{parse_name, skip_angle_brackets};
use super::utils::expr_patterns::{parse_expr_list, parse_parenthesized_expr};
use super::{BindingPower, Parser};

/// What a declarator may or must contain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DeclaratorMode {
    /// Declares a name
    Named,
    /// Type-ids: no name
    Abstract,
    /// Parameters: the name is optional
    Either,
    /// `new T[n]`: pointer operators and array bounds only
    NewTypeId,
    /// Conversion function names: pointer operators only
    Conversion,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct DeclaratorOptions {
    pub(crate) mode: DeclaratorMode,
    /// Member declarators may be bit-fields
    pub(crate) member: bool,
    /// C++ `T x(args)` declares an object initialized by a constructor
    pub(crate) constructor_initializer: bool,
}

impl DeclaratorOptions {
    pub(crate) fn new(mode: DeclaratorMode) -> Self {
        DeclaratorOptions {
            mode,
            member: false,
            constructor_initializer: false,
        }
    }

    pub(crate) fn member(mut self) -> Self {
        self.member = true;
        self
    }

    pub(crate) fn with_constructor_initializer(mut self) -> Self {
        self.constructor_initializer = true;
        self
    }
}

/// Tokens after a `(` at `idx` begin a parameter list rather than a nested declarator
fn looks_like_parameter_list(parser: &Parser, idx: usize) -> bool {
    match parser.tokens.get(idx).map(|t| t.kind) {
        Some(TokenKind::RightParen) | Some(TokenKind::Ellipsis) => true,
        Some(TokenKind::LeftBracket) => {
            parser.is_cpp() && parser.tokens.get(idx + 1).is_some_and(|t| t.kind == TokenKind::LeftBracket)
        }
        Some(_) => parser.starts_declaration_at(idx),
        None => false,
    }
}

/// C identifier list of a pre-standard function declarator: `(a, b, c)`
fn looks_like_identifier_list(parser: &Parser, idx: usize) -> bool {
    let mut i = idx;
    loop {
        match parser.tokens.get(i).map(|t| t.kind) {
            Some(TokenKind::Identifier(symbol)) if !parser.type_context.is_type_name(symbol) => i += 1,
            _ => return false,
        }
        match parser.tokens.get(i).map(|t| t.kind) {
            Some(TokenKind::Comma) => i += 1,
            Some(TokenKind::RightParen) => return true,
            _ => return false,
        }
    }
}

/// `A::*` or `A<T>::B::*` at `idx`
fn is_pointer_to_member(parser: &Parser, idx: usize) -> bool {
    let kind_at = |i: usize| parser.tokens.get(i).map(|t| t.kind);
    let mut i = idx;
    if kind_at(i) == Some(TokenKind::ColonColon) {
        i += 1;
    }
    loop {
        let Some(TokenKind::Identifier(_)) = kind_at(i) else {
            return false;
        };
        i += 1;
        if kind_at(i) == Some(TokenKind::Less) {
            match skip_angle_brackets(parser, i) {
                Some(next) => i = next,
                None => return false,
            }
        }
        if kind_at(i) != Some(TokenKind::ColonColon) {
            return false;
        }
        i += 1;
        if kind_at(i) == Some(TokenKind::Star) {
            return true;
        }
    }
}

fn starts_declarator_id(parser: &Parser) -> bool {
    match parser.current_token_kind() {
        Some(TokenKind::Identifier(_)) => true,
        Some(TokenKind::ColonColon) | Some(TokenKind::Operator) => parser.is_cpp(),
        Some(TokenKind::Tilde) => {
            parser.is_cpp() && matches!(parser.peek_kind(0), Some(TokenKind::Identifier(_)))
        }
        _ => false,
    }
}

/// cv-qualifiers after `*` and after a function's parameter list
fn parse_cv_qualifiers(parser: &mut Parser) -> TypeQualifiers {
    let mut qualifiers = TypeQualifiers::empty();
    loop {
        let qualifier = match parser.current_token_kind() {
            Some(TokenKind::Const) => TypeQualifiers::CONST,
            Some(TokenKind::Volatile) => TypeQualifiers::VOLATILE,
            Some(TokenKind::Restrict) => TypeQualifiers::RESTRICT,
            Some(TokenKind::Atomic) => TypeQualifiers::ATOMIC,
            _ => return qualifiers,
        };
        parser.advance();
        qualifiers |= qualifier;
    }
}

/// `*`, `&`, `&&` and `A::*`, each with its qualifiers and attributes
fn parse_pointer_operators(parser: &mut Parser) -> Result<ThinVec<NodeRef>, ParseError> {
    let mut operators = ThinVec::new();
    loop {
        let start = parser.current_idx;
        let kind = match parser.current_token_kind() {
            Some(TokenKind::Star) => {
                parser.advance();
                NodeKind::Pointer {
                    qualifiers: TypeQualifiers::empty(),
                }
            }
            Some(TokenKind::And) if parser.is_cpp() => {
                parser.advance();
                NodeKind::Reference { rvalue: false }
            }
            Some(TokenKind::LogicAnd) if parser.is_cpp() => {
                parser.advance();
                NodeKind::Reference { rvalue: true }
            }
            Some(TokenKind::Identifier(_) | TokenKind::ColonColon)
                if parser.is_cpp() && is_pointer_to_member(parser, start) =>
            {
                let class_name = parse_name(parser)?;
                parser.expect(TokenKind::ColonColon)?;
                parser.expect(TokenKind::Star)?;
                NodeKind::PointerToMember {
                    class_name,
                    qualifiers: TypeQualifiers::empty(),
                }
            }
            _ => return Ok(operators),
        };
        let mut attributes = parse_attribute_specifiers(parser, false)?;
        let qualifiers = parse_cv_qualifiers(parser);
        attributes.extend(parse_attribute_specifiers(parser, false)?);
        let kind = match kind {
            NodeKind::Pointer { .. } => NodeKind::Pointer { qualifiers },
            NodeKind::PointerToMember { class_name, .. } => NodeKind::PointerToMember { class_name, qualifiers },
            other => other,
        };
        let node = parser.finish_node(kind, start)?;
        parser.attach_attributes(node, attributes)?;
        operators.push(node);
    }
}

/// `[ static const expr ]`, `[]`, `[*]`
fn parse_array_modifier(parser: &mut Parser) -> Result<NodeRef, ParseError> {
    let start = parser.current_idx;
    parser.expect(TokenKind::LeftBracket)?;
    let mut is_static = parser.accept(TokenKind::Static).is_some();
    let qualifiers = parse_cv_qualifiers(parser);
    if !is_static {
        is_static = parser.accept(TokenKind::Static).is_some();
    }
    let mut variable_length = false;
    let size = if parser.is_token(TokenKind::Star) && parser.peek_kind(0) == Some(TokenKind::RightBracket) {
        parser.advance();
        variable_length = true;
        None
    } else if parser.is_token(TokenKind::RightBracket) {
        None
    } else {
        let saved = std::mem::replace(&mut parser.greater_is_operator, true);
        let size = parser.parse_expr_assignment();
        parser.greater_is_operator = saved;
        Some(size?)
    };
    parser.expect(TokenKind::RightBracket)?;
    let node = parser.finish_node(
        NodeKind::ArrayModifier {
            size,
            qualifiers,
            is_static,
            variable_length,
        },
        start,
    )?;
    let attributes = parse_cpp_attributes(parser)?;
    parser.attach_attributes(node, attributes)?;
    Ok(node)
}

/// Parameter list and the C++ parts that follow it. The `(` is current.
fn parse_function_suffix(parser: &mut Parser) -> Result<FunctionSuffix, ParseError> {
    parser.expect(TokenKind::LeftParen)?;
    let saved = std::mem::replace(&mut parser.greater_is_operator, true);
    let parameters = parse_parameter_list(parser);
    parser.greater_is_operator = saved;
    let (parameters, varargs) = parameters?;
    parser.expect(TokenKind::RightParen)?;

    let mut suffix = FunctionSuffix {
        parameters,
        varargs,
        ..Default::default()
    };
    if !parser.is_cpp() {
        return Ok(suffix);
    }

    loop {
        match parser.current_token_kind() {
            Some(TokenKind::Const) => suffix.qualifiers |= TypeQualifiers::CONST,
            Some(TokenKind::Volatile) => suffix.qualifiers |= TypeQualifiers::VOLATILE,
            // lambda specifiers
            Some(TokenKind::Mutable | TokenKind::Constexpr) => {}
            _ => break,
        }
        parser.advance();
    }
    if parser.accept(TokenKind::And).is_some() {
        suffix.ref_qualifier = RefQualifier::LValue;
    } else if parser.accept(TokenKind::LogicAnd).is_some() {
        suffix.ref_qualifier = RefQualifier::RValue;
    }

    let start = parser.current_idx;
    if parser.accept(TokenKind::Noexcept).is_some() {
        let expression = if parser.is_token(TokenKind::LeftParen) {
            Some(parse_parenthesized_expr(parser)?)
        } else {
            None
        };
        suffix.exception = Some(parser.finish_node(NodeKind::NoexceptSpecification { expression }, start)?);
    } else if parser.accept(TokenKind::Throw).is_some() {
        parser.expect(TokenKind::LeftParen)?;
        let mut types = ThinVec::new();
        while !parser.is_token(TokenKind::RightParen) {
            if parser.accept(TokenKind::Ellipsis).is_some() {
                continue;
            }
            types.push(parse_type_id(parser)?);
            if parser.accept(TokenKind::Comma).is_none() {
                break;
            }
        }
        parser.expect(TokenKind::RightParen)?;
        suffix.exception = Some(parser.finish_node(NodeKind::ThrowSpecification { types }, start)?);
    }

    if parser.accept(TokenKind::Arrow).is_some() {
        suffix.trailing_return = Some(parse_type_id(parser)?);
    }
    // virt-specifiers
    while let Some(TokenKind::Identifier(symbol)) = parser.current_token_kind()
        && matches!(symbol.as_str(), "override" | "final")
    {
        parser.advance();
    }
    Ok(suffix)
}

fn parse_parameter_list(parser: &mut Parser) -> Result<(ThinVec<NodeRef>, bool), ParseError> {
    let mut parameters = ThinVec::new();
    loop {
        if parser.is_token(TokenKind::RightParen) {
            return Ok((parameters, false));
        }
        if parser.accept(TokenKind::Ellipsis).is_some() {
            return Ok((parameters, true));
        }
        parameters.push(parse_parameter_declaration(parser)?);
        if parser.is_cpp() && parser.accept(TokenKind::Ellipsis).is_some() {
            return Ok((parameters, true));
        }
        if parser.accept(TokenKind::Comma).is_none() {
            return Ok((parameters, false));
        }
    }
}

/// One parameter: `decl-specifier declarator [= default]`
pub(crate) fn parse_parameter_declaration(parser: &mut Parser) -> Result<NodeRef, ParseError> {
    let start = parser.current_idx;
    let attributes = parse_cpp_attributes(parser)?;
    let decl_specifier = parse_decl_specifier(parser, DeclSpecOptions::parameter())?;
    let declarator = parse_declarator(parser, DeclaratorOptions::new(DeclaratorMode::Either))?;
    if parser.is_cpp() && parser.is_token(TokenKind::Assign) {
        let init_start = parser.current_idx;
        parser.advance();
        let value = parse_initializer_clause(parser)?;
        let initializer = parser.finish_node(NodeKind::EqualsInitializer { value }, init_start)?;
        set_initializer(parser, declarator, initializer)?;
    }
    let node = parser.finish_node(
        NodeKind::ParameterDeclaration {
            decl_specifier,
            declarator,
        },
        start,
    )?;
    parser.attach_attributes(node, attributes)?;
    Ok(node)
}

/// `(a, b)` of a pre-standard function definition
fn parse_identifier_list(parser: &mut Parser) -> Result<ThinVec<NodeRef>, ParseError> {
    parser.expect(TokenKind::LeftParen)?;
    let mut names = ThinVec::new();
    loop {
        let (symbol, _) = parser.expect_name()?;
        names.push(parser.name_node(symbol, parser.current_idx - 1)?);
        if parser.accept(TokenKind::Comma).is_none() {
            break;
        }
    }
    parser.expect(TokenKind::RightParen)?;
    Ok(names)
}

/// GNU attributes and an `asm("label")` after a declarator
fn parse_trailing_gnu_parts(parser: &mut Parser, attributes: &mut ThinVec<NodeRef>) -> Result<(), ParseError> {
    loop {
        if parser.is_token(TokenKind::Asm) {
            let start = parser.current_idx;
            parser.advance();
            parser.expect(TokenKind::LeftParen)?;
            let text_start = parser.current_idx;
            while !parser.is_token(TokenKind::RightParen) && parser.advance().is_some() {}
            let text = crate::ast::signature::token_signature(&parser.tokens[text_start..parser.current_idx]);
            parser.expect(TokenKind::RightParen)?;
            let attribute = parser.finish_node(
                NodeKind::Attribute {
                    name: Symbol::new("asm"),
                    scope: None,
                    arguments: Some(Symbol::new(text)),
                },
                start,
            )?;
            let mut list = ThinVec::new();
            list.push(attribute);
            attributes.push(parser.finish_node(
                NodeKind::AttributeSpecifier {
                    attributes: list,
                    gnu: true,
                },
                start,
            )?);
        } else if parser.is_token(TokenKind::Attribute) {
            attributes.extend(parse_attribute_specifiers(parser, false)?);
        } else {
            return Ok(());
        }
    }
}

/// Parse a declarator
pub(crate) fn parse_declarator(parser: &mut Parser, options: DeclaratorOptions) -> Result<NodeRef, ParseError> {
    let start = parser.current_idx;
    let mode = options.mode;
    let mut attributes = parse_attribute_specifiers(parser, false)?;
    let mut data = DeclaratorData {
        pointer_ops: parse_pointer_operators(parser)?,
        ..Default::default()
    };

    if !matches!(mode, DeclaratorMode::NewTypeId | DeclaratorMode::Conversion) {
        let nested = parser.is_token(TokenKind::LeftParen)
            && (mode == DeclaratorMode::Named || !looks_like_parameter_list(parser, parser.current_idx + 1));
        if nested {
            parser.advance();
            let inner = DeclaratorOptions::new(mode);
            data.nested = Some(parse_declarator(parser, inner)?);
            parser.expect(TokenKind::RightParen)?;
        } else if mode != DeclaratorMode::Abstract && starts_declarator_id(parser) {
            data.name = Some(parse_name(parser)?);
            attributes.extend(parse_cpp_attributes(parser)?);
        } else if mode == DeclaratorMode::Named && !(options.member && parser.is_token(TokenKind::Colon)) {
            return Err(parser.unexpected("declarator"));
        }
    }

    loop {
        match parser.current_token_kind() {
            Some(TokenKind::LeftBracket) if mode != DeclaratorMode::Conversion && !at_cpp_attribute(parser) => {
                let mut modifiers = match std::mem::take(&mut data.suffix) {
                    DeclaratorSuffix::Array(modifiers) => modifiers,
                    DeclaratorSuffix::Plain => ThinVec::new(),
                    other => {
                        data.suffix = other;
                        break;
                    }
                };
                modifiers.push(parse_array_modifier(parser)?);
                data.suffix = DeclaratorSuffix::Array(modifiers);
            }
            Some(TokenKind::LeftParen)
                if data.suffix == DeclaratorSuffix::Plain
                    && !matches!(mode, DeclaratorMode::NewTypeId | DeclaratorMode::Conversion) =>
            {
                let next = parser.current_idx + 1;
                if options.constructor_initializer
                    && parser.is_cpp()
                    && data.name.is_some()
                    && !looks_like_parameter_list(parser, next)
                {
                    trace!("parse_declarator: constructor initializer follows");
                    break;
                }
                if !parser.is_cpp() && looks_like_identifier_list(parser, next) {
                    debug!("parse_declarator: identifier list of a k&r function");
                    let parameter_names = parse_identifier_list(parser)?;
                    data.suffix = DeclaratorSuffix::KnRFunction {
                        parameter_names,
                        parameter_declarations: ThinVec::new(),
                    };
                } else {
                    data.suffix = DeclaratorSuffix::Function(parse_function_suffix(parser)?);
                }
            }
            Some(TokenKind::Colon) if options.member && data.suffix == DeclaratorSuffix::Plain => {
                parser.advance();
                let width = parser.parse_expr_conditional()?;
                data.suffix = DeclaratorSuffix::BitField(width);
                break;
            }
            _ => break,
        }
    }

    if mode != DeclaratorMode::Conversion {
        parse_trailing_gnu_parts(parser, &mut attributes)?;
    }

    let node = parser.finish_node(NodeKind::Declarator(data), start)?;
    parser.attach_attributes(node, attributes)?;
    Ok(node)
}

fn set_initializer(parser: &mut Parser, declarator: NodeRef, initializer: NodeRef) -> Result<(), ParseError> {
    if let NodeKind::Declarator(data) = parser.kind_mut(declarator)? {
        data.initializer = Some(initializer);
    }
    let start = parser.node_start(declarator);
    parser.extend_node(declarator, start)
}

/// Parse a declarator followed by its initializer, if any. The declarator
/// node is stretched to cover the initializer.
pub(crate) fn parse_init_declarator(parser: &mut Parser, options: DeclaratorOptions) -> Result<NodeRef, ParseError> {
    let declarator = parse_declarator(parser, options)?;
    parse_declarator_initializer(parser, declarator)?;
    Ok(declarator)
}

/// Initializer of an already parsed declarator; functions take none
pub(crate) fn parse_declarator_initializer(parser: &mut Parser, declarator: NodeRef) -> Result<NodeRef, ParseError> {
    if declares_function(parser.ast, declarator) {
        return Ok(declarator);
    }
    let init_start = parser.current_idx;
    let initializer = match parser.current_token_kind() {
        Some(TokenKind::Assign) => {
            parser.advance();
            let value = parse_initializer_clause(parser)?;
            parser.finish_node(NodeKind::EqualsInitializer { value }, init_start)?
        }
        Some(TokenKind::LeftParen) if parser.is_cpp() => {
            parser.advance();
            let arguments = parse_expr_list(parser, BindingPower::ASSIGNMENT, TokenKind::RightParen)?;
            parser.expect(TokenKind::RightParen)?;
            parser.finish_node(NodeKind::ConstructorInitializer { arguments }, init_start)?
        }
        Some(TokenKind::LeftBrace) if parser.is_cpp() => parse_initializer_list(parser)?,
        _ => return Ok(declarator),
    };
    set_initializer(parser, declarator, initializer)?;
    Ok(declarator)
}

/// Parse a type-id: specifiers and an abstract declarator
pub(crate) fn parse_type_id(parser: &mut Parser) -> Result<NodeRef, ParseError> {
    parse_type_id_with(parser, DeclaratorMode::Abstract)
}

pub(crate) fn parse_type_id_with(parser: &mut Parser, mode: DeclaratorMode) -> Result<NodeRef, ParseError> {
    let start = parser.current_idx;
    let decl_specifier = parse_decl_specifier(parser, DeclSpecOptions::type_id())?;
    let declarator = parse_declarator(parser, DeclaratorOptions::new(mode))?;
    parser.finish_node(
        NodeKind::TypeId {
            decl_specifier,
            declarator,
        },
        start,
    )
}

/// `(params) mutable noexcept -> ret` of a lambda
pub(crate) fn parse_lambda_declarator(parser: &mut Parser) -> Result<NodeRef, ParseError> {
    let start = parser.current_idx;
    let suffix = parse_function_suffix(parser)?;
    let data = DeclaratorData {
        suffix: DeclaratorSuffix::Function(suffix),
        ..Default::default()
    };
    parser.finish_node(NodeKind::Declarator(data), start)
}
