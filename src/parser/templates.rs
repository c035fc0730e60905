//! Template argument lists, template parameter lists and template
//! declarations.

use log::debug;
use thin_vec::ThinVec;

use crate::ast::*;
use crate::diagnostic::ParseError;
use crate::lexer::TokenKind;

use super::declarations::parse_declaration;
use super::declarator::{DeclaratorMode, DeclaratorOptions, parse_declarator, parse_type_id};
use super::decl_specifier::{DeclSpecOptions, parse_decl_specifier};
use super::names::last_name_symbol;
use super::{NameClass, Parser, ScopeKind};

/// Parse `< arg, ... >`. Each argument is read as a type-id when possible,
/// otherwise as an expression in which `>` is not an operator.
pub(crate) fn parse_template_arguments(parser: &mut Parser) -> Result<ThinVec<NodeRef>, ParseError> {
    let open = parser.expect(TokenKind::Less)?;
    if parser.template_depth >= parser.max_template_depth {
        return Err(ParseError::TemplateDepthExceeded {
            limit: parser.max_template_depth,
            location: open.span,
        });
    }
    parser.template_depth += 1;
    let saved = std::mem::replace(&mut parser.greater_is_operator, false);
    let arguments = parse_argument_list(parser);
    parser.greater_is_operator = saved;
    parser.template_depth -= 1;
    let arguments = arguments?;

    if parser.at_split_shift() {
        // the first half of `>>` closes this list
        parser.advance();
    } else {
        parser.expect(TokenKind::Greater)?;
    }
    Ok(arguments)
}

fn parse_argument_list(parser: &mut Parser) -> Result<ThinVec<NodeRef>, ParseError> {
    let mut arguments = ThinVec::new();
    if parser.is_token(TokenKind::Greater) {
        return Ok(arguments);
    }
    loop {
        let start = parser.current_idx;
        let mut argument = match parse_type_argument(parser)? {
            Some(type_id) => type_id,
            None => parser.parse_expr_conditional()?,
        };
        if parser.accept(TokenKind::Ellipsis).is_some() {
            argument = parser.finish_node(NodeKind::PackExpansion { pattern: argument }, start)?;
        }
        arguments.push(argument);
        if parser.accept(TokenKind::Comma).is_none() {
            return Ok(arguments);
        }
    }
}

/// Speculative type-id argument. Exceeding the nesting limit is not a
/// reason to try the expression reading.
fn parse_type_argument(parser: &mut Parser) -> Result<Option<NodeRef>, ParseError> {
    let trans = parser.start_transaction();
    let p = &mut *trans.parser;
    match parse_type_id(p) {
        Ok(type_id) if p.matches(&[TokenKind::Comma, TokenKind::Greater, TokenKind::Ellipsis]) => {
            trans.commit();
            Ok(Some(type_id))
        }
        Err(e @ ParseError::TemplateDepthExceeded { .. }) => Err(e),
        _ => Ok(None),
    }
}

/// `template < parameter-list > declaration` and its variants, at `template`
pub(crate) fn parse_template_declaration(parser: &mut Parser) -> Result<NodeRef, ParseError> {
    let start = parser.current_idx;
    let is_extern = parser.accept(TokenKind::Extern).is_some();
    parser.expect(TokenKind::Template)?;

    if is_extern || !parser.is_token(TokenKind::Less) {
        debug!("parse_template_declaration: explicit instantiation");
        let declaration = parse_declaration(parser)?;
        return parser.finish_node(NodeKind::ExplicitTemplateInstantiation { declaration }, start);
    }

    if parser.is_token(TokenKind::Less) && parser.peek_kind(0) == Some(TokenKind::Greater) {
        parser.advance();
        parser.advance();
        let declaration = parse_declaration(parser)?;
        return parser.finish_node(NodeKind::TemplateSpecialization { declaration }, start);
    }

    parser.type_context.push_scope(ScopeKind::Template, None);
    let result = parse_template_parameters_and_declaration(parser);
    parser.type_context.pop_scope();
    let (parameters, declaration) = result?;
    if let Some((symbol, class)) = declared_template_name(parser.ast, declaration)
        && class.is_template()
    {
        parser.type_context.declare(symbol, class);
    }
    parser.finish_node(NodeKind::TemplateDeclaration { parameters, declaration }, start)
}

fn parse_template_parameters_and_declaration(
    parser: &mut Parser,
) -> Result<(ThinVec<NodeRef>, NodeRef), ParseError> {
    let parameters = parse_template_parameter_list(parser)?;
    let declaration = parse_declaration(parser)?;
    Ok((parameters, declaration))
}

/// `< parameter, ... >`, declaring each parameter name in the current scope
fn parse_template_parameter_list(parser: &mut Parser) -> Result<ThinVec<NodeRef>, ParseError> {
    parser.expect(TokenKind::Less)?;
    let saved = std::mem::replace(&mut parser.greater_is_operator, false);
    let parameters = parse_parameter_items(parser);
    parser.greater_is_operator = saved;
    let parameters = parameters?;
    parser.expect(TokenKind::Greater)?;
    Ok(parameters)
}

fn parse_parameter_items(parser: &mut Parser) -> Result<ThinVec<NodeRef>, ParseError> {
    let mut parameters = ThinVec::new();
    if parser.is_token(TokenKind::Greater) {
        return Ok(parameters);
    }
    loop {
        parameters.push(parse_template_parameter(parser)?);
        if parser.accept(TokenKind::Comma).is_none() {
            return Ok(parameters);
        }
    }
}

fn parse_template_parameter(parser: &mut Parser) -> Result<NodeRef, ParseError> {
    let start = parser.current_idx;
    let kind = parser.current_token_kind();
    let is_type_parameter = matches!(kind, Some(TokenKind::Class | TokenKind::Typename))
        && matches!(
            parser.peek_kind(0),
            Some(TokenKind::Identifier(_) | TokenKind::Comma | TokenKind::Greater | TokenKind::Assign | TokenKind::Ellipsis)
        );

    if is_type_parameter {
        let typename = parser.advance().is_some_and(|t| t.kind == TokenKind::Typename);
        let pack = parser.accept(TokenKind::Ellipsis).is_some();
        let name = match parser.accept_name() {
            Some((symbol, _)) => {
                parser.type_context.declare_local(symbol, NameClass::Type);
                Some(parser.name_node(symbol, parser.current_idx - 1)?)
            }
            None => None,
        };
        let default = if parser.accept(TokenKind::Assign).is_some() {
            Some(parse_type_id(parser)?)
        } else {
            None
        };
        return parser.finish_node(
            NodeKind::SimpleTypeTemplateParameter {
                name,
                default,
                pack,
                typename,
            },
            start,
        );
    }

    if kind == Some(TokenKind::Template) {
        parser.advance();
        parser.type_context.push_scope(ScopeKind::Template, None);
        let parameters = parse_template_parameter_list(parser);
        parser.type_context.pop_scope();
        let parameters = parameters?;
        if parser.advance().is_none_or(|t| !matches!(t.kind, TokenKind::Class | TokenKind::Typename)) {
            return Err(ParseError::syntax("expected 'class' in template template parameter", parser.previous_token_span()));
        }
        parser.accept(TokenKind::Ellipsis);
        let name = match parser.accept_name() {
            Some((symbol, _)) => {
                parser.type_context.declare_local(symbol, NameClass::ClassTemplate);
                Some(parser.name_node(symbol, parser.current_idx - 1)?)
            }
            None => None,
        };
        let default = if parser.accept(TokenKind::Assign).is_some() {
            Some(super::names::parse_name(parser)?)
        } else {
            None
        };
        return parser.finish_node(
            NodeKind::TemplatedTypeTemplateParameter {
                parameters,
                name,
                default,
            },
            start,
        );
    }

    // non-type parameter: a parameter declaration
    let decl_specifier = parse_decl_specifier(parser, DeclSpecOptions::parameter())?;
    let declarator = parse_declarator(parser, DeclaratorOptions::new(DeclaratorMode::Either))?;
    if let Some(symbol) = parser.declarator_symbol(declarator) {
        parser.type_context.declare_local(symbol, NameClass::Value);
    }
    if parser.accept(TokenKind::Assign).is_some() {
        let init_start = parser.current_idx - 1;
        let value = parser.parse_expr_conditional()?;
        let initializer = parser.finish_node(NodeKind::EqualsInitializer { value }, init_start)?;
        if let NodeKind::Declarator(data) = parser.kind_mut(declarator)? {
            data.initializer = Some(initializer);
        }
        let declarator_start = parser.node_start(declarator);
        parser.extend_node(declarator, declarator_start)?;
    }
    parser.finish_node(
        NodeKind::ParameterDeclaration {
            decl_specifier,
            declarator,
        },
        start,
    )
}

/// Name declared by a template declaration, used to register class and
/// function templates with the name-class context.
fn declared_template_name(ast: &Ast, declaration: NodeRef) -> Option<(Symbol, NameClass)> {
    match ast.get_kind(declaration) {
        NodeKind::SimpleDeclaration {
            decl_specifier,
            declarators,
        } => {
            if declarators.is_empty() {
                if let NodeKind::CompositeTypeSpecifier { name: Some(name), .. }
                | NodeKind::ElaboratedTypeSpecifier { name, .. } = ast.get_kind(*decl_specifier)
                {
                    return last_name_symbol(ast, *name).map(|s| (s, NameClass::ClassTemplate));
                }
                return None;
            }
            let declarator = *declarators.first()?;
            let name = crate::ast::signature::declarator_name(ast, declarator)?;
            let symbol = last_name_symbol(ast, name)?;
            let is_function = crate::ast::signature::function_declarator(ast, declarator).is_some();
            Some((symbol, if is_function { NameClass::FunctionTemplate } else { NameClass::Value }))
        }
        NodeKind::FunctionDefinition { declarator, .. } => {
            let name = crate::ast::signature::declarator_name(ast, *declarator)?;
            last_name_symbol(ast, name).map(|s| (s, NameClass::FunctionTemplate))
        }
        NodeKind::AliasDeclaration { alias, .. } => last_name_symbol(ast, *alias).map(|s| (s, NameClass::ClassTemplate)),
        _ => None,
    }
}
