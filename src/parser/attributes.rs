//! Attribute specifiers: C++ `[[...]]`, GNU `__attribute__((...))` and
//! `alignas(...)`.
//!
//! Arguments are kept as their token text; nothing interprets them.

use thin_vec::ThinVec;

use crate::ast::signature::token_signature;
use crate::ast::*;
use crate::diagnostic::ParseError;
use crate::lexer::TokenKind;

use super::Parser;

/// `[[` in C++
pub(crate) fn at_cpp_attribute(parser: &Parser) -> bool {
    parser.is_cpp() && parser.is_token(TokenKind::LeftBracket) && parser.peek_kind(0) == Some(TokenKind::LeftBracket)
}

/// Zero or more `[[...]]` specifiers
pub(crate) fn parse_cpp_attributes(parser: &mut Parser) -> Result<ThinVec<NodeRef>, ParseError> {
    let mut specifiers = ThinVec::new();
    while at_cpp_attribute(parser) {
        specifiers.push(parse_cpp_attribute_specifier(parser)?);
    }
    Ok(specifiers)
}

/// Zero or more attribute specifiers of any syntax
pub(crate) fn parse_attribute_specifiers(
    parser: &mut Parser,
    allow_alignas: bool,
) -> Result<ThinVec<NodeRef>, ParseError> {
    let mut specifiers = ThinVec::new();
    loop {
        if at_cpp_attribute(parser) {
            specifiers.push(parse_cpp_attribute_specifier(parser)?);
        } else if parser.is_token(TokenKind::Attribute) {
            specifiers.push(parse_gnu_attribute_specifier(parser)?);
        } else if allow_alignas && parser.is_token(TokenKind::Alignas) {
            specifiers.push(parse_alignas(parser)?);
        } else {
            return Ok(specifiers);
        }
    }
}

/// Balanced `( ... )` at the current token, returned as text without the
/// outer parenthesis
fn parse_argument_text(parser: &mut Parser) -> Result<Option<Symbol>, ParseError> {
    if !parser.is_token(TokenKind::LeftParen) {
        return Ok(None);
    }
    parser.advance();
    let text_start = parser.current_idx;
    let mut depth = 0usize;
    loop {
        let token = parser.current_token()?;
        match token.kind {
            TokenKind::LeftParen => depth += 1,
            TokenKind::RightParen if depth == 0 => break,
            TokenKind::RightParen => depth -= 1,
            _ => {}
        }
        parser.advance();
    }
    let text = token_signature(&parser.tokens[text_start..parser.current_idx]);
    parser.expect(TokenKind::RightParen)?;
    Ok(Some(Symbol::new(text)))
}

/// Attribute name: any identifier or keyword
fn parse_attribute_name(parser: &mut Parser) -> Result<Symbol, ParseError> {
    let token = parser.current_token()?;
    if !token.kind.is_word() || matches!(token.kind, TokenKind::IntegerLiteral(_) | TokenKind::StringLiteral(_)) {
        return Err(parser.unexpected("attribute name"));
    }
    parser.advance();
    Ok(Symbol::new(token.kind.spelling()))
}

fn parse_cpp_attribute_specifier(parser: &mut Parser) -> Result<NodeRef, ParseError> {
    let start = parser.current_idx;
    parser.expect(TokenKind::LeftBracket)?;
    parser.expect(TokenKind::LeftBracket)?;

    let mut using_scope = None;
    if parser.accept(TokenKind::Using).is_some() {
        using_scope = Some(parse_attribute_name(parser)?);
        parser.expect(TokenKind::Colon)?;
    }

    let mut attributes = ThinVec::new();
    while !parser.is_token(TokenKind::RightBracket) {
        if parser.accept(TokenKind::Comma).is_some() {
            continue;
        }
        let attribute_start = parser.current_idx;
        let mut name = parse_attribute_name(parser)?;
        let mut scope = using_scope;
        if parser.accept(TokenKind::ColonColon).is_some() {
            scope = Some(name);
            name = parse_attribute_name(parser)?;
        }
        let arguments = parse_argument_text(parser)?;
        parser.accept(TokenKind::Ellipsis);
        attributes.push(parser.finish_node(NodeKind::Attribute { name, scope, arguments }, attribute_start)?);
    }

    parser.expect(TokenKind::RightBracket)?;
    parser.expect(TokenKind::RightBracket)?;
    parser.finish_node(NodeKind::AttributeSpecifier { attributes, gnu: false }, start)
}

fn parse_gnu_attribute_specifier(parser: &mut Parser) -> Result<NodeRef, ParseError> {
    let start = parser.current_idx;
    parser.expect(TokenKind::Attribute)?;
    parser.expect(TokenKind::LeftParen)?;
    parser.expect(TokenKind::LeftParen)?;

    let mut attributes = ThinVec::new();
    while !parser.is_token(TokenKind::RightParen) {
        if parser.accept(TokenKind::Comma).is_some() {
            continue;
        }
        let attribute_start = parser.current_idx;
        let name = parse_attribute_name(parser)?;
        let arguments = parse_argument_text(parser)?;
        attributes.push(parser.finish_node(
            NodeKind::Attribute {
                name,
                scope: None,
                arguments,
            },
            attribute_start,
        )?);
    }

    parser.expect(TokenKind::RightParen)?;
    parser.expect(TokenKind::RightParen)?;
    parser.finish_node(NodeKind::AttributeSpecifier { attributes, gnu: true }, start)
}

/// `alignas(expr)` / `_Alignas(type)`, kept as an attribute named `alignas`
fn parse_alignas(parser: &mut Parser) -> Result<NodeRef, ParseError> {
    let start = parser.current_idx;
    parser.expect(TokenKind::Alignas)?;
    let arguments = parse_argument_text(parser)?;
    if arguments.is_none() {
        return Err(parser.unexpected("'('"));
    }
    let attribute = parser.finish_node(
        NodeKind::Attribute {
            name: Symbol::new("alignas"),
            scope: None,
            arguments,
        },
        start,
    )?;
    let mut attributes = ThinVec::new();
    attributes.push(attribute);
    parser.finish_node(NodeKind::AttributeSpecifier { attributes, gnu: false }, start)
}
