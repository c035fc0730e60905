//! Class, struct, union and enum specifiers.

use log::debug;
use thin_vec::ThinVec;

use crate::ast::*;
use crate::diagnostic::ParseError;
use crate::lexer::TokenKind;

use super::attributes::parse_attribute_specifiers;
use super::declarations::parse_member_declaration;
use super::decl_specifier::{DeclSpecOptions, parse_decl_specifier};
use super::names::parse_name;
use super::{NameClass, Parser, ScopeKind};

fn type_key(kind: TokenKind) -> Option<TypeKey> {
    match kind {
        TokenKind::Struct => Some(TypeKey::Struct),
        TokenKind::Union => Some(TypeKey::Union),
        TokenKind::Class => Some(TypeKey::Class),
        TokenKind::Enum => Some(TypeKey::Enum),
        _ => None,
    }
}

/// Tag name after the class key, possibly qualified or a template-id in C++
fn parse_tag_name(parser: &mut Parser) -> Result<Option<NodeRef>, ParseError> {
    match parser.current_token_kind() {
        Some(TokenKind::Identifier(symbol)) if !parser.is_cpp() => {
            let idx = parser.current_idx;
            parser.advance();
            Ok(Some(parser.name_node(symbol, idx)?))
        }
        Some(TokenKind::Identifier(_) | TokenKind::ColonColon) => Ok(Some(parse_name(parser)?)),
        _ => Ok(None),
    }
}

/// In C++ a class or enum name is a type name from its point of declaration
fn declare_tag(parser: &mut Parser, name: Option<NodeRef>) -> Option<Symbol> {
    let name = name?;
    let NodeKind::Name(symbol) = *parser.kind(name) else {
        return super::names::last_name_symbol(parser.ast, name);
    };
    if parser.is_cpp() {
        let class = if parser.type_context.in_template_scope() {
            NameClass::ClassTemplate
        } else {
            NameClass::Type
        };
        parser.type_context.declare(symbol, class);
    }
    Some(symbol)
}

/// `struct S`, `class C : public B { ... }`, `union { ... }`
pub(crate) fn parse_class_specifier(parser: &mut Parser) -> Result<NodeRef, ParseError> {
    let start = parser.current_idx;
    let token = parser.current_token()?;
    let Some(key) = type_key(token.kind) else {
        return Err(parser.unexpected("'struct', 'union' or 'class'"));
    };
    parser.advance();
    let attributes = parse_attribute_specifiers(parser, true)?;
    let name = parse_tag_name(parser)?;

    // contextual `final`
    if parser.is_cpp()
        && matches!(parser.current_token_kind(), Some(TokenKind::Identifier(s)) if s.as_str() == "final")
        && matches!(parser.peek_kind(0), Some(TokenKind::LeftBrace | TokenKind::Colon))
    {
        parser.advance();
    }

    let is_definition =
        parser.is_token(TokenKind::LeftBrace) || (parser.is_cpp() && parser.is_token(TokenKind::Colon));
    if !is_definition {
        let Some(name) = name else {
            return Err(parser.unexpected("'{' or tag name"));
        };
        declare_tag(parser, Some(name));
        let node = parser.finish_node(
            NodeKind::ElaboratedTypeSpecifier {
                info: DeclSpecInfo::default(),
                key,
                name,
            },
            start,
        )?;
        parser.attach_attributes(node, attributes)?;
        return Ok(node);
    }

    let class_symbol = declare_tag(parser, name);
    debug!("parse_class_specifier: {:?} {:?}", key, class_symbol);

    let mut bases = ThinVec::new();
    if parser.is_cpp() && parser.accept(TokenKind::Colon).is_some() {
        loop {
            bases.push(parse_base_specifier(parser)?);
            if parser.accept(TokenKind::Comma).is_none() {
                break;
            }
        }
    }

    parser.expect(TokenKind::LeftBrace)?;
    parser.type_context.push_scope(ScopeKind::Class, class_symbol);
    let members = parse_member_list(parser, class_symbol);
    parser.type_context.pop_scope();
    let members = members?;
    parser.expect(TokenKind::RightBrace)?;

    let node = parser.finish_node(
        NodeKind::CompositeTypeSpecifier {
            info: DeclSpecInfo::default(),
            key,
            name,
            bases,
            members,
        },
        start,
    )?;
    parser.attach_attributes(node, attributes)?;
    Ok(node)
}

fn parse_base_specifier(parser: &mut Parser) -> Result<NodeRef, ParseError> {
    let start = parser.current_idx;
    let attributes = parse_attribute_specifiers(parser, false)?;
    let mut visibility = None;
    let mut is_virtual = false;
    loop {
        match parser.current_token_kind() {
            Some(TokenKind::Virtual) => is_virtual = true,
            Some(TokenKind::Public) => visibility = Some(Visibility::Public),
            Some(TokenKind::Protected) => visibility = Some(Visibility::Protected),
            Some(TokenKind::Private) => visibility = Some(Visibility::Private),
            _ => break,
        }
        parser.advance();
    }
    let name = parse_name(parser)?;
    parser.accept(TokenKind::Ellipsis);
    let node = parser.finish_node(
        NodeKind::BaseSpecifier {
            name,
            visibility,
            is_virtual,
        },
        start,
    )?;
    parser.attach_attributes(node, attributes)?;
    Ok(node)
}

fn parse_member_list(parser: &mut Parser, class_name: Option<Symbol>) -> Result<ThinVec<NodeRef>, ParseError> {
    let mut members = ThinVec::new();
    while !parser.is_token(TokenKind::RightBrace) && !parser.at_end() {
        let start = parser.current_idx;
        let visibility = match parser.current_token_kind() {
            Some(TokenKind::Public) => Some(Visibility::Public),
            Some(TokenKind::Protected) => Some(Visibility::Protected),
            Some(TokenKind::Private) => Some(Visibility::Private),
            _ => None,
        };
        if let Some(visibility) = visibility
            && parser.peek_kind(0) == Some(TokenKind::Colon)
        {
            parser.advance();
            parser.advance();
            members.push(parser.finish_node(NodeKind::VisibilityLabel(visibility), start)?);
            continue;
        }
        let member = match parse_member_declaration(parser, class_name) {
            Ok(member) => member,
            Err(e) => parser.recover(e, start, NodeKind::ProblemDeclaration)?,
        };
        members.push(member);
    }
    Ok(members)
}

/// `enum E : int { A, B = 2 }`, `enum class E`, `enum E`
pub(crate) fn parse_enum_specifier(parser: &mut Parser) -> Result<NodeRef, ParseError> {
    let start = parser.current_idx;
    parser.expect(TokenKind::Enum)?;
    let scoped = parser.is_cpp() && (parser.accept(TokenKind::Class).is_some() || parser.accept(TokenKind::Struct).is_some());
    let attributes = parse_attribute_specifiers(parser, true)?;
    let name = parse_tag_name(parser)?;

    let base = if parser.is_cpp() && parser.is_token(TokenKind::Colon) {
        parser.advance();
        Some(parse_decl_specifier(parser, DeclSpecOptions::type_id())?)
    } else {
        None
    };

    if !parser.is_token(TokenKind::LeftBrace) {
        let Some(name) = name else {
            return Err(parser.unexpected("'{' or enum name"));
        };
        declare_tag(parser, Some(name));
        let node = parser.finish_node(
            NodeKind::ElaboratedTypeSpecifier {
                info: DeclSpecInfo::default(),
                key: TypeKey::Enum,
                name,
            },
            start,
        )?;
        parser.attach_attributes(node, attributes)?;
        return Ok(node);
    }

    declare_tag(parser, name);
    parser.expect(TokenKind::LeftBrace)?;
    let mut enumerators = ThinVec::new();
    while !parser.is_token(TokenKind::RightBrace) {
        enumerators.push(parse_enumerator(parser, scoped)?);
        if parser.accept(TokenKind::Comma).is_none() {
            break;
        }
    }
    parser.expect(TokenKind::RightBrace)?;

    let node = parser.finish_node(
        NodeKind::EnumerationSpecifier {
            info: DeclSpecInfo::default(),
            scoped,
            name,
            base,
            enumerators,
        },
        start,
    )?;
    parser.attach_attributes(node, attributes)?;
    Ok(node)
}

fn parse_enumerator(parser: &mut Parser, scoped: bool) -> Result<NodeRef, ParseError> {
    let start = parser.current_idx;
    let (symbol, _) = parser.expect_name()?;
    let name = parser.name_node(symbol, start)?;
    if !scoped {
        parser.type_context.declare(symbol, NameClass::Value);
    }
    let attributes = parse_attribute_specifiers(parser, false)?;
    let value = if parser.accept(TokenKind::Assign).is_some() {
        Some(parser.parse_expr_conditional()?)
    } else {
        None
    };
    let node = parser.finish_node(NodeKind::Enumerator { name, value }, start)?;
    parser.attach_attributes(node, attributes)?;
    Ok(node)
}
