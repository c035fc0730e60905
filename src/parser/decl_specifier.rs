//! Declaration specifier parsing
//!
//! Collects storage classes, qualifiers, function specifiers, attributes and
//! the type specifier of a declaration into one specifier node. Which node
//! kind results depends on the type specifier: keywords give a
//! [`NodeKind::SimpleDeclSpecifier`], names a [`NodeKind::NamedTypeSpecifier`],
//! and class or enum specifiers their own kinds with the collected
//! information patched in.

use log::{debug, trace};
use thin_vec::ThinVec;

use crate::ast::*;
use crate::diagnostic::ParseError;
use crate::lexer::TokenKind;

use super::attributes::{at_cpp_attribute, parse_attribute_specifiers};
use super::classes::{parse_class_specifier, parse_enum_specifier};
use super::declarator::parse_type_id;
use super::names::{is_qualified_constructor, parse_name, scan_qualified_name};
use super::utils::expr_patterns::parse_parenthesized_expr;
use super::Parser;

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct DeclSpecOptions {
    /// Constructors, destructors, conversion functions and C implicit int
    /// declare without a type specifier
    pub(crate) allow_empty: bool,
    /// Type-ids take no storage class or function specifier
    pub(crate) type_only: bool,
    /// Class whose members are being declared, for constructor detection
    pub(crate) class_name: Option<Symbol>,
}

impl DeclSpecOptions {
    pub(crate) fn type_id() -> Self {
        DeclSpecOptions {
            type_only: true,
            ..Default::default()
        }
    }

    pub(crate) fn parameter() -> Self {
        DeclSpecOptions::default()
    }

    pub(crate) fn declaration() -> Self {
        DeclSpecOptions {
            allow_empty: true,
            ..Default::default()
        }
    }

    pub(crate) fn member(class_name: Option<Symbol>) -> Self {
        DeclSpecOptions {
            allow_empty: true,
            class_name,
            ..Default::default()
        }
    }
}

/// Type specifier collected so far
enum TypeSpec {
    None,
    Simple,
    Named { name: NodeRef, typename: bool },
    Node(NodeRef),
}

struct SpecState {
    info: DeclSpecInfo,
    basic: BasicType,
    modifiers: TypeModifiers,
    type_expr: Option<NodeRef>,
    type_spec: TypeSpec,
    attributes: ThinVec<NodeRef>,
    consumed: bool,
}

impl SpecState {
    fn has_type(&self) -> bool {
        !matches!(self.type_spec, TypeSpec::None)
    }

    fn set_basic(&mut self, parser: &Parser, basic: BasicType) -> Result<(), ParseError> {
        if self.basic != BasicType::Unspecified || matches!(self.type_spec, TypeSpec::Named { .. } | TypeSpec::Node(_)) {
            return Err(ParseError::syntax(
                "two or more data types in declaration specifiers",
                parser.current_token_span_or_empty(),
            ));
        }
        self.basic = basic;
        self.type_spec = TypeSpec::Simple;
        Ok(())
    }
}

fn storage_class(kind: TokenKind) -> Option<StorageClass> {
    let storage = match kind {
        TokenKind::Typedef => StorageClass::Typedef,
        TokenKind::Extern => StorageClass::Extern,
        TokenKind::Static => StorageClass::Static,
        TokenKind::Register => StorageClass::Register,
        TokenKind::Mutable => StorageClass::Mutable,
        _ => return None,
    };
    Some(storage)
}

fn function_specifier(kind: TokenKind) -> Option<FunctionSpecifiers> {
    let specifier = match kind {
        TokenKind::Inline => FunctionSpecifiers::INLINE,
        TokenKind::Noreturn => FunctionSpecifiers::NORETURN,
        TokenKind::Virtual => FunctionSpecifiers::VIRTUAL,
        TokenKind::Explicit => FunctionSpecifiers::EXPLICIT,
        TokenKind::Friend => FunctionSpecifiers::FRIEND,
        TokenKind::Constexpr => FunctionSpecifiers::CONSTEXPR,
        TokenKind::ThreadLocal => FunctionSpecifiers::THREAD_LOCAL,
        _ => return None,
    };
    Some(specifier)
}

fn qualifier(kind: TokenKind) -> Option<TypeQualifiers> {
    let qualifier = match kind {
        TokenKind::Const => TypeQualifiers::CONST,
        TokenKind::Volatile => TypeQualifiers::VOLATILE,
        TokenKind::Restrict => TypeQualifiers::RESTRICT,
        TokenKind::Atomic => TypeQualifiers::ATOMIC,
        _ => return None,
    };
    Some(qualifier)
}

/// An identifier the parser has not seen declared, directly followed by
/// another identifier, is taken as a type name.
fn is_undeclared_type_name(parser: &Parser) -> bool {
    let Some(TokenKind::Identifier(symbol)) = parser.current_token_kind() else {
        return false;
    };
    parser.type_context.lookup(symbol).is_none() && matches!(parser.peek_kind(0), Some(TokenKind::Identifier(_)))
}

/// `typeof(...)` / `decltype(...)`: a type-id when it reads as one
fn parse_typeof_operand(parser: &mut Parser) -> Result<NodeRef, ParseError> {
    if parser.is_token(TokenKind::LeftParen) && parser.is_type_name_start_at(parser.current_idx + 1) {
        let type_id = parser.speculate(|p| {
            p.advance();
            let type_id = parse_type_id(p)?;
            p.expect(TokenKind::RightParen)?;
            Ok(type_id)
        });
        if let Some(type_id) = type_id {
            return Ok(type_id);
        }
    }
    parse_parenthesized_expr(parser)
}

/// Parse a declaration specifier sequence
pub(crate) fn parse_decl_specifier(parser: &mut Parser, options: DeclSpecOptions) -> Result<NodeRef, ParseError> {
    let start = parser.current_idx;
    let mut state = SpecState {
        info: DeclSpecInfo::default(),
        basic: BasicType::Unspecified,
        modifiers: TypeModifiers::empty(),
        type_expr: None,
        type_spec: TypeSpec::None,
        attributes: ThinVec::new(),
        consumed: false,
    };

    while let Some(token) = parser.try_current_token() {
        let kind = token.kind;
        trace!("parse_decl_specifier: {:?}", kind);

        if let Some(storage) = storage_class(kind)
            && !options.type_only
        {
            parser.advance();
            state.info.storage = storage;
        } else if kind == TokenKind::Auto {
            if parser.is_cpp() {
                parser.advance();
                state.set_basic(parser, BasicType::Auto)?;
            } else if options.type_only {
                break;
            } else {
                parser.advance();
                state.info.storage = StorageClass::Auto;
            }
        } else if let Some(q) = qualifier(kind) {
            parser.advance();
            state.info.qualifiers |= q;
        } else if let Some(specifier) = function_specifier(kind)
            && !options.type_only
        {
            parser.advance();
            state.info.specifiers |= specifier;
        } else if kind == TokenKind::Attribute || kind == TokenKind::Alignas || at_cpp_attribute(parser) {
            if state.has_type() && at_cpp_attribute(parser) {
                // appertains to the declarator
                break;
            }
            let attributes = parse_attribute_specifiers(parser, true)?;
            state.attributes.extend(attributes);
        } else if kind.is_simple_type_keyword() {
            parser.advance();
            match kind {
                TokenKind::Short => {
                    state.modifiers |= TypeModifiers::SHORT;
                    state.type_spec = TypeSpec::Simple;
                }
                TokenKind::Long => {
                    if state.modifiers.contains(TypeModifiers::LONG) {
                        state.modifiers.remove(TypeModifiers::LONG);
                        state.modifiers |= TypeModifiers::LONG_LONG;
                    } else {
                        state.modifiers |= TypeModifiers::LONG;
                    }
                    state.type_spec = TypeSpec::Simple;
                }
                TokenKind::Signed => {
                    state.modifiers |= TypeModifiers::SIGNED;
                    state.type_spec = TypeSpec::Simple;
                }
                TokenKind::Unsigned => {
                    state.modifiers |= TypeModifiers::UNSIGNED;
                    state.type_spec = TypeSpec::Simple;
                }
                TokenKind::Complex => {
                    state.modifiers |= TypeModifiers::COMPLEX;
                    state.type_spec = TypeSpec::Simple;
                }
                TokenKind::Void => state.set_basic(parser, BasicType::Void)?,
                TokenKind::Char => state.set_basic(parser, BasicType::Char)?,
                TokenKind::Char16 => state.set_basic(parser, BasicType::Char16)?,
                TokenKind::Char32 => state.set_basic(parser, BasicType::Char32)?,
                TokenKind::WcharT => state.set_basic(parser, BasicType::WChar)?,
                TokenKind::Int => state.set_basic(parser, BasicType::Int)?,
                TokenKind::Int128 => state.set_basic(parser, BasicType::Int128)?,
                TokenKind::Float => state.set_basic(parser, BasicType::Float)?,
                TokenKind::Double => state.set_basic(parser, BasicType::Double)?,
                TokenKind::Bool => state.set_basic(parser, BasicType::Bool)?,
                _ => {}
            }
        } else if matches!(kind, TokenKind::Typeof | TokenKind::Decltype) {
            if state.has_type() {
                break;
            }
            parser.advance();
            let basic = if kind == TokenKind::Typeof {
                BasicType::Typeof
            } else {
                BasicType::Decltype
            };
            state.set_basic(parser, basic)?;
            state.type_expr = Some(parse_typeof_operand(parser)?);
        } else if matches!(kind, TokenKind::Struct | TokenKind::Union | TokenKind::Class) {
            if state.has_type() {
                break;
            }
            state.type_spec = TypeSpec::Node(parse_class_specifier(parser)?);
        } else if kind == TokenKind::Enum {
            if state.has_type() {
                break;
            }
            state.type_spec = TypeSpec::Node(parse_enum_specifier(parser)?);
        } else if kind == TokenKind::Typename && parser.is_cpp() {
            if state.has_type() {
                break;
            }
            parser.advance();
            let name = parse_name(parser)?;
            state.type_spec = TypeSpec::Named { name, typename: true };
        } else if matches!(kind, TokenKind::Identifier(_) | TokenKind::ColonColon) {
            if state.has_type() {
                break;
            }
            if let TokenKind::Identifier(symbol) = kind
                && options.class_name == Some(symbol)
                && parser.peek_kind(0) == Some(TokenKind::LeftParen)
            {
                debug!("parse_decl_specifier: constructor of {:?}", symbol);
                break;
            }
            if parser.is_cpp() && is_qualified_constructor(parser) {
                break;
            }
            let is_type = scan_qualified_name(parser, parser.current_idx).is_some_and(|(_, class)| class.is_type());
            if !is_type && !is_undeclared_type_name(parser) {
                break;
            }
            let name = parse_name(parser)?;
            state.type_spec = TypeSpec::Named { name, typename: false };
        } else {
            break;
        }
        state.consumed = true;
    }

    if !state.consumed && !options.allow_empty {
        return Err(parser.unexpected("type specifier"));
    }

    let SpecState {
        info,
        basic,
        modifiers,
        type_expr,
        type_spec,
        attributes,
        ..
    } = state;

    let node = match type_spec {
        TypeSpec::Node(node) => {
            match parser.kind_mut(node)? {
                NodeKind::CompositeTypeSpecifier { info: slot, .. }
                | NodeKind::ElaboratedTypeSpecifier { info: slot, .. }
                | NodeKind::EnumerationSpecifier { info: slot, .. } => *slot = info,
                _ => {}
            }
            parser.extend_node(node, start)?;
            node
        }
        TypeSpec::Named { name, typename } => {
            parser.finish_node(NodeKind::NamedTypeSpecifier { info, name, typename }, start)?
        }
        TypeSpec::None | TypeSpec::Simple => parser.finish_node(
            NodeKind::SimpleDeclSpecifier {
                info,
                basic,
                modifiers,
                type_expr,
            },
            start,
        )?,
    };
    parser.attach_attributes(node, attributes)?;
    Ok(node)
}
