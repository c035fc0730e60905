//! Expression parsing module
//!
//! This module handles all expression parsing logic, including the Pratt parser
//! implementation for operator precedence and associativity. Prefix forms
//! that start with `(` or a type name are disambiguated by trying the type
//! reading first and falling back to the expression reading.

use log::{debug, trace};
use thin_vec::ThinVec;

use crate::ast::*;
use crate::diagnostic::ParseError;
use crate::lexer::TokenKind;

use super::declarator::{DeclaratorMode, parse_type_id, parse_type_id_with};
use super::decl_specifier::{DeclSpecOptions, parse_decl_specifier};
use super::initializers::parse_initializer_list;
use super::names::{parse_name, scan_qualified_name};
use super::statements::parse_compound_statement;
use super::utils::expr_patterns::{parse_expr_list, parse_parenthesized_expr};
use super::{NameClass, Parser};

/// Binding power for Pratt parser operator precedence
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct BindingPower(u8);

impl BindingPower {
    pub const MIN: Self = Self(0);
    pub const COMMA: Self = Self(1);
    pub const ASSIGNMENT: Self = Self(2);
    pub const CONDITIONAL: Self = Self(3);
    pub const LOGICAL_OR: Self = Self(4);
    pub const LOGICAL_AND: Self = Self(5);
    pub const BITWISE_OR: Self = Self(6);
    pub const BITWISE_XOR: Self = Self(7);
    pub const BITWISE_AND: Self = Self(8);
    pub const EQUALITY: Self = Self(9);
    pub const RELATIONAL: Self = Self(10);
    pub const SHIFT: Self = Self(11);
    pub const ADDITIVE: Self = Self(12);
    pub const MULTIPLICATIVE: Self = Self(13);
    pub const POINTER_TO_MEMBER: Self = Self(14);
    pub const CAST: Self = Self(15);
    pub const UNARY: Self = Self(16);
    pub const POSTFIX: Self = Self(17);
    pub const PRIMARY: Self = Self(18);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Associativity {
    Left,
    Right,
}

/// Pratt parser implementation
pub struct PrattParser;

impl PrattParser {
    pub fn get_binding_power(token_kind: TokenKind) -> Option<(BindingPower, Associativity)> {
        match token_kind {
            // Assignment operators (right-associative)
            TokenKind::Assign
            | TokenKind::PlusAssign
            | TokenKind::MinusAssign
            | TokenKind::StarAssign
            | TokenKind::DivAssign
            | TokenKind::ModAssign
            | TokenKind::AndAssign
            | TokenKind::OrAssign
            | TokenKind::XorAssign
            | TokenKind::LeftShiftAssign
            | TokenKind::RightShiftAssign => Some((BindingPower::ASSIGNMENT, Associativity::Right)),

            // Comma operator (left-associative, lowest precedence)
            TokenKind::Comma => Some((BindingPower::COMMA, Associativity::Left)),

            // Conditional operator (right-associative)
            TokenKind::Question => Some((BindingPower::CONDITIONAL, Associativity::Right)),

            // Logical operators (left-associative)
            TokenKind::LogicOr => Some((BindingPower::LOGICAL_OR, Associativity::Left)),
            TokenKind::LogicAnd => Some((BindingPower::LOGICAL_AND, Associativity::Left)),

            // Bitwise operators (left-associative)
            TokenKind::Or => Some((BindingPower::BITWISE_OR, Associativity::Left)),
            TokenKind::Xor => Some((BindingPower::BITWISE_XOR, Associativity::Left)),
            TokenKind::And => Some((BindingPower::BITWISE_AND, Associativity::Left)),

            // Comparison operators (left-associative)
            TokenKind::Equal | TokenKind::NotEqual => Some((BindingPower::EQUALITY, Associativity::Left)),
            TokenKind::Less | TokenKind::Greater | TokenKind::LessEqual | TokenKind::GreaterEqual => {
                Some((BindingPower::RELATIONAL, Associativity::Left))
            }

            // Shift operators (left-associative)
            TokenKind::LeftShift | TokenKind::RightShift => Some((BindingPower::SHIFT, Associativity::Left)),

            // Additive operators (left-associative)
            TokenKind::Plus | TokenKind::Minus => Some((BindingPower::ADDITIVE, Associativity::Left)),

            // Multiplicative operators (left-associative)
            TokenKind::Star | TokenKind::Slash | TokenKind::Percent => {
                Some((BindingPower::MULTIPLICATIVE, Associativity::Left))
            }

            TokenKind::DotStar | TokenKind::ArrowStar => Some((BindingPower::POINTER_TO_MEMBER, Associativity::Left)),

            // Postfix operators
            TokenKind::Increment
            | TokenKind::Decrement
            | TokenKind::LeftParen
            | TokenKind::LeftBracket
            | TokenKind::Dot
            | TokenKind::Arrow => Some((BindingPower::POSTFIX, Associativity::Left)),

            _ => None,
        }
    }
}

fn binary_op(kind: TokenKind) -> Option<BinaryOp> {
    let op = match kind {
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Sub,
        TokenKind::Star => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::Div,
        TokenKind::Percent => BinaryOp::Mod,
        TokenKind::Equal => BinaryOp::Equal,
        TokenKind::NotEqual => BinaryOp::NotEqual,
        TokenKind::Less => BinaryOp::Less,
        TokenKind::Greater => BinaryOp::Greater,
        TokenKind::LessEqual => BinaryOp::LessEqual,
        TokenKind::GreaterEqual => BinaryOp::GreaterEqual,
        TokenKind::And => BinaryOp::BitAnd,
        TokenKind::Or => BinaryOp::BitOr,
        TokenKind::Xor => BinaryOp::BitXor,
        TokenKind::LeftShift => BinaryOp::LShift,
        TokenKind::RightShift => BinaryOp::RShift,
        TokenKind::LogicAnd => BinaryOp::LogicAnd,
        TokenKind::LogicOr => BinaryOp::LogicOr,
        TokenKind::Assign => BinaryOp::Assign,
        TokenKind::PlusAssign => BinaryOp::AssignAdd,
        TokenKind::MinusAssign => BinaryOp::AssignSub,
        TokenKind::StarAssign => BinaryOp::AssignMul,
        TokenKind::DivAssign => BinaryOp::AssignDiv,
        TokenKind::ModAssign => BinaryOp::AssignMod,
        TokenKind::AndAssign => BinaryOp::AssignBitAnd,
        TokenKind::OrAssign => BinaryOp::AssignBitOr,
        TokenKind::XorAssign => BinaryOp::AssignBitXor,
        TokenKind::LeftShiftAssign => BinaryOp::AssignLShift,
        TokenKind::RightShiftAssign => BinaryOp::AssignRShift,
        TokenKind::Comma => BinaryOp::Comma,
        TokenKind::DotStar => BinaryOp::PointerToMemberDot,
        TokenKind::ArrowStar => BinaryOp::PointerToMemberArrow,
        _ => return None,
    };
    Some(op)
}

/// Main expression parsing using Pratt algorithm
pub fn parse_expression(parser: &mut Parser, min_binding_power: BindingPower) -> Result<NodeRef, ParseError> {
    trace!("parse_expression: min_binding_power={}", min_binding_power.0);
    let mut left = parse_prefix(parser)?;

    while let Some(current_token) = parser.try_current_token() {
        let split_shift = parser.at_split_shift();
        let kind = if split_shift {
            TokenKind::RightShift
        } else {
            current_token.kind
        };

        if !parser.greater_is_operator && matches!(kind, TokenKind::Greater | TokenKind::RightShift) {
            trace!("parse_expression: '>' closes a template argument list");
            break;
        }

        let Some((binding_power, associativity)) = PrattParser::get_binding_power(kind) else {
            break;
        };

        if binding_power < min_binding_power {
            break;
        }

        // Handle associativity
        let next_min_bp = if associativity == Associativity::Left {
            BindingPower(binding_power.0 + 1)
        } else {
            binding_power
        };

        parser.advance();
        if split_shift {
            parser.advance();
        }
        trace!("parse_expression: parsing infix operator {:?}", kind);
        left = parse_infix(parser, left, kind, next_min_bp)?;
    }

    Ok(left)
}

/// Parse infix operator whose token has already been consumed
fn parse_infix(
    parser: &mut Parser,
    left: NodeRef,
    operator: TokenKind,
    next_min_bp: BindingPower,
) -> Result<NodeRef, ParseError> {
    let start = parser.node_start(left);
    match operator {
        TokenKind::Increment => {
            return parser.finish_node(
                NodeKind::Unary {
                    op: UnaryOp::PostIncrement,
                    operand: left,
                },
                start,
            );
        }
        TokenKind::Decrement => {
            return parser.finish_node(
                NodeKind::Unary {
                    op: UnaryOp::PostDecrement,
                    operand: left,
                },
                start,
            );
        }
        TokenKind::LeftParen => return parse_function_call(parser, left),
        TokenKind::LeftBracket => return parse_index_access(parser, left),
        TokenKind::Dot => return parse_member_access(parser, left, false),
        TokenKind::Arrow => return parse_member_access(parser, left, true),
        TokenKind::Question => return parse_ternary(parser, left),
        _ => {}
    }

    let Some(op) = binary_op(operator) else {
        return Err(ParseError::syntax("invalid binary operator", parser.previous_token_span()));
    };

    let right = if op.is_assignment() && parser.is_cpp() && parser.is_token(TokenKind::LeftBrace) {
        parse_initializer_list(parser)?
    } else {
        parser.parse_expression(next_min_bp)?
    };

    parser.finish_node(NodeKind::Binary { op, left, right }, start)
}

/// Parse ternary operator, `?` consumed
fn parse_ternary(parser: &mut Parser, condition: NodeRef) -> Result<NodeRef, ParseError> {
    let start = parser.node_start(condition);
    let positive = if parser.is_gnu() && parser.is_token(TokenKind::Colon) {
        None
    } else {
        let saved = std::mem::replace(&mut parser.greater_is_operator, true);
        let positive = parser.parse_expr_min();
        parser.greater_is_operator = saved;
        Some(positive?)
    };
    parser.expect(TokenKind::Colon)?;
    let negative = if parser.is_cpp() {
        parser.parse_expr_assignment()?
    } else {
        parser.parse_expr_conditional()?
    };
    parser.finish_node(
        NodeKind::Conditional {
            condition,
            positive,
            negative,
        },
        start,
    )
}

/// Parse function call, `(` consumed
fn parse_function_call(parser: &mut Parser, function: NodeRef) -> Result<NodeRef, ParseError> {
    let start = parser.node_start(function);
    let arguments = parse_expr_list(parser, BindingPower::ASSIGNMENT, TokenKind::RightParen)?;
    parser.expect(TokenKind::RightParen)?;
    debug!("parse_function_call: {} arguments", arguments.len());
    parser.finish_node(NodeKind::FunctionCall { function, arguments }, start)
}

/// Parse array index access, `[` consumed
fn parse_index_access(parser: &mut Parser, array: NodeRef) -> Result<NodeRef, ParseError> {
    let start = parser.node_start(array);
    let index = if parser.is_cpp() && parser.is_token(TokenKind::LeftBrace) {
        parse_initializer_list(parser)?
    } else {
        let saved = std::mem::replace(&mut parser.greater_is_operator, true);
        let index = parser.parse_expr_min();
        parser.greater_is_operator = saved;
        index?
    };
    parser.expect(TokenKind::RightBracket)?;
    parser.finish_node(NodeKind::ArraySubscript { array, index }, start)
}

/// Parse member access, `.` or `->` consumed
fn parse_member_access(parser: &mut Parser, owner: NodeRef, arrow: bool) -> Result<NodeRef, ParseError> {
    let start = parser.node_start(owner);
    let name = parse_name(parser)?;
    parser.finish_node(NodeKind::FieldReference { owner, name, arrow }, start)
}

/// Parse prefix expression
pub(crate) fn parse_prefix(parser: &mut Parser) -> Result<NodeRef, ParseError> {
    let start = parser.current_idx;
    let token = parser.current_token()?;

    trace!("parse_prefix: token={:?}", token.kind);
    match token.kind {
        TokenKind::IntegerLiteral(value) => literal(parser, LiteralKind::Integer, value),
        TokenKind::FloatLiteral(value) => literal(parser, LiteralKind::Float, value),
        TokenKind::CharLiteral(value) => literal(parser, LiteralKind::Char, value),
        TokenKind::StringLiteral(first) => {
            parser.advance();
            let mut value = first.to_string();
            let mut adjacent = false;
            while let Some(TokenKind::StringLiteral(next)) = parser.current_token_kind() {
                value.push(' ');
                value.push_str(next.as_str());
                adjacent = true;
                parser.advance();
            }
            let value = if adjacent { Symbol::new(value) } else { first };
            parser.finish_node(
                NodeKind::Literal {
                    kind: LiteralKind::String,
                    value,
                },
                start,
            )
        }
        TokenKind::True => keyword_literal(parser, LiteralKind::True, "true"),
        TokenKind::False => keyword_literal(parser, LiteralKind::False, "false"),
        TokenKind::Nullptr => keyword_literal(parser, LiteralKind::Nullptr, "nullptr"),
        TokenKind::This => keyword_literal(parser, LiteralKind::This, "this"),
        TokenKind::ColonColon if matches!(parser.peek_kind(0), Some(TokenKind::New | TokenKind::Delete)) => {
            parse_new_or_delete(parser)
        }
        TokenKind::New | TokenKind::Delete => parse_new_or_delete(parser),
        TokenKind::Identifier(_) | TokenKind::ColonColon | TokenKind::Operator | TokenKind::Tilde
            if parser.is_cpp() && !is_bitwise_not(parser) =>
        {
            if is_functional_cast(parser) {
                return parse_simple_type_constructor(parser);
            }
            let name = parse_name(parser)?;
            parser.finish_node(NodeKind::IdExpression { name }, start)
        }
        TokenKind::Identifier(symbol) => {
            parser.advance();
            let name = parser.name_node(symbol, start)?;
            parser.finish_node(NodeKind::IdExpression { name }, start)
        }
        TokenKind::Typename if parser.is_cpp() => parse_simple_type_constructor(parser),
        kind if parser.is_cpp() && (kind.is_simple_type_keyword() || kind == TokenKind::Auto) => {
            parse_simple_type_constructor(parser)
        }
        TokenKind::LeftParen => parse_parenthesized_prefix(parser),
        TokenKind::Plus
        | TokenKind::Minus
        | TokenKind::Not
        | TokenKind::Tilde
        | TokenKind::Increment
        | TokenKind::Decrement
        | TokenKind::Star
        | TokenKind::And
        | TokenKind::Real
        | TokenKind::Imag => parse_unary_operator(parser),
        TokenKind::LogicAnd if parser.is_gnu() && matches!(parser.peek_kind(0), Some(TokenKind::Identifier(_))) => {
            parser.advance();
            let (symbol, _) = parser.expect_name()?;
            let label = parser.name_node(symbol, start + 1)?;
            parser.finish_node(NodeKind::LabelReference { label }, start)
        }
        TokenKind::Sizeof => parse_sizeof_like(parser, UnaryOp::Sizeof, TypeIdOp::Sizeof),
        TokenKind::Alignof => parse_sizeof_like(parser, UnaryOp::Alignof, TypeIdOp::Alignof),
        TokenKind::Typeid if parser.is_cpp() => parse_sizeof_like(parser, UnaryOp::Typeid, TypeIdOp::Typeid),
        TokenKind::Noexcept if parser.is_cpp() => {
            parser.advance();
            let operand = parse_parenthesized_expr(parser)?;
            parser.finish_node(
                NodeKind::Unary {
                    op: UnaryOp::Noexcept,
                    operand,
                },
                start,
            )
        }
        TokenKind::Throw if parser.is_cpp() => {
            parser.advance();
            let operand = if parser.matches(&[
                TokenKind::RightParen,
                TokenKind::Semicolon,
                TokenKind::Comma,
                TokenKind::Colon,
                TokenKind::RightBracket,
                TokenKind::RightBrace,
            ]) {
                None
            } else {
                Some(parser.parse_expr_assignment()?)
            };
            parser.finish_node(NodeKind::Throw { operand }, start)
        }
        TokenKind::StaticCast => parse_named_cast(parser, CastOp::Static),
        TokenKind::DynamicCast => parse_named_cast(parser, CastOp::Dynamic),
        TokenKind::ConstCast => parse_named_cast(parser, CastOp::Const),
        TokenKind::ReinterpretCast => parse_named_cast(parser, CastOp::Reinterpret),
        TokenKind::BuiltinVaArg => {
            parser.advance();
            parser.expect(TokenKind::LeftParen)?;
            let operand = parser.parse_expr_assignment()?;
            parser.expect(TokenKind::Comma)?;
            let type_id = parse_type_id(parser)?;
            parser.expect(TokenKind::RightParen)?;
            parser.finish_node(NodeKind::BuiltinVaArg { operand, type_id }, start)
        }
        TokenKind::BuiltinOffsetof => {
            parser.advance();
            parser.expect(TokenKind::LeftParen)?;
            let type_id = parse_type_id(parser)?;
            parser.expect(TokenKind::Comma)?;
            let member = parser.parse_expr_assignment()?;
            parser.expect(TokenKind::RightParen)?;
            parser.finish_node(NodeKind::BuiltinOffsetof { type_id, member }, start)
        }
        TokenKind::BuiltinTypesCompatible => {
            parser.advance();
            parser.expect(TokenKind::LeftParen)?;
            let first = parse_type_id(parser)?;
            parser.expect(TokenKind::Comma)?;
            let second = parse_type_id(parser)?;
            parser.expect(TokenKind::RightParen)?;
            parser.finish_node(NodeKind::TypesCompatible { first, second }, start)
        }
        TokenKind::LeftBracket if parser.is_cpp() => parse_lambda(parser),
        _ => Err(parser.unexpected("expression")),
    }
}

fn literal(parser: &mut Parser, kind: LiteralKind, value: Symbol) -> Result<NodeRef, ParseError> {
    let start = parser.current_idx;
    parser.advance();
    parser.finish_node(NodeKind::Literal { kind, value }, start)
}

fn keyword_literal(parser: &mut Parser, kind: LiteralKind, spelling: &str) -> Result<NodeRef, ParseError> {
    literal(parser, kind, Symbol::new(spelling))
}

/// `~x` with `x` not naming a class is the bitwise complement
fn is_bitwise_not(parser: &Parser) -> bool {
    parser.is_token(TokenKind::Tilde)
        && !matches!(parser.peek_kind(0), Some(TokenKind::Identifier(sym))
            if parser.type_context.lookup(sym).is_some_and(NameClass::is_type)
                && parser.peek_kind(1) == Some(TokenKind::LeftParen))
}

/// A type name directly followed by `(` or `{`
fn is_functional_cast(parser: &Parser) -> bool {
    let Some((end, class)) = scan_qualified_name(parser, parser.current_idx) else {
        return false;
    };
    class.is_type()
        && matches!(
            parser.tokens.get(end).map(|t| t.kind),
            Some(TokenKind::LeftParen | TokenKind::LeftBrace)
        )
}

/// `T(args)`, `T{args}`, `int(x)`
fn parse_simple_type_constructor(parser: &mut Parser) -> Result<NodeRef, ParseError> {
    let start = parser.current_idx;
    let decl_specifier = parse_decl_specifier(parser, DeclSpecOptions::type_id())?;
    let initializer = if parser.is_token(TokenKind::LeftBrace) {
        parse_initializer_list(parser)?
    } else {
        let init_start = parser.current_idx;
        parser.expect(TokenKind::LeftParen)?;
        let arguments = parse_expr_list(parser, BindingPower::ASSIGNMENT, TokenKind::RightParen)?;
        parser.expect(TokenKind::RightParen)?;
        parser.finish_node(NodeKind::ConstructorInitializer { arguments }, init_start)?
    };
    parser.finish_node(
        NodeKind::SimpleTypeConstructor {
            decl_specifier,
            initializer,
        },
        start,
    )
}

/// `(` starts a cast, a compound literal, a statement expression or a
/// parenthesized expression
fn parse_parenthesized_prefix(parser: &mut Parser) -> Result<NodeRef, ParseError> {
    let start = parser.current_idx;

    if parser.is_gnu() && parser.peek_kind(0) == Some(TokenKind::LeftBrace) {
        debug!("parse_parenthesized_prefix: statement expression");
        parser.advance();
        let body = parse_compound_statement(parser)?;
        parser.expect(TokenKind::RightParen)?;
        return parser.finish_node(NodeKind::CompoundStatementExpression { body }, start);
    }

    if parser.is_type_name_start_at(start + 1) {
        let cast = parser.speculate(|p| {
            p.advance();
            let type_id = parse_type_id(p)?;
            p.expect(TokenKind::RightParen)?;
            if p.is_token(TokenKind::LeftBrace) {
                let initializer = parse_initializer_list(p)?;
                return p.finish_node(NodeKind::TypeIdInitializerExpression { type_id, initializer }, start);
            }
            let operand = p.parse_expression(BindingPower::UNARY)?;
            p.finish_node(
                NodeKind::Cast {
                    op: CastOp::CStyle,
                    type_id,
                    operand,
                },
                start,
            )
        });
        if let Some(node) = cast {
            return Ok(node);
        }
        debug!("parse_parenthesized_prefix: not a cast, parsing as expression");
    }

    let operand = parse_parenthesized_expr(parser)?;
    parser.finish_node(
        NodeKind::Unary {
            op: UnaryOp::Bracketed,
            operand,
        },
        start,
    )
}

/// Parse unary operator
fn parse_unary_operator(parser: &mut Parser) -> Result<NodeRef, ParseError> {
    let start = parser.current_idx;
    let token = parser.current_token()?;
    let op = match token.kind {
        TokenKind::Plus => UnaryOp::Plus,
        TokenKind::Minus => UnaryOp::Minus,
        TokenKind::Not => UnaryOp::LogicNot,
        TokenKind::Tilde => UnaryOp::BitNot,
        TokenKind::Increment => UnaryOp::PreIncrement,
        TokenKind::Decrement => UnaryOp::PreDecrement,
        TokenKind::Star => UnaryOp::Deref,
        TokenKind::And => UnaryOp::AddrOf,
        TokenKind::Real => UnaryOp::Real,
        TokenKind::Imag => UnaryOp::Imag,
        _ => return Err(ParseError::syntax("invalid unary operator", token.span)),
    };

    parser.advance();
    let operand = parser.parse_expression(BindingPower::UNARY)?;
    parser.finish_node(NodeKind::Unary { op, operand }, start)
}

/// `sizeof`, `alignof` and `typeid`: a parenthesized type-id or an expression
fn parse_sizeof_like(parser: &mut Parser, unary: UnaryOp, type_op: TypeIdOp) -> Result<NodeRef, ParseError> {
    let start = parser.current_idx;
    parser.advance();

    if unary == UnaryOp::Sizeof && parser.is_cpp() && parser.accept(TokenKind::Ellipsis).is_some() {
        parser.expect(TokenKind::LeftParen)?;
        let name_start = parser.current_idx;
        let name = parse_name(parser)?;
        let operand = parser.finish_node(NodeKind::IdExpression { name }, name_start)?;
        parser.expect(TokenKind::RightParen)?;
        return parser.finish_node(
            NodeKind::Unary {
                op: UnaryOp::SizeofPack,
                operand,
            },
            start,
        );
    }

    if parser.is_token(TokenKind::LeftParen) && parser.is_type_name_start_at(parser.current_idx + 1) {
        let type_id = parser.speculate(|p| {
            p.advance();
            let type_id = parse_type_id(p)?;
            p.expect(TokenKind::RightParen)?;
            Ok(type_id)
        });
        if let Some(type_id) = type_id {
            return parser.finish_node(NodeKind::TypeIdExpression { op: type_op, type_id }, start);
        }
    }

    let operand = if unary == UnaryOp::Typeid {
        parse_parenthesized_expr(parser)?
    } else {
        parser.parse_expression(BindingPower::UNARY)?
    };
    parser.finish_node(NodeKind::Unary { op: unary, operand }, start)
}

/// `static_cast<T>(e)` and friends
fn parse_named_cast(parser: &mut Parser, op: CastOp) -> Result<NodeRef, ParseError> {
    let start = parser.current_idx;
    parser.advance();
    parser.expect(TokenKind::Less)?;
    let saved = std::mem::replace(&mut parser.greater_is_operator, false);
    let type_id = parse_type_id(parser);
    parser.greater_is_operator = saved;
    let type_id = type_id?;
    parser.expect(TokenKind::Greater)?;
    let operand = parse_parenthesized_expr(parser)?;
    parser.finish_node(NodeKind::Cast { op, type_id, operand }, start)
}

/// `::new (placement) T(init)`, `delete[] p`
fn parse_new_or_delete(parser: &mut Parser) -> Result<NodeRef, ParseError> {
    let start = parser.current_idx;
    let global = parser.accept(TokenKind::ColonColon).is_some();

    if parser.accept(TokenKind::Delete).is_some() {
        let array = parser.is_token(TokenKind::LeftBracket) && parser.peek_kind(0) == Some(TokenKind::RightBracket);
        if array {
            parser.advance();
            parser.advance();
        }
        let operand = parser.parse_expression(BindingPower::CAST)?;
        return parser.finish_node(NodeKind::Delete { global, array, operand }, start);
    }

    parser.expect(TokenKind::New)?;
    let mut placement = ThinVec::new();
    if parser.is_token(TokenKind::LeftParen) && !parser.is_type_name_start_at(parser.current_idx + 1) {
        parser.advance();
        placement = parse_expr_list(parser, BindingPower::ASSIGNMENT, TokenKind::RightParen)?;
        parser.expect(TokenKind::RightParen)?;
    }

    let type_id = if parser.accept(TokenKind::LeftParen).is_some() {
        let type_id = parse_type_id(parser)?;
        parser.expect(TokenKind::RightParen)?;
        type_id
    } else {
        parse_type_id_with(parser, DeclaratorMode::NewTypeId)?
    };

    let initializer = match parser.current_token_kind() {
        Some(TokenKind::LeftParen) => {
            let init_start = parser.current_idx;
            parser.advance();
            let arguments = parse_expr_list(parser, BindingPower::ASSIGNMENT, TokenKind::RightParen)?;
            parser.expect(TokenKind::RightParen)?;
            Some(parser.finish_node(NodeKind::ConstructorInitializer { arguments }, init_start)?)
        }
        Some(TokenKind::LeftBrace) => Some(parse_initializer_list(parser)?),
        _ => None,
    };

    parser.finish_node(
        NodeKind::New {
            global,
            placement,
            type_id,
            initializer,
        },
        start,
    )
}

/// `[captures](params) -> ret { body }`
fn parse_lambda(parser: &mut Parser) -> Result<NodeRef, ParseError> {
    let start = parser.current_idx;
    parser.expect(TokenKind::LeftBracket)?;

    let mut default_capture = CaptureDefault::None;
    let mut captures = ThinVec::new();
    while !parser.is_token(TokenKind::RightBracket) {
        let capture_start = parser.current_idx;
        match parser.current_token_kind() {
            Some(TokenKind::And) if matches!(parser.peek_kind(0), Some(TokenKind::Comma | TokenKind::RightBracket)) => {
                parser.advance();
                default_capture = CaptureDefault::ByReference;
            }
            Some(TokenKind::Assign) => {
                parser.advance();
                default_capture = CaptureDefault::ByCopy;
            }
            Some(TokenKind::This) => {
                parser.advance();
                captures.push(parser.finish_node(
                    NodeKind::Capture {
                        by_reference: false,
                        name: None,
                    },
                    capture_start,
                )?);
            }
            Some(TokenKind::Star) if parser.peek_kind(0) == Some(TokenKind::This) => {
                parser.advance();
                parser.advance();
                captures.push(parser.finish_node(
                    NodeKind::Capture {
                        by_reference: false,
                        name: None,
                    },
                    capture_start,
                )?);
            }
            _ => {
                let by_reference = parser.accept(TokenKind::And).is_some();
                let (symbol, _) = parser.expect_name()?;
                let name = parser.name_node(symbol, parser.current_idx - 1)?;
                parser.accept(TokenKind::Ellipsis);
                if parser.accept(TokenKind::Assign).is_some() {
                    // init-capture; the initializer is evaluated in the enclosing scope
                    parser.parse_expr_assignment()?;
                }
                captures.push(parser.finish_node(
                    NodeKind::Capture {
                        by_reference,
                        name: Some(name),
                    },
                    capture_start,
                )?);
            }
        }
        if parser.accept(TokenKind::Comma).is_none() {
            break;
        }
    }
    parser.expect(TokenKind::RightBracket)?;

    let declarator = if parser.is_token(TokenKind::LeftParen) {
        Some(super::declarator::parse_lambda_declarator(parser)?)
    } else {
        None
    };

    let body = parse_compound_statement(parser)?;
    parser.finish_node(
        NodeKind::Lambda {
            default_capture,
            captures,
            declarator,
            body,
        },
        start,
    )
}
