//! Name parsing: identifiers, qualified names, destructor, operator and
//! conversion function names, template-ids.

use log::trace;
use thin_vec::ThinVec;

use crate::ast::*;
use crate::diagnostic::ParseError;
use crate::lexer::TokenKind;

use super::declarator::{DeclaratorMode, DeclaratorOptions, parse_declarator};
use super::decl_specifier::{DeclSpecOptions, parse_decl_specifier};
use super::templates::parse_template_arguments;
use super::{NameClass, Parser};

/// Index after the `>` matching the `<` at `idx`, if the list is balanced
/// before the end of the statement.
pub(crate) fn skip_angle_brackets(parser: &Parser, idx: usize) -> Option<usize> {
    let tokens = parser.tokens;
    let mut angle = 0i32;
    let mut paren = 0i32;
    let mut i = idx;
    while let Some(token) = tokens.get(i) {
        match token.kind {
            TokenKind::Less if paren == 0 => angle += 1,
            TokenKind::Greater if paren == 0 => {
                angle -= 1;
                if angle == 0 {
                    return Some(i + 1);
                }
            }
            TokenKind::LeftParen | TokenKind::LeftBracket => paren += 1,
            TokenKind::RightParen | TokenKind::RightBracket => {
                paren -= 1;
                if paren < 0 {
                    return None;
                }
            }
            TokenKind::Semicolon | TokenKind::LeftBrace | TokenKind::RightBrace | TokenKind::EndOfFile => {
                return None;
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Classify the possibly qualified name starting at token `idx` without
/// consuming anything. Returns the index after the name and what its last
/// segment denotes.
pub(crate) fn scan_qualified_name(parser: &Parser, idx: usize) -> Option<(usize, NameClass)> {
    let tokens = parser.tokens;
    let kind_at = |i: usize| tokens.get(i).map(|t| t.kind);
    let mut i = idx;
    if kind_at(i) == Some(TokenKind::ColonColon) {
        i += 1;
    }
    let mut scope: Option<Symbol> = None;
    loop {
        if kind_at(i) == Some(TokenKind::Template) {
            i += 1;
        }
        let Some(TokenKind::Identifier(symbol)) = kind_at(i) else {
            return None;
        };
        i += 1;
        let class = match scope {
            None => parser.type_context.lookup(symbol),
            Some(owner) => parser.type_context.lookup_member(owner, symbol),
        };
        if kind_at(i) == Some(TokenKind::Less) && class.is_some_and(NameClass::is_template) {
            i = skip_angle_brackets(parser, i)?;
        }
        if parser.is_cpp()
            && kind_at(i) == Some(TokenKind::ColonColon)
            && matches!(kind_at(i + 1), Some(TokenKind::Identifier(_)) | Some(TokenKind::Template))
        {
            scope = Some(symbol);
            i += 1;
            continue;
        }
        let class = match class {
            // a class template named without arguments inside its own body
            Some(NameClass::ClassTemplate) => NameClass::Type,
            Some(class) => class,
            None => return None,
        };
        return Some((i, class));
    }
}

/// `C::C(`, `C::~C` or `C::operator`: an out-of-class constructor,
/// destructor or conversion function, which has no decl-specifier
pub(crate) fn is_qualified_constructor(parser: &Parser) -> bool {
    let tokens = parser.tokens;
    let kind_at = |i: usize| tokens.get(i).map(|t| t.kind);
    let mut i = parser.current_idx;
    if kind_at(i) == Some(TokenKind::ColonColon) {
        i += 1;
    }
    let mut previous: Option<Symbol> = None;
    loop {
        match kind_at(i) {
            Some(TokenKind::Identifier(symbol)) => {
                i += 1;
                if kind_at(i) == Some(TokenKind::Less) {
                    match skip_angle_brackets(parser, i) {
                        Some(next) => i = next,
                        None => return false,
                    }
                }
                if kind_at(i) == Some(TokenKind::ColonColon) {
                    previous = Some(symbol);
                    i += 1;
                    continue;
                }
                return previous == Some(symbol) && kind_at(i) == Some(TokenKind::LeftParen);
            }
            Some(TokenKind::Tilde) => return previous.is_some(),
            Some(TokenKind::Operator) => return previous.is_some(),
            _ => return false,
        }
    }
}

fn overloaded_operator(kind: TokenKind) -> Option<OverloadedOperator> {
    use OverloadedOperator as O;
    let op = match kind {
        TokenKind::Plus => O::Plus,
        TokenKind::Minus => O::Minus,
        TokenKind::Star => O::Star,
        TokenKind::Slash => O::Slash,
        TokenKind::Percent => O::Percent,
        TokenKind::Xor => O::Caret,
        TokenKind::And => O::Amper,
        TokenKind::Or => O::Pipe,
        TokenKind::Tilde => O::Tilde,
        TokenKind::Not => O::Not,
        TokenKind::Assign => O::Assign,
        TokenKind::Less => O::Less,
        TokenKind::Greater => O::Greater,
        TokenKind::PlusAssign => O::PlusAssign,
        TokenKind::MinusAssign => O::MinusAssign,
        TokenKind::StarAssign => O::StarAssign,
        TokenKind::DivAssign => O::SlashAssign,
        TokenKind::ModAssign => O::PercentAssign,
        TokenKind::XorAssign => O::CaretAssign,
        TokenKind::AndAssign => O::AmperAssign,
        TokenKind::OrAssign => O::PipeAssign,
        TokenKind::LeftShift => O::ShiftLeft,
        TokenKind::RightShift => O::ShiftRight,
        TokenKind::LeftShiftAssign => O::ShiftLeftAssign,
        TokenKind::RightShiftAssign => O::ShiftRightAssign,
        TokenKind::Equal => O::Equal,
        TokenKind::NotEqual => O::NotEqual,
        TokenKind::LessEqual => O::LessEqual,
        TokenKind::GreaterEqual => O::GreaterEqual,
        TokenKind::LogicAnd => O::LogicAnd,
        TokenKind::LogicOr => O::LogicOr,
        TokenKind::Increment => O::Increment,
        TokenKind::Decrement => O::Decrement,
        TokenKind::Comma => O::Comma,
        TokenKind::ArrowStar => O::ArrowStar,
        TokenKind::Arrow => O::Arrow,
        _ => return None,
    };
    Some(op)
}

/// `operator @`, `operator new[]`, `operator()` or a conversion function name
fn parse_operator_name(parser: &mut Parser) -> Result<NodeRef, ParseError> {
    let start = parser.current_idx;
    parser.expect(TokenKind::Operator)?;
    let token = parser.current_token()?;
    let op = match token.kind {
        TokenKind::New | TokenKind::Delete => {
            parser.advance();
            let array = parser.is_token(TokenKind::LeftBracket) && parser.peek_kind(0) == Some(TokenKind::RightBracket);
            if array {
                parser.advance();
                parser.advance();
            }
            match (token.kind, array) {
                (TokenKind::New, false) => OverloadedOperator::New,
                (TokenKind::New, true) => OverloadedOperator::NewArray,
                (_, false) => OverloadedOperator::Delete,
                (_, true) => OverloadedOperator::DeleteArray,
            }
        }
        TokenKind::LeftParen => {
            parser.advance();
            parser.expect(TokenKind::RightParen)?;
            OverloadedOperator::Call
        }
        TokenKind::LeftBracket => {
            parser.advance();
            parser.expect(TokenKind::RightBracket)?;
            OverloadedOperator::Subscript
        }
        TokenKind::Greater if parser.at_split_shift() => {
            parser.advance();
            parser.advance();
            OverloadedOperator::ShiftRight
        }
        kind => match overloaded_operator(kind) {
            Some(op) => {
                parser.advance();
                op
            }
            None => {
                // conversion function: operator type-specifier-seq ptr-operators
                let type_start = parser.current_idx;
                let decl_specifier = parse_decl_specifier(parser, DeclSpecOptions::type_id())?;
                let declarator = parse_declarator(parser, DeclaratorOptions::new(DeclaratorMode::Conversion))?;
                let type_id = parser.finish_node(
                    NodeKind::TypeId {
                        decl_specifier,
                        declarator,
                    },
                    type_start,
                )?;
                return parser.finish_node(NodeKind::ConversionName { type_id }, start);
            }
        },
    };
    parser.finish_node(NodeKind::OperatorName(op), start)
}

/// One segment of a (qualified) name
fn parse_unqualified_name(
    parser: &mut Parser,
    scope: Option<Symbol>,
    force_template: bool,
) -> Result<(NodeRef, Option<Symbol>), ParseError> {
    let start = parser.current_idx;
    let token = parser.current_token()?;
    match token.kind {
        TokenKind::Identifier(symbol) => {
            parser.advance();
            let name = parser.name_node(symbol, start)?;
            let is_template = force_template
                || match scope {
                    None => parser.type_context.lookup(symbol),
                    Some(owner) => parser.type_context.lookup_member(owner, symbol),
                }
                .is_some_and(NameClass::is_template);
            if parser.is_cpp() && is_template && parser.is_token(TokenKind::Less) {
                let arguments = parse_template_arguments(parser)?;
                let id = parser.finish_node(
                    NodeKind::TemplateId {
                        template_name: name,
                        arguments,
                    },
                    start,
                )?;
                return Ok((id, Some(symbol)));
            }
            Ok((name, Some(symbol)))
        }
        TokenKind::Tilde if parser.is_cpp() => {
            parser.advance();
            let (class_name, _) = parser.expect_name()?;
            let name = parser.finish_node(NodeKind::Name(Symbol::new(format!("~{class_name}"))), start)?;
            Ok((name, None))
        }
        TokenKind::Operator if parser.is_cpp() => {
            let name = parse_operator_name(parser)?;
            if parser.is_token(TokenKind::Less) && force_template {
                let arguments = parse_template_arguments(parser)?;
                let id = parser.finish_node(
                    NodeKind::TemplateId {
                        template_name: name,
                        arguments,
                    },
                    start,
                )?;
                return Ok((id, None));
            }
            Ok((name, None))
        }
        _ => Err(parser.unexpected("name")),
    }
}

/// Parse a name, qualified in C++: `::a::b<int>::c`, `~C`, `operator+`
pub(crate) fn parse_name(parser: &mut Parser) -> Result<NodeRef, ParseError> {
    let start = parser.current_idx;
    let fully_qualified = parser.is_cpp() && parser.accept(TokenKind::ColonColon).is_some();
    let mut segments = ThinVec::new();
    let mut scope = None;
    loop {
        let force_template = parser.is_cpp() && parser.accept(TokenKind::Template).is_some();
        let (segment, symbol) = parse_unqualified_name(parser, scope, force_template)?;
        segments.push(segment);
        let continues = parser.is_cpp()
            && symbol.is_some()
            && parser.is_token(TokenKind::ColonColon)
            && matches!(
                parser.peek_kind(0),
                Some(TokenKind::Identifier(_) | TokenKind::Tilde | TokenKind::Template | TokenKind::Operator)
            );
        if !continues {
            break;
        }
        parser.advance();
        scope = symbol;
    }
    if segments.len() == 1 && !fully_qualified {
        return Ok(segments[0]);
    }
    trace!("parse_name: qualified name with {} segments", segments.len());
    parser.finish_node(
        NodeKind::QualifiedName {
            segments,
            fully_qualified,
        },
        start,
    )
}

/// Last segment of a name node, looking through qualified names and template-ids
pub(crate) fn last_name_symbol(ast: &Ast, name: NodeRef) -> Option<Symbol> {
    match ast.get_kind(name) {
        NodeKind::Name(symbol) => Some(*symbol),
        NodeKind::TemplateId { template_name, .. } => last_name_symbol(ast, *template_name),
        NodeKind::QualifiedName { segments, .. } => segments.last().and_then(|s| last_name_symbol(ast, *s)),
        _ => None,
    }
}

