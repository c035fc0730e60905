//! Initializer clauses and brace-enclosed initializer lists, with C99 and
//! GNU designators.

use thin_vec::ThinVec;

use crate::ast::*;
use crate::diagnostic::ParseError;
use crate::lexer::TokenKind;

use super::Parser;

/// `{ ... }` or an assignment expression
pub(crate) fn parse_initializer_clause(parser: &mut Parser) -> Result<NodeRef, ParseError> {
    let start = parser.current_idx;
    let clause = if parser.is_token(TokenKind::LeftBrace) {
        parse_initializer_list(parser)?
    } else {
        parser.parse_expr_assignment()?
    };
    if parser.is_cpp() && parser.accept(TokenKind::Ellipsis).is_some() {
        return parser.finish_node(NodeKind::PackExpansion { pattern: clause }, start);
    }
    Ok(clause)
}

/// `{ clause, .field = clause, [2] = clause, }`
pub(crate) fn parse_initializer_list(parser: &mut Parser) -> Result<NodeRef, ParseError> {
    let start = parser.current_idx;
    parser.expect(TokenKind::LeftBrace)?;
    let saved = std::mem::replace(&mut parser.greater_is_operator, true);
    let clauses = parser.nested(parse_clauses);
    parser.greater_is_operator = saved;
    let clauses = clauses?;
    parser.expect(TokenKind::RightBrace)?;
    parser.finish_node(NodeKind::InitializerList { clauses }, start)
}

fn parse_clauses(parser: &mut Parser) -> Result<ThinVec<NodeRef>, ParseError> {
    let mut clauses = ThinVec::new();
    while !parser.is_token(TokenKind::RightBrace) {
        clauses.push(parse_designated_clause(parser)?);
        if parser.accept(TokenKind::Comma).is_none() {
            break;
        }
    }
    Ok(clauses)
}

fn starts_designator(parser: &Parser) -> bool {
    match parser.current_token_kind() {
        Some(TokenKind::Dot) => matches!(parser.peek_kind(0), Some(TokenKind::Identifier(_))),
        Some(TokenKind::LeftBracket) => !parser.is_cpp(),
        // GNU `field: value`
        Some(TokenKind::Identifier(_)) => {
            parser.is_gnu() && !parser.is_cpp() && parser.peek_kind(0) == Some(TokenKind::Colon)
        }
        _ => false,
    }
}

fn parse_designated_clause(parser: &mut Parser) -> Result<NodeRef, ParseError> {
    if !starts_designator(parser) {
        return parse_initializer_clause(parser);
    }
    let start = parser.current_idx;
    let mut designators = ThinVec::new();

    if let Some(TokenKind::Identifier(symbol)) = parser.current_token_kind()
        && parser.peek_kind(0) == Some(TokenKind::Colon)
    {
        parser.advance();
        let name = parser.name_node(symbol, start)?;
        designators.push(parser.finish_node(NodeKind::FieldDesignator { name }, start)?);
        parser.advance();
        let value = parse_initializer_clause(parser)?;
        return parser.finish_node(NodeKind::DesignatedInitializer { designators, value }, start);
    }

    loop {
        let designator_start = parser.current_idx;
        match parser.current_token_kind() {
            Some(TokenKind::Dot) => {
                parser.advance();
                let (symbol, _) = parser.expect_name()?;
                let name = parser.name_node(symbol, parser.current_idx - 1)?;
                designators.push(parser.finish_node(NodeKind::FieldDesignator { name }, designator_start)?);
            }
            Some(TokenKind::LeftBracket) => {
                parser.advance();
                let low = parser.parse_expr_conditional()?;
                let designator = if parser.is_gnu() && parser.accept(TokenKind::Ellipsis).is_some() {
                    let high = parser.parse_expr_conditional()?;
                    NodeKind::ArrayRangeDesignator { low, high }
                } else {
                    NodeKind::ArrayDesignator { index: low }
                };
                parser.expect(TokenKind::RightBracket)?;
                designators.push(parser.finish_node(designator, designator_start)?);
            }
            _ => break,
        }
    }

    // GNU allows `[2] value` without the `=`
    if parser.accept(TokenKind::Assign).is_none() && !parser.is_gnu() {
        return Err(parser.unexpected("'='"));
    }
    let value = parse_initializer_clause(parser)?;
    parser.finish_node(NodeKind::DesignatedInitializer { designators, value }, start)
}
