//! Expression list helpers and the speculation transaction

use thin_vec::ThinVec;

use crate::ast::*;
use crate::diagnostic::ParseError;

use super::expressions::BindingPower;
use super::{Parser, ParserState, TokenKind};

/// Common expression parsing patterns
pub(crate) mod expr_patterns {
    use super::*;

    /// Parse a parenthesized expression: (expression)
    pub(crate) fn parse_parenthesized_expr(parser: &mut Parser) -> Result<NodeRef, ParseError> {
        parser.expect(TokenKind::LeftParen)?;
        let saved = std::mem::replace(&mut parser.greater_is_operator, true);
        let expr = parser.parse_expr_min();
        parser.greater_is_operator = saved;
        let expr = expr?;
        parser.expect(TokenKind::RightParen)?;
        Ok(expr)
    }

    /// Parse a comma-separated list of expressions with specified binding power,
    /// up to (not including) `close`. Arguments may be braced lists in C++ and
    /// may end in a pack expansion.
    pub(crate) fn parse_expr_list(
        parser: &mut Parser,
        binding_power: BindingPower,
        close: TokenKind,
    ) -> Result<ThinVec<NodeRef>, ParseError> {
        let mut args = ThinVec::new();
        if parser.is_token(close) {
            return Ok(args);
        }

        let saved = std::mem::replace(&mut parser.greater_is_operator, true);
        let result = parse_list_items(parser, binding_power, &mut args);
        parser.greater_is_operator = saved;
        result?;

        Ok(args)
    }

    fn parse_list_items(
        parser: &mut Parser,
        binding_power: BindingPower,
        args: &mut ThinVec<NodeRef>,
    ) -> Result<(), ParseError> {
        loop {
            let start = parser.current_idx;
            let mut arg = if parser.is_cpp() && parser.is_token(TokenKind::LeftBrace) {
                crate::parser::initializers::parse_initializer_list(parser)?
            } else {
                parser.parse_expression(binding_power)?
            };
            if parser.is_cpp() && parser.accept(TokenKind::Ellipsis).is_some() {
                arg = parser.finish_node(NodeKind::PackExpansion { pattern: arg }, start)?;
            }
            args.push(arg);
            if parser.accept(TokenKind::Comma).is_none() {
                return Ok(());
            }
        }
    }
}

pub(crate) struct ParserTransaction<'a, 'arena, 'src> {
    pub(crate) parser: &'a mut Parser<'arena, 'src>,
    state: ParserState,
    committed: bool,
}

impl<'a, 'arena, 'src> ParserTransaction<'a, 'arena, 'src> {
    pub(crate) fn new(parser: &'a mut Parser<'arena, 'src>) -> Self {
        let state = parser.save_state();
        Self {
            parser,
            state,
            committed: false,
        }
    }

    pub(crate) fn commit(mut self) {
        self.committed = true;
    }
}

impl<'a, 'arena, 'src> Drop for ParserTransaction<'a, 'arena, 'src> {
    fn drop(&mut self) {
        if !self.committed {
            self.parser.restore_state(self.state.clone());
        }
    }
}
