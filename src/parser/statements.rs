//! Statement parsing module
//!
//! This module handles parsing of all statement types. A statement that
//! fails to parse is replaced by a problem statement covering the skipped
//! tokens, and parsing continues with the next statement.

use log::{debug, trace};
use thin_vec::ThinVec;

use crate::ast::*;
use crate::diagnostic::ParseError;
use crate::lexer::TokenKind;

use super::attributes::parse_cpp_attributes;
use super::declarations::parse_declaration;
use super::declarator::{DeclaratorMode, DeclaratorOptions, parse_declarator, parse_init_declarator, parse_parameter_declaration};
use super::decl_specifier::{DeclSpecOptions, parse_decl_specifier};
use super::initializers::parse_initializer_list;
use super::{Parser, ScopeKind};

/// Parse a statement, turning a failure into a problem statement
pub(crate) fn parse_statement_or_problem(parser: &mut Parser) -> Result<NodeRef, ParseError> {
    let start = parser.current_idx;
    match parse_statement(parser) {
        Ok(node) => Ok(node),
        Err(e) => parser.recover(e, start, NodeKind::ProblemStatement),
    }
}

/// Parse compound statement: `{ ... }`
pub(crate) fn parse_compound_statement(parser: &mut Parser) -> Result<NodeRef, ParseError> {
    let start = parser.current_idx;
    parser.expect(TokenKind::LeftBrace)?;
    parser.type_context.push_scope(ScopeKind::Block, None);
    let statements = parse_block_items(parser);
    parser.type_context.pop_scope();
    let mut statements = statements?;

    if parser.at_end() {
        let error = ParseError::UnexpectedEof {
            location: parser.previous_token_span(),
        };
        parser.diag.report_parse_error(&error);
        let idx = parser.current_idx;
        statements.push(parser.finish_node(NodeKind::ProblemStatement(ProblemId::UnexpectedEndOfInput), idx)?);
    } else {
        parser.expect(TokenKind::RightBrace)?;
    }
    parser.finish_node(NodeKind::CompoundStatement { statements }, start)
}

fn parse_block_items(parser: &mut Parser) -> Result<ThinVec<NodeRef>, ParseError> {
    let mut statements = ThinVec::new();
    while !parser.is_token(TokenKind::RightBrace) && !parser.at_end() {
        statements.push(parse_statement_or_problem(parser)?);
    }
    Ok(statements)
}

/// Parse a statement
pub(crate) fn parse_statement(parser: &mut Parser) -> Result<NodeRef, ParseError> {
    parser.nested(parse_nested_statement)
}

fn parse_nested_statement(parser: &mut Parser) -> Result<NodeRef, ParseError> {
    let start = parser.current_idx;
    let attributes = parse_cpp_attributes(parser)?;
    let token = parser.current_token()?;
    trace!("parse_statement: {:?}", token.kind);

    let node = match token.kind {
        TokenKind::LeftBrace => parse_compound_statement(parser)?,
        TokenKind::Semicolon => {
            parser.advance();
            parser.finish_node(NodeKind::NullStatement, start)?
        }
        TokenKind::If => parse_if_statement(parser)?,
        TokenKind::Switch => parse_switch_statement(parser)?,
        TokenKind::While => parse_while_statement(parser)?,
        TokenKind::Do => parse_do_while_statement(parser)?,
        TokenKind::For => parse_for_statement(parser)?,
        TokenKind::Break => {
            parser.advance();
            parser.expect(TokenKind::Semicolon)?;
            parser.finish_node(NodeKind::BreakStatement, start)?
        }
        TokenKind::Continue => {
            parser.advance();
            parser.expect(TokenKind::Semicolon)?;
            parser.finish_node(NodeKind::ContinueStatement, start)?
        }
        TokenKind::Return => parse_return_statement(parser)?,
        TokenKind::Goto => parse_goto_statement(parser)?,
        TokenKind::Case => parse_case_statement(parser)?,
        TokenKind::Default => {
            parser.advance();
            parser.expect(TokenKind::Colon)?;
            parser.finish_node(NodeKind::DefaultStatement, start)?
        }
        TokenKind::Try if parser.is_cpp() => parse_try_block(parser)?,
        TokenKind::Identifier(symbol) if parser.peek_kind(0) == Some(TokenKind::Colon) => {
            parser.advance();
            let name = parser.name_node(symbol, start)?;
            parser.advance();
            let statement = parse_statement_or_problem(parser)?;
            parser.finish_node(NodeKind::LabelStatement { name, statement }, start)?
        }
        _ => parse_declaration_or_expression_statement(parser)?,
    };
    parser.attach_attributes(node, attributes)?;
    Ok(node)
}

fn parse_declaration_statement(parser: &mut Parser) -> Result<NodeRef, ParseError> {
    let start = parser.current_idx;
    let declaration = parse_declaration(parser)?;
    parser.finish_node(NodeKind::DeclarationStatement { declaration }, start)
}

fn parse_expression_statement(parser: &mut Parser) -> Result<NodeRef, ParseError> {
    let start = parser.current_idx;
    let expression = parser.parse_expr_min()?;
    parser.expect(TokenKind::Semicolon)?;
    parser.finish_node(NodeKind::ExpressionStatement { expression }, start)
}

/// Statements starting with a name may be declarations or expressions;
/// the declaration reading is tried first.
fn parse_declaration_or_expression_statement(parser: &mut Parser) -> Result<NodeRef, ParseError> {
    let kind = parser.current_token_kind();
    let name_start = matches!(kind, Some(TokenKind::Identifier(_) | TokenKind::ColonColon));
    let undeclared_type = matches!(kind, Some(TokenKind::Identifier(s)) if parser.type_context.lookup(s).is_none())
        && matches!(parser.peek_kind(0), Some(TokenKind::Identifier(_)));

    if parser.starts_declaration() && !name_start {
        return parse_declaration_statement(parser);
    }
    if parser.starts_declaration() || undeclared_type {
        if let Some(node) = parser.speculate(parse_declaration_statement) {
            return Ok(node);
        }
        debug!("parse_declaration_or_expression_statement: not a declaration");
    }
    parse_expression_statement(parser)
}

/// `;` inside the parenthesis of a selection statement introduces an init-statement
fn has_init_statement(parser: &Parser) -> bool {
    let mut depth = 0i32;
    for token in &parser.tokens[parser.current_idx..] {
        match token.kind {
            TokenKind::LeftParen | TokenKind::LeftBrace | TokenKind::LeftBracket => depth += 1,
            TokenKind::RightParen | TokenKind::RightBrace | TokenKind::RightBracket => {
                if depth == 0 {
                    return false;
                }
                depth -= 1;
            }
            TokenKind::Semicolon => return depth == 0,
            TokenKind::EndOfFile => return false,
            _ => {}
        }
    }
    false
}

fn parse_init_statement(parser: &mut Parser) -> Result<Option<NodeRef>, ParseError> {
    if !parser.is_cpp() || !has_init_statement(parser) {
        return Ok(None);
    }
    if parser.is_token(TokenKind::Semicolon) {
        let start = parser.current_idx;
        parser.advance();
        return Ok(Some(parser.finish_node(NodeKind::NullStatement, start)?));
    }
    parse_declaration_or_expression_statement(parser).map(Some)
}

/// Expression, or in C++ a declaration with an initializer
fn parse_condition(parser: &mut Parser) -> Result<NodeRef, ParseError> {
    if parser.is_cpp() && parser.starts_declaration() {
        let declaration = parser.speculate(|p| {
            let start = p.current_idx;
            let decl_specifier = parse_decl_specifier(p, DeclSpecOptions::declaration())?;
            let declarator = parse_init_declarator(p, DeclaratorOptions::new(DeclaratorMode::Named))?;
            let has_initializer =
                matches!(p.kind(declarator), NodeKind::Declarator(data) if data.initializer.is_some());
            if !has_initializer || !p.matches(&[TokenKind::RightParen, TokenKind::Semicolon]) {
                return Err(p.unexpected("condition declaration"));
            }
            if let Some(symbol) = p.declarator_symbol(declarator) {
                p.type_context.declare(symbol, super::NameClass::Value);
            }
            let mut declarators = ThinVec::new();
            declarators.push(declarator);
            p.finish_node(
                NodeKind::SimpleDeclaration {
                    decl_specifier,
                    declarators,
                },
                start,
            )
        });
        if let Some(declaration) = declaration {
            return Ok(declaration);
        }
    }
    let saved = std::mem::replace(&mut parser.greater_is_operator, true);
    let condition = parser.parse_expr_min();
    parser.greater_is_operator = saved;
    condition
}

/// A condition that fails to parse becomes a problem expression covering
/// the tokens up to the closing parenthesis.
fn parse_condition_or_problem(parser: &mut Parser) -> Result<NodeRef, ParseError> {
    let start = parser.current_idx;
    match parse_condition(parser) {
        Ok(condition) => Ok(condition),
        Err(ParseError::Ast(e)) => Err(ParseError::Ast(e)),
        Err(e) => {
            debug!("parse_condition_or_problem: {}", e);
            parser.diag.report_parse_error(&e);
            let mut depth = 0usize;
            while let Some(kind) = parser.current_token_kind() {
                match kind {
                    TokenKind::LeftParen => depth += 1,
                    TokenKind::RightParen if depth == 0 => break,
                    TokenKind::RightParen => depth -= 1,
                    TokenKind::LeftBrace | TokenKind::Semicolon if depth == 0 => break,
                    _ => {}
                }
                parser.advance();
            }
            parser.finish_node(NodeKind::ProblemExpression(Parser::problem_id(&e)), start)
        }
    }
}

/// Parse if statement
fn parse_if_statement(parser: &mut Parser) -> Result<NodeRef, ParseError> {
    let start = parser.current_idx;
    parser.expect(TokenKind::If)?;
    let constexpr = parser.is_cpp() && parser.accept(TokenKind::Constexpr).is_some();
    parser.expect(TokenKind::LeftParen)?;

    parser.type_context.push_scope(ScopeKind::Block, None);
    let result = parse_if_rest(parser);
    parser.type_context.pop_scope();
    let (init, condition, then_clause, else_clause) = result?;

    parser.finish_node(
        NodeKind::IfStatement {
            init,
            condition,
            then_clause,
            else_clause,
            constexpr,
        },
        start,
    )
}

type IfParts = (Option<NodeRef>, NodeRef, NodeRef, Option<NodeRef>);

fn parse_if_rest(parser: &mut Parser) -> Result<IfParts, ParseError> {
    let init = parse_init_statement(parser)?;
    let condition = parse_condition_or_problem(parser)?;
    parser.expect(TokenKind::RightParen)?;
    let then_clause = parse_statement_or_problem(parser)?;
    let else_clause = if parser.accept(TokenKind::Else).is_some() {
        Some(parse_statement_or_problem(parser)?)
    } else {
        None
    };
    Ok((init, condition, then_clause, else_clause))
}

/// Parse switch statement
fn parse_switch_statement(parser: &mut Parser) -> Result<NodeRef, ParseError> {
    let start = parser.current_idx;
    parser.expect(TokenKind::Switch)?;
    parser.expect(TokenKind::LeftParen)?;

    parser.type_context.push_scope(ScopeKind::Block, None);
    let result = (|| -> Result<_, ParseError> {
        let init = parse_init_statement(parser)?;
        let controller = parse_condition_or_problem(parser)?;
        parser.expect(TokenKind::RightParen)?;
        let body = parse_statement_or_problem(parser)?;
        Ok((init, controller, body))
    })();
    parser.type_context.pop_scope();
    let (init, controller, body) = result?;

    parser.finish_node(NodeKind::SwitchStatement { init, controller, body }, start)
}

/// Parse while statement
fn parse_while_statement(parser: &mut Parser) -> Result<NodeRef, ParseError> {
    let start = parser.current_idx;
    parser.expect(TokenKind::While)?;
    parser.expect(TokenKind::LeftParen)?;
    let condition = parse_condition_or_problem(parser)?;
    parser.expect(TokenKind::RightParen)?;
    let body = parse_statement_or_problem(parser)?;
    parser.finish_node(NodeKind::WhileStatement { condition, body }, start)
}

/// Parse do-while statement
fn parse_do_while_statement(parser: &mut Parser) -> Result<NodeRef, ParseError> {
    let start = parser.current_idx;
    parser.expect(TokenKind::Do)?;
    let body = parse_statement_or_problem(parser)?;
    parser.expect(TokenKind::While)?;
    parser.expect(TokenKind::LeftParen)?;
    let condition = parse_condition_or_problem(parser)?;
    parser.expect(TokenKind::RightParen)?;
    parser.expect(TokenKind::Semicolon)?;
    parser.finish_node(NodeKind::DoStatement { body, condition }, start)
}

/// Parse for statement, including the C++ range-based form
fn parse_for_statement(parser: &mut Parser) -> Result<NodeRef, ParseError> {
    let start = parser.current_idx;
    parser.expect(TokenKind::For)?;
    parser.expect(TokenKind::LeftParen)?;

    parser.type_context.push_scope(ScopeKind::Block, None);
    let result = parse_for_rest(parser, start);
    parser.type_context.pop_scope();
    result
}

fn parse_for_rest(parser: &mut Parser, start: usize) -> Result<NodeRef, ParseError> {
    if parser.is_cpp() && parser.starts_declaration() {
        let range_declaration = parser.speculate(|p| {
            let decl_start = p.current_idx;
            let decl_specifier = parse_decl_specifier(p, DeclSpecOptions::declaration())?;
            let declarator = parse_declarator(p, DeclaratorOptions::new(DeclaratorMode::Named))?;
            if !p.is_token(TokenKind::Colon) {
                return Err(p.unexpected("':'"));
            }
            if let Some(symbol) = p.declarator_symbol(declarator) {
                p.type_context.declare(symbol, super::NameClass::Value);
            }
            let mut declarators = ThinVec::new();
            declarators.push(declarator);
            p.finish_node(
                NodeKind::SimpleDeclaration {
                    decl_specifier,
                    declarators,
                },
                decl_start,
            )
        });
        if let Some(declaration) = range_declaration {
            parser.expect(TokenKind::Colon)?;
            let initializer = if parser.is_token(TokenKind::LeftBrace) {
                parse_initializer_list(parser)?
            } else {
                parser.parse_expr_min()?
            };
            parser.expect(TokenKind::RightParen)?;
            let body = parse_statement_or_problem(parser)?;
            return parser.finish_node(
                NodeKind::RangeBasedForStatement {
                    declaration,
                    initializer,
                    body,
                },
                start,
            );
        }
    }

    let init = if parser.is_token(TokenKind::Semicolon) {
        let init_start = parser.current_idx;
        parser.advance();
        parser.finish_node(NodeKind::NullStatement, init_start)?
    } else {
        parse_declaration_or_expression_statement(parser)?
    };

    let condition = if parser.is_token(TokenKind::Semicolon) {
        None
    } else {
        Some(parse_condition_or_problem(parser)?)
    };
    parser.expect(TokenKind::Semicolon)?;

    let iteration = if parser.is_token(TokenKind::RightParen) {
        None
    } else {
        Some(parser.parse_expr_min()?)
    };
    parser.expect(TokenKind::RightParen)?;

    let body = parse_statement_or_problem(parser)?;
    parser.finish_node(
        NodeKind::ForStatement {
            init,
            condition,
            iteration,
            body,
        },
        start,
    )
}

/// Parse return statement
fn parse_return_statement(parser: &mut Parser) -> Result<NodeRef, ParseError> {
    let start = parser.current_idx;
    parser.expect(TokenKind::Return)?;
    let value = if parser.is_token(TokenKind::Semicolon) {
        None
    } else if parser.is_cpp() && parser.is_token(TokenKind::LeftBrace) {
        Some(parse_initializer_list(parser)?)
    } else {
        Some(parser.parse_expr_min()?)
    };
    parser.expect(TokenKind::Semicolon)?;
    parser.finish_node(NodeKind::ReturnStatement { value }, start)
}

/// Parse goto statement, including the GNU computed form `goto *p;`
fn parse_goto_statement(parser: &mut Parser) -> Result<NodeRef, ParseError> {
    let start = parser.current_idx;
    parser.expect(TokenKind::Goto)?;
    let label = if parser.is_gnu() && parser.is_token(TokenKind::Star) {
        parser.parse_expr_min()?
    } else {
        let (symbol, _) = parser.expect_name()?;
        parser.name_node(symbol, parser.current_idx - 1)?
    };
    parser.expect(TokenKind::Semicolon)?;
    parser.finish_node(NodeKind::GotoStatement { label }, start)
}

/// Parse case label, including the GNU range form `case 1 ... 3:`
fn parse_case_statement(parser: &mut Parser) -> Result<NodeRef, ParseError> {
    let start = parser.current_idx;
    parser.expect(TokenKind::Case)?;
    let expression = parser.parse_expr_conditional()?;
    let range_end = if parser.is_gnu() && parser.accept(TokenKind::Ellipsis).is_some() {
        Some(parser.parse_expr_conditional()?)
    } else {
        None
    };
    parser.expect(TokenKind::Colon)?;
    parser.finish_node(NodeKind::CaseStatement { expression, range_end }, start)
}

/// `try { ... } catch (T e) { ... } catch (...) { ... }`
fn parse_try_block(parser: &mut Parser) -> Result<NodeRef, ParseError> {
    let start = parser.current_idx;
    parser.expect(TokenKind::Try)?;
    let body = parse_compound_statement(parser)?;
    let handlers = parse_catch_handlers(parser)?;
    parser.finish_node(NodeKind::TryBlockStatement { body, handlers }, start)
}

/// Zero or more `catch` clauses
pub(crate) fn parse_catch_handlers(parser: &mut Parser) -> Result<ThinVec<NodeRef>, ParseError> {
    let mut handlers = ThinVec::new();
    while parser.is_token(TokenKind::Catch) {
        let start = parser.current_idx;
        parser.advance();
        parser.expect(TokenKind::LeftParen)?;
        parser.type_context.push_scope(ScopeKind::Block, None);
        let result = (|| -> Result<_, ParseError> {
            let declaration = if parser.accept(TokenKind::Ellipsis).is_some() {
                None
            } else {
                let declaration = parse_parameter_declaration(parser)?;
                if let NodeKind::ParameterDeclaration { declarator, .. } = *parser.kind(declaration)
                    && let Some(symbol) = parser.declarator_symbol(declarator)
                {
                    parser.type_context.declare(symbol, super::NameClass::Value);
                }
                Some(declaration)
            };
            parser.expect(TokenKind::RightParen)?;
            let body = parse_compound_statement(parser)?;
            Ok((declaration, body))
        })();
        parser.type_context.pop_scope();
        let (declaration, body) = result?;
        handlers.push(parser.finish_node(NodeKind::CatchHandler { declaration, body }, start)?);
    }
    Ok(handlers)
}
