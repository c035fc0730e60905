//! Declaration parsing module
//!
//! This module handles all declaration parsing logic: simple declarations,
//! function definitions (including the pre-standard C form with an
//! identifier list), and the C++ declaration forms for namespaces,
//! `using`, linkage specifications and templates. It also parses the
//! translation unit.

use log::{debug, trace};
use thin_vec::ThinVec;

use crate::ast::signature::{declarator_name, declares_function, function_declarator, token_signature};
use crate::ast::*;
use crate::diagnostic::ParseError;
use crate::lexer::TokenKind;

use super::attributes::parse_cpp_attributes;
use super::decl_specifier::{DeclSpecOptions, parse_decl_specifier};
use super::declarator::{
    DeclaratorMode, DeclaratorOptions, parse_declarator, parse_declarator_initializer, parse_init_declarator,
    parse_type_id,
};
use super::initializers::parse_initializer_list;
use super::names::{last_name_symbol, parse_name, scan_qualified_name};
use super::statements::{parse_catch_handlers, parse_compound_statement};
use super::templates::parse_template_declaration;
use super::utils::expr_patterns::parse_expr_list;
use super::{BindingPower, NameClass, Parser, ScopeKind};

/// Where a simple declaration appears
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeclContext {
    File,
    Block,
    Member(Option<Symbol>),
}

/// Parse the whole token stream into a translation unit node
pub(crate) fn parse_translation_unit(parser: &mut Parser) -> Result<NodeRef, ParseError> {
    let mut declarations = ThinVec::new();
    while !parser.at_end() {
        let start = parser.current_idx;
        if parser.is_token(TokenKind::RightBrace) {
            let error = parser.unexpected("declaration");
            parser.diag.report_parse_error(&error);
            parser.advance();
            declarations.push(parser.finish_node(NodeKind::ProblemDeclaration(ProblemId::SyntaxError), start)?);
            continue;
        }
        let declaration = match parse_external_declaration(parser) {
            Ok(declaration) => declaration,
            Err(e) => parser.recover(e, start, NodeKind::ProblemDeclaration)?,
        };
        declarations.push(declaration);
    }
    debug!("parse_translation_unit: {} declarations", declarations.len());
    parser.finish_node(NodeKind::TranslationUnit { declarations }, 0)
}

fn parse_external_declaration(parser: &mut Parser) -> Result<NodeRef, ParseError> {
    parse_declaration_in(parser, DeclContext::File)
}

/// Parse a declaration in block or namespace position
pub(crate) fn parse_declaration(parser: &mut Parser) -> Result<NodeRef, ParseError> {
    let context = match parser.type_context.enclosing() {
        (ScopeKind::Function | ScopeKind::Block, _) => DeclContext::Block,
        (ScopeKind::Class, class_name) => DeclContext::Member(class_name),
        _ => DeclContext::File,
    };
    parse_declaration_in(parser, context)
}

fn parse_declaration_in(parser: &mut Parser, context: DeclContext) -> Result<NodeRef, ParseError> {
    let token = parser.current_token()?;
    trace!("parse_declaration: {:?} in {:?}", token.kind, context);
    let cpp = parser.is_cpp();

    match token.kind {
        TokenKind::Semicolon => parse_empty_declaration(parser),
        TokenKind::StaticAssert => parse_static_assert(parser),
        TokenKind::Asm => parse_asm_declaration(parser),
        TokenKind::Namespace if cpp => parse_namespace(parser),
        TokenKind::Inline if cpp && parser.peek_kind(0) == Some(TokenKind::Namespace) => parse_namespace(parser),
        TokenKind::Using if cpp => parse_using(parser),
        TokenKind::Template if cpp => parse_template_declaration(parser),
        TokenKind::Extern if cpp && parser.peek_kind(0) == Some(TokenKind::Template) => {
            parse_template_declaration(parser)
        }
        TokenKind::Extern if cpp && matches!(parser.peek_kind(0), Some(TokenKind::StringLiteral(_))) => {
            parse_linkage_specification(parser)
        }
        _ => parse_simple_or_function(parser, context),
    }
}

/// Parse a member declaration of a class body
pub(crate) fn parse_member_declaration(parser: &mut Parser, class_name: Option<Symbol>) -> Result<NodeRef, ParseError> {
    match parser.current_token_kind() {
        Some(TokenKind::Semicolon) => parse_empty_declaration(parser),
        Some(TokenKind::StaticAssert) => parse_static_assert(parser),
        Some(TokenKind::Using) if parser.is_cpp() => parse_using(parser),
        Some(TokenKind::Template) if parser.is_cpp() => parse_template_declaration(parser),
        _ => parse_simple_or_function(parser, DeclContext::Member(class_name)),
    }
}

/// A lone `;`
fn parse_empty_declaration(parser: &mut Parser) -> Result<NodeRef, ParseError> {
    let start = parser.current_idx;
    let decl_specifier = parser.finish_node(
        NodeKind::SimpleDeclSpecifier {
            info: DeclSpecInfo::default(),
            basic: BasicType::Unspecified,
            modifiers: TypeModifiers::empty(),
            type_expr: None,
        },
        start,
    )?;
    parser.expect(TokenKind::Semicolon)?;
    parser.finish_node(
        NodeKind::SimpleDeclaration {
            decl_specifier,
            declarators: ThinVec::new(),
        },
        start,
    )
}

/// `_Static_assert(expr, "msg");` / `static_assert(expr);`
fn parse_static_assert(parser: &mut Parser) -> Result<NodeRef, ParseError> {
    let start = parser.current_idx;
    parser.expect(TokenKind::StaticAssert)?;
    parser.expect(TokenKind::LeftParen)?;
    let condition = parser.parse_expr_assignment()?;
    let message = if parser.accept(TokenKind::Comma).is_some() {
        Some(parser.parse_expr_assignment()?)
    } else {
        None
    };
    parser.expect(TokenKind::RightParen)?;
    parser.expect(TokenKind::Semicolon)?;
    parser.finish_node(NodeKind::StaticAssertDeclaration { condition, message }, start)
}

/// `asm("...");` kept as the text between the parenthesis
fn parse_asm_declaration(parser: &mut Parser) -> Result<NodeRef, ParseError> {
    let start = parser.current_idx;
    parser.expect(TokenKind::Asm)?;
    while parser.matches(&[TokenKind::Volatile, TokenKind::Inline, TokenKind::Goto]) {
        parser.advance();
    }
    parser.expect(TokenKind::LeftParen)?;
    let text_start = parser.current_idx;
    let mut depth = 0usize;
    loop {
        match parser.current_token()?.kind {
            TokenKind::LeftParen => depth += 1,
            TokenKind::RightParen if depth == 0 => break,
            TokenKind::RightParen => depth -= 1,
            _ => {}
        }
        parser.advance();
    }
    let text = token_signature(&parser.tokens[text_start..parser.current_idx]);
    parser.expect(TokenKind::RightParen)?;
    parser.expect(TokenKind::Semicolon)?;
    parser.finish_node(NodeKind::AsmDeclaration { text: Symbol::new(text) }, start)
}

/// `namespace a { }`, `inline namespace v1 { }`, `namespace a::b { }`,
/// and the alias form `namespace fs = std::filesystem;`
fn parse_namespace(parser: &mut Parser) -> Result<NodeRef, ParseError> {
    let start = parser.current_idx;
    let inline = parser.accept(TokenKind::Inline).is_some();
    parser.expect(TokenKind::Namespace)?;
    let attributes = parse_cpp_attributes(parser)?;

    let name = match parser.current_token_kind() {
        Some(TokenKind::Identifier(_)) => Some(parse_name(parser)?),
        _ => None,
    };

    if let Some(alias) = name
        && parser.accept(TokenKind::Assign).is_some()
    {
        let target = parse_name(parser)?;
        parser.expect(TokenKind::Semicolon)?;
        if let Some(symbol) = last_name_symbol(parser.ast, alias) {
            parser.type_context.declare(symbol, NameClass::Namespace);
        }
        if let Some(target_symbol) = last_name_symbol(parser.ast, target)
            && let Some(symbol) = last_name_symbol(parser.ast, alias)
        {
            parser.type_context.alias_namespace(symbol, target_symbol);
        }
        return parser.finish_node(NodeKind::NamespaceAlias { alias, target }, start);
    }

    let symbol = name.and_then(|n| last_name_symbol(parser.ast, n));
    if let Some(symbol) = symbol {
        parser.type_context.declare(symbol, NameClass::Namespace);
    }
    debug!("parse_namespace: {:?}", symbol);

    parser.expect(TokenKind::LeftBrace)?;
    // members of an unnamed namespace are visible in the enclosing scope
    if symbol.is_some() {
        parser.type_context.push_scope(ScopeKind::Namespace, symbol);
    }
    let declarations = parse_declaration_seq(parser);
    if let Some(symbol) = symbol {
        parser.type_context.pop_scope();
        if inline {
            parser.type_context.add_using_namespace(symbol);
        }
    }
    let declarations = declarations?;
    parser.expect(TokenKind::RightBrace)?;

    let node = parser.finish_node(
        NodeKind::NamespaceDefinition {
            name,
            inline,
            declarations,
        },
        start,
    )?;
    parser.attach_attributes(node, attributes)?;
    Ok(node)
}

/// Declarations up to a closing brace, each recovered on its own
fn parse_declaration_seq(parser: &mut Parser) -> Result<ThinVec<NodeRef>, ParseError> {
    let mut declarations = ThinVec::new();
    while !parser.is_token(TokenKind::RightBrace) && !parser.at_end() {
        let start = parser.current_idx;
        let declaration = match parse_declaration_in(parser, DeclContext::File) {
            Ok(declaration) => declaration,
            Err(e) => parser.recover(e, start, NodeKind::ProblemDeclaration)?,
        };
        declarations.push(declaration);
    }
    Ok(declarations)
}

/// `using namespace n;`, `using T = type-id;`, `using n::name;`
fn parse_using(parser: &mut Parser) -> Result<NodeRef, ParseError> {
    let start = parser.current_idx;
    parser.expect(TokenKind::Using)?;

    if parser.accept(TokenKind::Namespace).is_some() {
        let name = parse_name(parser)?;
        parser.expect(TokenKind::Semicolon)?;
        if let Some(symbol) = last_name_symbol(parser.ast, name) {
            parser.type_context.add_using_namespace(symbol);
        }
        return parser.finish_node(NodeKind::UsingDirective { name }, start);
    }

    if let Some(TokenKind::Identifier(symbol)) = parser.current_token_kind()
        && matches!(parser.peek_kind(0), Some(TokenKind::Assign | TokenKind::LeftBracket))
    {
        let alias_idx = parser.current_idx;
        parser.advance();
        let alias = parser.name_node(symbol, alias_idx)?;
        let attributes = parse_cpp_attributes(parser)?;
        parser.attach_attributes(alias, attributes)?;
        parser.expect(TokenKind::Assign)?;
        let type_id = parse_type_id(parser)?;
        parser.expect(TokenKind::Semicolon)?;
        parser.add_typedef(symbol);
        return parser.finish_node(NodeKind::AliasDeclaration { alias, type_id }, start);
    }

    let typename = parser.accept(TokenKind::Typename).is_some();
    let class = scan_qualified_name(parser, parser.current_idx).map(|(_, class)| class);
    let name = parse_name(parser)?;
    parser.expect(TokenKind::Semicolon)?;
    if let Some(symbol) = last_name_symbol(parser.ast, name) {
        let class = match class {
            Some(class) => class,
            None if typename => NameClass::Type,
            None => NameClass::Value,
        };
        parser.type_context.declare(symbol, class);
    }
    parser.finish_node(NodeKind::UsingDeclaration { name, typename }, start)
}

/// `extern "C" { ... }` / `extern "C" int f();`
fn parse_linkage_specification(parser: &mut Parser) -> Result<NodeRef, ParseError> {
    let start = parser.current_idx;
    parser.expect(TokenKind::Extern)?;
    let Some(TokenKind::StringLiteral(literal)) = parser.current_token_kind() else {
        return Err(parser.unexpected("string literal"));
    };
    parser.advance();
    let linkage = Symbol::new(literal.as_str().trim_matches('"'));

    let declarations = if parser.accept(TokenKind::LeftBrace).is_some() {
        let declarations = parse_declaration_seq(parser)?;
        parser.expect(TokenKind::RightBrace)?;
        declarations
    } else {
        let mut declarations = ThinVec::new();
        declarations.push(parse_declaration_in(parser, DeclContext::File)?);
        declarations
    };
    parser.finish_node(NodeKind::LinkageSpecification { linkage, declarations }, start)
}

fn decl_spec_options(context: DeclContext) -> DeclSpecOptions {
    match context {
        DeclContext::File => DeclSpecOptions::declaration(),
        DeclContext::Block => DeclSpecOptions::parameter(),
        DeclContext::Member(class_name) => DeclSpecOptions::member(class_name),
    }
}

fn declarator_options(parser: &Parser, context: DeclContext) -> DeclaratorOptions {
    let options = DeclaratorOptions::new(DeclaratorMode::Named);
    match context {
        DeclContext::Member(_) => options.member(),
        _ if parser.is_cpp() => options.with_constructor_initializer(),
        _ => options,
    }
}

/// Make the name a declarator introduces known to the name-class context.
/// Qualified names refer to earlier declarations and are skipped.
fn declare_declarator(parser: &mut Parser, decl_specifier: NodeRef, declarator: NodeRef) {
    let Some(name) = declarator_name(parser.ast, declarator) else {
        return;
    };
    if matches!(parser.kind(name), NodeKind::QualifiedName { .. }) {
        return;
    }
    let Some(symbol) = last_name_symbol(parser.ast, name) else {
        return;
    };
    let is_typedef = parser
        .kind(decl_specifier)
        .decl_spec_info()
        .is_some_and(|info| info.storage == StorageClass::Typedef);
    if is_typedef {
        parser.add_typedef(symbol);
    } else if parser.type_context.in_template_scope() && declares_function(parser.ast, declarator) {
        parser.type_context.declare(symbol, NameClass::FunctionTemplate);
    } else {
        parser.type_context.declare(symbol, NameClass::Value);
    }
}

/// The current token opens a function body for `declarator`
fn at_function_body(parser: &Parser, declarator: NodeRef) -> bool {
    let Some(function) = function_declarator(parser.ast, declarator) else {
        return false;
    };
    let knr = matches!(
        parser.kind(function),
        NodeKind::Declarator(DeclaratorData {
            suffix: DeclaratorSuffix::KnRFunction { .. },
            ..
        })
    );
    match parser.current_token_kind() {
        Some(TokenKind::LeftBrace) => true,
        Some(TokenKind::Colon | TokenKind::Try) => parser.is_cpp(),
        Some(TokenKind::Assign) => {
            parser.is_cpp() && matches!(parser.peek_kind(0), Some(TokenKind::Default | TokenKind::Delete))
        }
        Some(kind) => knr && !matches!(kind, TokenKind::Semicolon | TokenKind::Comma | TokenKind::Assign),
        None => false,
    }
}

/// Simple declaration or function definition
fn parse_simple_or_function(parser: &mut Parser, context: DeclContext) -> Result<NodeRef, ParseError> {
    let start = parser.current_idx;
    let attributes = parse_cpp_attributes(parser)?;
    let decl_specifier = parse_decl_specifier(parser, decl_spec_options(context))?;

    if parser.is_token(TokenKind::Semicolon) {
        parser.advance();
        let node = parser.finish_node(
            NodeKind::SimpleDeclaration {
                decl_specifier,
                declarators: ThinVec::new(),
            },
            start,
        )?;
        parser.attach_attributes(node, attributes)?;
        return Ok(node);
    }

    let options = declarator_options(parser, context);
    let declarator = parse_declarator(parser, options)?;
    declare_declarator(parser, decl_specifier, declarator);

    if declares_function(parser.ast, declarator) && at_function_body(parser, declarator) {
        let node = parse_function_definition(parser, start, decl_specifier, declarator)?;
        parser.attach_attributes(node, attributes)?;
        return Ok(node);
    }

    let mut declarators = ThinVec::new();
    declarators.push(parse_member_or_init(parser, context, declarator)?);
    while parser.accept(TokenKind::Comma).is_some() {
        let declarator = parse_declarator(parser, options)?;
        declare_declarator(parser, decl_specifier, declarator);
        declarators.push(parse_member_or_init(parser, context, declarator)?);
    }
    parser.expect(TokenKind::Semicolon)?;

    let node = parser.finish_node(
        NodeKind::SimpleDeclaration {
            decl_specifier,
            declarators,
        },
        start,
    )?;
    parser.attach_attributes(node, attributes)?;
    Ok(node)
}

/// Initializer of a declarator, or `= 0` of a pure virtual member function
fn parse_member_or_init(parser: &mut Parser, context: DeclContext, declarator: NodeRef) -> Result<NodeRef, ParseError> {
    let pure = matches!(context, DeclContext::Member(_))
        && parser.is_token(TokenKind::Assign)
        && matches!(parser.peek_kind(0), Some(TokenKind::IntegerLiteral(v)) if v.as_str() == "0")
        && declares_function(parser.ast, declarator);
    if !pure {
        return parse_declarator_initializer(parser, declarator);
    }
    parser.advance();
    parser.advance();
    if let Some(function) = function_declarator(parser.ast, declarator)
        && let NodeKind::Declarator(DeclaratorData {
            suffix: DeclaratorSuffix::Function(suffix),
            ..
        }) = parser.kind_mut(function)?
    {
        suffix.pure_virtual = true;
    }
    let start = parser.node_start(declarator);
    parser.extend_node(declarator, start)?;
    Ok(declarator)
}

/// Symbols a function body sees as parameters
fn parameter_symbols(parser: &Parser, function: NodeRef) -> Vec<Symbol> {
    let NodeKind::Declarator(data) = parser.kind(function) else {
        return Vec::new();
    };
    match &data.suffix {
        DeclaratorSuffix::Function(suffix) => suffix
            .parameters
            .iter()
            .filter_map(|p| match parser.kind(*p) {
                NodeKind::ParameterDeclaration { declarator, .. } => parser.declarator_symbol(*declarator),
                _ => None,
            })
            .collect(),
        DeclaratorSuffix::KnRFunction { parameter_names, .. } => parameter_names
            .iter()
            .filter_map(|n| match parser.kind(*n) {
                NodeKind::Name(symbol) => Some(*symbol),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn parse_function_definition(
    parser: &mut Parser,
    start: usize,
    decl_specifier: NodeRef,
    declarator: NodeRef,
) -> Result<NodeRef, ParseError> {
    let function = function_declarator(parser.ast, declarator);
    if let Some(function) = function {
        parse_knr_declarations(parser, function, declarator)?;
    }
    debug!("parse_function_definition: starting at token {}", start);

    if parser.accept(TokenKind::Assign).is_some() {
        let body_kind = match parser.current_token_kind() {
            Some(TokenKind::Default) => FunctionBodyKind::Defaulted,
            Some(TokenKind::Delete) => FunctionBodyKind::Deleted,
            _ => return Err(parser.unexpected("'default' or 'delete'")),
        };
        parser.advance();
        parser.expect(TokenKind::Semicolon)?;
        return parser.finish_node(
            NodeKind::FunctionDefinition {
                decl_specifier,
                declarator,
                member_initializers: ThinVec::new(),
                body: None,
                catch_handlers: ThinVec::new(),
                body_kind,
            },
            start,
        );
    }

    let parameters = function.map(|f| parameter_symbols(parser, f)).unwrap_or_default();
    parser.type_context.push_scope(ScopeKind::Function, None);
    for symbol in parameters {
        parser.type_context.declare(symbol, NameClass::Value);
    }
    let result = parse_function_body(parser);
    parser.type_context.pop_scope();
    let (member_initializers, body, catch_handlers, body_kind) = result?;

    parser.finish_node(
        NodeKind::FunctionDefinition {
            decl_specifier,
            declarator,
            member_initializers,
            body: Some(body),
            catch_handlers,
            body_kind,
        },
        start,
    )
}

type FunctionBody = (ThinVec<NodeRef>, NodeRef, ThinVec<NodeRef>, FunctionBodyKind);

/// `try`? `: inits`? `{ ... }` handlers?
fn parse_function_body(parser: &mut Parser) -> Result<FunctionBody, ParseError> {
    let body_kind = if parser.is_cpp() && parser.accept(TokenKind::Try).is_some() {
        FunctionBodyKind::TryBlock
    } else {
        FunctionBodyKind::Body
    };

    let mut member_initializers = ThinVec::new();
    if parser.is_cpp() && parser.accept(TokenKind::Colon).is_some() {
        loop {
            member_initializers.push(parse_member_initializer(parser)?);
            if parser.accept(TokenKind::Comma).is_none() {
                break;
            }
        }
    }

    let body = parse_compound_statement(parser)?;
    let catch_handlers = if body_kind == FunctionBodyKind::TryBlock {
        parse_catch_handlers(parser)?
    } else {
        ThinVec::new()
    };
    Ok((member_initializers, body, catch_handlers, body_kind))
}

/// `member(args)` or `member{args}` of a constructor initializer list
fn parse_member_initializer(parser: &mut Parser) -> Result<NodeRef, ParseError> {
    let start = parser.current_idx;
    let member = parse_name(parser)?;
    let initializer = if parser.is_token(TokenKind::LeftBrace) {
        parse_initializer_list(parser)?
    } else {
        let init_start = parser.current_idx;
        parser.expect(TokenKind::LeftParen)?;
        let arguments = parse_expr_list(parser, BindingPower::ASSIGNMENT, TokenKind::RightParen)?;
        parser.expect(TokenKind::RightParen)?;
        parser.finish_node(NodeKind::ConstructorInitializer { arguments }, init_start)?
    };
    parser.accept(TokenKind::Ellipsis);
    parser.finish_node(NodeKind::ConstructorChainInitializer { member, initializer }, start)
}

/// Parameter declarations between the identifier list and the body of a
/// pre-standard C definition. A declaration naming an identifier missing
/// from the list is kept as a problem declaration; the others are stored in
/// the function declarator, which grows to cover them.
fn parse_knr_declarations(parser: &mut Parser, function: NodeRef, declarator: NodeRef) -> Result<(), ParseError> {
    let names: Vec<Symbol> = match parser.kind(function) {
        NodeKind::Declarator(DeclaratorData {
            suffix: DeclaratorSuffix::KnRFunction { parameter_names, .. },
            ..
        }) => parameter_names
            .iter()
            .filter_map(|n| match parser.kind(*n) {
                NodeKind::Name(symbol) => Some(*symbol),
                _ => None,
            })
            .collect(),
        _ => return Ok(()),
    };

    let mut declarations = ThinVec::new();
    while !parser.is_token(TokenKind::LeftBrace) && !parser.at_end() {
        let start = parser.current_idx;
        let declaration = match parse_knr_declaration(parser) {
            Ok(declaration) => declaration,
            Err(e) => recover_knr_declaration(parser, e, start)?,
        };
        check_knr_declaration(parser, declaration, &names)?;
        declarations.push(declaration);
    }

    if let NodeKind::Declarator(DeclaratorData {
        suffix: DeclaratorSuffix::KnRFunction {
            parameter_declarations, ..
        },
        ..
    }) = parser.kind_mut(function)?
    {
        *parameter_declarations = declarations;
    }
    let function_start = parser.node_start(function);
    parser.extend_node(function, function_start)?;
    let declarator_start = parser.node_start(declarator);
    parser.extend_node(declarator, declarator_start)
}

/// Skip a broken parameter declaration through its `;`, stopping in front
/// of the `{` of the body
fn recover_knr_declaration(parser: &mut Parser, error: ParseError, start: usize) -> Result<NodeRef, ParseError> {
    if let ParseError::Ast(e) = error {
        return Err(ParseError::Ast(e));
    }
    debug!("recover_knr_declaration: {} at token {}", error, start);
    parser.diag.report_parse_error(&error);
    parser.current_idx = start;
    while let Some(kind) = parser.current_token_kind() {
        if kind == TokenKind::LeftBrace {
            break;
        }
        parser.advance();
        if kind == TokenKind::Semicolon {
            break;
        }
    }
    parser.finish_node(NodeKind::ProblemDeclaration(Parser::problem_id(&error)), start)
}

fn parse_knr_declaration(parser: &mut Parser) -> Result<NodeRef, ParseError> {
    let start = parser.current_idx;
    let decl_specifier = parse_decl_specifier(parser, DeclSpecOptions::parameter())?;
    let mut declarators = ThinVec::new();
    loop {
        declarators.push(parse_init_declarator(parser, DeclaratorOptions::new(DeclaratorMode::Named))?);
        if parser.accept(TokenKind::Comma).is_none() {
            break;
        }
    }
    parser.expect(TokenKind::Semicolon)?;
    parser.finish_node(
        NodeKind::SimpleDeclaration {
            decl_specifier,
            declarators,
        },
        start,
    )
}

fn check_knr_declaration(parser: &mut Parser, declaration: NodeRef, names: &[Symbol]) -> Result<(), ParseError> {
    let NodeKind::SimpleDeclaration { declarators, .. } = parser.kind(declaration) else {
        return Ok(());
    };
    let unlisted = declarators
        .iter()
        .filter_map(|d| parser.declarator_symbol(*d))
        .find(|symbol| !names.contains(symbol));
    if let Some(symbol) = unlisted {
        debug!("check_knr_declaration: '{}' is not a parameter", symbol);
        let error = ParseError::syntax(
            format!("declaration for parameter '{}' but no such parameter", symbol),
            parser.ast.get_span(declaration),
        );
        parser.diag.report_parse_error(&error);
        parser
            .ast
            .replace_kind(declaration, NodeKind::ProblemDeclaration(ProblemId::ParameterNotInList))?;
    }
    Ok(())
}
