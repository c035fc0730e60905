//! Recursive-descent parser for C and C++
//!
//! This module provides the main parser coordination, public API, and state management.
//! It orchestrates the parsing process by delegating to specialized sub-modules for
//! different language constructs. Both dialects share one parser; the
//! productions consult [`LangOptions`] where the grammars differ.
//!
//! Ambiguous constructs are parsed speculatively inside a
//! [`utils::ParserTransaction`], which rolls the token position, the
//! diagnostics, the AST arena and the name-class scopes back unless it is
//! committed.

use crate::ast::*;
use crate::diagnostic::{DiagnosticEngine, ParseError};
use crate::lang_options::{LangOptions, ParserConfig};
use crate::lexer::{Token, TokenFlags, TokenKind};
use crate::source_manager::SourceSpan;
use hashbrown::HashMap;
use log::{debug, trace};

pub mod attributes;
pub mod classes;
pub mod decl_specifier;
pub mod declarations;
pub mod declarator;
pub mod expressions;
pub mod initializers;
pub mod names;
pub mod statements;
pub mod templates;
pub mod utils;

// Re-export commonly used types
pub(crate) use expressions::BindingPower;

use expressions::parse_expression;

/// What an identifier denotes while parsing, used to tell types from values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NameClass {
    Type,
    ClassTemplate,
    FunctionTemplate,
    Namespace,
    Value,
}

impl NameClass {
    pub(crate) fn is_type(self) -> bool {
        matches!(self, NameClass::Type | NameClass::ClassTemplate)
    }

    pub(crate) fn is_template(self) -> bool {
        matches!(self, NameClass::ClassTemplate | NameClass::FunctionTemplate)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScopeKind {
    Global,
    Namespace,
    Class,
    Function,
    Block,
    Template,
}

#[derive(Debug)]
struct NameScope {
    kind: ScopeKind,
    name: Option<Symbol>,
    names: HashMap<Symbol, NameClass>,
    using_namespaces: Vec<Symbol>,
}

/// Type context for tracking typedef names and other type-related state
#[derive(Debug)]
pub(crate) struct TypeDefContext {
    scopes: Vec<NameScope>,
    /// Names declared inside named namespaces and classes, by scope name
    members: HashMap<Symbol, HashMap<Symbol, NameClass>>,
    /// `namespace alias = target;`
    aliases: HashMap<Symbol, Symbol>,
}

impl TypeDefContext {
    /// Create a new type context with the builtin typedefs of the dialect
    pub(crate) fn new(lang: &LangOptions) -> Self {
        let mut context = TypeDefContext {
            scopes: vec![NameScope {
                kind: ScopeKind::Global,
                name: None,
                names: HashMap::new(),
                using_namespaces: Vec::new(),
            }],
            members: HashMap::new(),
            aliases: HashMap::new(),
        };
        if lang.gnu_mode {
            context.declare(Symbol::new("__builtin_va_list"), NameClass::Type);
        }
        context
    }

    pub(crate) fn push_scope(&mut self, kind: ScopeKind, name: Option<Symbol>) {
        trace!("push_scope {:?} {:?}", kind, name);
        self.scopes.push(NameScope {
            kind,
            name,
            names: HashMap::new(),
            using_namespaces: Vec::new(),
        });
    }

    pub(crate) fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    pub(crate) fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub(crate) fn truncate(&mut self, depth: usize) {
        self.scopes.truncate(depth.max(1));
    }

    /// Record a declared name.
    ///
    /// Type and template names declared directly inside a template parameter
    /// scope belong to the enclosing scope.
    pub(crate) fn declare(&mut self, symbol: Symbol, class: NameClass) {
        let mut index = self.scopes.len() - 1;
        if class != NameClass::Value {
            while index > 0 && self.scopes[index].kind == ScopeKind::Template {
                index -= 1;
            }
        }
        let scope = &mut self.scopes[index];
        debug!("declare {:?} as {:?} in {:?} scope", symbol, class, scope.kind);
        scope.names.insert(symbol, class);
        if matches!(scope.kind, ScopeKind::Namespace | ScopeKind::Class) {
            if let Some(owner) = scope.name {
                self.members.entry(owner).or_default().insert(symbol, class);
            }
        }
    }

    /// Declare a template parameter in the innermost (template) scope
    pub(crate) fn declare_local(&mut self, symbol: Symbol, class: NameClass) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.names.insert(symbol, class);
        }
    }

    pub(crate) fn add_using_namespace(&mut self, namespace: Symbol) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.using_namespaces.push(namespace);
        }
    }

    /// Unqualified lookup through the scope stack
    pub(crate) fn lookup(&self, symbol: Symbol) -> Option<NameClass> {
        for scope in self.scopes.iter().rev() {
            if let Some(class) = scope.names.get(&symbol) {
                return Some(*class);
            }
            if scope.kind == ScopeKind::Class {
                if let Some(class) = scope.name.and_then(|owner| self.lookup_member(owner, symbol)) {
                    return Some(class);
                }
            }
            for namespace in &scope.using_namespaces {
                if let Some(class) = self.lookup_member(*namespace, symbol) {
                    return Some(class);
                }
            }
        }
        None
    }

    /// Lookup of `scope::symbol`
    pub(crate) fn lookup_member(&self, scope: Symbol, symbol: Symbol) -> Option<NameClass> {
        let scope = self.aliases.get(&scope).copied().unwrap_or(scope);
        self.members.get(&scope).and_then(|m| m.get(&symbol)).copied()
    }

    pub(crate) fn alias_namespace(&mut self, alias: Symbol, target: Symbol) {
        let target = self.aliases.get(&target).copied().unwrap_or(target);
        self.aliases.insert(alias, target);
    }

    /// Innermost scope that is not a template parameter scope
    pub(crate) fn enclosing(&self) -> (ScopeKind, Option<Symbol>) {
        self.scopes
            .iter()
            .rev()
            .find(|s| s.kind != ScopeKind::Template)
            .map_or((ScopeKind::Global, None), |s| (s.kind, s.name))
    }

    /// Check if a symbol is a typedef name
    pub(crate) fn is_type_name(&self, symbol: Symbol) -> bool {
        let result = self.lookup(symbol).is_some_and(NameClass::is_type);
        trace!("is_type_name({:?}) = {}", symbol, result);
        result
    }

    pub(crate) fn in_template_scope(&self) -> bool {
        self.scopes.last().is_some_and(|s| s.kind == ScopeKind::Template)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ParserState {
    current_idx: usize,
    diag_len: usize,
    ast_len: usize,
    scope_depth: usize,
    template_depth: usize,
    greater_is_operator: bool,
}

/// Main parser structure
pub struct Parser<'arena, 'src> {
    tokens: &'src [Token],
    current_idx: usize,
    ast: &'arena mut Ast,
    diag: &'src mut DiagnosticEngine,

    // Type context for typedef tracking
    type_context: TypeDefContext,
    lang: LangOptions,
    max_template_depth: usize,
    template_depth: usize,
    max_nesting_depth: usize,
    /// Open expressions and statements
    nesting_depth: usize,
    /// Cleared inside template argument lists, where `>` closes the list
    greater_is_operator: bool,
}

impl<'arena, 'src> Parser<'arena, 'src> {
    /// Create a new parser
    pub fn new(
        tokens: &'src [Token],
        ast: &'arena mut Ast,
        diag: &'src mut DiagnosticEngine,
        config: &ParserConfig,
    ) -> Self {
        Parser {
            tokens,
            current_idx: 0,
            ast,
            diag,
            type_context: TypeDefContext::new(&config.lang_options),
            lang: config.lang_options,
            max_template_depth: config.max_template_depth,
            template_depth: 0,
            max_nesting_depth: config.max_nesting_depth,
            nesting_depth: 0,
            greater_is_operator: true,
        }
    }

    pub(crate) fn is_cpp(&self) -> bool {
        self.lang.is_cpp()
    }

    pub(crate) fn is_gnu(&self) -> bool {
        self.lang.gnu_mode
    }

    /// Get the current token (returns None if at end of input)
    fn try_current_token(&self) -> Option<Token> {
        self.tokens
            .get(self.current_idx)
            .copied()
            .filter(|t| t.kind != TokenKind::EndOfFile)
    }

    /// Get the current token (returns error if at end of input)
    fn current_token(&self) -> Result<Token, ParseError> {
        self.try_current_token().ok_or_else(|| {
            let location = self.previous_token_span();
            ParseError::UnexpectedEof { location }
        })
    }

    /// Get the current token kind
    fn current_token_kind(&self) -> Option<TokenKind> {
        self.try_current_token().map(|t| t.kind)
    }

    /// Get the current token location (infallible, returns empty span on EOF)
    pub(crate) fn current_token_span_or_empty(&self) -> SourceSpan {
        self.try_current_token().map(|t| t.span).unwrap_or_default()
    }

    /// Get the location of the previous token, or an empty span if not available.
    pub(crate) fn previous_token_span(&self) -> SourceSpan {
        if self.current_idx > 0 {
            self.tokens
                .get(self.current_idx - 1)
                .map_or(SourceSpan::empty(), |token| token.span)
        } else {
            SourceSpan::empty()
        }
    }

    /// Peek at the next token without consuming it
    fn peek_token(&self, next_index: u32) -> Option<&Token> {
        self.tokens.get(self.current_idx + 1 + next_index as usize)
    }

    fn peek_kind(&self, next_index: u32) -> Option<TokenKind> {
        self.peek_token(next_index).map(|t| t.kind)
    }

    /// Advance to the next token and return previous token
    fn advance(&mut self) -> Option<Token> {
        let token = self.try_current_token()?;
        self.current_idx += 1;
        Some(token)
    }

    /// Accept a specific token kind if found, consume it and return it, otherwise nothing happens
    fn accept(&mut self, accepted: TokenKind) -> Option<Token> {
        if self.current_token_kind() == Some(accepted) {
            self.advance()
        } else {
            None
        }
    }

    /// Expect a specific token kind, consume it if found
    fn expect(&mut self, expected: TokenKind) -> Result<Token, ParseError> {
        let token = self.current_token()?;
        if token.kind == expected {
            self.advance();
            Ok(token)
        } else {
            Err(ParseError::UnexpectedToken {
                expected_tokens: format!("'{}'", expected.spelling()),
                found: token.kind,
                location: token.span,
            })
        }
    }

    /// Error for the current token
    pub(crate) fn unexpected(&self, expected: &str) -> ParseError {
        match self.try_current_token() {
            Some(token) => ParseError::UnexpectedToken {
                expected_tokens: expected.to_string(),
                found: token.kind,
                location: token.span,
            },
            None => ParseError::UnexpectedEof {
                location: self.previous_token_span(),
            },
        }
    }

    /// Check if current token matches any of the given kinds
    fn matches(&self, kinds: &[TokenKind]) -> bool {
        self.current_token_kind().map(|k| kinds.contains(&k)).unwrap_or(false)
    }

    /// Check if current token matches the given kind
    fn is_token(&self, kind: TokenKind) -> bool {
        self.current_token_kind() == Some(kind)
    }

    pub(crate) fn at_end(&self) -> bool {
        self.try_current_token().is_none()
    }

    /// `>` `>` produced by splitting `>>`
    fn at_split_shift(&self) -> bool {
        self.tokens.get(self.current_idx).is_some_and(|t| {
            t.kind == TokenKind::Greater && t.flags.contains(TokenFlags::ADJACENT_NEXT)
        }) && self.peek_kind(0) == Some(TokenKind::Greater)
    }

    /// Skip tokens until we find a synchronization point.
    ///
    /// Stops after a `;` or after a balanced `{ ... }` at nesting level zero,
    /// and in front of an unmatched `}`, which belongs to the enclosing
    /// construct.
    fn synchronize(&mut self) {
        let mut brace_depth = 0i32;
        let mut paren_depth = 0i32;
        let start = self.current_idx;

        while let Some(token) = self.try_current_token() {
            match token.kind {
                TokenKind::LeftBrace => {
                    brace_depth += 1;
                    self.advance();
                }
                TokenKind::RightBrace => {
                    if brace_depth == 0 {
                        break; // Unmatched brace, stop here
                    }
                    brace_depth -= 1;
                    self.advance();
                    if brace_depth == 0 && paren_depth <= 0 {
                        self.accept(TokenKind::Semicolon);
                        break;
                    }
                }
                TokenKind::LeftParen => {
                    paren_depth += 1;
                    self.advance();
                }
                TokenKind::RightParen => {
                    paren_depth -= 1;
                    self.advance();
                }
                TokenKind::Semicolon => {
                    self.advance();
                    if brace_depth == 0 {
                        break;
                    }
                }
                _ => {
                    self.advance();
                }
            }
        }
        debug!("synchronize: skipped {} tokens", self.current_idx - start);
    }

    /// Main expression parsing using Pratt algorithm
    pub(crate) fn parse_expression(&mut self, min_binding_power: BindingPower) -> Result<NodeRef, ParseError> {
        self.nested(|p| parse_expression(p, min_binding_power))
    }

    /// Run `f` one nesting level deeper, failing once the configured bound
    /// is reached
    pub(crate) fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Parser<'arena, 'src>) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        if self.nesting_depth >= self.max_nesting_depth {
            return Err(ParseError::NestingTooDeep {
                limit: self.max_nesting_depth,
                location: self.current_token_span_or_empty(),
            });
        }
        self.nesting_depth += 1;
        let result = f(self);
        self.nesting_depth -= 1;
        result
    }

    /// Parse expression with minimum binding power
    pub(crate) fn parse_expr_min(&mut self) -> Result<NodeRef, ParseError> {
        self.parse_expression(BindingPower::MIN)
    }

    /// Parse expression up to assignment
    pub(crate) fn parse_expr_assignment(&mut self) -> Result<NodeRef, ParseError> {
        self.parse_expression(BindingPower::ASSIGNMENT)
    }

    /// Parse expression up to the conditional operator
    pub(crate) fn parse_expr_conditional(&mut self) -> Result<NodeRef, ParseError> {
        self.parse_expression(BindingPower::CONDITIONAL)
    }

    /// Parse translation unit (top level)
    pub fn parse_translation_unit(&mut self) -> Result<NodeRef, ParseError> {
        declarations::parse_translation_unit(self)
    }

    /// Check if the token at `idx` can start a type name
    pub(crate) fn is_type_name_start_at(&self, idx: usize) -> bool {
        let Some(token) = self.tokens.get(idx) else {
            return false;
        };
        match token.kind {
            TokenKind::Identifier(_) | TokenKind::ColonColon => {
                names::scan_qualified_name(self, idx).is_some_and(|(_, class)| class.is_type())
            }
            TokenKind::Auto => self.is_cpp(),
            TokenKind::Typename => self.is_cpp(),
            kind => {
                kind.is_simple_type_keyword()
                    || kind.is_type_qualifier()
                    || matches!(
                        kind,
                        TokenKind::Struct
                            | TokenKind::Union
                            | TokenKind::Enum
                            | TokenKind::Class
                            | TokenKind::Typeof
                            | TokenKind::Decltype
                            | TokenKind::Attribute
                    )
            }
        }
    }

    /// Check if the current token can start a declaration
    pub(crate) fn starts_declaration(&self) -> bool {
        self.starts_declaration_at(self.current_idx)
    }

    /// Check if the token at `idx` can start a declaration
    pub(crate) fn starts_declaration_at(&self, idx: usize) -> bool {
        let Some(kind) = self.tokens.get(idx).map(|t| t.kind) else {
            return false;
        };
        match kind {
            TokenKind::Identifier(_) | TokenKind::ColonColon => self.is_type_name_start_at(idx),
            TokenKind::Auto | TokenKind::Register => true,
            TokenKind::StaticAssert | TokenKind::Asm | TokenKind::Alignas => true,
            TokenKind::Using | TokenKind::Namespace | TokenKind::Template => self.is_cpp(),
            kind => kind.is_declaration_specifier_start(),
        }
    }

    /// parse and accept an identifier name
    fn accept_name(&mut self) -> Option<(Symbol, Token)> {
        if let Some(token) = self.try_current_token()
            && let TokenKind::Identifier(symbol) = token.kind
        {
            self.advance();
            return Some((symbol, token));
        }
        None
    }

    /// expect and accept an identifier name, returning the symbol or error
    fn expect_name(&mut self) -> Result<(Symbol, Token), ParseError> {
        match self.accept_name() {
            Some(found) => Ok(found),
            None => Err(self.unexpected("identifier")),
        }
    }

    /// Add a typedef name to the type context
    pub(crate) fn add_typedef(&mut self, symbol: Symbol) {
        debug!("add_typedef: adding {:?} to typedef_names", symbol);
        self.type_context.declare(symbol, NameClass::Type);
    }

    fn save_state(&self) -> ParserState {
        ParserState {
            current_idx: self.current_idx,
            diag_len: self.diag.diagnostics.len(),
            ast_len: self.ast.len(),
            scope_depth: self.type_context.depth(),
            template_depth: self.template_depth,
            greater_is_operator: self.greater_is_operator,
        }
    }

    fn restore_state(&mut self, state: ParserState) {
        trace!("restore_state: back to token {}", state.current_idx);
        self.current_idx = state.current_idx;
        self.diag.diagnostics.truncate(state.diag_len);
        if let Err(e) = self.ast.truncate(state.ast_len) {
            log::warn!("restore_state: {}", e);
        }
        self.type_context.truncate(state.scope_depth);
        self.template_depth = state.template_depth;
        self.greater_is_operator = state.greater_is_operator;
    }

    pub(crate) fn start_transaction(&mut self) -> utils::ParserTransaction<'_, 'arena, 'src> {
        utils::ParserTransaction::new(self)
    }

    /// Run `f` speculatively; on failure nothing it did is kept
    pub(crate) fn speculate<T>(
        &mut self,
        f: impl FnOnce(&mut Parser<'arena, 'src>) -> Result<T, ParseError>,
    ) -> Option<T> {
        let trans = self.start_transaction();
        match f(trans.parser) {
            Ok(value) => {
                trans.commit();
                Some(value)
            }
            Err(e) => {
                trace!("speculative parse rolled back: {}", e);
                None
            }
        }
    }
}

/// contain functions related to AST nodes
impl<'arena, 'src> Parser<'arena, 'src> {
    /// Span covered by tokens `[start, end)`
    pub(crate) fn span_of(&self, start: usize, end: usize) -> SourceSpan {
        if end <= start {
            let at = self.tokens.get(start).map(|t| t.span).unwrap_or_default();
            return SourceSpan::new(at.start(), at.start());
        }
        match (self.tokens.get(start), self.tokens.get(end - 1)) {
            (Some(first), Some(last)) => first.span.merge(last.span),
            _ => SourceSpan::empty(),
        }
    }

    /// Push a node covering the tokens from `start_idx` to the current position
    pub(crate) fn finish_node(&mut self, kind: NodeKind, start_idx: usize) -> Result<NodeRef, ParseError> {
        let span = self.span_of(start_idx, self.current_idx);
        Ok(self
            .ast
            .push_node(kind, TokenRange::new(start_idx, self.current_idx), span)?)
    }

    /// Push a node covering a single, already consumed token
    pub(crate) fn token_node(&mut self, kind: NodeKind, token_idx: usize) -> Result<NodeRef, ParseError> {
        let span = self.span_of(token_idx, token_idx + 1);
        Ok(self.ast.push_node(kind, TokenRange::new(token_idx, token_idx + 1), span)?)
    }

    pub(crate) fn node_start(&self, node: NodeRef) -> usize {
        self.ast.get_tokens(node).start as usize
    }

    /// Stretch a finished node to end at the current position
    pub(crate) fn extend_node(&mut self, node: NodeRef, start_idx: usize) -> Result<(), ParseError> {
        let span = self.span_of(start_idx, self.current_idx);
        self.ast
            .extend(node, TokenRange::new(start_idx, self.current_idx), span)?;
        Ok(())
    }

    pub(crate) fn attach_attributes(&mut self, node: NodeRef, attributes: thin_vec::ThinVec<NodeRef>) -> Result<(), ParseError> {
        if !attributes.is_empty() {
            self.ast.set_attributes(node, attributes)?;
        }
        Ok(())
    }

    pub(crate) fn kind(&self, node: NodeRef) -> &NodeKind {
        self.ast.get_kind(node)
    }

    pub(crate) fn kind_mut(&mut self, node: NodeRef) -> Result<&mut NodeKind, ParseError> {
        Ok(self.ast.kind_mut(node)?)
    }

    /// Last segment of the name a declarator declares
    pub(crate) fn declarator_symbol(&self, declarator: NodeRef) -> Option<Symbol> {
        let name = signature::declarator_name(self.ast, declarator)?;
        names::last_name_symbol(self.ast, name)
    }

    pub(crate) fn name_node(&mut self, symbol: Symbol, token_idx: usize) -> Result<NodeRef, ParseError> {
        self.token_node(NodeKind::Name(symbol), token_idx)
    }

    /// Problem id for a parse error caught at a recovery point
    pub(crate) fn problem_id(error: &ParseError) -> ProblemId {
        match error {
            ParseError::UnexpectedEof { .. } => ProblemId::UnexpectedEndOfInput,
            ParseError::TemplateDepthExceeded { .. } => ProblemId::TemplateNestingTooDeep,
            ParseError::NestingTooDeep { .. } => ProblemId::NestingTooDeep,
            _ => ProblemId::SyntaxError,
        }
    }

    /// Record `error`, skip to a synchronization point and cover the skipped
    /// tokens with a problem node built by `make`.
    pub(crate) fn recover(
        &mut self,
        error: ParseError,
        start_idx: usize,
        make: fn(ProblemId) -> NodeKind,
    ) -> Result<NodeRef, ParseError> {
        debug!("recover: {} at token {}", error, start_idx);
        if let ParseError::Ast(e) = error {
            return Err(ParseError::Ast(e));
        }
        self.diag.report_parse_error(&error);
        let id = Self::problem_id(&error);
        if self.current_idx <= start_idx || !self.previous_is_terminator() {
            self.synchronize();
        }
        if self.current_idx == start_idx && !self.at_end() && !self.is_token(TokenKind::RightBrace) {
            self.advance();
        }
        self.finish_node(make(id), start_idx)
    }

    /// Last consumed token ends a statement or declaration
    fn previous_is_terminator(&self) -> bool {
        self.current_idx > 0
            && self
                .tokens
                .get(self.current_idx - 1)
                .is_some_and(|t| t.kind == TokenKind::Semicolon)
    }
}

/// Parse `tokens` into a frozen tree
pub fn parse_tokens(tokens: &[Token], diag: &mut DiagnosticEngine, config: &ParserConfig) -> Result<Ast, ParseError> {
    let mut ast = Ast::new();
    {
        let mut parser = Parser::new(tokens, &mut ast, diag, config);
        let root = parser.parse_translation_unit()?;
        parser.ast.set_root(root)?;
    }
    ast.freeze();
    Ok(ast)
}
