//! A parsed translation unit and its query surface.
//!
//! [`TranslationUnit::parse`] runs the whole pipeline: preprocessing,
//! keyword classification, parsing, optional copy validation and the set up
//! of the lazy binding resolver. Everything a caller may ask afterwards
//! (declarations, macro definitions, preprocessor statements, problems,
//! bindings, node locations) is answered from the frozen tree.

use std::fmt;
use std::path::Path;
use std::rc::Rc;

use log::{debug, info};

use crate::ast::visitor::{self, AstVisitor, NameCollector};
use crate::ast::{Ast, NodeKind, NodeRef, SourceId, SourceSpan, Symbol};
use crate::diagnostic::DiagnosticEngine;
use crate::error::FrontendError;
use crate::lang_options::{LangOptions, ParserConfig, ScannerInfo};
use crate::lexer::{Lexer, Token};
use crate::location_map::{LocationMap, MacroDefId, MacroDefinition, NodeLocation};
use crate::parser::parse_tokens;
use crate::pp::{
    IncludeDirective, IncludeFileContentProvider, PPProblem, PPStatementKind, Preprocessor, PreprocessorStatement,
};
use crate::selector::NodeSelector;
use crate::semantic::{BindingId, BindingResolver};
use crate::source_manager::SourceManager;

/// Problem descriptions kept in [`FrontendError::UnexpectedProblems`]
const MAX_PROBLEM_DETAILS: usize = 10;

pub struct TranslationUnit {
    source_manager: SourceManager,
    diagnostics: DiagnosticEngine,
    ast: Rc<Ast>,
    tokens: Rc<[Token]>,
    statements: Vec<PreprocessorStatement>,
    problems: Vec<PPProblem>,
    location_map: LocationMap,
    main_file: SourceId,
    main_include_guard: Option<Symbol>,
    has_pragma_once: bool,
    lang: LangOptions,
    resolver: BindingResolver,
}

impl fmt::Debug for TranslationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranslationUnit")
            .field("main_file", &self.main_file)
            .field("language", &self.lang.language)
            .field("nodes", &self.ast.len())
            .field("tokens", &self.tokens.len())
            .field("statements", &self.statements.len())
            .field("problems", &self.problems.len())
            .finish_non_exhaustive()
    }
}

impl TranslationUnit {
    /// Parse `code` registered under `name`. Included files are read through
    /// `provider`.
    pub fn parse(
        name: &str,
        code: &str,
        provider: &dyn IncludeFileContentProvider,
        scanner_info: &ScannerInfo,
        config: &ParserConfig,
    ) -> Result<Self, FrontendError> {
        let mut source_manager = SourceManager::new();
        let main = source_manager.add_virtual_buffer(code, name);
        Self::parse_source(source_manager, main, provider, scanner_info, config)
    }

    /// Parse the file at `path`, read through `provider` like any include
    pub fn parse_file(
        path: &Path,
        provider: &dyn IncludeFileContentProvider,
        scanner_info: &ScannerInfo,
        config: &ParserConfig,
    ) -> Result<Self, FrontendError> {
        let content = provider
            .read(path)
            .ok_or_else(|| FrontendError::Configuration(format!("cannot read {}", path.display())))?;
        let mut source_manager = SourceManager::new();
        let main = source_manager.add_buffer(content, &path.to_string_lossy(), None);
        Self::parse_source(source_manager, main, provider, scanner_info, config)
    }

    fn parse_source(
        mut source_manager: SourceManager,
        main: SourceId,
        provider: &dyn IncludeFileContentProvider,
        scanner_info: &ScannerInfo,
        config: &ParserConfig,
    ) -> Result<Self, FrontendError> {
        if config.max_include_depth == 0 {
            return Err(FrontendError::Configuration("include depth limit must be positive".to_string()));
        }
        if config.max_nesting_depth == 0 {
            return Err(FrontendError::Configuration("nesting depth limit must be positive".to_string()));
        }
        let lang = config.lang_options;
        let mut diagnostics = DiagnosticEngine::new();

        let output = Preprocessor::new(
            &mut source_manager,
            &mut diagnostics,
            provider,
            lang,
            scanner_info,
            config.max_include_depth,
        )
        .process(main, scanner_info)?;
        debug!(
            "preprocessed {} tokens, {} statements, {} problems",
            output.tokens.len(),
            output.statements.len(),
            output.problems.len()
        );

        let tokens: Rc<[Token]> = Lexer::new(&output.tokens, &output.location_map, lang)
            .tokenize_all()
            .into();
        let ast = parse_tokens(&tokens, &mut diagnostics, config)?;

        if config.validate_copy {
            let copy = ast.copy();
            if copy.is_frozen() {
                return Err(FrontendError::CopyMismatch("copy of a frozen tree is frozen".to_string()));
            }
            ast.compare(&copy).map_err(FrontendError::CopyMismatch)?;
        }

        let macros = output
            .location_map
            .definitions()
            .filter(|(_, definition)| !definition.predefined)
            .map(|(id, definition)| (id, definition.name))
            .collect();
        let ast = Rc::new(ast);
        let resolver = BindingResolver::new(ast.clone(), tokens.clone(), lang).with_macros(macros);

        let unit = TranslationUnit {
            source_manager,
            diagnostics,
            ast,
            tokens,
            statements: output.statements,
            problems: output.problems,
            location_map: output.location_map,
            main_file: output.main_file,
            main_include_guard: output.main_include_guard,
            has_pragma_once: output.main_has_pragma_once_semantics,
            lang,
            resolver,
        };

        if config.expect_no_problems {
            unit.check_no_problems()?;
        }
        info!(
            "parsed translation unit with {} declarations",
            unit.declarations().len()
        );
        Ok(unit)
    }

    fn check_no_problems(&self) -> Result<(), FrontendError> {
        let syntax = self.syntax_problems();
        let binding = self.binding_problems();
        if syntax.is_empty() && binding.is_empty() && self.problems.is_empty() {
            return Ok(());
        }

        let mut details = Vec::new();
        for node in &syntax {
            let message = self.ast.get_kind(*node).problem_id().map_or("syntax error", |p| p.message());
            details.push(self.describe(self.ast.get_span(*node), message));
        }
        for problem in &self.problems {
            details.push(self.describe(problem.span, &problem.message()));
        }
        for name in &binding {
            let message = self
                .resolver
                .problem_kind(self.resolver.resolve_binding(*name))
                .map_or("problem binding", |p| p.message());
            let text = self.raw_signature(*name).unwrap_or_default();
            details.push(self.describe(self.ast.get_span(*name), &format!("{message}: {text}")));
        }
        details.truncate(MAX_PROBLEM_DETAILS);

        Err(FrontendError::UnexpectedProblems {
            syntax: syntax.len(),
            preprocessor: self.problems.len(),
            binding: binding.len(),
            details,
        })
    }

    /// `file:line: message`
    fn describe(&self, span: SourceSpan, message: &str) -> String {
        let file = self
            .source_manager
            .path(span.source_id())
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<unknown>".to_string());
        let line = self.source_manager.get_line_column(span.start()).map_or(0, |(line, _)| line);
        format!("{file}:{line}: {message}")
    }

    pub fn ast(&self) -> &Ast {
        &self.ast
    }

    /// The `TranslationUnit` node
    pub fn root(&self) -> Option<NodeRef> {
        self.ast.root()
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn lang(&self) -> LangOptions {
        self.lang
    }

    pub fn main_file(&self) -> SourceId {
        self.main_file
    }

    pub fn source_manager(&self) -> &SourceManager {
        &self.source_manager
    }

    pub fn diagnostics(&self) -> &DiagnosticEngine {
        &self.diagnostics
    }

    pub fn resolver(&self) -> &BindingResolver {
        &self.resolver
    }

    pub fn location_map(&self) -> &LocationMap {
        &self.location_map
    }

    /// Top-level declarations in source order
    pub fn declarations(&self) -> Vec<NodeRef> {
        match self.root().map(|r| self.ast.get_kind(r)) {
            Some(NodeKind::TranslationUnit { declarations }) => declarations.to_vec(),
            _ => Vec::new(),
        }
    }

    /// Macros defined by the sources, predefined ones excluded
    pub fn macro_definitions(&self) -> Vec<(MacroDefId, &MacroDefinition)> {
        self.location_map
            .definitions()
            .filter(|(_, definition)| !definition.predefined)
            .collect()
    }

    pub fn include_directives(&self) -> Vec<&IncludeDirective> {
        self.statements
            .iter()
            .filter_map(|s| match &s.kind {
                PPStatementKind::Include(directive) => Some(directive),
                _ => None,
            })
            .collect()
    }

    pub fn all_preprocessor_statements(&self) -> &[PreprocessorStatement] {
        &self.statements
    }

    pub fn preprocessor_problems(&self) -> &[PPProblem] {
        &self.problems
    }

    /// Whether the main file is guarded by `#pragma once` or an include guard
    pub fn has_pragma_once_semantics(&self) -> bool {
        self.has_pragma_once
    }

    /// Guard macro of the main file
    pub fn include_guard(&self) -> Option<Symbol> {
        self.main_include_guard
    }

    pub fn node_selector(&self) -> NodeSelector<'_> {
        NodeSelector::new(&self.ast, &self.resolver, self.main_file)
    }

    /// Walk the whole tree. Implicit names are produced by the resolver.
    pub fn accept(&self, visitor: &mut dyn AstVisitor) -> bool {
        match self.root() {
            Some(root) => visitor::walk(&self.ast, root, visitor, Some(&self.resolver)),
            None => true,
        }
    }

    pub fn resolve_binding(&self, name: NodeRef) -> BindingId {
        self.resolver.resolve_binding(name)
    }

    /// Name nodes declaring `binding`
    pub fn declarations_of(&self, binding: BindingId) -> Vec<NodeRef> {
        self.resolver.declarations(binding)
    }

    /// Name nodes referring to `binding` without declaring it
    pub fn references_of(&self, binding: BindingId) -> Vec<NodeRef> {
        self.names()
            .into_iter()
            .filter(|name| !self.resolver.is_declaration(*name) && self.resolver.resolve_binding(*name) == binding)
            .collect()
    }

    /// File and macro-expansion pieces a node was produced from
    pub fn node_locations(&self, node: NodeRef) -> Vec<NodeLocation> {
        let range = self.ast.get_tokens(node).as_range();
        match self.tokens.get(range) {
            Some(tokens) => self.location_map.node_locations(tokens),
            None => Vec::new(),
        }
    }

    /// Original text of a node
    pub fn raw_signature(&self, node: NodeRef) -> Option<String> {
        self.source_manager
            .get_source_text(self.ast.get_span(node))
            .map(str::to_string)
    }

    fn names(&self) -> Vec<NodeRef> {
        self.root()
            .map(|root| NameCollector::collect(&self.ast, root))
            .unwrap_or_default()
    }

    /// Problem nodes produced by syntax error recovery
    pub fn syntax_problems(&self) -> Vec<NodeRef> {
        let Some(root) = self.root() else {
            return Vec::new();
        };
        self.ast
            .descendants(root)
            .into_iter()
            .filter(|node| self.ast.get_kind(*node).is_problem())
            .collect()
    }

    /// Names resolving to problem bindings
    pub fn binding_problems(&self) -> Vec<NodeRef> {
        self.names()
            .into_iter()
            .filter(|name| self.resolver.is_problem(self.resolver.resolve_binding(*name)))
            .collect()
    }

    pub fn syntax_problem_count(&self) -> usize {
        self.syntax_problems().len()
    }

    pub fn binding_problem_count(&self) -> usize {
        self.binding_problems().len()
    }

    pub fn preprocessor_problem_count(&self) -> usize {
        self.problems.len()
    }
}
