use crate::diagnostic::{Diagnostic, DiagnosticEngine, DiagnosticLevel};
use crate::lang_options::{GNU_KEYWORD_MACROS, LangOptions, ScannerInfo};
use crate::location_map::{ExpansionRecord, LocationMap, MacroDefId, MacroDefinition};
use crate::pp::directives::{IncludeDirective, PPProblem, PPProblemKind, PPStatementKind, PreprocessorStatement};
use crate::pp::guard::detect_include_guard;
use crate::pp::header_search::{HeaderSearch, IncludeFileContentProvider, normalize_path};
use crate::pp::interpreter::Interpreter;
use crate::pp::pp_lexer::{ExpansionRef, PPLexer, PPToken, PPTokenFlags, PPTokenKind, tokenize_all};
use crate::source_manager::{LineDirective, SourceId, SourceLoc, SourceManager, SourceSpan};
use chrono::{DateTime, Local};
use hashbrown::{HashMap, HashSet};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use symbol_table::GlobalSymbol as Symbol;

/// Preprocessor directive kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    Define,
    Undef,
    Include,
    IncludeNext,
    If,
    Ifdef,
    Ifndef,
    Elif,
    Else,
    Endif,
    Line,
    Pragma,
    Error,
    Warning,
}

/// Table of pre-interned preprocessor directive names for O(1) keyword recognition
#[derive(Clone)]
pub struct DirectiveKeywordTable {
    directives: HashMap<Symbol, DirectiveKind>,
    defined: Symbol,
    has_include: Symbol,
    has_include_next: Symbol,
    pragma_operator: Symbol,
}

impl Default for DirectiveKeywordTable {
    fn default() -> Self {
        Self::new()
    }
}

impl DirectiveKeywordTable {
    pub fn new() -> Self {
        let directives = [
            ("define", DirectiveKind::Define),
            ("undef", DirectiveKind::Undef),
            ("include", DirectiveKind::Include),
            ("include_next", DirectiveKind::IncludeNext),
            ("if", DirectiveKind::If),
            ("ifdef", DirectiveKind::Ifdef),
            ("ifndef", DirectiveKind::Ifndef),
            ("elif", DirectiveKind::Elif),
            ("else", DirectiveKind::Else),
            ("endif", DirectiveKind::Endif),
            ("line", DirectiveKind::Line),
            ("pragma", DirectiveKind::Pragma),
            ("error", DirectiveKind::Error),
            ("warning", DirectiveKind::Warning),
        ]
        .into_iter()
        .map(|(name, kind)| (Symbol::new(name), kind))
        .collect();
        DirectiveKeywordTable {
            directives,
            defined: Symbol::new("defined"),
            has_include: Symbol::new("__has_include"),
            has_include_next: Symbol::new("__has_include_next"),
            pragma_operator: Symbol::new("_Pragma"),
        }
    }

    pub fn is_directive(&self, symbol: Symbol) -> Option<DirectiveKind> {
        self.directives.get(&symbol).copied()
    }
}

// Packed boolean flags for macro properties
bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct MacroFlags: u8 {
        const FUNCTION_LIKE = 1 << 0;
        const C99_VARARGS = 1 << 1;
        const GNU_VARARGS = 1 << 2;
        const BUILTIN = 1 << 3;
        const DISABLED = 1 << 4;
        const USED = 1 << 5;
        /// Value computed at the expansion site (`__LINE__`, ...)
        const DYNAMIC = 1 << 6;
    }
}

/// Represents a macro definition
#[derive(Clone, Debug)]
pub struct MacroInfo {
    pub def_id: MacroDefId,
    pub flags: MacroFlags,
    pub tokens: Vec<PPToken>,
    /// Named parameters, without the variadic one
    pub parameter_list: Vec<Symbol>,
    /// `__VA_ARGS__` or the GNU named variadic parameter
    pub variadic_arg: Option<Symbol>,
}

impl MacroInfo {
    fn param_index(&self, symbol: Symbol) -> Option<usize> {
        self.parameter_list
            .iter()
            .position(|&p| p == symbol)
            .or_else(|| (self.variadic_arg == Some(symbol)).then_some(self.parameter_list.len()))
    }
}

/// Represents conditional compilation state
#[derive(Debug, Clone)]
struct PPConditionalInfo {
    if_loc: SourceLoc,
    was_skipping: bool,
    found_else: bool,
    found_non_skipping: bool,
}

/// Include stack information
#[derive(Debug, Clone)]
struct IncludeStackInfo {
    path: PathBuf,
    /// Conditional stack height when the file was entered
    conditional_base: usize,
    /// Directives of this file are reported as statements
    record_statements: bool,
}

/// Guard facts of a header, computed once per path
#[derive(Debug, Clone, Copy, Default)]
struct HeaderInfo {
    guard: Option<Symbol>,
    pragma_once: bool,
}

enum Pending {
    Token(PPToken),
    /// Re-enables the macro once its replacement has been rescanned
    EndExpansion(Symbol),
}

/// Preprocessor errors. Only configuration problems are fatal; everything
/// else is recorded as a [`PPProblem`].
#[derive(Debug, thiserror::Error)]
pub enum PPError {
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
    #[error("Main buffer {0} is not registered")]
    MissingMainBuffer(SourceId),
}

/// Result of preprocessing one translation unit
#[derive(Debug, Clone)]
pub struct PPOutput {
    /// Fully expanded tokens, terminated by `Eof`
    pub tokens: Vec<PPToken>,
    pub statements: Vec<PreprocessorStatement>,
    pub problems: Vec<PPProblem>,
    pub location_map: LocationMap,
    pub main_file: SourceId,
    pub main_include_guard: Option<Symbol>,
    pub main_has_pragma_once_semantics: bool,
}

/// Main preprocessor structure
pub struct Preprocessor<'src> {
    source_manager: &'src mut SourceManager,
    diag: &'src mut DiagnosticEngine,
    provider: &'src dyn IncludeFileContentProvider,
    lang_opts: LangOptions,

    // Pre-interned directive keywords for fast comparison
    directive_keywords: DirectiveKeywordTable,

    // Macro management
    macros: HashMap<Symbol, MacroInfo>,
    location_map: LocationMap,

    // Include management
    once_included: HashSet<PathBuf>,
    header_infos: HashMap<PathBuf, HeaderInfo>,
    include_stack: Vec<IncludeStackInfo>,
    header_search: HeaderSearch,
    max_include_depth: usize,

    // Conditional compilation state
    conditional_stack: Vec<PPConditionalInfo>,
    skipping: bool,

    // Token management
    lexer_stack: Vec<PPLexer>,
    pending: VecDeque<Pending>,
    /// Expanding a detached token list (macro argument, `#if` line)
    isolated_depth: usize,

    statements: Vec<PreprocessorStatement>,
    problems: Vec<PPProblem>,
    counter: u32,
}

impl<'src> Preprocessor<'src> {
    /// Create a new preprocessor
    pub fn new(
        source_manager: &'src mut SourceManager,
        diag: &'src mut DiagnosticEngine,
        provider: &'src dyn IncludeFileContentProvider,
        lang_opts: LangOptions,
        scanner_info: &ScannerInfo,
        max_include_depth: usize,
    ) -> Self {
        let header_search = HeaderSearch::new(
            scanner_info.local_include_paths.clone(),
            scanner_info.include_paths.clone(),
        );
        Preprocessor {
            source_manager,
            diag,
            provider,
            lang_opts,
            directive_keywords: DirectiveKeywordTable::new(),
            macros: HashMap::new(),
            location_map: LocationMap::new(),
            once_included: HashSet::new(),
            header_infos: HashMap::new(),
            include_stack: Vec::new(),
            header_search,
            max_include_depth,
            conditional_stack: Vec::new(),
            skipping: false,
            lexer_stack: Vec::new(),
            pending: VecDeque::new(),
            isolated_depth: 0,
            statements: Vec::new(),
            problems: Vec::new(),
            counter: 0,
        }
    }

    /// Check if a macro is defined
    pub fn is_macro_defined(&self, symbol: &Symbol) -> bool {
        self.macros.contains_key(symbol)
    }

    /// Preprocess `main` after the predefined macros, macro files and
    /// include files of `scanner_info`.
    pub fn process(mut self, main: SourceId, scanner_info: &ScannerInfo) -> Result<PPOutput, PPError> {
        let main_buffer = self
            .source_manager
            .get_buffer_arc(main)
            .ok_or(PPError::MissingMainBuffer(main))?;

        self.initialize_builtin_macros(scanner_info);

        for path in &scanner_info.macro_files {
            let content = self
                .provider
                .read(path)
                .ok_or_else(|| PPError::FileNotFound(path.clone()))?;
            let id = self.source_manager.add_buffer(content, &path.to_string_lossy(), None);
            log::debug!("importing macros from {}", path.display());
            self.run_discarding(id, path.clone(), false);
        }

        let main_path = self
            .source_manager
            .path(main)
            .map(Path::to_path_buf)
            .unwrap_or_default();
        self.push_file(main, main_path.clone(), main_buffer.clone(), true);

        for path in scanner_info.include_files.iter().rev() {
            let content = self
                .provider
                .read(path)
                .ok_or_else(|| PPError::FileNotFound(path.clone()))?;
            let id = self.source_manager.add_buffer(content.clone(), &path.to_string_lossy(), None);
            self.push_file(id, path.clone(), content, true);
        }

        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            if let Some(expansion) = token.expansion
                && let Some(record) = self.location_map.expansion_mut(expansion.outer)
            {
                record.token_count += 1;
            }
            let done = token.kind == PPTokenKind::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }

        let raw = tokenize_all(main, main_buffer, self.lang_opts);
        let main_include_guard = detect_include_guard(&raw);
        let main_has_pragma_once_semantics = main_include_guard.is_some()
            || self.once_included.contains(&normalize_path(&main_path))
            || has_pragma_once(&raw);

        log::debug!(
            "preprocessed {} tokens, {} statements, {} problems",
            tokens.len(),
            self.statements.len(),
            self.problems.len()
        );

        Ok(PPOutput {
            tokens,
            statements: self.statements,
            problems: self.problems,
            location_map: self.location_map,
            main_file: main,
            main_include_guard,
            main_has_pragma_once_semantics,
        })
    }

    /// Initialize built-in macros: language macros, dynamic macros and the
    /// configured predefined symbols
    fn initialize_builtin_macros(&mut self, scanner_info: &ScannerInfo) {
        for name in ["__LINE__", "__FILE__", "__COUNTER__"] {
            self.define_dynamic_macro(name);
        }

        let now: DateTime<Local> = Local::now();
        let mut text = String::new();
        text.push_str(&format!("#define __DATE__ {}\n", now.format("\"%b %e %Y\"")));
        text.push_str(&format!("#define __TIME__ {}\n", now.format("\"%H:%M:%S\"")));
        text.push_str("#define __STDC__ 1\n#define __STDC_HOSTED__ 1\n");
        if self.lang_opts.is_cpp() {
            text.push_str("#define __cplusplus 201103L\n");
        } else {
            text.push_str("#define __STDC_VERSION__ 201112L\n");
        }
        if self.lang_opts.gnu_mode {
            for (name, value) in GNU_KEYWORD_MACROS {
                text.push_str(&format!("#define {} {}\n", name, value));
            }
        }
        for (name, value) in &scanner_info.defined_symbols {
            text.push_str(&format!("#define {} {}\n", name, value));
        }

        let id = self.source_manager.add_virtual_buffer(text, "predefined");
        self.run_discarding(id, PathBuf::from("<predefined>"), false);
    }

    fn define_dynamic_macro(&mut self, name: &str) {
        let symbol = Symbol::new(name);
        let def_id = self.location_map.add_definition(MacroDefinition {
            name: symbol,
            name_span: SourceSpan::empty(),
            parameters: None,
            variadic: false,
            expansion: String::new(),
            predefined: true,
        });
        self.macros.insert(
            symbol,
            MacroInfo {
                def_id,
                flags: MacroFlags::BUILTIN | MacroFlags::DYNAMIC,
                tokens: Vec::new(),
                parameter_list: Vec::new(),
                variadic_arg: None,
            },
        );
    }

    /// Scan a buffer only for its definitions
    fn run_discarding(&mut self, id: SourceId, path: PathBuf, record_statements: bool) {
        let Some(buffer) = self.source_manager.get_buffer_arc(id) else {
            return;
        };
        self.push_file(id, path, buffer, record_statements);
        while self.next_token().kind != PPTokenKind::Eof {}
        self.lexer_stack.clear();
        self.include_stack.clear();
        self.conditional_stack.clear();
        self.skipping = false;
    }

    fn push_file(&mut self, id: SourceId, path: PathBuf, buffer: Arc<str>, record_statements: bool) {
        self.lexer_stack.push(PPLexer::new(id, buffer, self.lang_opts));
        self.include_stack.push(IncludeStackInfo {
            path: normalize_path(&path),
            conditional_base: self.conditional_stack.len(),
            record_statements,
        });
    }

    fn pop_file(&mut self) {
        self.lexer_stack.pop();
        if let Some(info) = self.include_stack.pop() {
            self.close_conditionals(info.conditional_base);
            log::trace!("leaving {}", info.path.display());
        }
    }

    /// Report and drop conditionals left open by the file being left
    fn close_conditionals(&mut self, base: usize) {
        while self.conditional_stack.len() > base {
            if let Some(info) = self.conditional_stack.pop() {
                let span = SourceSpan::new_with_length(info.if_loc.source_id, info.if_loc.offset, 1);
                self.report_problem(PPProblemKind::UnbalancedConditional, span, "");
                self.skipping = info.was_skipping;
            }
        }
    }

    fn records_statements(&self) -> bool {
        self.include_stack.last().is_some_and(|i| i.record_statements)
    }

    fn current_location(&self) -> SourceLoc {
        if let Some(lexer) = self.lexer_stack.last() {
            SourceLoc::new(lexer.source_id, lexer.position)
        } else {
            SourceLoc::builtin()
        }
    }

    fn current_dir(&self) -> PathBuf {
        self.include_stack
            .last()
            .and_then(|i| i.path.parent())
            .map(Path::to_path_buf)
            .unwrap_or_default()
    }

    fn report_problem(&mut self, kind: PPProblemKind, span: SourceSpan, argument: impl Into<String>) {
        let problem = PPProblem {
            kind,
            span,
            argument: argument.into(),
        };
        log::debug!("preprocessor problem: {}", problem.message());
        let level = if kind == PPProblemKind::PoundWarning {
            DiagnosticLevel::Warning
        } else {
            DiagnosticLevel::Error
        };
        self.diag.report_diagnostic(Diagnostic {
            level,
            message: problem.message(),
            location: span,
            code: Some(format!("{:?}", kind)),
            hints: Vec::new(),
            related: Vec::new(),
        });
        self.problems.push(problem);
    }

    fn record_statement(&mut self, kind: PPStatementKind, span: SourceSpan, active: bool) {
        if self.records_statements() {
            self.statements.push(PreprocessorStatement { kind, span, active });
        }
    }

    /// Lex the next token from the file stack, leaving finished includes
    fn lex_token(&mut self) -> PPToken {
        loop {
            let Some(lexer) = self.lexer_stack.last_mut() else {
                return PPToken::new(PPTokenKind::Eof, PPTokenFlags::empty(), SourceLoc::builtin(), 0);
            };
            let next = lexer.next_token();
            self.report_lexer_problems();
            match next {
                Some(token) if token.kind == PPTokenKind::Eof && self.lexer_stack.len() > 1 => self.pop_file(),
                Some(token) => return token,
                None if self.lexer_stack.len() > 1 => self.pop_file(),
                None => {
                    let loc = self.current_location();
                    return PPToken::new(PPTokenKind::Eof, PPTokenFlags::empty(), loc, 0);
                }
            }
        }
    }

    /// Unterminated comments and literals of the current file, ignored in
    /// skipped groups
    fn report_lexer_problems(&mut self) {
        let Some(lexer) = self.lexer_stack.last_mut() else {
            return;
        };
        let problems = lexer.take_problems();
        if self.skipping {
            return;
        }
        for (kind, span) in problems {
            self.report_problem(kind, span, String::new());
        }
    }

    /// Token inside a directive line; `Eod` at its end
    fn lex_directive_token(&mut self) -> PPToken {
        let loc = self.current_location();
        let next = self.lexer_stack.last_mut().and_then(|l| l.next_token());
        self.report_lexer_problems();
        match next {
            Some(token) if token.kind == PPTokenKind::Eof => {
                if let Some(lexer) = self.lexer_stack.last_mut() {
                    lexer.put_back(token);
                }
                PPToken::new(PPTokenKind::Eod, PPTokenFlags::empty(), loc, 0)
            }
            Some(token) => token,
            None => PPToken::new(PPTokenKind::Eod, PPTokenFlags::empty(), loc, 0),
        }
    }

    /// Remaining tokens of the current directive line
    fn read_directive_line(&mut self) -> Vec<PPToken> {
        let mut tokens = Vec::new();
        loop {
            let token = self.lex_directive_token();
            if token.kind == PPTokenKind::Eod {
                return tokens;
            }
            tokens.push(token);
        }
    }

    /// Next token after directive processing and conditional skipping, but
    /// before macro expansion. The flag tells whether it came from a file.
    fn next_raw(&mut self) -> (PPToken, bool) {
        loop {
            match self.pending.pop_front() {
                Some(Pending::Token(token)) => return (token, false),
                Some(Pending::EndExpansion(symbol)) => {
                    if let Some(info) = self.macros.get_mut(&symbol) {
                        info.flags.remove(MacroFlags::DISABLED);
                    }
                    continue;
                }
                None => {}
            }
            if self.isolated_depth > 0 {
                return (
                    PPToken::new(PPTokenKind::Eof, PPTokenFlags::empty(), SourceLoc::builtin(), 0),
                    false,
                );
            }

            let token = self.lex_token();
            if token.kind == PPTokenKind::Hash && token.flags.contains(PPTokenFlags::STARTS_LINE) {
                self.handle_directive(token);
                continue;
            }
            if token.kind == PPTokenKind::Eof {
                let base = self.include_stack.last().map_or(0, |i| i.conditional_base);
                self.close_conditionals(base);
                return (token, true);
            }
            if self.skipping {
                continue;
            }
            return (token, true);
        }
    }

    fn unread(&mut self, token: PPToken, from_file: bool) {
        if from_file {
            if let Some(lexer) = self.lexer_stack.last_mut() {
                lexer.put_back(token);
            }
        } else {
            self.pending.push_front(Pending::Token(token));
        }
    }

    /// Next fully macro-expanded token
    pub fn next_token(&mut self) -> PPToken {
        loop {
            let (mut token, _) = self.next_raw();
            let PPTokenKind::Identifier(symbol) = token.kind else {
                return token;
            };
            if token.flags.contains(PPTokenFlags::NO_EXPAND) {
                return token;
            }
            if symbol == self.directive_keywords.pragma_operator && self.handle_pragma_operator() {
                continue;
            }
            let flags = match self.macros.get(&symbol) {
                Some(info) => info.flags,
                None => return token,
            };
            if flags.contains(MacroFlags::DISABLED) {
                // painted: this occurrence never expands again
                token.flags |= PPTokenFlags::NO_EXPAND;
                return token;
            }
            if flags.contains(MacroFlags::FUNCTION_LIKE) && !self.peek_left_paren() {
                return token;
            }
            self.expand_macro(token, symbol);
        }
    }

    /// Whether the next token (possibly from the file) is `(`
    fn peek_left_paren(&mut self) -> bool {
        for pending in &self.pending {
            if let Pending::Token(token) = pending {
                return token.kind == PPTokenKind::LeftParen;
            }
        }
        if self.isolated_depth > 0 {
            return false;
        }
        let (token, from_file) = self.next_raw();
        let is_paren = token.kind == PPTokenKind::LeftParen;
        self.unread(token, from_file);
        is_paren
    }

    /// `_Pragma("...")`: consumed, `once` is honored
    fn handle_pragma_operator(&mut self) -> bool {
        if !self.peek_left_paren() {
            return false;
        }
        let _ = self.next_raw();
        let (arg, _) = self.next_raw();
        let (close, close_from_file) = self.next_raw();
        if close.kind != PPTokenKind::RightParen {
            self.unread(close, close_from_file);
        }
        if let PPTokenKind::StringLiteral(text) = arg.kind
            && text.as_str().trim_matches('"').trim() == "once"
            && let Some(info) = self.include_stack.last()
        {
            self.once_included.insert(info.path.clone());
        }
        true
    }

    /// Collect the arguments of a function-like invocation; the `(` is next
    fn collect_arguments(&mut self) -> Option<(Vec<Vec<PPToken>>, PPToken, bool)> {
        let _ = self.next_raw();
        let mut args = Vec::new();
        let mut current = Vec::new();
        let mut depth = 0usize;
        loop {
            let (token, from_file) = self.next_raw();
            match token.kind {
                PPTokenKind::Eof => {
                    self.unread(token, from_file);
                    return None;
                }
                PPTokenKind::LeftParen => {
                    depth += 1;
                    current.push(token);
                }
                PPTokenKind::RightParen if depth == 0 => {
                    args.push(current);
                    return Some((args, token, from_file));
                }
                PPTokenKind::RightParen => {
                    depth -= 1;
                    current.push(token);
                }
                PPTokenKind::Comma if depth == 0 => args.push(std::mem::take(&mut current)),
                _ => current.push(token),
            }
        }
    }

    /// Replace the invocation named by `name_token` with its expansion,
    /// queued for rescanning
    fn expand_macro(&mut self, name_token: PPToken, symbol: Symbol) {
        let Some(info) = self.macros.get(&symbol).cloned() else {
            return;
        };
        let name_span = name_token.span();

        let mut args = Vec::new();
        let mut invocation_end: Option<SourceLoc> = None;
        if info.flags.contains(MacroFlags::FUNCTION_LIKE) {
            let Some((collected, rparen, rparen_from_file)) = self.collect_arguments() else {
                self.report_problem(PPProblemKind::UnterminatedMacroInvocation, name_span, symbol.as_str());
                return;
            };
            if rparen_from_file {
                invocation_end = Some(rparen.span().end());
            }
            match self.match_arguments(&info, collected) {
                Some(matched) => args = matched,
                None => {
                    self.report_problem(PPProblemKind::MacroArgumentMismatch, name_span, symbol.as_str());
                    return;
                }
            }
        }

        // record the expansion event
        let parent = name_token.expansion.map(|e| e.inner);
        let invocation = match name_token.expansion {
            Some(enclosing) => {
                let mut span = self
                    .location_map
                    .expansion(enclosing.outer)
                    .map(|e| e.invocation)
                    .unwrap_or(name_span);
                if let Some(end) = invocation_end
                    && end.source_id == span.source_id()
                    && end.offset > span.end().offset
                {
                    // arguments extend past the enclosing invocation
                    span = SourceSpan::new(span.start(), end);
                    if let Some(record) = self.location_map.expansion_mut(enclosing.outer) {
                        record.invocation = span;
                    }
                }
                span
            }
            None => match invocation_end {
                Some(end) if end.source_id == name_span.source_id() => SourceSpan::new(name_span.start(), end),
                _ => name_span,
            },
        };
        let id = self.location_map.add_expansion(ExpansionRecord {
            definition: info.def_id,
            name: symbol,
            invocation,
            parent,
            token_count: 0,
        });
        let outer = name_token.expansion.map_or(id, |e| e.outer);

        let mut body = if info.flags.contains(MacroFlags::DYNAMIC) {
            self.dynamic_value(symbol, &name_token)
        } else if info.flags.contains(MacroFlags::FUNCTION_LIKE) {
            self.substitute_macro(&info, &args)
        } else {
            info.tokens.clone()
        };

        for (i, token) in body.iter_mut().enumerate() {
            token.flags.remove(PPTokenFlags::STARTS_LINE | PPTokenFlags::NO_EXPAND);
            token.flags |= PPTokenFlags::MACRO_EXPANDED;
            if i == 0 {
                token.flags.set(PPTokenFlags::LEADING_SPACE, name_token.has_leading_space());
            }
            let inner = token.expansion.map_or(id, |e| e.inner);
            token.expansion = Some(ExpansionRef { outer, inner });
        }
        log::debug!("expanding {} into {} tokens", symbol, body.len());

        if let Some(m) = self.macros.get_mut(&symbol) {
            m.flags |= MacroFlags::USED | MacroFlags::DISABLED;
        }
        self.pending.push_front(Pending::EndExpansion(symbol));
        for token in body.into_iter().rev() {
            self.pending.push_front(Pending::Token(token));
        }
    }

    /// Fit the collected arguments to the parameter list; `None` on a count mismatch
    fn match_arguments(&self, info: &MacroInfo, mut args: Vec<Vec<PPToken>>) -> Option<Vec<Vec<PPToken>>> {
        let named = info.parameter_list.len();
        if info.variadic_arg.is_none() {
            if named == 0 && args.len() == 1 && args[0].is_empty() {
                return Some(Vec::new());
            }
            return (args.len() == named).then_some(args);
        }
        if named == 0 && args.len() == 1 && args[0].is_empty() {
            return Some(vec![Vec::new()]);
        }
        if args.len() < named {
            return None;
        }
        if args.len() == named {
            args.push(Vec::new());
            return Some(args);
        }
        // join the variadic tail back together, commas included
        let tail = args.split_off(named);
        let mut variadic = Vec::new();
        for (i, arg) in tail.into_iter().enumerate() {
            if i > 0 {
                let loc = variadic.last().map_or(SourceLoc::builtin(), |t: &PPToken| t.span().end());
                variadic.push(PPToken::new(PPTokenKind::Comma, PPTokenFlags::empty(), loc, 1));
            }
            variadic.extend(arg);
        }
        args.push(variadic);
        Some(args)
    }

    fn dynamic_value(&mut self, symbol: Symbol, name_token: &PPToken) -> Vec<PPToken> {
        let site = match name_token.expansion {
            Some(e) => self
                .location_map
                .expansion(e.outer)
                .map_or(name_token.location, |r| r.invocation.start()),
            None => name_token.location,
        };
        let kind = match symbol.as_str() {
            "__LINE__" => {
                let line = self.source_manager.get_presumed_location(site).map_or(1, |p| p.0);
                PPTokenKind::Number(Symbol::new(line.to_string()))
            }
            "__FILE__" => {
                let file = self
                    .source_manager
                    .get_presumed_location(site)
                    .and_then(|p| p.2.map(str::to_string))
                    .unwrap_or_default();
                PPTokenKind::StringLiteral(Symbol::new(format!("\"{}\"", file.replace('\\', "\\\\"))))
            }
            _ => {
                let value = self.counter;
                self.counter += 1;
                PPTokenKind::Number(Symbol::new(value.to_string()))
            }
        };
        vec![PPToken::new(kind, name_token.flags, name_token.location, name_token.length)]
    }

    /// Fully expand a detached token list
    fn expand_isolated(&mut self, tokens: Vec<PPToken>) -> Vec<PPToken> {
        let saved = std::mem::replace(&mut self.pending, tokens.into_iter().map(Pending::Token).collect());
        self.isolated_depth += 1;
        let mut out = Vec::new();
        loop {
            let token = self.next_token();
            if token.kind == PPTokenKind::Eof {
                break;
            }
            out.push(token);
        }
        self.isolated_depth -= 1;
        let leftover = std::mem::replace(&mut self.pending, saved);
        for pending in leftover {
            if let Pending::EndExpansion(symbol) = pending
                && let Some(info) = self.macros.get_mut(&symbol)
            {
                info.flags.remove(MacroFlags::DISABLED);
            }
        }
        out
    }

    /// Substitute parameters in macro body
    fn substitute_macro(&mut self, info: &MacroInfo, args: &[Vec<PPToken>]) -> Vec<PPToken> {
        let body = &info.tokens;
        let mut expanded_args: Vec<Option<Vec<PPToken>>> = vec![None; args.len()];
        let mut result: Vec<PPToken> = Vec::new();
        let mut paste_next = false;
        // the left operand of a pending `##` was an empty argument
        let mut placemarker = false;
        let variadic_index = info.variadic_arg.map(|_| info.parameter_list.len());

        let mut i = 0;
        while i < body.len() {
            let token = body[i];
            let next_is_paste = body.get(i + 1).is_some_and(|t| t.kind == PPTokenKind::HashHash);

            if token.kind == PPTokenKind::HashHash && i > 0 && i + 1 < body.len() {
                paste_next = true;
                i += 1;
                continue;
            }

            // stringification
            if token.kind == PPTokenKind::Hash
                && let Some(PPTokenKind::Identifier(param)) = body.get(i + 1).map(|t| t.kind)
                && let Some(index) = info.param_index(param)
            {
                let string = self.stringify_tokens(&args[index], token);
                self.append_substituted(&mut result, vec![string], paste_next, placemarker);
                paste_next = false;
                placemarker = false;
                i += 2;
                continue;
            }

            let parameter = match token.kind {
                PPTokenKind::Identifier(sym) => info.param_index(sym),
                _ => None,
            };
            let Some(index) = parameter else {
                self.append_substituted(&mut result, vec![token], paste_next, placemarker);
                paste_next = false;
                placemarker = false;
                i += 1;
                continue;
            };

            // GNU `, ## __VA_ARGS__`
            if paste_next
                && Some(index) == variadic_index
                && result.last().is_some_and(|t| t.kind == PPTokenKind::Comma)
            {
                if args[index].is_empty() {
                    result.pop();
                } else {
                    result.extend(args[index].iter().copied());
                }
                paste_next = false;
                placemarker = false;
                i += 1;
                continue;
            }

            let replacement = if paste_next || next_is_paste {
                args[index].clone()
            } else {
                if expanded_args[index].is_none() {
                    expanded_args[index] = Some(self.expand_isolated(args[index].clone()));
                }
                expanded_args[index].clone().unwrap_or_default()
            };
            let empty = replacement.is_empty();
            self.append_substituted(&mut result, replacement, paste_next, placemarker);
            placemarker = empty && next_is_paste;
            paste_next = false;
            i += 1;
        }
        result
    }

    fn append_substituted(&mut self, result: &mut Vec<PPToken>, tokens: Vec<PPToken>, paste: bool, placemarker: bool) {
        let mut tokens = tokens.into_iter();
        if paste
            && !placemarker
            && let Some(left) = result.pop()
        {
            match tokens.next() {
                Some(right) => result.extend(self.paste_tokens(&left, &right)),
                None => result.push(left),
            }
        }
        result.extend(tokens);
    }

    /// Stringify tokens for # operator
    fn stringify_tokens(&self, tokens: &[PPToken], hash: PPToken) -> PPToken {
        let mut result = String::from("\"");
        for (i, token) in tokens.iter().enumerate() {
            if i > 0 && token.has_leading_space() {
                result.push(' ');
            }
            let text = token.get_text();
            if matches!(token.kind, PPTokenKind::StringLiteral(_) | PPTokenKind::CharLiteral(_)) {
                for ch in text.chars() {
                    match ch {
                        '"' => result.push_str("\\\""),
                        '\\' => result.push_str("\\\\"),
                        _ => result.push(ch),
                    }
                }
            } else {
                result.push_str(text);
            }
        }
        result.push('"');
        PPToken::new(
            PPTokenKind::StringLiteral(Symbol::new(&result)),
            hash.flags,
            hash.location,
            hash.length,
        )
    }

    /// Paste tokens for ## operator; an invalid paste keeps both tokens
    fn paste_tokens(&mut self, left: &PPToken, right: &PPToken) -> Vec<PPToken> {
        let pasted_text = format!("{}{}", left.get_text(), right.get_text());
        let relexed = tokenize_all(left.location.source_id, Arc::from(pasted_text.as_str()), self.lang_opts);
        match relexed.as_slice() {
            [single] => {
                let mut token = *left;
                token.kind = single.kind;
                token.flags |= PPTokenFlags::PASTED;
                vec![token]
            }
            _ => {
                let span = left.span().merge(right.span());
                self.report_problem(PPProblemKind::InvalidPaste, span, pasted_text);
                vec![*left, *right]
            }
        }
    }

    /// Handle preprocessor directives
    fn handle_directive(&mut self, hash: PPToken) {
        if let Some(lexer) = self.lexer_stack.last_mut() {
            lexer.in_directive = true;
        }
        let name_token = self.lex_directive_token();
        let kind = match name_token.kind {
            PPTokenKind::Eod => return,
            PPTokenKind::Identifier(sym) => self.directive_keywords.is_directive(sym),
            _ => None,
        };
        if matches!(kind, Some(DirectiveKind::Include | DirectiveKind::IncludeNext))
            && let Some(lexer) = self.lexer_stack.last_mut()
        {
            lexer.header_name_mode = true;
        }
        let tokens = self.read_directive_line();
        let end = tokens.last().unwrap_or(&name_token).span().end();
        let span = SourceSpan::new(hash.location, end);

        let Some(kind) = kind else {
            let name = name_token.get_text().to_string();
            if self.skipping {
                self.record_statement(PPStatementKind::Unknown { name }, span, false);
            } else if let PPTokenKind::Number(_) = name_token.kind {
                // GNU line marker: `# 12 "file"`
                let mut line_tokens = vec![name_token];
                line_tokens.extend(tokens);
                self.handle_line(hash, line_tokens, span);
            } else {
                self.report_problem(PPProblemKind::InvalidDirective, span, name.clone());
                self.record_statement(PPStatementKind::Unknown { name }, span, true);
            }
            return;
        };
        log::trace!("directive #{:?} at {}", kind, hash.location);

        match kind {
            DirectiveKind::If => self.handle_if(tokens, span),
            DirectiveKind::Ifdef | DirectiveKind::Ifndef => {
                self.handle_ifdef(tokens, span, kind == DirectiveKind::Ifndef)
            }
            DirectiveKind::Elif => self.handle_elif(tokens, span),
            DirectiveKind::Else => self.handle_else(span),
            DirectiveKind::Endif => self.handle_endif(span),
            _ if self.skipping => {
                let kind = self.inactive_statement(kind, &tokens);
                self.record_statement(kind, span, false);
            }
            DirectiveKind::Define => self.handle_define(tokens, span),
            DirectiveKind::Undef => self.handle_undef(tokens, span),
            DirectiveKind::Include => self.handle_include(hash, tokens, span, false),
            DirectiveKind::IncludeNext => self.handle_include(hash, tokens, span, true),
            DirectiveKind::Line => self.handle_line(hash, tokens, span),
            DirectiveKind::Pragma => self.handle_pragma(tokens, span),
            DirectiveKind::Error | DirectiveKind::Warning => {
                let message = spell_tokens(&tokens);
                if kind == DirectiveKind::Error {
                    self.report_problem(PPProblemKind::PoundError, span, message.clone());
                    self.record_statement(PPStatementKind::Error { message }, span, true);
                } else {
                    self.report_problem(PPProblemKind::PoundWarning, span, message.clone());
                    self.record_statement(PPStatementKind::Warning { message }, span, true);
                }
            }
        }
    }

    /// Statement for a non-conditional directive in a skipped branch
    fn inactive_statement(&self, kind: DirectiveKind, tokens: &[PPToken]) -> PPStatementKind {
        let name = match tokens.first().map(|t| t.kind) {
            Some(PPTokenKind::Identifier(s)) => Some((s, tokens[0].span())),
            _ => None,
        };
        match (kind, name) {
            (DirectiveKind::Define, Some((name, name_span))) => PPStatementKind::Define {
                name,
                name_span,
                definition: None,
            },
            (DirectiveKind::Undef, Some((name, name_span))) => PPStatementKind::Undef { name, name_span },
            (DirectiveKind::Include | DirectiveKind::IncludeNext, _) => {
                let (name, system) = header_name_of(tokens).unwrap_or_default();
                PPStatementKind::Include(IncludeDirective {
                    name,
                    name_span: tokens.first().map(|t| t.span()).unwrap_or_default(),
                    system,
                    include_next: kind == DirectiveKind::IncludeNext,
                    resolved: None,
                    was_read: false,
                    has_pragma_once_semantics: false,
                })
            }
            (DirectiveKind::Pragma, _) => PPStatementKind::Pragma {
                text: spell_tokens(tokens),
            },
            (DirectiveKind::Error, _) => PPStatementKind::Error {
                message: spell_tokens(tokens),
            },
            (DirectiveKind::Warning, _) => PPStatementKind::Warning {
                message: spell_tokens(tokens),
            },
            (DirectiveKind::Line, _) => PPStatementKind::Line,
            _ => PPStatementKind::Unknown {
                name: format!("{:?}", kind).to_lowercase(),
            },
        }
    }

    fn handle_define(&mut self, tokens: Vec<PPToken>, span: SourceSpan) {
        let Some(&name_token) = tokens.first() else {
            self.report_problem(PPProblemKind::MissingMacroName, span, "");
            return;
        };
        let name = match name_token.kind {
            PPTokenKind::Identifier(sym) if sym != self.directive_keywords.defined => sym,
            _ => {
                self.report_problem(PPProblemKind::MissingMacroName, span, name_token.get_text());
                return;
            }
        };

        let mut flags = MacroFlags::empty();
        let mut params = Vec::new();
        let mut variadic = None;
        let mut body_start = 1;
        if let Some(lparen) = tokens.get(1)
            && lparen.kind == PPTokenKind::LeftParen
            && !lparen.has_leading_space()
        {
            flags |= MacroFlags::FUNCTION_LIKE;
            match parse_parameters(&tokens[2..]) {
                Some((parsed, parsed_variadic, gnu, consumed)) => {
                    params = parsed;
                    variadic = parsed_variadic;
                    if variadic.is_some() {
                        flags |= if gnu { MacroFlags::GNU_VARARGS } else { MacroFlags::C99_VARARGS };
                    }
                    body_start = 2 + consumed;
                }
                None => {
                    self.report_problem(PPProblemKind::InvalidMacroDefinition, span, name.as_str());
                    return;
                }
            }
        }

        let mut body: Vec<PPToken> = tokens[body_start..].to_vec();
        for token in &mut body {
            token.flags.remove(PPTokenFlags::STARTS_LINE);
        }
        if let Some(first) = body.first_mut() {
            first.flags.remove(PPTokenFlags::LEADING_SPACE);
        }

        if !valid_body(flags, &body, &params, variadic) {
            self.report_problem(PPProblemKind::InvalidMacroDefinition, span, name.as_str());
            return;
        }

        let expansion = spell_tokens(&body);
        let mut parameter_names: Vec<Symbol> = params.clone();
        if let Some(v) = variadic {
            parameter_names.push(if flags.contains(MacroFlags::GNU_VARARGS) {
                Symbol::new(format!("{}...", v))
            } else {
                Symbol::new("...")
            });
        }
        let parameters = flags.contains(MacroFlags::FUNCTION_LIKE).then_some(parameter_names);

        if let Some(existing) = self.macros.get(&name)
            && !existing.flags.contains(MacroFlags::BUILTIN)
            && let Some(previous) = self.location_map.definition(existing.def_id)
            && !previous.predefined
            && (previous.parameters != parameters || previous.expansion != expansion)
        {
            self.report_problem(PPProblemKind::InvalidMacroRedefinition, name_token.span(), name.as_str());
        }

        let def_id = self.location_map.add_definition(MacroDefinition {
            name,
            name_span: name_token.span(),
            parameters,
            variadic: variadic.is_some(),
            expansion,
            predefined: !self.records_statements(),
        });
        self.macros.insert(
            name,
            MacroInfo {
                def_id,
                flags,
                tokens: body,
                parameter_list: params,
                variadic_arg: variadic,
            },
        );
        self.record_statement(
            PPStatementKind::Define {
                name,
                name_span: name_token.span(),
                definition: Some(def_id),
            },
            span,
            true,
        );
    }

    fn handle_undef(&mut self, tokens: Vec<PPToken>, span: SourceSpan) {
        match tokens.first().map(|t| (t.kind, t.span())) {
            Some((PPTokenKind::Identifier(name), name_span)) => {
                self.macros.remove(&name);
                self.record_statement(PPStatementKind::Undef { name, name_span }, span, true);
            }
            _ => self.report_problem(PPProblemKind::MissingMacroName, span, ""),
        }
    }

    fn handle_include(&mut self, hash: PPToken, tokens: Vec<PPToken>, span: SourceSpan, include_next: bool) {
        let name_span = match (tokens.first(), tokens.last()) {
            (Some(first), Some(last)) => SourceSpan::new(first.span().start(), last.span().end()),
            _ => span,
        };
        let header = match header_name_of(&tokens) {
            Some(header) => Some(header),
            None if !tokens.is_empty() => {
                let expanded = self.expand_isolated(tokens);
                header_name_of(&expanded)
            }
            None => None,
        };
        let Some((name, system)) = header else {
            self.report_problem(PPProblemKind::InvalidDirective, span, "include");
            return;
        };

        let current_dir = self.current_dir();
        let resolved = if include_next {
            self.header_search
                .resolve_next_path(&name, system, &current_dir, self.provider)
        } else {
            self.header_search.resolve_path(&name, system, &current_dir, self.provider)
        };
        let mut directive = IncludeDirective {
            name: name.clone(),
            name_span,
            system,
            include_next,
            resolved: resolved.clone(),
            was_read: false,
            has_pragma_once_semantics: false,
        };

        let content = resolved.as_ref().and_then(|path| self.provider.read(path));
        let (Some(path), Some(content)) = (resolved, content) else {
            self.report_problem(PPProblemKind::InclusionNotFound, span, name);
            directive.resolved = None;
            self.record_statement(PPStatementKind::Include(directive), span, true);
            return;
        };

        let header_info = self.header_info(&path, &content);
        directive.has_pragma_once_semantics = header_info.guard.is_some() || header_info.pragma_once;

        let guarded = header_info.guard.is_some_and(|g| self.macros.contains_key(&g));
        let skip = self.once_included.contains(&path) || guarded;
        let depth = self.include_stack.len();

        if skip {
            log::debug!("skipping {} (already included)", path.display());
            self.record_statement(PPStatementKind::Include(directive), span, true);
        } else if depth > self.max_include_depth {
            self.report_problem(PPProblemKind::IncludeDepthExceeded, span, name);
            self.record_statement(PPStatementKind::Include(directive), span, true);
        } else if self.include_stack_repeats(&path) {
            self.report_problem(PPProblemKind::RecursiveInclusion, span, name);
            self.record_statement(PPStatementKind::Include(directive), span, true);
        } else {
            directive.was_read = true;
            self.record_statement(PPStatementKind::Include(directive), span, true);
            let id = self
                .source_manager
                .add_buffer(content.clone(), &path.to_string_lossy(), Some(hash.location));
            log::debug!("entering {} as {}", path.display(), id);
            self.push_file(id, path, content, true);
        }
    }

    /// A file already entered twice on the current stack is cut off
    fn include_stack_repeats(&self, path: &Path) -> bool {
        self.include_stack.iter().filter(|info| info.path == path).count() >= 2
    }

    fn header_info(&mut self, path: &Path, content: &Arc<str>) -> HeaderInfo {
        if let Some(info) = self.header_infos.get(path) {
            return *info;
        }
        let raw = tokenize_all(SourceId::BUILTIN, content.clone(), self.lang_opts);
        let info = HeaderInfo {
            guard: detect_include_guard(&raw),
            pragma_once: has_pragma_once(&raw),
        };
        self.header_infos.insert(path.to_path_buf(), info);
        info
    }

    fn handle_if(&mut self, tokens: Vec<PPToken>, span: SourceSpan) {
        let was_skipping = self.skipping;
        let taken = !was_skipping && self.evaluate_condition(tokens, span);
        self.push_conditional(span, was_skipping, taken);
        self.record_statement(PPStatementKind::If { taken }, span, !was_skipping);
    }

    fn handle_ifdef(&mut self, tokens: Vec<PPToken>, span: SourceSpan, negate: bool) {
        let was_skipping = self.skipping;
        let name = match tokens.first().map(|t| t.kind) {
            Some(PPTokenKind::Identifier(name)) => Some(name),
            _ => None,
        };
        if name.is_none() && !was_skipping {
            self.report_problem(PPProblemKind::MissingMacroName, span, "");
        }
        let defined = name.is_some_and(|n| self.macros.contains_key(&n));
        let taken = !was_skipping && name.is_some() && defined != negate;
        self.push_conditional(span, was_skipping, taken);
        let name = name.unwrap_or_else(|| Symbol::new(""));
        let kind = if negate {
            PPStatementKind::Ifndef { name, taken }
        } else {
            PPStatementKind::Ifdef { name, taken }
        };
        self.record_statement(kind, span, !was_skipping);
    }

    fn push_conditional(&mut self, span: SourceSpan, was_skipping: bool, taken: bool) {
        self.conditional_stack.push(PPConditionalInfo {
            if_loc: span.start(),
            was_skipping,
            found_else: false,
            // a skipped enclosing region never takes a branch
            found_non_skipping: taken || was_skipping,
        });
        self.skipping = !taken;
    }

    fn current_conditional(&self) -> Option<usize> {
        let base = self.include_stack.last().map_or(0, |i| i.conditional_base);
        (self.conditional_stack.len() > base).then(|| self.conditional_stack.len() - 1)
    }

    fn handle_elif(&mut self, tokens: Vec<PPToken>, span: SourceSpan) {
        let Some(index) = self.current_conditional() else {
            self.report_problem(PPProblemKind::UnbalancedConditional, span, "elif");
            self.record_statement(PPStatementKind::Elif { taken: false }, span, !self.skipping);
            return;
        };
        let info = self.conditional_stack[index].clone();
        if info.found_else {
            self.report_problem(PPProblemKind::UnbalancedConditional, span, "elif");
        }
        let taken = !info.found_non_skipping && !info.found_else && self.evaluate_condition(tokens, span);
        if taken {
            self.conditional_stack[index].found_non_skipping = true;
        }
        self.skipping = !taken;
        self.record_statement(PPStatementKind::Elif { taken }, span, !info.was_skipping);
    }

    fn handle_else(&mut self, span: SourceSpan) {
        let Some(index) = self.current_conditional() else {
            self.report_problem(PPProblemKind::UnbalancedConditional, span, "else");
            self.record_statement(PPStatementKind::Else { taken: false }, span, !self.skipping);
            return;
        };
        let info = self.conditional_stack[index].clone();
        if info.found_else {
            self.report_problem(PPProblemKind::UnbalancedConditional, span, "else");
        }
        let taken = !info.found_non_skipping && !info.found_else;
        let current = &mut self.conditional_stack[index];
        current.found_else = true;
        current.found_non_skipping |= taken;
        self.skipping = !taken;
        self.record_statement(PPStatementKind::Else { taken }, span, !info.was_skipping);
    }

    fn handle_endif(&mut self, span: SourceSpan) {
        let Some(index) = self.current_conditional() else {
            self.report_problem(PPProblemKind::UnbalancedConditional, span, "endif");
            self.record_statement(PPStatementKind::Endif, span, !self.skipping);
            return;
        };
        let info = self.conditional_stack.remove(index);
        // Restore previous skipping state
        self.skipping = info.was_skipping;
        self.record_statement(PPStatementKind::Endif, span, !info.was_skipping);
    }

    /// Evaluate the controlling expression of `#if` / `#elif`
    fn evaluate_condition(&mut self, tokens: Vec<PPToken>, span: SourceSpan) -> bool {
        if tokens.is_empty() {
            self.report_problem(PPProblemKind::InvalidExpression, span, "");
            return false;
        }
        let Some(replaced) = self.replace_defined(&tokens) else {
            self.report_problem(PPProblemKind::InvalidExpression, span, spell_tokens(&tokens));
            return false;
        };
        let expanded = self.expand_isolated(replaced);
        match Interpreter::new(&expanded, self.lang_opts.is_cpp()).evaluate() {
            Ok(value) => value != 0,
            Err(_) => {
                self.report_problem(PPProblemKind::InvalidExpression, span, spell_tokens(&tokens));
                false
            }
        }
    }

    /// Replace `defined X`, `defined(X)` and `__has_include(...)` by 0/1 before expansion
    fn replace_defined(&self, tokens: &[PPToken]) -> Option<Vec<PPToken>> {
        let number = |value: bool, at: &PPToken| {
            PPToken::new(
                PPTokenKind::Number(Symbol::new(if value { "1" } else { "0" })),
                at.flags,
                at.location,
                at.length,
            )
        };
        let mut out = Vec::with_capacity(tokens.len());
        let mut i = 0;
        while i < tokens.len() {
            let token = tokens[i];
            let PPTokenKind::Identifier(sym) = token.kind else {
                out.push(token);
                i += 1;
                continue;
            };
            if sym == self.directive_keywords.defined {
                let (name, consumed) = match tokens.get(i + 1).map(|t| t.kind) {
                    Some(PPTokenKind::Identifier(name)) => (name, 2),
                    Some(PPTokenKind::LeftParen) => match (tokens.get(i + 2), tokens.get(i + 3)) {
                        (Some(t), Some(close)) if close.kind == PPTokenKind::RightParen => match t.kind {
                            PPTokenKind::Identifier(name) => (name, 4),
                            _ => return None,
                        },
                        _ => return None,
                    },
                    _ => return None,
                };
                out.push(number(self.macros.contains_key(&name), &token));
                i += consumed;
            } else if sym == self.directive_keywords.has_include || sym == self.directive_keywords.has_include_next {
                if tokens.get(i + 1).map(|t| t.kind) != Some(PPTokenKind::LeftParen) {
                    return None;
                }
                let close = tokens[i + 2..]
                    .iter()
                    .position(|t| t.kind == PPTokenKind::RightParen)?
                    + i
                    + 2;
                let (name, system) = header_name_of(&tokens[i + 2..close])?;
                let found = self
                    .header_search
                    .resolve_path(&name, system, &self.current_dir(), self.provider)
                    .is_some();
                out.push(number(found, &token));
                i = close + 1;
            } else {
                out.push(token);
                i += 1;
            }
        }
        Some(out)
    }

    fn handle_line(&mut self, hash: PPToken, tokens: Vec<PPToken>, span: SourceSpan) {
        let tokens = self.expand_isolated(tokens);
        let logical_line = match tokens.first().map(|t| t.kind) {
            Some(PPTokenKind::Number(n)) => n.as_str().parse::<u32>().ok().filter(|&n| n > 0),
            _ => None,
        };
        let logical_file = match tokens.get(1).map(|t| t.kind) {
            Some(PPTokenKind::StringLiteral(s)) => Some(s.as_str().trim_matches('"').to_string()),
            _ => None,
        };
        let Some(logical_line) = logical_line else {
            self.report_problem(PPProblemKind::InvalidDirective, span, "line");
            return;
        };
        if let Some((physical_line, _)) = self.source_manager.get_line_column(hash.location)
            && let Some(line_map) = self.source_manager.get_line_map_mut(hash.location.source_id)
        {
            // the directive names the line that follows it
            line_map.add_entry(LineDirective::new(physical_line, logical_line - 1, logical_file));
        }
        self.record_statement(PPStatementKind::Line, span, true);
    }

    fn handle_pragma(&mut self, tokens: Vec<PPToken>, span: SourceSpan) {
        let text = spell_tokens(&tokens);
        if tokens.first().is_some_and(|t| t.is_identifier("once"))
            && let Some(info) = self.include_stack.last()
        {
            self.once_included.insert(info.path.clone());
        }
        self.record_statement(PPStatementKind::Pragma { text }, span, true);
    }
}

/// Parameters after the `(` of a function-like definition:
/// names, variadic name, GNU named variadic flag, tokens consumed (incl. `)`)
fn parse_parameters(tokens: &[PPToken]) -> Option<(Vec<Symbol>, Option<Symbol>, bool, usize)> {
    let mut params = Vec::new();
    let mut i = 0;
    if tokens.first()?.kind == PPTokenKind::RightParen {
        return Some((params, None, false, 1));
    }
    loop {
        match tokens.get(i)?.kind {
            PPTokenKind::Identifier(sym) => {
                if params.contains(&sym) {
                    return None;
                }
                match tokens.get(i + 1)?.kind {
                    PPTokenKind::Comma => {
                        params.push(sym);
                        i += 2;
                    }
                    PPTokenKind::RightParen => {
                        params.push(sym);
                        return Some((params, None, false, i + 2));
                    }
                    PPTokenKind::Ellipsis if tokens.get(i + 2)?.kind == PPTokenKind::RightParen => {
                        return Some((params, Some(sym), true, i + 3));
                    }
                    _ => return None,
                }
            }
            PPTokenKind::Ellipsis if tokens.get(i + 1)?.kind == PPTokenKind::RightParen => {
                return Some((params, Some(Symbol::new("__VA_ARGS__")), false, i + 2));
            }
            _ => return None,
        }
    }
}

/// `##` may not start or end a body; `#` in a function-like body must name a parameter
fn valid_body(flags: MacroFlags, body: &[PPToken], params: &[Symbol], variadic: Option<Symbol>) -> bool {
    if body.first().is_some_and(|t| t.kind == PPTokenKind::HashHash)
        || body.last().is_some_and(|t| t.kind == PPTokenKind::HashHash)
    {
        return false;
    }
    if !flags.contains(MacroFlags::FUNCTION_LIKE) {
        return true;
    }
    body.iter().enumerate().all(|(i, t)| {
        t.kind != PPTokenKind::Hash
            || matches!(body.get(i + 1).map(|n| n.kind),
                Some(PPTokenKind::Identifier(s)) if params.contains(&s) || variadic == Some(s))
    })
}

/// Spelling of a token list with single spaces where the source had whitespace
fn spell_tokens(tokens: &[PPToken]) -> String {
    let mut text = String::new();
    for (i, token) in tokens.iter().enumerate() {
        if i > 0 && token.has_leading_space() {
            text.push(' ');
        }
        text.push_str(token.get_text());
    }
    text
}

/// Header name of an include operand: `"a.h"`, `<a.h>` or `<` tokens `>`
fn header_name_of(tokens: &[PPToken]) -> Option<(String, bool)> {
    match tokens.first()?.kind {
        PPTokenKind::StringLiteral(s) => {
            let text = s.as_str();
            let inner = text.strip_prefix('"')?.strip_suffix('"')?;
            Some((inner.to_string(), false))
        }
        PPTokenKind::HeaderName(s) => Some((s.as_str().to_string(), true)),
        PPTokenKind::Less => {
            let close = tokens.iter().position(|t| t.kind == PPTokenKind::Greater)?;
            let name = spell_tokens(&tokens[1..close]);
            Some((name, true))
        }
        _ => None,
    }
}

fn has_pragma_once(tokens: &[PPToken]) -> bool {
    tokens.windows(3).any(|w| {
        w[0].kind == PPTokenKind::Hash
            && w[0].flags.contains(PPTokenFlags::STARTS_LINE)
            && w[1].is_identifier("pragma")
            && w[2].is_identifier("once")
    })
}
