use crate::ast::AstError;
use crate::lexer::TokenKind;
use crate::source_manager::{SourceManager, SourceSpan};

/// Diagnostic severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticLevel {
    Error,
    Warning,
    Note,
}

/// Individual diagnostic with rich context
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub message: String,
    pub location: SourceSpan,
    pub code: Option<String>,
    pub hints: Vec<String>,
    pub related: Vec<SourceSpan>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>, location: SourceSpan) -> Self {
        Diagnostic {
            level: DiagnosticLevel::Error,
            message: message.into(),
            location,
            code: None,
            hints: Vec::new(),
            related: Vec::new(),
        }
    }

    pub fn with_code(mut self, code: &str) -> Self {
        self.code = Some(code.to_string());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hints.push(hint.into());
        self
    }
}

/// Local failures of the recursive descent. They never escape a parse: the
/// recovery points turn them into problem nodes.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ParseError {
    #[error("Unexpected token: expected {expected_tokens}, found {found:?}")]
    UnexpectedToken {
        expected_tokens: String,
        found: TokenKind,
        location: SourceSpan,
    },

    #[error("Unexpected End of File")]
    UnexpectedEof { location: SourceSpan },

    #[error("Syntax error: {message}")]
    SyntaxError { message: String, location: SourceSpan },

    #[error("Template argument nesting exceeds {limit}")]
    TemplateDepthExceeded { limit: usize, location: SourceSpan },

    #[error("Expressions and statements nested deeper than {limit}")]
    NestingTooDeep { limit: usize, location: SourceSpan },

    #[error(transparent)]
    Ast(#[from] AstError),
}

impl ParseError {
    pub fn location(&self) -> SourceSpan {
        match self {
            ParseError::UnexpectedToken { location, .. } => *location,
            ParseError::UnexpectedEof { location } => *location,
            ParseError::SyntaxError { location, .. } => *location,
            ParseError::TemplateDepthExceeded { location, .. } => *location,
            ParseError::NestingTooDeep { location, .. } => *location,
            ParseError::Ast(_) => SourceSpan::empty(),
        }
    }

    pub(crate) fn syntax(message: impl Into<String>, location: SourceSpan) -> Self {
        ParseError::SyntaxError {
            message: message.into(),
            location,
        }
    }
}

/// Diagnostic engine for collecting and reporting parse and scan problems
#[derive(Debug, Clone, Default)]
pub struct DiagnosticEngine {
    pub diagnostics: Vec<Diagnostic>,
    pub warnings_as_errors: bool,
    pub disable_all_warnings: bool,
}

impl DiagnosticEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report_parse_error(&mut self, error: &ParseError) {
        let diag = Diagnostic::error(error.to_string(), error.location()).with_code("syntax_error");
        self.diagnostics.push(diag);
    }

    pub fn report_warning(&mut self, message: impl Into<String>, location: SourceSpan) {
        if self.disable_all_warnings {
            return;
        }
        let level = if self.warnings_as_errors {
            DiagnosticLevel::Error
        } else {
            DiagnosticLevel::Warning
        };
        self.diagnostics.push(Diagnostic {
            level,
            message: message.into(),
            location,
            code: None,
            hints: Vec::new(),
            related: Vec::new(),
        });
    }

    pub fn report_note(&mut self, message: String, location: SourceSpan) {
        self.diagnostics.push(Diagnostic {
            level: DiagnosticLevel::Note,
            message,
            location,
            code: None,
            hints: Vec::new(),
            related: Vec::new(),
        });
    }

    pub fn report_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.level == DiagnosticLevel::Error)
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.level == DiagnosticLevel::Error)
            .count()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// `file:line:col: level: message` lines for every collected diagnostic
    pub fn format_all(&self, sm: &SourceManager) -> Vec<String> {
        self.diagnostics
            .iter()
            .map(|d| {
                let level = match d.level {
                    DiagnosticLevel::Error => "error",
                    DiagnosticLevel::Warning => "warning",
                    DiagnosticLevel::Note => "note",
                };
                match sm.get_presumed_location(d.location.start()) {
                    Some((line, col, Some(file))) => format!("{file}:{line}:{col}: {level}: {}", d.message),
                    _ => format!("{level}: {}", d.message),
                }
            })
            .collect()
    }
}
