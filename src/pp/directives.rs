use crate::location_map::MacroDefId;
use crate::source_manager::SourceSpan;
use serde::Serialize;
use std::path::PathBuf;
use symbol_table::GlobalSymbol as Symbol;

/// A directive as it appeared in the source, executed or not
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreprocessorStatement {
    pub kind: PPStatementKind,
    /// From the `#` to the last token of the directive line
    pub span: SourceSpan,
    /// False for directives inside a skipped conditional branch
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PPStatementKind {
    Define {
        name: Symbol,
        name_span: SourceSpan,
        /// Absent for definitions in skipped branches
        definition: Option<MacroDefId>,
    },
    Undef {
        name: Symbol,
        name_span: SourceSpan,
    },
    Include(IncludeDirective),
    If {
        taken: bool,
    },
    Ifdef {
        name: Symbol,
        taken: bool,
    },
    Ifndef {
        name: Symbol,
        taken: bool,
    },
    Elif {
        taken: bool,
    },
    Else {
        taken: bool,
    },
    Endif,
    Line,
    Pragma {
        text: String,
    },
    Error {
        message: String,
    },
    Warning {
        message: String,
    },
    /// Unknown directive name
    Unknown {
        name: String,
    },
}

impl PPStatementKind {
    /// Directive keyword, without the `#`
    pub fn keyword(&self) -> &str {
        match self {
            PPStatementKind::Define { .. } => "define",
            PPStatementKind::Undef { .. } => "undef",
            PPStatementKind::Include(inc) if inc.include_next => "include_next",
            PPStatementKind::Include(_) => "include",
            PPStatementKind::If { .. } => "if",
            PPStatementKind::Ifdef { .. } => "ifdef",
            PPStatementKind::Ifndef { .. } => "ifndef",
            PPStatementKind::Elif { .. } => "elif",
            PPStatementKind::Else { .. } => "else",
            PPStatementKind::Endif => "endif",
            PPStatementKind::Line => "line",
            PPStatementKind::Pragma { .. } => "pragma",
            PPStatementKind::Error { .. } => "error",
            PPStatementKind::Warning { .. } => "warning",
            PPStatementKind::Unknown { name } => name,
        }
    }

    /// Whether the branch opened by a conditional was taken
    pub fn taken(&self) -> Option<bool> {
        match self {
            PPStatementKind::If { taken }
            | PPStatementKind::Ifdef { taken, .. }
            | PPStatementKind::Ifndef { taken, .. }
            | PPStatementKind::Elif { taken }
            | PPStatementKind::Else { taken } => Some(*taken),
            _ => None,
        }
    }
}

/// `#include` / `#include_next`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeDirective {
    /// Header name as written, without quotes or angle brackets
    pub name: String,
    pub name_span: SourceSpan,
    /// `<...>` form
    pub system: bool,
    pub include_next: bool,
    pub resolved: Option<PathBuf>,
    /// The resolved file was actually scanned by this directive
    pub was_read: bool,
    /// The included file carries `#pragma once` or a detected include guard
    pub has_pragma_once_semantics: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PPProblemKind {
    InclusionNotFound,
    InvalidDirective,
    PoundError,
    PoundWarning,
    UnbalancedConditional,
    InvalidMacroDefinition,
    InvalidMacroRedefinition,
    MacroArgumentMismatch,
    UnterminatedMacroInvocation,
    InvalidExpression,
    MissingMacroName,
    IncludeDepthExceeded,
    RecursiveInclusion,
    /// `##` whose operands do not form one token
    InvalidPaste,
    UnterminatedComment,
    UnterminatedLiteral,
}

impl PPProblemKind {
    pub fn message(&self) -> &'static str {
        match self {
            PPProblemKind::InclusionNotFound => "Unresolved inclusion",
            PPProblemKind::InvalidDirective => "Invalid preprocessor directive",
            PPProblemKind::PoundError => "#error",
            PPProblemKind::PoundWarning => "#warning",
            PPProblemKind::UnbalancedConditional => "Unbalanced conditional directive",
            PPProblemKind::InvalidMacroDefinition => "Invalid macro definition",
            PPProblemKind::InvalidMacroRedefinition => "Invalid macro redefinition",
            PPProblemKind::MacroArgumentMismatch => "Wrong number of macro arguments",
            PPProblemKind::UnterminatedMacroInvocation => "Unterminated macro invocation",
            PPProblemKind::InvalidExpression => "Invalid conditional expression",
            PPProblemKind::MissingMacroName => "Macro name expected",
            PPProblemKind::IncludeDepthExceeded => "Include depth exceeded",
            PPProblemKind::RecursiveInclusion => "Recursive inclusion",
            PPProblemKind::InvalidPaste => "Pasting does not give a valid token",
            PPProblemKind::UnterminatedComment => "Unterminated comment",
            PPProblemKind::UnterminatedLiteral => "Missing terminating quote",
        }
    }
}

/// A preprocessing-time problem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PPProblem {
    pub kind: PPProblemKind,
    pub span: SourceSpan,
    /// Header name, macro name or directive text the problem is about
    pub argument: String,
}

impl PPProblem {
    pub fn message(&self) -> String {
        if self.argument.is_empty() {
            self.kind.message().to_string()
        } else {
            format!("{}: {}", self.kind.message(), self.argument)
        }
    }
}
