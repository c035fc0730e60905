//! Scanner and preprocessor
pub use crate::pp::directives::{
    IncludeDirective, PPProblem, PPProblemKind, PPStatementKind, PreprocessorStatement,
};
pub use crate::pp::guard::detect_include_guard;
pub use crate::pp::header_search::{
    CachingFileContentProvider, HeaderSearch, InMemoryFileContentProvider, IncludeFileContentProvider,
};
pub use crate::pp::pp_lexer::{ExpansionRef, PPLexer, PPToken, PPTokenFlags, PPTokenKind};
pub use crate::pp::preprocessor::{PPError, PPOutput, Preprocessor};

mod directives;
mod guard;
mod header_search;
mod interpreter;
pub(crate) mod pp_lexer;
mod preprocessor;

#[cfg(test)]
mod tests_preprocessor;
