use crate::diagnostic::ParseError;
use crate::pp::PPError;

use thiserror::Error;

/// Hard failures of a translation-unit parse.
///
/// Syntax, preprocessing and binding problems are recorded in the produced
/// tree; they only turn into an error when the caller asked for a parse
/// without problems.
#[derive(Debug, Error)]
pub enum FrontendError {
    #[error("{0}")]
    Preprocessor(#[from] PPError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("invalid configuration: {0}")]
    Configuration(String),
    #[error("expected no problems, found {syntax} syntax, {preprocessor} preprocessor and {binding} binding problems")]
    UnexpectedProblems {
        syntax: usize,
        preprocessor: usize,
        binding: usize,
        /// First few problem descriptions, `file:line: message`
        details: Vec<String>,
    },
    #[error("copy of the tree differs from the original: {0}")]
    CopyMismatch(String),
}

impl FrontendError {
    pub fn problem_count(&self) -> usize {
        match self {
            FrontendError::UnexpectedProblems {
                syntax,
                preprocessor,
                binding,
                ..
            } => syntax + preprocessor + binding,
            _ => 0,
        }
    }
}
