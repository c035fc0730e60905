//! A C and C++ front end: preprocessor with macro provenance, recursive
//! descent parsers, an immutable AST and a lazy binding resolver.

pub mod ast;
pub mod diagnostic;
pub mod driver;
pub mod error;
pub mod lang_options;
pub mod lexer;
pub mod location_map;
pub mod parser;
pub mod pp;
pub mod selector;
pub mod semantic;
pub mod source_manager;
pub mod translation_unit;

pub use driver::{FrontendDriver, parse};
pub use error::FrontendError;
pub use lang_options::{LangOptions, Language, ParserConfig, ScannerInfo};
pub use translation_unit::TranslationUnit;

#[cfg(test)]
mod tests;
