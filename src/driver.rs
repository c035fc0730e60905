//! Parse entry points.
//!
//! [`FrontendDriver`] bundles the parser configuration, the scanner
//! configuration and the include content provider so several sources can
//! be parsed with the same setup. [`parse`] is the one-call form used for
//! code snippets.

use std::path::Path;

use log::debug;

use crate::error::FrontendError;
use crate::lang_options::{Language, ParserConfig, ScannerInfo};
use crate::pp::{InMemoryFileContentProvider, IncludeFileContentProvider};
use crate::translation_unit::TranslationUnit;

/// Name under which snippets passed as strings are registered
pub const TEST_CODE_NAME: &str = "testcode";

pub struct FrontendDriver<'p> {
    config: ParserConfig,
    scanner_info: ScannerInfo,
    provider: &'p dyn IncludeFileContentProvider,
}

impl<'p> FrontendDriver<'p> {
    /// Driver using the default predefined macros of the configured dialect
    pub fn new(config: ParserConfig, provider: &'p dyn IncludeFileContentProvider) -> Self {
        let scanner_info = ScannerInfo::for_options(&config.lang_options);
        FrontendDriver {
            config,
            scanner_info,
            provider,
        }
    }

    pub fn with_scanner_info(mut self, scanner_info: ScannerInfo) -> Self {
        self.scanner_info = scanner_info;
        self
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    pub fn scanner_info_mut(&mut self) -> &mut ScannerInfo {
        &mut self.scanner_info
    }

    pub fn parse(&self, name: &str, code: &str) -> Result<TranslationUnit, FrontendError> {
        debug!("parsing {} as {:?}", name, self.config.lang_options.language);
        TranslationUnit::parse(name, code, self.provider, &self.scanner_info, &self.config)
    }

    pub fn parse_file(&self, path: &Path) -> Result<TranslationUnit, FrontendError> {
        debug!("parsing {}", path.display());
        TranslationUnit::parse_file(path, self.provider, &self.scanner_info, &self.config)
    }
}

/// Parse a snippet without includes. Copies are always validated.
pub fn parse(
    code: &str,
    language: Language,
    gnu: bool,
    expect_no_problems: bool,
) -> Result<TranslationUnit, FrontendError> {
    let config = ParserConfig::new(language, gnu)
        .validate_copy(true)
        .expect_no_problems(expect_no_problems);
    let provider = InMemoryFileContentProvider::new();
    FrontendDriver::new(config, &provider).parse(TEST_CODE_NAME, code)
}
