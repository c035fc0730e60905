use indexmap::IndexMap;
use std::path::PathBuf;

/// Dialect selector: grammar, keyword table and lookup rules.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Language {
    C,
    Cpp,
}

impl Language {
    pub fn is_cpp(self) -> bool {
        self == Language::Cpp
    }
}

impl From<&str> for Language {
    fn from(s: &str) -> Self {
        match s {
            "c++" | "cpp" | "cxx" | "cc" => Language::Cpp,
            _ => Language::C,
        }
    }
}

/// Language options affecting scanning and parsing behavior
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LangOptions {
    pub language: Language,
    /// GNU extensions: `__attribute__`, `typeof`, statement expressions, case ranges, ...
    pub gnu_mode: bool,
    /// Accept `$` in identifiers
    pub dollar_in_identifiers: bool,
    /// Accept digraphs (`<:`, `%>`, ...)
    pub digraphs: bool,
}

impl LangOptions {
    pub fn new(language: Language, gnu_mode: bool) -> Self {
        LangOptions {
            language,
            gnu_mode,
            dollar_in_identifiers: gnu_mode,
            digraphs: true,
        }
    }

    pub fn c() -> Self {
        Self::new(Language::C, false)
    }

    pub fn cpp() -> Self {
        Self::new(Language::Cpp, false)
    }

    pub fn is_cpp(&self) -> bool {
        self.language.is_cpp()
    }
}

impl Default for LangOptions {
    fn default() -> Self {
        LangOptions::new(Language::C, true)
    }
}

/// Scanner configuration: predefined macros and include search paths.
#[derive(Clone, Debug, Default)]
pub struct ScannerInfo {
    /// Object-like or function-like macros, name may carry a parameter list: `MAX(a,b)`
    pub defined_symbols: IndexMap<String, String>,
    /// Searched for `#include "..."` after the includer's directory
    pub local_include_paths: Vec<PathBuf>,
    /// Searched for `#include <...>` and after the local paths for quoted includes
    pub include_paths: Vec<PathBuf>,
    /// Files whose macro definitions are imported before the main file
    pub macro_files: Vec<PathBuf>,
    /// Files preprocessed (and parsed) before the main file
    pub include_files: Vec<PathBuf>,
}

impl ScannerInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Predefined macros of a GNU compiler
    pub fn gnu() -> Self {
        let mut info = Self::default();
        info.define("__GNUC__", "4");
        info.define("__GNUC_MINOR__", "7");
        Self::add_sizeof_macros(&mut info);
        info
    }

    /// Predefined macros of a strictly conforming compiler
    pub fn standard() -> Self {
        let mut info = Self::default();
        Self::add_sizeof_macros(&mut info);
        info
    }

    /// Default table for a dialect selection
    pub fn for_options(options: &LangOptions) -> Self {
        if options.gnu_mode { Self::gnu() } else { Self::standard() }
    }

    fn add_sizeof_macros(info: &mut ScannerInfo) {
        info.define("__SIZEOF_SHORT__", "2");
        info.define("__SIZEOF_INT__", "4");
        info.define("__SIZEOF_LONG__", "8");
        info.define("__SIZEOF_POINTER__", "8");
    }

    pub fn define(&mut self, name: &str, value: &str) -> &mut Self {
        self.defined_symbols.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_include_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.include_paths.push(path.into());
        self
    }

    pub fn with_local_include_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.local_include_paths.push(path.into());
        self
    }
}

/// Keyword aliases the GNU scanner configuration maps onto standard keywords.
pub(crate) const GNU_KEYWORD_MACROS: &[(&str, &str)] = &[
    ("__inline__", "inline"),
    ("__inline", "inline"),
    ("__const__", "const"),
    ("__const", "const"),
    ("__volatile__", "volatile"),
    ("__volatile", "volatile"),
    ("__signed__", "signed"),
    ("__signed", "signed"),
    ("__restrict__", "restrict"),
    ("__restrict", "restrict"),
    ("__asm__", "asm"),
    ("__asm", "asm"),
    ("__typeof__", "typeof"),
    ("__typeof", "typeof"),
    ("__extension__", ""),
    ("__null", "0"),
];

/// Parser configuration threaded through every parse
#[derive(Clone, Debug)]
pub struct ParserConfig {
    pub lang_options: LangOptions,
    /// Copy the finished tree and compare it against the original
    pub validate_copy: bool,
    /// Fail with `FrontendError::UnexpectedProblems` when any problem is found
    pub expect_no_problems: bool,
    pub max_include_depth: usize,
    /// Nesting bound for template-id arguments and instance creation
    pub max_template_depth: usize,
    /// Nesting bound for expressions and statements
    pub max_nesting_depth: usize,
}

impl ParserConfig {
    pub fn new(language: Language, gnu_mode: bool) -> Self {
        ParserConfig {
            lang_options: LangOptions::new(language, gnu_mode),
            validate_copy: false,
            expect_no_problems: false,
            max_include_depth: 200,
            max_template_depth: 32,
            max_nesting_depth: 128,
        }
    }

    pub fn validate_copy(mut self, validate: bool) -> Self {
        self.validate_copy = validate;
        self
    }

    pub fn expect_no_problems(mut self, expect: bool) -> Self {
        self.expect_no_problems = expect;
        self
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig::new(Language::C, true)
    }
}
