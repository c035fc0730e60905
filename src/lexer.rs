//! Parser tokens
//!
//! Classifies the preprocessor's output into dialect keywords, literals and
//! punctuators, and attaches to every token the file span the parser reports
//! (the invocation span for macro-expanded tokens) together with its position
//! in the outermost expansion.

use crate::lang_options::{Language, LangOptions};
use crate::location_map::{ExpansionId, LocationMap};
use crate::pp::{ExpansionRef, PPToken, PPTokenFlags, PPTokenKind};
use crate::source_manager::SourceSpan;
use hashbrown::HashMap;
use std::sync::OnceLock;
use symbol_table::GlobalSymbol as Symbol;

/// C and C++ token kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // === LITERALS ===
    IntegerLiteral(Symbol),
    FloatLiteral(Symbol),
    CharLiteral(Symbol),
    StringLiteral(Symbol),

    // === IDENTIFIERS ===
    Identifier(Symbol),

    // === KEYWORDS ===
    // Storage class specifiers
    Auto,
    Extern,
    Register,
    Static,
    ThreadLocal,
    Typedef,
    Mutable,

    // Type qualifiers
    Const,
    Restrict,
    Volatile,
    Atomic,

    // Type specifiers
    Bool,
    Char,
    Char16,
    Char32,
    WcharT,
    Double,
    Float,
    Int,
    Int128,
    Long,
    Short,
    Signed,
    Unsigned,
    Void,
    Complex,
    Typeof,
    Decltype,

    // Complex type specifiers
    Struct,
    Union,
    Enum,
    Class,
    Typename,

    // Control flow
    Break,
    Case,
    Continue,
    Default,
    Do,
    Else,
    For,
    Goto,
    If,
    Return,
    Switch,
    While,
    Try,
    Catch,
    Throw,

    // Function specifiers
    Inline,
    Noreturn,
    Virtual,
    Explicit,
    Friend,
    Constexpr,

    // Other keywords
    Alignas,
    Alignof,
    Generic,
    Sizeof,
    StaticAssert,
    Attribute,
    Asm,
    Label,
    Real,
    Imag,
    BuiltinVaArg,
    BuiltinOffsetof,
    BuiltinTypesCompatible,

    // C++ only
    Namespace,
    Using,
    Template,
    Operator,
    New,
    Delete,
    This,
    True,
    False,
    Nullptr,
    Noexcept,
    Export,
    Typeid,
    Public,
    Protected,
    Private,
    StaticCast,
    DynamicCast,
    ConstCast,
    ReinterpretCast,

    // === OPERATORS ===
    // Arithmetic operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Increment,
    Decrement,

    // Bitwise operators
    And,
    Or,
    Xor,
    Not,
    Tilde,
    LeftShift,
    RightShift,

    // Comparison operators
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    Equal,
    NotEqual,

    // Assignment operators
    Assign,
    PlusAssign,
    MinusAssign,
    StarAssign,
    DivAssign,
    ModAssign,
    AndAssign,
    OrAssign,
    XorAssign,
    LeftShiftAssign,
    RightShiftAssign,

    // Logical operators
    LogicAnd,
    LogicOr,

    // Member access
    Arrow,
    Dot,
    ArrowStar,
    DotStar,
    ColonColon,

    // Ternary operator
    Question,
    Colon,

    // === PUNCTUATION ===
    Comma,
    Semicolon,
    Ellipsis,

    // Brackets and parentheses
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,

    // === SPECIAL TOKENS ===
    EndOfFile,
    Unknown(Symbol),
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum KeywordScope {
    Both,
    C,
    Cpp,
}

const KEYWORDS: &[(&str, TokenKind, KeywordScope)] = &[
    ("auto", TokenKind::Auto, KeywordScope::Both),
    ("break", TokenKind::Break, KeywordScope::Both),
    ("case", TokenKind::Case, KeywordScope::Both),
    ("char", TokenKind::Char, KeywordScope::Both),
    ("const", TokenKind::Const, KeywordScope::Both),
    ("continue", TokenKind::Continue, KeywordScope::Both),
    ("default", TokenKind::Default, KeywordScope::Both),
    ("do", TokenKind::Do, KeywordScope::Both),
    ("double", TokenKind::Double, KeywordScope::Both),
    ("else", TokenKind::Else, KeywordScope::Both),
    ("enum", TokenKind::Enum, KeywordScope::Both),
    ("extern", TokenKind::Extern, KeywordScope::Both),
    ("float", TokenKind::Float, KeywordScope::Both),
    ("for", TokenKind::For, KeywordScope::Both),
    ("goto", TokenKind::Goto, KeywordScope::Both),
    ("if", TokenKind::If, KeywordScope::Both),
    ("inline", TokenKind::Inline, KeywordScope::Both),
    ("int", TokenKind::Int, KeywordScope::Both),
    ("long", TokenKind::Long, KeywordScope::Both),
    ("register", TokenKind::Register, KeywordScope::Both),
    ("restrict", TokenKind::Restrict, KeywordScope::C),
    ("return", TokenKind::Return, KeywordScope::Both),
    ("short", TokenKind::Short, KeywordScope::Both),
    ("signed", TokenKind::Signed, KeywordScope::Both),
    ("sizeof", TokenKind::Sizeof, KeywordScope::Both),
    ("static", TokenKind::Static, KeywordScope::Both),
    ("struct", TokenKind::Struct, KeywordScope::Both),
    ("switch", TokenKind::Switch, KeywordScope::Both),
    ("typedef", TokenKind::Typedef, KeywordScope::Both),
    ("union", TokenKind::Union, KeywordScope::Both),
    ("unsigned", TokenKind::Unsigned, KeywordScope::Both),
    ("void", TokenKind::Void, KeywordScope::Both),
    ("volatile", TokenKind::Volatile, KeywordScope::Both),
    ("while", TokenKind::While, KeywordScope::Both),
    ("asm", TokenKind::Asm, KeywordScope::Both),
    ("typeof", TokenKind::Typeof, KeywordScope::Both),
    ("__attribute__", TokenKind::Attribute, KeywordScope::Both),
    ("__attribute", TokenKind::Attribute, KeywordScope::Both),
    ("__alignof__", TokenKind::Alignof, KeywordScope::Both),
    ("__alignof", TokenKind::Alignof, KeywordScope::Both),
    ("__label__", TokenKind::Label, KeywordScope::Both),
    ("__real__", TokenKind::Real, KeywordScope::Both),
    ("__imag__", TokenKind::Imag, KeywordScope::Both),
    ("__int128", TokenKind::Int128, KeywordScope::Both),
    ("__builtin_va_arg", TokenKind::BuiltinVaArg, KeywordScope::Both),
    ("__builtin_offsetof", TokenKind::BuiltinOffsetof, KeywordScope::Both),
    ("__builtin_types_compatible_p", TokenKind::BuiltinTypesCompatible, KeywordScope::C),
    ("_Alignas", TokenKind::Alignas, KeywordScope::C),
    ("_Alignof", TokenKind::Alignof, KeywordScope::C),
    ("_Atomic", TokenKind::Atomic, KeywordScope::C),
    ("_Bool", TokenKind::Bool, KeywordScope::C),
    ("_Complex", TokenKind::Complex, KeywordScope::Both),
    ("_Generic", TokenKind::Generic, KeywordScope::C),
    ("_Noreturn", TokenKind::Noreturn, KeywordScope::C),
    ("_Static_assert", TokenKind::StaticAssert, KeywordScope::C),
    ("_Thread_local", TokenKind::ThreadLocal, KeywordScope::C),
    // C++
    ("alignas", TokenKind::Alignas, KeywordScope::Cpp),
    ("alignof", TokenKind::Alignof, KeywordScope::Cpp),
    ("bool", TokenKind::Bool, KeywordScope::Cpp),
    ("catch", TokenKind::Catch, KeywordScope::Cpp),
    ("char16_t", TokenKind::Char16, KeywordScope::Cpp),
    ("char32_t", TokenKind::Char32, KeywordScope::Cpp),
    ("class", TokenKind::Class, KeywordScope::Cpp),
    ("constexpr", TokenKind::Constexpr, KeywordScope::Cpp),
    ("const_cast", TokenKind::ConstCast, KeywordScope::Cpp),
    ("decltype", TokenKind::Decltype, KeywordScope::Cpp),
    ("delete", TokenKind::Delete, KeywordScope::Cpp),
    ("dynamic_cast", TokenKind::DynamicCast, KeywordScope::Cpp),
    ("explicit", TokenKind::Explicit, KeywordScope::Cpp),
    ("export", TokenKind::Export, KeywordScope::Cpp),
    ("false", TokenKind::False, KeywordScope::Cpp),
    ("friend", TokenKind::Friend, KeywordScope::Cpp),
    ("mutable", TokenKind::Mutable, KeywordScope::Cpp),
    ("namespace", TokenKind::Namespace, KeywordScope::Cpp),
    ("new", TokenKind::New, KeywordScope::Cpp),
    ("noexcept", TokenKind::Noexcept, KeywordScope::Cpp),
    ("nullptr", TokenKind::Nullptr, KeywordScope::Cpp),
    ("operator", TokenKind::Operator, KeywordScope::Cpp),
    ("private", TokenKind::Private, KeywordScope::Cpp),
    ("protected", TokenKind::Protected, KeywordScope::Cpp),
    ("public", TokenKind::Public, KeywordScope::Cpp),
    ("reinterpret_cast", TokenKind::ReinterpretCast, KeywordScope::Cpp),
    ("static_assert", TokenKind::StaticAssert, KeywordScope::Cpp),
    ("static_cast", TokenKind::StaticCast, KeywordScope::Cpp),
    ("template", TokenKind::Template, KeywordScope::Cpp),
    ("this", TokenKind::This, KeywordScope::Cpp),
    ("thread_local", TokenKind::ThreadLocal, KeywordScope::Cpp),
    ("throw", TokenKind::Throw, KeywordScope::Cpp),
    ("true", TokenKind::True, KeywordScope::Cpp),
    ("try", TokenKind::Try, KeywordScope::Cpp),
    ("typeid", TokenKind::Typeid, KeywordScope::Cpp),
    ("typename", TokenKind::Typename, KeywordScope::Cpp),
    ("using", TokenKind::Using, KeywordScope::Cpp),
    ("virtual", TokenKind::Virtual, KeywordScope::Cpp),
    ("wchar_t", TokenKind::WcharT, KeywordScope::Cpp),
    ("__restrict", TokenKind::Restrict, KeywordScope::Cpp),
    // alternative tokens
    ("and", TokenKind::LogicAnd, KeywordScope::Cpp),
    ("and_eq", TokenKind::AndAssign, KeywordScope::Cpp),
    ("bitand", TokenKind::And, KeywordScope::Cpp),
    ("bitor", TokenKind::Or, KeywordScope::Cpp),
    ("compl", TokenKind::Tilde, KeywordScope::Cpp),
    ("not", TokenKind::Not, KeywordScope::Cpp),
    ("not_eq", TokenKind::NotEqual, KeywordScope::Cpp),
    ("or", TokenKind::LogicOr, KeywordScope::Cpp),
    ("or_eq", TokenKind::OrAssign, KeywordScope::Cpp),
    ("xor", TokenKind::Xor, KeywordScope::Cpp),
    ("xor_eq", TokenKind::XorAssign, KeywordScope::Cpp),
];

impl TokenKind {
    /// Spelling used by signatures and dumps
    pub fn spelling(&self) -> &'static str {
        match self {
            TokenKind::IntegerLiteral(s)
            | TokenKind::FloatLiteral(s)
            | TokenKind::CharLiteral(s)
            | TokenKind::StringLiteral(s)
            | TokenKind::Identifier(s)
            | TokenKind::Unknown(s) => s.as_str(),
            TokenKind::EndOfFile => "",
            kind => kind.punctuator_spelling().unwrap_or_else(|| {
                KEYWORDS
                    .iter()
                    .find(|(_, k, _)| k == kind)
                    .map_or("", |(text, _, _)| text)
            }),
        }
    }

    fn punctuator_spelling(&self) -> Option<&'static str> {
        let s = match self {
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::Increment => "++",
            TokenKind::Decrement => "--",
            TokenKind::And => "&",
            TokenKind::Or => "|",
            TokenKind::Xor => "^",
            TokenKind::Not => "!",
            TokenKind::Tilde => "~",
            TokenKind::LeftShift => "<<",
            TokenKind::RightShift => ">>",
            TokenKind::Less => "<",
            TokenKind::Greater => ">",
            TokenKind::LessEqual => "<=",
            TokenKind::GreaterEqual => ">=",
            TokenKind::Equal => "==",
            TokenKind::NotEqual => "!=",
            TokenKind::Assign => "=",
            TokenKind::PlusAssign => "+=",
            TokenKind::MinusAssign => "-=",
            TokenKind::StarAssign => "*=",
            TokenKind::DivAssign => "/=",
            TokenKind::ModAssign => "%=",
            TokenKind::AndAssign => "&=",
            TokenKind::OrAssign => "|=",
            TokenKind::XorAssign => "^=",
            TokenKind::LeftShiftAssign => "<<=",
            TokenKind::RightShiftAssign => ">>=",
            TokenKind::LogicAnd => "&&",
            TokenKind::LogicOr => "||",
            TokenKind::Arrow => "->",
            TokenKind::Dot => ".",
            TokenKind::ArrowStar => "->*",
            TokenKind::DotStar => ".*",
            TokenKind::ColonColon => "::",
            TokenKind::Question => "?",
            TokenKind::Colon => ":",
            TokenKind::Comma => ",",
            TokenKind::Semicolon => ";",
            TokenKind::Ellipsis => "...",
            TokenKind::LeftParen => "(",
            TokenKind::RightParen => ")",
            TokenKind::LeftBracket => "[",
            TokenKind::RightBracket => "]",
            TokenKind::LeftBrace => "{",
            TokenKind::RightBrace => "}",
            _ => return None,
        };
        Some(s)
    }

    pub fn is_identifier(&self) -> bool {
        matches!(self, TokenKind::Identifier(_))
    }

    /// Keywords and identifiers, which need a separating space when spelled
    pub fn is_word(&self) -> bool {
        !matches!(self, TokenKind::EndOfFile) && self.punctuator_spelling().is_none()
    }

    /// Check if the token is a storage class specifier
    pub fn is_storage_class_specifier(&self) -> bool {
        matches!(
            self,
            TokenKind::Typedef
                | TokenKind::Extern
                | TokenKind::Static
                | TokenKind::ThreadLocal
                | TokenKind::Auto
                | TokenKind::Register
                | TokenKind::Mutable
        )
    }

    /// Check if the token is a simple type specifier keyword
    pub fn is_simple_type_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::Void
                | TokenKind::Char
                | TokenKind::Char16
                | TokenKind::Char32
                | TokenKind::WcharT
                | TokenKind::Short
                | TokenKind::Int
                | TokenKind::Int128
                | TokenKind::Long
                | TokenKind::Float
                | TokenKind::Double
                | TokenKind::Signed
                | TokenKind::Unsigned
                | TokenKind::Bool
                | TokenKind::Complex
        )
    }

    /// Check if the token is a type qualifier
    pub fn is_type_qualifier(&self) -> bool {
        matches!(
            self,
            TokenKind::Const | TokenKind::Restrict | TokenKind::Volatile | TokenKind::Atomic
        )
    }

    /// Check if the token is a function specifier
    pub fn is_function_specifier(&self) -> bool {
        matches!(
            self,
            TokenKind::Inline
                | TokenKind::Noreturn
                | TokenKind::Virtual
                | TokenKind::Explicit
                | TokenKind::Friend
                | TokenKind::Constexpr
        )
    }

    /// Check if the token can start a declaration specifier sequence
    pub fn is_declaration_specifier_start(&self) -> bool {
        self.is_storage_class_specifier()
            || self.is_simple_type_keyword()
            || self.is_type_qualifier()
            || self.is_function_specifier()
            || matches!(
                self,
                TokenKind::Struct
                    | TokenKind::Union
                    | TokenKind::Enum
                    | TokenKind::Class
                    | TokenKind::Typename
                    | TokenKind::Typeof
                    | TokenKind::Decltype
                    | TokenKind::Alignas
                    | TokenKind::Attribute
            )
    }
}

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct TokenFlags: u8 {
        const LEADING_SPACE = 1 << 0;
        const MACRO_EXPANDED = 1 << 1;
        /// First half of a `>>` split into two `>`; the next token follows without a gap
        const ADJACENT_NEXT = 1 << 2;
        const STARTS_LINE = 1 << 3;
    }
}

/// Token with source span for the parser
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// File span; for macro-expanded tokens the span of the outermost invocation
    pub span: SourceSpan,
    pub expansion: Option<ExpansionRef>,
    /// Position of the token in the output of its outermost expansion
    pub expansion_index: u32,
    pub flags: TokenFlags,
}

impl Token {
    pub fn is_macro_expanded(&self) -> bool {
        self.expansion.is_some()
    }
}

/// Check if a symbol represents a keyword of the dialect.
pub fn is_keyword(symbol: Symbol, language: Language) -> Option<TokenKind> {
    keyword_map(language).get(&symbol).copied()
}

fn keyword_map(language: Language) -> &'static HashMap<Symbol, TokenKind> {
    static C_KEYWORDS: OnceLock<HashMap<Symbol, TokenKind>> = OnceLock::new();
    static CPP_KEYWORDS: OnceLock<HashMap<Symbol, TokenKind>> = OnceLock::new();
    let (cell, excluded) = match language {
        Language::C => (&C_KEYWORDS, KeywordScope::Cpp),
        Language::Cpp => (&CPP_KEYWORDS, KeywordScope::C),
    };
    cell.get_or_init(|| {
        KEYWORDS
            .iter()
            .filter(|(_, _, scope)| *scope != excluded)
            .map(|(text, kind, _)| (Symbol::new(text), *kind))
            .collect()
    })
}

/// Classify a preprocessor punctuation token into a lexical token.
fn classify_punctuation(pp_token_kind: PPTokenKind) -> TokenKind {
    match pp_token_kind {
        PPTokenKind::Plus => TokenKind::Plus,
        PPTokenKind::Minus => TokenKind::Minus,
        PPTokenKind::Star => TokenKind::Star,
        PPTokenKind::Slash => TokenKind::Slash,
        PPTokenKind::Percent => TokenKind::Percent,
        PPTokenKind::Increment => TokenKind::Increment,
        PPTokenKind::Decrement => TokenKind::Decrement,

        PPTokenKind::And => TokenKind::And,
        PPTokenKind::Or => TokenKind::Or,
        PPTokenKind::Xor => TokenKind::Xor,
        PPTokenKind::Not => TokenKind::Not,
        PPTokenKind::Tilde => TokenKind::Tilde,
        PPTokenKind::LeftShift => TokenKind::LeftShift,
        PPTokenKind::RightShift => TokenKind::RightShift,

        PPTokenKind::Less => TokenKind::Less,
        PPTokenKind::Greater => TokenKind::Greater,
        PPTokenKind::LessEqual => TokenKind::LessEqual,
        PPTokenKind::GreaterEqual => TokenKind::GreaterEqual,
        PPTokenKind::Equal => TokenKind::Equal,
        PPTokenKind::NotEqual => TokenKind::NotEqual,

        PPTokenKind::Assign => TokenKind::Assign,
        PPTokenKind::PlusAssign => TokenKind::PlusAssign,
        PPTokenKind::MinusAssign => TokenKind::MinusAssign,
        PPTokenKind::StarAssign => TokenKind::StarAssign,
        PPTokenKind::DivAssign => TokenKind::DivAssign,
        PPTokenKind::ModAssign => TokenKind::ModAssign,
        PPTokenKind::AndAssign => TokenKind::AndAssign,
        PPTokenKind::OrAssign => TokenKind::OrAssign,
        PPTokenKind::XorAssign => TokenKind::XorAssign,
        PPTokenKind::LeftShiftAssign => TokenKind::LeftShiftAssign,
        PPTokenKind::RightShiftAssign => TokenKind::RightShiftAssign,

        PPTokenKind::LogicAnd => TokenKind::LogicAnd,
        PPTokenKind::LogicOr => TokenKind::LogicOr,

        PPTokenKind::Arrow => TokenKind::Arrow,
        PPTokenKind::Dot => TokenKind::Dot,
        PPTokenKind::ArrowStar => TokenKind::ArrowStar,
        PPTokenKind::DotStar => TokenKind::DotStar,
        PPTokenKind::ColonColon => TokenKind::ColonColon,

        PPTokenKind::Question => TokenKind::Question,
        PPTokenKind::Colon => TokenKind::Colon,

        PPTokenKind::Comma => TokenKind::Comma,
        PPTokenKind::Semicolon => TokenKind::Semicolon,
        PPTokenKind::Ellipsis => TokenKind::Ellipsis,

        PPTokenKind::LeftParen => TokenKind::LeftParen,
        PPTokenKind::RightParen => TokenKind::RightParen,
        PPTokenKind::LeftBracket => TokenKind::LeftBracket,
        PPTokenKind::RightBracket => TokenKind::RightBracket,
        PPTokenKind::LeftBrace => TokenKind::LeftBrace,
        PPTokenKind::RightBrace => TokenKind::RightBrace,

        PPTokenKind::Eof => TokenKind::EndOfFile,
        other => TokenKind::Unknown(Symbol::new(other.punctuator_text().unwrap_or("?"))),
    }
}

/// Whether a pp-number spells a floating constant
fn is_float_number(text: &str) -> bool {
    let lower = text.to_ascii_lowercase();
    if lower.starts_with("0x") {
        lower.contains('.') || lower.contains('p')
    } else {
        lower.contains('.') || lower.contains('e')
    }
}

/// Converts the preprocessor's token stream into parser tokens
pub struct Lexer<'src> {
    tokens: &'src [PPToken],
    location_map: &'src LocationMap,
    lang: LangOptions,
}

impl<'src> Lexer<'src> {
    pub fn new(tokens: &'src [PPToken], location_map: &'src LocationMap, lang: LangOptions) -> Self {
        Lexer {
            tokens,
            location_map,
            lang,
        }
    }

    /// Classify a preprocessor token into a lexical token
    fn classify_token(&self, pptoken: &PPToken) -> TokenKind {
        match pptoken.kind {
            PPTokenKind::Identifier(symbol) => {
                is_keyword(symbol, self.lang.language).unwrap_or(TokenKind::Identifier(symbol))
            }
            PPTokenKind::StringLiteral(symbol) => TokenKind::StringLiteral(symbol),
            PPTokenKind::CharLiteral(symbol) => TokenKind::CharLiteral(symbol),
            PPTokenKind::Number(symbol) if is_float_number(symbol.as_str()) => TokenKind::FloatLiteral(symbol),
            PPTokenKind::Number(symbol) => TokenKind::IntegerLiteral(symbol),
            PPTokenKind::Other(symbol) | PPTokenKind::HeaderName(symbol) => TokenKind::Unknown(symbol),
            kind => classify_punctuation(kind),
        }
    }

    /// Get all tokens from the stream, terminated by `EndOfFile`
    pub fn tokenize_all(&mut self) -> Vec<Token> {
        let mut tokens = Vec::with_capacity(self.tokens.len() + 1);
        let mut expansion_counters: HashMap<ExpansionId, u32> = HashMap::new();

        for pptoken in self.tokens {
            let kind = self.classify_token(pptoken);
            let (span, expansion_index) = match pptoken.expansion {
                Some(expansion) => {
                    let counter = expansion_counters.entry(expansion.outer).or_insert(0);
                    let index = *counter;
                    *counter += 1;
                    let span = self
                        .location_map
                        .expansion(expansion.outer)
                        .map_or(pptoken.span(), |record| record.invocation);
                    (span, index)
                }
                None => (pptoken.span(), 0),
            };

            let mut flags = TokenFlags::empty();
            flags.set(TokenFlags::LEADING_SPACE, pptoken.has_leading_space());
            flags.set(TokenFlags::STARTS_LINE, pptoken.flags.contains(PPTokenFlags::STARTS_LINE));
            flags.set(TokenFlags::MACRO_EXPANDED, pptoken.expansion.is_some());

            let token = Token {
                kind,
                span,
                expansion: pptoken.expansion,
                expansion_index,
                flags,
            };

            // `>>` closes two template argument lists in C++
            if kind == TokenKind::RightShift && self.lang.is_cpp() && pptoken.expansion.is_none() {
                let first = SourceSpan::new_with_length(span.source_id(), span.offset(), 1);
                let second = SourceSpan::new_with_length(span.source_id(), span.offset() + 1, 1);
                tokens.push(Token {
                    kind: TokenKind::Greater,
                    span: first,
                    flags: flags | TokenFlags::ADJACENT_NEXT,
                    ..token
                });
                tokens.push(Token {
                    kind: TokenKind::Greater,
                    span: second,
                    flags: TokenFlags::empty(),
                    ..token
                });
                continue;
            }

            let is_eof = kind == TokenKind::EndOfFile;
            tokens.push(token);
            if is_eof {
                break;
            }
        }

        if tokens.last().is_none_or(|t| t.kind != TokenKind::EndOfFile) {
            let span = tokens.last().map(|t| SourceSpan::new(t.span.end(), t.span.end())).unwrap_or_default();
            tokens.push(Token {
                kind: TokenKind::EndOfFile,
                span,
                expansion: None,
                expansion_index: 0,
                flags: TokenFlags::empty(),
            });
        }
        log::debug!("lexed {} parser tokens", tokens.len());
        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dialect_keywords() {
        let class = Symbol::new("class");
        assert_eq!(is_keyword(class, Language::C), None);
        assert_eq!(is_keyword(class, Language::Cpp), Some(TokenKind::Class));
        assert_eq!(is_keyword(Symbol::new("_Bool"), Language::C), Some(TokenKind::Bool));
        assert_eq!(is_keyword(Symbol::new("bool"), Language::C), None);
        assert_eq!(is_keyword(Symbol::new("and"), Language::Cpp), Some(TokenKind::LogicAnd));
    }

    #[test]
    fn spellings() {
        assert_eq!(TokenKind::Constexpr.spelling(), "constexpr");
        assert_eq!(TokenKind::LogicAnd.spelling(), "&&");
        assert_eq!(TokenKind::Identifier(Symbol::new("abc")).spelling(), "abc");
        assert!(TokenKind::Int.is_word());
        assert!(!TokenKind::Comma.is_word());
    }

    #[test]
    fn float_numbers() {
        assert!(is_float_number("1.0"));
        assert!(is_float_number("1e10"));
        assert!(is_float_number("0x1p3"));
        assert!(!is_float_number("0xE"));
        assert!(!is_float_number("42ul"));
    }
}
