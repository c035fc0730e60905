//! Preprocessing-token scanner
//!
//! Turns raw buffer bytes into preprocessing tokens: splices continued lines,
//! strips comments, tracks line starts and leading whitespace, and recognizes
//! digraphs. The preprocessor drives it one token at a time and switches it
//! into directive mode so that the end of a directive line becomes `Eod`.

use crate::lang_options::LangOptions;
use crate::pp::PPProblemKind;
use crate::source_manager::{SourceId, SourceLoc, SourceSpan};
use std::sync::Arc;
use symbol_table::GlobalSymbol as Symbol;

use crate::location_map::ExpansionId;

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct PPTokenFlags: u8 {
        /// First token on a physical line
        const STARTS_LINE = 1 << 0;
        /// Whitespace or a comment precedes the token
        const LEADING_SPACE = 1 << 1;
        /// Produced by a macro expansion
        const MACRO_EXPANDED = 1 << 2;
        /// Named a macro while that macro was disabled; never expands again
        const NO_EXPAND = 1 << 3;
        /// Result of `##`
        const PASTED = 1 << 4;
    }
}

/// Preprocessing token kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PPTokenKind {
    Identifier(Symbol),
    Number(Symbol),
    CharLiteral(Symbol),
    StringLiteral(Symbol),
    /// `<...>` after `#include`, payload without the brackets
    HeaderName(Symbol),
    /// Any other character that does not form a token
    Other(Symbol),

    // Punctuators
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,
    Dot,
    Ellipsis,
    Arrow,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Increment,
    Decrement,
    And,
    Or,
    Xor,
    Not,
    Tilde,
    LeftShift,
    RightShift,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    Equal,
    NotEqual,
    LogicAnd,
    LogicOr,
    Question,
    Colon,
    ColonColon,
    Semicolon,
    Comma,
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
    DotStar,
    ArrowStar,
    Hash,
    HashHash,

    /// End of a directive line
    Eod,
    Eof,
}

impl PPTokenKind {
    /// Spelling of punctuators; `None` for tokens carrying a payload
    pub fn punctuator_text(&self) -> Option<&'static str> {
        let s = match self {
            PPTokenKind::LeftParen => "(",
            PPTokenKind::RightParen => ")",
            PPTokenKind::LeftBracket => "[",
            PPTokenKind::RightBracket => "]",
            PPTokenKind::LeftBrace => "{",
            PPTokenKind::RightBrace => "}",
            PPTokenKind::Dot => ".",
            PPTokenKind::Ellipsis => "...",
            PPTokenKind::Arrow => "->",
            PPTokenKind::Plus => "+",
            PPTokenKind::Minus => "-",
            PPTokenKind::Star => "*",
            PPTokenKind::Slash => "/",
            PPTokenKind::Percent => "%",
            PPTokenKind::Increment => "++",
            PPTokenKind::Decrement => "--",
            PPTokenKind::And => "&",
            PPTokenKind::Or => "|",
            PPTokenKind::Xor => "^",
            PPTokenKind::Not => "!",
            PPTokenKind::Tilde => "~",
            PPTokenKind::LeftShift => "<<",
            PPTokenKind::RightShift => ">>",
            PPTokenKind::Less => "<",
            PPTokenKind::Greater => ">",
            PPTokenKind::LessEqual => "<=",
            PPTokenKind::GreaterEqual => ">=",
            PPTokenKind::Equal => "==",
            PPTokenKind::NotEqual => "!=",
            PPTokenKind::LogicAnd => "&&",
            PPTokenKind::LogicOr => "||",
            PPTokenKind::Question => "?",
            PPTokenKind::Colon => ":",
            PPTokenKind::ColonColon => "::",
            PPTokenKind::Semicolon => ";",
            PPTokenKind::Comma => ",",
            PPTokenKind::Assign => "=",
            PPTokenKind::PlusAssign => "+=",
            PPTokenKind::MinusAssign => "-=",
            PPTokenKind::StarAssign => "*=",
            PPTokenKind::DivAssign => "/=",
            PPTokenKind::ModAssign => "%=",
            PPTokenKind::AndAssign => "&=",
            PPTokenKind::OrAssign => "|=",
            PPTokenKind::XorAssign => "^=",
            PPTokenKind::LeftShiftAssign => "<<=",
            PPTokenKind::RightShiftAssign => ">>=",
            PPTokenKind::DotStar => ".*",
            PPTokenKind::ArrowStar => "->*",
            PPTokenKind::Hash => "#",
            PPTokenKind::HashHash => "##",
            PPTokenKind::Eod | PPTokenKind::Eof => "",
            _ => return None,
        };
        Some(s)
    }
}

/// Reference from an expanded token to the expansion event that produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExpansionRef {
    /// Top-level expansion whose invocation is written in a file
    pub outer: ExpansionId,
    /// Innermost expansion (macro-of-macro) that produced the token
    pub inner: ExpansionId,
}

/// Preprocessing token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PPToken {
    pub kind: PPTokenKind,
    pub flags: PPTokenFlags,
    /// Spelling location (file position, or the `#define` body for macro tokens)
    pub location: SourceLoc,
    pub length: u32,
    pub expansion: Option<ExpansionRef>,
}

impl PPToken {
    pub fn new(kind: PPTokenKind, flags: PPTokenFlags, location: SourceLoc, length: u32) -> Self {
        PPToken {
            kind,
            flags,
            location,
            length,
            expansion: None,
        }
    }

    pub fn span(&self) -> SourceSpan {
        SourceSpan::new_with_length(self.location.source_id, self.location.offset, self.length)
    }

    pub fn get_text(&self) -> &'static str {
        match self.kind {
            PPTokenKind::Identifier(s)
            | PPTokenKind::Number(s)
            | PPTokenKind::CharLiteral(s)
            | PPTokenKind::StringLiteral(s)
            | PPTokenKind::Other(s) => s.as_str(),
            PPTokenKind::HeaderName(s) => s.as_str(),
            kind => kind.punctuator_text().unwrap_or(""),
        }
    }

    pub fn is_identifier(&self, name: &str) -> bool {
        matches!(self.kind, PPTokenKind::Identifier(s) if s.as_str() == name)
    }

    pub fn has_leading_space(&self) -> bool {
        self.flags.contains(PPTokenFlags::LEADING_SPACE)
    }
}

/// Scanner over one buffer
#[derive(Debug, Clone)]
pub struct PPLexer {
    pub source_id: SourceId,
    buffer: Arc<str>,
    pub(crate) position: u32,
    put_back_buffer: Vec<PPToken>,
    /// A newline ends the current directive (`Eod`)
    pub(crate) in_directive: bool,
    /// Lex `<...>` as a single header name
    pub(crate) header_name_mode: bool,
    at_line_start: bool,
    pending_eod: bool,
    lang: LangOptions,
    /// Unterminated comments and literals not yet taken by the preprocessor
    problems: Vec<(PPProblemKind, SourceSpan)>,
}

impl PPLexer {
    pub fn new(source_id: SourceId, buffer: Arc<str>, lang: LangOptions) -> Self {
        PPLexer {
            source_id,
            buffer,
            position: 0,
            put_back_buffer: Vec::new(),
            in_directive: false,
            header_name_mode: false,
            at_line_start: true,
            pending_eod: false,
            lang,
            problems: Vec::new(),
        }
    }

    pub(crate) fn take_problems(&mut self) -> Vec<(PPProblemKind, SourceSpan)> {
        std::mem::take(&mut self.problems)
    }

    fn report_unterminated(&mut self, kind: PPProblemKind, start: u32) {
        let span = SourceSpan::new_with_length(self.source_id, start, self.position - start);
        self.problems.push((kind, span));
    }

    pub fn put_back(&mut self, token: PPToken) {
        self.put_back_buffer.push(token);
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    fn bytes(&self) -> &[u8] {
        self.buffer.as_bytes()
    }

    /// Byte at `pos` after skipping line splices; returns byte and the position after it
    fn char_at(&self, mut pos: usize) -> Option<(u8, usize)> {
        let bytes = self.bytes();
        loop {
            let b = *bytes.get(pos)?;
            if b == b'\\' {
                match bytes.get(pos + 1) {
                    Some(b'\n') => {
                        pos += 2;
                        continue;
                    }
                    Some(b'\r') if bytes.get(pos + 2) == Some(&b'\n') => {
                        pos += 3;
                        continue;
                    }
                    _ => {}
                }
            }
            return Some((b, pos + 1));
        }
    }

    fn peek(&self) -> Option<u8> {
        self.char_at(self.position as usize).map(|(b, _)| b)
    }

    fn peek_n(&self, n: usize) -> Option<u8> {
        let mut pos = self.position as usize;
        for _ in 0..n {
            pos = self.char_at(pos)?.1;
        }
        self.char_at(pos).map(|(b, _)| b)
    }

    fn bump(&mut self) -> Option<u8> {
        let (b, next) = self.char_at(self.position as usize)?;
        self.position = next as u32;
        Some(b)
    }

    /// Skip whitespace and comments. Returns true when anything was skipped.
    /// Stops before a newline while in directive mode.
    fn skip_trivia(&mut self) -> bool {
        let mut skipped = false;
        loop {
            match self.peek() {
                Some(b' ' | b'\t' | b'\x0b' | b'\x0c' | b'\r') => {
                    self.bump();
                    skipped = true;
                }
                Some(b'\n') => {
                    if self.in_directive {
                        return skipped;
                    }
                    self.bump();
                    self.at_line_start = true;
                    skipped = true;
                }
                Some(b'/') if self.peek_n(1) == Some(b'/') => {
                    while let Some(b) = self.peek() {
                        if b == b'\n' {
                            break;
                        }
                        self.bump();
                    }
                    skipped = true;
                }
                Some(b'/') if self.peek_n(1) == Some(b'*') => {
                    let start = self.position;
                    self.bump();
                    self.bump();
                    let mut prev = 0u8;
                    let mut closed = false;
                    while let Some(b) = self.bump() {
                        if prev == b'*' && b == b'/' {
                            closed = true;
                            break;
                        }
                        if b == b'\n' && !self.in_directive {
                            self.at_line_start = true;
                        }
                        prev = b;
                    }
                    if !closed {
                        self.report_unterminated(PPProblemKind::UnterminatedComment, start);
                    }
                    skipped = true;
                }
                _ => return skipped,
            }
        }
    }

    /// Next preprocessing token, `None` after `Eof` was delivered
    pub fn next_token(&mut self) -> Option<PPToken> {
        if let Some(token) = self.put_back_buffer.pop() {
            return Some(token);
        }
        if self.pending_eod {
            return None;
        }

        let leading_space = self.skip_trivia();
        let mut flags = PPTokenFlags::empty();
        if leading_space {
            flags |= PPTokenFlags::LEADING_SPACE;
        }

        let start = self.position;
        let Some(c) = self.peek() else {
            if self.in_directive {
                self.in_directive = false;
                return Some(self.make(PPTokenKind::Eod, flags, start));
            }
            self.pending_eod = true;
            return Some(self.make(PPTokenKind::Eof, flags, start));
        };

        if c == b'\n' {
            // only reachable in directive mode
            self.bump();
            self.in_directive = false;
            self.at_line_start = true;
            return Some(self.make(PPTokenKind::Eod, flags, start));
        }

        if self.at_line_start {
            flags |= PPTokenFlags::STARTS_LINE;
            self.at_line_start = false;
        }

        let kind = self.lex_kind(c);
        Some(self.make(kind, flags, start))
    }

    fn make(&self, kind: PPTokenKind, flags: PPTokenFlags, start: u32) -> PPToken {
        PPToken::new(
            kind,
            flags,
            SourceLoc::new(self.source_id, start),
            self.position - start,
        )
    }

    fn is_ident_start(&self, c: u8) -> bool {
        c.is_ascii_alphabetic() || c == b'_' || (c == b'$' && self.lang.dollar_in_identifiers) || c >= 0x80
    }

    fn is_ident_continue(&self, c: u8) -> bool {
        self.is_ident_start(c) || c.is_ascii_digit()
    }

    fn lex_kind(&mut self, c: u8) -> PPTokenKind {
        if self.header_name_mode && c == b'<' {
            self.header_name_mode = false;
            if let Some(kind) = self.lex_header_name() {
                return kind;
            }
        }
        self.header_name_mode = false;

        if self.is_ident_start(c) {
            // encoding prefixes of literals
            let prefix_len = self.literal_prefix_len();
            if prefix_len > 0 {
                let quote = self.peek_n(prefix_len);
                if quote == Some(b'R') || (prefix_len == 1 && self.peek() == Some(b'R')) {
                    if let Some(kind) = self.lex_raw_string() {
                        return kind;
                    }
                } else if let Some(q @ (b'"' | b'\'')) = quote {
                    let mut text = String::new();
                    for _ in 0..prefix_len {
                        if let Some(b) = self.bump() {
                            text.push(b as char);
                        }
                    }
                    return self.lex_quoted(q, text);
                }
            }
            return self.lex_identifier();
        }

        if c.is_ascii_digit() || (c == b'.' && self.peek_n(1).is_some_and(|d| d.is_ascii_digit())) {
            return self.lex_number();
        }

        match c {
            b'"' | b'\'' => self.lex_quoted(c, String::new()),
            _ => self.lex_punctuator(c),
        }
    }

    /// Length of a literal encoding prefix (`L`, `u`, `U`, `u8`, `R`, `LR`, ...)
    /// that is directly followed by a quote; 0 otherwise.
    fn literal_prefix_len(&self) -> usize {
        let c0 = self.peek();
        let c1 = self.peek_n(1);
        let c2 = self.peek_n(2);
        let is_quote = |b: Option<u8>| matches!(b, Some(b'"' | b'\''));
        match (c0, c1, c2) {
            (Some(b'u'), Some(b'8'), q) if is_quote(q) || q == Some(b'R') => 2,
            (Some(b'L' | b'u' | b'U'), q, _) if is_quote(q) => 1,
            (Some(b'L' | b'u' | b'U'), Some(b'R'), Some(b'"')) => 1,
            (Some(b'R'), Some(b'"'), _) if self.lang.is_cpp() => 1,
            _ => 0,
        }
    }

    fn lex_identifier(&mut self) -> PPTokenKind {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if !self.is_ident_continue(c) {
                break;
            }
            self.bump();
            text.push(c as char);
        }
        // non-ascii bytes were pushed one by one; rebuild the utf-8 text
        if !text.is_ascii() {
            let bytes: Vec<u8> = text.chars().map(|c| c as u32 as u8).collect();
            text = String::from_utf8_lossy(&bytes).into_owned();
        }
        PPTokenKind::Identifier(Symbol::new(&text))
    }

    fn lex_number(&mut self) -> PPTokenKind {
        let mut text = String::new();
        let mut prev = 0u8;
        while let Some(c) = self.peek() {
            let exponent_sign = matches!(c, b'+' | b'-') && matches!(prev, b'e' | b'E' | b'p' | b'P');
            if c.is_ascii_alphanumeric() || c == b'_' || c == b'.' || exponent_sign {
                self.bump();
                text.push(c as char);
                prev = c;
            } else if c == b'\'' && self.lang.is_cpp() && self.peek_n(1).is_some_and(|d| d.is_ascii_alphanumeric()) {
                // digit separator
                self.bump();
                text.push('\'');
                prev = c;
            } else {
                break;
            }
        }
        PPTokenKind::Number(Symbol::new(&text))
    }

    fn lex_quoted(&mut self, quote: u8, mut text: String) -> PPTokenKind {
        let start = self.position - text.len() as u32;
        let mut bytes = std::mem::take(&mut text).into_bytes();
        if let Some(b) = self.bump() {
            bytes.push(b);
        }
        let mut closed = false;
        while let Some(c) = self.peek() {
            if c == b'\n' {
                // unterminated literal ends at the line end
                break;
            }
            self.bump();
            bytes.push(c);
            if c == b'\\' {
                if let Some(next) = self.peek()
                    && next != b'\n'
                {
                    self.bump();
                    bytes.push(next);
                }
                continue;
            }
            if c == quote {
                closed = true;
                break;
            }
        }
        if !closed {
            self.report_unterminated(PPProblemKind::UnterminatedLiteral, start);
        }
        let text = String::from_utf8_lossy(&bytes);
        if quote == b'"' {
            PPTokenKind::StringLiteral(Symbol::new(&text))
        } else {
            PPTokenKind::CharLiteral(Symbol::new(&text))
        }
    }

    /// `R"delim( ... )delim"` with optional encoding prefix
    fn lex_raw_string(&mut self) -> Option<PPTokenKind> {
        let save = self.position;
        let mut text = String::new();
        while let Some(c) = self.peek() {
            self.bump();
            text.push(c as char);
            if c == b'"' {
                break;
            }
        }
        let mut delimiter = String::new();
        loop {
            match self.bump() {
                Some(b'(') => break,
                Some(c) if delimiter.len() < 16 && c != b'\n' && c != b' ' => delimiter.push(c as char),
                _ => {
                    self.position = save;
                    return None;
                }
            }
        }
        text.push_str(&delimiter);
        text.push('(');
        let terminator = format!("){}\"", delimiter);
        let rest = &self.buffer[self.position as usize..];
        let end = rest.find(&terminator)?;
        text.push_str(&rest[..end + terminator.len()]);
        self.position += (end + terminator.len()) as u32;
        Some(PPTokenKind::StringLiteral(Symbol::new(&text)))
    }

    fn lex_header_name(&mut self) -> Option<PPTokenKind> {
        let save = self.position;
        self.bump();
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c == b'\n' {
                break;
            }
            self.bump();
            if c == b'>' {
                return Some(PPTokenKind::HeaderName(Symbol::new(&text)));
            }
            text.push(c as char);
        }
        self.position = save;
        None
    }

    fn lex_punctuator(&mut self, c: u8) -> PPTokenKind {
        let c1 = self.peek_n(1);
        let c2 = self.peek_n(2);
        let cpp = self.lang.is_cpp();
        let digraphs = self.lang.digraphs;
        let (kind, len) = match (c, c1, c2) {
            (b'.', Some(b'.'), Some(b'.')) => (PPTokenKind::Ellipsis, 3),
            (b'.', Some(b'*'), _) if cpp => (PPTokenKind::DotStar, 2),
            (b'.', _, _) => (PPTokenKind::Dot, 1),
            (b'-', Some(b'>'), Some(b'*')) if cpp => (PPTokenKind::ArrowStar, 3),
            (b'-', Some(b'>'), _) => (PPTokenKind::Arrow, 2),
            (b'-', Some(b'-'), _) => (PPTokenKind::Decrement, 2),
            (b'-', Some(b'='), _) => (PPTokenKind::MinusAssign, 2),
            (b'-', _, _) => (PPTokenKind::Minus, 1),
            (b'+', Some(b'+'), _) => (PPTokenKind::Increment, 2),
            (b'+', Some(b'='), _) => (PPTokenKind::PlusAssign, 2),
            (b'+', _, _) => (PPTokenKind::Plus, 1),
            (b'*', Some(b'='), _) => (PPTokenKind::StarAssign, 2),
            (b'*', _, _) => (PPTokenKind::Star, 1),
            (b'/', Some(b'='), _) => (PPTokenKind::DivAssign, 2),
            (b'/', _, _) => (PPTokenKind::Slash, 1),
            (b'%', Some(b':'), _) if digraphs => {
                if c2 == Some(b'%') && self.peek_n(3) == Some(b':') {
                    (PPTokenKind::HashHash, 4)
                } else {
                    (PPTokenKind::Hash, 2)
                }
            }
            (b'%', Some(b'>'), _) if digraphs => (PPTokenKind::RightBrace, 2),
            (b'%', Some(b'='), _) => (PPTokenKind::ModAssign, 2),
            (b'%', _, _) => (PPTokenKind::Percent, 1),
            (b'&', Some(b'&'), _) => (PPTokenKind::LogicAnd, 2),
            (b'&', Some(b'='), _) => (PPTokenKind::AndAssign, 2),
            (b'&', _, _) => (PPTokenKind::And, 1),
            (b'|', Some(b'|'), _) => (PPTokenKind::LogicOr, 2),
            (b'|', Some(b'='), _) => (PPTokenKind::OrAssign, 2),
            (b'|', _, _) => (PPTokenKind::Or, 1),
            (b'^', Some(b'='), _) => (PPTokenKind::XorAssign, 2),
            (b'^', _, _) => (PPTokenKind::Xor, 1),
            (b'!', Some(b'='), _) => (PPTokenKind::NotEqual, 2),
            (b'!', _, _) => (PPTokenKind::Not, 1),
            (b'~', _, _) => (PPTokenKind::Tilde, 1),
            (b'<', Some(b'<'), Some(b'=')) => (PPTokenKind::LeftShiftAssign, 3),
            (b'<', Some(b'<'), _) => (PPTokenKind::LeftShift, 2),
            (b'<', Some(b'='), _) => (PPTokenKind::LessEqual, 2),
            (b'<', Some(b':'), _) if digraphs => (PPTokenKind::LeftBracket, 2),
            (b'<', Some(b'%'), _) if digraphs => (PPTokenKind::LeftBrace, 2),
            (b'<', _, _) => (PPTokenKind::Less, 1),
            (b'>', Some(b'>'), Some(b'=')) => (PPTokenKind::RightShiftAssign, 3),
            (b'>', Some(b'>'), _) => (PPTokenKind::RightShift, 2),
            (b'>', Some(b'='), _) => (PPTokenKind::GreaterEqual, 2),
            (b'>', _, _) => (PPTokenKind::Greater, 1),
            (b'=', Some(b'='), _) => (PPTokenKind::Equal, 2),
            (b'=', _, _) => (PPTokenKind::Assign, 1),
            (b':', Some(b':'), _) if cpp => (PPTokenKind::ColonColon, 2),
            (b':', Some(b'>'), _) if digraphs => (PPTokenKind::RightBracket, 2),
            (b':', _, _) => (PPTokenKind::Colon, 1),
            (b'#', Some(b'#'), _) => (PPTokenKind::HashHash, 2),
            (b'#', _, _) => (PPTokenKind::Hash, 1),
            (b'(', _, _) => (PPTokenKind::LeftParen, 1),
            (b')', _, _) => (PPTokenKind::RightParen, 1),
            (b'[', _, _) => (PPTokenKind::LeftBracket, 1),
            (b']', _, _) => (PPTokenKind::RightBracket, 1),
            (b'{', _, _) => (PPTokenKind::LeftBrace, 1),
            (b'}', _, _) => (PPTokenKind::RightBrace, 1),
            (b'?', _, _) => (PPTokenKind::Question, 1),
            (b';', _, _) => (PPTokenKind::Semicolon, 1),
            (b',', _, _) => (PPTokenKind::Comma, 1),
            _ => {
                self.bump();
                let text = (c as char).to_string();
                return PPTokenKind::Other(Symbol::new(&text));
            }
        };
        for _ in 0..len {
            self.bump();
        }
        kind
    }
}

/// Scan a whole buffer outside of any directive handling; used for macro
/// bodies given as strings and for guard detection.
pub fn tokenize_all(source_id: SourceId, text: Arc<str>, lang: LangOptions) -> Vec<PPToken> {
    let mut lexer = PPLexer::new(source_id, text, lang);
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next_token() {
        if token.kind == PPTokenKind::Eof {
            break;
        }
        tokens.push(token);
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str, lang: LangOptions) -> Vec<String> {
        tokenize_all(SourceId::from_index(0), Arc::from(src), lang)
            .iter()
            .map(|t| t.get_text().to_string())
            .collect()
    }

    #[test]
    fn splices_and_comments_are_invisible() {
        let toks = kinds("in\\\nt /* c */ x; // tail\n", LangOptions::c());
        assert_eq!(toks, vec!["int", "x", ";"]);
    }

    #[test]
    fn scope_operator_only_in_cpp() {
        assert_eq!(kinds("a::b", LangOptions::cpp()), vec!["a", "::", "b"]);
        assert_eq!(kinds("a::b", LangOptions::c()), vec!["a", ":", ":", "b"]);
    }

    #[test]
    fn digraphs_map_to_punctuators() {
        let toks = tokenize_all(SourceId::from_index(0), Arc::from("<: :> <% %> %: %:%:"), LangOptions::c());
        let kinds: Vec<_> = toks.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                PPTokenKind::LeftBracket,
                PPTokenKind::RightBracket,
                PPTokenKind::LeftBrace,
                PPTokenKind::RightBrace,
                PPTokenKind::Hash,
                PPTokenKind::HashHash
            ]
        );
    }

    #[test]
    fn literal_prefixes() {
        assert_eq!(kinds("L\"w\" u8\"x\" 'c'", LangOptions::c()), vec!["L\"w\"", "u8\"x\"", "'c'"]);
    }

    #[test]
    fn line_start_flags() {
        let toks = tokenize_all(SourceId::from_index(0), Arc::from("a b\n c"), LangOptions::c());
        assert!(toks[0].flags.contains(PPTokenFlags::STARTS_LINE));
        assert!(!toks[1].flags.contains(PPTokenFlags::STARTS_LINE));
        assert!(toks[1].has_leading_space());
        assert!(toks[2].flags.contains(PPTokenFlags::STARTS_LINE));
    }
}
