//! Include guard detection on the raw token stream of one file.

use crate::pp::pp_lexer::{PPToken, PPTokenFlags, PPTokenKind};
use symbol_table::GlobalSymbol as Symbol;

fn split_lines(tokens: &[PPToken]) -> Vec<&[PPToken]> {
    let mut lines = Vec::new();
    let mut start = 0;
    for (i, token) in tokens.iter().enumerate() {
        if i > start && token.flags.contains(PPTokenFlags::STARTS_LINE) {
            lines.push(&tokens[start..i]);
            start = i;
        }
    }
    if start < tokens.len() {
        lines.push(&tokens[start..]);
    }
    lines
}

fn directive_name(line: &[PPToken]) -> Option<&'static str> {
    match line {
        [hash, PPToken { kind: PPTokenKind::Identifier(name), .. }, ..] if hash.kind == PPTokenKind::Hash => {
            Some(name.as_str())
        }
        _ => None,
    }
}

/// `#ifndef G`, `#if !defined G` or `#if !defined(G)` with nothing else
fn opening_guard(line: &[PPToken]) -> Option<Symbol> {
    let kinds: Vec<PPTokenKind> = line.iter().map(|t| t.kind).collect();
    match kinds.as_slice() {
        [PPTokenKind::Hash, PPTokenKind::Identifier(d), PPTokenKind::Identifier(g)] if d.as_str() == "ifndef" => {
            Some(*g)
        }
        [
            PPTokenKind::Hash,
            PPTokenKind::Identifier(d),
            PPTokenKind::Not,
            PPTokenKind::Identifier(def),
            PPTokenKind::Identifier(g),
        ] if d.as_str() == "if" && def.as_str() == "defined" => Some(*g),
        [
            PPTokenKind::Hash,
            PPTokenKind::Identifier(d),
            PPTokenKind::Not,
            PPTokenKind::Identifier(def),
            PPTokenKind::LeftParen,
            PPTokenKind::Identifier(g),
            PPTokenKind::RightParen,
        ] if d.as_str() == "if" && def.as_str() == "defined" => Some(*g),
        _ => None,
    }
}

/// `#define name ...`
fn defines(line: &[PPToken], name: Symbol) -> bool {
    matches!(
        line,
        [hash, d, PPToken { kind: PPTokenKind::Identifier(defined), .. }, ..]
            if hash.kind == PPTokenKind::Hash && d.is_identifier("define") && *defined == name
    )
}

/// The guarded body, up to the closing `#endif`, is a whole guarded region
/// of its own
fn wraps_second_guard(body: &[&[PPToken]]) -> bool {
    let [first, second, ..] = body else {
        return false;
    };
    if !opening_guard(first).is_some_and(|inner| defines(second, inner)) {
        return false;
    }
    let mut depth = 0usize;
    for (i, line) in body.iter().enumerate() {
        match directive_name(line) {
            Some("if" | "ifdef" | "ifndef") => depth += 1,
            Some("endif") => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return i + 2 == body.len();
                }
            }
            _ => {}
        }
    }
    false
}

/// Guard macro of a file wrapped in `#ifndef G / #define G ... #endif`.
///
/// The first directive must open the guard, the next one must define the
/// guard macro, and the matching `#endif` must be the last token line.
/// An `#else`/`#elif` of the guard conditional, code before the opening or
/// after the closing directive, any additional condition in the opening
/// directive or a second guard wrapping the whole body rejects the file.
pub fn detect_include_guard(tokens: &[PPToken]) -> Option<Symbol> {
    let lines = split_lines(tokens);
    let (first, rest) = lines.split_first()?;
    let guard = opening_guard(first)?;

    let (second, rest) = rest.split_first()?;
    if !defines(second, guard) {
        return None;
    }

    if wraps_second_guard(rest) {
        return None;
    }

    let mut depth = 1usize;
    for (i, line) in rest.iter().enumerate() {
        match directive_name(line) {
            Some("if" | "ifdef" | "ifndef") => depth += 1,
            Some("else" | "elif") if depth == 1 => return None,
            Some("endif") => {
                depth -= 1;
                if depth == 0 {
                    return (i + 1 == rest.len()).then_some(guard);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang_options::LangOptions;
    use crate::pp::pp_lexer::tokenize_all;
    use crate::source_manager::SourceId;
    use std::sync::Arc;

    fn guard_of(src: &str) -> Option<String> {
        let tokens = tokenize_all(SourceId::from_index(0), Arc::from(src), LangOptions::c());
        detect_include_guard(&tokens).map(|s| s.as_str().to_string())
    }

    #[test]
    fn classic_guard_with_comments() {
        let src = "/* header */\n#ifndef G_H\n#define G_H\nint x;\n#endif /* G_H */\n";
        assert_eq!(guard_of(src).as_deref(), Some("G_H"));
    }

    #[test]
    fn defined_forms() {
        assert_eq!(guard_of("#if !defined(G)\n#define G\n#endif\n").as_deref(), Some("G"));
        assert_eq!(guard_of("#if !defined G\n#define G\n#endif\n").as_deref(), Some("G"));
    }

    #[test]
    fn rejects_second_condition_and_outside_code() {
        assert_eq!(guard_of("#if !defined(G) && !defined(H)\n#define G\n#endif\n"), None);
        assert_eq!(guard_of("#if !defined(G) || !defined(H)\n#define G\n#endif\n"), None);
        assert_eq!(guard_of("int y;\n#ifndef G\n#define G\n#endif\n"), None);
        assert_eq!(guard_of("#ifndef G\n#define G\n#endif\nint y;\n"), None);
        assert_eq!(guard_of("#ifndef G\n#define G\n#else\n#endif\n"), None);
        assert_eq!(guard_of("#ifndef G\n#define H\n#endif\n"), None);
    }

    #[test]
    fn nested_conditionals_are_fine() {
        let src = "#ifndef G\n#define G\n#ifdef X\nint a;\n#else\nint b;\n#endif\n#endif\n";
        assert_eq!(guard_of(src).as_deref(), Some("G"));
    }

    #[test]
    fn rejects_nested_second_guard() {
        assert_eq!(guard_of("#ifndef G\n#define G\n#ifndef H\n#define H\n#endif\n#endif\n"), None);
        assert_eq!(
            guard_of("#ifndef G\n#define G\n#if !defined(H)\n#define H 1\nint a;\n#endif\n#endif\n"),
            None
        );
        // fallback definitions inside the body keep the guard
        let src = "#ifndef G\n#define G\n#ifndef NULL\n#define NULL 0\n#endif\nint a;\n#endif\n";
        assert_eq!(guard_of(src).as_deref(), Some("G"));
    }
}
