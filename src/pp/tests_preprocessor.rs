use super::*;
use crate::diagnostic::DiagnosticEngine;
use crate::lang_options::{LangOptions, ScannerInfo};
use crate::source_manager::SourceManager;

struct Preprocessed {
    output: PPOutput,
    source_manager: SourceManager,
}

impl Preprocessed {
    /// Expanded tokens, space separated, without `Eof`
    fn text(&self) -> String {
        self.output
            .tokens
            .iter()
            .filter(|t| t.kind != PPTokenKind::Eof)
            .map(|t| t.get_text())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn problem_kinds(&self) -> Vec<PPProblemKind> {
        self.output.problems.iter().map(|p| p.kind).collect()
    }
}

fn preprocess_with(src: &str, lang: LangOptions, provider: &InMemoryFileContentProvider) -> Preprocessed {
    let _ = env_logger::try_init();

    let mut source_manager = SourceManager::new();
    let mut diagnostics = DiagnosticEngine::new();
    let info = ScannerInfo::for_options(&lang);
    let main = source_manager.add_buffer(src, "test.c", None);
    let output = Preprocessor::new(&mut source_manager, &mut diagnostics, provider, lang, &info, 200)
        .process(main, &info)
        .unwrap();
    Preprocessed { output, source_manager }
}

fn preprocess(src: &str) -> Preprocessed {
    preprocess_with(src, LangOptions::c(), &InMemoryFileContentProvider::new())
}

#[test]
fn object_like_macro() {
    let pp = preprocess("#define TEN 10\nint x = TEN;\n");
    assert_eq!(pp.text(), "int x = 10 ;");
    assert!(pp.output.problems.is_empty());
}

#[test]
fn function_like_macro_with_nested_invocation() {
    let pp = preprocess("#define ADD(a,b) ((a)+(b))\nint x = ADD(ADD(1,2), 3);\n");
    assert_eq!(pp.text(), "int x = ( ( ( ( 1 ) + ( 2 ) ) ) + ( 3 ) ) ;");
}

#[test]
fn function_like_name_without_parenthesis_is_kept() {
    let pp = preprocess("#define f(x) x\nint f;\n");
    assert_eq!(pp.text(), "int f ;");
}

#[test]
fn self_reference_does_not_recurse() {
    let pp = preprocess("#define foo foo + 1\n#define a b\n#define b a\nfoo; a;\n");
    assert_eq!(pp.text(), "foo + 1 ; a ;");
}

#[test]
fn stringize_and_paste() {
    let pp = preprocess(
        "#define STR(x) #x\n#define CAT(a, b) a ## b\nSTR(a  \"q\" b); CAT(var, 12); CAT(, x); CAT(y, );\n",
    );
    assert_eq!(pp.text(), r#""a \"q\" b" ; var12 ; x ; y ;"#);
}

#[test]
fn variadic_macros_and_gnu_comma() {
    let pp = preprocess(
        "#define P(fmt, ...) f(fmt, ## __VA_ARGS__)\n#define V(args...) g(args)\nP(1); P(1, 2, 3); V(a, b);\n",
    );
    assert_eq!(pp.text(), "f ( 1 ) ; f ( 1 , 2 , 3 ) ; g ( a , b ) ;");
}

#[test]
fn invalid_paste_keeps_both_tokens() {
    let pp = preprocess("#define CAT(a,b) a##b\nint x = 1 CAT(+,-) 2;\n");
    assert_eq!(pp.text(), "int x = 1 + - 2 ;");
    insta::assert_yaml_snapshot!(pp.problem_kinds(), @"- InvalidPaste");
    assert_eq!(pp.output.problems[0].argument, "+-");
}

#[test]
fn unterminated_comment_and_literals() {
    let pp = preprocess("char c = 'x;\nchar *s = \"abc;\nint y; /* open\n");
    insta::assert_yaml_snapshot!(pp.problem_kinds(), @r"
    - UnterminatedLiteral
    - UnterminatedLiteral
    - UnterminatedComment
    ");
}

#[test]
fn skipped_groups_do_not_report_lexical_problems() {
    let pp = preprocess("#if 0\nit's skipped\n#endif\nint z;\n");
    assert_eq!(pp.text(), "int z ;");
    assert!(pp.output.problems.is_empty());
}

#[test]
fn argument_count_mismatch_is_a_problem() {
    let pp = preprocess("#define F(a, b) a\nint x = F(1);\n");
    assert_eq!(pp.problem_kinds(), vec![PPProblemKind::MacroArgumentMismatch]);
    assert_eq!(pp.text(), "int x = ;");
}

#[test]
fn unterminated_invocation() {
    let pp = preprocess("#define F(a) a\nint x = F(1, \n");
    assert_eq!(pp.problem_kinds(), vec![PPProblemKind::UnterminatedMacroInvocation]);
}

#[test]
fn conditionals_record_taken_branches() {
    let src = "#define A 2\n#if A > 3\nint a;\n#elif defined(A) && A == 2\nint b;\n#else\nint c;\n#endif\n";
    let pp = preprocess(src);
    assert_eq!(pp.text(), "int b ;");
    let taken: Vec<_> = pp
        .output
        .statements
        .iter()
        .map(|s| (s.kind.keyword().to_string(), s.kind.taken()))
        .collect();
    assert_eq!(
        taken,
        vec![
            ("define".to_string(), None),
            ("if".to_string(), Some(false)),
            ("elif".to_string(), Some(true)),
            ("else".to_string(), Some(false)),
            ("endif".to_string(), None),
        ]
    );
}

#[test]
fn directives_in_skipped_branch_are_inactive() {
    let pp = preprocess("#if 0\n#define X 1\n#include \"missing.h\"\n#bogus\n#endif\nX\n");
    assert_eq!(pp.text(), "X");
    assert!(pp.output.problems.is_empty());
    let inactive: Vec<_> = pp
        .output
        .statements
        .iter()
        .filter(|s| !s.active)
        .map(|s| s.kind.keyword().to_string())
        .collect();
    assert_eq!(inactive, vec!["define", "include", "bogus"]);
}

#[test]
fn unbalanced_conditionals() {
    let pp = preprocess("#endif\n#ifdef X\nint a;\n");
    assert_eq!(
        pp.problem_kinds(),
        vec![PPProblemKind::UnbalancedConditional, PPProblemKind::UnbalancedConditional]
    );
}

#[test]
fn invalid_expression_is_false() {
    let pp = preprocess("#if 1 +\nint a;\n#else\nint b;\n#endif\n");
    assert_eq!(pp.text(), "int b ;");
    assert_eq!(pp.problem_kinds(), vec![PPProblemKind::InvalidExpression]);
}

#[test]
fn pound_error_and_unknown_directive() {
    let pp = preprocess("#error stop here\n#warning careful\n#frobnicate\n");
    assert_eq!(
        pp.problem_kinds(),
        vec![
            PPProblemKind::PoundError,
            PPProblemKind::PoundWarning,
            PPProblemKind::InvalidDirective
        ]
    );
    assert_eq!(pp.output.problems[0].argument, "stop here");
}

#[test]
fn redefinition_with_different_body() {
    let pp = preprocess("#define A 1\n#define A 1\n#define A 2\nA\n");
    assert_eq!(pp.problem_kinds(), vec![PPProblemKind::InvalidMacroRedefinition]);
    assert_eq!(pp.text(), "2");
}

#[test]
fn include_guard_skips_second_inclusion() {
    let provider = InMemoryFileContentProvider::new().with_file("a.h", "#ifndef A_H\n#define A_H\nint a;\n#endif\n");
    let pp = preprocess_with("#include \"a.h\"\n#include \"a.h\"\n", LangOptions::c(), &provider);
    assert_eq!(pp.text(), "int a ;");

    let includes: Vec<_> = pp
        .output
        .statements
        .iter()
        .filter_map(|s| match &s.kind {
            PPStatementKind::Include(inc) => Some((inc.was_read, inc.has_pragma_once_semantics)),
            _ => None,
        })
        .collect();
    assert_eq!(includes, vec![(true, true), (false, true)]);
}

#[test]
fn pragma_once_and_missing_include() {
    let provider = InMemoryFileContentProvider::new().with_file("b.h", "#pragma once\nint b;\n");
    let pp = preprocess_with(
        "#include \"b.h\"\n#include \"b.h\"\n#include <nothere.h>\n",
        LangOptions::c(),
        &provider,
    );
    assert_eq!(pp.text(), "int b ;");
    assert_eq!(pp.problem_kinds(), vec![PPProblemKind::InclusionNotFound]);
    assert_eq!(pp.output.problems[0].argument, "nothere.h");
}

#[test]
fn recursive_inclusion_is_cut_off() {
    let provider = InMemoryFileContentProvider::new().with_file("r.h", "int r;\n#include \"r.h\"\n");
    let pp = preprocess_with("#include \"r.h\"\n", LangOptions::c(), &provider);
    assert_eq!(pp.text(), "int r ; int r ;");
    assert_eq!(pp.problem_kinds(), vec![PPProblemKind::RecursiveInclusion]);
}

#[test]
fn main_file_guard_is_reported() {
    let pp = preprocess("#ifndef MAIN_H\n#define MAIN_H\nint m;\n#endif\n");
    assert_eq!(pp.output.main_include_guard.map(|s| s.as_str()), Some("MAIN_H"));
    assert!(pp.output.main_has_pragma_once_semantics);
}

#[test]
fn expansion_provenance() {
    let src = "#define C_PO **\n#define OUTER INNER\n#define INNER 1\nint C_PO var; int y = OUTER;\n";
    let pp = preprocess(src);
    let map = &pp.output.location_map;

    let stars: Vec<_> = pp.output.tokens.iter().filter(|t| t.kind == PPTokenKind::Star).collect();
    assert_eq!(stars.len(), 2);
    let expansion = stars[0].expansion.unwrap();
    assert_eq!(expansion.outer, expansion.inner);
    let record = map.expansion(expansion.outer).unwrap();
    assert_eq!(record.name.as_str(), "C_PO");
    assert_eq!(record.token_count, 2);
    assert_eq!(pp.source_manager.get_source_text(record.invocation), Some("C_PO"));

    let one = pp
        .output
        .tokens
        .iter()
        .find(|t| matches!(t.kind, PPTokenKind::Number(_)))
        .unwrap();
    let expansion = one.expansion.unwrap();
    assert_ne!(expansion.outer, expansion.inner);
    assert_eq!(map.expansion(expansion.outer).unwrap().name.as_str(), "OUTER");
    let inner = map.expansion(expansion.inner).unwrap();
    assert_eq!(inner.name.as_str(), "INNER");
    assert_eq!(inner.parent, Some(expansion.outer));
    assert_eq!(map.expansion_definition(expansion.inner).unwrap().expansion, "1");
}

#[test]
fn function_like_invocation_span_covers_arguments() {
    let pp = preprocess("#define F(x) x\nint a = F( 3 );\n");
    let three = pp
        .output
        .tokens
        .iter()
        .find(|t| matches!(t.kind, PPTokenKind::Number(_)))
        .unwrap();
    let record = pp.output.location_map.expansion(three.expansion.unwrap().outer).unwrap();
    assert_eq!(pp.source_manager.get_source_text(record.invocation), Some("F( 3 )"));
}

#[test]
fn line_directive_and_dynamic_macros() {
    let pp = preprocess("int a = __LINE__;\n#line 100 \"renamed.c\"\nint b = __LINE__; const char *f = __FILE__;\n");
    assert_eq!(pp.text(), "int a = 1 ; int b = 100 ; const char * f = \"renamed.c\" ;");
}

#[test]
fn predefined_macros_follow_language() {
    let c = preprocess("__STDC_VERSION__ __STDC__");
    assert_eq!(c.text(), "201112L 1");
    let cpp = preprocess_with("__cplusplus", LangOptions::cpp(), &InMemoryFileContentProvider::new());
    assert_eq!(cpp.text(), "201103L");
    // predefined definitions are not reported as statements
    assert!(cpp.output.statements.is_empty());
}

#[test]
fn has_include_in_conditional() {
    let provider = InMemoryFileContentProvider::new().with_file("here.h", "");
    let pp = preprocess_with(
        "#if __has_include(\"here.h\") && !__has_include(<gone.h>)\nyes\n#endif\n",
        LangOptions::c(),
        &provider,
    );
    assert_eq!(pp.text(), "yes");
}
