use std::path::Path;

use crate::diagnostic::DiagnosticLevel;
use crate::driver::{self, FrontendDriver, TEST_CODE_NAME};
use crate::error::FrontendError;
use crate::lang_options::{Language, ParserConfig};
use crate::pp::{InMemoryFileContentProvider, PPProblemKind, PPStatementKind};
use crate::tests::test_utils::{declaration_kinds, find_name, find_node, parse, parse_lenient};

#[test]
fn unexpected_binding_problem_fails_the_parse() {
    let _ = env_logger::try_init();
    let err = driver::parse("int x = missing;\n", Language::C, true, true).unwrap_err();
    assert_eq!(err.problem_count(), 1);
    match err {
        FrontendError::UnexpectedProblems {
            syntax,
            preprocessor,
            binding,
            details,
        } => {
            assert_eq!((syntax, preprocessor, binding), (0, 0, 1));
            assert_eq!(details, vec!["<testcode>:1: Name not found: missing".to_string()]);
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn syntax_and_preprocessor_problems_count_too() {
    let _ = env_logger::try_init();
    let syntax = driver::parse("int ok;\nint a = ;\n", Language::C, true, true).unwrap_err();
    assert!(matches!(syntax, FrontendError::UnexpectedProblems { syntax: 1, .. }), "{syntax:?}");
    if let FrontendError::UnexpectedProblems { details, .. } = &syntax {
        assert!(details[0].starts_with("<testcode>:2: "), "{details:?}");
    }

    let directive = driver::parse("#error stop here\nint x;\n", Language::C, true, true).unwrap_err();
    assert!(matches!(directive, FrontendError::UnexpectedProblems { preprocessor: 1, .. }), "{directive:?}");

    // the same code parses when problems are allowed
    let unit = parse_lenient("#error stop here\nint x;\n", Language::C);
    assert_eq!(unit.preprocessor_problems()[0].kind, PPProblemKind::PoundError);
    assert!(unit.preprocessor_problems()[0].argument.contains("stop"));
    assert_eq!(declaration_kinds(&unit), vec!["SimpleDeclaration"]);
}

#[test]
fn problems_are_reported_as_diagnostics() {
    let unit = parse_lenient("#warning careful\nint a = ;\n", Language::C);
    let diagnostics = unit.diagnostics().diagnostics();
    assert!(diagnostics.iter().any(|d| d.level == DiagnosticLevel::Warning));
    assert!(unit.diagnostics().has_errors());
    let lines = unit.diagnostics().format_all(unit.source_manager());
    assert!(lines.iter().all(|l| l.starts_with("<testcode>:")), "{lines:?}");
}

#[test]
fn zero_include_depth_is_a_configuration_error() {
    let mut config = ParserConfig::new(Language::C, true);
    config.max_include_depth = 0;
    let provider = InMemoryFileContentProvider::new();
    let result = FrontendDriver::new(config, &provider).parse(TEST_CODE_NAME, "int x;\n");
    assert!(matches!(result, Err(FrontendError::Configuration(_))));
}

#[test]
fn missing_main_file_is_a_configuration_error() {
    let provider = InMemoryFileContentProvider::new();
    let result = FrontendDriver::new(ParserConfig::default(), &provider).parse_file(Path::new("nowhere.c"));
    assert!(matches!(result, Err(FrontendError::Configuration(_))));
}

#[test]
fn conditional_statements_record_taken_branches() {
    let code = "#define A\n#ifdef A\nint a;\n#else\n#define HIDDEN 1\nint b;\n#endif\n#ifndef A\n#endif\n";
    let unit = parse(code, Language::C);
    let statements = unit.all_preprocessor_statements();
    let taken: Vec<Option<bool>> = statements.iter().map(|s| s.kind.taken()).collect();
    assert_eq!(taken, vec![None, Some(true), Some(false), None, None, Some(false), None]);

    let hidden = &statements[3];
    assert!(!hidden.active);
    assert!(matches!(hidden.kind, PPStatementKind::Define { definition: None, .. }));
    assert_eq!(unit.source_manager().get_source_text(hidden.span), Some("#define HIDDEN 1"));
    assert_eq!(unit.macro_definitions().len(), 1);
    assert_eq!(declaration_kinds(&unit), vec!["SimpleDeclaration"]);
}

#[test]
fn predefined_macros_are_not_listed() {
    let unit = parse("#define MINE 2\nint v = __STDC__ + MINE;\n", Language::C);
    let names: Vec<&str> = unit.macro_definitions().iter().map(|(_, d)| d.name.as_str()).collect();
    assert_eq!(names, vec!["MINE"]);
    assert!(unit.location_map().definitions().any(|(_, d)| d.predefined));
}

#[test]
fn raw_signature_is_the_source_text() {
    let code = "static const char *names[] = { \"a\", \"b\" };\n";
    let unit = parse(code, Language::C);
    let declaration = unit.declarations()[0];
    assert_eq!(unit.raw_signature(declaration).as_deref(), Some(code.trim_end()));
    let name = find_name(&unit, code, "names", 5);
    assert_eq!(unit.raw_signature(name).as_deref(), Some("names"));
    let initializer = find_node(&unit, code, "{ \"a\", \"b\" }", 12);
    assert_eq!(unit.raw_signature(initializer).as_deref(), Some("{ \"a\", \"b\" }"));
}

#[test]
fn both_languages_agree_on_plain_c() {
    let code = "int square(int v) { return v * v; }\nint nine = 0;\n";
    for language in [Language::C, Language::Cpp] {
        let unit = parse(code, language);
        assert_eq!(unit.lang().language, language);
        assert_eq!(declaration_kinds(&unit), vec!["FunctionDefinition", "SimpleDeclaration"]);
        assert_eq!(unit.binding_problem_count(), 0);
        assert_eq!(unit.syntax_problem_count(), 0);
    }
}
