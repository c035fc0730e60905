use crate::ast::{NodeKind, NodeRef, ProblemId, UnaryOp};
use crate::driver::{FrontendDriver, TEST_CODE_NAME};
use crate::lang_options::{Language, ParserConfig};
use crate::pp::InMemoryFileContentProvider;
use crate::tests::test_utils::{declaration_kinds, find_node, kind_name, parse, parse_lenient, parse_with};
use crate::translation_unit::TranslationUnit;

/// Statements of the body of the `index`th top-level function definition
fn body_statements(unit: &TranslationUnit, index: usize) -> Vec<NodeRef> {
    let definition = unit.declarations()[index];
    let NodeKind::FunctionDefinition { body: Some(body), .. } = unit.ast().get_kind(definition) else {
        panic!("declaration {index} is not a function definition with a body");
    };
    match unit.ast().get_kind(*body) {
        NodeKind::CompoundStatement { statements } => statements.to_vec(),
        other => panic!("unexpected body {}", other.name()),
    }
}

fn statement_kinds(unit: &TranslationUnit, index: usize) -> Vec<&'static str> {
    body_statements(unit, index)
        .into_iter()
        .map(|s| kind_name(unit, s))
        .collect()
}

#[test]
fn typedef_names_decide_declaration_or_expression() {
    let code = "typedef int T;\nint x, y;\nvoid f(void) {\n  T * p;\n  x * y;\n}\n";
    let unit = parse(code, Language::C);
    assert_eq!(statement_kinds(&unit, 2), vec!["DeclarationStatement", "ExpressionStatement"]);
    assert_eq!(kind_name(&unit, find_node(&unit, code, "T * p;", 6)), "DeclarationStatement");
    assert_eq!(kind_name(&unit, find_node(&unit, code, "x * y", 5)), "Binary");
}

#[test]
fn casts_and_compound_literals() {
    let code = "typedef long L;\nstruct P { int x, y; };\n\
                long g(int a) { return (L)a + (a); }\n\
                struct P origin(void) { return (struct P){ 1, 2 }; }\n";
    let unit = parse(code, Language::C);
    assert_eq!(kind_name(&unit, find_node(&unit, code, "(L)a", 4)), "Cast");
    let parenthesized = find_node(&unit, code, "(a)", 3);
    assert!(matches!(
        unit.ast().get_kind(parenthesized),
        NodeKind::Unary { op: UnaryOp::Bracketed, .. }
    ));
    assert_eq!(
        kind_name(&unit, find_node(&unit, code, "(struct P){ 1, 2 }", 18)),
        "TypeIdInitializerExpression"
    );
}

#[test]
fn designated_initializers() {
    let code = "struct P { int x, y; };\nstruct P p = { .y = 2, .x = 1 };\nint table[8] = { [0 ... 3] = 1, [7] = 2 };\n";
    let unit = parse(code, Language::C);
    assert_eq!(kind_name(&unit, find_node(&unit, code, ".y = 2", 6)), "DesignatedInitializer");
    assert_eq!(kind_name(&unit, find_node(&unit, code, ".y", 2)), "FieldDesignator");
    assert_eq!(kind_name(&unit, find_node(&unit, code, "[0 ... 3]", 9)), "ArrayRangeDesignator");
    assert_eq!(kind_name(&unit, find_node(&unit, code, "[7]", 3)), "ArrayDesignator");
}

#[test]
fn gnu_statement_level_extensions() {
    let code = "int h(int v) {\n  int t = ({ int u = v; u * 2; });\n  switch (v) {\n  case 1 ... 3:\n    goto *&&done;\n  }\n\
                done:\n  return t ?: v;\n}\n";
    let unit = parse(code, Language::C);
    assert_eq!(
        kind_name(&unit, find_node(&unit, code, "({ int u = v; u * 2; })", 23)),
        "CompoundStatementExpression"
    );
    let case = find_node(&unit, code, "case 1 ... 3:", 13);
    assert!(matches!(unit.ast().get_kind(case), NodeKind::CaseStatement { range_end: Some(_), .. }));
    assert_eq!(kind_name(&unit, find_node(&unit, code, "&&done", 6)), "LabelReference");

    let elvis = find_node(&unit, code, "t ?: v", 6);
    assert!(matches!(unit.ast().get_kind(elvis), NodeKind::Conditional { positive: None, .. }));
}

#[test]
fn gnu_extensions_need_the_gnu_dialect() {
    let code = "int h(int v) { return ({ v; }); }\n";
    let strict = parse_with(code, Language::C, false, false);
    assert!(strict.syntax_problem_count() > 0);
    let gnu = parse(code, Language::C);
    assert_eq!(gnu.syntax_problem_count(), 0);
}

#[test]
fn broken_declarations_become_problem_declarations() {
    let code = "int a;\nint b = );\nint c;\n";
    let unit = parse_lenient(code, Language::C);
    assert_eq!(
        declaration_kinds(&unit),
        vec!["SimpleDeclaration", "ProblemDeclaration", "SimpleDeclaration"]
    );
    let problem = unit.declarations()[1];
    assert_eq!(unit.ast().get_kind(problem).problem_id(), Some(ProblemId::SyntaxError));
    assert_eq!(unit.syntax_problem_count(), 1);
}

#[test]
fn broken_statements_become_problem_statements() {
    let code = "void f(void) {\n  int x;\n  x = ;\n  x = 2;\n}\n";
    let unit = parse_lenient(code, Language::C);
    assert_eq!(
        statement_kinds(&unit, 0),
        vec!["DeclarationStatement", "ProblemStatement", "ExpressionStatement"]
    );
    assert_eq!(unit.syntax_problem_count(), 1);
}

#[test]
fn missing_closing_brace_ends_in_a_problem() {
    let unit = parse_lenient("void f(void) {\n  int x;\n", Language::C);
    let statements = body_statements(&unit, 0);
    let last = *statements.last().unwrap();
    assert_eq!(
        unit.ast().get_kind(last).problem_id(),
        Some(ProblemId::UnexpectedEndOfInput)
    );
}

fn problem_ids(unit: &TranslationUnit) -> Vec<ProblemId> {
    unit.syntax_problems()
        .into_iter()
        .filter_map(|p| unit.ast().get_kind(p).problem_id())
        .collect()
}

/// Run `f` on a thread with the stack size of a typical main thread
fn on_main_sized_stack<T: Send + 'static>(f: impl FnOnce() -> T + Send + 'static) -> T {
    std::thread::Builder::new()
        .stack_size(8 << 20)
        .spawn(f)
        .unwrap()
        .join()
        .unwrap()
}

#[test]
fn deeply_nested_parentheses_are_cut_off() {
    let (kinds, problems) = on_main_sized_stack(|| {
        let code = format!("int x = {}1{};\nint after;\n", "(".repeat(300), ")".repeat(300));
        let unit = parse_lenient(&code, Language::C);
        (declaration_kinds(&unit), problem_ids(&unit))
    });
    assert_eq!(kinds, vec!["ProblemDeclaration", "SimpleDeclaration"]);
    assert_eq!(problems, vec![ProblemId::NestingTooDeep]);
}

#[test]
fn deeply_nested_blocks_are_cut_off() {
    let (kinds, problems) = on_main_sized_stack(|| {
        let code = format!("void f(void) {}\n{}\nint after;\n", "{".repeat(300), "}".repeat(300));
        let unit = parse_lenient(&code, Language::C);
        (declaration_kinds(&unit), problem_ids(&unit))
    });
    assert_eq!(kinds, vec!["FunctionDefinition", "SimpleDeclaration"]);
    assert_eq!(problems, vec![ProblemId::NestingTooDeep]);
}

#[test]
fn nesting_limit_is_configurable() {
    let provider = InMemoryFileContentProvider::new();
    let mut config = ParserConfig::new(Language::C, true);
    config.max_nesting_depth = 8;
    let driver = FrontendDriver::new(config, &provider);

    let shallow = driver.parse(TEST_CODE_NAME, "int f(void) { return ((1)); }\n").unwrap();
    assert_eq!(shallow.syntax_problem_count(), 0);

    let deep = driver
        .parse(TEST_CODE_NAME, "int f(void) { return ((((((((((1)))))))))); }\n")
        .unwrap();
    assert_eq!(problem_ids(&deep), vec![ProblemId::NestingTooDeep]);
    assert_eq!(declaration_kinds(&deep), vec!["FunctionDefinition"]);

    let mut config = ParserConfig::new(Language::C, true);
    config.max_nesting_depth = 0;
    assert!(FrontendDriver::new(config, &provider).parse(TEST_CODE_NAME, "int x;\n").is_err());
}
