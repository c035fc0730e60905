use crate::lang_options::Language;
use crate::semantic::BindingKind;
use crate::tests::test_utils::{
    binding_name, find_node, is_id_expression, kind_name, offset_of, parse, parse_both, parse_lenient,
};

#[test]
fn assignment_target_is_an_id_expression() {
    let code = "void f() { int x; x=3; }";
    for unit in parse_both(code) {
        let node = find_node(&unit, code, "x=", 1);
        assert!(is_id_expression(&unit, node), "found {}", kind_name(&unit, node));

        let crate::ast::NodeKind::IdExpression { name } = unit.ast().get_kind(node) else {
            unreachable!();
        };
        let binding = unit.resolve_binding(*name);
        assert_eq!(unit.resolver().binding_kind(binding), Some(BindingKind::Variable));
        assert_eq!(binding_name(&unit, binding), "x");
    }
}

#[test]
fn exact_spans_select_the_spanning_node() {
    let code = "int a = 1 + 2;\nint main() { return a; }\n";
    let unit = parse(code, Language::C);
    assert_eq!(kind_name(&unit, find_node(&unit, code, "1 + 2", 5)), "Binary");
    assert_eq!(kind_name(&unit, find_node(&unit, code, "return a;", 9)), "ReturnStatement");
    assert_eq!(kind_name(&unit, find_node(&unit, code, "{ return", 13)), "CompoundStatement");
    assert_eq!(kind_name(&unit, find_node(&unit, code, "int a", 14)), "SimpleDeclaration");
}

#[test]
fn selections_crossing_siblings_find_nothing() {
    let code = "int a = 1 + 2;\n";
    let unit = parse(code, Language::C);
    let selector = unit.node_selector();
    let offset = offset_of(code, "1 +");
    assert!(selector.find_node(offset, 2).is_none());
    assert!(selector.find_node(offset + 1, 3).is_none());
    assert!(selector.find_name(offset, 1).is_none());
}

#[test]
fn enclosing_node_is_the_smallest_container() {
    let code = "int f(int p) { return p * 2; }\n";
    let unit = parse(code, Language::C);
    let selector = unit.node_selector();
    let offset = offset_of(code, "* 2");
    let enclosing = selector.find_enclosing_node(offset, 1).unwrap();
    assert_eq!(kind_name(&unit, enclosing), "Binary");

    let name = selector.find_enclosing_name(offset_of(code, "p *"), 1).unwrap();
    assert_eq!(kind_name(&unit, name), "Name");
}

#[test]
fn nodes_from_macros_and_includes_are_skipped() {
    let code = "#define ZERO 0\nint z = ZERO;\n";
    let unit = parse(code, Language::C);
    let selector = unit.node_selector();
    // the literal comes from the expansion and carries the invocation span
    let literal = selector.find_node(offset_of(code, "ZERO;"), 4);
    assert!(literal.is_some());
    assert!(selector.find_node(offset_of(code, "0\n"), 1).is_none());
}

#[test]
fn problem_regions_select_the_problem_node() {
    let code = "int a;\nint b = ) ;\nint c;\n";
    let unit = parse_lenient(code, Language::C);
    assert_eq!(unit.syntax_problem_count(), 1);
    let selector = unit.node_selector();
    assert!(selector.find_node(offset_of(code, "int c;"), 6).is_some());
    let problem = selector.find_node(offset_of(code, "int b"), 11).unwrap();
    assert_eq!(kind_name(&unit, problem), "ProblemDeclaration");
}
