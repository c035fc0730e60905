use crate::ast::{CaptureDefault, NodeKind};
use crate::lang_options::Language;
use crate::semantic::{BindingKind, FunctionKind};
use crate::tests::test_utils::{
    assert_binding_kind, assert_non_problem, declaration_kinds, find_name, find_node, kind_name, parse, parse_lenient,
};

#[test]
fn nested_template_arguments_split_the_shift() {
    let code = "template <typename T> struct Box { T value; };\nBox<Box<int>> nested;\nbool less = 1 >> 2 > 0;\n";
    let unit = parse(code, Language::Cpp);
    let outer = find_name(&unit, code, "Box<Box<int>>", 13);
    let NodeKind::TemplateId { arguments, .. } = unit.ast().get_kind(outer) else {
        panic!("outer is {}", kind_name(&unit, outer));
    };
    assert_eq!(arguments.len(), 1);
    assert_eq!(kind_name(&unit, find_name(&unit, code, "Box<int>", 8)), "TemplateId");

    // outside of template arguments `>>` stays a shift
    assert_eq!(kind_name(&unit, find_node(&unit, code, "1 >> 2", 6)), "Binary");
}

#[test]
fn range_for_if_with_init_and_lambdas() {
    let code = "int sum() {\n  int values[3] = { 1, 2, 3 };\n  int total = 0;\n  for (int v : values) total += v;\n\
                if (int doubled = total * 2; doubled > 10) return doubled;\n\
                auto twice = [&total](int k) { return total * k; };\n  return twice(2);\n}\n";
    let unit = parse(code, Language::Cpp);
    assert_eq!(
        kind_name(&unit, find_node(&unit, code, "for (int v : values) total += v;", 32)),
        "RangeBasedForStatement"
    );

    let if_statement = find_node(&unit, code, "if (int doubled", 58);
    assert!(
        matches!(unit.ast().get_kind(if_statement), NodeKind::IfStatement { init: Some(_), constexpr: false, .. }),
        "got {}",
        kind_name(&unit, if_statement)
    );

    let lambda = find_node(&unit, code, "[&total](int k) { return total * k; }", 37);
    let NodeKind::Lambda {
        default_capture,
        captures,
        declarator,
        ..
    } = unit.ast().get_kind(lambda)
    else {
        panic!("not a lambda: {}", kind_name(&unit, lambda));
    };
    assert_eq!(*default_capture, CaptureDefault::None);
    assert_eq!(captures.len(), 1);
    assert!(declarator.is_some());
    assert!(matches!(
        unit.ast().get_kind(captures[0]),
        NodeKind::Capture { by_reference: true, name: Some(_) }
    ));
}

#[test]
fn if_constexpr_and_exception_handling() {
    let code = "void f() {\n  if constexpr (sizeof(int) == 4) {}\n\
                try { throw 1; } catch (int e) { } catch (...) { }\n}\n";
    let unit = parse(code, Language::Cpp);
    let if_statement = find_node(&unit, code, "if constexpr", 34);
    assert!(matches!(
        unit.ast().get_kind(if_statement),
        NodeKind::IfStatement { constexpr: true, .. }
    ));
    let try_block = find_node(&unit, code, "try {", 50);
    let NodeKind::TryBlockStatement { handlers, .. } = unit.ast().get_kind(try_block) else {
        panic!("not a try block: {}", kind_name(&unit, try_block));
    };
    assert_eq!(handlers.len(), 2);
}

#[test]
fn attributes_are_kept_on_the_tree() {
    let code = "[[nodiscard]] int answer();\n[[gnu::always_inline]] inline int fast() { return 1; }\n";
    let unit = parse(code, Language::Cpp);
    let nodiscard = find_node(&unit, code, "nodiscard", 9);
    assert!(matches!(
        unit.ast().get_kind(nodiscard),
        NodeKind::Attribute { scope: None, arguments: None, .. }
    ));
    let scoped = find_node(&unit, code, "gnu::always_inline", 18);
    let NodeKind::Attribute { name, scope, .. } = unit.ast().get_kind(scoped) else {
        panic!("not an attribute: {}", kind_name(&unit, scoped));
    };
    assert_eq!(name.as_str(), "always_inline");
    assert_eq!(scope.map(|s| s.as_str()), Some("gnu"));
}

#[test]
fn cpp_declaration_forms() {
    let code = "namespace ns { int inner; }\nnamespace alias = ns;\nusing namespace ns;\nusing ns::inner;\n\
                using Int = int;\nextern \"C\" { int c_function(void); }\nstatic_assert(sizeof(int) >= 2, \"int\");\n";
    let unit = parse(code, Language::Cpp);
    assert_eq!(
        declaration_kinds(&unit),
        vec![
            "NamespaceDefinition",
            "NamespaceAlias",
            "UsingDirective",
            "UsingDeclaration",
            "AliasDeclaration",
            "LinkageSpecification",
            "StaticAssertDeclaration",
        ]
    );
}

#[test]
fn broken_member_is_recovered() {
    let code = "struct S {\n  int ok;\n  int broken = ;\n  int fine;\n};\nint after;\n";
    let unit = parse_lenient(code, Language::Cpp);
    assert_eq!(declaration_kinds(&unit), vec!["SimpleDeclaration", "SimpleDeclaration"]);
    assert_eq!(unit.syntax_problem_count(), 1);
    assert_eq!(unit.binding_problem_count(), 0);
}

#[test]
fn out_of_class_conversion_functions() {
    let code = "struct S {\n  operator int();\n};\nS::operator int() { return 0; }\n\
                namespace N { struct T { operator bool() const; }; }\nN::T::operator bool() const { return true; }\n";
    let unit = parse(code, Language::Cpp);
    assert_eq!(
        declaration_kinds(&unit),
        vec!["SimpleDeclaration", "FunctionDefinition", "NamespaceDefinition", "FunctionDefinition"]
    );

    let declared = assert_binding_kind(
        &unit,
        code,
        "operator int();",
        12,
        BindingKind::Function(FunctionKind::Conversion),
    );
    assert_eq!(assert_non_problem(&unit, code, "operator int() {", 12), declared);

    let nested = assert_binding_kind(
        &unit,
        code,
        "operator bool() const;",
        13,
        BindingKind::Function(FunctionKind::Conversion),
    );
    assert_eq!(assert_non_problem(&unit, code, "operator bool() const {", 13), nested);
}
