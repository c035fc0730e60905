use crate::ast::TypeKey;
use crate::lang_options::Language;
use crate::semantic::{BindingKind, FunctionKind, ProblemKind};
use crate::tests::test_utils::{
    assert_binding_kind, assert_non_problem, assert_problem, binding_name, find_name, parse, parse_lenient,
};

#[test]
fn qualified_names_and_reopened_namespaces() {
    let code = "namespace outer { namespace inner { int v; } }\nnamespace outer { int w = inner::v; }\n\
                int x = outer::inner::v + ::outer::w;\n";
    let unit = parse(code, Language::Cpp);
    let outer = assert_binding_kind(&unit, code, "outer {", 5, BindingKind::Namespace);
    assert_eq!(assert_non_problem(&unit, code, "outer { int w", 5), outer);

    let v = assert_binding_kind(&unit, code, "v; }", 1, BindingKind::Variable);
    assert_eq!(assert_non_problem(&unit, code, "v; }\nint", 1), v);
    assert_eq!(assert_non_problem(&unit, code, "v + ::", 1), v);
    let w = assert_non_problem(&unit, code, "w = inner", 1);
    assert_eq!(assert_non_problem(&unit, code, "w;\n", 1), w);
    assert_eq!(assert_non_problem(&unit, code, "outer::inner::v", 5), outer);
}

#[test]
fn using_directives_are_transitive() {
    let code = "namespace a { int deep; }\nnamespace b { using namespace a; }\nnamespace c { using namespace b; }\n\
                using namespace c;\nint use = deep;\n";
    let unit = parse(code, Language::Cpp);
    let deep = assert_non_problem(&unit, code, "deep; }", 4);
    assert_eq!(assert_non_problem(&unit, code, "deep;\n", 4), deep);
}

#[test]
fn names_from_two_nominated_namespaces_are_ambiguous() {
    let code = "namespace a { int n; }\nnamespace b { int n; }\nusing namespace a;\nusing namespace b;\nint use = n;\n";
    let unit = parse_lenient(code, Language::Cpp);
    assert_problem(&unit, code, "n;\n", 1, ProblemKind::AmbiguousLookup);
}

#[test]
fn unnamed_namespace_and_namespace_alias() {
    let code = "namespace { int hidden; }\nnamespace very { namespace long_name { int item; } }\n\
                namespace vl = very::long_name;\nint a = hidden + vl::item;\n";
    let unit = parse(code, Language::Cpp);
    let hidden = assert_non_problem(&unit, code, "hidden;", 6);
    assert_eq!(assert_non_problem(&unit, code, "hidden +", 6), hidden);

    let alias = assert_binding_kind(&unit, code, "vl =", 2, BindingKind::NamespaceAlias);
    assert_eq!(assert_non_problem(&unit, code, "vl::item", 2), alias);
    let item = assert_non_problem(&unit, code, "item;", 4);
    assert_eq!(assert_non_problem(&unit, code, "item;\n", 4), item);
}

#[test]
fn members_methods_and_out_of_line_definitions() {
    let code = "struct Counter {\n  Counter(int start);\n  int next();\n  int value;\n};\n\
                Counter::Counter(int start) : value(start) {}\n\
                int Counter::next() { return value++; }\n\
                int run(Counter &c) { return c.next() + c.value; }\n";
    let unit = parse(code, Language::Cpp);
    let class = assert_binding_kind(&unit, code, "Counter {", 7, BindingKind::Composite(TypeKey::Struct));
    assert_eq!(assert_non_problem(&unit, code, "Counter &c", 7), class);

    let constructor = assert_binding_kind(
        &unit,
        code,
        "Counter(int start);",
        7,
        BindingKind::Function(FunctionKind::Constructor),
    );
    assert_eq!(assert_non_problem(&unit, code, "Counter(int start) :", 7), constructor);

    let next = assert_binding_kind(&unit, code, "next();", 4, BindingKind::Function(FunctionKind::Method));
    assert_eq!(assert_non_problem(&unit, code, "next() {", 4), next);
    assert_eq!(assert_non_problem(&unit, code, "next() +", 4), next);
    assert_eq!(unit.resolver().binding(next).and_then(|b| b.owner), Some(class));

    let value = assert_binding_kind(&unit, code, "value;", 5, BindingKind::Field);
    assert_eq!(assert_non_problem(&unit, code, "value(start)", 5), value);
    assert_eq!(assert_non_problem(&unit, code, "value++", 5), value);
    assert_eq!(assert_non_problem(&unit, code, "value; }", 5), value);
}

#[test]
fn base_class_members_are_inherited() {
    let code = "struct Base { int shared; };\nstruct Derived : Base { int get() { return shared; } };\n\
                int f(Derived d) { return d.shared; }\n";
    let unit = parse(code, Language::Cpp);
    let shared = assert_binding_kind(&unit, code, "shared; }", 6, BindingKind::Field);
    assert_eq!(assert_non_problem(&unit, code, "shared; } }", 6), shared);
    assert_eq!(assert_non_problem(&unit, code, "shared; }\n", 6), shared);
    let base = assert_non_problem(&unit, code, "Base {", 4);
    assert_eq!(assert_non_problem(&unit, code, "Base { int get", 4), base);
}

#[test]
fn overloads_are_chosen_by_argument_types() {
    let code = "void show(int);\nvoid show(double);\nvoid show(const char *, int);\n\
                void f() { show(1); show(2.5); show(\"x\", 3); }\n";
    let unit = parse(code, Language::Cpp);
    let by_int = assert_non_problem(&unit, code, "show(int)", 4);
    let by_double = assert_non_problem(&unit, code, "show(double)", 4);
    let by_pair = assert_non_problem(&unit, code, "show(const", 4);
    assert_ne!(by_int, by_double);

    assert_eq!(assert_non_problem(&unit, code, "show(1)", 4), by_int);
    assert_eq!(assert_non_problem(&unit, code, "show(2.5)", 4), by_double);
    assert_eq!(assert_non_problem(&unit, code, "show(\"x\"", 4), by_pair);
}

#[test]
fn class_templates_and_their_instances() {
    let code = "template <typename T> struct Box { T item; };\n\
                Box<int> first;\nBox<int> second;\nBox<char> third;\n\
                int get() { return first.item; }\n";
    let unit = parse(code, Language::Cpp);
    let template = assert_binding_kind(&unit, code, "Box {", 3, BindingKind::ClassTemplate(TypeKey::Struct));
    let parameter = assert_binding_kind(&unit, code, "T>", 1, BindingKind::TemplateParameter);
    assert_eq!(assert_non_problem(&unit, code, "T item", 1), parameter);
    assert_eq!(assert_non_problem(&unit, code, "Box<int> first", 3), template);

    let first = unit.resolve_binding(find_name(&unit, code, "Box<int> first", 8));
    let second = unit.resolve_binding(find_name(&unit, code, "Box<int> second", 8));
    let third = unit.resolve_binding(find_name(&unit, code, "Box<char>", 9));
    assert_eq!(unit.resolver().binding_kind(first), Some(BindingKind::TemplateInstance));
    assert_eq!(first, second);
    assert_ne!(first, third);
    assert_eq!(binding_name(&unit, first), "Box");

    let item = assert_non_problem(&unit, code, "item; }", 4);
    assert_eq!(assert_non_problem(&unit, code, "item; }\n", 4), item);
}

#[test]
fn function_templates_and_dependent_names() {
    let code = "template <typename T> T twice(T v) { return v + v; }\n\
                template <typename C> int size_of(C c) { return C::extent + c.length; }\n\
                int a = twice(2);\n";
    let unit = parse(code, Language::Cpp);
    let twice = assert_binding_kind(&unit, code, "twice(T", 5, BindingKind::FunctionTemplate);
    assert_eq!(assert_non_problem(&unit, code, "twice(2)", 5), twice);

    let c = assert_binding_kind(&unit, code, "C>", 1, BindingKind::TemplateParameter);
    assert_eq!(assert_non_problem(&unit, code, "extent", 6), c);
    assert_eq!(assert_non_problem(&unit, code, "length", 6), c);
}

#[test]
fn class_scope_sees_later_members() {
    let code = "class Widget {\npublic:\n  int area() { return w * h; }\nprivate:\n  int w, h;\n};\n";
    let unit = parse(code, Language::Cpp);
    let w = assert_binding_kind(&unit, code, "w, h", 1, BindingKind::Field);
    assert_eq!(assert_non_problem(&unit, code, "w * h", 1), w);
    assert_binding_kind(&unit, code, "Widget", 6, BindingKind::Composite(TypeKey::Class));
}

#[test]
fn missing_qualifier_is_a_bad_scope() {
    let code = "int v = nowhere::thing;\n";
    let unit = parse_lenient(code, Language::Cpp);
    assert_problem(&unit, code, "nowhere", 7, ProblemKind::NameNotFound);
    assert_problem(&unit, code, "thing", 5, ProblemKind::BadScope);
}
