use crate::ast::TypeKey;
use crate::lang_options::Language;
use crate::semantic::{BindingKind, FunctionKind, ProblemKind};
use crate::tests::test_utils::{
    assert_binding_kind, assert_non_problem, assert_problem, binding_name, find_name, parse, parse_lenient,
};

#[test]
fn locals_shadow_globals() {
    let code = "int x;\nvoid f(void) { x = 1; { int x; x = 2; } x = 3; }\n";
    let unit = parse(code, Language::C);
    let global = assert_binding_kind(&unit, code, "x;\nvoid", 1, BindingKind::Variable);
    assert_eq!(assert_non_problem(&unit, code, "x = 1", 1), global);
    let local = assert_non_problem(&unit, code, "x; x = 2", 1);
    assert_ne!(local, global);
    assert_eq!(assert_non_problem(&unit, code, "x = 2", 1), local);
    assert_eq!(assert_non_problem(&unit, code, "x = 3", 1), global);
}

#[test]
fn tags_and_ordinary_names_live_apart() {
    let code = "struct S { int a; };\nint S;\nstruct S s;\nint g(void) { return s.a + S; }\n";
    let unit = parse(code, Language::C);
    let tag = assert_binding_kind(&unit, code, "S {", 1, BindingKind::Composite(TypeKey::Struct));
    assert_eq!(assert_non_problem(&unit, code, "S s;", 1), tag);
    let variable = assert_binding_kind(&unit, code, "S;\nstruct", 1, BindingKind::Variable);
    assert_eq!(assert_non_problem(&unit, code, "S; }", 1), variable);

    let field = assert_binding_kind(&unit, code, "a; }", 1, BindingKind::Field);
    assert_eq!(assert_non_problem(&unit, code, "a + S", 1), field);
    assert_eq!(unit.resolver().binding(field).and_then(|b| b.owner), Some(tag));
}

#[test]
fn typedefs_enumerators_and_labels() {
    let code = "typedef unsigned long size;\nenum color { RED, GREEN = 4 };\nsize n = GREEN;\n\
                void f(void) { goto done; done: n = RED; }\n";
    let unit = parse(code, Language::C);
    let size = assert_binding_kind(&unit, code, "size;", 4, BindingKind::Typedef);
    assert_eq!(assert_non_problem(&unit, code, "size n", 4), size);
    assert_eq!(unit.resolver().type_of(size).to_string(), "unsigned long");

    let green = assert_binding_kind(&unit, code, "GREEN = 4", 5, BindingKind::Enumerator);
    assert_eq!(assert_non_problem(&unit, code, "GREEN;", 5), green);
    assert_binding_kind(&unit, code, "RED;", 3, BindingKind::Enumerator);

    let label = assert_binding_kind(&unit, code, "done: n", 4, BindingKind::Label);
    assert_eq!(assert_non_problem(&unit, code, "done;", 4), label);
}

#[test]
fn redeclarations_merge_into_one_binding() {
    let code = "extern int counter;\nint counter;\nint counter = 1;\nint twice(int);\nint twice(int v) { return v * 2; }\n";
    let unit = parse(code, Language::C);
    let first = assert_non_problem(&unit, code, "counter;\nint", 7);
    assert_eq!(assert_non_problem(&unit, code, "counter = 1", 7), first);
    assert_eq!(unit.declarations_of(first).len(), 3);
    assert_eq!(unit.resolver().definition(first), Some(find_name(&unit, code, "counter = 1", 7)));

    let twice = assert_binding_kind(&unit, code, "twice(int)", 5, BindingKind::Function(FunctionKind::Free));
    assert_eq!(assert_non_problem(&unit, code, "twice(int v", 5), twice);
    assert_eq!(unit.resolver().type_of(twice).to_string(), "int (int)");
}

#[test]
fn unresolved_names_become_problem_bindings() {
    let code = "struct P { int x; } p;\nint f(void) { goto nowhere; return missing + p.y; }\n";
    let unit = parse_lenient(code, Language::C);
    assert_eq!(unit.syntax_problem_count(), 0);
    assert_problem(&unit, code, "missing", 7, ProblemKind::NameNotFound);
    assert_problem(&unit, code, "nowhere", 7, ProblemKind::LabelNotFound);
    assert_problem(&unit, code, "y;", 1, ProblemKind::MemberNotFound);
    assert_eq!(unit.binding_problem_count(), 3);

    // problems are cached like any other binding
    let name = find_name(&unit, code, "missing", 7);
    assert_eq!(unit.resolve_binding(name), unit.resolve_binding(name));
    assert_eq!(binding_name(&unit, unit.resolve_binding(name)), "missing");
}

#[test]
fn builtins_and_function_name_identifiers() {
    let code = "void log_it(const char *);\nvoid f(int n, ...) {\n  __builtin_va_list ap;\n  __builtin_va_start(ap, n);\n  log_it(__func__);\n  __builtin_va_end(ap);\n}\n";
    let unit = parse(code, Language::C);
    assert_binding_kind(&unit, code, "__builtin_va_list", 17, BindingKind::Builtin);
    assert_binding_kind(&unit, code, "__builtin_va_start", 18, BindingKind::Builtin);
    assert_binding_kind(&unit, code, "__func__", 8, BindingKind::Builtin);
}

#[test]
fn references_and_declarations_of_a_binding() {
    let code = "int total;\nvoid add(int v) { total = total + v; }\nint get(void) { return total; }\n";
    let unit = parse(code, Language::C);
    let total = assert_non_problem(&unit, code, "total;", 5);
    assert_eq!(unit.declarations_of(total), vec![find_name(&unit, code, "total;", 5)]);
    assert_eq!(unit.references_of(total).len(), 3);
}

#[test]
fn macros_are_bindings_too() {
    let code = "#define LIMIT 10\nint a[LIMIT];\n";
    let unit = parse(code, Language::C);
    let (id, definition) = unit.macro_definitions()[0];
    assert_eq!(definition.name.as_str(), "LIMIT");
    let binding = unit.resolver().macro_binding(id).unwrap();
    assert_eq!(unit.resolver().binding_kind(binding), Some(BindingKind::Macro));
    assert_eq!(binding_name(&unit, binding), "LIMIT");
}

#[test]
fn binding_kinds_of_each_declared_name() {
    let code = "struct P { int x; };\nenum E { RED };\ntypedef struct P Point;\nint count;\n\
                int area(Point *p) { done: return p->x * count + RED; }\n";
    let unit = parse(code, Language::C);
    let kinds: Vec<BindingKind> = [
        ("P {", 1),
        ("x;", 1),
        ("E {", 1),
        ("RED }", 3),
        ("Point;", 5),
        ("count;", 5),
        ("area", 4),
        ("p)", 1),
        ("done", 4),
    ]
    .into_iter()
    .filter_map(|(section, len)| {
        let binding = assert_non_problem(&unit, code, section, len);
        unit.resolver().binding_kind(binding)
    })
    .collect();
    insta::assert_yaml_snapshot!(kinds, @r"
    - Composite: Struct
    - Field
    - Enumeration
    - Enumerator
    - Typedef
    - Variable
    - Function: Free
    - Parameter
    - Label
    ");
}
