use crate::ast::signature::function_declarator;
use crate::ast::visitor::NameCollector;
use crate::ast::{DeclaratorData, DeclaratorSuffix, NodeKind, NodeRef, ProblemId};
use crate::lang_options::Language;
use crate::semantic::BindingKind;
use crate::tests::test_utils::{assert_binding_kind, declaration_kinds, kind_name, parse, parse_lenient};
use crate::translation_unit::TranslationUnit;

fn names_called(unit: &TranslationUnit, root: NodeRef, text: &str) -> Vec<NodeRef> {
    NameCollector::collect(unit.ast(), root)
        .into_iter()
        .filter(|n| matches!(unit.ast().get_kind(*n), NodeKind::Name(s) if s.as_str() == text))
        .collect()
}

/// Parameter declarations stored on the K&R declarator of a definition
fn knr_parameter_declarations(unit: &TranslationUnit, definition: NodeRef) -> Vec<NodeRef> {
    let NodeKind::FunctionDefinition { declarator, body, .. } = unit.ast().get_kind(definition) else {
        panic!("not a function definition: {}", kind_name(unit, definition));
    };
    assert!(body.is_some());
    let function = function_declarator(unit.ast(), *declarator).expect("function declarator");
    match unit.ast().get_kind(function) {
        NodeKind::Declarator(DeclaratorData {
            suffix: DeclaratorSuffix::KnRFunction {
                parameter_declarations, ..
            },
            ..
        }) => parameter_declarations.to_vec(),
        other => panic!("not a K&R declarator: {}", other.name()),
    }
}

#[test]
fn parameter_occurrences_share_one_binding() {
    let code = "int f(char x);\nint f(x) char x;\n{ return x == 0; }\n";
    let unit = parse(code, Language::C);
    let declarations = unit.declarations();
    assert_eq!(declarations.len(), 2);

    let in_definition = names_called(&unit, declarations[1], "x");
    assert_eq!(in_definition.len(), 3);
    let bindings: Vec<_> = in_definition.iter().map(|n| unit.resolve_binding(*n)).collect();
    assert!(bindings.iter().all(|b| *b == bindings[0]));
    assert_eq!(unit.resolver().binding_kind(bindings[0]), Some(BindingKind::Parameter));

    // the prototype's parameter is the same entity, by position
    let in_prototype = names_called(&unit, declarations[0], "x");
    assert_eq!(in_prototype.len(), 1);
    assert_eq!(unit.resolve_binding(in_prototype[0]), bindings[0]);
}

#[test]
fn several_parameters_declared_in_any_order() {
    let code = "int g(a, b, c) int c; char *b; long a; { return a + c; }\n";
    let unit = parse(code, Language::C);
    let a = assert_binding_kind(&unit, code, "a, b", 1, BindingKind::Parameter);
    let c = assert_binding_kind(&unit, code, "c) int", 1, BindingKind::Parameter);
    assert_eq!(assert_binding_kind(&unit, code, "a;", 1, BindingKind::Parameter), a);
    assert_eq!(assert_binding_kind(&unit, code, "c; char", 1, BindingKind::Parameter), c);
    assert_eq!(assert_binding_kind(&unit, code, "a + c", 1, BindingKind::Parameter), a);
    assert_eq!(assert_binding_kind(&unit, code, "c; }", 1, BindingKind::Parameter), c);
    assert_eq!(unit.resolver().type_of(c).to_string(), "int");
    let b = assert_binding_kind(&unit, code, "b, c", 1, BindingKind::Parameter);
    assert_eq!(unit.resolver().type_of(b).to_string(), "char *");
}

#[test]
fn undeclared_parameter_defaults_to_int() {
    let code = "int h(p) { return p; }\n";
    let unit = parse(code, Language::C);
    let p = assert_binding_kind(&unit, code, "p)", 1, BindingKind::Parameter);
    assert_eq!(assert_binding_kind(&unit, code, "p;", 1, BindingKind::Parameter), p);
}

#[test]
fn declaration_of_unlisted_name_is_a_problem() {
    let code = "int f(x) char x; int y; { return x; }\n";
    let unit = parse_lenient(code, Language::C);
    let problems: Vec<_> = unit
        .syntax_problems()
        .into_iter()
        .filter_map(|p| unit.ast().get_kind(p).problem_id())
        .collect();
    assert_eq!(problems, vec![ProblemId::ParameterNotInList]);

    let definition = unit.declarations()[0];
    let xs = names_called(&unit, definition, "x");
    assert_eq!(xs.len(), 3);
    let first = unit.resolve_binding(xs[0]);
    assert!(xs.iter().all(|x| unit.resolve_binding(*x) == first));
}

#[test]
fn incomplete_parameter_declaration_keeps_the_body() {
    let code = "int f(x) char\n{ return x == 0; }\n";
    let unit = parse_lenient(code, Language::C);
    assert_eq!(declaration_kinds(&unit), vec!["FunctionDefinition"]);
    let declarations = knr_parameter_declarations(&unit, unit.declarations()[0]);
    assert_eq!(declarations.len(), 1);
    assert_eq!(
        unit.ast().get_kind(declarations[0]).problem_id(),
        Some(ProblemId::SyntaxError)
    );
    assert_eq!(unit.syntax_problem_count(), 1);
    assert_eq!(names_called(&unit, unit.declarations()[0], "x").len(), 2);
}

#[test]
fn expression_before_the_body_is_a_parameter_problem() {
    let code = "int i=0;\nint f(x) i++;\n{ return x == 0; }\n";
    let unit = parse_lenient(code, Language::C);
    assert_eq!(declaration_kinds(&unit), vec!["SimpleDeclaration", "FunctionDefinition"]);
    let declarations = knr_parameter_declarations(&unit, unit.declarations()[1]);
    assert_eq!(declarations.len(), 1);
    assert!(unit.ast().get_kind(declarations[0]).problem_id().is_some());
    assert_eq!(
        assert_binding_kind(&unit, code, "x == 0", 1, BindingKind::Parameter),
        assert_binding_kind(&unit, code, "x) i++", 1, BindingKind::Parameter)
    );
}
