use serde::Serialize;

use crate::ast::NodeKind;
use crate::lang_options::Language;
use crate::location_map::NodeLocation;
use crate::pp::PPProblemKind;
use crate::tests::test_utils::{find_name, parse, parse_lenient};
use crate::translation_unit::TranslationUnit;

/// Location list entry with file text and expansion names spelled out
#[derive(Debug, Serialize)]
enum LocationView {
    File(String),
    Macro { name: String, offset: u32, length: u32 },
}

fn location_views(unit: &TranslationUnit, locations: &[NodeLocation]) -> Vec<LocationView> {
    locations
        .iter()
        .map(|location| match *location {
            NodeLocation::File(_) => LocationView::File(file_text(unit, location)),
            NodeLocation::Macro {
                expansion,
                offset,
                length,
            } => LocationView::Macro {
                name: unit
                    .location_map()
                    .expansion(expansion)
                    .map(|record| record.name.as_str().to_string())
                    .unwrap_or_default(),
                offset,
                length,
            },
        })
        .collect()
}

fn file_text(unit: &TranslationUnit, location: &NodeLocation) -> String {
    match location {
        NodeLocation::File(span) => unit.source_manager().get_source_text(*span).unwrap_or_default().to_string(),
        NodeLocation::Macro { .. } => panic!("expected a file location, found {location:?}"),
    }
}

#[test]
fn nested_expansion_inside_a_declaration() {
    let code = "#define PO *\n#define XYZ const\n#define C_PO PO XYZ\nint C_PO var;\n";
    let unit = parse(code, Language::C);
    let declaration = unit.declarations()[0];

    let locations = unit.node_locations(declaration);
    assert_eq!(locations.len(), 3, "{locations:?}");
    assert_eq!(file_text(&unit, &locations[0]), "int ");
    assert_eq!(file_text(&unit, &locations[2]), " var;");

    let NodeLocation::Macro {
        expansion,
        offset,
        length,
    } = locations[1]
    else {
        panic!("expected a macro location, found {:?}", locations[1]);
    };
    assert_eq!((offset, length), (0, 2));

    let map = unit.location_map();
    let c_po = unit
        .macro_definitions()
        .into_iter()
        .find(|(_, d)| d.name.as_str() == "C_PO")
        .map(|(_, d)| d.clone())
        .unwrap();
    assert_eq!(map.expansion_definition(expansion), Some(&c_po));
    assert_eq!(c_po.expansion, "PO XYZ");

    let invocation = map.closest_file_location(&locations[1]).unwrap();
    assert_eq!(unit.source_manager().get_source_text(invocation), Some("C_PO"));
}

#[test]
fn expansion_chain_leads_back_to_the_file() {
    let code = "#define INNER 1\n#define OUTER (INNER + 2)\nint v = OUTER;\n";
    let unit = parse(code, Language::C);
    let map = unit.location_map();
    let outer = unit
        .tokens()
        .iter()
        .filter_map(|t| t.expansion)
        .find(|e| map.expansion_definition(e.outer).is_some_and(|d| d.name.as_str() == "OUTER"))
        .unwrap();
    let innermost = unit
        .tokens()
        .iter()
        .filter_map(|t| t.expansion)
        .find(|e| e.inner != e.outer)
        .map(|e| e.inner)
        .unwrap();
    let chain = map.expansion_chain(innermost);
    assert_eq!(chain.len(), 2);
    assert_eq!(chain.last(), Some(&outer.outer));
    assert_eq!(map.expansion_definition(innermost).map(|d| d.name.as_str()), Some("INNER"));
}

#[test]
fn names_from_macro_arguments_resolve() {
    let code = "#define ID(x) x\nint value;\nint copy = ID(value);\n";
    let unit = parse(code, Language::C);
    let declared = find_name(&unit, code, "value;", 5);
    let definition = unit.resolve_binding(declared);
    // the argument is reported at the invocation
    let used = find_name(&unit, code, "ID(value)", 9);
    assert_eq!(unit.resolve_binding(used), definition);
}

#[test]
fn object_like_and_function_like_definitions() {
    let code = "#define A 1\n#define MAX(a, b) ((a) > (b) ? (a) : (b))\n#define V(fmt, args...) fmt\n";
    let unit = parse(code, Language::C);
    let signatures: Vec<String> = unit.macro_definitions().into_iter().map(|(_, d)| d.signature()).collect();
    insta::assert_snapshot!(signatures.join("\n"), @r"
    A=1
    MAX(a,b)=((a) > (b) ? (a) : (b))
    V(fmt,args...)=fmt
    ");
}

#[test]
fn location_list_of_a_statement_with_two_expansions() {
    let code = "#define ONE 1\n#define TWICE(x) ((x) * 2)\nint f(int k) { return TWICE(k) + ONE; }\n";
    let unit = parse(code, Language::C);
    let NodeKind::FunctionDefinition { body: Some(body), .. } = unit.ast().get_kind(unit.declarations()[0]) else {
        panic!("not a function definition");
    };
    let NodeKind::CompoundStatement { statements } = unit.ast().get_kind(*body) else {
        panic!("not a compound statement");
    };
    let locations = unit.node_locations(statements[0]);
    insta::assert_yaml_snapshot!(location_views(&unit, &locations), @r#"
    - File: "return "
    - Macro:
        name: TWICE
        offset: 0
        length: 7
    - File: " + "
    - Macro:
        name: ONE
        offset: 0
        length: 1
    - File: ;
    "#);
}

#[test]
fn malformed_invocations_are_preprocessor_problems() {
    let code = "#define PAIR(a, b) a + b\nint one = PAIR(1);\nint open = PAIR(1, 2\n";
    let unit = parse_lenient(code, Language::C);
    let kinds: Vec<PPProblemKind> = unit.preprocessor_problems().iter().map(|p| p.kind).collect();
    insta::assert_yaml_snapshot!(kinds, @r"
    - MacroArgumentMismatch
    - UnterminatedMacroInvocation
    ");
    assert!(unit.preprocessor_problems().iter().all(|p| p.argument == "PAIR"));
    assert_eq!(unit.preprocessor_problem_count(), 2);
}
