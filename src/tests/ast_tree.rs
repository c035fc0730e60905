use crate::ast::dumper::AstDumper;
use crate::ast::visitor::{self, AstVisitor, VisitAction, VisitFlags};
use crate::ast::{Ast, AstError, NodeKind, NodeRef};
use crate::lang_options::Language;
use crate::tests::test_utils::{parse, parse_both, parse_lenient};

#[test]
fn copies_are_equal_and_unfrozen() {
    let code = "struct S { int a; } s;\nint f(int *p) { return p[0] + s.a; }\n";
    for unit in parse_both(code) {
        let ast = unit.ast();
        assert!(ast.is_frozen());
        let copy = ast.copy();
        assert!(!copy.is_frozen());
        assert_eq!(ast.compare(&copy), Ok(()));
        assert_eq!(copy.len(), ast.len());
    }
}

#[test]
fn frozen_tree_rejects_mutation() {
    let unit = parse("int x;", Language::C);
    let mut ast: Ast = unit.ast().copy();
    let root = ast.root().unwrap();
    ast.freeze();
    assert_eq!(
        ast.replace_kind(root, NodeKind::TranslationUnit { declarations: Default::default() }),
        Err(AstError::Frozen)
    );

    // the copy of a frozen tree can be changed again
    let mut copy = ast.copy();
    assert!(copy.replace_kind(root, NodeKind::TranslationUnit { declarations: Default::default() }).is_ok());
    assert!(ast.compare(&copy).is_err());
}

#[test]
fn subtree_copy_keeps_the_structure() {
    let code = "int a;\nint f(void) { return a; }\n";
    let unit = parse(code, Language::C);
    let function = unit.declarations()[1];
    let copy = unit.ast().copy_subtree(function).unwrap();
    let root = copy.root().unwrap();
    assert_eq!(copy.get_kind(root).name(), "FunctionDefinition");
    assert_eq!(copy.parent(root), None);
    assert_eq!(copy.descendants(root).len(), unit.ast().descendants(function).len());
    assert_eq!(
        AstDumper::dump_subtree(&copy, root),
        AstDumper::dump_subtree(unit.ast(), function)
    );
}

#[test]
fn attributes_are_children_of_the_decorated_node() {
    let code = "int x __attribute__((unused, aligned(8)));\n";
    let unit = parse(code, Language::C);
    let ast = unit.ast();
    let specifiers: Vec<NodeRef> = ast
        .iter()
        .filter(|(_, n)| matches!(n.kind, NodeKind::AttributeSpecifier { .. }))
        .map(|(r, _)| r)
        .collect();
    assert_eq!(specifiers.len(), 1);
    let owner = ast.parent(specifiers[0]).unwrap();
    assert!(ast.attributes(owner).contains(&specifiers[0]));
    for attribute in ast.children(specifiers[0]) {
        assert_eq!(ast.parent(attribute), Some(specifiers[0]));
    }
    let names: Vec<String> = ast
        .children(specifiers[0])
        .into_iter()
        .filter_map(|a| match ast.get_kind(a) {
            NodeKind::Attribute { name, arguments, .. } => Some(match arguments {
                Some(arguments) => format!("{name}({arguments})"),
                None => name.to_string(),
            }),
            _ => None,
        })
        .collect();
    assert_eq!(names, vec!["unused", "aligned(8)"]);
}

#[test]
fn every_child_points_back_to_its_parent() {
    let code = "typedef struct { int v[4]; } T;\nT t = { .v = { [1] = 2 } };\nint main(void) { for (int i = 0; i < 4; i++) t.v[i]++; }\n";
    let unit = parse_lenient(code, Language::C);
    let ast = unit.ast();
    let root = ast.root().unwrap();
    for node in ast.descendants(root) {
        for child in ast.children(node) {
            assert_eq!(ast.parent(child), Some(node));
        }
    }
}

#[test]
fn dump_of_a_small_unit() {
    let unit = parse("int x = 1;\nint *p;\n", Language::C);
    insta::assert_snapshot!(AstDumper::dump(unit.ast()), @r"
    TranslationUnit
      SimpleDeclaration
        SimpleDeclSpecifier Int
        Declarator
          Name 'x'
          EqualsInitializer
            Literal Integer 1
      SimpleDeclaration
        SimpleDeclSpecifier Int
        Declarator
          Pointer
          Name 'p'
    ");
}

#[derive(Default)]
struct Counter {
    flags: VisitFlags,
    names: usize,
    statements: usize,
    attributes: usize,
    problems: usize,
    stop_at_first_statement: bool,
}

impl AstVisitor for Counter {
    fn flags(&self) -> VisitFlags {
        self.flags
    }

    fn visit_name(&mut self, _ast: &Ast, _node: NodeRef) -> VisitAction {
        self.names += 1;
        VisitAction::Continue
    }

    fn visit_statement(&mut self, _ast: &Ast, _node: NodeRef) -> VisitAction {
        self.statements += 1;
        if self.stop_at_first_statement {
            VisitAction::Abort
        } else {
            VisitAction::Continue
        }
    }

    fn visit_attribute(&mut self, _ast: &Ast, _node: NodeRef) -> VisitAction {
        self.attributes += 1;
        VisitAction::Skip
    }

    fn visit_problem(&mut self, _ast: &Ast, _node: NodeRef) -> VisitAction {
        self.problems += 1;
        VisitAction::Continue
    }
}

#[test]
fn visitor_flags_select_categories() {
    let code = "int f(int a) __attribute__((pure));\nint f(int a) { if (a) return a; return 0; }\n";
    let unit = parse(code, Language::C);

    let mut names = Counter {
        flags: VisitFlags::NAMES,
        ..Default::default()
    };
    assert!(unit.accept(&mut names));
    assert_eq!((names.names, names.statements, names.attributes), (6, 0, 0));

    let mut statements = Counter {
        flags: VisitFlags::STATEMENTS | VisitFlags::ATTRIBUTES,
        ..Default::default()
    };
    assert!(unit.accept(&mut statements));
    assert_eq!((statements.names, statements.statements, statements.attributes), (0, 4, 1));

    let mut aborting = Counter {
        flags: VisitFlags::STATEMENTS,
        stop_at_first_statement: true,
        ..Default::default()
    };
    assert!(!unit.accept(&mut aborting));
    assert_eq!(aborting.statements, 1);
}

#[test]
fn problem_nodes_are_reported_to_visitors() {
    let code = "int a = ;\nvoid g(void) { a = ; }\n";
    let unit = parse_lenient(code, Language::C);
    let mut counter = Counter {
        flags: VisitFlags::PROBLEMS,
        ..Default::default()
    };
    let root = unit.root().unwrap();
    assert!(visitor::walk(unit.ast(), root, &mut counter, None));
    assert_eq!(counter.problems, unit.syntax_problem_count());
    assert_eq!(counter.problems, 2);
}
