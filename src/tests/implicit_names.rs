use crate::ast::visitor::{AstVisitor, VisitAction, VisitFlags};
use crate::ast::{Ast, ImplicitName};
use crate::lang_options::Language;
use crate::semantic::{BindingKind, FunctionKind};
use crate::tests::test_utils::{assert_implicit_name, assert_no_implicit_name, assert_non_problem, offset_of, parse};

#[test]
fn new_expression_names_the_constructor() {
    let code = "struct Point {\n  Point();\n  Point(int v);\n};\nPoint *make() { return new Point(1); }\n";
    let unit = parse(code, Language::Cpp);
    let by_int = assert_non_problem(&unit, code, "Point(int v)", 5);
    assert_eq!(
        unit.resolver().binding_kind(by_int),
        Some(BindingKind::Function(FunctionKind::Constructor))
    );
    assert_eq!(assert_implicit_name(&unit, code, "Point(1)", 5), by_int);
}

#[test]
fn object_declarations_name_their_constructor() {
    let code = "struct Point {\n  Point();\n  Point(int v);\n};\n\
                Point origin;\nPoint one(1);\nPoint two = 2;\nextern Point elsewhere;\nPoint *nothing;\n";
    let unit = parse(code, Language::Cpp);
    let by_default = assert_non_problem(&unit, code, "Point();", 5);
    let by_int = assert_non_problem(&unit, code, "Point(int v)", 5);

    assert_eq!(assert_implicit_name(&unit, code, "origin", 6), by_default);
    assert_eq!(assert_implicit_name(&unit, code, "one", 3), by_int);
    assert_eq!(assert_implicit_name(&unit, code, "two", 3), by_int);
    assert_no_implicit_name(&unit, code, "elsewhere", 9);
    assert_no_implicit_name(&unit, code, "nothing", 7);
}

#[test]
fn overloaded_binary_operators() {
    let code = "struct Vec {\n  Vec operator+(const Vec &other) const;\n};\n\
                struct Mat {};\nMat operator*(Mat, Mat);\n\
                Vec a, b;\nMat m, n;\nVec c = a + b;\nMat d = m * n;\nint plain = 1 + 2;\n";
    let unit = parse(code, Language::Cpp);
    let plus = assert_non_problem(&unit, code, "operator+", 9);
    let times = assert_non_problem(&unit, code, "operator*", 9);
    assert_eq!(
        unit.resolver().binding_kind(plus),
        Some(BindingKind::Function(FunctionKind::Operator))
    );

    assert_eq!(assert_implicit_name(&unit, code, "+ b", 1), plus);
    assert_eq!(assert_implicit_name(&unit, code, "* n", 1), times);
    assert_no_implicit_name(&unit, code, "+ 2", 1);
}

#[test]
fn call_and_subscript_operators_come_in_pairs() {
    let code = "struct Fn {\n  int operator()(int x, int y);\n  int operator[](int i);\n};\n\
                Fn f;\nint r = f(1, 2) + f[3];\n";
    let unit = parse(code, Language::Cpp);
    let call = assert_non_problem(&unit, code, "operator()", 10);
    let subscript = assert_non_problem(&unit, code, "operator[]", 10);

    assert_eq!(assert_implicit_name(&unit, code, "(1, 2)", 1), call);
    assert_eq!(assert_implicit_name(&unit, code, ") +", 1), call);
    assert_eq!(assert_implicit_name(&unit, code, "[3]", 1), subscript);
    assert_eq!(assert_implicit_name(&unit, code, "];", 1), subscript);

    let offset = offset_of(code, ") +");
    let closing = unit.node_selector().find_implicit_name(offset, 1).unwrap();
    assert!(closing.alternate);
}

#[test]
fn c_has_no_implicit_names() {
    let code = "struct Point { int x; };\nstruct Point p;\nint f(struct Point *q) { return q->x + p.x; }\n";
    let unit = parse(code, Language::C);
    assert!(unit.resolver().all_implicit_names().is_empty());
}

#[derive(Default)]
struct ImplicitCollector {
    names: Vec<ImplicitName>,
}

impl AstVisitor for ImplicitCollector {
    fn flags(&self) -> VisitFlags {
        VisitFlags::IMPLICIT_NAMES
    }

    fn visit_implicit_name(&mut self, _ast: &Ast, name: &ImplicitName) -> VisitAction {
        self.names.push(*name);
        VisitAction::Continue
    }
}

#[test]
fn visitors_receive_implicit_names() {
    let code = "struct Box { Box(int); };\nBox first(1);\nBox *second = new Box(2);\n";
    let unit = parse(code, Language::Cpp);
    let mut collector = ImplicitCollector::default();
    assert!(unit.accept(&mut collector));
    assert_eq!(collector.names.len(), 2);
    assert_eq!(collector.names, unit.resolver().all_implicit_names());
    assert!(collector.names.iter().all(|n| n.binding == collector.names[0].binding));
}
