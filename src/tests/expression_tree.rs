use serde::Serialize;

use crate::ast::{BinaryOp, CastOp, NodeKind, NodeRef, UnaryOp};
use crate::lang_options::Language;
use crate::tests::test_utils::{find_node, parse};
use crate::translation_unit::TranslationUnit;

/// Expression tree with node references replaced by their content
#[derive(Debug, Serialize)]
enum Resolved {
    Literal(String),
    Id(String),
    Unary(UnaryOp, Box<Resolved>),
    Binary(BinaryOp, Box<Resolved>, Box<Resolved>),
    Conditional(Box<Resolved>, Box<Resolved>, Box<Resolved>),
    Cast(CastOp, String, Box<Resolved>),
    Subscript(Box<Resolved>, Box<Resolved>),
    Field(Box<Resolved>, String, bool),
    Other(&'static str),
}

fn text_of(unit: &TranslationUnit, node: NodeRef) -> String {
    unit.raw_signature(node).unwrap_or_default()
}

fn resolve(unit: &TranslationUnit, node: NodeRef) -> Resolved {
    let boxed = |n: NodeRef| Box::new(resolve(unit, n));
    match unit.ast().get_kind(node) {
        NodeKind::Literal { kind, value } => Resolved::Literal(format!("{:?} {}", kind, value.as_str())),
        NodeKind::IdExpression { name } => Resolved::Id(text_of(unit, *name)),
        NodeKind::Unary { op, operand } => Resolved::Unary(*op, boxed(*operand)),
        NodeKind::Binary { op, left, right } => Resolved::Binary(*op, boxed(*left), boxed(*right)),
        NodeKind::Conditional {
            condition,
            positive: Some(positive),
            negative,
        } => Resolved::Conditional(boxed(*condition), boxed(*positive), boxed(*negative)),
        NodeKind::Cast { op, type_id, operand } => Resolved::Cast(*op, text_of(unit, *type_id), boxed(*operand)),
        NodeKind::ArraySubscript { array, index } => Resolved::Subscript(boxed(*array), boxed(*index)),
        NodeKind::FieldReference { owner, name, arrow } => Resolved::Field(boxed(*owner), text_of(unit, *name), *arrow),
        other => Resolved::Other(other.name()),
    }
}

/// Resolved tree of `expression` returned from a function with a few
/// parameters to refer to
fn resolve_returned(expression: &str) -> Resolved {
    let code = format!(
        "typedef long L;\nstruct S {{ int m; }};\nlong f(int a, int b, int *p, struct S *s) {{ return {expression}; }}\n"
    );
    let unit = parse(&code, Language::C);
    let node = find_node(&unit, &code, expression, expression.len());
    resolve(&unit, node)
}

#[test]
fn precedence_of_binary_operators() {
    insta::assert_yaml_snapshot!(&resolve_returned("a + b * 2"), @r"
    Binary:
      - Add
      - Id: a
      - Binary:
          - Mul
          - Id: b
          - Literal: Integer 2
    ");
}

#[test]
fn assignments_group_to_the_right() {
    insta::assert_yaml_snapshot!(&resolve_returned("a = b += 1"), @r"
    Binary:
      - Assign
      - Id: a
      - Binary:
          - AssignAdd
          - Id: b
          - Literal: Integer 1
    ");
}

#[test]
fn cast_binds_tighter_than_the_conditional() {
    insta::assert_yaml_snapshot!(&resolve_returned("(L)a ? p[0] : s->m"), @r"
    Conditional:
      - Cast:
          - CStyle
          - L
          - Id: a
      - Subscript:
          - Id: p
          - Literal: Integer 0
      - Field:
          - Id: s
          - m
          - true
    ");
}

#[test]
fn prefix_and_parenthesized_operands() {
    insta::assert_yaml_snapshot!(&resolve_returned("-(a - b) << !b"), @r"
    Binary:
      - LShift
      - Unary:
          - Minus
          - Unary:
              - Bracketed
              - Binary:
                  - Sub
                  - Id: a
                  - Id: b
      - Unary:
          - LogicNot
          - Id: b
    ");
}
