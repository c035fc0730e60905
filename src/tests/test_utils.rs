use crate::ast::{NodeKind, NodeRef};
use crate::driver;
use crate::lang_options::Language;
use crate::semantic::{BindingId, BindingKind, ProblemKind};
use crate::translation_unit::TranslationUnit;

pub fn parse(code: &str, language: Language) -> TranslationUnit {
    parse_with(code, language, true, true)
}

pub fn parse_with(code: &str, language: Language, gnu: bool, expect_no_problems: bool) -> TranslationUnit {
    let _ = env_logger::try_init();
    match driver::parse(code, language, gnu, expect_no_problems) {
        Ok(unit) => unit,
        Err(e) => panic!("parse failed: {e}\n{e:?}"),
    }
}

/// Parse allowing problems of any kind
pub fn parse_lenient(code: &str, language: Language) -> TranslationUnit {
    parse_with(code, language, true, false)
}

pub fn parse_both(code: &str) -> [TranslationUnit; 2] {
    [parse(code, Language::C), parse(code, Language::Cpp)]
}

/// Byte offset of `section` in `code`
pub fn offset_of(code: &str, section: &str) -> u32 {
    match code.find(section) {
        Some(offset) => offset as u32,
        None => panic!("{section:?} does not occur in the code"),
    }
}

/// Name node whose text is `len` bytes at the start of `section`
pub fn find_name(unit: &TranslationUnit, code: &str, section: &str, len: usize) -> NodeRef {
    let offset = offset_of(code, section);
    match unit.node_selector().find_name(offset, len as u32) {
        Some(name) => name,
        None => panic!("no name at {section:?}"),
    }
}

pub fn find_node(unit: &TranslationUnit, code: &str, section: &str, len: usize) -> NodeRef {
    let offset = offset_of(code, section);
    match unit.node_selector().find_node(offset, len as u32) {
        Some(node) => node,
        None => panic!("no node at {section:?}"),
    }
}

pub fn kind_name(unit: &TranslationUnit, node: NodeRef) -> &'static str {
    unit.ast().get_kind(node).name()
}

/// Binding of the name at `section`, which must not be a problem
pub fn assert_non_problem(unit: &TranslationUnit, code: &str, section: &str, len: usize) -> BindingId {
    let name = find_name(unit, code, section, len);
    let binding = unit.resolve_binding(name);
    assert!(
        !unit.resolver().is_problem(binding),
        "{section:?} resolved to problem {:?}",
        unit.resolver().problem_kind(binding)
    );
    binding
}

pub fn assert_binding_kind(
    unit: &TranslationUnit,
    code: &str,
    section: &str,
    len: usize,
    kind: BindingKind,
) -> BindingId {
    let binding = assert_non_problem(unit, code, section, len);
    assert_eq!(unit.resolver().binding_kind(binding), Some(kind), "kind of {section:?}");
    binding
}

pub fn assert_problem(unit: &TranslationUnit, code: &str, section: &str, len: usize, kind: ProblemKind) {
    let name = find_name(unit, code, section, len);
    let binding = unit.resolve_binding(name);
    assert_eq!(unit.resolver().problem_kind(binding), Some(kind), "problem of {section:?}");
}

/// The implicit name at `section` and the binding it refers to
pub fn assert_implicit_name(unit: &TranslationUnit, code: &str, section: &str, len: usize) -> BindingId {
    let offset = offset_of(code, section);
    match unit.node_selector().find_implicit_name(offset, len as u32) {
        Some(name) => {
            assert!(!unit.resolver().is_problem(name.binding));
            name.binding
        }
        None => panic!("no implicit name at {section:?}"),
    }
}

pub fn assert_no_implicit_name(unit: &TranslationUnit, code: &str, section: &str, len: usize) {
    let offset = offset_of(code, section);
    assert!(unit.node_selector().find_implicit_name(offset, len as u32).is_none());
}

pub fn binding_name(unit: &TranslationUnit, binding: BindingId) -> String {
    unit.resolver()
        .binding_name(binding)
        .map(|s| s.as_str().to_string())
        .unwrap_or_default()
}

/// Kinds of the top-level declarations
pub fn declaration_kinds(unit: &TranslationUnit) -> Vec<&'static str> {
    unit.declarations()
        .into_iter()
        .map(|d| unit.ast().get_kind(d).name())
        .collect()
}

pub fn is_id_expression(unit: &TranslationUnit, node: NodeRef) -> bool {
    matches!(unit.ast().get_kind(node), NodeKind::IdExpression { .. })
}
