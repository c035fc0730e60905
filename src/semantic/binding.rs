//! Bindings: the entities names resolve to.

use serde::Serialize;

use crate::ast::{NodeRef, Symbol, TypeKey};

use super::symbol_table::ScopeId;

/// Identity of a binding. Two names resolving to the same entity compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum BindingId {
    /// Entity declared in the tree, owned by the symbol table
    Declared(u32),
    /// Created during resolution: problems and template instances
    Synthesized(u32),
}

/// Flavour of a function binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FunctionKind {
    Free,
    Method,
    Constructor,
    Destructor,
    Operator,
    Conversion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BindingKind {
    Variable,
    Parameter,
    Function(FunctionKind),
    Field,
    Composite(TypeKey),
    Enumeration,
    Enumerator,
    /// `typedef` and alias declarations
    Typedef,
    Namespace,
    NamespaceAlias,
    Label,
    TemplateParameter,
    ClassTemplate(TypeKey),
    FunctionTemplate,
    TemplateInstance,
    Macro,
    Builtin,
    Problem(ProblemKind),
}

impl BindingKind {
    pub fn is_problem(self) -> bool {
        matches!(self, BindingKind::Problem(_))
    }

    pub fn is_function(self) -> bool {
        matches!(self, BindingKind::Function(_) | BindingKind::FunctionTemplate)
    }

    /// Names a type
    pub fn is_type(self) -> bool {
        matches!(
            self,
            BindingKind::Composite(_)
                | BindingKind::Enumeration
                | BindingKind::Typedef
                | BindingKind::TemplateParameter
                | BindingKind::ClassTemplate(_)
                | BindingKind::TemplateInstance
        )
    }

    /// Opens a scope that qualified names can look into
    pub fn is_scope(self) -> bool {
        matches!(
            self,
            BindingKind::Composite(_)
                | BindingKind::Enumeration
                | BindingKind::Namespace
                | BindingKind::NamespaceAlias
                | BindingKind::ClassTemplate(_)
                | BindingKind::TemplateInstance
        )
    }
}

/// Why a name could not be bound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ProblemKind {
    NameNotFound,
    AmbiguousLookup,
    InvalidType,
    InvalidRedeclaration,
    LabelNotFound,
    MemberNotFound,
    RecursionLimit,
    BadScope,
}

impl ProblemKind {
    /// Stable numeric classification
    pub fn id(self) -> u32 {
        match self {
            ProblemKind::BadScope => 1,
            ProblemKind::AmbiguousLookup => 2,
            ProblemKind::NameNotFound => 3,
            ProblemKind::InvalidType => 4,
            ProblemKind::InvalidRedeclaration => 5,
            ProblemKind::LabelNotFound => 6,
            ProblemKind::MemberNotFound => 7,
            ProblemKind::RecursionLimit => 8,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            ProblemKind::NameNotFound => "Name not found",
            ProblemKind::AmbiguousLookup => "Ambiguous lookup",
            ProblemKind::InvalidType => "Invalid type",
            ProblemKind::InvalidRedeclaration => "Invalid redeclaration",
            ProblemKind::LabelNotFound => "Label not found",
            ProblemKind::MemberNotFound => "Member not found",
            ProblemKind::RecursionLimit => "Recursion limit reached",
            ProblemKind::BadScope => "Bad scope",
        }
    }
}

/// Represents the definition state of a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DefinitionState {
    #[default]
    Tentative, // int x;
    Defined,      // int x = ...;
    DeclaredOnly, // extern int x;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Linkage {
    #[default]
    None,
    Internal,
    External,
}

/// A declared or synthesized entity
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub id: BindingId,
    pub name: Symbol,
    pub kind: BindingKind,
    /// Composite of a field or method, function of a parameter, enumeration
    /// of an enumerator, template of an instance
    pub owner: Option<BindingId>,
    /// Name nodes declaring the entity, in source order
    pub declarations: Vec<NodeRef>,
    pub definition: Option<NodeRef>,
    pub state: DefinitionState,
    pub linkage: Linkage,
    /// Scope opened by the entity, for classes, enumerations and namespaces
    pub(crate) scope: Option<ScopeId>,
    /// Declaration specifier and declarator the entity's type is read from
    pub(crate) decl_specifier: Option<NodeRef>,
    pub(crate) declarator: Option<NodeRef>,
    /// Parameters of a function, by position
    pub(crate) parameters: Vec<BindingId>,
    /// Base specifier names of a class
    pub(crate) bases: Vec<NodeRef>,
    /// Namespace an alias stands for
    pub(crate) target: Option<BindingId>,
    /// Parameter types of a function, to tell overloads apart
    pub(crate) parameter_key: Option<String>,
}

impl Binding {
    pub(crate) fn new(id: BindingId, name: Symbol, kind: BindingKind) -> Self {
        Binding {
            id,
            name,
            kind,
            owner: None,
            declarations: Vec::new(),
            definition: None,
            state: DefinitionState::default(),
            linkage: Linkage::default(),
            scope: None,
            decl_specifier: None,
            declarator: None,
            parameters: Vec::new(),
            bases: Vec::new(),
            target: None,
            parameter_key: None,
        }
    }

    pub fn is_problem(&self) -> bool {
        self.kind.is_problem()
    }

    pub fn problem(&self) -> Option<ProblemKind> {
        match self.kind {
            BindingKind::Problem(kind) => Some(kind),
            _ => None,
        }
    }

    pub fn parameters(&self) -> &[BindingId] {
        &self.parameters
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn problem_ids_are_distinct() {
        let kinds = [
            ProblemKind::NameNotFound,
            ProblemKind::AmbiguousLookup,
            ProblemKind::InvalidType,
            ProblemKind::InvalidRedeclaration,
            ProblemKind::LabelNotFound,
            ProblemKind::MemberNotFound,
            ProblemKind::RecursionLimit,
            ProblemKind::BadScope,
        ];
        let mut ids: Vec<u32> = kinds.iter().map(|k| k.id()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), kinds.len());
    }

    #[test]
    fn kind_classification() {
        assert!(BindingKind::Composite(TypeKey::Struct).is_type());
        assert!(BindingKind::Composite(TypeKey::Class).is_scope());
        assert!(BindingKind::Function(FunctionKind::Constructor).is_function());
        assert!(!BindingKind::Variable.is_type());
        assert!(BindingKind::Problem(ProblemKind::NameNotFound).is_problem());
    }
}
