//! Lazy, memoized name resolution over a frozen tree.
//!
//! The symbol table is built on the first query. Each name node is resolved
//! at most once; later queries return the cached [`BindingId`], so two
//! queries of one node always yield the same identity. Resolution failures
//! are cached as problem bindings as well.

use std::cell::{Cell, OnceCell, RefCell};
use std::rc::Rc;

use hashbrown::HashMap;
use log::{debug, trace};

use crate::ast::signature::{declarator_name, function_declarator, node_signature};
use crate::ast::visitor::NameCollector;
use crate::ast::*;
use crate::lang_options::LangOptions;
use crate::lexer::Token;
use crate::location_map::MacroDefId;

use super::binding::{Binding, BindingId, BindingKind, ProblemKind};
use super::scope_builder::ScopeBuilder;
use super::symbol_table::{Lookup, Namespace, ScopeId, ScopeKind, SymbolTable};
use super::types::Type;
use super::{MAX_RESOLUTION_DEPTH, name_symbol};

/// Nesting bound for resolutions that trigger further resolutions
const MAX_NESTED_QUERIES: usize = MAX_RESOLUTION_DEPTH * 8;

pub struct BindingResolver {
    ast: Rc<Ast>,
    tokens: Rc<[Token]>,
    lang: LangOptions,
    macros: Vec<(MacroDefId, Symbol)>,
    table: OnceCell<SymbolTable>,
    cache: RefCell<HashMap<NodeRef, BindingId>>,
    synthesized: RefCell<Vec<Binding>>,
    instances: RefCell<HashMap<(BindingId, String), BindingId>>,
    pub(super) expression_types: RefCell<HashMap<NodeRef, Type>>,
    pub(super) implicit: RefCell<HashMap<NodeRef, Vec<ImplicitName>>>,
    nesting: Cell<usize>,
}

impl BindingResolver {
    pub fn new(ast: Rc<Ast>, tokens: Rc<[Token]>, lang: LangOptions) -> Self {
        BindingResolver {
            ast,
            tokens,
            lang,
            macros: Vec::new(),
            table: OnceCell::new(),
            cache: RefCell::new(HashMap::new()),
            synthesized: RefCell::new(Vec::new()),
            instances: RefCell::new(HashMap::new()),
            expression_types: RefCell::new(HashMap::new()),
            implicit: RefCell::new(HashMap::new()),
            nesting: Cell::new(0),
        }
    }

    /// Macro definitions to expose as macro bindings
    pub fn with_macros(mut self, macros: Vec<(MacroDefId, Symbol)>) -> Self {
        self.macros = macros;
        self
    }

    pub fn ast(&self) -> &Ast {
        &self.ast
    }

    pub(crate) fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub(crate) fn lang(&self) -> LangOptions {
        self.lang
    }

    pub fn symbol_table(&self) -> &SymbolTable {
        self.table.get_or_init(|| ScopeBuilder::new(&self.ast, &self.tokens, self.lang).build(&self.macros))
    }

    /// Binding of a name node. Never fails: unresolvable names produce a
    /// problem binding, and the same node always yields the same binding.
    pub fn resolve_binding(&self, name: NodeRef) -> BindingId {
        if let Some(binding) = self.cache.borrow().get(&name) {
            return *binding;
        }
        let depth = self.nesting.get();
        if depth >= MAX_NESTED_QUERIES {
            debug!("resolution of {:?} exceeds the nesting limit", name);
            return self.problem(name, ProblemKind::RecursionLimit);
        }
        self.nesting.set(depth + 1);
        let result = self.compute(name);
        self.nesting.set(depth);

        let binding = match result {
            Ok(binding) => binding,
            Err(kind) => self.problem(name, kind),
        };
        trace!("resolved {:?} to {:?}", name, binding);
        // a nested query may have resolved the node already
        *self.cache.borrow_mut().entry(name).or_insert(binding)
    }

    fn problem(&self, name: NodeRef, kind: ProblemKind) -> BindingId {
        let symbol = self.symbol(name).unwrap_or_else(|| Symbol::new(""));
        self.synthesize(symbol, BindingKind::Problem(kind), |_| {})
    }

    fn synthesize(&self, name: Symbol, kind: BindingKind, init: impl FnOnce(&mut Binding)) -> BindingId {
        let mut synthesized = self.synthesized.borrow_mut();
        let id = BindingId::Synthesized(synthesized.len() as u32);
        let mut binding = Binding::new(id, name, kind);
        init(&mut binding);
        synthesized.push(binding);
        id
    }

    pub fn binding(&self, id: BindingId) -> Option<Binding> {
        match id {
            BindingId::Declared(_) => self.symbol_table().binding(id).cloned(),
            BindingId::Synthesized(index) => self.synthesized.borrow().get(index as usize).cloned(),
        }
    }

    pub fn binding_kind(&self, id: BindingId) -> Option<BindingKind> {
        match id {
            BindingId::Declared(_) => self.symbol_table().kind(id),
            BindingId::Synthesized(index) => self.synthesized.borrow().get(index as usize).map(|b| b.kind),
        }
    }

    pub fn binding_name(&self, id: BindingId) -> Option<Symbol> {
        match id {
            BindingId::Declared(_) => self.symbol_table().binding(id).map(|b| b.name),
            BindingId::Synthesized(index) => self.synthesized.borrow().get(index as usize).map(|b| b.name),
        }
    }

    pub fn is_problem(&self, id: BindingId) -> bool {
        self.binding_kind(id).is_some_and(BindingKind::is_problem)
    }

    pub fn problem_kind(&self, id: BindingId) -> Option<ProblemKind> {
        match self.binding_kind(id)? {
            BindingKind::Problem(kind) => Some(kind),
            _ => None,
        }
    }

    /// Name nodes declaring the entity, in source order
    pub fn declarations(&self, id: BindingId) -> Vec<NodeRef> {
        self.symbol_table()
            .binding(id)
            .map(|b| b.declarations.clone())
            .unwrap_or_default()
    }

    pub fn definition(&self, id: BindingId) -> Option<NodeRef> {
        self.symbol_table().binding(id).and_then(|b| b.definition)
    }

    /// Whether a name node is in declaring position
    pub fn is_declaration(&self, name: NodeRef) -> bool {
        self.symbol_table().declared.contains_key(&name)
    }

    pub fn macro_binding(&self, definition: MacroDefId) -> Option<BindingId> {
        self.symbol_table().macros.get(&definition).copied()
    }

    /// Number of name nodes below `root` that resolve to problem bindings
    pub fn problem_count(&self, root: NodeRef) -> usize {
        NameCollector::collect(&self.ast, root)
            .into_iter()
            .filter(|name| {
                let binding = self.resolve_binding(*name);
                self.is_problem(binding)
            })
            .count()
    }

    pub(crate) fn symbol(&self, name: NodeRef) -> Option<Symbol> {
        name_symbol(&self.ast, &self.tokens, name)
    }

    /// Innermost scope enclosing a node
    pub(crate) fn scope_of(&self, node: NodeRef) -> ScopeId {
        let table = self.symbol_table();
        std::iter::once(node)
            .chain(self.ast.ancestors(node))
            .find_map(|n| table.node_scopes.get(&n).copied())
            .unwrap_or(ScopeId::GLOBAL)
    }

    /// Scope a qualified name or member access can look into
    pub(crate) fn scope_of_binding(&self, id: BindingId) -> Option<ScopeId> {
        match id {
            BindingId::Synthesized(index) => self.synthesized.borrow().get(index as usize).and_then(|b| b.scope),
            BindingId::Declared(_) => match self.symbol_table().kind(id)? {
                BindingKind::Typedef => {
                    let class = self.type_of(id).composite_binding()?;
                    if class == id {
                        return None;
                    }
                    self.scope_of_binding(class)
                }
                _ => self.symbol_table().binding_scope(id),
            },
        }
    }

    fn ordinary_namespaces(&self) -> &'static [Namespace] {
        if self.lang.is_cpp() {
            &[Namespace::Ordinary, Namespace::Tag]
        } else {
            &[Namespace::Ordinary]
        }
    }

    fn compute(&self, name: NodeRef) -> Result<BindingId, ProblemKind> {
        let table = self.symbol_table();
        if let Some(binding) = table.declared.get(&name) {
            return Ok(*binding);
        }
        let ast = &*self.ast;
        match ast.get_kind(name) {
            NodeKind::QualifiedName { segments, .. } => {
                let last = *segments.last().ok_or(ProblemKind::NameNotFound)?;
                match ast.get_kind(last) {
                    NodeKind::TemplateId { .. } => Ok(self.resolve_binding(last)),
                    _ => self.resolve_in_role(name, last),
                }
            }
            NodeKind::TemplateId {
                template_name,
                arguments,
            } => {
                let template = self.resolve_binding(*template_name);
                if let Some(kind) = self.problem_kind(template) {
                    return Err(kind);
                }
                match self.binding_kind(template) {
                    Some(BindingKind::ClassTemplate(_)) => Ok(self.instance(template, arguments)),
                    _ => Ok(template),
                }
            }
            NodeKind::Name(_) | NodeKind::OperatorName(_) | NodeKind::ConversionName { .. } => {
                match ast.parent(name).map(|p| (p, ast.get_kind(p))) {
                    Some((
                        template_id,
                        NodeKind::TemplateId {
                            template_name,
                            ..
                        },
                    )) if *template_name == name => {
                        let symbol = self.symbol(name).ok_or(ProblemKind::NameNotFound)?;
                        let found = self.lookup_in_context(template_id, symbol, &[Namespace::Ordinary, Namespace::Tag])?;
                        found.first().copied().ok_or(ProblemKind::NameNotFound)
                    }
                    Some((qualified, NodeKind::QualifiedName { segments, .. })) => {
                        if segments.last() == Some(&name) {
                            Ok(self.resolve_binding(qualified))
                        } else {
                            let symbol = self.symbol(name).ok_or(ProblemKind::NameNotFound)?;
                            let found = self.lookup_in_context(name, symbol, &[Namespace::Ordinary, Namespace::Tag])?;
                            // a qualifier names a namespace, class or typedef
                            found
                                .iter()
                                .copied()
                                .find(|b| {
                                    self.binding_kind(*b)
                                        .is_some_and(|k| k.is_scope() || k.is_type())
                                })
                                .or_else(|| found.first().copied())
                                .ok_or(ProblemKind::NameNotFound)
                        }
                    }
                    _ => self.resolve_in_role(name, name),
                }
            }
            _ => Err(ProblemKind::NameNotFound),
        }
    }

    /// Resolve a name by the syntactic role of `role`, looking the identifier
    /// of `slot` up where the slot sits.
    fn resolve_in_role(&self, role: NodeRef, slot: NodeRef) -> Result<BindingId, ProblemKind> {
        let ast = &*self.ast;
        let symbol = self.symbol(slot).ok_or(ProblemKind::NameNotFound)?;
        let qualified = role != slot;
        let parent = ast.parent(role);
        match parent.map(|p| ast.get_kind(p)) {
            Some(NodeKind::FieldReference { owner, arrow, .. }) if !qualified => {
                let class = self.member_owner(*owner, *arrow)?;
                self.member(class, symbol)
            }
            Some(NodeKind::GotoStatement { .. } | NodeKind::LabelReference { .. }) => {
                let scope = self.scope_of(role);
                let table = self.symbol_table();
                let function = table.enclosing(scope, ScopeKind::Function).ok_or(ProblemKind::LabelNotFound)?;
                table
                    .scope(function)
                    .entries(Namespace::Label, symbol)
                    .first()
                    .map(|e| e.binding)
                    .ok_or(ProblemKind::LabelNotFound)
            }
            Some(NodeKind::ElaboratedTypeSpecifier { .. }) => {
                let found = self.lookup_in_context(slot, symbol, &[Namespace::Tag])?;
                found.last().copied().ok_or(ProblemKind::NameNotFound)
            }
            Some(NodeKind::ConstructorChainInitializer { .. }) if !qualified => {
                let class = parent.and_then(|p| self.enclosing_class(p));
                if let Some(class) = class
                    && let Ok(member) = self.member(class, symbol)
                {
                    return Ok(member);
                }
                let found = self.lookup_in_context(slot, symbol, self.ordinary_namespaces())?;
                found.first().copied().ok_or(ProblemKind::NameNotFound)
            }
            Some(NodeKind::FieldDesignator { .. }) => {
                let designator = parent.ok_or(ProblemKind::NameNotFound)?;
                let class = self
                    .designated_type(designator)
                    .composite_binding()
                    .ok_or(ProblemKind::InvalidType)?;
                self.member(class, symbol)
            }
            Some(NodeKind::BuiltinOffsetof { type_id, member }) if *member == role => {
                let class = self.type_id_type(*type_id).composite_binding().ok_or(ProblemKind::InvalidType)?;
                self.member(class, symbol)
            }
            _ => {
                let found = self.lookup_in_context(slot, symbol, self.ordinary_namespaces())?;
                if found.len() > 1
                    && let Some(call) = self.call_of_callee(role)
                {
                    return Ok(self.select_overload(&found, call));
                }
                found.first().copied().ok_or(ProblemKind::NameNotFound)
            }
        }
    }

    /// Function call whose callee is the id-expression naming `name`
    fn call_of_callee(&self, name: NodeRef) -> Option<NodeRef> {
        let ast = &*self.ast;
        let id_expression = ast.parent(name)?;
        if !matches!(ast.get_kind(id_expression), NodeKind::IdExpression { .. }) {
            return None;
        }
        let call = ast.parent(id_expression)?;
        match ast.get_kind(call) {
            NodeKind::FunctionCall { function, .. } if *function == id_expression => Some(call),
            _ => None,
        }
    }

    /// Candidates for `symbol` at the position of `slot`. A slot inside a
    /// qualified name is looked up in the scope named by the preceding segment.
    pub(crate) fn lookup_in_context(
        &self,
        slot: NodeRef,
        symbol: Symbol,
        namespaces: &[Namespace],
    ) -> Result<Vec<BindingId>, ProblemKind> {
        let ast = &*self.ast;
        if let Some(parent) = ast.parent(slot)
            && let NodeKind::QualifiedName {
                segments,
                fully_qualified,
            } = ast.get_kind(parent)
        {
            let index = segments.iter().position(|s| *s == slot).unwrap_or(0);
            let scope = if index == 0 {
                fully_qualified.then_some(ScopeId::GLOBAL)
            } else {
                let qualifier = self.resolve_binding(segments[index - 1]);
                if self.is_problem(qualifier) {
                    return Err(ProblemKind::BadScope);
                }
                if self.binding_kind(qualifier) == Some(BindingKind::TemplateParameter) {
                    // dependent name, resolved no further than its template parameter
                    return Ok(vec![qualifier]);
                }
                match self.scope_of_binding(qualifier) {
                    Some(scope) => Some(scope),
                    None => return Err(ProblemKind::BadScope),
                }
            };
            if let Some(scope) = scope {
                return self.qualified_lookup(scope, symbol, namespaces);
            }
        }
        let scope = self.scope_of(slot);
        let position = ast.get_tokens(slot).start;
        self.unqualified_lookup(scope, symbol, namespaces, position)
    }

    fn qualified_lookup(&self, scope: ScopeId, symbol: Symbol, namespaces: &[Namespace]) -> Result<Vec<BindingId>, ProblemKind> {
        let table = self.symbol_table();
        match table.lookup_in(scope, namespaces, symbol, None) {
            Lookup::Found(found) => Ok(found),
            Lookup::Ambiguous(_) => Err(ProblemKind::AmbiguousLookup),
            Lookup::NotFound => match table.scope(scope).owner {
                Some(class) if table.scope(scope).kind == ScopeKind::Class => self.base_lookup(class, symbol, 0),
                _ => Err(ProblemKind::NameNotFound),
            },
        }
    }

    /// Ordinary lookup from `scope` outward. Class scopes include their bases.
    fn unqualified_lookup(
        &self,
        scope: ScopeId,
        symbol: Symbol,
        namespaces: &[Namespace],
        position: u32,
    ) -> Result<Vec<BindingId>, ProblemKind> {
        let table = self.symbol_table();
        let cpp = self.lang.is_cpp();
        let mut current = Some(scope);
        while let Some(id) = current {
            let s = table.scope(id);
            let is_class = s.kind == ScopeKind::Class;
            if cpp || !is_class {
                match table.lookup_in(id, namespaces, symbol, Some(position)) {
                    Lookup::Found(found) => return Ok(found),
                    Lookup::Ambiguous(_) => return Err(ProblemKind::AmbiguousLookup),
                    Lookup::NotFound => {}
                }
                if cpp
                    && is_class
                    && let Some(class) = s.owner
                    && let Ok(found) = self.base_lookup(class, symbol, 0)
                {
                    return Ok(found);
                }
            }
            current = s.parent;
        }
        Err(ProblemKind::NameNotFound)
    }

    /// Members of the base classes of `class`, breadth first
    fn base_lookup(&self, class: BindingId, symbol: Symbol, depth: usize) -> Result<Vec<BindingId>, ProblemKind> {
        if depth > MAX_RESOLUTION_DEPTH {
            return Err(ProblemKind::RecursionLimit);
        }
        let bases = match class {
            BindingId::Declared(_) => self.symbol_table().binding(class).map(|b| b.bases.clone()).unwrap_or_default(),
            BindingId::Synthesized(_) => {
                let template = self.binding(class).and_then(|b| b.owner);
                template
                    .and_then(|t| self.symbol_table().binding(t))
                    .map(|b| b.bases.clone())
                    .unwrap_or_default()
            }
        };
        let table = self.symbol_table();
        let mut resolved = Vec::new();
        for base in bases {
            let binding = self.resolve_binding(base);
            let Some(scope) = self.scope_of_binding(binding) else {
                continue;
            };
            if let Lookup::Found(found) = table.lookup_in(scope, &[Namespace::Ordinary, Namespace::Tag], symbol, None) {
                return Ok(found);
            }
            resolved.push(binding);
        }
        for base in resolved {
            let base_class = self.binding(base).and_then(|b| match b.kind {
                BindingKind::Typedef => self.type_of(base).composite_binding(),
                _ => Some(base),
            });
            if let Some(base_class) = base_class
                && let Ok(found) = self.base_lookup(base_class, symbol, depth + 1)
            {
                return Ok(found);
            }
        }
        Err(ProblemKind::NameNotFound)
    }

    /// Member named `symbol` of a class, searching bases
    pub(crate) fn member(&self, class: BindingId, symbol: Symbol) -> Result<BindingId, ProblemKind> {
        if self.binding_kind(class) == Some(BindingKind::TemplateParameter) {
            return Ok(class);
        }
        let scope = self.scope_of_binding(class).ok_or(ProblemKind::InvalidType)?;
        match self.qualified_lookup(scope, symbol, &[Namespace::Ordinary, Namespace::Tag]) {
            Ok(found) => found.first().copied().ok_or(ProblemKind::MemberNotFound),
            Err(ProblemKind::NameNotFound) => Err(ProblemKind::MemberNotFound),
            Err(other) => Err(other),
        }
    }

    /// All members named `symbol`, for overload sets
    pub(crate) fn members(&self, class: BindingId, symbol: Symbol) -> Vec<BindingId> {
        let Some(scope) = self.scope_of_binding(class) else {
            return Vec::new();
        };
        self.qualified_lookup(scope, symbol, &[Namespace::Ordinary]).unwrap_or_default()
    }

    /// Class whose member a field reference names
    fn member_owner(&self, owner: NodeRef, arrow: bool) -> Result<BindingId, ProblemKind> {
        let owner_type = self.expression_type(owner);
        if owner_type.is_problem() {
            return Err(ProblemKind::InvalidType);
        }
        let target = if arrow {
            match owner_type.pointee() {
                Some(target) => target.clone(),
                // `operator->` of a class yields the pointer to follow
                None => self
                    .arrow_operator_result(&owner_type)
                    .and_then(|t| t.pointee().cloned())
                    .ok_or(ProblemKind::InvalidType)?,
            }
        } else {
            owner_type
        };
        target.composite_binding().ok_or(ProblemKind::InvalidType)
    }

    /// Class owning the function a node is part of
    pub(crate) fn enclosing_class(&self, node: NodeRef) -> Option<BindingId> {
        let table = self.symbol_table();
        let mut scope = Some(self.scope_of(node));
        while let Some(id) = scope {
            let s = table.scope(id);
            if s.kind == ScopeKind::Class {
                return s.owner;
            }
            scope = s.parent;
        }
        None
    }

    /// Type initialized by the list a designator appears in
    fn designated_type(&self, designator: NodeRef) -> Type {
        let ast = &*self.ast;
        let Some(designated) = ast.parent(designator) else {
            return Type::Problem;
        };
        // designators before this one narrow the type
        let mut ty = match ast.parent(designated) {
            Some(list) => self.initializer_list_type(list, 0),
            None => Type::Problem,
        };
        if let NodeKind::DesignatedInitializer { designators, .. } = ast.get_kind(designated) {
            for d in designators.iter().take_while(|d| **d != designator) {
                ty = match ast.get_kind(*d) {
                    NodeKind::FieldDesignator { name } => {
                        let member = self.resolve_binding(*name);
                        self.type_of(member)
                    }
                    NodeKind::ArrayDesignator { .. } | NodeKind::ArrayRangeDesignator { .. } => {
                        ty.pointee().cloned().unwrap_or(Type::Problem)
                    }
                    _ => Type::Problem,
                };
            }
        }
        ty
    }

    fn initializer_list_type(&self, list: NodeRef, depth: usize) -> Type {
        let ast = &*self.ast;
        if depth > MAX_RESOLUTION_DEPTH {
            return Type::Problem;
        }
        let Some(parent) = ast.parent(list) else {
            return Type::Problem;
        };
        match ast.get_kind(parent) {
            NodeKind::Declarator(_) => match declarator_name(ast, parent) {
                Some(name) => {
                    let binding = self.resolve_binding(name);
                    self.type_of(binding)
                }
                None => Type::Problem,
            },
            NodeKind::EqualsInitializer { .. } => self.initializer_list_type(parent, depth + 1),
            NodeKind::TypeIdInitializerExpression { type_id, .. } => self.type_id_type(*type_id),
            NodeKind::DesignatedInitializer { designators, .. } => {
                match designators.last().map(|d| ast.get_kind(*d)) {
                    Some(NodeKind::FieldDesignator { name }) => {
                        let member = self.resolve_binding(*name);
                        self.type_of(member)
                    }
                    Some(NodeKind::ArrayDesignator { .. } | NodeKind::ArrayRangeDesignator { .. }) => {
                        let Some(outer) = ast.parent(parent) else {
                            return Type::Problem;
                        };
                        self.initializer_list_type(outer, depth + 1)
                            .pointee()
                            .cloned()
                            .unwrap_or(Type::Problem)
                    }
                    _ => Type::Problem,
                }
            }
            NodeKind::InitializerList { .. } => {
                let outer = self.initializer_list_type(parent, depth + 1);
                outer.pointee().cloned().unwrap_or(Type::Problem)
            }
            _ => Type::Problem,
        }
    }

    /// Binding for a class template applied to arguments. Equal argument
    /// lists yield the same instance.
    fn instance(&self, template: BindingId, arguments: &[NodeRef]) -> BindingId {
        let key = arguments
            .iter()
            .map(|a| node_signature(&self.ast, &self.tokens, *a))
            .collect::<Vec<_>>()
            .join(", ");
        if let Some(instance) = self.instances.borrow().get(&(template, key.clone())) {
            return *instance;
        }
        let name = self.binding_name(template).unwrap_or_else(|| Symbol::new(""));
        let scope = self.symbol_table().binding_scope(template);
        let instance = self.synthesize(name, BindingKind::TemplateInstance, |b| {
            b.owner = Some(template);
            b.scope = scope;
        });
        debug!("instance {:?} of {:?}<{}>", instance, name, key);
        *self.instances.borrow_mut().entry((template, key)).or_insert(instance)
    }

    /// Pick the best function of an overload set for a call
    pub(crate) fn select_overload(&self, candidates: &[BindingId], call: NodeRef) -> BindingId {
        let NodeKind::FunctionCall { arguments, .. } = self.ast.get_kind(call) else {
            return candidates[0];
        };
        let argument_types: Vec<String> = arguments
            .iter()
            .map(|a| self.expression_type(*a).strip_references().strip_qualifiers().to_string())
            .collect();
        self.best_by_arguments(candidates, &argument_types).unwrap_or(candidates[0])
    }

    /// Viable candidate whose parameter types match the most arguments
    pub(crate) fn best_by_arguments(&self, candidates: &[BindingId], argument_types: &[String]) -> Option<BindingId> {
        let mut best: Option<(BindingId, usize)> = None;
        for candidate in candidates {
            let Some(parameters) = self.parameter_shape(*candidate) else {
                continue;
            };
            if !parameters.accepts(argument_types.len()) {
                continue;
            }
            let score = parameters
                .types
                .iter()
                .zip(argument_types)
                .filter(|(p, a)| p.as_str() == a.as_str())
                .count();
            if best.is_none_or(|(_, s)| score > s) {
                best = Some((*candidate, score));
            }
        }
        trace!("overload choice among {} candidates: {:?}", candidates.len(), best);
        best.map(|(b, _)| b)
    }

    /// Parameter types and arity of a function binding
    pub(crate) fn parameter_shape(&self, function: BindingId) -> Option<ParameterShape> {
        let binding = self.symbol_table().binding(function)?;
        let declarator = binding.declarator?;
        let function_declarator = function_declarator(&self.ast, declarator)?;
        let NodeKind::Declarator(data) = self.ast.get_kind(function_declarator) else {
            return None;
        };
        let mut shape = ParameterShape::default();
        match &data.suffix {
            DeclaratorSuffix::Function(suffix) => {
                shape.varargs = suffix.varargs;
                for p in &suffix.parameters {
                    let NodeKind::ParameterDeclaration {
                        decl_specifier,
                        declarator,
                    } = self.ast.get_kind(*p)
                    else {
                        continue;
                    };
                    let ty = self.declarator_type(self.specifier_type(*decl_specifier), *declarator);
                    if suffix.parameters.len() == 1 && ty == Type::basic(BasicType::Void) {
                        break;
                    }
                    if !matches!(
                        self.ast.get_kind(*declarator),
                        NodeKind::Declarator(DeclaratorData { initializer: Some(_), .. })
                    ) {
                        shape.required += 1;
                    }
                    shape
                        .types
                        .push(ty.strip_references().strip_qualifiers().to_string());
                }
            }
            DeclaratorSuffix::KnRFunction { parameter_names, .. } => {
                shape.required = parameter_names.len();
                shape.types = vec![Type::int().to_string(); parameter_names.len()];
            }
            _ => return None,
        }
        Some(shape)
    }
}

#[derive(Debug, Default, Clone)]
pub(crate) struct ParameterShape {
    pub types: Vec<String>,
    /// Parameters without a default argument
    pub required: usize,
    pub varargs: bool,
}

impl ParameterShape {
    pub fn accepts(&self, arguments: usize) -> bool {
        arguments >= self.required && (self.varargs || arguments <= self.types.len())
    }
}

impl ImplicitNameSource for BindingResolver {
    fn implicit_names_of(&self, _ast: &Ast, node: NodeRef) -> Vec<ImplicitName> {
        self.implicit_names(node)
    }
}
