//! Symbol table management and scope handling.
//!
//! The table holds every declared binding in a flat vector and a tree of
//! scopes that map names to bindings. Scopes are keyed by the AST node that
//! opens them, so a lookup starts from the innermost scope of a name's
//! ancestors and walks the parent chain outward.

use std::num::NonZeroU32;

use hashbrown::{HashMap, HashSet};
use log::trace;

use crate::ast::{NodeRef, Symbol};
use crate::location_map::MacroDefId;

use super::binding::{Binding, BindingId, BindingKind};

/// Scope ID for efficient scope references
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(NonZeroU32);

impl ScopeId {
    pub const GLOBAL: Self = Self(NonZeroU32::new(1).unwrap());

    pub fn new(id: u32) -> Option<Self> {
        NonZeroU32::new(id).map(Self)
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }

    fn index(self) -> usize {
        (self.get() - 1) as usize
    }
}

/// Name spaces of identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Ordinary, // Variables, functions, typedefs, enumerators, namespaces
    Tag,      // Struct, union, class and enum tags
    Label,    // Goto labels
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Global,
    Namespace,
    Class,
    Enumeration,
    Function,
    Block,
    Template,
}

/// One declaration of a name in a scope. `position` is the token index of
/// the declaring name; ordered scopes hide entries declared after a use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeEntry {
    pub binding: BindingId,
    pub position: u32,
}

/// Scope information
#[derive(Debug)]
pub struct Scope {
    pub kind: ScopeKind,
    pub parent: Option<ScopeId>,
    /// Entity owning the scope: the class, namespace, enumeration or function
    pub owner: Option<BindingId>,
    pub symbols: HashMap<Symbol, Vec<ScopeEntry>>,
    pub tags: HashMap<Symbol, Vec<ScopeEntry>>,
    pub labels: HashMap<Symbol, Vec<ScopeEntry>>,
    /// Nominated scopes: using-directives, inline and unnamed namespaces,
    /// anonymous members. Each carries the position of the directive.
    pub usings: Vec<(ScopeId, u32)>,
    pub level: u32,
}

impl Scope {
    fn map(&self, namespace: Namespace) -> &HashMap<Symbol, Vec<ScopeEntry>> {
        match namespace {
            Namespace::Ordinary => &self.symbols,
            Namespace::Tag => &self.tags,
            Namespace::Label => &self.labels,
        }
    }

    fn map_mut(&mut self, namespace: Namespace) -> &mut HashMap<Symbol, Vec<ScopeEntry>> {
        match namespace {
            Namespace::Ordinary => &mut self.symbols,
            Namespace::Tag => &mut self.tags,
            Namespace::Label => &mut self.labels,
        }
    }

    pub fn entries(&self, namespace: Namespace, name: Symbol) -> &[ScopeEntry] {
        self.map(namespace).get(&name).map_or(&[], |v| v.as_slice())
    }

    /// Class members are visible in the whole class body
    pub fn is_ordered(&self) -> bool {
        !matches!(self.kind, ScopeKind::Class | ScopeKind::Enumeration)
    }

    /// Bindings of `name` visible from `position`; `None` sees every entry
    pub fn visible(&self, namespace: Namespace, name: Symbol, position: Option<u32>) -> Vec<BindingId> {
        let ordered = self.is_ordered();
        self.entries(namespace, name)
            .iter()
            .filter(|e| match position {
                Some(p) if ordered => e.position <= p,
                _ => true,
            })
            .map(|e| e.binding)
            .collect()
    }
}

/// Symbol table using flattened storage
#[derive(Debug)]
pub struct SymbolTable {
    pub(crate) bindings: Vec<Binding>,
    pub(crate) scopes: Vec<Scope>,
    /// Name nodes in declaring position
    pub(crate) declared: HashMap<NodeRef, BindingId>,
    /// Scope opened by a node
    pub(crate) node_scopes: HashMap<NodeRef, ScopeId>,
    /// Class and enumeration specifiers, named or not
    pub(crate) specifiers: HashMap<NodeRef, BindingId>,
    pub(crate) macros: HashMap<MacroDefId, BindingId>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        let global = Scope {
            kind: ScopeKind::Global,
            parent: None,
            owner: None,
            symbols: HashMap::new(),
            tags: HashMap::new(),
            labels: HashMap::new(),
            usings: Vec::new(),
            level: 0,
        };
        SymbolTable {
            bindings: Vec::new(),
            scopes: vec![global],
            declared: HashMap::new(),
            node_scopes: HashMap::new(),
            specifiers: HashMap::new(),
            macros: HashMap::new(),
        }
    }

    pub fn push_scope(&mut self, kind: ScopeKind, parent: ScopeId, owner: Option<BindingId>) -> ScopeId {
        let level = self.scope(parent).level + 1;
        self.scopes.push(Scope {
            kind,
            parent: Some(parent),
            owner,
            symbols: HashMap::new(),
            tags: HashMap::new(),
            labels: HashMap::new(),
            usings: Vec::new(),
            level,
        });
        let id = ScopeId::new(self.scopes.len() as u32).unwrap_or(ScopeId::GLOBAL);
        trace!("push_scope: {:?} {:?} (parent {:?})", id, kind, parent);
        id
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    pub(crate) fn scope_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id.index()]
    }

    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }

    pub fn add_binding(&mut self, name: Symbol, kind: BindingKind) -> BindingId {
        let id = BindingId::Declared(self.bindings.len() as u32);
        self.bindings.push(Binding::new(id, name, kind));
        id
    }

    pub fn binding(&self, id: BindingId) -> Option<&Binding> {
        match id {
            BindingId::Declared(index) => self.bindings.get(index as usize),
            BindingId::Synthesized(_) => None,
        }
    }

    pub(crate) fn binding_mut(&mut self, id: BindingId) -> Option<&mut Binding> {
        match id {
            BindingId::Declared(index) => self.bindings.get_mut(index as usize),
            BindingId::Synthesized(_) => None,
        }
    }

    pub fn bindings(&self) -> impl Iterator<Item = &Binding> {
        self.bindings.iter()
    }

    pub fn kind(&self, id: BindingId) -> Option<BindingKind> {
        self.binding(id).map(|b| b.kind)
    }

    pub fn insert(&mut self, scope: ScopeId, namespace: Namespace, name: Symbol, binding: BindingId, position: u32) {
        let entries = self.scope_mut(scope).map_mut(namespace).entry(name).or_default();
        if !entries.iter().any(|e| e.binding == binding) {
            entries.push(ScopeEntry { binding, position });
        }
    }

    /// Nominate `target` from `scope`. Repeating a directive changes nothing.
    pub fn add_using(&mut self, scope: ScopeId, target: ScopeId, position: u32) {
        if scope == target {
            return;
        }
        let usings = &mut self.scope_mut(scope).usings;
        if !usings.iter().any(|(s, _)| *s == target) {
            usings.push((target, position));
        }
    }

    /// Scopes nominated from `scope`, transitively, each once
    pub fn using_closure(&self, scope: ScopeId, position: Option<u32>) -> Vec<ScopeId> {
        let mut seen = HashSet::new();
        seen.insert(scope);
        let mut out = Vec::new();
        let mut stack: Vec<ScopeId> = self
            .scope(scope)
            .usings
            .iter()
            .filter(|(_, p)| position.is_none_or(|pos| *p <= pos))
            .map(|(s, _)| *s)
            .collect();
        stack.reverse();
        while let Some(current) = stack.pop() {
            if !seen.insert(current) {
                continue;
            }
            out.push(current);
            for (nested, _) in self.scope(current).usings.iter().rev() {
                stack.push(*nested);
            }
        }
        out
    }

    /// Scope opened by a namespace, class or enumeration, following namespace aliases
    pub fn binding_scope(&self, id: BindingId) -> Option<ScopeId> {
        let mut current = id;
        for _ in 0..super::MAX_RESOLUTION_DEPTH {
            let binding = self.binding(current)?;
            if let Some(scope) = binding.scope {
                return Some(scope);
            }
            current = binding.target?;
        }
        None
    }

    /// Innermost enclosing scope of the given kind, `scope` included
    pub fn enclosing(&self, scope: ScopeId, kind: ScopeKind) -> Option<ScopeId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let s = self.scope(id);
            if s.kind == kind {
                return Some(id);
            }
            current = s.parent;
        }
        None
    }

    /// Innermost scope declarations land in: template scopes are transparent
    pub fn declaring_scope(&self, scope: ScopeId) -> ScopeId {
        let mut current = scope;
        while self.scope(current).kind == ScopeKind::Template {
            match self.scope(current).parent {
                Some(parent) => current = parent,
                None => break,
            }
        }
        current
    }

    /// Bindings of `name` in `scope` itself and in the scopes it nominates.
    ///
    /// Several visible declarations of one name collapse to the newest one
    /// unless they are all functions, which form an overload set.
    pub fn lookup_in(
        &self,
        scope: ScopeId,
        namespaces: &[Namespace],
        name: Symbol,
        position: Option<u32>,
    ) -> Lookup {
        let own = self.collect(scope, namespaces, name, position);
        if !own.is_empty() {
            return Lookup::Found(self.collapse(own));
        }
        let mut found = Vec::new();
        let mut origins = HashSet::new();
        for nominated in self.using_closure(scope, position) {
            let bindings = self.collect(nominated, namespaces, name, None);
            if !bindings.is_empty() {
                origins.insert(nominated);
            }
            for b in bindings {
                if !found.contains(&b) {
                    found.push(b);
                }
            }
        }
        if found.is_empty() {
            return Lookup::NotFound;
        }
        let all_functions = found.iter().all(|b| self.kind(*b).is_some_and(BindingKind::is_function));
        if origins.len() > 1 && !all_functions {
            return Lookup::Ambiguous(found);
        }
        Lookup::Found(self.collapse(found))
    }

    fn collect(&self, scope: ScopeId, namespaces: &[Namespace], name: Symbol, position: Option<u32>) -> Vec<BindingId> {
        let s = self.scope(scope);
        for namespace in namespaces {
            let visible = s.visible(*namespace, name, position);
            if !visible.is_empty() {
                return visible;
            }
        }
        Vec::new()
    }

    fn collapse(&self, mut bindings: Vec<BindingId>) -> Vec<BindingId> {
        let all_functions = bindings.iter().all(|b| self.kind(*b).is_some_and(BindingKind::is_function));
        if !all_functions && bindings.len() > 1 {
            bindings.drain(..bindings.len() - 1);
        }
        bindings
    }

    /// Unqualified lookup from `scope` outward
    pub fn lookup(
        &self,
        scope: ScopeId,
        namespaces: &[Namespace],
        name: Symbol,
        position: u32,
        skip_classes: bool,
    ) -> Lookup {
        let mut current = Some(scope);
        while let Some(id) = current {
            let s = self.scope(id);
            if !(skip_classes && s.kind == ScopeKind::Class) {
                let result = self.lookup_in(id, namespaces, name, Some(position));
                if !matches!(result, Lookup::NotFound) {
                    return result;
                }
            }
            current = s.parent;
        }
        Lookup::NotFound
    }
}

/// Outcome of a scope lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Found(Vec<BindingId>),
    /// Different entities reached through different using-directives
    Ambiguous(Vec<BindingId>),
    NotFound,
}

impl Lookup {
    pub fn first(&self) -> Option<BindingId> {
        match self {
            Lookup::Found(b) => b.first().copied(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(s: &str) -> Symbol {
        Symbol::new(s)
    }

    #[test]
    fn ordered_scopes_hide_later_declarations() {
        let mut table = SymbolTable::new();
        let x = table.add_binding(sym("x"), BindingKind::Variable);
        table.insert(ScopeId::GLOBAL, Namespace::Ordinary, sym("x"), x, 10);
        assert_eq!(
            table.lookup(ScopeId::GLOBAL, &[Namespace::Ordinary], sym("x"), 5, false),
            Lookup::NotFound
        );
        assert_eq!(
            table.lookup(ScopeId::GLOBAL, &[Namespace::Ordinary], sym("x"), 12, false),
            Lookup::Found(vec![x])
        );
    }

    #[test]
    fn using_closure_is_transitive_and_idempotent() {
        let mut table = SymbolTable::new();
        let a = table.push_scope(ScopeKind::Namespace, ScopeId::GLOBAL, None);
        let c = table.push_scope(ScopeKind::Namespace, ScopeId::GLOBAL, None);
        table.add_using(c, a, 0);
        table.add_using(ScopeId::GLOBAL, c, 5);
        table.add_using(ScopeId::GLOBAL, a, 6);
        table.add_using(ScopeId::GLOBAL, a, 7);
        assert_eq!(table.using_closure(ScopeId::GLOBAL, Some(10)), vec![c, a]);
        assert_eq!(table.scope(ScopeId::GLOBAL).usings.len(), 2);

        let f = table.add_binding(sym("f"), BindingKind::Variable);
        table.insert(a, Namespace::Ordinary, sym("f"), f, 1);
        let found = table.lookup(ScopeId::GLOBAL, &[Namespace::Ordinary], sym("f"), 10, false);
        assert_eq!(found, Lookup::Found(vec![f]));
    }

    #[test]
    fn distinct_entities_from_two_namespaces_are_ambiguous() {
        let mut table = SymbolTable::new();
        let a = table.push_scope(ScopeKind::Namespace, ScopeId::GLOBAL, None);
        let b = table.push_scope(ScopeKind::Namespace, ScopeId::GLOBAL, None);
        let xa = table.add_binding(sym("x"), BindingKind::Variable);
        let xb = table.add_binding(sym("x"), BindingKind::Variable);
        table.insert(a, Namespace::Ordinary, sym("x"), xa, 1);
        table.insert(b, Namespace::Ordinary, sym("x"), xb, 2);
        table.add_using(ScopeId::GLOBAL, a, 3);
        table.add_using(ScopeId::GLOBAL, b, 4);
        let result = table.lookup(ScopeId::GLOBAL, &[Namespace::Ordinary], sym("x"), 9, false);
        assert!(matches!(result, Lookup::Ambiguous(_)));
    }
}
