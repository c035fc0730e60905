//! Builds the symbol table of a frozen tree in one walk.
//!
//! Every declaration gets its binding here, and every node that opens a
//! scope is recorded so that the resolver can find the innermost scope of
//! any name later. References are not resolved during the walk; the only
//! lookups performed are those that shape the scope tree itself (using
//! directives, namespace aliases, qualified declarators and redeclarations).

use log::debug;

use crate::ast::signature::{declarator_name, declares_function, function_declarator, parameter_types_key};
use crate::ast::*;
use crate::lang_options::LangOptions;
use crate::lexer::Token;
use crate::location_map::MacroDefId;

use super::binding::{BindingId, BindingKind, DefinitionState, FunctionKind, Linkage};
use super::builtins::{FUNCTION_NAME_VARIABLES, GNU_BUILTINS};
use super::name_symbol;
use super::symbol_table::{Lookup, Namespace, ScopeId, ScopeKind, SymbolTable};

pub(crate) struct ScopeBuilder<'a> {
    ast: &'a Ast,
    tokens: &'a [Token],
    lang: LangOptions,
    table: SymbolTable,
    scope: ScopeId,
    /// The declaration being visited is the body of a template declaration
    templated: bool,
}

impl<'a> ScopeBuilder<'a> {
    pub(crate) fn new(ast: &'a Ast, tokens: &'a [Token], lang: LangOptions) -> Self {
        ScopeBuilder {
            ast,
            tokens,
            lang,
            table: SymbolTable::new(),
            scope: ScopeId::GLOBAL,
            templated: false,
        }
    }

    pub(crate) fn build(mut self, macros: &[(MacroDefId, Symbol)]) -> SymbolTable {
        for (name, _) in GNU_BUILTINS {
            let symbol = Symbol::new(*name);
            let binding = self.table.add_binding(symbol, BindingKind::Builtin);
            self.table.insert(ScopeId::GLOBAL, Namespace::Ordinary, symbol, binding, 0);
        }
        for (id, name) in macros {
            let binding = self.table.add_binding(*name, BindingKind::Macro);
            self.table.macros.insert(*id, binding);
        }
        if let Some(root) = self.ast.root() {
            self.table.node_scopes.insert(root, ScopeId::GLOBAL);
            self.visit(root);
        }
        debug!(
            "built symbol table: {} bindings, {} scopes",
            self.table.bindings.len(),
            self.table.scope_count()
        );
        self.table
    }

    fn is_cpp(&self) -> bool {
        self.lang.is_cpp()
    }

    fn position(&self, node: NodeRef) -> u32 {
        self.ast.get_tokens(node).start
    }

    fn symbol(&self, name: NodeRef) -> Option<Symbol> {
        name_symbol(self.ast, self.tokens, name)
    }

    fn in_scope(&mut self, scope: ScopeId, f: impl FnOnce(&mut Self)) {
        let saved = std::mem::replace(&mut self.scope, scope);
        f(self);
        self.scope = saved;
    }

    fn open_scope(&mut self, kind: ScopeKind, node: NodeRef, owner: Option<BindingId>) -> ScopeId {
        let scope = self.table.push_scope(kind, self.scope, owner);
        self.table.node_scopes.insert(node, scope);
        scope
    }

    fn declaring_scope(&self) -> ScopeId {
        self.table.declaring_scope(self.scope)
    }

    /// Tags named in C struct bodies belong to the enclosing scope
    fn tag_scope(&self) -> ScopeId {
        let mut scope = self.declaring_scope();
        if !self.is_cpp() {
            while self.table.scope(scope).kind == ScopeKind::Class {
                match self.table.scope(scope).parent {
                    Some(parent) => scope = self.table.declaring_scope(parent),
                    None => break,
                }
            }
        }
        scope
    }

    fn scope_owner(&self, scope: ScopeId) -> Option<BindingId> {
        let s = self.table.scope(scope);
        match s.kind {
            ScopeKind::Namespace | ScopeKind::Class | ScopeKind::Enumeration => s.owner,
            _ => None,
        }
    }

    fn record_declaration(&mut self, name: NodeRef, binding: BindingId) {
        self.table.declared.insert(name, binding);
        if let NodeKind::QualifiedName { segments, .. } = self.ast.get_kind(name)
            && let Some(last) = segments.last()
        {
            self.table.declared.insert(*last, binding);
        }
        if let Some(b) = self.table.binding_mut(binding) {
            b.declarations.push(name);
        }
    }

    fn set_definition(&mut self, binding: BindingId, name: NodeRef) {
        if let Some(b) = self.table.binding_mut(binding) {
            if b.definition.is_none() {
                b.definition = Some(name);
            }
            b.state = DefinitionState::Defined;
        }
    }

    /// Scope named by all segments of a qualified name but the last
    fn qualifier_scope(&self, name: NodeRef) -> Option<ScopeId> {
        let NodeKind::QualifiedName {
            segments,
            fully_qualified,
        } = self.ast.get_kind(name)
        else {
            return None;
        };
        let mut scope = fully_qualified.then_some(ScopeId::GLOBAL);
        let qualifiers = &segments[..segments.len().saturating_sub(1)];
        for segment in qualifiers {
            let symbol = self.symbol(*segment)?;
            let namespaces = [Namespace::Ordinary, Namespace::Tag];
            let found = match scope {
                None => self
                    .table
                    .lookup(self.scope, &namespaces, symbol, self.position(name), false),
                Some(s) => self.table.lookup_in(s, &namespaces, symbol, None),
            };
            scope = Some(self.table.binding_scope(found.first()?)?);
        }
        scope
    }

    /// Every binding a (possibly qualified) name refers to at this point
    fn lookup_all(&self, name: NodeRef, namespaces: &[Namespace]) -> Vec<BindingId> {
        let Some(symbol) = self.symbol(name) else {
            return Vec::new();
        };
        let result = match self.ast.get_kind(name) {
            NodeKind::QualifiedName { .. } => match self.qualifier_scope(name) {
                Some(scope) => self.table.lookup_in(scope, namespaces, symbol, None),
                None => Lookup::NotFound,
            },
            _ => self
                .table
                .lookup(self.scope, namespaces, symbol, self.position(name), !self.is_cpp()),
        };
        match result {
            Lookup::Found(bindings) | Lookup::Ambiguous(bindings) => bindings,
            Lookup::NotFound => Vec::new(),
        }
    }

    fn lookup_namespace(&self, name: NodeRef) -> Option<BindingId> {
        self.lookup_all(name, &[Namespace::Ordinary])
            .into_iter()
            .find(|b| matches!(self.table.kind(*b), Some(BindingKind::Namespace | BindingKind::NamespaceAlias)))
    }

    fn visit_children(&mut self, node: NodeRef) {
        for child in self.ast.children(node) {
            self.visit(child);
        }
    }

    fn visit(&mut self, node: NodeRef) {
        let ast = self.ast;
        match ast.get_kind(node) {
            NodeKind::TranslationUnit { declarations } | NodeKind::LinkageSpecification { declarations, .. } => {
                for d in declarations {
                    self.visit(*d);
                }
            }
            NodeKind::NamespaceDefinition {
                name,
                inline,
                declarations,
            } => self.visit_namespace(node, *name, *inline, declarations),
            NodeKind::NamespaceAlias { alias, target } => {
                let Some(symbol) = self.symbol(*alias) else {
                    return;
                };
                let target = self.lookup_namespace(*target);
                let declaring = self.declaring_scope();
                let binding = self.table.add_binding(symbol, BindingKind::NamespaceAlias);
                if let Some(b) = self.table.binding_mut(binding) {
                    b.target = target;
                }
                self.table
                    .insert(declaring, Namespace::Ordinary, symbol, binding, self.position(*alias));
                self.record_declaration(*alias, binding);
                self.set_definition(binding, *alias);
            }
            NodeKind::UsingDirective { name } => {
                if let Some(target) = self.lookup_namespace(*name).and_then(|b| self.table.binding_scope(b)) {
                    let declaring = self.declaring_scope();
                    self.table.add_using(declaring, target, self.position(node));
                } else {
                    debug!("using directive names no namespace");
                }
            }
            NodeKind::UsingDeclaration { name, .. } => {
                let Some(symbol) = self.symbol(*name) else {
                    return;
                };
                let declaring = self.declaring_scope();
                let position = self.position(node);
                for target in self.lookup_all(*name, &[Namespace::Ordinary, Namespace::Tag]) {
                    let namespace = match self.table.kind(target) {
                        Some(BindingKind::Composite(_) | BindingKind::Enumeration) => Namespace::Tag,
                        _ => Namespace::Ordinary,
                    };
                    self.table.insert(declaring, namespace, symbol, target, position);
                }
            }
            NodeKind::AliasDeclaration { alias, type_id } => {
                self.visit(*type_id);
                if let Some(symbol) = self.symbol(*alias) {
                    let declaring = self.declaring_scope();
                    let binding = self.table.add_binding(symbol, BindingKind::Typedef);
                    let owner = self.scope_owner(declaring);
                    if let (Some(b), NodeKind::TypeId {
                        decl_specifier,
                        declarator,
                    }) = (self.table.binding_mut(binding), ast.get_kind(*type_id))
                    {
                        b.decl_specifier = Some(*decl_specifier);
                        b.declarator = Some(*declarator);
                        b.owner = owner;
                    }
                    self.table
                        .insert(declaring, Namespace::Ordinary, symbol, binding, self.position(*alias));
                    self.record_declaration(*alias, binding);
                    self.set_definition(binding, *alias);
                }
            }
            NodeKind::TemplateDeclaration {
                parameters,
                declaration,
            } => {
                let scope = self.open_scope(ScopeKind::Template, node, None);
                self.in_scope(scope, |this| {
                    for p in parameters {
                        this.visit(*p);
                    }
                    this.templated = true;
                    this.visit(*declaration);
                    this.templated = false;
                });
            }
            NodeKind::SimpleTypeTemplateParameter { name, default, .. }
            | NodeKind::TemplatedTypeTemplateParameter { name, default, .. } => {
                if let Some(name) = name
                    && let Some(symbol) = self.symbol(*name)
                {
                    let binding = self.table.add_binding(symbol, BindingKind::TemplateParameter);
                    self.table
                        .insert(self.scope, Namespace::Ordinary, symbol, binding, self.position(*name));
                    self.record_declaration(*name, binding);
                }
                if let Some(default) = default {
                    self.visit(*default);
                }
            }
            NodeKind::SimpleDeclaration {
                decl_specifier,
                declarators,
            } => self.visit_simple_declaration(*decl_specifier, declarators),
            NodeKind::FunctionDefinition {
                decl_specifier,
                declarator,
                member_initializers,
                body,
                catch_handlers,
                ..
            } => {
                let templated = std::mem::take(&mut self.templated);
                self.visit_specifier(*decl_specifier, false, false);
                let function = self.declare_declarator(*declarator, *decl_specifier, templated, true);
                let parent = declarator_name(ast, *declarator)
                    .and_then(|n| self.qualifier_scope(n))
                    .unwrap_or(self.scope);
                let scope = self.table.push_scope(ScopeKind::Function, parent, function);
                self.table.node_scopes.insert(node, scope);
                self.in_scope(scope, |this| {
                    this.insert_parameters(*declarator, scope);
                    this.declare_knr_parameters(*declarator, function);
                    let start = body.map_or(this.position(node), |b| this.position(b));
                    for name in FUNCTION_NAME_VARIABLES {
                        let symbol = Symbol::new(*name);
                        let binding = this.table.add_binding(symbol, BindingKind::Builtin);
                        if let Some(b) = this.table.binding_mut(binding) {
                            b.owner = function;
                        }
                        this.table.insert(scope, Namespace::Ordinary, symbol, binding, start);
                    }
                    this.visit(*declarator);
                    for m in member_initializers {
                        this.visit(*m);
                    }
                    if let Some(body) = body {
                        this.visit(*body);
                    }
                    for h in catch_handlers {
                        this.visit(*h);
                    }
                });
            }
            NodeKind::TemplateSpecialization { declaration } | NodeKind::ExplicitTemplateInstantiation { declaration } => {
                self.templated = false;
                self.visit(*declaration);
            }
            NodeKind::ParameterDeclaration {
                decl_specifier,
                declarator,
            } => {
                self.visit_specifier(*decl_specifier, false, false);
                if let Some(name) = declarator_name(ast, *declarator)
                    && !self.table.declared.contains_key(&name)
                    && let Some(symbol) = self.symbol(name)
                {
                    let in_template = self.table.scope(self.scope).kind == ScopeKind::Template;
                    let kind = if in_template {
                        BindingKind::TemplateParameter
                    } else {
                        BindingKind::Parameter
                    };
                    let binding = self.table.add_binding(symbol, kind);
                    if let Some(b) = self.table.binding_mut(binding) {
                        b.decl_specifier = Some(*decl_specifier);
                        b.declarator = Some(*declarator);
                    }
                    if in_template {
                        self.table
                            .insert(self.scope, Namespace::Ordinary, symbol, binding, self.position(name));
                    }
                    self.record_declaration(name, binding);
                }
                self.visit(*declarator);
            }
            NodeKind::CompositeTypeSpecifier { .. }
            | NodeKind::EnumerationSpecifier { .. }
            | NodeKind::ElaboratedTypeSpecifier { .. } => self.visit_specifier(node, false, false),
            NodeKind::CompoundStatement { .. }
            | NodeKind::IfStatement { .. }
            | NodeKind::SwitchStatement { .. }
            | NodeKind::WhileStatement { .. }
            | NodeKind::ForStatement { .. }
            | NodeKind::RangeBasedForStatement { .. } => {
                let scope = self.open_scope(ScopeKind::Block, node, None);
                self.in_scope(scope, |this| this.visit_children(node));
            }
            NodeKind::CatchHandler { declaration, body } => {
                let scope = self.open_scope(ScopeKind::Block, node, None);
                self.in_scope(scope, |this| {
                    if let Some(declaration) = declaration {
                        this.visit(*declaration);
                        if let NodeKind::ParameterDeclaration { declarator, .. } = ast.get_kind(*declaration) {
                            this.insert_declared(*declarator, scope, BindingKind::Variable);
                        }
                    }
                    this.visit(*body);
                });
            }
            NodeKind::LabelStatement { name, statement } => {
                self.declare_label(*name);
                self.visit(*statement);
            }
            NodeKind::Lambda { declarator, body, .. } => {
                let scope = self.open_scope(ScopeKind::Function, node, None);
                self.in_scope(scope, |this| {
                    if let Some(declarator) = declarator {
                        this.visit(*declarator);
                        this.insert_parameters(*declarator, scope);
                    }
                    this.visit(*body);
                });
            }
            _ => self.visit_children(node),
        }
    }

    fn visit_namespace(&mut self, node: NodeRef, name: Option<NodeRef>, inline: bool, declarations: &[NodeRef]) {
        let declaring = self.declaring_scope();
        let position = self.position(node);
        let named = name.and_then(|n| self.symbol(n).map(|s| (n, s)));
        let scope = match named {
            Some((name, symbol)) => {
                // reopening a namespace continues its scope
                let existing = self
                    .table
                    .scope(declaring)
                    .entries(Namespace::Ordinary, symbol)
                    .iter()
                    .map(|e| e.binding)
                    .find(|b| self.table.kind(*b) == Some(BindingKind::Namespace));
                let binding = match existing {
                    Some(binding) => binding,
                    None => {
                        let binding = self.table.add_binding(symbol, BindingKind::Namespace);
                        let scope = self.table.push_scope(ScopeKind::Namespace, declaring, Some(binding));
                        let owner = self.scope_owner(declaring);
                        if let Some(b) = self.table.binding_mut(binding) {
                            b.scope = Some(scope);
                            b.owner = owner;
                        }
                        self.table
                            .insert(declaring, Namespace::Ordinary, symbol, binding, self.position(name));
                        binding
                    }
                };
                self.record_declaration(name, binding);
                self.set_definition(binding, name);
                let scope = self.table.binding_scope(binding).unwrap_or(declaring);
                if inline {
                    self.table.add_using(declaring, scope, position);
                }
                scope
            }
            None => {
                let scope = self.table.push_scope(ScopeKind::Namespace, declaring, None);
                self.table.add_using(declaring, scope, position);
                scope
            }
        };
        self.table.node_scopes.insert(node, scope);
        self.in_scope(scope, |this| {
            for d in declarations {
                this.visit(*d);
            }
        });
    }

    fn visit_simple_declaration(&mut self, decl_specifier: NodeRef, declarators: &[NodeRef]) {
        let templated = std::mem::take(&mut self.templated);
        let function_template = templated && declarators.iter().any(|d| declares_function(self.ast, *d));
        self.visit_specifier(decl_specifier, templated && !function_template, declarators.is_empty());

        // members of an anonymous struct or union are found through the enclosing scope
        if declarators.is_empty()
            && let NodeKind::CompositeTypeSpecifier { name: None, .. } = self.ast.get_kind(decl_specifier)
            && let Some(scope) = self.table.node_scopes.get(&decl_specifier).copied()
        {
            let declaring = self.declaring_scope();
            self.table.add_using(declaring, scope, 0);
        }

        for declarator in declarators {
            self.declare_declarator(*declarator, decl_specifier, function_template, false);
            self.visit(*declarator);
        }
    }

    /// Declare the tags a specifier introduces and walk class and enum bodies
    fn visit_specifier(&mut self, spec: NodeRef, templated: bool, standalone: bool) {
        let ast = self.ast;
        match ast.get_kind(spec) {
            NodeKind::CompositeTypeSpecifier {
                key,
                name,
                bases,
                members,
                ..
            } => self.visit_composite(spec, *key, *name, bases, members, templated),
            NodeKind::EnumerationSpecifier {
                scoped,
                name,
                base,
                enumerators,
                ..
            } => self.visit_enumeration(spec, *scoped, *name, *base, enumerators),
            NodeKind::ElaboratedTypeSpecifier { key, name, .. } => self.visit_elaborated(*key, *name, standalone),
            _ => self.visit_children(spec),
        }
    }

    fn visit_composite(
        &mut self,
        spec: NodeRef,
        key: TypeKey,
        name: Option<NodeRef>,
        bases: &[NodeRef],
        members: &[NodeRef],
        templated: bool,
    ) {
        let declaring = self.tag_scope();
        let kind = if templated {
            BindingKind::ClassTemplate(key)
        } else {
            BindingKind::Composite(key)
        };
        let binding = match name {
            Some(name) => {
                let binding = match self.ast.get_kind(name) {
                    NodeKind::Name(symbol) => {
                        let symbol = *symbol;
                        // a forward declaration in the same scope is completed here
                        let existing = self
                            .table
                            .scope(declaring)
                            .entries(Namespace::Tag, symbol)
                            .iter()
                            .map(|e| e.binding)
                            .find(|b| {
                                matches!(
                                    self.table.kind(*b),
                                    Some(BindingKind::Composite(_) | BindingKind::ClassTemplate(_))
                                )
                            });
                        match existing {
                            Some(binding) => {
                                if let Some(b) = self.table.binding_mut(binding) {
                                    b.kind = kind;
                                }
                                binding
                            }
                            None => {
                                let binding = self.table.add_binding(symbol, kind);
                                self.table
                                    .insert(declaring, Namespace::Tag, symbol, binding, self.position(name));
                                binding
                            }
                        }
                    }
                    NodeKind::QualifiedName { .. } => {
                        let found = self
                            .lookup_all(name, &[Namespace::Tag, Namespace::Ordinary])
                            .into_iter()
                            .find(|b| self.table.kind(*b).is_some_and(BindingKind::is_type));
                        match found {
                            Some(binding) => binding,
                            None => self.unlisted_composite(name, kind),
                        }
                    }
                    // explicit specialization: a class of its own, reached through its template-id
                    _ => self.unlisted_composite(name, kind),
                };
                self.record_declaration(name, binding);
                self.set_definition(binding, name);
                binding
            }
            None => self.table.add_binding(Symbol::new(""), kind),
        };

        let owner = self.scope_owner(declaring);
        let scope = self.table.push_scope(ScopeKind::Class, self.scope, Some(binding));
        if let Some(b) = self.table.binding_mut(binding) {
            b.scope = Some(scope);
            b.owner = owner;
            b.bases = bases
                .iter()
                .filter_map(|base| match self.ast.get_kind(*base) {
                    NodeKind::BaseSpecifier { name, .. } => Some(*name),
                    _ => None,
                })
                .collect();
        }
        self.table.node_scopes.insert(spec, scope);
        self.table.specifiers.insert(spec, binding);
        self.in_scope(scope, |this| {
            for m in members {
                this.visit(*m);
            }
        });
    }

    fn unlisted_composite(&mut self, name: NodeRef, kind: BindingKind) -> BindingId {
        let symbol = self.symbol(name).unwrap_or_else(|| Symbol::new(""));
        self.table.add_binding(symbol, kind)
    }

    fn visit_enumeration(
        &mut self,
        spec: NodeRef,
        scoped: bool,
        name: Option<NodeRef>,
        base: Option<NodeRef>,
        enumerators: &[NodeRef],
    ) {
        let declaring = self.tag_scope();
        let binding = match name.and_then(|n| self.symbol(n).map(|s| (n, s))) {
            Some((name, symbol)) => {
                let existing = self
                    .table
                    .scope(declaring)
                    .entries(Namespace::Tag, symbol)
                    .iter()
                    .map(|e| e.binding)
                    .find(|b| self.table.kind(*b) == Some(BindingKind::Enumeration));
                let binding = existing.unwrap_or_else(|| {
                    let binding = self.table.add_binding(symbol, BindingKind::Enumeration);
                    self.table
                        .insert(declaring, Namespace::Tag, symbol, binding, self.position(name));
                    binding
                });
                self.record_declaration(name, binding);
                self.set_definition(binding, name);
                binding
            }
            None => self.table.add_binding(Symbol::new(""), BindingKind::Enumeration),
        };
        if let Some(base) = base {
            self.visit(base);
        }
        let owner = self.scope_owner(declaring);
        let scope = self.table.push_scope(ScopeKind::Enumeration, self.scope, Some(binding));
        if let Some(b) = self.table.binding_mut(binding) {
            b.scope = Some(scope);
            b.owner = owner;
        }
        self.table.node_scopes.insert(spec, scope);
        self.table.specifiers.insert(spec, binding);

        // unscoped enumerators are visible next to the enumeration
        let enumerator_scope = self.declaring_scope();
        for enumerator in enumerators {
            let NodeKind::Enumerator { name, value } = self.ast.get_kind(*enumerator) else {
                continue;
            };
            let Some(symbol) = self.symbol(*name) else {
                continue;
            };
            let position = self.position(*name);
            let e = self.table.add_binding(symbol, BindingKind::Enumerator);
            if let Some(b) = self.table.binding_mut(e) {
                b.owner = Some(binding);
            }
            self.table.insert(scope, Namespace::Ordinary, symbol, e, position);
            if !scoped {
                self.table.insert(enumerator_scope, Namespace::Ordinary, symbol, e, position);
            }
            self.record_declaration(*name, e);
            self.set_definition(e, *name);
            if let Some(value) = value {
                self.visit(*value);
            }
        }
    }

    fn visit_elaborated(&mut self, key: TypeKey, name: NodeRef, standalone: bool) {
        let NodeKind::Name(symbol) = *self.ast.get_kind(name) else {
            return;
        };
        let declaring = self.tag_scope();
        let kind = match key {
            TypeKey::Enum => BindingKind::Enumeration,
            key => BindingKind::Composite(key),
        };
        if standalone {
            // `struct S;` declares S in the current scope, hiding outer ones
            let existing = self
                .table
                .scope(declaring)
                .entries(Namespace::Tag, symbol)
                .last()
                .map(|e| e.binding);
            let binding = existing.unwrap_or_else(|| {
                let binding = self.table.add_binding(symbol, kind);
                self.table
                    .insert(declaring, Namespace::Tag, symbol, binding, self.position(name));
                binding
            });
            self.record_declaration(name, binding);
            return;
        }
        let visible = self
            .table
            .lookup(self.scope, &[Namespace::Tag], symbol, self.position(name), false);
        if visible == Lookup::NotFound {
            // the first mention of a tag declares it
            let binding = self.table.add_binding(symbol, kind);
            self.table
                .insert(declaring, Namespace::Tag, symbol, binding, self.position(name));
            self.record_declaration(name, binding);
        }
    }

    fn declare_label(&mut self, name: NodeRef) {
        let Some(symbol) = self.symbol(name) else {
            return;
        };
        let Some(function) = self.table.enclosing(self.scope, ScopeKind::Function) else {
            return;
        };
        let existing = self
            .table
            .scope(function)
            .entries(Namespace::Label, symbol)
            .first()
            .map(|e| e.binding);
        let binding = existing.unwrap_or_else(|| {
            let binding = self.table.add_binding(symbol, BindingKind::Label);
            // labels are visible in the whole function body
            self.table.insert(function, Namespace::Label, symbol, binding, 0);
            binding
        });
        let owner = self.table.scope(function).owner;
        if let Some(b) = self.table.binding_mut(binding) {
            b.owner = owner;
        }
        self.record_declaration(name, binding);
        self.set_definition(binding, name);
    }

    fn linkage(&self, storage: StorageClass, scope: ScopeId, is_function: bool) -> Linkage {
        let kind = self.table.scope(scope).kind;
        let namespace_scope = matches!(kind, ScopeKind::Global | ScopeKind::Namespace);
        match storage {
            StorageClass::Typedef => Linkage::None,
            StorageClass::Static if namespace_scope || is_function => Linkage::Internal,
            StorageClass::Extern => Linkage::External,
            _ if namespace_scope || is_function => Linkage::External,
            _ => Linkage::None,
        }
    }

    /// Whether a new declaration denotes the entity of an earlier one
    fn redeclares(&self, earlier: BindingId, kind: BindingKind, linkage: Linkage, storage: StorageClass, key: &Option<String>) -> bool {
        let Some(binding) = self.table.binding(earlier) else {
            return false;
        };
        match (binding.kind, kind) {
            (BindingKind::Typedef, BindingKind::Typedef) => true,
            (a, b) if a.is_function() && b.is_function() => !self.is_cpp() || binding.parameter_key == *key,
            (BindingKind::Variable, BindingKind::Variable) => {
                binding.linkage != Linkage::None && (binding.linkage == linkage || storage == StorageClass::Extern)
            }
            _ => false,
        }
    }

    /// Create or merge the binding a declarator declares
    fn declare_declarator(
        &mut self,
        declarator: NodeRef,
        spec: NodeRef,
        function_template: bool,
        is_definition: bool,
    ) -> Option<BindingId> {
        let ast = self.ast;
        let name = declarator_name(ast, declarator)?;
        if let Some(binding) = self.table.declared.get(&name) {
            return Some(*binding);
        }
        let symbol = self.symbol(name)?;
        let info = ast.get_kind(spec).decl_spec_info().unwrap_or_default();
        let is_function = declares_function(ast, declarator);

        let mut target = self.qualifier_scope(name).unwrap_or_else(|| self.declaring_scope());
        if info.specifiers.contains(FunctionSpecifiers::FRIEND) {
            while self.table.scope(target).kind == ScopeKind::Class {
                match self.table.scope(target).parent {
                    Some(parent) => target = self.table.declaring_scope(parent),
                    None => break,
                }
            }
        }
        let target_kind = self.table.scope(target).kind;
        let class_owner = (target_kind == ScopeKind::Class)
            .then(|| self.table.scope(target).owner)
            .flatten();

        let kind = if info.storage == StorageClass::Typedef {
            BindingKind::Typedef
        } else if is_function {
            if function_template {
                BindingKind::FunctionTemplate
            } else {
                let last = match ast.get_kind(name) {
                    NodeKind::QualifiedName { segments, .. } => segments.last().copied().unwrap_or(name),
                    _ => name,
                };
                let function_kind = match ast.get_kind(last) {
                    NodeKind::OperatorName(_) => FunctionKind::Operator,
                    NodeKind::ConversionName { .. } => FunctionKind::Conversion,
                    _ if symbol.as_str().starts_with('~') => FunctionKind::Destructor,
                    _ if class_owner
                        .and_then(|c| self.table.binding(c))
                        .is_some_and(|c| c.name == symbol) =>
                    {
                        FunctionKind::Constructor
                    }
                    _ if target_kind == ScopeKind::Class => FunctionKind::Method,
                    _ => FunctionKind::Free,
                };
                BindingKind::Function(function_kind)
            }
        } else if target_kind == ScopeKind::Class {
            BindingKind::Field
        } else {
            BindingKind::Variable
        };

        let linkage = self.linkage(info.storage, target, is_function);
        let key = if is_function {
            parameter_types_key(ast, self.tokens, declarator)
        } else {
            None
        };

        let mut candidates: Vec<BindingId> = self
            .table
            .scope(target)
            .entries(Namespace::Ordinary, symbol)
            .iter()
            .map(|e| e.binding)
            .collect();
        let block_scope = matches!(target_kind, ScopeKind::Block | ScopeKind::Function);
        if candidates.is_empty() && block_scope && linkage == Linkage::External {
            // block-scope extern declarations name the file-scope entity
            candidates = match self
                .table
                .lookup(target, &[Namespace::Ordinary], symbol, self.position(name), true)
            {
                Lookup::Found(found) => found,
                _ => Vec::new(),
            };
        }
        let merged = candidates
            .into_iter()
            .rev()
            .find(|c| self.redeclares(*c, kind, linkage, info.storage, &key));

        let binding = match merged {
            Some(binding) => {
                debug!("merge redeclaration of {:?} into {:?}", symbol, binding);
                self.table
                    .insert(target, Namespace::Ordinary, symbol, binding, self.position(name));
                if let Some(b) = self.table.binding_mut(binding) {
                    if is_definition {
                        b.decl_specifier = Some(spec);
                        b.declarator = Some(declarator);
                    }
                    if b.kind == BindingKind::Function(FunctionKind::Free) && kind != b.kind {
                        b.kind = kind;
                    }
                }
                binding
            }
            None => {
                let binding = self.table.add_binding(symbol, kind);
                let owner = class_owner.or_else(|| self.scope_owner(target));
                if let Some(b) = self.table.binding_mut(binding) {
                    b.owner = owner;
                    b.linkage = linkage;
                    b.decl_specifier = Some(spec);
                    b.declarator = Some(declarator);
                    b.parameter_key = key;
                }
                self.table
                    .insert(target, Namespace::Ordinary, symbol, binding, self.position(name));
                binding
            }
        };
        self.record_declaration(name, binding);

        let has_initializer = matches!(
            ast.get_kind(declarator),
            NodeKind::Declarator(DeclaratorData { initializer: Some(_), .. })
        );
        if is_definition || has_initializer {
            self.set_definition(binding, name);
        } else if info.storage == StorageClass::Extern
            && let Some(b) = self.table.binding_mut(binding)
            && b.state != DefinitionState::Defined
        {
            b.state = DefinitionState::DeclaredOnly;
        }

        if is_function {
            self.declare_parameters(binding, declarator);
        }
        Some(binding)
    }

    /// Parameters of a function declarator share bindings by position with
    /// every other declaration of the same function
    fn declare_parameters(&mut self, function: BindingId, declarator: NodeRef) {
        let ast = self.ast;
        let Some(function_declarator) = function_declarator(ast, declarator) else {
            return;
        };
        let NodeKind::Declarator(data) = ast.get_kind(function_declarator) else {
            return;
        };
        // (name, parameter declaration)
        let parameters: Vec<(Option<NodeRef>, Option<NodeRef>)> = match &data.suffix {
            DeclaratorSuffix::Function(suffix) => {
                let list: Vec<_> = suffix
                    .parameters
                    .iter()
                    .map(|p| match ast.get_kind(*p) {
                        NodeKind::ParameterDeclaration { declarator, .. } => (declarator_name(ast, *declarator), Some(*p)),
                        _ => (None, None),
                    })
                    .collect();
                if list.len() == 1 && list[0].0.is_none() && self.is_void_parameter(list[0].1) {
                    Vec::new()
                } else {
                    list
                }
            }
            DeclaratorSuffix::KnRFunction { parameter_names, .. } => {
                parameter_names.iter().map(|n| (Some(*n), None)).collect()
            }
            _ => return,
        };

        for (index, (name, declaration)) in parameters.into_iter().enumerate() {
            let existing = self.table.binding(function).and_then(|f| f.parameters.get(index).copied());
            let symbol = name.and_then(|n| self.symbol(n)).unwrap_or_else(|| Symbol::new(""));
            let parameter = match existing {
                Some(parameter) => parameter,
                None => {
                    let parameter = self.table.add_binding(symbol, BindingKind::Parameter);
                    if let Some(f) = self.table.binding_mut(function) {
                        f.parameters.push(parameter);
                    }
                    parameter
                }
            };
            if let Some(p) = self.table.binding_mut(parameter) {
                p.owner = Some(function);
                if p.name.as_str().is_empty() {
                    p.name = symbol;
                }
                if p.decl_specifier.is_none()
                    && let Some(NodeKind::ParameterDeclaration {
                        decl_specifier,
                        declarator,
                    }) = declaration.map(|d| ast.get_kind(d))
                {
                    p.decl_specifier = Some(*decl_specifier);
                    p.declarator = Some(*declarator);
                }
            }
            if let Some(name) = name {
                self.record_declaration(name, parameter);
            }
        }
    }

    fn is_void_parameter(&self, declaration: Option<NodeRef>) -> bool {
        let Some(NodeKind::ParameterDeclaration {
            decl_specifier,
            declarator,
        }) = declaration.map(|d| self.ast.get_kind(d))
        else {
            return false;
        };
        let plain = matches!(
            self.ast.get_kind(*declarator),
            NodeKind::Declarator(data) if data.pointer_ops.is_empty() && data.nested.is_none() && data.suffix == DeclaratorSuffix::Plain
        );
        plain
            && matches!(
                self.ast.get_kind(*decl_specifier),
                NodeKind::SimpleDeclSpecifier {
                    basic: BasicType::Void,
                    ..
                }
            )
    }

    /// Make the named parameters of a function declarator visible in `scope`
    fn insert_parameters(&mut self, declarator: NodeRef, scope: ScopeId) {
        let ast = self.ast;
        let Some(function_declarator) = function_declarator(ast, declarator) else {
            return;
        };
        let NodeKind::Declarator(data) = ast.get_kind(function_declarator) else {
            return;
        };
        let names: Vec<NodeRef> = match &data.suffix {
            DeclaratorSuffix::Function(suffix) => suffix
                .parameters
                .iter()
                .filter_map(|p| match ast.get_kind(*p) {
                    NodeKind::ParameterDeclaration { declarator, .. } => declarator_name(ast, *declarator),
                    _ => None,
                })
                .collect(),
            DeclaratorSuffix::KnRFunction { parameter_names, .. } => parameter_names.to_vec(),
            _ => Vec::new(),
        };
        for name in names {
            if let (Some(binding), Some(symbol)) = (self.table.declared.get(&name).copied(), self.symbol(name)) {
                self.table
                    .insert(scope, Namespace::Ordinary, symbol, binding, self.position(name));
            }
        }
    }

    /// Bind K&R parameter declarations to the identifier-list slot of the same name
    fn declare_knr_parameters(&mut self, declarator: NodeRef, function: Option<BindingId>) {
        let ast = self.ast;
        let Some(function_declarator) = function_declarator(ast, declarator) else {
            return;
        };
        let NodeKind::Declarator(DeclaratorData {
            suffix:
                DeclaratorSuffix::KnRFunction {
                    parameter_names,
                    parameter_declarations,
                },
            ..
        }) = ast.get_kind(function_declarator)
        else {
            return;
        };
        for declaration in parameter_declarations {
            let NodeKind::SimpleDeclaration {
                decl_specifier,
                declarators,
            } = ast.get_kind(*declaration)
            else {
                continue;
            };
            for d in declarators {
                let Some(name) = declarator_name(ast, *d) else {
                    continue;
                };
                let symbol = self.symbol(name);
                let slot = parameter_names.iter().position(|n| self.symbol(*n) == symbol);
                let parameter = slot
                    .and_then(|i| function.and_then(|f| self.table.binding(f)).and_then(|f| f.parameters.get(i).copied()))
                    .or_else(|| slot.and_then(|i| self.table.declared.get(&parameter_names[i]).copied()));
                if let Some(parameter) = parameter {
                    self.record_declaration(name, parameter);
                    if let Some(p) = self.table.binding_mut(parameter) {
                        p.decl_specifier = Some(*decl_specifier);
                        p.declarator = Some(*d);
                    }
                }
            }
        }
    }

    /// Insert the name a declarator declares into `scope` with a new kind
    fn insert_declared(&mut self, declarator: NodeRef, scope: ScopeId, kind: BindingKind) {
        let Some(name) = declarator_name(self.ast, declarator) else {
            return;
        };
        let (Some(binding), Some(symbol)) = (self.table.declared.get(&name).copied(), self.symbol(name)) else {
            return;
        };
        if let Some(b) = self.table.binding_mut(binding) {
            b.kind = kind;
        }
        self.table
            .insert(scope, Namespace::Ordinary, symbol, binding, self.position(name));
    }
}
