//! Types of bindings and expressions.
//!
//! Declared types are read back from the declaration specifier and
//! declarator a binding remembers. Expression types are computed on demand
//! and cached per node.

use log::trace;

use crate::ast::*;

use super::binding::{BindingId, BindingKind};
use super::builtins::{BuiltinShape, FUNCTION_NAME_VARIABLES, builtin_shape};
use super::resolver::BindingResolver;
use super::symbol_table::ScopeKind;
use super::types::Type;

impl BindingResolver {
    /// Declared type of an entity. Types name themselves, typedefs yield the
    /// aliased type.
    pub fn type_of(&self, binding: BindingId) -> Type {
        let Some(b) = self.binding(binding) else {
            return Type::Problem;
        };
        match b.kind {
            BindingKind::Composite(_)
            | BindingKind::Enumeration
            | BindingKind::ClassTemplate(_)
            | BindingKind::TemplateInstance
            | BindingKind::TemplateParameter
                if b.decl_specifier.is_none() =>
            {
                Type::Named {
                    binding,
                    name: b.name,
                }
            }
            BindingKind::Enumerator => match b.owner {
                Some(owner) if self.lang().is_cpp() => Type::Named {
                    binding: owner,
                    name: self.binding_name(owner).unwrap_or_else(|| Symbol::new("")),
                },
                _ => Type::int(),
            },
            BindingKind::Builtin => self.builtin_type(b.name),
            BindingKind::Parameter if b.decl_specifier.is_none() => Type::int(),
            BindingKind::Variable
            | BindingKind::Parameter
            | BindingKind::Field
            | BindingKind::Function(_)
            | BindingKind::FunctionTemplate
            | BindingKind::Typedef
            | BindingKind::TemplateParameter => match (b.decl_specifier, b.declarator) {
                (Some(spec), Some(declarator)) => self.declarator_type(self.specifier_type(spec), declarator),
                (Some(spec), None) => self.specifier_type(spec),
                _ => Type::Problem,
            },
            _ => Type::Problem,
        }
    }

    fn builtin_type(&self, name: Symbol) -> Type {
        if FUNCTION_NAME_VARIABLES.contains(&name.as_str()) {
            return Type::Array(Box::new(
                Type::basic(BasicType::Char).qualified(TypeQualifiers::CONST),
            ));
        }
        match builtin_shape(name.as_str()) {
            Some(BuiltinShape::Type) => Type::Named {
                binding: self
                    .symbol_table()
                    .bindings()
                    .find(|b| b.name == name)
                    .map_or(BindingId::Declared(0), |b| b.id),
                name,
            },
            Some(BuiltinShape::Function(basic, modifiers)) => Type::Function {
                result: Box::new(Type::Basic { basic, modifiers }),
                parameters: Vec::new(),
                varargs: true,
            },
            Some(BuiltinShape::PointerFunction) => Type::Function {
                result: Box::new(Type::basic(BasicType::Void).pointer_to()),
                parameters: Vec::new(),
                varargs: true,
            },
            None => Type::Problem,
        }
    }

    /// Type named by a declaration specifier, qualifiers included
    pub fn specifier_type(&self, spec: NodeRef) -> Type {
        let ast = self.ast();
        let kind = ast.get_kind(spec);
        let qualifiers = kind.decl_spec_info().map(|i| i.qualifiers).unwrap_or_default();
        let ty = match kind {
            NodeKind::SimpleDeclSpecifier {
                basic,
                modifiers,
                type_expr,
                ..
            } => match (basic, type_expr) {
                (BasicType::Typeof | BasicType::Decltype, Some(operand)) => match ast.get_kind(*operand) {
                    NodeKind::TypeId { .. } => self.type_id_type(*operand),
                    _ => self.expression_type(*operand),
                },
                _ => Type::Basic {
                    basic: *basic,
                    modifiers: *modifiers,
                },
            },
            NodeKind::NamedTypeSpecifier { name, .. } => {
                let binding = self.resolve_binding(*name);
                self.named_type(binding)
            }
            NodeKind::ElaboratedTypeSpecifier { name, .. } => {
                let binding = self.resolve_binding(*name);
                self.named_type(binding)
            }
            NodeKind::CompositeTypeSpecifier { .. } | NodeKind::EnumerationSpecifier { .. } => {
                match self.symbol_table().specifiers.get(&spec) {
                    Some(binding) => Type::Named {
                        binding: *binding,
                        name: self.binding_name(*binding).unwrap_or_else(|| Symbol::new("")),
                    },
                    None => Type::Problem,
                }
            }
            _ => Type::Problem,
        };
        ty.qualified(qualifiers)
    }

    fn named_type(&self, binding: BindingId) -> Type {
        match self.binding_kind(binding) {
            Some(BindingKind::Typedef) => self.type_of(binding),
            Some(
                BindingKind::Composite(_)
                | BindingKind::Enumeration
                | BindingKind::ClassTemplate(_)
                | BindingKind::TemplateInstance
                | BindingKind::TemplateParameter
                | BindingKind::Builtin,
            ) => Type::Named {
                binding,
                name: self.binding_name(binding).unwrap_or_else(|| Symbol::new("")),
            },
            _ => Type::Problem,
        }
    }

    /// Apply a declarator to the type of its specifier
    pub fn declarator_type(&self, base: Type, declarator: NodeRef) -> Type {
        let ast = self.ast();
        let NodeKind::Declarator(data) = ast.get_kind(declarator) else {
            return base;
        };
        let mut ty = base;
        for op in &data.pointer_ops {
            ty = match ast.get_kind(*op) {
                NodeKind::Pointer { qualifiers } => ty.pointer_to().qualified(*qualifiers),
                NodeKind::Reference { rvalue } => Type::Reference {
                    target: Box::new(ty),
                    rvalue: *rvalue,
                },
                NodeKind::PointerToMember { class_name, qualifiers } => Type::PointerToMember {
                    class: self.resolve_binding(*class_name),
                    target: Box::new(ty),
                }
                .qualified(*qualifiers),
                _ => ty,
            };
        }
        match &data.suffix {
            DeclaratorSuffix::Array(modifiers) => {
                for _ in modifiers.iter() {
                    ty = Type::Array(Box::new(ty));
                }
            }
            DeclaratorSuffix::Function(suffix) => {
                let result = match suffix.trailing_return {
                    Some(trailing) => self.type_id_type(trailing),
                    None => ty,
                };
                let mut parameters: Vec<Type> = suffix
                    .parameters
                    .iter()
                    .filter_map(|p| match ast.get_kind(*p) {
                        NodeKind::ParameterDeclaration {
                            decl_specifier,
                            declarator,
                        } => Some(self.declarator_type(self.specifier_type(*decl_specifier), *declarator)),
                        _ => None,
                    })
                    .map(adjust_parameter)
                    .collect();
                if parameters.len() == 1 && parameters[0] == Type::basic(BasicType::Void) {
                    parameters.clear();
                }
                ty = Type::Function {
                    result: Box::new(result),
                    parameters,
                    varargs: suffix.varargs,
                };
            }
            DeclaratorSuffix::KnRFunction { parameter_names, .. } => {
                let parameters = parameter_names
                    .iter()
                    .map(|name| {
                        let binding = self.resolve_binding(*name);
                        match self.binding(binding) {
                            // the parameter's own declarator is this one for unlisted types
                            Some(b) if b.declarator.is_some_and(|d| d != declarator) => {
                                adjust_parameter(self.type_of(binding))
                            }
                            _ => Type::int(),
                        }
                    })
                    .collect();
                ty = Type::Function {
                    result: Box::new(ty),
                    parameters,
                    varargs: false,
                };
            }
            DeclaratorSuffix::Plain | DeclaratorSuffix::BitField(_) => {}
        }
        match data.nested {
            Some(nested) => self.declarator_type(ty, nested),
            None => ty,
        }
    }

    pub fn type_id_type(&self, type_id: NodeRef) -> Type {
        match self.ast().get_kind(type_id) {
            NodeKind::TypeId {
                decl_specifier,
                declarator,
            } => self.declarator_type(self.specifier_type(*decl_specifier), *declarator),
            _ => Type::Problem,
        }
    }

    /// Type of an expression, computed once per node
    pub fn expression_type(&self, expression: NodeRef) -> Type {
        if let Some(ty) = self.expression_types.borrow().get(&expression) {
            return ty.clone();
        }
        let ty = self.compute_expression_type(expression);
        trace!("type of {:?} is {}", expression, ty);
        self.expression_types
            .borrow_mut()
            .entry(expression)
            .or_insert(ty)
            .clone()
    }

    fn compute_expression_type(&self, expression: NodeRef) -> Type {
        let ast = self.ast();
        let cpp = self.lang().is_cpp();
        let truth = || if cpp { Type::bool() } else { Type::int() };
        let size = || Type::Basic {
            basic: BasicType::Int,
            modifiers: TypeModifiers::UNSIGNED | TypeModifiers::LONG,
        };
        match ast.get_kind(expression) {
            NodeKind::IdExpression { name } => {
                let binding = self.resolve_binding(*name);
                match self.binding_kind(binding) {
                    Some(
                        BindingKind::Variable
                        | BindingKind::Parameter
                        | BindingKind::Field
                        | BindingKind::Function(_)
                        | BindingKind::FunctionTemplate
                        | BindingKind::Enumerator
                        | BindingKind::Builtin
                        | BindingKind::TemplateParameter,
                    ) => self.type_of(binding),
                    _ => Type::Problem,
                }
            }
            NodeKind::Literal { kind, value } => literal_type(*kind, value.as_str(), cpp)
                .unwrap_or_else(|| self.this_type(expression)),
            NodeKind::Unary { op, operand } => {
                if let Some(function) = self.overloaded_operator(expression) {
                    return self.call_result(function);
                }
                let operand_type = self.expression_type(*operand);
                match op {
                    UnaryOp::Deref => operand_type.pointee().cloned().unwrap_or(Type::Problem),
                    UnaryOp::AddrOf => operand_type.strip_references().clone().pointer_to(),
                    UnaryOp::LogicNot => truth(),
                    UnaryOp::Sizeof | UnaryOp::Alignof | UnaryOp::SizeofPack => size(),
                    UnaryOp::Noexcept => Type::bool(),
                    UnaryOp::Typeid => Type::Problem,
                    _ => operand_type.strip_references().strip_qualifiers().clone(),
                }
            }
            NodeKind::Binary { op, left, right } => {
                if let Some(function) = self.overloaded_operator(expression) {
                    return self.call_result(function);
                }
                let left_type = self.expression_type(*left);
                let right_type = self.expression_type(*right);
                if op.is_assignment() {
                    return left_type;
                }
                match op {
                    BinaryOp::Comma => right_type,
                    _ if op.is_comparison() => truth(),
                    BinaryOp::Sub if left_type.is_pointer_like() && right_type.is_pointer_like() => Type::Basic {
                        basic: BasicType::Int,
                        modifiers: TypeModifiers::LONG,
                    },
                    BinaryOp::PointerToMemberDot | BinaryOp::PointerToMemberArrow => {
                        match right_type.strip_references() {
                            Type::PointerToMember { target, .. } => (**target).clone(),
                            _ => Type::Problem,
                        }
                    }
                    _ if left_type.is_pointer_like() => decay(left_type),
                    _ if right_type.is_pointer_like() => decay(right_type),
                    _ => arithmetic_result(left_type, right_type),
                }
            }
            NodeKind::Conditional {
                positive, negative, ..
            } => match positive {
                Some(positive) => self.expression_type(*positive),
                None => self.expression_type(*negative),
            },
            NodeKind::Cast { type_id, .. } => self.type_id_type(*type_id),
            NodeKind::FunctionCall { function, .. } => {
                if let Some(operator) = self.overloaded_operator(expression) {
                    return self.call_result(operator);
                }
                if let NodeKind::IdExpression { name } = ast.get_kind(*function) {
                    let callee = self.resolve_binding(*name);
                    if self.binding_kind(callee).is_some_and(BindingKind::is_type) {
                        // `T(args)` constructs a T
                        return self.named_type(callee);
                    }
                    if self.binding_kind(callee).is_some_and(BindingKind::is_function) {
                        return self.call_result(callee);
                    }
                }
                let callee_type = self.expression_type(*function);
                let function_type = match callee_type.pointee() {
                    Some(target) => target.clone(),
                    None => callee_type.strip_references().clone(),
                };
                match function_type.strip_qualifiers() {
                    Type::Function { result, .. } => (**result).clone(),
                    _ => Type::Problem,
                }
            }
            NodeKind::ArraySubscript { array, .. } => {
                if let Some(operator) = self.overloaded_operator(expression) {
                    return self.call_result(operator);
                }
                self.expression_type(*array).pointee().cloned().unwrap_or(Type::Problem)
            }
            NodeKind::FieldReference { name, .. } => {
                let member = self.resolve_binding(*name);
                if self.is_problem(member) {
                    Type::Problem
                } else {
                    self.type_of(member)
                }
            }
            NodeKind::TypeIdExpression { op, type_id } => match op {
                TypeIdOp::Sizeof | TypeIdOp::Alignof => size(),
                TypeIdOp::Typeof => self.type_id_type(*type_id),
                TypeIdOp::Typeid => Type::Problem,
            },
            NodeKind::TypeIdInitializerExpression { type_id, .. } => self.type_id_type(*type_id),
            NodeKind::SimpleTypeConstructor { decl_specifier, .. } => self.specifier_type(*decl_specifier),
            NodeKind::New { type_id, .. } => {
                let allocated = self.type_id_type(*type_id);
                match allocated {
                    Type::Array(element) => element.pointer_to(),
                    other => other.pointer_to(),
                }
            }
            NodeKind::Delete { .. } | NodeKind::Throw { .. } => Type::basic(BasicType::Void),
            NodeKind::CompoundStatementExpression { body } => match ast.get_kind(*body) {
                NodeKind::CompoundStatement { statements } => match statements.last().map(|s| ast.get_kind(*s)) {
                    Some(NodeKind::ExpressionStatement { expression }) => self.expression_type(*expression),
                    _ => Type::basic(BasicType::Void),
                },
                _ => Type::Problem,
            },
            NodeKind::LabelReference { .. } => Type::basic(BasicType::Void).pointer_to(),
            NodeKind::BuiltinVaArg { type_id, .. } => self.type_id_type(*type_id),
            NodeKind::BuiltinOffsetof { .. } => size(),
            NodeKind::TypesCompatible { .. } => Type::int(),
            _ => Type::Problem,
        }
    }

    /// Result type of calling a function binding
    pub(crate) fn call_result(&self, function: BindingId) -> Type {
        match self.type_of(function) {
            Type::Function { result, .. } => *result,
            _ => Type::Problem,
        }
    }

    /// Type of `this` at an expression: pointer to the enclosing class
    fn this_type(&self, expression: NodeRef) -> Type {
        let table = self.symbol_table();
        let mut scope = Some(self.scope_of(expression));
        while let Some(id) = scope {
            let s = table.scope(id);
            if s.kind == ScopeKind::Class
                && let Some(class) = s.owner
            {
                return Type::Named {
                    binding: class,
                    name: self.binding_name(class).unwrap_or_else(|| Symbol::new("")),
                }
                .pointer_to();
            }
            scope = s.parent;
        }
        Type::Problem
    }

    /// Result of a class type's `operator->`
    pub(crate) fn arrow_operator_result(&self, owner_type: &Type) -> Option<Type> {
        let class = owner_type.composite_binding()?;
        let operator = self
            .members(class, Symbol::new(&OverloadedOperator::Arrow.function_name()))
            .into_iter()
            .next()?;
        Some(self.call_result(operator))
    }

    /// The user-declared operator function an expression invokes, if any
    pub fn overloaded_operator(&self, expression: NodeRef) -> Option<BindingId> {
        if !self.lang().is_cpp() {
            return None;
        }
        let ast = self.ast();
        match ast.get_kind(expression) {
            NodeKind::Unary { op, operand } => {
                let operator = op.overloaded()?;
                let operand_type = self.expression_type(*operand);
                operand_type.composite_binding()?;
                // postfix forms take a dummy int
                let extra = usize::from(op.is_postfix());
                let mut argument_types = vec![class_key(&operand_type)];
                argument_types.extend(std::iter::repeat_n(Type::int().to_string(), extra));
                self.find_operator(expression, operator, &operand_type, &argument_types)
            }
            NodeKind::Binary { op, left, right } => {
                if matches!(op, BinaryOp::PointerToMemberDot) {
                    return None;
                }
                let operator = op.overloaded();
                let left_type = self.expression_type(*left);
                let right_type = self.expression_type(*right);
                let argument_types = vec![class_key(&left_type), class_key(&right_type)];
                if left_type.composite_binding().is_none() && right_type.composite_binding().is_none() {
                    return None;
                }
                self.find_operator(expression, operator, &left_type, &argument_types)
            }
            NodeKind::FunctionCall { function, arguments } => {
                let callee_type = self.expression_type(*function);
                if matches!(ast.get_kind(*function), NodeKind::IdExpression { name } if self.binding_kind(self.resolve_binding(*name)).is_some_and(BindingKind::is_type))
                {
                    return None;
                }
                let class = callee_type.composite_binding()?;
                let candidates = self.members(class, Symbol::new(&OverloadedOperator::Call.function_name()));
                if candidates.is_empty() {
                    return None;
                }
                let argument_types: Vec<String> = arguments.iter().map(|a| class_key(&self.expression_type(*a))).collect();
                self.best_by_arguments(&candidates, &argument_types)
                    .or_else(|| candidates.first().copied())
            }
            NodeKind::ArraySubscript { array, index } => {
                let class = self.expression_type(*array).composite_binding()?;
                let candidates = self.members(class, Symbol::new(&OverloadedOperator::Subscript.function_name()));
                let argument_types = vec![class_key(&self.expression_type(*index))];
                self.best_by_arguments(&candidates, &argument_types)
                    .or_else(|| candidates.first().copied())
            }
            _ => None,
        }
    }

    /// Member operator of the first operand's class, else a non-member operator
    /// visible at the expression
    fn find_operator(
        &self,
        expression: NodeRef,
        operator: OverloadedOperator,
        first: &Type,
        argument_types: &[String],
    ) -> Option<BindingId> {
        let symbol = Symbol::new(&operator.function_name());
        if let Some(class) = first.composite_binding() {
            let members = self.members(class, symbol);
            if let Some(found) = self.best_by_arguments(&members, &argument_types[1..]) {
                return Some(found);
            }
        }
        let free = self
            .lookup_in_context(expression, symbol, &[crate::semantic::Namespace::Ordinary])
            .unwrap_or_default();
        let free: Vec<BindingId> = free
            .into_iter()
            .filter(|b| self.binding_kind(*b).is_some_and(BindingKind::is_function))
            .collect();
        self.best_by_arguments(&free, argument_types)
    }
}

/// Rendering used to match an argument against a parameter type
fn class_key(ty: &Type) -> String {
    ty.strip_references().strip_qualifiers().to_string()
}

/// Arrays and functions passed as parameters become pointers
fn adjust_parameter(ty: Type) -> Type {
    match ty {
        Type::Array(element) => element.pointer_to(),
        f @ Type::Function { .. } => f.pointer_to(),
        other => other,
    }
}

fn decay(ty: Type) -> Type {
    match ty.strip_references().clone() {
        Type::Array(element) => element.pointer_to(),
        other => other,
    }
}

fn arithmetic_result(left: Type, right: Type) -> Type {
    let rank = |t: &Type| match t.strip_references().strip_qualifiers() {
        Type::Basic {
            basic: BasicType::Double,
            ..
        } => 3,
        Type::Basic {
            basic: BasicType::Float,
            ..
        } => 2,
        Type::Basic { .. } => 1,
        _ => 0,
    };
    let left = left.strip_references().strip_qualifiers().clone();
    let right = right.strip_references().strip_qualifiers().clone();
    if rank(&right) > rank(&left) { right } else { left }
}

/// Type of a literal; `None` for `this`, which depends on its position
fn literal_type(kind: LiteralKind, value: &str, cpp: bool) -> Option<Type> {
    let ty = match kind {
        LiteralKind::Integer => {
            let suffix: String = value
                .trim_start_matches("0x")
                .trim_start_matches("0X")
                .chars()
                .rev()
                .take_while(|c| matches!(c, 'u' | 'U' | 'l' | 'L'))
                .collect::<String>()
                .to_ascii_lowercase();
            let mut modifiers = TypeModifiers::empty();
            if suffix.contains('u') {
                modifiers |= TypeModifiers::UNSIGNED;
            }
            if suffix.contains("ll") {
                modifiers |= TypeModifiers::LONG_LONG;
            } else if suffix.contains('l') {
                modifiers |= TypeModifiers::LONG;
            }
            Type::Basic {
                basic: BasicType::Int,
                modifiers,
            }
        }
        LiteralKind::Float => {
            if value.ends_with(['f', 'F']) {
                Type::basic(BasicType::Float)
            } else {
                Type::basic(BasicType::Double)
            }
        }
        LiteralKind::Char => {
            if cpp {
                Type::basic(BasicType::Char)
            } else {
                Type::int()
            }
        }
        LiteralKind::String => Type::Array(Box::new(
            Type::basic(BasicType::Char).qualified(TypeQualifiers::CONST),
        )),
        LiteralKind::True | LiteralKind::False => Type::bool(),
        LiteralKind::Nullptr => Type::basic(BasicType::Void).pointer_to(),
        LiteralKind::This => return None,
    };
    Some(ty)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_suffixes() {
        assert_eq!(literal_type(LiteralKind::Integer, "10", false), Some(Type::int()));
        assert_eq!(
            literal_type(LiteralKind::Integer, "10ul", false).map(|t| t.to_string()),
            Some("unsigned long int".to_string())
        );
        assert_eq!(literal_type(LiteralKind::Float, "1.5f", true), Some(Type::basic(BasicType::Float)));
        assert_eq!(literal_type(LiteralKind::Char, "'a'", false), Some(Type::int()));
        assert_eq!(literal_type(LiteralKind::This, "this", true), None);
    }
}
