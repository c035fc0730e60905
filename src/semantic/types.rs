//! Types of declared entities and expressions.
//!
//! The model is deliberately shallow: it names class types by their binding
//! and keeps just enough structure to follow pointers, references, arrays and
//! function results when typing member accesses and operator calls.

use std::fmt;

use crate::ast::signature::{basic_type_name, qualifier_names};
use crate::ast::{BasicType, Symbol, TypeModifiers, TypeQualifiers};

use super::BindingId;

#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Basic {
        basic: BasicType,
        modifiers: TypeModifiers,
    },
    /// Class, enumeration or template parameter named by a binding
    Named {
        binding: BindingId,
        name: Symbol,
    },
    Pointer(Box<Type>),
    Reference {
        target: Box<Type>,
        rvalue: bool,
    },
    Array(Box<Type>),
    Function {
        result: Box<Type>,
        parameters: Vec<Type>,
        varargs: bool,
    },
    PointerToMember {
        class: BindingId,
        target: Box<Type>,
    },
    Qualified {
        qualifiers: TypeQualifiers,
        inner: Box<Type>,
    },
    /// Type could not be determined
    Problem,
}

impl Type {
    pub fn basic(basic: BasicType) -> Type {
        Type::Basic {
            basic,
            modifiers: TypeModifiers::empty(),
        }
    }

    pub fn int() -> Type {
        Type::basic(BasicType::Int)
    }

    pub fn bool() -> Type {
        Type::basic(BasicType::Bool)
    }

    pub fn pointer_to(self) -> Type {
        Type::Pointer(Box::new(self))
    }

    pub fn qualified(self, qualifiers: TypeQualifiers) -> Type {
        if qualifiers.is_empty() || self == Type::Problem {
            return self;
        }
        match self {
            Type::Qualified { qualifiers: q, inner } => Type::Qualified {
                qualifiers: q | qualifiers,
                inner,
            },
            other => Type::Qualified {
                qualifiers,
                inner: Box::new(other),
            },
        }
    }

    pub fn is_problem(&self) -> bool {
        matches!(self, Type::Problem)
    }

    pub fn strip_qualifiers(&self) -> &Type {
        match self {
            Type::Qualified { inner, .. } => inner.strip_qualifiers(),
            other => other,
        }
    }

    /// The referenced type of a reference, qualifiers removed
    pub fn strip_references(&self) -> &Type {
        match self.strip_qualifiers() {
            Type::Reference { target, .. } => target.strip_references(),
            other => other,
        }
    }

    /// Target of a pointer or element of an array, for `*p`, `p->m` and `p[i]`
    pub fn pointee(&self) -> Option<&Type> {
        match self.strip_references() {
            Type::Pointer(target) | Type::Array(target) => Some(target),
            _ => None,
        }
    }

    /// Binding of the class this type names, looking through qualifiers and references
    pub fn composite_binding(&self) -> Option<BindingId> {
        match self.strip_references() {
            Type::Named { binding, .. } => Some(*binding),
            _ => None,
        }
    }

    pub fn is_pointer_like(&self) -> bool {
        matches!(self.strip_references(), Type::Pointer(_) | Type::Array(_))
    }

    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self.strip_references(),
            Type::Basic { basic, .. } if !matches!(basic, BasicType::Void | BasicType::Auto)
        )
    }

    fn fmt_prefix(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Basic { basic, modifiers } => f.write_str(&basic_type_name(*basic, *modifiers)),
            Type::Named { name, .. } => f.write_str(name.as_str()),
            Type::Qualified { qualifiers, inner } => {
                let is_simple = matches!(**inner, Type::Basic { .. } | Type::Named { .. });
                if is_simple {
                    write!(f, "{} ", qualifier_names(*qualifiers))?;
                    inner.fmt_prefix(f)
                } else {
                    inner.fmt_prefix(f)?;
                    write!(f, " {}", qualifier_names(*qualifiers))
                }
            }
            Type::Pointer(target) => {
                target.fmt_prefix(f)?;
                if target.needs_parens() {
                    f.write_str(" (*")
                } else {
                    f.write_str(" *")
                }
            }
            Type::Reference { target, rvalue } => {
                target.fmt_prefix(f)?;
                let op = if *rvalue { "&&" } else { "&" };
                if target.needs_parens() {
                    write!(f, " ({op}")
                } else {
                    write!(f, " {op}")
                }
            }
            Type::PointerToMember { target, .. } => {
                target.fmt_prefix(f)?;
                f.write_str(" ::*")
            }
            Type::Array(element) => element.fmt_prefix(f),
            Type::Function { result, .. } => result.fmt_prefix(f),
            Type::Problem => f.write_str("?"),
        }
    }

    fn fmt_suffix(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Pointer(target) | Type::Reference { target, .. } | Type::PointerToMember { target, .. } => {
                if target.needs_parens() {
                    f.write_str(")")?;
                }
                target.fmt_suffix(f)
            }
            Type::Qualified { inner, .. } => inner.fmt_suffix(f),
            Type::Array(element) => {
                f.write_str(" []")?;
                element.fmt_suffix(f)
            }
            Type::Function {
                result,
                parameters,
                varargs,
            } => {
                f.write_str(" (")?;
                for (i, p) in parameters.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{p}")?;
                }
                if *varargs {
                    if !parameters.is_empty() {
                        f.write_str(", ")?;
                    }
                    f.write_str("...")?;
                }
                f.write_str(")")?;
                result.fmt_suffix(f)
            }
            _ => Ok(()),
        }
    }

    fn needs_parens(&self) -> bool {
        matches!(self, Type::Array(_) | Type::Function { .. })
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = Prefix(self).to_string();
        let suffix = Suffix(self).to_string();
        let suffix = suffix.trim_start_matches(' ');
        if suffix.starts_with('(') || suffix.starts_with('[') {
            write!(f, "{prefix} {suffix}")
        } else {
            write!(f, "{prefix}{suffix}")
        }
    }
}

struct Prefix<'a>(&'a Type);
struct Suffix<'a>(&'a Type);

impl fmt::Display for Prefix<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt_prefix(f)
    }
}

impl fmt::Display for Suffix<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt_suffix(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_declarator_shapes() {
        assert_eq!(Type::int().to_string(), "int");
        assert_eq!(Type::int().qualified(TypeQualifiers::CONST).to_string(), "const int");
        assert_eq!(Type::int().pointer_to().to_string(), "int *");
        assert_eq!(
            Type::Reference {
                target: Box::new(Type::int()),
                rvalue: false
            }
            .to_string(),
            "int &"
        );
        assert_eq!(Type::Array(Box::new(Type::int())).to_string(), "int []");
        let function = Type::Function {
            result: Box::new(Type::int()),
            parameters: vec![Type::int(), Type::basic(BasicType::Char)],
            varargs: false,
        };
        assert_eq!(function.to_string(), "int (int, char)");
        assert_eq!(function.pointer_to().to_string(), "int (*) (int, char)");
        assert_eq!(Type::Problem.to_string(), "?");
    }

    #[test]
    fn references_and_qualifiers_are_transparent_for_members() {
        let class = Type::Named {
            binding: BindingId::Declared(3),
            name: Symbol::new("S"),
        };
        let reference = Type::Reference {
            target: Box::new(class.clone().qualified(TypeQualifiers::CONST)),
            rvalue: false,
        };
        assert_eq!(reference.composite_binding(), Some(BindingId::Declared(3)));
        assert_eq!(class.pointer_to().pointee().and_then(Type::composite_binding), Some(BindingId::Declared(3)));
    }
}
