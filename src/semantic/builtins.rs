//! Compiler-provided names.

use crate::ast::{BasicType, TypeModifiers};

/// Shape of a builtin: a type name or a function returning a basic type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinShape {
    Type,
    Function(BasicType, TypeModifiers),
    /// Returns `void *`
    PointerFunction,
}

/// GNU builtins visible at file scope
pub const GNU_BUILTINS: &[(&str, BuiltinShape)] = &[
    ("__builtin_va_list", BuiltinShape::Type),
    ("__builtin_expect", BuiltinShape::Function(BasicType::Int, TypeModifiers::LONG)),
    ("__builtin_va_start", BuiltinShape::Function(BasicType::Void, TypeModifiers::empty())),
    ("__builtin_va_end", BuiltinShape::Function(BasicType::Void, TypeModifiers::empty())),
    ("__builtin_va_copy", BuiltinShape::Function(BasicType::Void, TypeModifiers::empty())),
    ("__builtin_constant_p", BuiltinShape::Function(BasicType::Int, TypeModifiers::empty())),
    ("__builtin_unreachable", BuiltinShape::Function(BasicType::Void, TypeModifiers::empty())),
    ("__builtin_trap", BuiltinShape::Function(BasicType::Void, TypeModifiers::empty())),
    ("__builtin_abort", BuiltinShape::Function(BasicType::Void, TypeModifiers::empty())),
    ("__builtin_memcpy", BuiltinShape::PointerFunction),
    ("__builtin_memset", BuiltinShape::PointerFunction),
    ("__builtin_alloca", BuiltinShape::PointerFunction),
    ("__builtin_return_address", BuiltinShape::PointerFunction),
    ("__builtin_frame_address", BuiltinShape::PointerFunction),
    ("__builtin_strlen", BuiltinShape::Function(BasicType::Int, TypeModifiers::UNSIGNED.union(TypeModifiers::LONG))),
    ("__builtin_clz", BuiltinShape::Function(BasicType::Int, TypeModifiers::empty())),
    ("__builtin_ctz", BuiltinShape::Function(BasicType::Int, TypeModifiers::empty())),
    ("__builtin_popcount", BuiltinShape::Function(BasicType::Int, TypeModifiers::empty())),
    ("__builtin_bswap32", BuiltinShape::Function(BasicType::Int, TypeModifiers::UNSIGNED)),
    ("__builtin_bswap64", BuiltinShape::Function(BasicType::Int, TypeModifiers::UNSIGNED.union(TypeModifiers::LONG_LONG))),
    ("__builtin_prefetch", BuiltinShape::Function(BasicType::Void, TypeModifiers::empty())),
    ("__builtin_huge_val", BuiltinShape::Function(BasicType::Double, TypeModifiers::empty())),
    ("__builtin_inf", BuiltinShape::Function(BasicType::Double, TypeModifiers::empty())),
    ("__builtin_nan", BuiltinShape::Function(BasicType::Double, TypeModifiers::empty())),
];

/// Predefined identifiers declared at the start of every function body
pub const FUNCTION_NAME_VARIABLES: &[&str] = &["__func__", "__FUNCTION__", "__PRETTY_FUNCTION__"];

pub fn builtin_shape(name: &str) -> Option<BuiltinShape> {
    GNU_BUILTINS.iter().find(|(n, _)| *n == name).map(|(_, shape)| *shape)
}
