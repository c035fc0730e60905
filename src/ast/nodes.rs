//! AST Node definitions.
//!
//! One tagged variant set serves both dialects; C++-only constructs are
//! additional variants rather than separate node families. Children are
//! referenced by [`NodeRef`] into the owning [`Ast`](super::Ast).

use serde::Serialize;
use thin_vec::ThinVec;

use crate::ast::{NodeRef, Symbol};

/// The core enum defining all possible AST node types for C and C++.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    // --- Top Level ---
    TranslationUnit {
        declarations: ThinVec<NodeRef>,
    },

    // --- Names ---
    /// Identifier, including destructor names spelled `~X`
    Name(Symbol),
    TemplateId {
        template_name: NodeRef,
        arguments: ThinVec<NodeRef>,
    },
    OperatorName(OverloadedOperator),
    ConversionName {
        type_id: NodeRef,
    },
    QualifiedName {
        segments: ThinVec<NodeRef>,
        fully_qualified: bool,
    },

    // --- Declaration specifiers ---
    SimpleDeclSpecifier {
        info: DeclSpecInfo,
        basic: BasicType,
        modifiers: TypeModifiers,
        /// Operand of `typeof` / `decltype`
        type_expr: Option<NodeRef>,
    },
    NamedTypeSpecifier {
        info: DeclSpecInfo,
        name: NodeRef,
        typename: bool,
    },
    ElaboratedTypeSpecifier {
        info: DeclSpecInfo,
        key: TypeKey,
        name: NodeRef,
    },
    CompositeTypeSpecifier {
        info: DeclSpecInfo,
        key: TypeKey,
        name: Option<NodeRef>,
        bases: ThinVec<NodeRef>,
        members: ThinVec<NodeRef>,
    },
    EnumerationSpecifier {
        info: DeclSpecInfo,
        scoped: bool,
        name: Option<NodeRef>,
        base: Option<NodeRef>,
        enumerators: ThinVec<NodeRef>,
    },
    BaseSpecifier {
        name: NodeRef,
        visibility: Option<Visibility>,
        is_virtual: bool,
    },
    Enumerator {
        name: NodeRef,
        value: Option<NodeRef>,
    },

    // --- Declarators ---
    Declarator(DeclaratorData),
    Pointer {
        qualifiers: TypeQualifiers,
    },
    Reference {
        rvalue: bool,
    },
    PointerToMember {
        class_name: NodeRef,
        qualifiers: TypeQualifiers,
    },
    ArrayModifier {
        size: Option<NodeRef>,
        qualifiers: TypeQualifiers,
        is_static: bool,
        /// `[*]`
        variable_length: bool,
    },
    ParameterDeclaration {
        decl_specifier: NodeRef,
        declarator: NodeRef,
    },
    NoexceptSpecification {
        expression: Option<NodeRef>,
    },
    ThrowSpecification {
        types: ThinVec<NodeRef>,
    },
    TypeId {
        decl_specifier: NodeRef,
        declarator: NodeRef,
    },

    // --- Initializers ---
    EqualsInitializer {
        value: NodeRef,
    },
    InitializerList {
        clauses: ThinVec<NodeRef>,
    },
    ConstructorInitializer {
        arguments: ThinVec<NodeRef>,
    },
    DesignatedInitializer {
        designators: ThinVec<NodeRef>,
        value: NodeRef,
    },
    FieldDesignator {
        name: NodeRef,
    },
    ArrayDesignator {
        index: NodeRef,
    },
    ArrayRangeDesignator {
        low: NodeRef,
        high: NodeRef,
    },

    // --- Declarations ---
    SimpleDeclaration {
        decl_specifier: NodeRef,
        declarators: ThinVec<NodeRef>,
    },
    FunctionDefinition {
        decl_specifier: NodeRef,
        declarator: NodeRef,
        member_initializers: ThinVec<NodeRef>,
        /// `None` for `= default` and `= delete`
        body: Option<NodeRef>,
        catch_handlers: ThinVec<NodeRef>,
        body_kind: FunctionBodyKind,
    },
    ConstructorChainInitializer {
        member: NodeRef,
        initializer: NodeRef,
    },
    ProblemDeclaration(ProblemId),
    NamespaceDefinition {
        name: Option<NodeRef>,
        inline: bool,
        declarations: ThinVec<NodeRef>,
    },
    NamespaceAlias {
        alias: NodeRef,
        target: NodeRef,
    },
    UsingDirective {
        name: NodeRef,
    },
    UsingDeclaration {
        name: NodeRef,
        typename: bool,
    },
    AliasDeclaration {
        alias: NodeRef,
        type_id: NodeRef,
    },
    TemplateDeclaration {
        parameters: ThinVec<NodeRef>,
        declaration: NodeRef,
    },
    TemplateSpecialization {
        declaration: NodeRef,
    },
    ExplicitTemplateInstantiation {
        declaration: NodeRef,
    },
    SimpleTypeTemplateParameter {
        name: Option<NodeRef>,
        default: Option<NodeRef>,
        pack: bool,
        typename: bool,
    },
    TemplatedTypeTemplateParameter {
        parameters: ThinVec<NodeRef>,
        name: Option<NodeRef>,
        default: Option<NodeRef>,
    },
    LinkageSpecification {
        linkage: Symbol,
        declarations: ThinVec<NodeRef>,
    },
    StaticAssertDeclaration {
        condition: NodeRef,
        message: Option<NodeRef>,
    },
    AsmDeclaration {
        text: Symbol,
    },
    VisibilityLabel(Visibility),

    // --- Statements ---
    CompoundStatement {
        statements: ThinVec<NodeRef>,
    },
    DeclarationStatement {
        declaration: NodeRef,
    },
    ExpressionStatement {
        expression: NodeRef,
    },
    NullStatement,
    IfStatement {
        init: Option<NodeRef>,
        /// Expression or condition declaration
        condition: NodeRef,
        then_clause: NodeRef,
        else_clause: Option<NodeRef>,
        constexpr: bool,
    },
    SwitchStatement {
        init: Option<NodeRef>,
        controller: NodeRef,
        body: NodeRef,
    },
    WhileStatement {
        condition: NodeRef,
        body: NodeRef,
    },
    DoStatement {
        body: NodeRef,
        condition: NodeRef,
    },
    ForStatement {
        init: NodeRef,
        condition: Option<NodeRef>,
        iteration: Option<NodeRef>,
        body: NodeRef,
    },
    RangeBasedForStatement {
        declaration: NodeRef,
        initializer: NodeRef,
        body: NodeRef,
    },
    BreakStatement,
    ContinueStatement,
    ReturnStatement {
        value: Option<NodeRef>,
    },
    GotoStatement {
        label: NodeRef,
    },
    LabelStatement {
        name: NodeRef,
        statement: NodeRef,
    },
    CaseStatement {
        expression: NodeRef,
        /// GNU `case 1 ... 3:`
        range_end: Option<NodeRef>,
    },
    DefaultStatement,
    TryBlockStatement {
        body: NodeRef,
        handlers: ThinVec<NodeRef>,
    },
    CatchHandler {
        /// `None` for `catch (...)`
        declaration: Option<NodeRef>,
        body: NodeRef,
    },
    ProblemStatement(ProblemId),

    // --- Expressions ---
    IdExpression {
        name: NodeRef,
    },
    Literal {
        kind: LiteralKind,
        value: Symbol,
    },
    Unary {
        op: UnaryOp,
        operand: NodeRef,
    },
    Binary {
        op: BinaryOp,
        left: NodeRef,
        right: NodeRef,
    },
    Conditional {
        condition: NodeRef,
        /// `None` for the GNU `a ?: b` form
        positive: Option<NodeRef>,
        negative: NodeRef,
    },
    Cast {
        op: CastOp,
        type_id: NodeRef,
        operand: NodeRef,
    },
    FunctionCall {
        function: NodeRef,
        arguments: ThinVec<NodeRef>,
    },
    ArraySubscript {
        array: NodeRef,
        index: NodeRef,
    },
    FieldReference {
        owner: NodeRef,
        name: NodeRef,
        arrow: bool,
    },
    TypeIdExpression {
        op: TypeIdOp,
        type_id: NodeRef,
    },
    /// Compound literal `(T){...}`
    TypeIdInitializerExpression {
        type_id: NodeRef,
        initializer: NodeRef,
    },
    /// Functional cast `T(...)` / `T{...}`
    SimpleTypeConstructor {
        decl_specifier: NodeRef,
        initializer: NodeRef,
    },
    New {
        global: bool,
        placement: ThinVec<NodeRef>,
        type_id: NodeRef,
        initializer: Option<NodeRef>,
    },
    Delete {
        global: bool,
        array: bool,
        operand: NodeRef,
    },
    Throw {
        operand: Option<NodeRef>,
    },
    Lambda {
        default_capture: CaptureDefault,
        captures: ThinVec<NodeRef>,
        declarator: Option<NodeRef>,
        body: NodeRef,
    },
    Capture {
        by_reference: bool,
        /// `None` captures `this`
        name: Option<NodeRef>,
    },
    CompoundStatementExpression {
        body: NodeRef,
    },
    PackExpansion {
        pattern: NodeRef,
    },
    /// GNU `&&label`
    LabelReference {
        label: NodeRef,
    },
    BuiltinVaArg {
        operand: NodeRef,
        type_id: NodeRef,
    },
    BuiltinOffsetof {
        type_id: NodeRef,
        member: NodeRef,
    },
    TypesCompatible {
        first: NodeRef,
        second: NodeRef,
    },
    ProblemExpression(ProblemId),

    // --- Attributes ---
    AttributeSpecifier {
        attributes: ThinVec<NodeRef>,
        gnu: bool,
    },
    Attribute {
        name: Symbol,
        scope: Option<Symbol>,
        /// Argument tokens as written, without the enclosing parenthesis
        arguments: Option<Symbol>,
    },
}

/// Declarator payload. The declared name sits in the innermost nested declarator.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeclaratorData {
    pub pointer_ops: ThinVec<NodeRef>,
    pub name: Option<NodeRef>,
    pub nested: Option<NodeRef>,
    pub suffix: DeclaratorSuffix,
    pub initializer: Option<NodeRef>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum DeclaratorSuffix {
    #[default]
    Plain,
    Array(ThinVec<NodeRef>),
    Function(FunctionSuffix),
    /// Pre-standard definition: identifier list plus trailing declarations
    KnRFunction {
        parameter_names: ThinVec<NodeRef>,
        parameter_declarations: ThinVec<NodeRef>,
    },
    BitField(NodeRef),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FunctionSuffix {
    pub parameters: ThinVec<NodeRef>,
    pub varargs: bool,
    pub qualifiers: TypeQualifiers,
    pub ref_qualifier: RefQualifier,
    pub exception: Option<NodeRef>,
    pub trailing_return: Option<NodeRef>,
    pub pure_virtual: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum RefQualifier {
    #[default]
    None,
    LValue,
    RValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum FunctionBodyKind {
    #[default]
    Body,
    TryBlock,
    Defaulted,
    Deleted,
}

/// Storage classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum StorageClass {
    #[default]
    None,
    Typedef,
    Extern,
    Static,
    Auto,
    Register,
    Mutable,
}

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize)]
    pub struct TypeQualifiers: u8 {
        const CONST = 1 << 0;
        const VOLATILE = 1 << 1;
        const RESTRICT = 1 << 2;
        const ATOMIC = 1 << 3;
    }
}

// Function specifiers
bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize)]
    pub struct FunctionSpecifiers: u8 {
        const INLINE = 1 << 0;
        const NORETURN = 1 << 1;
        const VIRTUAL = 1 << 2;
        const EXPLICIT = 1 << 3;
        const FRIEND = 1 << 4;
        const CONSTEXPR = 1 << 5;
        const THREAD_LOCAL = 1 << 6;
    }
}

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize)]
    pub struct TypeModifiers: u8 {
        const SHORT = 1 << 0;
        const LONG = 1 << 1;
        const LONG_LONG = 1 << 2;
        const SIGNED = 1 << 3;
        const UNSIGNED = 1 << 4;
        const COMPLEX = 1 << 5;
    }
}

/// Parts shared by every declaration specifier kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DeclSpecInfo {
    pub storage: StorageClass,
    pub qualifiers: TypeQualifiers,
    pub specifiers: FunctionSpecifiers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum BasicType {
    /// No type keyword (implicit int, or qualifiers only)
    #[default]
    Unspecified,
    Void,
    Char,
    Char16,
    Char32,
    WChar,
    Int,
    Int128,
    Float,
    Double,
    Bool,
    Auto,
    Typeof,
    Decltype,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TypeKey {
    Struct,
    Union,
    Class,
    Enum,
}

impl TypeKey {
    pub fn keyword(self) -> &'static str {
        match self {
            TypeKey::Struct => "struct",
            TypeKey::Union => "union",
            TypeKey::Class => "class",
            TypeKey::Enum => "enum",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Visibility {
    Public,
    Protected,
    Private,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LiteralKind {
    Integer,
    Float,
    Char,
    String,
    True,
    False,
    Nullptr,
    This,
}

// Unary Operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnaryOp {
    Plus,
    Minus,
    Deref,
    AddrOf,
    BitNot,
    LogicNot,
    PreIncrement,
    PreDecrement,
    PostIncrement,
    PostDecrement,
    /// Parenthesized expression
    Bracketed,
    Sizeof,
    SizeofPack,
    Alignof,
    Typeid,
    Noexcept,
    Real,
    Imag,
}

impl UnaryOp {
    pub fn is_postfix(self) -> bool {
        matches!(self, UnaryOp::PostIncrement | UnaryOp::PostDecrement)
    }

    /// Operator that can be overloaded by a user-declared `operator` function
    pub fn overloaded(self) -> Option<OverloadedOperator> {
        let op = match self {
            UnaryOp::Plus => OverloadedOperator::Plus,
            UnaryOp::Minus => OverloadedOperator::Minus,
            UnaryOp::Deref => OverloadedOperator::Star,
            UnaryOp::AddrOf => OverloadedOperator::Amper,
            UnaryOp::BitNot => OverloadedOperator::Tilde,
            UnaryOp::LogicNot => OverloadedOperator::Not,
            UnaryOp::PreIncrement | UnaryOp::PostIncrement => OverloadedOperator::Increment,
            UnaryOp::PreDecrement | UnaryOp::PostDecrement => OverloadedOperator::Decrement,
            _ => return None,
        };
        Some(op)
    }
}

// Binary Operators (includes assignment types)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    BitAnd,
    BitOr,
    BitXor,
    LShift,
    RShift,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    LogicAnd,
    LogicOr,
    Comma,
    Assign,
    AssignAdd,
    AssignSub,
    AssignMul,
    AssignDiv,
    AssignMod,
    AssignBitAnd,
    AssignBitOr,
    AssignBitXor,
    AssignLShift,
    AssignRShift,
    PointerToMemberDot,
    PointerToMemberArrow,
}

impl BinaryOp {
    pub fn is_assignment(self) -> bool {
        matches!(
            self,
            BinaryOp::Assign
                | BinaryOp::AssignAdd
                | BinaryOp::AssignSub
                | BinaryOp::AssignMul
                | BinaryOp::AssignDiv
                | BinaryOp::AssignMod
                | BinaryOp::AssignBitAnd
                | BinaryOp::AssignBitOr
                | BinaryOp::AssignBitXor
                | BinaryOp::AssignLShift
                | BinaryOp::AssignRShift
        )
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Equal
                | BinaryOp::NotEqual
                | BinaryOp::Less
                | BinaryOp::LessEqual
                | BinaryOp::Greater
                | BinaryOp::GreaterEqual
                | BinaryOp::LogicAnd
                | BinaryOp::LogicOr
        )
    }

    pub fn overloaded(self) -> OverloadedOperator {
        use OverloadedOperator as O;
        match self {
            BinaryOp::Add => O::Plus,
            BinaryOp::Sub => O::Minus,
            BinaryOp::Mul => O::Star,
            BinaryOp::Div => O::Slash,
            BinaryOp::Mod => O::Percent,
            BinaryOp::BitAnd => O::Amper,
            BinaryOp::BitOr => O::Pipe,
            BinaryOp::BitXor => O::Caret,
            BinaryOp::LShift => O::ShiftLeft,
            BinaryOp::RShift => O::ShiftRight,
            BinaryOp::Equal => O::Equal,
            BinaryOp::NotEqual => O::NotEqual,
            BinaryOp::Less => O::Less,
            BinaryOp::LessEqual => O::LessEqual,
            BinaryOp::Greater => O::Greater,
            BinaryOp::GreaterEqual => O::GreaterEqual,
            BinaryOp::LogicAnd => O::LogicAnd,
            BinaryOp::LogicOr => O::LogicOr,
            BinaryOp::Comma => O::Comma,
            BinaryOp::Assign => O::Assign,
            BinaryOp::AssignAdd => O::PlusAssign,
            BinaryOp::AssignSub => O::MinusAssign,
            BinaryOp::AssignMul => O::StarAssign,
            BinaryOp::AssignDiv => O::SlashAssign,
            BinaryOp::AssignMod => O::PercentAssign,
            BinaryOp::AssignBitAnd => O::AmperAssign,
            BinaryOp::AssignBitOr => O::PipeAssign,
            BinaryOp::AssignBitXor => O::CaretAssign,
            BinaryOp::AssignLShift => O::ShiftLeftAssign,
            BinaryOp::AssignRShift => O::ShiftRightAssign,
            BinaryOp::PointerToMemberDot => O::ArrowStar,
            BinaryOp::PointerToMemberArrow => O::ArrowStar,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum OverloadedOperator {
    New,
    Delete,
    NewArray,
    DeleteArray,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    Amper,
    Pipe,
    Tilde,
    Not,
    Assign,
    Less,
    Greater,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    PercentAssign,
    CaretAssign,
    AmperAssign,
    PipeAssign,
    ShiftLeft,
    ShiftRight,
    ShiftLeftAssign,
    ShiftRightAssign,
    Equal,
    NotEqual,
    LessEqual,
    GreaterEqual,
    LogicAnd,
    LogicOr,
    Increment,
    Decrement,
    Comma,
    ArrowStar,
    Arrow,
    Call,
    Subscript,
}

impl OverloadedOperator {
    pub fn spelling(self) -> &'static str {
        use OverloadedOperator as O;
        match self {
            O::New => "new",
            O::Delete => "delete",
            O::NewArray => "new[]",
            O::DeleteArray => "delete[]",
            O::Plus => "+",
            O::Minus => "-",
            O::Star => "*",
            O::Slash => "/",
            O::Percent => "%",
            O::Caret => "^",
            O::Amper => "&",
            O::Pipe => "|",
            O::Tilde => "~",
            O::Not => "!",
            O::Assign => "=",
            O::Less => "<",
            O::Greater => ">",
            O::PlusAssign => "+=",
            O::MinusAssign => "-=",
            O::StarAssign => "*=",
            O::SlashAssign => "/=",
            O::PercentAssign => "%=",
            O::CaretAssign => "^=",
            O::AmperAssign => "&=",
            O::PipeAssign => "|=",
            O::ShiftLeft => "<<",
            O::ShiftRight => ">>",
            O::ShiftLeftAssign => "<<=",
            O::ShiftRightAssign => ">>=",
            O::Equal => "==",
            O::NotEqual => "!=",
            O::LessEqual => "<=",
            O::GreaterEqual => ">=",
            O::LogicAnd => "&&",
            O::LogicOr => "||",
            O::Increment => "++",
            O::Decrement => "--",
            O::Comma => ",",
            O::ArrowStar => "->*",
            O::Arrow => "->",
            O::Call => "()",
            O::Subscript => "[]",
        }
    }

    /// `operator+` style function name
    pub fn function_name(self) -> String {
        match self {
            OverloadedOperator::New
            | OverloadedOperator::Delete
            | OverloadedOperator::NewArray
            | OverloadedOperator::DeleteArray => format!("operator {}", self.spelling()),
            _ => format!("operator{}", self.spelling()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CastOp {
    CStyle,
    Static,
    Dynamic,
    Const,
    Reinterpret,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TypeIdOp {
    Sizeof,
    Alignof,
    Typeid,
    Typeof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum CaptureDefault {
    #[default]
    None,
    ByCopy,
    ByReference,
}

/// Classification carried by problem nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ProblemId {
    SyntaxError,
    UnexpectedEndOfInput,
    /// K&R parameter declaration naming an identifier missing from the list
    ParameterNotInList,
    TemplateNestingTooDeep,
    NestingTooDeep,
}

impl ProblemId {
    pub fn message(self) -> &'static str {
        match self {
            ProblemId::SyntaxError => "syntax error",
            ProblemId::UnexpectedEndOfInput => "unexpected end of input",
            ProblemId::ParameterNotInList => "declaration of a parameter that is not in the identifier list",
            ProblemId::TemplateNestingTooDeep => "template arguments nested too deeply",
            ProblemId::NestingTooDeep => "expressions or statements nested too deeply",
        }
    }
}

/// Coarse grouping used by visitors and the node selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NodeCategory {
    TranslationUnit,
    Name,
    DeclSpecifier,
    Declarator,
    PointerOperator,
    ArrayModifier,
    Parameter,
    ExceptionSpecification,
    TypeId,
    Initializer,
    Designator,
    Declaration,
    BaseSpecifier,
    Enumerator,
    TemplateParameter,
    CtorInitializer,
    Statement,
    CatchHandler,
    Expression,
    Capture,
    Attribute,
}

/// Apply `$f` to every child reference of `$kind`, in source order.
///
/// Works for both `&NodeKind` and `&mut NodeKind`: the patterns bind by
/// reference through match ergonomics.
macro_rules! for_each_child {
    ($kind:expr, $f:expr) => {{
        let mut f = $f;
        macro_rules! one {
            ($e:expr) => {
                f($e)
            };
        }
        macro_rules! opt {
            ($e:expr) => {
                if let Some(c) = $e {
                    f(c)
                }
            };
        }
        macro_rules! many {
            ($e:expr) => {
                for c in $e {
                    f(c)
                }
            };
        }
        match $kind {
            NodeKind::TranslationUnit { declarations } => many!(declarations),
            NodeKind::Name(_) | NodeKind::OperatorName(_) => {}
            NodeKind::TemplateId {
                template_name,
                arguments,
            } => {
                one!(template_name);
                many!(arguments);
            }
            NodeKind::ConversionName { type_id } => one!(type_id),
            NodeKind::QualifiedName { segments, .. } => many!(segments),
            NodeKind::SimpleDeclSpecifier { type_expr, .. } => opt!(type_expr),
            NodeKind::NamedTypeSpecifier { name, .. } => one!(name),
            NodeKind::ElaboratedTypeSpecifier { name, .. } => one!(name),
            NodeKind::CompositeTypeSpecifier {
                name, bases, members, ..
            } => {
                opt!(name);
                many!(bases);
                many!(members);
            }
            NodeKind::EnumerationSpecifier {
                name,
                base,
                enumerators,
                ..
            } => {
                opt!(name);
                opt!(base);
                many!(enumerators);
            }
            NodeKind::BaseSpecifier { name, .. } => one!(name),
            NodeKind::Enumerator { name, value } => {
                one!(name);
                opt!(value);
            }
            NodeKind::Declarator(DeclaratorData {
                pointer_ops,
                name,
                nested,
                suffix,
                initializer,
            }) => {
                many!(pointer_ops);
                opt!(name);
                opt!(nested);
                match suffix {
                    DeclaratorSuffix::Plain => {}
                    DeclaratorSuffix::Array(modifiers) => many!(modifiers),
                    DeclaratorSuffix::Function(FunctionSuffix {
                        parameters,
                        exception,
                        trailing_return,
                        ..
                    }) => {
                        many!(parameters);
                        opt!(exception);
                        opt!(trailing_return);
                    }
                    DeclaratorSuffix::KnRFunction {
                        parameter_names,
                        parameter_declarations,
                    } => {
                        many!(parameter_names);
                        many!(parameter_declarations);
                    }
                    DeclaratorSuffix::BitField(width) => one!(width),
                }
                opt!(initializer);
            }
            NodeKind::Pointer { .. } | NodeKind::Reference { .. } => {}
            NodeKind::PointerToMember { class_name, .. } => one!(class_name),
            NodeKind::ArrayModifier { size, .. } => opt!(size),
            NodeKind::ParameterDeclaration {
                decl_specifier,
                declarator,
            } => {
                one!(decl_specifier);
                one!(declarator);
            }
            NodeKind::NoexceptSpecification { expression } => opt!(expression),
            NodeKind::ThrowSpecification { types } => many!(types),
            NodeKind::TypeId {
                decl_specifier,
                declarator,
            } => {
                one!(decl_specifier);
                one!(declarator);
            }
            NodeKind::EqualsInitializer { value } => one!(value),
            NodeKind::InitializerList { clauses } => many!(clauses),
            NodeKind::ConstructorInitializer { arguments } => many!(arguments),
            NodeKind::DesignatedInitializer { designators, value } => {
                many!(designators);
                one!(value);
            }
            NodeKind::FieldDesignator { name } => one!(name),
            NodeKind::ArrayDesignator { index } => one!(index),
            NodeKind::ArrayRangeDesignator { low, high } => {
                one!(low);
                one!(high);
            }
            NodeKind::SimpleDeclaration {
                decl_specifier,
                declarators,
            } => {
                one!(decl_specifier);
                many!(declarators);
            }
            NodeKind::FunctionDefinition {
                decl_specifier,
                declarator,
                member_initializers,
                body,
                catch_handlers,
                ..
            } => {
                one!(decl_specifier);
                one!(declarator);
                many!(member_initializers);
                opt!(body);
                many!(catch_handlers);
            }
            NodeKind::ConstructorChainInitializer { member, initializer } => {
                one!(member);
                one!(initializer);
            }
            NodeKind::NamespaceDefinition { name, declarations, .. } => {
                opt!(name);
                many!(declarations);
            }
            NodeKind::NamespaceAlias { alias, target } => {
                one!(alias);
                one!(target);
            }
            NodeKind::UsingDirective { name } => one!(name),
            NodeKind::UsingDeclaration { name, .. } => one!(name),
            NodeKind::AliasDeclaration { alias, type_id } => {
                one!(alias);
                one!(type_id);
            }
            NodeKind::TemplateDeclaration {
                parameters,
                declaration,
            } => {
                many!(parameters);
                one!(declaration);
            }
            NodeKind::TemplateSpecialization { declaration } => one!(declaration),
            NodeKind::ExplicitTemplateInstantiation { declaration } => one!(declaration),
            NodeKind::SimpleTypeTemplateParameter { name, default, .. } => {
                opt!(name);
                opt!(default);
            }
            NodeKind::TemplatedTypeTemplateParameter {
                parameters,
                name,
                default,
            } => {
                many!(parameters);
                opt!(name);
                opt!(default);
            }
            NodeKind::LinkageSpecification { declarations, .. } => many!(declarations),
            NodeKind::StaticAssertDeclaration { condition, message } => {
                one!(condition);
                opt!(message);
            }
            NodeKind::ProblemDeclaration(_)
            | NodeKind::AsmDeclaration { .. }
            | NodeKind::VisibilityLabel(_)
            | NodeKind::NullStatement
            | NodeKind::BreakStatement
            | NodeKind::ContinueStatement
            | NodeKind::DefaultStatement
            | NodeKind::ProblemStatement(_)
            | NodeKind::Literal { .. }
            | NodeKind::ProblemExpression(_)
            | NodeKind::Attribute { .. } => {}
            NodeKind::CompoundStatement { statements } => many!(statements),
            NodeKind::DeclarationStatement { declaration } => one!(declaration),
            NodeKind::ExpressionStatement { expression } => one!(expression),
            NodeKind::IfStatement {
                init,
                condition,
                then_clause,
                else_clause,
                ..
            } => {
                opt!(init);
                one!(condition);
                one!(then_clause);
                opt!(else_clause);
            }
            NodeKind::SwitchStatement { init, controller, body } => {
                opt!(init);
                one!(controller);
                one!(body);
            }
            NodeKind::WhileStatement { condition, body } => {
                one!(condition);
                one!(body);
            }
            NodeKind::DoStatement { body, condition } => {
                one!(body);
                one!(condition);
            }
            NodeKind::ForStatement {
                init,
                condition,
                iteration,
                body,
            } => {
                one!(init);
                opt!(condition);
                opt!(iteration);
                one!(body);
            }
            NodeKind::RangeBasedForStatement {
                declaration,
                initializer,
                body,
            } => {
                one!(declaration);
                one!(initializer);
                one!(body);
            }
            NodeKind::ReturnStatement { value } => opt!(value),
            NodeKind::GotoStatement { label } => one!(label),
            NodeKind::LabelStatement { name, statement } => {
                one!(name);
                one!(statement);
            }
            NodeKind::CaseStatement { expression, range_end } => {
                one!(expression);
                opt!(range_end);
            }
            NodeKind::TryBlockStatement { body, handlers } => {
                one!(body);
                many!(handlers);
            }
            NodeKind::CatchHandler { declaration, body } => {
                opt!(declaration);
                one!(body);
            }
            NodeKind::IdExpression { name } => one!(name),
            NodeKind::Unary { operand, .. } => one!(operand),
            NodeKind::Binary { left, right, .. } => {
                one!(left);
                one!(right);
            }
            NodeKind::Conditional {
                condition,
                positive,
                negative,
            } => {
                one!(condition);
                opt!(positive);
                one!(negative);
            }
            NodeKind::Cast { type_id, operand, .. } => {
                one!(type_id);
                one!(operand);
            }
            NodeKind::FunctionCall { function, arguments } => {
                one!(function);
                many!(arguments);
            }
            NodeKind::ArraySubscript { array, index } => {
                one!(array);
                one!(index);
            }
            NodeKind::FieldReference { owner, name, .. } => {
                one!(owner);
                one!(name);
            }
            NodeKind::TypeIdExpression { type_id, .. } => one!(type_id),
            NodeKind::TypeIdInitializerExpression { type_id, initializer } => {
                one!(type_id);
                one!(initializer);
            }
            NodeKind::SimpleTypeConstructor {
                decl_specifier,
                initializer,
            } => {
                one!(decl_specifier);
                one!(initializer);
            }
            NodeKind::New {
                placement,
                type_id,
                initializer,
                ..
            } => {
                many!(placement);
                one!(type_id);
                opt!(initializer);
            }
            NodeKind::Delete { operand, .. } => one!(operand),
            NodeKind::Throw { operand } => opt!(operand),
            NodeKind::Lambda {
                captures,
                declarator,
                body,
                ..
            } => {
                many!(captures);
                opt!(declarator);
                one!(body);
            }
            NodeKind::Capture { name, .. } => opt!(name),
            NodeKind::CompoundStatementExpression { body } => one!(body),
            NodeKind::PackExpansion { pattern } => one!(pattern),
            NodeKind::LabelReference { label } => one!(label),
            NodeKind::BuiltinVaArg { operand, type_id } => {
                one!(operand);
                one!(type_id);
            }
            NodeKind::BuiltinOffsetof { type_id, member } => {
                one!(type_id);
                one!(member);
            }
            NodeKind::TypesCompatible { first, second } => {
                one!(first);
                one!(second);
            }
            NodeKind::AttributeSpecifier { attributes, .. } => many!(attributes),
        }
    }};
}

impl NodeKind {
    /// Child references in source order (attributes excluded)
    pub fn children(&self) -> Vec<NodeRef> {
        let mut out = Vec::new();
        for_each_child!(self, |c: &NodeRef| out.push(*c));
        out
    }

    /// Rewrite every child reference
    pub fn remap_children(&mut self, mut map: impl FnMut(NodeRef) -> NodeRef) {
        for_each_child!(self, |c: &mut NodeRef| *c = map(*c));
    }

    pub fn category(&self) -> NodeCategory {
        use NodeKind as K;
        match self {
            K::TranslationUnit { .. } => NodeCategory::TranslationUnit,
            K::Name(_) | K::TemplateId { .. } | K::OperatorName(_) | K::ConversionName { .. } | K::QualifiedName { .. } => {
                NodeCategory::Name
            }
            K::SimpleDeclSpecifier { .. }
            | K::NamedTypeSpecifier { .. }
            | K::ElaboratedTypeSpecifier { .. }
            | K::CompositeTypeSpecifier { .. }
            | K::EnumerationSpecifier { .. } => NodeCategory::DeclSpecifier,
            K::BaseSpecifier { .. } => NodeCategory::BaseSpecifier,
            K::Enumerator { .. } => NodeCategory::Enumerator,
            K::Declarator(_) => NodeCategory::Declarator,
            K::Pointer { .. } | K::Reference { .. } | K::PointerToMember { .. } => NodeCategory::PointerOperator,
            K::ArrayModifier { .. } => NodeCategory::ArrayModifier,
            K::ParameterDeclaration { .. } => NodeCategory::Parameter,
            K::NoexceptSpecification { .. } | K::ThrowSpecification { .. } => NodeCategory::ExceptionSpecification,
            K::TypeId { .. } => NodeCategory::TypeId,
            K::EqualsInitializer { .. }
            | K::InitializerList { .. }
            | K::ConstructorInitializer { .. }
            | K::DesignatedInitializer { .. } => NodeCategory::Initializer,
            K::FieldDesignator { .. } | K::ArrayDesignator { .. } | K::ArrayRangeDesignator { .. } => {
                NodeCategory::Designator
            }
            K::SimpleDeclaration { .. }
            | K::FunctionDefinition { .. }
            | K::ProblemDeclaration(_)
            | K::NamespaceDefinition { .. }
            | K::NamespaceAlias { .. }
            | K::UsingDirective { .. }
            | K::UsingDeclaration { .. }
            | K::AliasDeclaration { .. }
            | K::TemplateDeclaration { .. }
            | K::TemplateSpecialization { .. }
            | K::ExplicitTemplateInstantiation { .. }
            | K::LinkageSpecification { .. }
            | K::StaticAssertDeclaration { .. }
            | K::AsmDeclaration { .. }
            | K::VisibilityLabel(_) => NodeCategory::Declaration,
            K::ConstructorChainInitializer { .. } => NodeCategory::CtorInitializer,
            K::SimpleTypeTemplateParameter { .. } | K::TemplatedTypeTemplateParameter { .. } => {
                NodeCategory::TemplateParameter
            }
            K::CompoundStatement { .. }
            | K::DeclarationStatement { .. }
            | K::ExpressionStatement { .. }
            | K::NullStatement
            | K::IfStatement { .. }
            | K::SwitchStatement { .. }
            | K::WhileStatement { .. }
            | K::DoStatement { .. }
            | K::ForStatement { .. }
            | K::RangeBasedForStatement { .. }
            | K::BreakStatement
            | K::ContinueStatement
            | K::ReturnStatement { .. }
            | K::GotoStatement { .. }
            | K::LabelStatement { .. }
            | K::CaseStatement { .. }
            | K::DefaultStatement
            | K::TryBlockStatement { .. }
            | K::ProblemStatement(_) => NodeCategory::Statement,
            K::CatchHandler { .. } => NodeCategory::CatchHandler,
            K::Capture { .. } => NodeCategory::Capture,
            K::AttributeSpecifier { .. } | K::Attribute { .. } => NodeCategory::Attribute,
            _ => NodeCategory::Expression,
        }
    }

    pub fn is_problem(&self) -> bool {
        matches!(
            self,
            NodeKind::ProblemDeclaration(_) | NodeKind::ProblemStatement(_) | NodeKind::ProblemExpression(_)
        )
    }

    pub fn problem_id(&self) -> Option<ProblemId> {
        match self {
            NodeKind::ProblemDeclaration(id) | NodeKind::ProblemStatement(id) | NodeKind::ProblemExpression(id) => {
                Some(*id)
            }
            _ => None,
        }
    }

    /// Variant name, as used by dumps and test oracles
    pub fn name(&self) -> &'static str {
        use NodeKind as K;
        match self {
            K::TranslationUnit { .. } => "TranslationUnit",
            K::Name(_) => "Name",
            K::TemplateId { .. } => "TemplateId",
            K::OperatorName(_) => "OperatorName",
            K::ConversionName { .. } => "ConversionName",
            K::QualifiedName { .. } => "QualifiedName",
            K::SimpleDeclSpecifier { .. } => "SimpleDeclSpecifier",
            K::NamedTypeSpecifier { .. } => "NamedTypeSpecifier",
            K::ElaboratedTypeSpecifier { .. } => "ElaboratedTypeSpecifier",
            K::CompositeTypeSpecifier { .. } => "CompositeTypeSpecifier",
            K::EnumerationSpecifier { .. } => "EnumerationSpecifier",
            K::BaseSpecifier { .. } => "BaseSpecifier",
            K::Enumerator { .. } => "Enumerator",
            K::Declarator(_) => "Declarator",
            K::Pointer { .. } => "Pointer",
            K::Reference { .. } => "Reference",
            K::PointerToMember { .. } => "PointerToMember",
            K::ArrayModifier { .. } => "ArrayModifier",
            K::ParameterDeclaration { .. } => "ParameterDeclaration",
            K::NoexceptSpecification { .. } => "NoexceptSpecification",
            K::ThrowSpecification { .. } => "ThrowSpecification",
            K::TypeId { .. } => "TypeId",
            K::EqualsInitializer { .. } => "EqualsInitializer",
            K::InitializerList { .. } => "InitializerList",
            K::ConstructorInitializer { .. } => "ConstructorInitializer",
            K::DesignatedInitializer { .. } => "DesignatedInitializer",
            K::FieldDesignator { .. } => "FieldDesignator",
            K::ArrayDesignator { .. } => "ArrayDesignator",
            K::ArrayRangeDesignator { .. } => "ArrayRangeDesignator",
            K::SimpleDeclaration { .. } => "SimpleDeclaration",
            K::FunctionDefinition { .. } => "FunctionDefinition",
            K::ConstructorChainInitializer { .. } => "ConstructorChainInitializer",
            K::ProblemDeclaration(_) => "ProblemDeclaration",
            K::NamespaceDefinition { .. } => "NamespaceDefinition",
            K::NamespaceAlias { .. } => "NamespaceAlias",
            K::UsingDirective { .. } => "UsingDirective",
            K::UsingDeclaration { .. } => "UsingDeclaration",
            K::AliasDeclaration { .. } => "AliasDeclaration",
            K::TemplateDeclaration { .. } => "TemplateDeclaration",
            K::TemplateSpecialization { .. } => "TemplateSpecialization",
            K::ExplicitTemplateInstantiation { .. } => "ExplicitTemplateInstantiation",
            K::SimpleTypeTemplateParameter { .. } => "SimpleTypeTemplateParameter",
            K::TemplatedTypeTemplateParameter { .. } => "TemplatedTypeTemplateParameter",
            K::LinkageSpecification { .. } => "LinkageSpecification",
            K::StaticAssertDeclaration { .. } => "StaticAssertDeclaration",
            K::AsmDeclaration { .. } => "AsmDeclaration",
            K::VisibilityLabel(_) => "VisibilityLabel",
            K::CompoundStatement { .. } => "CompoundStatement",
            K::DeclarationStatement { .. } => "DeclarationStatement",
            K::ExpressionStatement { .. } => "ExpressionStatement",
            K::NullStatement => "NullStatement",
            K::IfStatement { .. } => "IfStatement",
            K::SwitchStatement { .. } => "SwitchStatement",
            K::WhileStatement { .. } => "WhileStatement",
            K::DoStatement { .. } => "DoStatement",
            K::ForStatement { .. } => "ForStatement",
            K::RangeBasedForStatement { .. } => "RangeBasedForStatement",
            K::BreakStatement => "BreakStatement",
            K::ContinueStatement => "ContinueStatement",
            K::ReturnStatement { .. } => "ReturnStatement",
            K::GotoStatement { .. } => "GotoStatement",
            K::LabelStatement { .. } => "LabelStatement",
            K::CaseStatement { .. } => "CaseStatement",
            K::DefaultStatement => "DefaultStatement",
            K::TryBlockStatement { .. } => "TryBlockStatement",
            K::CatchHandler { .. } => "CatchHandler",
            K::ProblemStatement(_) => "ProblemStatement",
            K::IdExpression { .. } => "IdExpression",
            K::Literal { .. } => "Literal",
            K::Unary { .. } => "Unary",
            K::Binary { .. } => "Binary",
            K::Conditional { .. } => "Conditional",
            K::Cast { .. } => "Cast",
            K::FunctionCall { .. } => "FunctionCall",
            K::ArraySubscript { .. } => "ArraySubscript",
            K::FieldReference { .. } => "FieldReference",
            K::TypeIdExpression { .. } => "TypeIdExpression",
            K::TypeIdInitializerExpression { .. } => "TypeIdInitializerExpression",
            K::SimpleTypeConstructor { .. } => "SimpleTypeConstructor",
            K::New { .. } => "New",
            K::Delete { .. } => "Delete",
            K::Throw { .. } => "Throw",
            K::Lambda { .. } => "Lambda",
            K::Capture { .. } => "Capture",
            K::CompoundStatementExpression { .. } => "CompoundStatementExpression",
            K::PackExpansion { .. } => "PackExpansion",
            K::LabelReference { .. } => "LabelReference",
            K::BuiltinVaArg { .. } => "BuiltinVaArg",
            K::BuiltinOffsetof { .. } => "BuiltinOffsetof",
            K::TypesCompatible { .. } => "TypesCompatible",
            K::ProblemExpression(_) => "ProblemExpression",
            K::AttributeSpecifier { .. } => "AttributeSpecifier",
            K::Attribute { .. } => "Attribute",
        }
    }

    /// Declaration specifier info, for the specifier kinds
    pub fn decl_spec_info(&self) -> Option<DeclSpecInfo> {
        match self {
            NodeKind::SimpleDeclSpecifier { info, .. }
            | NodeKind::NamedTypeSpecifier { info, .. }
            | NodeKind::ElaboratedTypeSpecifier { info, .. }
            | NodeKind::CompositeTypeSpecifier { info, .. }
            | NodeKind::EnumerationSpecifier { info, .. } => Some(*info),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(n: u32) -> NodeRef {
        NodeRef::new(n).unwrap()
    }

    #[test]
    fn children_follow_field_order() {
        let kind = NodeKind::Declarator(DeclaratorData {
            pointer_ops: ThinVec::from(vec![r(1), r(2)]),
            name: Some(r(3)),
            nested: None,
            suffix: DeclaratorSuffix::Function(FunctionSuffix {
                parameters: ThinVec::from(vec![r(4)]),
                ..Default::default()
            }),
            initializer: Some(r(5)),
        });
        assert_eq!(kind.children(), vec![r(1), r(2), r(3), r(4), r(5)]);
    }

    #[test]
    fn remap_rewrites_every_reference() {
        let mut kind = NodeKind::Binary {
            op: BinaryOp::Add,
            left: r(1),
            right: r(2),
        };
        kind.remap_children(|c| r(c.get() + 10));
        assert_eq!(kind.children(), vec![r(11), r(12)]);
    }

    #[test]
    fn operator_names() {
        assert_eq!(OverloadedOperator::Call.function_name(), "operator()");
        assert_eq!(OverloadedOperator::NewArray.function_name(), "operator new[]");
        assert_eq!(BinaryOp::AssignAdd.overloaded(), OverloadedOperator::PlusAssign);
    }
}
