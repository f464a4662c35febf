//! The typed expression tree.
//!
//! One closed tag set covers both expressions and statements; the front
//! end's language is expression-oriented, so a `Block` or an `If` can sit
//! anywhere a value is expected. The lowering pass is what restricts that
//! freedom before printing (see `lux-emitter`).
//!
//! Every traversal over these nodes matches `TypedKind` exhaustively. A
//! new tag must produce a compile error in every pass, never fall into a
//! silent default arm.

use lux_common::Span;

use crate::ty::{Ty, TypePath};

/// One node of the typed tree: tag, resolved static type, source position.
#[derive(Clone, Debug, PartialEq)]
pub struct TypedNode {
    pub kind: TypedKind,
    pub ty: Ty,
    pub span: Span,
}

/// A resolved local variable. Ids are allocated by the front end, except
/// for backend temporaries which live in a reserved id range (see
/// [`crate::temp`]).
#[derive(Clone, Debug, PartialEq)]
pub struct Var {
    pub id: u32,
    pub name: String,
    pub ty: Ty,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Constant {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Null,
    This,
    Super,
}

#[derive(Clone, Debug, PartialEq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    BoolAnd,
    BoolOr,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    /// Arithmetic (sign-preserving) right shift.
    Shr,
    /// Logical (zero-fill) right shift.
    UShr,
    Assign,
    /// Compound assignment, e.g. `AssignOp(Add)` for `+=`.
    AssignOp(Box<BinOp>),
    /// `a ?? b`. Lowered away by the normalizer; the printer has no
    /// rendering for it.
    NullCoalesce,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UnOp {
    Not,
    Neg,
    NegBits,
    Increment,
    Decrement,
}

/// How a field access resolves, as decided by the front end.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldAccess {
    /// Member of a known class instance.
    Instance(FieldRef),
    /// Static member, qualified by its owning type.
    Static { owner: TypePath, field: FieldRef },
    /// Member of an anonymous structure.
    Anon(String),
    /// Dynamic by-name access; the name is not statically known to exist.
    Dynamic(String),
    /// Method access whose value must stay usable detached from its
    /// receiver; rendered through the runtime bind helper.
    Closure(FieldRef),
    /// Enum constructor, e.g. `Color.Rgb`.
    EnumCtor {
        owner: TypePath,
        ctor: String,
        index: usize,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct FieldRef {
    pub name: String,
    /// The member is natively named (interop): its name must never be
    /// repurposed, and a first-class reference to it must go through a
    /// forwarding shim instead of naming it as a value.
    pub native: bool,
    /// `Some(arity)` when the member is a method.
    pub method_arity: Option<usize>,
}

impl FieldRef {
    pub fn var(name: impl Into<String>) -> Self {
        FieldRef {
            name: name.into(),
            native: false,
            method_arity: None,
        }
    }

    pub fn method(name: impl Into<String>, arity: usize) -> Self {
        FieldRef {
            name: name.into(),
            native: false,
            method_arity: Some(arity),
        }
    }

    pub fn native_method(name: impl Into<String>, arity: usize) -> Self {
        FieldRef {
            native: true,
            ..FieldRef::method(name, arity)
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FunctionLit {
    pub params: Vec<Var>,
    pub ret: Ty,
    pub body: TypedNode,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ObjectField {
    pub name: String,
    pub value: TypedNode,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SwitchCase {
    /// Alternative match values; any one of them selects this case.
    pub values: Vec<TypedNode>,
    pub body: TypedNode,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CatchClause {
    pub var: Var,
    pub body: TypedNode,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MetadataEntry {
    pub name: String,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LoopKind {
    /// Condition tested before each iteration (`while`).
    WhileDo,
    /// Condition tested after each iteration (`do … while`).
    DoWhile,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TypedKind {
    Const(Constant),
    Local(Var),
    Field {
        object: Box<TypedNode>,
        access: FieldAccess,
    },
    Index {
        object: Box<TypedNode>,
        index: Box<TypedNode>,
    },
    Paren(Box<TypedNode>),
    ObjectDecl(Vec<ObjectField>),
    ArrayDecl(Vec<TypedNode>),
    TypeRef(TypePath),
    Call {
        callee: Box<TypedNode>,
        args: Vec<TypedNode>,
    },
    New {
        class: TypePath,
        args: Vec<TypedNode>,
    },
    Binop {
        op: BinOp,
        lhs: Box<TypedNode>,
        rhs: Box<TypedNode>,
    },
    Unop {
        op: UnOp,
        postfix: bool,
        operand: Box<TypedNode>,
    },
    Function(Box<FunctionLit>),
    VarDecl {
        var: Var,
        init: Option<Box<TypedNode>>,
    },
    Block(Vec<TypedNode>),
    For {
        var: Var,
        iter: Box<TypedNode>,
        body: Box<TypedNode>,
    },
    If {
        cond: Box<TypedNode>,
        then_branch: Box<TypedNode>,
        else_branch: Option<Box<TypedNode>>,
    },
    While {
        cond: Box<TypedNode>,
        body: Box<TypedNode>,
        kind: LoopKind,
    },
    Switch {
        subject: Box<TypedNode>,
        cases: Vec<SwitchCase>,
        default: Option<Box<TypedNode>>,
    },
    Return(Option<Box<TypedNode>>),
    Break,
    Continue,
    Throw(Box<TypedNode>),
    Cast {
        expr: Box<TypedNode>,
        to: Option<TypePath>,
    },
    Meta {
        entry: MetadataEntry,
        expr: Box<TypedNode>,
    },
    Try {
        body: Box<TypedNode>,
        /// Ordered catch clauses. The last one is the catch-all.
        catches: Vec<CatchClause>,
    },
    /// Projection of one constructor argument out of an enum value.
    EnumParameter {
        value: Box<TypedNode>,
        ctor: String,
        index: usize,
    },
    /// Projection of the constructor index out of an enum value.
    EnumIndex(Box<TypedNode>),
}

impl TypedNode {
    pub fn new(kind: TypedKind, ty: Ty, span: Span) -> Self {
        TypedNode { kind, ty, span }
    }

    pub fn null(span: Span) -> Self {
        TypedNode::new(TypedKind::Const(Constant::Null), Ty::dynamic(), span)
    }

    pub fn bool_const(value: bool, span: Span) -> Self {
        TypedNode::new(TypedKind::Const(Constant::Bool(value)), Ty::bool(), span)
    }

    pub fn int(value: i64, span: Span) -> Self {
        TypedNode::new(TypedKind::Const(Constant::Int(value)), Ty::int(), span)
    }

    pub fn local(var: Var, span: Span) -> Self {
        let ty = var.ty.clone();
        TypedNode::new(TypedKind::Local(var), ty, span)
    }

    pub fn is_null_const(&self) -> bool {
        matches!(self.kind, TypedKind::Const(Constant::Null))
    }

    /// Block-like nodes are the ones the source language allows in value
    /// position but the target only allows in statement position.
    pub fn is_block_like(&self) -> bool {
        matches!(
            self.kind,
            TypedKind::Block(_) | TypedKind::If { .. } | TypedKind::Switch { .. } | TypedKind::Try { .. }
        )
    }

    /// Visit every direct child, in evaluation order.
    ///
    /// This is the one place that knows the child layout of every tag;
    /// read-only passes build on it so that a new tag breaks compilation
    /// here instead of being skipped silently somewhere else.
    pub fn for_each_child(&self, f: &mut impl FnMut(&TypedNode)) {
        match &self.kind {
            TypedKind::Const(_)
            | TypedKind::Local(_)
            | TypedKind::TypeRef(_)
            | TypedKind::Break
            | TypedKind::Continue => {}
            TypedKind::Field { object, .. } => f(object),
            TypedKind::Index { object, index } => {
                f(object);
                f(index);
            }
            TypedKind::Paren(inner) => f(inner),
            TypedKind::ObjectDecl(fields) => {
                for field in fields {
                    f(&field.value);
                }
            }
            TypedKind::ArrayDecl(items) => {
                for item in items {
                    f(item);
                }
            }
            TypedKind::Call { callee, args } => {
                f(callee);
                for arg in args {
                    f(arg);
                }
            }
            TypedKind::New { args, .. } => {
                for arg in args {
                    f(arg);
                }
            }
            TypedKind::Binop { lhs, rhs, .. } => {
                f(lhs);
                f(rhs);
            }
            TypedKind::Unop { operand, .. } => f(operand),
            TypedKind::Function(lit) => f(&lit.body),
            TypedKind::VarDecl { init, .. } => {
                if let Some(init) = init {
                    f(init);
                }
            }
            TypedKind::Block(stmts) => {
                for stmt in stmts {
                    f(stmt);
                }
            }
            TypedKind::For { iter, body, .. } => {
                f(iter);
                f(body);
            }
            TypedKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                f(cond);
                f(then_branch);
                if let Some(else_branch) = else_branch {
                    f(else_branch);
                }
            }
            TypedKind::While { cond, body, .. } => {
                f(cond);
                f(body);
            }
            TypedKind::Switch {
                subject,
                cases,
                default,
            } => {
                f(subject);
                for case in cases {
                    for value in &case.values {
                        f(value);
                    }
                    f(&case.body);
                }
                if let Some(default) = default {
                    f(default);
                }
            }
            TypedKind::Return(value) => {
                if let Some(value) = value {
                    f(value);
                }
            }
            TypedKind::Throw(value) => f(value),
            TypedKind::Cast { expr, .. } => f(expr),
            TypedKind::Meta { expr, .. } => f(expr),
            TypedKind::Try { body, catches } => {
                f(body);
                for catch in catches {
                    f(&catch.body);
                }
            }
            TypedKind::EnumParameter { value, .. } => f(value),
            TypedKind::EnumIndex(value) => f(value),
        }
    }
}
