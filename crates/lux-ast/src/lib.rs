//! Typed AST node shapes, declarations, and the temporary allocator.
//!
//! The front end hands the backend fully resolved trees built from these
//! shapes. The backend treats them as read-only input; passes that change
//! a tree produce a new one rather than mutating shared nodes.

pub mod decl;
pub mod node;
pub mod temp;
pub mod ty;

pub use decl::{
    AbstractDecl, ClassDecl, ClassField, Declaration, EnumCtorDecl, EnumDecl, FieldKind,
    TypedefDecl,
};
pub use node::{
    BinOp, CatchClause, Constant, FieldAccess, FieldRef, FunctionLit, LoopKind, MetadataEntry,
    ObjectField, SwitchCase, TypedKind, TypedNode, UnOp, Var,
};
pub use temp::{TEMP_ID_BASE, TempVarAllocator};
pub use ty::{FnSig, Param, Ty, TypePath};
