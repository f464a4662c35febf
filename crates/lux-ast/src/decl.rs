//! Top-level declarations as the front end resolves them.
//!
//! Declarations are produced and owned by the front end; the backend
//! reads them and renders text. It never registers new declarations or
//! allocates declaration ids.

use crate::node::{FunctionLit, TypedNode};
use crate::ty::{Param, Ty, TypePath};

#[derive(Clone, Debug, PartialEq)]
pub enum Declaration {
    Class(ClassDecl),
    Enum(EnumDecl),
    Typedef(TypedefDecl),
    Abstract(AbstractDecl),
}

impl Declaration {
    pub fn path(&self) -> &TypePath {
        match self {
            Declaration::Class(c) => &c.path,
            Declaration::Enum(e) => &e.path,
            Declaration::Typedef(t) => &t.path,
            Declaration::Abstract(a) => &a.path,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClassDecl {
    pub path: TypePath,
    pub superclass: Option<TypePath>,
    pub interfaces: Vec<TypePath>,
    pub constructor: Option<FunctionLit>,
    pub fields: Vec<ClassField>,
    pub statics: Vec<ClassField>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClassField {
    pub name: String,
    pub kind: FieldKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum FieldKind {
    Var { ty: Ty, init: Option<TypedNode> },
    Method(FunctionLit),
}

#[derive(Clone, Debug, PartialEq)]
pub struct EnumDecl {
    pub path: TypePath,
    /// Ordered constructors; a constructor's position is its runtime index.
    pub constructors: Vec<EnumCtorDecl>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EnumCtorDecl {
    pub name: String,
    pub params: Vec<Param>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TypedefDecl {
    pub path: TypePath,
    pub target: Ty,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AbstractDecl {
    pub path: TypePath,
    pub underlying: Ty,
}
