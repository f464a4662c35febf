//! Static types as the front end resolves them.
//!
//! The backend never infers anything: nullability and function signatures
//! arrive pre-computed on every node and parameter.

/// Fully resolved type path, e.g. `haxe.ds.StringMap` arrives as
/// `pack = ["haxe", "ds"], name = "StringMap"`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypePath {
    pub pack: Vec<String>,
    pub name: String,
}

impl TypePath {
    pub fn new(pack: Vec<String>, name: impl Into<String>) -> Self {
        TypePath {
            pack,
            name: name.into(),
        }
    }

    /// A path with no package component.
    pub fn of(name: impl Into<String>) -> Self {
        TypePath::new(Vec::new(), name)
    }

    /// Dot-joined form, used for runtime metadata (`__name__`).
    pub fn qualified(&self) -> String {
        if self.pack.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.pack.join("."), self.name)
        }
    }

    /// Underscore-joined form. Lua has no namespaces, so the emitted
    /// global for `foo.bar.Baz` is `foo_bar_Baz`.
    pub fn flat(&self) -> String {
        if self.pack.is_empty() {
            self.name.clone()
        } else {
            format!("{}_{}", self.pack.join("_"), self.name)
        }
    }
}

/// Resolved static type of an expression, variable, or field.
#[derive(Clone, Debug, PartialEq)]
pub struct Ty {
    pub path: TypePath,
    /// Whether the front end resolved this type as admitting `null`.
    pub nullable: bool,
    /// Present when the type is a function type; used for call-argument
    /// nullability checking.
    pub signature: Option<Box<FnSig>>,
}

impl Ty {
    pub fn named(name: impl Into<String>) -> Self {
        Ty {
            path: TypePath::of(name),
            nullable: false,
            signature: None,
        }
    }

    pub fn as_nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn func(sig: FnSig) -> Self {
        Ty {
            path: TypePath::of("Function"),
            nullable: false,
            signature: Some(Box::new(sig)),
        }
    }

    pub fn void() -> Self {
        Ty::named("Void")
    }

    pub fn int() -> Self {
        Ty::named("Int")
    }

    pub fn float() -> Self {
        Ty::named("Float")
    }

    pub fn bool() -> Self {
        Ty::named("Bool")
    }

    pub fn string() -> Self {
        Ty::named("String").as_nullable()
    }

    /// The dynamic top type. Always nullable.
    pub fn dynamic() -> Self {
        Ty::named("Dynamic").as_nullable()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FnSig {
    pub params: Vec<Param>,
    pub ret: Ty,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Param {
    pub name: String,
    pub ty: Ty,
    pub optional: bool,
}

impl Param {
    pub fn required(name: impl Into<String>, ty: Ty) -> Self {
        Param {
            name: name.into(),
            ty,
            optional: false,
        }
    }

    pub fn optional(name: impl Into<String>, ty: Ty) -> Self {
        Param {
            name: name.into(),
            ty,
            optional: true,
        }
    }
}
