use super::*;
use lux_ast::{
    BinOp, ClassField, Constant, EnumCtorDecl, FieldAccess, FieldRef, Param, Ty, TypePath,
    TypedKind, TypedNode, Var,
};
use lux_common::Span;

fn span() -> Span {
    Span::new(0, 1)
}

fn param_var(id: u32, name: &str, ty: Ty) -> Var {
    Var {
        id,
        name: name.to_string(),
        ty,
    }
}

fn this() -> TypedNode {
    TypedNode::new(TypedKind::Const(Constant::This), Ty::dynamic(), span())
}

fn block(stmts: Vec<TypedNode>) -> TypedNode {
    TypedNode::new(TypedKind::Block(stmts), Ty::void(), span())
}

fn assign_self_field(name: &str, value: TypedNode) -> TypedNode {
    let field = TypedNode::new(
        TypedKind::Field {
            object: Box::new(this()),
            access: FieldAccess::Instance(FieldRef::var(name)),
        },
        value.ty.clone(),
        span(),
    );
    TypedNode::new(
        TypedKind::Binop {
            op: BinOp::Assign,
            lhs: Box::new(field),
            rhs: Box::new(value),
        },
        Ty::void(),
        span(),
    )
}

fn sample_class() -> ClassDecl {
    let x = param_var(1, "x", Ty::int());
    let super_call = TypedNode::new(
        TypedKind::Call {
            callee: Box::new(TypedNode::new(
                TypedKind::Const(Constant::Super),
                Ty::dynamic(),
                span(),
            )),
            args: vec![TypedNode::local(x.clone(), span())],
        },
        Ty::void(),
        span(),
    );
    let ctor_body = block(vec![
        super_call,
        assign_self_field("x", TypedNode::local(x.clone(), span())),
    ]);
    let method_body = block(vec![TypedNode::new(
        TypedKind::Return(Some(Box::new(TypedNode::new(
            TypedKind::Field {
                object: Box::new(this()),
                access: FieldAccess::Instance(FieldRef::var("x")),
            },
            Ty::int(),
            span(),
        )))),
        Ty::void(),
        span(),
    )]);
    ClassDecl {
        path: TypePath::new(vec!["geom".to_string()], "Point"),
        superclass: Some(TypePath::new(vec!["geom".to_string()], "Shape")),
        interfaces: vec![TypePath::of("Drawable")],
        constructor: Some(FunctionLit {
            params: vec![x],
            ret: Ty::void(),
            body: ctor_body,
        }),
        fields: vec![ClassField {
            name: "getX".to_string(),
            kind: FieldKind::Method(FunctionLit {
                params: Vec::new(),
                ret: Ty::int(),
                body: method_body,
            }),
        }],
        statics: Vec::new(),
    }
}

#[test]
fn class_emits_registration_and_metadata() {
    let text = emit_class(&sample_class(), &[]).expect("class should emit");
    assert!(text.contains("geom_Point = _lux_class(\"geom.Point\")"));
    assert!(text.contains("geom_Point.__name__ = \"geom.Point\""));
    assert!(text.contains("geom_Point.__super__ = geom_Shape"));
    assert!(text.contains("geom_Point.__interfaces__ = { Drawable }"));
}

#[test]
fn class_emits_two_function_constructor_shape() {
    let text = emit_class(&sample_class(), &[]).expect("class should emit");
    assert!(text.contains("function geom_Point.new(x)"));
    assert!(text.contains("local self = _lux_new(geom_Point)"));
    assert!(text.contains("geom_Point.super(self, x)"));
    assert!(text.contains("return self"));
    assert!(text.contains("function geom_Point.super(self, x)"));
    // the super(...) call inside the constructor body resolves against
    // the statically known superclass
    assert!(text.contains("geom_Shape.super(self, x)"));
    assert!(text.contains("self.x = x"));
}

#[test]
fn class_emits_instance_methods_on_the_prototype() {
    let text = emit_class(&sample_class(), &[]).expect("class should emit");
    assert!(text.contains("function geom_Point.prototype:getX()"));
    assert!(text.contains("return self.x"));
}

#[test]
fn enum_emits_singletons_and_factories() {
    let decl = EnumDecl {
        path: TypePath::of("Color"),
        constructors: vec![
            EnumCtorDecl {
                name: "Red".to_string(),
                params: Vec::new(),
            },
            EnumCtorDecl {
                name: "Rgb".to_string(),
                params: vec![
                    Param::required("r", Ty::int()),
                    Param::required("g", Ty::int()),
                    Param::required("b", Ty::int()),
                ],
            },
        ],
    };
    let text = emit_enum(&decl).expect("enum should emit");
    assert!(text.contains("Color = _lux_enum(\"Color\")"));
    assert!(text.contains("Color.__constructs__ = { \"Red\", \"Rgb\" }"));
    assert!(text.contains("Color.Red = { tag = \"Red\", index = 0 }"));
    assert!(text.contains("function Color.Rgb(r, g, b)"));
    assert!(text.contains("return { tag = \"Rgb\", index = 1, params = { r, g, b } }"));
}

#[test]
fn typedef_and_abstract_emit_nothing() {
    let td = TypedefDecl {
        path: TypePath::of("Alias"),
        target: Ty::int(),
    };
    let ab = AbstractDecl {
        path: TypePath::of("Meters"),
        underlying: Ty::float(),
    };
    assert_eq!(emit_typedef(&td).expect("typedef"), "");
    assert_eq!(emit_abstract(&ab).expect("abstract"), "");
}
