//! Behavior of the lowering pass: hoisting shapes, evaluation order,
//! and single evaluation of side effects.

use lux_ast::{
    BinOp, Constant, FieldAccess, FieldRef, LoopKind, SwitchCase, TEMP_ID_BASE, TempVarAllocator,
    Ty, TypedKind, TypedNode, UnOp, Var,
};
use lux_common::Span;
use lux_emitter::{EmitError, LoweringPass};

fn span() -> Span {
    Span::new(0, 1)
}

fn var(id: u32, name: &str, ty: Ty) -> Var {
    Var {
        id,
        name: name.to_string(),
        ty,
    }
}

fn local(id: u32, name: &str, ty: Ty) -> TypedNode {
    TypedNode::local(var(id, name, ty), span())
}

fn block(stmts: Vec<TypedNode>) -> TypedNode {
    TypedNode::new(TypedKind::Block(stmts), Ty::void(), span())
}

fn assign(lhs: TypedNode, rhs: TypedNode) -> TypedNode {
    TypedNode::new(
        TypedKind::Binop {
            op: BinOp::Assign,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        },
        Ty::void(),
        span(),
    )
}

fn call(callee: TypedNode, args: Vec<TypedNode>) -> TypedNode {
    TypedNode::new(
        TypedKind::Call {
            callee: Box::new(callee),
            args,
        },
        Ty::dynamic(),
        span(),
    )
}

fn unop(op: UnOp, postfix: bool, operand: TypedNode) -> TypedNode {
    let ty = operand.ty.clone();
    TypedNode::new(
        TypedKind::Unop {
            op,
            postfix,
            operand: Box::new(operand),
        },
        ty,
        span(),
    )
}

fn lower(body: TypedNode) -> Vec<TypedNode> {
    let mut temps = TempVarAllocator::new();
    let lowered = LoweringPass::new(&mut temps)
        .lower_body(body)
        .expect("lowering should succeed");
    match lowered.kind {
        TypedKind::Block(stmts) => stmts,
        other => panic!("expected block from lower_body, got {other:?}"),
    }
}

/// Call sites in evaluation order, named by their callee.
fn collect_calls(node: &TypedNode, out: &mut Vec<String>) {
    if let TypedKind::Call { callee, .. } = &node.kind {
        match &callee.kind {
            TypedKind::Local(v) => out.push(v.name.clone()),
            TypedKind::Field { access, .. } => match access {
                FieldAccess::Instance(f)
                | FieldAccess::Closure(f)
                | FieldAccess::Static { field: f, .. } => out.push(f.name.clone()),
                _ => out.push("<field>".to_string()),
            },
            _ => out.push("<expr>".to_string()),
        }
    }
    node.for_each_child(&mut |child| collect_calls(child, out));
}

fn calls_in(stmts: &[TypedNode]) -> Vec<String> {
    let mut out = Vec::new();
    for stmt in stmts {
        collect_calls(stmt, &mut out);
    }
    out
}

#[test]
fn postfix_increment_captures_the_old_value() {
    // y = x++  =>  t = x; x += 1; y = t
    let x = || local(1, "x", Ty::int());
    let y = || local(2, "y", Ty::int());
    let stmts = lower(block(vec![assign(y(), unop(UnOp::Increment, true, x()))]));

    assert_eq!(stmts.len(), 3, "expected capture, step, and assignment");
    let TypedKind::VarDecl {
        var: old,
        init: Some(init),
    } = &stmts[0].kind
    else {
        panic!("expected old-value capture, got {:?}", stmts[0].kind);
    };
    assert!(old.id >= TEMP_ID_BASE, "capture must use a reserved temp id");
    assert!(matches!(&init.kind, TypedKind::Local(v) if v.name == "x"));

    let TypedKind::Binop {
        op: BinOp::AssignOp(step),
        lhs,
        rhs,
    } = &stmts[1].kind
    else {
        panic!("expected compound step, got {:?}", stmts[1].kind);
    };
    assert_eq!(**step, BinOp::Add);
    assert!(matches!(&lhs.kind, TypedKind::Local(v) if v.name == "x"));
    assert!(matches!(&rhs.kind, TypedKind::Const(Constant::Int(1))));

    let TypedKind::Binop {
        op: BinOp::Assign,
        lhs,
        rhs,
    } = &stmts[2].kind
    else {
        panic!("expected final assignment, got {:?}", stmts[2].kind);
    };
    assert!(matches!(&lhs.kind, TypedKind::Local(v) if v.name == "y"));
    assert!(
        matches!(&rhs.kind, TypedKind::Local(v) if v.name == old.name),
        "the surrounding expression must observe the pre-mutation value"
    );
}

#[test]
fn prefix_increment_uses_the_new_value() {
    // y = ++x  =>  x += 1; y = x
    let x = || local(1, "x", Ty::int());
    let y = || local(2, "y", Ty::int());
    let stmts = lower(block(vec![assign(y(), unop(UnOp::Increment, false, x()))]));

    assert_eq!(stmts.len(), 2);
    assert!(matches!(
        &stmts[0].kind,
        TypedKind::Binop {
            op: BinOp::AssignOp(_),
            ..
        }
    ));
    let TypedKind::Binop { rhs, .. } = &stmts[1].kind else {
        panic!("expected assignment");
    };
    assert!(matches!(&rhs.kind, TypedKind::Local(v) if v.name == "x"));
}

#[test]
fn indexed_postfix_target_is_evaluated_once() {
    // arr[f()]++  =>  the index call runs exactly once
    let arr = local(1, "arr", Ty::dynamic());
    let f = local(2, "f", Ty::dynamic());
    let target = TypedNode::new(
        TypedKind::Index {
            object: Box::new(arr),
            index: Box::new(call(f, vec![])),
        },
        Ty::int(),
        span(),
    );
    let y = local(3, "y", Ty::int());
    let stmts = lower(block(vec![assign(y, unop(UnOp::Increment, true, target))]));
    assert_eq!(
        calls_in(&stmts),
        vec!["f"],
        "the addressed location's index must be evaluated exactly once"
    );
}

#[test]
fn while_condition_with_assignment_is_rewritten() {
    // while (a = compute()) body  =>
    // while true do a = compute(); if not a then break end; body end
    let a = || local(1, "a", Ty::bool());
    let compute = local(2, "compute", Ty::dynamic());
    let body_stmt = call(local(3, "step", Ty::dynamic()), vec![]);
    let loop_node = TypedNode::new(
        TypedKind::While {
            cond: Box::new(assign(a(), call(compute, vec![]))),
            body: Box::new(block(vec![body_stmt])),
            kind: LoopKind::WhileDo,
        },
        Ty::void(),
        span(),
    );
    let stmts = lower(block(vec![loop_node]));

    assert_eq!(stmts.len(), 1);
    let TypedKind::While { cond, body, kind } = &stmts[0].kind else {
        panic!("expected while, got {:?}", stmts[0].kind);
    };
    assert_eq!(*kind, LoopKind::WhileDo);
    assert!(
        matches!(&cond.kind, TypedKind::Const(Constant::Bool(true))),
        "condition must become the true constant"
    );
    let TypedKind::Block(body_stmts) = &body.kind else {
        panic!("expected block body");
    };
    // condition evaluation re-runs inside the loop, before the guard
    assert!(matches!(
        &body_stmts[0].kind,
        TypedKind::Binop {
            op: BinOp::Assign,
            ..
        }
    ));
    let TypedKind::If { then_branch, .. } = &body_stmts[1].kind else {
        panic!("expected negated break guard, got {:?}", body_stmts[1].kind);
    };
    let TypedKind::Block(guard_stmts) = &then_branch.kind else {
        panic!("expected block then-branch");
    };
    assert!(matches!(guard_stmts[0].kind, TypedKind::Break));
    // original body follows the guard, and compute appears exactly once
    assert_eq!(calls_in(body_stmts), vec!["compute", "step"]);
}

#[test]
fn do_while_guard_goes_after_the_body() {
    let a = || local(1, "a", Ty::bool());
    let compute = local(2, "compute", Ty::dynamic());
    let body_stmt = call(local(3, "step", Ty::dynamic()), vec![]);
    let loop_node = TypedNode::new(
        TypedKind::While {
            cond: Box::new(assign(a(), call(compute, vec![]))),
            body: Box::new(block(vec![body_stmt])),
            kind: LoopKind::DoWhile,
        },
        Ty::void(),
        span(),
    );
    let stmts = lower(block(vec![loop_node]));

    let TypedKind::While { body, .. } = &stmts[0].kind else {
        panic!("expected while");
    };
    let TypedKind::Block(body_stmts) = &body.kind else {
        panic!("expected block body");
    };
    // body first, then the re-evaluated condition and guard
    assert_eq!(calls_in(body_stmts), vec!["step", "compute"]);
    let last = body_stmts.last().expect("non-empty body");
    assert!(matches!(&last.kind, TypedKind::If { .. }));
}

#[test]
fn null_coalescing_expands_to_temp_and_conditional() {
    // r = a ?? b  =>  t0 = a; local t1; if t0 ~= nil then t1 = t0 else t1 = b end; r = t1
    let a = local(1, "a", Ty::string());
    let b = local(2, "b", Ty::string());
    let r = var(3, "r", Ty::string());
    let coalesce = TypedNode::new(
        TypedKind::Binop {
            op: BinOp::NullCoalesce,
            lhs: Box::new(a),
            rhs: Box::new(b),
        },
        Ty::string(),
        span(),
    );
    let stmts = lower(block(vec![TypedNode::new(
        TypedKind::VarDecl {
            var: r,
            init: Some(Box::new(coalesce)),
        },
        Ty::void(),
        span(),
    )]));

    assert_eq!(stmts.len(), 4);
    let TypedKind::VarDecl {
        var: t0,
        init: Some(init),
    } = &stmts[0].kind
    else {
        panic!("expected left-operand capture");
    };
    assert!(matches!(&init.kind, TypedKind::Local(v) if v.name == "a"));
    let TypedKind::VarDecl { var: t1, init: None } = &stmts[1].kind else {
        panic!("expected hoist declaration");
    };
    let TypedKind::If {
        cond,
        then_branch,
        else_branch: Some(else_branch),
    } = &stmts[2].kind
    else {
        panic!("expected conditional, got {:?}", stmts[2].kind);
    };
    let TypedKind::Binop {
        op: BinOp::NotEq,
        lhs,
        rhs,
    } = &cond.kind
    else {
        panic!("expected null test");
    };
    assert!(matches!(&lhs.kind, TypedKind::Local(v) if v.name == t0.name));
    assert!(rhs.is_null_const());
    for (branch, source) in [(then_branch, t0.name.as_str()), (else_branch, "b")] {
        let TypedKind::Block(branch_stmts) = &branch.kind else {
            panic!("expected block branch");
        };
        let TypedKind::Binop {
            op: BinOp::Assign,
            lhs,
            rhs,
        } = &branch_stmts[0].kind
        else {
            panic!("expected assignment into the hoist temp");
        };
        assert!(matches!(&lhs.kind, TypedKind::Local(v) if v.name == t1.name));
        assert!(matches!(&rhs.kind, TypedKind::Local(v) if v.name == source));
    }
    let TypedKind::VarDecl { init: Some(init), .. } = &stmts[3].kind else {
        panic!("expected declaration of r");
    };
    assert!(matches!(&init.kind, TypedKind::Local(v) if v.name == t1.name));
}

#[test]
fn hoisted_side_effects_run_exactly_once() {
    // y = if (c) f() else 0
    let c = local(1, "c", Ty::bool());
    let f = local(2, "f", Ty::dynamic());
    let conditional = TypedNode::new(
        TypedKind::If {
            cond: Box::new(c),
            then_branch: Box::new(call(f, vec![])),
            else_branch: Some(Box::new(TypedNode::int(0, span()))),
        },
        Ty::int(),
        span(),
    );
    let y = local(3, "y", Ty::int());
    let stmts = lower(block(vec![assign(y, conditional)]));
    assert_eq!(
        calls_in(&stmts),
        vec!["f"],
        "the hoisted branch call must appear exactly once"
    );
}

#[test]
fn effect_order_is_preserved() {
    // f(); y = g() ?? h()  =>  effects observe f, g, h in that order
    let f = local(1, "f", Ty::dynamic());
    let g = local(2, "g", Ty::dynamic());
    let h = local(3, "h", Ty::dynamic());
    let y = local(4, "y", Ty::dynamic());
    let coalesce = TypedNode::new(
        TypedKind::Binop {
            op: BinOp::NullCoalesce,
            lhs: Box::new(call(g, vec![])),
            rhs: Box::new(call(h, vec![])),
        },
        Ty::dynamic(),
        span(),
    );
    let stmts = lower(block(vec![call(f, vec![]), assign(y, coalesce)]));
    assert_eq!(calls_in(&stmts), vec!["f", "g", "h"]);
}

#[test]
fn assignment_as_value_is_split() {
    // a = (b = 1)  =>  b = 1; a = b
    let a = local(1, "a", Ty::int());
    let b = || local(2, "b", Ty::int());
    let stmts = lower(block(vec![assign(
        a,
        assign(b(), TypedNode::int(1, span())),
    )]));

    assert_eq!(stmts.len(), 2);
    let TypedKind::Binop { lhs, rhs, .. } = &stmts[0].kind else {
        panic!("expected inner assignment first");
    };
    assert!(matches!(&lhs.kind, TypedKind::Local(v) if v.name == "b"));
    assert!(matches!(&rhs.kind, TypedKind::Const(Constant::Int(1))));
    let TypedKind::Binop { lhs, rhs, .. } = &stmts[1].kind else {
        panic!("expected outer assignment");
    };
    assert!(matches!(&lhs.kind, TypedKind::Local(v) if v.name == "a"));
    assert!(matches!(&rhs.kind, TypedKind::Local(v) if v.name == "b"));
}

#[test]
fn returned_block_is_hoisted_through_a_temp() {
    // return { f(); 42 }
    let f = local(1, "f", Ty::dynamic());
    let ret = TypedNode::new(
        TypedKind::Return(Some(Box::new(block(vec![
            call(f, vec![]),
            TypedNode::int(42, span()),
        ])))),
        Ty::void(),
        span(),
    );
    let stmts = lower(block(vec![ret]));

    assert_eq!(stmts.len(), 3);
    let TypedKind::VarDecl { var: temp, init: None } = &stmts[0].kind else {
        panic!("expected hoist declaration");
    };
    assert!(matches!(&stmts[1].kind, TypedKind::Block(_)));
    let TypedKind::Return(Some(value)) = &stmts[2].kind else {
        panic!("expected return");
    };
    assert!(matches!(&value.kind, TypedKind::Local(v) if v.name == temp.name));
}

#[test]
fn native_member_reference_gets_a_forwarding_shim() {
    let obj = local(1, "obj", Ty::dynamic());
    let member = TypedNode::new(
        TypedKind::Field {
            object: Box::new(obj),
            access: FieldAccess::Instance(FieldRef::native_method("write", 2)),
        },
        Ty::dynamic(),
        span(),
    );
    let h = var(2, "h", Ty::dynamic());
    let stmts = lower(block(vec![TypedNode::new(
        TypedKind::VarDecl {
            var: h,
            init: Some(Box::new(member)),
        },
        Ty::void(),
        span(),
    )]));

    let TypedKind::VarDecl { init: Some(init), .. } = &stmts.last().expect("statements").kind
    else {
        panic!("expected declaration");
    };
    let TypedKind::Function(shim) = &init.kind else {
        panic!("expected forwarding shim, got {:?}", init.kind);
    };
    assert_eq!(shim.params.len(), 2, "shim arity must match the member");
    let TypedKind::Return(Some(forwarded)) = &shim.body.kind else {
        panic!("expected forwarding return");
    };
    assert!(matches!(&forwarded.kind, TypedKind::Call { .. }));
}

#[test]
fn direct_call_to_native_member_is_not_shimmed() {
    let obj = local(1, "obj", Ty::dynamic());
    let member = TypedNode::new(
        TypedKind::Field {
            object: Box::new(obj),
            access: FieldAccess::Instance(FieldRef::native_method("write", 1)),
        },
        Ty::dynamic(),
        span(),
    );
    let stmts = lower(block(vec![call(member, vec![TypedNode::int(1, span())])]));

    assert_eq!(stmts.len(), 1);
    let TypedKind::Call { callee, .. } = &stmts[0].kind else {
        panic!("expected call statement");
    };
    assert!(
        matches!(&callee.kind, TypedKind::Field { .. }),
        "a direct call keeps the member as its callee"
    );
}

#[test]
fn switch_subject_is_hoisted_once() {
    let f = local(1, "f", Ty::dynamic());
    let case_body = call(local(2, "g", Ty::dynamic()), vec![]);
    let switch = TypedNode::new(
        TypedKind::Switch {
            subject: Box::new(call(f, vec![])),
            cases: vec![SwitchCase {
                values: vec![TypedNode::int(1, span())],
                body: case_body,
            }],
            default: None,
        },
        Ty::void(),
        span(),
    );
    let stmts = lower(block(vec![switch]));

    assert_eq!(stmts.len(), 2);
    let TypedKind::VarDecl { var: temp, init: Some(_) } = &stmts[0].kind else {
        panic!("expected subject hoist");
    };
    let TypedKind::Switch { subject, .. } = &stmts[1].kind else {
        panic!("expected switch");
    };
    assert!(matches!(&subject.kind, TypedKind::Local(v) if v.name == temp.name));
}

#[test]
fn reserved_id_in_input_is_an_internal_error() {
    let poisoned = local(TEMP_ID_BASE + 7, "sneaky", Ty::int());
    let mut temps = TempVarAllocator::new();
    let result = LoweringPass::new(&mut temps).lower_body(block(vec![poisoned]));
    assert!(matches!(result, Err(EmitError::Internal(_))));
}
