//! Lowering Pass - Phase 1 of the emission pipeline.
//!
//! Rewrites an expression-oriented typed tree into a normalized tree in
//! which value positions (operands, arguments, conditions, assigned and
//! returned values) never hold block-like nodes (`if`/`switch`/`try`/
//! block) or raw assignment/increment expressions. Those constructs are
//! hoisted into preceding statements with explicit temporaries.
//!
//! The pass owns nothing global: a fresh [`LoweringPass`] borrows one
//! [`TempVarAllocator`] for one function body and is dropped afterwards.
//! Input trees are consumed and rebuilt; shared nodes are never mutated
//! in place.
//!
//! Observable behavior is preserved: every side-effecting subexpression
//! of the input is evaluated exactly once in the output, in the input's
//! left-to-right, depth-first order. The one documented wrinkle is the
//! postfix rewrite, which captures the pre-mutation value in a dedicated
//! temporary; the addressed location itself is still evaluated once
//! because its subexpressions are hoisted first.

use lux_ast::{
    BinOp, CatchClause, Constant, FieldAccess, FunctionLit, LoopKind, ObjectField, SwitchCase,
    TEMP_ID_BASE, TempVarAllocator, Ty, TypedKind, TypedNode, UnOp, Var,
};
use lux_common::Span;

use crate::error::EmitError;

/// Maximum recursion depth for tree traversal to prevent stack overflow.
const MAX_AST_DEPTH: u32 = 500;

/// Lowering pass - Phase 1 of emission.
pub struct LoweringPass<'a> {
    temps: &'a mut TempVarAllocator,
    /// Current recursion depth for stack overflow protection.
    depth: u32,
}

impl<'a> LoweringPass<'a> {
    pub fn new(temps: &'a mut TempVarAllocator) -> Self {
        LoweringPass { temps, depth: 0 }
    }

    /// Lower one function body (or free statement sequence) into a
    /// normalized statement block.
    pub fn lower_body(&mut self, body: TypedNode) -> Result<TypedNode, EmitError> {
        assert_user_ids(&body)?;
        let span = body.span;
        let stmts = into_statements(body);
        let lowered = self.lower_statements(stmts, None)?;
        tracing::debug!(temps = self.temps.allocated(), "lowered function body");
        Ok(TypedNode::new(TypedKind::Block(lowered), Ty::void(), span))
    }

    /// Lower a statement sequence. When `assignee` is bound, the
    /// sequence's final value is written to it: the last statement is
    /// rewritten into an assignment, or, if block-like, the assignee is
    /// threaded down to *its* last statements instead.
    fn lower_statements(
        &mut self,
        stmts: Vec<TypedNode>,
        assignee: Option<&TypedNode>,
    ) -> Result<Vec<TypedNode>, EmitError> {
        let mut out = Vec::with_capacity(stmts.len());
        let count = stmts.len();
        for (i, stmt) in stmts.into_iter().enumerate() {
            match assignee {
                Some(target) if i + 1 == count => {
                    self.lower_final_statement(stmt, target, &mut out)?;
                }
                _ => self.lower_statement(stmt, &mut out)?,
            }
        }
        Ok(out)
    }

    fn lower_statement(
        &mut self,
        stmt: TypedNode,
        out: &mut Vec<TypedNode>,
    ) -> Result<(), EmitError> {
        self.enter(stmt.span)?;
        let result = self.lower_statement_inner(stmt, out);
        self.depth -= 1;
        result
    }

    fn lower_statement_inner(
        &mut self,
        stmt: TypedNode,
        out: &mut Vec<TypedNode>,
    ) -> Result<(), EmitError> {
        let TypedNode { kind, ty, span } = stmt;
        match kind {
            TypedKind::Block(inner) => {
                let lowered = self.lower_statements(inner, None)?;
                out.push(TypedNode::new(TypedKind::Block(lowered), Ty::void(), span));
            }
            TypedKind::VarDecl { var, init } => match init {
                Some(init) if init.is_block_like() => {
                    out.push(TypedNode::new(
                        TypedKind::VarDecl {
                            var: var.clone(),
                            init: None,
                        },
                        Ty::void(),
                        span,
                    ));
                    let target = TypedNode::local(var, span);
                    self.lower_final_statement(*init, &target, out)?;
                }
                Some(init) => {
                    let init = self.lower_value(*init, out)?;
                    out.push(TypedNode::new(
                        TypedKind::VarDecl {
                            var,
                            init: Some(Box::new(init)),
                        },
                        Ty::void(),
                        span,
                    ));
                }
                None => out.push(TypedNode::new(
                    TypedKind::VarDecl { var, init: None },
                    Ty::void(),
                    span,
                )),
            },
            TypedKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let cond = self.lower_value(*cond, out)?;
                let then_branch = self.lower_branch(*then_branch, None)?;
                let else_branch = match else_branch {
                    Some(e) => Some(self.lower_branch(*e, None)?),
                    None => None,
                };
                out.push(TypedNode::new(
                    TypedKind::If {
                        cond: Box::new(cond),
                        then_branch,
                        else_branch,
                    },
                    ty,
                    span,
                ));
            }
            TypedKind::While {
                cond,
                body,
                kind: loop_kind,
            } => {
                if has_lowering_trigger(&cond) {
                    // The target cannot host this condition in a loop
                    // header; re-evaluate it inside the loop body behind
                    // a negated break guard.
                    tracing::trace!("rewriting loop with non-hoistable condition");
                    let rewritten = rewrite_loop_condition(*cond, *body, loop_kind, span);
                    self.lower_statement(rewritten, out)?;
                } else {
                    let cond = self.lower_value(*cond, out)?;
                    let body = self.lower_branch(*body, None)?;
                    out.push(TypedNode::new(
                        TypedKind::While {
                            cond: Box::new(cond),
                            body,
                            kind: loop_kind,
                        },
                        ty,
                        span,
                    ));
                }
            }
            TypedKind::For { var, iter, body } => {
                let iter = self.lower_value(*iter, out)?;
                let body = self.lower_branch(*body, None)?;
                out.push(TypedNode::new(
                    TypedKind::For {
                        var,
                        iter: Box::new(iter),
                        body,
                    },
                    ty,
                    span,
                ));
            }
            TypedKind::Switch {
                subject,
                cases,
                default,
            } => {
                let subject = self.lower_value(*subject, out)?;
                // The printer repeats the subject once per comparison.
                let subject = self.ensure_simple(subject, out);
                let mut lowered_cases = Vec::with_capacity(cases.len());
                for case in cases {
                    let mut values = Vec::with_capacity(case.values.len());
                    for value in case.values {
                        values.push(self.lower_value(value, out)?);
                    }
                    let body = self.lower_branch(case.body, None)?;
                    lowered_cases.push(SwitchCase {
                        values,
                        body: *body,
                    });
                }
                let default = match default {
                    Some(d) => Some(Box::new(*self.lower_branch(*d, None)?)),
                    None => None,
                };
                out.push(TypedNode::new(
                    TypedKind::Switch {
                        subject: Box::new(subject),
                        cases: lowered_cases,
                        default,
                    },
                    ty,
                    span,
                ));
            }
            TypedKind::Try { body, catches } => {
                let body = self.lower_branch(*body, None)?;
                let mut lowered = Vec::with_capacity(catches.len());
                for catch in catches {
                    lowered.push(CatchClause {
                        var: catch.var,
                        body: *self.lower_branch(catch.body, None)?,
                    });
                }
                out.push(TypedNode::new(
                    TypedKind::Try {
                        body,
                        catches: lowered,
                    },
                    ty,
                    span,
                ));
            }
            TypedKind::Return(Some(value)) => {
                let value = self.lower_value(*value, out)?;
                out.push(TypedNode::new(
                    TypedKind::Return(Some(Box::new(value))),
                    ty,
                    span,
                ));
            }
            k @ (TypedKind::Return(None) | TypedKind::Break | TypedKind::Continue) => {
                out.push(TypedNode::new(k, ty, span));
            }
            TypedKind::Throw(value) => {
                let value = self.lower_value(*value, out)?;
                out.push(TypedNode::new(
                    TypedKind::Throw(Box::new(value)),
                    ty,
                    span,
                ));
            }
            TypedKind::Binop {
                op: BinOp::Assign,
                lhs,
                rhs,
            } => {
                if rhs.is_block_like() {
                    let target = self.hoist_lvalue(*lhs, out)?;
                    self.lower_final_statement(*rhs, &target, out)?;
                } else {
                    let lhs = self.lower_value(*lhs, out)?;
                    let rhs = self.lower_value(*rhs, out)?;
                    out.push(TypedNode::new(
                        TypedKind::Binop {
                            op: BinOp::Assign,
                            lhs: Box::new(lhs),
                            rhs: Box::new(rhs),
                        },
                        ty,
                        span,
                    ));
                }
            }
            TypedKind::Binop {
                op: BinOp::AssignOp(inner),
                lhs,
                rhs,
            } => {
                let lhs = self.lower_value(*lhs, out)?;
                let rhs = self.lower_value(*rhs, out)?;
                out.push(TypedNode::new(
                    TypedKind::Binop {
                        op: BinOp::AssignOp(inner),
                        lhs: Box::new(lhs),
                        rhs: Box::new(rhs),
                    },
                    ty,
                    span,
                ));
            }
            TypedKind::Unop {
                op: op @ (UnOp::Increment | UnOp::Decrement),
                postfix: _,
                operand,
            } => {
                // Statement position: the value is unobserved, only the
                // mutation matters.
                let target = self.hoist_lvalue(*operand, out)?;
                out.push(step_assign(target, op, span));
            }
            TypedKind::Paren(inner)
            | TypedKind::Cast { expr: inner, .. }
            | TypedKind::Meta { expr: inner, .. } => {
                // Wrappers add nothing in statement position.
                self.lower_statement(*inner, out)?;
            }
            // Remaining kinds are plain expressions in statement position.
            k => {
                let value = self.lower_value(TypedNode::new(k, ty, span), out)?;
                out.push(value);
            }
        }
        Ok(())
    }

    /// Lower the last statement of a sequence whose value must be
    /// written to `target`.
    fn lower_final_statement(
        &mut self,
        stmt: TypedNode,
        target: &TypedNode,
        out: &mut Vec<TypedNode>,
    ) -> Result<(), EmitError> {
        let TypedNode { kind, ty, span } = stmt;
        match kind {
            TypedKind::Block(inner) => {
                let lowered = self.lower_statements(inner, Some(target))?;
                out.push(TypedNode::new(TypedKind::Block(lowered), Ty::void(), span));
            }
            TypedKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let cond = self.lower_value(*cond, out)?;
                let then_branch = self.lower_branch(*then_branch, Some(target))?;
                let else_branch = match else_branch {
                    Some(e) => Some(self.lower_branch(*e, Some(target))?),
                    None => None,
                };
                out.push(TypedNode::new(
                    TypedKind::If {
                        cond: Box::new(cond),
                        then_branch,
                        else_branch,
                    },
                    Ty::void(),
                    span,
                ));
            }
            TypedKind::Switch {
                subject,
                cases,
                default,
            } => {
                let subject = self.lower_value(*subject, out)?;
                let subject = self.ensure_simple(subject, out);
                let mut lowered_cases = Vec::with_capacity(cases.len());
                for case in cases {
                    let mut values = Vec::with_capacity(case.values.len());
                    for value in case.values {
                        values.push(self.lower_value(value, out)?);
                    }
                    let body = self.lower_branch(case.body, Some(target))?;
                    lowered_cases.push(SwitchCase {
                        values,
                        body: *body,
                    });
                }
                let default = match default {
                    Some(d) => Some(Box::new(*self.lower_branch(*d, Some(target))?)),
                    None => None,
                };
                out.push(TypedNode::new(
                    TypedKind::Switch {
                        subject: Box::new(subject),
                        cases: lowered_cases,
                        default,
                    },
                    Ty::void(),
                    span,
                ));
            }
            TypedKind::Try { body, catches } => {
                let body = self.lower_branch(*body, Some(target))?;
                let mut lowered = Vec::with_capacity(catches.len());
                for catch in catches {
                    lowered.push(CatchClause {
                        var: catch.var,
                        body: *self.lower_branch(catch.body, Some(target))?,
                    });
                }
                out.push(TypedNode::new(
                    TypedKind::Try {
                        body,
                        catches: lowered,
                    },
                    Ty::void(),
                    span,
                ));
            }
            // No value flows out of these; the assignee is left unwritten
            // on such paths.
            k @ (TypedKind::Return(_)
            | TypedKind::Break
            | TypedKind::Continue
            | TypedKind::Throw(_)
            | TypedKind::While { .. }
            | TypedKind::For { .. }
            | TypedKind::VarDecl { .. }) => {
                self.lower_statement(TypedNode::new(k, ty, span), out)?;
            }
            // Plain expression: capture it into the assignee.
            k => {
                let value = self.lower_value(TypedNode::new(k, ty, span), out)?;
                out.push(assign_to(target.clone(), value, span));
            }
        }
        Ok(())
    }

    /// Lower a single statement-position child (a loop/if/switch/try
    /// body) as its own statement sequence.
    fn lower_branch(
        &mut self,
        node: TypedNode,
        assignee: Option<&TypedNode>,
    ) -> Result<Box<TypedNode>, EmitError> {
        let span = node.span;
        let stmts = into_statements(node);
        let lowered = self.lower_statements(stmts, assignee)?;
        Ok(Box::new(TypedNode::new(
            TypedKind::Block(lowered),
            Ty::void(),
            span,
        )))
    }

    fn lower_value(
        &mut self,
        expr: TypedNode,
        out: &mut Vec<TypedNode>,
    ) -> Result<TypedNode, EmitError> {
        self.enter(expr.span)?;
        let result = self.lower_value_inner(expr, out);
        self.depth -= 1;
        result
    }

    fn lower_value_inner(
        &mut self,
        expr: TypedNode,
        out: &mut Vec<TypedNode>,
    ) -> Result<TypedNode, EmitError> {
        if expr.is_block_like() {
            // Hoist: declare a temporary, normalize the block-like node
            // with the temporary as its assignee, reference it here.
            let span = expr.span;
            let temp = self.temps.fresh(expr.ty.clone());
            tracing::trace!(name = %temp.name, "hoisting block-like value");
            out.push(TypedNode::new(
                TypedKind::VarDecl {
                    var: temp.clone(),
                    init: None,
                },
                Ty::void(),
                span,
            ));
            let target = TypedNode::local(temp, span);
            self.lower_final_statement(expr, &target, out)?;
            return Ok(target);
        }

        let TypedNode { kind, ty, span } = expr;
        match kind {
            k @ (TypedKind::Const(_) | TypedKind::Local(_) | TypedKind::TypeRef(_)) => {
                Ok(TypedNode::new(k, ty, span))
            }
            TypedKind::Binop {
                op: BinOp::NullCoalesce,
                lhs,
                rhs,
            } => {
                // a ?? b  =>  t = a; (t != null) ? t : b
                // The conditional is itself block-like and goes through
                // the hoist above.
                let lhs = self.lower_value(*lhs, out)?;
                let temp = self.temps.fresh(lhs.ty.clone().as_nullable());
                out.push(TypedNode::new(
                    TypedKind::VarDecl {
                        var: temp.clone(),
                        init: Some(Box::new(lhs)),
                    },
                    Ty::void(),
                    span,
                ));
                let temp_ref = TypedNode::local(temp, span);
                let cond = TypedNode::new(
                    TypedKind::Binop {
                        op: BinOp::NotEq,
                        lhs: Box::new(temp_ref.clone()),
                        rhs: Box::new(TypedNode::null(span)),
                    },
                    Ty::bool(),
                    span,
                );
                let conditional = TypedNode::new(
                    TypedKind::If {
                        cond: Box::new(cond),
                        then_branch: Box::new(temp_ref),
                        else_branch: Some(rhs),
                    },
                    ty,
                    span,
                );
                self.lower_value(conditional, out)
            }
            TypedKind::Binop {
                op: BinOp::Assign,
                lhs,
                rhs,
            } => {
                // a = (b = 1): perform the assignment as a statement,
                // then use the (now-assigned) left-hand reference.
                let target = self.hoist_lvalue(*lhs, out)?;
                let rhs = self.lower_value(*rhs, out)?;
                out.push(assign_to(target.clone(), rhs, span));
                Ok(target)
            }
            TypedKind::Binop {
                op: BinOp::AssignOp(inner),
                lhs,
                rhs,
            } => {
                let target = self.hoist_lvalue(*lhs, out)?;
                let rhs = self.lower_value(*rhs, out)?;
                out.push(TypedNode::new(
                    TypedKind::Binop {
                        op: BinOp::AssignOp(inner),
                        lhs: Box::new(target.clone()),
                        rhs: Box::new(rhs),
                    },
                    Ty::void(),
                    span,
                ));
                Ok(target)
            }
            TypedKind::Binop { op, lhs, rhs } => {
                let lhs = self.lower_value(*lhs, out)?;
                let rhs = self.lower_value(*rhs, out)?;
                Ok(TypedNode::new(
                    TypedKind::Binop {
                        op,
                        lhs: Box::new(lhs),
                        rhs: Box::new(rhs),
                    },
                    ty,
                    span,
                ))
            }
            TypedKind::Unop {
                op: op @ (UnOp::Increment | UnOp::Decrement),
                postfix,
                operand,
            } => {
                // The addressed location is evaluated exactly once: its
                // subexpressions are hoisted before either the mutation
                // or the value capture.
                let target = self.hoist_lvalue(*operand, out)?;
                if postfix {
                    let old = self.temps.fresh(target.ty.clone());
                    out.push(TypedNode::new(
                        TypedKind::VarDecl {
                            var: old.clone(),
                            init: Some(Box::new(target.clone())),
                        },
                        Ty::void(),
                        span,
                    ));
                    out.push(step_assign(target, op, span));
                    Ok(TypedNode::local(old, span))
                } else {
                    out.push(step_assign(target.clone(), op, span));
                    Ok(target)
                }
            }
            TypedKind::Unop {
                op,
                postfix,
                operand,
            } => {
                let operand = self.lower_value(*operand, out)?;
                Ok(TypedNode::new(
                    TypedKind::Unop {
                        op,
                        postfix,
                        operand: Box::new(operand),
                    },
                    ty,
                    span,
                ))
            }
            TypedKind::Field { object, access } => {
                if let Some(arity) = native_method_arity(&access) {
                    // First-class reference to a natively-named member:
                    // forward through a shim so the name itself is never
                    // taken as a value.
                    let object = self.lower_value(*object, out)?;
                    let object = self.ensure_simple(object, out);
                    return Ok(self.forwarding_shim(object, access, arity, ty, span));
                }
                let object = self.lower_value(*object, out)?;
                // The bind helper mentions its receiver twice.
                let object = if matches!(access, FieldAccess::Closure(_)) {
                    self.ensure_simple(object, out)
                } else {
                    object
                };
                Ok(TypedNode::new(
                    TypedKind::Field {
                        object: Box::new(object),
                        access,
                    },
                    ty,
                    span,
                ))
            }
            TypedKind::Index { object, index } => {
                let object = self.lower_value(*object, out)?;
                let index = self.lower_value(*index, out)?;
                Ok(TypedNode::new(
                    TypedKind::Index {
                        object: Box::new(object),
                        index: Box::new(index),
                    },
                    ty,
                    span,
                ))
            }
            TypedKind::Paren(inner) => {
                let inner = self.lower_value(*inner, out)?;
                Ok(TypedNode::new(TypedKind::Paren(Box::new(inner)), ty, span))
            }
            TypedKind::ObjectDecl(fields) => {
                let mut lowered = Vec::with_capacity(fields.len());
                for field in fields {
                    lowered.push(ObjectField {
                        name: field.name,
                        value: self.lower_value(field.value, out)?,
                    });
                }
                Ok(TypedNode::new(TypedKind::ObjectDecl(lowered), ty, span))
            }
            TypedKind::ArrayDecl(items) => {
                let mut lowered = Vec::with_capacity(items.len());
                for item in items {
                    lowered.push(self.lower_value(item, out)?);
                }
                Ok(TypedNode::new(TypedKind::ArrayDecl(lowered), ty, span))
            }
            TypedKind::Call { callee, args } => {
                let callee = self.lower_callee(*callee, out)?;
                let mut lowered_args = Vec::with_capacity(args.len());
                for arg in args {
                    lowered_args.push(self.lower_value(arg, out)?);
                }
                Ok(TypedNode::new(
                    TypedKind::Call {
                        callee: Box::new(callee),
                        args: lowered_args,
                    },
                    ty,
                    span,
                ))
            }
            TypedKind::New { class, args } => {
                let mut lowered = Vec::with_capacity(args.len());
                for arg in args {
                    lowered.push(self.lower_value(arg, out)?);
                }
                Ok(TypedNode::new(
                    TypedKind::New {
                        class,
                        args: lowered,
                    },
                    ty,
                    span,
                ))
            }
            TypedKind::Function(lit) => {
                // A nested body is its own statement context; hoists stay
                // inside it. Temporaries still come from the run's one
                // allocator, so ids stay unique across the whole body.
                let body_span = lit.body.span;
                let stmts = into_statements(lit.body);
                let lowered = self.lower_statements(stmts, None)?;
                Ok(TypedNode::new(
                    TypedKind::Function(Box::new(FunctionLit {
                        params: lit.params,
                        ret: lit.ret,
                        body: TypedNode::new(TypedKind::Block(lowered), Ty::void(), body_span),
                    })),
                    ty,
                    span,
                ))
            }
            TypedKind::Cast { expr, to } => {
                let expr = self.lower_value(*expr, out)?;
                Ok(TypedNode::new(
                    TypedKind::Cast {
                        expr: Box::new(expr),
                        to,
                    },
                    ty,
                    span,
                ))
            }
            TypedKind::Meta { entry, expr } => {
                let expr = self.lower_value(*expr, out)?;
                Ok(TypedNode::new(
                    TypedKind::Meta {
                        entry,
                        expr: Box::new(expr),
                    },
                    ty,
                    span,
                ))
            }
            TypedKind::EnumParameter { value, ctor, index } => {
                let value = self.lower_value(*value, out)?;
                Ok(TypedNode::new(
                    TypedKind::EnumParameter {
                        value: Box::new(value),
                        ctor,
                        index,
                    },
                    ty,
                    span,
                ))
            }
            TypedKind::EnumIndex(value) => {
                let value = self.lower_value(*value, out)?;
                Ok(TypedNode::new(
                    TypedKind::EnumIndex(Box::new(value)),
                    ty,
                    span,
                ))
            }
            // Statement-only tags cannot sit in value position in
            // front-end output.
            TypedKind::VarDecl { .. }
            | TypedKind::Return(_)
            | TypedKind::Break
            | TypedKind::Continue
            | TypedKind::Throw(_)
            | TypedKind::While { .. }
            | TypedKind::For { .. } => Err(EmitError::Internal(format!(
                "statement node in value position at offset {}",
                span.start
            ))),
            // Block-like tags are consumed by the hoist at the top.
            TypedKind::Block(_)
            | TypedKind::If { .. }
            | TypedKind::Switch { .. }
            | TypedKind::Try { .. } => Err(EmitError::Internal(format!(
                "block-like node escaped the hoist guard at offset {}",
                span.start
            ))),
        }
    }

    /// Lower a call's callee. A member access used as a direct call
    /// target is not a first-class reference, so the forwarding-shim rule
    /// does not apply; only the receiver is lowered.
    fn lower_callee(
        &mut self,
        callee: TypedNode,
        out: &mut Vec<TypedNode>,
    ) -> Result<TypedNode, EmitError> {
        let TypedNode { kind, ty, span } = callee;
        match kind {
            TypedKind::Field { object, access } => {
                let object = self.lower_value(*object, out)?;
                let object = if matches!(access, FieldAccess::Closure(_)) {
                    self.ensure_simple(object, out)
                } else {
                    object
                };
                Ok(TypedNode::new(
                    TypedKind::Field {
                        object: Box::new(object),
                        access,
                    },
                    ty,
                    span,
                ))
            }
            k => self.lower_value(TypedNode::new(k, ty, span), out),
        }
    }

    /// Build `function(p1, …, pn) return <object>.<member>(p1, …, pn) end`.
    fn forwarding_shim(
        &mut self,
        object: TypedNode,
        access: FieldAccess,
        arity: usize,
        ty: Ty,
        span: Span,
    ) -> TypedNode {
        let params: Vec<Var> = (0..arity).map(|_| self.temps.fresh(Ty::dynamic())).collect();
        let args: Vec<TypedNode> = params
            .iter()
            .map(|p| TypedNode::local(p.clone(), span))
            .collect();
        // The shim supplies the receiver itself, so a closure-bound
        // access degrades to a plain instance call inside it.
        let access = match access {
            FieldAccess::Closure(f) => FieldAccess::Instance(f),
            other => other,
        };
        let member = TypedNode::new(
            TypedKind::Field {
                object: Box::new(object),
                access,
            },
            ty.clone(),
            span,
        );
        let call = TypedNode::new(
            TypedKind::Call {
                callee: Box::new(member),
                args,
            },
            Ty::dynamic(),
            span,
        );
        let body = TypedNode::new(TypedKind::Return(Some(Box::new(call))), Ty::void(), span);
        TypedNode::new(
            TypedKind::Function(Box::new(FunctionLit {
                params,
                ret: Ty::dynamic(),
                body,
            })),
            ty,
            span,
        )
    }

    /// Reduce an assignment target to a form whose every subexpression
    /// is a temporary or constant, so the location can be mentioned more
    /// than once without re-evaluating effects.
    fn hoist_lvalue(
        &mut self,
        node: TypedNode,
        out: &mut Vec<TypedNode>,
    ) -> Result<TypedNode, EmitError> {
        let TypedNode { kind, ty, span } = node;
        match kind {
            k @ (TypedKind::Local(_) | TypedKind::Const(Constant::This)) => {
                Ok(TypedNode::new(k, ty, span))
            }
            TypedKind::Field { object, access } => {
                let object = self.lower_value(*object, out)?;
                let object = self.ensure_simple(object, out);
                Ok(TypedNode::new(
                    TypedKind::Field {
                        object: Box::new(object),
                        access,
                    },
                    ty,
                    span,
                ))
            }
            TypedKind::Index { object, index } => {
                let object = self.lower_value(*object, out)?;
                let object = self.ensure_simple(object, out);
                let index = self.lower_value(*index, out)?;
                let index = self.ensure_simple(index, out);
                Ok(TypedNode::new(
                    TypedKind::Index {
                        object: Box::new(object),
                        index: Box::new(index),
                    },
                    ty,
                    span,
                ))
            }
            TypedKind::Paren(inner) => self.hoist_lvalue(*inner, out),
            _ => Err(EmitError::Internal(format!(
                "invalid assignment target at offset {}",
                span.start
            ))),
        }
    }

    /// Hoist `node` into a fresh temporary unless it is already trivially
    /// repeatable.
    fn ensure_simple(&mut self, node: TypedNode, out: &mut Vec<TypedNode>) -> TypedNode {
        if matches!(
            node.kind,
            TypedKind::Const(_) | TypedKind::Local(_) | TypedKind::TypeRef(_)
        ) {
            return node;
        }
        let span = node.span;
        let temp = self.temps.fresh(node.ty.clone());
        out.push(TypedNode::new(
            TypedKind::VarDecl {
                var: temp.clone(),
                init: Some(Box::new(node)),
            },
            Ty::void(),
            span,
        ));
        TypedNode::local(temp, span)
    }

    fn enter(&mut self, span: Span) -> Result<(), EmitError> {
        self.depth += 1;
        if self.depth > MAX_AST_DEPTH {
            self.depth -= 1;
            return Err(EmitError::Internal(format!(
                "expression nesting exceeds {MAX_AST_DEPTH} levels at offset {}",
                span.start
            )));
        }
        Ok(())
    }
}

/// Arity of a natively-named method whose first-class reference must
/// forward through a shim instead of naming the member as a value.
fn native_method_arity(access: &FieldAccess) -> Option<usize> {
    match access {
        FieldAccess::Instance(f)
        | FieldAccess::Static { field: f, .. }
        | FieldAccess::Closure(f) => {
            if f.native {
                f.method_arity
            } else {
                None
            }
        }
        FieldAccess::Anon(_) | FieldAccess::Dynamic(_) | FieldAccess::EnumCtor { .. } => None,
    }
}

fn into_statements(node: TypedNode) -> Vec<TypedNode> {
    match node.kind {
        TypedKind::Block(stmts) => stmts,
        _ => vec![node],
    }
}

fn assign_to(target: TypedNode, value: TypedNode, span: Span) -> TypedNode {
    TypedNode::new(
        TypedKind::Binop {
            op: BinOp::Assign,
            lhs: Box::new(target),
            rhs: Box::new(value),
        },
        Ty::void(),
        span,
    )
}

/// `target += 1` / `target -= 1`.
fn step_assign(target: TypedNode, op: UnOp, span: Span) -> TypedNode {
    let inner = if matches!(op, UnOp::Increment) {
        BinOp::Add
    } else {
        BinOp::Sub
    };
    TypedNode::new(
        TypedKind::Binop {
            op: BinOp::AssignOp(Box::new(inner)),
            lhs: Box::new(target),
            rhs: Box::new(TypedNode::int(1, span)),
        },
        Ty::void(),
        span,
    )
}

/// Whether a loop condition transitively contains anything that lowering
/// would hoist into preceding statements. Such a condition cannot stay in
/// the loop header: its hoisted parts must re-run every iteration.
/// Nested function literals are separate evaluation contexts and are not
/// scanned.
fn has_lowering_trigger(node: &TypedNode) -> bool {
    match &node.kind {
        TypedKind::Block(_)
        | TypedKind::If { .. }
        | TypedKind::Switch { .. }
        | TypedKind::Try { .. } => true,
        TypedKind::Binop {
            op: BinOp::Assign | BinOp::AssignOp(_) | BinOp::NullCoalesce,
            ..
        } => true,
        TypedKind::Unop {
            op: UnOp::Increment | UnOp::Decrement,
            ..
        } => true,
        TypedKind::Function(_) => false,
        _ => {
            let mut found = false;
            node.for_each_child(&mut |child| {
                if !found {
                    found = has_lowering_trigger(child);
                }
            });
            found
        }
    }
}

/// `while (cond) body` with a non-hoistable condition becomes
/// `while (true) { if (!cond) break; body }`; the test-after flavor puts
/// the guard behind the body instead.
fn rewrite_loop_condition(
    cond: TypedNode,
    body: TypedNode,
    kind: LoopKind,
    span: Span,
) -> TypedNode {
    let guard = TypedNode::new(
        TypedKind::If {
            cond: Box::new(TypedNode::new(
                TypedKind::Unop {
                    op: UnOp::Not,
                    postfix: false,
                    operand: Box::new(cond),
                },
                Ty::bool(),
                span,
            )),
            then_branch: Box::new(TypedNode::new(TypedKind::Break, Ty::void(), span)),
            else_branch: None,
        },
        Ty::void(),
        span,
    );
    let mut stmts = into_statements(body);
    match kind {
        LoopKind::WhileDo => stmts.insert(0, guard),
        LoopKind::DoWhile => stmts.push(guard),
    }
    TypedNode::new(
        TypedKind::While {
            cond: Box::new(TypedNode::bool_const(true, span)),
            body: Box::new(TypedNode::new(TypedKind::Block(stmts), Ty::void(), span)),
            kind: LoopKind::WhileDo,
        },
        Ty::void(),
        span,
    )
}

/// Defensive check of the reserved-id invariant: every identifier the
/// front end hands us must sit below [`TEMP_ID_BASE`].
fn assert_user_ids(node: &TypedNode) -> Result<(), EmitError> {
    fn check_var(var: &Var) -> Result<(), EmitError> {
        if var.id >= TEMP_ID_BASE {
            return Err(EmitError::Internal(format!(
                "front-end identifier '{}' (id {}) lies inside the reserved temporary range",
                var.name, var.id
            )));
        }
        Ok(())
    }

    fn walk(node: &TypedNode, result: &mut Result<(), EmitError>) {
        if result.is_err() {
            return;
        }
        match &node.kind {
            TypedKind::Local(v)
            | TypedKind::VarDecl { var: v, .. }
            | TypedKind::For { var: v, .. } => *result = check_var(v),
            TypedKind::Function(lit) => {
                for param in &lit.params {
                    if result.is_ok() {
                        *result = check_var(param);
                    }
                }
            }
            TypedKind::Try { catches, .. } => {
                for catch in catches {
                    if result.is_ok() {
                        *result = check_var(&catch.var);
                    }
                }
            }
            _ => {}
        }
        if result.is_ok() {
            node.for_each_child(&mut |child| walk(child, result));
        }
    }

    let mut result = Ok(());
    walk(node, &mut result);
    result
}
