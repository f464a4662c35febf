use lux_ast::{
    BinOp, CatchClause, ClassField, Constant, Declaration, FieldKind, FunctionLit, ObjectField,
    SwitchCase, Ty, TypedKind, TypedNode,
};
use lux_common::diagnostics::diagnostic_codes;
use lux_common::{Diagnostic, Span};

/// Read-only validation of null flow against declared nullability.
///
/// Findings accumulate as diagnostics; nothing here stops the pipeline.
/// Whether accumulated errors fail the overall compile is the driver's
/// decision.
pub struct NullabilityChecker {
    file: String,
    diagnostics: Vec<Diagnostic>,
    /// Declared return types of the enclosing functions, innermost last.
    return_types: Vec<Ty>,
}

impl NullabilityChecker {
    pub fn new(file: impl Into<String>) -> Self {
        NullabilityChecker {
            file: file.into(),
            diagnostics: Vec::new(),
            return_types: Vec::new(),
        }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    pub fn check_declaration(&mut self, decl: &Declaration) {
        match decl {
            Declaration::Class(class) => {
                if let Some(ctor) = &class.constructor {
                    self.check_function(ctor);
                }
                for field in class.fields.iter().chain(class.statics.iter()) {
                    self.check_field(field);
                }
            }
            // Enum constructors, typedefs, and abstracts carry no bodies.
            Declaration::Enum(_) | Declaration::Typedef(_) | Declaration::Abstract(_) => {}
        }
    }

    pub fn check_function(&mut self, func: &FunctionLit) {
        self.return_types.push(func.ret.clone());
        self.check_node(&func.body);
        self.return_types.pop();
    }

    /// Check a standalone expression tree (the single-expression
    /// emission path). Return statements check against the dynamic type.
    pub fn check_expression(&mut self, node: &TypedNode) {
        self.return_types.push(Ty::dynamic());
        self.check_node(node);
        self.return_types.pop();
    }

    fn check_field(&mut self, field: &ClassField) {
        match &field.kind {
            FieldKind::Var { ty, init } => {
                if let Some(init) = init {
                    if init.is_null_const() && !ty.nullable {
                        self.report_assignment(ty, init.span);
                    }
                    self.check_node(init);
                }
            }
            FieldKind::Method(func) => self.check_function(func),
        }
    }

    fn check_node(&mut self, node: &TypedNode) {
        match &node.kind {
            TypedKind::Binop {
                op: BinOp::Assign | BinOp::AssignOp(_),
                lhs,
                rhs,
            } => {
                if rhs.is_null_const() && !lhs.ty.nullable {
                    self.report_assignment(&lhs.ty, rhs.span);
                }
            }
            TypedKind::VarDecl {
                var,
                init: Some(init),
            } => {
                if init.is_null_const() && !var.ty.nullable {
                    self.report_assignment(&var.ty, init.span);
                }
            }
            TypedKind::Call { callee, args } => {
                if let Some(sig) = &callee.ty.signature {
                    for (arg, param) in args.iter().zip(sig.params.iter()) {
                        if arg.is_null_const() && !param.ty.nullable && !param.optional {
                            self.diagnostics.push(Diagnostic::error(
                                &self.file,
                                arg.span,
                                format!(
                                    "null is not a valid argument for non-nullable parameter '{}' of type '{}'",
                                    param.name,
                                    param.ty.path.qualified()
                                ),
                                diagnostic_codes::NULL_ARGUMENT_FOR_NON_NULLABLE,
                            ));
                        }
                    }
                }
            }
            TypedKind::Return(Some(value)) => {
                if value.is_null_const() {
                    if let Some(ret) = self.return_types.last() {
                        if !ret.nullable {
                            self.diagnostics.push(Diagnostic::error(
                                &self.file,
                                value.span,
                                format!(
                                    "null returned from a function with non-nullable return type '{}'",
                                    ret.path.qualified()
                                ),
                                diagnostic_codes::NULL_RETURN_FOR_NON_NULLABLE,
                            ));
                        }
                    }
                }
            }
            TypedKind::Function(lit) => {
                // Scope the declared return type to the nested body.
                self.check_function(lit);
                return;
            }
            _ => {}
        }

        node.for_each_child(&mut |child| self.check_node(child));
    }

    fn report_assignment(&mut self, target: &Ty, span: Span) {
        self.diagnostics.push(Diagnostic::error(
            &self.file,
            span,
            format!(
                "null cannot be assigned to non-nullable type '{}'",
                target.path.qualified()
            ),
            diagnostic_codes::NULL_ASSIGNED_TO_NON_NULLABLE,
        ));
    }
}

/// Folds `==`/`!=` comparisons whose outcome is fixed by declared
/// nullability, producing a new tree. `null == null` folds to `true`;
/// comparing `null` against an operand whose declared type cannot hold
/// null folds to `false` (inverted for `!=`). Already-folded constants
/// are fixed points, so the pass is idempotent.
pub fn fold_null_comparisons(node: &TypedNode) -> TypedNode {
    let kind = match &node.kind {
        TypedKind::Binop { op, lhs, rhs } if matches!(op, BinOp::Eq | BinOp::NotEq) => {
            let lhs = fold_null_comparisons(lhs);
            let rhs = fold_null_comparisons(rhs);
            if let Some(result) = known_null_comparison(op, &lhs, &rhs) {
                tracing::trace!(?op, result, "folded null comparison");
                TypedKind::Const(Constant::Bool(result))
            } else {
                TypedKind::Binop {
                    op: op.clone(),
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                }
            }
        }
        TypedKind::Const(c) => TypedKind::Const(c.clone()),
        TypedKind::Local(v) => TypedKind::Local(v.clone()),
        TypedKind::Field { object, access } => TypedKind::Field {
            object: Box::new(fold_null_comparisons(object)),
            access: access.clone(),
        },
        TypedKind::Index { object, index } => TypedKind::Index {
            object: Box::new(fold_null_comparisons(object)),
            index: Box::new(fold_null_comparisons(index)),
        },
        TypedKind::Paren(inner) => TypedKind::Paren(Box::new(fold_null_comparisons(inner))),
        TypedKind::ObjectDecl(fields) => TypedKind::ObjectDecl(
            fields
                .iter()
                .map(|f| ObjectField {
                    name: f.name.clone(),
                    value: fold_null_comparisons(&f.value),
                })
                .collect(),
        ),
        TypedKind::ArrayDecl(items) => {
            TypedKind::ArrayDecl(items.iter().map(fold_null_comparisons).collect())
        }
        TypedKind::TypeRef(path) => TypedKind::TypeRef(path.clone()),
        TypedKind::Call { callee, args } => TypedKind::Call {
            callee: Box::new(fold_null_comparisons(callee)),
            args: args.iter().map(fold_null_comparisons).collect(),
        },
        TypedKind::New { class, args } => TypedKind::New {
            class: class.clone(),
            args: args.iter().map(fold_null_comparisons).collect(),
        },
        TypedKind::Binop { op, lhs, rhs } => TypedKind::Binop {
            op: op.clone(),
            lhs: Box::new(fold_null_comparisons(lhs)),
            rhs: Box::new(fold_null_comparisons(rhs)),
        },
        TypedKind::Unop {
            op,
            postfix,
            operand,
        } => TypedKind::Unop {
            op: *op,
            postfix: *postfix,
            operand: Box::new(fold_null_comparisons(operand)),
        },
        TypedKind::Function(lit) => TypedKind::Function(Box::new(FunctionLit {
            params: lit.params.clone(),
            ret: lit.ret.clone(),
            body: fold_null_comparisons(&lit.body),
        })),
        TypedKind::VarDecl { var, init } => TypedKind::VarDecl {
            var: var.clone(),
            init: init
                .as_ref()
                .map(|init| Box::new(fold_null_comparisons(init))),
        },
        TypedKind::Block(stmts) => {
            TypedKind::Block(stmts.iter().map(fold_null_comparisons).collect())
        }
        TypedKind::For { var, iter, body } => TypedKind::For {
            var: var.clone(),
            iter: Box::new(fold_null_comparisons(iter)),
            body: Box::new(fold_null_comparisons(body)),
        },
        TypedKind::If {
            cond,
            then_branch,
            else_branch,
        } => TypedKind::If {
            cond: Box::new(fold_null_comparisons(cond)),
            then_branch: Box::new(fold_null_comparisons(then_branch)),
            else_branch: else_branch
                .as_ref()
                .map(|e| Box::new(fold_null_comparisons(e))),
        },
        TypedKind::While { cond, body, kind } => TypedKind::While {
            cond: Box::new(fold_null_comparisons(cond)),
            body: Box::new(fold_null_comparisons(body)),
            kind: *kind,
        },
        TypedKind::Switch {
            subject,
            cases,
            default,
        } => TypedKind::Switch {
            subject: Box::new(fold_null_comparisons(subject)),
            cases: cases
                .iter()
                .map(|case| SwitchCase {
                    values: case.values.iter().map(fold_null_comparisons).collect(),
                    body: fold_null_comparisons(&case.body),
                })
                .collect(),
            default: default.as_ref().map(|d| Box::new(fold_null_comparisons(d))),
        },
        TypedKind::Return(value) => {
            TypedKind::Return(value.as_ref().map(|v| Box::new(fold_null_comparisons(v))))
        }
        TypedKind::Break => TypedKind::Break,
        TypedKind::Continue => TypedKind::Continue,
        TypedKind::Throw(value) => TypedKind::Throw(Box::new(fold_null_comparisons(value))),
        TypedKind::Cast { expr, to } => TypedKind::Cast {
            expr: Box::new(fold_null_comparisons(expr)),
            to: to.clone(),
        },
        TypedKind::Meta { entry, expr } => TypedKind::Meta {
            entry: entry.clone(),
            expr: Box::new(fold_null_comparisons(expr)),
        },
        TypedKind::Try { body, catches } => TypedKind::Try {
            body: Box::new(fold_null_comparisons(body)),
            catches: catches
                .iter()
                .map(|catch| CatchClause {
                    var: catch.var.clone(),
                    body: fold_null_comparisons(&catch.body),
                })
                .collect(),
        },
        TypedKind::EnumParameter { value, ctor, index } => TypedKind::EnumParameter {
            value: Box::new(fold_null_comparisons(value)),
            ctor: ctor.clone(),
            index: *index,
        },
        TypedKind::EnumIndex(value) => {
            TypedKind::EnumIndex(Box::new(fold_null_comparisons(value)))
        }
    };

    TypedNode::new(kind, node.ty.clone(), node.span)
}

/// `Some(result)` when the comparison's outcome is statically known.
fn known_null_comparison(op: &BinOp, lhs: &TypedNode, rhs: &TypedNode) -> Option<bool> {
    let eq = matches!(op, BinOp::Eq);
    if lhs.is_null_const() && rhs.is_null_const() {
        return Some(eq);
    }
    if lhs.is_null_const() && !rhs.ty.nullable {
        return Some(!eq);
    }
    if rhs.is_null_const() && !lhs.ty.nullable {
        return Some(!eq);
    }
    None
}
