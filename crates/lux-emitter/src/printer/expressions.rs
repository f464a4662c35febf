use super::Printer;
use lux_ast::{BinOp, Constant, FieldAccess, FunctionLit, TypedKind, TypedNode, UnOp};
use lux_common::Span;

use crate::error::EmitError;

impl Printer {
    // =========================================================================
    // Expressions
    // =========================================================================

    pub fn emit_expr(&mut self, node: &TypedNode) -> Result<(), EmitError> {
        match &node.kind {
            TypedKind::Const(c) => self.emit_constant(c, node.span)?,
            TypedKind::Local(v) => self.write(&v.name),
            TypedKind::Field { object, access } => self.emit_field(object, access)?,
            TypedKind::Index { object, index } => {
                self.emit_operand(object)?;
                self.write("[");
                self.emit_expr(index)?;
                self.write("]");
            }
            TypedKind::Paren(inner) => {
                self.write("(");
                self.emit_expr(inner)?;
                self.write(")");
            }
            TypedKind::ObjectDecl(fields) => self.emit_object_literal(fields)?,
            TypedKind::ArrayDecl(items) => self.emit_array_literal(items)?,
            TypedKind::TypeRef(path) => self.write(&path.flat()),
            TypedKind::Call { callee, args } => self.emit_call(callee, args, node.span)?,
            TypedKind::New { class, args } => {
                self.write(&class.flat());
                self.write(".new(");
                self.emit_arguments(args)?;
                self.write(")");
            }
            TypedKind::Binop { op, lhs, rhs } => match op {
                BinOp::Assign | BinOp::AssignOp(_) => {
                    return Err(EmitError::unsupported(
                        "assignment in value position",
                        node.span,
                    ));
                }
                BinOp::NullCoalesce => {
                    return Err(EmitError::unsupported(
                        "null coalescing operator",
                        node.span,
                    ));
                }
                _ => self.emit_binary(op, lhs, rhs, node.span)?,
            },
            TypedKind::Unop {
                op,
                postfix: _,
                operand,
            } => self.emit_unary(*op, operand, node.span)?,
            TypedKind::Function(lit) => self.emit_function_lit(lit)?,
            // Casts and metadata are erased at runtime.
            TypedKind::Cast { expr, .. } => self.emit_expr(expr)?,
            TypedKind::Meta { expr, .. } => self.emit_expr(expr)?,
            TypedKind::EnumParameter { value, index, .. } => {
                self.emit_operand(value)?;
                self.write(".params[");
                self.write(&(index + 1).to_string());
                self.write("]");
            }
            TypedKind::EnumIndex(value) => {
                self.emit_operand(value)?;
                self.write(".index");
            }
            // Statement tags have no value rendering in this target.
            TypedKind::Block(_) => {
                return Err(EmitError::unsupported("block expression", node.span));
            }
            TypedKind::If { .. } => {
                return Err(EmitError::unsupported("if expression", node.span));
            }
            TypedKind::Switch { .. } => {
                return Err(EmitError::unsupported("switch expression", node.span));
            }
            TypedKind::Try { .. } => {
                return Err(EmitError::unsupported("try expression", node.span));
            }
            TypedKind::While { .. } => {
                return Err(EmitError::unsupported("while expression", node.span));
            }
            TypedKind::For { .. } => {
                return Err(EmitError::unsupported("for expression", node.span));
            }
            TypedKind::VarDecl { .. } => {
                return Err(EmitError::unsupported(
                    "variable declaration in value position",
                    node.span,
                ));
            }
            TypedKind::Return(_) => {
                return Err(EmitError::unsupported("return in value position", node.span));
            }
            TypedKind::Break => {
                return Err(EmitError::unsupported("break in value position", node.span));
            }
            TypedKind::Continue => {
                return Err(EmitError::unsupported(
                    "continue in value position",
                    node.span,
                ));
            }
            TypedKind::Throw(_) => {
                return Err(EmitError::unsupported("throw in value position", node.span));
            }
        }
        Ok(())
    }

    fn emit_constant(&mut self, c: &Constant, span: Span) -> Result<(), EmitError> {
        match c {
            Constant::Int(v) => self.write(&v.to_string()),
            Constant::Float(v) => self.write(&super::literals::format_float(*v)),
            Constant::Str(s) => self.emit_string_literal(s),
            Constant::Bool(true) => self.write("true"),
            Constant::Bool(false) => self.write("false"),
            Constant::Null => self.write("nil"),
            Constant::This => self.write("self"),
            Constant::Super => {
                return Err(EmitError::unsupported("bare super reference", span));
            }
        }
        Ok(())
    }

    pub(super) fn emit_binary(
        &mut self,
        op: &BinOp,
        lhs: &TypedNode,
        rhs: &TypedNode,
        span: Span,
    ) -> Result<(), EmitError> {
        // The target has no bitwise infix syntax; those forms lower to
        // runtime helper calls.
        if let Some(helper) = bitwise_helper(op) {
            self.write(helper);
            self.write("(");
            self.emit_expr(lhs)?;
            self.write(", ");
            self.emit_expr(rhs)?;
            self.write(")");
            return Ok(());
        }
        let text = if matches!(op, BinOp::Add) && is_string_operand(lhs, rhs) {
            ".."
        } else {
            operator_text(op, span)?
        };
        self.emit_operand(lhs)?;
        self.write(" ");
        self.write(text);
        self.write(" ");
        self.emit_operand(rhs)?;
        Ok(())
    }

    fn emit_unary(
        &mut self,
        op: UnOp,
        operand: &TypedNode,
        span: Span,
    ) -> Result<(), EmitError> {
        match op {
            UnOp::Not => {
                self.write("not ");
                self.emit_operand(operand)
            }
            UnOp::Neg => {
                self.write("-");
                self.emit_operand(operand)
            }
            UnOp::NegBits => {
                self.write("_lux_bnot(");
                self.emit_expr(operand)?;
                self.write(")");
                Ok(())
            }
            UnOp::Increment => Err(EmitError::unsupported("increment in value position", span)),
            UnOp::Decrement => Err(EmitError::unsupported("decrement in value position", span)),
        }
    }

    fn emit_field(
        &mut self,
        object: &TypedNode,
        access: &FieldAccess,
    ) -> Result<(), EmitError> {
        match access {
            FieldAccess::Instance(f) => {
                self.emit_operand(object)?;
                self.write(".");
                self.write(&f.name);
            }
            FieldAccess::Static { owner, field } => {
                self.write(&owner.flat());
                self.write(".");
                self.write(&field.name);
            }
            FieldAccess::Anon(name) => {
                self.emit_operand(object)?;
                self.write(".");
                self.write(name);
            }
            FieldAccess::Dynamic(name) => {
                self.emit_operand(object)?;
                self.write("[");
                self.emit_string_literal(name);
                self.write("]");
            }
            // Detachable method value: bind the receiver explicitly.
            FieldAccess::Closure(f) => {
                self.write("_lux_bind(");
                self.emit_expr(object)?;
                self.write(", ");
                self.emit_operand(object)?;
                self.write(".");
                self.write(&f.name);
                self.write(")");
            }
            FieldAccess::EnumCtor { owner, ctor, .. } => {
                self.write(&owner.flat());
                self.write(".");
                self.write(ctor);
            }
        }
        Ok(())
    }

    fn emit_call(
        &mut self,
        callee: &TypedNode,
        args: &[TypedNode],
        span: Span,
    ) -> Result<(), EmitError> {
        // A handful of identifiers are compiler intrinsics, not calls.
        if let TypedKind::Local(v) = &callee.kind {
            match v.name.as_str() {
                "__lua__" => return self.emit_raw_injection(args, span),
                "__global__" => return self.emit_global_dispatch(args, span),
                "__hash__" => {
                    let Some(arg) = args.first() else {
                        return Err(EmitError::unsupported("__hash__ without argument", span));
                    };
                    self.write("_lux_hash(");
                    self.emit_expr(arg)?;
                    self.write(")");
                    return Ok(());
                }
                "__call__" => {
                    let Some((func, rest)) = args.split_first() else {
                        return Err(EmitError::unsupported("__call__ without target", span));
                    };
                    self.emit_operand(func)?;
                    self.write("(");
                    self.emit_arguments(rest)?;
                    self.write(")");
                    return Ok(());
                }
                _ => {}
            }
        }

        // super(...) renders as the inherit-and-initialize helper call
        // against the statically known superclass.
        if matches!(callee.kind, TypedKind::Const(Constant::Super)) {
            if !self.ctx.in_constructor {
                return Err(EmitError::unsupported("super call outside constructor", span));
            }
            let Some(sup) = self.ctx.current_super.clone() else {
                return Err(EmitError::unsupported("super call without superclass", span));
            };
            self.write(&sup);
            self.write(".super(self");
            for arg in args {
                self.write(", ");
                self.emit_argument(arg)?;
            }
            self.write(")");
            return Ok(());
        }

        // Instance method calls use method-call syntax so the receiver
        // threads through as `self`.
        if let TypedKind::Field {
            object,
            access: FieldAccess::Instance(f),
        } = &callee.kind
        {
            if f.method_arity.is_some() {
                self.emit_operand(object)?;
                self.write(":");
                self.write(&f.name);
                self.write("(");
                self.emit_arguments(args)?;
                self.write(")");
                return Ok(());
            }
        }

        self.emit_operand(callee)?;
        self.write("(");
        self.emit_arguments(args)?;
        self.write(")");
        Ok(())
    }

    /// `__lua__("…")`: the string literal is emitted verbatim, unescaped
    /// and un-lowered.
    fn emit_raw_injection(&mut self, args: &[TypedNode], span: Span) -> Result<(), EmitError> {
        match args.first().map(|a| &a.kind) {
            Some(TypedKind::Const(Constant::Str(raw))) => {
                self.write(raw);
                Ok(())
            }
            _ => Err(EmitError::unsupported(
                "__lua__ without a literal string argument",
                span,
            )),
        }
    }

    /// `__global__("name", args…)`: dispatch through the global table.
    fn emit_global_dispatch(&mut self, args: &[TypedNode], span: Span) -> Result<(), EmitError> {
        let Some((name, rest)) = args.split_first() else {
            return Err(EmitError::unsupported("__global__ without target", span));
        };
        let TypedKind::Const(Constant::Str(name)) = &name.kind else {
            return Err(EmitError::unsupported(
                "__global__ without a literal name argument",
                span,
            ));
        };
        self.write("_G.");
        self.write(name);
        self.write("(");
        self.emit_arguments(rest)?;
        self.write(")");
        Ok(())
    }

    pub(super) fn emit_arguments(&mut self, args: &[TypedNode]) -> Result<(), EmitError> {
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            self.emit_argument(arg)?;
        }
        Ok(())
    }

    fn emit_argument(&mut self, arg: &TypedNode) -> Result<(), EmitError> {
        if arg.is_block_like() {
            self.emit_block_argument(arg)
        } else {
            self.emit_expr(arg)
        }
    }

    pub(super) fn emit_function_lit(&mut self, lit: &FunctionLit) -> Result<(), EmitError> {
        self.write("function(");
        for (i, param) in lit.params.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            self.write(&param.name);
        }
        self.write(")");
        self.write_line();
        self.increase_indent();
        self.emit_body(&lit.body)?;
        self.decrease_indent();
        self.write("end");
        Ok(())
    }

    /// Parenthesize operands that would otherwise change meaning under
    /// the target's precedence rules.
    pub(super) fn emit_operand(&mut self, node: &TypedNode) -> Result<(), EmitError> {
        if matches!(
            node.kind,
            TypedKind::Binop { .. } | TypedKind::Unop { .. } | TypedKind::Function(_)
        ) {
            self.write("(");
            self.emit_expr(node)?;
            self.write(")");
            Ok(())
        } else {
            self.emit_expr(node)
        }
    }
}

fn bitwise_helper(op: &BinOp) -> Option<&'static str> {
    match op {
        BinOp::BitAnd => Some("_lux_band"),
        BinOp::BitOr => Some("_lux_bor"),
        BinOp::BitXor => Some("_lux_bxor"),
        BinOp::Shl => Some("_lux_shl"),
        BinOp::Shr => Some("_lux_shr"),
        BinOp::UShr => Some("_lux_ushr"),
        _ => None,
    }
}

fn is_string_operand(lhs: &TypedNode, rhs: &TypedNode) -> bool {
    lhs.ty.path.name == "String" || rhs.ty.path.name == "String"
}

fn operator_text(op: &BinOp, span: Span) -> Result<&'static str, EmitError> {
    let text = match op {
        BinOp::Add => "+",
        BinOp::Sub => "-",
        BinOp::Mul => "*",
        BinOp::Div => "/",
        BinOp::Mod => "%",
        BinOp::Eq => "==",
        BinOp::NotEq => "~=",
        BinOp::Lt => "<",
        BinOp::LtEq => "<=",
        BinOp::Gt => ">",
        BinOp::GtEq => ">=",
        BinOp::BoolAnd => "and",
        BinOp::BoolOr => "or",
        BinOp::BitAnd
        | BinOp::BitOr
        | BinOp::BitXor
        | BinOp::Shl
        | BinOp::Shr
        | BinOp::UShr
        | BinOp::Assign
        | BinOp::AssignOp(_)
        | BinOp::NullCoalesce => {
            return Err(EmitError::Internal(format!(
                "operator {op:?} reached infix rendering at offset {}",
                span.start
            )));
        }
    };
    Ok(text)
}
