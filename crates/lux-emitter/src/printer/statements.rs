use super::{Printer, is_empty_branch, is_value_expression};
use lux_ast::{BinOp, CatchClause, LoopKind, SwitchCase, TypedKind, TypedNode, UnOp, Var};

use crate::error::EmitError;

impl Printer {
    // =========================================================================
    // Statements
    // =========================================================================

    pub fn emit_statement(&mut self, node: &TypedNode) -> Result<(), EmitError> {
        match &node.kind {
            TypedKind::Block(stmts) => {
                self.write("do");
                self.write_line();
                self.increase_indent();
                self.emit_statements(stmts)?;
                self.decrease_indent();
                self.write("end");
                self.write_line();
            }
            TypedKind::VarDecl { var, init } => {
                self.write("local ");
                self.write(&var.name);
                if let Some(init) = init {
                    self.write(" = ");
                    self.emit_expr(init)?;
                }
                self.write_line();
            }
            TypedKind::If {
                cond,
                then_branch,
                else_branch,
            } => self.emit_if(cond, then_branch, else_branch.as_deref())?,
            TypedKind::While { cond, body, kind } => self.emit_while(cond, body, *kind)?,
            TypedKind::For { var, iter, body } => self.emit_for(var, iter, body)?,
            TypedKind::Switch {
                subject,
                cases,
                default,
            } => self.emit_switch(subject, cases, default.as_deref())?,
            TypedKind::Try { body, catches } => self.emit_try(node, body, catches)?,
            TypedKind::Return(value) => {
                match value {
                    Some(value) => {
                        self.write("return ");
                        self.emit_expr(value)?;
                    }
                    None => self.write("return"),
                }
                self.write_line();
            }
            TypedKind::Break => {
                self.write("break");
                self.write_line();
            }
            // Lua has no continue; loop bodies containing one get a
            // trailing label to jump to.
            TypedKind::Continue => {
                self.write("goto _lux_continue");
                self.write_line();
            }
            TypedKind::Throw(value) => {
                self.write("error(");
                self.emit_expr(value)?;
                self.write(")");
                self.write_line();
            }
            TypedKind::Binop {
                op: BinOp::Assign,
                lhs,
                rhs,
            } => {
                self.emit_expr(lhs)?;
                self.write(" = ");
                self.emit_expr(rhs)?;
                self.write_line();
            }
            TypedKind::Binop {
                op: BinOp::AssignOp(inner),
                lhs,
                rhs,
            } => {
                // compound assignment lowers textually: lhs = lhs <op> rhs
                self.emit_expr(lhs)?;
                self.write(" = ");
                self.emit_binary(inner, lhs, rhs, node.span)?;
                self.write_line();
            }
            TypedKind::Unop {
                op: op @ (UnOp::Increment | UnOp::Decrement),
                postfix: _,
                operand,
            } => {
                self.emit_expr(operand)?;
                self.write(" = ");
                self.emit_expr(operand)?;
                self.write(if matches!(op, UnOp::Increment) {
                    " + 1"
                } else {
                    " - 1"
                });
                self.write_line();
            }
            TypedKind::Call { .. } | TypedKind::New { .. } => {
                self.emit_expr(node)?;
                self.write_line();
            }
            TypedKind::Paren(inner)
            | TypedKind::Cast { expr: inner, .. }
            | TypedKind::Meta { expr: inner, .. } => {
                self.emit_statement(inner)?;
            }
            // Lua statements are calls and assignments only; any other
            // value in statement position binds to a throwaway local.
            _ => {
                self.write("local _ = ");
                self.emit_expr(node)?;
                self.write_line();
            }
        }
        Ok(())
    }

    /// `if`/`else` has four shapes depending on which branches hold code:
    /// then-only, else-only behind a negated condition, both, or an empty
    /// test with no body at all.
    fn emit_if(
        &mut self,
        cond: &TypedNode,
        then_branch: &TypedNode,
        else_branch: Option<&TypedNode>,
    ) -> Result<(), EmitError> {
        let then_empty = is_empty_branch(then_branch);
        let live_else = else_branch.filter(|e| !is_empty_branch(e));
        match (then_empty, live_else) {
            (true, None) => {
                self.write("if ");
                self.emit_expr(cond)?;
                self.write(" then end");
                self.write_line();
            }
            (true, Some(else_branch)) => {
                self.write("if not (");
                self.emit_expr(cond)?;
                self.write(") then");
                self.write_line();
                self.increase_indent();
                self.emit_body(else_branch)?;
                self.decrease_indent();
                self.write("end");
                self.write_line();
            }
            (false, None) => {
                self.write("if ");
                self.emit_expr(cond)?;
                self.write(" then");
                self.write_line();
                self.increase_indent();
                self.emit_body(then_branch)?;
                self.decrease_indent();
                self.write("end");
                self.write_line();
            }
            (false, Some(else_branch)) => {
                self.write("if ");
                self.emit_expr(cond)?;
                self.write(" then");
                self.write_line();
                self.increase_indent();
                self.emit_body(then_branch)?;
                self.decrease_indent();
                self.write("else");
                self.write_line();
                self.increase_indent();
                self.emit_body(else_branch)?;
                self.decrease_indent();
                self.write("end");
                self.write_line();
            }
        }
        Ok(())
    }

    fn emit_while(
        &mut self,
        cond: &TypedNode,
        body: &TypedNode,
        kind: LoopKind,
    ) -> Result<(), EmitError> {
        match kind {
            LoopKind::WhileDo => {
                self.write("while ");
                self.emit_expr(cond)?;
                self.write(" do");
                self.write_line();
                self.increase_indent();
                self.emit_body(body)?;
                self.emit_continue_label(body);
                self.decrease_indent();
                self.write("end");
                self.write_line();
            }
            LoopKind::DoWhile => {
                self.write("repeat");
                self.write_line();
                self.increase_indent();
                self.emit_body(body)?;
                self.emit_continue_label(body);
                self.decrease_indent();
                self.write("until not (");
                self.emit_expr(cond)?;
                self.write(")");
                self.write_line();
            }
        }
        Ok(())
    }

    /// Iterator-protocol rendering. `_lux_it` shadows lexically in
    /// nested loops, which is exactly the scoping the loop needs.
    fn emit_for(
        &mut self,
        var: &Var,
        iter: &TypedNode,
        body: &TypedNode,
    ) -> Result<(), EmitError> {
        self.write("local _lux_it = ");
        self.emit_expr(iter)?;
        self.write_line();
        self.write("while _lux_it:hasNext() do");
        self.write_line();
        self.increase_indent();
        self.write("local ");
        self.write(&var.name);
        self.write(" = _lux_it:next()");
        self.write_line();
        self.emit_body(body)?;
        self.emit_continue_label(body);
        self.decrease_indent();
        self.write("end");
        self.write_line();
        Ok(())
    }

    /// A switch renders as a cascading comparison chain: first matching
    /// case wins, left to right, with the default last.
    fn emit_switch(
        &mut self,
        subject: &TypedNode,
        cases: &[SwitchCase],
        default: Option<&TypedNode>,
    ) -> Result<(), EmitError> {
        if cases.is_empty() {
            if let Some(default) = default {
                self.emit_body(default)?;
            }
            return Ok(());
        }
        for (i, case) in cases.iter().enumerate() {
            self.write(if i == 0 { "if " } else { "elseif " });
            if case.values.is_empty() {
                self.write("false");
            }
            for (j, value) in case.values.iter().enumerate() {
                if j > 0 {
                    self.write(" or ");
                }
                self.emit_expr(subject)?;
                self.write(" == ");
                self.emit_expr(value)?;
            }
            self.write(" then");
            self.write_line();
            self.increase_indent();
            self.emit_body(&case.body)?;
            self.decrease_indent();
        }
        if let Some(default) = default {
            self.write("else");
            self.write_line();
            self.increase_indent();
            self.emit_body(default)?;
            self.decrease_indent();
        }
        self.write("end");
        self.write_line();
        Ok(())
    }

    /// Protected-call idiom. The guarded body runs in a closure under
    /// `pcall`; a sentinel distinguishes "body fell through" from "body
    /// returned a value" so returns inside the body still leave the
    /// enclosing function. The last declared catch clause is the
    /// catch-all, bound to the error value.
    fn emit_try(
        &mut self,
        node: &TypedNode,
        body: &TypedNode,
        catches: &[CatchClause],
    ) -> Result<(), EmitError> {
        let Some(catch) = catches.last() else {
            return Err(EmitError::unsupported("try without catch clauses", node.span));
        };
        self.write("local _lux_ok, _lux_result = pcall(function()");
        self.write_line();
        self.increase_indent();
        self.emit_body(body)?;
        self.write("return _lux_sentinel");
        self.write_line();
        self.decrease_indent();
        self.write("end)");
        self.write_line();
        self.write("if not _lux_ok then");
        self.write_line();
        self.increase_indent();
        self.write("local ");
        self.write(&catch.var.name);
        self.write(" = _lux_result");
        self.write_line();
        self.emit_body(&catch.body)?;
        self.decrease_indent();
        self.write("elseif _lux_result ~= _lux_sentinel then");
        self.write_line();
        self.increase_indent();
        self.write("return _lux_result");
        self.write_line();
        self.decrease_indent();
        self.write("end");
        self.write_line();
        Ok(())
    }

    fn emit_continue_label(&mut self, body: &TypedNode) {
        if contains_continue(body) {
            self.write("::_lux_continue::");
            self.write_line();
        }
    }

    /// Render a multi-statement block in value position as an inline
    /// zero-argument lambda invoked immediately. Used for call arguments
    /// the target's call syntax cannot host directly.
    pub(super) fn emit_block_argument(&mut self, arg: &TypedNode) -> Result<(), EmitError> {
        self.write("(function()");
        self.write_line();
        self.increase_indent();
        match &arg.kind {
            TypedKind::Block(stmts) => {
                if let Some((last, rest)) = stmts.split_last() {
                    self.emit_statements(rest)?;
                    if is_value_expression(last) {
                        self.write("return ");
                        self.emit_expr(last)?;
                        self.write_line();
                    } else {
                        self.emit_statement(last)?;
                    }
                }
            }
            _ => self.emit_statement(arg)?,
        }
        self.decrease_indent();
        self.write("end)()");
        Ok(())
    }
}

/// Continue statements belonging to the current loop; nested loops and
/// function literals own their own.
fn contains_continue(node: &TypedNode) -> bool {
    match &node.kind {
        TypedKind::Continue => true,
        TypedKind::While { .. } | TypedKind::For { .. } | TypedKind::Function(_) => false,
        _ => {
            let mut found = false;
            node.for_each_child(&mut |child| {
                if !found {
                    found = contains_continue(child);
                }
            });
            found
        }
    }
}
