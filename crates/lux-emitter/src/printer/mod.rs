//! Print Pass - Phase 2 of the emission pipeline.
//!
//! Renders normalized trees into Lua text. The printer is a pure
//! function of (node, emission context): it never mutates its input and
//! keeps no state beyond the output buffer, the indentation level, and
//! the per-run [`EmitContext`].

mod expressions;
mod literals;
mod statements;

use lux_ast::{TypedKind, TypedNode};

use crate::emit_context::EmitContext;
use crate::error::EmitError;

const INDENT: &str = "    ";

pub struct Printer {
    ctx: EmitContext,
    out: String,
    indent: usize,
    at_line_start: bool,
}

impl Printer {
    pub fn new(ctx: EmitContext) -> Self {
        Printer {
            ctx,
            out: String::new(),
            indent: 0,
            at_line_start: true,
        }
    }

    pub fn context(&self) -> &EmitContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut EmitContext {
        &mut self.ctx
    }

    pub fn into_text(self) -> String {
        self.out
    }

    pub(crate) fn write(&mut self, s: &str) {
        if self.at_line_start {
            for _ in 0..self.indent {
                self.out.push_str(INDENT);
            }
            self.at_line_start = false;
        }
        self.out.push_str(s);
    }

    pub(crate) fn write_line(&mut self) {
        self.out.push('\n');
        self.at_line_start = true;
    }

    pub(crate) fn increase_indent(&mut self) {
        self.indent += 1;
    }

    pub(crate) fn decrease_indent(&mut self) {
        self.indent = self.indent.saturating_sub(1);
    }

    /// Emit the statements of a function or branch body, unwrapping a
    /// top-level block so branch bodies do not render as `do … end`.
    pub fn emit_body(&mut self, node: &TypedNode) -> Result<(), EmitError> {
        match &node.kind {
            TypedKind::Block(stmts) => self.emit_statements(stmts),
            _ => self.emit_statement(node),
        }
    }

    pub fn emit_statements(&mut self, stmts: &[TypedNode]) -> Result<(), EmitError> {
        for stmt in stmts {
            self.emit_statement(stmt)?;
        }
        Ok(())
    }
}

/// A statement sequence position holding no statements at all.
pub(crate) fn is_empty_branch(node: &TypedNode) -> bool {
    matches!(&node.kind, TypedKind::Block(stmts) if stmts.is_empty())
}

/// Whether a node is a plain value expression rather than one of the
/// statement forms.
pub(crate) fn is_value_expression(node: &TypedNode) -> bool {
    use lux_ast::{BinOp, UnOp};
    match &node.kind {
        TypedKind::Block(_)
        | TypedKind::If { .. }
        | TypedKind::Switch { .. }
        | TypedKind::Try { .. }
        | TypedKind::While { .. }
        | TypedKind::For { .. }
        | TypedKind::VarDecl { .. }
        | TypedKind::Return(_)
        | TypedKind::Break
        | TypedKind::Continue
        | TypedKind::Throw(_) => false,
        TypedKind::Binop {
            op: BinOp::Assign | BinOp::AssignOp(_),
            ..
        } => false,
        TypedKind::Unop {
            op: UnOp::Increment | UnOp::Decrement,
            ..
        } => false,
        _ => true,
    }
}
