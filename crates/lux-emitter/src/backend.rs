//! Pipeline entry point.
//!
//! One [`Backend`] drives a whole compilation: the front end hands it
//! one resolved declaration at a time, and for each one it folds null
//! comparisons, validates nullability, lowers every body, prints, and
//! finally runs the registered hook chain over the assembled text.
//!
//! Each declaration's emission is an isolated run with its own
//! temporaries and emission context: a fatal error aborts that
//! declaration only, never its siblings.

use lux_ast::{
    BinOp, ClassDecl, Constant, Declaration, FieldAccess, FieldKind, FieldRef, FunctionLit,
    TempVarAllocator, Ty, TypedKind, TypedNode,
};
use lux_checker::{NullabilityChecker, fold_null_comparisons};
use lux_common::{Diagnostic, Span};

use crate::declaration_emitter;
use crate::emit_context::EmitContext;
use crate::error::EmitError;
use crate::hooks::{CompilerHandle, HookChain, HookFn, HookKind};
use crate::lowering::LoweringPass;
use crate::printer::Printer;

pub struct Backend {
    file: String,
    hooks: HookChain,
    diagnostics: Vec<Diagnostic>,
}

impl Backend {
    pub fn new(file: impl Into<String>) -> Self {
        Backend {
            file: file.into(),
            hooks: HookChain::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Register a post-processing hook. Call before the run starts;
    /// there is no hot-registration.
    pub fn register_hook(&mut self, kind: HookKind, hook: HookFn) {
        self.hooks.register(kind, hook);
    }

    /// Nullability findings accumulated so far. Never dropped silently;
    /// whether they fail the compile is the driver's decision.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Emit every declaration, isolating failures: an error result for
    /// one declaration leaves the others' output intact.
    pub fn emit_all(&mut self, decls: &[Declaration]) -> Vec<Result<String, EmitError>> {
        decls.iter().map(|decl| self.emit_declaration(decl)).collect()
    }

    pub fn emit_declaration(&mut self, decl: &Declaration) -> Result<String, EmitError> {
        tracing::debug!(path = %decl.path().qualified(), "emit declaration");

        // Validation runs over the original tree, before any rewriting.
        let mut checker = NullabilityChecker::new(self.file.clone());
        checker.check_declaration(decl);
        self.diagnostics.extend(checker.into_diagnostics());

        let text = match decl {
            Declaration::Class(class) => {
                let (prepared, static_inits) = self.prepare_class(class)?;
                declaration_emitter::emit_class(&prepared, &static_inits)?
            }
            Declaration::Enum(decl) => declaration_emitter::emit_enum(decl)?,
            Declaration::Typedef(decl) => declaration_emitter::emit_typedef(decl)?,
            Declaration::Abstract(decl) => declaration_emitter::emit_abstract(decl)?,
        };

        let handle = CompilerHandle { file: &self.file };
        Ok(self.hooks.run(HookKind::of(decl), text, &handle, Some(decl)))
    }

    /// Emit one standalone expression tree as a statement sequence.
    pub fn emit_expression(&mut self, body: &TypedNode) -> Result<String, EmitError> {
        let mut checker = NullabilityChecker::new(self.file.clone());
        checker.check_expression(body);
        self.diagnostics.extend(checker.into_diagnostics());

        let folded = fold_null_comparisons(body);
        let mut temps = TempVarAllocator::new();
        let lowered = LoweringPass::new(&mut temps).lower_body(folded)?;
        let mut printer = Printer::new(EmitContext::new());
        printer.emit_body(&lowered)?;
        let handle = CompilerHandle { file: &self.file };
        Ok(self
            .hooks
            .run(HookKind::Expression, printer.into_text(), &handle, None))
    }

    /// Rebuild a class for emission: field initializers and the implicit
    /// parent chain fold into the constructor body, static initializers
    /// become lowered statements, and every body goes through the
    /// fold-then-lower pipeline.
    fn prepare_class(
        &self,
        class: &ClassDecl,
    ) -> Result<(ClassDecl, Vec<TypedNode>), EmitError> {
        let mut prepared = class.clone();
        let span = Span::synthesized();

        let mut ctor_stmts: Vec<TypedNode> = Vec::new();
        let explicit = prepared.constructor.take();
        if explicit.is_none() && class.superclass.is_some() {
            // No explicit constructor: chain into the parent implicitly.
            ctor_stmts.push(TypedNode::new(
                TypedKind::Call {
                    callee: Box::new(TypedNode::new(
                        TypedKind::Const(Constant::Super),
                        Ty::dynamic(),
                        span,
                    )),
                    args: Vec::new(),
                },
                Ty::void(),
                span,
            ));
        }
        for field in &class.fields {
            if let FieldKind::Var { ty, init: Some(init) } = &field.kind {
                let target = TypedNode::new(
                    TypedKind::Field {
                        object: Box::new(TypedNode::new(
                            TypedKind::Const(Constant::This),
                            Ty::dynamic(),
                            span,
                        )),
                        access: FieldAccess::Instance(FieldRef::var(field.name.as_str())),
                    },
                    ty.clone(),
                    span,
                );
                ctor_stmts.push(TypedNode::new(
                    TypedKind::Binop {
                        op: BinOp::Assign,
                        lhs: Box::new(target),
                        rhs: Box::new(init.clone()),
                    },
                    Ty::void(),
                    span,
                ));
            }
        }
        let (params, ret) = match &explicit {
            Some(ctor) => (ctor.params.clone(), ctor.ret.clone()),
            None => (Vec::new(), Ty::void()),
        };
        if let Some(ctor) = explicit {
            match ctor.body.kind {
                TypedKind::Block(stmts) => ctor_stmts.extend(stmts),
                _ => ctor_stmts.push(ctor.body),
            }
        }
        let ctor = FunctionLit {
            params,
            ret,
            body: TypedNode::new(TypedKind::Block(ctor_stmts), Ty::void(), span),
        };
        prepared.constructor = Some(self.prepare_function(&ctor)?);

        for field in &mut prepared.fields {
            match &mut field.kind {
                // Initializers moved into the constructor.
                FieldKind::Var { init, .. } => *init = None,
                FieldKind::Method(func) => *func = self.prepare_function(func)?,
            }
        }

        let mut static_inits = Vec::new();
        for field in &mut prepared.statics {
            match &mut field.kind {
                FieldKind::Method(func) => *func = self.prepare_function(func)?,
                FieldKind::Var { ty, init } => {
                    if let Some(init_expr) = init.take() {
                        let target = TypedNode::new(
                            TypedKind::Field {
                                object: Box::new(TypedNode::new(
                                    TypedKind::TypeRef(class.path.clone()),
                                    Ty::dynamic(),
                                    span,
                                )),
                                access: FieldAccess::Static {
                                    owner: class.path.clone(),
                                    field: FieldRef::var(field.name.as_str()),
                                },
                            },
                            ty.clone(),
                            span,
                        );
                        let assign = TypedNode::new(
                            TypedKind::Binop {
                                op: BinOp::Assign,
                                lhs: Box::new(target),
                                rhs: Box::new(init_expr),
                            },
                            Ty::void(),
                            span,
                        );
                        let folded = fold_null_comparisons(&assign);
                        let mut temps = TempVarAllocator::new();
                        let lowered = LoweringPass::new(&mut temps).lower_body(folded)?;
                        match lowered.kind {
                            TypedKind::Block(stmts) => static_inits.extend(stmts),
                            _ => static_inits.push(lowered),
                        }
                    }
                }
            }
        }

        Ok((prepared, static_inits))
    }

    /// Fold and lower one function body. Temporaries are scoped to this
    /// single run.
    fn prepare_function(&self, func: &FunctionLit) -> Result<FunctionLit, EmitError> {
        let folded = fold_null_comparisons(&func.body);
        let mut temps = TempVarAllocator::new();
        let body = LoweringPass::new(&mut temps).lower_body(folded)?;
        Ok(FunctionLit {
            params: func.params.clone(),
            ret: func.ret.clone(),
            body,
        })
    }
}
