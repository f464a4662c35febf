//! Declaration rendering.
//!
//! Turns one prepared declaration (bodies already folded and lowered)
//! into its Lua text. Classes emit the two-function constructor shape:
//! `.new` allocates the receiver, delegates to `.super`, and returns the
//! instance; `.super` carries field initialization and the constructor
//! body so subclasses can chain into it.

use lux_ast::{AbstractDecl, ClassDecl, EnumDecl, FieldKind, FunctionLit, TypedNode, TypedefDecl};

use crate::emit_context::EmitContext;
use crate::error::EmitError;
use crate::printer::Printer;

pub fn emit_class(class: &ClassDecl, static_inits: &[TypedNode]) -> Result<String, EmitError> {
    let flat = class.path.flat();
    let mut ctx = EmitContext::new();
    ctx.current_super = class.superclass.as_ref().map(|s| s.flat());
    let mut p = Printer::new(ctx);

    p.write(&flat);
    p.write(" = _lux_class(\"");
    p.write(&class.path.qualified());
    p.write("\")");
    p.write_line();
    p.write(&flat);
    p.write(".__name__ = \"");
    p.write(&class.path.qualified());
    p.write("\"");
    p.write_line();
    if let Some(superclass) = &class.superclass {
        p.write(&flat);
        p.write(".__super__ = ");
        p.write(&superclass.flat());
        p.write_line();
    }
    if !class.interfaces.is_empty() {
        p.write(&flat);
        p.write(".__interfaces__ = { ");
        for (i, interface) in class.interfaces.iter().enumerate() {
            if i > 0 {
                p.write(", ");
            }
            p.write(&interface.flat());
        }
        p.write(" }");
        p.write_line();
    }

    if let Some(ctor) = &class.constructor {
        emit_constructor(&mut p, &flat, ctor)?;
    }

    for field in &class.fields {
        if let FieldKind::Method(func) = &field.kind {
            p.write("function ");
            p.write(&flat);
            p.write(".prototype:");
            p.write(&field.name);
            emit_param_list(&mut p, func);
            p.write_line();
            p.increase_indent();
            p.emit_body(&func.body)?;
            p.decrease_indent();
            p.write("end");
            p.write_line();
        }
    }

    for field in &class.statics {
        if let FieldKind::Method(func) = &field.kind {
            p.write("function ");
            p.write(&flat);
            p.write(".");
            p.write(&field.name);
            emit_param_list(&mut p, func);
            p.write_line();
            p.increase_indent();
            p.emit_body(&func.body)?;
            p.decrease_indent();
            p.write("end");
            p.write_line();
        }
    }

    // Static initializers run after the methods exist.
    p.emit_statements(static_inits)?;

    Ok(p.into_text())
}

fn emit_constructor(p: &mut Printer, flat: &str, ctor: &FunctionLit) -> Result<(), EmitError> {
    // Allocation boilerplate with the implicit return of the receiver.
    p.write("function ");
    p.write(flat);
    p.write(".new");
    emit_param_list(p, ctor);
    p.write_line();
    p.increase_indent();
    p.write("local self = _lux_new(");
    p.write(flat);
    p.write(")");
    p.write_line();
    p.write(flat);
    p.write(".super(self");
    for param in &ctor.params {
        p.write(", ");
        p.write(&param.name);
    }
    p.write(")");
    p.write_line();
    p.write("return self");
    p.write_line();
    p.decrease_indent();
    p.write("end");
    p.write_line();

    // The initializer chain target.
    p.write("function ");
    p.write(flat);
    p.write(".super(self");
    for param in &ctor.params {
        p.write(", ");
        p.write(&param.name);
    }
    p.write(")");
    p.write_line();
    p.increase_indent();
    p.context_mut().in_constructor = true;
    let body_result = p.emit_body(&ctor.body);
    p.context_mut().in_constructor = false;
    body_result?;
    p.decrease_indent();
    p.write("end");
    p.write_line();
    Ok(())
}

fn emit_param_list(p: &mut Printer, func: &FunctionLit) {
    p.write("(");
    for (i, param) in func.params.iter().enumerate() {
        if i > 0 {
            p.write(", ");
        }
        p.write(&param.name);
    }
    p.write(")");
}

pub fn emit_enum(decl: &EnumDecl) -> Result<String, EmitError> {
    let flat = decl.path.flat();
    let mut p = Printer::new(EmitContext::new());

    p.write(&flat);
    p.write(" = _lux_enum(\"");
    p.write(&decl.path.qualified());
    p.write("\")");
    p.write_line();
    p.write(&flat);
    p.write(".__constructs__ = { ");
    for (i, ctor) in decl.constructors.iter().enumerate() {
        if i > 0 {
            p.write(", ");
        }
        p.write("\"");
        p.write(&ctor.name);
        p.write("\"");
    }
    p.write(" }");
    p.write_line();

    // Parameterless constructors are singleton values; parameterized
    // ones are factory functions. Either way the value carries its
    // index and tag for the enum projections.
    for (index, ctor) in decl.constructors.iter().enumerate() {
        if ctor.params.is_empty() {
            p.write(&flat);
            p.write(".");
            p.write(&ctor.name);
            p.write(" = { tag = \"");
            p.write(&ctor.name);
            p.write("\", index = ");
            p.write(&index.to_string());
            p.write(" }");
            p.write_line();
        } else {
            p.write("function ");
            p.write(&flat);
            p.write(".");
            p.write(&ctor.name);
            p.write("(");
            for (i, param) in ctor.params.iter().enumerate() {
                if i > 0 {
                    p.write(", ");
                }
                p.write(&param.name);
            }
            p.write(")");
            p.write_line();
            p.increase_indent();
            p.write("return { tag = \"");
            p.write(&ctor.name);
            p.write("\", index = ");
            p.write(&index.to_string());
            p.write(", params = { ");
            for (i, param) in ctor.params.iter().enumerate() {
                if i > 0 {
                    p.write(", ");
                }
                p.write(&param.name);
            }
            p.write(" } }");
            p.write_line();
            p.decrease_indent();
            p.write("end");
            p.write_line();
        }
    }

    Ok(p.into_text())
}

/// Typedefs are compile-time only; nothing reaches the target. The hook
/// chain still runs over the (empty) result.
pub fn emit_typedef(_decl: &TypedefDecl) -> Result<String, EmitError> {
    Ok(String::new())
}

/// Abstracts erase to their underlying type; their implementation class
/// arrives as a separate class declaration.
pub fn emit_abstract(_decl: &AbstractDecl) -> Result<String, EmitError> {
    Ok(String::new())
}

#[cfg(test)]
mod tests;
