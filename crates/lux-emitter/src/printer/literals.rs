use super::Printer;
use lux_ast::{ObjectField, TypedNode};

use crate::error::EmitError;

impl Printer {
    // =========================================================================
    // Literals
    // =========================================================================

    /// Escape and quote a string per the target's lexical rules.
    pub(super) fn emit_string_literal(&mut self, s: &str) {
        self.write("\"");
        let bytes = s.as_bytes();
        // Fast path: nothing to escape.
        if memchr::memchr3(b'"', b'\\', b'\n', bytes).is_none()
            && !bytes.iter().any(|b| *b < 0x20)
        {
            self.write(s);
        } else {
            let mut escaped = String::with_capacity(s.len() + 2);
            for ch in s.chars() {
                match ch {
                    '"' => escaped.push_str("\\\""),
                    '\\' => escaped.push_str("\\\\"),
                    '\n' => escaped.push_str("\\n"),
                    '\r' => escaped.push_str("\\r"),
                    '\t' => escaped.push_str("\\t"),
                    c if (c as u32) < 0x20 => escaped.push_str(&format!("\\{}", c as u32)),
                    c => escaped.push(c),
                }
            }
            self.write(&escaped);
        }
        self.write("\"");
    }

    /// Array literals lower to a type-tagged composite: a 0-based backing
    /// table plus an explicit length, so the runtime's generic container
    /// operations can dispatch on the marker.
    pub(super) fn emit_array_literal(&mut self, items: &[TypedNode]) -> Result<(), EmitError> {
        self.write("_lux_tab_array({");
        for (i, item) in items.iter().enumerate() {
            if i == 0 {
                self.write("[0] = ");
            } else {
                self.write(", ");
            }
            self.emit_expr(item)?;
        }
        self.write("}, ");
        self.write(&items.len().to_string());
        self.write(")");
        Ok(())
    }

    /// Object literals lower to an ordered key/value composite; the
    /// declaration order of the fields is preserved in the call.
    pub(super) fn emit_object_literal(&mut self, fields: &[ObjectField]) -> Result<(), EmitError> {
        self.write("_lux_obj(");
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            self.emit_string_literal(&field.name);
            self.write(", ");
            self.emit_expr(&field.value)?;
        }
        self.write(")");
        Ok(())
    }
}

pub(super) fn format_float(v: f64) -> String {
    format!("{v}")
}
