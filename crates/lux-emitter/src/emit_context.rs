//! Per-run emission state.
//!
//! One context is created for each declaration (or standalone
//! expression) emission run and passed through the printer. Nothing in
//! here is process-global: reentrant and per-declaration-parallel
//! compilation stay correct because every run owns its own instance.

/// State the printer consults while rendering one declaration.
///
/// Type qualification needs no tracking here: every type reference
/// arrives as a fully resolved path, so only the inheritance state
/// remains per-run.
#[derive(Clone, Debug, Default)]
pub struct EmitContext {
    /// Flattened name of the current superclass. `super(...)` calls
    /// render against this; `None` outside a class with a parent.
    pub current_super: Option<String>,
    /// True while emitting constructor code. Gates `super(...)` calls.
    pub in_constructor: bool,
}

impl EmitContext {
    pub fn new() -> Self {
        EmitContext::default()
    }
}
