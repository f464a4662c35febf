//! Common types shared across the lux backend crates.

pub mod diagnostics;
pub mod span;

pub use diagnostics::{Diagnostic, DiagnosticCategory};
pub use span::Span;
