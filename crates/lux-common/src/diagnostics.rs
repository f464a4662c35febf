//! Diagnostic values accumulated by the backend passes.
//!
//! Fatal per-declaration failures are represented by the emitter's error
//! type; everything the user should see without the run being aborted
//! (nullability findings, in particular) flows through [`Diagnostic`].

use crate::span::Span;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DiagnosticCategory {
    Warning,
    Error,
    Suggestion,
    Message,
}

pub mod diagnostic_codes {
    //! Stable numeric codes, grouped by concern. 52xx is the null-safety
    //! family; 51xx is reserved for emission failures surfaced as
    //! diagnostics by drivers.

    pub const UNSUPPORTED_CONSTRUCT: u32 = 5100;
    pub const NULL_ASSIGNED_TO_NON_NULLABLE: u32 = 5201;
    pub const NULL_ARGUMENT_FOR_NON_NULLABLE: u32 = 5202;
    pub const NULL_RETURN_FOR_NON_NULLABLE: u32 = 5203;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticRelatedInformation {
    pub category: DiagnosticCategory,
    pub code: u32,
    pub file: String,
    pub start: u32,
    pub length: u32,
    pub message_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub category: DiagnosticCategory,
    pub code: u32,
    pub file: String,
    pub start: u32,
    pub length: u32,
    pub message_text: String,
    pub related_information: Vec<DiagnosticRelatedInformation>,
}

impl Diagnostic {
    pub fn error(
        file: impl Into<String>,
        span: Span,
        message: impl Into<String>,
        code: u32,
    ) -> Self {
        Self {
            category: DiagnosticCategory::Error,
            message_text: message.into(),
            code,
            file: file.into(),
            start: span.start,
            length: span.length,
            related_information: Vec::new(),
        }
    }

    pub fn warning(
        file: impl Into<String>,
        span: Span,
        message: impl Into<String>,
        code: u32,
    ) -> Self {
        Self {
            category: DiagnosticCategory::Warning,
            ..Self::error(file, span, message, code)
        }
    }

    pub fn with_related(
        mut self,
        file: impl Into<String>,
        span: Span,
        message: impl Into<String>,
    ) -> Self {
        self.related_information.push(DiagnosticRelatedInformation {
            category: DiagnosticCategory::Message,
            code: 0,
            file: file.into(),
            start: span.start,
            length: span.length,
            message_text: message.into(),
        });
        self
    }
}
