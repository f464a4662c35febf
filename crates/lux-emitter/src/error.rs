use lux_common::Span;
use thiserror::Error;

/// Fatal failures of a single declaration's emission run.
///
/// Either kind aborts the current declaration only; sibling declarations
/// in the same run are unaffected (see `Backend::emit_all`).
#[derive(Debug, Error)]
pub enum EmitError {
    /// A node tag with no defined rendering for this target reached the
    /// printer. Reported with the node's source position.
    #[error("unsupported construct: {construct} (at offset {})", .span.start)]
    UnsupportedConstruct {
        construct: &'static str,
        span: Span,
    },

    /// A stated invariant of a pass was violated. This is a bug in the
    /// pass, not in user input.
    #[error("internal invariant violated: {0}")]
    Internal(String),
}

impl EmitError {
    pub fn unsupported(construct: &'static str, span: Span) -> Self {
        EmitError::UnsupportedConstruct { construct, span }
    }
}
