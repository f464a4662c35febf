//! Source positions carried by typed-tree nodes for diagnostics.

/// Half-open byte range into the original source of the compilation unit.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Span {
    pub start: u32,
    pub length: u32,
}

impl Span {
    pub fn new(start: u32, length: u32) -> Self {
        Span { start, length }
    }

    /// Span for nodes synthesized by a backend pass. Synthesized nodes
    /// never surface in diagnostics on their own; they inherit the
    /// position of the construct that produced them where it matters.
    pub fn synthesized() -> Self {
        Span::default()
    }

    pub fn end(&self) -> u32 {
        self.start + self.length
    }
}
