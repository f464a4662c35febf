//! Nullability consistency checking.
//!
//! Two independent traversals over the original typed tree, both run
//! before normalization:
//!
//! - [`NullabilityChecker`] validates null flow (assignments, variable
//!   initializers, call arguments, returns) and reports diagnostics. It
//!   never rewrites anything.
//! - [`fold_null_comparisons`] folds equality comparisons whose result is
//!   statically known from declared nullability, producing a new tree.
//!   Running it twice is the same as running it once.

mod nullability;

pub use nullability::{NullabilityChecker, fold_null_comparisons};
