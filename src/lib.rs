use thiserror::Error;

/// Box geometry, overlap metrics and suppression routines
pub mod utils;

/// Random box generators used by the benchmarks and demos
pub mod examples;

/// Frequently used entry points
pub mod prelude;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Errors {
    #[error("Argument `{argument}` has wrong shape: expected {expected}, got {actual}.")]
    ShapeMismatch {
        argument: &'static str,
        expected: String,
        actual: String,
    },
    #[error("Argument `{argument}` row {row} has invalid extent {value}: extents must be finite and non-negative.")]
    InvalidExtent {
        argument: &'static str,
        row: usize,
        value: f32,
    },
}

#[cfg(test)]
pub(crate) const EPS: f32 = 0.00001;
