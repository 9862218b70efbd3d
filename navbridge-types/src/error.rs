//! Error type used by the crate.

use thiserror::Error;

/// Error enum.
#[derive(Debug, Error, PartialEq)]
pub enum NavbridgeTypesError {
    /// Bounds whose south-west corner lies north of the north-east corner.
    #[error("invalid bounds: southwest latitude {south} is greater than northeast latitude {north}")]
    InvertedBounds {
        /// Latitude of the south-west corner.
        south: f64,
        /// Latitude of the north-east corner.
        north: f64,
    },
    /// Image pixel ratio must be a positive finite number.
    #[error("invalid image pixel ratio: {0}")]
    InvalidPixelRatio(f64),
}
