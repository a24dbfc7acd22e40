use core::fmt;

use crate::measure::MeasureError;

/// Layout pipeline error.
///
/// A "no acceptable size" condition is deliberately absent: the fit
/// search falls back to the floor-size solution instead of failing, so
/// the pipeline is total for any valid, non-empty input.
#[derive(Clone, Debug, PartialEq)]
pub enum LayoutError {
    /// Malformed call arguments (non-positive dimensions or font sizes).
    InvalidInput(&'static str),
    /// Tokenization produced nothing renderable.
    EmptyContent,
    /// Glyph measurement failed; aborts the current fit or sequence.
    Measurement(MeasureError),
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput(what) => write!(f, "invalid input: {}", what),
            Self::EmptyContent => write!(f, "no renderable content after tokenization"),
            Self::Measurement(err) => write!(f, "glyph measurement failed: {}", err),
        }
    }
}

impl std::error::Error for LayoutError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Measurement(err) => Some(err),
            _ => None,
        }
    }
}

impl From<MeasureError> for LayoutError {
    fn from(value: MeasureError) -> Self {
        Self::Measurement(value)
    }
}
