//! Configuration errors.
//!
//! Everything here is reported synchronously at the offending call and is
//! fatal to that call only; the grid or track stays usable afterwards.
//! Degenerate geometry (out-of-range placements, zero space) is never an
//! error, it is resolved by the coercion and clamping policies in the solver
//! and orchestrator.

use std::fmt;

/// A rejected layout configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LayoutError {
    /// A fixed track length was negative or non-finite.
    InvalidLength { value: f64 },
    /// A star weight was negative or non-finite.
    InvalidWeight { value: f64 },
    /// A min/max clamp pair was inverted or negative.
    InvalidClamp { min: f64, max: f64 },
    /// A row or column index was negative.
    NegativeIndex { value: i32 },
    /// A row or column span was less than one.
    InvalidSpan { value: i32 },
    /// A track definition list was replaced after the grid first measured.
    DefinitionsBound,
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidLength { value } => {
                write!(f, "fixed track length must be finite and >= 0, got {value}")
            }
            Self::InvalidWeight { value } => {
                write!(f, "star weight must be finite and >= 0, got {value}")
            }
            Self::InvalidClamp { min, max } => {
                write!(f, "track clamp requires 0 <= min <= max, got min {min} max {max}")
            }
            Self::NegativeIndex { value } => {
                write!(f, "row/column index must be >= 0, got {value}")
            }
            Self::InvalidSpan { value } => {
                write!(f, "row/column span must be >= 1, got {value}")
            }
            Self::DefinitionsBound => {
                write!(f, "track definitions are bound once per grid and cannot be replaced")
            }
        }
    }
}

impl std::error::Error for LayoutError {}
