// Error types for pattern rendering

use std::fmt;

/// Conditions that abort a render
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// A pointer leads back to a target already being expanded
    CyclicReference { address: u64 },
    /// Nesting went past `RenderOptions::max_depth`
    DepthExceeded { limit: usize },
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::CyclicReference { address } => {
                write!(f, "cyclic pointer reference to {:#x}", address)
            }
            RenderError::DepthExceeded { limit } => {
                write!(f, "pattern nesting exceeds depth limit of {}", limit)
            }
        }
    }
}

impl std::error::Error for RenderError {}
