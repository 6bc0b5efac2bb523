//! Error types for a relocation pass
//!
//! Only `InvalidDisplayIndex` and `WindowSystem` stop a pass. The per-window
//! variants are recorded in the report and the pass moves on.

use serde::Serialize;
use thiserror::Error;

use crate::geometry::Rect;
use crate::window::WindowId;

#[derive(Error, Debug)]
pub enum RelocateError {
    /// Target display index does not address an attached display
    #[error("display index {index} is out of range ({count} display(s) attached)")]
    InvalidDisplayIndex { index: usize, count: usize },

    /// Source display has no area, so no scale factor exists
    #[error("display bounds {bounds} are degenerate ({width}x{height})")]
    DegenerateDisplayBounds { bounds: Rect, width: i32, height: i32 },

    /// Window manager rejected or lost the geometry update
    #[error("failed to reposition window {window}: {reason}")]
    RepositionFailed { window: WindowId, reason: String },

    /// Current window geometry could not be read
    #[error("failed to read geometry of window {window}: {reason}")]
    GeometryUnavailable { window: WindowId, reason: String },

    /// Display list or window snapshot could not be read at all
    #[error(transparent)]
    WindowSystem(#[from] anyhow::Error),
}

/// How far an error reaches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// Aborts the pass before any window is touched
    Fatal,
    /// A geometry precondition failed for one window
    Structural,
    /// The OS refused or lost one window
    Transient,
}

impl RelocateError {
    pub fn class(&self) -> ErrorClass {
        match self {
            RelocateError::InvalidDisplayIndex { .. } | RelocateError::WindowSystem(_) => ErrorClass::Fatal,
            RelocateError::DegenerateDisplayBounds { .. } => ErrorClass::Structural,
            RelocateError::RepositionFailed { .. } | RelocateError::GeometryUnavailable { .. } => {
                ErrorClass::Transient
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classes() {
        assert_eq!(RelocateError::InvalidDisplayIndex { index: 3, count: 2 }.class(), ErrorClass::Fatal);
        assert_eq!(
            RelocateError::WindowSystem(anyhow::anyhow!("no display")).class(),
            ErrorClass::Fatal
        );

        let degenerate = RelocateError::DegenerateDisplayBounds {
            bounds: Rect::new(0, 0, 0, 1080),
            width: 0,
            height: 1080,
        };
        assert_eq!(degenerate.class(), ErrorClass::Structural);

        let failed = RelocateError::RepositionFailed {
            window: WindowId(0x1a00003),
            reason: "BadWindow".to_string(),
        };
        assert_eq!(failed.class(), ErrorClass::Transient);
    }

    #[test]
    fn test_invalid_index_message() {
        let err = RelocateError::InvalidDisplayIndex { index: 5, count: 2 };
        assert_eq!(err.to_string(), "display index 5 is out of range (2 display(s) attached)");
    }
}
