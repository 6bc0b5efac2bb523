//! Window handles and the snapshot filter

use serde::Serialize;

/// X11 window id of a top-level client
/// Only meaningful during the pass that produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct WindowId(pub u32);

impl std::fmt::Display for WindowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

/// Snapshot entry for one eligible window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowInfo {
    pub id: WindowId,
    pub title: String,
}

impl WindowInfo {
    pub fn new(id: WindowId, title: impl Into<String>) -> Self {
        Self { id, title: title.into() }
    }
}

/// A window takes part in relocation when it is visible and has a real title
pub fn is_eligible(visible: bool, title: Option<&str>) -> bool {
    visible && title.is_some_and(|t| !t.trim().is_empty())
}
