//! Seams between the relocation logic and the window system
//!
//! The X11 implementation lives in `x11_utils`; tests use an in-memory desktop.

use anyhow::Result;

use crate::display::Display;
use crate::geometry::Rect;
use crate::window::{WindowId, WindowInfo};

/// Source of the attached displays
pub trait DisplayRegistry {
    /// Displays in platform enumeration order, read fresh on every call
    fn list_displays(&self) -> Result<Vec<Display>>;
}

/// Read and write access to top-level windows
pub trait WindowSystem {
    /// Materialized snapshot of visible windows with a non-blank title
    fn enumerate_eligible_windows(&self) -> Result<Vec<WindowInfo>>;

    /// Current outer rectangle in virtual-desktop coordinates
    fn window_rect(&self, window: WindowId) -> Result<Rect>;

    /// Move and resize in one request
    ///
    /// Implementations must leave the stacking order alone and must not
    /// activate or focus the window.
    fn apply_bounds(&self, window: WindowId, rect: Rect) -> Result<()>;
}
