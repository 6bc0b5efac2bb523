//! One relocation pass: move every eligible window onto a target display
//!
//! The pass works on a snapshot. Displays and windows are read once at the
//! start; each window is then handled exactly once and a failure on one window
//! never stops the others.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::backend::{DisplayRegistry, WindowSystem};
use crate::display::{display_containing, select_display, ContainmentPolicy, Display};
use crate::error::{ErrorClass, RelocateError};
use crate::geometry::{transform_rect, RoundingMode};
use crate::window::{WindowId, WindowInfo};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelocateOptions {
    pub rounding: RoundingMode,
    pub containment: ContainmentPolicy,
}

/// Why one window was not moved
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub window: WindowId,
    pub title: String,
    pub kind: ErrorClass,
    pub message: String,
}

impl Diagnostic {
    fn new(window: &WindowInfo, error: &RelocateError) -> Self {
        Self {
            window: window.id,
            title: window.title.clone(),
            kind: error.class(),
            message: error.to_string(),
        }
    }
}

/// Outcome of a pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RelocationReport {
    pub target: String,
    pub moved: usize,
    pub skipped: usize,
    pub failed: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl RelocationReport {
    pub fn total(&self) -> usize {
        self.moved + self.skipped + self.failed
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

enum Outcome {
    Moved,
    Skipped,
    /// Skipped, but the reason is worth reporting
    SkippedWith(RelocateError),
    Failed(RelocateError),
}

/// Move all eligible windows to the display at `target_index`
///
/// Fails before touching any window when the index does not address an
/// attached display or the window system cannot be queried.
pub fn relocate_all_windows(
    registry: &impl DisplayRegistry,
    windows: &impl WindowSystem,
    target_index: usize,
    options: &RelocateOptions,
) -> Result<RelocationReport, RelocateError> {
    let displays = registry.list_displays()?;
    let target = select_display(&displays, target_index)?;
    relocate_to(&displays, target, windows, options)
}

/// Same as [`relocate_all_windows`] with the display list already read
pub fn relocate_to(
    displays: &[Display],
    target: &Display,
    windows: &impl WindowSystem,
    options: &RelocateOptions,
) -> Result<RelocationReport, RelocateError> {
    info!(
        display = %target.name,
        index = target.index,
        bounds = %target.bounds,
        "Moving all windows to display"
    );

    let snapshot = windows.enumerate_eligible_windows()?;
    debug!(count = snapshot.len(), "Captured window snapshot");

    let mut report = RelocationReport {
        target: target.name.clone(),
        ..Default::default()
    };

    for window in &snapshot {
        match relocate_one(displays, target, windows, window, options) {
            Outcome::Moved => report.moved += 1,
            Outcome::Skipped => report.skipped += 1,
            Outcome::SkippedWith(error) => {
                debug!(window = %window.id, title = %window.title, error = %error, "Skipped window");
                report.skipped += 1;
                report.diagnostics.push(Diagnostic::new(window, &error));
            }
            Outcome::Failed(error) => {
                warn!(window = %window.id, title = %window.title, error = %error, "Failed to relocate window");
                report.failed += 1;
                report.diagnostics.push(Diagnostic::new(window, &error));
            }
        }
    }

    info!(
        moved = report.moved,
        skipped = report.skipped,
        failed = report.failed,
        "Relocation pass finished"
    );
    Ok(report)
}

fn relocate_one(
    displays: &[Display],
    target: &Display,
    windows: &impl WindowSystem,
    window: &WindowInfo,
    options: &RelocateOptions,
) -> Outcome {
    let current = match windows.window_rect(window.id) {
        Ok(rect) => rect,
        Err(e) => {
            return Outcome::SkippedWith(RelocateError::GeometryUnavailable {
                window: window.id,
                reason: format!("{e:#}"),
            });
        }
    };

    let Some(source) = display_containing(displays, &current, options.containment) else {
        return Outcome::Skipped;
    };

    if source.is_same(target) {
        debug!(window = %window.id, display = %source.name, "Window already on target display");
        return Outcome::Skipped;
    }

    let moved = match transform_rect(&current, &source.bounds, &target.bounds, options.rounding) {
        Ok(rect) => rect,
        Err(e) => return Outcome::Failed(e),
    };

    if moved == current {
        return Outcome::Skipped;
    }

    if let Err(e) = windows.apply_bounds(window.id, moved) {
        return Outcome::Failed(RelocateError::RepositionFailed {
            window: window.id,
            reason: format!("{e:#}"),
        });
    }

    info!(
        window = %window.id,
        title = %window.title,
        from = %source.name,
        before = %current,
        after = %moved,
        "Moved window"
    );
    Outcome::Moved
}
