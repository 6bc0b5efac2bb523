//! Attached displays and the window -> display resolution

use serde::{Deserialize, Serialize};

use crate::error::RelocateError;
use crate::geometry::Rect;

/// One monitor, read fresh at the start of every pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Display {
    pub index: usize,
    pub name: String,
    pub primary: bool,
    pub bounds: Rect,
}

impl Display {
    pub fn new(index: usize, name: impl Into<String>, primary: bool, bounds: Rect) -> Self {
        Self {
            index,
            name: name.into(),
            primary,
            bounds,
        }
    }

    /// Same display, regardless of whether the bounds snapshot differs
    pub fn is_same(&self, other: &Display) -> bool {
        self.index == other.index && self.name == other.name
    }
}

/// Which display owns a window that spans several of them
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ContainmentPolicy {
    /// Display holding the window's top-left corner
    #[default]
    TopLeft,
    /// Display sharing the largest area with the window
    MaxOverlap,
}

/// Resolve a caller-supplied index against the enumeration order
pub fn select_display(displays: &[Display], index: usize) -> Result<&Display, RelocateError> {
    displays.get(index).ok_or(RelocateError::InvalidDisplayIndex {
        index,
        count: displays.len(),
    })
}

/// The single display a rectangle belongs to
///
/// Resolution is deterministic: the policy's choice first, then the display
/// with the largest overlap, then the display nearest to the top-left corner.
/// Ties always go to the display listed first. `None` only for an empty list.
pub fn display_containing<'a>(
    displays: &'a [Display],
    rect: &Rect,
    policy: ContainmentPolicy,
) -> Option<&'a Display> {
    if policy == ContainmentPolicy::TopLeft
        && let Some(display) = displays
            .iter()
            .find(|d| d.bounds.contains_point(rect.left, rect.top))
    {
        return Some(display);
    }

    best_by(displays, |d| d.bounds.overlap_area(rect))
        .filter(|d| d.bounds.overlap_area(rect) > 0)
        .or_else(|| best_by(displays, |d| -d.bounds.distance_squared_to(rect.left, rect.top)))
}

/// First display with the highest score (`Iterator::max_by_key` keeps the last)
fn best_by(displays: &[Display], score: impl Fn(&Display) -> i64) -> Option<&Display> {
    let mut best: Option<(&Display, i64)> = None;
    for display in displays {
        let s = score(display);
        if best.is_none_or(|(_, b)| s > b) {
            best = Some((display, s));
        }
    }
    best.map(|(d, _)| d)
}
