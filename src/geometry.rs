//! Rectangle math for moving windows between displays
//!
//! Everything here is pure: no X11 access, no logging. The transform maps a
//! window's rectangle from one display to another so that its fractional
//! position and fractional size on the display stay the same.

use serde::{Deserialize, Serialize};

use crate::error::RelocateError;

/// Axis-aligned rectangle in virtual-desktop (root window) coordinates
/// Invariant: `right >= left` and `bottom >= top`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    /// Build from edges, swapping inverted edges so the invariant holds
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left: left.min(right),
            top: top.min(bottom),
            right: left.max(right),
            bottom: top.max(bottom),
        }
    }

    pub fn from_origin_size(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            left: x,
            top: y,
            right: x.saturating_add_unsigned(width),
            bottom: y.saturating_add_unsigned(height),
        }
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    /// Half-open containment: the right and bottom edges belong to the neighbour
    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        x >= self.left && x < self.right && y >= self.top && y < self.bottom
    }

    /// Area of the intersection with `other` (0 when disjoint)
    pub fn overlap_area(&self, other: &Rect) -> i64 {
        let w = (self.right.min(other.right) as i64 - self.left.max(other.left) as i64).max(0);
        let h = (self.bottom.min(other.bottom) as i64 - self.top.max(other.top) as i64).max(0);
        w * h
    }

    /// Squared distance from a point to the closest point of this rectangle
    pub fn distance_squared_to(&self, x: i32, y: i32) -> i64 {
        let dx = if x < self.left {
            self.left as i64 - x as i64
        } else if x > self.right {
            x as i64 - self.right as i64
        } else {
            0
        };
        let dy = if y < self.top {
            self.top as i64 - y as i64
        } else if y > self.bottom {
            y as i64 - self.bottom as i64
        } else {
            0
        };
        dx * dx + dy * dy
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({}, {})-({}, {}) [{}x{}]",
            self.left,
            self.top,
            self.right,
            self.bottom,
            self.width(),
            self.height()
        )
    }
}

/// How scaled coordinates are brought back onto the integer pixel grid
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum RoundingMode {
    /// Toward zero
    #[default]
    Truncate,
    /// Half away from zero
    Nearest,
}

impl RoundingMode {
    fn apply(self, value: f64) -> i32 {
        match self {
            RoundingMode::Truncate => value.trunc() as i32,
            RoundingMode::Nearest => value.round() as i32,
        }
    }
}

/// Target over source extent along one axis, kept as the exact integer pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisScale {
    target: i32,
    source: i32,
}

impl AxisScale {
    /// `offset * target / source` rather than `offset * ratio`: integral
    /// results stay exact where a precomputed ratio would drift below them
    fn map(self, offset: i32, rounding: RoundingMode) -> i32 {
        rounding.apply(offset as f64 * self.target as f64 / self.source as f64)
    }

    /// Like `map`, but an offset inside the source extent lands inside the
    /// target extent (rounding up to `target` would put it on the neighbour)
    fn map_corner(self, offset: i32, rounding: RoundingMode) -> i32 {
        let mapped = self.map(offset, rounding);
        if (0..self.source).contains(&offset) && self.target > 0 {
            mapped.clamp(0, self.target - 1)
        } else {
            mapped
        }
    }
}

/// Per-axis ratio between a target and a source display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaleFactor {
    pub x: AxisScale,
    pub y: AxisScale,
}

impl ScaleFactor {
    /// Fails instead of producing an infinite or NaN ratio
    pub fn between(source: &Rect, target: &Rect) -> Result<Self, RelocateError> {
        if source.width() <= 0 || source.height() <= 0 {
            return Err(RelocateError::DegenerateDisplayBounds {
                bounds: *source,
                width: source.width(),
                height: source.height(),
            });
        }
        Ok(Self {
            x: AxisScale {
                target: target.width(),
                source: source.width(),
            },
            y: AxisScale {
                target: target.height(),
                source: source.height(),
            },
        })
    }
}

/// Map `rect` from `source` display space into `target` display space
///
/// Each edge is made local to the source display, scaled on its own axis and
/// moved into the target display. X and Y scale independently, so a window
/// covering the left half of a 16:9 display covers the left half of a 4:3 one.
/// A top-left corner that was on the source display stays on the target.
pub fn transform_rect(
    rect: &Rect,
    source: &Rect,
    target: &Rect,
    rounding: RoundingMode,
) -> Result<Rect, RelocateError> {
    let scale = ScaleFactor::between(source, target)?;

    Ok(Rect::new(
        scale.x.map_corner(rect.left - source.left, rounding) + target.left,
        scale.y.map_corner(rect.top - source.top, rounding) + target.top,
        scale.x.map(rect.right - source.left, rounding) + target.left,
        scale.y.map(rect.bottom - source.top, rounding) + target.top,
    ))
}
