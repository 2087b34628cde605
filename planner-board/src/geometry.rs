//! Pointer geometry independent of any rendering framework.

use serde::{Deserialize, Serialize};

/// Default travel, in pixels, before a press becomes a drag
pub const DEFAULT_ACTIVATION_DISTANCE: f64 = 5.0;

/// A pointer position in surface coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance_to(&self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

/// Bounding box of a rendered element
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Vertical midpoint
    pub fn mid_y(&self) -> f64 {
        self.top + self.height / 2.0
    }
}

/// Whether a card dropped at `pointer` lands after the hovered element.
///
/// Strictly past the vertical midpoint means after. Exactly on the midpoint
/// means before, so a pointer resting on the boundary cannot flip sides
/// between frames.
pub fn insert_after(pointer: Point, hovered: &Rect) -> bool {
    pointer.y > hovered.mid_y()
}

/// Whether travel from `origin` to `current` activates a drag
pub fn exceeds_activation_distance(origin: Point, current: Point, threshold: f64) -> bool {
    origin.distance_to(current) > threshold
}
