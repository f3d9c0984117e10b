//! Geometric primitives for calendar bar positioning.
//!
//! # Overview
//!
//! - [`Point`] - A 2D coordinate on a month page
//! - [`Size`] - Width and height dimensions
//! - [`Bounds`] - A rectangle defined by minimum and maximum coordinates
//! - [`Insets`] - Padding values for four sides
//!
//! # Coordinate System
//!
//! Every month page has its own coordinate space:
//!
//! ```text
//!   (0,0) ────────► +X  (day columns)
//!     │
//!     │
//!     ▼
//!    +Y  (tracks)
//! ```
//!
//! - **Origin**: Top-left corner of the page at `(0, 0)`
//! - **X-axis**: Increases rightward, one day column after another
//! - **Y-axis**: Increases downward, one track after another

use serde::{Deserialize, Serialize};

/// Rounds `value` to the nearest multiple of `resolution`.
///
/// A non-positive resolution leaves the value unchanged.
///
/// ```
/// # use almanac_core::geometry::snap;
/// assert_eq!(snap(12.4, 5.0), 10.0);
/// assert_eq!(snap(12.6, 5.0), 15.0);
/// assert_eq!(snap(12.6, 0.0), 12.6);
/// ```
pub fn snap(value: f32, resolution: f32) -> f32 {
    if resolution <= 0.0 {
        return value;
    }
    (value / resolution).round() * resolution
}

/// A 2D point on a month page.
///
/// # Examples
///
/// ```
/// # use almanac_core::geometry::Point;
/// let corner = Point::new(41.2, 29.7).snapped(2.0);
/// assert_eq!(corner.x(), 42.0);
/// assert_eq!(corner.y(), 30.0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    x: f32,
    y: f32,
}

impl Point {
    /// Creates a new point with the given coordinates
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Returns the x-coordinate
    pub fn x(self) -> f32 {
        self.x
    }

    /// Returns the y-coordinate
    pub fn y(self) -> f32 {
        self.y
    }

    /// Rounds both coordinates to the grid `resolution`.
    pub fn snapped(self, resolution: f32) -> Self {
        Self {
            x: snap(self.x, resolution),
            y: snap(self.y, resolution),
        }
    }

    /// Creates bounds with this point as the top-left corner
    pub fn to_bounds(self, size: Size) -> Bounds {
        Bounds::new_from_top_left(self, size)
    }
}

/// Width and height of an element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    width: f32,
    height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Returns the width
    pub fn width(self) -> f32 {
        self.width
    }

    /// Returns the height
    pub fn height(self) -> f32 {
        self.height
    }

    /// Rounds both dimensions to the grid `resolution`, never below one step.
    pub fn snapped(self, resolution: f32) -> Self {
        if resolution <= 0.0 {
            return self;
        }
        Self {
            width: snap(self.width, resolution).max(resolution),
            height: snap(self.height, resolution).max(resolution),
        }
    }
}

/// An axis-aligned rectangle.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    min_x: f32,
    min_y: f32,
    max_x: f32,
    max_y: f32,
}

impl Bounds {
    /// Creates bounds from the top-left corner and a size
    pub fn new_from_top_left(top_left: Point, size: Size) -> Self {
        Self {
            min_x: top_left.x,
            min_y: top_left.y,
            max_x: top_left.x + size.width,
            max_y: top_left.y + size.height,
        }
    }

    /// Returns the minimum x-coordinate (left edge)
    pub fn min_x(self) -> f32 {
        self.min_x
    }

    /// Returns the minimum y-coordinate (top edge)
    pub fn min_y(self) -> f32 {
        self.min_y
    }

    /// Returns the maximum x-coordinate (right edge)
    pub fn max_x(self) -> f32 {
        self.max_x
    }

    /// Returns the maximum y-coordinate (bottom edge)
    pub fn max_y(self) -> f32 {
        self.max_y
    }

    pub fn width(self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(self) -> f32 {
        self.max_y - self.min_y
    }

    /// Returns the top-left corner
    pub fn min_point(self) -> Point {
        Point::new(self.min_x, self.min_y)
    }

    /// Moves the bounds vertically so the top edge sits at `min_y`.
    pub fn with_min_y(self, min_y: f32) -> Self {
        let height = self.height();
        Self {
            min_y,
            max_y: min_y + height,
            ..self
        }
    }

    /// Returns true if the rectangles overlap by more than `epsilon` on both axes.
    ///
    /// Rectangles that merely touch along an edge do not intersect.
    pub fn intersects(&self, other: &Self, epsilon: f32) -> bool {
        self.min_x < other.max_x - epsilon
            && other.min_x < self.max_x - epsilon
            && self.min_y < other.max_y - epsilon
            && other.min_y < self.max_y - epsilon
    }
}

/// Padding values for four sides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Insets {
    top: f32,
    right: f32,
    bottom: f32,
    left: f32,
}

impl Insets {
    /// Creates insets with the given values for each side, in CSS order.
    pub fn new(top: f32, right: f32, bottom: f32, left: f32) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    /// Creates insets with the same value on every side
    pub fn uniform(value: f32) -> Self {
        Self::new(value, value, value, value)
    }

    /// Returns the top inset value
    pub fn top(self) -> f32 {
        self.top
    }

    /// Returns the right inset value
    pub fn right(self) -> f32 {
        self.right
    }

    /// Returns the bottom inset value
    pub fn bottom(self) -> f32 {
        self.bottom
    }

    /// Returns the left inset value
    pub fn left(self) -> f32 {
        self.left
    }

    /// Returns the sum of top and bottom insets
    pub fn vertical_sum(self) -> f32 {
        self.top + self.bottom
    }

    /// Returns true if any side is negative or not finite
    pub fn is_invalid(self) -> bool {
        [self.top, self.right, self.bottom, self.left]
            .iter()
            .any(|v| !v.is_finite() || *v < 0.0)
    }
}
