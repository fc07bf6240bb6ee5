//! Fixed-position layout, link geometry and the view transform
//!
//! Nothing here depends on aggregation: positions are keyed by the address
//! universe, and geometry helpers take plain points and radii.

pub mod geometry;
pub mod labels;
pub mod positions;
pub mod view;

use serde::{Deserialize, Serialize};

pub use geometry::{arrow_head, offset_segment, token_offset, ArrowHead, LinkGeometry, Segment};
pub use labels::NodeLabel;
pub use positions::{LayoutManager, Position};
pub use view::ViewTransform;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Drawing surface the layout is centred on
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Canvas {
    pub width: f64,
    pub height: f64,
}

impl Canvas {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    /// Default layout radius: a third of the shorter side
    pub fn default_radius(&self) -> f64 {
        self.width.min(self.height) / 3.0
    }
}
