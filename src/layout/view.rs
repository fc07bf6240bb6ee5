//! Pan/zoom view transform and the non-scaling label layer
//!
//! The transform is owned by the interaction layer and never written into
//! node positions. Labels are placed by applying it by hand to the fixed
//! geometry, so their text never scales.

use super::Point;
use serde::{Deserialize, Serialize};

pub const MIN_SCALE: f64 = 0.5;
pub const MAX_SCALE: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewTransform {
    pub translate_x: f64,
    pub translate_y: f64,
    pub scale: f64,
}

impl ViewTransform {
    /// Build a transform; `scale` is clamped to the zoom extent
    pub fn new(translate_x: f64, translate_y: f64, scale: f64) -> Self {
        Self {
            translate_x,
            translate_y,
            scale: scale.clamp(MIN_SCALE, MAX_SCALE),
        }
    }

    pub fn identity() -> Self {
        Self::new(0.0, 0.0, 1.0)
    }

    /// Canvas space to screen space
    pub fn apply(&self, p: Point) -> Point {
        Point::new(self.translate_x + self.scale * p.x, self.translate_y + self.scale * p.y)
    }

    /// Screen space back to canvas space
    pub fn invert(&self, p: Point) -> Point {
        Point::new((p.x - self.translate_x) / self.scale, (p.y - self.translate_y) / self.scale)
    }

    pub fn pan_by(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.translate_x + dx, self.translate_y + dy, self.scale)
    }

    /// Zoom by `factor` keeping the screen point `focus` fixed
    pub fn zoom_at(&self, factor: f64, focus: Point) -> Self {
        let scale = (self.scale * factor).clamp(MIN_SCALE, MAX_SCALE);
        let anchor = self.invert(focus);
        Self::new(focus.x - scale * anchor.x, focus.y - scale * anchor.y, scale)
    }
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Screen anchor of a node label
pub fn node_label_anchor(view: &ViewTransform, position: Point) -> Point {
    view.apply(position)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_and_invert() {
        let view = ViewTransform::new(15.0, -5.0, 2.0);
        let p = Point::new(100.0, 40.0);

        assert_eq!(view.apply(p), Point::new(215.0, 75.0));
        assert_eq!(view.invert(view.apply(p)), p);
        assert_eq!(node_label_anchor(&ViewTransform::identity(), p), p);
    }

    #[test]
    fn test_scale_is_clamped() {
        assert_eq!(ViewTransform::new(0.0, 0.0, 50.0).scale, MAX_SCALE);
        assert_eq!(ViewTransform::new(0.0, 0.0, 0.1).scale, MIN_SCALE);
        assert_eq!(ViewTransform::identity().zoom_at(100.0, Point::new(0.0, 0.0)).scale, MAX_SCALE);
    }

    #[test]
    fn test_zoom_keeps_focus_fixed() {
        let view = ViewTransform::new(30.0, 10.0, 1.5);
        let focus = Point::new(200.0, 120.0);
        let under_focus = view.invert(focus);

        let zoomed = view.zoom_at(2.0, focus);
        assert_eq!(zoomed.scale, 3.0);
        let moved = zoomed.apply(under_focus);
        assert!((moved.x - focus.x).abs() < 1e-9 && (moved.y - focus.y).abs() < 1e-9);

        let panned = zoomed.pan_by(5.0, -5.0);
        assert_eq!(panned.translate_x, zoomed.translate_x + 5.0);
        assert_eq!(panned.scale, zoomed.scale);
    }
}
