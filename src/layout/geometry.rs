//! Link geometry: parallel-token offsets, trimmed segments and mid-link arrowheads

use super::view::ViewTransform;
use super::Point;
use serde::Serialize;

/// Gap between a bubble's edge and the trimmed link end (px)
pub const ARROW_MARGIN: f64 = 5.0;
pub const ARROW_LENGTH: f64 = 10.0;
pub const ARROW_WIDTH: f64 = 6.0;
/// Link labels sit this far above the link midpoint (px)
pub const LABEL_LIFT: f64 = 5.0;

const OFFSET_RANGE: u32 = 20;

/// Perpendicular pixel offset for a token's link, in `[-10, 9]`
///
/// Derived only from the token string so no per-link state is stored.
pub fn token_offset(token: &str) -> i32 {
    let sum: u32 = token.encode_utf16().fold(0u32, |acc, unit| acc.wrapping_add(unit as u32));
    (sum % OFFSET_RANGE) as i32 - (OFFSET_RANGE / 2) as i32
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
}

impl Segment {
    pub fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    /// Length, or 1 for a zero-length segment so directions stay finite
    pub fn length(&self) -> f64 {
        let len = (self.end.x - self.start.x).hypot(self.end.y - self.start.y);
        if len == 0.0 {
            1.0
        } else {
            len
        }
    }

    pub fn unit(&self) -> Point {
        let len = self.length();
        Point::new((self.end.x - self.start.x) / len, (self.end.y - self.start.y) / len)
    }

    /// Left-hand unit normal `(-dy, dx) / L`
    pub fn unit_perp(&self) -> Point {
        let u = self.unit();
        Point::new(-u.y, u.x)
    }

    pub fn midpoint(&self) -> Point {
        Point::new((self.start.x + self.end.x) / 2.0, (self.start.y + self.end.y) / 2.0)
    }
}

/// Shift a segment sideways by `offset` px
pub fn offset_segment(p1: Point, p2: Point, offset: f64) -> Segment {
    let perp = Segment::new(p1, p2).unit_perp();
    Segment::new(
        Point::new(p1.x + offset * perp.x, p1.y + offset * perp.y),
        Point::new(p2.x + offset * perp.x, p2.y + offset * perp.y),
    )
}

/// Pull both ends in so they start and stop outside each bubble
pub fn shorten_segment(segment: Segment, r1: f64, r2: f64, margin: f64) -> Segment {
    let u = segment.unit();
    Segment::new(
        Point::new(segment.start.x + (r1 + margin) * u.x, segment.start.y + (r1 + margin) * u.y),
        Point::new(segment.end.x - (r2 + margin) * u.x, segment.end.y - (r2 + margin) * u.y),
    )
}

/// Triangle centred on a link midpoint, pointing from source to target
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ArrowHead {
    pub tip: Point,
    pub left: Point,
    pub right: Point,
}

impl ArrowHead {
    pub fn svg_path(&self) -> String {
        format!(
            "M{},{} L{},{} L{},{} Z",
            self.tip.x, self.tip.y, self.left.x, self.left.y, self.right.x, self.right.y
        )
    }
}

/// Arrowhead at the midpoint of the trimmed `p1 → p2` segment
pub fn arrow_head(p1: Point, p2: Point, r1: f64, r2: f64, margin: f64) -> ArrowHead {
    let full = Segment::new(p1, p2);
    let u = full.unit();
    let perp = full.unit_perp();
    let mid = shorten_segment(full, r1, r2, margin).midpoint();

    let half_len = ARROW_LENGTH / 2.0;
    let half_width = ARROW_WIDTH / 2.0;
    let base = Point::new(mid.x - half_len * u.x, mid.y - half_len * u.y);

    ArrowHead {
        tip: Point::new(mid.x + half_len * u.x, mid.y + half_len * u.y),
        left: Point::new(base.x + half_width * perp.x, base.y + half_width * perp.y),
        right: Point::new(base.x - half_width * perp.x, base.y - half_width * perp.y),
    }
}

/// Everything a renderer needs to draw one link
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkGeometry {
    /// Full offset line between the two bubble centres
    pub line: Segment,
    /// Offset line trimmed to the bubble edges
    pub trimmed: Segment,
    pub arrow: ArrowHead,
    /// Where the non-scaling link label goes
    pub label_anchor: Point,
}

impl LinkGeometry {
    /// Geometry in whatever space `p1`/`p2` are given in
    pub fn compute(p1: Point, p2: Point, r1: f64, r2: f64, token_offset: i32) -> Self {
        let line = offset_segment(p1, p2, token_offset as f64);
        let trimmed = shorten_segment(line, r1, r2, ARROW_MARGIN);
        let arrow = arrow_head(line.start, line.end, r1, r2, ARROW_MARGIN);
        let mid = trimmed.midpoint();

        Self {
            line,
            trimmed,
            arrow,
            label_anchor: Point::new(mid.x, mid.y - LABEL_LIFT),
        }
    }

    /// Screen-space geometry: positions go through the view, radii stay in px
    ///
    /// Must be recomputed on every zoom/pan tick.
    pub fn screen(view: &ViewTransform, p1: Point, p2: Point, r1: f64, r2: f64, token_offset: i32) -> Self {
        Self::compute(view.apply(p1), view.apply(p2), r1, r2, token_offset)
    }
}
