// Canonical rectangle math for the spatial engine.
// Everything here is a pure value operation: malformed input is normalized,
// never rejected, so a drag can always produce something renderable.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    pub const BOTH: [Axis; 2] = [Axis::X, Axis::Y];

    pub fn cross(self) -> Self {
        match self {
            Axis::X => Axis::Y,
            Axis::Y => Axis::X,
        }
    }

    /// Guides that mark an X coordinate are drawn as vertical lines.
    pub fn orientation(self) -> Orientation {
        match self {
            Axis::X => Orientation::Vertical,
            Axis::Y => Orientation::Horizontal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Vertical,
    Horizontal,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x: finite_or_zero(x),
            y: finite_or_zero(y),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// One-dimensional overlap extents of two rects; zero on an axis where they
/// are disjoint.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Overlap {
    pub dx: f64,
    pub dy: f64,
}

impl Overlap {
    pub fn is_intersection(&self) -> bool {
        self.dx > 0.0 && self.dy > 0.0
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

fn size_or_zero(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left: finite_or_zero(left),
            top: finite_or_zero(top),
            width: size_or_zero(width),
            height: size_or_zero(height),
        }
    }

    /// Re-applies the constructor invariants to a rect built field by field
    /// (e.g. deserialized input).
    pub fn normalized(self) -> Self {
        Self::new(self.left, self.top, self.width, self.height)
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn center_x(&self) -> f64 {
        self.left + self.width / 2.0
    }

    pub fn center_y(&self) -> f64 {
        self.top + self.height / 2.0
    }

    pub fn start(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.left,
            Axis::Y => self.top,
        }
    }

    pub fn end(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.right(),
            Axis::Y => self.bottom(),
        }
    }

    pub fn center(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.center_x(),
            Axis::Y => self.center_y(),
        }
    }

    pub fn extent(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.width,
            Axis::Y => self.height,
        }
    }

    pub fn origin(&self) -> Point {
        Point {
            x: self.left,
            y: self.top,
        }
    }

    pub fn moved_to(&self, x: f64, y: f64) -> Self {
        Self::new(x, y, self.width, self.height)
    }

    /// Moves the rect so that its start on `axis` sits at `value`.
    pub fn with_start(&self, axis: Axis, value: f64) -> Self {
        match axis {
            Axis::X => self.moved_to(value, self.top),
            Axis::Y => self.moved_to(self.left, value),
        }
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.left + dx, self.top + dy, self.width, self.height)
    }

    pub fn inflate(&self, pad: f64) -> Self {
        if pad.is_nan() || pad <= 0.0 {
            return *self;
        }
        Self::new(
            self.left - pad,
            self.top - pad,
            self.width + pad * 2.0,
            self.height + pad * 2.0,
        )
    }

    pub fn union(&self, other: &Rect) -> Self {
        let left = self.left.min(other.left);
        let top = self.top.min(other.top);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Self::new(left, top, right - left, bottom - top)
    }

    pub fn contains_point(&self, point: Point) -> bool {
        point.x >= self.left
            && point.x <= self.right()
            && point.y >= self.top
            && point.y <= self.bottom()
    }

    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.left >= self.left
            && other.right() <= self.right()
            && other.top >= self.top
            && other.bottom() <= self.bottom()
    }
}

/// Open-interval overlap on both axes: rects that only share an edge do
/// not intersect.
pub fn intersects(a: &Rect, b: &Rect) -> bool {
    overlap(a, b).is_intersection()
}

pub fn overlap(a: &Rect, b: &Rect) -> Overlap {
    Overlap {
        dx: overlap_on(a, b, Axis::X),
        dy: overlap_on(a, b, Axis::Y),
    }
}

pub fn overlap_on(a: &Rect, b: &Rect, axis: Axis) -> f64 {
    let lo = a.start(axis).max(b.start(axis));
    let hi = a.end(axis).min(b.end(axis));
    (hi - lo).max(0.0)
}

pub fn overlap_area(a: &Rect, b: &Rect) -> f64 {
    let o = overlap(a, b);
    o.dx * o.dy
}

/// The three snap candidates of a rect on one axis: start, center, end.
pub fn edges_of(rect: &Rect, axis: Axis) -> [f64; 3] {
    [rect.start(axis), rect.center(axis), rect.end(axis)]
}

/// Signed distance between `a` and `b` on an axis; negative when their
/// projections overlap.
pub fn axis_gap(a: &Rect, b: &Rect, axis: Axis) -> f64 {
    if a.end(axis) <= b.start(axis) {
        b.start(axis) - a.end(axis)
    } else if b.end(axis) <= a.start(axis) {
        a.start(axis) - b.end(axis)
    } else {
        -overlap_on(a, b, axis)
    }
}

/// Distance from a point to the rect boundary, zero when the point is
/// inside.
pub fn distance_to_edge(rect: &Rect, point: Point) -> f64 {
    let dx = (rect.left - point.x).max(0.0).max(point.x - rect.right());
    let dy = (rect.top - point.y).max(0.0).max(point.y - rect.bottom());
    (dx * dx + dy * dy).sqrt()
}
