//! Geometry primitives
//!
//! World coordinates are y-up: a rectangle's `top` is its larger y value.
//! Time is plain `f32` seconds throughout the engine.

use serde::{Deserialize, Serialize};

/// Default tolerance for fuzzy float comparisons
pub const DEFAULT_TOLERANCE: f32 = 4.0 * f32::EPSILON;

/// `a < b` with values closer than `tolerance` treated as equal
pub fn fuzzy_less(a: f32, b: f32, tolerance: f32) -> bool {
    a + tolerance < b
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn distance(self, other: Point) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

impl std::ops::Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle in y-up coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rectangle {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl Rectangle {
    pub const fn new(left: f32, right: f32, top: f32, bottom: f32) -> Self {
        Self { left, right, top, bottom }
    }

    /// Rectangle of `size` whose centre is `center`
    pub fn make_centered_on(center: Point, size: Size) -> Self {
        let hw = size.width / 2.0;
        let hh = size.height / 2.0;
        Self::new(center.x - hw, center.x + hw, center.y + hh, center.y - hh)
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.top - self.bottom
    }

    pub fn size(&self) -> Size {
        Size::new(self.width(), self.height())
    }

    pub fn center(&self) -> Point {
        Point::new((self.left + self.right) / 2.0, (self.top + self.bottom) / 2.0)
    }

    pub fn translated(&self, dx: f32, dy: f32) -> Self {
        Self::new(self.left + dx, self.right + dx, self.top + dy, self.bottom + dy)
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.left && p.x <= self.right && p.y >= self.bottom && p.y <= self.top
    }

    /// Strict overlap test. Touching edges (within tolerance) do not intersect.
    pub fn intersecting_with(&self, other: &Rectangle, tolerance: f32) -> bool {
        !(other.left + tolerance > self.right
            || self.left + tolerance > other.right
            || self.bottom + tolerance > other.top
            || other.bottom + tolerance > self.top)
    }

    pub fn intersecting(&self, other: &Rectangle) -> bool {
        self.intersecting_with(other, DEFAULT_TOLERANCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_rect_has_requested_size() {
        let r = Rectangle::make_centered_on(Point::new(10.0, 20.0), Size::new(4.0, 6.0));
        assert_eq!(r, Rectangle::new(8.0, 12.0, 23.0, 17.0));
        assert_eq!(r.center(), Point::new(10.0, 20.0));
        assert!((r.width() - 4.0).abs() < 0.001);
    }

    #[test]
    fn touching_edges_do_not_intersect() {
        let a = Rectangle::new(0.0, 10.0, 10.0, 0.0);
        let b = Rectangle::new(10.0, 20.0, 10.0, 0.0);
        let c = Rectangle::new(0.0, 10.0, 20.0, 10.0);
        assert!(!a.intersecting(&b));
        assert!(!a.intersecting(&c));
    }

    #[test]
    fn overlapping_rects_intersect_symmetrically() {
        let a = Rectangle::new(0.0, 10.0, 10.0, 0.0);
        let b = Rectangle::new(5.0, 15.0, 15.0, 5.0);
        assert!(a.intersecting(&b));
        assert!(b.intersecting(&a));
        let inner = Rectangle::new(2.0, 3.0, 3.0, 2.0);
        assert!(a.intersecting(&inner));
        assert!(inner.intersecting(&a));
    }

    #[test]
    fn fuzzy_less_treats_near_values_as_equal() {
        assert!(fuzzy_less(1.0, 2.0, DEFAULT_TOLERANCE));
        assert!(!fuzzy_less(1.0, 1.0, DEFAULT_TOLERANCE));
        assert!(!fuzzy_less(1.0, 1.0 + f32::EPSILON, DEFAULT_TOLERANCE));
        assert!(!fuzzy_less(1.0, 1.05, 0.1));
    }
}
