use serde::{Deserialize, Serialize};

/// A 2D coordinate in either model or view space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: Point) -> f64 {
        ((other.x - self.x).powi(2) + (other.y - self.y).powi(2)).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Same point with both coordinates rounded to one decimal place.
    pub fn round_tenth(self) -> Self {
        Self::new(round_tenth(self.x), round_tenth(self.y))
    }
}

/// Axis-aligned box. `width`/`height` are expected to be non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rectangle {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rectangle {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Zero-sized rectangle located at `point`.
    pub const fn from_point(point: Point) -> Self {
        Self::new(point.x, point.y, 0.0, 0.0)
    }

    pub fn center_x(&self) -> f64 {
        self.x + self.width / 2.0
    }

    pub fn center_y(&self) -> f64 {
        self.y + self.height / 2.0
    }

    pub fn center(&self) -> Point {
        Point::new(self.center_x(), self.center_y())
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Inclusive containment: points on the outline count as inside.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.x <= x && self.right() >= x && self.y <= y && self.bottom() >= y
    }

    /// Strict containment: points on the outline are outside.
    pub fn contains_strictly(&self, x: f64, y: f64) -> bool {
        self.x < x && self.right() > x && self.y < y && self.bottom() > y
    }

    /// Grows the box by `amount` on every side.
    pub fn grow(&self, amount: f64) -> Self {
        Self::new(
            self.x - amount,
            self.y - amount,
            self.width + 2.0 * amount,
            self.height + 2.0 * amount,
        )
    }

    /// Smallest box enclosing both `self` and `other`.
    pub fn union(&self, other: &Rectangle) -> Self {
        let min_x = self.x.min(other.x);
        let min_y = self.y.min(other.y);
        let max_x = self.right().max(other.right());
        let max_y = self.bottom().max(other.bottom());
        Self::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }

    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.x, self.y),
            Point::new(self.right(), self.y),
            Point::new(self.right(), self.bottom()),
            Point::new(self.x, self.bottom()),
        ]
    }

    pub fn scaled(&self, scale: f64) -> Self {
        Self::new(
            self.x * scale,
            self.y * scale,
            self.width * scale,
            self.height * scale,
        )
    }
}

/// Rounds half-up to one decimal place. Routed waypoints go through this
/// so repeated revalidation produces byte-identical paths.
pub fn round_tenth(value: f64) -> f64 {
    (value * 10.0 + 0.5).floor() / 10.0
}

/// Rounds to the nearest integer, halves towards positive infinity.
pub fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Intersection of the segments `p0-p1` and `p2-p3`, if they cross.
pub fn intersection(p0: Point, p1: Point, p2: Point, p3: Point) -> Option<Point> {
    let denom = (p3.y - p2.y) * (p1.x - p0.x) - (p3.x - p2.x) * (p1.y - p0.y);
    let nume_a = (p3.x - p2.x) * (p0.y - p2.y) - (p3.y - p2.y) * (p0.x - p2.x);
    let nume_b = (p1.x - p0.x) * (p0.y - p2.y) - (p1.y - p0.y) * (p0.x - p2.x);
    let ua = nume_a / denom;
    let ub = nume_b / denom;
    if (0.0..=1.0).contains(&ua) && (0.0..=1.0).contains(&ub) {
        Some(Point::new(
            p0.x + ua * (p1.x - p0.x),
            p0.y + ua * (p1.y - p0.y),
        ))
    } else {
        None
    }
}

/// Nearest crossing of the ray `origin + t * dir` (t >= 0) with a closed polygon.
pub fn ray_polygon_intersection(origin: Point, dir: Point, poly: &[Point]) -> Option<Point> {
    if poly.len() < 2 {
        return None;
    }
    let mut best_t: Option<f64> = None;
    for i in 0..poly.len() {
        let a = poly[i];
        let b = poly[(i + 1) % poly.len()];
        let sx = b.x - a.x;
        let sy = b.y - a.y;
        let qx = a.x - origin.x;
        let qy = a.y - origin.y;
        let denom = dir.x * sy - dir.y * sx;
        if denom.abs() < 1e-12 {
            continue;
        }
        let t = (qx * sy - qy * sx) / denom;
        let u = (qx * dir.y - qy * dir.x) / denom;
        if t >= 0.0 && (0.0..=1.0).contains(&u) {
            match best_t {
                Some(best) if t >= best => {}
                _ => best_t = Some(t),
            }
        }
    }
    best_t.map(|t| Point::new(origin.x + dir.x * t, origin.y + dir.y * t))
}

pub fn rotated_point(pt: Point, cos: f64, sin: f64, center: Point) -> Point {
    let x = pt.x - center.x;
    let y = pt.y - center.y;
    Point::new(x * cos - y * sin + center.x, y * cos + x * sin + center.y)
}

/// Bounding box of `rect` rotated by `degrees` around its center.
pub fn rotated_bounds(rect: &Rectangle, degrees: f64) -> Rectangle {
    if degrees == 0.0 {
        return *rect;
    }
    let rad = degrees.to_radians();
    let (sin, cos) = rad.sin_cos();
    let center = rect.center();
    let mut corners = rect
        .corners()
        .into_iter()
        .map(|pt| rotated_point(pt, cos, sin, center));
    let mut bounds = match corners.next() {
        Some(first) => Rectangle::from_point(first),
        None => return *rect,
    };
    for pt in corners {
        bounds = bounds.union(&Rectangle::from_point(pt));
    }
    bounds
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_tenth_rounds_half_up() {
        assert_eq!(round_tenth(1.25), 1.3);
        assert_eq!(round_tenth(-2.25), -2.2);
        assert_eq!(round_tenth(3.04), 3.0);
    }

    #[test]
    fn round_half_up_prefers_positive_infinity() {
        assert_eq!(round_half_up(2.5), 3.0);
        assert_eq!(round_half_up(-2.5), -2.0);
    }

    #[test]
    fn segments_cross_at_center() {
        let hit = intersection(
            Point::new(0.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
            Point::new(10.0, 0.0),
        );
        assert_eq!(hit, Some(Point::new(5.0, 5.0)));
    }

    #[test]
    fn parallel_segments_do_not_cross() {
        let hit = intersection(
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(0.0, 5.0),
            Point::new(10.0, 5.0),
        );
        assert_eq!(hit, None);
    }

    #[test]
    fn containment_includes_outline() {
        let rect = Rectangle::new(0.0, 0.0, 10.0, 10.0);
        assert!(rect.contains(10.0, 0.0));
        assert!(!rect.contains_strictly(10.0, 5.0));
        assert!(rect.contains_strictly(5.0, 5.0));
    }

    #[test]
    fn quarter_turn_swaps_extent() {
        let rect = Rectangle::new(0.0, 0.0, 40.0, 20.0);
        let rotated = rotated_bounds(&rect, 90.0);
        assert!((rotated.width - 20.0).abs() < 1e-9);
        assert!((rotated.height - 40.0).abs() < 1e-9);
        assert!((rotated.center_x() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn ray_hits_nearest_polygon_edge() {
        let square = Rectangle::new(-5.0, -5.0, 10.0, 10.0).corners();
        let hit = ray_polygon_intersection(Point::new(0.0, 0.0), Point::new(1.0, 0.0), &square);
        assert_eq!(hit, Some(Point::new(5.0, 0.0)));
    }
}
