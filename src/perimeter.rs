//! Perimeter functions: where a connector touches a shape's visible outline.
//!
//! Every function takes the shape bounds, the vertex style (for `direction`),
//! the point the connector is heading towards and whether the connector is
//! orthogonal, and returns a point on the outline. Degenerate input never
//! fails; the shape center is returned instead.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Rectangle, intersection, ray_polygon_intersection};
use crate::style::{Direction, Style};

pub type PerimeterFn = fn(&Rectangle, Option<&Style>, Point, bool) -> Point;

/// Closed set of outline shapes, persisted by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PerimeterKind {
    #[serde(rename = "rectanglePerimeter")]
    Rectangle,
    #[serde(rename = "ellipsePerimeter")]
    Ellipse,
    #[serde(rename = "rhombusPerimeter")]
    Rhombus,
    #[serde(rename = "trianglePerimeter")]
    Triangle,
    #[serde(rename = "hexagonPerimeter")]
    Hexagon,
}

impl PerimeterKind {
    pub const ALL: [PerimeterKind; 5] = [
        PerimeterKind::Rectangle,
        PerimeterKind::Ellipse,
        PerimeterKind::Rhombus,
        PerimeterKind::Triangle,
        PerimeterKind::Hexagon,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "rectanglePerimeter" | "rectangle" => Some(Self::Rectangle),
            "ellipsePerimeter" | "ellipse" => Some(Self::Ellipse),
            "rhombusPerimeter" | "rhombus" => Some(Self::Rhombus),
            "trianglePerimeter" | "triangle" => Some(Self::Triangle),
            "hexagonPerimeter" | "hexagon" => Some(Self::Hexagon),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Rectangle => "rectanglePerimeter",
            Self::Ellipse => "ellipsePerimeter",
            Self::Rhombus => "rhombusPerimeter",
            Self::Triangle => "trianglePerimeter",
            Self::Hexagon => "hexagonPerimeter",
        }
    }

    pub fn function(self) -> PerimeterFn {
        match self {
            Self::Rectangle => rectangle_perimeter,
            Self::Ellipse => ellipse_perimeter,
            Self::Rhombus => rhombus_perimeter,
            Self::Triangle => triangle_perimeter,
            Self::Hexagon => hexagon_perimeter,
        }
    }

    pub fn apply(self, bounds: &Rectangle, style: Option<&Style>, next: Point, orthogonal: bool) -> Point {
        (self.function())(bounds, style, next, orthogonal)
    }
}

pub fn rectangle_perimeter(
    bounds: &Rectangle,
    _style: Option<&Style>,
    next: Point,
    orthogonal: bool,
) -> Point {
    let cx = bounds.center_x();
    let cy = bounds.center_y();
    let alpha = (next.y - cy).atan2(next.x - cx);
    let beta = PI / 2.0 - alpha;
    let t = bounds.height.atan2(bounds.width);

    let mut p = if alpha < -PI + t || alpha > PI - t {
        // left
        Point::new(bounds.x, cy - bounds.width * alpha.tan() / 2.0)
    } else if alpha < -t {
        // top
        Point::new(cx - bounds.height * beta.tan() / 2.0, bounds.y)
    } else if alpha < t {
        // right
        Point::new(bounds.right(), cy + bounds.width * alpha.tan() / 2.0)
    } else {
        // bottom
        Point::new(cx + bounds.height * beta.tan() / 2.0, bounds.bottom())
    };

    if orthogonal {
        if next.x >= bounds.x && next.x <= bounds.right() {
            p.x = next.x;
        } else if next.y >= bounds.y && next.y <= bounds.bottom() {
            p.y = next.y;
        }
        if next.x < bounds.x {
            p.x = bounds.x;
        } else if next.x > bounds.right() {
            p.x = bounds.right();
        }
        if next.y < bounds.y {
            p.y = bounds.y;
        } else if next.y > bounds.bottom() {
            p.y = bounds.bottom();
        }
    }
    p
}

pub fn ellipse_perimeter(
    bounds: &Rectangle,
    _style: Option<&Style>,
    next: Point,
    orthogonal: bool,
) -> Point {
    let a = bounds.width / 2.0;
    let b = bounds.height / 2.0;
    let cx = bounds.x + a;
    let cy = bounds.y + b;
    let px = next.x;
    let py = next.y;

    // Whole-unit offsets keep sub-pixel jitter from flipping the slope.
    let dx = (px - cx).trunc();
    let dy = (py - cy).trunc();

    if dx == 0.0 && dy != 0.0 {
        return Point::new(cx, cy + b * dy.signum());
    }
    if dx == 0.0 && dy == 0.0 {
        return Point::new(px, py);
    }

    if orthogonal {
        if py >= bounds.y && py <= bounds.bottom() {
            let ty = py - cy;
            let mut tx = finite_or_zero((a * a * (1.0 - (ty * ty) / (b * b))).sqrt());
            if px <= bounds.x {
                tx = -tx;
            }
            return Point::new(cx + tx, py);
        }
        if px >= bounds.x && px <= bounds.right() {
            let tx = px - cx;
            let mut ty = finite_or_zero((b * b * (1.0 - (tx * tx) / (a * a))).sqrt());
            if py <= bounds.y {
                ty = -ty;
            }
            return Point::new(px, cy + ty);
        }
    }

    // Line through the center: y = d * x + h
    let d = dy / dx;
    let h = cy - d * cx;
    let e = a * a * d * d + b * b;
    let f = -2.0 * cx * e;
    let g = a * a * d * d * cx * cx + b * b * cx * cx - a * a * b * b;
    let det = (f * f - 4.0 * e * g).sqrt();

    let xout1 = (-f + det) / (2.0 * e);
    let xout2 = (-f - det) / (2.0 * e);
    let yout1 = d * xout1 + h;
    let yout2 = d * xout2 + h;
    let dist1 = Point::new(xout1, yout1).distance(next);
    let dist2 = Point::new(xout2, yout2).distance(next);

    if dist1 < dist2 {
        Point::new(xout1, yout1)
    } else {
        Point::new(xout2, yout2)
    }
}

pub fn rhombus_perimeter(
    bounds: &Rectangle,
    _style: Option<&Style>,
    next: Point,
    orthogonal: bool,
) -> Point {
    let Rectangle {
        x,
        y,
        width: w,
        height: h,
    } = *bounds;
    let cx = bounds.center_x();
    let cy = bounds.center_y();
    let px = next.x;
    let py = next.y;

    // Straight through a corner.
    if cx == px {
        return if cy > py {
            Point::new(cx, y)
        } else {
            Point::new(cx, y + h)
        };
    } else if cy == py {
        return if cx > px {
            Point::new(x, cy)
        } else {
            Point::new(x + w, cy)
        };
    }

    let mut tx = cx;
    let mut ty = cy;
    if orthogonal {
        if px >= x && px <= x + w {
            tx = px;
        } else if py >= y && py <= y + h {
            ty = py;
        }
    }

    let from = Point::new(px, py);
    let to = Point::new(tx, ty);
    let hit = if px < cx {
        if py < cy {
            intersection(from, to, Point::new(cx, y), Point::new(x, cy))
        } else {
            intersection(from, to, Point::new(cx, y + h), Point::new(x, cy))
        }
    } else if py < cy {
        intersection(from, to, Point::new(cx, y), Point::new(x + w, cy))
    } else {
        intersection(from, to, Point::new(cx, y + h), Point::new(x + w, cy))
    };
    hit.unwrap_or_else(|| center_fallback(bounds, "rhombus"))
}

pub fn triangle_perimeter(
    bounds: &Rectangle,
    style: Option<&Style>,
    next: Point,
    orthogonal: bool,
) -> Point {
    let direction = style.and_then(|s| s.direction);
    let vertical = direction.is_some_and(Direction::is_vertical);

    let Rectangle {
        x,
        y,
        width: w,
        height: h,
    } = *bounds;
    let mut cx = bounds.center_x();
    let mut cy = bounds.center_y();

    // Base runs start..end, apex is `corner`.
    let [start, corner, end] = triangle_outline(bounds, direction);

    let dx = next.x - cx;
    let dy = next.y - cy;
    let alpha = if vertical { dx.atan2(dy) } else { dy.atan2(dx) };
    let t = if vertical { w.atan2(h) } else { h.atan2(w) };

    let base = if matches!(direction, Some(Direction::North) | Some(Direction::West)) {
        alpha > -t && alpha < t
    } else {
        alpha < -PI + t || alpha > PI - t
    };

    let result = if base {
        let within_base = if vertical {
            next.x >= start.x && next.x <= end.x
        } else {
            next.y >= start.y && next.y <= end.y
        };
        if orthogonal && within_base {
            Some(if vertical {
                Point::new(next.x, start.y)
            } else {
                Point::new(start.x, next.y)
            })
        } else {
            Some(match direction {
                Some(Direction::North) => Point::new(x + w / 2.0 + h * alpha.tan() / 2.0, y + h),
                Some(Direction::South) => Point::new(x + w / 2.0 - h * alpha.tan() / 2.0, y),
                Some(Direction::West) => Point::new(x + w, y + h / 2.0 + w * alpha.tan() / 2.0),
                _ => Point::new(x, y + h / 2.0 - w * alpha.tan() / 2.0),
            })
        }
    } else {
        if orthogonal {
            let mut pt = Point::new(cx, cy);
            if next.y >= y && next.y <= y + h {
                pt.x = if vertical {
                    cx
                } else if direction == Some(Direction::West) {
                    x + w
                } else {
                    x
                };
                pt.y = next.y;
            } else if next.x >= x && next.x <= x + w {
                pt.x = next.x;
                pt.y = if !vertical {
                    cy
                } else if direction == Some(Direction::North) {
                    y + h
                } else {
                    y
                };
            }
            cx = pt.x;
            cy = pt.y;
        }

        let toward_start = if vertical {
            next.x <= x + w / 2.0
        } else {
            next.y <= y + h / 2.0
        };
        let center = Point::new(cx, cy);
        if toward_start {
            intersection(next, center, start, corner)
        } else {
            intersection(next, center, corner, end)
        }
    };

    result.unwrap_or_else(|| Point::new(cx, cy))
}

pub fn hexagon_perimeter(
    bounds: &Rectangle,
    style: Option<&Style>,
    next: Point,
    orthogonal: bool,
) -> Point {
    let vertical = style
        .and_then(|s| s.direction)
        .is_some_and(Direction::is_vertical);
    let poly = hexagon_outline(bounds, vertical);
    let center = bounds.center();
    let dx = next.x - center.x;
    let dy = next.y - center.y;

    if dx == 0.0 && dy == 0.0 {
        return center;
    }

    if orthogonal {
        let origin_dir = if next.x >= bounds.x && next.x <= bounds.right() && dy != 0.0 {
            Some((Point::new(next.x, center.y), Point::new(0.0, dy.signum())))
        } else if next.y >= bounds.y && next.y <= bounds.bottom() && dx != 0.0 {
            Some((Point::new(center.x, next.y), Point::new(dx.signum(), 0.0)))
        } else {
            None
        };
        if let Some((origin, dir)) = origin_dir {
            if let Some(hit) = ray_polygon_intersection(origin, dir, &poly) {
                return hit;
            }
        }
    }

    // Pick the face whose angular span contains the ray, then intersect it.
    let alpha = dy.atan2(dx);
    let reach = (bounds.width + bounds.height).max(1.0) * 2.0 + dx.abs() + dy.abs();
    let len = (dx * dx + dy * dy).sqrt();
    let far = Point::new(center.x + dx / len * reach, center.y + dy / len * reach);
    for i in 0..poly.len() {
        let a = poly[i];
        let b = poly[(i + 1) % poly.len()];
        let a0 = (a.y - center.y).atan2(a.x - center.x);
        let a1 = (b.y - center.y).atan2(b.x - center.x);
        let span = (a1 - a0).rem_euclid(2.0 * PI);
        if (alpha - a0).rem_euclid(2.0 * PI) <= span {
            if let Some(hit) = intersection(center, far, a, b) {
                return hit;
            }
        }
    }

    ray_polygon_intersection(center, Point::new(dx, dy), &poly)
        .unwrap_or_else(|| center_fallback(bounds, "hexagon"))
}

/// Base start, apex and base end of a triangle pointing towards `direction`
/// (east when unset).
pub fn triangle_outline(bounds: &Rectangle, direction: Option<Direction>) -> [Point; 3] {
    let Rectangle {
        x,
        y,
        width: w,
        height: h,
    } = *bounds;
    let (cx, cy) = (bounds.center_x(), bounds.center_y());
    match direction {
        Some(Direction::North) => [
            Point::new(x, y + h),
            Point::new(cx, y),
            Point::new(x + w, y + h),
        ],
        Some(Direction::South) => [
            Point::new(x, y),
            Point::new(cx, y + h),
            Point::new(x + w, y),
        ],
        Some(Direction::West) => [
            Point::new(x + w, y),
            Point::new(x, cy),
            Point::new(x + w, y + h),
        ],
        _ => [Point::new(x, y), Point::new(x + w, cy), Point::new(x, y + h)],
    }
}

/// Outline in clockwise screen order. Horizontal hexagons point left/right,
/// vertical ones point up/down.
pub fn hexagon_outline(bounds: &Rectangle, vertical: bool) -> [Point; 6] {
    let Rectangle {
        x,
        y,
        width: w,
        height: h,
    } = *bounds;
    if vertical {
        [
            Point::new(x + 0.5 * w, y),
            Point::new(x + w, y + 0.25 * h),
            Point::new(x + w, y + 0.75 * h),
            Point::new(x + 0.5 * w, y + h),
            Point::new(x, y + 0.75 * h),
            Point::new(x, y + 0.25 * h),
        ]
    } else {
        [
            Point::new(x + 0.25 * w, y),
            Point::new(x + 0.75 * w, y),
            Point::new(x + w, y + 0.5 * h),
            Point::new(x + 0.75 * w, y + h),
            Point::new(x + 0.25 * w, y + h),
            Point::new(x, y + 0.5 * h),
        ]
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

fn center_fallback(bounds: &Rectangle, shape: &str) -> Point {
    tracing::debug!(shape, x = bounds.x, y = bounds.y, "perimeter: no outline crossing, using center");
    bounds.center()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> Rectangle {
        Rectangle::new(0.0, 0.0, 100.0, 50.0)
    }

    fn approx(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < 1e-6 && (a.y - b.y).abs() < 1e-6
    }

    #[test]
    fn rectangle_hits_right_edge() {
        let p = rectangle_perimeter(&bounds(), None, Point::new(300.0, 25.0), false);
        assert!(approx(p, Point::new(100.0, 25.0)));
    }

    #[test]
    fn rectangle_hits_top_edge_diagonally() {
        let p = rectangle_perimeter(&bounds(), None, Point::new(50.0, -100.0), false);
        assert!(approx(p, Point::new(50.0, 0.0)));
        let p = rectangle_perimeter(&bounds(), None, Point::new(75.0, -25.0), false);
        assert!(approx(p, Point::new(62.5, 0.0)));
    }

    #[test]
    fn rectangle_orthogonal_snaps_to_next_x() {
        let p = rectangle_perimeter(&bounds(), None, Point::new(80.0, 200.0), true);
        assert!(approx(p, Point::new(80.0, 50.0)));
        let p = rectangle_perimeter(&bounds(), None, Point::new(-40.0, 10.0), true);
        assert!(approx(p, Point::new(0.0, 10.0)));
    }

    #[test]
    fn ellipse_vertical_line_hits_pole() {
        let p = ellipse_perimeter(&bounds(), None, Point::new(50.0, 200.0), false);
        assert!(approx(p, Point::new(50.0, 50.0)));
    }

    #[test]
    fn ellipse_next_at_center_returns_it() {
        let p = ellipse_perimeter(&bounds(), None, Point::new(50.0, 25.0), false);
        assert!(approx(p, Point::new(50.0, 25.0)));
    }

    #[test]
    fn ellipse_horizontal_line_hits_side() {
        let p = ellipse_perimeter(&bounds(), None, Point::new(-80.0, 25.0), false);
        assert!(approx(p, Point::new(0.0, 25.0)));
    }

    #[test]
    fn ellipse_orthogonal_stays_on_row() {
        let p = ellipse_perimeter(&bounds(), None, Point::new(300.0, 40.0), true);
        assert!((p.y - 40.0).abs() < 1e-9);
        assert!(p.x > 50.0);
        let norm = ((p.x - 50.0) / 50.0).powi(2) + ((p.y - 25.0) / 25.0).powi(2);
        assert!((norm - 1.0).abs() < 1e-9);
    }

    #[test]
    fn rhombus_corner_cases() {
        let p = rhombus_perimeter(&bounds(), None, Point::new(50.0, -10.0), false);
        assert_eq!(p, Point::new(50.0, 0.0));
        let p = rhombus_perimeter(&bounds(), None, Point::new(500.0, 25.0), false);
        assert_eq!(p, Point::new(100.0, 25.0));
    }

    #[test]
    fn rhombus_diagonal_face() {
        let p = rhombus_perimeter(&bounds(), None, Point::new(150.0, 125.0), false);
        // lower right face: from (50, 50) to (100, 25)
        assert!(p.x > 50.0 && p.x < 100.0);
        assert!((p.y - (50.0 - (p.x - 50.0) / 2.0)).abs() < 1e-9);
    }

    #[test]
    fn rhombus_inside_point_falls_back_to_center() {
        let p = rhombus_perimeter(&bounds(), None, Point::new(52.0, 26.0), false);
        assert_eq!(p, Point::new(50.0, 25.0));
    }

    #[test]
    fn triangle_default_points_east() {
        let p = triangle_perimeter(&bounds(), None, Point::new(400.0, 25.0), false);
        assert!(approx(p, Point::new(100.0, 25.0)));
        let p = triangle_perimeter(&bounds(), None, Point::new(-400.0, 25.0), false);
        assert!(approx(p, Point::new(0.0, 25.0)));
    }

    #[test]
    fn triangle_north_base_is_bottom() {
        let style = Style {
            direction: Some(Direction::North),
            ..Style::default()
        };
        let p = triangle_perimeter(&bounds(), Some(&style), Point::new(50.0, 400.0), false);
        assert!(approx(p, Point::new(50.0, 50.0)));
        let p = triangle_perimeter(&bounds(), Some(&style), Point::new(50.0, -400.0), false);
        assert!(approx(p, Point::new(50.0, 0.0)));
    }

    #[test]
    fn hexagon_tip_and_flat_faces() {
        let p = hexagon_perimeter(&bounds(), None, Point::new(400.0, 25.0), false);
        assert!(approx(p, Point::new(100.0, 25.0)));
        let p = hexagon_perimeter(&bounds(), None, Point::new(50.0, -400.0), false);
        assert!(approx(p, Point::new(50.0, 0.0)));
    }

    #[test]
    fn hexagon_orthogonal_uses_row() {
        let p = hexagon_perimeter(&bounds(), None, Point::new(300.0, 10.0), true);
        assert!((p.y - 10.0).abs() < 1e-9);
        assert!(p.x > 75.0 && p.x < 100.0);
    }

    #[test]
    fn kinds_round_trip_names() {
        for kind in PerimeterKind::ALL {
            assert_eq!(PerimeterKind::from_name(kind.name()), Some(kind));
        }
    }
}
