//! Clean-up passes over routed point lists.

use crate::geometry::Point;

const EPSILON: f64 = 1e-4;

/// Drops points closer than `tolerance` (on both axes) to the previously kept
/// one. The final point always survives and replaces a near duplicate, and two
/// or more input points never collapse below two.
pub fn merge_close(points: &[Point], tolerance: f64) -> Vec<Point> {
    let mut out: Vec<Point> = Vec::with_capacity(points.len());
    for (idx, &point) in points.iter().enumerate() {
        let is_last = idx + 1 == points.len();
        let near = out.last().is_some_and(|prev: &Point| {
            (point.x - prev.x).abs() <= tolerance && (point.y - prev.y).abs() <= tolerance
        });
        if !near {
            out.push(point);
        } else if is_last {
            let kept = out.len();
            if kept > 1 {
                out[kept - 1] = point;
            } else {
                out.push(point);
            }
        }
    }
    out
}

/// Removes interior points that continue the previous segment in the same
/// direction.
pub fn remove_redundant_bends(points: &[Point]) -> Vec<Point> {
    if points.len() <= 2 {
        return points.to_vec();
    }
    let mut out: Vec<Point> = Vec::with_capacity(points.len());
    out.push(points[0]);
    for idx in 1..points.len() - 1 {
        let prev = out[out.len() - 1];
        let curr = points[idx];
        let next = points[idx + 1];
        let (dx1, dy1) = (curr.x - prev.x, curr.y - prev.y);
        let (dx2, dy2) = (next.x - curr.x, next.y - curr.y);
        if dx1.abs() <= EPSILON && dy1.abs() <= EPSILON {
            continue;
        }
        let cross = dx1 * dy2 - dy1 * dx2;
        let dot = dx1 * dx2 + dy1 * dy2;
        let scale = (dx1.abs() + dy1.abs()) * (dx2.abs() + dy2.abs());
        if cross.abs() <= EPSILON * scale.max(1.0) && dot >= 0.0 {
            continue;
        }
        out.push(curr);
    }
    let last = points[points.len() - 1];
    let prev = out[out.len() - 1];
    if (last.x - prev.x).abs() > EPSILON || (last.y - prev.y).abs() > EPSILON || out.len() == 1 {
        out.push(last);
    }
    out
}

/// Merges near-coincident points, then drops redundant bends.
pub fn simplify(points: &[Point], tolerance: f64) -> Vec<Point> {
    remove_redundant_bends(&merge_close(points, tolerance))
}

/// Whether every segment of the polyline is horizontal or vertical.
pub fn is_axis_aligned(points: &[Point], tolerance: f64) -> bool {
    points.windows(2).all(|pair| {
        (pair[0].x - pair[1].x).abs() <= tolerance || (pair[0].y - pair[1].y).abs() <= tolerance
    })
}
