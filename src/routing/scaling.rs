//! Conversions from view coordinates back to unscaled model coordinates,
//! rounded to one decimal place.

use crate::geometry::{Point, round_tenth};
use crate::state::CellState;

pub fn unscale(value: f64, scale: f64) -> f64 {
    round_tenth(value / scale)
}

pub fn scale_point(point: Point, scale: f64) -> Point {
    Point::new(unscale(point.x, scale), unscale(point.y, scale))
}

/// Divides every present point by `scale`. Gaps stay gaps.
pub fn scale_point_array(points: &[Option<Point>], scale: f64) -> Vec<Option<Point>> {
    points
        .iter()
        .map(|point| point.map(|point| scale_point(point, scale)))
        .collect()
}

/// Copy of `state` with its bounds divided by `scale`.
pub fn scale_cell_state(state: Option<&CellState>, scale: f64) -> Option<CellState> {
    state.map(|state| CellState {
        x: unscale(state.x, scale),
        y: unscale(state.y, scale),
        width: unscale(state.width, scale),
        height: unscale(state.height, scale),
        ..state.clone()
    })
}
