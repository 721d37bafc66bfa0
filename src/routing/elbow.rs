use crate::geometry::{Point, round_half_up};
use crate::state::{CellState, EdgeState};
use crate::style::Elbow;

use super::terminal_or_fixed;

fn outside_both(source: &CellState, target: &CellState, x: f64, y: f64) -> bool {
    !target.contains(x, y) && !source.contains(x, y)
}

/// Pushes `pt` unless it repeats the last point this router added after `start`.
fn push_distinct(result: &mut Vec<Point>, start: usize, pt: Point) {
    if result.len() == start || result.last() != Some(&pt) {
        result.push(pt);
    }
}

/// Connects the terminals through a shared vertical channel: one leg leaves
/// each terminal horizontally at its routing-center y and both meet at `x`.
pub fn side_to_side(
    state: &EdgeState<'_>,
    source: Option<&CellState>,
    target: Option<&CellState>,
    hints: &[Point],
    result: &mut Vec<Point>,
) {
    let view = state.view;
    let pt = hints
        .first()
        .map(|hint| view.transform_control_point(state, *hint, false));
    let source = terminal_or_fixed(state.first_point(), source);
    let target = terminal_or_fixed(state.last_point(), target);
    let (Some(source), Some(target)) = (source.as_deref(), target.as_deref()) else {
        return;
    };

    let l = source.x.max(target.x);
    let r = (source.x + source.width).min(target.x + target.width);
    let x = match pt {
        Some(pt) => pt.x,
        None => round_half_up(r + (l - r) / 2.0),
    };

    let mut y1 = view.routing_center_y(source);
    let mut y2 = view.routing_center_y(target);
    if let Some(pt) = pt {
        if pt.y >= source.y && pt.y <= source.y + source.height {
            y1 = pt.y;
        }
        if pt.y >= target.y && pt.y <= target.y + target.height {
            y2 = pt.y;
        }
    }

    let start = result.len();
    if outside_both(source, target, x, y1) {
        push_distinct(result, start, Point::new(x, y1));
    }
    if outside_both(source, target, x, y2) {
        push_distinct(result, start, Point::new(x, y2));
    }

    if result.len() - start == 1 {
        match pt {
            Some(pt) => {
                if outside_both(source, target, x, pt.y) {
                    push_distinct(result, start, Point::new(x, pt.y));
                }
            }
            None => {
                let t = source.y.max(target.y);
                let b = (source.y + source.height).min(target.y + target.height);
                push_distinct(result, start, Point::new(x, t + (b - t) / 2.0));
            }
        }
    }
}

/// Dual of [`side_to_side`]: the terminals meet on a shared horizontal channel.
pub fn top_to_bottom(
    state: &EdgeState<'_>,
    source: Option<&CellState>,
    target: Option<&CellState>,
    hints: &[Point],
    result: &mut Vec<Point>,
) {
    let view = state.view;
    let pt = hints
        .first()
        .map(|hint| view.transform_control_point(state, *hint, false));
    let source = terminal_or_fixed(state.first_point(), source);
    let target = terminal_or_fixed(state.last_point(), target);
    let (Some(source), Some(target)) = (source.as_deref(), target.as_deref()) else {
        return;
    };

    let t = source.y.max(target.y);
    let b = (source.y + source.height).min(target.y + target.height);

    let mut x = view.routing_center_x(source);
    if let Some(pt) = pt {
        if pt.x >= source.x && pt.x <= source.x + source.width {
            x = pt.x;
        }
    }
    let y = match pt {
        Some(pt) => pt.y,
        None => round_half_up(b + (t - b) / 2.0),
    };

    let start = result.len();
    if outside_both(source, target, x, y) {
        push_distinct(result, start, Point::new(x, y));
    }

    x = match pt {
        Some(pt) if pt.x >= target.x && pt.x <= target.x + target.width => pt.x,
        _ => view.routing_center_x(target),
    };
    if outside_both(source, target, x, y) {
        push_distinct(result, start, Point::new(x, y));
    }

    if result.len() - start == 1 {
        match pt {
            Some(pt) => {
                if outside_both(source, target, pt.x, y) {
                    push_distinct(result, start, Point::new(pt.x, y));
                }
            }
            None => {
                let l = source.x.max(target.x);
                let r = (source.x + source.width).min(target.x + target.width);
                push_distinct(result, start, Point::new(l + (r - l) / 2.0, y));
            }
        }
    }
}

/// Chooses between [`top_to_bottom`] and [`side_to_side`]. A hint above or
/// below both terminals forces the vertical form, one beside them the
/// horizontal form; without a hint, terminals that only touch along one axis
/// decide. Otherwise `elbow=vertical` selects the vertical form.
pub fn elbow_connector(
    state: &EdgeState<'_>,
    source: Option<&CellState>,
    target: Option<&CellState>,
    hints: &[Point],
    result: &mut Vec<Point>,
) {
    let mut vertical = false;
    let mut horizontal = false;

    if let (Some(src), Some(tgt)) = (source, target) {
        match hints.first() {
            Some(hint) => {
                let union = src.bounds().union(&tgt.bounds());
                let pt = state.view.transform_control_point(state, *hint, false);
                vertical = pt.y < union.y || pt.y > union.bottom();
                horizontal = pt.x < union.x || pt.x > union.right();
            }
            None => {
                let left = src.x.max(tgt.x);
                let right = (src.x + src.width).min(tgt.x + tgt.width);
                vertical = left == right;
                if !vertical {
                    let top = src.y.max(tgt.y);
                    let bottom = (src.y + src.height).min(tgt.y + tgt.height);
                    horizontal = top == bottom;
                }
            }
        }
    }

    if !horizontal && (vertical || state.style.elbow == Some(Elbow::Vertical)) {
        top_to_bottom(state, source, target, hints, result);
    } else {
        side_to_side(state, source, target, hints, result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::test_support::{edge, pts, route, vertex};
    use crate::style::Style;
    use crate::view::View;

    #[test]
    fn side_to_side_meets_in_the_gap() {
        let view = View::default();
        let state = edge(&view);
        let source = vertex("a", 0.0, 0.0, 40.0, 40.0);
        let target = vertex("b", 100.0, 0.0, 40.0, 40.0);
        let result = route(side_to_side, &state, Some(&source), Some(&target), &[]);
        assert_eq!(result, pts(&[(70.0, 20.0)]));
    }

    #[test]
    fn side_to_side_uses_hint_channel() {
        let view = View::default();
        let state = edge(&view);
        let source = vertex("a", 0.0, 0.0, 40.0, 40.0);
        let target = vertex("b", 100.0, 60.0, 40.0, 40.0);
        let result = route(
            side_to_side,
            &state,
            Some(&source),
            Some(&target),
            &[Point::new(60.0, 30.0)],
        );
        assert_eq!(result, pts(&[(60.0, 30.0), (60.0, 80.0)]));
    }

    #[test]
    fn side_to_side_swaps_symmetrically() {
        let view = View::default();
        let state = edge(&view);
        let source = vertex("a", 0.0, 0.0, 40.0, 40.0);
        let target = vertex("b", 120.0, 90.0, 40.0, 60.0);
        let forward = route(side_to_side, &state, Some(&source), Some(&target), &[]);
        let mut backward = route(side_to_side, &state, Some(&target), Some(&source), &[]);
        backward.reverse();
        assert_eq!(forward, backward);
        assert_eq!(forward, pts(&[(80.0, 20.0), (80.0, 120.0)]));
    }

    #[test]
    fn side_to_side_mirrors_across_vertical_axis() {
        let view = View::default();
        let state = edge(&view);
        let source = vertex("a", 0.0, 0.0, 40.0, 40.0);
        let target = vertex("b", 100.0, 60.0, 40.0, 40.0);
        let mirrored_source = vertex("a", -40.0, 0.0, 40.0, 40.0);
        let mirrored_target = vertex("b", -140.0, 60.0, 40.0, 40.0);
        let hint = Point::new(55.0, 50.0);
        let forward = route(side_to_side, &state, Some(&source), Some(&target), &[hint]);
        let mirrored = route(
            side_to_side,
            &state,
            Some(&mirrored_source),
            Some(&mirrored_target),
            &[Point::new(-hint.x, hint.y)],
        );
        let flipped: Vec<Point> = forward.iter().map(|p| Point::new(-p.x, p.y)).collect();
        assert_eq!(mirrored, flipped);
    }

    #[test]
    fn side_to_side_skips_floating_edges() {
        let view = View::default();
        let state = edge(&view);
        let source = vertex("a", 0.0, 0.0, 40.0, 40.0);
        assert!(route(side_to_side, &state, Some(&source), None, &[]).is_empty());
    }

    #[test]
    fn side_to_side_prefers_fixed_points() {
        let view = View::default();
        let state = edge(&view).with_terminal_points(Some(Point::new(40.0, 10.0)), None);
        let source = vertex("a", 0.0, 0.0, 40.0, 40.0);
        let target = vertex("b", 100.0, 0.0, 40.0, 40.0);
        let result = route(side_to_side, &state, Some(&source), Some(&target), &[]);
        assert_eq!(result, pts(&[(70.0, 10.0), (70.0, 20.0)]));
    }

    #[test]
    fn top_to_bottom_meets_in_the_gap() {
        let view = View::default();
        let state = edge(&view);
        let source = vertex("a", 0.0, 0.0, 40.0, 40.0);
        let target = vertex("b", 60.0, 100.0, 40.0, 40.0);
        let result = route(top_to_bottom, &state, Some(&source), Some(&target), &[]);
        assert_eq!(result, pts(&[(20.0, 70.0), (80.0, 70.0)]));

        let mut backward = route(top_to_bottom, &state, Some(&target), Some(&source), &[]);
        backward.reverse();
        assert_eq!(result, backward);
    }

    #[test]
    fn top_to_bottom_collapses_aligned_terminals() {
        let view = View::default();
        let state = edge(&view);
        let source = vertex("a", 0.0, 0.0, 40.0, 40.0);
        let target = vertex("b", 0.0, 100.0, 40.0, 40.0);
        let result = route(top_to_bottom, &state, Some(&source), Some(&target), &[]);
        assert_eq!(result, pts(&[(20.0, 70.0)]));
    }

    #[test]
    fn elbow_follows_style_when_unconstrained() {
        let view = View::default();
        let source = vertex("a", 0.0, 0.0, 40.0, 40.0);
        let target = vertex("b", 100.0, 100.0, 40.0, 40.0);

        let horizontal = edge(&view);
        let result = route(elbow_connector, &horizontal, Some(&source), Some(&target), &[]);
        assert_eq!(result, pts(&[(70.0, 20.0), (70.0, 120.0)]));

        let vertical = crate::state::EdgeState::new(
            &view,
            Style {
                elbow: Some(Elbow::Vertical),
                ..Style::default()
            },
        );
        let result = route(elbow_connector, &vertical, Some(&source), Some(&target), &[]);
        assert_eq!(result, pts(&[(20.0, 70.0), (120.0, 70.0)]));
    }

    #[test]
    fn elbow_hint_above_forces_vertical() {
        let view = View::default();
        let state = edge(&view);
        let source = vertex("a", 0.0, 0.0, 40.0, 40.0);
        let target = vertex("b", 100.0, 0.0, 40.0, 40.0);
        let result = route(
            elbow_connector,
            &state,
            Some(&source),
            Some(&target),
            &[Point::new(70.0, -30.0)],
        );
        assert_eq!(result, pts(&[(20.0, -30.0), (120.0, -30.0)]));
    }

    #[test]
    fn elbow_touching_columns_force_vertical() {
        let view = View::default();
        let state = edge(&view);
        let source = vertex("a", 0.0, 0.0, 40.0, 40.0);
        let target = vertex("b", 40.0, 100.0, 40.0, 40.0);
        let result = route(elbow_connector, &state, Some(&source), Some(&target), &[]);
        assert_eq!(result, pts(&[(20.0, 70.0), (60.0, 70.0)]));
    }
}
