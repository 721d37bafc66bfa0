use crate::geometry::{Point, round_tenth};
use crate::state::{CellState, EdgeState};

use super::scaling::{scale_cell_state, scale_point_array};

const TOLERANCE: f64 = 1.0;

/// Appends `pt` (unscaled) unless it lands within tolerance of the previous
/// pushed point. The y tolerance grows with the zoom.
fn push_point(result: &mut Vec<Point>, last_pushed: &mut Option<Point>, pt: Point, scale: f64) {
    let pt = Point::new(round_tenth(pt.x * scale), round_tenth(pt.y * scale));
    let distinct = match *last_pushed {
        None => true,
        Some(last) => {
            (last.x - pt.x).abs() >= TOLERANCE || (last.y - pt.y).abs() >= scale.max(1.0)
        }
    };
    if distinct {
        result.push(pt);
        *last_pushed = Some(pt);
    }
}

fn snap_to(hint: &mut Point, fixed: Point) {
    if (hint.x - fixed.x).abs() < TOLERANCE {
        hint.x = fixed.x;
    }
    if (hint.y - fixed.y).abs() < TOLERANCE {
        hint.y = fixed.y;
    }
}

fn outside_rows(term: &CellState, y: f64) -> bool {
    y < term.y || y > term.y + term.height
}

fn outside_columns(term: &CellState, x: f64) -> bool {
    x < term.x || x > term.x + term.width
}

/// Orthogonal connector through user-placed bend hints. Segments alternate
/// between horizontal and vertical; the orientation of the first one comes
/// from how the outermost hints line up with the terminals.
pub fn segment_connector(
    state: &EdgeState<'_>,
    source_scaled: Option<&CellState>,
    target_scaled: Option<&CellState>,
    control_hints: &[Point],
    result: &mut Vec<Point>,
) {
    let view = state.view;
    let scale = view.scale;
    let pts = scale_point_array(&state.absolute_points, scale);
    let source = scale_cell_state(source_scaled, scale);
    let target = scale_cell_state(target_scaled, scale);
    let first = pts.first().copied().flatten();
    let last = pts.last().copied().flatten();
    let center =
        |term: &CellState| Point::new(view.routing_center_x(term), view.routing_center_y(term));

    let mut last_pushed = result.first().copied();
    let mut horizontal = true;
    let pt = first.or_else(|| source.as_ref().map(center));
    let hint: Option<Point>;

    if control_hints.is_empty() {
        hint = pt;
    } else {
        let mut hints: Vec<Point> = control_hints
            .iter()
            .map(|hint| view.transform_control_point(state, *hint, true))
            .collect();
        if let (Some(pt), Some(head)) = (pt, hints.first_mut()) {
            snap_to(head, pt);
        }
        if let (Some(pe), Some(tail)) = (last, hints.last_mut()) {
            snap_to(tail, pe);
        }
        let Some(&head) = hints.first() else {
            return;
        };

        let mut current_term = if first.is_some() { None } else { source.as_ref() };
        let mut current_pt = first;
        let mut current_hint = head;
        let mut vert_chan = false;

        for i in 0..2 {
            let fixed_vert_align = current_pt.is_some_and(|p| p.x == current_hint.x);
            let fixed_hoz_align = current_pt.is_some_and(|p| p.y == current_hint.y);
            let in_hoz_chan = current_term.is_some_and(|t| !outside_rows(t, current_hint.y));
            let in_vert_chan = current_term.is_some_and(|t| !outside_columns(t, current_hint.x));

            let hoz_chan = fixed_hoz_align || in_hoz_chan;
            vert_chan = vert_chan || fixed_vert_align || in_vert_chan;

            // A hint in both channels of a floating source, or sitting exactly
            // on a fixed source point, says nothing; try the target end.
            let ambiguous =
                i == 0 && ((hoz_chan && vert_chan) || (fixed_vert_align && fixed_hoz_align));
            if !ambiguous {
                if !in_hoz_chan && !in_vert_chan && (hoz_chan || vert_chan) {
                    horizontal = !hoz_chan;
                    break;
                }
                if hoz_chan || vert_chan {
                    horizontal = if i == 1 {
                        // Counted back from the target end.
                        if hints.len() % 2 == 0 { hoz_chan } else { vert_chan }
                    } else {
                        hoz_chan
                    };
                    break;
                }
            }

            current_term = if last.is_some() { None } else { target.as_ref() };
            current_pt = last;
            if let Some(&tail) = hints.last() {
                current_hint = tail;
            }
            if fixed_vert_align && fixed_hoz_align && !hints.is_empty() {
                hints.remove(0);
            }
        }

        let mut walk = pt.unwrap_or(head);
        if horizontal
            && (first.is_some_and(|p| p.y != head.y)
                || (first.is_none() && source.as_ref().is_some_and(|s| outside_rows(s, head.y))))
        {
            push_point(result, &mut last_pushed, Point::new(walk.x, head.y), scale);
        } else if !horizontal
            && (first.is_some_and(|p| p.x != head.x)
                || (first.is_none() && source.as_ref().is_some_and(|s| outside_columns(s, head.x))))
        {
            push_point(result, &mut last_pushed, Point::new(head.x, walk.y), scale);
        }

        if horizontal {
            walk.y = head.y;
        } else {
            walk.x = head.x;
        }

        let mut current = head;
        for next in &hints {
            horizontal = !horizontal;
            current = *next;
            if horizontal {
                walk.y = current.y;
            } else {
                walk.x = current.x;
            }
            push_point(result, &mut last_pushed, walk, scale);
        }
        hint = Some(current);
    }

    let end = last.or_else(|| target.as_ref().map(center));
    if let (Some(end), Some(hint)) = (end, hint) {
        if horizontal
            && (last.is_some_and(|_| end.y != hint.y)
                || (last.is_none() && target.as_ref().is_some_and(|t| outside_rows(t, hint.y))))
        {
            push_point(result, &mut last_pushed, Point::new(end.x, hint.y), scale);
        } else if !horizontal
            && (last.is_some_and(|_| end.x != hint.x)
                || (last.is_none() && target.as_ref().is_some_and(|t| outside_columns(t, hint.x))))
        {
            push_point(result, &mut last_pushed, Point::new(hint.x, end.y), scale);
        }
    }

    // Bends that fell inside a floating terminal.
    if first.is_none() {
        if let Some(source) = source_scaled {
            while result.len() > 1 && source.contains(result[1].x, result[1].y) {
                result.remove(1);
            }
        }
    }
    if last.is_none() {
        if let Some(target) = target_scaled {
            while let Some(tail) = result.last().copied() {
                if result.len() > 1 && target.contains(tail.x, tail.y) {
                    result.pop();
                } else {
                    break;
                }
            }
        }
    }

    if !control_hints.is_empty() {
        if let Some(pe) = state.last_point() {
            let near_end = result.last().is_some_and(|tail| {
                (pe.x - tail.x).abs() <= TOLERANCE && (pe.y - tail.y).abs() <= TOLERANCE
            });
            if near_end {
                result.pop();
                if let Some(tail) = result.last_mut() {
                    snap_to(tail, pe);
                }
            }
        }
    }
}
