use std::borrow::Cow;

use crate::geometry::Point;
use crate::state::{CellState, EdgeState};
use crate::style::{DirectionMask, port_constraints};

/// Database-style connector: a horizontal stub of `segment` leaves each
/// terminal on its left or right side, then the stubs are joined.
pub fn entity_relation(
    state: &EdgeState<'_>,
    source: Option<&CellState>,
    target: Option<&CellState>,
    _hints: &[Point],
    result: &mut Vec<Point>,
) {
    let view = state.view;
    let segment = state
        .style
        .segment
        .unwrap_or(view.config.entity_relation.segment)
        * view.scale;
    let p0 = state.first_point();
    let pe = state.last_point();

    let mut is_source_left = false;
    if let Some(src) = source {
        if let Some(relative) = src.cell.relative {
            is_source_left = relative.x <= 0.5;
        } else if let Some(tgt) = target {
            let target_x = pe.map_or(tgt.x + tgt.width, |pe| pe.x);
            let source_x = p0.map_or(src.x, |p0| p0.x);
            is_source_left = target_x < source_x;
        }
    }

    let source: Cow<'_, CellState> = match (p0, source) {
        (Some(p0), _) => Cow::Owned(CellState::at_point(p0)),
        (None, Some(src)) => {
            let constraint = port_constraints(&src.style, &state.style, true, DirectionMask::NONE);
            if constraint != DirectionMask::NONE
                && constraint != DirectionMask::WEST | DirectionMask::EAST
            {
                is_source_left = constraint == DirectionMask::WEST;
            }
            Cow::Borrowed(src)
        }
        (None, None) => return,
    };

    let mut is_target_left = true;
    if let Some(tgt) = target {
        if let Some(relative) = tgt.cell.relative {
            is_target_left = relative.x <= 0.5;
        } else {
            let source_x = p0.map_or(source.x + source.width, |p0| p0.x);
            let target_x = pe.map_or(tgt.x, |pe| pe.x);
            is_target_left = source_x < target_x;
        }
    }

    let target: Cow<'_, CellState> = match (pe, target) {
        (Some(pe), _) => Cow::Owned(CellState::at_point(pe)),
        (None, Some(tgt)) => {
            let constraint =
                port_constraints(&tgt.style, &state.style, false, DirectionMask::NONE);
            if constraint != DirectionMask::NONE
                && constraint != DirectionMask::WEST | DirectionMask::EAST
            {
                is_target_left = constraint == DirectionMask::WEST;
            }
            Cow::Borrowed(tgt)
        }
        (None, None) => return,
    };

    let x0 = if is_source_left {
        source.x
    } else {
        source.x + source.width
    };
    let y0 = view.routing_center_y(&source);
    let xe = if is_target_left {
        target.x
    } else {
        target.x + target.width
    };
    let ye = view.routing_center_y(&target);

    let stub = |left: bool| if left { -segment } else { segment };
    let dep = Point::new(x0 + stub(is_source_left), y0);
    let arr = Point::new(xe + stub(is_target_left), ye);

    if is_source_left == is_target_left {
        let x = if is_source_left {
            x0.min(xe) - segment
        } else {
            x0.max(xe) + segment
        };
        result.push(Point::new(x, y0));
        result.push(Point::new(x, ye));
    } else if (dep.x < arr.x) == is_source_left {
        let mid_y = y0 + (ye - y0) / 2.0;
        result.push(dep);
        result.push(Point::new(dep.x, mid_y));
        result.push(Point::new(arr.x, mid_y));
        result.push(arr);
    } else {
        result.push(dep);
        result.push(arr);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::test_support::{edge, pts, route, vertex};
    use crate::style::Style;
    use crate::view::View;

    #[test]
    fn same_side_exit_jogs_outside_both() {
        let view = View::default();
        let state = EdgeState::new(
            &view,
            Style {
                segment: Some(10.0),
                source_port_constraint: Some("west".to_string()),
                target_port_constraint: Some("west".to_string()),
                ..Style::default()
            },
        );
        let source = vertex("a", 100.0, 0.0, 40.0, 40.0);
        let target = vertex("b", 120.0, 100.0, 40.0, 40.0);
        let result = route(entity_relation, &state, Some(&source), Some(&target), &[]);
        assert_eq!(result, pts(&[(90.0, 20.0), (90.0, 120.0)]));
    }

    #[test]
    fn facing_terminals_join_stubs() {
        let view = View::default();
        let state = edge(&view);
        let source = vertex("a", 0.0, 0.0, 40.0, 40.0);
        let target = vertex("b", 200.0, 100.0, 40.0, 40.0);
        let result = route(entity_relation, &state, Some(&source), Some(&target), &[]);
        assert_eq!(result, pts(&[(70.0, 20.0), (170.0, 120.0)]));
    }

    #[test]
    fn crossing_stubs_add_a_mid_jog() {
        let view = View::default();
        let state = edge(&view);
        let source = vertex("a", 0.0, 0.0, 40.0, 40.0);
        let target = vertex("b", 50.0, 100.0, 40.0, 40.0);
        let result = route(entity_relation, &state, Some(&source), Some(&target), &[]);
        assert_eq!(
            result,
            pts(&[(70.0, 20.0), (70.0, 70.0), (20.0, 70.0), (20.0, 120.0)])
        );
    }

    #[test]
    fn segment_follows_view_config_and_scale() {
        let mut view = View {
            scale: 2.0,
            ..View::default()
        };
        view.config.entity_relation.segment = 5.0;
        let state = edge(&view);
        let source = vertex("a", 0.0, 0.0, 80.0, 80.0);
        let target = vertex("b", 400.0, 0.0, 80.0, 80.0);
        let result = route(entity_relation, &state, Some(&source), Some(&target), &[]);
        assert_eq!(result, pts(&[(90.0, 40.0), (390.0, 40.0)]));
    }

    #[test]
    fn relative_ports_pick_their_side() {
        let view = View::default();
        let state = edge(&view);
        let mut source = vertex("a", 0.0, 0.0, 40.0, 40.0);
        source.cell.relative = Some(Point::new(0.0, 0.5));
        let target = vertex("b", 200.0, 0.0, 40.0, 40.0);
        let result = route(entity_relation, &state, Some(&source), Some(&target), &[]);
        assert_eq!(result, pts(&[(-30.0, 20.0), (-30.0, 20.0)]));
    }

    #[test]
    fn floating_source_without_point_returns() {
        let view = View::default();
        let state = edge(&view);
        let target = vertex("b", 200.0, 0.0, 40.0, 40.0);
        assert!(route(entity_relation, &state, None, Some(&target), &[]).is_empty());
    }
}
