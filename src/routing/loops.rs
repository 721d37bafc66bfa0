use crate::geometry::Point;
use crate::state::{CellState, EdgeState};
use crate::style::Direction;

/// Routes a self-reference. Explicit hints pass through when both ends are
/// fixed; otherwise the loop bulges out of the side picked by `direction`
/// (west by default), or towards a single hint outside the terminal.
pub fn loop_style(
    state: &EdgeState<'_>,
    source: Option<&CellState>,
    _target: Option<&CellState>,
    hints: &[Point],
    result: &mut Vec<Point>,
) {
    let view = state.view;

    if state.first_point().is_some() && state.last_point().is_some() {
        result.extend(
            hints
                .iter()
                .map(|hint| view.transform_control_point(state, *hint, false)),
        );
        return;
    }

    let Some(source) = source else {
        return;
    };

    let pt = hints
        .first()
        .map(|hint| view.transform_control_point(state, *hint, false))
        .filter(|pt| !source.contains(pt.x, pt.y));

    let seg = state.style.segment.unwrap_or(view.grid_size) * view.scale;
    let dir = state.style.direction.unwrap_or(Direction::West);

    let mut x = 0.0;
    let mut y = 0.0;
    let mut dx = 0.0;
    let mut dy = 0.0;
    if dir.is_vertical() {
        x = view.routing_center_x(source);
        dx = seg;
    } else {
        y = view.routing_center_y(source);
        dy = seg;
    }

    match pt {
        Some(pt) if pt.x >= source.x && pt.x <= source.x + source.width => {
            x = view.routing_center_x(source);
            dx = (x - pt.x).abs().max(dy);
            y = pt.y;
            dy = 0.0;
        }
        Some(pt) => {
            x = pt.x;
            dy = (y - pt.y).abs().max(dy);
        }
        None => match dir {
            Direction::North => y = source.y - 2.0 * dx,
            Direction::South => y = source.y + source.height + 2.0 * dx,
            Direction::East => x = source.x - 2.0 * dy,
            Direction::West => x = source.x + source.width + 2.0 * dy,
        },
    }

    result.push(Point::new(x - dx, y - dy));
    result.push(Point::new(x + dx, y + dy));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::test_support::{edge, pts, route, vertex};
    use crate::style::Style;
    use crate::view::View;

    fn styled(view: &View, direction: Direction, segment: f64) -> EdgeState<'_> {
        EdgeState::new(
            view,
            Style {
                direction: Some(direction),
                segment: Some(segment),
                ..Style::default()
            },
        )
    }

    #[test]
    fn default_loop_uses_grid_size() {
        let view = View::default();
        let state = edge(&view);
        let cell = vertex("a", 0.0, 0.0, 40.0, 40.0);
        let result = route(loop_style, &state, Some(&cell), Some(&cell), &[]);
        let seg = view.grid_size;
        assert_eq!(
            result,
            pts(&[(40.0 + 2.0 * seg, 20.0 - seg), (40.0 + 2.0 * seg, 20.0 + seg)])
        );
    }

    #[test]
    fn north_loop_sits_above() {
        let view = View::default();
        let state = styled(&view, Direction::North, 15.0);
        let cell = vertex("a", 0.0, 0.0, 40.0, 40.0);
        let result = route(loop_style, &state, Some(&cell), Some(&cell), &[]);
        assert_eq!(result, pts(&[(5.0, -30.0), (35.0, -30.0)]));
    }

    #[test]
    fn south_loop_scales_segment() {
        let view = View {
            scale: 2.0,
            ..View::default()
        };
        let state = styled(&view, Direction::South, 10.0);
        let cell = vertex("a", 0.0, 0.0, 80.0, 80.0);
        let result = route(loop_style, &state, Some(&cell), Some(&cell), &[]);
        assert_eq!(result, pts(&[(20.0, 120.0), (60.0, 120.0)]));
    }

    #[test]
    fn hint_beside_terminal_moves_the_loop() {
        let view = View::default();
        let state = styled(&view, Direction::West, 10.0);
        let cell = vertex("a", 0.0, 0.0, 40.0, 40.0);
        let result = route(
            loop_style,
            &state,
            Some(&cell),
            Some(&cell),
            &[Point::new(-30.0, 50.0)],
        );
        assert_eq!(result, pts(&[(-30.0, -10.0), (-30.0, 50.0)]));
    }

    #[test]
    fn hint_above_terminal_flattens_the_loop() {
        let view = View::default();
        let state = styled(&view, Direction::West, 10.0);
        let cell = vertex("a", 0.0, 0.0, 40.0, 40.0);
        let result = route(
            loop_style,
            &state,
            Some(&cell),
            Some(&cell),
            &[Point::new(30.0, -25.0)],
        );
        assert_eq!(result, pts(&[(10.0, -25.0), (30.0, -25.0)]));
    }

    #[test]
    fn fixed_ends_forward_hints() {
        let view = View {
            translate: Point::new(5.0, 5.0),
            ..View::default()
        };
        let state = edge(&view)
            .with_terminal_points(Some(Point::new(0.0, 0.0)), Some(Point::new(0.0, 40.0)));
        let cell = vertex("a", 0.0, 0.0, 40.0, 40.0);
        let result = route(
            loop_style,
            &state,
            Some(&cell),
            Some(&cell),
            &[Point::new(-20.0, 0.0), Point::new(-20.0, 40.0)],
        );
        assert_eq!(result, pts(&[(-15.0, 5.0), (-15.0, 45.0)]));
    }

    #[test]
    fn missing_source_yields_nothing() {
        let view = View::default();
        let state = edge(&view);
        assert!(route(loop_style, &state, None, None, &[]).is_empty());
    }
}
