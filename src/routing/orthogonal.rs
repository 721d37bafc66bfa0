//! Jetty-based orthogonal connector.
//!
//! The route is picked from a table of move patterns indexed by the sides the
//! edge leaves the source and enters the target, rotated into the quadrant the
//! target sits in relative to the source. Each move pushes the current
//! waypoint towards a jetty limit, a terminal center, or halfway across the
//! gap between the terminals.

use crate::geometry::{Point, Rectangle, rotated_bounds, round_tenth};
use crate::state::{CellState, EdgeState};
use crate::style::{DirectionMask, JettySize, port_constraints};

use super::scaling::{scale_cell_state, scale_point_array};
use super::segment_connector;

const DEFAULT_MARKER_SIZE: f64 = 6.0;

const WEST: u32 = DirectionMask::WEST.0 as u32;
const NORTH: u32 = DirectionMask::NORTH.0 as u32;
const SOUTH: u32 = DirectionMask::SOUTH.0 as u32;
const EAST: u32 = DirectionMask::EAST.0 as u32;
const ALL: u32 = DirectionMask::ALL.0 as u32;

// Move encoding: bits 0-3 direction, 5-8 the terminal side whose jetty limit
// applies, then center, source and target flags.
const SIDE_MASK: u32 = 480;
const CENTER_MASK: u32 = 512;
const SOURCE_MASK: u32 = 1024;
const TARGET_MASK: u32 = 2048;

/// West, north, east, south, then wrapping.
const DIR_VECTORS: [[f64; 2]; 7] = [
    [-1.0, 0.0],
    [0.0, -1.0],
    [1.0, 0.0],
    [0.0, 1.0],
    [-1.0, 0.0],
    [0.0, -1.0],
    [1.0, 0.0],
];

const ROUTE_PATTERNS: [[&[u32]; 4]; 4] = [
    [
        &[513, 2308, 2081, 2562],
        &[513, 1090, 514, 2184, 2114, 2561],
        &[513, 1090, 514, 2564, 2184, 2562],
        &[513, 2308, 2561, 1090, 514, 2568, 2308],
    ],
    [
        &[514, 1057, 513, 2308, 2081, 2562],
        &[514, 2184, 2114, 2561],
        &[514, 2184, 2562, 1057, 513, 2564, 2184],
        &[514, 1057, 513, 2568, 2308, 2561],
    ],
    [
        &[1090, 514, 1057, 513, 2308, 2081, 2562],
        &[2114, 2561],
        &[1090, 2562, 1057, 513, 2564, 2184],
        &[1090, 514, 1057, 513, 2308, 2561, 2568],
    ],
    [
        &[2081, 2562],
        &[1057, 513, 1090, 514, 2184, 2114, 2561],
        &[1057, 513, 1090, 514, 2184, 2562],
        &[1057, 2561, 1090, 514, 2568, 2308],
    ],
];

const MAX_WAY_POINTS: usize = 12;

fn reverse(bits: u32) -> u32 {
    DirectionMask(bits as u8).reversed().bits() as u32
}

/// Index 1..=4 for west, north, east, south.
fn direction_index(direction: u32) -> i32 {
    if direction == EAST { 3 } else { direction as i32 }
}

fn is_horizontal(direction: u32) -> bool {
    direction & (EAST | WEST) > 0
}

/// Stand-off length before the route may turn at one end. `auto` grows with
/// the arrow marker at that end.
pub fn jetty_size(state: &EdgeState<'_>, is_source: bool) -> f64 {
    let buffer = state.view.config.orthogonal.buffer;
    let style = &state.style;
    let value = if is_source {
        style.source_jetty_size
    } else {
        style.target_jetty_size
    }
    .or(style.jetty_size)
    .unwrap_or(JettySize::Fixed(buffer));

    match value {
        JettySize::Fixed(size) => size,
        JettySize::Auto => {
            let (arrow, size) = if is_source {
                (&style.start_arrow, style.start_size)
            } else {
                (&style.end_arrow, style.end_size)
            };
            if arrow.is_some() {
                let size = size.unwrap_or(DEFAULT_MARKER_SIZE);
                ((size + buffer) / buffer).ceil().max(2.0) * buffer
            } else {
                2.0 * buffer
            }
        }
    }
}

/// Orthogonal route that keeps a jetty clear of both terminals. Hints, edge
/// terminals and fixed ends closer than the combined jetties are handed to
/// [`segment_connector`].
pub fn orth_connector(
    state: &EdgeState<'_>,
    source: Option<&CellState>,
    target: Option<&CellState>,
    hints: &[Point],
    result: &mut Vec<Point>,
) {
    let view = state.view;
    let config = &view.config.orthogonal;
    let source_edge = source.is_some_and(|s| s.cell.is_edge);
    let target_edge = target.is_some_and(|t| t.cell.is_edge);

    let pts = scale_point_array(&state.absolute_points, view.scale);
    let source_scaled = scale_cell_state(source, view.scale);
    let target_scaled = scale_cell_state(target, view.scale);
    let p0 = pts.first().copied().flatten();
    let pe = pts.last().copied().flatten();

    let mut source_buffer = jetty_size(state, true);
    let mut target_buffer = jetty_size(state, false);
    if let (Some(s), Some(t)) = (source, target) {
        if s.cell.id == t.cell.id {
            target_buffer = source_buffer.max(target_buffer);
            source_buffer = target_buffer;
        }
    }
    let total_buffer = source_buffer + target_buffer;

    let too_short = match (p0, pe) {
        (Some(p0), Some(pe)) => {
            let dx = pe.x - p0.x;
            let dy = pe.y - p0.y;
            dx * dx + dy * dy < total_buffer * total_buffer
        }
        _ => false,
    };

    if too_short || (config.points_fallback && !hints.is_empty()) || source_edge || target_edge
    {
        tracing::debug!(
            too_short,
            hints = hints.len(),
            source_edge,
            target_edge,
            "orthogonal connector falling back to segment connector"
        );
        segment_connector(state, source, target, hints, result);
        return;
    }

    let bounds_of = |scaled: &Option<CellState>, fixed: Option<Point>| -> Option<Rectangle> {
        match scaled {
            Some(term) => Some(rotated_bounds(&term.bounds(), term.style.rotation)),
            None => fixed.map(Rectangle::from_point),
        }
    };
    let (Some(source_rect), Some(target_rect)) =
        (bounds_of(&source_scaled, p0), bounds_of(&target_scaled, pe))
    else {
        return;
    };

    let port_constraint = [
        source.map_or(ALL, |s| {
            port_constraints(&s.style, &state.style, true, DirectionMask::ALL).bits() as u32
        }),
        target.map_or(ALL, |t| {
            port_constraints(&t.style, &state.style, false, DirectionMask::ALL).bits() as u32
        }),
    ];

    let rounded = |r: Rectangle| {
        [
            round_tenth(r.x),
            round_tenth(r.y),
            round_tenth(r.width),
            round_tenth(r.height),
        ]
    };
    // [source, target] x [x, y, width, height]
    let geo = [rounded(source_rect), rounded(target_rect)];
    let buffer = [source_buffer, target_buffer];

    let mut limits = [[0.0f64; 9]; 2];
    for i in 0..2 {
        limits[i][1] = geo[i][0] - buffer[i];
        limits[i][2] = geo[i][1] - buffer[i];
        limits[i][4] = geo[i][0] + geo[i][2] + buffer[i];
        limits[i][8] = geo[i][1] + geo[i][3] + buffer[i];
    }

    // Quadrant of the target around the source:
    // 0 | 1
    // -----
    // 3 | 2
    let dx = (geo[0][0] + geo[0][2] / 2.0) - (geo[1][0] + geo[1][2] / 2.0);
    let dy = (geo[0][1] + geo[0][3] / 2.0) - (geo[1][1] + geo[1][3] / 2.0);
    let quad: i32 = if dx < 0.0 {
        if dy < 0.0 { 2 } else { 1 }
    } else if dy <= 0.0 {
        if dx == 0.0 { 2 } else { 3 }
    } else {
        0
    };

    // Fixed connection points pin the side they sit on.
    let mut dir = [0u32; 2];
    let mut constraint = [[0.5f64; 2]; 2];
    let fixed = [source.and(p0), target.and(pe)];
    for i in 0..2 {
        let Some(term) = fixed[i] else {
            continue;
        };
        if geo[i][2] > 0.0 {
            constraint[i][0] = (term.x - geo[i][0]) / geo[i][2];
        }
        if (term.x - geo[i][0]).abs() <= 1.0 {
            dir[i] = WEST;
        } else if (term.x - geo[i][0] - geo[i][2]).abs() <= 1.0 {
            dir[i] = EAST;
        }
        if geo[i][3] > 0.0 {
            constraint[i][1] = (term.y - geo[i][1]) / geo[i][3];
        }
        if (term.y - geo[i][1]).abs() <= 1.0 {
            dir[i] = NORTH;
        } else if (term.y - geo[i][1] - geo[i][3]).abs() <= 1.0 {
            dir[i] = SOUTH;
        }
    }

    let source_top_dist = geo[0][1] - (geo[1][1] + geo[1][3]);
    let source_left_dist = geo[0][0] - (geo[1][0] + geo[1][2]);
    let source_bottom_dist = geo[1][1] - (geo[0][1] + geo[0][3]);
    let source_right_dist = geo[1][0] - (geo[0][0] + geo[0][2]);

    // Indexed by direction index: west, north, east, south.
    let mut vertex_separations = [0.0f64; 5];
    vertex_separations[1] = (source_left_dist - total_buffer).max(0.0);
    vertex_separations[2] = (source_top_dist - total_buffer).max(0.0);
    vertex_separations[4] = (source_bottom_dist - total_buffer).max(0.0);
    vertex_separations[3] = (source_right_dist - total_buffer).max(0.0);

    let mut hor_pref = [0u32; 2];
    let mut vert_pref = [0u32; 2];
    hor_pref[0] = if source_left_dist >= source_right_dist { WEST } else { EAST };
    vert_pref[0] = if source_top_dist >= source_bottom_dist { NORTH } else { SOUTH };
    hor_pref[1] = reverse(hor_pref[0]);
    vert_pref[1] = reverse(vert_pref[0]);

    let preferred_horiz_dist = source_left_dist.max(source_right_dist);
    let preferred_vert_dist = source_top_dist.max(source_bottom_dist);

    let mut pref_ordering = [[0u32; 2]; 2];
    let mut preferred_order_set = false;

    for i in 0..2 {
        if dir[i] != 0 {
            continue;
        }
        if hor_pref[i] & port_constraint[i] == 0 {
            hor_pref[i] = reverse(hor_pref[i]);
        }
        if vert_pref[i] & port_constraint[i] == 0 {
            vert_pref[i] = reverse(vert_pref[i]);
        }
        pref_ordering[i] = [vert_pref[i], hor_pref[i]];
    }

    if preferred_vert_dist > 0.0 && preferred_horiz_dist > 0.0 {
        // Two segments may do.
        if hor_pref[0] & port_constraint[0] > 0 && vert_pref[1] & port_constraint[1] > 0 {
            pref_ordering = [[hor_pref[0], vert_pref[0]], [vert_pref[1], hor_pref[1]]];
            preferred_order_set = true;
        } else if vert_pref[0] & port_constraint[0] > 0 && hor_pref[1] & port_constraint[1] > 0 {
            pref_ordering = [[vert_pref[0], hor_pref[0]], [hor_pref[1], vert_pref[1]]];
            preferred_order_set = true;
        }
    }
    if preferred_vert_dist > 0.0 && !preferred_order_set {
        pref_ordering = [[vert_pref[0], hor_pref[0]], [vert_pref[1], hor_pref[1]]];
        preferred_order_set = true;
    }
    if preferred_horiz_dist > 0.0 && !preferred_order_set {
        pref_ordering = [[hor_pref[0], vert_pref[0]], [hor_pref[1], vert_pref[1]]];
    }

    // Pack the ordered candidates into nibbles and squeeze out gaps.
    for i in 0..2 {
        if dir[i] != 0 {
            continue;
        }
        if pref_ordering[i][0] & port_constraint[i] == 0 {
            pref_ordering[i][0] = pref_ordering[i][1];
        }
        let mut dir_pref = pref_ordering[i][0] & port_constraint[i];
        dir_pref |= (pref_ordering[i][1] & port_constraint[i]) << 8;
        dir_pref |= (pref_ordering[1 - i][i] & port_constraint[i]) << 16;
        dir_pref |= (pref_ordering[1 - i][1 - i] & port_constraint[i]) << 24;

        if dir_pref & 0xF == 0 {
            dir_pref <<= 8;
        }
        if dir_pref & 0xF00 == 0 {
            dir_pref = (dir_pref & 0xF) | (dir_pref >> 8);
        }
        if dir_pref & 0xF0000 == 0 {
            dir_pref = (dir_pref & 0xFFFF) | ((dir_pref & 0xF00_0000) >> 8);
        }

        dir[i] = dir_pref & 0xF;
        if matches!(port_constraint[i], WEST | NORTH | EAST | SOUTH) {
            dir[i] = port_constraint[i];
        }
    }

    let mut source_index = direction_index(dir[0]) - quad;
    let mut target_index = direction_index(dir[1]) - quad;
    if source_index < 1 {
        source_index += 4;
    }
    if target_index < 1 {
        target_index += 4;
    }
    let Some(&route_pattern) = ROUTE_PATTERNS
        .get((source_index - 1) as usize)
        .and_then(|row| row.get((target_index - 1) as usize))
    else {
        return;
    };

    let (sx, sy, sw, sh) = (geo[0][0], geo[0][1], geo[0][2], geo[0][3]);
    let mut way_points = [[0.0f64; 2]; MAX_WAY_POINTS];
    way_points[0] = match dir[0] {
        WEST => [sx, sy + constraint[0][1] * sh],
        SOUTH => [sx + constraint[0][0] * sw, sy + sh],
        EAST => [sx + sw, sy + constraint[0][1] * sh],
        NORTH => [sx + constraint[0][0] * sw, sy],
        _ => [sx, sy],
    };

    let mut current_index = 0usize;
    // 0 horizontal, 1 vertical
    let initial_orientation = if is_horizontal(dir[0]) { 0 } else { 1 };
    let mut last_orientation = initial_orientation;

    for &step in route_pattern {
        let mut index = direction_index(step & 0xF) + quad;
        if index > 4 {
            index -= 4;
        }
        let direction = DIR_VECTORS[(index - 1) as usize];
        let orientation = if index % 2 > 0 { 0 } else { 1 };

        // Only a change of direction starts a new waypoint.
        if orientation != last_orientation && current_index + 1 < MAX_WAY_POINTS {
            current_index += 1;
            way_points[current_index] = way_points[current_index - 1];
        }

        let tar = step & TARGET_MASK > 0;
        let sou = step & SOURCE_MASK > 0;
        let mut side = (step & SIDE_MASK) >> 5;
        side <<= quad;
        if side > 0xF {
            side >>= 4;
        }
        let center = step & CENTER_MASK > 0;

        if (sou || tar) && side < 9 {
            let term = if sou { 0 } else { 1 };
            let limit = if center && orientation == 0 {
                geo[term][0] + constraint[term][0] * geo[term][2]
            } else if center {
                geo[term][1] + constraint[term][1] * geo[term][3]
            } else {
                limits[term][side as usize]
            };
            let axis = orientation;
            let delta = (limit - way_points[current_index][axis]) * direction[axis];
            if delta > 0.0 {
                way_points[current_index][axis] += direction[axis] * delta;
            }
        } else if center {
            let half_gap = (vertex_separations[index as usize] / 2.0).abs();
            way_points[current_index][0] += direction[0] * half_gap;
            way_points[current_index][1] += direction[1] * half_gap;
        }

        if current_index > 0
            && way_points[current_index][orientation] == way_points[current_index - 1][orientation]
        {
            current_index -= 1;
        } else {
            last_orientation = orientation;
        }
    }

    let start = result.len();
    for (i, wp) in way_points.iter().enumerate().take(current_index + 1) {
        if i == current_index {
            // Same orientation at both ends needs an even number of bends,
            // different orientations an odd one.
            let target_orientation = if is_horizontal(dir[1]) { 0 } else { 1 };
            let same_orient = if target_orientation == initial_orientation { 0 } else { 1 };
            if same_orient != (current_index + 1) % 2 {
                break;
            }
        }
        result.push(Point::new(
            round_tenth(wp[0] * view.scale),
            round_tenth(wp[1] * view.scale),
        ));
    }

    let mut index = start + 1;
    while index < result.len() {
        if result[index - 1] == result[index] {
            result.remove(index);
        } else {
            index += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::test_support::{edge, pts, route, vertex};
    use crate::style::Style;
    use crate::view::View;

    fn styled<'a>(view: &'a View, style: &str) -> EdgeState<'a> {
        EdgeState::new(view, Style::parse(style).unwrap())
    }

    #[test]
    fn jetty_defaults_to_buffer() {
        let view = View::default();
        let state = edge(&view);
        assert_eq!(jetty_size(&state, true), 10.0);
        assert_eq!(jetty_size(&state, false), 10.0);
    }

    #[test]
    fn jetty_prefers_end_specific_value() {
        let view = View::default();
        let state = styled(&view, "jettySize=15;targetJettySize=25");
        assert_eq!(jetty_size(&state, true), 15.0);
        assert_eq!(jetty_size(&state, false), 25.0);
    }

    #[test]
    fn auto_jetty_grows_with_marker() {
        let view = View::default();
        let state = styled(&view, "jettySize=auto;endArrow=classic;endSize=25");
        assert_eq!(jetty_size(&state, true), 20.0);
        assert_eq!(jetty_size(&state, false), 40.0);

        let state = styled(&view, "jettySize=auto;startArrow=block");
        assert_eq!(jetty_size(&state, true), 20.0);
    }

    #[test]
    fn aligned_terminals_route_straight() {
        let view = View::default();
        let state = edge(&view);
        let source = vertex("a", 0.0, 0.0, 40.0, 40.0);
        let target = vertex("b", 200.0, 0.0, 40.0, 40.0);
        let result = route(orth_connector, &state, Some(&source), Some(&target), &[]);
        assert!(result.is_empty(), "{result:?}");
    }

    #[test]
    fn diagonal_terminals_take_one_bend() {
        let view = View::default();
        let state = edge(&view);
        let source = vertex("a", 0.0, 0.0, 40.0, 40.0);
        let target = vertex("b", 200.0, 100.0, 40.0, 40.0);
        let result = route(orth_connector, &state, Some(&source), Some(&target), &[]);
        assert_eq!(result, pts(&[(220.0, 20.0)]));
    }

    #[test]
    fn routes_are_axis_aligned_in_every_quadrant() {
        let view = View::default();
        let state = edge(&view);
        let source = vertex("a", 200.0, 200.0, 40.0, 40.0);
        for (x, y) in [
            (0.0, 0.0),
            (400.0, 0.0),
            (400.0, 400.0),
            (0.0, 400.0),
            (210.0, 0.0),
            (0.0, 210.0),
        ] {
            let target = vertex("b", x, y, 40.0, 40.0);
            let bends = route(orth_connector, &state, Some(&source), Some(&target), &[]);
            let mut path = vec![Point::new(220.0, 220.0)];
            path.extend(bends.iter().copied());
            for pair in path.windows(2) {
                assert!(
                    pair[0].x == pair[1].x || pair[0].y == pair[1].y,
                    "diagonal step {pair:?} towards ({x}, {y})"
                );
            }
        }
    }

    #[test]
    fn port_constraint_forces_exit_side() {
        let view = View::default();
        let source = vertex("a", 0.0, 100.0, 40.0, 40.0);
        let target = vertex("b", 200.0, 0.0, 40.0, 40.0);

        let free = edge(&view);
        let result = route(orth_connector, &free, Some(&source), Some(&target), &[]);
        assert_eq!(result, pts(&[(220.0, 120.0)]));

        let north = styled(&view, "sourcePortConstraint=north");
        let result = route(orth_connector, &north, Some(&source), Some(&target), &[]);
        assert_eq!(result, pts(&[(20.0, 20.0)]));
    }

    #[test]
    fn hints_fall_back_to_segment_connector() {
        let view = View::default();
        let state = edge(&view);
        let source = vertex("a", 0.0, 0.0, 40.0, 40.0);
        let target = vertex("b", 200.0, 100.0, 40.0, 40.0);
        let hints = [Point::new(100.0, 60.0)];
        let orth = route(orth_connector, &state, Some(&source), Some(&target), &hints);
        let segment = route(segment_connector, &state, Some(&source), Some(&target), &hints);
        assert_eq!(orth, segment);
    }

    #[test]
    fn close_fixed_ends_fall_back() {
        let view = View::default();
        let state = edge(&view)
            .with_terminal_points(Some(Point::new(40.0, 20.0)), Some(Point::new(50.0, 25.0)));
        let source = vertex("a", 0.0, 0.0, 40.0, 40.0);
        let target = vertex("b", 50.0, 0.0, 40.0, 40.0);
        let orth = route(orth_connector, &state, Some(&source), Some(&target), &[]);
        let segment = route(segment_connector, &state, Some(&source), Some(&target), &[]);
        assert_eq!(orth, segment);
    }
}
