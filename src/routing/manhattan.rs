//! Grid-stepped obstacle-avoiding router.
//!
//! The grid is anchored on the source (its routing center, or the fixed
//! source point) with cells `step` apart. Search starts one jetty outside each
//! allowed source side and ends on the grid node nearest the approach point
//! of an allowed target side; the last leg is squared off towards the target
//! anchor. Every heap pop counts against `max_loops`.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use crate::geometry::{Point, Rectangle, round_half_up};
use crate::points::simplify;
use crate::state::{CellState, EdgeState};
use crate::style::Side;

const COST_SCALE: f64 = 1000.0;
const REGION_MARGIN_STEPS: f64 = 3.0;
const DIRS: [(i32, i32); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
struct GridState {
    x: i32,
    y: i32,
    dir: u8,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct GridEntry {
    est: u32,
    cost: u32,
    state: GridState,
}

impl Ord for GridEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .est
            .cmp(&self.est)
            .then_with(|| self.cost.cmp(&other.cost))
            .then_with(|| other.state.y.cmp(&self.state.y))
            .then_with(|| other.state.x.cmp(&self.state.x))
            .then_with(|| other.state.dir.cmp(&self.state.dir))
    }
}

impl PartialOrd for GridEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

struct Grid {
    origin: Point,
    step: f64,
}

impl Grid {
    fn point(&self, x: i32, y: i32) -> Point {
        Point::new(
            self.origin.x + x as f64 * self.step,
            self.origin.y + y as f64 * self.step,
        )
    }

    fn snap(&self, point: Point) -> (i32, i32) {
        (
            round_half_up((point.x - self.origin.x) / self.step) as i32,
            round_half_up((point.y - self.origin.y) / self.step) as i32,
        )
    }
}

#[derive(Clone, Copy, Debug)]
struct EndNode {
    x: i32,
    y: i32,
    side: Side,
    anchor: Point,
}

fn dir_of(side: Side) -> u8 {
    match side {
        Side::Top => 0,
        Side::Right => 1,
        Side::Bottom => 2,
        Side::Left => 3,
    }
}

fn side_of(dir: u8) -> Side {
    match dir {
        0 => Side::Top,
        1 => Side::Right,
        2 => Side::Bottom,
        _ => Side::Left,
    }
}

fn turn_angle(from: u8, to: u8) -> f64 {
    match (from as i32 - to as i32).rem_euclid(4) {
        0 => 0.0,
        2 => 180.0,
        _ => 90.0,
    }
}

fn side_anchor(rect: &Rectangle, side: Side) -> Point {
    match side {
        Side::Top => Point::new(rect.center_x(), rect.y),
        Side::Right => Point::new(rect.right(), rect.center_y()),
        Side::Bottom => Point::new(rect.center_x(), rect.bottom()),
        Side::Left => Point::new(rect.x, rect.center_y()),
    }
}

fn half_extent(rect: &Rectangle, side: Side) -> f64 {
    if side.is_horizontal() {
        rect.width / 2.0
    } else {
        rect.height / 2.0
    }
}

/// Whether the axis-aligned segment `a-b` enters the interior of `rect`.
fn segment_blocked(a: Point, b: Point, rect: &Rectangle) -> bool {
    a.x.min(b.x) < rect.right()
        && a.x.max(b.x) > rect.x
        && a.y.min(b.y) < rect.bottom()
        && a.y.max(b.y) > rect.y
}

/// Single elbow between the terminal centers, skipped when the corner would
/// sit inside either terminal.
fn fallback_route(
    source: &Rectangle,
    target: &Rectangle,
    start: Point,
    end: Point,
    result: &mut Vec<Point>,
) {
    if start.x == end.x || start.y == end.y {
        return;
    }
    for corner in [Point::new(end.x, start.y), Point::new(start.x, end.y)] {
        if !source.contains(corner.x, corner.y) && !target.contains(corner.x, corner.y) {
            result.push(corner.round_tenth());
            return;
        }
    }
}

pub fn manhattan_connector(
    state: &EdgeState<'_>,
    source: Option<&CellState>,
    target: Option<&CellState>,
    _hints: &[Point],
    result: &mut Vec<Point>,
) {
    let view = state.view;
    let config = &view.config.manhattan;
    let p0 = state.first_point();
    let pe = state.last_point();

    let terminal_rect = |fixed: Option<Point>, term: Option<&CellState>| match (fixed, term) {
        (_, Some(term)) => Some(term.bounds()),
        (Some(point), None) => Some(Rectangle::from_point(point)),
        (None, None) => None,
    };
    let (Some(source_rect), Some(target_rect)) =
        (terminal_rect(p0, source), terminal_rect(pe, target))
    else {
        return;
    };

    let start = p0.unwrap_or_else(|| match source {
        Some(term) => Point::new(view.routing_center_x(term), view.routing_center_y(term)),
        None => source_rect.center(),
    });
    let end = pe.unwrap_or_else(|| match target {
        Some(term) => Point::new(view.routing_center_x(term), view.routing_center_y(term)),
        None => target_rect.center(),
    });

    let step = config.step * view.scale;
    if step.is_nan() || step <= 0.0 {
        fallback_route(&source_rect, &target_rect, start, end, result);
        return;
    }
    let padding = config.padding * view.scale;
    let grid = Grid {
        origin: start,
        step,
    };

    let mut obstacles: Vec<Rectangle> = Vec::with_capacity(state.obstacles.len() + 2);
    if source.is_some() {
        obstacles.push(source_rect.grow(padding));
    }
    if target.is_some() {
        obstacles.push(target_rect.grow(padding));
    }
    obstacles.extend(state.obstacles.iter().map(|rect| rect.grow(padding)));
    let blocked = |point: Point| {
        obstacles
            .iter()
            .any(|rect| rect.contains_strictly(point.x, point.y))
    };

    let mut region = source_rect.union(&target_rect);
    for rect in &obstacles {
        region = region.union(rect);
    }
    let region = region.grow(REGION_MARGIN_STEPS * step + padding);

    // Jetty length, in grid steps, that clears a terminal and its padding.
    let jetty_steps = |rect: &Rectangle, side: Side, fixed: bool| -> i32 {
        let half = if fixed { 0.0 } else { half_extent(rect, side) };
        ((half + padding) / step).floor() as i32 + 1
    };

    let mut heap = BinaryHeap::new();
    let mut best_cost: HashMap<GridState, u32> = HashMap::new();
    let mut prev: HashMap<GridState, GridState> = HashMap::new();

    for &side in &config.start_directions {
        let (ox, oy) = side.outward();
        let k = jetty_steps(&source_rect, side, p0.is_some());
        let (x, y) = if p0.is_some() {
            (ox * k, oy * k)
        } else {
            let (cx, cy) = grid.snap(side_anchor(&source_rect, side));
            if side.is_horizontal() { (ox * k, cy) } else { (cx, oy * k) }
        };
        if blocked(grid.point(x, y)) {
            continue;
        }
        let seed = GridState {
            x,
            y,
            dir: dir_of(side),
        };
        if best_cost.contains_key(&seed) {
            continue;
        }
        best_cost.insert(seed, 0);
        heap.push(GridEntry {
            est: 0,
            cost: 0,
            state: seed,
        });
    }

    let mut ends: Vec<EndNode> = Vec::with_capacity(config.end_directions.len());
    for &side in &config.end_directions {
        let anchor = pe.unwrap_or_else(|| side_anchor(&target_rect, side));
        let (ox, oy) = side.outward();
        let reach = step + padding;
        let approach = Point::new(anchor.x + ox as f64 * reach, anchor.y + oy as f64 * reach);
        let (x, y) = grid.snap(approach);
        let node = grid.point(x, y);
        if target.is_some() && target_rect.contains_strictly(node.x, node.y) {
            continue;
        }
        ends.push(EndNode { x, y, side, anchor });
    }

    let step_cost = COST_SCALE as u32;
    let turn_penalty = (config.turn_cost() / config.step.max(f64::EPSILON) * COST_SCALE)
        .round()
        .max(0.0) as u32;
    let heuristic = |x: i32, y: i32| -> u32 {
        ends.iter()
            .map(|end| (x - end.x).unsigned_abs() + (y - end.y).unsigned_abs())
            .min()
            .unwrap_or(0)
            .saturating_mul(step_cost)
    };
    let arrival = |state: &GridState| -> Option<EndNode> {
        ends.iter().copied().find(|end| {
            end.x == state.x
                && end.y == state.y
                && turn_angle(state.dir, (dir_of(end.side) + 2) % 4)
                    <= config.max_allowed_direction_change
        })
    };
    let is_end = |x: i32, y: i32| ends.iter().any(|end| end.x == x && end.y == y);

    let mut goal: Option<(GridState, EndNode)> = None;
    let mut loops = 0usize;
    let mut exhausted = false;

    while let Some(entry) = heap.pop() {
        let GridEntry { cost, state: node, .. } = entry;
        if best_cost.get(&node).is_some_and(|best| *best != cost) {
            continue;
        }
        loops += 1;
        if loops > config.max_loops {
            exhausted = true;
            break;
        }
        if let Some(end) = arrival(&node) {
            goal = Some((node, end));
            break;
        }
        let here = grid.point(node.x, node.y);
        for (dir_idx, (dx, dy)) in DIRS.iter().enumerate() {
            let dir = dir_idx as u8;
            if turn_angle(node.dir, dir) > config.max_allowed_direction_change {
                continue;
            }
            let (nx, ny) = (node.x + dx, node.y + dy);
            let next_point = grid.point(nx, ny);
            if !region.contains(next_point.x, next_point.y) {
                continue;
            }
            if !is_end(nx, ny)
                && (blocked(next_point)
                    || obstacles
                        .iter()
                        .any(|rect| segment_blocked(here, next_point, rect)))
            {
                continue;
            }
            let mut next_cost = cost.saturating_add(step_cost);
            if node.dir != dir {
                next_cost = next_cost.saturating_add(turn_penalty);
            }
            let next = GridState {
                x: nx,
                y: ny,
                dir,
            };
            if best_cost.get(&next).is_some_and(|best| next_cost >= *best) {
                continue;
            }
            best_cost.insert(next, next_cost);
            prev.insert(next, node);
            heap.push(GridEntry {
                est: next_cost.saturating_add(heuristic(nx, ny)),
                cost: next_cost,
                state: next,
            });
        }
    }

    let Some((goal, end)) = goal else {
        tracing::debug!(
            loops,
            exhausted,
            max_loops = config.max_loops,
            "manhattan search gave up, using fallback route"
        );
        fallback_route(&source_rect, &target_rect, start, end, result);
        return;
    };

    let mut cells = vec![goal];
    let mut cur = goal;
    while let Some(&parent) = prev.get(&cur) {
        cells.push(parent);
        cur = parent;
    }
    cells.reverse();

    let start_side = side_of(cells[0].dir);
    let start_anchor = p0.unwrap_or_else(|| side_anchor(&source_rect, start_side));
    let mut path: Vec<Point> = Vec::with_capacity(cells.len() + 4);
    path.push(start_anchor);
    if let Some(first) = cells.first() {
        let first_point = grid.point(first.x, first.y);
        if start_side.is_horizontal() {
            path.push(Point::new(first_point.x, start_anchor.y));
        } else {
            path.push(Point::new(start_anchor.x, first_point.y));
        }
    }
    path.extend(cells.iter().map(|cell| grid.point(cell.x, cell.y)));
    let last_point = grid.point(goal.x, goal.y);
    if end.side.is_horizontal() {
        path.push(Point::new(last_point.x, end.anchor.y));
    } else {
        path.push(Point::new(end.anchor.x, last_point.y));
    }
    path.push(end.anchor);

    let path = simplify(&path, f64::EPSILON);
    if path.len() > 2 {
        result.extend(path[1..path.len() - 1].iter().map(|p| p.round_tenth()));
    }
    tracing::trace!(loops, bends = path.len().saturating_sub(2), "manhattan route found");
}
