//! Scale/translate context the routers run in, and the per-edge pipeline that
//! turns terminals, style and bend hints into a finished point list.

use crate::config::RoutingConfig;
use crate::error::Error;
use crate::geometry::{Point, Rectangle, rotated_point};
use crate::perimeter::PerimeterKind;
use crate::points::simplify;
use crate::registry::EdgeStyleRegistry;
use crate::routing::EdgeStyleFn;
use crate::routing::scaling::unscale;
use crate::state::{CellRef, CellState, EdgeState};
use crate::style::Style;

const SIMPLIFY_TOLERANCE: f64 = 0.5;
const LOOP_STYLE_NAME: &str = "loopEdgeStyle";

#[derive(Debug, Clone, PartialEq)]
pub struct View {
    pub scale: f64,
    pub translate: Point,
    pub grid_size: f64,
    pub config: RoutingConfig,
    /// Merge near-duplicate points and drop redundant bends after routing.
    pub simplify: bool,
}

impl Default for View {
    fn default() -> Self {
        Self {
            scale: 1.0,
            translate: Point::default(),
            grid_size: 10.0,
            config: RoutingConfig::default(),
            simplify: false,
        }
    }
}

impl View {
    pub fn new(config: RoutingConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn routing_center_x(&self, state: &CellState) -> f64 {
        state.center_x() + state.style.routing_center_x * state.width
    }

    pub fn routing_center_y(&self, state: &CellState) -> f64 {
        state.center_y() + state.style.routing_center_y * state.height
    }

    /// Maps a bend hint from model space into view space:
    /// `s * (point + translate + origin)`, with `s = 1` when `ignore_scale`.
    pub fn transform_control_point(
        &self,
        state: &EdgeState<'_>,
        point: Point,
        ignore_scale: bool,
    ) -> Point {
        let scale = if ignore_scale { 1.0 } else { self.scale };
        Point::new(
            scale * (point.x + self.translate.x + state.origin.x),
            scale * (point.y + self.translate.y + state.origin.y),
        )
    }

    pub fn to_view(&self, point: Point) -> Point {
        Point::new(
            (point.x + self.translate.x) * self.scale,
            (point.y + self.translate.y) * self.scale,
        )
    }

    /// Inverse of [`View::to_view`], rounded to one decimal place.
    pub fn to_model(&self, point: Point) -> Point {
        Point::new(
            unscale(point.x, self.scale) - self.translate.x,
            unscale(point.y, self.scale) - self.translate.y,
        )
    }

    pub fn to_view_bounds(&self, bounds: &Rectangle) -> Rectangle {
        let origin = self.to_view(Point::new(bounds.x, bounds.y));
        Rectangle::new(
            origin.x,
            origin.y,
            bounds.width * self.scale,
            bounds.height * self.scale,
        )
    }

    /// View-space state for a vertex given its model bounds.
    pub fn cell_state(&self, cell: CellRef, bounds: &Rectangle, style: Style) -> CellState {
        CellState::new(cell, self.to_view_bounds(bounds), style)
    }

    /// Where a connector aimed at `next` meets the outline of `terminal`,
    /// with the outline pushed out by `spacing` (unscaled). Rotated shapes are
    /// intersected in their own frame.
    pub fn perimeter_point(
        &self,
        terminal: &CellState,
        next: Point,
        orthogonal: bool,
        spacing: f64,
    ) -> Point {
        let kind = terminal.style.perimeter.unwrap_or(PerimeterKind::Rectangle);
        let bounds = terminal.bounds().grow(spacing * self.scale);
        let rotation = terminal.style.rotation;
        if rotation == 0.0 {
            return kind.apply(&bounds, Some(&terminal.style), next, orthogonal);
        }
        let center = bounds.center();
        let (sin, cos) = rotation.to_radians().sin_cos();
        let local_next = rotated_point(next, cos, -sin, center);
        let local = kind.apply(&bounds, Some(&terminal.style), local_next, orthogonal);
        rotated_point(local, cos, sin, center)
    }

    /// Fixed connection point from the edge's `exitX/exitY` (or
    /// `entryX/entryY`) relative to the terminal bounds.
    fn connection_point(&self, edge: &Style, terminal: &CellState, source: bool) -> Option<Point> {
        let (fx, fy) = if source {
            (edge.exit_x?, edge.exit_y?)
        } else {
            (edge.entry_x?, edge.entry_y?)
        };
        Some(Point::new(
            terminal.x + fx * terminal.width,
            terminal.y + fy * terminal.height,
        ))
    }

    fn resolve_router(
        &self,
        edge: &EdgeState<'_>,
        source: Option<&CellState>,
        target: Option<&CellState>,
        registry: &EdgeStyleRegistry,
    ) -> Option<EdgeStyleFn> {
        let is_loop = match (source, target) {
            (Some(source), Some(target)) => source.cell.id == target.cell.id,
            _ => false,
        };
        let resolved = if is_loop {
            match &edge.style.loop_style {
                Some(loop_style) => loop_style.resolve(registry),
                None => registry
                    .get(LOOP_STYLE_NAME)
                    .ok_or_else(|| Error::UnknownEdgeStyle(LOOP_STYLE_NAME.to_string())),
            }
        } else {
            edge.style.edge_style.as_ref()?.resolve(registry)
        };
        match resolved {
            Ok(router) => Some(router),
            Err(err) => {
                tracing::debug!(%err, is_loop, "routing straight");
                None
            }
        }
    }

    /// Routes one edge: resolves fixed terminal points, runs the edge style
    /// and projects floating ends onto their terminal outlines. Returns the
    /// full polyline in view coordinates, terminal points included.
    pub fn route_edge(
        &self,
        edge: &EdgeState<'_>,
        source: Option<&CellState>,
        target: Option<&CellState>,
        hints: &[Point],
        registry: &EdgeStyleRegistry,
    ) -> Vec<Point> {
        let style = &edge.style;
        let p0 = match source {
            Some(term) => self.connection_point(style, term, true),
            None => edge.first_point(),
        };
        let pe = match target {
            Some(term) => self.connection_point(style, term, false),
            None => edge.last_point(),
        };
        let state = edge.clone().with_terminal_points(p0, pe);

        let router = self.resolve_router(&state, source, target, registry);
        let mut waypoints = Vec::new();
        match router {
            Some(router) => router(&state, source, target, hints, &mut waypoints),
            None => waypoints.extend(
                hints
                    .iter()
                    .map(|hint| self.transform_control_point(&state, *hint, false)),
            ),
        }

        let orthogonal = style
            .orthogonal
            .unwrap_or_else(|| router.is_some_and(|router| registry.is_orthogonal(router)));
        let center =
            |term: &CellState| Point::new(self.routing_center_x(term), self.routing_center_y(term));

        let pe = pe.or_else(|| {
            let term = target?;
            let next = waypoints
                .last()
                .copied()
                .or(p0)
                .or_else(|| source.map(center))?;
            let spacing = term.style.perimeter_spacing + style.target_perimeter_spacing;
            Some(self.perimeter_point(term, next, orthogonal, spacing))
        });
        let p0 = p0.or_else(|| {
            let term = source?;
            let next = waypoints
                .first()
                .copied()
                .or(pe)
                .or_else(|| target.map(center))?;
            let spacing = term.style.perimeter_spacing + style.source_perimeter_spacing;
            Some(self.perimeter_point(term, next, orthogonal, spacing))
        });

        let mut points = Vec::with_capacity(waypoints.len() + 2);
        points.extend(p0);
        points.extend(waypoints);
        points.extend(pe);
        if self.simplify {
            points = simplify(&points, SIMPLIFY_TOLERANCE);
        }
        tracing::trace!(points = points.len(), orthogonal, "edge routed");
        points
    }
}
