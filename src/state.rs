use crate::geometry::{Point, Rectangle};
use crate::style::Style;
use crate::view::View;

/// Identity of the cell behind a state.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CellRef {
    pub id: String,
    pub is_edge: bool,
    /// Offset as a fraction of the parent bounds, for cells placed relative
    /// to their parent (ports on a table row, for instance).
    pub relative: Option<Point>,
}

impl CellRef {
    pub fn vertex(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            is_edge: false,
            relative: None,
        }
    }
}

/// Resolved, scaled bounds and style of a terminal at render time.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CellState {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub style: Style,
    pub cell: CellRef,
}

impl CellState {
    pub fn new(cell: CellRef, bounds: Rectangle, style: Style) -> Self {
        Self {
            x: bounds.x,
            y: bounds.y,
            width: bounds.width,
            height: bounds.height,
            style,
            cell,
        }
    }

    /// Zero-sized stand-in for a fixed connection point.
    pub fn at_point(point: Point) -> Self {
        Self {
            x: point.x,
            y: point.y,
            ..Self::default()
        }
    }

    pub fn bounds(&self) -> Rectangle {
        Rectangle::new(self.x, self.y, self.width, self.height)
    }

    pub fn center_x(&self) -> f64 {
        self.x + self.width / 2.0
    }

    pub fn center_y(&self) -> f64 {
        self.y + self.height / 2.0
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.bounds().contains(x, y)
    }
}

/// Resolved state of an edge. Routers read it and never mutate it.
#[derive(Debug, Clone)]
pub struct EdgeState<'v> {
    pub view: &'v View,
    /// Previously resolved path. The first and last entries are the fixed
    /// terminal points, `None` when that end floats on a perimeter.
    pub absolute_points: Vec<Option<Point>>,
    pub style: Style,
    /// Absolute origin of the edge's parent, added to relative hints.
    pub origin: Point,
    /// Shapes the Manhattan router steers around, in view coordinates.
    pub obstacles: Vec<Rectangle>,
}

impl<'v> EdgeState<'v> {
    pub fn new(view: &'v View, style: Style) -> Self {
        Self {
            view,
            absolute_points: vec![None, None],
            style,
            origin: Point::default(),
            obstacles: Vec::new(),
        }
    }

    pub fn with_terminal_points(mut self, source: Option<Point>, target: Option<Point>) -> Self {
        self.absolute_points = vec![source, target];
        self
    }

    pub fn first_point(&self) -> Option<Point> {
        self.absolute_points.first().copied().flatten()
    }

    pub fn last_point(&self) -> Option<Point> {
        self.absolute_points.last().copied().flatten()
    }
}
