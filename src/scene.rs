//! JSON scene model: vertices and edges in model coordinates, routed in one
//! pass through [`View::route_edge`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::config::RoutingConfig;
use crate::error::{Error, Result};
use crate::geometry::{Point, Rectangle};
use crate::perimeter::PerimeterKind;
use crate::registry::{EdgeStyleRegistry, RouterRef};
use crate::state::{CellRef, CellState, EdgeState};
use crate::style::{Direction, Style};
use crate::view::View;

const SCENE_MARGIN: f64 = 20.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewSettings {
    pub scale: f64,
    pub translate: [f64; 2],
    pub grid_size: f64,
    pub simplify: bool,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            scale: 1.0,
            translate: [0.0, 0.0],
            grid_size: 10.0,
            simplify: false,
        }
    }
}

/// A style given either as `key=value;...` text or as a JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StyleSpec {
    Text(String),
    Object(Style),
}

impl Default for StyleSpec {
    fn default() -> Self {
        StyleSpec::Text(String::new())
    }
}

impl StyleSpec {
    pub fn resolve(&self) -> Result<Style> {
        match self {
            StyleSpec::Text(text) => Style::parse(text),
            StyleSpec::Object(style) => Ok(style.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VertexSpec {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub style: StyleSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeSpec {
    pub id: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub source_point: Option<[f64; 2]>,
    #[serde(default)]
    pub target_point: Option<[f64; 2]>,
    /// Bend hints in model coordinates.
    #[serde(default)]
    pub points: Vec<[f64; 2]>,
    #[serde(default)]
    pub style: StyleSpec,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Scene {
    pub view: ViewSettings,
    pub vertices: Vec<VertexSpec>,
    pub edges: Vec<EdgeSpec>,
}

impl Scene {
    pub fn from_json(input: &str) -> Result<Self> {
        Ok(serde_json::from_str(input)?)
    }

    pub fn view(&self, config: &RoutingConfig) -> View {
        View {
            scale: self.view.scale,
            translate: point(self.view.translate),
            grid_size: self.view.grid_size,
            config: config.clone(),
            simplify: self.view.simplify,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutedVertex {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub perimeter: PerimeterKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    pub rotation: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutedEdge {
    pub id: String,
    pub source: Option<String>,
    pub target: Option<String>,
    pub edge_style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_arrow: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_arrow: Option<String>,
    pub points: Vec<[f64; 2]>,
}

/// Routed scene in view coordinates.
#[derive(Debug, Clone, Serialize)]
pub struct RoutedScene {
    pub width: f64,
    pub height: f64,
    pub vertices: Vec<RoutedVertex>,
    pub edges: Vec<RoutedEdge>,
}

impl RoutedScene {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn point(raw: [f64; 2]) -> Point {
    Point::new(raw[0], raw[1])
}

fn style_name(router: &RouterRef, registry: &EdgeStyleRegistry) -> Option<String> {
    match router {
        RouterRef::Named(name) => Some(name.clone()),
        RouterRef::Direct(router) => registry.get_name(*router).map(str::to_string),
    }
}

/// Routes every edge of `scene`. Vertices that are not an edge's terminals
/// become obstacles for that edge.
pub fn route_scene(
    scene: &Scene,
    registry: &EdgeStyleRegistry,
    config: &RoutingConfig,
) -> Result<RoutedScene> {
    let view = scene.view(config);

    let mut states: Vec<CellState> = Vec::with_capacity(scene.vertices.len());
    let mut index: HashMap<&str, usize> = HashMap::new();
    for vertex in &scene.vertices {
        let bounds = Rectangle::new(vertex.x, vertex.y, vertex.width, vertex.height);
        let state = view.cell_state(CellRef::vertex(&vertex.id), &bounds, vertex.style.resolve()?);
        index.insert(vertex.id.as_str(), states.len());
        states.push(state);
    }

    let lookup = |edge: &EdgeSpec, id: Option<&String>| -> Result<Option<usize>> {
        let Some(id) = id else {
            return Ok(None);
        };
        index
            .get(id.as_str())
            .copied()
            .map(Some)
            .ok_or_else(|| Error::UnknownTerminal {
                edge: edge.id.clone(),
                id: id.clone(),
            })
    };

    let mut edges = Vec::with_capacity(scene.edges.len());
    for spec in &scene.edges {
        let style = spec.style.resolve()?;
        let source_idx = lookup(spec, spec.source.as_ref())?;
        let target_idx = lookup(spec, spec.target.as_ref())?;

        let mut state = EdgeState::new(&view, style).with_terminal_points(
            spec.source_point.map(|p| view.to_view(point(p))),
            spec.target_point.map(|p| view.to_view(point(p))),
        );
        state.obstacles = states
            .iter()
            .enumerate()
            .filter(|(idx, _)| Some(*idx) != source_idx && Some(*idx) != target_idx)
            .map(|(_, vertex)| vertex.bounds())
            .collect();

        let hints: Vec<Point> = spec.points.iter().copied().map(point).collect();
        let source = source_idx.map(|idx| &states[idx]);
        let target = target_idx.map(|idx| &states[idx]);
        let points = view.route_edge(&state, source, target, &hints, registry);

        edges.push(RoutedEdge {
            id: spec.id.clone(),
            source: spec.source.clone(),
            target: spec.target.clone(),
            edge_style: state
                .style
                .edge_style
                .as_ref()
                .and_then(|router| style_name(router, registry)),
            start_arrow: state.style.start_arrow.clone(),
            end_arrow: state.style.end_arrow.clone(),
            points: points.iter().map(|p| [p.x, p.y]).collect(),
        });
    }

    let vertices: Vec<RoutedVertex> = scene
        .vertices
        .iter()
        .zip(&states)
        .map(|(spec, state)| RoutedVertex {
            id: spec.id.clone(),
            x: state.x,
            y: state.y,
            width: state.width,
            height: state.height,
            perimeter: state.style.perimeter.unwrap_or(PerimeterKind::Rectangle),
            direction: state.style.direction,
            rotation: state.style.rotation,
        })
        .collect();

    let mut width: f64 = 0.0;
    let mut height: f64 = 0.0;
    for vertex in &vertices {
        width = width.max(vertex.x + vertex.width);
        height = height.max(vertex.y + vertex.height);
    }
    for edge in &edges {
        for [x, y] in &edge.points {
            width = width.max(*x);
            height = height.max(*y);
        }
    }

    Ok(RoutedScene {
        width: width + SCENE_MARGIN,
        height: height + SCENE_MARGIN,
        vertices,
        edges,
    })
}

pub fn write_routed_scene(path: &Path, routed: &RoutedScene) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, routed)?;
    Ok(())
}
