use crate::geometry::{Point, Rectangle};
use crate::perimeter::{PerimeterKind, hexagon_outline, triangle_outline};
use crate::scene::{RoutedEdge, RoutedScene, RoutedVertex};
use crate::style::Direction;
use crate::theme::Theme;
use anyhow::Result;
use std::path::Path;

#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    /// Draw a dot on every bend so routes can be inspected.
    pub show_waypoints: bool,
    pub show_labels: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            show_waypoints: false,
            show_labels: true,
        }
    }
}

pub fn render_svg(scene: &RoutedScene, theme: &Theme, options: &RenderOptions) -> String {
    let mut svg = String::new();
    let width = scene.width.max(200.0);
    let height = scene.height.max(200.0);

    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">",
    ));
    svg.push_str(&format!(
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        theme.background
    ));

    svg.push_str("<defs>");
    svg.push_str(&format!(
        "<marker id=\"arrow\" viewBox=\"0 0 10 10\" refX=\"10\" refY=\"5\" markerWidth=\"6\" markerHeight=\"6\" orient=\"auto-start-reverse\"><path d=\"M 0 0 L 10 5 L 0 10 z\" fill=\"{}\"/></marker>",
        theme.edge_stroke
    ));
    svg.push_str("</defs>");

    for vertex in &scene.vertices {
        svg.push_str(&vertex_svg(vertex, theme));
        if options.show_labels {
            let cx = vertex.x + vertex.width / 2.0;
            let cy = vertex.y + vertex.height / 2.0 + theme.font_size / 3.0;
            svg.push_str(&format!(
                "<text x=\"{cx:.2}\" y=\"{cy:.2}\" text-anchor=\"middle\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">{}</text>",
                escape_xml(&theme.font_family),
                theme.font_size,
                theme.label_color,
                escape_xml(&vertex.id)
            ));
        }
    }

    for edge in &scene.edges {
        svg.push_str(&edge_svg(edge, theme));
        if options.show_waypoints && edge.points.len() > 2 {
            for [x, y] in &edge.points[1..edge.points.len() - 1] {
                svg.push_str(&format!(
                    "<circle cx=\"{x:.2}\" cy=\"{y:.2}\" r=\"2.5\" fill=\"{}\"/>",
                    theme.waypoint_color
                ));
            }
        }
    }

    svg.push_str("</svg>");
    svg
}

fn vertex_svg(vertex: &RoutedVertex, theme: &Theme) -> String {
    let (x, y, w, h) = (vertex.x, vertex.y, vertex.width, vertex.height);
    let (cx, cy) = (x + w / 2.0, y + h / 2.0);
    let paint = format!(
        "fill=\"{}\" stroke=\"{}\" stroke-width=\"{}\"",
        theme.vertex_fill, theme.vertex_stroke, theme.vertex_stroke_width
    );
    let transform = if vertex.rotation != 0.0 {
        format!(" transform=\"rotate({} {cx:.2} {cy:.2})\"", vertex.rotation)
    } else {
        String::new()
    };

    match vertex.perimeter {
        PerimeterKind::Rectangle => format!(
            "<rect x=\"{x:.2}\" y=\"{y:.2}\" width=\"{w:.2}\" height=\"{h:.2}\" {paint}{transform}/>"
        ),
        PerimeterKind::Ellipse => format!(
            "<ellipse cx=\"{cx:.2}\" cy=\"{cy:.2}\" rx=\"{:.2}\" ry=\"{:.2}\" {paint}{transform}/>",
            w / 2.0,
            h / 2.0
        ),
        PerimeterKind::Rhombus => polygon_svg(
            &[
                Point::new(cx, y),
                Point::new(x + w, cy),
                Point::new(cx, y + h),
                Point::new(x, cy),
            ],
            &paint,
            &transform,
        ),
        PerimeterKind::Triangle => {
            let bounds = Rectangle::new(x, y, w, h);
            polygon_svg(&triangle_outline(&bounds, vertex.direction), &paint, &transform)
        }
        PerimeterKind::Hexagon => {
            let bounds = Rectangle::new(x, y, w, h);
            let vertical = vertex.direction.is_some_and(Direction::is_vertical);
            polygon_svg(&hexagon_outline(&bounds, vertical), &paint, &transform)
        }
    }
}

fn polygon_svg(points: &[Point], paint: &str, transform: &str) -> String {
    let coords: Vec<String> = points
        .iter()
        .map(|p| format!("{:.2},{:.2}", p.x, p.y))
        .collect();
    format!(
        "<polygon points=\"{}\" {paint}{transform}/>",
        coords.join(" ")
    )
}

fn edge_svg(edge: &RoutedEdge, theme: &Theme) -> String {
    let d = points_to_path(&edge.points);
    let mut markers = String::new();
    if edge.end_arrow.is_some() {
        markers.push_str(" marker-end=\"url(#arrow)\"");
    }
    if edge.start_arrow.is_some() {
        markers.push_str(" marker-start=\"url(#arrow)\"");
    }
    format!(
        "<path d=\"{d}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{}\"{markers}/>",
        theme.edge_stroke, theme.edge_stroke_width
    )
}

fn points_to_path(points: &[[f64; 2]]) -> String {
    let Some((first, rest)) = points.split_first() else {
        return String::new();
    };
    let mut d = format!("M {:.2} {:.2}", first[0], first[1]);
    for point in rest {
        d.push_str(&format!(" L {:.2} {:.2}", point[0], point[1]));
    }
    d
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, theme: &Theme) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.font_family = theme.font_family.clone();

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RoutingConfig;
    use crate::registry::EdgeStyleRegistry;
    use crate::scene::{Scene, route_scene};

    fn routed() -> RoutedScene {
        let scene = Scene::from_json(
            r#"{
                "vertices": [
                    { "id": "start", "x": 20, "y": 20, "width": 80, "height": 40 },
                    { "id": "check", "x": 200, "y": 120, "width": 80, "height": 60,
                      "style": "perimeter=rhombusPerimeter" },
                    { "id": "db", "x": 20, "y": 220, "width": 60, "height": 60,
                      "style": "perimeter=ellipsePerimeter" }
                ],
                "edges": [
                    { "id": "e1", "source": "start", "target": "check",
                      "style": "edgeStyle=orthogonalEdgeStyle;endArrow=block" },
                    { "id": "e2", "source": "check", "target": "db",
                      "style": "edgeStyle=elbowEdgeStyle;elbow=vertical" }
                ]
            }"#,
        )
        .unwrap();
        route_scene(
            &scene,
            &EdgeStyleRegistry::with_defaults(),
            &RoutingConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn render_svg_basic() {
        let svg = render_svg(&routed(), &Theme::modern(), &RenderOptions::default());
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("<polygon"));
        assert!(svg.contains("<ellipse"));
        assert_eq!(svg.matches("marker-end").count(), 1);
        assert!(svg.contains(">start</text>"));
    }

    #[test]
    fn waypoints_are_optional() {
        let options = RenderOptions {
            show_waypoints: true,
            show_labels: false,
        };
        let svg = render_svg(&routed(), &Theme::classic(), &options);
        assert!(svg.contains("<circle"));
        assert!(!svg.contains("<text"));
    }

    fn shaped(perimeter: PerimeterKind, direction: Option<Direction>) -> RoutedVertex {
        RoutedVertex {
            id: "v".to_string(),
            x: 0.0,
            y: 0.0,
            width: 40.0,
            height: 20.0,
            perimeter,
            direction,
            rotation: 0.0,
        }
    }

    #[test]
    fn outlines_follow_direction() {
        let theme = Theme::classic();
        let east = vertex_svg(&shaped(PerimeterKind::Triangle, None), &theme);
        assert!(east.contains("points=\"0.00,0.00 40.00,10.00 0.00,20.00\""), "{east}");
        let north = vertex_svg(&shaped(PerimeterKind::Triangle, Some(Direction::North)), &theme);
        assert!(north.contains("points=\"0.00,20.00 20.00,0.00 40.00,20.00\""), "{north}");
        let hexagon = vertex_svg(&shaped(PerimeterKind::Hexagon, Some(Direction::South)), &theme);
        assert!(hexagon.contains("points=\"20.00,0.00 40.00,5.00"), "{hexagon}");
    }

    #[test]
    fn path_of_no_points_is_empty() {
        assert_eq!(points_to_path(&[]), "");
        assert_eq!(
            points_to_path(&[[0.0, 0.0], [10.0, 5.0]]),
            "M 0.00 0.00 L 10.00 5.00"
        );
    }
}
