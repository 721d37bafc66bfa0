use edge_router::render::{RenderOptions, render_svg};
use edge_router::theme::Theme;
use edge_router::{EdgeStyleRegistry, RoutedScene, RoutingConfig, Scene, route_scene};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PreviewOptions {
    theme: Option<String>,
    show_waypoints: Option<bool>,
}

fn to_js(error: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn route(scene_json: &str, config_json: Option<String>) -> Result<RoutedScene, edge_router::Error> {
    let config = match config_json {
        Some(raw) => serde_json::from_str::<RoutingConfig>(&raw)?,
        None => RoutingConfig::default(),
    };
    let scene = Scene::from_json(scene_json)?;
    route_scene(&scene, &EdgeStyleRegistry::with_defaults(), &config)
}

/// Routes a JSON scene and returns the routed scene as JSON.
#[wasm_bindgen]
pub fn route_scene_json(scene_json: &str, config_json: Option<String>) -> Result<String, JsValue> {
    route(scene_json, config_json)
        .and_then(|routed| routed.to_json())
        .map_err(to_js)
}

/// Routes a JSON scene and returns an SVG preview.
#[wasm_bindgen]
pub fn route_scene_svg(
    scene_json: &str,
    config_json: Option<String>,
    options_json: Option<String>,
) -> Result<String, JsValue> {
    let options = match options_json {
        Some(raw) => serde_json::from_str::<PreviewOptions>(&raw).map_err(to_js)?,
        None => PreviewOptions::default(),
    };
    let theme = if options.theme.as_deref() == Some("modern") {
        Theme::modern()
    } else {
        Theme::classic()
    };
    let render_options = RenderOptions {
        show_waypoints: options.show_waypoints.unwrap_or(false),
        ..RenderOptions::default()
    };
    let routed = route(scene_json, config_json).map_err(to_js)?;
    Ok(render_svg(&routed, &theme, &render_options))
}

#[cfg(test)]
mod tests {
    use crate::route;

    #[test]
    fn routes_scene_with_config_override() {
        let scene = r#"{
            "vertices": [
                { "id": "a", "x": 0, "y": 0, "width": 40, "height": 40 },
                { "id": "b", "x": 200, "y": 100, "width": 40, "height": 40 }
            ],
            "edges": [{ "id": "e", "source": "a", "target": "b", "style": "edgeStyle=entityRelationEdgeStyle" }]
        }"#;
        let config = r#"{ "entityRelation": { "segment": 10 } }"#;
        let routed = route(scene, Some(config.to_string())).expect("scene should route");
        assert_eq!(routed.edges.len(), 1);
        assert_eq!(routed.edges[0].points.len(), 4);
        assert_eq!(routed.edges[0].points[1], [50.0, 20.0]);
    }
}
