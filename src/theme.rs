use serde::{Deserialize, Serialize};

/// Colors and stroke widths for the SVG preview.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Theme {
    pub font_family: String,
    pub font_size: f64,
    pub vertex_fill: String,
    pub vertex_stroke: String,
    pub vertex_stroke_width: f64,
    pub edge_stroke: String,
    pub edge_stroke_width: f64,
    pub waypoint_color: String,
    pub label_color: String,
    pub background: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self::classic()
    }
}

impl Theme {
    pub fn classic() -> Self {
        Self {
            font_family: "Helvetica, Arial, sans-serif".to_string(),
            font_size: 11.0,
            vertex_fill: "#DAE8FC".to_string(),
            vertex_stroke: "#6C8EBF".to_string(),
            vertex_stroke_width: 1.0,
            edge_stroke: "#000000".to_string(),
            edge_stroke_width: 1.0,
            waypoint_color: "#E07A10".to_string(),
            label_color: "#333333".to_string(),
            background: "#FFFFFF".to_string(),
        }
    }

    pub fn modern() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            font_size: 12.0,
            vertex_fill: "#F8FAFF".to_string(),
            vertex_stroke: "#C7D2E5".to_string(),
            vertex_stroke_width: 1.2,
            edge_stroke: "#7A8AA6".to_string(),
            edge_stroke_width: 1.4,
            waypoint_color: "#D9534F".to_string(),
            label_color: "#1C2430".to_string(),
            background: "#FFFFFF".to_string(),
        }
    }
}
