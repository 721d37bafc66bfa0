use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};
use crate::perimeter::PerimeterKind;
use crate::registry::RouterRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim() {
            "north" => Some(Self::North),
            "south" => Some(Self::South),
            "east" => Some(Self::East),
            "west" => Some(Self::West),
            _ => None,
        }
    }

    pub fn is_vertical(self) -> bool {
        matches!(self, Self::North | Self::South)
    }
}

/// Side of a terminal box an orthogonal route leaves or enters through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::Top, Side::Right, Side::Bottom, Side::Left];

    /// Unit step pointing away from the box through this side.
    pub fn outward(self) -> (i32, i32) {
        match self {
            Side::Top => (0, -1),
            Side::Right => (1, 0),
            Side::Bottom => (0, 1),
            Side::Left => (-1, 0),
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Side::Left | Side::Right)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Elbow {
    Horizontal,
    Vertical,
}

/// Stand-off distance before an orthogonal route may turn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JettySize {
    Auto,
    Fixed(f64),
}

impl JettySize {
    fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw == "auto" {
            return Some(Self::Auto);
        }
        raw.parse::<f64>().ok().map(Self::Fixed)
    }
}

impl Serialize for JettySize {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            JettySize::Auto => serializer.serialize_str("auto"),
            JettySize::Fixed(value) => serializer.serialize_f64(*value),
        }
    }
}

impl<'de> Deserialize<'de> for JettySize {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Text(String),
        }
        match Raw::deserialize(deserializer)? {
            Raw::Number(value) => Ok(JettySize::Fixed(value)),
            Raw::Text(text) => JettySize::parse(&text)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid jetty size `{text}`"))),
        }
    }
}

/// Bit set of terminal sides. Bit values follow the persisted format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DirectionMask(pub u8);

impl DirectionMask {
    pub const NONE: Self = Self(0);
    pub const WEST: Self = Self(1);
    pub const NORTH: Self = Self(2);
    pub const SOUTH: Self = Self(4);
    pub const EAST: Self = Self(8);
    pub const ALL: Self = Self(15);

    pub fn bits(self) -> u8 {
        self.0
    }

    /// Maps every side onto the opposite one.
    pub fn reversed(self) -> Self {
        let mut result = (self.0 & Self::WEST.0) << 3;
        result |= (self.0 & Self::NORTH.0) << 1;
        result |= (self.0 & Self::SOUTH.0) >> 1;
        result |= (self.0 & Self::EAST.0) >> 3;
        Self(result)
    }
}

impl std::ops::BitOr for DirectionMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for DirectionMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Resolved style of a cell. Unset numeric fields fall back to router defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Style {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edge_style: Option<RouterRef>,
    #[serde(rename = "loop", skip_serializing_if = "Option::is_none")]
    pub loop_style: Option<RouterRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub perimeter: Option<PerimeterKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elbow: Option<Elbow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segment: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jetty_size: Option<JettySize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_jetty_size: Option<JettySize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_jetty_size: Option<JettySize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port_constraint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_port_constraint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_port_constraint: Option<String>,
    pub port_constraint_rotation: bool,
    pub rotation: f64,
    pub routing_center_x: f64,
    pub routing_center_y: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_arrow: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_arrow: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orthogonal: Option<bool>,
    pub perimeter_spacing: f64,
    pub source_perimeter_spacing: f64,
    pub target_perimeter_spacing: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_y: Option<f64>,
}

impl Style {
    /// Parses the `key=value;key=value` form used by persisted diagrams.
    /// Unknown keys are ignored so styles written for other consumers still load.
    pub fn parse(input: &str) -> Result<Self> {
        let mut style = Style::default();
        for entry in input.split(';') {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }
            let Some((key, value)) = entry.split_once('=') else {
                continue;
            };
            style.set(key.trim(), value.trim())?;
        }
        Ok(style)
    }

    /// Assigns a single style entry from its textual form.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let invalid = || Error::InvalidStyle {
            key: key.to_string(),
            value: value.to_string(),
        };
        let number = || value.parse::<f64>().map_err(|_| invalid());
        let flag = || match value {
            "1" | "true" => Ok(true),
            "0" | "false" => Ok(false),
            _ => Err(invalid()),
        };
        let jetty = || JettySize::parse(value).ok_or_else(invalid);
        let text = || (value != "none").then(|| value.to_string());

        match key {
            "edgeStyle" => self.edge_style = Some(RouterRef::Named(value.to_string())),
            "loop" => self.loop_style = Some(RouterRef::Named(value.to_string())),
            "perimeter" => {
                self.perimeter = Some(
                    PerimeterKind::from_name(value)
                        .ok_or_else(|| Error::UnknownPerimeter(value.to_string()))?,
                )
            }
            "direction" => self.direction = Some(Direction::from_token(value).ok_or_else(invalid)?),
            "elbow" => {
                self.elbow = Some(match value {
                    "horizontal" => Elbow::Horizontal,
                    "vertical" => Elbow::Vertical,
                    _ => return Err(invalid()),
                })
            }
            "segment" => self.segment = Some(number()?),
            "jettySize" => self.jetty_size = Some(jetty()?),
            "sourceJettySize" => self.source_jetty_size = Some(jetty()?),
            "targetJettySize" => self.target_jetty_size = Some(jetty()?),
            "portConstraint" => self.port_constraint = Some(value.to_string()),
            "sourcePortConstraint" => self.source_port_constraint = Some(value.to_string()),
            "targetPortConstraint" => self.target_port_constraint = Some(value.to_string()),
            "portConstraintRotation" => self.port_constraint_rotation = flag()?,
            "rotation" => self.rotation = number()?,
            "routingCenterX" => self.routing_center_x = number()?,
            "routingCenterY" => self.routing_center_y = number()?,
            "startArrow" => self.start_arrow = text(),
            "endArrow" => self.end_arrow = text(),
            "startSize" => self.start_size = Some(number()?),
            "endSize" => self.end_size = Some(number()?),
            "orthogonal" => self.orthogonal = Some(flag()?),
            "perimeterSpacing" => self.perimeter_spacing = number()?,
            "sourcePerimeterSpacing" => self.source_perimeter_spacing = number()?,
            "targetPerimeterSpacing" => self.target_perimeter_spacing = number()?,
            "exitX" => self.exit_x = Some(number()?),
            "exitY" => self.exit_y = Some(number()?),
            "entryX" => self.entry_x = Some(number()?),
            "entryY" => self.entry_y = Some(number()?),
            _ => {}
        }
        Ok(())
    }
}

/// Sides a terminal allows an edge to attach to. The terminal's own
/// `portConstraint` wins over the edge's `source`/`targetPortConstraint`.
pub fn port_constraints(
    terminal: &Style,
    edge: &Style,
    is_source: bool,
    default: DirectionMask,
) -> DirectionMask {
    let edge_value = if is_source {
        edge.source_port_constraint.as_deref()
    } else {
        edge.target_port_constraint.as_deref()
    };
    let Some(directions) = terminal.port_constraint.as_deref().or(edge_value) else {
        return default;
    };

    let rotation = if terminal.port_constraint_rotation {
        terminal.rotation
    } else {
        0.0
    };
    let quad = if rotation > 45.0 {
        if rotation >= 135.0 { 2 } else { 1 }
    } else if rotation < -45.0 {
        if rotation <= -135.0 { 2 } else { 3 }
    } else {
        0
    };

    // Each row lists the resulting side for quadrants 0..=3.
    const NORTH: [DirectionMask; 4] = [
        DirectionMask::NORTH,
        DirectionMask::EAST,
        DirectionMask::SOUTH,
        DirectionMask::WEST,
    ];
    const WEST: [DirectionMask; 4] = [
        DirectionMask::WEST,
        DirectionMask::NORTH,
        DirectionMask::EAST,
        DirectionMask::SOUTH,
    ];
    const SOUTH: [DirectionMask; 4] = [
        DirectionMask::SOUTH,
        DirectionMask::WEST,
        DirectionMask::NORTH,
        DirectionMask::EAST,
    ];
    const EAST: [DirectionMask; 4] = [
        DirectionMask::EAST,
        DirectionMask::SOUTH,
        DirectionMask::WEST,
        DirectionMask::NORTH,
    ];

    let mut mask = DirectionMask::NONE;
    if directions.contains("north") {
        mask |= NORTH[quad];
    }
    if directions.contains("west") {
        mask |= WEST[quad];
    }
    if directions.contains("south") {
        mask |= SOUTH[quad];
    }
    if directions.contains("east") {
        mask |= EAST[quad];
    }
    mask
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_style_string() {
        let style =
            Style::parse("edgeStyle=orthogonalEdgeStyle;jettySize=auto;segment=20;rounded=1")
                .unwrap();
        assert_eq!(
            style.edge_style,
            Some(RouterRef::Named("orthogonalEdgeStyle".to_string()))
        );
        assert_eq!(style.jetty_size, Some(JettySize::Auto));
        assert_eq!(style.segment, Some(20.0));
    }

    #[test]
    fn rejects_bad_numbers() {
        let err = Style::parse("segment=wide").unwrap_err();
        assert!(matches!(err, Error::InvalidStyle { .. }));
    }

    #[test]
    fn deserializes_object_form() {
        let style: Style = serde_json::from_str(
            r#"{"edgeStyle":"elbowEdgeStyle","elbow":"vertical","jettySize":15,"perimeter":"ellipsePerimeter"}"#,
        )
        .unwrap();
        assert_eq!(style.elbow, Some(Elbow::Vertical));
        assert_eq!(style.jetty_size, Some(JettySize::Fixed(15.0)));
        assert_eq!(style.perimeter, Some(PerimeterKind::Ellipse));
    }

    #[test]
    fn reversing_swaps_opposite_sides() {
        assert_eq!(DirectionMask::WEST.reversed(), DirectionMask::EAST);
        assert_eq!(DirectionMask::NORTH.reversed(), DirectionMask::SOUTH);
        assert_eq!(
            (DirectionMask::NORTH | DirectionMask::EAST).reversed(),
            DirectionMask::SOUTH | DirectionMask::WEST
        );
    }

    #[test]
    fn terminal_constraint_beats_edge_constraint() {
        let terminal = Style {
            port_constraint: Some("north".to_string()),
            ..Style::default()
        };
        let edge = Style {
            source_port_constraint: Some("west".to_string()),
            ..Style::default()
        };
        let mask = port_constraints(&terminal, &edge, true, DirectionMask::ALL);
        assert_eq!(mask, DirectionMask::NORTH);
        let mask = port_constraints(&Style::default(), &edge, true, DirectionMask::ALL);
        assert_eq!(mask, DirectionMask::WEST);
        let mask = port_constraints(&Style::default(), &edge, false, DirectionMask::ALL);
        assert_eq!(mask, DirectionMask::ALL);
    }

    #[test]
    fn constraints_follow_rotation_when_enabled() {
        let terminal = Style {
            port_constraint: Some("north,west".to_string()),
            port_constraint_rotation: true,
            rotation: 90.0,
            ..Style::default()
        };
        let mask = port_constraints(&terminal, &Style::default(), true, DirectionMask::ALL);
        assert_eq!(mask, DirectionMask::EAST | DirectionMask::NORTH);
    }
}
