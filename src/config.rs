use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{PoisonError, RwLock};

use crate::style::Side;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrthogonalConnectorConfig {
    /// Default jetty length before the route may turn.
    pub buffer: f64,
    /// Route through the segment connector whenever bend hints are present.
    pub points_fallback: bool,
}

impl Default for OrthogonalConnectorConfig {
    fn default() -> Self {
        Self {
            buffer: 10.0,
            points_fallback: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ManhattanConnectorConfig {
    /// Grid step the search advances by.
    pub step: f64,
    /// Search budget; the fallback route is used once it runs out.
    pub max_loops: usize,
    /// Largest turn, in degrees, allowed between two consecutive moves.
    pub max_allowed_direction_change: f64,
    pub start_directions: Vec<Side>,
    pub end_directions: Vec<Side>,
    /// Extra cost per turn; half a step when unset.
    pub turn_penalty: Option<f64>,
    /// Clearance kept around obstacles.
    pub padding: f64,
}

impl ManhattanConnectorConfig {
    pub fn turn_cost(&self) -> f64 {
        self.turn_penalty.unwrap_or(self.step / 2.0)
    }
}

impl Default for ManhattanConnectorConfig {
    fn default() -> Self {
        Self {
            step: 12.0,
            max_loops: 2000,
            max_allowed_direction_change: 90.0,
            start_directions: Side::ALL.to_vec(),
            end_directions: Side::ALL.to_vec(),
            turn_penalty: None,
            padding: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EntityRelationConnectorConfig {
    /// Horizontal stub length, in unscaled units, used when the style has no `segment`.
    pub segment: f64,
}

impl Default for EntityRelationConnectorConfig {
    fn default() -> Self {
        Self { segment: 30.0 }
    }
}

/// Parameters read by the routers, carried by the view that invokes them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoutingConfig {
    pub orthogonal: OrthogonalConnectorConfig,
    pub manhattan: ManhattanConnectorConfig,
    pub entity_relation: EntityRelationConnectorConfig,
}

impl RoutingConfig {
    /// Snapshot of the process-wide configs, taken once so a routing pass
    /// never observes a half-applied update.
    pub fn global() -> Self {
        Self {
            orthogonal: ORTHOGONAL_CONNECTOR_CONFIG.snapshot(),
            manhattan: MANHATTAN_CONNECTOR_CONFIG.snapshot(),
            entity_relation: ENTITY_RELATION_CONNECTOR_CONFIG.snapshot(),
        }
    }
}

/// A process-wide config paired with the defaults captured when it was first
/// touched.
#[derive(Debug)]
pub struct SharedConfig<T> {
    defaults: T,
    current: RwLock<T>,
}

impl<T: Clone> SharedConfig<T> {
    pub fn new(defaults: T) -> Self {
        let current = RwLock::new(defaults.clone());
        Self { defaults, current }
    }

    pub fn snapshot(&self) -> T {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn defaults(&self) -> T {
        self.defaults.clone()
    }

    pub fn set(&self, value: T) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = value;
    }

    pub fn update(&self, apply: impl FnOnce(&mut T)) {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        apply(&mut guard);
    }

    /// Restores every field, cloning array fields out of the captured defaults.
    pub fn reset(&self) {
        self.set(self.defaults.clone());
    }
}

pub static ORTHOGONAL_CONNECTOR_CONFIG: Lazy<SharedConfig<OrthogonalConnectorConfig>> =
    Lazy::new(|| SharedConfig::new(OrthogonalConnectorConfig::default()));

pub static MANHATTAN_CONNECTOR_CONFIG: Lazy<SharedConfig<ManhattanConnectorConfig>> =
    Lazy::new(|| SharedConfig::new(ManhattanConnectorConfig::default()));

pub static ENTITY_RELATION_CONNECTOR_CONFIG: Lazy<SharedConfig<EntityRelationConnectorConfig>> =
    Lazy::new(|| SharedConfig::new(EntityRelationConnectorConfig::default()));

pub fn reset_orthogonal_connector_config() {
    ORTHOGONAL_CONNECTOR_CONFIG.reset();
}

pub fn reset_manhattan_connector_config() {
    MANHATTAN_CONNECTOR_CONFIG.reset();
}

pub fn reset_entity_relation_connector_config() {
    ENTITY_RELATION_CONNECTOR_CONFIG.reset();
}

/// Loads a routing config file (JSON5; plain JSON also parses). Missing
/// fields keep their defaults.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<RoutingConfig> {
    let Some(path) = path else {
        return Ok(RoutingConfig::default());
    };
    let contents = std::fs::read_to_string(path)?;
    let config: RoutingConfig = json5::from_str(&contents)?;
    Ok(config)
}
