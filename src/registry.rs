//! Name-keyed registry of edge-style functions.
//!
//! Persisted diagrams reference routers by name (`"orthogonalEdgeStyle"`),
//! never by value; the registry resolves those names at render time and
//! carries the metadata the interactive layer needs (handler kind and
//! whether the router produces orthogonal paths).

use once_cell::sync::Lazy;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::Error;
use crate::routing::{self, EdgeStyleFn};

/// Which bend-manipulation handler edits edges using a router.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum HandlerKind {
    #[default]
    Default,
    Elbow,
    Segment,
    Custom(String),
}

impl HandlerKind {
    pub fn as_str(&self) -> &str {
        match self {
            HandlerKind::Default => "default",
            HandlerKind::Elbow => "elbow",
            HandlerKind::Segment => "segment",
            HandlerKind::Custom(name) => name,
        }
    }
}

impl From<&str> for HandlerKind {
    fn from(value: &str) -> Self {
        match value {
            "default" => HandlerKind::Default,
            "elbow" => HandlerKind::Elbow,
            "segment" => HandlerKind::Segment,
            other => HandlerKind::Custom(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct EdgeStyleMetadata {
    pub handler_kind: HandlerKind,
    pub is_orthogonal: bool,
}

impl EdgeStyleMetadata {
    pub fn new(handler_kind: HandlerKind, is_orthogonal: bool) -> Self {
        Self {
            handler_kind,
            is_orthogonal,
        }
    }
}

fn router_key(router: EdgeStyleFn) -> usize {
    router as usize
}

/// A style's edge-style value: a registered name, or a function handed in
/// directly by code. Resolved once per render by the view.
#[derive(Clone)]
pub enum RouterRef {
    Named(String),
    Direct(EdgeStyleFn),
}

impl RouterRef {
    pub fn resolve(&self, registry: &EdgeStyleRegistry) -> crate::error::Result<EdgeStyleFn> {
        match self {
            RouterRef::Named(name) => registry
                .get(name)
                .ok_or_else(|| Error::UnknownEdgeStyle(name.clone())),
            RouterRef::Direct(router) => Ok(*router),
        }
    }
}

impl fmt::Debug for RouterRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouterRef::Named(name) => f.debug_tuple("Named").field(name).finish(),
            RouterRef::Direct(router) => write!(f, "Direct({:#x})", router_key(*router)),
        }
    }
}

impl PartialEq for RouterRef {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (RouterRef::Named(a), RouterRef::Named(b)) => a == b,
            (RouterRef::Direct(a), RouterRef::Direct(b)) => router_key(*a) == router_key(*b),
            _ => false,
        }
    }
}

impl Serialize for RouterRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RouterRef::Named(name) => serializer.serialize_str(name),
            RouterRef::Direct(router) => match global_registry().get_name(*router) {
                Some(name) => serializer.serialize_str(name),
                None => Err(serde::ser::Error::custom(Error::UnregisteredRouter)),
            },
        }
    }
}

impl<'de> Deserialize<'de> for RouterRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(RouterRef::Named)
    }
}

#[derive(Clone, Default)]
pub struct EdgeStyleRegistry {
    entries: Vec<(String, EdgeStyleFn)>,
    metadata: HashMap<usize, EdgeStyleMetadata>,
}

impl EdgeStyleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the built-in routers.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        register_default_edge_styles(&mut registry);
        registry
    }

    /// Registers `router` under `name`, replacing an earlier router of the same
    /// name in place. Metadata is attached to the function, not the name.
    pub fn add(&mut self, name: &str, router: EdgeStyleFn, metadata: Option<EdgeStyleMetadata>) {
        match self.entries.iter_mut().find(|(existing, _)| existing == name) {
            Some(entry) => entry.1 = router,
            None => self.entries.push((name.to_string(), router)),
        }
        if let Some(metadata) = metadata {
            self.metadata.insert(router_key(router), metadata);
        }
    }

    pub fn get(&self, name: &str) -> Option<EdgeStyleFn> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, router)| *router)
    }

    /// First name `router` was registered under.
    pub fn get_name(&self, router: EdgeStyleFn) -> Option<&str> {
        let key = router_key(router);
        self.entries
            .iter()
            .find(|(_, candidate)| router_key(*candidate) == key)
            .map(|(name, _)| name.as_str())
    }

    pub fn get_handler_kind(&self, router: EdgeStyleFn) -> HandlerKind {
        self.metadata
            .get(&router_key(router))
            .map(|meta| meta.handler_kind.clone())
            .unwrap_or_default()
    }

    pub fn is_orthogonal(&self, router: EdgeStyleFn) -> bool {
        self.metadata
            .get(&router_key(router))
            .is_some_and(|meta| meta.is_orthogonal)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.metadata.clear();
    }
}

impl fmt::Debug for EdgeStyleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EdgeStyleRegistry")
            .field("names", &self.names().collect::<Vec<_>>())
            .finish()
    }
}

/// Registers the built-in routers under their persisted names.
pub fn register_default_edge_styles(registry: &mut EdgeStyleRegistry) {
    let elbow = || Some(EdgeStyleMetadata::new(HandlerKind::Elbow, true));
    let segment = || Some(EdgeStyleMetadata::new(HandlerKind::Segment, true));

    registry.add("elbowEdgeStyle", routing::elbow_connector, elbow());
    registry.add(
        "entityRelationEdgeStyle",
        routing::entity_relation,
        Some(EdgeStyleMetadata::new(HandlerKind::Default, true)),
    );
    registry.add("loopEdgeStyle", routing::loop_style, None);
    registry.add("manhattanEdgeStyle", routing::manhattan_connector, segment());
    registry.add("orthogonalEdgeStyle", routing::orth_connector, segment());
    registry.add("segmentEdgeStyle", routing::segment_connector, segment());
    registry.add("sideToSideEdgeStyle", routing::side_to_side, elbow());
    registry.add("topToBottomEdgeStyle", routing::top_to_bottom, elbow());
}

static EDGE_STYLE_REGISTRY: Lazy<RwLock<EdgeStyleRegistry>> =
    Lazy::new(|| RwLock::new(EdgeStyleRegistry::new()));

/// Process-wide registry. Starts empty; call [`register_default_edge_styles`]
/// on [`global_registry_mut`] to install the built-ins.
pub fn global_registry() -> RwLockReadGuard<'static, EdgeStyleRegistry> {
    EDGE_STYLE_REGISTRY
        .read()
        .unwrap_or_else(PoisonError::into_inner)
}

pub fn global_registry_mut() -> RwLockWriteGuard<'static, EdgeStyleRegistry> {
    EDGE_STYLE_REGISTRY
        .write()
        .unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::state::{CellState, EdgeState};

    fn custom_router(
        _state: &EdgeState<'_>,
        _source: Option<&CellState>,
        _target: Option<&CellState>,
        _hints: &[Point],
        result: &mut Vec<Point>,
    ) {
        result.push(Point::new(1.0, 2.0));
    }

    #[test]
    fn add_get_and_clear() {
        let mut registry = EdgeStyleRegistry::new();
        let router: EdgeStyleFn = custom_router;
        registry.add(
            "custom",
            router,
            Some(EdgeStyleMetadata::new(HandlerKind::Segment, true)),
        );

        let found = registry.get("custom").unwrap();
        assert_eq!(router_key(found), router_key(router));
        assert!(registry.is_orthogonal(router));
        assert_eq!(registry.get_handler_kind(router), HandlerKind::Segment);

        registry.clear();
        assert!(registry.get("custom").is_none());
        assert_eq!(registry.get_handler_kind(router), HandlerKind::Default);
        assert!(!registry.is_orthogonal(router));
    }

    #[test]
    fn unregistered_router_has_defaults() {
        let registry = EdgeStyleRegistry::new();
        assert_eq!(registry.get_handler_kind(custom_router), HandlerKind::Default);
        assert!(!registry.is_orthogonal(custom_router));
        assert!(registry.get_name(custom_router).is_none());
    }

    #[test]
    fn reverse_lookup_returns_first_name() {
        let mut registry = EdgeStyleRegistry::new();
        registry.add("first", custom_router, None);
        registry.add("second", custom_router, None);
        assert_eq!(registry.get_name(custom_router), Some("first"));
    }

    #[test]
    fn defaults_cover_builtin_names() {
        let registry = EdgeStyleRegistry::with_defaults();
        assert_eq!(registry.len(), 8);
        let orth = registry.get("orthogonalEdgeStyle").unwrap();
        assert!(registry.is_orthogonal(orth));
        assert_eq!(registry.get_handler_kind(orth), HandlerKind::Segment);
        let looped = registry.get("loopEdgeStyle").unwrap();
        assert!(!registry.is_orthogonal(looped));
        let elbow = registry.get("elbowEdgeStyle").unwrap();
        assert_eq!(registry.get_handler_kind(elbow), HandlerKind::Elbow);
        assert_eq!(registry.get_name(elbow), Some("elbowEdgeStyle"));
    }

    #[test]
    fn router_refs_resolve_by_name_or_value() {
        let registry = EdgeStyleRegistry::with_defaults();
        let named = RouterRef::Named("sideToSideEdgeStyle".to_string());
        assert!(named.resolve(&registry).is_ok());
        let missing = RouterRef::Named("nope".to_string());
        assert!(matches!(
            missing.resolve(&registry),
            Err(Error::UnknownEdgeStyle(name)) if name == "nope"
        ));
        let direct = RouterRef::Direct(custom_router);
        assert!(direct.resolve(&registry).is_ok());
        assert_eq!(direct, RouterRef::Direct(custom_router));
        assert_ne!(direct, named);
    }

    #[test]
    fn handler_kind_parses_custom_names() {
        assert_eq!(HandlerKind::from("elbow"), HandlerKind::Elbow);
        assert_eq!(HandlerKind::from("bezier").as_str(), "bezier");
    }
}
