#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod geometry;
pub mod perimeter;
pub mod points;
pub mod registry;
pub mod render;
pub mod routing;
pub mod scene;
pub mod state;
pub mod style;
pub mod theme;
pub mod view;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::RoutingConfig;
pub use error::{Error, Result};
pub use geometry::{Point, Rectangle};
pub use registry::{EdgeStyleRegistry, RouterRef};
pub use scene::{RoutedScene, Scene, route_scene};
pub use state::{CellRef, CellState, EdgeState};
pub use style::Style;
pub use view::View;
