//! Edge styles: functions that compute the bends of a connector between two
//! terminals.
//!
//! Every router shares one signature. It reads the edge state, the resolved
//! source and target terminals (either may be missing for a floating end) and
//! the user's bend hints in model coordinates, and appends waypoints in view
//! coordinates to `result`. Routers keep no state between calls.

use std::borrow::Cow;

use crate::geometry::Point;
use crate::state::{CellState, EdgeState};

mod elbow;
mod entity_relation;
mod loops;
mod manhattan;
mod orthogonal;
pub mod scaling;
mod segment;

pub use elbow::{elbow_connector, side_to_side, top_to_bottom};
pub use entity_relation::entity_relation;
pub use loops::loop_style;
pub use manhattan::manhattan_connector;
pub use orthogonal::{jetty_size, orth_connector};
pub use segment::segment_connector;

pub type EdgeStyleFn =
    fn(&EdgeState<'_>, Option<&CellState>, Option<&CellState>, &[Point], &mut Vec<Point>);

/// A fixed connection point takes precedence over the terminal's bounds.
pub(crate) fn terminal_or_fixed(
    fixed: Option<Point>,
    terminal: Option<&CellState>,
) -> Option<Cow<'_, CellState>> {
    match fixed {
        Some(point) => Some(Cow::Owned(CellState::at_point(point))),
        None => terminal.map(Cow::Borrowed),
    }
}
