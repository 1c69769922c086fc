//! Snapping measured segments onto directed network edges

pub mod bearing;
mod corrections;
mod direction;
mod matcher;
mod nearest;

pub use bearing::{CardinalDirection, are_opposite_bearings, calculate_bearing};
pub use corrections::{CorrectionRule, CorrectionTable, ResolvedCorrection};
pub use direction::{Direction, against_canonical, resolve_direction, resolve_edge};
pub use matcher::{MatchOutcome, TOO_DISTANT, match_segments};
pub use nearest::{EdgeRTree, EdgeSegment, NearestEdgeQuery};
