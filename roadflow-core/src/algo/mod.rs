pub mod diffusion;
pub mod neighbors;
pub mod snapshot;
pub mod split;

pub use diffusion::{DiffusionReport, default_round_cap, diffuse};
pub use neighbors::NeighborIndex;
pub use snapshot::{ResolvedMatch, stamp_matches};
pub use split::{SplitPlan, split_segment, split_segments};
