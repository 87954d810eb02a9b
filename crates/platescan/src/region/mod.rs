//! Plate region proposal and refinement.

pub mod flood;
pub mod proposal;
pub mod refine;

pub use flood::{FixedRangeFloodFill, FloodFiller};
pub use proposal::{propose_regions, propose_regions_traced, ProposalConfig, ProposalTrace};
pub use refine::{refine_region, seed_points, RefineConfig};
