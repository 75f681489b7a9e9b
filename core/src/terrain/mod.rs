pub mod cache;
pub mod elevation;
pub mod mask;

pub use cache::MaskCache;
pub use elevation::{ElevationGrid, ElevationProvider, FlatTerrain, NoElevationData};
pub use mask::{compute_mask, MaskConfig, TerrainMaskResult, UNMASKED_ANGLE_DEG};
