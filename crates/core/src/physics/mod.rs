//! Light interception and competition physics

pub mod canopy_layers;
pub mod height_competition;
pub mod interception;
pub mod light_competition;

pub use canopy_layers::{
    GridExtent, LayerGrid, LayerGridConfig, DEFAULT_LAYER_THICKNESS, MAX_LAYERS,
    REFERENCE_MAX_HEIGHT,
};
pub use height_competition::height_competition_factors;
pub use interception::{
    community_height_shading, community_interception, community_weighted_mean_height,
    intercepted_fraction, radiation_reducer,
};
pub use light_competition::{
    compute_light_capture, compute_light_capture_with, LightCaptureResult,
    LightCompetitionConfig, Normalization,
};
