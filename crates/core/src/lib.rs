//! Canopy Light-Competition Core Library
//!
//! Multi-layer light interception and competition for mixed grassland
//! communities. The canopy is sliced into thin horizontal layers, each
//! species' leaf area is spread over the layers it reaches, and Beer-Lambert
//! extinction through the layers above decides how much light each species
//! captures.
//!
//! ## Overview
//!
//! - [`compute_light_capture`]: share of community-intercepted light per species
//! - [`compute_light_capture_with`]: same, with an explicit grid and normalization
//! - [`compute_light_capture_batch`]: many independent canopies in parallel
//! - [`physics::interception`]: unstratified community interception and shading
//! - [`height_competition_factors`]: the simpler relative-height alternative
//!
//! Every evaluation is a pure function of its arguments; nothing is cached and
//! no state is shared between calls.

// Core types and validation
pub mod core_types;

// Light physics
pub mod physics;

// Parallel evaluation
pub mod batch;

pub use batch::{compute_light_capture_batch, compute_light_capture_batch_with_coefficients};
pub use core_types::{InvalidInput, SpeciesCanopyState, SpeciesField};
pub use physics::{
    compute_light_capture, compute_light_capture_with, height_competition_factors, GridExtent,
    LayerGrid, LayerGridConfig, LightCaptureResult, LightCompetitionConfig, Normalization,
};
