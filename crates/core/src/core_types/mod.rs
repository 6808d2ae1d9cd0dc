//! Core types and validation

pub mod canopy;
pub mod error;

pub use canopy::SpeciesCanopyState;
pub(crate) use canopy::check_weights;
pub(crate) use error::check_extinction_coefficient;
pub use error::{InvalidInput, SpeciesField};
