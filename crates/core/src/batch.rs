//! Parallel evaluation of many independent canopies.
//!
//! Light competition is a pure function of its inputs, so patches of a larger
//! landscape (or timesteps of an offline run) can be evaluated concurrently
//! without locking.

use rayon::prelude::*;
use tracing::debug;

use crate::core_types::{InvalidInput, SpeciesCanopyState};
use crate::physics::{compute_light_capture_with, LightCaptureResult, LightCompetitionConfig};

/// Evaluate light competition for every canopy in parallel.
///
/// Results are returned in input order. Each canopy is evaluated on its own
/// grid, so a failure in one (e.g. a grid too large for [`crate::physics::MAX_LAYERS`])
/// does not affect the others.
pub fn compute_light_capture_batch(
    canopies: &[SpeciesCanopyState],
    extinction_coefficient: f64,
    config: &LightCompetitionConfig,
) -> Vec<Result<LightCaptureResult, InvalidInput>> {
    debug!("Evaluating light competition for {} canopies", canopies.len());
    canopies
        .par_iter()
        .map(|canopy| compute_light_capture_with(canopy, extinction_coefficient, config))
        .collect()
}

/// Evaluate many canopies, each with its own extinction coefficient.
///
/// `extinction_coefficients[i]` applies to `canopies[i]`. Per-canopy failures
/// are reported in place, as in [`compute_light_capture_batch`].
///
/// # Errors
///
/// Returns [`InvalidInput::CoefficientCountMismatch`] if the two slices differ
/// in length; no canopy is evaluated.
pub fn compute_light_capture_batch_with_coefficients(
    canopies: &[SpeciesCanopyState],
    extinction_coefficients: &[f64],
    config: &LightCompetitionConfig,
) -> Result<Vec<Result<LightCaptureResult, InvalidInput>>, InvalidInput> {
    if canopies.len() != extinction_coefficients.len() {
        return Err(InvalidInput::CoefficientCountMismatch {
            canopies: canopies.len(),
            coefficients: extinction_coefficients.len(),
        });
    }
    debug!(
        "Evaluating light competition for {} canopies with per-canopy coefficients",
        canopies.len()
    );
    Ok(canopies
        .par_iter()
        .zip(extinction_coefficients.par_iter())
        .map(|(canopy, &k)| compute_light_capture_with(canopy, k, config))
        .collect())
}
