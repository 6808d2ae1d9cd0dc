//! Non-layered height competition factor.
//!
//! A cheaper alternative to the layered model: each species' advantage is its
//! height relative to the community mean, raised to a strength exponent.
//!
//! ```text
//! Hcomp_s = (H_s / H_cwm)^β_H
//! ```
//!
//! With `β_H = 0` every species gets 1 (no competition); larger `β_H` favours
//! taller species more strongly.

use super::interception::community_weighted_mean_height;
use crate::core_types::{check_weights, InvalidInput, SpeciesCanopyState};

/// Height competition factor of every species.
///
/// # Arguments
/// * `heights` - Canopy height per species (m)
/// * `weights` - Optional weighting for the community mean height (e.g. biomass).
///   `None` uses the unweighted mean.
/// * `beta_h` - Competition strength exponent
///
/// # Errors
///
/// Returns [`InvalidInput`] for an empty species set, negative or non-finite
/// heights or weights, mismatched weight length, or an invalid exponent.
pub fn height_competition_factors(
    heights: &[f64],
    weights: Option<&[f64]>,
    beta_h: f64,
) -> Result<Vec<f64>, InvalidInput> {
    // Reuse canopy validation for the heights; leaf area plays no role here
    let canopy = SpeciesCanopyState::from_slices(heights, &vec![0.0; heights.len()])?;
    if !beta_h.is_finite() || beta_h < 0.0 {
        return Err(InvalidInput::InvalidExponent(beta_h));
    }

    let mean_height = match weights {
        Some(w) => {
            check_weights(w, canopy.species_count())?;
            community_weighted_mean_height(heights, w)
        }
        None => community_weighted_mean_height(heights, &vec![1.0; heights.len()]),
    };

    let Some(mean_height) = mean_height.filter(|&h| h > 0.0) else {
        return Ok(vec![1.0; heights.len()]);
    };

    Ok(heights
        .iter()
        .map(|&h| (h / mean_height).powf(beta_h))
        .collect())
}
