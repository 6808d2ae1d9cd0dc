//! Layered Beer-Lambert light competition between plant species.
//!
//! Light enters the top of the canopy and is attenuated by all leaf area above
//! each layer. Within a layer, the intercepted light is shared among species in
//! proportion to their leaf area in that layer:
//!
//! ```text
//! I_l        = exp(−k · Σ_{n>l} LAI_n)
//! captured_l = I_l · (1 − exp(−k · LAI_l))
//! share_s,l  = LAI_s,l / LAI_l · captured_l / comLIE
//! comLIE     = 1 − exp(−k · LAI_tot)
//! ```
//!
//! Summing `captured_l` over all layers telescopes to `comLIE`, so with
//! community normalization the species shares add up to one.
//!
//! # References
//!
//! - Monsi, M. & Saeki, T. (1953). "Über den Lichtfaktor in den
//!   Pflanzengesellschaften und seine Bedeutung für die Stoffproduktion"
//!   Japanese Journal of Botany, 14, 22-52
//! - Schapendonk, A.H.C.M., et al. (1998). "LINGRA, a sink/source model to
//!   simulate grassland productivity in Europe"
//!   European Journal of Agronomy, 9(2-3), 87-100

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::canopy_layers::{LayerGrid, LayerGridConfig};
use crate::core_types::{check_extinction_coefficient, InvalidInput, SpeciesCanopyState};

/// How per-layer captured light is scaled before it is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Normalization {
    /// Divide by community interception: shares of intercepted light, sum to 1.
    #[default]
    Community,
    /// Report absolute fractions of incoming light.
    None,
}

/// Configuration for a light-competition evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LightCompetitionConfig {
    /// Vertical layer grid
    pub grid: LayerGridConfig,
    /// Scaling of the reported fractions
    pub normalization: Normalization,
}

impl LightCompetitionConfig {
    /// Settings of the documented two-species plots (fixed 1.55 m grid).
    pub fn reference() -> Self {
        Self {
            grid: LayerGridConfig::reference(),
            normalization: Normalization::Community,
        }
    }
}

/// Result of a light-competition evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LightCaptureResult {
    /// Light captured by each species, summed over layers
    pub per_species_fraction: Vec<f64>,
    /// Light captured by each species in each layer (S × layers)
    pub per_species_per_layer_fraction: Vec<Vec<f64>>,
    /// Total leaf area index in each layer
    pub layer_lai: Vec<f64>,
    /// Fraction of incoming light reaching the top of each layer
    pub layer_intensity: Vec<f64>,
    /// Whole-canopy interception efficiency (comLIE)
    pub community_interception: f64,
    /// Grid the canopy was evaluated on
    pub grid: LayerGrid,
}

impl LightCaptureResult {
    /// Number of species in the result
    pub fn species_count(&self) -> usize {
        self.per_species_fraction.len()
    }

    /// Sum of all species fractions
    pub fn total_fraction(&self) -> f64 {
        self.per_species_fraction.iter().sum()
    }

    /// Index of the species with the largest fraction.
    ///
    /// Ties resolve to the lowest index.
    pub fn dominant_species(&self) -> usize {
        self.per_species_fraction
            .iter()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |best, (s, &v)| {
                if v > best.1 {
                    (s, v)
                } else {
                    best
                }
            })
            .0
    }

    fn zeroed(
        species: usize,
        grid: LayerGrid,
        layer_lai: Vec<f64>,
        layer_intensity: Vec<f64>,
    ) -> Self {
        let layers = grid.layer_count();
        Self {
            per_species_fraction: vec![0.0; species],
            per_species_per_layer_fraction: vec![vec![0.0; layers]; species],
            layer_lai,
            layer_intensity,
            community_interception: 0.0,
            grid,
        }
    }
}

/// `1 − exp(−x)` without cancellation for small `x`.
#[inline]
pub(crate) fn interception(x: f64) -> f64 {
    -(-x).exp_m1()
}

/// Compute each species' share of community light interception.
///
/// Uses the default configuration: 5 cm layers sized to the tallest species
/// and community normalization.
///
/// # Arguments
/// * `heights` - Canopy height per species (m)
/// * `leaf_area_indices` - Leaf area index per species
/// * `extinction_coefficient` - Beer-Lambert `k`
///
/// # Errors
///
/// Returns [`InvalidInput`] for an empty species set, mismatched lengths,
/// negative or non-finite values, or a negative extinction coefficient. The
/// default grid also rejects canopies that would need more than
/// [`super::MAX_LAYERS`] layers (taller than 500 m at 5 cm) with
/// [`InvalidInput::TooManyLayers`].
///
/// # Example
///
/// ```
/// use canopy_light_core::compute_light_capture;
///
/// let result = compute_light_capture(&[0.8, 0.4], &[3.0, 2.0], 0.6).unwrap();
/// assert!(result.per_species_fraction[0] > result.per_species_fraction[1]);
/// assert!((result.total_fraction() - 1.0).abs() < 1e-9);
/// ```
pub fn compute_light_capture(
    heights: &[f64],
    leaf_area_indices: &[f64],
    extinction_coefficient: f64,
) -> Result<LightCaptureResult, InvalidInput> {
    let canopy = SpeciesCanopyState::from_slices(heights, leaf_area_indices)?;
    compute_light_capture_with(
        &canopy,
        extinction_coefficient,
        &LightCompetitionConfig::default(),
    )
}

/// Compute light capture for a validated canopy with explicit configuration.
///
/// # Errors
///
/// Returns [`InvalidInput`] if the extinction coefficient or grid
/// configuration is invalid.
pub fn compute_light_capture_with(
    canopy: &SpeciesCanopyState,
    extinction_coefficient: f64,
    config: &LightCompetitionConfig,
) -> Result<LightCaptureResult, InvalidInput> {
    check_extinction_coefficient(extinction_coefficient)?;
    let k = extinction_coefficient;
    let grid = config.grid.build(canopy)?;
    let layers = grid.layer_count();
    let species = canopy.species_count();

    let lai_by_layer = grid.allocate(canopy);

    let mut layer_lai = vec![0.0; layers];
    for row in &lai_by_layer {
        for (total, &lai) in layer_lai.iter_mut().zip(row) {
            *total += lai;
        }
    }

    // Light reaching the top of each layer, accumulated from the top down
    let mut layer_intensity = vec![0.0; layers];
    let mut cumulative_above = 0.0;
    for l in (0..layers).rev() {
        layer_intensity[l] = (-k * cumulative_above).exp();
        cumulative_above += layer_lai[l];
    }

    let community_interception = interception(k * canopy.canopy_leaf_area_index());

    debug!(
        "Light competition: {} species, {} layers of {:.3} m, comLIE {:.4}",
        species,
        layers,
        grid.layer_thickness(),
        community_interception
    );

    if community_interception <= 0.0 {
        return Ok(LightCaptureResult::zeroed(
            species,
            grid,
            layer_lai,
            layer_intensity,
        ));
    }

    let normalizer = match config.normalization {
        Normalization::Community => community_interception,
        Normalization::None => 1.0,
    };

    let mut per_species_per_layer_fraction = vec![vec![0.0; layers]; species];
    for l in 0..layers {
        let total = layer_lai[l];
        if total <= 0.0 {
            continue;
        }
        let captured = layer_intensity[l] * interception(k * total);
        trace!(
            "Layer {}: LAI {:.4}, intensity {:.4}, captured {:.4}",
            l,
            total,
            layer_intensity[l],
            captured
        );
        for s in 0..species {
            per_species_per_layer_fraction[s][l] =
                lai_by_layer[s][l] / total * captured / normalizer;
        }
    }

    let mut per_species_fraction: Vec<f64> = per_species_per_layer_fraction
        .iter()
        .map(|row| row.iter().sum::<f64>().clamp(0.0, 1.0))
        .collect();

    // A lone species holding all of the canopy's leaf area owns every layer,
    // so its share is exactly one rather than Σcaptured / comLIE.
    if config.normalization == Normalization::Community {
        if let Some(owner) = sole_leaf_area_owner(canopy, &lai_by_layer) {
            per_species_fraction[owner] = 1.0;
        }
    }

    Ok(LightCaptureResult {
        per_species_fraction,
        per_species_per_layer_fraction,
        layer_lai,
        layer_intensity,
        community_interception,
        grid,
    })
}

/// The only species with leaf area above ground, provided the grid kept it.
fn sole_leaf_area_owner(
    canopy: &SpeciesCanopyState,
    lai_by_layer: &[Vec<f64>],
) -> Option<usize> {
    let mut active = canopy
        .heights()
        .iter()
        .zip(canopy.leaf_area_indices())
        .enumerate()
        .filter(|(_, (&height, &lai))| height > 0.0 && lai > 0.0)
        .map(|(s, _)| s);
    let owner = active.next()?;
    if active.next().is_some() {
        return None;
    }
    lai_by_layer[owner].iter().any(|&v| v > 0.0).then_some(owner)
}
