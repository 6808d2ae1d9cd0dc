//! Per-species canopy state consumed by the light-competition engine.

use serde::{Deserialize, Serialize};

use super::error::{InvalidInput, SpeciesField};

/// Heights and leaf area indices of every species in a community.
///
/// The two arrays are parallel: index `s` describes the same species in both.
/// Construction validates the shape and sign invariants, so every value of this
/// type is a legal engine input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCanopyState")]
pub struct SpeciesCanopyState {
    /// Canopy height per species (m)
    heights: Vec<f64>,
    /// Leaf area index per species (m² leaf / m² ground)
    leaf_area_indices: Vec<f64>,
}

impl SpeciesCanopyState {
    /// Create a validated canopy state.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidInput`] if no species are given, the arrays differ in
    /// length, or any value is negative, NaN or infinite.
    pub fn new(heights: Vec<f64>, leaf_area_indices: Vec<f64>) -> Result<Self, InvalidInput> {
        if heights.is_empty() {
            return Err(InvalidInput::EmptySpeciesSet);
        }
        if heights.len() != leaf_area_indices.len() {
            return Err(InvalidInput::LengthMismatch {
                heights: heights.len(),
                other: leaf_area_indices.len(),
                field: SpeciesField::LeafAreaIndex,
            });
        }

        for (species, &value) in heights.iter().enumerate() {
            if !value.is_finite() {
                return Err(InvalidInput::NonFiniteValue {
                    species,
                    field: SpeciesField::Height,
                    value,
                });
            }
            if value < 0.0 {
                return Err(InvalidInput::NegativeHeight { species, value });
            }
        }
        for (species, &value) in leaf_area_indices.iter().enumerate() {
            if !value.is_finite() {
                return Err(InvalidInput::NonFiniteValue {
                    species,
                    field: SpeciesField::LeafAreaIndex,
                    value,
                });
            }
            if value < 0.0 {
                return Err(InvalidInput::NegativeLeafAreaIndex { species, value });
            }
        }

        Ok(Self {
            heights,
            leaf_area_indices,
        })
    }

    /// Create a canopy state by copying borrowed slices.
    ///
    /// # Errors
    ///
    /// Same conditions as [`SpeciesCanopyState::new`].
    pub fn from_slices(heights: &[f64], leaf_area_indices: &[f64]) -> Result<Self, InvalidInput> {
        Self::new(heights.to_vec(), leaf_area_indices.to_vec())
    }

    /// Number of species (always at least 1)
    pub fn species_count(&self) -> usize {
        self.heights.len()
    }

    /// Canopy heights (m)
    pub fn heights(&self) -> &[f64] {
        &self.heights
    }

    /// Leaf area indices
    pub fn leaf_area_indices(&self) -> &[f64] {
        &self.leaf_area_indices
    }

    /// Height of the tallest species (m)
    pub fn max_height(&self) -> f64 {
        self.heights.iter().copied().fold(0.0, f64::max)
    }

    /// Leaf area of all species that occupy the canopy.
    ///
    /// A species with zero height holds no leaf area above ground, so its LAI
    /// does not count toward the community total.
    pub fn canopy_leaf_area_index(&self) -> f64 {
        self.heights
            .iter()
            .zip(&self.leaf_area_indices)
            .filter(|(&h, _)| h > 0.0)
            .map(|(_, &lai)| lai)
            .sum()
    }
}

/// Unvalidated wire form; deserialization goes through [`SpeciesCanopyState::new`].
#[derive(Deserialize)]
struct RawCanopyState {
    heights: Vec<f64>,
    leaf_area_indices: Vec<f64>,
}

impl TryFrom<RawCanopyState> for SpeciesCanopyState {
    type Error = InvalidInput;

    fn try_from(raw: RawCanopyState) -> Result<Self, Self::Error> {
        SpeciesCanopyState::new(raw.heights, raw.leaf_area_indices)
    }
}

/// Validate an optional per-species weight array against `species_count`.
///
/// Weights must be finite and non-negative.
pub(crate) fn check_weights(weights: &[f64], species_count: usize) -> Result<(), InvalidInput> {
    if weights.len() != species_count {
        return Err(InvalidInput::LengthMismatch {
            heights: species_count,
            other: weights.len(),
            field: SpeciesField::Weight,
        });
    }
    for (species, &value) in weights.iter().enumerate() {
        if !value.is_finite() || value < 0.0 {
            return Err(InvalidInput::NonFiniteValue {
                species,
                field: SpeciesField::Weight,
                value,
            });
        }
    }
    Ok(())
}
