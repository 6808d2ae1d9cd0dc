//! Vertical canopy discretisation for light competition.
//!
//! The canopy is cut into horizontal slices of fixed thickness `Δh`. Layer `l`
//! spans the half-open interval `[l·Δh, (l+1)·Δh)`, so layer index increases
//! with height and the topmost layer receives unattenuated light.
//!
//! Each species spreads its leaf area over every layer from the ground up to
//! the layer containing its height. The top (partial) layer receives the share
//! of the species' own height that lies inside it; the layers below share the
//! remainder evenly:
//!
//! ```text
//! upper  = (h − l*·Δh) / h
//! lower  = (1 − upper) / l*        for each of the l* layers below
//! ```
//!
//! The split is height-weighted, not layer-volume-weighted.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core_types::{InvalidInput, SpeciesCanopyState};

/// Default layer thickness (m)
pub const DEFAULT_LAYER_THICKNESS: f64 = 0.05;

/// Grid height used by the documented two-species plots (m)
pub const REFERENCE_MAX_HEIGHT: f64 = 1.55;

/// Upper bound on the number of layers a single evaluation may build
pub const MAX_LAYERS: usize = 10_000;

/// How far the layer grid extends above the ground.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridExtent {
    /// Size the grid from the tallest species so all leaf area is counted.
    Dynamic,
    /// Fixed grid top (m). Species taller than the grid are dropped entirely.
    Fixed { max_height: f64 },
}

/// Layer grid configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerGridConfig {
    /// Thickness of each layer (m)
    pub layer_thickness: f64,
    /// Vertical extent of the grid
    pub extent: GridExtent,
}

impl Default for LayerGridConfig {
    /// 5 cm layers sized from the input canopy.
    fn default() -> Self {
        Self {
            layer_thickness: DEFAULT_LAYER_THICKNESS,
            extent: GridExtent::Dynamic,
        }
    }
}

impl LayerGridConfig {
    /// Grid used by the documented plots: 31 layers of 5 cm up to 1.55 m.
    pub fn reference() -> Self {
        Self {
            layer_thickness: DEFAULT_LAYER_THICKNESS,
            extent: GridExtent::Fixed {
                max_height: REFERENCE_MAX_HEIGHT,
            },
        }
    }

    /// Dynamic grid with a custom layer thickness.
    pub fn dynamic(layer_thickness: f64) -> Self {
        Self {
            layer_thickness,
            extent: GridExtent::Dynamic,
        }
    }

    /// Fixed grid with a custom layer thickness and top.
    pub fn fixed(layer_thickness: f64, max_height: f64) -> Self {
        Self {
            layer_thickness,
            extent: GridExtent::Fixed { max_height },
        }
    }

    /// Build the grid for a particular canopy.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidInput`] if the thickness is not a finite positive number,
    /// the fixed height is invalid, or the grid would exceed [`MAX_LAYERS`].
    pub fn build(&self, canopy: &SpeciesCanopyState) -> Result<LayerGrid, InvalidInput> {
        let dh = self.layer_thickness;
        if !dh.is_finite() || dh <= 0.0 {
            return Err(InvalidInput::InvalidLayerThickness(dh));
        }

        let layer_count = match self.extent {
            GridExtent::Dynamic => {
                let top = canopy.max_height();
                check_layer_budget(top / dh)?;
                if top > 0.0 {
                    layer_containing(top, dh, MAX_LAYERS).ok_or_else(|| {
                        InvalidInput::TooManyLayers {
                            required: (top / dh).ceil(),
                            max: MAX_LAYERS,
                        }
                    })? + 1
                } else {
                    1
                }
            }
            GridExtent::Fixed { max_height } => {
                if !max_height.is_finite() || max_height < 0.0 {
                    return Err(InvalidInput::InvalidGridHeight(max_height));
                }
                let required = (max_height / dh).ceil();
                check_layer_budget(required)?;
                (required as usize).max(1)
            }
        };

        Ok(LayerGrid {
            layer_thickness: dh,
            layer_count,
        })
    }
}

fn check_layer_budget(required: f64) -> Result<(), InvalidInput> {
    if required.ceil() > MAX_LAYERS as f64 {
        Err(InvalidInput::TooManyLayers {
            required: required.ceil(),
            max: MAX_LAYERS,
        })
    } else {
        Ok(())
    }
}

/// Index of the layer `l` with `l·Δh < height ≤ (l+1)·Δh`, searched among the
/// first `layer_count` layers.
///
/// Bounds are compared as `l·Δh` products rather than derived from a single
/// division so that heights sitting exactly on a boundary land in the lower
/// layer. Returns `None` when the height lies above the top of the stack.
fn layer_containing(height: f64, dh: f64, layer_count: usize) -> Option<usize> {
    if layer_count == 0 || height > layer_count as f64 * dh {
        return None;
    }
    let last = layer_count - 1;
    let mut layer = ((height / dh).ceil() as usize).saturating_sub(1).min(last);
    while layer > 0 && height <= layer as f64 * dh {
        layer -= 1;
    }
    while layer < last && height > (layer + 1) as f64 * dh {
        layer += 1;
    }
    Some(layer)
}

/// A concrete stack of equal-thickness canopy layers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LayerGrid {
    layer_thickness: f64,
    layer_count: usize,
}

impl LayerGrid {
    /// Thickness of each layer (m)
    pub fn layer_thickness(&self) -> f64 {
        self.layer_thickness
    }

    /// Number of layers (always at least 1)
    pub fn layer_count(&self) -> usize {
        self.layer_count
    }

    /// Height of the top of the grid (m)
    pub fn top(&self) -> f64 {
        self.layer_count as f64 * self.layer_thickness
    }

    /// Height range `[min, max)` of a layer in meters
    pub fn height_range(&self, layer: usize) -> (f64, f64) {
        (
            layer as f64 * self.layer_thickness,
            (layer + 1) as f64 * self.layer_thickness,
        )
    }

    /// Layer holding the top of a canopy of the given height.
    ///
    /// `None` for zero height (no leaf area above ground) or when the height is
    /// above the grid.
    pub fn top_layer_of(&self, height: f64) -> Option<usize> {
        if height <= 0.0 {
            return None;
        }
        layer_containing(height, self.layer_thickness, self.layer_count)
    }

    /// Distribute each species' leaf area over the layers it occupies.
    ///
    /// Returns an S × `layer_count` matrix of leaf area index. Species taller
    /// than the grid receive an empty row.
    pub fn allocate(&self, canopy: &SpeciesCanopyState) -> Vec<Vec<f64>> {
        canopy
            .heights()
            .iter()
            .zip(canopy.leaf_area_indices())
            .enumerate()
            .map(|(species, (&height, &lai))| {
                let mut row = vec![0.0; self.layer_count];
                if height <= 0.0 || lai <= 0.0 {
                    return row;
                }
                let Some(top) = self.top_layer_of(height) else {
                    warn!(
                        "Species {} at {:.3} m is above the {:.3} m layer grid, its leaf area is ignored",
                        species,
                        height,
                        self.top()
                    );
                    return row;
                };

                let (layer_min, _) = self.height_range(top);
                let upper = (height - layer_min) / height;
                row[top] = upper * lai;

                // Bottom layer only: nothing below to share with
                if top > 0 {
                    let lower = (1.0 - upper) / top as f64 * lai;
                    row[..top].fill(lower);
                }
                row
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn canopy(heights: &[f64], lai: &[f64]) -> SpeciesCanopyState {
        SpeciesCanopyState::from_slices(heights, lai).unwrap()
    }

    #[test]
    fn test_reference_grid_has_31_layers() {
        let grid = LayerGridConfig::reference()
            .build(&canopy(&[0.8, 0.4], &[3.0, 2.0]))
            .unwrap();
        assert_eq!(grid.layer_count(), 31);
        assert_relative_eq!(grid.top(), 1.55, epsilon = 1e-12);
    }

    #[test]
    fn test_dynamic_grid_fits_tallest_species() {
        let grid = LayerGridConfig::default()
            .build(&canopy(&[0.8, 0.4], &[3.0, 2.0]))
            .unwrap();
        assert_eq!(grid.layer_count(), 16);
        assert_eq!(grid.top_layer_of(0.8), Some(15));

        let grid = LayerGridConfig::default()
            .build(&canopy(&[2.42], &[1.0]))
            .unwrap();
        assert_eq!(grid.top_layer_of(2.42), Some(grid.layer_count() - 1));
    }

    #[test]
    fn test_dynamic_grid_for_bare_ground() {
        let grid = LayerGridConfig::default()
            .build(&canopy(&[0.0, 0.0], &[1.0, 1.0]))
            .unwrap();
        assert_eq!(grid.layer_count(), 1);
    }

    #[test]
    fn test_boundary_height_lands_in_lower_layer() {
        let grid = LayerGridConfig::reference()
            .build(&canopy(&[0.4], &[1.0]))
            .unwrap();
        // 0.4 m is the top edge of layer 7 (0.35, 0.40]
        assert_eq!(grid.top_layer_of(0.4), Some(7));
        assert_eq!(grid.top_layer_of(0.05), Some(0));
        assert_eq!(grid.top_layer_of(0.051), Some(1));
        assert_eq!(grid.top_layer_of(0.0), None);
    }

    #[test]
    fn test_lookup_above_grid_is_bounded() {
        let grid = LayerGridConfig::reference()
            .build(&canopy(&[0.4], &[1.0]))
            .unwrap();
        // The grid top itself still belongs to the top layer
        assert_eq!(grid.top_layer_of(grid.top()), Some(30));
        assert_eq!(grid.top_layer_of(1.56), None);
        assert_eq!(grid.top_layer_of(1e18), None);
        assert_eq!(grid.top_layer_of(f64::MAX), None);
    }

    #[test]
    fn test_allocation_conserves_leaf_area() {
        let state = canopy(&[0.8, 0.37, 0.02], &[3.0, 2.0, 0.5]);
        let grid = LayerGridConfig::default().build(&state).unwrap();
        let rows = grid.allocate(&state);

        for (row, &lai) in rows.iter().zip(state.leaf_area_indices()) {
            assert_relative_eq!(row.iter().sum::<f64>(), lai, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_allocation_split_is_height_weighted() {
        // 0.37 m sits in layer 7 [0.35, 0.40)
        let state = canopy(&[0.37], &[2.0]);
        let grid = LayerGridConfig::default().build(&state).unwrap();
        let row = &grid.allocate(&state)[0];

        let upper = (0.37 - 0.35) / 0.37;
        assert_relative_eq!(row[7], upper * 2.0, epsilon = 1e-12);
        for layer in 0..7 {
            assert_relative_eq!(row[layer], (1.0 - upper) / 7.0 * 2.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_bottom_layer_species_keeps_all_leaf_area() {
        let state = canopy(&[0.03], &[1.2]);
        let grid = LayerGridConfig::default().build(&state).unwrap();
        let row = &grid.allocate(&state)[0];
        assert_eq!(row.len(), 1);
        assert_eq!(row[0], 1.2);
    }

    #[test]
    fn test_zero_height_species_allocates_nothing() {
        let state = canopy(&[0.0, 0.5], &[3.0, 1.0]);
        let grid = LayerGridConfig::default().build(&state).unwrap();
        let rows = grid.allocate(&state);
        assert!(rows[0].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_fixed_grid_drops_species_above_top() {
        let state = canopy(&[2.0, 0.4], &[3.0, 2.0]);
        let grid = LayerGridConfig::reference().build(&state).unwrap();
        let rows = grid.allocate(&state);
        assert!(rows[0].iter().all(|&v| v == 0.0));
        assert_relative_eq!(rows[1].iter().sum::<f64>(), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_invalid_grid_configs() {
        let state = canopy(&[0.5], &[1.0]);
        assert_eq!(
            LayerGridConfig::dynamic(0.0).build(&state),
            Err(InvalidInput::InvalidLayerThickness(0.0))
        );
        assert!(LayerGridConfig::dynamic(f64::NAN).build(&state).is_err());
        assert_eq!(
            LayerGridConfig::fixed(0.05, -1.0).build(&state),
            Err(InvalidInput::InvalidGridHeight(-1.0))
        );
        assert!(matches!(
            LayerGridConfig::dynamic(1e-6).build(&state),
            Err(InvalidInput::TooManyLayers { .. })
        ));
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: LayerGridConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, LayerGridConfig::default());

        let config: LayerGridConfig =
            serde_json::from_str(r#"{"extent":{"fixed":{"max_height":1.55}}}"#).unwrap();
        assert_eq!(config, LayerGridConfig::reference());
    }
}
