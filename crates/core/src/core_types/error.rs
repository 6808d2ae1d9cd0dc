//! Input validation errors for the light-competition engine.
//!
//! Every failure the engine can report is a caller contract violation detected
//! before any computation runs. There is no transient or retryable class: the
//! engine performs no I/O.

use std::fmt;

/// Which per-species input array a value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeciesField {
    /// Canopy height (m)
    Height,
    /// Leaf area index (m²/m²)
    LeafAreaIndex,
    /// Community weighting factor (biomass, cover, ...)
    Weight,
}

impl fmt::Display for SpeciesField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpeciesField::Height => write!(f, "height"),
            SpeciesField::LeafAreaIndex => write!(f, "leaf area index"),
            SpeciesField::Weight => write!(f, "weight"),
        }
    }
}

/// Invalid caller input.
#[derive(Debug, Clone, PartialEq)]
pub enum InvalidInput {
    /// No species were supplied
    EmptySpeciesSet,
    /// Parallel per-species arrays differ in length
    LengthMismatch {
        /// Number of heights supplied
        heights: usize,
        /// Length of the array that disagreed with `heights`
        other: usize,
        /// Which array disagreed
        field: SpeciesField,
    },
    /// A species height is below zero
    NegativeHeight { species: usize, value: f64 },
    /// A species leaf area index is below zero
    NegativeLeafAreaIndex { species: usize, value: f64 },
    /// A per-species value is NaN or infinite (or a weight is negative)
    NonFiniteValue {
        species: usize,
        field: SpeciesField,
        value: f64,
    },
    /// Extinction coefficient is negative or not finite
    InvalidExtinctionCoefficient(f64),
    /// Layer thickness is not a finite positive number
    InvalidLayerThickness(f64),
    /// Fixed grid height is negative or not finite
    InvalidGridHeight(f64),
    /// The canopy would need more layers than the engine allows
    TooManyLayers { required: f64, max: usize },
    /// Competition exponent is negative or not finite
    InvalidExponent(f64),
    /// A batch supplied a different number of extinction coefficients than canopies
    CoefficientCountMismatch { canopies: usize, coefficients: usize },
}

impl fmt::Display for InvalidInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidInput::EmptySpeciesSet => write!(f, "Invalid input: empty species set"),
            InvalidInput::LengthMismatch {
                heights,
                other,
                field,
            } => write!(
                f,
                "Invalid input: {heights} heights but {other} {field} values"
            ),
            InvalidInput::NegativeHeight { species, value } => {
                write!(f, "Invalid input: species {species} has negative height {value}")
            }
            InvalidInput::NegativeLeafAreaIndex { species, value } => write!(
                f,
                "Invalid input: species {species} has negative leaf area index {value}"
            ),
            InvalidInput::NonFiniteValue {
                species,
                field,
                value,
            } => write!(f, "Invalid input: species {species} has invalid {field} {value}"),
            InvalidInput::InvalidExtinctionCoefficient(k) => write!(
                f,
                "Invalid input: extinction coefficient must be finite and >= 0, got {k}"
            ),
            InvalidInput::InvalidLayerThickness(dh) => write!(
                f,
                "Invalid input: layer thickness must be finite and > 0, got {dh}"
            ),
            InvalidInput::InvalidGridHeight(h) => write!(
                f,
                "Invalid input: fixed grid height must be finite and >= 0, got {h}"
            ),
            InvalidInput::TooManyLayers { required, max } => write!(
                f,
                "Invalid input: canopy needs {required} layers, limit is {max}"
            ),
            InvalidInput::InvalidExponent(beta) => write!(
                f,
                "Invalid input: competition exponent must be finite and >= 0, got {beta}"
            ),
            InvalidInput::CoefficientCountMismatch {
                canopies,
                coefficients,
            } => write!(
                f,
                "Invalid input: {canopies} canopies but {coefficients} extinction coefficients"
            ),
        }
    }
}

impl std::error::Error for InvalidInput {}

/// Validate a Beer-Lambert extinction coefficient.
///
/// Zero is accepted: it is degenerate (nothing is intercepted) but well defined.
pub(crate) fn check_extinction_coefficient(k: f64) -> Result<(), InvalidInput> {
    if k.is_finite() && k >= 0.0 {
        Ok(())
    } else {
        Err(InvalidInput::InvalidExtinctionCoefficient(k))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_offending_species() {
        let err = InvalidInput::NegativeHeight {
            species: 3,
            value: -0.2,
        };
        assert_eq!(
            err.to_string(),
            "Invalid input: species 3 has negative height -0.2"
        );
    }

    #[test]
    fn test_length_mismatch_display() {
        let err = InvalidInput::LengthMismatch {
            heights: 2,
            other: 3,
            field: SpeciesField::LeafAreaIndex,
        };
        assert_eq!(
            err.to_string(),
            "Invalid input: 2 heights but 3 leaf area index values"
        );

        let err = InvalidInput::CoefficientCountMismatch {
            canopies: 3,
            coefficients: 1,
        };
        assert_eq!(
            err.to_string(),
            "Invalid input: 3 canopies but 1 extinction coefficients"
        );
    }

    #[test]
    fn test_extinction_coefficient_check() {
        assert!(check_extinction_coefficient(0.6).is_ok());
        assert!(check_extinction_coefficient(0.0).is_ok());
        assert_eq!(
            check_extinction_coefficient(-0.1),
            Err(InvalidInput::InvalidExtinctionCoefficient(-0.1))
        );
        assert!(check_extinction_coefficient(f64::NAN).is_err());
        assert!(check_extinction_coefficient(f64::INFINITY).is_err());
    }
}
