//! Whole-community light interception helpers.
//!
//! Closed-form companions to the layered model: the unstratified Beer-Lambert
//! interception of the whole sward, a shading factor that penalises short
//! communities, and the growth reducer for excess radiation.

use super::light_competition::interception;

/// Reference height at which community shading equals `α` (m)
const SHADING_REFERENCE_HEIGHT: f64 = 0.2;

/// Fraction of incoming light intercepted by the canopy as a single layer.
///
/// `1 − exp(−k · LAI_tot)`. Negative leaf area or extinction is treated as zero.
pub fn community_interception(total_lai: f64, extinction_coefficient: f64) -> f64 {
    let exponent = total_lai.max(0.0) * extinction_coefficient.max(0.0);
    interception(exponent).clamp(0.0, 1.0)
}

/// Weighted mean canopy height of a community.
///
/// Returns `None` when the lengths differ or the weights sum to zero.
pub fn community_weighted_mean_height(heights: &[f64], weights: &[f64]) -> Option<f64> {
    if heights.len() != weights.len() {
        return None;
    }
    let total_weight: f64 = weights.iter().sum();
    if total_weight <= 0.0 {
        return None;
    }
    let weighted: f64 = heights.iter().zip(weights).map(|(h, w)| h * w).sum();
    Some(weighted / total_weight)
}

/// Reduction of light interception for short swards.
///
/// `α^(0.2 / H_cwm)`: equals `α` at 0.2 m, tends to 1 for tall canopies and
/// to 0 for very short ones. `α` is clamped to [0, 1].
pub fn community_height_shading(alpha_com_height: f64, cwm_height: f64) -> f64 {
    let alpha = alpha_com_height.clamp(0.0, 1.0);
    if alpha >= 1.0 {
        return 1.0;
    }
    if cwm_height <= 0.0 || alpha <= 0.0 {
        return 0.0;
    }
    (alpha.ln() * SHADING_REFERENCE_HEIGHT / cwm_height).exp()
}

/// Community interception with an optional height-shading factor.
pub fn intercepted_fraction(
    total_lai: f64,
    extinction_coefficient: f64,
    shading: Option<f64>,
) -> f64 {
    let fpar = community_interception(total_lai, extinction_coefficient);
    match shading {
        Some(factor) => fpar * factor.clamp(0.0, 1.0),
        None => fpar,
    }
}

/// Growth reduction due to excess photosynthetically active radiation.
///
/// `clamp(1 − γ1 · (PAR − γ2), 0, 1)`: no reduction below the threshold `γ2`,
/// then a linear decline with slope `γ1`.
///
/// # Arguments
/// * `par` - Photosynthetically active radiation (MJ/ha)
/// * `gamma1` - Slope of the decline per unit PAR above the threshold
/// * `gamma2` - PAR threshold above which growth is reduced
pub fn radiation_reducer(par: f64, gamma1: f64, gamma2: f64) -> f64 {
    (1.0 - gamma1 * (par - gamma2)).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_community_interception() {
        assert_eq!(community_interception(0.0, 0.6), 0.0);
        assert_relative_eq!(
            community_interception(5.0, 0.6),
            1.0 - (-3.0f64).exp(),
            epsilon = 1e-12
        );
        assert_eq!(community_interception(-1.0, 0.6), 0.0);
        assert_relative_eq!(community_interception(100.0, 0.6), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_weighted_mean_height() {
        assert_relative_eq!(
            community_weighted_mean_height(&[0.8, 0.4], &[1.0, 1.0]).unwrap(),
            0.6,
            epsilon = 1e-12
        );
        assert_relative_eq!(
            community_weighted_mean_height(&[0.8, 0.4], &[3.0, 1.0]).unwrap(),
            0.7,
            epsilon = 1e-12
        );
        assert_eq!(community_weighted_mean_height(&[0.8], &[0.0]), None);
        assert_eq!(community_weighted_mean_height(&[0.8], &[1.0, 2.0]), None);
    }

    #[test]
    fn test_height_shading() {
        assert_relative_eq!(community_height_shading(0.75, 0.2), 0.75, epsilon = 1e-12);
        assert_relative_eq!(
            community_height_shading(0.75, 0.7),
            0.75f64.powf(0.2 / 0.7),
            epsilon = 1e-12
        );
        assert_eq!(community_height_shading(1.0, 0.0), 1.0);
        assert_eq!(community_height_shading(0.75, 0.0), 0.0);

        // Taller swards are shaded less
        assert!(community_height_shading(0.75, 1.0) > community_height_shading(0.75, 0.5));
    }

    #[test]
    fn test_intercepted_fraction_with_shading() {
        let plain = intercepted_fraction(3.0, 0.6, None);
        let shaded = intercepted_fraction(3.0, 0.6, Some(community_height_shading(0.75, 0.7)));
        assert!(shaded < plain);
        assert_relative_eq!(shaded, plain * 0.75f64.powf(0.2 / 0.7), epsilon = 1e-12);
    }

    #[test]
    fn test_radiation_reducer() {
        assert_eq!(radiation_reducer(0.0, 4.45e-6, 50_000.0), 1.0);
        assert_eq!(radiation_reducer(50_000.0, 4.45e-6, 50_000.0), 1.0);
        assert_relative_eq!(
            radiation_reducer(100_000.0, 4.45e-6, 50_000.0),
            1.0 - 4.45e-6 * 50_000.0,
            epsilon = 1e-12
        );
        assert_eq!(radiation_reducer(1e9, 4.45e-6, 50_000.0), 0.0);
    }
}
