// ─────────────────────────────────────────────────────────────────────
// Tamesis SSVK — Thermal Fidelity Overlay
// ─────────────────────────────────────────────────────────────────────
//! Two-level ground-state occupation under thermal noise:
//!
//!   F(Δ, T) = 1 / (1 + exp(−Δ/T))
//!
//! At T = 0 the limit is a step: F = 1 for Δ > 0 and F = ½ at Δ = 0.

use ssvk_types::{SsvkError, SsvkResult};

fn check_inputs(gap: f64, temperature: f64) -> SsvkResult<()> {
    if !(gap.is_finite() && gap >= 0.0) {
        return Err(SsvkError::InvalidParameters(format!(
            "gap must be finite and >= 0, got {gap}"
        )));
    }
    if !(temperature.is_finite() && temperature >= 0.0) {
        return Err(SsvkError::InvalidParameters(format!(
            "temperature must be finite and >= 0, got {temperature}"
        )));
    }
    Ok(())
}

/// Probability of remaining in the ground state across a gap `gap` at
/// temperature `temperature`.
pub fn thermal_fidelity(gap: f64, temperature: f64) -> SsvkResult<f64> {
    check_inputs(gap, temperature)?;
    if gap == 0.0 {
        return Ok(0.5);
    }
    if temperature == 0.0 {
        return Ok(1.0);
    }
    // exp(−Δ/T) ≤ 1 for Δ ≥ 0, no overflow
    Ok(1.0 / (1.0 + (-gap / temperature).exp()))
}

/// Fidelity of one gap over a range of temperatures, as (T, F) pairs.
pub fn fidelity_curve(gap: f64, temperatures: &[f64]) -> SsvkResult<Vec<(f64, f64)>> {
    temperatures
        .iter()
        .map(|&t| thermal_fidelity(gap, t).map(|f| (t, f)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_censorship_gaps_decrease_monotonically() {
        let gaps = [1.0, 0.5, 0.25, 0.125, 0.0625];
        let f: Vec<f64> = gaps
            .iter()
            .map(|&g| thermal_fidelity(g, 0.1).unwrap())
            .collect();
        for w in f.windows(2) {
            assert!(w[1] < w[0], "fidelities not decreasing: {f:?}");
        }
        assert!(f[0] > 0.9999, "F(1.0) = {}", f[0]);
        // 1/(1+e^{-0.625})
        assert!(f[4] > 0.6 && f[4] < 0.7, "F(0.0625) = {}", f[4]);
        assert_relative_eq!(f[4], 1.0 / (1.0 + (-0.625_f64).exp()), max_relative = 1e-12);
    }

    #[test]
    fn test_zero_gap_is_half() {
        assert_eq!(thermal_fidelity(0.0, 0.1).unwrap(), 0.5);
        assert_eq!(thermal_fidelity(0.0, 0.0).unwrap(), 0.5);
    }

    #[test]
    fn test_zero_temperature_step() {
        assert_eq!(thermal_fidelity(1e-6, 0.0).unwrap(), 1.0);
    }

    #[test]
    fn test_rejects_bad_inputs() {
        assert!(thermal_fidelity(-0.1, 0.1).is_err());
        assert!(thermal_fidelity(f64::NAN, 0.1).is_err());
        assert!(thermal_fidelity(0.1, -1.0).is_err());
    }

    #[test]
    fn test_curve_decreases_with_temperature() {
        let curve = fidelity_curve(0.5, &[0.01, 0.1, 1.0, 10.0]).unwrap();
        assert_eq!(curve.len(), 4);
        for w in curve.windows(2) {
            assert!(w[1].1 < w[0].1, "curve {curve:?}");
        }
        assert!(curve[3].1 > 0.5);
    }
}
