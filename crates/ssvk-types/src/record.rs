// ─────────────────────────────────────────────────────────────────────
// Tamesis SSVK — Result Records
// ─────────────────────────────────────────────────────────────────────

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Verdict of the spacing classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpacingLabel {
    Poisson,
    #[serde(rename = "GOE")]
    Goe,
    #[serde(rename = "GUE")]
    Gue,
    #[serde(rename = "inconclusive")]
    Inconclusive,
}

impl SpacingLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpacingLabel::Poisson => "Poisson",
            SpacingLabel::Goe => "GOE",
            SpacingLabel::Gue => "GUE",
            SpacingLabel::Inconclusive => "inconclusive",
        }
    }

    pub fn is_conclusive(&self) -> bool {
        !matches!(self, SpacingLabel::Inconclusive)
    }
}

impl fmt::Display for SpacingLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one sweep sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleStatus {
    /// Pipeline ran to the end with a conclusive classification.
    Completed,
    /// Pipeline ran to the end but the classifier (or unfolding) could
    /// not decide.
    Inconclusive,
    /// Eigensolver failed; the sample carries no spectrum.
    NumericalBreakdown,
    /// Per-sample deadline tripped.
    TimedOut,
    /// The sweep was cancelled before this sample finished.
    Cancelled,
}

impl SampleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SampleStatus::Completed => "completed",
            SampleStatus::Inconclusive => "inconclusive",
            SampleStatus::NumericalBreakdown => "numerical",
            SampleStatus::TimedOut => "timeout",
            SampleStatus::Cancelled => "cancelled",
        }
    }

    /// Whether the sample produced usable output.
    pub fn is_success(&self) -> bool {
        matches!(self, SampleStatus::Completed | SampleStatus::Inconclusive)
    }
}

impl fmt::Display for SampleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compact description of an extracted spectrum.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpectrumSummary {
    pub len: usize,
    pub min: f64,
    pub max: f64,
    /// λ₁ − λ₀, floored at 1e-9.
    pub gap: f64,
    /// Eigenvalues within the zero-mode tolerance.
    pub zero_modes: usize,
}

/// One row of an experiment: parameters, spectrum summary,
/// classification, and optional overlays. Immutable once emitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentResult {
    pub experiment: String,
    pub run_id: String,
    pub sweep_index: usize,
    pub sample_index: usize,
    pub n: usize,
    /// Seed actually used for this sample (derived from the master seed).
    pub seed: u64,
    /// Operator diagonalised for this sample.
    pub operator: String,
    pub status: SampleStatus,
    pub gap: Option<f64>,
    pub classification: SpacingLabel,
    pub confidence: f64,
    pub repulsion_index: Option<f64>,
    pub mean_ratio: Option<f64>,
    pub unfold_degree: Option<usize>,
    pub bulk_lower: f64,
    pub bulk_upper: f64,
    pub fidelity: Option<f64>,
    pub spectrum: Option<SpectrumSummary>,
    pub diagnostic: Option<String>,
    pub figure: Option<PathBuf>,
}

impl ExperimentResult {
    /// Skeleton row for a sample that produced nothing but a status.
    pub fn failed(
        experiment: &str,
        run_id: &str,
        sweep_index: usize,
        sample_index: usize,
        n: usize,
        seed: u64,
        status: SampleStatus,
        diagnostic: String,
    ) -> Self {
        Self {
            experiment: experiment.to_string(),
            run_id: run_id.to_string(),
            sweep_index,
            sample_index,
            n,
            seed,
            operator: String::new(),
            status,
            gap: None,
            classification: SpacingLabel::Inconclusive,
            confidence: 0.0,
            repulsion_index: None,
            mean_ratio: None,
            unfold_degree: None,
            bulk_lower: 0.0,
            bulk_upper: 0.0,
            fidelity: None,
            spectrum: None,
            diagnostic: Some(diagnostic),
            figure: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_display() {
        assert_eq!(SpacingLabel::Gue.to_string(), "GUE");
        assert_eq!(SpacingLabel::Inconclusive.to_string(), "inconclusive");
        assert!(!SpacingLabel::Inconclusive.is_conclusive());
    }

    #[test]
    fn test_label_serde_names() {
        let json = serde_json::to_string(&SpacingLabel::Goe).unwrap();
        assert_eq!(json, "\"GOE\"");
    }

    #[test]
    fn test_status_success() {
        assert!(SampleStatus::Completed.is_success());
        assert!(SampleStatus::Inconclusive.is_success());
        assert!(!SampleStatus::TimedOut.is_success());
        assert!(!SampleStatus::NumericalBreakdown.is_success());
    }

    #[test]
    fn test_failed_row() {
        let row = ExperimentResult::failed(
            "sat-gap",
            "sat-gap-0000",
            2,
            1,
            12,
            99,
            SampleStatus::TimedOut,
            "budget".into(),
        );
        assert_eq!(row.classification, SpacingLabel::Inconclusive);
        assert!(row.gap.is_none());
        assert_eq!(row.status, SampleStatus::TimedOut);
    }
}
