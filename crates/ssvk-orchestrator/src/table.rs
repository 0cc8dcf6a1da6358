// ─────────────────────────────────────────────────────────────────────
// Tamesis SSVK — Result Tables
// ─────────────────────────────────────────────────────────────────────
//! Aggregated experiment rows with CSV and JSON export.
//!
//! CSV: UTF-8, comma separated, one header row, string fields quoted
//! with embedded quotes doubled, missing values left empty.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use ssvk_types::{ExperimentResult, SsvkError, SsvkResult};

use crate::summary::SweepSummary;

pub const CSV_HEADER: &str = "N,gap,classification,repulsion_index,run_id,seed,experiment,\
sweep_index,sample_index,operator,status,confidence,mean_ratio,unfold_degree,bulk_lower,\
bulk_upper,fidelity,spectrum_len,zero_modes,diagnostic,figure";

/// Experiment rows in deterministic sweep order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultTable {
    rows: Vec<ExperimentResult>,
}

/// Gap statistics of one problem size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapRow {
    pub n: usize,
    /// Mean over samples that produced a gap.
    pub mean_gap: Option<f64>,
    pub gaps: Vec<f64>,
    /// Samples at this N without a gap.
    pub failed: usize,
}

/// Order rows by sweep parameter, then sweep point, then sample.
pub fn aggregate(results: Vec<ExperimentResult>) -> ResultTable {
    let mut rows = results;
    rows.sort_by_key(|r| (r.n, r.sweep_index, r.sample_index));
    ResultTable { rows }
}

impl ResultTable {
    pub fn rows(&self) -> &[ExperimentResult] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut [ExperimentResult] {
        &mut self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn summary(&self) -> SweepSummary {
        SweepSummary::from_rows(&self.rows)
    }

    /// {N, average gap, per-sample gaps} in ascending N.
    pub fn gap_rows(&self) -> Vec<GapRow> {
        let mut out: Vec<GapRow> = Vec::new();
        for row in &self.rows {
            let idx = match out.iter().position(|g| g.n == row.n) {
                Some(i) => i,
                None => {
                    out.push(GapRow {
                        n: row.n,
                        mean_gap: None,
                        gaps: Vec::new(),
                        failed: 0,
                    });
                    out.len() - 1
                }
            };
            match row.gap {
                Some(gap) => out[idx].gaps.push(gap),
                None => out[idx].failed += 1,
            }
        }
        for g in &mut out {
            if !g.gaps.is_empty() {
                g.mean_gap = Some(g.gaps.iter().sum::<f64>() / g.gaps.len() as f64);
            }
        }
        out
    }

    pub fn to_csv_string(&self) -> String {
        let mut out = String::with_capacity(CSV_HEADER.len() * (self.rows.len() + 1));
        out.push_str(CSV_HEADER);
        out.push('\n');
        for row in &self.rows {
            out.push_str(&csv_line(row));
            out.push('\n');
        }
        out
    }

    pub fn write_csv(&self, path: &Path) -> SsvkResult<()> {
        let mut w = BufWriter::new(File::create(path)?);
        w.write_all(self.to_csv_string().as_bytes())?;
        w.flush()?;
        Ok(())
    }

    pub fn write_json(&self, path: &Path) -> SsvkResult<()> {
        let mut w = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut w, &self.rows).map_err(|e| SsvkError::Io(e.into()))?;
        w.flush()?;
        Ok(())
    }
}

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

fn opt<T: ToString>(v: Option<T>) -> String {
    v.map(|x| x.to_string()).unwrap_or_default()
}

fn csv_line(r: &ExperimentResult) -> String {
    let fields = [
        r.n.to_string(),
        opt(r.gap),
        quote(r.classification.as_str()),
        opt(r.repulsion_index),
        quote(&r.run_id),
        r.seed.to_string(),
        quote(&r.experiment),
        r.sweep_index.to_string(),
        r.sample_index.to_string(),
        quote(&r.operator),
        quote(r.status.as_str()),
        r.confidence.to_string(),
        opt(r.mean_ratio),
        opt(r.unfold_degree),
        r.bulk_lower.to_string(),
        r.bulk_upper.to_string(),
        opt(r.fidelity),
        opt(r.spectrum.as_ref().map(|s| s.len)),
        opt(r.spectrum.as_ref().map(|s| s.zero_modes)),
        r.diagnostic.as_deref().map(quote).unwrap_or_default(),
        r.figure
            .as_ref()
            .map(|p| quote(&p.display().to_string()))
            .unwrap_or_default(),
    ];
    fields.join(",")
}
