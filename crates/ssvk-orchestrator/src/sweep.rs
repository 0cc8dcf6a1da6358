// ─────────────────────────────────────────────────────────────────────
// Tamesis SSVK — Sweep Orchestrator
// ─────────────────────────────────────────────────────────────────────
//! Runs an experiment over a grid of problem sizes and samples.
//!
//! Per sample:
//!   1. derive its seed from (master seed, sweep index, sample index)
//!   2. start its deadline (per-(N, sample) override or the config default)
//!   3. run the pipeline, probing the deadline and the cancellation token
//!   4. record one row; numerical, unfolding and timeout failures stay in
//!      the row, parameter errors abort the run
//!
//! Sweep points run on a rayon pool of `parallel` threads. Each sample
//! owns its graph and operator; rows meet only in the result sink.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rayon::prelude::*;

use ssvk_graph::derive_seed;
use ssvk_spectral::SpacingHistogram;
use ssvk_types::{
    Checkpoint, ExperimentResult, SampleStatus, SpacingLabel, SsvkConfig, SsvkError, SsvkResult,
};

use crate::cancel::{CancellationToken, SampleBudget};
use crate::experiment::{ExperimentKind, SampleOutcome, SamplePipeline};
use crate::plot::{figure_path, render_gap_curve, render_spacing_histogram};
use crate::summary::SweepSummary;
use crate::table::{aggregate, GapRow, ResultTable};

/// Parse `A:B:step` (inclusive), `A:B` (step 1) or a single `A`.
pub fn parse_n_range(range: &str) -> SsvkResult<Vec<usize>> {
    let bad = |why: &str| SsvkError::InvalidParameters(format!("bad N range '{range}': {why}"));
    let parts: Vec<usize> = range
        .split(':')
        .map(|p| p.trim().parse::<usize>())
        .collect::<Result<_, _>>()
        .map_err(|e| bad(&e.to_string()))?;
    let (start, end, step) = match parts.as_slice() {
        [a] => (*a, *a, 1),
        [a, b] => (*a, *b, 1),
        [a, b, s] => (*a, *b, *s),
        _ => return Err(bad("expected A:B:step")),
    };
    if step == 0 {
        return Err(bad("step must be >= 1"));
    }
    if start > end {
        return Err(bad("start exceeds end"));
    }
    Ok((start..=end).step_by(step).collect())
}

/// `{experiment}-{seed:016x}`.
pub fn run_id(kind: ExperimentKind, seed: u64) -> String {
    format!("{}-{seed:016x}", kind.id())
}

/// What to sweep.
#[derive(Debug, Clone)]
pub struct SweepPlan {
    pub experiment: ExperimentKind,
    pub n_values: Vec<usize>,
    pub samples: usize,
    /// Worker threads across sweep samples.
    pub parallel: usize,
    /// Per-sample deadlines keyed by (N, sample index).
    pub timeout_overrides: BTreeMap<(usize, usize), Duration>,
}

impl SweepPlan {
    pub fn new(experiment: ExperimentKind, n_values: Vec<usize>, samples: usize) -> Self {
        Self {
            experiment,
            n_values,
            samples,
            parallel: 1,
            timeout_overrides: BTreeMap::new(),
        }
    }

    pub fn with_parallel(mut self, parallel: usize) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_timeout_override(mut self, n: usize, sample: usize, budget: Duration) -> Self {
        self.timeout_overrides.insert((n, sample), budget);
        self
    }

    pub fn validate(&self) -> SsvkResult<()> {
        if self.n_values.is_empty() {
            return Err(SsvkError::InvalidParameters(
                "sweep needs at least one N".to_string(),
            ));
        }
        if self.samples == 0 {
            return Err(SsvkError::InvalidParameters(
                "sweep needs samples >= 1".to_string(),
            ));
        }
        if self.parallel == 0 {
            return Err(SsvkError::InvalidParameters(
                "parallel must be >= 1".to_string(),
            ));
        }
        let min_n = self.experiment.min_n();
        if let Some(n) = self.n_values.iter().find(|&&n| n < min_n) {
            return Err(SsvkError::InvalidParameters(format!(
                "{} needs N >= {min_n}, got {n}",
                self.experiment
            )));
        }
        Ok(())
    }

    fn tasks(&self) -> Vec<SweepTask> {
        self.n_values
            .iter()
            .enumerate()
            .flat_map(|(sweep_index, &n)| {
                (0..self.samples).map(move |sample_index| SweepTask {
                    sweep_index,
                    sample_index,
                    n,
                })
            })
            .collect()
    }

    fn budget_for(&self, n: usize, sample: usize, default: Duration) -> Duration {
        self.timeout_overrides
            .get(&(n, sample))
            .copied()
            .unwrap_or(default)
    }
}

#[derive(Debug, Clone, Copy)]
struct SweepTask {
    sweep_index: usize,
    sample_index: usize,
    n: usize,
}

struct SampleRecord {
    row: ExperimentResult,
    histogram: Option<SpacingHistogram>,
}

/// Everything a sweep produced.
#[derive(Debug, Clone)]
pub struct SweepReport {
    pub run_id: String,
    pub experiment: ExperimentKind,
    /// Master seed (drawn from OS entropy when the config had none).
    pub seed: u64,
    pub table: ResultTable,
    pub summary: SweepSummary,
    /// Spacing histograms keyed by (sweep index, sample index).
    pub histograms: BTreeMap<(usize, usize), SpacingHistogram>,
}

impl SweepReport {
    pub fn exit_code(&self) -> i32 {
        self.summary.exit_code()
    }
}

/// A `sat-gap` sweep with its per-N gap table.
#[derive(Debug, Clone)]
pub struct GapSweep {
    pub report: SweepReport,
    pub rows: Vec<GapRow>,
}

/// Sweep driver.
///
/// Thread-safe: finished rows are collected under a `parking_lot::Mutex`;
/// everything else a sample touches is its own.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    cfg: SsvkConfig,
    pipeline: SamplePipeline,
    token: CancellationToken,
}

impl Orchestrator {
    pub fn new(cfg: SsvkConfig) -> SsvkResult<Self> {
        cfg.validate()?;
        let pipeline = SamplePipeline::new(&cfg)?;
        Ok(Self {
            cfg,
            pipeline,
            token: CancellationToken::new(),
        })
    }

    /// Share an externally owned cancellation token.
    pub fn with_token(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn config(&self) -> &SsvkConfig {
        &self.cfg
    }

    /// Run every (N, sample) of `plan`.
    ///
    /// Returns the ordered table even when samples failed or the sweep
    /// was cancelled; only parameter, config and I/O errors are `Err`.
    pub fn run(&self, plan: &SweepPlan) -> SsvkResult<SweepReport> {
        plan.validate()?;
        let master_seed = match self.cfg.seed {
            Some(seed) => seed,
            None => {
                let seed = rand::random::<u64>();
                log::warn!("no seed given, drew {seed:#018x} from OS entropy");
                seed
            }
        };
        let run_id = run_id(plan.experiment, master_seed);
        let tasks = plan.tasks();
        log::info!(
            "{run_id}: {} samples over N = {:?}, {} worker(s)",
            tasks.len(),
            plan.n_values,
            plan.parallel
        );
        let started = Instant::now();

        let sink: Mutex<Vec<SampleRecord>> = Mutex::new(Vec::with_capacity(tasks.len()));
        let fatal: Mutex<Option<SsvkError>> = Mutex::new(None);
        let abort = AtomicBool::new(false);
        let work = |task: &SweepTask| match self.run_task(plan, &run_id, master_seed, task, &abort)
        {
            Ok(record) => sink.lock().push(record),
            Err(e) => {
                abort.store(true, Ordering::SeqCst);
                let mut slot = fatal.lock();
                if slot.is_none() {
                    *slot = Some(e);
                }
            }
        };

        if plan.parallel > 1 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(plan.parallel)
                .build()
                .map_err(|e| SsvkError::Config(format!("thread pool: {e}")))?;
            pool.install(|| tasks.par_iter().for_each(&work));
        } else {
            tasks.iter().for_each(&work);
        }

        if let Some(e) = fatal.into_inner() {
            log::error!("{run_id}: aborted: {e}");
            return Err(e);
        }

        let mut histograms = BTreeMap::new();
        let mut rows = Vec::with_capacity(tasks.len());
        for record in sink.into_inner() {
            if let Some(h) = record.histogram {
                histograms.insert((record.row.sweep_index, record.row.sample_index), h);
            }
            rows.push(record.row);
        }
        let table = aggregate(rows);
        let summary = table.summary();
        log::info!(
            "{run_id}: finished in {:.2}s, {} of {} samples succeeded",
            started.elapsed().as_secs_f64(),
            summary.succeeded(),
            summary.total
        );
        Ok(SweepReport {
            run_id,
            experiment: plan.experiment,
            seed: master_seed,
            table,
            summary,
            histograms,
        })
    }

    /// Random 3-SAT gap sweep: {N, average gap, per-sample gaps}.
    pub fn sweep_gap(&self, n_values: &[usize], samples: usize) -> SsvkResult<GapSweep> {
        let plan = SweepPlan::new(ExperimentKind::SatGap, n_values.to_vec(), samples);
        let report = self.run(&plan)?;
        let rows = report.table.gap_rows();
        Ok(GapSweep { report, rows })
    }

    /// Write figures (when enabled), then `{run_id}.csv` and
    /// `{run_id}.json`, under the configured output directory. Figure
    /// failures are logged and skipped.
    pub fn persist(&self, report: &mut SweepReport) -> SsvkResult<Vec<PathBuf>> {
        let out_dir = self.cfg.out_dir.as_path();
        std::fs::create_dir_all(out_dir)?;
        let mut written = Vec::new();
        if self.cfg.emit_figures {
            written.extend(self.render_figures(out_dir, report));
        }

        let csv = out_dir.join(format!("{}.csv", report.run_id));
        report.table.write_csv(&csv)?;
        let json = out_dir.join(format!("{}.json", report.run_id));
        report.table.write_json(&json)?;
        written.push(csv);
        written.push(json);
        log::info!(
            "{}: wrote {} file(s) to {}",
            report.run_id,
            written.len(),
            out_dir.display()
        );
        Ok(written)
    }

    fn render_figures(&self, out_dir: &Path, report: &mut SweepReport) -> Vec<PathBuf> {
        let dpi = self.cfg.figure_dpi;
        let mut written = Vec::new();

        let gap_rows = report.table.gap_rows();
        if let (Some(first), Some(last)) = (gap_rows.first(), gap_rows.last()) {
            let path = out_dir.join(format!(
                "{}_gap_n{}-{}.png",
                report.run_id, first.n, last.n
            ));
            let title = format!("{} spectral gap", report.experiment);
            match render_gap_curve(&path, &title, &gap_rows, dpi) {
                Ok(()) => written.push(path),
                Err(e) => log::warn!("{}: gap figure skipped: {e}", report.run_id),
            }
        }

        let mut drawn_points = Vec::new();
        for (&(sweep_index, sample_index), hist) in &report.histograms {
            if drawn_points.contains(&sweep_index) {
                continue;
            }
            drawn_points.push(sweep_index);
            let Some(row) = report
                .table
                .rows_mut()
                .iter_mut()
                .find(|r| r.sweep_index == sweep_index && r.sample_index == sample_index)
            else {
                continue;
            };
            let params = format!("n{}_k{sample_index}_spacing", row.n);
            let path = figure_path(out_dir, &report.run_id, sweep_index, &params);
            let title = format!("{} N={} ({})", report.experiment, row.n, row.classification);
            match render_spacing_histogram(&path, &title, hist, dpi) {
                Ok(()) => {
                    row.figure = Some(path.clone());
                    written.push(path);
                }
                Err(e) => log::warn!(
                    "{}: spacing figure for N={} skipped: {e}",
                    report.run_id,
                    row.n
                ),
            }
        }
        written
    }

    fn run_task(
        &self,
        plan: &SweepPlan,
        run_id: &str,
        master_seed: u64,
        task: &SweepTask,
        abort: &AtomicBool,
    ) -> SsvkResult<SampleRecord> {
        let SweepTask {
            sweep_index,
            sample_index,
            n,
        } = *task;
        let kind = plan.experiment;
        let seed = derive_seed(master_seed, sweep_index as u64, sample_index as u64);
        let failed = |status: SampleStatus, diagnostic: String| {
            let mut row = ExperimentResult::failed(
                kind.id(),
                run_id,
                sweep_index,
                sample_index,
                n,
                seed,
                status,
                diagnostic,
            );
            row.bulk_lower = self.cfg.unfolding.bulk_lower;
            row.bulk_upper = self.cfg.unfolding.bulk_upper;
            SampleRecord {
                row,
                histogram: None,
            }
        };

        if abort.load(Ordering::SeqCst) || self.token.is_cancelled() {
            log::info!("{run_id} N={n} sample={sample_index} cancelled");
            return Ok(failed(
                SampleStatus::Cancelled,
                "sweep stopped before this sample started".to_string(),
            ));
        }

        let default = Duration::from_millis(self.cfg.sample_timeout_ms);
        let budget = SampleBudget::start(
            plan.budget_for(n, sample_index, default),
            self.token.clone(),
        );
        let outcome = budget
            .check()
            .and_then(|()| self.pipeline.run(kind, n, seed, &budget));

        match outcome {
            Ok(out) => {
                let record = self.outcome_record(kind, run_id, task, seed, out);
                let row = &record.row;
                log::info!(
                    "{run_id} N={n} sample={sample_index} {} gap={} class={}",
                    row.status,
                    row.gap.map_or_else(|| "-".to_string(), |g| format!("{g:.6e}")),
                    row.classification
                );
                Ok(record)
            }
            Err(e) => {
                let status = match &e {
                    SsvkError::NumericalBreakdown(_) => SampleStatus::NumericalBreakdown,
                    SsvkError::UnfoldingFailure(_) => SampleStatus::Inconclusive,
                    SsvkError::TimedOut { .. } => SampleStatus::TimedOut,
                    SsvkError::Cancelled => SampleStatus::Cancelled,
                    _ => return Err(e),
                };
                log::warn!("{run_id} N={n} sample={sample_index} {status}: {e}");
                Ok(failed(status, e.to_string()))
            }
        }
    }

    fn outcome_record(
        &self,
        kind: ExperimentKind,
        run_id: &str,
        task: &SweepTask,
        seed: u64,
        out: SampleOutcome,
    ) -> SampleRecord {
        let status = out.status();
        let stats = out.analysis.as_ref().map(|a| &a.statistics);
        let unfolded = out.analysis.as_ref().and_then(|a| a.unfolded.as_ref());
        let row = ExperimentResult {
            experiment: kind.id().to_string(),
            run_id: run_id.to_string(),
            sweep_index: task.sweep_index,
            sample_index: task.sample_index,
            n: task.n,
            seed,
            operator: out.operator.to_string(),
            status,
            gap: out.gap,
            classification: stats.map_or(SpacingLabel::Inconclusive, |s| s.label),
            confidence: stats.map_or(0.0, |s| s.confidence),
            repulsion_index: stats.filter(|s| s.count > 0).map(|s| s.repulsion_index),
            mean_ratio: stats.and_then(|s| s.mean_ratio),
            unfold_degree: unfolded.map(|u| u.degree),
            bulk_lower: self.cfg.unfolding.bulk_lower,
            bulk_upper: self.cfg.unfolding.bulk_upper,
            fidelity: out.fidelity,
            spectrum: Some(out.spectrum.summary(self.cfg.tolerances.zero_mode)),
            diagnostic: stats.and_then(|s| s.diagnostic.clone()),
            figure: None,
        };
        let histogram = stats.and_then(|s| s.histogram.clone());
        SampleRecord { row, histogram }
    }
}
