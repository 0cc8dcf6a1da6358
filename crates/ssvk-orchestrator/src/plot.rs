// ─────────────────────────────────────────────────────────────────────
// Tamesis SSVK — Comparison Figures
// ─────────────────────────────────────────────────────────────────────
//! PNG figures through the plotters bitmap backend, with text drawn
//! from system fonts found through fontconfig:
//!   - gap vs N (per-sample points and the per-N mean)
//!   - spacing histogram against the Poisson / GOE / GUE surmises
//!
//! Figures are 6.4 × 4.8 inches at the configured dpi. Every backend
//! error is mapped to `SsvkError::Plot`; callers treat it as non-fatal.

use std::path::{Path, PathBuf};

use plotters::prelude::*;

use ssvk_spectral::{goe_surmise, gue_surmise, poisson_surmise, SpacingHistogram};
use ssvk_types::{SsvkError, SsvkResult};

use crate::table::GapRow;

const FIGURE_INCHES: (f64, f64) = (6.4, 4.8);
const CURVE_POINTS: usize = 300;

fn plot_err<E: std::fmt::Display>(e: E) -> SsvkError {
    SsvkError::Plot(format!("backend error: {e}"))
}

/// Pixel size of a figure at `dpi`.
pub fn figure_size(dpi: u32) -> (u32, u32) {
    let d = f64::from(dpi);
    (
        (FIGURE_INCHES.0 * d).round() as u32,
        (FIGURE_INCHES.1 * d).round() as u32,
    )
}

/// `{run_id}_{sweep_index:03}_{params}.png` under `out_dir`.
pub fn figure_path(out_dir: &Path, run_id: &str, sweep_index: usize, params: &str) -> PathBuf {
    out_dir.join(format!("{run_id}_{sweep_index:03}_{params}.png"))
}

/// Gap against N: every sample as a point, the per-N mean as a line.
pub fn render_gap_curve(path: &Path, title: &str, rows: &[GapRow], dpi: u32) -> SsvkResult<()> {
    let measured: Vec<&GapRow> = rows.iter().filter(|r| !r.gaps.is_empty()).collect();
    if measured.is_empty() {
        return Err(SsvkError::Plot("no gaps to plot".to_string()));
    }
    let n_min = measured.iter().map(|r| r.n).min().unwrap_or(0) as f64;
    let n_max = measured.iter().map(|r| r.n).max().unwrap_or(0) as f64;
    let pad = ((n_max - n_min) * 0.05).max(1.0);
    let gap_max = measured
        .iter()
        .flat_map(|r| r.gaps.iter().copied())
        .fold(0.0_f64, f64::max)
        .max(1e-9);

    let root = BitMapBackend::new(path, figure_size(dpi)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;
    {
        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .caption(title, ("sans-serif", 24.0))
            .set_label_area_size(LabelAreaPosition::Left, 60)
            .set_label_area_size(LabelAreaPosition::Bottom, 40)
            .build_cartesian_2d((n_min - pad)..(n_max + pad), 0.0..(gap_max * 1.1))
            .map_err(plot_err)?;
        chart
            .configure_mesh()
            .x_desc("N")
            .y_desc("gap λ₁ − λ₀")
            .draw()
            .map_err(plot_err)?;

        chart
            .draw_series(measured.iter().flat_map(|r| {
                r.gaps
                    .iter()
                    .map(move |&g| Circle::new((r.n as f64, g), 3, BLUE.mix(0.5).filled()))
            }))
            .map_err(plot_err)?
            .label("samples")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE.mix(0.5)));
        chart
            .draw_series(LineSeries::new(
                measured
                    .iter()
                    .filter_map(|r| r.mean_gap.map(|m| (r.n as f64, m))),
                &RED,
            ))
            .map_err(plot_err)?
            .label("mean")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED));

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(plot_err)?;
    }
    root.present().map_err(plot_err)?;
    Ok(())
}

/// Spacing histogram with the three reference surmises overlaid.
pub fn render_spacing_histogram(
    path: &Path,
    title: &str,
    hist: &SpacingHistogram,
    dpi: u32,
) -> SsvkResult<()> {
    if hist.centres.is_empty() {
        return Err(SsvkError::Plot("empty spacing histogram".to_string()));
    }
    let half = 0.5 * hist.bin_width;
    let s_max = hist.centres.last().copied().unwrap_or(0.0) + half;
    let y_max = hist.density.iter().copied().fold(1.0_f64, f64::max) * 1.1;

    let root = BitMapBackend::new(path, figure_size(dpi)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;
    {
        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .caption(title, ("sans-serif", 24.0))
            .set_label_area_size(LabelAreaPosition::Left, 60)
            .set_label_area_size(LabelAreaPosition::Bottom, 40)
            .build_cartesian_2d(0.0..s_max, 0.0..y_max)
            .map_err(plot_err)?;
        chart
            .configure_mesh()
            .x_desc("s")
            .y_desc("P(s)")
            .draw()
            .map_err(plot_err)?;

        chart
            .draw_series(hist.centres.iter().zip(&hist.density).map(|(&c, &d)| {
                Rectangle::new([(c - half, 0.0), (c + half, d)], BLUE.mix(0.35).filled())
            }))
            .map_err(plot_err)?;

        let surmises: [(&str, fn(f64) -> f64, RGBColor); 3] = [
            ("Poisson", poisson_surmise, RED),
            ("GOE", goe_surmise, GREEN),
            ("GUE", gue_surmise, MAGENTA),
        ];
        for (name, p, color) in surmises {
            let curve = (0..=CURVE_POINTS).map(|i| {
                let s = s_max * i as f64 / CURVE_POINTS as f64;
                (s, p(s))
            });
            chart
                .draw_series(LineSeries::new(curve, color))
                .map_err(plot_err)?
                .label(name)
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
        }

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(plot_err)?;
    }
    root.present().map_err(plot_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_figure_size_scales_with_dpi() {
        assert_eq!(figure_size(150), (960, 720));
        assert_eq!(figure_size(300), (1920, 1440));
    }

    #[test]
    fn test_figure_path_encodes_run_and_sweep() {
        let p = figure_path(
            Path::new("/tmp/out"),
            "gue-surmise-000000000000002a",
            3,
            "n300_k0",
        );
        assert_eq!(
            p,
            PathBuf::from("/tmp/out/gue-surmise-000000000000002a_003_n300_k0.png")
        );
    }

    #[test]
    fn test_labelled_figures_render_or_fail_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let hist = SpacingHistogram {
            bin_width: 0.5,
            centres: vec![0.25, 0.75, 1.25, 1.75],
            density: vec![0.3, 0.8, 0.6, 0.2],
        };
        let rows = vec![
            GapRow {
                n: 4,
                mean_gap: Some(0.5),
                gaps: vec![0.4, 0.6],
                failed: 0,
            },
            GapRow {
                n: 8,
                mean_gap: Some(0.3),
                gaps: vec![0.3],
                failed: 1,
            },
        ];
        let hist_path = dir.path().join("hist.png");
        let gap_path = dir.path().join("gap.png");
        let hist_result = render_spacing_histogram(&hist_path, "N=8 (goe)", &hist, 150);
        let gap_result = render_gap_curve(&gap_path, "sat-gap gap", &rows, 150);
        for (result, path) in [(hist_result, &hist_path), (gap_result, &gap_path)] {
            match result {
                Ok(()) => assert!(path.exists(), "{} missing", path.display()),
                // hosts without any fonts report a plot error
                Err(SsvkError::Plot(_)) => {}
                Err(e) => panic!("unexpected error {e}"),
            }
        }
    }

    #[test]
    fn test_empty_inputs_are_plot_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.png");
        assert!(matches!(
            render_gap_curve(&path, "gap", &[], 150),
            Err(SsvkError::Plot(_))
        ));
        let hist = SpacingHistogram {
            bin_width: 0.1,
            centres: vec![],
            density: vec![],
        };
        assert!(matches!(
            render_spacing_histogram(&path, "hist", &hist, 150),
            Err(SsvkError::Plot(_))
        ));
        assert!(!path.exists());
    }
}
