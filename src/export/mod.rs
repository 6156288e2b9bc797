//! Run output: the best candidate as JSON and PNG, and a metrics report.
//!
//! `best.json` is the plain ordered list of gene records so that it can be
//! read back with `read_best_json` and rendered again. `metrics.json` carries
//! the configuration snapshot next to the per-generation arrays.

use crate::config::Config;
use crate::engine::{RunMetrics, RunOutcome, StopReason};
use crate::model::Individual;
use crate::render::{RenderError, Renderer};
use chrono::{DateTime, Local};
use image::RgbaImage;
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Current layout of `metrics.json`.
pub const SCHEMA_VERSION: &str = "1.0.0";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Image encoding failed: {0}")]
    Image(#[from] image::ImageError),
    #[error("Rendering failed: {0}")]
    Render(#[from] RenderError),
    #[error("Rendered buffer does not match a {width}x{height} image")]
    BufferShape { width: u32, height: u32 },
}

/// Everything known about a finished run.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MetricsReport {
    pub schema_version: String,
    /// Configuration the run was started with
    pub parameters: Config,
    /// Wall-clock duration of the run, in seconds
    pub elapsed_time: f64,
    /// RFC 3339 local time when the report was produced
    pub completed_at: String,
    pub stop_reason: StopReason,
    /// Generations executed after the initial population
    pub generations: usize,
    pub best_fitness: f64,
    pub metrics: RunMetrics,
}

impl MetricsReport {
    /// Creates a report for `outcome`, stamped with the current time.
    pub fn new(parameters: &Config, outcome: &RunOutcome, elapsed: Duration) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            parameters: parameters.clone(),
            elapsed_time: elapsed.as_secs_f64(),
            completed_at: Local::now().to_rfc3339(),
            stop_reason: outcome.stop_reason,
            generations: outcome.generations,
            best_fitness: outcome.best_fitness,
            metrics: outcome.metrics.clone(),
        }
    }
}

/// `base/<YYYYmmdd-HHMMSS>` for the given moment.
pub fn timestamped_dir(base: &Path, at: DateTime<Local>) -> PathBuf {
    base.join(at.format("%Y%m%d-%H%M%S").to_string())
}

/// Writes the genes of `best` in paint order.
pub fn write_best_json(best: &Individual, output_path: &Path) -> Result<(), ExportError> {
    let json = serde_json::to_string_pretty(best)?;
    fs::write(output_path, json)?;
    info!("Best candidate written to {}", output_path.display());
    Ok(())
}

/// Reads a candidate written by `write_best_json`.
pub fn read_best_json(input_path: &Path) -> Result<Individual, ExportError> {
    let content = fs::read_to_string(input_path)?;
    Ok(serde_json::from_str(&content)?)
}

pub fn write_metrics_json(report: &MetricsReport, output_path: &Path) -> Result<(), ExportError> {
    let json = serde_json::to_string_pretty(report)?;
    fs::write(output_path, json)?;
    info!("Metrics written to {}", output_path.display());
    Ok(())
}

pub fn read_metrics_json(input_path: &Path) -> Result<MetricsReport, ExportError> {
    let content = fs::read_to_string(input_path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Renders `best` and saves it as an RGBA PNG.
pub fn write_best_png(
    renderer: &dyn Renderer,
    best: &Individual,
    output_path: &Path,
) -> Result<(), ExportError> {
    let buffer = renderer.render(best.triangles())?;
    let (width, height) = (buffer.width(), buffer.height());
    let image = RgbaImage::from_raw(width, height, buffer.into_raw())
        .ok_or(ExportError::BufferShape { width, height })?;
    image.save(output_path)?;
    info!("Best render written to {}", output_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Triangle, init_population};
    use crate::render::{RendererConfig, TinySkiaRenderer};
    use chrono::TimeZone;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;
    use tempfile::{NamedTempFile, tempdir};

    fn create_test_config() -> Config {
        toml::from_str(
            r#"
            [ga]
            pop_size = 4
            generations = 2

            [genome]
            num_triangles = 3

            [data]
            image_path = "target.png"
            canvas_size = [16, 16]

            [selection]
            name = "roulette"

            [crossover]
            name = "annular"

            [fitness]
            name = "pixel_mse"
            "#,
        )
        .unwrap()
    }

    fn create_test_outcome() -> RunOutcome {
        let population = init_population(4, 3, &mut Pcg32::seed_from_u64(2));
        let fitness = vec![2.0, 1.0, 2.0, 1.0];
        let mut metrics = RunMetrics::default();
        metrics.record(&[6.0, 5.0, 6.0, 5.0], None);
        metrics.record(&fitness, None);
        RunOutcome {
            best: population[1].clone(),
            best_fitness: 1.0,
            population,
            fitness,
            metrics,
            generations: 1,
            stop_reason: StopReason::Stagnation,
        }
    }

    #[test]
    fn test_best_json_round_trip() {
        let best = Individual::new(vec![
            Triangle::new([0.0, 0.5], [1.0, 0.25], [0.75, 1.0], [10, 20, 30, 40], 0.0),
            Triangle::new([0.5, 0.5], [0.125, 0.0], [1.0, 1.0], [255, 0, 0, 128], 1.0),
            Triangle::new([0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [0, 0, 0, 255], 2.0),
        ]);
        let temp_file = NamedTempFile::new().unwrap();
        write_best_json(&best, temp_file.path()).unwrap();

        let loaded = read_best_json(temp_file.path()).unwrap();
        assert_eq!(loaded, best);

        // a bare list of gene records
        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(temp_file.path()).unwrap()).unwrap();
        let genes = raw.as_array().unwrap();
        assert_eq!(genes.len(), 3);
        for key in ["p1", "p2", "p3", "color", "z_index"] {
            assert!(genes[0].get(key).is_some(), "missing {key}");
        }
    }

    #[test]
    fn test_metrics_report() {
        let config = create_test_config();
        let outcome = create_test_outcome();
        let report = MetricsReport::new(&config, &outcome, Duration::from_millis(1500));
        assert_eq!(report.schema_version, SCHEMA_VERSION);
        assert_eq!(report.elapsed_time, 1.5);
        assert_eq!(report.generations, 1);
        assert!(DateTime::parse_from_rfc3339(&report.completed_at).is_ok());

        let temp_file = NamedTempFile::new().unwrap();
        write_metrics_json(&report, temp_file.path()).unwrap();
        let loaded = read_metrics_json(temp_file.path()).unwrap();
        assert_eq!(loaded, report);

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(temp_file.path()).unwrap()).unwrap();
        assert_eq!(raw["stop_reason"], "stagnation");
        assert_eq!(raw["metrics"]["min"], serde_json::json!([5.0, 1.0]));
        assert_eq!(raw["parameters"]["crossover"]["name"], "annular");
    }

    #[test]
    fn test_best_png() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("best.png");
        let renderer = TinySkiaRenderer::new(10, 6, &RendererConfig::default()).unwrap();
        let best = Individual::new(vec![Triangle::new(
            [-1.0, -1.0],
            [4.0, -1.0],
            [-1.0, 4.0],
            [0, 0, 255, 255],
            0.0,
        )]);
        write_best_png(&renderer, &best, &path).unwrap();

        let image = image::open(&path).unwrap().to_rgba8();
        assert_eq!(image.dimensions(), (10, 6));
        assert_eq!(image.get_pixel(5, 3).0, [0, 0, 255, 255]);
    }

    #[test]
    fn test_timestamped_dir() {
        let at = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(
            timestamped_dir(Path::new("runs"), at),
            PathBuf::from("runs/20240309-070501")
        );
    }

    #[test]
    fn test_missing_best_file() {
        let err = read_best_json(Path::new("/no/such/best.json")).unwrap_err();
        assert!(matches!(err, ExportError::Io(_)));
    }
}
