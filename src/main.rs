use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::time::Instant;
use triangle_evolve::config::Config;
use triangle_evolve::data::load_target;
use triangle_evolve::engine::GaEngine;
use triangle_evolve::export::{
    MetricsReport, timestamped_dir, write_best_json, write_best_png, write_metrics_json,
};
use triangle_evolve::model::Individual;
use triangle_evolve::render::{Renderer, TinySkiaRenderer};

/// Writes `best.json`, `metrics.json` and `best.png` into a fresh timestamped directory.
///
/// # Returns
/// * `Ok(PathBuf)` - The directory the run was saved to
/// * `Err(String)` - Error message if any file could not be written
fn save_run(
    config: &Config,
    renderer: &dyn Renderer,
    report: &MetricsReport,
    best: &Individual,
) -> Result<PathBuf, String> {
    let run_dir = timestamped_dir(&config.experiment.output_dir, Local::now());
    fs::create_dir_all(&run_dir)
        .map_err(|e| format!("Failed to create '{}': {}", run_dir.display(), e))?;

    write_best_json(best, &run_dir.join("best.json")).map_err(|e| e.to_string())?;
    write_metrics_json(report, &run_dir.join("metrics.json")).map_err(|e| e.to_string())?;
    write_best_png(renderer, best, &run_dir.join("best.png")).map_err(|e| e.to_string())?;
    Ok(run_dir)
}

fn main() {
    env_logger::init();
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());
    log::info!("Booting triangle_evolve with '{}'...", config_path);

    // 1. Load and Validate Configuration
    let config = match Config::load(Path::new(&config_path)) {
        Ok(c) => c,
        Err(e) => {
            log::error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = config.validate() {
        log::error!("Invalid configuration: {}", e);
        process::exit(1);
    }
    log::info!("Configuration loaded and validated.");

    // 2. Target image and renderer
    let [width, height] = config.data.canvas_size;
    let target = match load_target(&config.data.image_path, width, height) {
        Ok(t) => t,
        Err(e) => {
            log::error!("Failed to load target image: {}", e);
            process::exit(1);
        }
    };
    let renderer = match TinySkiaRenderer::new(width, height, &config.renderer) {
        Ok(r) => Arc::new(r),
        Err(e) => {
            log::error!("Failed to create renderer: {}", e);
            process::exit(1);
        }
    };
    let fitness = match config.fitness.build(renderer.clone(), target) {
        Ok(f) => f,
        Err(e) => {
            log::error!("Failed to build fitness '{}': {}", config.fitness.name(), e);
            process::exit(1);
        }
    };

    // 3. Run the evolution
    let mut engine = match GaEngine::from_config(&config, fitness) {
        Ok(engine) => engine,
        Err(e) => {
            log::error!("Failed to assemble engine: {}", e);
            process::exit(1);
        }
    };
    let population = engine.random_population(config.genome.num_triangles);

    log::info!("--- Starting Evolution ---");
    let started = Instant::now();
    let outcome = match engine.run(population) {
        Ok(outcome) => outcome,
        Err(e) => {
            log::error!("Evolution failed: {}", e);
            process::exit(1);
        }
    };
    let elapsed = started.elapsed();
    log::info!(
        "--- Evolution Complete: {} generations in {:.1}s, best fitness {:.6} ({}) ---",
        outcome.generations,
        elapsed.as_secs_f64(),
        outcome.best_fitness,
        outcome.stop_reason
    );

    // 4. Save results
    let report = MetricsReport::new(&config, &outcome, elapsed);
    match save_run(&config, renderer.as_ref(), &report, &outcome.best) {
        Ok(dir) => log::info!("Results saved to '{}'.", dir.display()),
        Err(e) => {
            log::error!("Failed to save results: {}", e);
            process::exit(1);
        }
    }
}
