use crate::crossover::CrossoverConfig;
use crate::fitness::FitnessConfig;
use crate::mutation::MutationConfig;
use crate::render::RendererConfig;
use crate::selection::SelectionConfig;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Could not parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid parameter for {strategy}: {reason}")]
    InvalidParameter {
        strategy: &'static str,
        reason: String,
    },
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Complete run configuration, one TOML table per section.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Config {
    pub ga: GaConfig,
    pub genome: GenomeConfig,
    pub data: DataConfig,
    #[serde(default)]
    pub renderer: RendererConfig,
    #[serde(default)]
    pub experiment: ExperimentConfig,
    pub selection: SelectionConfig,
    #[serde(default)]
    pub survivor_selection: Option<SelectionConfig>,
    pub crossover: CrossoverConfig,
    #[serde(default)]
    pub mutation: Option<MutationConfig>,
    pub fitness: FitnessConfig,
}

/// Parameters of the generation loop.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct GaConfig {
    pub pop_size: usize,
    pub generations: usize,
    /// Best candidates copied unchanged into the next generation.
    #[serde(default = "default_elitism")]
    pub elitism: usize,
    #[serde(default)]
    pub maximize: bool,
    /// Share of the population replaced by offspring each generation.
    #[serde(default = "default_one")]
    pub rho: f64,
    #[serde(default = "default_one")]
    pub crossover_rate: f64,
    #[serde(default = "default_one")]
    pub mutation_rate: f64,
    #[serde(default)]
    pub error_threshold: Option<f64>,
    /// Generations without improvement before stopping; 0 disables the check.
    #[serde(default)]
    pub early_stopping_patience: usize,
    /// Size of the fitness worker pool. Rayon's default when absent.
    #[serde(default)]
    pub max_workers: Option<usize>,
    #[serde(default)]
    pub track_diversity: bool,
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_elitism() -> usize {
    1
}

fn default_one() -> f64 {
    1.0
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct GenomeConfig {
    pub num_triangles: usize,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct DataConfig {
    pub image_path: PathBuf,
    /// Canvas `[width, height]` in pixels; the target is resized to it.
    pub canvas_size: [u32; 2],
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ExperimentConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Checks ranges that the type system cannot express.
    ///
    /// Strategy tables are checked by their own `validate`. A fitness whose
    /// direction disagrees with `ga.maximize` is only warned about.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ga = &self.ga;
        let invalid = |field: &'static str, reason: String| Err(ConfigError::InvalidValue { field, reason });

        if ga.pop_size == 0 {
            return invalid("ga.pop_size", "must be at least 1".to_string());
        }
        if ga.elitism > ga.pop_size {
            return invalid(
                "ga.elitism",
                format!("{} exceeds pop_size {}", ga.elitism, ga.pop_size),
            );
        }
        for (field, value) in [
            ("ga.rho", ga.rho),
            ("ga.crossover_rate", ga.crossover_rate),
            ("ga.mutation_rate", ga.mutation_rate),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return invalid(field, format!("must lie in [0, 1], got {value}"));
            }
        }
        if let Some(threshold) = ga.error_threshold {
            if !threshold.is_finite() {
                return invalid("ga.error_threshold", format!("must be finite, got {threshold}"));
            }
        }
        if ga.max_workers == Some(0) {
            return invalid("ga.max_workers", "must be at least 1".to_string());
        }
        if self.genome.num_triangles == 0 {
            return invalid("genome.num_triangles", "must be at least 1".to_string());
        }
        let [width, height] = self.data.canvas_size;
        if width == 0 || height == 0 {
            return invalid(
                "data.canvas_size",
                format!("both dimensions must be at least 1, got {width}x{height}"),
            );
        }

        self.selection.validate()?;
        if let Some(survivor) = &self.survivor_selection {
            survivor.validate()?;
        }
        self.crossover.validate()?;
        if let Some(mutation) = &self.mutation {
            mutation.validate()?;
        }
        self.fitness.validate()?;

        if self.fitness.higher_is_better() != ga.maximize {
            warn!(
                "Fitness '{}' is {} is better, but ga.maximize = {}",
                self.fitness.name(),
                if self.fitness.higher_is_better() { "higher" } else { "lower" },
                ga.maximize
            );
        }
        Ok(())
    }
}
