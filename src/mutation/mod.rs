//! Mutation operators.
//!
//! A mutation never edits its input: it copies the genes it touches into a
//! new `Individual` and leaves everything else field-for-field identical.

pub mod gaussian;
pub mod multi_gene;
pub mod non_uniform;
pub mod uniform;

pub use gaussian::GaussianJitterMutation;
pub use multi_gene::MultiGeneLimitedMutation;
pub use non_uniform::NonUniformMutation;
pub use uniform::UniformMutation;

use crate::config::ConfigError;
use crate::model::{Individual, Point, Rgba};
use rand::Rng;
use rand_distr::StandardNormal;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

/// Upper bound of the depth value.
pub const MAX_DEPTH: f64 = 255.0;

/// Produces a mutated copy of a candidate with the same gene count.
pub trait MutationStrategy: Send {
    fn mutate(&mut self, candidate: &Individual) -> Individual;

    /// Informs the strategy how far the run has advanced, in [0, 1].
    ///
    /// The engine calls this before every generation. Strategies that do not
    /// anneal ignore it.
    fn set_progress(&mut self, _progress: f64) {}
}

/// `value + N(0, sigma)`.
pub(crate) fn gaussian<R: Rng + ?Sized>(rng: &mut R, value: f64, sigma: f64) -> f64 {
    let z: f64 = rng.sample(StandardNormal);
    value + z * sigma
}

pub(crate) fn jitter_point<R: Rng + ?Sized>(rng: &mut R, p: Point, sigma: f64) -> Point {
    [
        gaussian(rng, p[0], sigma).clamp(0.0, 1.0),
        gaussian(rng, p[1], sigma).clamp(0.0, 1.0),
    ]
}

pub(crate) fn jitter_channel<R: Rng + ?Sized>(rng: &mut R, c: u8, sigma: f64) -> u8 {
    to_channel(gaussian(rng, c as f64, sigma))
}

pub(crate) fn jitter_color<R: Rng + ?Sized>(rng: &mut R, color: Rgba, sigma: f64) -> Rgba {
    color.map(|c| jitter_channel(rng, c, sigma))
}

/// Rounds and clamps to a color channel.
pub(crate) fn to_channel(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// Registry of mutation strategies, keyed by the `name` field of the table.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum MutationConfig {
    Uniform {
        #[serde(default = "uniform::default_point_rate")]
        point_rate: f64,
        #[serde(default = "uniform::default_point_sigma")]
        point_sigma: f64,
        #[serde(default = "uniform::default_color_rate")]
        color_rate: f64,
        #[serde(default = "uniform::default_color_sigma")]
        color_sigma: f64,
        #[serde(default = "uniform::default_swap_rate")]
        swap_rate: f64,
        #[serde(default = "default_depth_sigma")]
        depth_sigma: f64,
    },
    #[serde(alias = "gaussian")]
    Gen {
        #[serde(default = "gaussian::default_point_sigma")]
        point_sigma: f64,
        #[serde(default = "gaussian::default_color_sigma")]
        color_sigma: f64,
        #[serde(default = "default_depth_sigma")]
        depth_sigma: f64,
    },
    MultiGeneLimited {
        #[serde(default = "multi_gene::default_min_genes")]
        min_genes: usize,
        #[serde(default = "multi_gene::default_max_genes")]
        max_genes: usize,
        #[serde(default = "multi_gene::default_point_sigma")]
        point_sigma: f64,
        #[serde(default = "multi_gene::default_color_sigma")]
        color_sigma: f64,
    },
    #[serde(alias = "nonuniform")]
    NonUniform {
        #[serde(default = "non_uniform::default_b")]
        b: f64,
        #[serde(default = "non_uniform::default_p_mutate_vertices")]
        p_mutate_vertices: f64,
        #[serde(default = "non_uniform::default_p_component")]
        p_vertex_component: f64,
        #[serde(default = "non_uniform::default_p_component")]
        p_color_component: f64,
    },
}

fn default_depth_sigma() -> f64 {
    1.0
}

impl MutationConfig {
    pub fn name(&self) -> &'static str {
        match self {
            MutationConfig::Uniform { .. } => "uniform",
            MutationConfig::Gen { .. } => "gen",
            MutationConfig::MultiGeneLimited { .. } => "multi_gene_limited",
            MutationConfig::NonUniform { .. } => "non_uniform",
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: String| {
            Err(ConfigError::InvalidParameter {
                strategy: self.name(),
                reason,
            })
        };
        let (probabilities, sigmas): (Vec<(&str, f64)>, Vec<(&str, f64)>) = match *self {
            MutationConfig::Uniform {
                point_rate,
                point_sigma,
                color_rate,
                color_sigma,
                swap_rate,
                depth_sigma,
            } => (
                vec![
                    ("point_rate", point_rate),
                    ("color_rate", color_rate),
                    ("swap_rate", swap_rate),
                ],
                vec![
                    ("point_sigma", point_sigma),
                    ("color_sigma", color_sigma),
                    ("depth_sigma", depth_sigma),
                ],
            ),
            MutationConfig::Gen {
                point_sigma,
                color_sigma,
                depth_sigma,
            } => (
                Vec::new(),
                vec![
                    ("point_sigma", point_sigma),
                    ("color_sigma", color_sigma),
                    ("depth_sigma", depth_sigma),
                ],
            ),
            MutationConfig::MultiGeneLimited {
                min_genes,
                max_genes,
                point_sigma,
                color_sigma,
            } => {
                if min_genes > max_genes {
                    return invalid(format!(
                        "min_genes ({min_genes}) must not exceed max_genes ({max_genes})"
                    ));
                }
                (
                    Vec::new(),
                    vec![("point_sigma", point_sigma), ("color_sigma", color_sigma)],
                )
            }
            MutationConfig::NonUniform {
                b,
                p_mutate_vertices,
                p_vertex_component,
                p_color_component,
            } => {
                if !b.is_finite() {
                    return invalid(format!("b must be finite, got {b}"));
                }
                (
                    vec![
                        ("p_mutate_vertices", p_mutate_vertices),
                        ("p_vertex_component", p_vertex_component),
                        ("p_color_component", p_color_component),
                    ],
                    Vec::new(),
                )
            }
        };

        for (field, p) in probabilities {
            if !(0.0..=1.0).contains(&p) {
                return invalid(format!("{field} must lie in [0, 1], got {p}"));
            }
        }
        for (field, sigma) in sigmas {
            if !(sigma >= 0.0 && sigma.is_finite()) {
                return invalid(format!("{field} must be a finite value >= 0, got {sigma}"));
            }
        }
        Ok(())
    }

    /// Validates the parameters and constructs the strategy around `rng`.
    pub fn build(&self, rng: Pcg32) -> Result<Box<dyn MutationStrategy>, ConfigError> {
        self.validate()?;
        let strategy: Box<dyn MutationStrategy> = match *self {
            MutationConfig::Uniform {
                point_rate,
                point_sigma,
                color_rate,
                color_sigma,
                swap_rate,
                depth_sigma,
            } => Box::new(UniformMutation {
                point_rate,
                point_sigma,
                color_rate,
                color_sigma,
                swap_rate,
                depth_sigma,
                rng,
            }),
            MutationConfig::Gen {
                point_sigma,
                color_sigma,
                depth_sigma,
            } => Box::new(GaussianJitterMutation::new(
                point_sigma,
                color_sigma,
                depth_sigma,
                rng,
            )),
            MutationConfig::MultiGeneLimited {
                min_genes,
                max_genes,
                point_sigma,
                color_sigma,
            } => Box::new(MultiGeneLimitedMutation {
                min_genes,
                max_genes,
                point_sigma,
                color_sigma,
                rng,
            }),
            MutationConfig::NonUniform {
                b,
                p_mutate_vertices,
                p_vertex_component,
                p_color_component,
            } => Box::new(NonUniformMutation::new(
                b,
                p_mutate_vertices,
                p_vertex_component,
                p_color_component,
                rng,
            )),
        };
        Ok(strategy)
    }
}
