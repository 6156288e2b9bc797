use super::{MAX_DEPTH, MutationStrategy, gaussian, jitter_color, jitter_point};
use crate::model::{Individual, Triangle};
use rand_pcg::Pcg32;

pub(super) fn default_point_sigma() -> f64 {
    0.01
}

pub(super) fn default_color_sigma() -> f64 {
    5.0
}

/// Small Gaussian noise on every coordinate, channel and depth of every gene.
///
/// Registered as `gen`. Meant for late-run fine tuning.
#[derive(Debug, Clone)]
pub struct GaussianJitterMutation {
    pub(super) point_sigma: f64,
    pub(super) color_sigma: f64,
    pub(super) depth_sigma: f64,
    pub(super) rng: Pcg32,
}

impl GaussianJitterMutation {
    pub fn new(point_sigma: f64, color_sigma: f64, depth_sigma: f64, rng: Pcg32) -> Self {
        Self {
            point_sigma,
            color_sigma,
            depth_sigma,
            rng,
        }
    }
}

impl MutationStrategy for GaussianJitterMutation {
    fn mutate(&mut self, candidate: &Individual) -> Individual {
        let rng = &mut self.rng;
        candidate
            .triangles()
            .iter()
            .map(|t| {
                Triangle::new(
                    jitter_point(rng, t.p1, self.point_sigma),
                    jitter_point(rng, t.p2, self.point_sigma),
                    jitter_point(rng, t.p3, self.point_sigma),
                    jitter_color(rng, t.color, self.color_sigma),
                    gaussian(rng, t.z_index, self.depth_sigma).clamp(0.0, MAX_DEPTH),
                )
            })
            .collect::<Vec<_>>()
            .into()
    }
}
