use super::{MAX_DEPTH, MutationStrategy, gaussian, jitter_channel};
use crate::model::{Individual, Point, Triangle};
use rand::Rng;
use rand_pcg::Pcg32;

pub(super) fn default_point_rate() -> f64 {
    0.1
}

pub(super) fn default_point_sigma() -> f64 {
    0.05
}

pub(super) fn default_color_rate() -> f64 {
    0.05
}

pub(super) fn default_color_sigma() -> f64 {
    15.0
}

pub(super) fn default_swap_rate() -> f64 {
    0.01
}

/// Sparse per-component Gaussian mutation.
///
/// Every coordinate (and the depth value) is perturbed with probability
/// `point_rate`, every color channel with probability `color_rate`. With
/// probability `swap_rate` two genes then trade places, which changes the
/// paint order.
#[derive(Debug, Clone)]
pub struct UniformMutation {
    pub(super) point_rate: f64,
    pub(super) point_sigma: f64,
    pub(super) color_rate: f64,
    pub(super) color_sigma: f64,
    pub(super) swap_rate: f64,
    pub(super) depth_sigma: f64,
    pub(super) rng: Pcg32,
}

impl UniformMutation {
    fn maybe_coordinate(&mut self, value: f64) -> f64 {
        if self.rng.random::<f64>() < self.point_rate {
            gaussian(&mut self.rng, value, self.point_sigma).clamp(0.0, 1.0)
        } else {
            value
        }
    }

    fn maybe_point(&mut self, p: Point) -> Point {
        [self.maybe_coordinate(p[0]), self.maybe_coordinate(p[1])]
    }

    fn mutate_triangle(&mut self, t: &Triangle) -> Triangle {
        let p1 = self.maybe_point(t.p1);
        let p2 = self.maybe_point(t.p2);
        let p3 = self.maybe_point(t.p3);
        let mut color = t.color;
        for channel in color.iter_mut() {
            if self.rng.random::<f64>() < self.color_rate {
                *channel = jitter_channel(&mut self.rng, *channel, self.color_sigma);
            }
        }
        let z_index = if self.rng.random::<f64>() < self.point_rate {
            gaussian(&mut self.rng, t.z_index, self.depth_sigma).clamp(0.0, MAX_DEPTH)
        } else {
            t.z_index
        };
        Triangle::new(p1, p2, p3, color, z_index)
    }
}

impl MutationStrategy for UniformMutation {
    fn mutate(&mut self, candidate: &Individual) -> Individual {
        let mut genes: Vec<Triangle> = candidate
            .triangles()
            .iter()
            .map(|t| self.mutate_triangle(t))
            .collect();

        if genes.len() >= 2 && self.rng.random::<f64>() < self.swap_rate {
            let i = self.rng.random_range(0..genes.len());
            let j = self.rng.random_range(0..genes.len());
            genes.swap(i, j);
        }
        genes.into()
    }
}
