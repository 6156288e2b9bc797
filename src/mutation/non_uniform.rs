use super::{MAX_DEPTH, MutationStrategy, to_channel};
use crate::model::{Individual, Triangle};
use rand::Rng;
use rand_pcg::Pcg32;

/// Largest step of the depth jitter, in either direction.
const DEPTH_STEP: i32 = 5;

pub(super) fn default_b() -> f64 {
    3.0
}

pub(super) fn default_p_mutate_vertices() -> f64 {
    0.5
}

pub(super) fn default_p_component() -> f64 {
    1.0
}

/// Progress-annealed mutation of a single gene.
///
/// One gene is chosen uniformly. With probability `p_mutate_vertices` its
/// coordinates are moved, otherwise its color channels. Each component moves
/// toward a randomly chosen bound by
/// `distance * (1 - U^((1 - progress)^b))`, so steps shrink to zero as the
/// run progresses. The depth of the chosen gene always receives an integer
/// jitter in `[-5, 5]`.
#[derive(Debug, Clone)]
pub struct NonUniformMutation {
    b: f64,
    p_mutate_vertices: f64,
    p_vertex_component: f64,
    p_color_component: f64,
    progress: f64,
    rng: Pcg32,
}

impl NonUniformMutation {
    pub fn new(
        b: f64,
        p_mutate_vertices: f64,
        p_vertex_component: f64,
        p_color_component: f64,
        rng: Pcg32,
    ) -> Self {
        Self {
            b,
            p_mutate_vertices,
            p_vertex_component,
            p_color_component,
            progress: 0.0,
            rng,
        }
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// Step length for a component that is `distance` away from its bound.
    fn delta(&mut self, distance: f64) -> f64 {
        if distance <= 0.0 {
            return 0.0;
        }
        let exponent = (1.0 - self.progress).powf(self.b.max(1.0));
        distance * (1.0 - self.rng.random::<f64>().powf(exponent))
    }

    fn step(&mut self, value: f64, low: f64, high: f64) -> f64 {
        let upward = self.rng.random::<f64>() < 0.5;
        let moved = if upward {
            value + self.delta(high - value)
        } else {
            value - self.delta(value - low)
        };
        moved.clamp(low, high)
    }

    fn maybe_step(&mut self, value: f64, low: f64, high: f64, p: f64) -> f64 {
        if self.rng.random::<f64>() < p {
            self.step(value, low, high)
        } else {
            value
        }
    }

    fn mutate_triangle(&mut self, t: &Triangle) -> Triangle {
        let mut mutated = *t;
        if self.rng.random::<f64>() < self.p_mutate_vertices {
            let p = self.p_vertex_component;
            for point in [&mut mutated.p1, &mut mutated.p2, &mut mutated.p3] {
                for coordinate in point.iter_mut() {
                    *coordinate = self.maybe_step(*coordinate, 0.0, 1.0, p);
                }
            }
        } else {
            let p = self.p_color_component;
            for channel in mutated.color.iter_mut() {
                *channel = to_channel(self.maybe_step(*channel as f64, 0.0, 255.0, p));
            }
        }
        let jitter = self.rng.random_range(-DEPTH_STEP..=DEPTH_STEP);
        mutated.z_index = (t.z_index + jitter as f64).clamp(0.0, MAX_DEPTH);
        mutated
    }
}

impl MutationStrategy for NonUniformMutation {
    fn mutate(&mut self, candidate: &Individual) -> Individual {
        let mut genes = candidate.to_genes();
        if !genes.is_empty() {
            let i = self.rng.random_range(0..genes.len());
            genes[i] = self.mutate_triangle(&genes[i]);
        }
        genes.into()
    }

    fn set_progress(&mut self, progress: f64) {
        self.progress = progress.clamp(0.0, 1.0);
    }
}
