use super::{FitnessError, FitnessStrategy, check_shape};
use crate::model::Individual;
use crate::render::{PixelBuffer, Renderer};
use std::sync::Arc;

/// Mean squared error over all four channels. Lower is better.
pub struct PixelMseFitness {
    renderer: Arc<dyn Renderer>,
    target: PixelBuffer,
}

impl PixelMseFitness {
    pub fn new(renderer: Arc<dyn Renderer>, target: PixelBuffer) -> Result<Self, FitnessError> {
        check_shape(renderer.as_ref(), &target)?;
        Ok(Self { renderer, target })
    }
}

impl FitnessStrategy for PixelMseFitness {
    fn evaluate(&self, candidate: &Individual) -> Result<f64, FitnessError> {
        let rendered = self.renderer.render(candidate.triangles())?;
        Ok(mean_squared_error(&rendered, &self.target))
    }
}

/// Mean of the squared per-byte difference of two equally shaped buffers.
pub fn mean_squared_error(a: &PixelBuffer, b: &PixelBuffer) -> f64 {
    let (a, b) = (a.as_raw(), b.as_raw());
    if a.is_empty() {
        return 0.0;
    }
    let sum: f64 = a
        .iter()
        .zip(b)
        .map(|(&x, &y)| {
            let d = x as f64 - y as f64;
            d * d
        })
        .sum();
    sum / a.len() as f64
}
