use super::{FitnessError, FitnessStrategy, check_shape};
use crate::model::Individual;
use crate::render::{PixelBuffer, Renderer};
use std::sync::Arc;

const K1: f64 = 0.01;
const K2: f64 = 0.03;
const DATA_RANGE: f64 = 255.0;

pub(super) fn default_window() -> usize {
    7
}

/// Structural similarity over the RGB channels. Higher is better, 1.0 is a
/// perfect match.
///
/// The render is composited over opaque white before comparison; the target
/// is compared on its RGB channels as stored.
pub struct SsimFitness {
    renderer: Arc<dyn Renderer>,
    target_rgb: Vec<f64>,
    width: usize,
    height: usize,
    window: usize,
}

impl SsimFitness {
    pub fn new(
        renderer: Arc<dyn Renderer>,
        target: PixelBuffer,
        window: usize,
    ) -> Result<Self, FitnessError> {
        check_shape(renderer.as_ref(), &target)?;
        let (width, height) = (target.width() as usize, target.height() as usize);
        if window > width || window > height {
            return Err(FitnessError::WindowTooLarge {
                window,
                width: target.width(),
                height: target.height(),
            });
        }
        let target_rgb = target
            .as_raw()
            .chunks_exact(4)
            .flat_map(|px| [px[0] as f64, px[1] as f64, px[2] as f64])
            .collect();
        Ok(Self {
            renderer,
            target_rgb,
            width,
            height,
            window,
        })
    }
}

impl FitnessStrategy for SsimFitness {
    fn evaluate(&self, candidate: &Individual) -> Result<f64, FitnessError> {
        let rendered = self.renderer.render(candidate.triangles())?;
        let composited = composite_over_white(&rendered);
        Ok(mean_ssim(
            &composited,
            &self.target_rgb,
            self.width,
            self.height,
            self.window,
        ))
    }
}

/// Flattens straight RGBA onto white and rounds to whole intensities.
pub fn composite_over_white(buffer: &PixelBuffer) -> Vec<f64> {
    buffer
        .as_raw()
        .chunks_exact(4)
        .flat_map(|px| {
            let alpha = px[3] as f64 / 255.0;
            let blend = move |c: u8| (c as f64 * alpha + 255.0 * (1.0 - alpha)).round();
            [blend(px[0]), blend(px[1]), blend(px[2])]
        })
        .collect()
}

/// Mean SSIM over three interleaved channels of two `width` x `height` images.
///
/// Statistics come from a `window` x `window` box using the sample
/// covariance. Only windows that lie fully inside the image are averaged;
/// when none fits the result is 0.
pub fn mean_ssim(a: &[f64], b: &[f64], width: usize, height: usize, window: usize) -> f64 {
    if window < 2 || window > width || window > height {
        return 0.0;
    }
    let c1 = (K1 * DATA_RANGE).powi(2);
    let c2 = (K2 * DATA_RANGE).powi(2);
    let np = (window * window) as f64;
    let cov_norm = np / (np - 1.0);

    let mut total = 0.0;
    for channel in 0..3 {
        let sat = SummedArea::new(a, b, width, height, channel);
        let mut sum = 0.0;
        for top in 0..=height - window {
            for left in 0..=width - window {
                let [sx, sy, sxx, syy, sxy] = sat.window_sums(left, top, window);
                let (ux, uy) = (sx / np, sy / np);
                let vx = cov_norm * (sxx / np - ux * ux);
                let vy = cov_norm * (syy / np - uy * uy);
                let vxy = cov_norm * (sxy / np - ux * uy);
                sum += ((2.0 * ux * uy + c1) * (2.0 * vxy + c2))
                    / ((ux * ux + uy * uy + c1) * (vx + vy + c2));
            }
        }
        total += sum / ((height - window + 1) * (width - window + 1)) as f64;
    }
    total / 3.0
}

/// Integral images of x, y, x², y² and xy for one channel.
struct SummedArea {
    stride: usize,
    tables: Vec<[f64; 5]>,
}

impl SummedArea {
    fn new(a: &[f64], b: &[f64], width: usize, height: usize, channel: usize) -> Self {
        let stride = width + 1;
        let mut tables = vec![[0.0; 5]; stride * (height + 1)];
        for row in 0..height {
            let mut running = [0.0; 5];
            for col in 0..width {
                let idx = (row * width + col) * 3 + channel;
                let (x, y) = (a[idx], b[idx]);
                for (acc, v) in running.iter_mut().zip([x, y, x * x, y * y, x * y]) {
                    *acc += v;
                }
                let above = tables[row * stride + col + 1];
                let cell = &mut tables[(row + 1) * stride + col + 1];
                for k in 0..5 {
                    cell[k] = above[k] + running[k];
                }
            }
        }
        Self { stride, tables }
    }

    fn window_sums(&self, left: usize, top: usize, size: usize) -> [f64; 5] {
        let at = |row: usize, col: usize| self.tables[row * self.stride + col];
        let (a, b, c, d) = (
            at(top + size, left + size),
            at(top, left + size),
            at(top + size, left),
            at(top, left),
        );
        std::array::from_fn(|k| a[k] - b[k] - c[k] + d[k])
    }
}
