//! Fitness strategies.
//!
//! A strategy owns a shared renderer and a fixed target buffer. Evaluation
//! reads both and writes nothing, so one strategy serves every worker thread.

pub mod pixel_mse;
pub mod ssim;

pub use pixel_mse::PixelMseFitness;
pub use ssim::SsimFitness;

use crate::config::ConfigError;
use crate::model::Individual;
use crate::render::{PixelBuffer, RenderError, Renderer};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FitnessError {
    #[error("Target is {target_width}x{target_height} but the canvas is {canvas_width}x{canvas_height}")]
    ShapeMismatch {
        target_width: u32,
        target_height: u32,
        canvas_width: u32,
        canvas_height: u32,
    },
    #[error("SSIM window of {window} does not fit a {width}x{height} canvas")]
    WindowTooLarge { window: usize, width: u32, height: u32 },
    #[error("Rendering failed: {0}")]
    Render(#[from] RenderError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Scores one candidate against the target.
pub trait FitnessStrategy: Send + Sync {
    fn evaluate(&self, candidate: &Individual) -> Result<f64, FitnessError>;
}

/// Registry of fitness strategies, keyed by the `name` field of the table.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum FitnessConfig {
    PixelMse,
    Ssim {
        #[serde(default = "ssim::default_window")]
        window: usize,
    },
}

impl FitnessConfig {
    pub fn name(&self) -> &'static str {
        match self {
            FitnessConfig::PixelMse => "pixel_mse",
            FitnessConfig::Ssim { .. } => "ssim",
        }
    }

    /// True when larger values mean a better match.
    pub fn higher_is_better(&self) -> bool {
        matches!(self, FitnessConfig::Ssim { .. })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let FitnessConfig::Ssim { window } = *self {
            if window < 3 || window % 2 == 0 {
                return Err(ConfigError::InvalidParameter {
                    strategy: self.name(),
                    reason: format!("window must be odd and >= 3, got {window}"),
                });
            }
        }
        Ok(())
    }

    /// Builds the strategy for a renderer and a target of the renderer's shape.
    ///
    /// # Arguments
    /// * `renderer` - Renderer shared by all evaluations
    /// * `target` - Straight RGBA target, same width and height as the canvas
    ///
    /// # Returns
    /// * `Result<Arc<dyn FitnessStrategy>, FitnessError>` - The strategy, or an
    ///   error when the parameters or the target shape are wrong
    pub fn build(
        &self,
        renderer: Arc<dyn Renderer>,
        target: PixelBuffer,
    ) -> Result<Arc<dyn FitnessStrategy>, FitnessError> {
        self.validate()?;
        check_shape(renderer.as_ref(), &target)?;
        let strategy: Arc<dyn FitnessStrategy> = match *self {
            FitnessConfig::PixelMse => Arc::new(PixelMseFitness::new(renderer, target)?),
            FitnessConfig::Ssim { window } => Arc::new(SsimFitness::new(renderer, target, window)?),
        };
        Ok(strategy)
    }
}

pub(crate) fn check_shape(renderer: &dyn Renderer, target: &PixelBuffer) -> Result<(), FitnessError> {
    if (renderer.width(), renderer.height()) == (target.width(), target.height()) {
        Ok(())
    } else {
        Err(FitnessError::ShapeMismatch {
            target_width: target.width(),
            target_height: target.height(),
            canvas_width: renderer.width(),
            canvas_height: renderer.height(),
        })
    }
}
