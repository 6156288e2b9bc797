use serde::{Deserialize, Serialize};

/// Per-generation fitness aggregates, stored as parallel arrays.
///
/// Entry 0 describes the initial population. `diversity` is only filled when
/// the run tracks it, and then has the same length as the other arrays.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunMetrics {
    pub max: Vec<f64>,
    pub min: Vec<f64>,
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diversity: Vec<f64>,
}

impl RunMetrics {
    /// Appends the aggregates of one generation.
    pub fn record(&mut self, fitness: &[f64], diversity: Option<f64>) {
        let n = fitness.len().max(1) as f64;
        let max = fitness.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min = fitness.iter().copied().fold(f64::INFINITY, f64::min);
        let mean = fitness.iter().sum::<f64>() / n;
        let variance = fitness.iter().map(|f| (f - mean).powi(2)).sum::<f64>() / n;

        self.max.push(max);
        self.min.push(min);
        self.mean.push(mean);
        self.std.push(variance.sqrt());
        if let Some(d) = diversity {
            self.diversity.push(d);
        }
    }

    /// Number of recorded generations.
    pub fn len(&self) -> usize {
        self.mean.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }

    /// Best value of generation `generation` in the given direction.
    pub fn best_at(&self, generation: usize, maximize: bool) -> Option<f64> {
        if maximize {
            self.max.get(generation).copied()
        } else {
            self.min.get(generation).copied()
        }
    }

    /// Best value of the latest generation.
    pub fn latest_best(&self, maximize: bool) -> Option<f64> {
        self.best_at(self.len().checked_sub(1)?, maximize)
    }
}
