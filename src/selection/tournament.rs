use super::{SelectionError, SelectionStrategy};
use rand::Rng;
use rand::seq::index;
use rand_pcg::Pcg32;

/// Deterministic k-way tournament.
///
/// Each pick draws `tournament_size` distinct contestants (capped at the
/// population size) and keeps the one with the highest score.
#[derive(Debug, Clone)]
pub struct TournamentSelection {
    tournament_size: usize,
    rng: Pcg32,
}

impl TournamentSelection {
    pub fn new(tournament_size: usize, rng: Pcg32) -> Self {
        Self {
            tournament_size,
            rng,
        }
    }
}

impl SelectionStrategy for TournamentSelection {
    fn select(&mut self, scores: &[f64], k: usize) -> Result<Vec<usize>, SelectionError> {
        if k == 0 {
            return Ok(Vec::new());
        }
        if scores.is_empty() {
            return Err(SelectionError::EmptyScores { k });
        }
        let size = self.tournament_size.clamp(1, scores.len());

        let mut selected = Vec::with_capacity(k);
        for _ in 0..k {
            let winner = index::sample(&mut self.rng, scores.len(), size)
                .iter()
                .max_by(|&a, &b| scores[a].total_cmp(&scores[b]))
                .unwrap_or(0);
            selected.push(winner);
        }
        Ok(selected)
    }
}

/// Binary tournament where the better contestant wins only with probability `threshold`.
#[derive(Debug, Clone)]
pub struct ProbTournamentSelection {
    threshold: f64,
    rng: Pcg32,
}

impl ProbTournamentSelection {
    pub fn new(threshold: f64, rng: Pcg32) -> Self {
        Self { threshold, rng }
    }
}

impl SelectionStrategy for ProbTournamentSelection {
    fn select(&mut self, scores: &[f64], k: usize) -> Result<Vec<usize>, SelectionError> {
        if k == 0 {
            return Ok(Vec::new());
        }
        match scores.len() {
            0 => return Err(SelectionError::EmptyScores { k }),
            1 => return Ok(vec![0; k]),
            _ => {}
        }

        let mut selected = Vec::with_capacity(k);
        for _ in 0..k {
            let pair = index::sample(&mut self.rng, scores.len(), 2);
            let (a, b) = (pair.index(0), pair.index(1));
            let (better, worse) = if scores[a] >= scores[b] { (a, b) } else { (b, a) };
            let winner = if self.rng.random::<f64>() < self.threshold {
                better
            } else {
                worse
            };
            selected.push(winner);
        }
        Ok(selected)
    }
}
