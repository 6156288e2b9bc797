use super::{MutationStrategy, jitter_color, jitter_point};
use crate::model::{Individual, Triangle};
use rand::Rng;
use rand::seq::index;
use rand_pcg::Pcg32;

pub(super) fn default_min_genes() -> usize {
    1
}

pub(super) fn default_max_genes() -> usize {
    5
}

pub(super) fn default_point_sigma() -> f64 {
    0.1
}

pub(super) fn default_color_sigma() -> f64 {
    25.0
}

/// Heavy perturbation of a few distinct genes.
///
/// Draws a count in `[min_genes, max_genes]` (both clamped to the gene count),
/// picks that many distinct positions without replacement and jitters every
/// vertex and channel of those genes. All other genes are copied unchanged,
/// as is the depth of the touched ones.
#[derive(Debug, Clone)]
pub struct MultiGeneLimitedMutation {
    pub(super) min_genes: usize,
    pub(super) max_genes: usize,
    pub(super) point_sigma: f64,
    pub(super) color_sigma: f64,
    pub(super) rng: Pcg32,
}

impl MultiGeneLimitedMutation {
    fn mutate_triangle(&mut self, t: &Triangle) -> Triangle {
        let rng = &mut self.rng;
        Triangle::new(
            jitter_point(rng, t.p1, self.point_sigma),
            jitter_point(rng, t.p2, self.point_sigma),
            jitter_point(rng, t.p3, self.point_sigma),
            jitter_color(rng, t.color, self.color_sigma),
            t.z_index,
        )
    }
}

impl MutationStrategy for MultiGeneLimitedMutation {
    fn mutate(&mut self, candidate: &Individual) -> Individual {
        let mut genes = candidate.to_genes();
        let n = genes.len();
        if n == 0 {
            return genes.into();
        }

        let upper = self.max_genes.min(n);
        let lower = self.min_genes.min(upper);
        let count = self.rng.random_range(lower..=upper);
        for i in index::sample(&mut self.rng, n, count) {
            genes[i] = self.mutate_triangle(&genes[i]);
        }
        genes.into()
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::mid_range_individual;
    use super::*;
    use rand::SeedableRng;

    fn strategy(min_genes: usize, max_genes: usize, seed: u64) -> MultiGeneLimitedMutation {
        MultiGeneLimitedMutation {
            min_genes,
            max_genes,
            point_sigma: 0.1,
            color_sigma: 25.0,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    fn changed_positions(a: &Individual, b: &Individual) -> usize {
        a.triangles()
            .iter()
            .zip(b.triangles())
            .filter(|(x, y)| x != y)
            .count()
    }

    #[test]
    fn test_fixed_count_changes_exactly_k_genes() {
        let original = mid_range_individual(10);
        for k in 1..=4 {
            let mut mutation = strategy(k, k, 100 + k as u64);
            for _ in 0..10 {
                let mutated = mutation.mutate(&original);
                assert_eq!(changed_positions(&original, &mutated), k);
            }
        }
    }

    #[test]
    fn test_count_stays_within_bounds() {
        let original = mid_range_individual(10);
        let mut mutation = strategy(2, 3, 42);
        for _ in 0..30 {
            let changed = changed_positions(&original, &mutation.mutate(&original));
            assert!((2..=3).contains(&changed), "changed {changed} genes");
        }
    }

    #[test]
    fn test_bounds_clamp_to_gene_count() {
        let original = mid_range_individual(3);
        let mut mutation = strategy(5, 8, 7);
        assert_eq!(changed_positions(&original, &mutation.mutate(&original)), 3);
    }

    #[test]
    fn test_depth_is_untouched() {
        let original = mid_range_individual(6);
        let mutated = strategy(6, 6, 3).mutate(&original);
        for (before, after) in original.triangles().iter().zip(mutated.triangles()) {
            assert_eq!(before.z_index, after.z_index);
        }
    }

    #[test]
    fn test_empty_candidate() {
        let mutated = strategy(1, 5, 0).mutate(&Individual::new(Vec::new()));
        assert!(mutated.is_empty());
    }
}
