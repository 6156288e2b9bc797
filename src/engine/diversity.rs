use crate::model::{Individual, Triangle};

/// Number of numeric features per gene: six coordinates, four channels, depth.
const FEATURES_PER_GENE: usize = 11;

fn gene_features(t: &Triangle) -> [f64; FEATURES_PER_GENE] {
    [
        t.p1[0],
        t.p1[1],
        t.p2[0],
        t.p2[1],
        t.p3[0],
        t.p3[1],
        t.color[0] as f64,
        t.color[1] as f64,
        t.color[2] as f64,
        t.color[3] as f64,
        t.z_index,
    ]
}

/// Mean pairwise Euclidean distance between candidates.
///
/// Each candidate is flattened into one feature vector, and every feature is
/// min-max normalized across the population so that coordinates, channels
/// and depth weigh alike. Constant features contribute nothing. Returns 0.0
/// for fewer than two candidates.
pub fn population_diversity(population: &[Individual]) -> f64 {
    let n = population.len();
    if n < 2 {
        return 0.0;
    }

    let rows: Vec<Vec<f64>> = population
        .iter()
        .map(|ind| ind.triangles().iter().flat_map(gene_features).collect())
        .collect();
    let dims = rows.iter().map(Vec::len).min().unwrap_or(0);

    let mut lows = vec![f64::INFINITY; dims];
    let mut highs = vec![f64::NEG_INFINITY; dims];
    for row in &rows {
        for (d, &v) in row.iter().take(dims).enumerate() {
            lows[d] = lows[d].min(v);
            highs[d] = highs[d].max(v);
        }
    }
    let normalized: Vec<Vec<f64>> = rows
        .iter()
        .map(|row| {
            (0..dims)
                .map(|d| {
                    let range = highs[d] - lows[d];
                    if range > 0.0 { (row[d] - lows[d]) / range } else { 0.0 }
                })
                .collect()
        })
        .collect();

    let mut total = 0.0;
    for i in 0..n {
        for j in i + 1..n {
            total += normalized[i]
                .iter()
                .zip(&normalized[j])
                .map(|(a, b)| (a - b).powi(2))
                .sum::<f64>()
                .sqrt();
        }
    }
    total / (n * (n - 1) / 2) as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::init_population;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn single_gene(x: f64, red: u8) -> Individual {
        Individual::new(vec![Triangle::new(
            [x, 0.0],
            [0.0, 0.0],
            [0.0, 0.0],
            [red, 0, 0, 255],
            0.0,
        )])
    }

    #[test]
    fn test_identical_candidates_have_zero_diversity() {
        let one = single_gene(0.3, 10);
        let population = vec![one.clone(), one.clone(), one];
        assert_eq!(population_diversity(&population), 0.0);
    }

    #[test]
    fn test_small_populations() {
        assert_eq!(population_diversity(&[]), 0.0);
        assert_eq!(population_diversity(&[single_gene(0.1, 1)]), 0.0);
    }

    #[test]
    fn test_features_are_normalized() {
        // both differing features span their full range: distance sqrt(2)
        let population = vec![single_gene(0.0, 0), single_gene(0.5, 200)];
        let d = population_diversity(&population);
        assert!((d - 2f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_mean_over_pairs() {
        // normalized x values 0, 0.5, 1 give pair distances 0.5, 1, 0.5
        let population = vec![
            single_gene(0.0, 7),
            single_gene(0.2, 7),
            single_gene(0.4, 7),
        ];
        let d = population_diversity(&population);
        assert!((d - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_random_population_is_non_negative() {
        let mut rng = Pcg32::seed_from_u64(4);
        let population = init_population(6, 5, &mut rng);
        assert!(population_diversity(&population) > 0.0);
    }
}
