use super::{SelectionError, SelectionStrategy};

/// Deterministic truncation selection.
///
/// Returns the indices of the `k` highest scores in descending order. Equal
/// scores keep their original index order and no index is returned twice, so
/// asking for more than `scores.len()` indices yields every index once.
#[derive(Debug, Clone, Copy, Default)]
pub struct EliteSelection;

impl SelectionStrategy for EliteSelection {
    fn select(&mut self, scores: &[f64], k: usize) -> Result<Vec<usize>, SelectionError> {
        let mut order: Vec<usize> = (0..scores.len()).collect();
        // stable sort: ties stay in index order
        order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
        order.truncate(k);
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_three_with_tie() {
        let picked = EliteSelection.select(&[5.0, 1.0, 9.0, 2.0, 9.0], 3).unwrap();
        assert_eq!(picked, vec![2, 4, 0]);
    }

    #[test]
    fn test_k_larger_than_population_returns_each_index_once() {
        let picked = EliteSelection.select(&[1.0, 3.0, 2.0], 10).unwrap();
        assert_eq!(picked, vec![1, 2, 0]);
    }

    #[test]
    fn test_empty_request() {
        assert!(EliteSelection.select(&[1.0, 2.0], 0).unwrap().is_empty());
        assert!(EliteSelection.select(&[], 3).unwrap().is_empty());
    }
}
