/// Computes the arithmetic mean of a slice of values. Returns 0.0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sorts `scores` ascending and removes the `count` smallest.
///
/// Dropping at least as many scores as there are leaves an empty vector.
pub fn drop_lowest(mut scores: Vec<f64>, count: usize) -> Vec<f64> {
    scores.sort_by(f64::total_cmp);
    let count = count.min(scores.len());
    scores.split_off(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_empty() {
        assert_eq!(mean(&[]), 0.0);
    }

    #[test]
    fn test_mean_values() {
        assert_eq!(mean(&[0.8, 1.0]), 0.9);
        assert_eq!(mean(&[0.25]), 0.25);
    }

    #[test]
    fn test_drop_lowest_keeps_largest() {
        let kept = drop_lowest(vec![0.9, 0.1, 0.5, 0.7], 2);
        assert_eq!(kept, vec![0.7, 0.9]);
    }

    #[test]
    fn test_drop_lowest_zero_only_sorts() {
        assert_eq!(drop_lowest(vec![1.0, 0.0], 0), vec![0.0, 1.0]);
    }

    #[test]
    fn test_drop_lowest_more_than_len() {
        assert!(drop_lowest(vec![1.0], 3).is_empty());
    }
}
