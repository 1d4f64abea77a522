// ---------------------------------------------------------------------------
// Sample cleaning: which rows take part in an interpolation
// ---------------------------------------------------------------------------

/// Pair two parallel columns, drop pairs where either side is missing, and
/// sort ascending by `x`. The sort is stable, so rows with equal `x` keep
/// their file order.
pub fn valid_pairs(x: &[f64], y: &[f64]) -> Vec<(f64, f64)> {
    let mut pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .filter(|(xi, yi)| !xi.is_nan() && !yi.is_nan())
        .map(|(&xi, &yi)| (xi, yi))
        .collect();
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
    pairs
}

// ---------------------------------------------------------------------------
// Compliance: which rows meet the target error rate
// ---------------------------------------------------------------------------

/// Return indices of rows whose BER is at or below `target`.
///
/// A missing BER never passes.
pub fn compliant_indices(ber: &[f64], target: f64) -> Vec<usize> {
    ber.iter()
        .enumerate()
        .filter(|&(_, &b)| b <= target)
        .map(|(i, _)| i)
        .collect()
}

/// Keep `values[i]` only where row `i` meets the target; other rows give
/// `None`.
pub fn mask_non_compliant(values: &[f64], ber: &[f64], target: f64) -> Vec<Option<f64>> {
    let mut masked = vec![None; values.len()];
    for i in compliant_indices(ber, target) {
        if let Some(slot) = masked.get_mut(i) {
            *slot = Some(values[i]);
        }
    }
    masked
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_missing_and_sorts_by_x() {
        let x = [3.0, f64::NAN, 1.0, 2.0, 0.0];
        let y = [0.3, 0.9, 0.1, f64::NAN, 0.0];
        assert_eq!(valid_pairs(&x, &y), vec![(0.0, 0.0), (1.0, 0.1), (3.0, 0.3)]);
    }

    #[test]
    fn equal_x_keeps_file_order() {
        let pairs = valid_pairs(&[1.0, 0.0, 1.0], &[0.5, 0.9, 0.4]);
        assert_eq!(pairs, vec![(0.0, 0.9), (1.0, 0.5), (1.0, 0.4)]);
    }

    #[test]
    fn compliance_is_inclusive_and_rejects_missing() {
        let ber = [1e-2, 1e-3, f64::NAN, 1e-4];
        assert_eq!(compliant_indices(&ber, 1e-3), vec![1, 3]);
        assert_eq!(
            mask_non_compliant(&[10.0, 20.0, 30.0, 40.0], &ber, 1e-3),
            vec![None, Some(20.0), None, Some(40.0)]
        );
    }
}
