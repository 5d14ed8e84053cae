//! Tie-aware percentile ranks ("average" method).

/// Converts values into percentile ranks in `(0, 1]`.
///
/// Values are ranked ascending from 1; every run of equal values gets the
/// mean of the ranks it occupies, and ranks are divided by `N`. Values must
/// be comparable; callers clamp NaN before ranking.
pub fn average_rank_percentiles(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut percentiles = vec![0.0; n];
    let mut start = 0;
    while start < n {
        let mut end = start + 1;
        while end < n && values[order[end]] == values[order[start]] {
            end += 1;
        }

        // Positions start..end hold ranks start+1..=end
        let rank = (start + 1 + end) as f64 / 2.0;
        for &index in &order[start..end] {
            percentiles[index] = rank / n as f64;
        }
        start = end;
    }

    percentiles
}
