use serde::{Deserialize, Serialize};

/// Arithmetic mean, `None` for an empty input.
pub fn mean<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Quantile of an ascending slice, interpolating linearly between the two
/// closest ranks. `sorted` must be non-empty.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Five-number summary plus the 1.5×IQR fences used to flag outliers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxSummary {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub lower_fence: f64,
    pub upper_fence: f64,
    /// Smallest value inside the fences.
    pub lower_whisker: f64,
    /// Largest value inside the fences.
    pub upper_whisker: f64,
}

impl BoxSummary {
    pub fn is_outlier(&self, value: f64) -> bool {
        value < self.lower_fence || value > self.upper_fence
    }
}

/// Compute the box summary of `values` (any order). `None` when empty.
pub fn box_summary(values: &[f64]) -> Option<BoxSummary> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let q1 = quantile(&sorted, 0.25);
    let median = quantile(&sorted, 0.5);
    let q3 = quantile(&sorted, 0.75);
    let iqr = q3 - q1;
    let lower_fence = q1 - 1.5 * iqr;
    let upper_fence = q3 + 1.5 * iqr;

    let lower_whisker = sorted.iter().copied().find(|v| *v >= lower_fence).unwrap_or(q1);
    let upper_whisker = sorted.iter().rev().copied().find(|v| *v <= upper_fence).unwrap_or(q3);

    Some(BoxSummary {
        min: sorted[0],
        q1,
        median,
        q3,
        max: sorted[sorted.len() - 1],
        lower_fence,
        upper_fence,
        lower_whisker,
        upper_whisker,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean() {
        assert_eq!(mean([1.0, 2.0, 3.0, 4.0]), Some(2.5));
        assert_eq!(mean(std::iter::empty()), None);
    }

    #[test]
    fn test_quantile_interpolates() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&sorted, 0.0), 1.0);
        assert_eq!(quantile(&sorted, 0.5), 2.5);
        assert_eq!(quantile(&sorted, 0.25), 1.75);
        assert_eq!(quantile(&sorted, 1.0), 4.0);
        assert_eq!(quantile(&[7.0], 0.75), 7.0);
    }

    #[test]
    fn test_box_summary_flags_outliers() {
        let values = [100.0, 110.0, 120.0, 130.0, 140.0, 1000.0];
        let summary = box_summary(&values).unwrap();

        assert_eq!(summary.q1, 112.5);
        assert_eq!(summary.median, 125.0);
        assert_eq!(summary.q3, 137.5);
        assert_eq!(summary.upper_fence, 175.0);
        assert_eq!(summary.upper_whisker, 140.0);
        assert_eq!(summary.lower_whisker, 100.0);
        assert_eq!(summary.max, 1000.0);
        assert!(summary.is_outlier(1000.0));
        assert!(!summary.is_outlier(100.0));
    }

    #[test]
    fn test_box_summary_constant_values() {
        let summary = box_summary(&[5.0, 5.0, 5.0]).unwrap();
        assert_eq!(summary.lower_fence, 5.0);
        assert_eq!(summary.upper_fence, 5.0);
        assert!(!summary.is_outlier(5.0));
        assert!(box_summary(&[]).is_none());
    }
}
