use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use super::stats::{box_summary, BoxSummary};

// ---------------------------------------------------------------------------
// Category ranking (bar chart)
// ---------------------------------------------------------------------------

/// One bar of a category chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub label: String,
    pub count: usize,
}

/// Count occurrences per label and keep the `top` largest groups.
///
/// Sorting is stable: groups with equal counts keep the order in which
/// their label first appeared.
pub fn category_ranking<'a, I>(labels: I, top: usize) -> Vec<CategoryCount>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut groups: Vec<CategoryCount> = Vec::new();
    let mut position: HashMap<&'a str, usize> = HashMap::new();

    for label in labels {
        match position.get(label) {
            Some(&i) => groups[i].count += 1,
            None => {
                position.insert(label, groups.len());
                groups.push(CategoryCount {
                    label: label.to_string(),
                    count: 1,
                });
            }
        }
    }

    groups.sort_by(|a, b| b.count.cmp(&a.count));
    groups.truncate(top);
    groups
}

// ---------------------------------------------------------------------------
// Status breakdown (pie chart)
// ---------------------------------------------------------------------------

pub const AVAILABLE_LABEL: &str = "Available";
pub const NOT_AVAILABLE_LABEL: &str = "Not available";

/// Telemedicine availability split. Unknown flags are in neither bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusBreakdown {
    pub available: usize,
    pub not_available: usize,
}

impl StatusBreakdown {
    pub fn from_flags<I>(flags: I) -> Self
    where
        I: IntoIterator<Item = Option<bool>>,
    {
        flags
            .into_iter()
            .fold(StatusBreakdown::default(), |mut acc, flag| {
                match flag {
                    Some(true) => acc.available += 1,
                    Some(false) => acc.not_available += 1,
                    None => {}
                }
                acc
            })
    }

    pub fn total(&self) -> usize {
        self.available + self.not_available
    }

    /// Labelled slices, "Available" first.
    pub fn slices(&self) -> [CategoryCount; 2] {
        [
            CategoryCount {
                label: AVAILABLE_LABEL.to_string(),
                count: self.available,
            },
            CategoryCount {
                label: NOT_AVAILABLE_LABEL.to_string(),
                count: self.not_available,
            },
        ]
    }
}

// ---------------------------------------------------------------------------
// Price histogram (histogram + box plot)
// ---------------------------------------------------------------------------

/// Half-open bucket `[lower, upper)`; the last bucket also holds `upper`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceHistogram {
    pub bins: Vec<HistogramBin>,
    pub summary: Option<BoxSummary>,
    /// Values outside the 1.5×IQR fences, in input order.
    pub outliers: Vec<f64>,
}

impl PriceHistogram {
    /// Bin `values` into `bins` equal-width buckets spanning their range.
    ///
    /// When every value is identical the buckets have zero width and all
    /// values land in the first one.
    pub fn build(values: &[f64], bins: usize) -> Self {
        let Some(summary) = box_summary(values) else {
            return PriceHistogram::default();
        };
        let bins = bins.max(1);
        let (min, max) = (summary.min, summary.max);
        let width = (max - min) / bins as f64;

        let mut counts = vec![0usize; bins];
        for &v in values {
            let idx = if width > 0.0 {
                (((v - min) / width) as usize).min(bins - 1)
            } else {
                0
            };
            counts[idx] += 1;
        }

        let bins = counts
            .into_iter()
            .enumerate()
            .map(|(i, count)| HistogramBin {
                lower: min + i as f64 * width,
                upper: if i + 1 == bins {
                    max
                } else {
                    min + (i + 1) as f64 * width
                },
                count,
            })
            .collect();

        let outliers = values
            .iter()
            .copied()
            .filter(|&v| summary.is_outlier(v))
            .collect();

        PriceHistogram {
            bins,
            summary: Some(summary),
            outliers,
        }
    }

    pub fn total(&self) -> usize {
        self.bins.iter().map(|b| b.count).sum()
    }
}

// ---------------------------------------------------------------------------
// Review time series (line chart)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewPoint {
    pub year: i32,
    pub total_reviews: u64,
    pub mean_reviews: f64,
    pub count: usize,
}

/// Group `(year, reviews)` pairs by year, ascending. Rows without a year
/// are skipped.
pub fn review_series<I>(rows: I) -> Vec<ReviewPoint>
where
    I: IntoIterator<Item = (Option<i32>, u32)>,
{
    let mut by_year: BTreeMap<i32, (u64, usize)> = BTreeMap::new();
    for (year, reviews) in rows {
        if let Some(year) = year {
            let entry = by_year.entry(year).or_default();
            entry.0 += u64::from(reviews);
            entry.1 += 1;
        }
    }

    by_year
        .into_iter()
        .map(|(year, (total_reviews, count))| ReviewPoint {
            year,
            total_reviews,
            mean_reviews: total_reviews as f64 / count as f64,
            count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranking_sorts_descending_with_stable_ties() {
        let labels = ["Derma", "Cardio", "Orto", "Cardio", "Orto", "Neuro"];
        let ranking = category_ranking(labels, 10);
        let pairs: Vec<(&str, usize)> =
            ranking.iter().map(|c| (c.label.as_str(), c.count)).collect();
        assert_eq!(pairs, [("Cardio", 2), ("Orto", 2), ("Derma", 1), ("Neuro", 1)]);
    }

    #[test]
    fn test_ranking_truncates() {
        let labels: Vec<String> = (0..15).map(|i| format!("S{i}")).collect();
        let ranking = category_ranking(labels.iter().map(String::as_str), 10);
        assert_eq!(ranking.len(), 10);
        assert_eq!(ranking[0].label, "S0");
        assert_eq!(ranking[9].label, "S9");
    }

    #[test]
    fn test_status_breakdown_skips_unknown() {
        let status = StatusBreakdown::from_flags([Some(true), None, Some(false), Some(true)]);
        assert_eq!(status.available, 2);
        assert_eq!(status.not_available, 1);
        assert_eq!(status.total(), 3);
        let [yes, no] = status.slices();
        assert_eq!((yes.label.as_str(), yes.count), ("Available", 2));
        assert_eq!((no.label.as_str(), no.count), ("Not available", 1));
    }

    #[test]
    fn test_histogram_spans_range() {
        let values = [100.0, 150.0, 200.0];
        let hist = PriceHistogram::build(&values, 20);
        assert_eq!(hist.bins.len(), 20);
        assert_eq!(hist.bins[0].lower, 100.0);
        assert_eq!(hist.bins[19].upper, 200.0);
        assert_eq!(hist.bins[0].count, 1);
        assert_eq!(hist.bins[10].count, 1);
        assert_eq!(hist.bins[19].count, 1);
        assert_eq!(hist.total(), 3);
        assert!(hist.outliers.is_empty());
    }

    #[test]
    fn test_histogram_constant_values() {
        let hist = PriceHistogram::build(&[80.0, 80.0], 20);
        assert_eq!(hist.bins.len(), 20);
        assert_eq!(hist.bins[0].count, 2);
        assert_eq!(hist.total(), 2);
    }

    #[test]
    fn test_histogram_reports_outliers_in_input_order() {
        let values = [1000.0, 100.0, 110.0, 120.0, 130.0, 140.0, 5.0];
        let hist = PriceHistogram::build(&values, 20);
        assert_eq!(hist.outliers, [1000.0, 5.0]);
        assert_eq!(hist.total(), values.len());
    }

    #[test]
    fn test_histogram_empty() {
        assert_eq!(PriceHistogram::build(&[], 20), PriceHistogram::default());
    }

    #[test]
    fn test_review_series_groups_by_year() {
        let rows = [(Some(2022), 5), (Some(2021), 10), (None, 99), (Some(2021), 20)];
        let series = review_series(rows);
        assert_eq!(
            series,
            [
                ReviewPoint {
                    year: 2021,
                    total_reviews: 30,
                    mean_reviews: 15.0,
                    count: 2
                },
                ReviewPoint {
                    year: 2022,
                    total_reviews: 5,
                    mean_reviews: 5.0,
                    count: 1
                },
            ]
        );
    }
}
