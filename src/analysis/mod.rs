//! Aggregation layer: KPI summary and chart-ready aggregates over a
//! [`FilteredView`]. Every call recomputes from the view; nothing is cached.

pub mod charts;
pub mod stats;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::data::FilteredView;
use charts::{
    category_ranking, review_series, CategoryCount, PriceHistogram, ReviewPoint, StatusBreakdown,
};

pub const DEFAULT_TOP_CATEGORIES: usize = 10;
pub const DEFAULT_HISTOGRAM_BINS: usize = 20;

/// Tunables for [`aggregate_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregateOptions {
    pub top_categories: usize,
    pub histogram_bins: usize,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        AggregateOptions {
            top_categories: DEFAULT_TOP_CATEGORIES,
            histogram_bins: DEFAULT_HISTOGRAM_BINS,
        }
    }
}

/// Headline numbers, unrounded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KpiSummary {
    pub count: usize,
    /// Mean over known prices only.
    pub avg_price: f64,
    /// Share of all records with telemedicine, in percent.
    pub telemedicine_pct: f64,
    pub avg_reviews: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregationResult {
    pub kpis: KpiSummary,
    pub categories: Vec<CategoryCount>,
    pub status: StatusBreakdown,
    pub prices: PriceHistogram,
    pub reviews_by_year: Vec<ReviewPoint>,
}

impl AggregationResult {
    /// The result for an empty view: zero KPIs and empty charts.
    pub fn empty() -> Self {
        AggregationResult::default()
    }
}

/// [`aggregate_with`] using the default top-10 ranking and 20 bins.
pub fn aggregate(view: &FilteredView<'_>) -> AggregationResult {
    aggregate_with(view, AggregateOptions::default())
}

pub fn aggregate_with(view: &FilteredView<'_>, options: AggregateOptions) -> AggregationResult {
    if view.is_empty() {
        return AggregationResult::empty();
    }

    let prices: Vec<f64> = view.iter().filter_map(|r| r.price).collect();
    let result = AggregationResult {
        kpis: compute_kpis(view, &prices),
        categories: category_ranking(
            view.iter().map(|r| r.specialization.as_str()),
            options.top_categories,
        ),
        status: StatusBreakdown::from_flags(view.iter().map(|r| r.telemedicine)),
        prices: PriceHistogram::build(&prices, options.histogram_bins),
        reviews_by_year: review_series(view.iter().map(|r| (r.latest_review_year, r.reviews))),
    };

    debug!(
        "aggregated {} records: {} categories, {} priced, {} price outliers, {} years",
        view.len(),
        result.categories.len(),
        prices.len(),
        result.prices.outliers.len(),
        result.reviews_by_year.len()
    );
    result
}

fn compute_kpis(view: &FilteredView<'_>, prices: &[f64]) -> KpiSummary {
    let count = view.len();
    let with_telemedicine = view.iter().filter(|r| r.telemedicine == Some(true)).count();

    KpiSummary {
        count,
        avg_price: stats::mean(prices.iter().copied()).unwrap_or(0.0),
        telemedicine_pct: 100.0 * with_telemedicine as f64 / count as f64,
        avg_reviews: stats::mean(view.iter().map(|r| f64::from(r.reviews))).unwrap_or(0.0),
    }
}
