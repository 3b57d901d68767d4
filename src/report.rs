use serde::{Deserialize, Serialize};

use crate::analysis::charts::{CategoryCount, PriceHistogram, ReviewPoint};
use crate::analysis::{aggregate_with, AggregationResult};
use crate::config::DisplayConfig;
use crate::data::{apply, DatasetStore, FilterSpec, FilteredView, Record};

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// KPI values as they are displayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KpiStrings {
    pub total: String,
    pub avg_price: String,
    pub telemedicine_pct: String,
    pub avg_reviews: String,
}

/// One line of the professionals table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    pub name: String,
    pub city: String,
    pub specialization: String,
    pub reviews: u32,
    pub price: Option<f64>,
    /// "Yes" / "No", empty when unknown.
    pub telemedicine: String,
}

impl TableRow {
    fn from_record(rec: &Record) -> Self {
        let telemedicine = match rec.telemedicine {
            Some(true) => "Yes",
            Some(false) => "No",
            None => "",
        };
        TableRow {
            name: rec.name.clone(),
            city: rec.city.clone(),
            specialization: rec.specialization.clone(),
            reviews: rec.reviews,
            price: rec.price,
            telemedicine: telemedicine.to_string(),
        }
    }
}

/// Everything a dashboard needs to render one filter state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardResult {
    pub kpis: KpiStrings,
    /// Set when the filters matched nothing; charts should show a
    /// "no data" placeholder instead of the (empty) aggregates.
    pub charts_empty: bool,
    pub categories: Vec<CategoryCount>,
    pub status: Vec<CategoryCount>,
    pub prices: PriceHistogram,
    pub reviews_by_year: Vec<ReviewPoint>,
    pub table: Vec<TableRow>,
}

impl DashboardResult {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

// ---------------------------------------------------------------------------
// Assembly
// ---------------------------------------------------------------------------

/// Package the aggregates of `view` and its table projection.
pub fn assemble(
    aggregates: AggregationResult,
    view: &FilteredView<'_>,
    display: &DisplayConfig,
) -> DashboardResult {
    let status = aggregates.status.slices().to_vec();

    if view.is_empty() {
        return DashboardResult {
            kpis: KpiStrings {
                total: "0".to_string(),
                avg_price: format!("{} 0", display.currency_prefix),
                telemedicine_pct: "0%".to_string(),
                avg_reviews: "0".to_string(),
            },
            charts_empty: true,
            categories: Vec::new(),
            status,
            prices: PriceHistogram::default(),
            reviews_by_year: Vec::new(),
            table: Vec::new(),
        };
    }

    let kpis = &aggregates.kpis;
    DashboardResult {
        kpis: KpiStrings {
            total: group_thousands(kpis.count, &display.thousands_separator),
            avg_price: format!("{} {:.2}", display.currency_prefix, kpis.avg_price),
            telemedicine_pct: format!("{:.1}%", kpis.telemedicine_pct),
            avg_reviews: format!("{:.1}", kpis.avg_reviews),
        },
        charts_empty: false,
        categories: aggregates.categories,
        status,
        prices: aggregates.prices,
        reviews_by_year: aggregates.reviews_by_year,
        table: view.iter().map(TableRow::from_record).collect(),
    }
}

/// Filter, aggregate and assemble in one go.
pub fn dashboard(
    store: &DatasetStore,
    spec: &FilterSpec,
    display: &DisplayConfig,
) -> DashboardResult {
    let view = apply(store, spec);
    let aggregates = aggregate_with(&view, display.aggregate_options());
    assemble(aggregates, &view, display)
}

/// `1234567` → `"1.234.567"` with `sep = "."`.
fn group_thousands(n: usize, sep: &str) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 * sep.len());
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push_str(sep);
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::aggregate;

    fn scenario() -> DatasetStore {
        DatasetStore::from_records(vec![
            Record::new("A", "X", "Cardio", 10, 100.0, true, 2021),
            Record::new("B", "Y", "Cardio", 5, 200.0, false, 2022),
            Record::new("C", "X", "Derma", 20, 150.0, true, 2021),
        ])
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0, "."), "0");
        assert_eq!(group_thousands(999, "."), "999");
        assert_eq!(group_thousands(1000, "."), "1.000");
        assert_eq!(group_thousands(1234567, ","), "1,234,567");
    }

    #[test]
    fn test_kpi_strings_and_table() {
        let store = scenario();
        let spec = FilterSpec::default().with_specialization("Cardio");
        let result = dashboard(&store, &spec, &DisplayConfig::default());

        assert_eq!(
            result.kpis,
            KpiStrings {
                total: "2".into(),
                avg_price: "R$ 150.00".into(),
                telemedicine_pct: "50.0%".into(),
                avg_reviews: "7.5".into(),
            }
        );
        assert!(!result.charts_empty);
        let table: Vec<(&str, &str)> = result
            .table
            .iter()
            .map(|r| (r.name.as_str(), r.telemedicine.as_str()))
            .collect();
        assert_eq!(table, [("A", "Yes"), ("B", "No")]);
        assert_eq!(result.status[0].label, "Available");
        assert_eq!(result.status[1].count, 1);
    }

    #[test]
    fn test_empty_view_placeholder() {
        let store = scenario();
        let view = apply(&store, &FilterSpec::default().with_search_term("zzz"));
        let result = assemble(aggregate(&view), &view, &DisplayConfig::default());

        assert!(result.charts_empty);
        assert_eq!(result.kpis.total, "0");
        assert_eq!(result.kpis.avg_price, "R$ 0");
        assert_eq!(result.kpis.telemedicine_pct, "0%");
        assert_eq!(result.kpis.avg_reviews, "0");
        assert!(result.table.is_empty());
        assert!(result.categories.is_empty());
        assert_eq!(result.status.iter().map(|s| s.count).sum::<usize>(), 0);
    }

    #[test]
    fn test_assemble_is_idempotent() {
        let store = scenario();
        let spec = FilterSpec::defaults_for(&store);
        let display = DisplayConfig::default();
        let first = dashboard(&store, &spec, &display).to_json().unwrap();
        let second = dashboard(&store, &spec, &display).to_json().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_custom_currency() {
        let store = scenario();
        let display = DisplayConfig {
            currency_prefix: "$".into(),
            ..DisplayConfig::default()
        };
        let result = dashboard(&store, &FilterSpec::default(), &display);
        assert_eq!(result.kpis.avg_price, "$ 150.00");
        assert_eq!(result.kpis.telemedicine_pct, "66.7%");
        assert_eq!(result.kpis.avg_reviews, "11.7");
    }
}
