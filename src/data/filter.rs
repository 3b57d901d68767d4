use std::str::FromStr;

use log::debug;
use serde::{Deserialize, Deserializer, Serialize};

use super::model::{DatasetStore, Record};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A filter control value that cannot be turned into a predicate.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FilterError {
    #[error("price bounds must be finite numbers, got [{min}, {max}]")]
    InvalidPriceRange { min: f64, max: f64 },
    #[error("unknown telemedicine option '{0}' (expected any, yes or no)")]
    UnknownTelemedicine(String),
}

// ---------------------------------------------------------------------------
// Predicate values
// ---------------------------------------------------------------------------

/// Inclusive `[min, max]` price window.
///
/// Inverted bounds are swapped on construction; non-finite bounds are
/// rejected, so a `PriceRange` is always well-formed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 2]", into = "[f64; 2]")]
pub struct PriceRange {
    min: f64,
    max: f64,
}

impl PriceRange {
    pub fn new(a: f64, b: f64) -> Result<Self, FilterError> {
        if !a.is_finite() || !b.is_finite() {
            return Err(FilterError::InvalidPriceRange { min: a, max: b });
        }
        let (min, max) = if a <= b { (a, b) } else { (b, a) };
        Ok(PriceRange { min, max })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    /// A missing price never falls inside a range.
    pub fn contains(&self, price: Option<f64>) -> bool {
        price.is_some_and(|p| p >= self.min && p <= self.max)
    }
}

impl TryFrom<[f64; 2]> for PriceRange {
    type Error = FilterError;

    fn try_from([a, b]: [f64; 2]) -> Result<Self, Self::Error> {
        PriceRange::new(a, b)
    }
}

impl From<PriceRange> for [f64; 2] {
    fn from(range: PriceRange) -> Self {
        [range.min, range.max]
    }
}

/// Tri-state telemedicine selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TelemedicineFilter {
    #[default]
    Any,
    Available,
    NotAvailable,
}

impl TelemedicineFilter {
    fn matches(self, flag: Option<bool>) -> bool {
        match self {
            TelemedicineFilter::Any => true,
            TelemedicineFilter::Available => flag == Some(true),
            TelemedicineFilter::NotAvailable => flag == Some(false),
        }
    }
}

impl FromStr for TelemedicineFilter {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "any" | "all" | "" => Ok(TelemedicineFilter::Any),
            "yes" | "available" | "1" | "true" => Ok(TelemedicineFilter::Available),
            "no" | "not_available" | "0" | "false" => Ok(TelemedicineFilter::NotAvailable),
            _ => Err(FilterError::UnknownTelemedicine(s.to_string())),
        }
    }
}

/// A specialization or city selection. `""`, `any` and `all` (any case)
/// select every value and map to `None`.
pub fn category_choice(value: &str) -> Option<String> {
    (!is_wildcard(value)).then(|| value.to_string())
}

fn is_wildcard(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("any")
        || trimmed.eq_ignore_ascii_case("all")
}

fn deserialize_choice<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.as_deref().and_then(category_choice))
}

// ---------------------------------------------------------------------------
// FilterSpec – the five user-selected predicates
// ---------------------------------------------------------------------------

/// Filter selection. `None` / `Any` / an empty search term mean "no
/// constraint" for that predicate.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSpec {
    #[serde(deserialize_with = "deserialize_choice")]
    pub specialization: Option<String>,
    #[serde(deserialize_with = "deserialize_choice")]
    pub city: Option<String>,
    pub telemedicine: TelemedicineFilter,
    pub price_range: Option<PriceRange>,
    pub search_term: String,
}

impl FilterSpec {
    /// The "clear filters" state for `store`: every categorical filter set to
    /// any, and the price window spanning the observed prices.
    pub fn defaults_for(store: &DatasetStore) -> Self {
        FilterSpec {
            price_range: store
                .price_bounds()
                .and_then(|(lo, hi)| PriceRange::new(lo, hi).ok()),
            ..FilterSpec::default()
        }
    }

    pub fn with_specialization(mut self, specialization: impl AsRef<str>) -> Self {
        self.specialization = category_choice(specialization.as_ref());
        self
    }

    pub fn with_city(mut self, city: impl AsRef<str>) -> Self {
        self.city = category_choice(city.as_ref());
        self
    }

    pub fn with_telemedicine(mut self, telemedicine: TelemedicineFilter) -> Self {
        self.telemedicine = telemedicine;
        self
    }

    pub fn with_price_range(mut self, range: PriceRange) -> Self {
        self.price_range = Some(range);
        self
    }

    pub fn with_search_term(mut self, term: impl Into<String>) -> Self {
        self.search_term = term.into();
        self
    }

    /// Evaluate every predicate against one record (AND semantics).
    ///
    /// `needle` is the pre-lowercased search term, or `None` when the
    /// search is inactive.
    fn matches<'s>(&'s self, rec: &Record, needle: Option<&str>) -> bool {
        let choice = |value: &'s Option<String>| value.as_deref().filter(|v| !is_wildcard(v));
        if let Some(spec) = choice(&self.specialization) {
            if rec.specialization != spec {
                return false;
            }
        }
        if let Some(city) = choice(&self.city) {
            if rec.city != city {
                return false;
            }
        }
        if !self.telemedicine.matches(rec.telemedicine) {
            return false;
        }
        if let Some(range) = &self.price_range {
            if !range.contains(rec.price) {
                return false;
            }
        }
        match needle {
            Some(needle) => [&rec.name, &rec.city, &rec.specialization]
                .iter()
                .any(|field| field.to_lowercase().contains(needle)),
            None => true,
        }
    }
}

// ---------------------------------------------------------------------------
// FilteredView – the order-preserving selection
// ---------------------------------------------------------------------------

/// Records of a [`DatasetStore`] that passed a [`FilterSpec`], in dataset
/// order. Borrowed, never copied.
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    store: &'a DatasetStore,
    indices: Vec<usize>,
}

impl<'a> FilteredView<'a> {
    /// Every record of `store`.
    pub fn all(store: &'a DatasetStore) -> Self {
        FilteredView {
            store,
            indices: (0..store.len()).collect(),
        }
    }

    /// Positions of the selected records in the dataset.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Record> + '_ {
        let records = self.store.all();
        self.indices.iter().map(move |&i| &records[i])
    }

    /// Selected records collected into a vector.
    pub fn records(&self) -> Vec<&'a Record> {
        self.iter().collect()
    }
}

/// Return indices of records that pass every predicate of `spec`.
pub fn filtered_indices(store: &DatasetStore, spec: &FilterSpec) -> Vec<usize> {
    let needle = spec.search_term.to_lowercase();
    let needle = (!needle.is_empty()).then_some(needle.as_str());

    store
        .all()
        .iter()
        .enumerate()
        .filter(|(_, rec)| spec.matches(rec, needle))
        .map(|(i, _)| i)
        .collect()
}

/// Apply `spec` to `store`. An empty result is a valid view.
pub fn apply<'a>(store: &'a DatasetStore, spec: &FilterSpec) -> FilteredView<'a> {
    let indices = filtered_indices(store, spec);
    debug!("filter kept {} of {} records", indices.len(), store.len());
    FilteredView { store, indices }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario() -> DatasetStore {
        DatasetStore::from_records(vec![
            Record::new("A", "X", "Cardio", 10, 100.0, true, 2021),
            Record::new("B", "Y", "Cardio", 5, 200.0, false, 2022),
            Record::new("C", "X", "Derma", 20, 150.0, true, 2021),
        ])
    }

    fn names(view: &FilteredView<'_>) -> Vec<String> {
        view.iter().map(|r| r.name.clone()).collect()
    }

    #[test]
    fn test_specialization_filter() {
        let store = scenario();
        let view = apply(&store, &FilterSpec::default().with_specialization("Cardio"));
        assert_eq!(names(&view), ["A", "B"]);
        assert_eq!(view.indices(), [0, 1]);
    }

    #[test]
    fn test_search_is_case_insensitive_across_fields() {
        let store = scenario();
        let view = apply(&store, &FilterSpec::default().with_search_term("x"));
        assert_eq!(names(&view), ["A", "C"]);

        let view = apply(&store, &FilterSpec::default().with_search_term("DERM"));
        assert_eq!(names(&view), ["C"]);
    }

    #[test]
    fn test_price_range_is_inclusive() {
        let store = scenario();
        let view = apply(
            &store,
            &FilterSpec::default().with_price_range(PriceRange::new(160.0, 300.0).unwrap()),
        );
        assert_eq!(names(&view), ["B"]);

        let view = apply(
            &store,
            &FilterSpec::default().with_price_range(PriceRange::new(100.0, 150.0).unwrap()),
        );
        assert_eq!(names(&view), ["A", "C"]);
    }

    #[test]
    fn test_price_range_excludes_missing_prices() {
        let mut rec = Record::new("D", "X", "Cardio", 1, 0.0, true, 2020);
        rec.price = None;
        let store = DatasetStore::from_records(vec![rec]);
        let spec = FilterSpec::default().with_price_range(PriceRange::new(0.0, 1e9).unwrap());
        assert!(apply(&store, &spec).is_empty());
        // Without a range the record is kept.
        assert_eq!(apply(&store, &FilterSpec::default()).len(), 1);
    }

    #[test]
    fn test_telemedicine_filter() {
        let mut unknown = Record::new("D", "X", "Cardio", 1, 10.0, true, 2020);
        unknown.telemedicine = None;
        let mut records = scenario().all().to_vec();
        records.push(unknown);
        let store = DatasetStore::from_records(records);

        let yes = FilterSpec::default().with_telemedicine(TelemedicineFilter::Available);
        assert_eq!(names(&apply(&store, &yes)), ["A", "C"]);
        let no = FilterSpec::default().with_telemedicine(TelemedicineFilter::NotAvailable);
        assert_eq!(names(&apply(&store, &no)), ["B"]);
        assert_eq!(apply(&store, &FilterSpec::default()).len(), 4);
    }

    #[test]
    fn test_predicates_are_conjunctive() {
        let store = scenario();
        let spec = FilterSpec::default()
            .with_city("X")
            .with_telemedicine(TelemedicineFilter::Available)
            .with_specialization("Derma");
        assert_eq!(names(&apply(&store, &spec)), ["C"]);

        let spec = FilterSpec::default().with_city("Y").with_search_term("derma");
        assert!(apply(&store, &spec).is_empty());
    }

    #[test]
    fn test_defaults_select_everything() {
        let store = scenario();
        let spec = FilterSpec::defaults_for(&store);
        assert_eq!(spec.price_range, Some(PriceRange::new(100.0, 200.0).unwrap()));
        let view = apply(&store, &spec);
        assert_eq!(view.indices(), FilteredView::all(&store).indices());
    }

    #[test]
    fn test_price_range_policy() {
        let swapped = PriceRange::new(300.0, 160.0).unwrap();
        assert_eq!((swapped.min(), swapped.max()), (160.0, 300.0));
        assert!(matches!(
            PriceRange::new(f64::NAN, 10.0),
            Err(FilterError::InvalidPriceRange { .. })
        ));
    }

    #[test]
    fn test_spec_deserializes_with_range_validation() {
        let spec: FilterSpec =
            serde_json::from_str(r#"{"city": "X", "price_range": [300, 160]}"#).unwrap();
        assert_eq!(spec.city.as_deref(), Some("X"));
        assert_eq!(spec.price_range.map(|r| r.min()), Some(160.0));
        assert_eq!(spec.telemedicine, TelemedicineFilter::Any);
    }

    #[test]
    fn test_wildcard_categories_select_everything() {
        let store = scenario();
        for raw in [
            r#"{"specialization": "any"}"#,
            r#"{"specialization": "ALL"}"#,
            r#"{"city": ""}"#,
            r#"{"city": " Any "}"#,
            r#"{"specialization": null, "city": "all"}"#,
        ] {
            let spec: FilterSpec = serde_json::from_str(raw).unwrap();
            assert_eq!(spec.specialization, None, "{raw}");
            assert_eq!(spec.city, None, "{raw}");
            assert_eq!(apply(&store, &spec).len(), 3, "{raw}");
        }

        let spec = FilterSpec::default().with_specialization("Any").with_city("");
        assert_eq!(spec, FilterSpec::default());

        let literal = FilterSpec {
            specialization: Some("all".into()),
            city: Some(String::new()),
            ..FilterSpec::default()
        };
        assert_eq!(apply(&store, &literal).len(), 3);
    }

    #[test]
    fn test_category_choice() {
        assert_eq!(category_choice("Cardio"), Some("Cardio".to_string()));
        assert_eq!(category_choice("any"), None);
        assert_eq!(category_choice("All"), None);
        assert_eq!(category_choice("  "), None);
        assert_eq!(category_choice("Anywhere"), Some("Anywhere".to_string()));
    }

    #[test]
    fn test_telemedicine_from_str() {
        assert_eq!("Yes".parse::<TelemedicineFilter>(), Ok(TelemedicineFilter::Available));
        assert_eq!("all".parse::<TelemedicineFilter>(), Ok(TelemedicineFilter::Any));
        assert!("maybe".parse::<TelemedicineFilter>().is_err());
    }
}
