use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Record – one row of the source table
// ---------------------------------------------------------------------------

/// A single medical professional.
///
/// Numeric and date fields are coerced once at load time; a value that
/// could not be parsed is stored as `None` and skipped by every numeric
/// aggregate instead of being treated as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub name: String,
    pub city: String,
    pub specialization: String,
    /// Number of reviews received.
    pub reviews: u32,
    /// Consultation price, `None` when missing or not a finite number.
    pub price: Option<f64>,
    /// Whether the professional offers telemedicine (`None` if unknown).
    pub telemedicine: Option<bool>,
    /// Year of the most recent review.
    pub latest_review_year: Option<i32>,
}

impl Record {
    /// Convenience constructor for fully-populated records.
    pub fn new(
        name: impl Into<String>,
        city: impl Into<String>,
        specialization: impl Into<String>,
        reviews: u32,
        price: f64,
        telemedicine: bool,
        latest_review_year: i32,
    ) -> Self {
        Record {
            name: name.into(),
            city: city.into(),
            specialization: specialization.into(),
            reviews,
            price: Some(price).filter(|p| p.is_finite()),
            telemedicine: Some(telemedicine),
            latest_review_year: Some(latest_review_year),
        }
    }
}

// ---------------------------------------------------------------------------
// DatasetStore – the complete loaded dataset
// ---------------------------------------------------------------------------

/// The immutable, fully-coerced dataset with pre-computed filter domains.
///
/// Built once (by the loader or from synthetic records) and then only read.
/// Share it between sessions behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct DatasetStore {
    records: Vec<Record>,
    specializations: Vec<String>,
    cities: Vec<String>,
    price_bounds: Option<(f64, f64)>,
}

impl DatasetStore {
    /// Build the store and its option indices from loaded records.
    pub fn from_records(records: Vec<Record>) -> Self {
        let mut specializations: BTreeSet<&str> = BTreeSet::new();
        let mut cities: BTreeSet<&str> = BTreeSet::new();
        let mut price_bounds: Option<(f64, f64)> = None;

        for rec in &records {
            if !rec.specialization.is_empty() {
                specializations.insert(&rec.specialization);
            }
            if !rec.city.is_empty() {
                cities.insert(&rec.city);
            }
            if let Some(p) = rec.price {
                price_bounds = Some(match price_bounds {
                    Some((lo, hi)) => (lo.min(p), hi.max(p)),
                    None => (p, p),
                });
            }
        }

        let specializations = specializations.into_iter().map(str::to_owned).collect();
        let cities = cities.into_iter().map(str::to_owned).collect();

        DatasetStore {
            records,
            specializations,
            cities,
            price_bounds,
        }
    }

    /// Read-only snapshot of every record, in load order.
    pub fn all(&self) -> &[Record] {
        &self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Unique non-empty specializations, ascending.
    pub fn specializations(&self) -> &[String] {
        &self.specializations
    }

    /// Unique non-empty cities, ascending.
    pub fn cities(&self) -> &[String] {
        &self.cities
    }

    /// Observed `(min, max)` over every known price.
    pub fn price_bounds(&self) -> Option<(f64, f64)> {
        self.price_bounds
    }
}
