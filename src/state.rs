use std::sync::Arc;

use crate::config::DisplayConfig;
use crate::data::{category_choice, DatasetStore, FilterSpec, PriceRange, TelemedicineFilter};
use crate::report::{dashboard, DashboardResult};

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

/// Filter selections of one dashboard session, independent of rendering.
///
/// The store is shared read-only between sessions; each session only owns
/// its [`FilterSpec`].
#[derive(Debug, Clone)]
pub struct DashboardState {
    store: Arc<DatasetStore>,
    spec: FilterSpec,
    display: DisplayConfig,
}

impl DashboardState {
    /// Start a session with every filter cleared.
    pub fn new(store: Arc<DatasetStore>, display: DisplayConfig) -> Self {
        let spec = FilterSpec::defaults_for(&store);
        Self {
            store,
            spec,
            display,
        }
    }

    pub fn store(&self) -> &DatasetStore {
        &self.store
    }

    pub fn spec(&self) -> &FilterSpec {
        &self.spec
    }

    /// `None`, `""`, `any` or `all` selects every specialization.
    pub fn set_specialization(&mut self, specialization: Option<String>) {
        self.spec.specialization = specialization.as_deref().and_then(category_choice);
    }

    /// `None`, `""`, `any` or `all` selects every city.
    pub fn set_city(&mut self, city: Option<String>) {
        self.spec.city = city.as_deref().and_then(category_choice);
    }

    pub fn set_telemedicine(&mut self, telemedicine: TelemedicineFilter) {
        self.spec.telemedicine = telemedicine;
    }

    pub fn set_price_range(&mut self, range: PriceRange) {
        self.spec.price_range = Some(range);
    }

    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.spec.search_term = term.into();
    }

    /// Reset every filter to the defaults derived from the loaded store.
    pub fn clear_filters(&mut self) {
        self.spec = FilterSpec::defaults_for(&self.store);
    }

    /// Recompute the dashboard for the current selections.
    pub fn result(&self) -> DashboardResult {
        dashboard(&self.store, &self.spec, &self.display)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Record;

    fn state() -> DashboardState {
        let store = DatasetStore::from_records(vec![
            Record::new("A", "X", "Cardio", 10, 100.0, true, 2021),
            Record::new("B", "Y", "Cardio", 5, 200.0, false, 2022),
            Record::new("C", "X", "Derma", 20, 150.0, true, 2021),
        ]);
        DashboardState::new(Arc::new(store), DisplayConfig::default())
    }

    #[test]
    fn test_new_session_sees_everything() {
        let state = state();
        assert_eq!(state.result().table.len(), 3);
        assert_eq!(state.spec().price_range, PriceRange::new(100.0, 200.0).ok());
    }

    #[test]
    fn test_clear_filters_restores_store_defaults() {
        let mut state = state();
        state.set_city(Some("Y".into()));
        state.set_search_term("b");
        state.set_telemedicine(TelemedicineFilter::NotAvailable);
        state.set_price_range(PriceRange::new(150.0, 250.0).unwrap());
        assert_eq!(state.result().table.len(), 1);

        state.clear_filters();
        assert_eq!(state.spec(), &FilterSpec::defaults_for(state.store()));
        assert_eq!(state.result().kpis.total, "3");
    }

    #[test]
    fn test_sessions_share_store_independently() {
        let first = state();
        let mut second = first.clone();
        second.set_specialization(Some("Derma".into()));

        assert_eq!(first.result().table.len(), 3);
        assert_eq!(second.result().table.len(), 1);
        assert!(std::ptr::eq(first.store(), second.store()));
    }

    #[test]
    fn test_any_selection_clears_category_filter() {
        let mut state = state();
        state.set_city(Some("Y".into()));
        assert_eq!(state.result().table.len(), 1);

        state.set_city(Some("any".into()));
        state.set_specialization(Some(String::new()));
        assert_eq!(state.spec().city, None);
        assert_eq!(state.spec().specialization, None);
        assert_eq!(state.result().table.len(), 3);
    }
}
