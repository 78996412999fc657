//! Search/tenant orchestration state.
//!
//! `CatalogState` owns every pipeline input (listings, query, facets, sort
//! key, active tenant) and recomputes the published [`SearchSnapshot`] on
//! each change. Property fetches are tagged with a [`FetchTicket`]; a
//! response is applied only if its ticket is the latest one issued and was
//! issued for the tenant that is still active.

use crate::api::{ApiError, ErrorCategory};
use crate::models::{Property, Tenant};
use crate::search::{
    self, catalog_stats, facet_options, CatalogStats, Facet, FacetOptions, FilterSet, Pagination,
    RoomMatch, SortKey,
};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Lifecycle of the catalog as seen by the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Loading,
    Ready,
    Switching,
    /// Listings could not be loaded (distinct from an empty result)
    Failed(ErrorCategory),
}

/// Published pipeline output
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchSnapshot {
    pub results: Vec<Property>,
    /// Fetched listings visible to the active tenant, before the query and
    /// client-side facets
    pub total_count: usize,
    pub filtered_count: usize,
    pub has_active_filters: bool,
}

/// Issued when a property fetch starts; hand it back with the response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub generation: u64,
    pub tenant_id: String,
}

/// Listings the tenant may see: its own plus shared ones. The placeholder
/// tenant sees everything.
pub fn scope_to_tenant(properties: &[Property], tenant: &Tenant) -> Vec<Property> {
    if tenant.is_default() {
        return properties.to_vec();
    }
    properties
        .iter()
        .filter(|p| p.is_shared() || p.tenant_id.as_deref() == Some(tenant.id.as_str()))
        .cloned()
        .collect()
}

pub fn has_active_filters(query: &str, facets: &FilterSet, sort: SortKey) -> bool {
    !query.trim().is_empty() || !facets.is_empty() || sort != SortKey::default()
}

/// scope -> hide inactive -> filter -> sort
pub fn run_pipeline(
    properties: &[Property],
    tenant: &Tenant,
    query: &str,
    facets: &FilterSet,
    sort: SortKey,
) -> SearchSnapshot {
    let visible: Vec<Property> = scope_to_tenant(properties, tenant)
        .into_iter()
        .filter(|p| p.active)
        .collect();
    let filtered = search::filter(&visible, Some(query), facets);
    let results = search::sort(&filtered, sort);

    SearchSnapshot {
        total_count: visible.len(),
        filtered_count: results.len(),
        has_active_filters: has_active_filters(query, facets, sort),
        results,
    }
}

pub struct CatalogState {
    tenant: Tenant,
    properties: Vec<Property>,
    query: String,
    facets: FilterSet,
    sort: SortKey,
    phase: Phase,
    switch_error: Option<ErrorCategory>,
    generation: u64,
    snapshot: SearchSnapshot,
    pagination: Pagination,
}

impl CatalogState {
    pub fn new(page_size: usize) -> Self {
        Self {
            tenant: Tenant::fallback(),
            properties: Vec::new(),
            query: String::new(),
            facets: FilterSet::default(),
            sort: SortKey::default(),
            phase: Phase::Loading,
            switch_error: None,
            generation: 0,
            snapshot: SearchSnapshot::default(),
            pagination: Pagination::new(page_size),
        }
    }

    fn recompute(&mut self) {
        self.snapshot = run_pipeline(
            &self.properties,
            &self.tenant,
            &self.query,
            &self.facets,
            self.sort,
        );
        self.pagination.reset(self.snapshot.filtered_count);
        debug!(
            "Pipeline: {} listings, {} visible, {} results (sort {})",
            self.properties.len(),
            self.snapshot.total_count,
            self.snapshot.filtered_count,
            self.sort
        );
    }

    pub fn tenant(&self) -> &Tenant {
        &self.tenant
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn facets(&self) -> &FilterSet {
        &self.facets
    }

    pub fn sort_key(&self) -> SortKey {
        self.sort
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Category of the last failed tenant switch, cleared by the next success
    pub fn switch_error(&self) -> Option<ErrorCategory> {
        self.switch_error
    }

    pub fn snapshot(&self) -> &SearchSnapshot {
        &self.snapshot
    }

    /// Loaded without error, but nothing matched
    pub fn is_empty_result(&self) -> bool {
        self.phase == Phase::Ready && self.snapshot.filtered_count == 0
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
        self.recompute();
    }

    pub fn set_facet(&mut self, facet: Facet, raw: &str) {
        self.facets.set(facet, raw);
        self.recompute();
    }

    pub fn set_facets(&mut self, facets: FilterSet) {
        self.facets = facets;
        self.recompute();
    }

    pub fn set_room_match(&mut self, mode: RoomMatch) {
        self.facets.room_match = mode;
        self.recompute();
    }

    pub fn set_sort(&mut self, sort: SortKey) {
        self.sort = sort;
        self.recompute();
    }

    /// Query, facets and sort back to their defaults
    pub fn clear_filters(&mut self) {
        self.query.clear();
        self.facets = FilterSet::default();
        self.sort = SortKey::default();
        self.recompute();
    }

    /// Activate a tenant. Fetches issued for the previous one become stale.
    pub fn set_tenant(&mut self, tenant: Tenant) {
        if tenant.id != self.tenant.id {
            info!("Active tenant is now {} ({})", tenant.name, tenant.id);
        }
        self.tenant = tenant;
        self.switch_error = None;
        if self.phase == Phase::Switching {
            self.phase = Phase::Ready;
        }
        self.recompute();
    }

    pub fn begin_switch(&mut self) {
        self.phase = Phase::Switching;
    }

    /// The previous tenant stays active; only the error is recorded.
    pub fn switch_failed(&mut self, category: ErrorCategory) {
        self.switch_error = Some(category);
        if self.phase == Phase::Switching {
            self.phase = Phase::Ready;
        }
    }

    /// Start a property fetch for the active tenant
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.generation += 1;
        if self.phase != Phase::Switching {
            self.phase = Phase::Loading;
        }
        FetchTicket {
            generation: self.generation,
            tenant_id: self.tenant.id.clone(),
        }
    }

    pub fn is_current(&self, ticket: &FetchTicket) -> bool {
        ticket.generation == self.generation && ticket.tenant_id == self.tenant.id
    }

    /// Apply a fetch response. Returns false (and changes nothing) when the
    /// ticket has been superseded.
    pub fn apply_fetch(
        &mut self,
        ticket: &FetchTicket,
        result: Result<Vec<Property>, ApiError>,
    ) -> bool {
        if !self.is_current(ticket) {
            debug!(
                "Discarding stale response (generation {} for tenant {}, now {} for {})",
                ticket.generation, ticket.tenant_id, self.generation, self.tenant.id
            );
            return false;
        }

        match result {
            Ok(properties) => {
                self.properties = properties;
                self.phase = Phase::Ready;
            }
            Err(e) => {
                warn!("Failed to load properties: {}", e);
                self.properties.clear();
                self.phase = Phase::Failed(e.category());
            }
        }
        self.recompute();
        true
    }

    pub fn pagination(&self) -> &Pagination {
        &self.pagination
    }

    pub fn go_to_page(&mut self, page: usize) {
        self.pagination.go_to(page);
    }

    pub fn set_page_size(&mut self, size: usize) {
        self.pagination.set_page_size(size);
    }

    /// Current page of results
    pub fn page(&self) -> &[Property] {
        self.pagination.page(&self.snapshot.results)
    }

    /// Active listings the current tenant may see, unfiltered
    pub fn visible_listings(&self) -> Vec<Property> {
        scope_to_tenant(&self.properties, &self.tenant)
            .into_iter()
            .filter(|p| p.active)
            .collect()
    }

    /// Options for the filter widgets, from what the tenant can see
    pub fn facet_options(&self) -> FacetOptions {
        facet_options(&self.visible_listings())
    }

    pub fn stats(&self) -> Option<CatalogStats> {
        catalog_stats(&self.visible_listings())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(id: &str, tenant: Option<&str>, price: f64) -> Property {
        Property {
            title: format!("Listing {}", id),
            city: "Lima".to_string(),
            price: Some(price),
            tenant_id: tenant.map(str::to_string),
            ..Property::new(id)
        }
    }

    fn ids(props: &[Property]) -> Vec<&str> {
        props.iter().map(|p| p.id.as_str()).collect()
    }

    fn listings() -> Vec<Property> {
        vec![
            listing("a", Some("1"), 300.0),
            listing("b", Some("2"), 200.0),
            listing("c", None, 100.0),
        ]
    }

    #[test]
    fn test_scope_keeps_own_and_shared() {
        let props = listings();
        let scoped = scope_to_tenant(&props, &Tenant::new("1", "One"));
        assert_eq!(ids(&scoped), vec!["a", "c"]);
        assert!(scoped
            .iter()
            .all(|p| p.tenant_id.is_none() || p.tenant_id.as_deref() == Some("1")));

        assert_eq!(scope_to_tenant(&props, &Tenant::fallback()).len(), 3);
    }

    #[test]
    fn test_pipeline_counts_and_flags() {
        let mut props = listings();
        props.push(Property {
            active: false,
            ..listing("hidden", Some("1"), 50.0)
        });
        let tenant = Tenant::new("1", "One");

        let plain = run_pipeline(&props, &tenant, "", &FilterSet::default(), SortKey::Recent);
        assert_eq!(plain.total_count, 2);
        assert_eq!(plain.filtered_count, 2);
        assert!(!plain.has_active_filters);

        let sorted = run_pipeline(&props, &tenant, " ", &FilterSet::default(), SortKey::PriceAsc);
        assert_eq!(ids(&sorted.results), vec!["c", "a"]);
        assert!(sorted.has_active_filters);

        let facets = FilterSet::from_pairs([("priceMin", "150")]);
        let narrowed = run_pipeline(&props, &tenant, "", &facets, SortKey::Recent);
        assert_eq!(ids(&narrowed.results), vec!["a"]);
        assert_eq!(narrowed.total_count, 2);
        assert!(narrowed.has_active_filters);
    }

    #[test]
    fn test_inputs_trigger_recompute() {
        let mut state = CatalogState::new(12);
        state.set_tenant(Tenant::new("1", "One"));
        let ticket = state.begin_fetch();
        assert_eq!(state.phase(), Phase::Loading);
        assert!(state.apply_fetch(&ticket, Ok(listings())));
        assert_eq!(state.phase(), Phase::Ready);
        assert_eq!(state.snapshot().filtered_count, 2);

        state.set_query("listing c");
        assert_eq!(ids(&state.snapshot().results), vec!["c"]);

        state.set_facet(Facet::PriceMin, "500");
        assert!(state.is_empty_result());

        state.clear_filters();
        assert_eq!(state.snapshot().filtered_count, 2);
        assert!(!state.snapshot().has_active_filters);
    }

    #[test]
    fn test_superseded_fetch_is_discarded() {
        let mut state = CatalogState::new(12);
        state.set_tenant(Tenant::new("1", "One"));
        let first = state.begin_fetch();
        let second = state.begin_fetch();

        assert!(!state.apply_fetch(&first, Ok(vec![listing("old", Some("1"), 1.0)])));
        assert!(state.snapshot().results.is_empty());

        assert!(state.apply_fetch(&second, Ok(listings())));
        assert_eq!(state.snapshot().total_count, 2);
    }

    #[test]
    fn test_fetch_for_previous_tenant_is_discarded() {
        let mut state = CatalogState::new(12);
        state.set_tenant(Tenant::new("1", "One"));
        let ticket = state.begin_fetch();

        state.begin_switch();
        state.set_tenant(Tenant::new("2", "Two"));

        assert!(!state.apply_fetch(&ticket, Ok(listings())));
        assert_eq!(state.tenant().id, "2");
        assert!(state.snapshot().results.is_empty());
    }

    #[test]
    fn test_load_failure_is_not_an_empty_result() {
        let mut state = CatalogState::new(12);
        let ticket = state.begin_fetch();
        state.apply_fetch(&ticket, Err(ApiError::Connectivity("refused".into())));

        assert_eq!(state.phase(), Phase::Failed(ErrorCategory::Connectivity));
        assert!(!state.is_empty_result());
    }

    #[test]
    fn test_switch_failure_keeps_tenant() {
        let mut state = CatalogState::new(12);
        state.set_tenant(Tenant::new("1", "One"));
        state.begin_switch();
        assert_eq!(state.phase(), Phase::Switching);

        state.switch_failed(ErrorCategory::NotFound);
        assert_eq!(state.tenant().id, "1");
        assert_eq!(state.switch_error(), Some(ErrorCategory::NotFound));
        assert_eq!(state.phase(), Phase::Ready);
    }

    #[test]
    fn test_results_are_paginated() {
        let mut state = CatalogState::new(2);
        let ticket = state.begin_fetch();
        let props: Vec<Property> = (0..5).map(|i| listing(&i.to_string(), None, i as f64)).collect();
        state.apply_fetch(&ticket, Ok(props));
        state.set_sort(SortKey::PriceAsc);

        assert_eq!(state.pagination().total_pages(), 3);
        assert_eq!(ids(state.page()), vec!["0", "1"]);
        state.go_to_page(3);
        assert_eq!(ids(state.page()), vec!["4"]);

        state.set_query("listing");
        assert_eq!(state.pagination().current, 1);
    }
}
