//! Async driver tying the API, tenant resolver, rates and search state together.

use crate::api::{CatalogApi, PropertyQuery};
use crate::currency::{price_display, Locale, PriceDisplay, RateService};
use crate::leads::{self, LeadError};
use crate::models::{Lead, Property, Tenant};
use crate::search::{suggest, Facet, FilterSet, SearchHistory, SortKey, Suggestion};
use crate::state::{CatalogState, SearchSnapshot};
use crate::storage::{self, KeyValueStore, LOCALE_KEY};
use crate::tenant::{Resolution, SwitchError, TenantResolver};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

pub struct CatalogSession {
    api: Arc<dyn CatalogApi>,
    store: Arc<dyn KeyValueStore>,
    tenants: TenantResolver,
    rates: Arc<RateService>,
    state: Mutex<CatalogState>,
    history: Mutex<SearchHistory>,
    detected_locale: Locale,
}

impl CatalogSession {
    pub fn new(
        api: Arc<dyn CatalogApi>,
        store: Arc<dyn KeyValueStore>,
        rates: Arc<RateService>,
        page_size: usize,
    ) -> Self {
        let history = SearchHistory::load(store.as_ref());
        Self {
            tenants: TenantResolver::new(api.clone(), store.clone()),
            api,
            store,
            rates,
            state: Mutex::new(CatalogState::new(page_size)),
            history: Mutex::new(history),
            detected_locale: Locale::default(),
        }
    }

    /// Locale guessed from the client environment, used when neither a saved
    /// preference nor the tenant names one
    pub fn with_detected_locale(mut self, locale: Locale) -> Self {
        self.detected_locale = locale;
        self
    }

    /// Detect the tenant and load its listings
    pub async fn start(&self, url_param: Option<&str>) -> Resolution {
        let resolution = self.tenants.detect(url_param).await;
        self.state.lock().await.set_tenant(resolution.tenant.clone());
        self.reload().await;
        resolution
    }

    /// Re-run tenant detection against a fresh tenant list, then reload.
    pub async fn refresh_tenants(&self, url_param: Option<&str>) -> Resolution {
        let resolution = self.tenants.refresh(url_param).await;
        self.state.lock().await.set_tenant(resolution.tenant.clone());
        self.reload().await;
        resolution
    }

    /// Fetch listings for the active tenant, with the server-side facets.
    /// Returns false when the response arrived after a newer fetch or a
    /// tenant change and was dropped.
    pub async fn reload(&self) -> bool {
        let (ticket, query) = {
            let mut state = self.state.lock().await;
            let ticket = state.begin_fetch();
            let query = PropertyQuery::for_tenant(state.tenant()).with_facets(state.facets());
            (ticket, query)
        };
        debug!("Loading listings for tenant {}", ticket.tenant_id);

        let result = self.api.list_properties(&query).await;
        self.state.lock().await.apply_fetch(&ticket, result)
    }

    /// Switch tenants and reload. On failure the previous tenant keeps serving.
    pub async fn switch_tenant(&self, id: &str) -> Result<Tenant, SwitchError> {
        self.state.lock().await.begin_switch();
        match self.tenants.switch(id).await {
            Ok(tenant) => {
                self.state.lock().await.set_tenant(tenant.clone());
                self.reload().await;
                Ok(tenant)
            }
            Err(SwitchError::InFlight) => Err(SwitchError::InFlight),
            Err(e) => {
                self.state.lock().await.switch_failed(e.category());
                Err(e)
            }
        }
    }

    pub async fn tenant(&self) -> Tenant {
        self.tenants.active().await
    }

    pub async fn available_tenants(&self) -> Vec<Tenant> {
        self.tenants.tenants().await
    }

    /// Run `f` against the search state; the snapshot is recomputed by the setters.
    pub async fn update<R>(&self, f: impl FnOnce(&mut CatalogState) -> R) -> R {
        f(&mut *self.state.lock().await)
    }

    /// Replace the facets. Refetches when the part the server filters on
    /// changed; returns whether it did.
    pub async fn set_facets(&self, facets: FilterSet) -> bool {
        let refetch = {
            let mut state = self.state.lock().await;
            let server_side = |f: &FilterSet| PropertyQuery::default().with_facets(f);
            let refetch = server_side(state.facets()) != server_side(&facets);
            state.set_facets(facets);
            refetch
        };
        if refetch {
            self.reload().await;
        }
        refetch
    }

    pub async fn set_facet(&self, facet: Facet, raw: &str) -> bool {
        let mut facets = self.state.lock().await.facets().clone();
        facets.set(facet, raw);
        self.set_facets(facets).await
    }

    /// Query, facets and sort back to their defaults
    pub async fn clear_filters(&self) -> bool {
        self.update(|state| {
            state.set_query("");
            state.set_sort(SortKey::default());
        })
        .await;
        self.set_facets(FilterSet::default()).await
    }

    pub async fn snapshot(&self) -> SearchSnapshot {
        self.state.lock().await.snapshot().clone()
    }

    /// Submit a search term: apply it and remember it.
    pub async fn search(&self, term: &str) -> SearchSnapshot {
        let snapshot = {
            let mut state = self.state.lock().await;
            state.set_query(term);
            state.snapshot().clone()
        };

        let mut history = self.history.lock().await;
        if history.record(term) {
            if let Err(e) = history.save(self.store.as_ref()) {
                warn!("Failed to persist search history: {}", e);
            }
        }
        info!("Search '{}' matched {} listings", term.trim(), snapshot.filtered_count);
        snapshot
    }

    pub async fn suggestions(&self, term: &str) -> Vec<Suggestion> {
        let listings = self.state.lock().await.visible_listings();
        suggest(&listings, &*self.history.lock().await, term)
    }

    pub async fn history(&self) -> Vec<String> {
        self.history.lock().await.entries().to_vec()
    }

    pub async fn clear_history(&self) {
        if let Err(e) = self.history.lock().await.clear_persisted(self.store.as_ref()) {
            warn!("Failed to clear search history: {}", e);
        }
    }

    /// Saved preference, then the tenant's locale, then the detected one
    pub async fn locale(&self) -> Locale {
        if let Some(locale) = storage::load::<Locale>(self.store.as_ref(), LOCALE_KEY) {
            return locale;
        }
        self.tenant()
            .await
            .locale
            .and_then(|tag| tag.parse().ok())
            .unwrap_or(self.detected_locale)
    }

    /// Remember the user's locale choice
    pub fn set_locale(&self, locale: Locale) {
        if let Err(e) = storage::save(self.store.as_ref(), LOCALE_KEY, &locale) {
            warn!("Failed to persist locale {}: {}", locale.tag(), e);
        }
    }

    /// Current page with prices rendered for `locale`
    pub async fn priced_page(&self, locale: Locale) -> Vec<(Property, PriceDisplay)> {
        let rates = self.rates.table().await;
        self.state
            .lock()
            .await
            .page()
            .iter()
            .map(|p| (p.clone(), price_display(p.price, locale, &rates)))
            .collect()
    }

    pub fn rates(&self) -> &Arc<RateService> {
        &self.rates
    }

    pub async fn submit_lead(&self, lead: &Lead) -> Result<(), LeadError> {
        leads::submit_lead(self.api.as_ref(), lead).await
    }
}
