//! Active-tenant detection and switching.

use crate::api::{ApiError, CatalogApi, ErrorCategory};
use crate::models::Tenant;
use crate::storage::{self, KeyValueStore, TENANT_KEY};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Which rule picked the tenant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionSource {
    UrlParam,
    Stored,
    FirstAvailable,
    /// No tenants available; the placeholder tenant is active
    Fallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub tenant: Tenant,
    pub id: String,
    pub source: ResolutionSource,
}

/// Pick a tenant: URL parameter, then the stored preference, then the first
/// candidate. An empty candidate list yields the placeholder tenant.
pub fn resolve(candidates: &[Tenant], url_param: Option<&str>, stored: Option<&str>) -> Resolution {
    let find = |wanted: Option<&str>| {
        let wanted = wanted.map(str::trim).filter(|w| !w.is_empty())?;
        candidates.iter().find(|t| t.id == wanted)
    };

    let (tenant, source) = if let Some(t) = find(url_param) {
        (t.clone(), ResolutionSource::UrlParam)
    } else if let Some(t) = find(stored) {
        (t.clone(), ResolutionSource::Stored)
    } else if let Some(t) = candidates.first() {
        (t.clone(), ResolutionSource::FirstAvailable)
    } else {
        (Tenant::fallback(), ResolutionSource::Fallback)
    };

    Resolution {
        id: tenant.id.clone(),
        tenant,
        source,
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SwitchError {
    #[error("a tenant switch is already in progress")]
    InFlight,

    #[error("tenant switch failed: {0}")]
    Api(#[from] ApiError),
}

impl SwitchError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SwitchError::InFlight => ErrorCategory::Generic,
            SwitchError::Api(e) => e.category(),
        }
    }
}

/// Clears the switching flag however the switch ends
struct SwitchGuard<'a>(&'a AtomicBool);

impl Drop for SwitchGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Owns the active tenant and its persisted preference.
///
/// Only one switch runs at a time; a second request while one is pending is
/// rejected with [`SwitchError::InFlight`].
pub struct TenantResolver {
    api: Arc<dyn CatalogApi>,
    store: Arc<dyn KeyValueStore>,
    active: RwLock<Tenant>,
    tenants: RwLock<Vec<Tenant>>,
    switching: AtomicBool,
}

impl TenantResolver {
    pub fn new(api: Arc<dyn CatalogApi>, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            api,
            store,
            active: RwLock::new(Tenant::fallback()),
            tenants: RwLock::new(Vec::new()),
            switching: AtomicBool::new(false),
        }
    }

    pub async fn active(&self) -> Tenant {
        self.active.read().await.clone()
    }

    /// Tenants from the last successful listing
    pub async fn tenants(&self) -> Vec<Tenant> {
        self.tenants.read().await.clone()
    }

    pub fn is_switching(&self) -> bool {
        self.switching.load(Ordering::Acquire)
    }

    pub fn stored_id(&self) -> Option<String> {
        storage::load(self.store.as_ref(), TENANT_KEY)
    }

    fn persist(&self, id: &str) {
        if let Err(e) = storage::save(self.store.as_ref(), TENANT_KEY, id) {
            warn!("Failed to persist tenant id {}: {}", id, e);
        }
    }

    /// Load the tenant list and activate the best match. A failed listing
    /// degrades to the placeholder tenant rather than erroring.
    pub async fn detect(&self, url_param: Option<&str>) -> Resolution {
        info!("Detecting tenant via {}", self.api.backend_name());

        let candidates = match self.api.list_tenants().await {
            Ok(list) => {
                if list.is_empty() {
                    warn!("No tenants returned by the API");
                }
                list
            }
            Err(e) => {
                warn!("Failed to list tenants: {}", e);
                Vec::new()
            }
        };

        let stored = self.stored_id();
        let resolution = resolve(&candidates, url_param, stored.as_deref());
        debug!("Tenant {} chosen by {:?}", resolution.id, resolution.source);

        if resolution.source != ResolutionSource::Fallback {
            self.persist(&resolution.id);
        }
        *self.tenants.write().await = candidates;
        *self.active.write().await = resolution.tenant.clone();

        info!("Tenant configured: {}", resolution.tenant.name);
        resolution
    }

    /// Re-run detection (e.g. after the tenant list changed)
    pub async fn refresh(&self, url_param: Option<&str>) -> Resolution {
        self.detect(url_param).await
    }

    /// Make `id` the active tenant. On failure the previous tenant and the
    /// persisted id are left untouched and the tenant list is reloaded.
    pub async fn switch(&self, id: &str) -> Result<Tenant, SwitchError> {
        if self.switching.swap(true, Ordering::AcqRel) {
            warn!("Ignoring switch to {}: another switch is in progress", id);
            return Err(SwitchError::InFlight);
        }
        let _guard = SwitchGuard(&self.switching);

        info!("Switching tenant to {}", id);
        match self.api.get_tenant(id).await {
            Ok(tenant) => {
                self.persist(&tenant.id);
                *self.active.write().await = tenant.clone();
                info!("Tenant switched to {}", tenant.name);
                Ok(tenant)
            }
            Err(e) => {
                warn!("Tenant switch to {} failed: {}", id, e);
                match self.api.list_tenants().await {
                    Ok(list) => *self.tenants.write().await = list,
                    Err(e) => debug!("Tenant list refresh also failed: {}", e),
                }
                Err(SwitchError::Api(e))
            }
        }
    }
}
