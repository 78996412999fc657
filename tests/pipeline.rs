use housing_catalog::api::mapping::properties_from_response;
use housing_catalog::api::memory::{InMemoryCatalog, Operation};
use housing_catalog::api::{ApiError, ErrorCategory};
use housing_catalog::currency::{RateService, RateSource, RatesResponse};
use housing_catalog::models::{Property, Tenant};
use housing_catalog::search::{filter, sort, FilterSet, SortKey};
use housing_catalog::state::{run_pipeline, scope_to_tenant};
use housing_catalog::storage::{self, JsonFileStore, TENANT_KEY};
use housing_catalog::CatalogSession;
use serde_json::json;
use std::sync::Arc;

const MEDIA: &str = "http://localhost:1337";

fn scenario_listings() -> Vec<Property> {
    let body = json!({
        "data": [
            { "id": 1, "attributes": { "titulo": "Casa", "preco": 100000, "area": 50, "createdAt": "2024-01-01" } },
            { "id": 2, "attributes": { "titulo": "Apto", "preco": 50000, "area": 80, "createdAt": "2024-06-01" } }
        ]
    });
    properties_from_response(&body, MEDIA)
}

fn prices(props: &[Property]) -> Vec<Option<f64>> {
    props.iter().map(|p| p.price).collect()
}

#[test]
fn test_price_and_recency_ordering() {
    let listings = scenario_listings();

    let by_price = sort(&listings, SortKey::PriceAsc);
    assert_eq!(prices(&by_price), vec![Some(50_000.0), Some(100_000.0)]);

    let recent = sort(&listings, SortKey::Recent);
    assert_eq!(
        recent.iter().map(|p| p.id.as_str()).collect::<Vec<_>>(),
        vec!["2", "1"]
    );
}

#[test]
fn test_price_range_from_form_values() {
    let listings = scenario_listings();
    let facets = FilterSet::from_pairs([("precoMin", "50000"), ("precoMax", "80000")]);

    let kept = filter(&listings, None, &facets);
    assert_eq!(prices(&kept), vec![Some(50_000.0)]);
}

#[test]
fn test_query_ignores_accents_and_case() {
    let body = json!({
        "data": [
            { "id": 1, "titulo": "Casa", "cidade": "São Paulo" },
            { "id": 2, "titulo": "Apto", "cidade": "Sao Paulo" },
            { "id": 3, "titulo": "Loja", "cidade": "Santos", "descricao": "Perto de SÃO PAULO" },
            { "id": 4, "titulo": "Terreno", "cidade": "Campinas" }
        ]
    });
    let listings = properties_from_response(&body, MEDIA);
    let none = FilterSet::default();

    let accented = filter(&listings, Some("São Paulo"), &none);
    let plain = filter(&listings, Some("sao paulo"), &none);
    assert_eq!(accented, plain);
    assert_eq!(accented.len(), 3);
}

#[test]
fn test_pipeline_respects_tenant_scope() {
    let body = json!({
        "data": [
            { "id": 1, "titulo": "A", "preco": 10, "cliente": { "id": 1 } },
            { "id": 2, "titulo": "B", "preco": 20, "cliente": { "id": 2 } },
            { "id": 3, "titulo": "C", "preco": 30 }
        ]
    });
    let listings = properties_from_response(&body, MEDIA);
    let tenant = Tenant::new("2", "Two");

    let scoped = scope_to_tenant(&listings, &tenant);
    assert!(scoped
        .iter()
        .all(|p| p.tenant_id.as_deref().map_or(true, |id| id == "2")));

    let snapshot = run_pipeline(&listings, &tenant, "", &FilterSet::default(), SortKey::PriceDesc);
    assert_eq!(prices(&snapshot.results), vec![Some(30.0), Some(20.0)]);
    assert_eq!(sort(&snapshot.results, SortKey::PriceDesc), snapshot.results);
}

struct Offline;

#[async_trait::async_trait]
impl RateSource for Offline {
    async fn fetch(&self) -> Result<RatesResponse, ApiError> {
        Err(ApiError::Connectivity("offline".into()))
    }
}

#[tokio::test]
async fn test_failed_switch_keeps_active_tenant() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonFileStore::open(dir.path().join("state.json")).unwrap());
    let catalog = Arc::new(InMemoryCatalog::demo());
    let rates = Arc::new(RateService::new(Arc::new(Offline), store.clone()));
    let session = CatalogSession::new(catalog.clone(), store.clone(), rates, 12);

    session.start(Some("1")).await;
    let before = session.snapshot().await;

    catalog.fail(Operation::GetTenant, ApiError::from_status(404));
    let err = session.switch_tenant("2").await.unwrap_err();

    assert_eq!(err.category(), ErrorCategory::NotFound);
    assert_eq!(session.tenant().await.id, "1");
    assert_eq!(session.snapshot().await, before);

    let reopened = JsonFileStore::open(dir.path().join("state.json")).unwrap();
    let persisted: Option<String> = storage::load(&reopened, TENANT_KEY);
    assert_eq!(persisted.as_deref(), Some("1"));
}
