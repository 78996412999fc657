use anyhow::{Context, Result};
use clap::Parser;
use housing_catalog::api::{CatalogApi, InMemoryCatalog, StrapiClient};
use housing_catalog::currency::{format_rate, Currency, HttpRateSource, Locale, RateService};
use housing_catalog::search::{Facet, FilterSet, RoomMatch, SortKey};
use housing_catalog::state::Phase;
use housing_catalog::storage::{JsonFileStore, KeyValueStore};
use housing_catalog::{CatalogSession, Config};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "housing-catalog", about = "Browse a white-label property catalog")]
struct Args {
    /// Free-text search over title, description, city, address and type
    #[arg(short, long)]
    query: Option<String>,

    /// Tenant id, as the `tenant` URL parameter would carry it
    #[arg(short, long)]
    tenant: Option<String>,

    /// Switch to this tenant after startup
    #[arg(long)]
    switch: Option<String>,

    #[arg(long = "type")]
    property_type: Option<String>,

    #[arg(long)]
    city: Option<String>,

    #[arg(long)]
    price_min: Option<String>,

    #[arg(long)]
    price_max: Option<String>,

    #[arg(long)]
    bedrooms: Option<String>,

    #[arg(long)]
    bathrooms: Option<String>,

    #[arg(long)]
    area_min: Option<String>,

    #[arg(long)]
    area_max: Option<String>,

    /// Treat bedrooms/bathrooms as minimums instead of exact counts
    #[arg(long)]
    at_least: bool,

    /// recent, price-asc, price-desc, area-asc or area-desc
    #[arg(short, long, default_value = "recent")]
    sort: SortKey,

    /// pt-BR, es-PY or en-US; remembered for later runs
    #[arg(short, long)]
    locale: Option<Locale>,

    #[arg(short, long, default_value_t = 1)]
    page: usize,

    /// Print type-ahead suggestions for a partial term
    #[arg(long)]
    suggest: Option<String>,

    /// Write all results to this file as JSON
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Use the built-in demo catalog instead of the API
    #[arg(long)]
    demo: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = Config::from_env();

    info!("🏠 Housing Catalog");
    info!("==================");

    let store: Arc<dyn KeyValueStore> = Arc::new(
        JsonFileStore::open(&config.storage_path)
            .with_context(|| format!("Failed to open state file {:?}", config.storage_path))?,
    );

    let api: Arc<dyn CatalogApi> = if args.demo {
        Arc::new(InMemoryCatalog::demo())
    } else {
        Arc::new(StrapiClient::from_config(&config)?)
    };

    let rate_source = HttpRateSource::new(config.rates_url.clone(), config.http_timeout)?;
    let rates = Arc::new(RateService::new(Arc::new(rate_source), store.clone()));
    rates.refresh().await;
    let refresher = rates.clone().spawn_refresh_loop(config.rate_refresh);

    let session = CatalogSession::new(api, store, rates.clone(), config.page_size)
        .with_detected_locale(config.detected_locale());
    let resolution = session.start(args.tenant.as_deref()).await;
    info!("Using tenant {} ({:?})", resolution.tenant.name, resolution.source);

    if let Some(id) = &args.switch {
        if let Err(e) = session.switch_tenant(id).await {
            warn!("{} ({})", e.category().message(), e);
        }
    }

    let mut facets = FilterSet::default();
    facets.room_match = if args.at_least {
        RoomMatch::AtLeast
    } else {
        RoomMatch::Exact
    };
    for (facet, value) in [
        (Facet::Type, &args.property_type),
        (Facet::City, &args.city),
        (Facet::PriceMin, &args.price_min),
        (Facet::PriceMax, &args.price_max),
        (Facet::Bedrooms, &args.bedrooms),
        (Facet::Bathrooms, &args.bathrooms),
        (Facet::AreaMin, &args.area_min),
        (Facet::AreaMax, &args.area_max),
    ] {
        if let Some(raw) = value {
            facets.set(facet, raw);
        }
    }
    session.set_facets(facets).await;
    session.update(|state| state.set_sort(args.sort)).await;

    let snapshot = match &args.query {
        Some(query) => session.search(query).await,
        None => session.snapshot().await,
    };

    if let Phase::Failed(category) = session.update(|state| state.phase()).await {
        anyhow::bail!("Could not load listings: {}", category.message());
    }

    if let Some(locale) = args.locale {
        session.set_locale(locale);
    }
    let locale = session.locale().await;

    let rate_snapshot = rates.snapshot().await;
    if let Some(notice) = rate_snapshot.stale_notice() {
        warn!("{}", notice);
    }
    let local = locale.local_currency();
    if local != Currency::Usd {
        info!(
            "1 USD = {} {}",
            format_rate(rate_snapshot.table.rate(local), locale),
            local.code()
        );
    }

    session.update(|state| state.go_to_page(args.page)).await;
    let pagination = session.update(|state| *state.pagination()).await;

    info!(
        "\n✅ {} of {} listings match (page {}/{})\n",
        snapshot.filtered_count,
        snapshot.total_count,
        pagination.current,
        pagination.total_pages().max(1)
    );

    let first = pagination.range().start;
    for (i, (property, price)) in session.priced_page(locale).await.iter().enumerate() {
        println!("{}. {} - {}", first + i + 1, property.title, price);
        let kind = property.property_type.map(|t| t.cms_label()).unwrap_or("-");
        println!("   {} | {}", kind, property.city);
        if let (Some(bedrooms), Some(area)) = (property.bedrooms, property.area) {
            println!("   {} quartos, {} m²", bedrooms, area);
        }
        println!("   ID: {}", property.id);
        println!();
    }

    if snapshot.filtered_count == 0 && snapshot.has_active_filters {
        println!("No listings match the current filters.");
    }

    if let Some(term) = &args.suggest {
        for suggestion in session.suggestions(term).await {
            println!("  → {}", suggestion.label);
        }
    }

    if let Some(path) = &args.output {
        let json = serde_json::to_string_pretty(&snapshot.results)?;
        tokio::fs::write(path, json)
            .await
            .with_context(|| format!("Failed to write {:?}", path))?;
        info!("💾 Saved {} listings to {:?}", snapshot.results.len(), path);
    }

    refresher.abort();
    Ok(())
}
