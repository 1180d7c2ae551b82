use dotenvy::dotenv;
use stay_market::{
    config::{self, database},
    core::{
        catalog,
        rating::spawn_rating_worker,
        search::{self, NoPhotos, SearchCriteria},
    },
    errors::Result,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; DATABASE_URL may come from there
    dotenv().ok();

    // 3. Load the application configuration
    let app_config = config::load_config_or_default(CONFIG_PATH)
        .inspect_err(|e| error!("Critical error loading application configuration: {}", e))?;

    // 4. Connect and make sure the schema exists
    let database_url = database::resolve_database_url(app_config.database_url.as_deref());
    let db = database::create_connection(&database_url)
        .await
        .inspect_err(|e| error!("Failed to connect to {}: {}", database_url, e))?;
    database::create_tables(&db)
        .await
        .inspect(|()| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to initialize database: {}", e))?;

    // 5. Seed reference data and listings from config.toml
    catalog::seed_catalog(&db, &app_config.catalog)
        .await
        .inspect_err(|e| error!("Failed to seed catalog: {}", e))?;

    // 6. Start the rating worker and run the default search as a smoke check
    let (dispatcher, worker) = spawn_rating_worker(db.clone(), &app_config.rating);

    let results = search::search(
        &db,
        &app_config.search,
        &NoPhotos,
        &SearchCriteria::default(),
    )
    .await?;
    info!(
        "Default search: {} bookable properties, {} facility facets",
        results.properties.meta.total,
        results.facilities.len()
    );
    for hit in &results.properties.data {
        let cheapest = hit.apartments.iter().map(|a| a.price).min();
        info!(
            "  {} ({}) - {} apartment(s), from {:?}",
            hit.name,
            hit.city,
            hit.apartments.len(),
            cheapest
        );
    }

    drop(dispatcher);
    if let Err(e) = worker.await {
        error!("Rating worker panicked: {}", e);
    }
    Ok(())
}
