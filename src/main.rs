use bantay::cache::{FacilityCache, MemoryFacilityCache, RedisFacilityCache};
use bantay::config::Config;
use bantay::constants::{FACILITY_MEMORY_CACHE_MAX_ENTRIES, FACILITY_STALE_RETENTION_SECONDS};
use bantay::db::{OutboxRepository, PgOutboxRepository, PgRiskRepository, RiskRepository};
use bantay::services::mapbox::AuthMode;
use bantay::services::{
    EmailSender, EmergencyBroadcaster, ExpoPushClient, FacilityService, GeocodingClient,
    MapboxClient, OutboxDispatcher, OverpassClient, PushSender, ResendClient, RouteSafetyService,
};
use bantay::AppState;
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bantay=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().map_err(|e| format!("Failed to load configuration: {}", e))?;
    config
        .risk
        .validate()
        .map_err(|e| format!("Invalid risk configuration: {}", e))?;

    tracing::info!("Starting Bantay API server");

    tracing::info!("Connecting to database...");
    let db_pool = bantay::db::create_pool(&config.database_url).await?;
    tracing::info!("Database connection established");

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(&db_pool).await?;
    tracing::info!("Database migrations completed");

    // Facility cache: try Redis, fall back to in-memory
    let facility_cache: Arc<dyn FacilityCache> = match config.redis_url {
        Some(ref redis_url) => {
            match RedisFacilityCache::new(redis_url, FACILITY_STALE_RETENTION_SECONDS).await {
                Ok(redis_cache) => Arc::new(redis_cache),
                Err(e) => {
                    tracing::warn!(
                        "Failed to connect to Redis: {}. Falling back to in-memory cache.",
                        e
                    );
                    Arc::new(MemoryFacilityCache::new(
                        FACILITY_STALE_RETENTION_SECONDS,
                        FACILITY_MEMORY_CACHE_MAX_ENTRIES,
                    ))
                }
            }
        }
        None => {
            tracing::info!("Redis URL not configured. Using in-memory cache.");
            Arc::new(MemoryFacilityCache::new(
                FACILITY_STALE_RETENTION_SECONDS,
                FACILITY_MEMORY_CACHE_MAX_ENTRIES,
            ))
        }
    };

    let risk_repo: Arc<dyn RiskRepository> = Arc::new(PgRiskRepository::new(db_pool.clone()));
    let outbox_repo: Arc<dyn OutboxRepository> = Arc::new(PgOutboxRepository::new(db_pool.clone()));

    let mapbox_client = match config.mapbox_base_url {
        Some(ref base_url) => MapboxClient::with_config(
            config.mapbox_api_key.clone(),
            base_url.clone(),
            AuthMode::BearerHeader,
        ),
        None => MapboxClient::new(config.mapbox_api_key.clone()),
    };

    let email_sender: Option<Arc<dyn EmailSender>> = match config.resend_api_key {
        Some(ref key) => Some(Arc::new(ResendClient::new(key.clone(), config.email_from.clone()))),
        None => {
            tracing::warn!("RESEND_API_KEY not set. Email jobs will stay queued.");
            None
        }
    };
    let push_sender: Option<Arc<dyn PushSender>> =
        Some(Arc::new(ExpoPushClient::new(config.expo_access_token.clone())));

    let dispatcher = Arc::new(OutboxDispatcher::new(
        outbox_repo.clone(),
        email_sender,
        push_sender,
        config.dispatcher.clone(),
    ));

    let state = Arc::new(AppState {
        risk_repo: risk_repo.clone(),
        outbox_repo: outbox_repo.clone(),
        route_safety: RouteSafetyService::new(risk_repo, config.risk.clone()),
        directions: Arc::new(mapbox_client),
        geocoder: Arc::new(GeocodingClient::new(config.mapbox_api_key.clone())),
        facilities: FacilityService::new(
            Arc::new(OverpassClient::new()),
            facility_cache,
            config.facility_bounds,
            config.facility_cache_ttl,
        ),
        broadcaster: EmergencyBroadcaster::new(outbox_repo),
        dispatcher: dispatcher.clone(),
    });

    // Background outbox sweeps
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let dispatcher_task = if config.dispatcher.enabled {
        Some(tokio::spawn(async move { dispatcher.run(shutdown_rx).await }))
    } else {
        tracing::info!("Outbox dispatcher disabled; use POST /api/jobs/process");
        None
    };

    let app = bantay::routes::create_app(state);

    let addr = config.server_address();
    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
            tracing::info!("Shutdown signal received");
        })
        .await?;

    let _ = shutdown_tx.send(true);
    if let Some(task) = dispatcher_task {
        if let Err(e) = task.await {
            tracing::error!("Outbox dispatcher task failed: {}", e);
        }
    }

    Ok(())
}
