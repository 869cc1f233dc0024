use actix_web::{web, App, HttpServer};
use anyhow::Context;
use post_service::cache::RedisCacheLayer;
use post_service::config::{LogFormat, SERVICE_NAME};
use post_service::db::PgRecordStore;
use post_service::handlers::{self, RequestDeadline};
use post_service::search::{ElasticsearchIndex, SearchIndex};
use post_service::services::PostService;
use post_service::Config;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "post_service=info,actix_web=info".into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(config.app.log_format);

    tracing::info!("Starting {} v{}", SERVICE_NAME, env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);
    config.database.log_config();

    let db_pool = db_pool::create_pool(config.database.clone())
        .await
        .context("failed to create database pool")?;

    if config.run_migrations {
        sqlx::migrate!("./migrations")
            .run(&db_pool)
            .await
            .context("failed to run database migrations")?;
        tracing::info!("Database migrations applied");
    }

    let cache = RedisCacheLayer::connect(&config.cache)
        .await
        .context("failed to connect to Redis")?;

    let index = ElasticsearchIndex::new(&config.search)
        .context("failed to build Elasticsearch client")?;
    match index.ensure_index().await {
        Ok(()) => tracing::info!(index = index.index_name(), "Search index ready"),
        Err(e) => tracing::warn!(
            index = index.index_name(),
            error = %e,
            "Search index unavailable at startup; continuing without it"
        ),
    }

    let service = PostService::new(
        Arc::new(PgRecordStore::new(db_pool.clone())),
        Arc::new(cache),
        Arc::new(index),
    )
    .with_related_limit(config.search.related_limit);

    let service_data = web::Data::new(service);
    let deadline = web::Data::new(RequestDeadline(Duration::from_millis(
        config.app.request_timeout_ms,
    )));

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("HTTP server listening on {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .app_data(service_data.clone())
            .app_data(deadline.clone())
            .wrap(tracing_actix_web::TracingLogger::default())
            .route(
                "/metrics",
                web::get().to(post_service::metrics::serve_metrics),
            )
            .configure(handlers::configure_health)
            .configure(handlers::configure)
    })
    .bind(&bind_address)?
    .run()
    .await?;

    tracing::info!("HTTP server stopped; closing database pool");
    db_pool.close().await;

    Ok(())
}
