//! Server binary: load `.env`, prepare the database, serve the API.

use inventory_api::{
    app, apply_migrations, config, ensure_database_exists, seed_sample_data, AppConfig, AppState, AuthProvider,
    PgStore, SupabaseAuth, UnconfiguredAuth,
};
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("inventory_api=info,tower_http=info")),
        )
        .init();

    let cfg = AppConfig::from_env()?;
    config::validate(config::ALL_ENTITIES)?;

    ensure_database_exists(&cfg.database_url).await?;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(cfg.db_max_connections)
        .connect(&cfg.database_url)
        .await?;
    if cfg.run_migrations {
        apply_migrations(&pool).await?;
    }

    let auth: Arc<dyn AuthProvider> = match (&cfg.supabase_url, &cfg.supabase_anon_key) {
        (Some(url), Some(key)) => Arc::new(SupabaseAuth::new(url.clone(), key.clone())),
        _ => {
            tracing::warn!("SUPABASE_URL or SUPABASE_ANON_KEY not set; auth endpoints will fail");
            Arc::new(UnconfiguredAuth)
        }
    };
    if cfg.supabase_service_role_key.is_some() {
        tracing::info!("service role key present");
    }

    let port = cfg.port;
    let seed = cfg.seed_sample_data;
    let state = AppState::new(Arc::new(PgStore::new(pool)), auth, cfg);
    if seed {
        seed_sample_data(&state.services).await?;
    }

    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!(
        port,
        environment = %state.config.environment,
        writes_require_auth = state.config.require_auth_for_writes,
        "inventory api listening"
    );
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
