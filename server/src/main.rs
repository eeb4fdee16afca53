mod config;
mod db;
mod rate_limit;
mod routes;
mod services;
mod state;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = match config::AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };
    let port = config.port;

    let pool = or_exit(
        db::init_pool(&config.database_url, config.db_max_connections).await,
        "database init failed",
    );

    let purge_every = config.revoked_token_purge_interval;
    let state = or_exit(state::AppState::new(pool, config), "invalid BCRYPT_COST");
    tracing::debug!(bcrypt_cost = state.passwords.cost(), "password hasher ready");

    // Drop revocation rows whose tokens have expired anyway.
    let _purge = services::revocation::spawn_purge_task(state.revocations.clone(), purge_every);

    let app = routes::app(state);
    let listener = or_exit(
        tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await,
        "failed to bind",
    );

    tracing::info!(%port, "linkup listening");
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;
    or_exit(served, "server failed");
}

/// Log a fatal startup error and exit instead of panicking.
fn or_exit<T, E: std::fmt::Display>(result: Result<T, E>, context: &str) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            tracing::error!(error = %e, "{context}");
            std::process::exit(1);
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "ctrl-c handler unavailable");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
