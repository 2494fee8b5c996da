use std::net::SocketAddr;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use toner_db::init_database;
use toner_server::{routes, AppState, Config};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            eprintln!(
                "Optional: TONER_LISTEN_ADDR, TONER_DB_PATH, TONER_STRICT_SERVICE_CYCLE, TONER_WRITE_RATE_PER_SEC"
            );
            std::process::exit(1);
        }
    };

    tracing::info!("Starting toner server");
    tracing::info!("Listen address: {}", config.listen_addr);
    tracing::info!("Database path: {}", config.db_path.display());
    tracing::info!(
        strict_service_cycle = config.policy.strict_service_cycle,
        write_rate_per_sec = config.write_rate_per_sec,
        "Transition policy loaded"
    );

    // Initialize database
    let db = match init_database(&config.db_path) {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Database error: {}", e);
            std::process::exit(1);
        }
    };

    let state = AppState::with_database(db, config.policy, config.write_rate_per_sec);

    // Periodically forget idle clients
    let limiter = state.write_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(60));
        loop {
            interval.tick().await;
            let forgotten = limiter.forget_idle();
            if forgotten > 0 {
                tracing::debug!(forgotten, "dropped idle write budgets");
            }
        }
    });

    let app = routes::create_router(state).into_make_service_with_connect_info::<SocketAddr>();

    let listener = match tokio::net::TcpListener::bind(&config.listen_addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Failed to bind to {}: {}", config.listen_addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!("Server running at http://{}", config.listen_addr);

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "server error");
        std::process::exit(1);
    }
}
