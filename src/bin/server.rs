use std::{env, fs::OpenOptions, net::SocketAddr, sync::Arc, time::Duration as StdDuration};

use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware,
};
use axum_server::Handle;
use clap::Parser;
use rusqlite::Connection;
use time::Duration;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{EnvFilter, Layer, filter, layer::SubscriberExt, util::SubscriberInitExt};

use ledger_rs::{AppConfig, AppState, build_router, graceful_shutdown, logging_middleware};

/// The REST API server for ledger_rs.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long, env = "LEDGER_DB_PATH")]
    db_path: String,

    /// The port to serve the API from.
    #[arg(short, long, env = "LEDGER_PORT", default_value_t = 3000)]
    port: u16,

    /// How many minutes a bearer token stays valid for.
    #[arg(long, env = "LEDGER_TOKEN_DURATION_MINUTES", default_value_t = 15)]
    token_duration_minutes: i64,

    /// How many milliseconds a request may wait for the database before it fails.
    #[arg(long, env = "LEDGER_LOCK_TIMEOUT_MS", default_value_t = 5000)]
    lock_timeout_ms: u64,
}

#[tokio::main]
async fn main() {
    setup_logging();

    let args = Args::parse();

    let addr = SocketAddr::from(([127, 0, 0, 1], args.port));

    let secret =
        env::var("JWT_SECRET").expect("The environment variable 'JWT_SECRET' must be set");

    let config = AppConfig {
        token_duration: Duration::minutes(args.token_duration_minutes),
        lock_timeout: StdDuration::from_millis(args.lock_timeout_ms),
        ..Default::default()
    };

    let connection = Connection::open(&args.db_path).expect("Could not open the database");
    let state = AppState::new(connection, &secret, config)
        .expect("Could not initialize the database");

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = add_tracing_layer(
        build_router(state).layer(middleware::from_fn(logging_middleware)),
    );

    tracing::info!("HTTP server listening on {}", addr);
    axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await
        .expect("Server stopped unexpectedly");
}

fn setup_logging() {
    let stdout_log = tracing_subscriber::fmt::layer().pretty();

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open("debug.log")
        .expect("Could not create log file");

    let debug_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_ansi(false)
        .with_writer(Arc::new(log_file));

    let registry = tracing_subscriber::registry();

    // RUST_LOG replaces the default levels for both outputs when it is set.
    match EnvFilter::try_from_default_env() {
        Ok(env_filter) => registry
            .with(stdout_log.and_then(debug_log).with_filter(env_filter))
            .init(),
        Err(_) => registry
            .with(
                stdout_log
                    .with_filter(filter::LevelFilter::INFO)
                    .and_then(debug_log)
                    .with_filter(filter::LevelFilter::DEBUG),
            )
            .init(),
    }
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // Errors are logged where they are handled, so skip the default 5xx logging.
        .on_failure(());

    router.layer(tracing_layer)
}
