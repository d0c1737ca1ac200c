use axum::{
    Router,
    routing::get,
};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;

mod audit;
mod clock;
mod config;
mod handlers;
mod limiter;
mod metrics;
mod models;
mod reaper;
mod state;
mod store;

use clock::SystemClock;
use config::Args;
use handlers::{health_handler, listings_handler, metrics_handler};
use limiter::RateLimiter;
use models::AuditRecord;
use state::AppState;
use store::CounterStore;

#[tokio::main]
async fn main() {
    // parse cli arguments
    let args = Args::parse();
    let (audit_tx, audit_rx) = mpsc::channel::<AuditRecord>(100);

    let store = Arc::new(CounterStore::new());
    let clock = Arc::new(SystemClock);

    // creating shared state
    let state = Arc::new(AppState {
        limiter: RateLimiter::new(store.clone(), clock.clone()),
        per_minute: args.per_minute,
        per_hour: args.per_hour,
        audit_tx,
    });

    // spawn the background workers
    tokio::spawn(reaper::reaper(store, clock));
    tokio::spawn(audit::audit_worker(audit_rx));

    // creating the router with routes
    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/api/v1/listings", get(listings_handler)) // guarded public endpoint
        .route("/metrics", get(metrics_handler)) // metrics endpoint
        .with_state(state);

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();

    println!("Gateway running on http://localhost:{}", args.port);
    println!(
        "Identity limits: {} req/min, {} req/hour (per process - each instance counts independently)",
        args.per_minute, args.per_hour
    );
    // need the peer address for the per-IP check
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .unwrap();
}
