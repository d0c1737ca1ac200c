mod health;
mod metrics;
mod listings;

pub use health::health_handler;
pub use metrics::metrics_handler;
pub use listings::listings_handler;
