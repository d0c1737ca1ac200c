use tokio::sync::mpsc;

use crate::limiter::RateLimiter;
use crate::models::AuditRecord;

// App's shared state
pub struct AppState {
    pub limiter: RateLimiter,
    pub per_minute: u32, // default per-identity quotas
    pub per_hour: u32,
    pub audit_tx: mpsc::Sender<AuditRecord>,
}
