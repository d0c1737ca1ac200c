use serde::{Deserialize, Serialize};

// One bookable service in the public catalog
#[derive(Deserialize, Serialize, Clone)]
pub struct Listing {
    pub id: u32,
    pub name: String,
    pub category: String,
    pub price_cents: u32,
    pub duration_minutes: u32,
}

// Response body for the public listings endpoint
#[derive(Deserialize, Serialize, Clone)]
pub struct ListingsResponse {
    pub ok: bool,
    pub listings: Vec<Listing>,
}

// Error body for denied / unauthorized requests
#[derive(Deserialize, Serialize, Clone)]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: String,
    #[serde(rename = "retryAfter", skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<i64>,
}

// Audit record - sent to the background audit worker after each request
#[derive(Clone, Debug)]
pub struct AuditRecord {
    pub identity: String,
    pub endpoint: String,
    pub origin: String,
    pub status: u16,
    pub latency_ms: u128,
    pub at: chrono::DateTime<chrono::Utc>,
}
