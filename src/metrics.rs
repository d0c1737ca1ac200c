use lazy_static::lazy_static;
use prometheus::{Counter, Gauge, Histogram, register_counter, register_gauge, register_histogram};


lazy_static! {
    pub static ref REQUEST_TOTAL: Counter =
        register_counter!("gateway_requests_total", "Total number of requests").unwrap();
    pub static ref ADMITTED_TOTAL: Counter =
        register_counter!("gateway_admitted_total", "Requests admitted by the rate limiter").unwrap();
    pub static ref DENIED_TOTAL: Counter =
        register_counter!("gateway_denied_total", "Requests denied by the rate limiter").unwrap();
    pub static ref REQUEST_LATENCY: Histogram = register_histogram!(
        "gateway_request_latency_seconds",
        "Request latency in seconds"
    )
    .unwrap();
    pub static ref ACTIVE_WINDOWS: Gauge =
        register_gauge!("gateway_active_windows", "Current number of live counter windows").unwrap();
}
