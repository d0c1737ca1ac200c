use axum::{
    Json,
    extract::{ConnectInfo, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use crate::limiter::RateLimitResult;
use crate::metrics::{ADMITTED_TOTAL, DENIED_TOTAL, REQUEST_LATENCY, REQUEST_TOTAL};
use crate::models::{AuditRecord, ErrorResponse, Listing, ListingsResponse};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ListingsQuery {
    pub api_key: Option<String>,
}

// Resolve the presented API key into an opaque identity. Real
// credential -> quota lookup lives in the account service; here the raw
// token is hashed so it never appears as a counter key or in audit logs.
fn resolve_identity(headers: &HeaderMap, query: &ListingsQuery) -> Option<String> {
    let token = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.to_string())
        .or_else(|| query.api_key.clone());

    let token = token.filter(|t| !t.is_empty())?;

    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    Some(format!("key:{}", &digest[..16]))
}

fn reset_at_iso(reset_at_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(reset_at_ms)
        .map(|t| t.to_rfc3339())
        .unwrap_or_default()
}

// 429 with the Retry-After header and the standard error body
fn rate_limited_response(result: &RateLimitResult) -> Response {
    let retry_after = result.retry_after.unwrap_or(0);
    (
        StatusCode::TOO_MANY_REQUESTS,
        [("Retry-After", retry_after.to_string())],
        Json(ErrorResponse {
            ok: false,
            error: "Rate limit exceeded".to_string(),
            retry_after: Some(retry_after),
        }),
    )
        .into_response()
}

// The public read-only catalog. The rest of the platform manages this
// through the admin backend; the gateway serves a snapshot.
fn catalog() -> Vec<Listing> {
    vec![
        Listing {
            id: 1,
            name: "Deep tissue massage".to_string(),
            category: "wellness".to_string(),
            price_cents: 9500,
            duration_minutes: 60,
        },
        Listing {
            id: 2,
            name: "Personal training session".to_string(),
            category: "fitness".to_string(),
            price_cents: 7000,
            duration_minutes: 45,
        },
        Listing {
            id: 3,
            name: "Haircut and styling".to_string(),
            category: "beauty".to_string(),
            price_cents: 5500,
            duration_minutes: 30,
        },
    ]
}

// Guarded public endpoint: identity check first, origin check only if
// the identity check admits, then the payload with rate limit headers
pub async fn listings_handler(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Query(query): Query<ListingsQuery>,
    headers: HeaderMap,
) -> Response {
    REQUEST_TOTAL.inc();
    let start_time = Instant::now();
    let origin = addr.ip().to_string();

    let Some(identity) = resolve_identity(&headers, &query) else {
        let response = (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                ok: false,
                error: "API key required".to_string(),
                retry_after: None,
            }),
        )
            .into_response();
        REQUEST_LATENCY.observe(start_time.elapsed().as_secs_f64());
        audit(&state, "anonymous", &origin, &response, start_time);
        return response;
    };

    let verdict = state
        .limiter
        .check_identity_limit(&identity, state.per_minute, state.per_hour);

    let response = if !verdict.allowed {
        DENIED_TOTAL.inc();
        rate_limited_response(&verdict)
    } else {
        let origin_verdict = state.limiter.check_origin_limit(&origin);
        if !origin_verdict.allowed {
            DENIED_TOTAL.inc();
            rate_limited_response(&origin_verdict)
        } else {
            ADMITTED_TOTAL.inc();
            (
                StatusCode::OK,
                [
                    ("X-RateLimit-Limit", state.per_hour.to_string()),
                    ("X-RateLimit-Remaining", verdict.remaining.to_string()),
                    ("X-RateLimit-Reset", reset_at_iso(verdict.reset_at)),
                ],
                Json(ListingsResponse {
                    ok: true,
                    listings: catalog(),
                }),
            )
                .into_response()
        }
    };

    REQUEST_LATENCY.observe(start_time.elapsed().as_secs_f64());
    audit(&state, &identity, &origin, &response, start_time);
    response
}

// Fire-and-forget: a full queue or dead worker never blocks admission
fn audit(state: &Arc<AppState>, identity: &str, origin: &str, response: &Response, start: Instant) {
    let _ = state.audit_tx.try_send(AuditRecord {
        identity: identity.to_string(),
        endpoint: "/api/v1/listings".to_string(),
        origin: origin.to_string(),
        status: response.status().as_u16(),
        latency_ms: start.elapsed().as_millis(),
        at: chrono::Utc::now(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::limiter::RateLimiter;
    use crate::store::CounterStore;
    use tokio::sync::mpsc;

    fn test_state(per_minute: u32, per_hour: u32) -> Arc<AppState> {
        let (audit_tx, _audit_rx) = mpsc::channel(8);
        Arc::new(AppState {
            limiter: RateLimiter::new(Arc::new(CounterStore::new()), Arc::new(SystemClock)),
            per_minute,
            per_hour,
            audit_tx,
        })
    }

    async fn call(state: &Arc<AppState>, api_key: Option<&str>) -> Response {
        let addr: SocketAddr = "10.0.0.7:40000".parse().unwrap();
        listings_handler(
            State(Arc::clone(state)),
            ConnectInfo(addr),
            Query(ListingsQuery {
                api_key: api_key.map(|k| k.to_string()),
            }),
            HeaderMap::new(),
        )
        .await
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn admitted_response_carries_rate_limit_headers() {
        let state = test_state(5, 10);

        let response = call(&state, Some("client-a")).await;
        assert_eq!(response.status(), StatusCode::OK);

        let headers = response.headers();
        assert_eq!(headers.get("X-RateLimit-Limit").unwrap(), "10");
        assert_eq!(headers.get("X-RateLimit-Remaining").unwrap(), "9");
        let reset = headers.get("X-RateLimit-Reset").unwrap().to_str().unwrap();
        chrono::DateTime::parse_from_rfc3339(reset).unwrap();

        let body = body_json(response).await;
        assert_eq!(body["ok"], true);
        assert!(!body["listings"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn denied_response_is_429_with_retry_after() {
        let state = test_state(1, 10);

        assert_eq!(call(&state, Some("client-b")).await.status(), StatusCode::OK);

        let response = call(&state, Some("client-b")).await;
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

        let retry_header: i64 = response
            .headers()
            .get("Retry-After")
            .unwrap()
            .to_str()
            .unwrap()
            .parse()
            .unwrap();
        assert!(retry_header >= 1 && retry_header <= 60);

        let body = body_json(response).await;
        assert_eq!(body["ok"], false);
        assert_eq!(body["error"], "Rate limit exceeded");
        assert_eq!(body["retryAfter"], retry_header);
    }

    #[tokio::test]
    async fn missing_key_is_401_and_still_observed_in_latency() {
        let state = test_state(5, 10);
        let latency_samples_before = REQUEST_LATENCY.get_sample_count();

        let response = call(&state, None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = body_json(response).await;
        assert_eq!(body["ok"], false);
        assert_eq!(body["error"], "API key required");
        assert!(body.get("retryAfter").is_none());

        // unauthorized requests show up in the latency histogram too
        assert!(REQUEST_LATENCY.get_sample_count() > latency_samples_before);
    }

    #[test]
    fn bearer_header_resolves_to_hashed_identity() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", "Bearer secret-token".parse().unwrap());
        let query = ListingsQuery { api_key: None };

        let identity = resolve_identity(&headers, &query).unwrap();
        assert!(identity.starts_with("key:"));
        assert_eq!(identity.len(), "key:".len() + 16);
        // raw token never leaks into the identity
        assert!(!identity.contains("secret-token"));
    }

    #[test]
    fn query_parameter_is_a_fallback_for_the_header() {
        let headers = HeaderMap::new();
        let query = ListingsQuery {
            api_key: Some("secret-token".to_string()),
        };
        let mut header_headers = HeaderMap::new();
        header_headers.insert("authorization", "Bearer secret-token".parse().unwrap());

        let from_query = resolve_identity(&headers, &query).unwrap();
        let from_header =
            resolve_identity(&header_headers, &ListingsQuery { api_key: None }).unwrap();
        assert_eq!(from_query, from_header);
    }

    #[test]
    fn missing_or_empty_credentials_resolve_to_none() {
        let headers = HeaderMap::new();
        assert!(resolve_identity(&headers, &ListingsQuery { api_key: None }).is_none());
        assert!(
            resolve_identity(
                &headers,
                &ListingsQuery {
                    api_key: Some(String::new())
                }
            )
            .is_none()
        );
    }
}
