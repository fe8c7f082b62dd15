//! HTTP request handlers for the intake API.

use std::net::SocketAddr;

use axum::{
    body::Bytes,
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::AppState;
use crate::dispatch::DispatchResult;
use crate::models::{ContactForm, EventBookingForm, SubmissionForm};
use crate::rate_limit::RateLimitStats;
use crate::validation::FieldErrors;

/// Source identifier used when nothing better is known.
const UNKNOWN_SOURCE: &str = "unknown";

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub environment: &'static str,
    pub rate_limits: RateLimitStats,
}

/// Service health and limiter counts.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let status = if state.dispatcher.is_configured() {
        "ok"
    } else {
        "degraded"
    };
    Json(HealthResponse {
        status,
        environment: state.environment.as_str(),
        rate_limits: state.dispatcher.rate_limit_stats(),
    })
}

/// Contact form submission.
pub async fn submit_contact(
    State(state): State<AppState>,
    connect: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let source = source_id(&headers, connect.map(|c| c.0), state.trust_proxy_headers);
    match parse_body::<ContactForm>(&body) {
        Ok(form) => submit(&state, SubmissionForm::Contact(form), &source).await,
        Err(result) => respond(&state, result),
    }
}

/// Event booking submission.
pub async fn submit_event(
    State(state): State<AppState>,
    connect: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let source = source_id(&headers, connect.map(|c| c.0), state.trust_proxy_headers);
    match parse_body::<EventBookingForm>(&body) {
        Ok(form) => submit(&state, SubmissionForm::Event(form), &source).await,
        Err(result) => respond(&state, result),
    }
}

async fn submit(state: &AppState, form: SubmissionForm, source: &str) -> Response {
    let result = state.dispatcher.dispatch(&form, source).await;
    respond(state, result)
}

fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, DispatchResult> {
    serde_json::from_slice(body).map_err(|e| {
        tracing::debug!("Rejecting malformed submission body: {}", e);
        DispatchResult::invalid(FieldErrors::single(
            "body",
            "Request body must be a valid JSON object",
        ))
    })
}

/// Map a dispatch result onto an HTTP response.
fn respond(state: &AppState, result: DispatchResult) -> Response {
    let status = status_for(&result);
    let retry_after = result.reset_time().map(|reset| {
        let now = state.dispatcher.clock().wall_now();
        let millis = (reset - now).num_milliseconds().max(0) as u64;
        millis.div_ceil(1000).max(1)
    });

    let mut response = (status, Json(result)).into_response();
    if let Some(secs) = retry_after {
        if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
            response.headers_mut().insert(header::RETRY_AFTER, value);
        }
    }
    response
}

/// HTTP status for each kind of outcome.
pub fn status_for(result: &DispatchResult) -> StatusCode {
    if result.success {
        StatusCode::OK
    } else if result.validation_errors().is_some() {
        StatusCode::UNPROCESSABLE_ENTITY
    } else if result.reset_time().is_some() {
        StatusCode::TOO_MANY_REQUESTS
    } else if result.api_error().is_some() {
        StatusCode::BAD_GATEWAY
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

/// Identify the caller for per-source rate limiting.
///
/// With `trust_proxy` set, proxy headers win over the peer address; otherwise
/// they are ignored since any client can set them.
pub fn source_id(headers: &HeaderMap, peer: Option<SocketAddr>, trust_proxy: bool) -> String {
    let peer_id = || {
        peer.map(|addr| addr.ip().to_string())
            .unwrap_or_else(|| UNKNOWN_SOURCE.to_string())
    };
    if !trust_proxy {
        return peer_id();
    }

    let header_value = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    if let Some(forwarded) = header_value("x-forwarded-for") {
        if let Some(first) = forwarded
            .split(',')
            .map(str::trim)
            .find(|s| !s.is_empty())
        {
            return first.to_string();
        }
    }

    if let Some(real_ip) = header_value("x-real-ip") {
        let real_ip = real_ip.trim();
        if !real_ip.is_empty() {
            return real_ip.to_string();
        }
    }

    peer_id()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::DispatchError;
    use crate::mail::ApiError;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn test_source_id_precedence() {
        let peer: SocketAddr = "192.0.2.7:51234".parse().unwrap();

        let forwarded = headers(&[
            ("x-forwarded-for", " 203.0.113.5 , 10.0.0.1"),
            ("x-real-ip", "198.51.100.2"),
        ]);
        assert_eq!(source_id(&forwarded, Some(peer), true), "203.0.113.5");

        let real_ip = headers(&[("x-real-ip", "198.51.100.2")]);
        assert_eq!(source_id(&real_ip, Some(peer), true), "198.51.100.2");

        assert_eq!(source_id(&HeaderMap::new(), Some(peer), true), "192.0.2.7");
        assert_eq!(source_id(&HeaderMap::new(), None, true), "unknown");

        let blank = headers(&[("x-forwarded-for", " , ")]);
        assert_eq!(source_id(&blank, None, true), "unknown");
    }

    #[test]
    fn test_source_id_ignores_untrusted_proxy_headers() {
        let peer: SocketAddr = "192.0.2.7:51234".parse().unwrap();
        let spoofed = headers(&[
            ("x-forwarded-for", "203.0.113.5"),
            ("x-real-ip", "198.51.100.2"),
        ]);

        assert_eq!(source_id(&spoofed, Some(peer), false), "192.0.2.7");
        assert_eq!(source_id(&spoofed, None, false), "unknown");
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(&DispatchResult::ok()), StatusCode::OK);
        assert_eq!(
            status_for(&DispatchResult::invalid(FieldErrors::single("name", "x"))),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_for(
                &DispatchError::Provider(ApiError {
                    status: 401,
                    code: None,
                    message: "Key not found".to_string(),
                })
                .into()
            ),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_for(&DispatchError::Unexpected("boom".to_string()).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
