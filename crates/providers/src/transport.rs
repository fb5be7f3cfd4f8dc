//! Shared HTTP exchange for provider clients.
//!
//! One bounded request/response round trip, with every failure mode folded
//! into `ProviderFailure`.

use pathfinder_core::error::ProviderFailure;
use std::time::Duration;
use tracing::warn;

/// Longest error body kept in `ProviderFailure::Http`.
const MAX_ERROR_BODY: usize = 512;

/// Build the HTTP client shared by providers.
pub fn default_client() -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(concat!("pathfinder/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(10))
        .build()
        .unwrap_or_default()
}

/// Send `request` and parse the body as JSON, all within `timeout`.
pub(crate) async fn send_json(
    provider_id: &str,
    request: reqwest::RequestBuilder,
    timeout: Duration,
) -> Result<serde_json::Value, ProviderFailure> {
    let timeout_ms = timeout.as_millis() as u64;
    let map_err = |e: reqwest::Error| {
        if e.is_timeout() {
            ProviderFailure::Timeout { timeout_ms }
        } else {
            // The URL may carry credentials.
            ProviderFailure::Transport(e.without_url().to_string())
        }
    };

    let exchange = async {
        let response = request.timeout(timeout).send().await.map_err(map_err)?;
        let status = response.status();
        let body = response.text().await.map_err(map_err)?;
        Ok::<_, ProviderFailure>((status, body))
    };

    let (status, body) = tokio::time::timeout(timeout, exchange)
        .await
        .map_err(|_| ProviderFailure::Timeout { timeout_ms })??;

    if !status.is_success() {
        warn!(provider = %provider_id, status = status.as_u16(), "Provider returned error status");
        return Err(ProviderFailure::Http {
            status: status.as_u16(),
            body: truncate(&body, MAX_ERROR_BODY),
        });
    }

    serde_json::from_str(&body)
        .map_err(|e| ProviderFailure::MalformedResponse(format!("invalid JSON body: {e}")))
}

/// Interpret a JSON value as reply text, best effort.
///
/// Strings are taken as-is, arrays of text parts are joined, and any other
/// non-null value is rendered as JSON. Blank results count as absent.
pub(crate) fn best_effort_text(value: &serde_json::Value) -> Option<String> {
    let text = match value {
        serde_json::Value::Null => return None,
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Array(parts) => parts
            .iter()
            .filter_map(|part| match part {
                serde_json::Value::String(s) => Some(s.clone()),
                other => other.get("text").and_then(|t| t.as_str()).map(String::from),
            })
            .collect::<Vec<_>>()
            .join(""),
        other => other.to_string(),
    };
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn truncate(body: &str, max: usize) -> String {
    if body.len() <= max {
        return body.to_string();
    }
    let mut end = max;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &body[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn best_effort_accepts_strings_and_parts() {
        assert_eq!(best_effort_text(&json!("  hello ")).as_deref(), Some("hello"));
        assert_eq!(
            best_effort_text(&json!([{"type": "text", "text": "a"}, "b"])).as_deref(),
            Some("ab")
        );
        assert_eq!(best_effort_text(&json!(42)).as_deref(), Some("42"));
    }

    #[test]
    fn best_effort_rejects_blank() {
        assert!(best_effort_text(&json!(null)).is_none());
        assert!(best_effort_text(&json!("   ")).is_none());
        assert!(best_effort_text(&json!([])).is_none());
    }

    #[tokio::test]
    async fn transport_error_omits_request_url() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let request = reqwest::Client::new().get(format!("http://{addr}/v1?key=secret-in-query"));
        let err = send_json("provider_b", request, Duration::from_secs(2))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderFailure::Transport(_)), "{err}");
        assert!(!err.to_string().contains("secret-in-query"), "{err}");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let body = "é".repeat(400);
        let out = truncate(&body, 511);
        assert!(out.ends_with('…'));
        assert!(out.len() <= 511 + '…'.len_utf8());
    }
}
