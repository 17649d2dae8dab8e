use crate::config::Config;
use crate::errors::AppError;
use axum::http::HeaderMap;
use serde_json::json;
use std::time::Duration;

/// Client for the Cloudflare Turnstile siteverify API.
#[derive(Clone)]
pub struct TurnstileClient {
    client: reqwest::Client,
    base_url: String,
    secret: String,
}

/// Parsed siteverify verdict plus the service's raw payload.
#[derive(Debug, Clone)]
pub struct TurnstileVerdict {
    pub success: bool,
    /// Verbatim response body, surfaced on rejection for debugging.
    pub details: serde_json::Value,
}

impl TurnstileClient {
    /// Builds the client from configuration.
    ///
    /// The secret is not independently guarded: when unset, requests go out
    /// with an empty secret and the service rejects them, which surfaces on
    /// the same client-error path as a bad token.
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                AppError::ExternalApiError(format!("Failed to create Turnstile client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: config.turnstile_base_url.clone(),
            secret: config.turnstile_secret_key.clone().unwrap_or_default(),
        })
    }

    /// Confirms a challenge token with the verification service.
    ///
    /// # Arguments
    ///
    /// * `token` - The opaque challenge token issued by the widget.
    /// * `remote_ip` - Best-effort client address; informational only.
    ///
    /// # Returns
    ///
    /// * `Ok(TurnstileVerdict)` when the service answered, whatever the
    ///   verdict. Rejection is a verdict, not an error.
    /// * `Err(AppError::ExternalApiError)` when the service was unreachable
    ///   or returned a non-success status, so callers can keep "token
    ///   rejected" and "service down" distinguishable.
    pub async fn verify(&self, token: &str, remote_ip: &str) -> Result<TurnstileVerdict, AppError> {
        let url = format!("{}/turnstile/v0/siteverify", self.base_url);
        tracing::info!("Verifying Turnstile token (client: {})", remote_ip);

        let body = json!({
            "secret": self.secret,
            "response": token,
            "remoteip": remote_ip,
        });

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                AppError::ExternalApiError(format!("Turnstile request failed: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::ExternalApiError(format!(
                "Turnstile returned {}: {}",
                status, error_text
            )));
        }

        let details: serde_json::Value = response.json().await.map_err(|e| {
            AppError::ExternalApiError(format!("Failed to parse Turnstile response: {}", e))
        })?;

        let success = details
            .get("success")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        if success {
            tracing::info!("✓ Turnstile token verified");
        } else {
            tracing::warn!("Turnstile rejected token: {}", details);
        }

        Ok(TurnstileVerdict { success, details })
    }
}

/// Best-effort client address from forwarding headers.
///
/// Falls back to a sentinel when no header is present; informational only,
/// never a trust boundary.
pub fn client_ip_from_headers(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .or_else(|| headers.get("x-real-ip"))
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(',').next().unwrap_or(v).trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn test_config(base_url: &str) -> Config {
        Config {
            database_url: "postgresql://test".to_string(),
            port: 8080,
            emailjs_service_id: None,
            emailjs_template_id: None,
            emailjs_public_key: None,
            emailjs_base_url: "https://api.emailjs.com".to_string(),
            turnstile_site_key: None,
            turnstile_secret_key: Some("secret".to_string()),
            turnstile_base_url: base_url.to_string(),
            fallback_contact_email: "hello@echoweb.com".to_string(),
        }
    }

    #[tokio::test]
    async fn test_client_creation() {
        let client = TurnstileClient::new(&test_config("https://challenges.cloudflare.com"));
        assert!(client.is_ok());
    }

    #[test]
    fn forwarded_header_wins_and_first_hop_is_used() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.2"));
        assert_eq!(client_ip_from_headers(&headers), "203.0.113.7");
    }

    #[test]
    fn missing_headers_fall_back_to_unknown() {
        assert_eq!(client_ip_from_headers(&HeaderMap::new()), "unknown");
    }
}
