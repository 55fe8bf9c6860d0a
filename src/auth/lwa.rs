//! Login with Amazon refresh-token exchange.

use serde::Deserialize;

use crate::auth::credentials::{AccessToken, ValidatedCredentials};
use crate::error::{RelayError, RelayResult};

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct TokenErrorResponse {
    error: Option<String>,
    error_description: Option<String>,
}

/// Client for the LWA token endpoint.
#[derive(Clone, Debug)]
pub struct LwaClient {
    http: reqwest::Client,
    token_url: String,
}

impl LwaClient {
    pub fn new(http: reqwest::Client, token_url: impl Into<String>) -> Self {
        Self {
            http,
            token_url: token_url.into(),
        }
    }

    /// Exchange the refresh token for a fresh access token.
    ///
    /// Not retried: a rejected exchange is an authentication failure.
    pub async fn exchange(&self, credentials: &ValidatedCredentials) -> RelayResult<AccessToken> {
        let form = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("grant_type", "refresh_token")
            .append_pair("refresh_token", &credentials.refresh_token)
            .append_pair("client_id", &credentials.lwa_client_id)
            .append_pair("client_secret", &credentials.lwa_client_secret)
            .finish();

        let response = self
            .http
            .post(&self.token_url)
            .header(reqwest::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(form)
            .send()
            .await
            .map_err(|e| RelayError::Authentication(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RelayError::Authentication(e.to_string()))?;

        if !status.is_success() {
            let description = serde_json::from_str::<TokenErrorResponse>(&body)
                .ok()
                .and_then(|e| e.error_description.or(e.error))
                .unwrap_or_else(|| format!("Request failed with status code {}", status.as_u16()));
            tracing::warn!(status = status.as_u16(), "LWA token exchange rejected");
            return Err(RelayError::Authentication(description));
        }

        let token: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| RelayError::Authentication(format!("malformed token response: {}", e)))?;

        tracing::debug!(client_id = %credentials.lwa_client_id, "Obtained LWA access token");
        Ok(AccessToken::new(token.access_token))
    }
}
