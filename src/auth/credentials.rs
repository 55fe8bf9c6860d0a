//! Credential types.

use std::fmt;

use serde::Deserialize;

use crate::error::{RelayError, RelayResult};

/// Credentials as supplied by the caller. Any field may be missing.
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Credentials {
    pub lwa_client_id: Option<String>,
    pub lwa_client_secret: Option<String>,
    pub refresh_token: Option<String>,
    pub seller_id: Option<String>,
}

/// Credentials with every field present and non-empty.
#[derive(Clone)]
pub struct ValidatedCredentials {
    pub lwa_client_id: String,
    pub lwa_client_secret: String,
    pub refresh_token: String,
    pub seller_id: String,
}

impl Credentials {
    /// Reject the request unless all four fields carry a value.
    pub fn validate(self) -> RelayResult<ValidatedCredentials> {
        fn present(value: Option<String>) -> Option<String> {
            value.filter(|v| !v.trim().is_empty())
        }

        match (
            present(self.lwa_client_id),
            present(self.lwa_client_secret),
            present(self.refresh_token),
            present(self.seller_id),
        ) {
            (Some(lwa_client_id), Some(lwa_client_secret), Some(refresh_token), Some(seller_id)) => {
                Ok(ValidatedCredentials {
                    lwa_client_id,
                    lwa_client_secret,
                    refresh_token,
                    seller_id,
                })
            }
            _ => Err(RelayError::Configuration("Missing required credentials".to_string())),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("lwa_client_id", &self.lwa_client_id)
            .field("lwa_client_secret", &self.lwa_client_secret.as_ref().map(|_| "<redacted>"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("seller_id", &self.seller_id)
            .finish()
    }
}

impl fmt::Debug for ValidatedCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatedCredentials")
            .field("lwa_client_id", &self.lwa_client_id)
            .field("seller_id", &self.seller_id)
            .finish_non_exhaustive()
    }
}

/// LWA access token. Valid for exactly one invocation.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}
