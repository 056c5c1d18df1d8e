//! Sign-in client issuing bearer tokens for the lookup service.

use crate::config::AuthConfig;
use crate::error::{BatchError, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

/// Sign-in request body expected by the external service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub access_id: String,
    pub password: String,
    pub auth_key: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub stay_connected: bool,
}

impl Credentials {
    /// Build the fixed-shape credential body from configured access data.
    pub fn from_config(config: &AuthConfig) -> Self {
        Self {
            access_id: config.access_id.clone(),
            password: config.password.clone(),
            auth_key: String::new(),
            kind: String::new(),
            stay_connected: false,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SignInReply {
    token: String,
}

/// Stateless wrapper around the sign-in endpoint.
#[derive(Debug, Clone)]
pub struct AuthClient {
    http: reqwest::Client,
    sign_in_url: String,
}

impl AuthClient {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            sign_in_url: config.sign_in_url.clone(),
        }
    }

    /// Exchange credentials for a bearer token.
    pub async fn sign_in(&self, credentials: &Credentials) -> Result<String> {
        debug!(url = %self.sign_in_url, access_id = %credentials.access_id, "Signing in");

        let response = self
            .http
            .post(&self.sign_in_url)
            .json(credentials)
            .send()
            .await
            .map_err(|e| BatchError::Auth(format!("sign-in request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            error!(status = %status, "Sign-in rejected");
            return Err(BatchError::Auth(format!(
                "sign-in returned status {status}"
            )));
        }

        let reply: SignInReply = response
            .json()
            .await
            .map_err(|e| BatchError::Auth(format!("malformed sign-in reply: {e}")))?;

        if reply.token.is_empty() {
            return Err(BatchError::Auth("sign-in returned an empty token".into()));
        }

        Ok(reply.token)
    }
}
