//! Balance-lookup client: one throttled external query per call.

use crate::config::LookupConfig;
use crate::error::{BatchError, Result};
use crate::models::BenefitBalances;
use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

/// Reply from one lookup call: status plus the payload when the body parsed.
#[derive(Debug, Clone)]
pub struct LookupReply {
    pub status: u16,
    pub payload: Option<BenefitBalances>,
}

impl LookupReply {
    /// Usable means status 200 with a non-blank beneficiary name.
    pub fn is_usable(&self) -> bool {
        self.status == 200
            && self
                .payload
                .as_ref()
                .map(BenefitBalances::has_usable_name)
                .unwrap_or(false)
    }
}

/// Seam between the engine and the external lookup service. Implemented over
/// HTTP in production and by scripted mocks in tests.
#[async_trait]
pub trait BalanceLookup: Send + Sync {
    /// Perform one external query. `Err` means a transport-level failure;
    /// any HTTP status comes back as an `Ok` reply for the engine to
    /// classify.
    async fn lookup(&self, identity: &str, benefit: &str, token: &str) -> Result<LookupReply>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LookupRequest<'a> {
    identity: &'a str,
    benefit_number: &'a str,
    attempts: u32,
}

/// Production lookup client over reqwest.
///
/// The request timeout is client-enforced; the engine imposes none of its
/// own, so a timeout surfaces here as a transport error.
#[derive(Debug, Clone)]
pub struct HttpLookupClient {
    http: reqwest::Client,
    balances_url: String,
    attempts: u32,
}

impl HttpLookupClient {
    pub fn new(config: &LookupConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| BatchError::Lookup(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            balances_url: config.balances_url.clone(),
            attempts: config.attempts,
        })
    }
}

#[async_trait]
impl BalanceLookup for HttpLookupClient {
    async fn lookup(&self, identity: &str, benefit: &str, token: &str) -> Result<LookupReply> {
        let request = LookupRequest {
            identity,
            benefit_number: benefit,
            attempts: self.attempts,
        };

        let response = self
            .http
            .post(&self.balances_url)
            .bearer_auth(token)
            .json(&request)
            .send()
            .await
            .map_err(|e| BatchError::Lookup(format!("lookup request failed: {e}")))?;

        let status = response.status().as_u16();
        debug!(identity = %identity, status = status, "Lookup reply received");

        // Non-200 bodies are not balance payloads; parse only on success and
        // treat an unparseable success body as payload-absent.
        let payload = if status == 200 {
            response.json::<BenefitBalances>().await.ok()
        } else {
            None
        };

        Ok(LookupReply { status, payload })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usable_requires_200_and_name() {
        let with_name = |status: u16| LookupReply {
            status,
            payload: Some(BenefitBalances {
                name: Some("Maria".to_string()),
                ..Default::default()
            }),
        };

        assert!(with_name(200).is_usable());
        assert!(!with_name(404).is_usable());
        assert!(!with_name(500).is_usable());
    }

    #[test]
    fn test_blank_name_is_not_usable() {
        let reply = LookupReply {
            status: 200,
            payload: Some(BenefitBalances {
                name: Some("  ".to_string()),
                ..Default::default()
            }),
        };
        assert!(!reply.is_usable());

        let absent = LookupReply {
            status: 200,
            payload: None,
        };
        assert!(!absent.is_usable());
    }

    #[test]
    fn test_request_body_shape() {
        let request = LookupRequest {
            identity: "12345678901",
            benefit_number: "1234567890",
            attempts: 3,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["identity"], "12345678901");
        assert_eq!(json["benefitNumber"], "1234567890");
        assert_eq!(json["attempts"], 3);
    }
}
