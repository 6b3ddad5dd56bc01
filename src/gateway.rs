//! Seam to the ledger/record gateway
use crate::error::TransportError;
use crate::wire::ApprovalRequest;
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use std::fmt;

/// Raw reply from the gateway. Interpretation belongs to [`crate::access`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl GatewayResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Bearer credential for approval submissions.
#[derive(Clone)]
pub struct Credential(SecretString);

impl Credential {
    /// Blank tokens are treated as no session at all.
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token: String = token.into();
        let token = token.trim();
        if token.is_empty() {
            return None;
        }
        Some(Self(SecretString::from(token.to_string())))
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0.expose_secret())
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(..)")
    }
}

#[async_trait]
pub trait LedgerGateway: Send + Sync {
    async fn pending_championships(&self) -> Result<GatewayResponse, TransportError>;

    async fn pending_matches(&self, championship_id: &str)
    -> Result<GatewayResponse, TransportError>;

    async fn submit_review(
        &self,
        match_id: &str,
        request: &ApprovalRequest,
        credential: &Credential,
    ) -> Result<GatewayResponse, TransportError>;

    /// Downloads an acta file from an absolute URL.
    async fn fetch_file(&self, url: &str) -> Result<Vec<u8>, TransportError>;
}
