//! `reqwest` implementation of [`LedgerGateway`]
use crate::error::TransportError;
use crate::gateway::{Credential, GatewayResponse, LedgerGateway};
use crate::wire::ApprovalRequest;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderValue};
use std::time::Duration;
use tracing::{debug, instrument};

const PENDING_CHAMPIONSHIPS: &str = "actas/championships/pending";

pub struct HttpGateway {
    base_url: String,
    client: reqwest::Client,
}

impl HttpGateway {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn read(response: reqwest::Response) -> Result<GatewayResponse, TransportError> {
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError(format!("read body failed: {e}")))?;
        Ok(GatewayResponse::new(status, body.to_vec()))
    }

    async fn get(&self, url: &str) -> Result<GatewayResponse, TransportError> {
        let response = self
            .client
            .get(url)
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .send()
            .await
            .map_err(|e| TransportError(format!("request to {url} failed: {e}")))?;
        Self::read(response).await
    }
}

#[async_trait]
impl LedgerGateway for HttpGateway {
    #[instrument(name = "gateway_pending_championships", skip(self))]
    async fn pending_championships(&self) -> Result<GatewayResponse, TransportError> {
        self.get(&self.url(PENDING_CHAMPIONSHIPS)).await
    }

    #[instrument(name = "gateway_pending_matches", skip(self))]
    async fn pending_matches(
        &self,
        championship_id: &str,
    ) -> Result<GatewayResponse, TransportError> {
        let url = self.url(&format!(
            "actas/championships/{championship_id}/pending-matches"
        ));
        self.get(&url).await
    }

    #[instrument(name = "gateway_submit_review", skip(self, request, credential))]
    async fn submit_review(
        &self,
        match_id: &str,
        request: &ApprovalRequest,
        credential: &Credential,
    ) -> Result<GatewayResponse, TransportError> {
        let url = self.url(&format!("actas/matches/{match_id}/review"));
        let authorization = HeaderValue::from_str(&credential.bearer())
            .map_err(|e| TransportError(format!("invalid auth header: {e}")))?;
        debug!(has_comment = request.comment.is_some(), "submitting review");
        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, authorization)
            .json(request)
            .send()
            .await
            .map_err(|e| TransportError(format!("request to {url} failed: {e}")))?;
        Self::read(response).await
    }

    #[instrument(name = "gateway_fetch_file", skip(self))]
    async fn fetch_file(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TransportError(format!("download failed url={url}: {e}")))?;
        if !response.status().is_success() {
            return Err(TransportError(format!(
                "download failed status={} url={url}",
                response.status()
            )));
        }
        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| TransportError(format!("read body failed: {e}")))
    }
}
