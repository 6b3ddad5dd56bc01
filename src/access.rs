//! Verification data access layer
//!
//! Sole point of contact with the [`LedgerGateway`]. Gateway replies are turned into
//! records, [`FetchError`]s or [`ApprovalOutcome`]s here, so transport details never
//! reach the view layer.
use crate::error::FetchError;
use crate::gateway::{Credential, GatewayResponse, LedgerGateway};
use crate::outcome::{ApprovalOutcome, FailureKind};
use crate::record::{AnchorStatus, Approvability, Championship, FileTag, MatchRecord};
use crate::utils::{normalize_digest, resolve_file_url};
use crate::wire::{self, ApprovalRequest, ChampionshipDto, MatchDto};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

pub struct VerificationAccess<G> {
    gateway: G,
    credential: Option<Credential>,
    files_base_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStatus {
    Matches,
    Mismatch { expected: String, actual: String },
    NoRecordedHash,
    MissingPath,
    Unavailable { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCheck {
    pub tag: FileTag,
    pub url: Option<String>,
    pub status: FileStatus,
}

/// Anchoring status line for a match. Pure; no gateway access.
pub fn is_anchored(record: &MatchRecord) -> AnchorStatus {
    record.anchor_status()
}

/// Whether a match may be approved, and why not when it may not.
pub fn can_approve(record: &MatchRecord) -> Approvability {
    record.approvability()
}

impl<G: LedgerGateway> VerificationAccess<G> {
    pub fn new(gateway: G, credential: Option<Credential>, files_base_url: &str) -> Self {
        Self {
            gateway,
            credential,
            files_base_url: files_base_url.trim().to_string(),
        }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn has_session(&self) -> bool {
        self.credential.is_some()
    }

    #[instrument(skip(self))]
    pub async fn list_pending_championships(&self) -> Result<Vec<Championship>, FetchError> {
        let response = self
            .gateway
            .pending_championships()
            .await
            .map_err(|e| FetchError::Generic(e.0))?;
        let body = list_body(&response)?;
        let list: Vec<ChampionshipDto> = wire::decode_list(body, &["championships", "items"])?;
        debug!(count = list.len(), "pending championships fetched");
        Ok(list.into_iter().map(ChampionshipDto::into_record).collect())
    }

    #[instrument(skip(self))]
    pub async fn list_pending_matches(
        &self,
        championship_id: &str,
    ) -> Result<Vec<MatchRecord>, FetchError> {
        let championship_id = championship_id.trim();
        if championship_id.is_empty() {
            return Err(FetchError::InvalidArgument("championship id"));
        }
        let response = self
            .gateway
            .pending_matches(championship_id)
            .await
            .map_err(|e| FetchError::Generic(e.0))?;
        let body = list_body(&response)?;
        let list: Vec<MatchDto> = wire::decode_list(body, &["matches", "items"])?;
        debug!(count = list.len(), "pending matches fetched");
        Ok(list.into_iter().map(MatchDto::into_record).collect())
    }

    /// Submits the approval of a match's acta.
    ///
    /// Without a session credential this resolves to `session_error` without
    /// contacting the gateway.
    #[instrument(skip(self, comment))]
    pub async fn submit_approval(&self, match_id: &str, comment: Option<&str>) -> ApprovalOutcome {
        let Some(credential) = &self.credential else {
            warn!("no session credential, approval not sent");
            return ApprovalOutcome::rejected(FailureKind::SessionError, None);
        };
        let match_id = match_id.trim();
        if match_id.is_empty() {
            return ApprovalOutcome::rejected(
                FailureKind::Generic,
                Some("Missing match identifier".to_string()),
            );
        }

        let request = ApprovalRequest::new(comment);
        let outcome = match self
            .gateway
            .submit_review(match_id, &request, credential)
            .await
        {
            Ok(response) => ApprovalOutcome::from_response(response.status, &response.body),
            Err(e) => ApprovalOutcome::from_transport(&e),
        };

        match outcome.kind() {
            None => info!(match_id, "acta approved"),
            Some(kind) => warn!(match_id, %kind, message = outcome.message(), "acta approval refused"),
        }
        outcome
    }

    pub fn is_anchored(&self, record: &MatchRecord) -> AnchorStatus {
        is_anchored(record)
    }

    pub fn can_approve(&self, record: &MatchRecord) -> Approvability {
        can_approve(record)
    }

    pub fn resolve_file_url(&self, path: &str) -> String {
        resolve_file_url(&self.files_base_url, path)
    }

    /// Resolved locations of the files that have a stored path.
    pub fn file_urls(&self, record: &MatchRecord) -> Vec<(FileTag, String)> {
        record
            .usable_files()
            .map(|file| (file.tag.clone(), self.resolve_file_url(&file.path)))
            .collect()
    }

    /// Downloads each acta file and compares its digest with the recorded hash.
    /// Informational only; approvability does not depend on it.
    #[instrument(skip(self, record), fields(match_id = %record.id))]
    pub async fn check_files(&self, record: &MatchRecord) -> Vec<FileCheck> {
        let mut checks = Vec::with_capacity(record.files.len());
        for file in &record.files {
            if !file.has_path() {
                checks.push(FileCheck {
                    tag: file.tag.clone(),
                    url: None,
                    status: FileStatus::MissingPath,
                });
                continue;
            }
            let url = self.resolve_file_url(&file.path);
            let status = match self.gateway.fetch_file(&url).await {
                Err(e) => FileStatus::Unavailable { reason: e.0 },
                Ok(bytes) => compare_digest(file.file_hash.as_deref(), &bytes),
            };
            if let FileStatus::Mismatch { .. } = status {
                warn!(url = %url, "acta file digest does not match the recorded hash");
            }
            checks.push(FileCheck {
                tag: file.tag.clone(),
                url: Some(url),
                status,
            });
        }
        checks
    }
}

fn compare_digest(expected: Option<&str>, bytes: &[u8]) -> FileStatus {
    let Some(expected) = expected else {
        return FileStatus::NoRecordedHash;
    };
    let actual = sha256::digest(bytes);
    match (normalize_digest(expected), normalize_digest(&actual)) {
        (Some(a), Some(b)) if a == b => FileStatus::Matches,
        _ => FileStatus::Mismatch {
            expected: expected.to_string(),
            actual,
        },
    }
}

fn list_body(response: &GatewayResponse) -> Result<&[u8], FetchError> {
    if matches!(response.status, 401 | 403) {
        return Err(FetchError::Session {
            status: response.status,
        });
    }
    if !response.is_success() {
        let message = serde_json::from_slice::<Value>(&response.body)
            .ok()
            .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| format!("Gateway responded with HTTP {}", response.status));
        return Err(FetchError::Generic(message));
    }
    Ok(&response.body)
}
