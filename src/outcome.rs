//! Approval outcomes and the closed failure taxonomy
//!
//! The gateway tags failures with an untyped `errorType` string. It is parsed into
//! [`FailureKind`] here and nowhere else; the body discriminator always wins over
//! the HTTP status, which is only consulted when no discriminator is present.
use crate::error::TransportError;
use crate::wire::ReviewReply;
use serde_json::Value;
use std::fmt;
use tracing::warn;

pub const APPROVED_MESSAGE: &str = "The acta was approved";
pub const FALLBACK_MESSAGE: &str = "Unexpected error while submitting the review";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, minicbor::Encode, minicbor::Decode)]
pub enum FailureKind {
    #[n(0)]
    DataIntegrity,
    #[n(1)]
    AlreadyReviewed,
    #[n(2)]
    NotFound,
    #[n(3)]
    SessionError,
    #[n(4)]
    ServerError,
    #[n(5)]
    Generic,
}

impl FailureKind {
    pub const ALL: [FailureKind; 6] = [
        FailureKind::DataIntegrity,
        FailureKind::AlreadyReviewed,
        FailureKind::NotFound,
        FailureKind::SessionError,
        FailureKind::ServerError,
        FailureKind::Generic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::DataIntegrity => "data_integrity",
            FailureKind::AlreadyReviewed => "already_reviewed",
            FailureKind::NotFound => "not_found",
            FailureKind::SessionError => "session_error",
            FailureKind::ServerError => "server_error",
            FailureKind::Generic => "generic",
        }
    }

    /// Returns `None` for discriminators outside the taxonomy.
    pub fn parse(discriminator: &str) -> Option<Self> {
        let wanted = discriminator.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(wanted))
    }

    pub fn default_message(&self) -> &'static str {
        match self {
            FailureKind::DataIntegrity => {
                "The match data does not agree with the record anchored on the integrity ledger"
            }
            FailureKind::AlreadyReviewed => "This acta has already been reviewed",
            FailureKind::NotFound => "The match or its acta could not be found",
            FailureKind::SessionError => "Your session has expired. Please sign in again",
            FailureKind::ServerError => "The server could not process the review",
            FailureKind::Generic => "The acta could not be approved",
        }
    }

    fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => FailureKind::SessionError,
            404 => FailureKind::NotFound,
            _ => FailureKind::ServerError,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one approval attempt. Transient: it only drives the outcome dialog.
#[derive(Debug, Clone, PartialEq)]
pub enum ApprovalOutcome {
    Approved {
        message: String,
    },
    Rejected {
        kind: FailureKind,
        message: String,
        details: Option<Value>,
    },
}

/// What is known about an approval attempt once it resolves.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewAttempt {
    pub match_id: String,
    pub championship_id: Option<String>,
    pub comment: Option<String>,
    pub outcome: ApprovalOutcome,
}

impl ApprovalOutcome {
    pub fn rejected(kind: FailureKind, message: Option<String>) -> Self {
        ApprovalOutcome::Rejected {
            kind,
            message: non_blank(message).unwrap_or_else(|| kind.default_message().to_string()),
            details: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, ApprovalOutcome::Approved { .. })
    }

    pub fn kind(&self) -> Option<FailureKind> {
        match self {
            ApprovalOutcome::Approved { .. } => None,
            ApprovalOutcome::Rejected { kind, .. } => Some(*kind),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApprovalOutcome::Approved { message } | ApprovalOutcome::Rejected { message, .. } => {
                message
            }
        }
    }

    /// Maps a gateway reply onto the taxonomy.
    ///
    /// Only an empty 2xx body, or a 2xx reply object carrying neither
    /// `success:false` nor a discriminator, counts as approved. A body that is not
    /// a reply object is a `server_error` whatever the status.
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        let success_status = (200..300).contains(&status);
        if body.iter().all(u8::is_ascii_whitespace) {
            if success_status {
                return ApprovalOutcome::Approved {
                    message: APPROVED_MESSAGE.to_string(),
                };
            }
            return Self::status_fallback(status, None, None);
        }

        let reply = match parse_reply(body) {
            Ok(reply) => reply,
            Err(reason) => {
                warn!(status, %reason, "unreadable review reply");
                return ApprovalOutcome::Rejected {
                    kind: FailureKind::ServerError,
                    message: status_message(status),
                    details: None,
                };
            }
        };

        if let Some(tag) = reply.error_type.as_deref() {
            let kind = FailureKind::parse(tag).unwrap_or_else(|| {
                warn!(discriminator = tag, "unrecognized review failure discriminator");
                FailureKind::Generic
            });
            return ApprovalOutcome::Rejected {
                kind,
                message: non_blank(reply.message)
                    .unwrap_or_else(|| kind.default_message().to_string()),
                details: reply.details,
            };
        }

        if success_status && reply.success != Some(false) {
            return ApprovalOutcome::Approved {
                message: non_blank(reply.message).unwrap_or_else(|| APPROVED_MESSAGE.to_string()),
            };
        }

        Self::status_fallback(status, reply.message, reply.details)
    }

    // No discriminator: the status decides. Only server errors describe the
    // status itself; the other kinds keep their own wording.
    fn status_fallback(status: u16, message: Option<String>, details: Option<Value>) -> Self {
        let kind = FailureKind::from_status(status);
        let message = non_blank(message).unwrap_or_else(|| match kind {
            FailureKind::ServerError => status_message(status),
            _ => kind.default_message().to_string(),
        });
        ApprovalOutcome::Rejected {
            kind,
            message,
            details,
        }
    }

    pub fn from_transport(err: &TransportError) -> Self {
        let message = non_blank(Some(err.0.clone())).unwrap_or_else(|| FALLBACK_MESSAGE.to_string());
        ApprovalOutcome::Rejected {
            kind: FailureKind::ServerError,
            message,
            details: None,
        }
    }
}

// What the transport itself can say about a status, else the fixed fallback.
fn status_message(status: u16) -> String {
    match reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
    {
        Some(reason) if !(200..300).contains(&status) => {
            format!("Gateway responded with HTTP {status} {reason}")
        }
        _ => FALLBACK_MESSAGE.to_string(),
    }
}

fn parse_reply(body: &[u8]) -> Result<ReviewReply, String> {
    match serde_json::from_slice::<Value>(body).map_err(|e| e.to_string())? {
        value @ Value::Object(_) => serde_json::from_value(value).map_err(|e| e.to_string()),
        other => Err(format!("expected a reply object, got {other}")),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reply(status: u16, body: Value) -> ApprovalOutcome {
        ApprovalOutcome::from_response(status, &serde_json::to_vec(&body).unwrap())
    }

    #[test]
    fn discriminator_maps_one_to_one() {
        for kind in FailureKind::ALL {
            let outcome = reply(
                400,
                json!({"success": false, "errorType": kind.as_str(), "message": "m"}),
            );
            assert_eq!(outcome.kind(), Some(kind));
            assert_eq!(outcome.message(), "m");
        }
    }

    #[test]
    fn discriminator_beats_status() {
        let outcome = reply(
            401,
            json!({"success": false, "errorType": "already_reviewed"}),
        );
        assert_eq!(outcome.kind(), Some(FailureKind::AlreadyReviewed));
        assert_eq!(
            outcome.message(),
            FailureKind::AlreadyReviewed.default_message()
        );
    }

    #[test]
    fn unknown_discriminator_is_generic() {
        let outcome = reply(409, json!({"success": false, "errorType": "quota"}));
        assert_eq!(outcome.kind(), Some(FailureKind::Generic));
    }

    #[test]
    fn missing_discriminator_falls_back_to_status() {
        assert_eq!(
            reply(401, json!({"success": false})).kind(),
            Some(FailureKind::SessionError)
        );
        assert_eq!(
            reply(404, json!({})).kind(),
            Some(FailureKind::NotFound)
        );
        assert_eq!(
            reply(200, json!({"success": false, "message": "nope"})),
            ApprovalOutcome::Rejected {
                kind: FailureKind::ServerError,
                message: "nope".into(),
                details: None
            }
        );
    }

    #[test]
    fn unreadable_body_uses_transport_message() {
        let outcome = ApprovalOutcome::from_response(502, b"<html>bad gateway</html>");
        assert_eq!(outcome.kind(), Some(FailureKind::ServerError));
        assert_eq!(outcome.message(), "Gateway responded with HTTP 502 Bad Gateway");
    }

    #[test]
    fn discriminator_on_success_status_is_a_refusal() {
        let outcome = ApprovalOutcome::from_response(
            200,
            br#"{"errorType":"already_reviewed","message":"ya revisada"}"#,
        );
        assert_eq!(outcome.kind(), Some(FailureKind::AlreadyReviewed));
        assert_eq!(outcome.message(), "ya revisada");
    }

    #[test]
    fn malformed_success_reply_is_a_server_error() {
        let html = ApprovalOutcome::from_response(200, b"<html><body>Login</body></html>");
        assert_eq!(html.kind(), Some(FailureKind::ServerError));
        assert_eq!(html.message(), FALLBACK_MESSAGE);

        let list = ApprovalOutcome::from_response(200, b"[]");
        assert_eq!(list.kind(), Some(FailureKind::ServerError));
        assert!(!list.is_ok());
    }

    #[test]
    fn status_only_failures_keep_their_own_wording() {
        let session = reply(401, json!({"success": false}));
        assert_eq!(session.kind(), Some(FailureKind::SessionError));
        assert_eq!(
            session.message(),
            FailureKind::SessionError.default_message()
        );
        let missing = ApprovalOutcome::from_response(404, b"");
        assert_eq!(missing.message(), FailureKind::NotFound.default_message());
        let server = ApprovalOutcome::from_response(503, b"");
        assert_eq!(
            server.message(),
            "Gateway responded with HTTP 503 Service Unavailable"
        );
    }

    #[test]
    fn success_with_empty_body() {
        let outcome = ApprovalOutcome::from_response(204, b"");
        assert!(outcome.is_ok());
        assert_eq!(outcome.message(), APPROVED_MESSAGE);
    }

    #[test]
    fn details_are_preserved() {
        let outcome = reply(
            409,
            json!({"success": false, "errorType": "data_integrity", "message": "hash mismatch",
                   "details": {"expected": "aa", "actual": "bb"}}),
        );
        match outcome {
            ApprovalOutcome::Rejected { kind, details, .. } => {
                assert_eq!(kind, FailureKind::DataIntegrity);
                assert_eq!(details, Some(json!({"expected": "aa", "actual": "bb"})));
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn blank_transport_message_uses_fallback() {
        let outcome = ApprovalOutcome::from_transport(&TransportError(" ".into()));
        assert_eq!(outcome.kind(), Some(FailureKind::ServerError));
        assert_eq!(outcome.message(), FALLBACK_MESSAGE);
    }
}
