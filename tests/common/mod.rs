//! In-memory gateway shared by the integration tests
#![allow(dead_code)]

use acta_review::access::VerificationAccess;
use acta_review::error::TransportError;
use acta_review::gateway::{Credential, GatewayResponse, LedgerGateway};
use acta_review::wire::ApprovalRequest;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

pub const TOKEN: &str = "reviewer-token";

/// Behaves like a well-mannered gateway: approved matches drop out of the
/// pending lists and a second approval is refused as `already_reviewed`.
#[derive(Default)]
pub struct FakeGateway {
    championships: Mutex<Vec<Value>>,
    championships_status: Mutex<Option<u16>>,
    matches: Mutex<HashMap<String, Vec<Value>>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    approved: Mutex<HashSet<String>>,
    integrity_failures: Mutex<HashSet<String>>,
    review_replies: Mutex<HashMap<String, GatewayResponse>>,
    files: Mutex<HashMap<String, Vec<u8>>>,
    pub requests: Mutex<Vec<String>>,
    pub review_bodies: Mutex<Vec<Value>>,
    pub bearer_tokens: Mutex<Vec<String>>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_championship(self, id: &str, name: &str) -> Self {
        self.championships
            .lock()
            .unwrap()
            .push(json!({"id": id, "name": name, "startDate": "2024-03-01", "endDate": "2024-11-30"}));
        self
    }

    pub fn with_match(self, championship_id: &str, record: Value) -> Self {
        self.matches
            .lock()
            .unwrap()
            .entry(championship_id.to_string())
            .or_default()
            .push(record);
        self
    }

    pub fn failing_championships(self, status: u16) -> Self {
        *self.championships_status.lock().unwrap() = Some(status);
        self
    }

    /// Holds the pending-matches fetch of `championship_id` until the returned
    /// handle is notified.
    pub fn gate(&self, championship_id: &str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.gates
            .lock()
            .unwrap()
            .insert(championship_id.to_string(), notify.clone());
        notify
    }

    pub fn integrity_failure(self, match_id: &str) -> Self {
        self.integrity_failures
            .lock()
            .unwrap()
            .insert(match_id.to_string());
        self
    }

    /// Replaces the default behaviour for one match with a canned reply.
    pub fn review_reply(self, match_id: &str, status: u16, body: &str) -> Self {
        self.review_replies
            .lock()
            .unwrap()
            .insert(match_id.to_string(), GatewayResponse::new(status, body));
        self
    }

    pub fn with_file(self, url: &str, bytes: &[u8]) -> Self {
        self.files
            .lock()
            .unwrap()
            .insert(url.to_string(), bytes.to_vec());
        self
    }

    pub fn review_requests(&self) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.starts_with("POST"))
            .count()
    }

    pub fn match_list_requests(&self, championship_id: &str) -> usize {
        let wanted = format!("GET matches {championship_id}");
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| **r == wanted)
            .count()
    }

    fn log(&self, request: String) {
        self.requests.lock().unwrap().push(request);
    }
}

#[async_trait]
impl LedgerGateway for FakeGateway {
    async fn pending_championships(&self) -> Result<GatewayResponse, TransportError> {
        self.log("GET championships".into());
        if let Some(status) = *self.championships_status.lock().unwrap() {
            return Ok(GatewayResponse::new(status, r#"{"message":"unavailable"}"#));
        }
        let championships = self.championships.lock().unwrap().clone();
        let body = json!({"success": true, "data": championships});
        Ok(GatewayResponse::new(200, body.to_string()))
    }

    async fn pending_matches(
        &self,
        championship_id: &str,
    ) -> Result<GatewayResponse, TransportError> {
        self.log(format!("GET matches {championship_id}"));
        let gate = self.gates.lock().unwrap().get(championship_id).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let approved = self.approved.lock().unwrap().clone();
        let pending: Vec<Value> = self
            .matches
            .lock()
            .unwrap()
            .get(championship_id)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(|m| !approved.contains(&id_of(m)))
            .collect();
        Ok(GatewayResponse::new(200, json!({"data": pending}).to_string()))
    }

    async fn submit_review(
        &self,
        match_id: &str,
        request: &ApprovalRequest,
        credential: &Credential,
    ) -> Result<GatewayResponse, TransportError> {
        self.log(format!("POST review {match_id}"));
        self.review_bodies
            .lock()
            .unwrap()
            .push(serde_json::to_value(request).map_err(|e| TransportError(e.to_string()))?);
        self.bearer_tokens.lock().unwrap().push(credential.bearer());

        if let Some(reply) = self.review_replies.lock().unwrap().get(match_id) {
            return Ok(reply.clone());
        }
        if self.integrity_failures.lock().unwrap().contains(match_id) {
            let body = json!({
                "success": false,
                "errorType": "data_integrity",
                "message": "Stored acta differs from the anchored record",
                "details": {"anchored": "9f2c", "computed": "77aa"}
            });
            return Ok(GatewayResponse::new(409, body.to_string()));
        }
        if !self.approved.lock().unwrap().insert(match_id.to_string()) {
            let body = json!({"success": false, "errorType": "already_reviewed"});
            return Ok(GatewayResponse::new(409, body.to_string()));
        }
        let body = json!({"success": true, "message": "Acta approved"});
        Ok(GatewayResponse::new(200, body.to_string()))
    }

    async fn fetch_file(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        self.log(format!("GET file {url}"));
        self.files
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| TransportError(format!("download failed status=404 url={url}")))
    }
}

fn id_of(record: &Value) -> String {
    match &record["id"] {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// A match ready for approval: anchored, with front and back scans.
pub fn anchored_match(id: &str) -> Value {
    json!({
        "id": id,
        "date": "2024-05-18T00:00:00Z",
        "time": "19:30",
        "court": "Cancha 1",
        "teamLocal": "Halcones",
        "teamVisitor": "Pumas",
        "scoreLocal": 3,
        "scoreVisitor": 1,
        "refereeId": 7,
        "refereeName": "Laura Gómez",
        "pollWorkerId": 9,
        "anchorHash": "9f2c4e1ab37d5c08e6f1d2a4b5c6d7e8f90a1b2c3d4e5f60718293a4b5c6d7e8",
        "anchorTimestamp": "2024-05-18T22:04:11Z",
        "files": [
            {"tag": "front", "path": format!("actas/{id}/front.jpg"), "fileHash": null},
            {"tag": "back", "path": format!("actas/{id}/back.jpg")}
        ]
    })
}

pub fn unanchored_match(id: &str) -> Value {
    let mut record = anchored_match(id);
    record["anchorHash"] = Value::Null;
    record["anchorTimestamp"] = Value::Null;
    record
}

pub fn access(gateway: FakeGateway) -> Arc<VerificationAccess<FakeGateway>> {
    Arc::new(VerificationAccess::new(
        gateway,
        Credential::new(TOKEN),
        "https://files.league.example",
    ))
}

pub fn anonymous_access(gateway: FakeGateway) -> Arc<VerificationAccess<FakeGateway>> {
    Arc::new(VerificationAccess::new(
        gateway,
        None,
        "https://files.league.example",
    ))
}
