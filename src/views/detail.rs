//! Match detail and approval controller
//!
//! State machine: `Idle -> Submitting -> Resolved(outcome) -> Idle`. A failed
//! local precondition parks the controller in `Blocked` without touching the
//! gateway. While `Submitting` no second submission can start, and acknowledging a
//! resolved outcome always sends the operator back to the match list so a resolved
//! acta cannot be submitted again from the same screen.
use super::Callback;
use super::present::{ScoreSummary, SideScore, schedule_label};
use crate::access::{VerificationAccess, can_approve, is_anchored};
use crate::error::ReviewRefused;
use crate::gateway::LedgerGateway;
use crate::outcome::{ApprovalOutcome, FailureKind, ReviewAttempt};
use crate::record::{AnchorStatus, Approvability, BlockReason, FileTag, MatchRecord};
use serde_json::Value;
use tracing::{debug, info};

pub const REAUTHENTICATE_HINT: &str = "Sign in again to continue reviewing actas.";

const INTEGRITY_GUIDANCE: [&str; 3] = [
    "The record may have been modified after it was anchored on the integrity ledger.",
    "Do not approve this acta. Report the match to the league's integrity officer.",
    "The match stays pending until the discrepancy has been investigated.",
];

#[derive(Debug, Clone, PartialEq)]
pub enum ReviewState {
    Idle,
    Blocked(BlockReason),
    Submitting,
    Resolved(ApprovalOutcome),
}

/// Proof that a submission was started; consumed by [`MatchDetail::complete`].
#[derive(Debug)]
pub struct SubmitTicket {
    match_id: String,
    comment: Option<String>,
}

impl SubmitTicket {
    pub fn match_id(&self) -> &str {
        &self.match_id
    }
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OutcomeDialog {
    Approved {
        title: &'static str,
        message: String,
    },
    /// Security-relevant anomaly; shown with escalation guidance.
    IntegrityAlert {
        title: &'static str,
        message: String,
        details: Option<Value>,
        guidance: Vec<&'static str>,
    },
    Simple {
        title: &'static str,
        kind: FailureKind,
        message: String,
        hint: Option<&'static str>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Controls {
    pub approve_enabled: bool,
    pub comment_enabled: bool,
    pub approve_hint: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailView {
    pub local: String,
    pub local_logo: Option<String>,
    pub visitor: String,
    pub visitor_logo: Option<String>,
    pub local_score: SideScore,
    pub visitor_score: SideScore,
    pub summary: ScoreSummary,
    pub schedule: String,
    pub court: Option<String>,
    pub referee: String,
    pub poll_worker: String,
    pub anchor: AnchorStatus,
    pub anchored_at: Option<String>,
    pub files: Vec<(FileTag, String)>,
}

pub struct MatchDetail {
    record: MatchRecord,
    championship_id: Option<String>,
    comment: String,
    state: ReviewState,
    on_back: Box<dyn FnMut() + Send>,
    on_approve: Callback<ReviewAttempt>,
}

impl MatchDetail {
    pub fn new(
        record: MatchRecord,
        championship_id: Option<String>,
        on_back: Box<dyn FnMut() + Send>,
        on_approve: Callback<ReviewAttempt>,
    ) -> Self {
        Self {
            record,
            championship_id,
            comment: String::new(),
            state: ReviewState::Idle,
            on_back,
            on_approve,
        }
    }

    pub fn record(&self) -> &MatchRecord {
        &self.record
    }

    pub fn state(&self) -> &ReviewState {
        &self.state
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    /// Edits the free-text comment; refused while a submission is pending.
    pub fn set_comment(&mut self, text: &str) -> bool {
        if self.state == ReviewState::Submitting {
            return false;
        }
        self.comment = text.to_string();
        true
    }

    pub fn approvability(&self) -> Approvability {
        can_approve(&self.record)
    }

    /// Checks the preconditions against the current record and moves to
    /// `Submitting`.
    pub fn begin_submit(&mut self) -> Result<SubmitTicket, ReviewRefused> {
        match &self.state {
            ReviewState::Submitting => return Err(ReviewRefused::InFlight),
            ReviewState::Resolved(_) => return Err(ReviewRefused::AlreadyResolved),
            ReviewState::Idle | ReviewState::Blocked(_) => {}
        }
        if let Approvability::Blocked(reason) = self.approvability() {
            debug!(match_id = %self.record.id, %reason, "approval blocked locally");
            self.state = ReviewState::Blocked(reason);
            return Err(ReviewRefused::Blocked(reason));
        }

        let comment = Some(self.comment.trim())
            .filter(|c| !c.is_empty())
            .map(str::to_string);
        self.state = ReviewState::Submitting;
        Ok(SubmitTicket {
            match_id: self.record.id.clone(),
            comment,
        })
    }

    /// Records the outcome of a submission started with [`MatchDetail::begin_submit`].
    pub fn complete(&mut self, ticket: SubmitTicket, outcome: ApprovalOutcome) -> ApprovalOutcome {
        if outcome.is_ok() {
            info!(match_id = %ticket.match_id, "acta review resolved as approved");
            self.comment.clear();
        }
        let attempt = ReviewAttempt {
            match_id: ticket.match_id,
            championship_id: self.championship_id.clone(),
            comment: ticket.comment,
            outcome,
        };
        (self.on_approve)(&attempt);
        self.state = ReviewState::Resolved(attempt.outcome.clone());
        attempt.outcome
    }

    /// Runs the whole approval: precondition check, submission, resolution.
    pub async fn approve<G: LedgerGateway>(
        &mut self,
        access: &VerificationAccess<G>,
    ) -> Result<ApprovalOutcome, ReviewRefused> {
        let ticket = self.begin_submit()?;
        let outcome = access
            .submit_approval(ticket.match_id(), ticket.comment())
            .await;
        Ok(self.complete(ticket, outcome))
    }

    /// Dismisses a resolved outcome and returns to the match list. Returns false
    /// (and does nothing) when there is nothing to acknowledge.
    pub fn acknowledge(&mut self) -> bool {
        if !matches!(self.state, ReviewState::Resolved(_)) {
            return false;
        }
        self.state = ReviewState::Idle;
        (self.on_back)();
        true
    }

    /// Leaves the screen without approving. Not possible mid-submission.
    pub fn back(&mut self) -> bool {
        if self.state == ReviewState::Submitting {
            return false;
        }
        (self.on_back)();
        true
    }

    pub fn dialog(&self) -> Option<OutcomeDialog> {
        let ReviewState::Resolved(outcome) = &self.state else {
            return None;
        };
        Some(match outcome {
            ApprovalOutcome::Approved { message } => OutcomeDialog::Approved {
                title: "Acta approved",
                message: message.clone(),
            },
            ApprovalOutcome::Rejected {
                kind: FailureKind::DataIntegrity,
                message,
                details,
            } => OutcomeDialog::IntegrityAlert {
                title: "Integrity check failed",
                message: message.clone(),
                details: details.clone(),
                guidance: INTEGRITY_GUIDANCE.to_vec(),
            },
            ApprovalOutcome::Rejected { kind, message, .. } => OutcomeDialog::Simple {
                title: simple_title(*kind),
                kind: *kind,
                message: message.clone(),
                hint: (*kind == FailureKind::SessionError).then_some(REAUTHENTICATE_HINT),
            },
        })
    }

    /// Inline message for a local precondition failure.
    pub fn inline_notice(&self) -> Option<String> {
        match &self.state {
            ReviewState::Blocked(reason) => Some(format!("Cannot approve: {reason}")),
            _ => None,
        }
    }

    pub fn controls(&self) -> Controls {
        let approvability = self.approvability();
        let idle = matches!(self.state, ReviewState::Idle | ReviewState::Blocked(_));
        Controls {
            approve_enabled: idle && approvability.allowed(),
            comment_enabled: self.state != ReviewState::Submitting,
            approve_hint: approvability.reason().map(|r| r.to_string()),
        }
    }

    pub fn view<G: LedgerGateway>(&self, access: &VerificationAccess<G>) -> DetailView {
        let record = &self.record;
        DetailView {
            local: record.local.name.clone(),
            local_logo: record.local.logo.as_deref().map(|l| access.resolve_file_url(l)),
            visitor: record.visitor.name.clone(),
            visitor_logo: record
                .visitor
                .logo
                .as_deref()
                .map(|l| access.resolve_file_url(l)),
            local_score: record.score_local.into(),
            visitor_score: record.score_visitor.into(),
            summary: ScoreSummary::of(record),
            schedule: schedule_label(record.date, record.time),
            court: record.court.clone(),
            referee: record.referee.display_name().to_string(),
            poll_worker: record.poll_worker.display_name().to_string(),
            anchor: is_anchored(record),
            anchored_at: record
                .anchor
                .anchored_at
                .map(|at| at.format("%d/%m/%Y %H:%M UTC").to_string()),
            files: access.file_urls(record),
        }
    }
}

fn simple_title(kind: FailureKind) -> &'static str {
    match kind {
        FailureKind::AlreadyReviewed => "Acta already reviewed",
        FailureKind::NotFound => "Match not found",
        FailureKind::SessionError => "Session expired",
        FailureKind::ServerError => "Server error",
        FailureKind::DataIntegrity | FailureKind::Generic => "Approval failed",
    }
}
