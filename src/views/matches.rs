//! Match selector: pending matches of one championship
use super::present::{ScoreSummary, SideScore, file_count_label, schedule_label};
use super::{Callback, Fetched, ListKey, ListState};
use crate::access::{VerificationAccess, can_approve, is_anchored};
use crate::cancel::CancelToken;
use crate::error::FetchError;
use crate::gateway::LedgerGateway;
use crate::record::{Championship, MatchRecord};
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

pub const SELECT_CHAMPIONSHIP_PROMPT: &str = "Select a championship to see its pending matches";

/// Per-match facts, recomputed from the record each time rows are requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRow {
    pub id: String,
    pub local: String,
    pub visitor: String,
    pub local_score: SideScore,
    pub visitor_score: SideScore,
    pub summary: ScoreSummary,
    pub schedule: String,
    pub court: Option<String>,
    pub file_label: String,
    pub anchored: bool,
    pub anchor_message: String,
    pub can_verify: bool,
    /// Why "verify" is disabled, when it is.
    pub blocked_hint: Option<String>,
}

impl MatchRow {
    pub fn derive(record: &MatchRecord) -> Self {
        let anchor = is_anchored(record);
        let approvability = can_approve(record);
        Self {
            id: record.id.clone(),
            local: record.local.name.clone(),
            visitor: record.visitor.name.clone(),
            local_score: record.score_local.into(),
            visitor_score: record.score_visitor.into(),
            summary: ScoreSummary::of(record),
            schedule: schedule_label(record.date, record.time),
            court: record.court.clone(),
            file_label: file_count_label(record.usable_files().count()),
            anchored: anchor.anchored,
            anchor_message: anchor.message,
            can_verify: approvability.allowed(),
            blocked_hint: approvability.reason().map(|r| r.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchView {
    NoChampionship { prompt: &'static str },
    Loading,
    Failed {
        message: String,
        session_expired: bool,
    },
    Empty,
    List {
        championship: String,
        rows: Vec<MatchRow>,
    },
}

pub struct MatchSelector {
    championship: Option<Championship>,
    key: ListKey,
    cancel: CancelToken,
    state: ListState<MatchRecord>,
    on_select: Callback<MatchRecord>,
}

impl MatchSelector {
    /// A new instance per championship and generation; nothing is carried over
    /// from a previous selection.
    pub fn new(
        championship: Option<Championship>,
        generation: u64,
        on_select: Callback<MatchRecord>,
    ) -> Self {
        let scope = championship.as_ref().map(|c| c.id.clone()).unwrap_or_default();
        let state = if championship.is_some() {
            ListState::Loading
        } else {
            ListState::Empty
        };
        Self {
            championship,
            key: ListKey::new(scope, generation),
            cancel: CancelToken::new(),
            state,
            on_select,
        }
    }

    pub fn key(&self) -> &ListKey {
        &self.key
    }

    pub fn championship(&self) -> Option<&Championship> {
        self.championship.as_ref()
    }

    pub fn state(&self) -> &ListState<MatchRecord> {
        &self.state
    }

    /// Starts the fetch for this instance. `None` without a championship.
    pub fn load<G: LedgerGateway + 'static>(
        &mut self,
        access: &Arc<VerificationAccess<G>>,
    ) -> Option<impl Future<Output = Fetched<MatchRecord>> + Send + use<G>> {
        let championship_id = self.championship.as_ref()?.id.clone();
        self.cancel.cancel();
        self.cancel = CancelToken::new();
        self.key.next_attempt();
        self.state = ListState::Loading;

        let key = self.key.clone();
        let token = self.cancel.clone();
        let access = Arc::clone(access);
        Some(async move {
            let result = token
                .run(access.list_pending_matches(&championship_id))
                .await
                .unwrap_or(Err(FetchError::Cancelled));
            Fetched { key, result }
        })
    }

    /// Signals any in-flight fetch of this instance to stop.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn apply(&mut self, fetched: Fetched<MatchRecord>) -> bool {
        if fetched.key != self.key
            || self.cancel.is_cancelled()
            || matches!(fetched.result, Err(FetchError::Cancelled))
        {
            debug!(key = ?fetched.key, current = ?self.key, "discarding stale match fetch");
            return false;
        }
        self.state = ListState::from_result(fetched.result);
        true
    }

    pub fn rows(&self) -> Vec<MatchRow> {
        self.state.items().iter().map(MatchRow::derive).collect()
    }

    /// Hands the full record to the caller; performs no fetch.
    pub fn select(&mut self, match_id: &str) -> Option<MatchRecord> {
        let record = self
            .state
            .items()
            .iter()
            .find(|m| m.id == match_id)?
            .clone();
        (self.on_select)(&record);
        Some(record)
    }

    pub fn view(&self) -> MatchView {
        let Some(championship) = &self.championship else {
            return MatchView::NoChampionship {
                prompt: SELECT_CHAMPIONSHIP_PROMPT,
            };
        };
        match &self.state {
            ListState::Loading => MatchView::Loading,
            ListState::Failed {
                message,
                session_expired,
            } => MatchView::Failed {
                message: message.clone(),
                session_expired: *session_expired,
            },
            ListState::Empty => MatchView::Empty,
            ListState::Ready(_) => MatchView::List {
                championship: championship.name.clone(),
                rows: self.rows(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{ActaFile, FileTag, IntegrityAnchor, Official, Team};

    fn record(id: &str, local: Option<i32>, visitor: Option<i32>) -> MatchRecord {
        MatchRecord {
            id: id.into(),
            date: None,
            time: None,
            court: Some("Cancha 1".into()),
            local: Team {
                name: "Halcones".into(),
                logo: None,
            },
            visitor: Team {
                name: "Pumas".into(),
                logo: None,
            },
            score_local: local,
            score_visitor: visitor,
            referee: Official {
                id: "r".into(),
                name: None,
            },
            poll_worker: Official {
                id: "v".into(),
                name: None,
            },
            anchor: IntegrityAnchor::default(),
            files: vec![ActaFile {
                tag: FileTag::Front,
                path: "actas/front.jpg".into(),
                file_hash: None,
            }],
        }
    }

    fn championship(id: &str) -> Championship {
        Championship {
            id: id.into(),
            name: format!("Torneo {id}"),
            start_date: None,
            end_date: None,
            pending_count: None,
        }
    }

    fn selector(c: Option<Championship>) -> MatchSelector {
        MatchSelector::new(c, 1, Box::new(|_: &MatchRecord| {}))
    }

    #[test]
    fn without_championship_shows_prompt() {
        let sel = selector(None);
        assert_eq!(
            sel.view(),
            MatchView::NoChampionship {
                prompt: SELECT_CHAMPIONSHIP_PROMPT
            }
        );
    }

    #[test]
    fn rows_explain_disabled_verify() {
        let mut sel = selector(Some(championship("c1")));
        sel.apply(Fetched {
            key: sel.key.clone(),
            result: Ok(vec![record("m1", Some(1), None)]),
        });
        let rows = sel.rows();
        assert_eq!(rows.len(), 1);
        assert!(!rows[0].can_verify);
        assert!(!rows[0].anchored);
        assert_eq!(rows[0].file_label, "1 file");
        assert_eq!(
            rows[0].blocked_hint.as_deref(),
            Some("The acta is not anchored on the integrity ledger")
        );
        assert_eq!(rows[0].summary.to_string(), "Pumas did not present");
        assert_eq!(rows[0].visitor_score, SideScore::DidNotPresent);
    }

    #[test]
    fn result_for_another_championship_is_rejected() {
        let mut current = selector(Some(championship("b")));
        let stale = Fetched {
            key: ListKey::new("a", 1),
            result: Ok(vec![record("from-a", Some(0), Some(0))]),
        };
        assert!(!current.apply(stale));
        assert_eq!(current.view(), MatchView::Loading);
    }

    #[test]
    fn cancelled_instance_ignores_results() {
        let mut sel = selector(Some(championship("c1")));
        sel.cancel();
        let applied = sel.apply(Fetched {
            key: sel.key.clone(),
            result: Ok(vec![record("m1", Some(2), Some(2))]),
        });
        assert!(!applied);
    }
}
