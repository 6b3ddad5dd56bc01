//! Championship selector: championships with at least one match awaiting review
use super::present::period_label;
use super::{Callback, Fetched, ListKey, ListState};
use crate::access::VerificationAccess;
use crate::cancel::CancelToken;
use crate::error::FetchError;
use crate::gateway::LedgerGateway;
use crate::record::Championship;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

const SCOPE: &str = "pending-championships";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChampionshipRow {
    pub id: String,
    pub name: String,
    pub period: Option<String>,
    pub pending_label: Option<String>,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChampionshipView {
    Loading,
    Failed {
        message: String,
        session_expired: bool,
    },
    Empty,
    List(Vec<ChampionshipRow>),
}

pub struct ChampionshipSelector {
    key: ListKey,
    cancel: CancelToken,
    state: ListState<Championship>,
    selected: Option<String>,
    on_select: Callback<Championship>,
}

impl ChampionshipSelector {
    pub fn new(on_select: Callback<Championship>) -> Self {
        Self {
            key: ListKey::new(SCOPE, 0),
            cancel: CancelToken::new(),
            state: ListState::Loading,
            selected: None,
            on_select,
        }
    }

    pub fn key(&self) -> &ListKey {
        &self.key
    }

    pub fn state(&self) -> &ListState<Championship> {
        &self.state
    }

    /// Starts a fresh fetch, superseding any fetch still in flight.
    pub fn load<G: LedgerGateway + 'static>(
        &mut self,
        access: &Arc<VerificationAccess<G>>,
    ) -> impl Future<Output = Fetched<Championship>> + Send + use<G> {
        self.cancel.cancel();
        self.cancel = CancelToken::new();
        self.key.next_attempt();
        self.state = ListState::Loading;

        let key = self.key.clone();
        let token = self.cancel.clone();
        let access = Arc::clone(access);
        async move {
            let result = token
                .run(access.list_pending_championships())
                .await
                .unwrap_or(Err(FetchError::Cancelled));
            Fetched { key, result }
        }
    }

    /// Re-runs the same fetch after a failure.
    pub fn retry<G: LedgerGateway + 'static>(
        &mut self,
        access: &Arc<VerificationAccess<G>>,
    ) -> impl Future<Output = Fetched<Championship>> + Send + use<G> {
        self.load(access)
    }

    /// Applies a finished fetch. Returns false when it belongs to a superseded load.
    pub fn apply(&mut self, fetched: Fetched<Championship>) -> bool {
        if fetched.key != self.key || matches!(fetched.result, Err(FetchError::Cancelled)) {
            debug!(key = ?fetched.key, current = ?self.key, "discarding stale championship fetch");
            return false;
        }
        self.state = ListState::from_result(fetched.result);
        if let Some(id) = &self.selected {
            if !self.state.items().iter().any(|c| &c.id == id) {
                self.selected = None;
            }
        }
        true
    }

    /// Local transition only: records the selection and hands it to the caller.
    pub fn select(&mut self, championship_id: &str) -> Option<Championship> {
        let championship = self
            .state
            .items()
            .iter()
            .find(|c| c.id == championship_id)?
            .clone();
        self.selected = Some(championship.id.clone());
        (self.on_select)(&championship);
        Some(championship)
    }

    pub fn selected(&self) -> Option<&Championship> {
        let id = self.selected.as_ref()?;
        self.state.items().iter().find(|c| &c.id == id)
    }

    pub fn view(&self) -> ChampionshipView {
        match &self.state {
            ListState::Loading => ChampionshipView::Loading,
            ListState::Failed {
                message,
                session_expired,
            } => ChampionshipView::Failed {
                message: message.clone(),
                session_expired: *session_expired,
            },
            ListState::Empty => ChampionshipView::Empty,
            ListState::Ready(items) => ChampionshipView::List(
                items
                    .iter()
                    .map(|c| ChampionshipRow {
                        id: c.id.clone(),
                        name: c.name.clone(),
                        period: period_label(c.start_date, c.end_date),
                        pending_label: c.pending_count.map(|n| match n {
                            1 => "1 match pending".to_string(),
                            n => format!("{n} matches pending"),
                        }),
                        selected: self.selected.as_deref() == Some(c.id.as_str()),
                    })
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn championship(id: &str) -> Championship {
        Championship {
            id: id.into(),
            name: format!("Torneo {id}"),
            start_date: None,
            end_date: None,
            pending_count: Some(2),
        }
    }

    fn selector(log: Arc<Mutex<Vec<String>>>) -> ChampionshipSelector {
        ChampionshipSelector::new(Box::new(move |c: &Championship| {
            log.lock().unwrap().push(c.id.clone());
        }))
    }

    #[test]
    fn starts_loading_and_applies_current_key() {
        let mut sel = selector(Arc::default());
        assert_eq!(sel.view(), ChampionshipView::Loading);
        let applied = sel.apply(Fetched {
            key: sel.key.clone(),
            result: Ok(vec![championship("1")]),
        });
        assert!(applied);
        match sel.view() {
            ChampionshipView::List(rows) => {
                assert_eq!(rows.len(), 1);
                assert_eq!(rows[0].pending_label.as_deref(), Some("2 matches pending"));
            }
            other => panic!("unexpected view {other:?}"),
        }
    }

    #[test]
    fn superseded_attempt_is_ignored() {
        let mut sel = selector(Arc::default());
        let stale = sel.key.clone();
        sel.key.next_attempt();
        let applied = sel.apply(Fetched {
            key: stale,
            result: Ok(vec![championship("old")]),
        });
        assert!(!applied);
        assert_eq!(sel.view(), ChampionshipView::Loading);
    }

    #[test]
    fn selection_invokes_callback_without_fetching() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut sel = selector(log.clone());
        sel.apply(Fetched {
            key: sel.key.clone(),
            result: Ok(vec![championship("1"), championship("2")]),
        });
        assert!(sel.select("2").is_some());
        assert!(sel.select("missing").is_none());
        assert_eq!(*log.lock().unwrap(), vec!["2".to_string()]);
        assert_eq!(sel.selected().map(|c| c.id.as_str()), Some("2"));
    }

    #[test]
    fn failure_replaces_list() {
        let mut sel = selector(Arc::default());
        sel.apply(Fetched {
            key: sel.key.clone(),
            result: Err(FetchError::Generic("offline".into())),
        });
        assert_eq!(
            sel.view(),
            ChampionshipView::Failed {
                message: "offline".into(),
                session_expired: false
            }
        );
    }
}
