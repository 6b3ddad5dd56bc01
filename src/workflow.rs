//! Review workflow: championship -> match -> detail
//!
//! Plays the role of the surrounding application. The screens only talk back
//! through their callbacks, which post [`Navigation`] messages on a channel; the
//! workflow drains that channel after every operator action. List fetches run as
//! detached tasks and report back over a second channel, so the workflow is a
//! small single-consumer event loop: nothing mutates screen state except the
//! methods below.
use crate::access::VerificationAccess;
use crate::error::ReviewRefused;
use crate::gateway::LedgerGateway;
use crate::journal::ReviewJournal;
use crate::outcome::{ApprovalOutcome, ReviewAttempt};
use crate::record::{Championship, MatchRecord};
use crate::views::{ChampionshipSelector, Fetched, MatchDetail, MatchSelector};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Championships,
    Matches,
    Detail,
}

#[derive(Debug)]
enum Navigation {
    ChampionshipSelected(Championship),
    MatchSelected(MatchRecord),
    Back,
    Reviewed(ReviewAttempt),
}

#[derive(Debug)]
enum Loaded {
    Championships(Fetched<Championship>),
    Matches(Fetched<MatchRecord>),
}

pub struct ReviewWorkflow<G> {
    access: Arc<VerificationAccess<G>>,
    journal: Option<ReviewJournal>,
    championships: ChampionshipSelector,
    matches: Option<MatchSelector>,
    detail: Option<MatchDetail>,
    // bumped after every resolved review; forces the match list to remount
    refresh: u64,
    generation: u64,
    notice: Option<String>,
    nav_tx: UnboundedSender<Navigation>,
    nav_rx: UnboundedReceiver<Navigation>,
    loaded_tx: UnboundedSender<Loaded>,
    loaded_rx: UnboundedReceiver<Loaded>,
    in_flight: usize,
}

impl<G: LedgerGateway + 'static> ReviewWorkflow<G> {
    pub fn new(access: Arc<VerificationAccess<G>>, journal: Option<ReviewJournal>) -> Self {
        let (nav_tx, nav_rx) = mpsc::unbounded_channel();
        let (loaded_tx, loaded_rx) = mpsc::unbounded_channel();
        let tx = nav_tx.clone();
        let championships = ChampionshipSelector::new(Box::new(move |c: &Championship| {
            let _ = tx.send(Navigation::ChampionshipSelected(c.clone()));
        }));
        Self {
            access,
            journal,
            championships,
            matches: None,
            detail: None,
            refresh: 0,
            generation: 0,
            notice: None,
            nav_tx,
            nav_rx,
            loaded_tx,
            loaded_rx,
            in_flight: 0,
        }
    }

    /// Kicks off the championship fetch. Must run inside a tokio runtime.
    pub fn start(&mut self) {
        let fut = self.championships.load(&self.access);
        self.spawn(fut, Loaded::Championships);
    }

    pub fn retry_championships(&mut self) {
        let fut = self.championships.retry(&self.access);
        self.spawn(fut, Loaded::Championships);
    }

    pub fn retry_matches(&mut self) {
        if let Some(selector) = self.matches.as_mut() {
            if let Some(fut) = selector.load(&self.access) {
                self.spawn(fut, Loaded::Matches);
            }
        }
    }

    fn spawn<T, F>(&mut self, fut: F, wrap: fn(Fetched<T>) -> Loaded)
    where
        T: Send + 'static,
        F: Future<Output = Fetched<T>> + Send + 'static,
    {
        let tx = self.loaded_tx.clone();
        self.in_flight += 1;
        tokio::spawn(async move {
            let fetched = fut.await;
            let _ = tx.send(wrap(fetched));
        });
    }

    /// Waits for the next finished fetch and applies it. Returns false when no
    /// fetch is outstanding.
    pub async fn next_loaded(&mut self) -> bool {
        if self.in_flight == 0 {
            return false;
        }
        let Some(loaded) = self.loaded_rx.recv().await else {
            return false;
        };
        self.in_flight -= 1;
        match loaded {
            Loaded::Championships(fetched) => {
                self.championships.apply(fetched);
            }
            Loaded::Matches(fetched) => {
                let applied = match self.matches.as_mut() {
                    Some(selector) => selector.apply(fetched),
                    None => false,
                };
                if !applied {
                    debug!("match list result discarded");
                }
            }
        }
        true
    }

    /// Applies fetch results until none are outstanding.
    pub async fn settle(&mut self) {
        while self.next_loaded().await {}
    }

    pub fn select_championship(&mut self, championship_id: &str) -> bool {
        let selected = self.championships.select(championship_id).is_some();
        self.drain_navigation();
        selected
    }

    pub fn select_match(&mut self, match_id: &str) -> bool {
        let selected = match self.matches.as_mut() {
            Some(selector) => selector.select(match_id).is_some(),
            None => false,
        };
        self.drain_navigation();
        selected
    }

    pub fn set_comment(&mut self, text: &str) -> bool {
        self.detail
            .as_mut()
            .is_some_and(|detail| detail.set_comment(text))
    }

    pub async fn approve(&mut self) -> Option<Result<ApprovalOutcome, ReviewRefused>> {
        let detail = self.detail.as_mut()?;
        let result = detail.approve(&self.access).await;
        self.drain_navigation();
        Some(result)
    }

    /// Dismisses the outcome dialog; goes back to a refreshed match list.
    pub fn acknowledge(&mut self) -> bool {
        let acknowledged = self
            .detail
            .as_mut()
            .is_some_and(|detail| detail.acknowledge());
        self.drain_navigation();
        acknowledged
    }

    pub fn back(&mut self) -> bool {
        let left = self.detail.as_mut().is_some_and(|detail| detail.back());
        self.drain_navigation();
        left
    }

    fn drain_navigation(&mut self) {
        while let Ok(navigation) = self.nav_rx.try_recv() {
            match navigation {
                Navigation::ChampionshipSelected(championship) => {
                    self.notice = None;
                    self.detail = None;
                    self.mount_matches(Some(championship));
                }
                Navigation::MatchSelected(record) => {
                    self.mount_detail(record);
                }
                Navigation::Back => {
                    self.detail = None;
                    self.refresh += 1;
                    let championship = self
                        .matches
                        .as_ref()
                        .and_then(|m| m.championship().cloned());
                    self.mount_matches(championship);
                }
                Navigation::Reviewed(attempt) => {
                    if !attempt.outcome.is_ok() {
                        self.notice = Some(attempt.outcome.message().to_string());
                    } else {
                        self.notice = None;
                    }
                    if let Some(journal) = &self.journal {
                        if let Err(e) = journal.record(&attempt) {
                            warn!(error = %e, match_id = %attempt.match_id, "failed to journal review");
                        }
                    }
                }
            }
        }
    }

    // A new selector per selection: the old one is cancelled and dropped, so its
    // in-flight fetch can no longer land anywhere.
    fn mount_matches(&mut self, championship: Option<Championship>) {
        if let Some(previous) = self.matches.take() {
            previous.cancel();
        }
        self.generation += 1;
        let tx = self.nav_tx.clone();
        let mut selector = MatchSelector::new(
            championship,
            self.generation,
            Box::new(move |m: &MatchRecord| {
                let _ = tx.send(Navigation::MatchSelected(m.clone()));
            }),
        );
        if let Some(fut) = selector.load(&self.access) {
            self.spawn(fut, Loaded::Matches);
        }
        self.matches = Some(selector);
    }

    fn mount_detail(&mut self, record: MatchRecord) {
        let championship_id = self
            .matches
            .as_ref()
            .and_then(|m| m.championship())
            .map(|c| c.id.clone());
        let back_tx = self.nav_tx.clone();
        let review_tx = self.nav_tx.clone();
        self.detail = Some(MatchDetail::new(
            record,
            championship_id,
            Box::new(move || {
                let _ = back_tx.send(Navigation::Back);
            }),
            Box::new(move |attempt: &ReviewAttempt| {
                let _ = review_tx.send(Navigation::Reviewed(attempt.clone()));
            }),
        ));
    }

    pub fn screen(&self) -> Screen {
        if self.detail.is_some() {
            Screen::Detail
        } else if self.matches.is_some() {
            Screen::Matches
        } else {
            Screen::Championships
        }
    }

    pub fn access(&self) -> &VerificationAccess<G> {
        &self.access
    }

    pub fn championships(&self) -> &ChampionshipSelector {
        &self.championships
    }

    pub fn matches(&self) -> Option<&MatchSelector> {
        self.matches.as_ref()
    }

    pub fn detail(&self) -> Option<&MatchDetail> {
        self.detail.as_ref()
    }

    pub fn journal(&self) -> Option<&ReviewJournal> {
        self.journal.as_ref()
    }

    /// Last failure message shown above the lists, cleared by a new selection.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn refresh_count(&self) -> u64 {
        self.refresh
    }
}
