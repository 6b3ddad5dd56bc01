//! Headless view-models for the verification screens
//!
//! Each list screen owns its fetched data and a [`ListKey`] identifying the
//! selection it was created for. Fetches run detached from the view and come back
//! as [`Fetched`] values; a view applies a result only when its key is still the
//! view's current key and the fetch was not cancelled, so a slow reply for an old
//! selection can never overwrite the state of a newer one.
pub mod championships;
pub mod detail;
pub mod matches;
pub mod present;

pub use championships::{ChampionshipRow, ChampionshipSelector, ChampionshipView};
pub use detail::{Controls, DetailView, MatchDetail, OutcomeDialog, ReviewState, SubmitTicket};
pub use matches::{MatchRow, MatchSelector, MatchView};

use crate::error::FetchError;

pub type Callback<T> = Box<dyn FnMut(&T) + Send>;

/// Identity of one list fetch: the selection it belongs to, the generation of the
/// list instance (bumped on every remount) and the load attempt within it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListKey {
    pub scope: String,
    pub generation: u64,
    pub attempt: u32,
}

impl ListKey {
    pub fn new(scope: impl Into<String>, generation: u64) -> Self {
        Self {
            scope: scope.into(),
            generation,
            attempt: 0,
        }
    }

    fn next_attempt(&mut self) {
        self.attempt += 1;
    }
}

/// Result of a detached fetch, tagged with the key it was issued for.
#[derive(Debug)]
pub struct Fetched<T> {
    pub key: ListKey,
    pub result: Result<Vec<T>, FetchError>,
}

/// Render states of a list screen. Exactly one is shown at a time.
#[derive(Debug, Clone, PartialEq)]
pub enum ListState<T> {
    Loading,
    Failed { message: String, session_expired: bool },
    Empty,
    Ready(Vec<T>),
}

impl<T> ListState<T> {
    fn from_result(result: Result<Vec<T>, FetchError>) -> Self {
        match result {
            Ok(items) if items.is_empty() => ListState::Empty,
            Ok(items) => ListState::Ready(items),
            Err(e) => ListState::Failed {
                session_expired: e.is_session(),
                message: e.to_string(),
            },
        }
    }

    pub fn items(&self) -> &[T] {
        match self {
            ListState::Ready(items) => items,
            _ => &[],
        }
    }
}
