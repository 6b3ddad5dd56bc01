/// Failure of a list fetch against the gateway.
///
/// List screens turn these into a retry banner; `Session` additionally tells the
/// surrounding application to force re-authentication.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Session expired or not authorised (HTTP {status}). Please sign in again")]
    Session { status: u16 },
    #[error("{0}")]
    Generic(String),
    #[error("Missing required identifier: {0}")]
    InvalidArgument(&'static str),
    #[error("Fetch was superseded by a newer selection")]
    Cancelled,
}

impl FetchError {
    pub fn is_session(&self) -> bool {
        matches!(self, FetchError::Session { .. })
    }
}

/// The gateway could not be reached or its response could not be read.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct TransportError(pub String);

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable {0} must be set")]
    Missing(&'static str),
    #[error("Environment variable {name} has an invalid value: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(thiserror::Error, Debug)]
pub enum JournalError {
    #[error("Journal storage failed: {0}")]
    Storage(#[from] sled::Error),
    #[error("Journal entry could not be encoded: {0}")]
    Encode(String),
    #[error("Journal entry could not be decoded: {0}")]
    Decode(#[from] minicbor::decode::Error),
}

/// Reasons the detail controller refuses to start a submission.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ReviewRefused {
    #[error("A review is already being submitted")]
    InFlight,
    #[error("This review has already been resolved; acknowledge it first")]
    AlreadyResolved,
    #[error("{0}")]
    Blocked(crate::record::BlockReason),
}
