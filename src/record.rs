//! Domain records for championships and matches awaiting acta verification
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use std::fmt;

/// Number of hash characters shown in anchor status lines.
pub const SHORT_HASH_LEN: usize = 16;
pub const NOT_ANCHORED_MESSAGE: &str = "Not anchored on the integrity ledger";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Championship {
    pub id: String,
    pub name: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub pending_count: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    pub name: String,
    pub logo: Option<String>,
}

/// Referee or poll worker assigned to a match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Official {
    pub id: String,
    pub name: Option<String>,
}

impl Official {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

/// Hash presence is the only signal that the record is anchored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntegrityAnchor {
    pub hash: Option<String>,
    pub anchored_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileTag {
    Front,
    Back,
    Other(String),
}

impl FileTag {
    pub fn parse(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "front" | "frente" | "anverso" => FileTag::Front,
            "back" | "reverso" | "dorso" => FileTag::Back,
            other => FileTag::Other(other.to_string()),
        }
    }
}

impl fmt::Display for FileTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileTag::Front => write!(f, "front"),
            FileTag::Back => write!(f, "back"),
            FileTag::Other(tag) => write!(f, "{tag}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActaFile {
    pub tag: FileTag,
    pub path: String,
    pub file_hash: Option<String>,
}

impl ActaFile {
    pub fn has_path(&self) -> bool {
        !self.path.trim().is_empty()
    }
}

/// A single fixture whose acta awaits verification. Scores are display-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRecord {
    pub id: String,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub court: Option<String>,
    pub local: Team,
    pub visitor: Team,
    pub score_local: Option<i32>,
    pub score_visitor: Option<i32>,
    pub referee: Official,
    pub poll_worker: Official,
    pub anchor: IntegrityAnchor,
    pub files: Vec<ActaFile>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorStatus {
    pub anchored: bool,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockReason {
    NotAnchored,
    NoFiles,
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockReason::NotAnchored => {
                write!(f, "The acta is not anchored on the integrity ledger")
            }
            BlockReason::NoFiles => write!(f, "The acta has no scanned files"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Approvability {
    Allowed,
    Blocked(BlockReason),
}

impl Approvability {
    pub fn allowed(&self) -> bool {
        matches!(self, Approvability::Allowed)
    }
    pub fn reason(&self) -> Option<BlockReason> {
        match self {
            Approvability::Allowed => None,
            Approvability::Blocked(reason) => Some(*reason),
        }
    }
}

impl MatchRecord {
    pub fn is_anchored(&self) -> bool {
        self.anchor.hash.is_some()
    }

    pub fn usable_files(&self) -> impl Iterator<Item = &ActaFile> {
        self.files.iter().filter(|file| file.has_path())
    }

    pub fn anchor_status(&self) -> AnchorStatus {
        match &self.anchor.hash {
            Some(hash) => AnchorStatus {
                anchored: true,
                message: format!("Anchored on the integrity ledger (hash {})", short_hash(hash)),
            },
            None => AnchorStatus {
                anchored: false,
                message: NOT_ANCHORED_MESSAGE.to_string(),
            },
        }
    }

    /// Both the anchor and at least one stored file are required; the anchor is
    /// reported first when both are missing.
    pub fn approvability(&self) -> Approvability {
        if !self.is_anchored() {
            return Approvability::Blocked(BlockReason::NotAnchored);
        }
        if self.usable_files().next().is_none() {
            return Approvability::Blocked(BlockReason::NoFiles);
        }
        Approvability::Allowed
    }
}

pub fn short_hash(hash: &str) -> String {
    if hash.chars().count() <= SHORT_HASH_LEN {
        return hash.to_string();
    }
    let head: String = hash.chars().take(SHORT_HASH_LEN).collect();
    format!("{head}...")
}
