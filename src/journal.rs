//! Local review journal
//!
//! An append-only audit trail of the approval attempts made from this workstation.
//! Entries are CBOR encoded and keyed by the raw bytes of a uuid7, so iteration
//! order is recording order. The journal is a witness log only: the gateway stays
//! the source of truth for whether an acta has been reviewed.
use crate::error::JournalError;
use crate::outcome::{FailureKind, ReviewAttempt};
use crate::utils::uuid_to_bech32;
use chrono::{DateTime, TimeZone, Utc};
use std::path::Path;
use tracing::debug;
use uuid7::uuid7;

const ENTRY_HRP: &str = "review_";

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone)]
pub struct TimeStamp<T: TimeZone>(DateTime<T>);

impl TimeStamp<Utc> {
    pub fn new() -> Self {
        Self(Utc::now())
    }
    pub fn to_datetime_utc(&self) -> DateTime<Utc> {
        self.0
    }
}

impl Default for TimeStamp<Utc> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: TimeZone> From<DateTime<T>> for TimeStamp<T> {
    fn from(value: DateTime<T>) -> Self {
        TimeStamp(value)
    }
}

impl<C> minicbor::Encode<C> for TimeStamp<Utc> {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        if let Some(nsec) = self.0.timestamp_nanos_opt() {
            return e.i64(nsec)?.ok();
        }

        Err(minicbor::encode::Error::message(
            "failed to encode timestamp. timestamp_nanos_opt returned None",
        ))
    }
}

impl<'b, C> minicbor::Decode<'b, C> for TimeStamp<Utc> {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        let nsecs = d.i64()?;

        Ok(TimeStamp(DateTime::from_timestamp_nanos(nsecs)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub enum Verdict {
    #[n(0)]
    Approved,
    #[n(1)]
    Rejected {
        #[n(0)]
        kind: FailureKind,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub struct ReviewEntry {
    #[n(0)]
    pub entry_id: String, // bech32 encoded uuid7
    #[n(1)]
    pub match_id: String,
    #[n(2)]
    pub championship_id: Option<String>,
    #[n(3)]
    pub recorded_at: TimeStamp<Utc>,
    #[n(4)]
    pub verdict: Verdict,
    #[n(5)]
    pub message: String,
    #[n(6)]
    pub comment: Option<String>,
}

pub struct ReviewJournal {
    db: sled::Db,
}

impl ReviewJournal {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, JournalError> {
        Ok(Self {
            db: sled::open(path)?,
        })
    }

    pub fn record(&self, attempt: &ReviewAttempt) -> anyhow::Result<ReviewEntry> {
        let key = uuid7();
        let verdict = match attempt.outcome.kind() {
            None => Verdict::Approved,
            Some(kind) => Verdict::Rejected { kind },
        };
        let entry = ReviewEntry {
            entry_id: uuid_to_bech32(ENTRY_HRP, &key)?,
            match_id: attempt.match_id.clone(),
            championship_id: attempt.championship_id.clone(),
            recorded_at: TimeStamp::new(),
            verdict,
            message: attempt.outcome.message().to_string(),
            comment: attempt.comment.clone(),
        };

        let cbor =
            minicbor::to_vec(&entry).map_err(|e| JournalError::Encode(e.to_string()))?;
        self.db
            .insert(key.as_bytes(), cbor)
            .map_err(JournalError::from)?;
        self.db.flush().map_err(JournalError::from)?;
        debug!(entry_id = %entry.entry_id, match_id = %entry.match_id, "review journaled");

        Ok(entry)
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> Result<Vec<ReviewEntry>, JournalError> {
        let mut entries = Vec::new();
        for item in self.db.iter() {
            let (_, value) = item?;
            entries.push(minicbor::decode(&value)?);
        }
        Ok(entries)
    }

    pub fn history_for(&self, match_id: &str) -> Result<Vec<ReviewEntry>, JournalError> {
        Ok(self
            .entries()?
            .into_iter()
            .filter(|entry| entry.match_id == match_id)
            .collect())
    }

    pub fn len(&self) -> usize {
        self.db.len()
    }

    pub fn is_empty(&self) -> bool {
        self.db.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_encoding() {
        let original = TimeStamp::new();

        let encoding = minicbor::to_vec(original.clone()).unwrap();
        let decode: TimeStamp<Utc> = minicbor::decode(&encoding).unwrap();

        assert_eq!(original, decode);
    }

    #[test]
    fn verdict_encoding_keeps_kind() {
        let verdict = Verdict::Rejected {
            kind: FailureKind::DataIntegrity,
        };
        let encoding = minicbor::to_vec(verdict).unwrap();
        let decode: Verdict = minicbor::decode(&encoding).unwrap();
        assert_eq!(verdict, decode);
    }
}
