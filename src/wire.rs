//! Gateway payload shapes and their normalization into domain records
//!
//! The gateway is not consistent about envelopes or field naming: lists arrive as
//! bare arrays or wrapped in `{data: [...]}` (sometimes nested one level deeper),
//! identifiers may be numbers or strings, and dates may carry a time component.
//! Everything is funnelled through this module so the rest of the crate only sees
//! the types in [`crate::record`].
use crate::error::FetchError;
use crate::record::{
    ActaFile, Championship, FileTag, IntegrityAnchor, MatchRecord, Official, Team,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

const UNSUCCESSFUL_LIST: &str = "The gateway reported an unsuccessful response";

#[derive(Debug, Clone, Deserialize)]
pub struct ChampionshipDto {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub name: String,
    #[serde(default, alias = "startDate")]
    pub start_date: Option<String>,
    #[serde(default, alias = "endDate")]
    pub end_date: Option<String>,
    #[serde(default, alias = "pendingCount", deserialize_with = "lenient_int")]
    pub pending_count: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchDto {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default, alias = "courtName")]
    pub court: Option<String>,
    #[serde(alias = "teamLocal")]
    pub team_local: String,
    #[serde(default, alias = "teamLocalLogo")]
    pub team_local_logo: Option<String>,
    #[serde(alias = "teamVisitor")]
    pub team_visitor: String,
    #[serde(default, alias = "teamVisitorLogo")]
    pub team_visitor_logo: Option<String>,
    #[serde(default, alias = "scoreLocal", deserialize_with = "lenient_int")]
    pub score_local: Option<i32>,
    #[serde(default, alias = "scoreVisitor", deserialize_with = "lenient_int")]
    pub score_visitor: Option<i32>,
    #[serde(default, alias = "refereeId", deserialize_with = "opt_id_string")]
    pub referee_id: Option<String>,
    #[serde(default, alias = "refereeName")]
    pub referee_name: Option<String>,
    #[serde(default, alias = "pollWorkerId", deserialize_with = "opt_id_string")]
    pub poll_worker_id: Option<String>,
    #[serde(default, alias = "pollWorkerName")]
    pub poll_worker_name: Option<String>,
    #[serde(default, alias = "anchorHash")]
    pub anchor_hash: Option<String>,
    #[serde(default, alias = "anchorTimestamp")]
    pub anchor_timestamp: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub files: Vec<FileDto>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileDto {
    #[serde(default, alias = "side")]
    pub tag: Option<String>,
    #[serde(default, alias = "url")]
    pub path: Option<String>,
    #[serde(default, alias = "fileHash", alias = "hash")]
    pub file_hash: Option<String>,
}

/// Body of the approval submission. A blank comment is left out entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApprovalRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl ApprovalRequest {
    pub fn new(comment: Option<&str>) -> Self {
        let comment = comment
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);
        Self { comment }
    }
}

/// Reply to an approval submission, success or failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewReply {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default, rename = "errorType", alias = "error_type")]
    pub error_type: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub details: Option<Value>,
}

impl ChampionshipDto {
    pub fn into_record(self) -> Championship {
        Championship {
            start_date: self.start_date.as_deref().and_then(parse_date),
            end_date: self.end_date.as_deref().and_then(parse_date),
            pending_count: self.pending_count,
            id: self.id,
            name: self.name,
        }
    }
}

impl MatchDto {
    pub fn into_record(self) -> MatchRecord {
        let anchored_at = self.anchor_timestamp.as_deref().and_then(|raw| {
            let parsed = parse_timestamp(raw);
            if parsed.is_none() {
                warn!(match_id = %self.id, raw, "unreadable anchor timestamp");
            }
            parsed
        });

        MatchRecord {
            date: self.date.as_deref().and_then(parse_date),
            time: self.time.as_deref().and_then(parse_time),
            court: non_blank(self.court),
            local: Team {
                name: self.team_local,
                logo: non_blank(self.team_local_logo),
            },
            visitor: Team {
                name: self.team_visitor,
                logo: non_blank(self.team_visitor_logo),
            },
            score_local: self.score_local,
            score_visitor: self.score_visitor,
            referee: Official {
                id: self.referee_id.unwrap_or_default(),
                name: non_blank(self.referee_name),
            },
            poll_worker: Official {
                id: self.poll_worker_id.unwrap_or_default(),
                name: non_blank(self.poll_worker_name),
            },
            anchor: IntegrityAnchor {
                hash: non_blank(self.anchor_hash),
                anchored_at,
            },
            files: self.files.into_iter().map(FileDto::into_file).collect(),
            id: self.id,
        }
    }
}

impl FileDto {
    fn into_file(self) -> ActaFile {
        ActaFile {
            tag: FileTag::parse(self.tag.as_deref().unwrap_or_default()),
            path: self.path.unwrap_or_default(),
            file_hash: non_blank(self.file_hash),
        }
    }
}

/// Extracts a list from any of the envelopes the gateway uses.
///
/// `keys` names the extra wrapper fields tried after `data`. A missing or null
/// list is an empty result, never an error.
pub fn decode_list<T: DeserializeOwned>(body: &[u8], keys: &[&str]) -> Result<Vec<T>, FetchError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| FetchError::Generic(format!("Malformed gateway payload: {e}")))?;

    let items = match locate_list(value, keys)? {
        Some(items) => items,
        None => return Ok(Vec::new()),
    };
    serde_json::from_value(items)
        .map_err(|e| FetchError::Generic(format!("Malformed gateway payload: {e}")))
}

fn locate_list(value: Value, keys: &[&str]) -> Result<Option<Value>, FetchError> {
    match value {
        Value::Null => Ok(None),
        Value::Array(_) => Ok(Some(value)),
        Value::Object(mut map) => {
            if map.get("success").and_then(Value::as_bool) == Some(false) {
                let message = map
                    .get("message")
                    .and_then(Value::as_str)
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or(UNSUCCESSFUL_LIST);
                return Err(FetchError::Generic(message.to_string()));
            }
            for key in std::iter::once("data").chain(keys.iter().copied()) {
                if let Some(inner) = map.remove(key) {
                    return locate_list(inner, keys);
                }
            }
            Ok(None)
        }
        other => Err(FetchError::Generic(format!(
            "Malformed gateway payload: expected a list, got {other}"
        ))),
    }
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let day = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .map(|naive| naive.and_utc())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn id_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) if !s.trim().is_empty() => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(de::Error::custom(format!(
            "expected a string or numeric id, got {other}"
        ))),
    }
}

fn opt_id_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(de::Error::custom(format!(
            "expected a string or numeric id, got {other}"
        ))),
    }
}

// Numbers sometimes arrive quoted. Fractions and out-of-range values are
// rejected: an absent score means a forfeit, so it must not stand in for garbage.
fn lenient_int<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<i64>,
{
    let raw: i64 = match Value::deserialize(deserializer)? {
        Value::Null => return Ok(None),
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| de::Error::custom(format!("expected an integer, got {n}")))?,
        Value::String(s) if s.trim().is_empty() => return Ok(None),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("expected an integer, got {s:?}")))?,
        other => return Err(de::Error::custom(format!("expected an integer, got {other}"))),
    };
    T::try_from(raw)
        .map(Some)
        .map_err(|_| de::Error::custom(format!("integer {raw} is out of range")))
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<FileDto>, D::Error> {
    Ok(Option::<Vec<FileDto>>::deserialize(deserializer)?.unwrap_or_default())
}
