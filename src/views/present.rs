//! Presentation facts derived from raw records on every render
use crate::record::MatchRecord;
use chrono::{NaiveDate, NaiveTime};
use std::fmt;

pub const DID_NOT_PRESENT: &str = "did not present";

/// Score badge for one side. A missing score means the team forfeited; it is
/// never shown as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideScore {
    Points(i32),
    DidNotPresent,
}

impl From<Option<i32>> for SideScore {
    fn from(score: Option<i32>) -> Self {
        score.map_or(SideScore::DidNotPresent, SideScore::Points)
    }
}

impl fmt::Display for SideScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SideScore::Points(points) => write!(f, "{points}"),
            SideScore::DidNotPresent => f.write_str(DID_NOT_PRESENT),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScoreSummary {
    Final { local: i32, visitor: i32 },
    Forfeit { absent: String },
    DoubleForfeit,
}

impl ScoreSummary {
    pub fn of(record: &MatchRecord) -> Self {
        match (record.score_local, record.score_visitor) {
            (Some(local), Some(visitor)) => ScoreSummary::Final { local, visitor },
            (None, Some(_)) => ScoreSummary::Forfeit {
                absent: record.local.name.clone(),
            },
            (Some(_), None) => ScoreSummary::Forfeit {
                absent: record.visitor.name.clone(),
            },
            (None, None) => ScoreSummary::DoubleForfeit,
        }
    }
}

impl fmt::Display for ScoreSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreSummary::Final { local, visitor } => write!(f, "{local} - {visitor}"),
            ScoreSummary::Forfeit { absent } => write!(f, "{absent} {DID_NOT_PRESENT}"),
            ScoreSummary::DoubleForfeit => write!(f, "both teams {DID_NOT_PRESENT}"),
        }
    }
}

pub fn file_count_label(count: usize) -> String {
    match count {
        0 => "no files".to_string(),
        1 => "1 file".to_string(),
        n => format!("{n} files"),
    }
}

pub fn schedule_label(date: Option<NaiveDate>, time: Option<NaiveTime>) -> String {
    match (date, time) {
        (Some(date), Some(time)) => format!("{} {}", date.format("%d/%m/%Y"), time.format("%H:%M")),
        (Some(date), None) => date.format("%d/%m/%Y").to_string(),
        (None, Some(time)) => format!("date to be confirmed, {}", time.format("%H:%M")),
        (None, None) => "date to be confirmed".to_string(),
    }
}

pub fn period_label(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Option<String> {
    let fmt = |d: NaiveDate| d.format("%d/%m/%Y").to_string();
    match (start, end) {
        (Some(s), Some(e)) => Some(format!("{} - {}", fmt(s), fmt(e))),
        (Some(s), None) => Some(format!("from {}", fmt(s))),
        (None, Some(e)) => Some(format!("until {}", fmt(e))),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_labels() {
        assert_eq!(file_count_label(0), "no files");
        assert_eq!(file_count_label(1), "1 file");
        assert_eq!(file_count_label(3), "3 files");
    }

    #[test]
    fn missing_score_is_not_zero() {
        assert_eq!(SideScore::from(None), SideScore::DidNotPresent);
        assert_eq!(SideScore::from(Some(0)), SideScore::Points(0));
        assert_eq!(SideScore::from(Some(0)).to_string(), "0");
    }

    #[test]
    fn schedule_and_period() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 4);
        let time = NaiveTime::from_hms_opt(18, 30, 0);
        assert_eq!(schedule_label(date, time), "04/05/2024 18:30");
        assert_eq!(schedule_label(None, None), "date to be confirmed");
        assert_eq!(period_label(None, None), None);
        assert_eq!(period_label(date, None).as_deref(), Some("from 04/05/2024"));
    }
}
