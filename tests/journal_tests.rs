use acta_review::journal::{ReviewJournal, Verdict};
use acta_review::outcome::{ApprovalOutcome, FailureKind, ReviewAttempt};
use tempfile::tempdir;

fn attempt(match_id: &str, outcome: ApprovalOutcome) -> ReviewAttempt {
    ReviewAttempt {
        match_id: match_id.into(),
        championship_id: Some("c1".into()),
        comment: None,
        outcome,
    }
}

#[test]
fn entries_come_back_in_recording_order() -> anyhow::Result<()> {
    let temp_dir = tempdir()?;
    let journal = ReviewJournal::open(temp_dir.path().join("journal.db"))?;
    assert!(journal.is_empty());

    journal.record(&attempt(
        "m1",
        ApprovalOutcome::rejected(FailureKind::ServerError, None),
    ))?;
    journal.record(&attempt(
        "m2",
        ApprovalOutcome::Approved {
            message: "Acta approved".into(),
        },
    ))?;
    journal.record(&attempt(
        "m1",
        ApprovalOutcome::Approved {
            message: "Acta approved".into(),
        },
    ))?;

    assert_eq!(journal.len(), 3);
    let entries = journal.entries()?;
    let order: Vec<&str> = entries.iter().map(|e| e.match_id.as_str()).collect();
    assert_eq!(order, vec!["m1", "m2", "m1"]);
    assert!(
        entries
            .windows(2)
            .all(|w| w[0].recorded_at.to_datetime_utc() <= w[1].recorded_at.to_datetime_utc())
    );

    let history = journal.history_for("m1")?;
    assert_eq!(history.len(), 2);
    assert_eq!(
        history[0].verdict,
        Verdict::Rejected {
            kind: FailureKind::ServerError
        }
    );
    assert_eq!(
        history[0].message,
        FailureKind::ServerError.default_message()
    );
    assert_eq!(history[1].verdict, Verdict::Approved);
    assert_ne!(history[0].entry_id, history[1].entry_id);

    Ok(())
}
