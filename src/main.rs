use acta_review::access::{FileStatus, VerificationAccess};
use acta_review::config::{Config, LocalConfig};
use acta_review::gateway::{Credential, LedgerGateway};
use acta_review::http::HttpGateway;
use acta_review::journal::{ReviewJournal, Verdict};
use acta_review::views::{ChampionshipView, MatchView, OutcomeDialog};
use acta_review::workflow::ReviewWorkflow;
use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "acta-review")]
#[command(about = "Review and approve match actas anchored on the integrity ledger")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List championships with matches awaiting review
    Championships,
    /// List the pending matches of a championship
    Matches { championship: String },
    /// Show one pending match
    Show { championship: String, match_id: String },
    /// Approve a match's acta
    Approve {
        championship: String,
        match_id: String,
        #[arg(long)]
        comment: Option<String>,
    },
    /// Download the acta files and compare them with their recorded hashes
    VerifyFiles { championship: String, match_id: String },
    /// Show the local review journal
    Journal {
        #[arg(long = "match")]
        match_id: Option<String>,
    },
}

fn init_tracing(log_json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Commands::Journal { match_id } = &cli.command {
        let local = LocalConfig::from_env().context("failed to load configuration")?;
        init_tracing(local.log_json);
        return show_journal(&local.journal_path, match_id.as_deref());
    }

    let config = Config::from_env().context("failed to load configuration")?;
    init_tracing(config.local.log_json);

    let gateway = HttpGateway::new(&config.gateway_url, config.http_timeout);
    let credential = config.session_token.clone().and_then(Credential::new);
    let access = Arc::new(VerificationAccess::new(
        gateway,
        credential,
        &config.files_url,
    ));

    let journal = match &cli.command {
        Commands::Approve { .. } => match ReviewJournal::open(&config.local.journal_path) {
            Ok(journal) => Some(journal),
            Err(e) => {
                warn!(error = %e, path = %config.local.journal_path.display(), "review journal unavailable");
                None
            }
        },
        _ => None,
    };

    let mut workflow = ReviewWorkflow::new(access, journal);
    workflow.start();
    workflow.settle().await;

    match cli.command {
        Commands::Championships => print_championships(&workflow),
        Commands::Matches { championship } => {
            open_championship(&mut workflow, &championship).await?;
            print_matches(&workflow);
            Ok(())
        }
        Commands::Show {
            championship,
            match_id,
        } => {
            open_match(&mut workflow, &championship, &match_id).await?;
            print_detail(&workflow);
            Ok(())
        }
        Commands::Approve {
            championship,
            match_id,
            comment,
        } => {
            open_match(&mut workflow, &championship, &match_id).await?;
            if let Some(comment) = comment {
                workflow.set_comment(&comment);
            }
            let outcome = workflow
                .approve()
                .await
                .context("no match is open")?
                .context("approval was not submitted")?;
            if let Some(dialog) = workflow.detail().and_then(|d| d.dialog()) {
                print_dialog(&dialog);
            }
            workflow.acknowledge();
            workflow.settle().await;
            info!(remaining = workflow.matches().map(|m| m.rows().len()), "match list refreshed");
            if !outcome.is_ok() {
                bail!("acta {match_id} was not approved");
            }
            Ok(())
        }
        Commands::VerifyFiles {
            championship,
            match_id,
        } => {
            open_match(&mut workflow, &championship, &match_id).await?;
            let record = workflow
                .detail()
                .map(|d| d.record().clone())
                .context("no match is open")?;
            let checks = workflow.access().check_files(&record).await;
            if checks.is_empty() {
                println!("no files");
            }
            for check in checks {
                let url = check.url.as_deref().unwrap_or("-");
                let status = match &check.status {
                    FileStatus::Matches => "hash matches".to_string(),
                    FileStatus::Mismatch { expected, actual } => {
                        format!("HASH MISMATCH expected {expected} got {actual}")
                    }
                    FileStatus::NoRecordedHash => "no recorded hash".to_string(),
                    FileStatus::MissingPath => "no stored path".to_string(),
                    FileStatus::Unavailable { reason } => format!("unavailable: {reason}"),
                };
                println!("{:<6} {url}  {status}", check.tag.to_string());
            }
            Ok(())
        }
        Commands::Journal { .. } => Ok(()),
    }
}

async fn open_championship<G>(
    workflow: &mut ReviewWorkflow<G>,
    championship: &str,
) -> anyhow::Result<()>
where
    G: LedgerGateway + 'static,
{
    if let ChampionshipView::Failed { message, .. } = workflow.championships().view() {
        bail!("could not load championships: {message}");
    }
    if !workflow.select_championship(championship) {
        bail!("championship {championship} has no pending matches");
    }
    workflow.settle().await;
    if let Some(MatchView::Failed { message, .. }) = workflow.matches().map(|m| m.view()) {
        bail!("could not load matches: {message}");
    }
    Ok(())
}

async fn open_match<G>(
    workflow: &mut ReviewWorkflow<G>,
    championship: &str,
    match_id: &str,
) -> anyhow::Result<()>
where
    G: LedgerGateway + 'static,
{
    open_championship(workflow, championship).await?;
    if !workflow.select_match(match_id) {
        bail!("match {match_id} is not pending in championship {championship}");
    }
    Ok(())
}

fn print_championships<G>(workflow: &ReviewWorkflow<G>) -> anyhow::Result<()>
where
    G: LedgerGateway + 'static,
{
    match workflow.championships().view() {
        ChampionshipView::Loading => println!("loading..."),
        ChampionshipView::Failed { message, .. } => {
            bail!("could not load championships: {message}");
        }
        ChampionshipView::Empty => println!("no championships with pending matches"),
        ChampionshipView::List(rows) => {
            for row in rows {
                println!(
                    "{:<12} {}  {}  {}",
                    row.id,
                    row.name,
                    row.period.unwrap_or_default(),
                    row.pending_label.unwrap_or_default()
                );
            }
        }
    }
    Ok(())
}

fn print_matches<G>(workflow: &ReviewWorkflow<G>)
where
    G: LedgerGateway + 'static,
{
    let Some(view) = workflow.matches().map(|m| m.view()) else {
        return;
    };
    match view {
        MatchView::NoChampionship { prompt } => println!("{prompt}"),
        MatchView::Loading => println!("loading..."),
        MatchView::Failed { message, .. } => println!("could not load matches: {message}"),
        MatchView::Empty => println!("no pending matches"),
        MatchView::List { championship, rows } => {
            println!("{championship}");
            for row in rows {
                let verify = match &row.blocked_hint {
                    None => "ready to verify".to_string(),
                    Some(hint) => hint.clone(),
                };
                println!(
                    "{:<12} {} {} - {} {}  ({})  {}  {}  {}",
                    row.id,
                    row.local,
                    row.local_score,
                    row.visitor_score,
                    row.visitor,
                    row.summary,
                    row.schedule,
                    row.file_label,
                    verify
                );
            }
        }
    }
}

fn print_detail<G>(workflow: &ReviewWorkflow<G>)
where
    G: LedgerGateway + 'static,
{
    let Some(detail) = workflow.detail() else {
        return;
    };
    let view = detail.view(workflow.access());
    println!("{} {} - {} {}", view.local, view.local_score, view.visitor_score, view.visitor);
    println!("result:      {}", view.summary);
    println!("schedule:    {}", view.schedule);
    if let Some(court) = &view.court {
        println!("court:       {court}");
    }
    println!("referee:     {}", view.referee);
    println!("poll worker: {}", view.poll_worker);
    println!("anchor:      {}", view.anchor.message);
    if let Some(at) = &view.anchored_at {
        println!("anchored at: {at}");
    }
    for (tag, url) in &view.files {
        println!("file {tag}: {url}");
    }
    let controls = detail.controls();
    match controls.approve_hint {
        None => println!("approval:    allowed"),
        Some(hint) => println!("approval:    blocked ({hint})"),
    }
}

fn print_dialog(dialog: &OutcomeDialog) {
    match dialog {
        OutcomeDialog::Approved { title, message } => println!("{title}: {message}"),
        OutcomeDialog::IntegrityAlert {
            title,
            message,
            details,
            guidance,
        } => {
            println!("{title}: {message}");
            if let Some(details) = details {
                println!("details: {details}");
            }
            for line in guidance {
                println!("  - {line}");
            }
        }
        OutcomeDialog::Simple {
            title,
            message,
            hint,
            ..
        } => {
            println!("{title}: {message}");
            if let Some(hint) = hint {
                println!("{hint}");
            }
        }
    }
}

fn show_journal(path: &Path, match_id: Option<&str>) -> anyhow::Result<()> {
    let journal = ReviewJournal::open(path)
        .with_context(|| format!("failed to open review journal at {}", path.display()))?;
    let entries = match match_id {
        Some(id) => journal.history_for(id)?,
        None => journal.entries()?,
    };
    if entries.is_empty() {
        println!("no reviews recorded");
    }
    for entry in entries {
        let verdict = match entry.verdict {
            Verdict::Approved => "approved".to_string(),
            Verdict::Rejected { kind } => format!("rejected ({kind})"),
        };
        println!(
            "{}  {}  match {}  {verdict}  {}",
            entry.recorded_at.to_datetime_utc().format("%Y-%m-%d %H:%M:%S"),
            entry.entry_id,
            entry.match_id,
            entry.message
        );
        if let Some(comment) = &entry.comment {
            println!("    comment: {comment}");
        }
    }
    Ok(())
}
