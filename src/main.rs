use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

use maternal_risk_monitor::db::{self, PgCheckInStore};
use maternal_risk_monitor::session::DailyInput;
use maternal_risk_monitor::{CheckInInput, EngineConfig, RiskSession};

#[derive(Parser)]
#[command(name = "maternal-risk")]
#[command(about = "Prenatal check-in risk scoring and journal safety monitor", long_about = None)]
struct Cli {
    /// Identity whose check-ins are read and written
    #[arg(long, global = true, default_value = "default")]
    namespace: String,
    /// JSON file overriding scoring thresholds
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load a demo pregnancy history
    Seed,
    /// Import weekly check-ins from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Submit a weekly check-in and print its assessment
    Submit {
        #[arg(long)]
        week: i64,
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        headache: i64,
        #[arg(long)]
        swelling: i64,
        #[arg(long)]
        sleep_quality: i64,
        #[arg(long)]
        fatigue: i64,
        #[arg(long)]
        mood: i64,
        #[arg(long)]
        dizziness: i64,
        #[arg(long)]
        systolic: i64,
        #[arg(long)]
        diastolic: i64,
    },
    /// Record a mood journal entry
    Journal {
        #[arg(long)]
        text: String,
        #[arg(long, default_value = "😐")]
        emoji: String,
    },
    /// Print the week-by-week risk trajectory
    Trajectory,
    /// Print the clinician summary, or write the full report to a file
    Summary {
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Check the journal for a sustained negative streak
    Streak,
    /// Delete all check-ins and journal entries for the namespace
    Clear,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => EngineConfig::from_path(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => EngineConfig::default(),
    };

    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    if let Commands::InitDb = cli.command {
        db::init_db(&pool).await?;
        println!("Schema ready.");
        return Ok(());
    }

    let store = Arc::new(PgCheckInStore::new(pool, cli.namespace.clone()));

    if let Commands::Import { csv } = &cli.command {
        let summary = db::import_csv(store.as_ref(), csv).await?;
        println!(
            "Imported {} check-ins from {}.",
            summary.inserted,
            csv.display()
        );
        for (line, reason) in &summary.rejected {
            println!("- skipped line {line}: {reason}");
        }
        return Ok(());
    }

    let session = RiskSession::load(store, config)
        .await
        .context("failed to load check-in history")?;

    match cli.command {
        Commands::InitDb | Commands::Import { .. } => {}
        Commands::Seed => {
            db::seed(&session).await?;
            println!("Seed data inserted for {}.", session.namespace());
        }
        Commands::Submit {
            week,
            date,
            headache,
            swelling,
            sleep_quality,
            fatigue,
            mood,
            dizziness,
            systolic,
            diastolic,
        } => {
            let input = CheckInInput {
                week: Some(week),
                date: Some(date),
                headache: Some(headache),
                swelling: Some(swelling),
                sleep_quality: Some(sleep_quality),
                fatigue: Some(fatigue),
                mood: Some(mood),
                dizziness: Some(dizziness),
                systolic: Some(systolic),
                diastolic: Some(diastolic),
            };
            let assessment = session.submit_check_in(&input).await?;
            println!(
                "Week {}: {} risk (score {:.0}, blood pressure {}).",
                assessment.week,
                assessment.overall_level,
                assessment.numeric_risk_score,
                assessment.bp_band.as_str()
            );
            for action in &assessment.actions {
                println!("- [{}] {}", action.action_type, action.description);
            }
        }
        Commands::Journal { text, emoji } => {
            let entry = session
                .submit_daily_check_in(&DailyInput {
                    text,
                    emoji,
                    date: None,
                })
                .await?;
            println!(
                "Recorded {} entry (score {:.2}).",
                entry.sentiment, entry.sentiment_score
            );
            if entry.emoji_mismatch {
                println!("The mood you picked and what you wrote point in different directions.");
            }
            let alert = session.safety_alert().await;
            if alert.has_alert {
                println!(
                    "{} low entries in a row. Consider reaching out to your care team or someone you trust.",
                    alert.streak_count
                );
            }
        }
        Commands::Trajectory => {
            let trajectory = session.trajectory().await;
            if trajectory.is_empty() {
                println!("No check-ins recorded yet.");
                return Ok(());
            }
            println!("Risk trajectory:");
            for point in &trajectory {
                println!(
                    "- week {}: {} ({:.0})",
                    point.week, point.level, point.numeric_risk_score
                );
            }
        }
        Commands::Summary { out } => match out {
            Some(out) => {
                let report = session.build_report().await;
                std::fs::write(&out, report)
                    .with_context(|| format!("failed to write {}", out.display()))?;
                println!("Report written to {}.", out.display());
            }
            None => match session.get_doctor_summary().await {
                Some(summary) => print!("{summary}"),
                None => println!("No check-ins recorded yet."),
            },
        },
        Commands::Streak => {
            let alert = session.safety_alert().await;
            println!(
                "Negative streak: {} (alert: {}).",
                alert.streak_count,
                if alert.has_alert { "yes" } else { "no" }
            );
            for entry in &alert.recent_negative {
                println!("- {} {}", entry.date.format("%Y-%m-%d"), entry.emoji);
            }
        }
        Commands::Clear => {
            session.clear_history().await?;
            println!("History cleared for {}.", session.namespace());
        }
    }

    Ok(())
}
