use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use strivex::api::{self, middleware::SecurityConfig};
use strivex::config::Settings;
use strivex::db::Database;
use strivex_core::models::{DayOfWeek, TodaysQuest, REST};
use strivex_core::{Engine, SystemClock};

#[derive(Parser)]
#[command(name = "strivex")]
#[command(about = "Quest-style fitness progression: XP, levels and daily workouts")]
struct Cli {
    /// SQLite database file (overrides config and STRIVEX_DB)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the local HTTP API
    Serve {
        /// Port for HTTP API
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Show level, XP and rank
    Profile,
    /// Show today's quest
    Today,
    /// Complete an exercise from a category's list
    Complete { category: String, index: usize },
    /// Grant one-time bonus XP
    Bonus {
        amount: u64,
        #[arg(short, long, default_value = "manual bonus")]
        reason: String,
    },
    /// Show or edit the weekly plan
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },
    /// Log one glass of water
    Hydrate,
    /// Delete all stored data
    Reset,
    /// Print the effective settings
    Config {
        /// Write them to the config file
        #[arg(long)]
        save: bool,
    },
}

#[derive(Subcommand)]
enum PlanCommands {
    /// Print the weekly plan
    Show,
    /// Assign a category to a day (0 = Sunday ... 6 = Saturday)
    Set { day: u8, category: String },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(std::env::var("RUST_LOG").unwrap_or_else(
        |_| "strivex=debug,strivex_core=debug,tower_http=debug".into(),
    ));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn open_engine(settings: &Settings) -> anyhow::Result<Engine<Database>> {
    let db = Database::open(settings.database_path()?)?;
    db.migrate()?;
    Ok(Engine::new(Arc::new(db), Arc::new(SystemClock)))
}

async fn serve(settings: Settings) -> anyhow::Result<()> {
    let engine = open_engine(&settings)?;
    let app = api::create_router(engine, SecurityConfig::from_settings(&settings));

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", settings.port)).await?;
    tracing::info!(
        "StriveX server listening on http://127.0.0.1:{}",
        settings.port
    );

    axum::serve(listener, app).await?;
    Ok(())
}

fn print_quest(quest: &TodaysQuest) {
    println!("{} ({})", quest.day, quest.date);
    let Some(category) = &quest.category else {
        println!("Rest day. Recover well, hunter.");
        return;
    };

    println!("Quest: {}", category);
    for entry in &quest.exercises {
        let mark = if entry.completed { "x" } else { " " };
        println!(
            "  [{}] {}. {} {}x{}",
            mark, entry.index, entry.exercise.name, entry.exercise.sets, entry.exercise.reps
        );
    }
    println!("{} remaining", quest.remaining());
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let mut settings = Settings::load();
    if let Some(db) = cli.db {
        settings.database_path = Some(db);
    }

    match cli.command {
        Some(Commands::Serve { port }) => {
            if let Some(port) = port {
                settings.port = port;
            }
            serve(settings).await?;
        }
        None => serve(settings).await?,
        Some(Commands::Profile) => {
            let view = open_engine(&settings)?.profile_view().await?;
            let profile = &view.profile;
            if let Some(name) = profile.name() {
                println!("Hunter {}", name);
            }
            println!("Level {} (rank {})", profile.level, view.rank);
            println!(
                "XP {}/{} ({:.0}%), lifetime {}",
                profile.xp, profile.next_level_xp, view.progress_percent, profile.total_xp
            );
        }
        Some(Commands::Today) => {
            let quest = open_engine(&settings)?.todays_quest().await?;
            print_quest(&quest);
        }
        Some(Commands::Complete { category, index }) => {
            let outcome = open_engine(&settings)?
                .complete_quest(&category, index)
                .await?;
            println!("{}", outcome.message());
        }
        Some(Commands::Bonus { amount, reason }) => {
            let award = open_engine(&settings)?
                .progression
                .grant_bonus_xp(amount, &reason)
                .await?;
            println!("{}", award.message());
        }
        Some(Commands::Plan { command }) => {
            let engine = open_engine(&settings)?;
            let plan = match command {
                PlanCommands::Show => engine.plan.plan().await?,
                PlanCommands::Set { day, category } => {
                    let day = DayOfWeek::new(day)
                        .ok_or_else(|| anyhow::anyhow!("Day must be 0-6, got {}", day))?;
                    engine.plan.set_day(day, Some(&category)).await?
                }
            };
            for (day, category) in plan.week() {
                println!("{:<10} {}", day.name(), category.unwrap_or(REST));
            }
        }
        Some(Commands::Hydrate) => {
            let outcome = open_engine(&settings)?.hydration.tap().await?;
            println!("Hydration {}% (streak {})", outcome.level, outcome.streak);
            if let Some(bonus) = outcome.bonus {
                println!("Hydration streak complete! {}", bonus.message());
            }
        }
        Some(Commands::Reset) => {
            open_engine(&settings)?.progression.reset().await?;
            println!("All hunter data cleared.");
        }
        Some(Commands::Config { save }) => {
            println!("{}", serde_json::to_string_pretty(&settings)?);
            if save {
                settings.save()?;
                println!("Settings saved.");
            }
        }
    }

    Ok(())
}
