//! Operator commands for Booker.
//!
//! - booker serve
//! - booker migrate
//! - booker users

use anyhow::Context;
use booker_app::Application;
use booker_kernel::{settings::Settings, InitCtx};
use clap::{Parser, Subcommand};

/// Booker - a personal author library service
#[derive(Parser, Debug)]
#[command(name = "booker")]
#[command(version, about, long_about = None)]
struct Cli {
    /// SQLite database path; overrides `database.path` from configuration
    #[arg(long, global = true)]
    database: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server until interrupted
    Serve,

    /// Apply pending migrations and exit
    Migrate,

    /// List registered users
    Users,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load().context("failed to load Booker settings")?;
    if let Some(path) = cli.database {
        settings.database.path = path;
    }
    booker_telemetry::init(&settings.telemetry);

    match cli.command {
        Command::Serve => serve(&settings).await,
        Command::Migrate => migrate(&settings),
        Command::Users => users(&settings),
    }
}

async fn serve(settings: &Settings) -> anyhow::Result<()> {
    let app = booker_app::bootstrap(settings).await?;
    app.registry.start_all(&InitCtx { settings }).await?;

    let served =
        booker_http::start_server(&app.registry, settings, booker_http::shutdown_signal()).await;

    app.registry.stop_all().await?;
    served
}

fn migrate(settings: &Settings) -> anyhow::Result<()> {
    let app = assemble(settings)?;
    let applied = app.migrate()?;
    println!("applied {applied} migration(s)");
    Ok(())
}

fn users(settings: &Settings) -> anyhow::Result<()> {
    let app = assemble(settings)?;
    app.migrate()?;

    let users = app
        .context
        .users
        .list()
        .context("failed to list users")?;
    if users.is_empty() {
        println!("no registered users");
        return Ok(());
    }
    for user in users {
        println!("{}\t{}\tadmin={}", user.public_id, user.name, user.admin);
    }
    Ok(())
}

fn assemble(settings: &Settings) -> anyhow::Result<Application> {
    let db = booker_app::open_database(settings)?;
    Application::assemble(db, settings)
}
