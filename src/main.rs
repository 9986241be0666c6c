use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;

use wealthplan::api::{self, ProjectionArgs, RetirementArgs};
use wealthplan::core::InMemoryProfileRepository;

#[derive(Parser, Debug)]
#[command(
    name = "wealthplan",
    about = "Net worth, passive income and retirement corpus projections for advisory clients"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the JSON API
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
    /// Project a year-by-year net worth trajectory
    Project(ProjectionArgs),
    /// Solve the retirement corpus and required monthly savings
    Retire(RetirementArgs),
    /// Aggregate a client profile JSON file into a financial snapshot
    Snapshot {
        #[arg(long)]
        profile: PathBuf,
        #[arg(long, help = "Valuation date (YYYY-MM-DD), defaults to today")]
        as_of: Option<NaiveDate>,
    },
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Failed to encode output: {e}");
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let outcome = match cli.command {
        Command::Serve { port } => {
            let repository = Arc::new(InMemoryProfileRepository::new());
            api::run_http_server(port, repository)
                .await
                .map_err(|e| format!("Server error: {e}"))
        }
        Command::Project(args) => api::project_from_args(args)
            .map(|response| print_json(&response))
            .map_err(|e| e.to_string()),
        Command::Retire(args) => api::retire_from_args(args)
            .map(|plan| print_json(&plan))
            .map_err(|e| e.to_string()),
        Command::Snapshot { profile, as_of } => api::snapshot_from_file(&profile, as_of)
            .map(|response| print_json(&response))
            .map_err(|e| e.to_string()),
    };

    if let Err(msg) = outcome {
        log::error!("{msg}");
        std::process::exit(1);
    }
}
