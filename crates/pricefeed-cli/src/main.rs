mod run;
mod schedule;

use chrono::NaiveTime;
use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "pricefeed")]
#[command(about = "Scrape product listings and feed them to the price backend")]
struct Cli {
    /// Only log warnings and errors.
    #[arg(long, global = true)]
    silent: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run every source once, ignoring the run interval.
    Now,
    /// Run on a recurring daily schedule until interrupted.
    Schedule {
        /// Time of day (UTC, `HH:MM`); defaults to `PRICEFEED_SCHEDULE_TIME`.
        #[arg(value_parser = parse_time)]
        time: Option<NaiveTime>,

        /// Minimum whole days between runs of the same source.
        #[arg(long)]
        every_days: Option<u32>,
    },
}

fn parse_time(raw: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .map_err(|e| format!("expected HH:MM, got \"{raw}\": {e}"))
}

fn init_tracing(log_level: &str, silent: bool) -> anyhow::Result<()> {
    let env_filter = if silent {
        EnvFilter::try_new("warn")?
    } else {
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(log_level))?
    };
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = pricefeed_core::load_app_config_from_env()?;
    init_tracing(&config.log_level, cli.silent)?;

    match cli.command {
        Some(Commands::Now) => {
            run::run_once(&config).await?;
        }
        Some(Commands::Schedule { time, every_days }) => {
            let time = time.unwrap_or(config.schedule_time);
            let every_days = every_days.unwrap_or(config.run_interval_days);
            schedule::run_schedule(&config, time, every_days).await?;
        }
        None => {
            Cli::command().print_help()?;
            if cli.silent {
                run::run_once(&config).await?;
            }
        }
    }

    Ok(())
}
