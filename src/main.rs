mod cli;
mod core;

use clap::{Parser, Subcommand};

use crate::cli::output::{detect_color, OutputFormat, OutputOptions};
use crate::core::config::AppConfig;

#[derive(Parser)]
#[command(name = "nsync", about = "Today's nutrition from your health platform", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Output format (text|json)
    #[arg(short, long, global = true)]
    format: Option<String>,

    /// Shorthand for --format json
    #[arg(short = 'j', long = "json", global = true)]
    json: bool,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    no_color: bool,

    /// Verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Keep today's totals up to date until you quit
    Watch,
    /// Fetch today's totals once and exit
    Today,
    /// Log or show body weight
    Weight {
        #[command(subcommand)]
        action: WeightAction,
    },
    /// Log or show sleep times
    Sleep {
        #[command(subcommand)]
        action: SleepAction,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum WeightAction {
    /// Record a weight reading
    Log {
        value: String,
        /// Unit (kg|lbs)
        #[arg(short, long, default_value = "kg")]
        unit: String,
    },
    /// Show weight history
    Show,
}

#[derive(Subcommand)]
enum SleepAction {
    /// Record last night's sleep
    Log {
        /// Bedtime, e.g. "10:30 PM"
        #[arg(long)]
        sleep: String,
        /// Wake time, e.g. "6:45 AM"
        #[arg(long)]
        wake: String,
    },
    /// Show recent nights
    Show,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Generate default config file
    Init,
    /// Validate config file
    Check,
}

fn init_logging(verbose: bool) {
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if verbose {
            "nsync=debug".to_string()
        } else {
            "nsync=warn".to_string()
        }
    });
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(error = %e, "falling back to default config");
            AppConfig::default()
        }
    };

    let output_opts = OutputOptions {
        format: if cli.json {
            OutputFormat::Json
        } else {
            cli.format
                .as_deref()
                .or(Some(config.settings.default_format.as_str()))
                .and_then(OutputFormat::from_id)
                .unwrap_or(OutputFormat::Text)
        },
        pretty: cli.pretty,
        use_color: detect_color(!cli.no_color, &config.settings.color),
    };

    match cli.command {
        None | Some(Commands::Watch) => cli::watch_cmd::run(&config, &output_opts).await?,
        Some(Commands::Today) => cli::today_cmd::run(&config, &output_opts).await?,
        Some(Commands::Weight { action }) => match action {
            WeightAction::Log { value, unit } => {
                cli::body_cmd::log_weight(&value, &unit, &output_opts)?
            }
            WeightAction::Show => cli::body_cmd::show_weights(&output_opts)?,
        },
        Some(Commands::Sleep { action }) => match action {
            SleepAction::Log { sleep, wake } => {
                cli::body_cmd::log_sleep(&sleep, &wake, &output_opts)?
            }
            SleepAction::Show => cli::body_cmd::show_sleep(&output_opts)?,
        },
        Some(Commands::Config { action }) => match action {
            ConfigAction::Init => cli::config_cmd::init(&output_opts)?,
            ConfigAction::Check => cli::config_cmd::check(&output_opts)?,
        },
    }

    Ok(())
}
