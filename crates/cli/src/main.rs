mod doctor_commands;
mod run_commands;

use {
    clap::{Parser, Subcommand, ValueEnum},
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "printrelay", about = "Print files sent to a Telegram bot")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    #[arg(long, global = true, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Log output format.
    #[arg(long, global = true, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot (default when no subcommand is provided).
    Run,
    /// Check configuration and the external tools printing depends on.
    Doctor,
}

impl Cli {
    fn json_logs(&self) -> bool {
        self.json_logs || self.log_format == LogFormat::Json
    }
}

/// Build the log filter: `RUST_LOG`, then the configured level, then `info`.
fn log_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

fn init_telemetry(cli: &Cli) {
    let registry = tracing_subscriber::registry().with(log_filter(&cli.log_level));

    if cli.json_logs() {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "printrelay starting");

    match cli.command {
        None | Some(Commands::Run) => run_commands::handle_run().await,
        Some(Commands::Doctor) => doctor_commands::handle_doctor().await,
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_run() {
        let cli = Cli::try_parse_from(["printrelay"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.log_level, "info");
        assert!(!cli.json_logs());
    }

    #[test]
    fn json_format_from_either_flag() {
        let cli = Cli::try_parse_from(["printrelay", "--json-logs"]).unwrap();
        assert!(cli.json_logs());
        let cli = Cli::try_parse_from(["printrelay", "doctor", "--log-format", "json"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Doctor)));
        assert!(cli.json_logs());
    }

    #[test]
    fn unknown_format_is_rejected() {
        assert!(Cli::try_parse_from(["printrelay", "--log-format", "xml"]).is_err());
    }
}
