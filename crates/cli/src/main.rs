//! LearnCoach CLI: the main entry point.
//!
//! Commands:
//! - `serve`  : Start the HTTP gateway
//! - `chat`   : Run one tutoring turn locally
//! - `config` : Print the effective (or default) configuration

use clap::{Parser, Subcommand};
use learncoach_config::AppConfig;
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "learncoach",
    about = "Multi-agent Python tutoring backend",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file to use instead of ~/.learncoach/config.toml
    #[arg(short, long, global = true, env = "LEARNCOACH_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,

        /// Override the bind address
        #[arg(long)]
        host: Option<String>,
    },

    /// Send one message through the router and print the reply
    Chat {
        /// The student's message
        #[arg(short, long)]
        message: String,

        /// User id whose context the turn belongs to
        #[arg(short, long)]
        user: Option<String>,

        /// Skip routing and use this agent
        #[arg(short, long)]
        agent: Option<String>,
    },

    /// Print the configuration as TOML
    Config {
        /// Print built-in defaults instead of the effective configuration
        #[arg(long)]
        default: bool,
    },
}

/// Filter used when `RUST_LOG` is unset.
fn default_directive(verbose: bool, log_level: &str) -> &str {
    if verbose { "debug" } else { log_level }
}

fn init_tracing(directive: &str, json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(directive));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(
    path: Option<&std::path::Path>,
) -> Result<AppConfig, learncoach_config::ConfigError> {
    match path {
        Some(path) => AppConfig::load_with_env(path),
        None => AppConfig::load(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref());
    let log_level = config.as_ref().map(|c| c.log_level.as_str()).unwrap_or("info");
    init_tracing(default_directive(cli.verbose, log_level), cli.json_logs);

    match cli.command {
        Commands::Config { default: true } => commands::config_cmd::show_default(),
        Commands::Config { default: false } => commands::config_cmd::show(&config?)?,
        Commands::Serve { port, host } => commands::serve::run(config?, port, host).await?,
        Commands::Chat {
            message,
            user,
            agent,
        } => commands::chat::run(config?, message, user, agent).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn verbose_forces_debug() {
        assert_eq!(default_directive(true, "warn"), "debug");
        assert_eq!(default_directive(false, "warn"), "warn");
    }

    #[test]
    fn parses_chat_arguments() {
        let cli = Cli::try_parse_from([
            "learncoach",
            "chat",
            "-m",
            "explain loops",
            "--user",
            "u1",
            "--agent",
            "teaching",
            "--json-logs",
        ])
        .unwrap();
        assert!(cli.json_logs);
        match cli.command {
            Commands::Chat { message, user, agent } => {
                assert_eq!(message, "explain loops");
                assert_eq!(user.as_deref(), Some("u1"));
                assert_eq!(agent.as_deref(), Some("teaching"));
            }
            _ => panic!("expected chat command"),
        }
    }

    #[test]
    fn parses_serve_overrides() {
        let cli =
            Cli::try_parse_from(["learncoach", "serve", "--port", "9000", "--host", "127.0.0.1"])
                .unwrap();
        match cli.command {
            Commands::Serve { port, host } => {
                assert_eq!(port, Some(9000));
                assert_eq!(host.as_deref(), Some("127.0.0.1"));
            }
            _ => panic!("expected serve command"),
        }
    }
}
