use std::fmt;

use anyhow::Context;
use app::config::{Config, prepare_sqlite_file};
use app::{AppState, router, telemetry};
use services::{AppServices, Clock};
use tracing::info;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    InvalidDbUrl { raw: String },
    InvalidAddr { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidAddr { raw } => write!(f, "invalid --addr value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  quiz-server serve [--db <sqlite_url>] [--addr <host:port>]");
    eprintln!("  quiz-server seed  [--db <sqlite_url>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db   sqlite://quiz.sqlite3");
    eprintln!("  --addr 0.0.0.0:8000");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DB_URL, QUIZ_BIND_ADDR, QUIZ_ADMIN_KEY, QUIZ_STALE_AFTER_HOURS, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Serve,
    Seed,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "serve" => Some(Self::Serve),
            "seed" => Some(Self::Seed),
            _ => None,
        }
    }
}

enum Parsed {
    Run(Command, Config),
    Help,
}

fn parse_args(
    argv: Vec<String>,
    mut config: Config,
) -> Result<Parsed, Box<dyn std::error::Error + Send + Sync>> {
    let mut args = argv.into_iter().peekable();

    // No subcommand (or only flags) means serve.
    let first = args.peek().cloned();
    let cmd = match first.as_deref() {
        None => Command::Serve,
        Some("--help" | "-h") => return Ok(Parsed::Help),
        Some(first) if first.starts_with("--") => Command::Serve,
        Some(first) => {
            let cmd = Command::from_arg(first)
                .ok_or_else(|| ArgsError::UnknownCommand(first.to_owned()))?;
            args.next();
            cmd
        }
    };

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--db" => {
                let value = require_value(&mut args, "--db")?;
                if value.trim().is_empty() {
                    return Err(ArgsError::InvalidDbUrl { raw: value }.into());
                }
                config.set_db_url(value);
            }
            "--addr" if cmd == Command::Serve => {
                let value = require_value(&mut args, "--addr")?;
                config
                    .set_bind_addr(value.clone())
                    .map_err(|_| ArgsError::InvalidAddr { raw: value })?;
            }
            "--help" | "-h" => return Ok(Parsed::Help),
            _ => return Err(ArgsError::UnknownArg(arg).into()),
        }
    }

    Ok(Parsed::Run(cmd, config))
}

async fn serve(config: Config, services: AppServices) -> anyhow::Result<()> {
    let state = AppState::new(services, &config);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;
    info!(addr = %config.bind_addr, "quiz server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Failed to serve application")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
    info!("shutting down");
}

async fn run() -> anyhow::Result<()> {
    let config = Config::from_env().context("Invalid configuration")?;
    let argv: Vec<String> = std::env::args().skip(1).collect();

    let (cmd, config) = match parse_args(argv, config) {
        Ok(Parsed::Run(cmd, config)) => (cmd, config),
        Ok(Parsed::Help) => {
            print_usage();
            return Ok(());
        }
        Err(err) => {
            eprintln!("{err}");
            print_usage();
            return Err(anyhow::anyhow!("{err}"));
        }
    };

    prepare_sqlite_file(&config.db_url)?;
    let services = AppServices::new_sqlite(&config.db_url, Clock::default())
        .await
        .with_context(|| format!("Failed to open database {}", config.db_url))?;

    match cmd {
        Command::Serve => serve(config, services).await,
        Command::Seed => {
            let outcome = services.maintenance().seed_demo_data().await?;
            if outcome.seeded {
                info!(sessions = outcome.sessions, "seeded demo sessions");
            } else {
                info!("demo sessions already present; nothing to do");
            }
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    telemetry::init();
    if let Err(err) = run().await {
        tracing::error!("{err:#}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config::from_lookup(|_| None).unwrap()
    }

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn defaults_to_serve() {
        assert!(matches!(
            parse_args(args(&[]), config()).unwrap(),
            Parsed::Run(Command::Serve, _)
        ));
        assert!(matches!(
            parse_args(args(&["--addr", "127.0.0.1:3000"]), config()).unwrap(),
            Parsed::Run(Command::Serve, cfg) if cfg.bind_addr.port() == 3000
        ));
    }

    #[test]
    fn seed_accepts_db_only() {
        match parse_args(args(&["seed", "--db", "sqlite::memory:"]), config()).unwrap() {
            Parsed::Run(Command::Seed, cfg) => assert_eq!(cfg.db_url, "sqlite::memory:"),
            _ => panic!("expected seed"),
        }
        assert!(parse_args(args(&["seed", "--addr", "127.0.0.1:1"]), config()).is_err());
    }

    #[test]
    fn rejects_unknown_input() {
        assert!(parse_args(args(&["launch"]), config()).is_err());
        assert!(parse_args(args(&["serve", "--verbose"]), config()).is_err());
        assert!(parse_args(args(&["serve", "--db"]), config()).is_err());
        assert!(matches!(
            parse_args(args(&["-h"]), config()).unwrap(),
            Parsed::Help
        ));
    }
}
