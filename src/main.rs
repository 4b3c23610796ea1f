use std::process::ExitCode;

use cdn_admin::access::AccessGate;
use cdn_admin::config::{ServeArgs, ServerConfig};
use cdn_admin::error::{AdminError, Result};
use cdn_admin::files::FileManager;
use cdn_admin::server::{self, session, AppState};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const MAX_TTL_HOURS: i64 = 24 * 365 * 10;

#[derive(Parser)]
#[command(name = "cdn-admin")]
#[command(about = "Administration API for a CDN-fronted object storage bucket")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API server
    Serve(ServeArgs),
    /// Mint a session token for an email address
    Token {
        #[arg(long)]
        email: String,
        #[arg(long, env = "SESSION_SECRET", hide_env_values = true)]
        secret: String,
        /// Token lifetime in hours (at most ten years)
        #[arg(
            long,
            default_value_t = 24 * 7,
            value_parser = clap::value_parser!(i64).range(1..=MAX_TTL_HOURS)
        )]
        ttl_hours: i64,
    },
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Serve(args) => {
            let config = ServerConfig::from_args(args)?;
            let store = config.build_store()?;
            info!(
                store = store.name(),
                cdn = %config.cdn_domain,
                "Object store ready"
            );

            let files = FileManager::new(
                store,
                AccessGate::new(config.allowed_email.clone()),
                config.cdn_domain.clone(),
            );
            let state = AppState {
                files,
                session_secret: config.session_secret.clone(),
            };

            server::serve(state, &config.bind).await
        }
        Commands::Token {
            email,
            secret,
            ttl_hours,
        } => {
            let ttl = chrono::Duration::try_hours(ttl_hours).ok_or_else(|| {
                AdminError::Config(format!("--ttl-hours {ttl_hours} is out of range"))
            })?;
            let token = session::issue_token(&email, &secret, ttl)?;
            println!("{token}");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_hours_bounds() {
        let parse = |ttl: &str| {
            Cli::try_parse_from([
                "cdn-admin", "token", "--email", "a@b.c", "--secret", "s", "--ttl-hours", ttl,
            ])
        };
        assert!(parse("1").is_ok());
        assert!(parse("0").is_err());
        assert!(parse("-1000000").is_err());
        assert!(parse("87601").is_err());
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "cdn-admin failed");
            ExitCode::FAILURE
        }
    }
}
