use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use reqwest::Method;
use std::time::Duration;
use tracing::info;
use user_service::smoke::{self, ProbeConfig};
use user_service::user_cli::{self, UserCli};
use user_service::{start_web_server, Settings};

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "usergate")]
#[command(about = "User API service with a CORS smoke check")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the user API server
    Serve,
    /// Send one cross-origin request at the server and log the outcome
    Smoke(SmokeArgs),
    /// Manage users directly in the database
    User(UserCli),
}

#[derive(Args)]
struct SmokeArgs {
    /// Target URL (defaults to USERGATE_SMOKE_URL)
    #[arg(long)]
    url: Option<String>,

    /// HTTP method to send
    #[arg(long, default_value = "GET")]
    method: String,

    /// Request timeout in seconds (transport default when omitted)
    #[arg(long)]
    timeout_secs: Option<u64>,
}

impl SmokeArgs {
    fn into_probe_config(self, settings: &Settings) -> Result<ProbeConfig> {
        let method = self
            .method
            .to_uppercase()
            .parse::<Method>()
            .map_err(|_| anyhow::anyhow!("Invalid HTTP method: {}", self.method))?;

        let mut config =
            ProbeConfig::new(self.url.unwrap_or_else(|| settings.smoke_url.clone()))
                .with_method(method);
        if let Some(secs) = self.timeout_secs {
            config = config.with_timeout(Duration::from_secs(secs));
        }

        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("user_service=info,usergate=info,rocket=warn")),
        )
        .init();

    let cli = Cli::parse();
    let settings = Settings::load()?;

    match cli.command {
        Command::Serve => {
            settings.ensure_directories().await?;
            start_web_server(settings).await
        }
        Command::Smoke(args) => {
            let config = args.into_probe_config(&settings)?;
            info!("Sending {} {}", config.method, config.endpoint);

            let outcome = smoke::run(&config).await?;
            smoke::report(&outcome);

            Ok(())
        }
        Command::User(user_args) => user_cli::handle_user_command(user_args).await,
    }
}
