//! robot-dashboard: remote control for BotVS-hosted trading robots.
//!
//! Single-binary Tokio application that:
//! 1. Reports the user's robots (profit, running state)
//! 2. Starts / restarts and stops robots on the main strategy
//! 3. Runs one-shot hub plugins (market, buy, sell, cancel, balance)
//! 4. Lists the platform exchange catalog and registered exchanges

mod config;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info};

use botvs_client::{BotvsAuth, CallOptions, HttpTransport, RpcClient, Transport};
use common::{DashboardConfig, Error};
use robot_ops::{
    app_id_for, CredentialStore, ExchangeCatalog, HubAction, InMemoryCredentials, RobotOps,
};

/// BotVS robot dashboard
#[derive(Parser)]
#[command(name = "robot-dashboard", about = "Remote control for BotVS trading robots")]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show robot id, profit and whether a robot is running.
    Status,
    /// Start a robot on the main strategy (restarts the existing one).
    Run,
    /// Stop all of the user's robots.
    Stop,
    /// List strategies on the platform account.
    Strategies,
    /// Print the exchange catalog.
    Exchanges {
        /// Refetch instead of using the loaded catalog.
        #[arg(long)]
        refresh: bool,
    },
    /// List registered exchanges the catalog knows.
    Platforms,
    /// Run a hub action (market, buy, sell, cancel, balance) on one exchange.
    Hub {
        action: String,
        /// Registered exchange id.
        #[arg(long)]
        pid: i64,
        /// `<exchange>.<pair>`; defaults to the exchange's first pair.
        #[arg(long)]
        symbol: Option<String>,
        /// JSON array of action arguments.
        #[arg(long, default_value = "[]")]
        args: String,
    },
    /// Issue a raw RPC call and print the envelope.
    Call {
        method: String,
        /// JSON array of positional arguments.
        #[arg(long, default_value = "[]")]
        args: String,
        /// Serve from / store in the result cache.
        #[arg(long)]
        cache: bool,
    },
}

struct App {
    cfg: DashboardConfig,
    ops: RobotOps,
    credentials: InMemoryCredentials,
}

impl App {
    fn new(cfg: DashboardConfig) -> Result<Self, Error> {
        let auth = BotvsAuth::new(&cfg.access_key, &cfg.secret_key)?;
        let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(cfg.request_timeout()));
        let rpc = RpcClient::new(auth, Arc::clone(&transport), &cfg.api_url);
        let catalog = Arc::new(ExchangeCatalog::new(transport, &cfg.symbols_url));
        let credentials = InMemoryCredentials::seeded(cfg.user_id, cfg.exchanges.clone());

        Ok(Self {
            ops: RobotOps::new(rpc, catalog, cfg.cache_ttl()),
            credentials,
            cfg,
        })
    }

    fn app_id(&self) -> String {
        app_id_for(self.cfg.user_id)
    }

    async fn execute(&self, command: Command) -> Result<Value, Error> {
        match command {
            Command::Status => to_json(&self.ops.status(&self.app_id()).await?),
            Command::Run => {
                let app_id = self.app_id();
                let status = self.ops.status(&app_id).await?;
                let exchanges = self.credentials.list_for_user(self.cfg.user_id);
                if exchanges.is_empty() {
                    return Err(Error::InvalidArgument(
                        "no exchanges registered for this user".into(),
                    ));
                }
                self.ops
                    .robot_run(status.robot_id, &app_id, &exchanges)
                    .await
            }
            Command::Stop => self.ops.stop_all(&self.app_id()).await,
            Command::Strategies => to_json(&self.ops.strategy_list().await?),
            Command::Exchanges { refresh } => {
                to_json(&*self.ops.catalog().list(refresh).await?)
            }
            Command::Platforms => {
                let creds = self.credentials.list_for_user(self.cfg.user_id);
                to_json(&self.ops.hub_platforms(&creds).await?)
            }
            Command::Hub {
                action,
                pid,
                symbol,
                args,
            } => {
                let args = parse_args(&args)?;
                let action = HubAction::parse(&action, &args)?;
                let credential = self.credentials.get(self.cfg.user_id, pid)?;
                self.ops
                    .run_hub(&credential, symbol.as_deref(), &action)
                    .await
            }
            Command::Call {
                method,
                args,
                cache,
            } => {
                let args = parse_args(&args)?;
                let options = if cache {
                    CallOptions::cached(self.cfg.cache_ttl())
                } else {
                    CallOptions::live()
                };
                self.ops.rpc().call(&method, &args, options).await
            }
        }
    }
}

fn parse_args(raw: &str) -> Result<Vec<Value>, Error> {
    serde_json::from_str(raw)
        .map_err(|e| Error::InvalidArgument(format!("--args must be a JSON array: {e}")))
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<Value, Error> {
    Ok(serde_json::to_value(value)?)
}

#[tokio::main]
async fn main() {
    // Initialize logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "robot_dashboard=info,botvs_client=info,robot_ops=info".into()
            }),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Load configuration.
    let cfg = match config::load_config(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        "API: {} (timeout {}ms, cache ttl {}s), user {}, {} exchange(s) registered",
        cfg.api_url,
        cfg.request_timeout_ms,
        cfg.cache_ttl_secs,
        cfg.user_id,
        cfg.exchanges.len()
    );

    let app = match App::new(cfg) {
        Ok(app) => app,
        Err(e) => {
            error!("Startup error: {}", e);
            std::process::exit(1);
        }
    };

    match app.execute(cli.command).await {
        Ok(value) => match serde_json::to_string_pretty(&value) {
            Ok(out) => println!("{out}"),
            Err(e) => {
                error!("Failed to render output: {}", e);
                std::process::exit(1);
            }
        },
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    }
}
