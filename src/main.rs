//! Orderdesk - B2B ordering backend
//!
//! Serves the ordering API and bootstraps user accounts.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::net::SocketAddr;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use orderdesk_api::{ApiServer, ApiServerConfig};
use orderdesk_db::entities::user_group::Group;

/// Orderdesk - ordering backend for suppliers, products and customer orders
#[derive(Parser, Debug)]
#[command(name = "orderdesk")]
#[command(about = "Orderdesk - B2B ordering backend")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API server
    #[command(long_about = r#"
Run the ordering API. Migrations are applied on startup.

EXAMPLES:
  # SQLite file next to the binary
  orderdesk serve --jwt-secret "change-me"

  # PostgreSQL
  orderdesk serve --database-url postgres://orderdesk:pw@localhost/orderdesk \
    --jwt-secret "$SECRET" --bind 0.0.0.0:8080

ENVIRONMENT VARIABLES:
  ORDERDESK_BIND          Address to listen on
  ORDERDESK_DATABASE_URL  Database connection URL
  ORDERDESK_JWT_SECRET    Secret for signing session tokens
    "#)]
    Serve {
        /// Address to listen on
        #[arg(long, env = "ORDERDESK_BIND", default_value = "127.0.0.1:8080")]
        bind: SocketAddr,

        /// Database URL (sqlite:// or postgres://)
        #[arg(
            long,
            env = "ORDERDESK_DATABASE_URL",
            default_value = "sqlite://./orderdesk.db?mode=rwc"
        )]
        database_url: String,

        /// Secret for signing session tokens
        #[arg(long, env = "ORDERDESK_JWT_SECRET")]
        jwt_secret: String,

        /// Session token lifetime in hours
        #[arg(long, default_value = "24", value_parser = clap::value_parser!(i64).range(1..=8760))]
        session_hours: i64,

        /// Per-request timeout in seconds
        #[arg(long, default_value = "30")]
        request_timeout_secs: u64,

        /// Allowed CORS origin (repeatable; localhost origins when omitted)
        #[arg(long = "cors-origin")]
        cors_origins: Vec<String>,
    },

    /// Create a user account, e.g. the first employee
    CreateUser {
        #[arg(long)]
        username: String,

        #[arg(long)]
        password: String,

        /// Group membership (repeatable)
        #[arg(long = "group", value_enum)]
        groups: Vec<GroupArg>,

        /// Database URL (sqlite:// or postgres://)
        #[arg(
            long,
            env = "ORDERDESK_DATABASE_URL",
            default_value = "sqlite://./orderdesk.db?mode=rwc"
        )]
        database_url: String,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum GroupArg {
    Employee,
    Customer,
}

impl From<GroupArg> for Group {
    fn from(arg: GroupArg) -> Self {
        match arg {
            GroupArg::Employee => Group::Employee,
            GroupArg::Customer => Group::Customer,
        }
    }
}

fn setup_logging(verbose: bool) {
    let log_level = if verbose { "debug" } else { "info" };

    // RUST_LOG wins over --verbose
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(false))
        .with(filter)
        .init();
}

async fn open_database(database_url: &str) -> Result<sea_orm::DatabaseConnection> {
    let db = orderdesk_db::connect(database_url)
        .await
        .with_context(|| format!("Failed to connect to database at {}", database_url))?;
    orderdesk_db::migrate(&db)
        .await
        .context("Failed to run database migrations")?;
    Ok(db)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    match cli.command {
        Commands::Serve {
            bind,
            database_url,
            jwt_secret,
            session_hours,
            request_timeout_secs,
            cors_origins,
        } => {
            info!("Orderdesk starting...");

            let db = open_database(&database_url).await?;

            let config = ApiServerConfig {
                session_hours,
                request_timeout: Duration::from_secs(request_timeout_secs),
                cors_origins,
                ..ApiServerConfig::new(bind, jwt_secret)
            };

            ApiServer::new(config, db)
                .start()
                .await
                .context("API server failed")?;
        }
        Commands::CreateUser {
            username,
            password,
            groups,
            database_url,
        } => {
            orderdesk_auth::check_password_policy(&password)?;

            let db = open_database(&database_url).await?;

            if orderdesk_db::users::find_by_username(&db, &username)
                .await?
                .is_some()
            {
                anyhow::bail!("User '{}' already exists", username);
            }

            let password_hash = orderdesk_auth::hash_password(&password)?;
            let groups: Vec<Group> = groups.into_iter().map(Group::from).collect();

            let user = orderdesk_db::users::create_user(&db, &username, &password_hash, &groups)
                .await
                .context("Failed to create user")?;

            info!("Created user '{}' with id {}", user.username, user.id);
        }
    }

    Ok(())
}
