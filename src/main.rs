//! # Pet Health Scheduler
//!
//! Operator entry point: runs the daily reminder pass, applies the schema
//! and prints the computed schedule of a pet.

use clap::Parser;
use envconfig::Envconfig;
use logfire::config::MetricsOptions;

use pet_health::{cli, config, logger, models, repo, utils};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::AppArgs::parse();
    let app_config = config::AppConfig::init_from_env()?;

    // Logfire when a token is configured, plain stdout otherwise
    let shutdown_handler = match &app_config.logfire_token {
        Some(token) => Some(
            logfire::configure()
                .install_panic_handler()
                .with_metrics(Some(MetricsOptions::default()))
                .send_to_logfire(logfire::config::SendToLogfire::Yes)
                .with_token(token)
                .finish()?,
        ),
        None => {
            logger::setup_simple_logger()?;
            if app_config.is_prod() {
                log::warn!("LOGFIRE_TOKEN is not set, scheduler metrics are not exported");
            }
            None
        }
    };

    let catalog = models::catalog::Catalog::load(app_config.catalog_path.as_deref())?;
    let sqlite_repo = repo::sqlite::SqlxSqliteRepo {
        db_pool: utils::setup_sqlite_db_pool(&app_config.db_host).await?,
    };

    let result = args
        .run(cli::AppContext {
            config: app_config,
            repo: sqlite_repo,
            catalog,
        })
        .await;

    if let Some(shutdown_handler) = shutdown_handler {
        shutdown_handler.shutdown()?;
    }

    result
}
