use anyhow::Context;
use chrono::Utc;
use clap::{Args, Parser, Subcommand};

use crate::{
    api::{overview, scheduler},
    config::AppConfig,
    models::catalog::Catalog,
    repo::{PetSource, RecordStore, sqlite::SqlxSqliteRepo},
    services::notification::NotificationHandler,
    utils,
};

#[derive(Args, Debug, Clone)]
pub struct RunMigrationsArgs {
    /// Sql file to apply. The built-in schema is applied when omitted.
    #[arg(short, long)]
    file: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ShowScheduleArgs {
    #[arg(short, long)]
    pet_id: i64,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Action {
    /// Runs one scheduling pass over every pet
    RunScheduler,
    RunMigrations(RunMigrationsArgs),
    /// Prints the computed lifecycle, events and vaccines of one pet
    ShowSchedule(ShowScheduleArgs),
}

/// Pet health lifecycle and reminder scheduler
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct AppArgs {
    #[command(subcommand)]
    pub action: Action,
}

/// Everything a subcommand may need, built once in `main`.
pub struct AppContext {
    pub config: AppConfig,
    pub repo: SqlxSqliteRepo,
    pub catalog: Catalog,
}

impl AppArgs {
    pub async fn run(&self, ctx: AppContext) -> anyhow::Result<()> {
        match &self.action {
            Action::RunScheduler => run_scheduler(ctx).await,
            Action::RunMigrations(RunMigrationsArgs { file }) => match file {
                Some(file) => utils::run_migrations(&ctx.repo.db_pool, file).await,
                None => ctx.repo.create_schema().await,
            },
            Action::ShowSchedule(ShowScheduleArgs { pet_id }) => show_schedule(ctx, *pet_id).await,
        }
    }
}

async fn run_scheduler(ctx: AppContext) -> anyhow::Result<()> {
    let settings = ctx.config.scheduler_settings()?;
    let sender = NotificationHandler {
        client: reqwest::Client::builder().timeout(settings.io_timeout).build()?,
        web_app_api_url: ctx.config.web_app_api_url.clone(),
        internal_api_secret: ctx.config.internal_api_secret.clone(),
    };

    let notification_scheduler = scheduler::NotificationScheduler {
        pet_source: Box::new(ctx.repo.clone()),
        record_store: Box::new(ctx.repo),
        sender: Box::new(sender),
        catalog: ctx.catalog,
        settings,
    };

    // ctrl-c stops new claims; notifications already in flight finish or are released
    let (cancel_tx, cancel) = tokio::sync::watch::channel(false);
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("cancelling scheduler run, pets not reached are left for the next run");
            cancel_tx.send_replace(true);
        }
    });

    let report = notification_scheduler
        .run_until_cancelled(Utc::now(), cancel)
        .await;
    ctrl_c.abort();

    println!("{}", serde_json::to_string_pretty(&report?)?);
    Ok(())
}

async fn show_schedule(ctx: AppContext, pet_id: i64) -> anyhow::Result<()> {
    let settings = ctx.config.scheduler_settings()?;
    let today = Utc::now().with_timezone(&settings.timezone).date_naive();

    let pet = ctx
        .repo
        .get_pet_by_id(pet_id)
        .await?
        .with_context(|| format!("pet {pet_id} not found"))?;
    let records = ctx.repo.get_vaccination_records(pet_id).await?;

    match overview::build_pet_overview(&pet, &records, &ctx.catalog, today)? {
        Some(pet_overview) => println!("{}", serde_json::to_string_pretty(&pet_overview)?),
        None => println!("pet {pet_id} has no species or birthday, nothing to schedule"),
    }

    Ok(())
}
