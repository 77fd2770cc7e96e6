//! Scheduler configuration read from the environment.
//!
//! # Security Notes
//! - `INTERNAL_API_SECRET` and `LOGFIRE_TOKEN` are sensitive and never logged

use anyhow::anyhow;
use envconfig::Envconfig;
use std::time::Duration;

use crate::{api::scheduler::SchedulerSettings, consts, models::notification::NotificationChannel};

#[derive(Envconfig, Clone)]
pub struct AppConfig {
    /// Environment name (NON-SENSITIVE)
    /// Values: "local", "dev", "staging", "prod"
    #[envconfig(default = "local")]
    pub env: String,

    /// Database host value (NON-SENSITIVE)
    /// Example: "sqlite:data/app.db"
    pub db_host: String,

    /// Catalog override file. The built-in catalog is used when unset.
    pub catalog_path: Option<String>,

    /// Lookback for the (pet, event) dedup check, in hours
    #[envconfig(default = "24")]
    pub dedup_window_hours: u32,

    /// Pets processed at the same time in a run
    #[envconfig(default = "4")]
    pub max_concurrent_pets: usize,

    /// Timeout for every record store and notification call, in seconds
    #[envconfig(default = "10")]
    pub io_timeout_secs: u64,

    /// Seconds a pending dedup claim blocks other runs. Must outlast a run.
    #[envconfig(default = "3600")]
    pub claim_ttl_secs: u64,

    /// Values: "push", "sms", "email", "whatsapp"
    #[envconfig(default = "push")]
    pub notification_channel: String,

    /// IANA timezone used to decide what "today" is
    /// Example: "America/Mexico_City"
    #[envconfig(default = "UTC")]
    pub scheduler_timezone: String,

    /// Base url of the web app internal API (NON-SENSITIVE)
    pub web_app_api_url: String,

    /// 🔒 SENSITIVE: shared secret sent in the X-Internal-Secret header
    pub internal_api_secret: String,

    /// 🔒 SENSITIVE: Logfire write token. Plain stdout logging when unset.
    pub logfire_token: Option<String>,
}

impl AppConfig {
    pub fn is_prod(&self) -> bool {
        self.env.to_lowercase() == "prod"
    }

    pub fn scheduler_settings(&self) -> anyhow::Result<SchedulerSettings> {
        let timezone = self
            .scheduler_timezone
            .parse::<chrono_tz::Tz>()
            .map_err(|e| anyhow!("invalid scheduler timezone {}: {e}", self.scheduler_timezone))?;

        Ok(SchedulerSettings {
            dedup_window_hours: self.dedup_window_hours,
            fire_tolerance_days: consts::FIRE_TOLERANCE_DAYS,
            max_concurrent_pets: self.max_concurrent_pets.max(1),
            io_timeout: Duration::from_secs(self.io_timeout_secs),
            claim_ttl: Duration::from_secs(self.claim_ttl_secs.max(self.io_timeout_secs)),
            channel: self.notification_channel.parse::<NotificationChannel>()?,
            timezone,
        })
    }
}
