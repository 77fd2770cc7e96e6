use chrono::{DateTime, NaiveDate, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::models::catalog::Priority;

#[derive(Debug, Display, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum NotificationChannel {
    #[default]
    #[display("push")]
    #[serde(rename = "push")]
    Push,
    #[display("sms")]
    #[serde(rename = "sms")]
    Sms,
    #[display("email")]
    #[serde(rename = "email")]
    Email,
    #[display("whatsapp")]
    #[serde(rename = "whatsapp")]
    WhatsApp,
}

impl FromStr for NotificationChannel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "push" => Ok(NotificationChannel::Push),
            "sms" => Ok(NotificationChannel::Sms),
            "email" => Ok(NotificationChannel::Email),
            "whatsapp" => Ok(NotificationChannel::WhatsApp),
            other => anyhow::bail!("unknown notification channel: {other}"),
        }
    }
}

/// Audit row of a (pet, code) notification. It is written as a `pending`
/// claim before the send and confirmed as `sent` after it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationDedupRecord {
    pub pet_id: i64,
    pub event_code: String,
    pub fired_at: DateTime<Utc>,
}

#[derive(Debug, Display, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum DedupStatus {
    #[default]
    #[display("pending")]
    #[serde(rename = "pending")]
    Pending,
    #[display("sent")]
    #[serde(rename = "sent")]
    Sent,
}

/// Lookback rules of the dedup log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DedupWindow {
    /// `sent` records younger than this suppress the notification.
    pub within_hours: u32,
    /// `pending` claims younger than this are honored. Older ones were left by
    /// an interrupted run and count as absent.
    pub claim_ttl_secs: u32,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Notification {
    pub pet_id: i64,
    pub user_app_id: i64,
    pub event_code: String,
    pub title: String,
    pub message: String,
    pub priority: Priority,
    pub channel: NotificationChannel,
    pub due_date: NaiveDate,
}

/// Counters of one scheduler run.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct RunReport {
    pub processed: usize,
    pub notifications_sent: usize,
    pub errors: usize,
    pub duplicates_suppressed: usize,
}

impl std::ops::AddAssign for RunReport {
    fn add_assign(&mut self, other: Self) {
        self.processed += other.processed;
        self.notifications_sent += other.notifications_sent;
        self.errors += other.errors;
        self.duplicates_suppressed += other.duplicates_suppressed;
    }
}
