//! # Pet Health
//!
//! Lifecycle and scheduling engine for pet health reminders: age and stage
//! classification, health event and vaccine schedules, and the daily run that
//! turns them into notifications.

pub mod api;
pub mod cli;
pub mod config;
pub mod consts;
pub mod errors;
pub mod logger;
pub mod metric;
pub mod models;
pub mod repo;
pub mod services;
pub mod utils;
