//! # API Module
//!
//! Scheduling logic of the pet health engine. Everything except
//! [`scheduler`] is pure and takes "today" from the caller.
//!
//! ## Modules
//!
//! - [`age`] - Calendar age and lifecycle stage classification
//! - [`health_event`] - Health event catalog matching
//! - [`overview`] - Per-pet snapshot used by the operator cli
//! - [`scheduler`] - Daily notification run with dedup
//! - [`vaccine`] - Vaccine schedule generation

pub mod age;
pub mod health_event;
pub mod overview;
pub mod scheduler;
pub mod vaccine;
