use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::catalog::Priority;

/// A dose logged (or planned) by the owner.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, sqlx::FromRow)]
pub struct VaccinationRecord {
    pub id: i64,
    pub pet_id: i64,
    pub vaccine_code: String,
    pub dose_number: u32,
    pub completed_date: Option<NaiveDate>,
    pub scheduled_date: Option<NaiveDate>,
}

/// One due or upcoming dose, recomputed on every pass.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ComputedSchedule {
    pub code: String,
    pub name: String,
    pub recommended_date: NaiveDate,
    pub dose_number: u32,
    /// `None` for indefinitely recurring boosters.
    pub total_doses: Option<u32>,
    pub priority: Priority,
    pub required: bool,
    pub notification_lead_days: u32,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct VaccineScheduleSummary {
    pub schedules: Vec<ComputedSchedule>,
    pub next_due_date: Option<NaiveDate>,
    pub days_until_next: Option<i64>,
    pub completed_count: usize,
    pub pending_count: usize,
    pub priority: Priority,
}
