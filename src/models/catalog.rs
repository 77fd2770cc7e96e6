//! Static reference data: health event and vaccine definitions.
//!
//! The catalog is loaded once at process start (built-in JSON or an override
//! file) and handed explicitly to every function that needs it.

use anyhow::Context;
use chrono::NaiveDate;
use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::{
    consts,
    errors::ScheduleError,
    models::{
        lifecycle::{Age, LifecycleStage},
        pet::Species,
    },
    utils,
};

#[derive(Debug, Display, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, Hash)]
pub enum SpeciesFilter {
    #[display("dog")]
    #[serde(rename = "dog")]
    Dog,
    #[display("cat")]
    #[serde(rename = "cat")]
    Cat,
    #[default]
    #[display("both")]
    #[serde(rename = "both")]
    Both,
}

impl SpeciesFilter {
    pub fn matches(&self, species: Species) -> bool {
        matches!(
            (self, species),
            (SpeciesFilter::Both, _)
                | (SpeciesFilter::Dog, Species::Dog)
                | (SpeciesFilter::Cat, Species::Cat)
        )
    }
}

#[derive(Debug, Display, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, Hash)]
pub enum HealthEventType {
    #[display("neutering")]
    #[serde(rename = "neutering")]
    Neutering,
    #[display("dental")]
    #[serde(rename = "dental")]
    Dental,
    #[display("blood_test")]
    #[serde(rename = "blood_test")]
    BloodTest,
    #[display("senior_care")]
    #[serde(rename = "senior_care")]
    SeniorCare,
    #[default]
    #[display("other")]
    #[serde(rename = "other")]
    Other,
}

#[derive(
    Debug, Display, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, PartialOrd, Ord,
)]
pub enum Priority {
    #[display("high")]
    #[serde(rename = "high")]
    High,
    #[display("medium")]
    #[serde(rename = "medium")]
    Medium,
    #[default]
    #[display("low")]
    #[serde(rename = "low")]
    Low,
}

impl Priority {
    /// Buckets the days left until a due date. Overdue dates count as high.
    pub fn from_days_until(days_until: Option<i64>) -> Self {
        match days_until {
            Some(days) if days <= consts::HIGH_PRIORITY_MAX_DAYS => Priority::High,
            Some(days) if days <= consts::MEDIUM_PRIORITY_MAX_DAYS => Priority::Medium,
            _ => Priority::Low,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct HealthEventDefinition {
    pub code: String,
    pub name: String,
    pub event_type: HealthEventType,
    #[serde(default)]
    pub species: SpeciesFilter,
    #[serde(default)]
    pub trigger_age_months: Option<u32>,
    #[serde(default)]
    pub trigger_age_years: Option<u32>,
    #[serde(default)]
    pub recurrence_interval_months: Option<u32>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub notification_lead_days: u32,
}

impl HealthEventDefinition {
    pub fn is_recurring(&self) -> bool {
        self.recurrence_interval_months.is_some()
    }

    /// Trigger age flattened to months. When both months and years are set
    /// the earlier one wins, matching [`Self::is_reached`].
    pub fn trigger_months(&self) -> Result<i64, ScheduleError> {
        let by_months = self.trigger_age_months.map(i64::from);
        let by_years = self.trigger_age_years.map(|years| i64::from(years) * 12);

        match (by_months, by_years) {
            (Some(months), Some(years)) => Ok(months.min(years)),
            (Some(months), None) | (None, Some(months)) => Ok(months),
            (None, None) => Err(ScheduleError::MissingTriggerAge(self.code.clone())),
        }
    }

    pub fn is_reached(&self, age: &Age) -> bool {
        let by_months = self
            .trigger_age_months
            .is_some_and(|months| age.total_months >= i64::from(months));
        let by_years = self
            .trigger_age_years
            .is_some_and(|years| age.years >= i64::from(years));

        by_months || by_years
    }

    /// First due date, `birth + trigger age`.
    pub fn first_due_date(&self, birth_date: NaiveDate) -> Result<NaiveDate, ScheduleError> {
        let months = u32::try_from(self.trigger_months()?)
            .map_err(|_| ScheduleError::DateOverflow(self.code.clone()))?;

        utils::add_months(birth_date, months)
            .ok_or_else(|| ScheduleError::DateOverflow(self.code.clone()))
    }

    pub fn validate(&self) -> Result<(), ScheduleError> {
        self.trigger_months()?;

        if self.recurrence_interval_months == Some(0) {
            return Err(ScheduleError::InvalidInterval(self.code.clone()));
        }

        // occurrences roll past today, so a zero lead time would never open a window
        if self.is_recurring() && self.notification_lead_days == 0 {
            return Err(ScheduleError::MissingLeadTime(self.code.clone()));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOffset {
    Weeks(u32),
    Months(u32),
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct VaccineDefinition {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub species: SpeciesFilter,
    /// Restricts the vaccine to these stages. `None` means every stage.
    #[serde(default)]
    pub lifecycle_stages: Option<Vec<LifecycleStage>>,
    #[serde(default)]
    pub trigger_age_weeks: Option<u32>,
    #[serde(default)]
    pub trigger_age_months: Option<u32>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub booster_interval_months: Option<u32>,
    #[serde(default = "default_vaccine_lead_days")]
    pub notification_lead_days: u32,
}

fn default_vaccine_lead_days() -> u32 {
    consts::DEFAULT_VACCINE_LEAD_DAYS
}

impl VaccineDefinition {
    /// Weeks take priority over months when both are set.
    pub fn trigger_offset(&self) -> Result<TriggerOffset, ScheduleError> {
        match (self.trigger_age_weeks, self.trigger_age_months) {
            (Some(weeks), _) => Ok(TriggerOffset::Weeks(weeks)),
            (None, Some(months)) => Ok(TriggerOffset::Months(months)),
            (None, None) => Err(ScheduleError::MissingTriggerAge(self.code.clone())),
        }
    }

    pub fn first_due_date(&self, birth_date: NaiveDate) -> Result<NaiveDate, ScheduleError> {
        let due = match self.trigger_offset()? {
            TriggerOffset::Weeks(weeks) => utils::add_weeks(birth_date, weeks),
            TriggerOffset::Months(months) => utils::add_months(birth_date, months),
        };

        due.ok_or_else(|| ScheduleError::DateOverflow(self.code.clone()))
    }

    pub fn applies_to_stage(&self, stage: LifecycleStage) -> bool {
        self.lifecycle_stages
            .as_ref()
            .is_none_or(|stages| stages.contains(&stage))
    }

    pub fn validate(&self) -> Result<(), ScheduleError> {
        self.trigger_offset()?;

        if self.booster_interval_months == Some(0) {
            return Err(ScheduleError::InvalidInterval(self.code.clone()));
        }

        Ok(())
    }
}

/// Versioned, immutable reference catalog.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Catalog {
    pub version: String,
    #[serde(default)]
    pub health_events: Vec<HealthEventDefinition>,
    #[serde(default)]
    pub vaccines: Vec<VaccineDefinition>,
}

impl Catalog {
    pub fn from_json_str(raw: &str) -> anyhow::Result<Self> {
        serde_json::from_str(raw).context("catalog json is not valid")
    }

    /// Loads the override file when given, the built-in catalog otherwise.
    pub fn load(path: Option<&str>) -> anyhow::Result<Self> {
        match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read catalog file {path}"))?;
                Self::from_json_str(&raw)
            }
            None => Self::from_json_str(consts::DEFAULT_CATALOG_JSON),
        }
    }

    /// Returns one error per malformed entry. Malformed entries are skipped by
    /// the matcher and the vaccine generator.
    pub fn validate(&self) -> Vec<ScheduleError> {
        let events = self.health_events.iter().map(|event| event.validate());
        let vaccines = self.vaccines.iter().map(|vaccine| vaccine.validate());

        events.chain(vaccines).filter_map(Result::err).collect()
    }
}
