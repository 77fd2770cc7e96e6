//! # Overview Module
//!
//! Read-only snapshot of everything the engine knows about one pet: its
//! lifecycle stage, the upcoming health events and the vaccine schedule.

use chrono::NaiveDate;
use serde::Serialize;

use crate::{
    api::{age, health_event, scheduler, vaccine},
    errors::ScheduleError,
    models::{
        catalog::{Catalog, Priority},
        lifecycle::LifecycleInfo,
        pet::PetProfile,
        vaccination::{VaccinationRecord, VaccineScheduleSummary},
    },
};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UpcomingEvent {
    pub code: String,
    pub name: String,
    pub target_date: NaiveDate,
    /// Day the reminder goes out, `None` when the date would overflow.
    pub fire_date: Option<NaiveDate>,
    pub priority: Priority,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PetOverview {
    pub pet_id: i64,
    pub pet_name: String,
    pub lifecycle: LifecycleInfo,
    pub events: Vec<UpcomingEvent>,
    pub vaccines: VaccineScheduleSummary,
}

/// Builds the overview of a pet as of `today`.
///
/// Returns `Ok(None)` for a pet missing species or birthday.
pub fn build_pet_overview(
    pet: &PetProfile,
    records: &[VaccinationRecord],
    catalog: &Catalog,
    today: NaiveDate,
) -> Result<Option<PetOverview>, ScheduleError> {
    let Some((species, birth_date)) = pet.lifecycle_inputs() else {
        return Ok(None);
    };

    let lifecycle = age::calculate_lifecycle_stage(species, birth_date, today)?;

    let mut events = health_event::generate_upcoming_events(pet, catalog, today)
        .iter()
        .map(|event| {
            let target_date = scheduler::event_target_date(event, birth_date, today)?;

            Ok(UpcomingEvent {
                code: event.code.clone(),
                name: event.name.clone(),
                target_date,
                fire_date: target_date
                    .checked_sub_days(chrono::Days::new(u64::from(event.notification_lead_days))),
                priority: event.priority,
            })
        })
        .collect::<Result<Vec<_>, ScheduleError>>()?;
    events.sort_by(|a, b| a.target_date.cmp(&b.target_date).then_with(|| a.code.cmp(&b.code)));

    let vaccines = vaccine::generate_vaccine_schedules(species, birth_date, records, catalog, today)?;

    Ok(Some(PetOverview {
        pet_id: pet.id,
        pet_name: pet.pet_name.clone(),
        lifecycle,
        events,
        vaccines,
    }))
}
