//! # Health Event Module
//!
//! Matches the health event catalog against a pet's species and age.

use chrono::{Days, NaiveDate};

use crate::{
    api::age,
    consts,
    models::{catalog::Catalog, catalog::HealthEventDefinition, pet::PetProfile},
};

/// Returns the catalog events that currently apply to the pet.
///
/// An event applies when its species filter matches and the pet has already
/// reached the trigger age. One-off events (no recurrence interval) drop out
/// once the pet is more than [`consts::ONE_OFF_GRACE_MONTHS`] past the
/// trigger; recurring ones never do.
///
/// Pets without species or birthday, or born after `today`, get an empty list.
/// Malformed catalog entries are skipped.
pub fn generate_applicable_events(
    pet: &PetProfile,
    catalog: &Catalog,
    today: NaiveDate,
) -> Vec<HealthEventDefinition> {
    matching_events(pet, catalog, today, |_| Some(today))
}

/// Like [`generate_applicable_events`], but the trigger age only has to be
/// reached by `today + notification_lead_days`, so an event is listed as soon
/// as its first reminder window opens.
pub fn generate_upcoming_events(
    pet: &PetProfile,
    catalog: &Catalog,
    today: NaiveDate,
) -> Vec<HealthEventDefinition> {
    matching_events(pet, catalog, today, |event| {
        today.checked_add_days(Days::new(u64::from(event.notification_lead_days)))
    })
}

fn matching_events(
    pet: &PetProfile,
    catalog: &Catalog,
    today: NaiveDate,
    reached_by: impl Fn(&HealthEventDefinition) -> Option<NaiveDate>,
) -> Vec<HealthEventDefinition> {
    let Some((species, birth_date)) = pet.lifecycle_inputs() else {
        return vec![];
    };

    let current_age = age::calculate_age(birth_date, today);
    if current_age.is_before_birth() {
        log::warn!(
            "pet_id={} has a birth date in the future, no health events apply",
            pet.id
        );
        return vec![];
    }

    catalog
        .health_events
        .iter()
        .filter(|event| event.species.matches(species))
        .filter(|event| match event.validate().and_then(|_| event.trigger_months()) {
            Ok(trigger_months) => {
                event.is_recurring()
                    || current_age.total_months <= trigger_months + consts::ONE_OFF_GRACE_MONTHS
            }
            Err(err) => {
                log::debug!("skipping catalog entry: {err}");
                false
            }
        })
        .filter(|event| {
            reached_by(event)
                .is_some_and(|day| event.is_reached(&age::calculate_age(birth_date, day)))
        })
        .cloned()
        .collect()
}
