//! # Vaccine Module
//!
//! Builds the ordered list of due and upcoming vaccine doses for a pet from
//! the vaccine catalog and the doses the owner already logged.

use chrono::{Days, NaiveDate};

use crate::{
    api::age,
    errors::ScheduleError,
    models::{
        catalog::{Catalog, Priority, VaccineDefinition},
        pet::Species,
        vaccination::{ComputedSchedule, VaccinationRecord, VaccineScheduleSummary},
    },
    utils,
};

/// Latest completed dose of a vaccine, by completion date then dose number.
fn last_completed_dose<'a>(
    vaccine_code: &str,
    records: &'a [VaccinationRecord],
) -> Option<(&'a VaccinationRecord, NaiveDate)> {
    records
        .iter()
        .filter(|record| record.vaccine_code == vaccine_code)
        .filter_map(|record| record.completed_date.map(|completed| (record, completed)))
        .max_by_key(|(record, completed)| (*completed, record.dose_number))
}

fn is_threshold_reached(vaccine: &VaccineDefinition, first_due: NaiveDate, today: NaiveDate) -> bool {
    today
        .checked_add_days(Days::new(u64::from(vaccine.notification_lead_days)))
        .is_some_and(|horizon| first_due <= horizon)
}

fn build_schedule(
    vaccine: &VaccineDefinition,
    recommended_date: NaiveDate,
    dose_number: u32,
    today: NaiveDate,
) -> ComputedSchedule {
    ComputedSchedule {
        code: vaccine.code.clone(),
        name: vaccine.name.clone(),
        recommended_date,
        dose_number,
        total_doses: vaccine.booster_interval_months.is_none().then_some(1),
        priority: Priority::from_days_until(Some((recommended_date - today).num_days())),
        required: vaccine.required,
        notification_lead_days: vaccine.notification_lead_days,
    }
}

/// Computes the due/upcoming doses of every applicable vaccine.
///
/// A vaccine applies when its species filter and stage restriction match. Then:
/// - completed and boostered: next dose at `last completed + interval`, kept
///   only when it is today or later;
/// - completed without booster: finished, left out;
/// - never completed: first dose at birth plus the trigger offset, listed once
///   it falls on or before `today + notification_lead_days`.
///
/// A dose logged earlier than the trigger age still counts as completed.
///
/// # Errors
/// Returns [`ScheduleError::BirthDateInFuture`] for a birth date after `today`.
/// Malformed catalog entries are skipped, not reported here.
pub fn generate_vaccine_schedules(
    species: Species,
    birth_date: NaiveDate,
    records: &[VaccinationRecord],
    catalog: &Catalog,
    today: NaiveDate,
) -> Result<VaccineScheduleSummary, ScheduleError> {
    let lifecycle = age::calculate_lifecycle_stage(species, birth_date, today)?;

    let mut schedules = Vec::new();
    let mut completed_count = 0;

    for vaccine in catalog
        .vaccines
        .iter()
        .filter(|vaccine| vaccine.species.matches(species))
        .filter(|vaccine| vaccine.applies_to_stage(lifecycle.stage))
    {
        let first_due = match vaccine
            .validate()
            .and_then(|_| vaccine.first_due_date(birth_date))
        {
            Ok(first_due) => first_due,
            Err(err) => {
                log::debug!("skipping vaccine catalog entry: {err}");
                continue;
            }
        };

        let Some((last_dose, completed_date)) = last_completed_dose(&vaccine.code, records) else {
            if is_threshold_reached(vaccine, first_due, today) {
                schedules.push(build_schedule(vaccine, first_due, 1, today));
            }
            continue;
        };

        completed_count += 1;

        let Some(interval) = vaccine.booster_interval_months else {
            continue;
        };

        let Some(next_booster) = utils::add_months(completed_date, interval) else {
            log::warn!("booster date overflowed for vaccine {}", vaccine.code);
            continue;
        };

        if next_booster >= today {
            schedules.push(build_schedule(
                vaccine,
                next_booster,
                last_dose.dose_number + 1,
                today,
            ));
        }
    }

    schedules.sort_by(|a, b| {
        a.recommended_date
            .cmp(&b.recommended_date)
            .then_with(|| a.code.cmp(&b.code))
    });

    let next_due_date = schedules
        .iter()
        .map(|schedule| schedule.recommended_date)
        .find(|date| *date >= today);
    let days_until_next = next_due_date.map(|date| (date - today).num_days());

    Ok(VaccineScheduleSummary {
        pending_count: schedules.len(),
        schedules,
        next_due_date,
        days_until_next,
        completed_count,
        priority: Priority::from_days_until(days_until_next),
    })
}
