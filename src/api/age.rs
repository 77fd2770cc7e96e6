//! # Age Module
//!
//! Calendar age and lifecycle stage classification. Everything here is pure:
//! "today" is always passed in by the caller.

use chrono::{Datelike, NaiveDate};

use crate::{
    errors::ScheduleError,
    models::{
        lifecycle::{Age, LifecycleInfo, LifecycleStage},
        pet::Species,
    },
    utils,
};

/// Ordered stage bands. Each band holds until `total_months` reaches its upper
/// bound; past the last band the pet is in `terminal`.
struct StageTable {
    bands: &'static [(i64, LifecycleStage)],
    terminal: LifecycleStage,
}

const DOG_STAGES: StageTable = StageTable {
    bands: &[
        (6, LifecycleStage::Puppy),
        (12, LifecycleStage::Junior),
        (84, LifecycleStage::Adult),
        (120, LifecycleStage::MatureAdult),
        (144, LifecycleStage::Senior),
    ],
    terminal: LifecycleStage::Geriatric,
};

const CAT_STAGES: StageTable = StageTable {
    bands: &[
        (6, LifecycleStage::Kitten),
        (12, LifecycleStage::Junior),
        (84, LifecycleStage::Adult),
        (120, LifecycleStage::MatureAdult),
        (180, LifecycleStage::Senior),
    ],
    terminal: LifecycleStage::Geriatric,
};

const OTHER_STAGES: StageTable = StageTable {
    bands: &[
        (6, LifecycleStage::Juvenile),
        (12, LifecycleStage::Junior),
        (84, LifecycleStage::Adult),
    ],
    terminal: LifecycleStage::Senior,
};

fn stage_table(species: Species) -> &'static StageTable {
    match species {
        Species::Dog => &DOG_STAGES,
        Species::Cat => &CAT_STAGES,
        Species::Other => &OTHER_STAGES,
    }
}

/// Every stage a species can be classified into, youngest first.
pub fn species_stages(species: Species) -> Vec<LifecycleStage> {
    let table = stage_table(species);

    table
        .bands
        .iter()
        .map(|(_, stage)| *stage)
        .chain(std::iter::once(table.terminal))
        .collect()
}

/// Calendar age between `birth_date` and `today`.
///
/// A negative day remainder borrows the length of the month preceding
/// `today`'s month (repeating while still negative), and a negative month
/// remainder borrows a year. Birth dates after `today` yield negative totals.
pub fn calculate_age(birth_date: NaiveDate, today: NaiveDate) -> Age {
    let mut years = i64::from(today.year() - birth_date.year());
    let mut months = i64::from(today.month()) - i64::from(birth_date.month());
    let mut days = i64::from(today.day()) - i64::from(birth_date.day());

    let (mut borrow_year, mut borrow_month) = (today.year(), today.month());
    while days < 0 {
        (borrow_year, borrow_month) = if borrow_month == 1 {
            (borrow_year - 1, 12)
        } else {
            (borrow_year, borrow_month - 1)
        };
        days += i64::from(utils::days_in_month(borrow_year, borrow_month));
        months -= 1;
    }

    while months < 0 {
        months += 12;
        years -= 1;
    }

    Age {
        years,
        months,
        days,
        total_days: (today - birth_date).num_days(),
        total_months: years * 12 + months,
    }
}

/// First day on which [`calculate_age`] reports `total_months` months.
///
/// `birth + months` clamps to the month end (Feb 29 + 84 months is Feb 28),
/// while the age borrow only completes the month a day or more later.
fn first_day_at_age(birth_date: NaiveDate, total_months: i64) -> Option<NaiveDate> {
    let mut day = utils::add_months(birth_date, u32::try_from(total_months).ok()?)?;

    while calculate_age(birth_date, day).total_months < total_months {
        day = day.succ_opt()?;
    }

    Some(day)
}

/// Classifies the pet's lifecycle stage and estimates when the next one starts.
///
/// # Errors
/// Returns [`ScheduleError::BirthDateInFuture`] when `birth_date` is after `today`,
/// and [`ScheduleError::DateOverflow`] if the transition date is not representable.
pub fn calculate_lifecycle_stage(
    species: Species,
    birth_date: NaiveDate,
    today: NaiveDate,
) -> Result<LifecycleInfo, ScheduleError> {
    let age = calculate_age(birth_date, today);
    if age.is_before_birth() {
        return Err(ScheduleError::BirthDateInFuture { birth_date, today });
    }

    let table = stage_table(species);
    let current_band = table
        .bands
        .iter()
        .find(|(upper_months, _)| age.total_months < *upper_months);

    let Some((upper_months, stage)) = current_band else {
        return Ok(LifecycleInfo {
            stage: table.terminal,
            age,
            next_stage_transition: None,
        });
    };

    let next_stage_transition = first_day_at_age(birth_date, *upper_months)
        .ok_or_else(|| ScheduleError::DateOverflow(format!("{species} stage transition")))?;

    Ok(LifecycleInfo {
        stage: *stage,
        age,
        next_stage_transition: Some(next_stage_transition),
    })
}
