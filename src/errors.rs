use chrono::NaiveDate;
use derive_more::{Display, Error};

/// Computation errors of the lifecycle and scheduling functions.
///
/// None of them abort a scheduler run; they are counted against the pet or
/// catalog entry that produced them.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[display("birth date {birth_date} is after {today}")]
    BirthDateInFuture {
        birth_date: NaiveDate,
        today: NaiveDate,
    },
    #[display("catalog entry {_0} has no trigger age")]
    MissingTriggerAge(#[error(not(source))] String),
    #[display("catalog entry {_0} has a zero recurrence interval")]
    InvalidInterval(#[error(not(source))] String),
    #[display("recurring catalog entry {_0} needs a notification lead time")]
    MissingLeadTime(#[error(not(source))] String),
    #[display("date arithmetic overflowed for {_0}")]
    DateOverflow(#[error(not(source))] String),
}
