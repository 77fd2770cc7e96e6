//! Helper functions could be used in api/, repo/, ...

use chrono::{Datelike, Months, NaiveDate};
use sqlx::{SqlitePool, sqlite::SqliteConnectOptions};
use std::str::FromStr;

pub async fn setup_sqlite_db_pool(db_host: &str) -> anyhow::Result<SqlitePool> {
    Ok(SqlitePool::connect_with(
        SqliteConnectOptions::from_str(db_host)?
            .create_if_missing(true)
            .pragma("foreign_keys", "ON"),
    )
    .await?)
}

/// Runs every statement of a sql file against the pool.
pub async fn run_migrations(db_pool: &SqlitePool, file_name: &str) -> anyhow::Result<()> {
    let migration = std::fs::read_to_string(file_name)?;

    sqlx::raw_sql(&migration).execute(db_pool).await?;
    Ok(())
}

/// Number of days of the given month.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };

    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first_of_next| first_of_next.pred_opt())
        .map(|last_day| last_day.day())
        .unwrap_or(31)
}

/// Adds calendar months, clamping to the last day of the resulting month
/// (Jan 31 + 1 month = Feb 28/29).
pub fn add_months(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    date.checked_add_months(Months::new(months))
}

pub fn add_weeks(date: NaiveDate, weeks: u32) -> Option<NaiveDate> {
    date.checked_add_days(chrono::Days::new(u64::from(weeks) * 7))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(2023, 12), 31);
        assert_eq!(days_in_month(2023, 4), 30);
    }

    #[test]
    fn test_add_months_clamps_to_month_end() {
        let jan_31 = NaiveDate::from_ymd_opt(2023, 1, 31).unwrap();

        assert_eq!(add_months(jan_31, 1), NaiveDate::from_ymd_opt(2023, 2, 28));
        assert_eq!(add_months(jan_31, 13), NaiveDate::from_ymd_opt(2024, 2, 29));
    }

    #[test]
    fn test_add_weeks() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(add_weeks(date, 8), NaiveDate::from_ymd_opt(2024, 2, 26));
    }
}
