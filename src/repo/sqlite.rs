use crate::models;
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use sqlx::{FromRow, Row, SqlitePool, sqlite::SqliteRow};

use super::{PetSource, RecordStore, sqlite_queries};

#[derive(Clone)]
pub struct SqlxSqliteRepo {
    pub db_pool: SqlitePool,
}

impl FromRow<'_, SqliteRow> for models::pet::PetProfile {
    fn from_row(row: &SqliteRow) -> sqlx::Result<Self> {
        let species: Option<String> = row.try_get("species")?;

        Ok(Self {
            id: row.try_get("id")?,
            user_app_id: row.try_get("user_app_id")?,
            pet_name: row.try_get("pet_name")?,
            species: species.and_then(|s| s.parse().ok()),
            birthday: row.try_get("birthday")?,
        })
    }
}

impl SqlxSqliteRepo {
    /// Creates the tables this crate reads and writes, if missing.
    pub async fn create_schema(&self) -> anyhow::Result<()> {
        sqlx::raw_sql(sqlite_queries::QUERY_CREATE_SCHEMA)
            .execute(&self.db_pool)
            .await?;
        Ok(())
    }

    pub async fn insert_pet(&self, pet: &models::pet::PetProfile) -> anyhow::Result<i64> {
        Ok(sqlx::query(sqlite_queries::QUERY_INSERT_PET)
            .bind(pet.user_app_id)
            .bind(&pet.pet_name)
            .bind(pet.species.map(|species| species.to_string()))
            .bind(pet.birthday)
            .execute(&self.db_pool)
            .await?
            .last_insert_rowid())
    }

    pub async fn insert_vaccination_record(
        &self,
        record: &models::vaccination::VaccinationRecord,
    ) -> anyhow::Result<i64> {
        Ok(sqlx::query(sqlite_queries::QUERY_INSERT_VACCINATION_RECORD)
            .bind(record.pet_id)
            .bind(&record.vaccine_code)
            .bind(record.dose_number)
            .bind(record.completed_date)
            .bind(record.scheduled_date)
            .execute(&self.db_pool)
            .await?
            .last_insert_rowid())
    }
}

#[async_trait]
impl PetSource for SqlxSqliteRepo {
    async fn list_pets_with_birth_date_and_species(
        &self,
    ) -> anyhow::Result<Vec<models::pet::PetProfile>> {
        Ok(sqlx::query_as::<_, models::pet::PetProfile>(
            sqlite_queries::QUERY_LIST_PETS_WITH_BIRTHDAY_AND_SPECIES,
        )
        .fetch_all(&self.db_pool)
        .await?)
    }

    async fn get_pet_by_id(&self, pet_id: i64) -> anyhow::Result<Option<models::pet::PetProfile>> {
        Ok(
            sqlx::query_as::<_, models::pet::PetProfile>(sqlite_queries::QUERY_GET_PET_BY_ID)
                .bind(pet_id)
                .fetch_optional(&self.db_pool)
                .await?,
        )
    }
}

#[async_trait]
impl RecordStore for SqlxSqliteRepo {
    async fn get_vaccination_records(
        &self,
        pet_id: i64,
    ) -> anyhow::Result<Vec<models::vaccination::VaccinationRecord>> {
        Ok(sqlx::query_as::<_, models::vaccination::VaccinationRecord>(
            sqlite_queries::QUERY_GET_VACCINATION_RECORDS,
        )
        .bind(pet_id)
        .fetch_all(&self.db_pool)
        .await?)
    }

    async fn get_recent_dedup_record(
        &self,
        pet_id: i64,
        event_code: &str,
        window: models::notification::DedupWindow,
        now: DateTime<Utc>,
    ) -> anyhow::Result<bool> {
        let (sent_after, claimed_after) = window_thresholds(window, now);

        Ok(
            sqlx::query_scalar::<_, bool>(sqlite_queries::QUERY_EXISTS_RECENT_DEDUP)
                .bind(pet_id)
                .bind(event_code)
                .bind(sent_after)
                .bind(claimed_after)
                .fetch_one(&self.db_pool)
                .await?,
        )
    }

    async fn write_dedup_record(
        &self,
        record: &models::notification::NotificationDedupRecord,
        window: models::notification::DedupWindow,
    ) -> anyhow::Result<bool> {
        let (sent_after, claimed_after) = window_thresholds(window, record.fired_at);

        let inserted = sqlx::query(sqlite_queries::QUERY_INSERT_DEDUP_IF_ABSENT)
            .bind(record.pet_id)
            .bind(&record.event_code)
            .bind(record.fired_at)
            .bind(sent_after)
            .bind(claimed_after)
            .execute(&self.db_pool)
            .await?
            .rows_affected();

        Ok(inserted == 1)
    }

    async fn confirm_dedup_record(
        &self,
        record: &models::notification::NotificationDedupRecord,
    ) -> anyhow::Result<()> {
        let updated = sqlx::query(sqlite_queries::QUERY_CONFIRM_DEDUP)
            .bind(record.pet_id)
            .bind(&record.event_code)
            .bind(record.fired_at)
            .execute(&self.db_pool)
            .await?
            .rows_affected();

        if updated != 1 {
            anyhow::bail!(
                "no pending dedup record for pet_id={} {}",
                record.pet_id,
                record.event_code
            );
        }

        Ok(())
    }

    async fn delete_dedup_record(
        &self,
        record: &models::notification::NotificationDedupRecord,
    ) -> anyhow::Result<()> {
        Ok(sqlx::query(sqlite_queries::QUERY_DELETE_DEDUP)
            .bind(record.pet_id)
            .bind(&record.event_code)
            .bind(record.fired_at)
            .execute(&self.db_pool)
            .await
            .map(|_| ())?)
    }
}

/// Oldest `fired_at` still honored for sent records and for pending claims.
fn window_thresholds(
    window: models::notification::DedupWindow,
    at: DateTime<Utc>,
) -> (DateTime<Utc>, DateTime<Utc>) {
    (
        at - TimeDelta::hours(i64::from(window.within_hours)),
        at - TimeDelta::seconds(i64::from(window.claim_ttl_secs)),
    )
}
