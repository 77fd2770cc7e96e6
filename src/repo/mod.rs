pub mod sqlite;
pub mod sqlite_queries;

use crate::models;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Source of the pets the scheduler walks on every run.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PetSource: Send + Sync {
    async fn list_pets_with_birth_date_and_species(
        &self,
    ) -> anyhow::Result<Vec<models::pet::PetProfile>>;

    async fn get_pet_by_id(&self, pet_id: i64) -> anyhow::Result<Option<models::pet::PetProfile>>;
}

/// Vaccination records and the notification dedup log.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn get_vaccination_records(
        &self,
        pet_id: i64,
    ) -> anyhow::Result<Vec<models::vaccination::VaccinationRecord>>;

    /// Whether `(pet_id, event_code)` was sent within `window.within_hours`
    /// before `now`, or is claimed by a pending record younger than
    /// `window.claim_ttl_secs`.
    async fn get_recent_dedup_record(
        &self,
        pet_id: i64,
        event_code: &str,
        window: models::notification::DedupWindow,
        now: DateTime<Utc>,
    ) -> anyhow::Result<bool>;

    /// Writes the record as a `pending` claim unless the pair is already sent
    /// or claimed, using the same rules as [`RecordStore::get_recent_dedup_record`]
    /// at the record's `fired_at`. The check and the insert are one atomic step;
    /// the return value tells whether this call wrote it.
    async fn write_dedup_record(
        &self,
        record: &models::notification::NotificationDedupRecord,
        window: models::notification::DedupWindow,
    ) -> anyhow::Result<bool>;

    /// Marks a claim as `sent` once the notification was delivered.
    async fn confirm_dedup_record(
        &self,
        record: &models::notification::NotificationDedupRecord,
    ) -> anyhow::Result<()>;

    /// Releases a claim written by [`RecordStore::write_dedup_record`] when the
    /// notification could not be delivered.
    async fn delete_dedup_record(
        &self,
        record: &models::notification::NotificationDedupRecord,
    ) -> anyhow::Result<()>;
}

pub type ImplPetSource = Box<dyn PetSource>;
pub type ImplRecordStore = Box<dyn RecordStore>;
