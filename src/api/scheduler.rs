//! # Notification Scheduler Module
//!
//! Batch job deciding, for every pet, which health event and vaccine
//! reminders must fire today. A run is safe to repeat: every notification is
//! claimed in the dedup log before it is sent and confirmed after it. A claim
//! left behind by an interrupted run expires after `claim_ttl`, so the next
//! run inside the fire window sends it.

use anyhow::Context;
use chrono::{DateTime, Days, NaiveDate, Utc};
use futures::{StreamExt, stream};
use std::{future::Future, time::Duration};
use tokio::sync::watch;
use tracing::Instrument;

use crate::{
    api::{health_event, vaccine},
    consts,
    errors::ScheduleError,
    metric,
    models::{
        catalog::{Catalog, HealthEventDefinition, Priority},
        notification::{
            DedupWindow, Notification, NotificationChannel, NotificationDedupRecord, RunReport,
        },
        pet::{PetProfile, Species},
        vaccination::{ComputedSchedule, VaccinationRecord},
    },
    repo, services, utils,
};

#[derive(Debug, Clone, PartialEq)]
pub struct SchedulerSettings {
    pub dedup_window_hours: u32,
    pub fire_tolerance_days: i64,
    pub max_concurrent_pets: usize,
    pub io_timeout: Duration,
    /// Age after which a pending claim no longer blocks a new send. Must
    /// outlast a whole run, since claims carry the run's start instant.
    pub claim_ttl: Duration,
    pub channel: NotificationChannel,
    pub timezone: chrono_tz::Tz,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            dedup_window_hours: consts::DEFAULT_DEDUP_WINDOW_HOURS,
            fire_tolerance_days: consts::FIRE_TOLERANCE_DAYS,
            max_concurrent_pets: 4,
            io_timeout: Duration::from_secs(10),
            claim_ttl: Duration::from_secs(consts::DEFAULT_CLAIM_TTL_SECS),
            channel: NotificationChannel::default(),
            timezone: chrono_tz::UTC,
        }
    }
}

impl SchedulerSettings {
    /// Dedup lookback actually used. It always covers the whole fire window,
    /// so the tolerance day cannot send the same occurrence a second time.
    pub fn effective_dedup_window_hours(&self) -> u32 {
        let fire_window_hours = u32::try_from((self.fire_tolerance_days + 1).max(1) * 24)
            .unwrap_or(u32::MAX);

        self.dedup_window_hours.max(fire_window_hours)
    }

    pub fn dedup_window(&self) -> DedupWindow {
        DedupWindow {
            within_hours: self.effective_dedup_window_hours(),
            claim_ttl_secs: u32::try_from(self.claim_ttl.as_secs()).unwrap_or(u32::MAX),
        }
    }
}

/// One concrete due date of an event or vaccine for a pet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    pub code: String,
    pub name: String,
    pub target_date: NaiveDate,
    pub notification_lead_days: u32,
    pub priority: Priority,
    pub dose_number: Option<u32>,
}

impl Occurrence {
    fn from_event(event: &HealthEventDefinition, target_date: NaiveDate) -> Self {
        Self {
            code: event.code.clone(),
            name: event.name.clone(),
            target_date,
            notification_lead_days: event.notification_lead_days,
            priority: event.priority,
            dose_number: None,
        }
    }

    fn from_vaccine(schedule: &ComputedSchedule) -> Self {
        Self {
            code: schedule.code.clone(),
            name: schedule.name.clone(),
            target_date: schedule.recommended_date,
            notification_lead_days: schedule.notification_lead_days,
            priority: schedule.priority,
            dose_number: Some(schedule.dose_number),
        }
    }

    pub fn fire_date(&self) -> Option<NaiveDate> {
        self.target_date
            .checked_sub_days(Days::new(u64::from(self.notification_lead_days)))
    }
}

/// Next due date of a health event.
///
/// One-off events are due at `birth + trigger age`, even when that is in the
/// past. Recurring events start there and advance by their interval until the
/// date is strictly after `today`; each step is computed from the first date
/// so month-end clamping does not drift.
pub fn event_target_date(
    event: &HealthEventDefinition,
    birth_date: NaiveDate,
    today: NaiveDate,
) -> Result<NaiveDate, ScheduleError> {
    let first_due = event.first_due_date(birth_date)?;

    match event.recurrence_interval_months {
        None => Ok(first_due),
        Some(0) => Err(ScheduleError::InvalidInterval(event.code.clone())),
        Some(interval) => roll_forward(first_due, interval, today)
            .ok_or_else(|| ScheduleError::DateOverflow(event.code.clone())),
    }
}

fn roll_forward(first_due: NaiveDate, interval_months: u32, today: NaiveDate) -> Option<NaiveDate> {
    let mut steps: u32 = 0;
    let mut occurrence = first_due;

    while occurrence <= today {
        steps = steps.checked_add(1)?;
        occurrence = utils::add_months(first_due, steps.checked_mul(interval_months)?)?;
    }

    Some(occurrence)
}

/// Whether `today` falls in `[fire_date, fire_date + tolerance_days]`.
pub fn is_within_fire_window(fire_date: NaiveDate, today: NaiveDate, tolerance_days: i64) -> bool {
    let days_late = (today - fire_date).num_days();

    (0..=tolerance_days).contains(&days_late)
}

/// Every occurrence of a pet's applicable events and pending vaccine doses,
/// plus the computation errors found on the way.
pub fn collect_occurrences(
    pet: &PetProfile,
    species: Species,
    birth_date: NaiveDate,
    records: &[VaccinationRecord],
    catalog: &Catalog,
    today: NaiveDate,
) -> (Vec<Occurrence>, Vec<ScheduleError>) {
    let mut occurrences = Vec::new();
    let mut errors = Vec::new();

    for event in health_event::generate_upcoming_events(pet, catalog, today) {
        match event_target_date(&event, birth_date, today) {
            Ok(target_date) => occurrences.push(Occurrence::from_event(&event, target_date)),
            Err(err) => errors.push(err),
        }
    }

    match vaccine::generate_vaccine_schedules(species, birth_date, records, catalog, today) {
        Ok(summary) => occurrences.extend(summary.schedules.iter().map(Occurrence::from_vaccine)),
        Err(err) => errors.push(err),
    }

    (occurrences, errors)
}

fn build_notification(
    pet: &PetProfile,
    occurrence: &Occurrence,
    channel: NotificationChannel,
) -> Notification {
    let dose = occurrence
        .dose_number
        .map(|dose| format!(" (dose {dose})"))
        .unwrap_or_default();

    Notification {
        pet_id: pet.id,
        user_app_id: pet.user_app_id,
        event_code: occurrence.code.clone(),
        title: format!("{} reminder for {}", occurrence.name, pet.pet_name),
        message: format!(
            "{name}{dose} for {pet_name} is due on {date}.",
            name = occurrence.name,
            pet_name = pet.pet_name,
            date = occurrence.target_date.format("%Y-%m-%d"),
        ),
        priority: occurrence.priority,
        channel,
        due_date: occurrence.target_date,
    }
}

enum NotifyOutcome {
    Sent,
    Duplicate,
    Failed,
}

pub struct NotificationScheduler {
    pub pet_source: repo::ImplPetSource,
    pub record_store: repo::ImplRecordStore,
    pub sender: services::ImplNotificationSender,
    pub catalog: Catalog,
    pub settings: SchedulerSettings,
}

impl NotificationScheduler {
    async fn with_timeout<T>(
        &self,
        call: impl Future<Output = anyhow::Result<T>>,
    ) -> anyhow::Result<T> {
        tokio::time::timeout(self.settings.io_timeout, call)
            .await
            .with_context(|| format!("call timed out after {:?}", self.settings.io_timeout))?
    }

    /// Runs one scheduling pass over every pet.
    ///
    /// Only a pet source failure aborts the run. Every other failure is
    /// logged, counted in [`RunReport::errors`] and the pass moves on.
    pub async fn run(&self, now: DateTime<Utc>) -> anyhow::Result<RunReport> {
        let (_keep_open, cancel) = watch::channel(false);

        self.run_until_cancelled(now, cancel).await
    }

    /// Same as [`Self::run`], stopping early once `cancel` turns `true`.
    ///
    /// No new occurrence is claimed after cancellation. A notification already
    /// claimed is still sent (or released) before this returns, and pets not
    /// reached are left for the next run.
    pub async fn run_until_cancelled(
        &self,
        now: DateTime<Utc>,
        cancel: watch::Receiver<bool>,
    ) -> anyhow::Result<RunReport> {
        let today = now.with_timezone(&self.settings.timezone).date_naive();
        let mut report = RunReport::default();
        metric::incr_scheduler_statds("run");

        for issue in self.catalog.validate() {
            log::error!("catalog {} entry skipped: {issue}", self.catalog.version);
            metric::incr_scheduler_statds("error");
            report.errors += 1;
        }

        let pets = self
            .with_timeout(self.pet_source.list_pets_with_birth_date_and_species())
            .await
            .context("failed to list pets")?;

        log::info!("scheduler run for {today}: {} pets", pets.len());

        let outcomes: Vec<RunReport> = stream::iter(pets.iter())
            .map(|pet| {
                self.process_pet(pet, today, now, &cancel)
                    .instrument(logfire::span!("process pet {pet_id}", pet_id = pet.id))
            })
            .buffer_unordered(self.settings.max_concurrent_pets.max(1))
            .collect()
            .await;

        for outcome in outcomes {
            report += outcome;
        }

        if *cancel.borrow() {
            log::warn!(
                "scheduler run cancelled after {} of {} pets",
                report.processed,
                pets.len()
            );
        }

        log::info!(
            "scheduler run finished: processed={} sent={} duplicates={} errors={}",
            report.processed,
            report.notifications_sent,
            report.duplicates_suppressed,
            report.errors
        );

        Ok(report)
    }

    async fn process_pet(
        &self,
        pet: &PetProfile,
        today: NaiveDate,
        now: DateTime<Utc>,
        cancel: &watch::Receiver<bool>,
    ) -> RunReport {
        if *cancel.borrow() {
            return RunReport::default();
        }

        let mut report = RunReport {
            processed: 1,
            ..Default::default()
        };

        let Some((species, birth_date)) = pet.lifecycle_inputs() else {
            log::debug!("pet_id={} has no species or birthday, nothing to schedule", pet.id);
            return report;
        };

        if birth_date > today {
            log::warn!(
                "pet_id={} rejected: {}",
                pet.id,
                ScheduleError::BirthDateInFuture { birth_date, today }
            );
            metric::incr_scheduler_statds("error");
            report.errors += 1;
            return report;
        }

        let records = match self
            .with_timeout(self.record_store.get_vaccination_records(pet.id))
            .await
        {
            Ok(records) => records,
            Err(e) => {
                log::error!("pet_id={} vaccination records unavailable: {e:#}", pet.id);
                metric::incr_scheduler_statds("error");
                report.errors += 1;
                return report;
            }
        };

        let (occurrences, errors) =
            collect_occurrences(pet, species, birth_date, &records, &self.catalog, today);

        for err in errors {
            log::error!("pet_id={} schedule computation failed: {err}", pet.id);
            metric::incr_scheduler_statds("error");
            report.errors += 1;
        }

        for occurrence in occurrences {
            let Some(fire_date) = occurrence.fire_date() else {
                log::error!(
                    "pet_id={} {}",
                    pet.id,
                    ScheduleError::DateOverflow(occurrence.code.clone())
                );
                report.errors += 1;
                continue;
            };

            if !is_within_fire_window(fire_date, today, self.settings.fire_tolerance_days) {
                continue;
            }

            if *cancel.borrow() {
                log::info!("pet_id={} left for the next run, run cancelled", pet.id);
                break;
            }

            match self.notify(pet, &occurrence, now).await {
                NotifyOutcome::Sent => {
                    metric::incr_scheduler_statds("sent");
                    report.notifications_sent += 1;
                }
                NotifyOutcome::Duplicate => {
                    metric::incr_scheduler_statds("duplicate");
                    report.duplicates_suppressed += 1;
                }
                NotifyOutcome::Failed => {
                    metric::incr_scheduler_statds("error");
                    report.errors += 1;
                }
            }
        }

        report
    }

    async fn notify(
        &self,
        pet: &PetProfile,
        occurrence: &Occurrence,
        now: DateTime<Utc>,
    ) -> NotifyOutcome {
        let window = self.settings.dedup_window();

        match self
            .with_timeout(self.record_store.get_recent_dedup_record(
                pet.id,
                &occurrence.code,
                window,
                now,
            ))
            .await
        {
            Ok(false) => {}
            Ok(true) => {
                log::debug!("pet_id={} {} already notified", pet.id, occurrence.code);
                return NotifyOutcome::Duplicate;
            }
            Err(e) => {
                log::error!("pet_id={} dedup lookup failed: {e:#}", pet.id);
                return NotifyOutcome::Failed;
            }
        }

        let dedup_record = NotificationDedupRecord {
            pet_id: pet.id,
            event_code: occurrence.code.clone(),
            fired_at: now,
        };

        match self
            .with_timeout(self.record_store.write_dedup_record(&dedup_record, window))
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                log::debug!("pet_id={} {} claimed by another run", pet.id, occurrence.code);
                return NotifyOutcome::Duplicate;
            }
            Err(e) => {
                log::error!("pet_id={} dedup write failed: {e:#}", pet.id);
                return NotifyOutcome::Failed;
            }
        }

        let notification = build_notification(pet, occurrence, self.settings.channel);
        let Err(e) = self.with_timeout(self.sender.send(&notification)).await else {
            log::info!(
                "pet_id={} {} notified, due {}",
                pet.id,
                occurrence.code,
                occurrence.target_date
            );

            // an unconfirmed claim expires, so the reminder may go out once more
            if let Err(e) = self
                .with_timeout(self.record_store.confirm_dedup_record(&dedup_record))
                .await
            {
                log::error!("pet_id={} dedup confirm failed: {e:#}", pet.id);
            }

            return NotifyOutcome::Sent;
        };

        log::error!("pet_id={} {} send failed: {e:#}", pet.id, occurrence.code);

        // a claim that cannot be released expires after claim_ttl
        if let Err(e) = self
            .with_timeout(self.record_store.delete_dedup_record(&dedup_record))
            .await
        {
            log::error!("pet_id={} dedup release failed: {e:#}", pet.id);
        }

        NotifyOutcome::Failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::catalog::{HealthEventType, SpeciesFilter},
        repo::{MockPetSource, MockRecordStore},
        services::MockNotificationSender,
    };

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn now() -> DateTime<Utc> {
        "2026-01-01T09:00:00Z".parse().unwrap()
    }

    fn dental_event() -> HealthEventDefinition {
        HealthEventDefinition {
            code: "dog_dental".into(),
            name: "Dental check".into(),
            event_type: HealthEventType::Dental,
            species: SpeciesFilter::Dog,
            trigger_age_months: Some(12),
            trigger_age_years: None,
            recurrence_interval_months: Some(12),
            priority: Priority::Medium,
            notification_lead_days: 7,
        }
    }

    fn catalog(health_events: Vec<HealthEventDefinition>) -> Catalog {
        Catalog {
            version: "test".into(),
            health_events,
            vaccines: vec![],
        }
    }

    /// Dental check due 2026-01-08, so its reminder fires on 2026-01-01.
    fn due_pet(id: i64) -> PetProfile {
        PetProfile {
            id,
            user_app_id: 100 + id,
            pet_name: format!("pet-{id}"),
            species: Some(Species::Dog),
            birthday: Some(date(2020, 1, 8)),
        }
    }

    fn pet_source(pets: Vec<PetProfile>) -> MockPetSource {
        let mut mock = MockPetSource::new();
        mock.expect_list_pets_with_birth_date_and_species()
            .times(1)
            .returning(move || Ok(pets.clone()));
        mock
    }

    fn scheduler(
        pet_source: MockPetSource,
        record_store: MockRecordStore,
        sender: MockNotificationSender,
        catalog: Catalog,
    ) -> NotificationScheduler {
        NotificationScheduler {
            pet_source: Box::new(pet_source),
            record_store: Box::new(record_store),
            sender: Box::new(sender),
            catalog,
            settings: SchedulerSettings::default(),
        }
    }

    #[test]
    fn test_recurring_target_rolls_forward_past_today() {
        let event = HealthEventDefinition {
            trigger_age_months: Some(6),
            recurrence_interval_months: Some(6),
            ..dental_event()
        };
        let today = date(2026, 10, 19);
        // first occurrence lapsed by 30 months
        let birth = date(2023, 10, 19);

        let target = event_target_date(&event, birth, today).unwrap();

        assert_eq!(target, date(2027, 4, 19));
        assert!(target > today);
    }

    #[test]
    fn test_recurring_target_in_future_is_kept() {
        let target = event_target_date(&dental_event(), date(2025, 6, 1), date(2026, 1, 1)).unwrap();

        assert_eq!(target, date(2026, 6, 1));
    }

    #[test]
    fn test_roll_forward_does_not_drift_on_month_end() {
        let event = HealthEventDefinition {
            trigger_age_months: Some(1),
            recurrence_interval_months: Some(1),
            ..dental_event()
        };

        let target = event_target_date(&event, date(2025, 12, 31), date(2026, 3, 1)).unwrap();

        assert_eq!(target, date(2026, 3, 31));
    }

    #[test]
    fn test_one_off_target_is_used_as_is() {
        let event = HealthEventDefinition {
            trigger_age_months: Some(6),
            recurrence_interval_months: None,
            ..dental_event()
        };

        let target = event_target_date(&event, date(2025, 1, 1), date(2026, 1, 1)).unwrap();

        assert_eq!(target, date(2025, 7, 1));
    }

    #[test]
    fn test_zero_interval_is_a_computation_error() {
        let event = HealthEventDefinition {
            recurrence_interval_months: Some(0),
            ..dental_event()
        };

        assert_eq!(
            event_target_date(&event, date(2020, 1, 1), date(2026, 1, 1)),
            Err(ScheduleError::InvalidInterval("dog_dental".into()))
        );
    }

    #[test]
    fn test_fire_window_has_one_day_tolerance() {
        let fire_date = date(2026, 1, 1);

        assert!(!is_within_fire_window(fire_date, date(2025, 12, 31), 1));
        assert!(is_within_fire_window(fire_date, date(2026, 1, 1), 1));
        assert!(is_within_fire_window(fire_date, date(2026, 1, 2), 1));
        assert!(!is_within_fire_window(fire_date, date(2026, 1, 3), 1));
    }

    #[test]
    fn test_effective_dedup_window_covers_fire_window() {
        let settings = SchedulerSettings::default();
        assert_eq!(settings.effective_dedup_window_hours(), 48);

        let settings = SchedulerSettings {
            dedup_window_hours: 72,
            ..Default::default()
        };
        assert_eq!(settings.effective_dedup_window_hours(), 72);
    }

    #[test]
    fn test_dedup_window_carries_claim_ttl() {
        let settings = SchedulerSettings {
            claim_ttl: Duration::from_secs(90),
            ..Default::default()
        };

        assert_eq!(
            settings.dedup_window(),
            DedupWindow {
                within_hours: 48,
                claim_ttl_secs: 90,
            }
        );
    }

    #[tokio::test]
    async fn test_unconfirmed_send_still_counts_as_sent() {
        let mut record_store = MockRecordStore::new();
        record_store
            .expect_get_vaccination_records()
            .returning(|_| Ok(vec![]));
        record_store
            .expect_get_recent_dedup_record()
            .returning(|_, _, _, _| Ok(false));
        record_store
            .expect_write_dedup_record()
            .returning(|_, _| Ok(true));
        record_store
            .expect_confirm_dedup_record()
            .times(1)
            .returning(|_| Err(anyhow::anyhow!("database is locked")));
        record_store.expect_delete_dedup_record().never();

        let mut sender = MockNotificationSender::new();
        sender.expect_send().times(1).returning(|_| Ok(()));

        let report = scheduler(
            pet_source(vec![due_pet(1)]),
            record_store,
            sender,
            catalog(vec![dental_event()]),
        )
        .run(now())
        .await
        .unwrap();

        assert_eq!(report.notifications_sent, 1);
        assert_eq!(report.errors, 0);
    }

    #[tokio::test]
    async fn test_cancelled_run_claims_nothing() {
        let mut record_store = MockRecordStore::new();
        record_store.expect_get_vaccination_records().never();
        record_store.expect_write_dedup_record().never();

        let mut sender = MockNotificationSender::new();
        sender.expect_send().never();

        let (cancel_tx, cancel) = watch::channel(false);
        cancel_tx.send(true).unwrap();

        let report = scheduler(
            pet_source(vec![due_pet(1), due_pet(2)]),
            record_store,
            sender,
            catalog(vec![dental_event()]),
        )
        .run_until_cancelled(now(), cancel)
        .await
        .unwrap();

        assert_eq!(report, RunReport::default());
    }

    #[tokio::test]
    async fn test_cancel_mid_run_finishes_claimed_send() {
        let (cancel_tx, cancel) = watch::channel(false);

        let mut record_store = MockRecordStore::new();
        record_store
            .expect_get_vaccination_records()
            .times(1)
            .returning(|_| Ok(vec![]));
        record_store
            .expect_get_recent_dedup_record()
            .times(1)
            .returning(|_, _, _, _| Ok(false));
        record_store
            .expect_write_dedup_record()
            .withf(|record, _| record.pet_id == 1)
            .times(1)
            .returning(|_, _| Ok(true));
        record_store
            .expect_confirm_dedup_record()
            .withf(|record| record.pet_id == 1)
            .times(1)
            .returning(|_| Ok(()));

        // ctrl-c arrives while the first pet's notification is in flight
        let mut sender = MockNotificationSender::new();
        sender.expect_send().times(1).returning(move |_| {
            cancel_tx.send_replace(true);
            Ok(())
        });

        let mut scheduler = scheduler(
            pet_source(vec![due_pet(1), due_pet(2)]),
            record_store,
            sender,
            catalog(vec![dental_event()]),
        );
        scheduler.settings.max_concurrent_pets = 1;

        let report = scheduler.run_until_cancelled(now(), cancel).await.unwrap();

        assert_eq!(
            report,
            RunReport {
                processed: 1,
                notifications_sent: 1,
                errors: 0,
                duplicates_suppressed: 0,
            }
        );
    }

    #[tokio::test]
    async fn test_run_sends_due_notification_once() {
        let mut record_store = MockRecordStore::new();
        record_store
            .expect_get_vaccination_records()
            .times(1)
            .returning(|_| Ok(vec![]));
        record_store
            .expect_get_recent_dedup_record()
            .withf(|pet_id, code, window, _| {
                *pet_id == 1 && code == "dog_dental" && window.within_hours == 48
            })
            .times(1)
            .returning(|_, _, _, _| Ok(false));
        record_store
            .expect_write_dedup_record()
            .withf(|record, _| record.pet_id == 1 && record.event_code == "dog_dental")
            .times(1)
            .returning(|_, _| Ok(true));
        record_store
            .expect_confirm_dedup_record()
            .withf(|record| record.pet_id == 1 && record.event_code == "dog_dental")
            .times(1)
            .returning(|_| Ok(()));
        record_store.expect_delete_dedup_record().never();

        let mut sender = MockNotificationSender::new();
        sender
            .expect_send()
            .withf(|notification| {
                notification.event_code == "dog_dental"
                    && notification.user_app_id == 101
                    && notification.due_date == NaiveDate::from_ymd_opt(2026, 1, 8).unwrap()
                    && notification.priority == Priority::Medium
            })
            .times(1)
            .returning(|_| Ok(()));

        let report = scheduler(
            pet_source(vec![due_pet(1)]),
            record_store,
            sender,
            catalog(vec![dental_event()]),
        )
        .run(now())
        .await
        .unwrap();

        assert_eq!(
            report,
            RunReport {
                processed: 1,
                notifications_sent: 1,
                errors: 0,
                duplicates_suppressed: 0,
            }
        );
    }

    #[tokio::test]
    async fn test_run_skips_already_notified_occurrence() {
        let mut record_store = MockRecordStore::new();
        record_store
            .expect_get_vaccination_records()
            .returning(|_| Ok(vec![]));
        record_store
            .expect_get_recent_dedup_record()
            .times(1)
            .returning(|_, _, _, _| Ok(true));
        record_store.expect_write_dedup_record().never();

        let mut sender = MockNotificationSender::new();
        sender.expect_send().never();

        let report = scheduler(
            pet_source(vec![due_pet(1)]),
            record_store,
            sender,
            catalog(vec![dental_event()]),
        )
        .run(now())
        .await
        .unwrap();

        assert_eq!(report.notifications_sent, 0);
        assert_eq!(report.duplicates_suppressed, 1);
        assert_eq!(report.errors, 0);
    }

    #[tokio::test]
    async fn test_run_skips_when_claim_is_lost() {
        let mut record_store = MockRecordStore::new();
        record_store
            .expect_get_vaccination_records()
            .returning(|_| Ok(vec![]));
        record_store
            .expect_get_recent_dedup_record()
            .returning(|_, _, _, _| Ok(false));
        record_store
            .expect_write_dedup_record()
            .times(1)
            .returning(|_, _| Ok(false));

        let mut sender = MockNotificationSender::new();
        sender.expect_send().never();

        let report = scheduler(
            pet_source(vec![due_pet(1)]),
            record_store,
            sender,
            catalog(vec![dental_event()]),
        )
        .run(now())
        .await
        .unwrap();

        assert_eq!(report.notifications_sent, 0);
        assert_eq!(report.duplicates_suppressed, 1);
    }

    #[tokio::test]
    async fn test_send_failure_releases_claim_and_counts_error() {
        let mut record_store = MockRecordStore::new();
        record_store
            .expect_get_vaccination_records()
            .returning(|_| Ok(vec![]));
        record_store
            .expect_get_recent_dedup_record()
            .returning(|_, _, _, _| Ok(false));
        record_store
            .expect_write_dedup_record()
            .returning(|_, _| Ok(true));
        record_store
            .expect_delete_dedup_record()
            .withf(|record| record.pet_id == 1 && record.event_code == "dog_dental")
            .times(1)
            .returning(|_| Ok(()));

        let mut sender = MockNotificationSender::new();
        sender
            .expect_send()
            .times(1)
            .returning(|_| Err(anyhow::anyhow!("channel unavailable")));

        let report = scheduler(
            pet_source(vec![due_pet(1)]),
            record_store,
            sender,
            catalog(vec![dental_event()]),
        )
        .run(now())
        .await
        .unwrap();

        assert_eq!(report.notifications_sent, 0);
        assert_eq!(report.errors, 1);
    }

    #[tokio::test]
    async fn test_one_pet_failure_does_not_abort_the_batch() {
        let mut record_store = MockRecordStore::new();
        record_store
            .expect_get_vaccination_records()
            .returning(|pet_id| {
                if pet_id == 1 {
                    Err(anyhow::anyhow!("Database connection error"))
                } else {
                    Ok(vec![])
                }
            });
        record_store
            .expect_get_recent_dedup_record()
            .returning(|_, _, _, _| Ok(false));
        record_store
            .expect_write_dedup_record()
            .withf(|record, _| record.pet_id == 2)
            .times(1)
            .returning(|_, _| Ok(true));
        record_store
            .expect_confirm_dedup_record()
            .times(1)
            .returning(|_| Ok(()));

        let mut sender = MockNotificationSender::new();
        sender
            .expect_send()
            .withf(|notification| notification.pet_id == 2)
            .times(1)
            .returning(|_| Ok(()));

        let report = scheduler(
            pet_source(vec![due_pet(1), due_pet(2)]),
            record_store,
            sender,
            catalog(vec![dental_event()]),
        )
        .run(now())
        .await
        .unwrap();

        assert_eq!(
            report,
            RunReport {
                processed: 2,
                notifications_sent: 1,
                errors: 1,
                duplicates_suppressed: 0,
            }
        );
    }

    #[tokio::test]
    async fn test_pet_without_birthday_is_not_an_error() {
        let pet = PetProfile {
            birthday: None,
            ..due_pet(1)
        };
        let mut record_store = MockRecordStore::new();
        record_store.expect_get_vaccination_records().never();

        let mut sender = MockNotificationSender::new();
        sender.expect_send().never();

        let report = scheduler(
            pet_source(vec![pet]),
            record_store,
            sender,
            catalog(vec![dental_event()]),
        )
        .run(now())
        .await
        .unwrap();

        assert_eq!(
            report,
            RunReport {
                processed: 1,
                ..Default::default()
            }
        );
    }

    #[tokio::test]
    async fn test_future_birthday_is_rejected() {
        let pet = PetProfile {
            birthday: Some(date(2027, 1, 1)),
            ..due_pet(1)
        };
        let mut record_store = MockRecordStore::new();
        record_store.expect_get_vaccination_records().never();

        let report = scheduler(
            pet_source(vec![pet]),
            record_store,
            MockNotificationSender::new(),
            catalog(vec![dental_event()]),
        )
        .run(now())
        .await
        .unwrap();

        assert_eq!(report.processed, 1);
        assert_eq!(report.errors, 1);
        assert_eq!(report.notifications_sent, 0);
    }

    #[tokio::test]
    async fn test_malformed_catalog_entry_counts_as_error() {
        let broken = HealthEventDefinition {
            code: "broken".into(),
            trigger_age_months: None,
            ..dental_event()
        };

        let report = scheduler(
            pet_source(vec![]),
            MockRecordStore::new(),
            MockNotificationSender::new(),
            catalog(vec![broken]),
        )
        .run(now())
        .await
        .unwrap();

        assert_eq!(report.errors, 1);
        assert_eq!(report.processed, 0);
    }

    #[tokio::test]
    async fn test_pet_source_failure_aborts_the_run() {
        let mut pet_source = MockPetSource::new();
        pet_source
            .expect_list_pets_with_birth_date_and_species()
            .times(1)
            .returning(|| Err(anyhow::anyhow!("Database connection error")));

        let result = scheduler(
            pet_source,
            MockRecordStore::new(),
            MockNotificationSender::new(),
            catalog(vec![dental_event()]),
        )
        .run(now())
        .await;

        assert!(result.is_err());
        assert!(
            format!("{:#}", result.unwrap_err()).contains("Database connection error")
        );
    }

    #[test]
    fn test_build_notification_mentions_dose() {
        let occurrence = Occurrence {
            code: "dog_rabies".into(),
            name: "Rabies".into(),
            target_date: date(2026, 1, 8),
            notification_lead_days: 7,
            priority: Priority::High,
            dose_number: Some(2),
        };

        let notification = build_notification(&due_pet(1), &occurrence, NotificationChannel::Sms);

        assert_eq!(notification.title, "Rabies reminder for pet-1");
        assert_eq!(
            notification.message,
            "Rabies (dose 2) for pet-1 is due on 2026-01-08."
        );
        assert_eq!(notification.channel, NotificationChannel::Sms);
    }
}
