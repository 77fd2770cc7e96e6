pub const QUERY_CREATE_SCHEMA: &str = include_str!("../../migrations/0001_pet_health.sql");

pub const QUERY_LIST_PETS_WITH_BIRTHDAY_AND_SPECIES: &str = r#"
SELECT
    id,user_app_id,pet_name,species,birthday
FROM pet
WHERE
    birthday IS NOT NULL AND
    species IS NOT NULL
ORDER BY id;
"#;

pub const QUERY_GET_PET_BY_ID: &str = r#"
SELECT
    id,user_app_id,pet_name,species,birthday
FROM pet
WHERE id=$1;
"#;

pub const QUERY_INSERT_PET: &str = r#"
INSERT INTO pet (
    user_app_id,pet_name,species,birthday
) VALUES($1,$2,$3,$4);
"#;

pub const QUERY_GET_VACCINATION_RECORDS: &str = r#"
SELECT
    id,pet_id,vaccine_code,dose_number,completed_date,scheduled_date
FROM vaccination_record
WHERE pet_id=$1
ORDER BY vaccine_code,dose_number;
"#;

pub const QUERY_INSERT_VACCINATION_RECORD: &str = r#"
INSERT INTO vaccination_record (
    pet_id,vaccine_code,dose_number,completed_date,scheduled_date
) VALUES($1,$2,$3,$4,$5);
"#;

pub const QUERY_EXISTS_RECENT_DEDUP: &str = r#"
SELECT EXISTS(
    SELECT 1 FROM notification_dedup
    WHERE
        pet_id=$1 AND
        event_code=$2 AND (
            (status='sent' AND julianday(fired_at) > julianday($3)) OR
            (status='pending' AND julianday(fired_at) > julianday($4))
        )
);
"#;

/// Conditional insert: one statement, so the check and the write are atomic.
pub const QUERY_INSERT_DEDUP_IF_ABSENT: &str = r#"
INSERT INTO notification_dedup (pet_id,event_code,fired_at,status)
SELECT $1,$2,$3,'pending'
WHERE NOT EXISTS (
    SELECT 1 FROM notification_dedup
    WHERE
        pet_id=$1 AND
        event_code=$2 AND (
            (status='sent' AND julianday(fired_at) > julianday($4)) OR
            (status='pending' AND julianday(fired_at) > julianday($5))
        )
);
"#;

pub const QUERY_CONFIRM_DEDUP: &str = r#"
UPDATE notification_dedup SET status='sent'
WHERE pet_id=$1 AND event_code=$2 AND fired_at=$3 AND status='pending';
"#;

pub const QUERY_DELETE_DEDUP: &str = r#"
DELETE FROM notification_dedup
WHERE pet_id=$1 AND event_code=$2 AND fired_at=$3 AND status='pending';
"#;
