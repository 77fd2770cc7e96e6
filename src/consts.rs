/// Months past a one-off event's trigger age after which it stops being recommended.
/// Applies to every catalog entry without a recurrence interval.
// TODO: confirm with product whether this window should become a per-event catalog field.
pub const ONE_OFF_GRACE_MONTHS: i64 = 3;

/// Days after the fire date during which a missed notification is still sent.
pub const FIRE_TOLERANCE_DAYS: i64 = 1;

/// Reference dedup lookback for a (pet, code) pair.
pub const DEFAULT_DEDUP_WINDOW_HOURS: u32 = 24;

/// Age after which a pending claim left by an interrupted run stops blocking.
pub const DEFAULT_CLAIM_TTL_SECS: u64 = 3600;

pub const HIGH_PRIORITY_MAX_DAYS: i64 = 7;
pub const MEDIUM_PRIORITY_MAX_DAYS: i64 = 14;

pub const DEFAULT_VACCINE_LEAD_DAYS: u32 = 7;

/// Built-in health event and vaccine catalog.
pub const DEFAULT_CATALOG_JSON: &str = include_str!("../data/catalog.json");

pub const INTERNAL_NOTIFICATIONS_PATH: &str = "/internal/notifications";
pub const INTERNAL_SECRET_HEADER: &str = "X-Internal-Secret";
