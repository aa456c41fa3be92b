pub const EVENTS_INGESTED: &str = "etl_raw_events_ingested";
pub const TRANSACTIONS_INGESTED: &str = "etl_raw_transactions_ingested";
pub const USERS_INGESTED: &str = "etl_raw_users_ingested";

pub const DUPLICATE_EVENTS_DROPPED: &str = "etl_duplicate_events_dropped";
pub const SESSIONS_AGGREGATED: &str = "etl_sessions_aggregated";
pub const GOLD_ROWS_WRITTEN: &str = "etl_gold_rows_written";
