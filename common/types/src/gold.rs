use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The gold `user_session_analysis` column set, in persisted order.
pub const GOLD_COLUMNS: [&str; 11] = [
    "session_id",
    "user_id",
    "user_country",
    "user_device",
    "session_start_time",
    "total_events",
    "event_type",
    "transaction_id",
    "amount",
    "currency",
    "is_conversion",
];

/// One row of the gold table: a session, its user dimension attributes, and
/// at most one transaction. A session with several transactions appears once
/// per transaction; a session with none appears once with the transaction
/// fields null and `is_conversion` false.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct GoldRecord {
    pub session_id: String,
    pub user_id: String,
    pub user_country: Option<String>,
    pub user_device: Option<String>,
    pub session_start_time: Option<DateTime<Utc>>,
    pub total_events: i64,
    pub event_type: String,
    pub transaction_id: Option<String>,
    pub amount: Option<f64>,
    pub currency: Option<String>,
    pub is_conversion: bool,
}
