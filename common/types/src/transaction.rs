use serde::{Deserialize, Serialize};

/// The single currency the upstream payments system settles in.
pub const CURRENCY: &str = "SOL";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RawTransaction {
    pub transaction_id: String,
    pub session_id: String,
    pub user_id: String,
    pub amount: f64,
    pub currency: String,
    pub transaction_timestamp: String,
}
