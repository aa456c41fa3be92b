use serde::{Deserialize, Serialize};
use serde_json::Value;

// One raw event as it appears on the bronze JSON-lines feed. The feed may
// carry several versions of the same event_id (upstream retries and
// reprocessing), each with its own timestamp - the silver layer keeps only
// the most recent one.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RawEvent {
    pub event_id: String,
    pub user_id: String,
    pub session_id: String,
    pub event_type: String,
    // Kept as the wire string; typing happens in the silver cast, where an
    // unparseable value degrades to null rather than failing the run.
    pub event_timestamp: String,
    #[serde(default)]
    pub event_details: Value,
}
