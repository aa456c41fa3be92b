//! Canonical column names shared by every pipeline stage.

pub const EVENT_ID: &str = "event_id";
pub const USER_ID: &str = "user_id";
pub const SESSION_ID: &str = "session_id";
pub const EVENT_TYPE: &str = "event_type";
pub const EVENT_TIMESTAMP: &str = "event_timestamp";
pub const EVENT_DETAILS: &str = "event_details";

pub const TRANSACTION_ID: &str = "transaction_id";
pub const AMOUNT: &str = "amount";
pub const CURRENCY: &str = "currency";
pub const TRANSACTION_TIMESTAMP: &str = "transaction_timestamp";

pub const SIGNUP_DATE: &str = "signup_date";
pub const DEVICE_TYPE: &str = "device_type";
pub const COUNTRY: &str = "country";

pub const SESSION_START: &str = "session_start";
pub const TOTAL_EVENTS: &str = "total_events";
pub const EVENT_TYPE_LIST: &str = "event_type_list";

pub const USER_COUNTRY: &str = "user_country";
pub const USER_DEVICE: &str = "user_device";
pub const SESSION_START_TIME: &str = "session_start_time";
pub const IS_CONVERSION: &str = "is_conversion";
