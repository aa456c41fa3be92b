use serde::{Deserialize, Serialize};

pub const COUNTRIES: [&str; 3] = ["Peru", "Mexico", "Colombia"];

pub const EVENT_TYPES: [&str; 5] = ["login", "view_product", "add_to_cart", "checkout", "logout"];

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum DeviceType {
    #[serde(rename = "iOS")]
    Ios,
    Android,
    Web,
}

impl DeviceType {
    pub const ALL: [DeviceType; 3] = [DeviceType::Ios, DeviceType::Android, DeviceType::Web];

    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Ios => "iOS",
            DeviceType::Android => "Android",
            DeviceType::Web => "Web",
        }
    }
}

/// One row of the user dimension file. `user_id` is unique within the file.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UserRecord {
    pub user_id: String,
    pub signup_date: String,
    pub device_type: DeviceType,
    pub country: String,
}
