mod event;
mod gold;
mod transaction;
mod user;

pub mod columns;

// Events
pub use event::RawEvent;

// Transactions
pub use transaction::RawTransaction;
pub use transaction::CURRENCY;

// Users
pub use user::DeviceType;
pub use user::UserRecord;
pub use user::COUNTRIES;
pub use user::EVENT_TYPES;

// Gold
pub use gold::GoldRecord;
pub use gold::GOLD_COLUMNS;
