use common_types::columns;
use dataframe::{DataType, FrameError, Table};

/// Silver typing for the raw event feed: `event_timestamp` becomes a real
/// instant. An unparseable value degrades to null (unknown, sorts last in
/// the dedup ranking) rather than failing the run.
pub fn clean_events(raw: Table) -> Result<Table, FrameError> {
    raw.cast(columns::EVENT_TIMESTAMP, DataType::Timestamp)
}

/// Silver typing for the transaction feed: numeric amount, instant
/// timestamp. Same row-local degradation as events.
pub fn clean_transactions(raw: Table) -> Result<Table, FrameError> {
    raw.cast(columns::AMOUNT, DataType::Float)?
        .cast(columns::TRANSACTION_TIMESTAMP, DataType::Timestamp)
}
