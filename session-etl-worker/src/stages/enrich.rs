use common_types::{columns, GOLD_COLUMNS};
use dataframe::{FrameError, Table, Value};

/// Produce the gold table: session metrics widened with user dimension
/// attributes and transaction facts, both through left-preserving joins.
///
/// Sessions of unknown users keep null country/device. A session with no
/// matching transaction yields one row with null transaction fields; one
/// with several yields one row per transaction. `is_conversion` is derived
/// from the presence of a transaction_id after the join.
pub fn enrich_sessions(
    sessions: Table,
    users: Table,
    transactions: Table,
) -> Result<Table, FrameError> {
    let users = users.select(&[columns::USER_ID, columns::COUNTRY, columns::DEVICE_TYPE])?;
    let enriched = sessions.left_join(&users, &[columns::USER_ID])?;

    let transactions = transactions.select(&[
        columns::SESSION_ID,
        columns::USER_ID,
        columns::TRANSACTION_ID,
        columns::AMOUNT,
        columns::CURRENCY,
    ])?;
    let joined = enriched.left_join(&transactions, &[columns::SESSION_ID, columns::USER_ID])?;

    let event_types = joined.column_index(columns::EVENT_TYPE_LIST)?;
    let joined = joined.with_column(columns::EVENT_TYPE, |row| {
        Value::Str(row[event_types].render())
    })?;
    let transaction_id = joined.column_index(columns::TRANSACTION_ID)?;
    let joined = joined.with_column(columns::IS_CONVERSION, |row| {
        Value::Bool(!row[transaction_id].is_null())
    })?;

    joined
        .rename(columns::COUNTRY, columns::USER_COUNTRY)?
        .rename(columns::DEVICE_TYPE, columns::USER_DEVICE)?
        .rename(columns::SESSION_START, columns::SESSION_START_TIME)?
        .select(&GOLD_COLUMNS)
}
