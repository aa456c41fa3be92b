use common_types::columns;
use dataframe::{AggExpr, FrameError, Table};

/// Fold deduplicated events into one row per (session_id, user_id):
/// earliest event instant, event count, and the distinct event types seen.
///
/// `session_start` is an explicit minimum rather than "whichever row the
/// engine happened to see first", so the result does not depend on input
/// ordering. A session_id that shows up under two user_ids (corrupt input)
/// simply yields two groups; that split is accepted, not repaired.
pub fn session_metrics(events: Table) -> Result<Table, FrameError> {
    events.group_aggregate(
        &[columns::SESSION_ID, columns::USER_ID],
        &[
            AggExpr::min(columns::EVENT_TIMESTAMP, columns::SESSION_START),
            AggExpr::count(columns::EVENT_ID, columns::TOTAL_EVENTS),
            AggExpr::collect_set(columns::EVENT_TYPE, columns::EVENT_TYPE_LIST),
        ],
    )
}
