use common_types::columns;
use dataframe::{FrameError, Table, Value};

const ROW_NUMBER: &str = "row_number";

/// Collapse the cleaned event stream to exactly one row per `event_id`,
/// keeping the most recent version. Null timestamps rank after every
/// non-null one; rows tied on timestamp fall back to ingestion order, with
/// the earliest-ingested row winning, so repeated runs over the same input
/// keep the identical row.
pub fn dedup_events(events: Table) -> Result<Table, FrameError> {
    let ranked = events.rank_within_partition(
        &[columns::EVENT_ID],
        columns::EVENT_TIMESTAMP,
        true,
        ROW_NUMBER,
    )?;
    let rank = ranked.column_index(ROW_NUMBER)?;
    ranked
        .filter(|row| row[rank] == Value::Int(1))
        .drop_column(ROW_NUMBER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::collections::HashSet;

    fn ts(minute: u32) -> Value {
        Value::Timestamp(Utc.with_ymd_and_hms(2024, 1, 1, 10, minute, 0).unwrap())
    }

    fn s(v: &str) -> Value {
        Value::Str(v.to_string())
    }

    fn table(rows: Vec<Vec<Value>>) -> Table {
        Table::from_rows(
            vec![
                columns::EVENT_ID.to_string(),
                columns::EVENT_TIMESTAMP.to_string(),
            ],
            rows,
        )
        .unwrap()
    }

    #[test]
    fn output_has_no_duplicate_event_ids() {
        let deduped = dedup_events(table(vec![
            vec![s("E1"), ts(0)],
            vec![s("E1"), ts(5)],
            vec![s("E2"), ts(10)],
            vec![s("E1"), ts(3)],
        ]))
        .unwrap();
        let ids: HashSet<String> = deduped
            .rows()
            .map(|row| row[0].as_str().unwrap().to_string())
            .collect();
        assert_eq!(deduped.len(), ids.len());
        assert_eq!(ids.len(), 2);
    }

    #[test]
    fn most_recent_version_wins() {
        let deduped = dedup_events(table(vec![
            vec![s("E1"), ts(0)],
            vec![s("E1"), ts(5)],
        ]))
        .unwrap();
        assert_eq!(deduped.len(), 1);
        assert_eq!(deduped.value(0, columns::EVENT_TIMESTAMP).unwrap(), &ts(5));
    }

    #[test]
    fn null_timestamp_loses_to_any_real_one() {
        let deduped = dedup_events(table(vec![
            vec![s("E1"), Value::Null],
            vec![s("E1"), ts(1)],
        ]))
        .unwrap();
        assert_eq!(deduped.len(), 1);
        assert_eq!(deduped.value(0, columns::EVENT_TIMESTAMP).unwrap(), &ts(1));
    }

    #[test]
    fn all_null_group_still_emits_one_row() {
        let deduped = dedup_events(table(vec![
            vec![s("E1"), Value::Null],
            vec![s("E1"), Value::Null],
        ]))
        .unwrap();
        assert_eq!(deduped.len(), 1);
    }

    #[test]
    fn rank_column_does_not_leak_into_output() {
        let deduped = dedup_events(table(vec![vec![s("E1"), ts(0)]])).unwrap();
        assert_eq!(
            deduped.columns(),
            &[columns::EVENT_ID, columns::EVENT_TIMESTAMP]
        );
    }

    #[test]
    fn rerun_keeps_the_same_tied_row() {
        // Two versions at the same timestamp, distinguished by a payload
        // column; the earliest-ingested one must win every run.
        let make = || {
            Table::from_rows(
                vec![
                    columns::EVENT_ID.to_string(),
                    columns::EVENT_TIMESTAMP.to_string(),
                    "payload".to_string(),
                ],
                vec![
                    vec![s("E1"), ts(5), s("first")],
                    vec![s("E1"), ts(5), s("second")],
                ],
            )
            .unwrap()
        };
        let first_run = dedup_events(make()).unwrap();
        let second_run = dedup_events(make()).unwrap();
        assert_eq!(first_run, second_run);
        assert_eq!(first_run.value(0, "payload").unwrap(), &s("first"));
    }
}
