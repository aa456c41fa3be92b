use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::error::FrameError;
use crate::value::{DataType, Value};

/// Rows of loosely typed values under a fixed, ordered set of column names.
///
/// Transformations consume the table and hand back a new generation; nothing
/// is mutated in place, so a stage can never observe a half-transformed
/// input.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

/// An aggregation over one column, with the output column name it produces.
#[derive(Debug, Clone)]
pub struct AggExpr {
    op: AggOp,
    column: String,
    alias: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AggOp {
    First,
    Min,
    Count,
    CollectSet,
}

impl AggExpr {
    /// The value of the group's first row in ingestion order, nulls
    /// included.
    pub fn first(column: &str, alias: &str) -> Self {
        Self::new(AggOp::First, column, alias)
    }

    /// The smallest non-null value; null for an all-null group.
    pub fn min(column: &str, alias: &str) -> Self {
        Self::new(AggOp::Min, column, alias)
    }

    /// The number of non-null values.
    pub fn count(column: &str, alias: &str) -> Self {
        Self::new(AggOp::Count, column, alias)
    }

    /// The distinct non-null values, sorted by their rendered form so the
    /// output is reproducible across runs.
    pub fn collect_set(column: &str, alias: &str) -> Self {
        Self::new(AggOp::CollectSet, column, alias)
    }

    fn new(op: AggOp, column: &str, alias: &str) -> Self {
        Self {
            op,
            column: column.to_string(),
            alias: alias.to_string(),
        }
    }
}

enum AggState {
    First(Value),
    Min(Value),
    Count(i64),
    CollectSet(Vec<Value>),
}

impl AggState {
    fn init(op: AggOp, value: &Value) -> Self {
        match op {
            AggOp::First => AggState::First(value.clone()),
            AggOp::Min => AggState::Min(value.clone()),
            AggOp::Count => AggState::Count(i64::from(!value.is_null())),
            AggOp::CollectSet => {
                let mut seen = Vec::new();
                if !value.is_null() {
                    seen.push(value.clone());
                }
                AggState::CollectSet(seen)
            }
        }
    }

    fn update(&mut self, value: &Value) {
        if value.is_null() {
            return;
        }
        match self {
            AggState::First(_) => {}
            AggState::Min(current) => {
                let smaller = current.is_null()
                    || value.compare(current) == Some(Ordering::Less);
                if smaller {
                    *current = value.clone();
                }
            }
            AggState::Count(n) => *n += 1,
            AggState::CollectSet(seen) => {
                if !seen.contains(value) {
                    seen.push(value.clone());
                }
            }
        }
    }

    fn finish(self) -> Value {
        match self {
            AggState::First(v) | AggState::Min(v) => v,
            AggState::Count(n) => Value::Int(n),
            AggState::CollectSet(mut seen) => {
                seen.sort_by_key(Value::render);
                Value::List(seen)
            }
        }
    }
}

impl Table {
    pub fn new(columns: Vec<String>) -> Result<Self, FrameError> {
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.as_str()) {
                return Err(FrameError::DuplicateColumn(column.clone()));
            }
        }
        Ok(Self {
            columns,
            rows: Vec::new(),
        })
    }

    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self, FrameError> {
        let mut table = Self::new(columns)?;
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    pub fn push_row(&mut self, row: Vec<Value>) -> Result<(), FrameError> {
        if row.len() != self.columns.len() {
            return Err(FrameError::RowArity {
                expected: self.columns.len(),
                got: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Value]> {
        self.rows.iter().map(Vec::as_slice)
    }

    pub fn into_parts(self) -> (Vec<String>, Vec<Vec<Value>>) {
        (self.columns, self.rows)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Result<usize, FrameError> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| FrameError::ColumnNotFound(name.to_string()))
    }

    /// Cell lookup by position and column name.
    pub fn value(&self, row: usize, column: &str) -> Result<&Value, FrameError> {
        let index = self.column_index(column)?;
        Ok(&self.rows[row][index])
    }

    /// Re-type one column, nulling any value that does not convert. Bad
    /// values are row-local: the rest of the row and table are untouched.
    pub fn cast(mut self, column: &str, target: DataType) -> Result<Self, FrameError> {
        let index = self.column_index(column)?;
        for row in &mut self.rows {
            row[index] = row[index].cast(target);
        }
        Ok(self)
    }

    pub fn filter(mut self, predicate: impl Fn(&[Value]) -> bool) -> Self {
        self.rows.retain(|row| predicate(row));
        self
    }

    /// Append a rank column: rows are partitioned by `partition_by` and
    /// ranked 1.. by `order_by`. Nulls rank after every non-null value in
    /// either direction, and ties keep their ingestion order (the sort is
    /// stable), so ranking the same input twice yields the same ranks.
    pub fn rank_within_partition(
        mut self,
        partition_by: &[&str],
        order_by: &str,
        descending: bool,
        rank_column: &str,
    ) -> Result<Self, FrameError> {
        if self.columns.iter().any(|c| c == rank_column) {
            return Err(FrameError::DuplicateColumn(rank_column.to_string()));
        }
        let partition_indexes = self.resolve(partition_by)?;
        let order_index = self.column_index(order_by)?;

        let mut partitions: HashMap<String, Vec<usize>> = HashMap::new();
        for (position, row) in self.rows.iter().enumerate() {
            partitions
                .entry(composite_key(row, &partition_indexes))
                .or_default()
                .push(position);
        }

        let mut ranks = vec![0i64; self.rows.len()];
        for members in partitions.values() {
            let mut ordered = members.clone();
            ordered.sort_by(|&a, &b| {
                order_with_nulls_last(
                    &self.rows[a][order_index],
                    &self.rows[b][order_index],
                    descending,
                )
            });
            for (rank, &position) in ordered.iter().enumerate() {
                ranks[position] = rank as i64 + 1;
            }
        }

        self.columns.push(rank_column.to_string());
        for (row, rank) in self.rows.iter_mut().zip(ranks) {
            row.push(Value::Int(rank));
        }
        Ok(self)
    }

    /// Fold rows into one output row per distinct `group_by` key. Groups are
    /// emitted in first-seen order.
    pub fn group_aggregate(
        self,
        group_by: &[&str],
        aggregations: &[AggExpr],
    ) -> Result<Self, FrameError> {
        let group_indexes = self.resolve(group_by)?;
        let agg_indexes = aggregations
            .iter()
            .map(|agg| self.column_index(&agg.column))
            .collect::<Result<Vec<_>, _>>()?;

        let mut output_columns: Vec<String> =
            group_by.iter().map(|c| (*c).to_string()).collect();
        output_columns.extend(aggregations.iter().map(|agg| agg.alias.clone()));

        let mut group_of: HashMap<String, usize> = HashMap::new();
        let mut keys: Vec<Vec<Value>> = Vec::new();
        let mut states: Vec<Vec<AggState>> = Vec::new();

        for row in &self.rows {
            let key = composite_key(row, &group_indexes);
            match group_of.get(&key) {
                Some(&group) => {
                    for (state, &index) in states[group].iter_mut().zip(&agg_indexes) {
                        state.update(&row[index]);
                    }
                }
                None => {
                    group_of.insert(key, keys.len());
                    keys.push(group_indexes.iter().map(|&i| row[i].clone()).collect());
                    states.push(
                        aggregations
                            .iter()
                            .zip(&agg_indexes)
                            .map(|(agg, &index)| AggState::init(agg.op, &row[index]))
                            .collect(),
                    );
                }
            }
        }

        let rows = keys
            .into_iter()
            .zip(states)
            .map(|(mut key, group_states)| {
                key.extend(group_states.into_iter().map(AggState::finish));
                key
            })
            .collect();
        Self::from_rows(output_columns, rows)
    }

    /// Left-preserving join on equality of `on`. Every left row survives;
    /// rows without a match get nulls for the right-side columns, rows with
    /// several matches fan out once per match, in right-row order. A null
    /// join key never matches anything.
    pub fn left_join(self, right: &Table, on: &[&str]) -> Result<Self, FrameError> {
        let left_keys = self.resolve(on)?;
        let right_keys = right.resolve(on)?;

        let payload_indexes: Vec<usize> = (0..right.columns.len())
            .filter(|i| !right_keys.contains(i))
            .collect();
        for &index in &payload_indexes {
            if self.columns.contains(&right.columns[index]) {
                return Err(FrameError::DuplicateColumn(right.columns[index].clone()));
            }
        }

        let mut matches: HashMap<String, Vec<usize>> = HashMap::new();
        for (position, row) in right.rows.iter().enumerate() {
            if right_keys.iter().any(|&i| row[i].is_null()) {
                continue;
            }
            matches
                .entry(composite_key(row, &right_keys))
                .or_default()
                .push(position);
        }

        let mut columns = self.columns.clone();
        columns.extend(payload_indexes.iter().map(|&i| right.columns[i].clone()));

        let mut rows = Vec::with_capacity(self.rows.len());
        for row in self.rows {
            let matched = if left_keys.iter().any(|&i| row[i].is_null()) {
                None
            } else {
                matches.get(&composite_key(&row, &left_keys))
            };
            match matched {
                Some(positions) => {
                    for &position in positions {
                        let mut joined = row.clone();
                        joined.extend(
                            payload_indexes
                                .iter()
                                .map(|&i| right.rows[position][i].clone()),
                        );
                        rows.push(joined);
                    }
                }
                None => {
                    let mut joined = row;
                    joined.extend(payload_indexes.iter().map(|_| Value::Null));
                    rows.push(joined);
                }
            }
        }
        Self::from_rows(columns, rows)
    }

    /// Project onto `columns`, in the given order.
    pub fn select(self, columns: &[&str]) -> Result<Self, FrameError> {
        let indexes = self.resolve(columns)?;
        let selected = columns.iter().map(|c| (*c).to_string()).collect();
        let rows = self
            .rows
            .into_iter()
            .map(|mut row| {
                indexes
                    .iter()
                    .map(|&i| std::mem::replace(&mut row[i], Value::Null))
                    .collect()
            })
            .collect();
        Self::from_rows(selected, rows)
    }

    pub fn rename(mut self, from: &str, to: &str) -> Result<Self, FrameError> {
        if self.columns.iter().any(|c| c == to) {
            return Err(FrameError::DuplicateColumn(to.to_string()));
        }
        let index = self.column_index(from)?;
        self.columns[index] = to.to_string();
        Ok(self)
    }

    /// Append a column derived from each row.
    pub fn with_column(
        mut self,
        name: &str,
        derive: impl Fn(&[Value]) -> Value,
    ) -> Result<Self, FrameError> {
        if self.columns.iter().any(|c| c == name) {
            return Err(FrameError::DuplicateColumn(name.to_string()));
        }
        for row in &mut self.rows {
            let value = derive(row);
            row.push(value);
        }
        self.columns.push(name.to_string());
        Ok(self)
    }

    pub fn drop_column(mut self, name: &str) -> Result<Self, FrameError> {
        let index = self.column_index(name)?;
        self.columns.remove(index);
        for row in &mut self.rows {
            row.remove(index);
        }
        Ok(self)
    }

    fn resolve(&self, columns: &[&str]) -> Result<Vec<usize>, FrameError> {
        columns.iter().map(|c| self.column_index(c)).collect()
    }
}

fn order_with_nulls_last(a: &Value, b: &Value, descending: bool) -> Ordering {
    match (a.is_null(), b.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => {
            let order = a.compare(b).unwrap_or(Ordering::Equal);
            if descending {
                order.reverse()
            } else {
                order
            }
        }
    }
}

// Key values are composited by rendered form with separators no rendered
// value contains; null gets its own tag so it can never collide with the
// empty string.
fn key_part(value: &Value) -> String {
    if value.is_null() {
        "\u{0}".to_string()
    } else {
        value.render()
    }
}

fn composite_key(row: &[Value], indexes: &[usize]) -> String {
    indexes
        .iter()
        .map(|&i| key_part(&row[i]))
        .collect::<Vec<_>>()
        .join("\u{1f}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn ts(minute: u32) -> Value {
        Value::Timestamp(Utc.with_ymd_and_hms(2024, 1, 1, 10, minute, 0).unwrap())
    }

    fn s(v: &str) -> Value {
        Value::Str(v.to_string())
    }

    fn events() -> Table {
        Table::from_rows(
            vec!["event_id".to_string(), "event_timestamp".to_string()],
            vec![
                vec![s("E1"), ts(0)],
                vec![s("E1"), ts(5)],
                vec![s("E2"), ts(10)],
                vec![s("E3"), Value::Null],
                vec![s("E3"), ts(2)],
            ],
        )
        .unwrap()
    }

    #[test]
    fn rank_puts_most_recent_first_and_nulls_last() {
        let ranked = events()
            .rank_within_partition(&["event_id"], "event_timestamp", true, "rn")
            .unwrap();
        let rank = ranked.column_index("rn").unwrap();
        let id = ranked.column_index("event_id").unwrap();
        let stamp = ranked.column_index("event_timestamp").unwrap();

        let kept: Vec<&[Value]> = ranked
            .rows()
            .filter(|row| row[rank] == Value::Int(1))
            .collect();
        assert_eq!(kept.len(), 3);
        for row in kept {
            match row[id].as_str().unwrap() {
                "E1" => assert_eq!(row[stamp], ts(5)),
                "E2" => assert_eq!(row[stamp], ts(10)),
                "E3" => assert_eq!(row[stamp], ts(2)),
                other => panic!("unexpected event {other}"),
            }
        }
    }

    #[test]
    fn rank_breaks_ties_by_ingestion_order() {
        let table = Table::from_rows(
            vec!["event_id".to_string(), "event_timestamp".to_string(), "n".to_string()],
            vec![
                vec![s("E1"), ts(5), Value::Int(0)],
                vec![s("E1"), ts(5), Value::Int(1)],
                vec![s("E1"), ts(5), Value::Int(2)],
            ],
        )
        .unwrap();
        let ranked = table
            .rank_within_partition(&["event_id"], "event_timestamp", true, "rn")
            .unwrap();
        let rank = ranked.column_index("rn").unwrap();
        let n = ranked.column_index("n").unwrap();
        let winner = ranked
            .rows()
            .find(|row| row[rank] == Value::Int(1))
            .unwrap();
        assert_eq!(winner[n], Value::Int(0));
    }

    #[test]
    fn rank_keeps_row_order_and_appends_column() {
        let ranked = events()
            .rank_within_partition(&["event_id"], "event_timestamp", true, "rn")
            .unwrap();
        assert_eq!(ranked.len(), 5);
        assert_eq!(
            ranked.columns(),
            &["event_id", "event_timestamp", "rn"]
        );
        // Original ingestion order is untouched.
        assert_eq!(ranked.value(0, "event_id").unwrap(), &s("E1"));
        assert_eq!(ranked.value(0, "rn").unwrap(), &Value::Int(2));
    }

    #[test]
    fn group_aggregate_min_count_collect_set() {
        let table = Table::from_rows(
            vec![
                "session_id".to_string(),
                "event_timestamp".to_string(),
                "event_type".to_string(),
            ],
            vec![
                vec![s("S1"), ts(10), s("checkout")],
                vec![s("S1"), ts(0), s("login")],
                vec![s("S1"), ts(5), s("login")],
                vec![s("S2"), Value::Null, s("logout")],
            ],
        )
        .unwrap();
        let grouped = table
            .group_aggregate(
                &["session_id"],
                &[
                    AggExpr::min("event_timestamp", "session_start"),
                    AggExpr::count("event_type", "total_events"),
                    AggExpr::collect_set("event_type", "event_type_list"),
                ],
            )
            .unwrap();

        assert_eq!(grouped.len(), 2);
        // Groups come out in first-seen order.
        assert_eq!(grouped.value(0, "session_id").unwrap(), &s("S1"));
        assert_eq!(grouped.value(0, "session_start").unwrap(), &ts(0));
        assert_eq!(grouped.value(0, "total_events").unwrap(), &Value::Int(3));
        assert_eq!(
            grouped.value(0, "event_type_list").unwrap(),
            &Value::List(vec![s("checkout"), s("login")])
        );
        // All-null input leaves min null.
        assert_eq!(grouped.value(1, "session_start").unwrap(), &Value::Null);
        assert_eq!(grouped.value(1, "total_events").unwrap(), &Value::Int(1));
    }

    #[test]
    fn left_join_pads_and_fans_out() {
        let sessions = Table::from_rows(
            vec!["session_id".to_string(), "user_id".to_string()],
            vec![vec![s("S1"), s("U1")], vec![s("S2"), s("U2")]],
        )
        .unwrap();
        let transactions = Table::from_rows(
            vec![
                "session_id".to_string(),
                "user_id".to_string(),
                "transaction_id".to_string(),
            ],
            vec![
                vec![s("S1"), s("U1"), s("T1")],
                vec![s("S1"), s("U1"), s("T2")],
            ],
        )
        .unwrap();

        let joined = sessions
            .left_join(&transactions, &["session_id", "user_id"])
            .unwrap();
        assert_eq!(joined.len(), 3);
        assert_eq!(joined.value(0, "transaction_id").unwrap(), &s("T1"));
        assert_eq!(joined.value(1, "transaction_id").unwrap(), &s("T2"));
        assert_eq!(joined.value(2, "transaction_id").unwrap(), &Value::Null);
    }

    #[test]
    fn left_join_null_keys_never_match() {
        let left = Table::from_rows(
            vec!["user_id".to_string()],
            vec![vec![Value::Null], vec![s("U1")]],
        )
        .unwrap();
        let right = Table::from_rows(
            vec!["user_id".to_string(), "country".to_string()],
            vec![vec![Value::Null, s("Peru")], vec![s("U1"), s("Mexico")]],
        )
        .unwrap();
        let joined = left.left_join(&right, &["user_id"]).unwrap();
        assert_eq!(joined.len(), 2);
        assert_eq!(joined.value(0, "country").unwrap(), &Value::Null);
        assert_eq!(joined.value(1, "country").unwrap(), &s("Mexico"));
    }

    #[test]
    fn left_join_rejects_column_collisions() {
        let left = Table::from_rows(
            vec!["user_id".to_string(), "country".to_string()],
            vec![vec![s("U1"), s("Peru")]],
        )
        .unwrap();
        let right = left.clone();
        let result = left.left_join(&right, &["user_id"]);
        assert!(matches!(result, Err(FrameError::DuplicateColumn(c)) if c == "country"));
    }

    #[test]
    fn select_rename_with_column_drop_column() {
        let table = Table::from_rows(
            vec!["a".to_string(), "b".to_string()],
            vec![vec![Value::Int(1), Value::Int(2)]],
        )
        .unwrap();
        let table = table
            .with_column("sum", |row| {
                Value::Float(row.iter().filter_map(Value::as_f64).sum())
            })
            .unwrap()
            .rename("a", "first")
            .unwrap()
            .select(&["sum", "first"])
            .unwrap();
        assert_eq!(table.columns(), &["sum", "first"]);
        assert_eq!(table.value(0, "sum").unwrap(), &Value::Float(3.0));

        let table = table.drop_column("sum").unwrap();
        assert_eq!(table.columns(), &["first"]);
    }

    #[test]
    fn cast_is_row_local() {
        let table = Table::from_rows(
            vec!["ts".to_string()],
            vec![vec![s("2024-01-01T10:00:00Z")], vec![s("garbage")]],
        )
        .unwrap();
        let cast = table.cast("ts", DataType::Timestamp).unwrap();
        assert_eq!(cast.len(), 2);
        assert!(matches!(cast.value(0, "ts").unwrap(), Value::Timestamp(_)));
        assert_eq!(cast.value(1, "ts").unwrap(), &Value::Null);
    }
}
