use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::error::FrameError;
use crate::table::Table;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    /// One JSON object per line. Columns are the union of keys across all
    /// records, in first-seen order; keys absent from a record read as null.
    JsonLines,
    /// Delimited text. With `header: false`, columns are named positionally
    /// (`_c0`, `_c1`, ...).
    Csv { header: bool },
}

/// Read one file, or every file of a directory in lexicographic filename
/// order - the ingestion order downstream tie-breaks rely on.
pub fn read_tabular(path: &Path, format: &TableFormat) -> Result<Table, FrameError> {
    let files = source_files(path)?;
    match format {
        TableFormat::JsonLines => read_json_lines(&files),
        TableFormat::Csv { header } => read_csv(&files, *header),
    }
}

/// Write the table, replacing whatever was at `path`. The content goes to a
/// temp sibling first and is renamed over the target, so a crashed run
/// leaves either the old table or the new one, never a torn file.
pub fn write_table(table: &Table, path: &Path, format: &TableFormat) -> Result<(), FrameError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
    }
    let staged = staging_path(path);

    let mut buffer = Vec::new();
    match format {
        TableFormat::JsonLines => {
            for row in table.rows() {
                let mut record = serde_json::Map::new();
                for (column, value) in table.columns().iter().zip(row) {
                    record.insert(column.clone(), value.to_json());
                }
                let line = serde_json::Value::Object(record).to_string();
                buffer.extend_from_slice(line.as_bytes());
                buffer.push(b'\n');
            }
        }
        TableFormat::Csv { header } => {
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(&mut buffer);
            if *header {
                writer
                    .write_record(table.columns())
                    .map_err(|e| csv_error(path, e))?;
            }
            for row in table.rows() {
                writer
                    .write_record(row.iter().map(Value::render))
                    .map_err(|e| csv_error(path, e))?;
            }
            writer.flush().map_err(|e| io_error(path, e))?;
            drop(writer);
        }
    }

    let mut file = fs::File::create(&staged).map_err(|e| io_error(&staged, e))?;
    file.write_all(&buffer).map_err(|e| io_error(&staged, e))?;
    file.sync_all().map_err(|e| io_error(&staged, e))?;
    fs::rename(&staged, path).map_err(|e| io_error(path, e))?;
    Ok(())
}

fn source_files(path: &Path) -> Result<Vec<PathBuf>, FrameError> {
    let metadata = fs::metadata(path).map_err(|e| io_error(path, e))?;
    if !metadata.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }
    let mut files = Vec::new();
    for entry in fs::read_dir(path).map_err(|e| io_error(path, e))? {
        let entry = entry.map_err(|e| io_error(path, e))?;
        if entry.file_type().map_err(|e| io_error(path, e))?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

fn read_json_lines(files: &[PathBuf]) -> Result<Table, FrameError> {
    let mut columns: Vec<String> = Vec::new();
    let mut index_of: HashMap<String, usize> = HashMap::new();
    let mut rows: Vec<Vec<Value>> = Vec::new();

    for path in files {
        let content = fs::read_to_string(path).map_err(|e| io_error(path, e))?;
        let lines: Vec<(usize, &str)> = content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .collect();

        let parsed: Vec<(usize, Result<serde_json::Value, serde_json::Error>)> = lines
            .into_par_iter()
            .map(|(number, line)| (number, serde_json::from_str(line)))
            .collect();

        for (number, result) in parsed {
            let record = result.map_err(|e| FrameError::Json {
                path: display(path),
                line: number + 1,
                source: e,
            })?;
            let serde_json::Value::Object(fields) = record else {
                return Err(FrameError::NotARecord {
                    path: display(path),
                    line: number + 1,
                });
            };
            let mut row = vec![Value::Null; columns.len()];
            for (key, value) in fields {
                let column = *index_of.entry(key.clone()).or_insert_with(|| {
                    columns.push(key);
                    columns.len() - 1
                });
                if column >= row.len() {
                    row.resize(column + 1, Value::Null);
                }
                row[column] = Value::from_json(value);
            }
            rows.push(row);
        }
    }

    // Records seen before a late-appearing key are shorter; pad them out.
    for row in &mut rows {
        row.resize(columns.len(), Value::Null);
    }
    Table::from_rows(columns, rows)
}

fn read_csv(files: &[PathBuf], header: bool) -> Result<Table, FrameError> {
    let mut files = files.iter();
    let Some(first) = files.next() else {
        return Table::new(Vec::new());
    };
    let mut merged = read_csv_file(first, header)?;
    for path in files {
        let table = read_csv_file(path, header)?;
        if table.columns() != merged.columns() {
            return Err(FrameError::SchemaMismatch { path: display(path) });
        }
        let (_, rows) = table.into_parts();
        for row in rows {
            merged.push_row(row)?;
        }
    }
    Ok(merged)
}

fn read_csv_file(path: &Path, header: bool) -> Result<Table, FrameError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(header)
        .from_path(path)
        .map_err(|e| csv_error(path, e))?;

    let first_record = reader.headers().map_err(|e| csv_error(path, e))?;
    let columns: Vec<String> = if header {
        first_record.iter().map(str::to_string).collect()
    } else {
        (0..first_record.len()).map(|i| format!("_c{i}")).collect()
    };

    let mut table = Table::new(columns)?;
    for record in reader.records() {
        let record = record.map_err(|e| csv_error(path, e))?;
        let row = record
            .iter()
            .map(|field| {
                if field.is_empty() {
                    Value::Null
                } else {
                    Value::Str(field.to_string())
                }
            })
            .collect();
        table.push_row(row)?;
    }
    Ok(table)
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    name.push_str(".tmp");
    path.with_file_name(name)
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

fn io_error(path: &Path, source: std::io::Error) -> FrameError {
    FrameError::Io {
        path: display(path),
        source,
    }
}

fn csv_error(path: &Path, source: csv::Error) -> FrameError {
    FrameError::Csv {
        path: display(path),
        source,
    }
}
