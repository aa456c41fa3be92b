use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("column not found: {0}")]
    ColumnNotFound(String),

    #[error("duplicate column: {0}")]
    DuplicateColumn(String),

    #[error("row arity mismatch: table has {expected} columns, row has {got}")]
    RowArity { expected: usize, got: usize },

    #[error("reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("csv data in {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("malformed json record in {path} at line {line}: {source}")]
    Json {
        path: String,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("record in {path} at line {line} is not a json object")]
    NotARecord { path: String, line: usize },

    #[error("{path} does not match the column layout of the first file read")]
    SchemaMismatch { path: String },
}
