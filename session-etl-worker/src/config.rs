use std::path::{Path, PathBuf};

use envconfig::Envconfig;

/// The resolved set of input and output locations for one run. Raw paths
/// may point at a single file or at a directory of part files.
#[derive(Envconfig, Clone, Debug)]
pub struct Config {
    #[envconfig(from = "RAW_EVENTS_PATH", default = "data/bronze/events")]
    pub raw_events_path: String,

    #[envconfig(from = "RAW_TRANSACTIONS_PATH", default = "data/bronze/transactions")]
    pub raw_transactions_path: String,

    #[envconfig(from = "RAW_USERS_PATH", default = "data/bronze/users")]
    pub raw_users_path: String,

    #[envconfig(from = "SILVER_OUTPUT_DIR", default = "data/silver")]
    pub silver_output_dir: String,

    #[envconfig(from = "GOLD_OUTPUT_DIR", default = "data/gold")]
    pub gold_output_dir: String,

    // Rows logged from the finished gold table after a successful run
    #[envconfig(from = "GOLD_PREVIEW_ROWS", default = "5")]
    pub gold_preview_rows: usize,
}

impl Config {
    pub fn silver_events_path(&self) -> PathBuf {
        Path::new(&self.silver_output_dir).join("events.jsonl")
    }

    pub fn silver_transactions_path(&self) -> PathBuf {
        Path::new(&self.silver_output_dir).join("transactions.jsonl")
    }

    pub fn gold_path(&self) -> PathBuf {
        Path::new(&self.gold_output_dir).join("user_session_analysis.csv")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout() {
        let config = Config::init_from_env().unwrap();
        assert_eq!(
            config.silver_events_path(),
            Path::new("data/silver/events.jsonl")
        );
        assert_eq!(
            config.silver_transactions_path(),
            Path::new("data/silver/transactions.jsonl")
        );
        assert_eq!(
            config.gold_path(),
            Path::new("data/gold/user_session_analysis.csv")
        );
    }

    #[test]
    fn test_gold_preview_default() {
        let config = Config::init_from_env().unwrap();
        assert_eq!(config.gold_preview_rows, 5);
    }
}
