pub mod config;
pub mod error;
pub mod job;
pub mod metrics_consts;
pub mod seed;
pub mod stages;
