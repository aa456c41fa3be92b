use std::fmt;
use std::path::PathBuf;

use anyhow::Context;
use metrics::counter;
use tokio::task::spawn_blocking;
use tracing::info;

use dataframe::{read_tabular, write_table, FrameError, Table, TableFormat};

use crate::config::Config;
use crate::error::AtStage;
use crate::metrics_consts::{
    DUPLICATE_EVENTS_DROPPED, EVENTS_INGESTED, GOLD_ROWS_WRITTEN, SESSIONS_AGGREGATED,
    TRANSACTIONS_INGESTED, USERS_INGESTED,
};
use crate::stages::{aggregate, dedup, enrich, schema};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    Ingest,
    Clean,
    Aggregate,
    Enrich,
    Persist,
    Done,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Init => "init",
            Stage::Ingest => "ingest",
            Stage::Clean => "clean",
            Stage::Aggregate => "aggregate",
            Stage::Enrich => "enrich",
            Stage::Persist => "persist",
            Stage::Done => "done",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// One medallion run. Each call to `step` advances exactly one stage; the
/// tables produced by a stage are handed to the next one and nothing else
/// (no stage ever reads its own output). Any stage error parks the pipeline
/// in `Failed` and surfaces the failing stage through the error chain.
pub struct Pipeline {
    config: Config,
    stage: Stage,
    raw_events: Option<Table>,
    raw_transactions: Option<Table>,
    raw_users: Option<Table>,
    cleaned_events: Option<Table>,
    cleaned_transactions: Option<Table>,
    session_metrics: Option<Table>,
    gold: Option<Table>,
}

impl Pipeline {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            stage: Stage::Init,
            raw_events: None,
            raw_transactions: None,
            raw_users: None,
            cleaned_events: None,
            cleaned_transactions: None,
            session_metrics: None,
            gold: None,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Advance one stage. Returns false once there is nothing left to do.
    pub async fn step(&mut self) -> anyhow::Result<bool> {
        let result = match self.stage {
            Stage::Done | Stage::Failed => return Ok(false),
            Stage::Init => {
                info!("Starting medallion run");
                self.stage = Stage::Ingest;
                Ok(())
            }
            Stage::Ingest => self.ingest().await.at_stage(Stage::Ingest),
            Stage::Clean => self.clean().await.at_stage(Stage::Clean),
            Stage::Aggregate => self.aggregate().at_stage(Stage::Aggregate),
            Stage::Enrich => self.enrich().at_stage(Stage::Enrich),
            Stage::Persist => self.persist().await.at_stage(Stage::Persist),
        };
        match result {
            Ok(()) => Ok(self.stage != Stage::Done),
            Err(e) => {
                self.stage = Stage::Failed;
                Err(e)
            }
        }
    }

    async fn ingest(&mut self) -> anyhow::Result<()> {
        info!("Reading bronze layer");
        let raw_events =
            read_blocking(PathBuf::from(&self.config.raw_events_path), TableFormat::JsonLines)
                .await?;
        let raw_transactions = read_blocking(
            PathBuf::from(&self.config.raw_transactions_path),
            TableFormat::Csv { header: true },
        )
        .await?;
        let raw_users = read_blocking(
            PathBuf::from(&self.config.raw_users_path),
            TableFormat::Csv { header: true },
        )
        .await?;

        counter!(EVENTS_INGESTED).increment(raw_events.len() as u64);
        counter!(TRANSACTIONS_INGESTED).increment(raw_transactions.len() as u64);
        counter!(USERS_INGESTED).increment(raw_users.len() as u64);
        info!(
            events = raw_events.len(),
            transactions = raw_transactions.len(),
            users = raw_users.len(),
            "Bronze layer read"
        );

        self.raw_events = Some(raw_events);
        self.raw_transactions = Some(raw_transactions);
        self.raw_users = Some(raw_users);
        self.stage = Stage::Clean;
        Ok(())
    }

    async fn clean(&mut self) -> anyhow::Result<()> {
        info!("Building silver layer");
        let raw_events = self
            .raw_events
            .take()
            .context("clean stage reached without bronze events")?;
        let raw_transactions = self
            .raw_transactions
            .take()
            .context("clean stage reached without bronze transactions")?;

        let cleaned = schema::clean_events(raw_events)?;
        let before = cleaned.len();
        let cleaned_events = dedup::dedup_events(cleaned)?;
        let dropped = before - cleaned_events.len();
        counter!(DUPLICATE_EVENTS_DROPPED).increment(dropped as u64);

        let cleaned_transactions = schema::clean_transactions(raw_transactions)?;

        let events_path = self.config.silver_events_path();
        let transactions_path = self.config.silver_transactions_path();
        let (cleaned_events, cleaned_transactions) = spawn_blocking(move || {
            write_table(&cleaned_events, &events_path, &TableFormat::JsonLines)?;
            write_table(
                &cleaned_transactions,
                &transactions_path,
                &TableFormat::JsonLines,
            )?;
            Ok::<_, FrameError>((cleaned_events, cleaned_transactions))
        })
        .await??;

        info!(
            events = cleaned_events.len(),
            duplicates_dropped = dropped,
            transactions = cleaned_transactions.len(),
            "Silver layer written"
        );

        self.cleaned_events = Some(cleaned_events);
        self.cleaned_transactions = Some(cleaned_transactions);
        self.stage = Stage::Aggregate;
        Ok(())
    }

    fn aggregate(&mut self) -> anyhow::Result<()> {
        let events = self
            .cleaned_events
            .take()
            .context("aggregate stage reached without silver events")?;
        let metrics = aggregate::session_metrics(events)?;
        counter!(SESSIONS_AGGREGATED).increment(metrics.len() as u64);
        info!(sessions = metrics.len(), "Aggregated session metrics");
        self.session_metrics = Some(metrics);
        self.stage = Stage::Enrich;
        Ok(())
    }

    fn enrich(&mut self) -> anyhow::Result<()> {
        let sessions = self
            .session_metrics
            .take()
            .context("enrich stage reached without session metrics")?;
        let users = self
            .raw_users
            .take()
            .context("enrich stage reached without the user dimension")?;
        let transactions = self
            .cleaned_transactions
            .take()
            .context("enrich stage reached without silver transactions")?;
        let gold = enrich::enrich_sessions(sessions, users, transactions)?;
        info!(rows = gold.len(), "Gold table built");
        self.gold = Some(gold);
        self.stage = Stage::Persist;
        Ok(())
    }

    async fn persist(&mut self) -> anyhow::Result<()> {
        let gold = self.gold.take().context("persist stage reached without gold")?;
        let path = self.config.gold_path();
        let gold = spawn_blocking(move || {
            write_table(&gold, &path, &TableFormat::Csv { header: true })?;
            Ok::<_, FrameError>(gold)
        })
        .await??;

        counter!(GOLD_ROWS_WRITTEN).increment(gold.len() as u64);
        info!(
            rows = gold.len(),
            path = %self.config.gold_path().display(),
            "Gold layer written"
        );
        for row in gold.rows().take(self.config.gold_preview_rows) {
            let preview = gold
                .columns()
                .iter()
                .zip(row)
                .map(|(column, value)| format!("{column}={}", value.render()))
                .collect::<Vec<_>>()
                .join(" ");
            info!("gold row: {preview}");
        }

        self.stage = Stage::Done;
        Ok(())
    }
}

async fn read_blocking(path: PathBuf, format: TableFormat) -> anyhow::Result<Table> {
    let table = spawn_blocking(move || read_tabular(&path, &format)).await??;
    Ok(table)
}

/// Drive a pipeline from Init to Done.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let mut pipeline = Pipeline::new(config);
    while pipeline.step().await? {}
    Ok(())
}
