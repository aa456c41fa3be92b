use envconfig::Envconfig;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use session_etl_worker::config::Config;
use session_etl_worker::error::failed_stage;
use session_etl_worker::job;

fn setup_tracing() {
    let log_layer = tracing_subscriber::fmt::layer().with_filter(
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    );
    tracing_subscriber::registry().with(log_layer).init();
}

#[tokio::main]
pub async fn main() -> Result<(), anyhow::Error> {
    setup_tracing();
    info!("Starting up...");

    let config = Config::init_from_env()?;
    if let Err(error) = job::run(config).await {
        match failed_stage(&error) {
            Some(stage) => error!("Pipeline failed during {stage}: {error:#}"),
            None => error!("Pipeline failed: {error:#}"),
        }
        std::process::exit(1);
    }

    info!("Pipeline run complete");
    Ok(())
}
