use envconfig::Envconfig;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use session_etl_worker::config::Config;
use session_etl_worker::seed::{seed_bronze, SeedConfig};

fn setup_tracing() {
    let log_layer = tracing_subscriber::fmt::layer().with_filter(
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    );
    tracing_subscriber::registry().with(log_layer).init();
}

pub fn main() -> Result<(), anyhow::Error> {
    setup_tracing();
    info!("Seeding bronze layer");

    let config = Config::init_from_env()?;
    let seed = SeedConfig::init_from_env()?;
    seed_bronze(&config, &seed)?;
    Ok(())
}
