//! Bronze-layer seeding: writes mock raw inputs shaped exactly like the
//! production feeds, so a full run can be exercised locally end to end.

use std::fs;
use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Duration, SecondsFormat, TimeZone, Utc};
use envconfig::Envconfig;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use common_types::{DeviceType, RawEvent, RawTransaction, UserRecord, COUNTRIES, CURRENCY, EVENT_TYPES};

use crate::config::Config;

#[derive(Envconfig, Clone, Debug)]
pub struct SeedConfig {
    #[envconfig(from = "SEED_USERS", default = "30")]
    pub users: usize,

    #[envconfig(from = "SEED_SESSIONS", default = "50")]
    pub sessions: usize,

    #[envconfig(from = "SEED_EVENTS", default = "200")]
    pub events: usize,

    #[envconfig(from = "SEED_TRANSACTIONS", default = "20")]
    pub transactions: usize,

    // Probability that an event is re-issued under the same event_id with a
    // later timestamp, the upstream retry the deduplicator exists for
    #[envconfig(from = "SEED_DUPLICATE_FRACTION", default = "0.1")]
    pub duplicate_fraction: f64,

    // Fixed seed makes the generated feeds byte-identical across runs
    #[envconfig(from = "SEED_RNG_SEED")]
    pub rng_seed: Option<u64>,
}

/// Generate and write the three raw feeds to the configured bronze paths,
/// replacing whatever was there.
pub fn seed_bronze(config: &Config, seed: &SeedConfig) -> anyhow::Result<()> {
    let mut rng = match seed.rng_seed {
        Some(value) => StdRng::seed_from_u64(value),
        None => StdRng::from_entropy(),
    };

    let users = generate_users(seed, &mut rng);
    // A session belongs to exactly one user; events draw from these pairs
    // so the generated data honours the session -> user invariant.
    let sessions: Vec<(String, String)> = (1..=seed.sessions)
        .map(|i| {
            let user = users.choose(&mut rng).map(|u| u.user_id.clone());
            (format!("S{i:03}"), user.unwrap_or_else(|| "U001".to_string()))
        })
        .collect();
    let events = generate_events(seed, &sessions, &mut rng);
    let transactions = generate_transactions(seed, &events, &mut rng);

    write_users(&users, Path::new(&config.raw_users_path))?;
    write_events(&events, Path::new(&config.raw_events_path))?;
    write_transactions(&transactions, Path::new(&config.raw_transactions_path))?;

    info!(
        users = users.len(),
        events = events.len(),
        transactions = transactions.len(),
        "Bronze layer seeded"
    );
    Ok(())
}

fn window_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().expect("fixed instant")
}

fn generate_users(seed: &SeedConfig, rng: &mut StdRng) -> Vec<UserRecord> {
    (1..=seed.users)
        .map(|i| UserRecord {
            user_id: format!("U{i:03}"),
            signup_date: (window_start() + Duration::days(rng.gen_range(0..365)))
                .format("%Y-%m-%d")
                .to_string(),
            device_type: *DeviceType::ALL.choose(rng).expect("non-empty"),
            country: (*COUNTRIES.choose(rng).expect("non-empty")).to_string(),
        })
        .collect()
}

fn generate_events(
    seed: &SeedConfig,
    sessions: &[(String, String)],
    rng: &mut StdRng,
) -> Vec<RawEvent> {
    let retry_odds = seed.duplicate_fraction.clamp(0.0, 1.0);
    let mut events = Vec::with_capacity(seed.events);
    for _ in 0..seed.events {
        let (session_id, user_id) = sessions
            .choose(rng)
            .cloned()
            .unwrap_or_else(|| ("S001".to_string(), "U001".to_string()));
        let stamp = window_start() + Duration::seconds(rng.gen_range(0..365 * 24 * 3600));
        let event = RawEvent {
            event_id: Uuid::from_u128(rng.gen()).to_string(),
            user_id,
            session_id,
            event_type: (*EVENT_TYPES.choose(rng).expect("non-empty")).to_string(),
            event_timestamp: stamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            event_details: json!({
                "url": format!("https://shop.example/products/{}", rng.gen_range(1..500)),
                "metadata": "seeded",
            }),
        };
        let retry = rng.gen_bool(retry_odds).then(|| {
            let later = stamp + Duration::seconds(rng.gen_range(30..600));
            RawEvent {
                event_timestamp: later.to_rfc3339_opts(SecondsFormat::Secs, true),
                ..event.clone()
            }
        });
        events.push(event);
        events.extend(retry);
    }
    events
}

fn generate_transactions(
    seed: &SeedConfig,
    events: &[RawEvent],
    rng: &mut StdRng,
) -> Vec<RawTransaction> {
    (0..seed.transactions)
        .filter_map(|_| {
            let event = events.choose(rng)?;
            Some(RawTransaction {
                transaction_id: Uuid::from_u128(rng.gen()).to_string(),
                session_id: event.session_id.clone(),
                user_id: event.user_id.clone(),
                amount: (rng.gen_range(10.0..500.0_f64) * 100.0).round() / 100.0,
                currency: CURRENCY.to_string(),
                transaction_timestamp: event.event_timestamp.clone(),
            })
        })
        .collect()
}

fn write_events(events: &[RawEvent], dir: &Path) -> anyhow::Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let path = dir.join("events.jsonl");
    let mut out = String::new();
    for event in events {
        out.push_str(&serde_json::to_string(event)?);
        out.push('\n');
    }
    fs::write(&path, out).with_context(|| format!("writing {}", path.display()))
}

fn write_users(users: &[UserRecord], dir: &Path) -> anyhow::Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let path = dir.join("users.csv");
    let mut writer = csv::Writer::from_path(&path)
        .with_context(|| format!("writing {}", path.display()))?;
    for user in users {
        writer.serialize(user)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_transactions(transactions: &[RawTransaction], dir: &Path) -> anyhow::Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let path = dir.join("transactions.csv");
    let mut writer = csv::Writer::from_path(&path)
        .with_context(|| format!("writing {}", path.display()))?;
    for transaction in transactions {
        writer.serialize(transaction)?;
    }
    writer.flush()?;
    Ok(())
}
