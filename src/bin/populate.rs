//! Recreates the catalog database and fills it with demonstration data.
//! Every row goes through the repositories, so slugs and cascades are real.

use std::collections::HashMap;

use chrono::{Duration, Utc};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use sports_catalog::catalog::Catalog;
use sports_catalog::config::Config;
use sports_catalog::db;
use sports_catalog::error::Result;
use sports_catalog::types::{
    EventCreate, EventStatus, EventUpdate, Outcome, SelectionCreate, SelectionUpdate, SportCreate,
    SportUpdate,
};

const SPORTS: &[(&str, bool)] = &[
    ("Football", true),
    ("Basketball", true),
    ("Tennis", true),
    ("Baseball", true),
    ("Hockey", true),
    ("Inactive Sport 1", false),
    ("Inactive Sport 2", false),
];

/// (name, type, sport, status, hours from now)
const EVENTS: &[(&str, &str, &str, EventStatus, i64)] = &[
    ("Football Match 1", "preplay", "Football", EventStatus::Pending, 0),
    ("Football Match 2", "preplay", "Football", EventStatus::Pending, 48),
    ("Basketball Game 1", "inplay", "Basketball", EventStatus::Started, -1),
    ("Basketball Game 2", "preplay", "Basketball", EventStatus::Pending, 72),
    ("Tennis Match 1", "preplay", "Tennis", EventStatus::Pending, 24),
    ("Baseball Game 1", "preplay", "Baseball", EventStatus::Pending, 96),
    ("Hockey Match 1", "preplay", "Hockey", EventStatus::Pending, 120),
];

/// (name, event, price, outcome)
const SELECTIONS: &[(&str, &str, f64, Outcome)] = &[
    ("Team A to Win", "Football Match 1", 1.50, Outcome::Unsettled),
    ("Team B to Win", "Football Match 1", 2.75, Outcome::Lose),
    ("Draw", "Football Match 1", 3.25, Outcome::Unsettled),
    ("Team C to Win", "Football Match 2", 1.60, Outcome::Win),
    ("Team D to Win", "Football Match 2", 2.50, Outcome::Unsettled),
    ("Draw", "Football Match 2", 3.00, Outcome::Unsettled),
    ("Player A to Score", "Basketball Game 1", 1.80, Outcome::Void),
    ("Player B to Score", "Basketball Game 1", 2.25, Outcome::Unsettled),
    ("Player C to Score", "Basketball Game 2", 1.90, Outcome::Unsettled),
    ("Player D to Score", "Basketball Game 2", 2.15, Outcome::Unsettled),
    ("Player X to Win", "Tennis Match 1", 1.90, Outcome::Lose),
    ("Player Y to Win", "Tennis Match 1", 2.10, Outcome::Unsettled),
    ("Team E to Win", "Baseball Game 1", 1.70, Outcome::Void),
    ("Team F to Win", "Baseball Game 1", 2.40, Outcome::Unsettled),
    ("Team G to Win", "Hockey Match 1", 1.55, Outcome::Unsettled),
    ("Team H to Win", "Hockey Match 1", 2.60, Outcome::Win),
    ("Draw", "Hockey Match 1", 3.50, Outcome::Unsettled),
];

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = populate(&cfg).await {
        error!("Populate failed: {e}");
        std::process::exit(1);
    }
}

async fn populate(cfg: &Config) -> Result<()> {
    db::recreate(&cfg.db_path).await?;
    let pool = db::connect(&cfg.db_path, cfg.db_max_connections).await?;
    let catalog = Catalog::new(pool, cfg.catalog());

    let mut sport_ids = HashMap::new();
    for &(name, active) in SPORTS {
        let sport = catalog.sports.create(SportCreate { name: name.to_string() }).await?;
        if !active {
            catalog
                .sports
                .update(sport.id, SportUpdate { name: None, active: Some(false) })
                .await?;
        }
        sport_ids.insert(name, sport.id);
    }

    let now = Utc::now();
    let mut event_ids = HashMap::new();
    for &(name, event_type, sport, status, offset_hours) in EVENTS {
        let event = catalog
            .events
            .create(EventCreate {
                name: name.to_string(),
                event_type: event_type.to_string(),
                sport_id: sport_ids[sport],
                scheduled_start: now + Duration::hours(offset_hours),
            })
            .await?;
        if status == EventStatus::Started {
            catalog
                .events
                .update(event.id, EventUpdate { status: Some(status), ..Default::default() })
                .await?;
        }
        event_ids.insert(name, event.id);
    }

    for &(name, event, price, outcome) in SELECTIONS {
        let selection = catalog
            .selections
            .create(SelectionCreate { name: name.to_string(), event_id: event_ids[event], price })
            .await?;
        if outcome != Outcome::Unsettled {
            catalog
                .selections
                .update(selection.id, SelectionUpdate { outcome: Some(outcome), ..Default::default() })
                .await?;
        }
    }

    info!(
        sports = SPORTS.len(),
        events = EVENTS.len(),
        selections = SELECTIONS.len(),
        "Database populated at {}",
        cfg.db_path
    );
    Ok(())
}
