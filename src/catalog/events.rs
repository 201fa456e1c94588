use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use super::{cascade, check_renamed_slug, ensure_exists, ensure_slug_free, list_rows, CatalogConfig};
use crate::error::{AppError, Result};
use crate::filter::Filters;
use crate::slug::slugify;
use crate::types::{Collection, Event, EventCreate, EventStatus, EventUpdate};

const COLUMNS: &str =
    "id, name, slug, active, type, sport_id, status, scheduled_start, actual_start";

#[derive(Clone)]
pub struct Events {
    pool: SqlitePool,
    cfg: CatalogConfig,
}

impl Events {
    pub fn new(pool: SqlitePool, cfg: CatalogConfig) -> Self {
        Self { pool, cfg }
    }

    /// Inserts a `Pending`, active event under an existing sport.
    pub async fn create(&self, input: EventCreate) -> Result<Event> {
        input.validate()?;
        let slug = slugify(&input.name);

        let mut tx = self.pool.begin().await?;
        ensure_exists(&mut tx, Collection::Sports, input.sport_id).await?;
        ensure_slug_free(&mut tx, Collection::Events, &slug, &input.name, None).await?;

        let id = sqlx::query(
            r#"
            INSERT INTO events (name, slug, active, type, sport_id, status, scheduled_start)
            VALUES (?, ?, 1, ?, ?, ?, ?)
            "#,
        )
        .bind(&input.name)
        .bind(&slug)
        .bind(&input.event_type)
        .bind(input.sport_id)
        .bind(EventStatus::Pending)
        .bind(input.scheduled_start)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        cascade::after_event_write(&mut tx, input.sport_id).await?;
        let event = fetch(&mut tx, id).await?;
        tx.commit().await?;

        info!(event_id = event.id, sport_id = event.sport_id, slug = %event.slug, "Created event");
        Ok(event)
    }

    pub async fn get(&self, id: i64) -> Result<Event> {
        let mut conn = self.pool.acquire().await?;
        fetch(&mut conn, id).await
    }

    pub async fn list(&self, filters: &Filters) -> Result<Vec<Event>> {
        list_rows(&self.pool, Collection::Events, COLUMNS, filters).await
    }

    /// Applies the supplied fields, stamps `actual_start` on the first move to
    /// `Started`, then recomputes activity for the event and its sport.
    /// A supplied `active` only sticks while the event has no selections.
    pub async fn update(&self, id: i64, input: EventUpdate) -> Result<Event> {
        input.validate()?;

        let mut tx = self.pool.begin().await?;
        let current = fetch(&mut tx, id).await?;

        let name = input.name.unwrap_or(current.name);
        let slug = slugify(&name);
        if slug != current.slug {
            check_renamed_slug(&mut tx, self.cfg, Collection::Events, id, &name, &slug).await?;
        }
        let active = input.active.unwrap_or(current.active);
        let status = cascade::next_status(current.status, input.status)?;
        let actual_start = cascade::actual_start(status, current.actual_start, Utc::now());

        sqlx::query(
            r#"
            UPDATE events
            SET name = ?, slug = ?, active = ?, status = ?, actual_start = ?
            WHERE id = ?
            "#,
        )
        .bind(&name)
        .bind(&slug)
        .bind(active)
        .bind(status)
        .bind(actual_start)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        cascade::refresh_event(&mut tx, id).await?;
        cascade::after_event_write(&mut tx, current.sport_id).await?;
        let event = fetch(&mut tx, id).await?;
        tx.commit().await?;

        debug!(event_id = id, status = %event.status, active = event.active, "Updated event");
        Ok(event)
    }
}

async fn fetch(conn: &mut SqliteConnection, id: i64) -> Result<Event> {
    sqlx::query_as::<_, Event>(&format!("SELECT {COLUMNS} FROM events WHERE id = ?"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(AppError::NotExist { value: id, collection: Collection::Events })
}
