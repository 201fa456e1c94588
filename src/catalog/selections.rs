use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use super::{cascade, ensure_exists, list_rows};
use crate::error::{AppError, Result};
use crate::filter::Filters;
use crate::types::{Collection, Outcome, Selection, SelectionCreate, SelectionUpdate};

const COLUMNS: &str = "id, name, event_id, price, active, outcome";

/// Selections carry the client-controlled `active` flag that every cascade
/// starts from. Names are not slugged and need not be unique.
#[derive(Clone)]
pub struct Selections {
    pool: SqlitePool,
}

impl Selections {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, input: SelectionCreate) -> Result<Selection> {
        input.validate()?;

        let mut tx = self.pool.begin().await?;
        ensure_exists(&mut tx, Collection::Events, input.event_id).await?;

        let id = sqlx::query(
            "INSERT INTO selections (name, event_id, price, active, outcome) VALUES (?, ?, ?, 1, ?)",
        )
        .bind(&input.name)
        .bind(input.event_id)
        .bind(input.price)
        .bind(Outcome::Unsettled)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        cascade::after_selection_write(&mut tx, input.event_id).await?;
        let selection = fetch(&mut tx, id).await?;
        tx.commit().await?;

        info!(selection_id = selection.id, event_id = selection.event_id, "Created selection");
        Ok(selection)
    }

    pub async fn get(&self, id: i64) -> Result<Selection> {
        let mut conn = self.pool.acquire().await?;
        fetch(&mut conn, id).await
    }

    pub async fn list(&self, filters: &Filters) -> Result<Vec<Selection>> {
        list_rows(&self.pool, Collection::Selections, COLUMNS, filters).await
    }

    /// Applies the supplied fields, then cascades activity to the event and sport.
    pub async fn update(&self, id: i64, input: SelectionUpdate) -> Result<Selection> {
        input.validate()?;

        let mut tx = self.pool.begin().await?;
        let current = fetch(&mut tx, id).await?;

        let name = input.name.unwrap_or(current.name);
        let active = input.active.unwrap_or(current.active);
        let outcome = input.outcome.unwrap_or(current.outcome);
        let price = input.price.unwrap_or(current.price);

        sqlx::query("UPDATE selections SET name = ?, active = ?, outcome = ?, price = ? WHERE id = ?")
            .bind(&name)
            .bind(active)
            .bind(outcome)
            .bind(price)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        cascade::after_selection_write(&mut tx, current.event_id).await?;
        let selection = fetch(&mut tx, id).await?;
        tx.commit().await?;

        debug!(selection_id = id, active, %outcome, "Updated selection");
        Ok(selection)
    }
}

async fn fetch(conn: &mut SqliteConnection, id: i64) -> Result<Selection> {
    sqlx::query_as::<_, Selection>(&format!("SELECT {COLUMNS} FROM selections WHERE id = ?"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(AppError::NotExist { value: id, collection: Collection::Selections })
}
