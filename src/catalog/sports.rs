use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use super::{cascade, check_renamed_slug, ensure_slug_free, list_rows, CatalogConfig};
use crate::error::{AppError, Result};
use crate::filter::Filters;
use crate::slug::slugify;
use crate::types::{Collection, Sport, SportCreate, SportUpdate};

const COLUMNS: &str = "id, name, slug, active";

#[derive(Clone)]
pub struct Sports {
    pool: SqlitePool,
    cfg: CatalogConfig,
}

impl Sports {
    pub fn new(pool: SqlitePool, cfg: CatalogConfig) -> Self {
        Self { pool, cfg }
    }

    pub async fn create(&self, input: SportCreate) -> Result<Sport> {
        input.validate()?;
        let slug = slugify(&input.name);

        let mut tx = self.pool.begin().await?;
        ensure_slug_free(&mut tx, Collection::Sports, &slug, &input.name, None).await?;
        let id = sqlx::query("INSERT INTO sports (name, slug, active) VALUES (?, ?, 1)")
            .bind(&input.name)
            .bind(&slug)
            .execute(&mut *tx)
            .await?
            .last_insert_rowid();
        let sport = fetch(&mut tx, id).await?;
        tx.commit().await?;

        info!(sport_id = sport.id, slug = %sport.slug, "Created sport");
        Ok(sport)
    }

    pub async fn get(&self, id: i64) -> Result<Sport> {
        let mut conn = self.pool.acquire().await?;
        fetch(&mut conn, id).await
    }

    pub async fn list(&self, filters: &Filters) -> Result<Vec<Sport>> {
        list_rows(&self.pool, Collection::Sports, COLUMNS, filters).await
    }

    /// Applies the supplied fields. A supplied `active` only sticks while the
    /// sport has no events; otherwise it is re-derived from them.
    pub async fn update(&self, id: i64, input: SportUpdate) -> Result<Sport> {
        input.validate()?;

        let mut tx = self.pool.begin().await?;
        let current = fetch(&mut tx, id).await?;

        let name = input.name.unwrap_or(current.name);
        let slug = slugify(&name);
        if slug != current.slug {
            check_renamed_slug(&mut tx, self.cfg, Collection::Sports, id, &name, &slug).await?;
        }
        let active = input.active.unwrap_or(current.active);

        sqlx::query("UPDATE sports SET name = ?, slug = ?, active = ? WHERE id = ?")
            .bind(&name)
            .bind(&slug)
            .bind(active)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        cascade::refresh_sport(&mut tx, id).await?;
        let sport = fetch(&mut tx, id).await?;
        tx.commit().await?;

        debug!(sport_id = id, "Updated sport");
        Ok(sport)
    }
}

async fn fetch(conn: &mut SqliteConnection, id: i64) -> Result<Sport> {
    sqlx::query_as::<_, Sport>(&format!("SELECT {COLUMNS} FROM sports WHERE id = ?"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(AppError::NotExist { value: id, collection: Collection::Sports })
}
