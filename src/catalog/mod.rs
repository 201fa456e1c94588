pub mod cascade;
mod events;
mod selections;
mod sports;

pub use events::Events;
pub use selections::Selections;
pub use sports::Sports;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::warn;

use crate::error::{AppError, Result};
use crate::filter::{self, Filters};
use crate::types::Collection;

/// Repository behaviour switches.
#[derive(Debug, Clone, Copy, Default)]
pub struct CatalogConfig {
    /// When false, a rename whose slug collides with another row is allowed and logged.
    pub unique_slug_on_update: bool,
}

/// The three repositories, sharing one pool.
#[derive(Clone)]
pub struct Catalog {
    pub sports: Sports,
    pub events: Events,
    pub selections: Selections,
}

impl Catalog {
    pub fn new(pool: SqlitePool, cfg: CatalogConfig) -> Self {
        Self {
            sports: Sports::new(pool.clone(), cfg),
            events: Events::new(pool.clone(), cfg),
            selections: Selections::new(pool),
        }
    }
}

// ---------------------------------------------------------------------------
// Shared statements
// ---------------------------------------------------------------------------

/// Fails with `NotExist` unless `collection` holds a row with this id.
async fn ensure_exists(conn: &mut SqliteConnection, collection: Collection, id: i64) -> Result<()> {
    let sql = format!("SELECT 1 FROM {} WHERE id = ?", collection.table());
    let found = sqlx::query(&sql).bind(id).fetch_optional(&mut *conn).await?;
    match found {
        Some(_) => Ok(()),
        None => Err(AppError::NotExist { value: id, collection }),
    }
}

/// Fails with `DuplicateValue` if a row other than `except` already uses `slug`.
async fn ensure_slug_free(
    conn: &mut SqliteConnection,
    collection: Collection,
    slug: &str,
    name: &str,
    except: Option<i64>,
) -> Result<()> {
    let sql = format!("SELECT id FROM {} WHERE slug = ?", collection.table());
    let taken = sqlx::query_scalar::<_, i64>(&sql)
        .bind(slug)
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .any(|id| Some(id) != except);
    if taken {
        return Err(AppError::DuplicateValue { value: name.to_string(), collection });
    }
    Ok(())
}

/// Slug check for renames: enforced or merely reported, depending on config.
async fn check_renamed_slug(
    conn: &mut SqliteConnection,
    cfg: CatalogConfig,
    collection: Collection,
    id: i64,
    name: &str,
    slug: &str,
) -> Result<()> {
    match ensure_slug_free(conn, collection, slug, name, Some(id)).await {
        Err(AppError::DuplicateValue { .. }) if !cfg.unique_slug_on_update => {
            warn!(%collection, id, slug, "Rename produces a slug already used in the collection");
            Ok(())
        }
        other => other,
    }
}

/// `SELECT <columns> FROM <collection> [WHERE ...] ORDER BY id` with the filters compiled.
async fn list_rows<T>(
    pool: &SqlitePool,
    collection: Collection,
    columns: &str,
    filters: &Filters,
) -> Result<Vec<T>>
where
    T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
{
    let condition = filter::compile(collection, filters)?;
    let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {columns} FROM {}", collection.table()));
    condition.push_where(&mut qb);
    qb.push(" ORDER BY id");
    let rows = qb.build_query_as::<T>().fetch_all(pool).await?;
    Ok(rows)
}

#[cfg(test)]
pub(crate) async fn test_catalog(cfg: CatalogConfig) -> Catalog {
    Catalog::new(crate::db::test_pool().await, cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Filters;
    use crate::types::{EventCreate, SelectionCreate, SelectionUpdate, SportCreate};
    use chrono::Utc;

    #[tokio::test]
    async fn football_final_end_to_end() {
        let catalog = test_catalog(CatalogConfig::default()).await;

        let sport = catalog
            .sports
            .create(SportCreate { name: "Football".to_string() })
            .await
            .unwrap();
        assert_eq!(sport.slug, "football");

        let event = catalog
            .events
            .create(EventCreate {
                name: "Champions League Final".to_string(),
                event_type: "preplay".to_string(),
                sport_id: sport.id,
                scheduled_start: Utc::now(),
            })
            .await
            .unwrap();
        assert_eq!(event.status, crate::types::EventStatus::Pending);
        assert!(event.active);
        assert!(event.actual_start.is_none());

        let mut selections = Vec::new();
        for (name, price) in [("Real Madrid", 1.8), ("Dortmund", 4.2)] {
            let s = catalog
                .selections
                .create(SelectionCreate { name: name.to_string(), event_id: event.id, price })
                .await
                .unwrap();
            selections.push(s);
        }

        for s in &selections {
            catalog
                .selections
                .update(s.id, SelectionUpdate { active: Some(false), ..Default::default() })
                .await
                .unwrap();
        }
        assert!(!catalog.events.get(event.id).await.unwrap().active);
        assert!(!catalog.sports.get(sport.id).await.unwrap().active);

        let inactive = catalog
            .sports
            .list(&Filters::from([("active".to_string(), "false".to_string())]))
            .await
            .unwrap();
        assert_eq!(inactive, vec![catalog.sports.get(sport.id).await.unwrap()]);
    }
}
