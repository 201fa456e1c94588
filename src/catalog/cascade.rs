//! Keeps the derived `active` flags of events and sports in line with their
//! children, and owns the event status transition rule.
//!
//! Every step re-derives the flag from the current child rows instead of
//! maintaining a counter, and runs on the caller's transaction connection.
//! A parent without any children keeps whatever value it had.

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::{AppError, Result};
use crate::types::EventStatus;

/// Recomputes `events.active` for one event from its selections.
/// Returns the new flag, or `None` when the event has no selections.
pub async fn refresh_event(conn: &mut SqliteConnection, event_id: i64) -> Result<Option<bool>> {
    let active = sqlx::query_scalar::<_, bool>(
        r#"
        UPDATE events
        SET active = (SELECT COUNT(*) FROM selections WHERE event_id = ? AND active = 1) > 0
        WHERE id = ? AND EXISTS (SELECT 1 FROM selections WHERE event_id = ?)
        RETURNING active
        "#,
    )
    .bind(event_id)
    .bind(event_id)
    .bind(event_id)
    .fetch_optional(&mut *conn)
    .await?;

    debug!(event_id, ?active, "Recomputed event activity");
    Ok(active)
}

/// Recomputes `sports.active` for one sport from its events.
/// Returns the new flag, or `None` when the sport has no events.
pub async fn refresh_sport(conn: &mut SqliteConnection, sport_id: i64) -> Result<Option<bool>> {
    let active = sqlx::query_scalar::<_, bool>(
        r#"
        UPDATE sports
        SET active = (SELECT COUNT(*) FROM events WHERE sport_id = ? AND active = 1) > 0
        WHERE id = ? AND EXISTS (SELECT 1 FROM events WHERE sport_id = ?)
        RETURNING active
        "#,
    )
    .bind(sport_id)
    .bind(sport_id)
    .bind(sport_id)
    .fetch_optional(&mut *conn)
    .await?;

    debug!(sport_id, ?active, "Recomputed sport activity");
    Ok(active)
}

/// Propagates a selection write: its event first, then that event's sport.
pub async fn after_selection_write(conn: &mut SqliteConnection, event_id: i64) -> Result<()> {
    refresh_event(conn, event_id).await?;
    let sport_id = sqlx::query_scalar::<_, i64>("SELECT sport_id FROM events WHERE id = ?")
        .bind(event_id)
        .fetch_one(&mut *conn)
        .await?;
    refresh_sport(conn, sport_id).await?;
    Ok(())
}

/// Propagates an event write to its sport.
pub async fn after_event_write(conn: &mut SqliteConnection, sport_id: i64) -> Result<()> {
    refresh_sport(conn, sport_id).await?;
    Ok(())
}

/// Resolves the status an update leaves an event in.
///
/// `Pending -> Started` and same-state updates are accepted; nothing leads back
/// to `Pending` once an event has started.
pub fn next_status(current: EventStatus, requested: Option<EventStatus>) -> Result<EventStatus> {
    match (current, requested) {
        (_, None) => Ok(current),
        (EventStatus::Started, Some(EventStatus::Pending)) => Err(AppError::validation(
            "event has already started and cannot return to Pending",
        )),
        (_, Some(next)) => Ok(next),
    }
}

/// `actual_start` after an update: stamped with `now` the first time the event
/// is `Started`, untouched afterwards.
pub fn actual_start(
    next: EventStatus,
    stamped: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    match next {
        EventStatus::Started => stamped.or(Some(now)),
        EventStatus::Pending => stamped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use chrono::Duration;

    async fn seed(conn: &mut SqliteConnection) {
        sqlx::raw_sql(
            r#"
            INSERT INTO sports (id, name, slug, active) VALUES (1, 'Football', 'football', 1);
            INSERT INTO events (id, name, slug, active, type, sport_id, status, scheduled_start)
                VALUES (10, 'A', 'a', 1, 'preplay', 1, 'Pending', '2024-01-01T00:00:00+00:00'),
                       (11, 'B', 'b', 1, 'preplay', 1, 'Pending', '2024-01-01T00:00:00+00:00');
            INSERT INTO selections (id, name, event_id, price, active, outcome)
                VALUES (100, 'Home', 10, 1.5, 0, 'Unsettled'),
                       (101, 'Away', 10, 2.5, 0, 'Unsettled');
            "#,
        )
        .execute(&mut *conn)
        .await
        .unwrap();
    }

    async fn active_of(conn: &mut SqliteConnection, table: &str, id: i64) -> bool {
        sqlx::query_scalar::<_, bool>(&format!("SELECT active FROM {table} WHERE id = ?"))
            .bind(id)
            .fetch_one(&mut *conn)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn event_goes_inactive_when_all_selections_are() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        seed(&mut conn).await;

        assert_eq!(refresh_event(&mut conn, 10).await.unwrap(), Some(false));
        assert!(!active_of(&mut conn, "events", 10).await);
    }

    #[tokio::test]
    async fn event_without_selections_keeps_its_flag() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        seed(&mut conn).await;

        assert_eq!(refresh_event(&mut conn, 11).await.unwrap(), None);
        assert!(active_of(&mut conn, "events", 11).await);
    }

    #[tokio::test]
    async fn sport_stays_active_while_any_event_is() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        seed(&mut conn).await;

        after_selection_write(&mut conn, 10).await.unwrap();
        // event 11 is still active
        assert!(active_of(&mut conn, "sports", 1).await);

        sqlx::query("UPDATE events SET active = 0 WHERE id = 11")
            .execute(&mut *conn)
            .await
            .unwrap();
        after_event_write(&mut conn, 1).await.unwrap();
        assert!(!active_of(&mut conn, "sports", 1).await);
    }

    #[tokio::test]
    async fn recompute_is_idempotent() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        seed(&mut conn).await;

        after_selection_write(&mut conn, 10).await.unwrap();
        let first = (active_of(&mut conn, "events", 10).await, active_of(&mut conn, "sports", 1).await);
        after_selection_write(&mut conn, 10).await.unwrap();
        let second = (active_of(&mut conn, "events", 10).await, active_of(&mut conn, "sports", 1).await);
        assert_eq!(first, second);
    }

    #[test]
    fn status_transitions() {
        use EventStatus::*;
        assert_eq!(next_status(Pending, None).unwrap(), Pending);
        assert_eq!(next_status(Pending, Some(Started)).unwrap(), Started);
        assert_eq!(next_status(Started, Some(Started)).unwrap(), Started);
        assert_eq!(next_status(Started, None).unwrap(), Started);
        assert!(matches!(next_status(Started, Some(Pending)), Err(AppError::Validation(_))));
    }

    #[test]
    fn actual_start_is_stamped_once() {
        let now = Utc::now();
        let earlier = now - Duration::hours(1);
        assert_eq!(actual_start(EventStatus::Pending, None, now), None);
        assert_eq!(actual_start(EventStatus::Started, None, now), Some(now));
        assert_eq!(actual_start(EventStatus::Started, Some(earlier), now), Some(earlier));
    }
}
