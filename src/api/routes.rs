use axum::{extract::State, http::StatusCode, routing::get, Json, Router};

use super::extract::{PathId, Payload, QueryParams};

use crate::catalog::Catalog;
use crate::error::AppError;
use crate::filter::Filters;
use crate::types::{
    Event, EventCreate, EventUpdate, Selection, SelectionCreate, SelectionUpdate, Sport,
    SportCreate, SportUpdate,
};

#[derive(Clone)]
pub struct ApiState {
    pub catalog: Catalog,
}

/// All routes live under `/api`; collection routes answer with or without a trailing slash.
pub fn router(state: ApiState) -> Router {
    let api = Router::new()
        .route("/sports", get(list_sports).post(create_sport))
        .route("/sports/", get(list_sports).post(create_sport))
        .route("/sports/:id", get(get_sport).put(update_sport))
        .route("/events", get(list_events).post(create_event))
        .route("/events/", get(list_events).post(create_event))
        .route("/events/:id", get(get_event).put(update_event))
        .route("/selections", get(list_selections).post(create_selection))
        .route("/selections/", get(list_selections).post(create_selection))
        .route("/selections/:id", get(get_selection).put(update_selection));

    Router::new().nest("/api", api).with_state(state)
}

type Created<T> = Result<(StatusCode, Json<T>), AppError>;
type Found<T> = Result<Json<T>, AppError>;

// ---------------------------------------------------------------------------
// Sports
// ---------------------------------------------------------------------------

async fn create_sport(
    State(state): State<ApiState>,
    Payload(input): Payload<SportCreate>,
) -> Created<Sport> {
    let sport = state.catalog.sports.create(input).await?;
    Ok((StatusCode::CREATED, Json(sport)))
}

async fn update_sport(
    State(state): State<ApiState>,
    PathId(id): PathId<i64>,
    Payload(input): Payload<SportUpdate>,
) -> Found<Sport> {
    Ok(Json(state.catalog.sports.update(id, input).await?))
}

async fn get_sport(State(state): State<ApiState>, PathId(id): PathId<i64>) -> Found<Sport> {
    Ok(Json(state.catalog.sports.get(id).await?))
}

async fn list_sports(
    State(state): State<ApiState>,
    QueryParams(filters): QueryParams<Filters>,
) -> Found<Vec<Sport>> {
    Ok(Json(state.catalog.sports.list(&filters).await?))
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

async fn create_event(
    State(state): State<ApiState>,
    Payload(input): Payload<EventCreate>,
) -> Created<Event> {
    let event = state.catalog.events.create(input).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

async fn update_event(
    State(state): State<ApiState>,
    PathId(id): PathId<i64>,
    Payload(input): Payload<EventUpdate>,
) -> Found<Event> {
    Ok(Json(state.catalog.events.update(id, input).await?))
}

async fn get_event(State(state): State<ApiState>, PathId(id): PathId<i64>) -> Found<Event> {
    Ok(Json(state.catalog.events.get(id).await?))
}

async fn list_events(
    State(state): State<ApiState>,
    QueryParams(filters): QueryParams<Filters>,
) -> Found<Vec<Event>> {
    Ok(Json(state.catalog.events.list(&filters).await?))
}

// ---------------------------------------------------------------------------
// Selections
// ---------------------------------------------------------------------------

async fn create_selection(
    State(state): State<ApiState>,
    Payload(input): Payload<SelectionCreate>,
) -> Created<Selection> {
    let selection = state.catalog.selections.create(input).await?;
    Ok((StatusCode::CREATED, Json(selection)))
}

async fn update_selection(
    State(state): State<ApiState>,
    PathId(id): PathId<i64>,
    Payload(input): Payload<SelectionUpdate>,
) -> Found<Selection> {
    Ok(Json(state.catalog.selections.update(id, input).await?))
}

async fn get_selection(State(state): State<ApiState>, PathId(id): PathId<i64>) -> Found<Selection> {
    Ok(Json(state.catalog.selections.get(id).await?))
}

async fn list_selections(
    State(state): State<ApiState>,
    QueryParams(filters): QueryParams<Filters>,
) -> Found<Vec<Selection>> {
    Ok(Json(state.catalog.selections.list(&filters).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{test_catalog, CatalogConfig};
    use axum::response::IntoResponse;
    use chrono::Utc;

    async fn state() -> ApiState {
        ApiState { catalog: test_catalog(CatalogConfig::default()).await }
    }

    #[tokio::test]
    async fn create_returns_201_with_materialized_entity() {
        let state = state().await;
        let (status, Json(sport)) = create_sport(
            State(state.clone()),
            Payload(SportCreate { name: "Football".into() }),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(sport.slug, "football");

        let (status, Json(event)) = create_event(
            State(state.clone()),
            Payload(EventCreate {
                name: "Champions League Final".into(),
                event_type: "preplay".into(),
                sport_id: sport.id,
                scheduled_start: Utc::now(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(event.slug, "champions-league-final");

        let Json(found) = get_event(State(state), PathId(event.id)).await.unwrap();
        assert_eq!(found.id, event.id);
    }

    #[tokio::test]
    async fn missing_parent_is_a_404() {
        let state = state().await;
        let err = create_selection(
            State(state),
            Payload(SelectionCreate { name: "Home".into(), event_id: 3, price: 1.5 }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn duplicate_and_bad_filter_are_400() {
        let state = state().await;
        create_sport(State(state.clone()), Payload(SportCreate { name: "Tennis".into() }))
            .await
            .unwrap();
        let err = create_sport(State(state.clone()), Payload(SportCreate { name: "tennis".into() }))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);

        let filters = Filters::from([("bogus".to_string(), "1".to_string())]);
        let err = list_sports(State(state), QueryParams(filters)).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn update_through_handler_cascades() {
        let state = state().await;
        let (_, Json(sport)) =
            create_sport(State(state.clone()), Payload(SportCreate { name: "Darts".into() }))
                .await
                .unwrap();
        let (_, Json(event)) = create_event(
            State(state.clone()),
            Payload(EventCreate {
                name: "World Final".into(),
                event_type: "inplay".into(),
                sport_id: sport.id,
                scheduled_start: Utc::now(),
            }),
        )
        .await
        .unwrap();
        let (_, Json(selection)) = create_selection(
            State(state.clone()),
            Payload(SelectionCreate { name: "Player".into(), event_id: event.id, price: 2.0 }),
        )
        .await
        .unwrap();

        let Json(updated) = update_selection(
            State(state.clone()),
            PathId(selection.id),
            Payload(SelectionUpdate { active: Some(false), ..Default::default() }),
        )
        .await
        .unwrap();
        assert!(!updated.active);

        let Json(sports) = list_sports(
            State(state),
            QueryParams(Filters::from([("active".to_string(), "false".to_string())])),
        )
        .await
        .unwrap();
        assert_eq!(sports.len(), 1);
        assert_eq!(sports[0].id, sport.id);
    }
}
