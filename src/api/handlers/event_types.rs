//! Event type handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::CreateEventTypeRequest;
use crate::app_state::AppState;
use crate::domain::EventType;
use crate::error::{ErrorResponse, GatewayError};

/// `POST /event-types` — Add an event category.
///
/// # Errors
///
/// Returns [`GatewayError`] on a blank or duplicate name.
#[utoipa::path(
    post,
    path = "/api/v1/event-types",
    tag = "Event Types",
    summary = "Create an event type",
    request_body = CreateEventTypeRequest,
    responses(
        (status = 201, description = "Event type created", body = EventType),
        (status = 400, description = "Blank name", body = ErrorResponse),
        (status = 409, description = "Name already exists", body = ErrorResponse),
    )
)]
pub async fn create_event_type(
    State(state): State<AppState>,
    Json(req): Json<CreateEventTypeRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let event_type = state.event_service.create_event_type(&req.name).await?;
    Ok((StatusCode::CREATED, Json(event_type)))
}

/// `GET /event-types` — List event categories.
///
/// # Errors
///
/// Returns [`GatewayError`] on persistence failures.
#[utoipa::path(
    get,
    path = "/api/v1/event-types",
    tag = "Event Types",
    summary = "List event types",
    responses(
        (status = 200, description = "All event types", body = Vec<EventType>),
    )
)]
pub async fn list_event_types(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, GatewayError> {
    Ok(Json(state.event_service.list_event_types().await?))
}

/// `GET /event-types/:id` — Get one event category.
///
/// # Errors
///
/// Returns [`GatewayError::EventTypeNotFound`] if it does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/event-types/{id}",
    tag = "Event Types",
    summary = "Get an event type",
    params(
        ("id" = i64, Path, description = "Event type id"),
    ),
    responses(
        (status = 200, description = "Event type", body = EventType),
        (status = 404, description = "Event type not found", body = ErrorResponse),
    )
)]
pub async fn get_event_type(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, GatewayError> {
    Ok(Json(state.event_service.get_event_type(id).await?))
}

/// `DELETE /event-types/:id` — Remove an unused event category.
///
/// # Errors
///
/// Returns [`GatewayError`] if it does not exist or events still use it.
#[utoipa::path(
    delete,
    path = "/api/v1/event-types/{id}",
    tag = "Event Types",
    summary = "Delete an event type",
    params(
        ("id" = i64, Path, description = "Event type id"),
    ),
    responses(
        (status = 204, description = "Event type deleted"),
        (status = 404, description = "Event type not found", body = ErrorResponse),
        (status = 409, description = "Event type still in use", body = ErrorResponse),
    )
)]
pub async fn delete_event_type(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, GatewayError> {
    state.event_service.delete_event_type(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Event type routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/event-types",
            get(list_event_types).post(create_event_type),
        )
        .route(
            "/event-types/{id}",
            get(get_event_type).delete(delete_event_type),
        )
}
