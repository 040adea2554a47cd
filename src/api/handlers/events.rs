//! Event CRUD handlers: create, list, get, update, delete.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{
    CreateEventRequest, EventListResponse, EventResponse, PaginationParams, UpdateEventRequest,
};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, GatewayError};

/// `POST /events` — Log a new event.
///
/// # Errors
///
/// Returns [`GatewayError`] on a bad timestamp or unknown event type.
#[utoipa::path(
    post,
    path = "/api/v1/events",
    tag = "Events",
    summary = "Log an event",
    description = "Creates an event. Missing fields default to description \"N/A\", the current time, and the \"Turn On\" event type.",
    request_body = CreateEventRequest,
    responses(
        (status = 201, description = "Event created", body = EventResponse),
        (status = 400, description = "Invalid timestamp", body = ErrorResponse),
        (status = 404, description = "Unknown event type", body = ErrorResponse),
    )
)]
pub async fn create_event(
    State(state): State<AppState>,
    Json(req): Json<CreateEventRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let record = state
        .event_service
        .create_event(req.description, req.raw_timestamp, req.event_type)
        .await?;
    Ok((StatusCode::CREATED, Json(EventResponse::from(record))))
}

/// `GET /events` — List events with pagination.
///
/// # Errors
///
/// Returns [`GatewayError`] on persistence failures.
#[utoipa::path(
    get,
    path = "/api/v1/events",
    tag = "Events",
    summary = "List events",
    description = "Returns a paginated list of events ordered by id.",
    params(PaginationParams),
    responses(
        (status = 200, description = "Paginated event list", body = EventListResponse),
    )
)]
pub async fn list_events(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, GatewayError> {
    let records = state.event_service.list_events().await?;
    let (page, pagination) = params.paginate(records);

    Ok(Json(EventListResponse {
        data: page.into_iter().map(EventResponse::from).collect(),
        pagination,
    }))
}

/// `GET /events/:id` — Get one event.
///
/// # Errors
///
/// Returns [`GatewayError::EventNotFound`] if the event does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/events/{id}",
    tag = "Events",
    summary = "Get an event",
    params(
        ("id" = i64, Path, description = "Event id"),
    ),
    responses(
        (status = 200, description = "Event", body = EventResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
    )
)]
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, GatewayError> {
    let record = state.event_service.get_event(id).await?;
    Ok(Json(EventResponse::from(record)))
}

/// `PUT /events/:id` — Update the given fields of an event.
///
/// # Errors
///
/// Returns [`GatewayError`] if the event or event type does not exist or
/// the timestamp is invalid.
#[utoipa::path(
    put,
    path = "/api/v1/events/{id}",
    tag = "Events",
    summary = "Update an event",
    description = "Only fields present in the body are changed.",
    params(
        ("id" = i64, Path, description = "Event id"),
    ),
    request_body = UpdateEventRequest,
    responses(
        (status = 200, description = "Updated event", body = EventResponse),
        (status = 400, description = "Invalid timestamp", body = ErrorResponse),
        (status = 404, description = "Event or event type not found", body = ErrorResponse),
    )
)]
pub async fn update_event(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateEventRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let record = state
        .event_service
        .update_event(id, req.description, req.raw_timestamp, req.event_type)
        .await?;
    Ok(Json(EventResponse::from(record)))
}

/// `DELETE /events/:id` — Remove an event.
///
/// # Errors
///
/// Returns [`GatewayError::EventNotFound`] if the event does not exist.
#[utoipa::path(
    delete,
    path = "/api/v1/events/{id}",
    tag = "Events",
    summary = "Delete an event",
    params(
        ("id" = i64, Path, description = "Event id"),
    ),
    responses(
        (status = 204, description = "Event deleted"),
        (status = 404, description = "Event not found", body = ErrorResponse),
    )
)]
pub async fn delete_event(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, GatewayError> {
    state.event_service.delete_event(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Event routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/events", get(list_events).post(create_event))
        .route(
            "/events/{id}",
            get(get_event).put(update_event).delete(delete_event),
        )
}
