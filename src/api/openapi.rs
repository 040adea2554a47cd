//! OpenAPI document for the REST surface.

use utoipa::OpenApi;

use super::dto::{
    CreateEventRequest, CreateEventTypeRequest, EventListResponse, EventResponse, PaginationMeta,
    UpdateEventRequest,
};
use super::handlers::system::{ConnectionCounts, HealthResponse};
use super::handlers::{event_types, events, system};
use crate::domain::EventType;
use crate::error::{ErrorBody, ErrorResponse};

/// Generated OpenAPI 3 specification.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "peeper-gateway",
        description = "Event log REST API. The actuator/operator relay is served over WebSocket at /ws/actuator and /ws/operator."
    ),
    paths(
        events::create_event,
        events::list_events,
        events::get_event,
        events::update_event,
        events::delete_event,
        event_types::create_event_type,
        event_types::list_event_types,
        event_types::get_event_type,
        event_types::delete_event_type,
        system::health_handler,
    ),
    components(schemas(
        CreateEventRequest,
        UpdateEventRequest,
        EventResponse,
        EventListResponse,
        PaginationMeta,
        CreateEventTypeRequest,
        EventType,
        HealthResponse,
        ConnectionCounts,
        ErrorResponse,
        ErrorBody,
    )),
    tags(
        (name = "Events", description = "Timestamped event log"),
        (name = "Event Types", description = "Event categories"),
        (name = "System", description = "Service health"),
    )
)]
pub struct ApiDoc;
