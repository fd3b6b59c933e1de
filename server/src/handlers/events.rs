use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::Json;

use crate::auth::AuthUser;
use crate::models::{CreateEventInput, EventFilter, EventPatch};
use crate::state::AppState;
use crate::utils::error::{AppError, Operation};
use crate::utils::response::{created, success, success_with_message};

pub async fn list_upcoming(
    State(state): State<AppState>,
    query: Result<Query<EventFilter>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(filter) = query?;

    let events = state
        .repository
        .list_upcoming(filter)
        .await
        .map_err(AppError::during(Operation::FetchEvents))?;

    Ok(success(events))
}

pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let event = state
        .repository
        .get_by_id(&id)
        .await
        .map_err(AppError::during(Operation::FetchEvent))?;

    Ok(success(event))
}

pub async fn create_event(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    body: Result<Json<CreateEventInput>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(input) = body?;

    let event = state
        .repository
        .create(input, &identity)
        .await
        .map_err(AppError::during(Operation::CreateEvent))?;

    Ok(created(event, "Event created successfully"))
}

pub async fn join_event(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let event = state
        .repository
        .join(&id, &identity)
        .await
        .map_err(AppError::during(Operation::JoinEvent))?;

    Ok(success_with_message(event, "Successfully joined the event"))
}

pub async fn list_created(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> Result<Response, AppError> {
    let events = state
        .repository
        .list_created_by(&identity.email)
        .await
        .map_err(AppError::during(Operation::FetchCreatedEvents))?;

    Ok(success(events))
}

pub async fn list_joined(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> Result<Response, AppError> {
    let events = state
        .repository
        .list_joined_by(&identity.email)
        .await
        .map_err(AppError::during(Operation::FetchJoinedEvents))?;

    Ok(success(events))
}

pub async fn update_event(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<String>,
    body: Result<Json<EventPatch>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(patch) = body?;

    let event = state
        .repository
        .update(&id, patch, &identity)
        .await
        .map_err(AppError::during(Operation::UpdateEvent))?;

    Ok(success_with_message(event, "Event updated successfully"))
}
