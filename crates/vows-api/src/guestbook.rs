use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{SecondsFormat, Utc};
use tracing::info;
use uuid::Uuid;

use vows_types::api::{GuestbookRequest, MemoryCreated, ToggleLikeRequest, ToggleLikeResponse};
use vows_types::events::LiveEvent;
use vows_types::models::Memory;
use vows_types::validate;

use crate::error::ApiError;
use crate::extract::JsonBody;
use crate::state::{AppState, with_db};

pub(crate) async fn load_memories(state: &AppState) -> Result<Vec<Memory>, ApiError> {
    with_db(state, |db| {
        db.list_memories()?
            .into_iter()
            .map(Memory::try_from)
            .collect::<anyhow::Result<Vec<_>>>()
    })
    .await
}

/// GET /guestbook: newest first.
pub async fn list_memories(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(load_memories(&state).await?))
}

/// POST /guestbook
pub async fn create_memory(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<GuestbookRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let draft = validate::memory(&req).map_err(ApiError::Validation)?;

    let id = Uuid::new_v4();
    let created_at = Utc::now();
    let stamp = created_at.to_rfc3339_opts(SecondsFormat::Micros, true);
    let row_draft = draft.clone();
    with_db(&state, move |db| db.insert_memory(&id.to_string(), &row_draft, &stamp)).await?;

    let memory = Memory {
        id,
        name: draft.name,
        message: draft.message,
        photo: draft.photo,
        likes: 0,
        created_at,
    };
    state.dispatcher.broadcast(LiveEvent::MemoryCreated {
        memory: memory.clone(),
    });
    info!("Guestbook memory {} from {}", memory.id, memory.name);

    Ok((
        StatusCode::CREATED,
        Json(MemoryCreated {
            memory,
            title: "Memory Shared!".into(),
            description: "Thank you for sharing your beautiful memory with us.".into(),
        }),
    ))
}

/// POST /guestbook/{id}/like: one like up or down. Which browsers already
/// liked a memory is tracked client-side.
pub async fn toggle_like(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    JsonBody(req): JsonBody<ToggleLikeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let likes = with_db(&state, move |db| db.adjust_likes(&id.to_string(), req.liked))
        .await?
        .ok_or(ApiError::NotFound)?;

    state.dispatcher.broadcast(LiveEvent::MemoryLiked { id, likes });
    Ok(Json(ToggleLikeResponse { id, likes }))
}
