use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;

use crate::auth::middleware::AuthOwner;
use crate::dto::{validated, ConfirmQuery, CreateNoteRequest, DeleteResponse, RangeQuery, SearchQuery};
use crate::error::{AppError, AppResult};
use crate::models::note::Note;
use crate::AppState;

pub async fn list_notes(
    State(state): State<AppState>,
    Extension(owner): Extension<AuthOwner>,
    Query(query): Query<RangeQuery>,
) -> AppResult<Json<Vec<Note>>> {
    let (start, end) = query.resolve(&state.calendar)?;
    let window = state.calendar.window(start, end)?;
    let notes = state.store.notes_in_window(owner.owner_id, window).await?;
    Ok(Json(notes))
}

pub async fn search_notes(
    State(state): State<AppState>,
    Extension(owner): Extension<AuthOwner>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<Vec<Note>>> {
    let query = validated(query)?;
    let notes = state
        .store
        .search_notes(owner.owner_id, query.q.trim(), query.limit())
        .await?;
    Ok(Json(notes))
}

pub async fn create_note(
    State(state): State<AppState>,
    Extension(owner): Extension<AuthOwner>,
    Json(body): Json<CreateNoteRequest>,
) -> AppResult<(StatusCode, Json<Note>)> {
    let new = validated(body)?.into_new()?;
    let note = state.store.insert_note(owner.owner_id, new).await?;

    tracing::info!(owner_id = owner.owner_id, note_id = %note.id, "Note created manually");
    Ok((StatusCode::CREATED, Json(note)))
}

pub async fn delete_note(
    State(state): State<AppState>,
    Extension(owner): Extension<AuthOwner>,
    Path(id): Path<Uuid>,
    Query(confirm): Query<ConfirmQuery>,
) -> AppResult<Json<DeleteResponse>> {
    confirm.require()?;
    if !state.store.delete_note(owner.owner_id, id).await? {
        return Err(AppError::NotFound("Note not found".into()));
    }

    tracing::info!(owner_id = owner.owner_id, note_id = %id, "Note deleted");
    Ok(Json(DeleteResponse { deleted: true, id }))
}
