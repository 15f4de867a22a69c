use axum::{extract::State, Extension, Json};

use crate::auth::middleware::AuthOwner;
use crate::dto::{validated, ChunksResponse, CommandRequest, MessageRequest, MessageResponse};
use crate::error::AppResult;
use crate::services::commands::{run_command, CommandContext};
use crate::services::router::handle_utterance;
use crate::AppState;

/// Free text from the chat transport: classify, route, reply in chunks.
pub async fn post_message(
    State(state): State<AppState>,
    Extension(owner): Extension<AuthOwner>,
    Json(body): Json<MessageRequest>,
) -> AppResult<Json<MessageResponse>> {
    let body = validated(body)?;
    let (kind, reply) = handle_utterance(
        state.store.as_ref(),
        state.oracle.as_ref(),
        &state.calendar,
        owner.owner_id,
        &body.text,
    )
    .await?;

    Ok(Json(MessageResponse::new(kind, reply)))
}

pub async fn post_command(
    State(state): State<AppState>,
    Extension(owner): Extension<AuthOwner>,
    Json(body): Json<CommandRequest>,
) -> AppResult<Json<ChunksResponse>> {
    let body = validated(body)?;
    let ctx = CommandContext {
        store: state.store.as_ref(),
        oracle: state.oracle.as_ref(),
        calendar: &state.calendar,
        owner_id: owner.owner_id,
    };

    let reply = run_command(&ctx, &body.command, &body.args).await?;
    Ok(Json(reply.into()))
}
