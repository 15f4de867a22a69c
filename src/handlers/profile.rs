use axum::{extract::State, Extension, Json};

use crate::auth::middleware::AuthOwner;
use crate::dto::{validated, UpdateProfileRequest};
use crate::error::AppResult;
use crate::models::profile::Profile;
use crate::AppState;

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(owner): Extension<AuthOwner>,
) -> AppResult<Json<Profile>> {
    let profile = state.store.get_or_create_owner(owner.owner_id).await?;
    Ok(Json(profile))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(owner): Extension<AuthOwner>,
    Json(body): Json<UpdateProfileRequest>,
) -> AppResult<Json<Profile>> {
    let patch = validated(body)?.into_patch()?;
    let profile = state
        .store
        .update_owner_profile(owner.owner_id, &patch)
        .await?;

    tracing::info!(owner_id = owner.owner_id, "Profile updated");
    Ok(Json(profile))
}
