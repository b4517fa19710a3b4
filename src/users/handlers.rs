use axum::{extract::State, routing::get, Json, Router};
use tracing::instrument;

use super::{
    dto::{Downline, ProfileResponse, UplineResponse},
    services, tree,
};
use crate::{
    auth::extractors::AuthUser,
    error::AppResult,
    response::ApiResponse,
    state::AppState,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users/profile", get(profile))
        .route("/users/upline", get(upline))
        .route("/users/downline", get(downline))
}

#[instrument(skip(state))]
pub async fn profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<ApiResponse<ProfileResponse>>> {
    let user = services::get_profile(state.store.as_ref(), user_id).await?;
    Ok(ApiResponse::ok(
        "Profile retrieved successfully",
        ProfileResponse { user },
    ))
}

#[instrument(skip(state))]
pub async fn upline(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<ApiResponse<UplineResponse>>> {
    let upline = tree::get_upline(state.store.as_ref(), user_id).await?;
    Ok(ApiResponse::ok(
        "Upline retrieved successfully",
        UplineResponse {
            total_count: upline.len(),
            upline,
        },
    ))
}

#[instrument(skip(state))]
pub async fn downline(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<ApiResponse<Downline>>> {
    let downline = tree::get_downline(state.store.as_ref(), user_id).await?;
    Ok(ApiResponse::ok("Downline retrieved successfully", downline))
}
