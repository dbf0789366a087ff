use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;

use crate::http::error::ApiError;
use crate::state::AppState;
use arbor_core::domain::Id;
use arbor_core::domain::listing::{ListParams, Listing};
use arbor_core::domain::posts::{NewPost, Post};

pub async fn create_post(
    State(state): State<AppState>,
    Json(new): Json<NewPost>,
) -> Result<(StatusCode, Json<Post>), ApiError> {
    let post = state.posts.create_post(new).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn list_posts(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Listing<Post>>, ApiError> {
    Ok(Json(state.posts.list_posts(params).await?))
}

pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<Json<Post>, ApiError> {
    Ok(Json(state.posts.get_post_by_id(id).await?))
}

pub async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<StatusCode, ApiError> {
    state.posts.delete_post(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
