use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;

use crate::http::error::ApiError;
use crate::state::AppState;
use arbor_core::domain::Id;
use arbor_core::domain::comments::{Comment, NewComment};
use arbor_core::domain::listing::{ListParams, Listing};

#[derive(Debug, Default, Deserialize)]
pub struct CommentsParams {
    pub parent: Option<Id>,
    pub post_id: Option<Id>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

pub async fn create_comment(
    State(state): State<AppState>,
    Json(new): Json<NewComment>,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    let comment = state.comments.create_comment(new).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn list_comments(
    State(state): State<AppState>,
    Query(params): Query<CommentsParams>,
) -> Result<Json<Listing<Comment>>, ApiError> {
    let list = ListParams {
        page: params.page,
        page_size: params.page_size,
        search: params.search,
        sort_by: params.sort_by,
        sort_order: params.sort_order,
    };
    let listing = state
        .comments
        .list_comments(params.parent, params.post_id, list)
        .await?;
    Ok(Json(listing))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<StatusCode, ApiError> {
    state.comments.delete_comment(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
