use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::dto::{BlogInput, BlogUpdate};
use crate::{auth::AuthUser, error::AppError, state::AppState, store::Blog};

pub fn blog_routes() -> Router<AppState> {
    Router::new()
        .route("/blogs", get(list_blogs).post(create_blog))
        .route(
            "/blogs/:id",
            get(get_blog).put(update_blog).delete(delete_blog),
        )
}

#[instrument(skip(state))]
pub async fn list_blogs(State(state): State<AppState>) -> Result<Json<Vec<Blog>>, AppError> {
    Ok(Json(state.blogs.list().await?))
}

#[instrument(skip(state))]
pub async fn get_blog(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Blog>, AppError> {
    state
        .blogs
        .get(id)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound("blog"))
}

#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn create_blog(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<BlogInput>,
) -> Result<(StatusCode, Json<Blog>), AppError> {
    // the token may outlive its user after a reset
    if state.users.find_by_id(user.id).await?.is_none() {
        warn!("token for a user that no longer exists");
        return Err(AppError::Unauthorized);
    }

    let blog = state
        .blogs
        .create(payload.into_new_blog(Some(user.id))?)
        .await?;

    info!(blog_id = %blog.id, "blog created");
    Ok((StatusCode::CREATED, Json(blog)))
}

#[instrument(skip(state, _user, payload))]
pub async fn update_blog(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<BlogUpdate>,
) -> Result<Json<Blog>, AppError> {
    let blog = state
        .blogs
        .update(id, payload.into_patch()?)
        .await?
        .ok_or(AppError::NotFound("blog"))?;
    Ok(Json(blog))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn delete_blog(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let blog = state
        .blogs
        .get(id)
        .await?
        .ok_or(AppError::NotFound("blog"))?;

    let is_creator = blog.user.as_ref().is_some_and(|c| c.id == user.id);
    if !is_creator {
        warn!(blog_id = %id, "delete by non-creator refused");
        return Err(AppError::Forbidden);
    }

    if !state.blogs.delete(id).await? {
        return Err(AppError::NotFound("blog"));
    }
    info!(blog_id = %id, "blog deleted");
    Ok(StatusCode::NO_CONTENT)
}
