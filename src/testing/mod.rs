//! Fixtures for end-to-end runs. Mounted only when `APP_ENV=test`.

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use tracing::{info, instrument};

use crate::{blogs::BlogInput, error::AppError, state::AppState, store::Blog};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/testing/reset", post(reset))
        .route("/testing/blogs", post(seed_blogs))
}

#[instrument(skip(state))]
pub async fn reset(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state.blogs.delete_all().await?;
    state.users.delete_all().await?;
    info!("test data reset");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip_all)]
pub async fn seed_blogs(
    State(state): State<AppState>,
    Json(payload): Json<Vec<BlogInput>>,
) -> Result<(StatusCode, Json<Vec<Blog>>), AppError> {
    let blogs = payload
        .into_iter()
        .map(|b| b.into_new_blog(None))
        .collect::<Result<Vec<_>, _>>()?;
    let created = state.blogs.create_many(blogs).await?;
    info!(count = created.len(), "seeded blogs");
    Ok((StatusCode::CREATED, Json(created)))
}
