use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use super::dto::{PublicUser, RegisterRequest};
use crate::{
    error::AppError,
    state::AppState,
    store::{NewUser, StoreError},
};

const MIN_PASSWORD_LEN: usize = 3;

pub fn user_routes() -> Router<AppState> {
    Router::new().route("/users", get(list_users).post(register))
}

fn is_valid_username(username: &str) -> bool {
    lazy_static! {
        static ref USERNAME_RE: Regex = Regex::new(r"^[A-Za-z0-9_.\-]{3,}$").unwrap();
    }
    USERNAME_RE.is_match(username)
}

#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<PublicUser>), AppError> {
    payload.username = payload.username.trim().to_string();

    if !is_valid_username(&payload.username) {
        warn!("invalid username");
        return Err(AppError::BadRequest(
            "username must be at least 3 characters of letters, digits, `_`, `.` or `-`".into(),
        ));
    }

    if payload.password.chars().count() < MIN_PASSWORD_LEN {
        warn!("password too short");
        return Err(AppError::BadRequest(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    // fast path; the store still rejects a racing duplicate on insert
    if state.users.find_by_username(&payload.username).await?.is_some() {
        warn!("username already registered");
        return Err(AppError::Conflict("username already taken".into()));
    }

    let password_hash = state.passwords.hash_blocking(payload.password).await?;

    let user = state
        .users
        .create(NewUser {
            username: payload.username,
            name: payload.name.trim().to_string(),
            password_hash,
        })
        .await
        .inspect_err(|e| {
            if let StoreError::DuplicateUsername(_) = e {
                warn!("username registered concurrently");
            }
        })?;

    info!(user_id = %user.id, "user registered");
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<PublicUser>>, AppError> {
    let users = state.users.list().await?;
    Ok(Json(users.into_iter().map(PublicUser::from).collect()))
}
