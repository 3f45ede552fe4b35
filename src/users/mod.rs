use crate::state::AppState;
use axum::Router;

mod dto;
pub mod handlers;

pub use dto::{PublicUser, RegisterRequest};

pub fn router() -> Router<AppState> {
    handlers::user_routes()
}
