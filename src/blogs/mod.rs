use crate::state::AppState;
use axum::Router;

pub(crate) mod dto;
pub mod handlers;

pub use dto::{BlogInput, BlogUpdate};

pub fn router() -> Router<AppState> {
    handlers::blog_routes()
}
