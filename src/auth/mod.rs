use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod service;

pub use jwt::{AuthUser, Claims, JwtKeys, TOKEN_TTL_SECS};
pub use password::Passwords;
pub use service::{Authenticator, Credentials, LoginError};

pub fn router() -> Router<AppState> {
    handlers::login_routes()
}
