use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use tracing::{instrument, warn};

use super::{
    dto::{LoginRequest, LoginResponse},
    service::Credentials,
};
use crate::{error::AppError, state::AppState};

pub fn login_routes() -> Router<AppState> {
    Router::new().route("/login", post(login))
}

#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AppError> {
    let payload = match payload {
        Ok(Json(body)) => body,
        Err(rejection) => {
            warn!(error = %rejection, "unreadable login body");
            LoginRequest::default()
        }
    };

    let issued = state
        .auth
        .login(Credentials {
            username: payload.username,
            password: payload.password,
        })
        .await?;

    Ok(Json(LoginResponse {
        token: issued.token,
        username: issued.username,
        name: issued.name,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_request_tolerates_missing_fields() {
        let req: LoginRequest = serde_json::from_str(r#"{"username":"mikko"}"#).unwrap();
        assert_eq!(req.username.as_deref(), Some("mikko"));
        assert!(req.password.is_none());
    }

    #[test]
    fn login_response_shape() {
        let json = serde_json::to_value(LoginResponse {
            token: "t".into(),
            username: "mikko".into(),
            name: "Mikko Kirkanen".into(),
        })
        .unwrap();
        assert_eq!(json["token"], "t");
        assert_eq!(json["username"], "mikko");
        assert_eq!(json["name"], "Mikko Kirkanen");
    }
}
