use axum::{Json, extract::FromRequestParts, http::StatusCode, http::request::Parts};

use crate::domain::value_objects::AuthenticatedUser;
use crate::presentation::http::dto::ApiResponse;

/// Header set by the authentication proxy in front of the service.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The caller's identity, taken from [`USER_ID_HEADER`]. Requests without a
/// usable id are rejected with 401 before any handler runs.
pub struct CurrentUser(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ApiResponse<()>>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();

        AuthenticatedUser::new(user_id.to_string())
            .map(CurrentUser)
            .map_err(|_| {
                ApiResponse::failure(
                    StatusCode::UNAUTHORIZED,
                    "UNAUTHENTICATED",
                    format!("Missing {} header", USER_ID_HEADER),
                )
            })
    }
}
