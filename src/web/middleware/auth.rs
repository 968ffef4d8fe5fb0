use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use base64::{engine::general_purpose, Engine as _};
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::database::user_repo;

/// Resolved session user, injected into request extensions by
/// [`require_auth`]. Handlers hand it to services explicitly.
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub user_id: i64,
    pub is_admin: bool,
}

#[derive(Deserialize)]
struct JwtPayload {
    sub: String,
}

/// Token issuance lives in the external auth service; this middleware only
/// reads the `access_token` cookie, takes the subject from the JWT payload
/// and loads the matching user row for the role check.
pub async fn require_auth(
    State(pool): State<SqlitePool>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(header::COOKIE)
        .and_then(|hv| hv.to_str().ok())
        .and_then(|cookies| {
            cookies
                .split("; ")
                .find(|c| c.starts_with("access_token="))
                .and_then(|c| c.strip_prefix("access_token="))
        });

    if let Some(token) = token {
        // Parse JWT payload (middle part)
        let parts: Vec<&str> = token.split('.').collect();
        if parts.len() == 3 {
            if let Ok(payload_bytes) = general_purpose::URL_SAFE_NO_PAD.decode(parts[1]) {
                if let Ok(payload) = serde_json::from_slice::<JwtPayload>(&payload_bytes) {
                    if let Ok(user_id) = payload.sub.parse::<i64>() {
                        if let Ok(Some(user)) = user_repo::load_auth_user(&pool, user_id).await {
                            request.extensions_mut().insert(AuthenticatedUser {
                                user_id: user.user_id,
                                is_admin: user.role.as_deref() == Some("admin"),
                            });
                            return next.run(request).await;
                        }
                    }
                }
            }
        }
    }

    // No valid token or unknown user, return 401
    Response::builder()
        .status(401)
        .body(axum::body::Body::from("Unauthorized - Please login"))
        .unwrap()
}
