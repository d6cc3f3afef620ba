//! Bearer-token authentication: HS256 JWT validation middleware and the
//! login endpoint that issues tokens against the local users table.

use std::sync::Arc;

use anyhow::anyhow;
use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Duration, Utc};
use diesel::prelude::*;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::shared::schema::users;
use crate::shared::state::AppState;

const TOKEN_EXPIRY_HOURS: i64 = 24;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user_id: Uuid, email: &str, expiry: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id.to_string(),
            email: email.to_string(),
            exp: expiry.timestamp(),
            iat: now.timestamp(),
        }
    }

    pub fn user_id(&self) -> anyhow::Result<Uuid> {
        Uuid::parse_str(&self.sub).map_err(|e| anyhow!("invalid subject claim: {e}"))
    }
}

/// Authenticated principal, inserted into request extensions by the
/// bearer middleware and available to handlers via `Extension`.
#[derive(Debug, Clone, Serialize)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub email: String,
}

#[derive(Debug, Clone, Queryable)]
#[diesel(table_name = users)]
pub struct DbUser {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub password_hash: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| anyhow!("password hashing failed: {e}"))
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

pub fn issue_token(user_id: Uuid, email: &str, secret: &str) -> anyhow::Result<String> {
    let expiry = Utc::now() + Duration::hours(TOKEN_EXPIRY_HOURS);
    let claims = Claims::new(user_id, email, expiry);
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| anyhow!("token encoding failed: {e}"))
}

pub fn validate_token(token: &str, secret: &str) -> anyhow::Result<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 60;
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| anyhow!("token validation failed: {e}"))
}

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({ "error": message })),
    )
        .into_response()
}

/// Reject requests without a valid `Authorization: Bearer` credential.
pub async fn require_bearer(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| unauthorized("Missing bearer credential"))?;

    let claims = validate_token(token, &state.config.jwt_secret)
        .map_err(|_| unauthorized("Invalid bearer credential"))?;

    let user_id = claims
        .user_id()
        .map_err(|_| unauthorized("Invalid bearer credential"))?;

    request.extensions_mut().insert(AuthenticatedUser {
        user_id,
        email: claims.email,
    });

    Ok(next.run(request).await)
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: LoginUser,
}

#[derive(Debug, Serialize)]
pub struct LoginUser {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, Response> {
    let mut conn = state.conn.get().map_err(|e| {
        warn!(error = %e, "connection pool exhausted during login");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": "Database unavailable" })),
        )
            .into_response()
    })?;

    let user: DbUser = users::table
        .filter(users::email.eq(&req.email))
        .filter(users::is_active.eq(true))
        .first(&mut conn)
        .map_err(|_| unauthorized("Invalid email or password"))?;

    if !verify_password(&req.password, &user.password_hash) {
        return Err(unauthorized("Invalid email or password"));
    }

    let token = issue_token(user.id, &user.email, &state.config.jwt_secret)
        .map_err(|e| {
            warn!(error = %e, "token issuance failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": "Token issuance failed" })),
            )
                .into_response()
        })?;

    Ok(Json(LoginResponse {
        token,
        user: LoginUser {
            id: user.id,
            email: user.email,
            display_name: user.display_name,
        },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_roundtrip_verifies() {
        let hash = hash_password("studio-pass-123").expect("hash failed");
        assert!(verify_password("studio-pass-123", &hash));
        assert!(!verify_password("wrong-pass", &hash));
    }

    #[test]
    fn verify_rejects_malformed_hash() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn token_roundtrip_preserves_claims() {
        let user_id = Uuid::new_v4();
        let token = issue_token(user_id, "lead@studio.test", "test-secret").expect("issue failed");
        let claims = validate_token(&token, "test-secret").expect("validation failed");
        assert_eq!(claims.user_id().expect("bad sub"), user_id);
        assert_eq!(claims.email, "lead@studio.test");
    }

    #[test]
    fn token_rejected_with_wrong_secret() {
        let token = issue_token(Uuid::new_v4(), "lead@studio.test", "secret-a").expect("issue failed");
        assert!(validate_token(&token, "secret-b").is_err());
    }
}
