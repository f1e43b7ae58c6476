use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, response::IntoResponse};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::{info, warn};

use vows_types::api::{Claims, LoginRequest, LoginResponse};

use crate::error::ApiError;
use crate::extract::JsonBody;
use crate::state::AppState;

const ADMIN_SUBJECT: &str = "admin";
const SESSION_HOURS: i64 = 12;

/// Hashes the dashboard password with Argon2id. Called once at startup.
pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))?
        .to_string();
    Ok(hash)
}

fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            warn!("Stored admin password hash is unreadable: {}", e);
            false
        }
    }
}

pub async fn login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // Argon2 is CPU-bound; run it off the async workers.
    let hash = state.settings.admin_password_hash.clone();
    let ok = tokio::task::spawn_blocking(move || verify_password(&req.password, &hash))
        .await
        .map_err(|e| ApiError::Store(anyhow::anyhow!("blocking task failed: {}", e)))?;
    if !ok {
        warn!("Rejected dashboard login");
        return Err(ApiError::Unauthorized);
    }

    let expires_at = Utc::now() + Duration::hours(SESSION_HOURS);
    let token = create_token(&state.settings.jwt_secret, expires_at)?;
    info!("Dashboard login, session valid until {}", expires_at);

    Ok(Json(LoginResponse { token, expires_at }))
}

pub fn create_token(secret: &str, expires_at: DateTime<Utc>) -> anyhow::Result<String> {
    let claims = Claims {
        sub: ADMIN_SUBJECT.to_string(),
        exp: expires_at.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_round_trip() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("battery staple", &hash));
        assert!(!verify_password("correct horse", "not-a-phc-string"));
    }
}
