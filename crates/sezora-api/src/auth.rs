use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::{info, warn};

use sezora_core::{Session, profile};
use sezora_db::{Database, is_constraint_violation};
use sezora_types::api::{AuthResponse, Claims, LoginRequest, RegisterRequest};
use sezora_types::models::User;

use crate::error::ApiError;
use crate::run_blocking;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Arc<Database>,
    pub jwt_secret: String,
    pub admin_email: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = profile::new_user(&req, &state.admin_email)?;
    let password_hash = hash_password(&req.password).map_err(|_| ApiError::Internal)?;

    let user = run_blocking(&state, move |state| {
        if state.db.get_credentials_by_email(&user.email)?.is_some() {
            return Err(ApiError::EmailTaken);
        }
        state
            .db
            .create_user(&user, &password_hash)
            .map_err(|e| {
                if is_constraint_violation(&e) {
                    ApiError::EmailTaken
                } else {
                    e.into()
                }
            })?;
        Ok(user)
    })
    .await?;

    let token = create_token(&state.jwt_secret, &user)?;
    info!("Registered {} {} ({})", user.user_type, user.email, user.id);

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user_id: user.id,
            token,
            profile: user,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = req.email.trim().to_lowercase();
    let (user, password_hash) = run_blocking(&state, move |state| {
        Ok(state.db.get_credentials_by_email(&email)?)
    })
    .await?
    .ok_or(ApiError::Unauthorized)?;

    // Verify password
    let parsed_hash = PasswordHash::new(&password_hash).map_err(|_| ApiError::Internal)?;
    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::Unauthorized)?;

    let token = create_token(&state.jwt_secret, &user)?;

    Ok(Json(AuthResponse {
        user_id: user.id,
        token,
        profile: user,
    }))
}

/// Create the operator account unless a user with that email already exists.
/// Returns whether an account was created.
pub fn ensure_admin(db: &Database, admin_email: &str, password: &str) -> anyhow::Result<bool> {
    let admin = profile::admin_user(admin_email);
    if db.get_credentials_by_email(&admin.email)?.is_some() {
        return Ok(false);
    }
    if password.len() < 8 {
        warn!("Admin password is shorter than 8 characters");
    }

    let password_hash = hash_password(password)?;
    db.create_user(&admin, &password_hash)?;
    info!("Created admin account {} ({})", admin.email, admin.id);
    Ok(true)
}

/// Argon2id hash in PHC string form.
fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))?;
    Ok(hash.to_string())
}

pub fn create_token(secret: &str, user: &User) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user.id,
        email: user.email.clone(),
        exp: (chrono::Utc::now() + chrono::Duration::days(30)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

pub(crate) fn load_session(state: &AppStateInner, claims: &Claims) -> Result<Session, ApiError> {
    Session::load(&state.db, claims.sub, &state.admin_email)?.ok_or(ApiError::Unauthorized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::decode_token;
    use sezora_types::models::UserType;

    #[test]
    fn tokens_round_trip_with_the_same_secret() {
        let user = User {
            id: uuid::Uuid::new_v4(),
            email: "s@farm.edu".into(),
            name: "Sam".into(),
            age: None,
            bio: None,
            user_type: UserType::Student,
            company_name: None,
            created_at: chrono::Utc::now(),
        };
        let token = create_token("secret", &user).unwrap();

        let claims = decode_token("secret", &token).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.email, user.email);
        assert!(decode_token("other", &token).is_none());
    }

    #[test]
    fn admin_account_is_created_once() {
        let db = Database::open_in_memory().unwrap();
        assert!(ensure_admin(&db, "Admin@Sezora.com", "operator password").unwrap());
        assert!(!ensure_admin(&db, "admin@sezora.com", "another password").unwrap());

        let (admin, hash) = db.get_credentials_by_email("admin@sezora.com").unwrap().unwrap();
        assert_eq!(admin.user_type, UserType::Employer);
        let parsed = PasswordHash::new(&hash).unwrap();
        assert!(
            Argon2::default()
                .verify_password(b"operator password", &parsed)
                .is_ok()
        );
    }
}
