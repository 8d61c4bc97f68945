use actix_web::{
    dev::ServiceRequest, error::ErrorUnauthorized, web, Error, HttpMessage,
};
use actix_web_httpauth::extractors::bearer::BearerAuth;
use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Header, Validation};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::ApiError, models::ROLE_ADMIN, state::TokenKeys};

/// Token lifetime in seconds (1 hour, no refresh; expiry forces re-login).
pub const TOKEN_TTL_SECS: i64 = 3600;

/// Verified identity attached to every authenticated request. Ownership and
/// role checks read from here, never from client-supplied payload fields.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: String,
    pub name: String,
    pub role: String,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub name: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

pub fn hash_password(password: &str) -> Result<String, password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, password_hash: &str) -> bool {
    let parsed_hash = PasswordHash::new(password_hash);
    match parsed_hash {
        Ok(hash) => Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok(),
        Err(_) => false,
    }
}

pub fn issue_token(keys: &TokenKeys, user: &AuthUser) -> Result<String, ApiError> {
    issue_token_with_ttl(keys, user, TOKEN_TTL_SECS)
}

pub fn issue_token_with_ttl(
    keys: &TokenKeys,
    user: &AuthUser,
    ttl_secs: i64,
) -> Result<String, ApiError> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user.id.clone(),
        name: user.name.clone(),
        role: user.role.clone(),
        iat: now,
        exp: now + ttl_secs,
    };
    encode(&Header::default(), &claims, &keys.encoding)
        .map_err(|err| ApiError::Internal(format!("token encode failed: {err}")))
}

pub fn decode_token(keys: &TokenKeys, token: &str) -> Result<AuthUser, ApiError> {
    let data = decode::<Claims>(token, &keys.decoding, &Validation::default())
        .map_err(|_| ApiError::Unauthorized)?;
    Ok(AuthUser {
        id: data.claims.sub,
        name: data.claims.name,
        role: data.claims.role,
    })
}

fn authenticate(req: &ServiceRequest, credentials: &BearerAuth) -> Result<AuthUser, Error> {
    let state = req
        .app_data::<web::Data<crate::state::AppState>>()
        .ok_or_else(|| ErrorUnauthorized("Unauthorized"))?;
    decode_token(&state.tokens, credentials.token())
        .map_err(|_| ErrorUnauthorized("Token ausente, inválido ou expirado."))
}

pub async fn bearer_validator(
    req: ServiceRequest,
    credentials: BearerAuth,
) -> Result<ServiceRequest, (Error, ServiceRequest)> {
    match authenticate(&req, &credentials) {
        Ok(user) => {
            req.extensions_mut().insert(user);
            Ok(req)
        }
        Err(err) => Err((err, req)),
    }
}

pub fn require_admin(auth: &AuthUser) -> Result<(), ApiError> {
    if auth.is_admin() {
        Ok(())
    } else {
        Err(ApiError::Forbidden(
            "Apenas administradores podem executar esta ação.".to_string(),
        ))
    }
}

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}
