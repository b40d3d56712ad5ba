pub mod password;
pub mod reset_key;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config;
use crate::types::Role;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Username
    pub sub: String,
    pub user_id: Uuid,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(username: String, user_id: Uuid, role: Role) -> Self {
        let now = Utc::now();
        let expiry_hours = config::config().security.jwt_expiry_hours;
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            sub: username,
            user_id,
            role,
            exp,
            iat: now.timestamp(),
        }
    }

    /// Seconds until expiry, as reported to clients on login
    pub fn expires_in(&self) -> i64 {
        self.exp - self.iat
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),
    #[error("Invalid JWT token: {0}")]
    InvalidToken(String),
    #[error("JWT secret not configured")]
    InvalidSecret,
}

pub fn generate_jwt(claims: &Claims) -> Result<String, JwtError> {
    generate_jwt_with_secret(claims, &config::config().security.jwt_secret)
}

pub fn validate_jwt(token: &str) -> Result<Claims, JwtError> {
    validate_jwt_with_secret(token, &config::config().security.jwt_secret)
}

fn generate_jwt_with_secret(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());

    encode(&Header::default(), claims, &encoding_key)
        .map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

fn validate_jwt_with_secret(token: &str, secret: &str) -> Result<Claims, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());

    decode::<Claims>(token, &decoding_key, &Validation::default())
        .map(|data| data.claims)
        .map_err(|e| JwtError::InvalidToken(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn token_round_trip_keeps_claims() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new("leanne".to_string(), user_id, Role::Admin);
        let token = generate_jwt_with_secret(&claims, SECRET).unwrap();

        let decoded = validate_jwt_with_secret(&token, SECRET).unwrap();
        assert_eq!(decoded.sub, "leanne");
        assert_eq!(decoded.user_id, user_id);
        assert_eq!(decoded.role, Role::Admin);
        assert!(decoded.expires_in() > 0);
    }

    #[test]
    fn rejects_wrong_secret_and_expired_tokens() {
        let claims = Claims::new("bob".to_string(), Uuid::new_v4(), Role::User);
        let token = generate_jwt_with_secret(&claims, SECRET).unwrap();
        assert!(matches!(
            validate_jwt_with_secret(&token, "other-secret"),
            Err(JwtError::InvalidToken(_))
        ));

        let mut expired = claims.clone();
        expired.iat -= 7200;
        expired.exp = expired.iat + 60;
        let token = generate_jwt_with_secret(&expired, SECRET).unwrap();
        assert!(validate_jwt_with_secret(&token, SECRET).is_err());
    }

    #[test]
    fn empty_secret_is_refused() {
        let claims = Claims::new("bob".to_string(), Uuid::new_v4(), Role::User);
        assert!(matches!(generate_jwt_with_secret(&claims, ""), Err(JwtError::InvalidSecret)));
        assert!(matches!(validate_jwt_with_secret("x.y.z", ""), Err(JwtError::InvalidSecret)));
    }
}
