use crate::error::AppError;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub rol: String,
    pub iat: usize,
    pub exp: usize,
}

pub fn generate_jwt_token(
    username: &str,
    rol: &str,
    jwt_secret: &str,
    valid_for: Duration,
) -> Result<String, AppError> {
    if jwt_secret.is_empty() {
        return Err(AppError::Internal("JWT secret cannot be empty".to_string()));
    }

    let now = Utc::now();
    let claims = TokenClaims {
        sub: username.to_string(),
        rol: rol.to_string(),
        iat: now.timestamp().max(0) as usize,
        exp: (now + valid_for).timestamp().max(0) as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_ref()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to generate JWT token: {}", e)))
}

pub fn verify_jwt_token(
    jwt_secret: &str,
    token: &str,
) -> Result<TokenData<TokenClaims>, AppError> {
    let validation = Validation::default();

    decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_ref()),
        &validation,
    )
    .map_err(|e| AppError::Auth(format!("Invalid token: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let token = generate_jwt_token("ana", "admin", "secret", Duration::hours(24)).unwrap();
        let data = verify_jwt_token("secret", &token).unwrap();
        assert_eq!(data.claims.sub, "ana");
        assert_eq!(data.claims.rol, "admin");
    }

    #[test]
    fn rejects_wrong_secret() {
        let token = generate_jwt_token("ana", "admin", "secret", Duration::hours(24)).unwrap();
        assert!(verify_jwt_token("otro", &token).is_err());
    }

    #[test]
    fn rejects_expired_token() {
        let token = generate_jwt_token("ana", "admin", "secret", Duration::hours(-1)).unwrap();
        assert!(verify_jwt_token("secret", &token).is_err());
    }

    #[test]
    fn rejects_empty_secret_on_issue() {
        assert!(generate_jwt_token("ana", "admin", "", Duration::hours(1)).is_err());
    }
}
