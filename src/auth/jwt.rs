use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

/// Claims of an access token issued by the hosted auth provider
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: Uuid,                 // User ID
    pub email: Option<String>,     // User email
    pub aud: Option<String>,       // Audience
    pub iat: usize,                // Issued at
    pub exp: usize,                // Expiration
}

/// Verifies HS256 access tokens signed with the provider's shared secret.
#[derive(Clone)]
pub struct TokenVerifier {
    secret: Secret<String>,
    audience: Option<String>,
}

impl TokenVerifier {
    pub fn new(secret: Secret<String>, audience: Option<String>) -> Self {
        Self { secret, audience }
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        match &self.audience {
            Some(aud) => validation.set_audience(&[aud]),
            None => validation.validate_aud = false,
        }
        validation
    }

    /// Decode and validate an access token
    pub fn decode_token(&self, token: &str) -> Result<TokenClaims, AppError> {
        decode::<TokenClaims>(
            token,
            &DecodingKey::from_secret(self.secret.expose_secret().as_bytes()),
            &self.validation(),
        )
        .map(|data| data.claims)
        .map_err(|e| AppError::Unauthorized(format!("Invalid token: {e}")))
    }
}
