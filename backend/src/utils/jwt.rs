//! JWT token utilities for authentication and authorization.
//!
//! Access tokens are short-lived HS256 tokens carrying the owning account's
//! id and kind. They are never persisted: a token is valid exactly when its
//! signature verifies under the configured secret, its header names HS256 and
//! its expiry lies in the future.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::database::models::AccountKind;
use crate::errors::ServiceError;

/// JWT Claims structure carried by access tokens
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Account ID
    pub sub: String,
    /// Login namespace of the account
    pub kind: AccountKind,
    /// Token expiration timestamp
    pub exp: usize,
    /// Token issued at timestamp
    pub iat: usize,
}

/// JWT token utility for creating and validating tokens
#[derive(Clone)]
pub struct JwtUtils {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    expires_in_seconds: u64,
}

impl JwtUtils {
    /// Create a new JwtUtils instance from the injected configuration
    pub fn new(config: &Config) -> Self {
        let encoding_key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

        // Only HS256 is accepted; `Validation::new` pins the algorithm list.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        JwtUtils {
            encoding_key,
            decoding_key,
            validation,
            expires_in_seconds: config.access_token_ttl_seconds,
        }
    }

    /// Lifetime of freshly minted access tokens, in seconds
    pub fn expires_in(&self) -> u64 {
        self.expires_in_seconds
    }

    /// Generate a new access token for the given account
    pub fn generate_token(&self, account_id: &str, kind: AccountKind) -> Result<String, ServiceError> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.expires_in_seconds as i64);

        let claims = Claims {
            sub: account_id.to_string(),
            kind,
            exp: exp.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| ServiceError::internal_error(format!("Token generation failed: {}", e)))
    }

    /// Validate and decode an access token
    pub fn validate_token(&self, token: &str) -> Result<Claims, ServiceError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|token_data| token_data.claims)
            .map_err(|e| ServiceError::unauthorized(format!("Token validation failed: {}", e)))
    }
}

impl Claims {
    pub fn account_id(&self) -> &str {
        &self.sub
    }

    pub fn is_staff(&self) -> bool {
        self.kind == AccountKind::Staff
    }
}
