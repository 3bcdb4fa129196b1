//! Session and password-reset token primitives
//!
//! Session tokens are HS256 JWTs signed with a process-wide secret that is
//! read once at startup and injected into the service constructor. Reset
//! tokens are random one-time secrets; only their SHA-256 digest is ever
//! stored.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::error;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

/// Number of random bytes behind a reset token
pub const RESET_TOKEN_BYTES: usize = 20;

/// Reset tokens stay valid for this many minutes
pub const RESET_TOKEN_TTL_MINUTES: i64 = 10;

/// Token configuration
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// Secret used to sign and verify session tokens
    pub secret: String,
    /// Session token expiry in seconds (default: 30 days)
    pub expiry_seconds: u64,
}

impl TokenConfig {
    /// Create a new TokenConfig from environment variables
    ///
    /// # Environment Variables
    /// - `JWT_SECRET`: Secret for signing session tokens (required)
    /// - `JWT_EXPIRE`: Session token expiry in seconds (default: 2592000)
    pub fn from_env() -> anyhow::Result<Self> {
        let secret = std::env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable not set"))?;

        let expiry_seconds = std::env::var("JWT_EXPIRE")
            .unwrap_or_else(|_| "2592000".to_string()) // 30 days
            .parse()
            .unwrap_or(2_592_000);

        Ok(TokenConfig {
            secret,
            expiry_seconds,
        })
    }
}

/// Session token claims
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: Uuid,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
}

/// Session token service
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    expiry_seconds: u64,
}

impl TokenService {
    /// Initialize a new token service from an injected configuration
    pub fn new(config: &TokenConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        TokenService {
            encoding_key,
            decoding_key,
            validation,
            expiry_seconds: config.expiry_seconds,
        }
    }

    /// Issue a signed session token for a user
    pub fn issue(&self, user_id: Uuid) -> ApiResult<String> {
        let now = unix_now()?;

        let claims = Claims {
            sub: user_id,
            iat: now,
            exp: now + self.expiry_seconds,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
            error!("Failed to sign session token: {}", e);
            ApiError::Internal
        })
    }

    /// Verify a session token and return the subject user id
    ///
    /// Malformed, expired and wrongly-signed tokens all fail with the same
    /// `Unauthorized` value; the caller cannot tell which check tripped.
    pub fn verify(&self, token: &str) -> ApiResult<Uuid> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims.sub)
            .map_err(|_| ApiError::Unauthorized)
    }
}

fn unix_now() -> ApiResult<u64> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| {
            error!("Failed to get current time: {}", e);
            ApiError::Internal
        })
}

/// Generate a fresh reset token, returning (plaintext, digest)
///
/// The plaintext goes to the user and is never stored; the hex-encoded
/// SHA-256 digest is what lands on the user record.
pub fn generate_reset_token() -> (String, String) {
    let mut bytes = [0u8; RESET_TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    let plaintext = hex::encode(bytes);
    let digest = hash_reset_token(&plaintext);
    (plaintext, digest)
}

/// Digest a reset token plaintext for storage or lookup
pub fn hash_reset_token(plaintext: &str) -> String {
    hex::encode(Sha256::digest(plaintext.as_bytes()))
}
