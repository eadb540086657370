use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, ConfigError};

/// Token lifetime. Every issued token expires exactly this long after issuance.
pub const TOKEN_TTL_HOURS: i64 = 24;

/// Claims
///
/// The payload embedded inside every bearer token issued by this service.
/// Signed with the process-wide secret and validated on every authenticated
/// request. The claim is self-contained: verifying it requires no store
/// lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the UUID of the account the token was issued to.
    pub sub: Uuid,
    /// The account's username, carried so handlers can attribute writes
    /// without a round trip to the credential store.
    pub username: String,
    /// Issued At (iat): timestamp when the token was created.
    pub iat: usize,
    /// Expiration Time (exp): timestamp after which the token must not be
    /// accepted.
    pub exp: usize,
}

/// TokenService
///
/// Issues and verifies the signed, time-limited bearer tokens that stand in
/// for sessions. Constructed once at startup from the configured secret;
/// the keys are immutable afterwards and shared read-only across requests.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenService {
    /// new
    ///
    /// Prepares the HS256 signing and verification keys. An empty secret is
    /// rejected here, at startup, so a misconfigured process never reaches
    /// the point of serving traffic.
    pub fn new(secret: &str) -> Result<Self, ConfigError> {
        if secret.is_empty() {
            return Err(ConfigError::EmptyValue("JWT_SECRET"));
        }

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        })
    }

    /// issue
    ///
    /// Signs a fresh token for the given account. The expiry is fixed at
    /// `TOKEN_TTL_HOURS` from now; callers cannot request longer sessions.
    pub fn issue(&self, account_id: Uuid, username: &str) -> Result<String, ApiError> {
        let now = Utc::now().timestamp() as usize;

        let claims = Claims {
            sub: account_id,
            username: username.to_owned(),
            iat: now,
            exp: now + (TOKEN_TTL_HOURS * 3600) as usize,
        };

        encode(&Header::default(), &claims, &self.encoding).map_err(|err| {
            tracing::error!("token signing failed: {err}");
            ApiError::Internal
        })
    }

    /// verify
    ///
    /// Checks the signature and the expiry of a presented token and returns
    /// the embedded claims. A token is invalid from its `exp` second onward,
    /// with no leeway window. Malformed, tampered, and expired tokens all
    /// fail with the same `InvalidCredential`: the caller must not be able
    /// to distinguish a forged token from a stale one.
    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        let mut validation = Validation::default();
        validation.validate_exp = true;
        validation.leeway = 0;

        match decode::<Claims>(token, &self.decoding, &validation) {
            // The decoder still accepts a token during its expiry second;
            // the token lifetime ends at `exp` exactly.
            Ok(data) if Utc::now().timestamp() as usize >= data.claims.exp => {
                tracing::debug!("rejected bearer token at expiry boundary");
                Err(ApiError::InvalidCredential)
            }
            Ok(data) => Ok(data.claims),
            Err(err) => {
                // The precise failure kind is useful when debugging client
                // integrations, but it stays in the logs.
                tracing::debug!(kind = ?err.kind(), "rejected bearer token");
                Err(ApiError::InvalidCredential)
            }
        }
    }
}
