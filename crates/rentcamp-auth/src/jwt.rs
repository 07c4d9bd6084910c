//! JWT token management
//!
//! Access and refresh tokens are signed with distinct secrets, so a token of
//! one kind never validates as the other.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rentcamp_db::UserRole;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AuthError;

/// Kind of token, each with its own secret and lifetime
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

/// JWT claims
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Username
    pub username: String,
    /// User role
    pub role: UserRole,
    /// Token kind
    pub kind: TokenKind,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
}

/// Tokens handed to a client after login or refresh
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl SigningKeys {
    fn new(kind: TokenKind, secret: &str, ttl_secs: i64) -> Result<Self, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::MissingSecret(kind.as_str()));
        }
        if ttl_secs <= 0 {
            return Err(AuthError::InvalidConfig(format!(
                "{} token lifetime must be positive, got {}",
                kind.as_str(),
                ttl_secs
            )));
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::seconds(ttl_secs),
        })
    }
}

/// Issues and validates access/refresh token pairs
pub struct TokenService {
    access: SigningKeys,
    refresh: SigningKeys,
    validation: Validation,
}

impl TokenService {
    /// Create a token service
    ///
    /// Both secrets must be non-empty and different from each other.
    pub fn new(
        access_secret: &str,
        refresh_secret: &str,
        access_ttl_secs: i64,
        refresh_ttl_secs: i64,
    ) -> Result<Self, AuthError> {
        let access = SigningKeys::new(TokenKind::Access, access_secret, access_ttl_secs)?;
        let refresh = SigningKeys::new(TokenKind::Refresh, refresh_secret, refresh_ttl_secs)?;
        if access_secret == refresh_secret {
            return Err(AuthError::InvalidConfig(
                "access and refresh secrets must differ".to_string(),
            ));
        }

        // Expiry is checked against an explicit clock in `validate_at`
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            access,
            refresh,
            validation,
        })
    }

    fn keys(&self, kind: TokenKind) -> &SigningKeys {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    /// Access token lifetime in seconds
    pub fn access_ttl_secs(&self) -> i64 {
        self.access.ttl.num_seconds()
    }

    /// Issue an access/refresh token pair for a user
    pub fn issue(&self, user_id: i64, username: &str, role: UserRole) -> Result<TokenPair, AuthError> {
        self.issue_at(user_id, username, role, Utc::now())
    }

    /// Issue a token pair as if the current time were `now`
    pub fn issue_at(
        &self,
        user_id: i64,
        username: &str,
        role: UserRole,
        now: DateTime<Utc>,
    ) -> Result<TokenPair, AuthError> {
        debug!("Generating tokens for user: {}", username);

        Ok(TokenPair {
            access_token: self.sign(TokenKind::Access, user_id, username, role, now)?,
            refresh_token: self.sign(TokenKind::Refresh, user_id, username, role, now)?,
            expires_in: self.access_ttl_secs(),
        })
    }

    fn sign(
        &self,
        kind: TokenKind,
        user_id: i64,
        username: &str,
        role: UserRole,
        now: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let keys = self.keys(kind);
        let claims = Claims {
            sub: user_id.to_string(),
            username: username.to_string(),
            role,
            kind,
            exp: (now + keys.ttl).timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding).map_err(AuthError::Jwt)
    }

    /// Validate a token of the given kind and return its claims
    pub fn validate(&self, token: &str, kind: TokenKind) -> Result<Claims, AuthError> {
        self.validate_at(token, kind, Utc::now())
    }

    /// Validate a token as if the current time were `now`
    ///
    /// The signature is checked before expiry, so a forged token is reported
    /// as invalid even when it is also stale.
    pub fn validate_at(
        &self,
        token: &str,
        kind: TokenKind,
        now: DateTime<Utc>,
    ) -> Result<Claims, AuthError> {
        let token_data = decode::<Claims>(token, &self.keys(kind).decoding, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    AuthError::InvalidSignature
                }
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::MalformedToken,
            })?;
        let claims = token_data.claims;

        if claims.kind != kind {
            return Err(AuthError::WrongTokenKind(kind.as_str()));
        }

        // Valid only strictly before expiry, no leeway
        if now.timestamp() >= claims.exp {
            return Err(AuthError::TokenExpired);
        }

        Ok(claims)
    }
}
