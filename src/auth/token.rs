//! Compact signed session tokens.
//!
//! A token is `header.payload.signature`, each segment base64url without
//! padding. The header is `{"alg":"HS256","typ":"JWT"}`, the payload is the
//! JSON `Claims`, and the signature is HMAC-SHA256 over the literal
//! `header.payload` string keyed with the server secret. The layout is the
//! HS256 compact JWT form, but only this one algorithm is understood.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fmt;
use thiserror::Error;

use crate::models::Role;

type HmacSha256 = Hmac<Sha256>;

/// Fixed token lifetime: 7 days.
pub const TOKEN_LIFETIME_SECS: i64 = 7 * 24 * 60 * 60;

/// Secret used when none is configured. Only acceptable in development.
pub const DEV_SECRET: &str = "dev-secret";

const ALGORITHM: &str = "HS256";
const TOKEN_TYPE: &str = "JWT";

/// Represents the claims encoded within a token.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject of the token: the account id.
    pub sub: String,
    /// Role of the account at issuance. Tokens minted without one are `User`.
    #[serde(default)]
    pub role: Role,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
}

impl Claims {
    /// Claims for `subject` issued now, expiring after `TOKEN_LIFETIME_SECS`.
    pub fn new(subject: impl Into<String>, role: Role) -> Self {
        Self::issued_at(subject, role, Utc::now())
    }

    pub fn issued_at(subject: impl Into<String>, role: Role, at: DateTime<Utc>) -> Self {
        let iat = at.timestamp();
        Self {
            sub: subject.into(),
            role,
            iat,
            exp: iat + TOKEN_LIFETIME_SECS,
        }
    }

    pub fn is_expired_at(&self, now: i64) -> bool {
        self.exp < now
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct TokenHeader {
    alg: String,
    typ: String,
}

impl TokenHeader {
    fn hs256() -> Self {
        Self {
            alg: ALGORITHM.to_string(),
            typ: TOKEN_TYPE.to_string(),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed token")]
    MalformedToken,
    #[error("invalid token signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("token encoding failed: {0}")]
    Encoding(String),
}

/// Issues and verifies tokens with a process-wide secret.
///
/// The secret is fixed for the lifetime of the codec. Replacing it invalidates
/// every token issued under the previous one.
#[derive(Clone)]
pub struct TokenCodec {
    secret: Vec<u8>,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl TokenCodec {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
        }
    }

    /// Serializes and signs `claims` exactly as given.
    pub fn issue(&self, claims: &Claims) -> Result<String, TokenError> {
        let header = encode_segment(&TokenHeader::hs256())?;
        let payload = encode_segment(claims)?;
        let signing_input = format!("{}.{}", header, payload);

        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{}.{}", signing_input, signature))
    }

    /// Decodes `token`, verifying its signature and expiry against the current time.
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        self.decode_at(token, Utc::now().timestamp())
    }

    /// Like `decode`, with an explicit "now" in seconds since epoch.
    ///
    /// Checks run in a fixed order: shape, header, payload, signature, expiry.
    /// The signature is always recomputed; an intact payload alone is never trusted.
    pub fn decode_at(&self, token: &str, now: i64) -> Result<Claims, TokenError> {
        let segments: Vec<&str> = token.split('.').collect();
        let [header, payload, signature] = segments.as_slice() else {
            return Err(TokenError::MalformedToken);
        };

        let header: TokenHeader = decode_segment(header)?;
        if header.alg != ALGORITHM {
            return Err(TokenError::MalformedToken);
        }
        let claims: Claims = decode_segment(payload)?;

        let signature_len = signature.len();
        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| TokenError::InvalidSignature)?;
        // Sign the received bytes, not a re-serialization of the parsed parts.
        let signing_input = &token[..token.len() - signature_len - 1];
        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| TokenError::InvalidSignature)?;

        if claims.is_expired_at(now) {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }

    fn mac(&self) -> Result<HmacSha256, TokenError> {
        HmacSha256::new_from_slice(&self.secret).map_err(|e| TokenError::Encoding(e.to_string()))
    }
}

fn encode_segment<T: Serialize>(value: &T) -> Result<String, TokenError> {
    let json = serde_json::to_vec(value).map_err(|e| TokenError::Encoding(e.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

fn decode_segment<T: for<'de> Deserialize<'de>>(segment: &str) -> Result<T, TokenError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| TokenError::MalformedToken)?;
    serde_json::from_slice(&bytes).map_err(|_| TokenError::MalformedToken)
}
