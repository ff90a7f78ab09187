use crate::error::RollcallError;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// User id the token was issued for.
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

/// Issues and verifies signed bearer tokens (HS256).
///
/// A TTL of zero issues tokens without an expiry claim and disables
/// expiry checking on verification.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl_hours: u64,
}

impl TokenService {
    pub fn new(secret: &str, ttl_hours: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        if ttl_hours == 0 {
            validation.validate_exp = false;
            validation.required_spec_claims.clear();
        }
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl_hours,
        }
    }

    pub fn issue(&self, user_id: i64) -> Result<String, RollcallError> {
        let exp = (self.ttl_hours > 0)
            .then(|| (Utc::now() + Duration::hours(self.ttl_hours as i64)).timestamp());
        let claims = TokenClaims { id: user_id, exp };
        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }

    /// Returns the claims when the signature (and expiry, if checked)
    /// hold; `None` for anything else.
    pub fn verify(&self, token: &str) -> Option<TokenClaims> {
        decode::<TokenClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .ok()
    }
}
