use anyhow::{anyhow, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
}

/// Encode a session JWT for `subject`.
///
/// Returns (token_string, expires_at_rfc3339). Expiry is always
/// `iat + lifetime_minutes`.
pub fn encode_session(secret: &str, subject: &str, lifetime_minutes: i64) -> Result<(String, String)> {
    let now = Utc::now();
    let exp = now + Duration::minutes(lifetime_minutes);

    let claims = Claims {
        sub: subject.to_string(),
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| anyhow!("encode_session: {}", e))?;

    Ok((token, exp.to_rfc3339()))
}

/// Decode and validate a session JWT.
///
/// Fails on a bad signature, malformed structure, or past expiry. Malformed
/// input is an expected adversarial case — it is an `Err`, never a panic.
pub fn decode_session(token: &str, secret: &str) -> Result<Claims> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| anyhow!("decode_session: {}", e))?;

    Ok(data.claims)
}
