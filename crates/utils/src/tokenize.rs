//! Signed payload transport ("tokenized" arguments).
//!
//! A payload is a JSON object signed with a process-wide shared secret and
//! sent as a single string argument. The envelope is a compact HS256 JWS
//! carrying the payload fields as claims plus an `iat` issued-at claim.
//!
//! There is no expiry, nonce or key rotation: an envelope stays valid for as
//! long as the secret does, so a captured envelope can be replayed.

use std::{collections::HashSet, sync::Arc};

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind};
use secrecy::{ExposeSecret, SecretString};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use thiserror::Error;

/// Claim added by [`encode`] holding the issue time in seconds since the epoch.
pub const ISSUED_AT_CLAIM: &str = "iat";

/// Largest integer a JavaScript producer or consumer can represent exactly.
const MAX_SAFE_INTEGER: i64 = 9_007_199_254_740_991;

pub type Payload = Map<String, Value>;

#[derive(Debug, Error)]
pub enum TokenizeError {
    #[error("payload cannot be tokenized: {0}")]
    Serialization(String),
    #[error("invalid signature")]
    InvalidSignature,
    #[error("malformed tokenized payload: {0}")]
    Malformed(String),
}

impl From<jsonwebtoken::errors::Error> for TokenizeError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            _ => Self::Malformed(err.to_string()),
        }
    }
}

/// Sign `payload` with `secret`. The payload must serialize to a JSON object.
/// An `iat` already present in the payload is kept as is.
pub fn encode<T>(payload: &T, secret: &[u8]) -> Result<String, TokenizeError>
where
    T: Serialize + ?Sized,
{
    let mut claims = match serde_json::to_value(payload) {
        Ok(Value::Object(map)) => map,
        Ok(other) => {
            return Err(TokenizeError::Serialization(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            )));
        }
        Err(e) => return Err(TokenizeError::Serialization(e.to_string())),
    };

    for (field, value) in &claims {
        ensure_safe_integers(field, value)?;
    }

    claims
        .entry(ISSUED_AT_CLAIM)
        .or_insert_with(|| Value::from(Utc::now().timestamp()));

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|e| TokenizeError::Serialization(e.to_string()))
}

/// Verify `envelope` against `secret` and return its claims, `iat` included.
pub fn decode(envelope: &str, secret: &[u8]) -> Result<Payload, TokenizeError> {
    let data = jsonwebtoken::decode::<Payload>(
        envelope.trim(),
        &DecodingKey::from_secret(secret),
        &validation(),
    )?;
    Ok(data.claims)
}

fn validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.required_spec_claims = HashSet::new();
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation
}

fn ensure_safe_integers(path: &str, value: &Value) -> Result<(), TokenizeError> {
    match value {
        Value::Number(n) => {
            let safe = match n.as_i64() {
                Some(i) => (-MAX_SAFE_INTEGER..=MAX_SAFE_INTEGER).contains(&i),
                // u64 beyond i64::MAX, or a float
                None => n.is_f64(),
            };
            if safe {
                Ok(())
            } else {
                Err(TokenizeError::Serialization(format!(
                    "integer at `{path}` exceeds the safe integer range, send it as a string"
                )))
            }
        }
        Value::Array(items) => items
            .iter()
            .enumerate()
            .try_for_each(|(i, item)| ensure_safe_integers(&format!("{path}[{i}]"), item)),
        Value::Object(map) => map
            .iter()
            .try_for_each(|(k, v)| ensure_safe_integers(&format!("{path}.{k}"), v)),
        _ => Ok(()),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Codec bound to the process-wide secret, shared by every handler.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    secret: Arc<SecretString>,
}

impl Tokenizer {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: Arc::new(SecretString::from(secret.into())),
        }
    }

    pub fn sign<T>(&self, payload: &T) -> Result<String, TokenizeError>
    where
        T: Serialize + ?Sized,
    {
        encode(payload, self.secret.expose_secret().as_bytes())
    }

    pub fn verify(&self, envelope: &str) -> Result<Payload, TokenizeError> {
        decode(envelope, self.secret.expose_secret().as_bytes())
    }

    /// Verify and deserialize into `T`. The `iat` claim is removed first.
    pub fn verify_as<T>(&self, envelope: &str) -> Result<T, TokenizeError>
    where
        T: DeserializeOwned,
    {
        let mut payload = self.verify(envelope)?;
        payload.remove(ISSUED_AT_CLAIM);
        serde_json::from_value(Value::Object(payload))
            .map_err(|e| TokenizeError::Malformed(e.to_string()))
    }
}
