//! Reads the role claim out of the session token.
//!
//! The signature is not checked here; the backend verifies the token on every
//! request and answers 401 when it is invalid or expired.

use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::Deserialize;
use shared::domain::{Identity, Role};
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct SessionClaims {
    #[serde(rename = "userRol", default)]
    user_rol: Option<String>,
    #[serde(default)]
    sub: Option<String>,
}

fn claims_only_validation() -> Validation {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();
    validation
}

/// Decodes a stored token into an [`Identity`]. Never fails: a missing or
/// malformed token is an anonymous session.
pub fn decode_identity(token: Option<&str>) -> Identity {
    let Some(raw) = token.map(str::trim).filter(|t| !t.is_empty()) else {
        debug!("no session token, continuing as anonymous");
        return Identity::Anonymous;
    };
    let raw = raw.strip_prefix("Bearer ").unwrap_or(raw);

    match decode::<SessionClaims>(raw, &DecodingKey::from_secret(&[]), &claims_only_validation()) {
        Ok(data) => match data.claims.user_rol {
            Some(role) => Identity::user(data.claims.sub, Role::from_claim(&role)),
            None => {
                warn!("session token has no userRol claim, continuing as anonymous");
                Identity::Anonymous
            }
        },
        Err(err) => {
            warn!(error = %err, "session token could not be decoded, continuing as anonymous");
            Identity::Anonymous
        }
    }
}
