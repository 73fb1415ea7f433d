//! Session tokens
//!
//! Uses HMAC-signed bearer tokens. No server-side session storage needed.
//! Issuing tokens belongs to the external identity provider; this module
//! exposes the signing half so that provider (and the tests) can mint
//! credentials this server accepts.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::identity::Role;

/// Decoded credential payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// User or monk id, depending on `role`
    pub identity_id: String,
    /// Role tag; decides which store the identity is loaded from
    pub role: Role,
    /// When session was created
    pub created_at: DateTime<Utc>,
    /// When session expires
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Create a session valid for `max_age_seconds` from now
    pub fn new(identity_id: impl Into<String>, role: Role, max_age_seconds: i64) -> Self {
        let now = Utc::now();
        Self {
            identity_id: identity_id.into(),
            role,
            created_at: now,
            expires_at: now + Duration::seconds(max_age_seconds),
        }
    }

    /// Check if session is expired
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}

/// Create a signed session token
///
/// Token format: base64(payload).base64(hmac_sha256(payload))
pub fn create_session_token(
    session: &Session,
    secret: &str,
) -> Result<String, crate::error::AppError> {
    use base64::{Engine as _, engine::general_purpose};
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    let payload =
        serde_json::to_string(session).map_err(|e| crate::error::AppError::Internal(e.into()))?;
    let payload_b64 = general_purpose::URL_SAFE_NO_PAD.encode(payload.as_bytes());

    type HmacSha256 = Hmac<Sha256>;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| crate::error::AppError::Encryption(e.to_string()))?;
    mac.update(payload_b64.as_bytes());
    let signature = mac.finalize().into_bytes();
    let signature_b64 = general_purpose::URL_SAFE_NO_PAD.encode(signature);

    Ok(format!("{}.{}", payload_b64, signature_b64))
}

/// Verify and decode a session token
///
/// # Errors
/// `Unauthorized` if the token is malformed, forged or expired
pub fn verify_session_token(token: &str, secret: &str) -> Result<Session, crate::error::AppError> {
    use crate::error::AppError;
    use base64::{Engine as _, engine::general_purpose};
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    let (payload_b64, signature_b64) = token.split_once('.').ok_or(AppError::Unauthorized)?;
    if signature_b64.contains('.') {
        return Err(AppError::Unauthorized);
    }

    type HmacSha256 = Hmac<Sha256>;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Encryption(e.to_string()))?;
    mac.update(payload_b64.as_bytes());

    let expected_signature = general_purpose::URL_SAFE_NO_PAD
        .decode(signature_b64)
        .map_err(|_| AppError::Unauthorized)?;

    mac.verify_slice(&expected_signature)
        .map_err(|_| AppError::Unauthorized)?;

    let payload_bytes = general_purpose::URL_SAFE_NO_PAD
        .decode(payload_b64)
        .map_err(|_| AppError::Unauthorized)?;

    let session: Session =
        serde_json::from_slice(&payload_bytes).map_err(|_| AppError::Unauthorized)?;

    if session.is_expired() {
        return Err(AppError::Unauthorized);
    }

    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn token_round_trip_preserves_role() {
        let session = Session::new("01HMONK", Role::Monk, 3600);
        let token = create_session_token(&session, SECRET).unwrap();

        let decoded = verify_session_token(&token, SECRET).unwrap();
        assert_eq!(decoded.identity_id, "01HMONK");
        assert_eq!(decoded.role, Role::Monk);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let session = Session::new("01HUSER", Role::User, 3600);
        let token = create_session_token(&session, SECRET).unwrap();

        let result = verify_session_token(&token, "another-secret-another-secret-xx");
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[test]
    fn expired_token_is_rejected() {
        let session = Session::new("01HUSER", Role::User, -10);
        let token = create_session_token(&session, SECRET).unwrap();

        assert!(matches!(
            verify_session_token(&token, SECRET),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn tampered_role_is_rejected() {
        use base64::{Engine as _, engine::general_purpose};

        let session = Session::new("01HUSER", Role::User, 3600);
        let token = create_session_token(&session, SECRET).unwrap();
        let (_, signature) = token.split_once('.').unwrap();

        let forged = Session::new("01HUSER", Role::Admin, 3600);
        let forged_payload = general_purpose::URL_SAFE_NO_PAD
            .encode(serde_json::to_string(&forged).unwrap().as_bytes());

        let result = verify_session_token(&format!("{forged_payload}.{signature}"), SECRET);
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[test]
    fn malformed_tokens_are_rejected() {
        for token in ["", "no-dot", "a.b.c", "!!!.???"] {
            assert!(verify_session_token(token, SECRET).is_err(), "{token}");
        }
    }
}
