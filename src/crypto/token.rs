//! Signed session tokens (HS256 JWT).

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::session::{SessionPayload, Verified};

/// The claims actually signed: the payload plus the standard time claims.
#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    #[serde(flatten)]
    payload: SessionPayload,
    iat: i64,
    exp: i64,
}

/// Converts a [`SessionPayload`] to and from a tamper-evident token.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenCodec {
    /// Creates a codec signing with `secret`.
    ///
    /// An empty secret is a configuration error; the service must not start
    /// without one.
    pub fn new(secret: &[u8], ttl: Duration) -> Result<Self> {
        if secret.is_empty() {
            return Err(AppError::Configuration(
                "session signing secret is not configured".to_string(),
            ));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "iat"]);

        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        })
    }

    /// Lifetime of issued tokens.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Signs `payload`, stamping `iat` now and `exp` one TTL later.
    pub fn encode(&self, payload: &SessionPayload) -> Result<String> {
        self.encode_at(payload, Utc::now())
    }

    fn encode_at(&self, payload: &SessionPayload, issued_at: DateTime<Utc>) -> Result<String> {
        if payload.user_id.trim().is_empty() {
            return Err(AppError::Token("session payload has an empty user id".to_string()));
        }

        let expires_at = issued_at
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AppError::Token("session lifetime overflows the clock".to_string()))?;

        let claims = SessionClaims {
            payload: payload.clone(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Token(e.to_string()))
    }

    /// Verifies signature and expiry. Never fails: anything wrong with the
    /// token yields [`Verified::Invalid`].
    pub fn decode(&self, token: &str) -> Verified {
        self.decode_at(token, Utc::now())
    }

    fn decode_at(&self, token: &str, now: DateTime<Utc>) -> Verified {
        if token.is_empty() {
            return Verified::Invalid;
        }

        let claims = match jsonwebtoken::decode::<SessionClaims>(token, &self.decoding, &self.validation) {
            Ok(data) => data.claims,
            Err(e) => {
                tracing::debug!("Session token rejected: {}", e);
                return Verified::Invalid;
            }
        };

        let payload = claims.payload;

        if payload.user_id.trim().is_empty() {
            tracing::debug!("Session token rejected: empty user id");
            return Verified::Invalid;
        }

        if payload.is_expired_at(now) {
            tracing::debug!("Session token rejected: payload expired for user {}", payload.user_id);
            return Verified::Invalid;
        }

        Verified::Valid(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::Role;
    use serde_json::json;

    const SECRET: &[u8] = b"unit-test-secret";

    fn codec() -> TokenCodec {
        TokenCodec::new(SECRET, Duration::days(7)).unwrap()
    }

    fn payload(expires_at: DateTime<Utc>) -> SessionPayload {
        SessionPayload {
            user_id: "c0ffee00-0000-4000-8000-000000000001".to_string(),
            role: Role::Admin,
            email: "ada@example.com".to_string(),
            display_name: "Ada Lovelace".to_string(),
            expires_at,
        }
    }

    fn sign_raw(claims: serde_json::Value, alg: Algorithm) -> String {
        jsonwebtoken::encode(&Header::new(alg), &claims, &EncodingKey::from_secret(SECRET)).unwrap()
    }

    #[test]
    fn empty_secret_is_a_configuration_error() {
        let err = TokenCodec::new(b"", Duration::days(7)).err().unwrap();
        assert!(matches!(err, AppError::Configuration(_)));
    }

    #[test]
    fn round_trip_preserves_payload() {
        let codec = codec();
        let original = payload(Utc::now() + Duration::days(7));
        let token = codec.encode(&original).unwrap();
        assert_eq!(codec.decode(&token), Verified::Valid(original));
    }

    #[test]
    fn past_expiry_fails_even_with_valid_signature() {
        let codec = codec();
        let token = codec.encode(&payload(Utc::now() - Duration::seconds(1))).unwrap();
        assert_eq!(codec.decode(&token), Verified::Invalid);
    }

    #[test]
    fn payload_is_invalid_at_its_expiry_instant() {
        let codec = codec();
        let issued = Utc::now();
        let expires = issued + Duration::hours(1);
        let token = codec.encode_at(&payload(expires), issued).unwrap();
        assert!(codec.decode_at(&token, expires - Duration::seconds(1)).is_valid());
        assert_eq!(codec.decode_at(&token, expires), Verified::Invalid);
    }

    #[test]
    fn expired_exp_claim_fails() {
        let codec = codec();
        let issued = Utc::now() - Duration::days(8);
        let token = codec
            .encode_at(&payload(Utc::now() + Duration::days(1)), issued)
            .unwrap();
        assert_eq!(codec.decode(&token), Verified::Invalid);
    }

    #[test]
    fn any_flipped_byte_is_rejected() {
        let codec = codec();
        let token = codec.encode(&payload(Utc::now() + Duration::days(7))).unwrap();
        let bytes = token.as_bytes();

        for i in 0..bytes.len() {
            let mut tampered = bytes.to_vec();
            tampered[i] ^= 0x01;
            let tampered = String::from_utf8(tampered).unwrap();
            assert_eq!(
                codec.decode(&tampered),
                Verified::Invalid,
                "byte {} flipped but token still verified",
                i
            );
        }
    }

    #[test]
    fn empty_and_garbage_input_are_invalid() {
        let codec = codec();
        assert_eq!(codec.decode(""), Verified::Invalid);
        assert_eq!(codec.decode("not-a-token"), Verified::Invalid);
        assert_eq!(codec.decode("a.b.c"), Verified::Invalid);
    }

    #[test]
    fn other_secret_is_rejected() {
        let token = codec().encode(&payload(Utc::now() + Duration::days(1))).unwrap();
        let other = TokenCodec::new(b"another-secret", Duration::days(7)).unwrap();
        assert_eq!(other.decode(&token), Verified::Invalid);
    }

    #[test]
    fn only_hs256_is_accepted() {
        let now = Utc::now();
        let token = sign_raw(
            json!({
                "userId": "u1",
                "role": "user",
                "email": "u1@example.com",
                "name": "U One",
                "expiresAt": (now + Duration::days(1)).to_rfc3339(),
                "iat": now.timestamp(),
                "exp": (now + Duration::days(1)).timestamp(),
            }),
            Algorithm::HS512,
        );
        assert_eq!(codec().decode(&token), Verified::Invalid);
    }

    #[test]
    fn missing_role_defaults_to_user() {
        let now = Utc::now();
        let token = sign_raw(
            json!({
                "userId": "u1",
                "email": "u1@example.com",
                "name": "U One",
                "expiresAt": (now + Duration::days(1)).to_rfc3339(),
                "iat": now.timestamp(),
                "exp": (now + Duration::days(1)).timestamp(),
            }),
            Algorithm::HS256,
        );
        let payload = codec().decode(&token).into_payload().unwrap();
        assert_eq!(payload.role, Role::User);
        assert_eq!(payload.user_id, "u1");
    }

    #[test]
    fn missing_fields_or_empty_user_id_are_invalid() {
        let now = Utc::now();
        let exp = (now + Duration::days(1)).timestamp();

        let no_email = sign_raw(
            json!({
                "userId": "u1",
                "name": "U One",
                "expiresAt": (now + Duration::days(1)).to_rfc3339(),
                "iat": now.timestamp(),
                "exp": exp,
            }),
            Algorithm::HS256,
        );
        assert_eq!(codec().decode(&no_email), Verified::Invalid);

        let empty_id = sign_raw(
            json!({
                "userId": "",
                "email": "u1@example.com",
                "name": "U One",
                "expiresAt": (now + Duration::days(1)).to_rfc3339(),
                "iat": now.timestamp(),
                "exp": exp,
            }),
            Algorithm::HS256,
        );
        assert_eq!(codec().decode(&empty_id), Verified::Invalid);
    }

    #[test]
    fn overflowing_lifetime_fails_to_encode() {
        let codec = TokenCodec::new(SECRET, Duration::MAX).unwrap();
        let err = codec
            .encode(&payload(Utc::now() + Duration::days(1)))
            .unwrap_err();
        assert!(matches!(err, AppError::Token(_)));
    }

    #[test]
    fn encoding_an_empty_user_id_fails() {
        let mut p = payload(Utc::now() + Duration::days(1));
        p.user_id = String::new();
        assert!(matches!(codec().encode(&p), Err(AppError::Token(_))));
    }
}
