//! HS256 signing and signature verification for codes and tokens.
//!
//! Shared-secret signing; there is no key rotation and no revocation. Time
//! checks are left to callers so they run against an explicit `now`.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SignError {
    #[error("failed to sign token: {0}")]
    Encode(#[from] jsonwebtoken::errors::Error),

    #[error("refusing to sign with an empty secret")]
    EmptySecret,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VerifyError {
    #[error("malformed or tampered token: {0}")]
    Malformed(String),

    #[error("token has expired")]
    Expired,

    #[error("token is not a {expected} token")]
    WrongUse { expected: &'static str },

    #[error("token audience mismatch")]
    Audience,
}

#[derive(Clone)]
pub struct TokenSigner {
    secret_empty: bool,
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenSigner {
    pub fn hs256(secret: impl AsRef<[u8]>) -> Self {
        let secret = secret.as_ref();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        Self {
            secret_empty: secret.is_empty(),
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }

    pub fn algorithm(&self) -> &'static str {
        "HS256"
    }

    pub fn sign<T: Serialize>(&self, claims: &T) -> Result<String, SignError> {
        if self.secret_empty {
            return Err(SignError::EmptySecret);
        }
        Ok(jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding)?)
    }

    /// Signature and shape only.
    pub fn verify<T: DeserializeOwned>(&self, token: &str) -> Result<T, VerifyError> {
        jsonwebtoken::decode::<T>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| VerifyError::Malformed(e.to_string()))
    }
}

impl core::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenSigner").field("algorithm", &self.algorithm()).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Payload {
        sub: String,
    }

    #[test]
    fn signature_from_another_secret_is_rejected() {
        let token = TokenSigner::hs256("one").sign(&Payload { sub: "1".into() }).unwrap();

        assert_eq!(TokenSigner::hs256("one").verify::<Payload>(&token).unwrap().sub, "1");
        assert!(matches!(
            TokenSigner::hs256("two").verify::<Payload>(&token),
            Err(VerifyError::Malformed(_))
        ));
    }

    #[test]
    fn empty_secret_cannot_sign() {
        let err = TokenSigner::hs256("").sign(&Payload { sub: "1".into() }).unwrap_err();
        assert!(matches!(err, SignError::EmptySecret));
    }
}
