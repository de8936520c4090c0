//! Session token claims and verification shared by the auth and API services
//!
//! The auth service signs RS256 tokens with its private key; every other
//! service only needs the public key to check them.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TokenError;

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: Uuid,
    /// User email
    pub email: String,
    /// Display name, if the user gave one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
    /// Token type (access or refresh)
    pub token_type: TokenType,
    /// Unique token id; keeps tokens issued in the same second distinct
    pub jti: Uuid,
}

/// Token type enum
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    /// Access token
    Access,
    /// Refresh token
    Refresh,
}

/// Read PEM key material from an environment variable
///
/// The variable holds either the PEM text itself or a path to a PEM file.
/// Relative paths are tried from the working directory, then from the
/// crate root.
pub fn load_pem(var: &'static str) -> Result<String, TokenError> {
    let value = std::env::var(var).map_err(|_| TokenError::MissingVariable(var))?;

    if value.starts_with("-----BEGIN") {
        return Ok(value);
    }

    let pem = std::fs::read_to_string(&value)
        .or_else(|_| {
            let mut path = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
            path.push(&value);
            std::fs::read_to_string(path)
        })
        .map_err(|source| TokenError::KeyFile {
            path: value.clone(),
            source,
        })?;

    Ok(pem.trim().to_string())
}

/// Verifies RS256 tokens issued by the auth service
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    /// Build a verifier from a PEM-encoded RSA public key
    pub fn from_rsa_pem(public_key: &str) -> Result<Self, TokenError> {
        let decoding_key = DecodingKey::from_rsa_pem(public_key.as_bytes())?;
        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_exp = true;

        Ok(Self {
            decoding_key,
            validation,
        })
    }

    /// Build a verifier from `JWT_PUBLIC_KEY`
    pub fn from_env() -> Result<Self, TokenError> {
        Self::from_rsa_pem(&load_pem("JWT_PUBLIC_KEY")?)
    }

    /// Validate a token's signature and expiry and return its claims
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(data.claims)
    }

    /// Validate a token and require it to be of the given type
    pub fn verify_as(&self, token: &str, expected: TokenType) -> Result<Claims, TokenError> {
        let claims = self.verify(token)?;
        if claims.token_type != expected {
            return Err(TokenError::WrongType);
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serial_test::serial;
    use std::time::{SystemTime, UNIX_EPOCH};

    const PRIVATE_KEY: &str = include_str!("../fixtures/jwt_test_private.pem");
    const PUBLIC_KEY: &str = include_str!("../fixtures/jwt_test_public.pem");

    fn now() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs()
    }

    fn sign(claims: &Claims) -> String {
        let key = EncodingKey::from_rsa_pem(PRIVATE_KEY.as_bytes()).unwrap();
        encode(&Header::new(Algorithm::RS256), claims, &key).unwrap()
    }

    fn claims(token_type: TokenType, exp: u64) -> Claims {
        Claims {
            sub: Uuid::new_v4(),
            email: "ada@example.com".to_string(),
            name: Some("Ada".to_string()),
            iat: now(),
            exp,
            token_type,
            jti: Uuid::new_v4(),
        }
    }

    #[test]
    fn test_verify_accepts_valid_token() {
        let verifier = TokenVerifier::from_rsa_pem(PUBLIC_KEY).unwrap();
        let original = claims(TokenType::Access, now() + 600);

        let decoded = verifier.verify(&sign(&original)).unwrap();
        assert_eq!(decoded.sub, original.sub);
        assert_eq!(decoded.email, "ada@example.com");
        assert_eq!(decoded.token_type, TokenType::Access);
    }

    #[test]
    fn test_verify_rejects_expired_token() {
        let verifier = TokenVerifier::from_rsa_pem(PUBLIC_KEY).unwrap();
        let expired = claims(TokenType::Access, now() - 3600);

        assert!(matches!(
            verifier.verify(&sign(&expired)),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn test_verify_as_rejects_wrong_type() {
        let verifier = TokenVerifier::from_rsa_pem(PUBLIC_KEY).unwrap();
        let refresh = sign(&claims(TokenType::Refresh, now() + 600));

        assert!(matches!(
            verifier.verify_as(&refresh, TokenType::Access),
            Err(TokenError::WrongType)
        ));
        assert!(verifier.verify_as(&refresh, TokenType::Refresh).is_ok());
    }

    #[test]
    fn test_verify_rejects_garbage() {
        let verifier = TokenVerifier::from_rsa_pem(PUBLIC_KEY).unwrap();
        assert!(verifier.verify("not.a.token").is_err());
    }

    #[test]
    #[serial]
    fn test_load_pem_from_path_relative_to_crate() {
        unsafe {
            std::env::set_var("JWT_PUBLIC_KEY", "fixtures/jwt_test_public.pem");
        }

        let pem = load_pem("JWT_PUBLIC_KEY").unwrap();
        assert!(pem.starts_with("-----BEGIN PUBLIC KEY-----"));

        unsafe {
            std::env::remove_var("JWT_PUBLIC_KEY");
        }
    }

    #[test]
    #[serial]
    fn test_load_pem_missing_variable() {
        unsafe {
            std::env::remove_var("JWT_PUBLIC_KEY");
        }
        assert!(matches!(
            load_pem("JWT_PUBLIC_KEY"),
            Err(TokenError::MissingVariable("JWT_PUBLIC_KEY"))
        ));
    }
}
