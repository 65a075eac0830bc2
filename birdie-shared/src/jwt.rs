use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::{self, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Claims carried by identity-provider ID tokens.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdTokenClaims {
    pub sub: String,
    pub email: String,
    pub iss: String,
    pub aud: Audience,
    pub exp: i64,
    #[serde(default)]
    pub iat: i64,
}

/// `aud` claim. Providers send either a single string or a list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Audience {
    One(String),
    Many(Vec<String>),
}

impl From<&str> for Audience {
    fn from(value: &str) -> Self {
        Audience::One(value.to_string())
    }
}

impl From<String> for Audience {
    fn from(value: String) -> Self {
        Audience::One(value)
    }
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("invalid token: {0}")]
    Decode(String),
    #[error("invalid key: {0}")]
    Key(String),
    #[error("encoding failed: {0}")]
    Encode(String),
}

/// How ID tokens are checked: signature key plus expected issuer/audience.
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn hs256(secret: &[u8], issuer: &str, audience: &str) -> Self {
        Self::with_key(DecodingKey::from_secret(secret), Algorithm::HS256, issuer, audience)
    }

    pub fn rs256_pem(pem: &[u8], issuer: &str, audience: &str) -> Result<Self, JwtError> {
        let key = DecodingKey::from_rsa_pem(pem).map_err(|e| JwtError::Key(e.to_string()))?;
        Ok(Self::with_key(key, Algorithm::RS256, issuer, audience))
    }

    fn with_key(key: DecodingKey, alg: Algorithm, issuer: &str, audience: &str) -> Self {
        let mut validation = Validation::new(alg);
        validation.set_issuer(&[issuer]);
        validation.set_audience(&[audience]);
        Self { key, validation }
    }

    pub fn verify(&self, token: &str) -> Result<IdTokenClaims, JwtError> {
        jsonwebtoken::decode::<IdTokenClaims>(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| JwtError::Decode(e.to_string()))
    }
}

/// Reads the payload without checking the signature. Only for diagnostics.
pub fn decode_unverified(token: &str) -> Result<IdTokenClaims, JwtError> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() < 2 {
        return Err(JwtError::Decode("invalid JWT format".into()));
    }
    let payload_bytes = URL_SAFE_NO_PAD
        .decode(parts[1])
        .map_err(|e| JwtError::Decode(format!("invalid base64 payload: {e}")))?;
    serde_json::from_slice::<IdTokenClaims>(&payload_bytes)
        .map_err(|e| JwtError::Decode(format!("invalid json payload: {e}")))
}

/// Signs claims with a shared HS256 secret.
pub fn encode(claims: &IdTokenClaims, secret: &[u8]) -> Result<String, JwtError> {
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|e| JwtError::Encode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-secret";
    const ISS: &str = "https://issuer.example";
    const AUD: &str = "birdie";

    fn claims(exp_offset: i64) -> IdTokenClaims {
        let now = chrono::Utc::now().timestamp();
        IdTokenClaims {
            sub: "uid-1".into(),
            email: "teacher@example.com".into(),
            iss: ISS.into(),
            aud: AUD.into(),
            exp: now + exp_offset,
            iat: now,
        }
    }

    #[test]
    fn verifies_own_tokens() {
        let c = claims(3600);
        let token = encode(&c, SECRET).unwrap();
        let verifier = TokenVerifier::hs256(SECRET, ISS, AUD);
        assert_eq!(verifier.verify(&token).unwrap(), c);
        assert_eq!(decode_unverified(&token).unwrap().email, c.email);
    }

    #[test]
    fn rejects_wrong_secret_audience_or_expiry() {
        let token = encode(&claims(3600), SECRET).unwrap();
        assert!(TokenVerifier::hs256(b"other", ISS, AUD).verify(&token).is_err());
        assert!(TokenVerifier::hs256(SECRET, ISS, "someone-else").verify(&token).is_err());
        assert!(TokenVerifier::hs256(SECRET, "https://evil", AUD).verify(&token).is_err());

        let expired = encode(&claims(-3600), SECRET).unwrap();
        assert!(TokenVerifier::hs256(SECRET, ISS, AUD).verify(&expired).is_err());
    }

    #[test]
    fn accepts_list_audience_containing_ours() {
        let mut c = claims(3600);
        c.aud = Audience::Many(vec![AUD.into(), "https://issuer.example/userinfo".into()]);
        let token = encode(&c, SECRET).unwrap();
        let verified = TokenVerifier::hs256(SECRET, ISS, AUD).verify(&token).unwrap();
        assert_eq!(verified.aud, c.aud);

        c.aud = Audience::Many(vec!["other".into(), "another".into()]);
        let token = encode(&c, SECRET).unwrap();
        assert!(TokenVerifier::hs256(SECRET, ISS, AUD).verify(&token).is_err());
    }

    #[test]
    fn rejects_garbage() {
        assert!(decode_unverified("nope").is_err());
        assert!(TokenVerifier::hs256(SECRET, ISS, AUD).verify("a.b.c").is_err());
    }
}
