use axum::async_trait;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;

use crate::config::JwtConfig;

/// Audience claim that separates account-activation tokens from the identity
/// provider's bearer tokens.
const ACTIVATION_AUDIENCE: &str = "mentorhub-activation";

/// The external identity provider as the rest of the service sees it:
/// a bearer credential in, a stable provider subject out.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> anyhow::Result<String>;
}

#[derive(Debug, Serialize, Deserialize)]
struct BearerClaims {
    sub: String,
    exp: usize,
    iat: usize,
    iss: String,
    aud: String,
}

/// HS256 verifier configured from `JwtConfig`.
pub struct JwtVerifier {
    decoding: DecodingKey,
    issuer: String,
    audience: String,
}

impl JwtVerifier {
    pub fn new(cfg: &JwtConfig) -> Self {
        Self {
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
        }
    }
}

#[async_trait]
impl TokenVerifier for JwtVerifier {
    async fn verify(&self, token: &str) -> anyhow::Result<String> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<BearerClaims>(token, &self.decoding, &validation)?;
        debug!(subject = %data.claims.sub, "bearer token verified");
        Ok(data.claims.sub)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ActivationClaims {
    sub: String,
    exp: usize,
    aud: String,
}

/// Signs and checks the short-lived tokens mailed out on signup. The token
/// carries the email so activation needs no extra state.
pub struct ActivationKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: TimeDuration,
}

impl ActivationKeys {
    pub fn from_config(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            ttl: TimeDuration::minutes(cfg.activation_ttl_minutes),
        }
    }

    pub fn sign(&self, email: &str) -> anyhow::Result<String> {
        let exp = OffsetDateTime::now_utc() + self.ttl;
        let claims = ActivationClaims {
            sub: email.to_string(),
            exp: exp.unix_timestamp() as usize,
            aud: ACTIVATION_AUDIENCE.to_string(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        Ok(token)
    }

    /// Returns the email the token was issued for.
    pub fn verify(&self, token: &str) -> anyhow::Result<String> {
        let mut validation = Validation::default();
        validation.set_audience(&[ACTIVATION_AUDIENCE]);
        let data = decode::<ActivationClaims>(token, &self.decoding, &validation)?;
        Ok(data.claims.sub)
    }
}
