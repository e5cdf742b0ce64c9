use agrimove_core::{Error, IssuedToken, Result, TokenClaims};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Duration, Utc};
use ring::hmac;
use ring::rand::{SecureRandom, SystemRandom};
use serde::Deserialize;

const TOKEN_ALGORITHM: &str = "HS256";
const TOKEN_HEADER: &str = r#"{"alg":"HS256","typ":"JWT"}"#;
const SECRET_BYTES: usize = 32;
pub const DEFAULT_TTL_MINUTES: i64 = 30;

#[derive(Deserialize)]
struct TokenHeader {
    alg: String,
}

/// Issues and checks stateless HS256 access tokens.
///
/// Tokens are compact `header.claims.signature` strings, each segment
/// base64url without padding. The HMAC covers the first two segments.
pub struct TokenManager {
    key: hmac::Key,
    default_ttl: Duration,
}

impl TokenManager {
    pub fn new(secret: &[u8]) -> Self {
        let key = hmac::Key::new(hmac::HMAC_SHA256, secret);
        Self {
            key,
            default_ttl: Duration::minutes(DEFAULT_TTL_MINUTES),
        }
    }

    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn generate_secret() -> Result<Vec<u8>> {
        let rng = SystemRandom::new();
        let mut secret = vec![0u8; SECRET_BYTES];
        rng.fill(&mut secret)
            .map_err(|_| Error::Internal("rng failed".into()))?;
        Ok(secret)
    }

    /// Mints a token for `subject`. `ttl` overrides the default lifetime.
    pub fn issue(&self, subject: &str, ttl: Option<Duration>) -> Result<IssuedToken> {
        self.issue_at(subject, ttl, Utc::now())
    }

    pub fn issue_at(
        &self,
        subject: &str,
        ttl: Option<Duration>,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken> {
        let ttl = ttl.unwrap_or(self.default_ttl);
        if ttl < Duration::seconds(1) {
            return Err(Error::Config("token ttl must be at least one second".into()));
        }
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or_else(|| Error::Config("token ttl out of range".into()))?;
        let claims = TokenClaims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        let header = URL_SAFE_NO_PAD.encode(TOKEN_HEADER);
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?);
        let signing_input = format!("{}.{}", header, payload);
        let signature = hmac::sign(&self.key, signing_input.as_bytes());
        let token = format!(
            "{}.{}",
            signing_input,
            URL_SAFE_NO_PAD.encode(signature.as_ref())
        );
        Ok(IssuedToken { token, claims })
    }

    /// Checks structure, signature and expiry, in that order.
    pub fn decode(&self, token: &str) -> Result<TokenClaims> {
        self.decode_at(token, Utc::now())
    }

    pub fn decode_at(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims> {
        let parsed = ParsedToken::parse(token).ok_or(Error::MalformedToken)?;
        // Undecodable signature segments count as bad signatures.
        let signature = URL_SAFE_NO_PAD
            .decode(parsed.signature)
            .map_err(|_| Error::InvalidSignature)?;
        hmac::verify(&self.key, parsed.signing_input.as_bytes(), &signature)
            .map_err(|_| Error::InvalidSignature)?;
        if parsed.claims.is_expired_at(now) {
            return Err(Error::TokenExpired);
        }
        Ok(parsed.claims)
    }
}

struct ParsedToken<'a> {
    signing_input: &'a str,
    claims: TokenClaims,
    signature: &'a str,
}

impl<'a> ParsedToken<'a> {
    fn parse(token: &'a str) -> Option<Self> {
        let (signing_input, signature) = token.rsplit_once('.')?;
        let (header, payload) = signing_input.split_once('.')?;
        if payload.contains('.') {
            return None;
        }
        let header: TokenHeader = decode_json(header)?;
        if header.alg != TOKEN_ALGORITHM {
            return None;
        }
        let claims: TokenClaims = decode_json(payload)?;
        Some(Self {
            signing_input,
            claims,
            signature,
        })
    }
}

fn decode_json<T: for<'de> Deserialize<'de>>(segment: &str) -> Option<T> {
    let bytes = URL_SAFE_NO_PAD.decode(segment).ok()?;
    serde_json::from_slice(&bytes).ok()
}
