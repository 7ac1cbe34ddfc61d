use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::{
    decode, decode_header,
    errors::ErrorKind,
    jwk::{Jwk, JwkSet},
    Algorithm, DecodingKey, Validation,
};
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::{Claims, TokenVerifier, VerifyError};
use crate::config::AuthConfig;

/// An unknown `kid` only triggers a refetch once the cached set is at least this old
const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

struct CachedKeys {
    set: JwkSet,
    fetched_at: Instant,
}

/// Verifies Firebase ID tokens (RS256) against Google's published signing keys
pub struct FirebaseVerifier {
    project_id: String,
    jwks_url: String,
    cache_ttl: Duration,
    http: reqwest::Client,
    keys: RwLock<Option<CachedKeys>>,
}

impl FirebaseVerifier {
    pub fn new(project_id: impl Into<String>, jwks_url: impl Into<String>, cache_ttl: Duration) -> Self {
        Self {
            project_id: project_id.into(),
            jwks_url: jwks_url.into(),
            cache_ttl,
            http: reqwest::Client::new(),
            keys: RwLock::new(None),
        }
    }

    /// None when no project is configured
    pub fn from_config(config: &AuthConfig) -> Option<Self> {
        let project_id = config.firebase_project_id.as_ref()?;
        info!("Firebase token verification enabled for project {}", project_id);
        Some(Self::new(
            project_id.clone(),
            config.jwks_url.clone(),
            Duration::from_secs(config.jwks_cache_secs),
        ))
    }

    fn issuer(&self) -> String {
        format!("https://securetoken.google.com/{}", self.project_id)
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.project_id]);
        validation.set_issuer(&[self.issuer()]);
        validation.set_required_spec_claims(&["exp", "sub", "aud", "iss"]);
        validation
    }

    /// Look up a signing key, refreshing the cached set when stale, or when the kid is
    /// unknown and the set is older than `MIN_REFRESH_INTERVAL`
    async fn key_for(&self, kid: &str) -> Result<Jwk, VerifyError> {
        // Fast path: fresh cache hit
        {
            let keys = self.keys.read().await;
            if let Some(cached) = keys.as_ref() {
                let age = cached.fetched_at.elapsed();
                if age < self.cache_ttl {
                    if let Some(jwk) = cached.set.find(kid) {
                        return Ok(jwk.clone());
                    }
                    if age < MIN_REFRESH_INTERVAL {
                        debug!("Unknown signing key {} within refresh interval, not refetching", kid);
                        return Err(VerifyError::Invalid(format!("unknown signing key {}", kid)));
                    }
                }
            }
        }

        let set = self.fetch_keys().await?;
        let jwk = set.find(kid).cloned();
        {
            let mut keys = self.keys.write().await;
            *keys = Some(CachedKeys {
                set,
                fetched_at: Instant::now(),
            });
        }

        jwk.ok_or_else(|| VerifyError::Invalid(format!("unknown signing key {}", kid)))
    }

    async fn fetch_keys(&self) -> Result<JwkSet, VerifyError> {
        debug!("Fetching signing keys from {}", self.jwks_url);
        let response = self
            .http
            .get(&self.jwks_url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| VerifyError::KeyFetch(e.to_string()))?;

        response
            .json::<JwkSet>()
            .await
            .map_err(|e| VerifyError::KeyFetch(e.to_string()))
    }
}

#[async_trait]
impl TokenVerifier for FirebaseVerifier {
    async fn verify(&self, token: &str) -> Result<Claims, VerifyError> {
        let header = decode_header(token).map_err(|e| VerifyError::Malformed(e.to_string()))?;
        if header.alg != Algorithm::RS256 {
            return Err(VerifyError::Invalid(format!("unexpected algorithm {:?}", header.alg)));
        }
        let kid = header
            .kid
            .ok_or_else(|| VerifyError::Malformed("missing key id".to_string()))?;

        let jwk = self.key_for(&kid).await?;
        let key = DecodingKey::from_jwk(&jwk).map_err(|e| VerifyError::KeyFetch(e.to_string()))?;

        let data = decode::<Claims>(token, &key, &self.validation()).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => VerifyError::Expired,
            _ => VerifyError::Invalid(e.to_string()),
        })?;

        if data.claims.sub.is_empty() {
            return Err(VerifyError::Invalid("empty subject".to_string()));
        }

        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verifier() -> FirebaseVerifier {
        // Unroutable URL: tests must fail before any key fetch
        FirebaseVerifier::new("smartsaver-test", "http://127.0.0.1:9/keys", Duration::from_secs(60))
    }

    #[tokio::test]
    async fn garbage_is_malformed() {
        let err = verifier().verify("not-a-jwt").await.unwrap_err();
        assert!(matches!(err, VerifyError::Malformed(_)));
    }

    #[tokio::test]
    async fn hmac_tokens_are_refused_before_key_lookup() {
        use jsonwebtoken::{encode, EncodingKey, Header};

        let claims = Claims {
            sub: "u1".into(),
            exp: chrono::Utc::now().timestamp() + 60,
            ..Default::default()
        };
        let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(b"secret")).unwrap();

        let err = verifier().verify(&token).await.unwrap_err();
        assert!(matches!(err, VerifyError::Invalid(_)));
    }

    #[tokio::test]
    async fn unknown_kid_does_not_refetch_fresh_keys() {
        let verifier = verifier();
        *verifier.keys.write().await = Some(CachedKeys {
            set: JwkSet { keys: Vec::new() },
            fetched_at: Instant::now(),
        });

        // A refetch would hit the unroutable URL and surface as KeyFetch
        let err = verifier.key_for("rotated-away").await.unwrap_err();
        assert!(matches!(err, VerifyError::Invalid(_)));
    }

    #[test]
    fn issuer_is_project_scoped() {
        assert_eq!(verifier().issuer(), "https://securetoken.google.com/smartsaver-test");
    }

    #[test]
    fn disabled_without_project() {
        let config = crate::config::AppConfig::from_lookup(|_| None);
        assert!(FirebaseVerifier::from_config(&config.auth).is_none());
    }
}
