use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod dev_token;
pub mod firebase;
pub mod guard;

pub use firebase::FirebaseVerifier;
pub use guard::Caller;

/// Email suffix carried by every synthesized (non-verified) identity
pub const DEV_EMAIL_SUFFIX: &str = "@example.com";

/// Claims of a caller identity. Verified tokens fill these from the ID token;
/// synthesized identities only set `sub` and a placeholder `email`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub picture: Option<String>,
    pub phone_number: Option<String>,
    #[serde(default)]
    pub exp: i64,
    #[serde(default)]
    pub iat: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentitySource {
    /// Token accepted by the configured verifier
    Verified,
    /// `dev_<id>` token
    DevToken,
    /// Raw token truncated into an id, local testing only
    Fallback,
}

/// Resolved caller identity
#[derive(Debug, Clone)]
pub struct Identity {
    pub subject_id: String,
    pub claims: Claims,
    pub source: IdentitySource,
}

impl Identity {
    pub fn verified(claims: Claims) -> Self {
        Self {
            subject_id: claims.sub.clone(),
            claims,
            source: IdentitySource::Verified,
        }
    }

    pub fn synthesized(subject_id: String, email: String, source: IdentitySource) -> Self {
        Self {
            claims: Claims {
                sub: subject_id.clone(),
                email: Some(email),
                ..Default::default()
            },
            subject_id,
            source,
        }
    }

    /// Synthesized identities are recognised by the placeholder email they carry.
    /// A verified token never counts, whatever its email.
    pub fn is_development(&self) -> bool {
        self.source != IdentitySource::Verified
            && self
                .claims
                .email
                .as_deref()
                .map_or(false, |email| email.ends_with(DEV_EMAIL_SUFFIX))
    }

    pub fn email(&self) -> String {
        self.claims
            .email
            .clone()
            .unwrap_or_else(|| format!("{}{}", self.subject_id, DEV_EMAIL_SUFFIX))
    }

    /// `name` claim, else the local part of the email
    pub fn display_name(&self) -> String {
        if let Some(name) = &self.claims.name {
            return name.clone();
        }
        let email = self.email();
        email.split('@').next().unwrap_or_default().to_string()
    }
}

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("token expired")]
    Expired,

    #[error("signing keys unavailable: {0}")]
    KeyFetch(String),

    #[error("invalid token: {0}")]
    Invalid(String),
}

/// Third-party identity verification
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<Claims, VerifyError>;
}

/// Which unverified credentials are honoured, and how far development identities reach
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthPolicy {
    pub allow_dev_tokens: bool,
    pub allow_any_token: bool,
    pub dev_read_bypass: bool,
}

impl AuthPolicy {
    /// Verified tokens only
    pub fn strict() -> Self {
        Self::default()
    }
}

/// Resolve a bearer credential into a caller identity.
///
/// Order: the configured verifier; then a `dev_<id>` token when allowed; then, only
/// when no verifier is configured, the truncation fallback when allowed.
pub async fn resolve_identity(
    token: &str,
    verifier: Option<&dyn TokenVerifier>,
    policy: &AuthPolicy,
) -> Result<Identity, crate::error::ApiError> {
    let verify_error = match verifier {
        Some(verifier) => match verifier.verify(token).await {
            Ok(claims) if !claims.sub.is_empty() => return Ok(Identity::verified(claims)),
            Ok(_) => Some(VerifyError::Invalid("empty subject".to_string())),
            Err(e) => Some(e),
        },
        None => None,
    };

    if policy.allow_dev_tokens {
        if let Some(identity) = dev_token::parse(token) {
            tracing::debug!("Accepted development token for {}", identity.subject_id);
            return Ok(identity);
        }
    }

    match verify_error {
        Some(e) => Err(e.into()),
        None if policy.allow_any_token => {
            let identity = dev_token::fallback(token);
            tracing::warn!("Unverified token accepted as {} (local testing fallback)", identity.subject_id);
            Ok(identity)
        }
        None => Err(crate::error::ApiError::unauthorized("Invalid token")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RejectAll;

    #[async_trait]
    impl TokenVerifier for RejectAll {
        async fn verify(&self, _token: &str) -> Result<Claims, VerifyError> {
            Err(VerifyError::Invalid("signature".into()))
        }
    }

    struct AcceptAs(&'static str);

    #[async_trait]
    impl TokenVerifier for AcceptAs {
        async fn verify(&self, _token: &str) -> Result<Claims, VerifyError> {
            Ok(Claims {
                sub: self.0.to_string(),
                email: Some("someone@example.com".into()),
                ..Default::default()
            })
        }
    }

    fn dev_policy() -> AuthPolicy {
        AuthPolicy {
            allow_dev_tokens: true,
            allow_any_token: true,
            dev_read_bypass: true,
        }
    }

    #[tokio::test]
    async fn verifier_wins_over_dev_pattern() {
        let identity = resolve_identity("dev_alice123", Some(&AcceptAs("uid-1")), &dev_policy())
            .await
            .unwrap();
        assert_eq!(identity.subject_id, "uid-1");
        assert_eq!(identity.source, IdentitySource::Verified);
        // verified identity with an example.com email is still not a development identity
        assert!(!identity.is_development());
    }

    #[tokio::test]
    async fn failed_verification_falls_back_to_dev_token() {
        let identity = resolve_identity("dev_alice123", Some(&RejectAll), &dev_policy())
            .await
            .unwrap();
        assert_eq!(identity.subject_id, "alice123");
        assert!(identity.is_development());
    }

    #[tokio::test]
    async fn failed_verification_never_uses_truncation_fallback() {
        let err = resolve_identity("some-opaque-token-value", Some(&RejectAll), &dev_policy())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 401);
    }

    #[tokio::test]
    async fn no_verifier_uses_truncation_fallback_when_allowed() {
        let identity = resolve_identity("abcdefghijklmnopqrstuvwxyz0123", None, &dev_policy())
            .await
            .unwrap();
        assert_eq!(identity.subject_id, "abcdefghijklmnopqrstuvwx");
        assert_eq!(identity.source, IdentitySource::Fallback);
    }

    #[tokio::test]
    async fn strict_policy_rejects_unverified_tokens() {
        let err = resolve_identity("dev_alice123", None, &AuthPolicy::strict())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 401);
    }

    #[test]
    fn display_name_defaults_to_email_local_part() {
        let identity = Identity::synthesized(
            "u1".into(),
            "u1@example.com".into(),
            IdentitySource::DevToken,
        );
        assert_eq!(identity.display_name(), "u1");
    }
}
