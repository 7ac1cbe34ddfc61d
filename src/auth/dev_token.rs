// Development credentials. Never honoured unless the auth policy allows them.

use uuid::Uuid;

use super::{Identity, IdentitySource, DEV_EMAIL_SUFFIX};

pub const DEV_TOKEN_PREFIX: &str = "dev_";

/// Tokens at or below this length are not development tokens
const DEV_TOKEN_MIN_LEN: usize = 10;

const FALLBACK_SUBJECT_LEN: usize = 24;
const FALLBACK_EMAIL_LEN: usize = 8;

/// Parse `dev_<id>` into a development identity with a placeholder email
pub fn parse(token: &str) -> Option<Identity> {
    if token.len() <= DEV_TOKEN_MIN_LEN {
        return None;
    }
    let subject_id = token.strip_prefix(DEV_TOKEN_PREFIX)?;
    if subject_id.trim().is_empty() {
        return None;
    }

    Some(Identity::synthesized(
        subject_id.to_string(),
        format!("{}{}", subject_id, DEV_EMAIL_SUFFIX),
        IdentitySource::DevToken,
    ))
}

/// Truncate an arbitrary credential into an identity
pub fn fallback(token: &str) -> Identity {
    let subject_id: String = token.chars().take(FALLBACK_SUBJECT_LEN).collect();
    let short: String = token.chars().take(FALLBACK_EMAIL_LEN).collect();

    Identity::synthesized(
        subject_id,
        format!("user_{}{}", short, DEV_EMAIL_SUFFIX),
        IdentitySource::Fallback,
    )
}

/// Build a development token, inventing a `test_xxxxxxxx` id when none is given
pub fn generate(user_id: Option<&str>) -> (String, String) {
    let user_id = match user_id {
        Some(id) => id.to_string(),
        None => {
            let random = Uuid::new_v4().simple().to_string();
            format!("test_{}", &random[..8])
        }
    };
    (format!("{}{}", DEV_TOKEN_PREFIX, user_id), user_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_embedded_identifier() {
        let identity = parse("dev_test_1234abcd").unwrap();
        assert_eq!(identity.subject_id, "test_1234abcd");
        assert_eq!(identity.claims.email.as_deref(), Some("test_1234abcd@example.com"));
        assert_eq!(identity.source, IdentitySource::DevToken);
    }

    #[test]
    fn short_or_unprefixed_tokens_are_rejected() {
        assert!(parse("dev_abc").is_none());
        assert!(parse("dev_123456").is_none());
        assert!(parse("prod_1234567890").is_none());
        assert!(parse("dev_          ").is_none());
    }

    #[test]
    fn fallback_truncates() {
        let identity = fallback("eyJhbGciOiJSUzI1NiIsImtpZCI6IjEifQ.payload");
        assert_eq!(identity.subject_id.len(), 24);
        assert_eq!(identity.claims.email.as_deref(), Some("user_eyJhbGci@example.com"));
        assert!(identity.is_development());
    }

    #[test]
    fn generated_tokens_round_trip() {
        let (token, user_id) = generate(None);
        assert!(user_id.starts_with("test_"));
        assert_eq!(parse(&token).unwrap().subject_id, user_id);

        let (token, user_id) = generate(Some("u1"));
        assert_eq!(token, "dev_u1");
        assert_eq!(user_id, "u1");
    }
}
