/// Identity token issuing and verification
///
/// Tokens are HS256-signed JWTs that bind a user id to an expiry. They carry
/// no role: the role is re-read from the store on every request, so a role
/// downgrade takes effect immediately even for tokens issued before it.
/// Nothing about a token is persisted server-side.
///
/// # Example
///
/// ```
/// use teamtask_shared::auth::jwt::TokenIssuer;
/// use chrono::Duration;
/// use uuid::Uuid;
///
/// let issuer = TokenIssuer::new("a-secret-of-at-least-thirty-two-bytes!!", Duration::days(30));
/// let user_id = Uuid::new_v4();
///
/// let token = issuer.issue(user_id).unwrap();
/// assert_eq!(issuer.verify(&token), Some(user_id));
/// assert_eq!(issuer.verify("not-a-token"), None);
/// ```

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Token issuer name written to and required in `iss`
pub const ISSUER: &str = "teamtask";

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Signature, format or claims check failed
    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Lifetime setting could not be parsed
    #[error("Invalid token lifetime '{0}': expected e.g. 3600, 90m, 12h or 30d")]
    InvalidLifetime(String),
}

/// JWT claims
///
/// - `sub`: user id
/// - `iss`: always [`ISSUER`]
/// - `iat` / `nbf` / `exp`: Unix timestamps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    pub nbf: i64,
}

impl Claims {
    /// Creates claims for `user_id` expiring after `lifetime`
    pub fn new(user_id: Uuid, lifetime: Duration) -> Self {
        let now = Utc::now();
        let expiration = now
            .checked_add_signed(lifetime)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        Self {
            sub: user_id,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            nbf: now.timestamp(),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Signs claims with HS256
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Validates signature, issuer, `exp` and `nbf`, and returns the claims
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;
    validation.validate_nbf = true;
    validation.leeway = 0;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
    })?;

    Ok(token_data.claims)
}

/// Parses a lifetime such as `3600`, `45s`, `90m`, `12h` or `30d`
pub fn parse_lifetime(value: &str) -> Result<Duration, JwtError> {
    let value = value.trim();
    let invalid = || JwtError::InvalidLifetime(value.to_string());

    let (digits, unit) = match value.char_indices().last() {
        Some((idx, c)) if c.is_ascii_alphabetic() => (&value[..idx], Some(c)),
        Some(_) => (value, None),
        None => return Err(invalid()),
    };

    let amount: i64 = digits.parse().map_err(|_| invalid())?;
    if amount <= 0 {
        return Err(invalid());
    }

    let lifetime = match unit {
        None | Some('s') => Duration::try_seconds(amount),
        Some('m') => Duration::try_minutes(amount),
        Some('h') => Duration::try_hours(amount),
        Some('d') => Duration::try_days(amount),
        Some(_) => None,
    };

    lifetime.ok_or_else(invalid)
}

/// Issues and verifies identity tokens with one secret and lifetime
#[derive(Clone)]
pub struct TokenIssuer {
    secret: String,
    lifetime: Duration,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("secret", &"<redacted>")
            .field("lifetime", &self.lifetime)
            .finish()
    }
}

impl TokenIssuer {
    pub fn new(secret: impl Into<String>, lifetime: Duration) -> Self {
        Self {
            secret: secret.into(),
            lifetime,
        }
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Produces a signed token for `user_id`
    pub fn issue(&self, user_id: Uuid) -> Result<String, JwtError> {
        create_token(&Claims::new(user_id, self.lifetime), &self.secret)
    }

    /// Returns the embedded user id, or `None` for any malformed, expired or
    /// badly signed token
    pub fn verify(&self, token: &str) -> Option<Uuid> {
        match validate_token(token, &self.secret) {
            Ok(claims) => Some(claims.sub),
            Err(e) => {
                tracing::debug!(error = %e, "Token verification failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    #[test]
    fn test_claims_creation() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, Duration::hours(1));

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.iss, ISSUER);
        assert_eq!(claims.exp - claims.iat, 3600);
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_claims_expiry_saturates() {
        let claims = Claims::new(Uuid::new_v4(), Duration::days(100_000_000));
        assert_eq!(claims.exp, DateTime::<Utc>::MAX_UTC.timestamp());
    }

    #[test]
    fn test_create_and_validate_token() {
        let user_id = Uuid::new_v4();
        let token = create_token(&Claims::new(user_id, Duration::hours(1)), SECRET).unwrap();

        let validated = validate_token(&token, SECRET).unwrap();
        assert_eq!(validated.sub, user_id);
        assert_eq!(validated.iss, ISSUER);
    }

    #[test]
    fn test_validate_with_wrong_secret() {
        let token = create_token(&Claims::new(Uuid::new_v4(), Duration::hours(1)), SECRET).unwrap();
        assert!(validate_token(&token, "another-secret-key-at-least-32-bytes").is_err());
    }

    #[test]
    fn test_validate_expired_token() {
        let claims = Claims::new(Uuid::new_v4(), Duration::seconds(-3600));
        assert!(claims.is_expired());

        let token = create_token(&claims, SECRET).unwrap();
        assert!(matches!(validate_token(&token, SECRET), Err(JwtError::Expired)));
    }

    #[test]
    fn test_validate_wrong_issuer() {
        let mut claims = Claims::new(Uuid::new_v4(), Duration::hours(1));
        claims.iss = "someone-else".to_string();
        let token = create_token(&claims, SECRET).unwrap();

        assert!(matches!(
            validate_token(&token, SECRET),
            Err(JwtError::ValidationError(_))
        ));
    }

    #[test]
    fn test_issuer_verify_never_errors() {
        let issuer = TokenIssuer::new(SECRET, Duration::days(30));
        let user_id = Uuid::new_v4();

        let token = issuer.issue(user_id).unwrap();
        assert_eq!(issuer.verify(&token), Some(user_id));

        assert_eq!(issuer.verify(""), None);
        assert_eq!(issuer.verify("a.b.c"), None);

        let expired = TokenIssuer::new(SECRET, Duration::seconds(-10));
        let stale = expired.issue(user_id).unwrap();
        assert_eq!(issuer.verify(&stale), None);

        let other = TokenIssuer::new("different-secret-also-32-bytes-long!!", Duration::days(1));
        assert_eq!(other.verify(&token), None);
    }

    #[test]
    fn test_parse_lifetime() {
        assert_eq!(parse_lifetime("3600").unwrap(), Duration::seconds(3600));
        assert_eq!(parse_lifetime("45s").unwrap(), Duration::seconds(45));
        assert_eq!(parse_lifetime("90m").unwrap(), Duration::minutes(90));
        assert_eq!(parse_lifetime("12h").unwrap(), Duration::hours(12));
        assert_eq!(parse_lifetime("30d").unwrap(), Duration::days(30));

        assert!(parse_lifetime("").is_err());
        assert!(parse_lifetime("d").is_err());
        assert!(parse_lifetime("0d").is_err());
        assert!(parse_lifetime("-5h").is_err());
        assert!(parse_lifetime("10w").is_err());
        assert!(parse_lifetime("99999999999999d").is_err());
        assert!(parse_lifetime("9223372036854775807").is_err());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let issuer = TokenIssuer::new(SECRET, Duration::days(1));
        assert!(!format!("{:?}", issuer).contains(SECRET));
    }
}
