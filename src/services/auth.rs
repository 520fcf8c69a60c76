//! Credential hashing, bearer tokens and login.
//!
//! Tokens are HS256 JWTs carrying `{sub, role, uid, exp}`. They are stateless:
//! revocation is limited to expiry and to the account being deactivated or
//! removed.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::domain::{AccountStatus, Identity, Principal, Role};
use crate::error::AppError;
use crate::ports::DirectoryRepository;

/// Hashes a password with bcrypt at the default cost.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("failed to hash password: {}", e)))
}

/// Malformed hashes never verify.
pub fn verify_password(password: &str, stored: &str) -> bool {
    bcrypt::verify(password, stored).unwrap_or(false)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    pub uid: i64,
    /// Expiry as unix seconds.
    pub exp: i64,
}

#[derive(Clone)]
pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenSigner {
    pub fn new(secret: &str, ttl_secs: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::seconds(ttl_secs),
        }
    }

    pub fn issue(&self, identity: &Identity) -> Result<String, AppError> {
        self.issue_at(identity, Utc::now())
    }

    pub fn issue_at(&self, identity: &Identity, now: DateTime<Utc>) -> Result<String, AppError> {
        let claims = Claims {
            sub: identity.username.clone(),
            role: identity.role,
            uid: identity.id,
            exp: (now + self.ttl).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("failed to sign token: {}", e)))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        let mut validation = Validation::default();
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AppError::Unauthorized("token expired".to_string()),
                _ => AppError::Unauthorized("invalid token".to_string()),
            })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub user: Principal,
}

#[derive(Clone)]
pub struct AuthService {
    directory: Arc<dyn DirectoryRepository>,
    signer: TokenSigner,
}

impl AuthService {
    pub fn new(directory: Arc<dyn DirectoryRepository>, signer: TokenSigner) -> Self {
        Self { directory, signer }
    }

    /// Checks users, then admins, then super-admins, and signs in the first
    /// account whose password matches.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, AppError> {
        let candidates = self.directory.find_principals_by_username(username).await?;

        let principal = candidates
            .into_iter()
            .find(|principal| verify_password(password, principal.password_hash()))
            .ok_or_else(|| {
                tracing::warn!(username, "Rejected login");
                AppError::Unauthorized("invalid credentials".to_string())
            })?;

        if principal.status() == AccountStatus::Inactive {
            return Err(AppError::Forbidden("account is inactive".to_string()));
        }

        let identity = principal.identity();
        let access_token = self.signer.issue(&identity)?;
        tracing::info!(user_id = identity.id, role = %identity.role, "User logged in");

        Ok(LoginResponse {
            access_token,
            token_type: "bearer",
            user: principal,
        })
    }

    /// Resolves a bearer token to the live account it was issued for.
    pub async fn authenticate(&self, token: &str) -> Result<Principal, AppError> {
        let claims = self.signer.verify(token)?;

        let found = match claims.role {
            Role::User => self.directory.find_user(claims.uid).await.map(Principal::User),
            Role::Admin => self.directory.find_admin(claims.uid).await.map(Principal::Admin),
            Role::SuperAdmin => self
                .directory
                .find_super_admin(claims.uid)
                .await
                .map(Principal::SuperAdmin),
        };

        let principal = match found {
            Ok(principal) => principal,
            Err(AppError::NotFound(_)) => {
                return Err(AppError::Unauthorized("account no longer exists".to_string()))
            }
            Err(e) => return Err(e),
        };

        if principal.identity().username != claims.sub {
            return Err(AppError::Unauthorized("invalid token".to_string()));
        }
        if principal.status() == AccountStatus::Inactive {
            return Err(AppError::Forbidden("account is inactive".to_string()));
        }

        Ok(principal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> Identity {
        Identity {
            id: 3,
            username: "user1".to_string(),
            role: Role::User,
        }
    }

    #[test]
    fn test_password_round_trip() {
        let hash = hash_password("s3cret").unwrap();
        assert!(hash.starts_with("$2"));
        assert!(verify_password("s3cret", &hash));
        assert!(!verify_password("S3cret", &hash));
    }

    #[test]
    fn test_password_hash_is_salted() {
        let first = hash_password("s3cret").unwrap();
        let second = hash_password("s3cret").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_malformed_hash_never_verifies() {
        assert!(!verify_password("s3cret", ""));
        assert!(!verify_password("s3cret", "no-separator"));
        assert!(!verify_password("s3cret", "zz$zz"));
    }

    #[test]
    fn test_token_round_trip() {
        let signer = TokenSigner::new("test-secret", 60);
        let token = signer.issue(&identity()).unwrap();
        let claims = signer.verify(&token).unwrap();

        assert_eq!(claims.sub, "user1");
        assert_eq!(claims.role, Role::User);
        assert_eq!(claims.uid, 3);
        assert_eq!(token.split('.').count(), 3);
    }

    #[test]
    fn test_token_expires() {
        let signer = TokenSigner::new("test-secret", 60);
        let issued = Utc::now() - Duration::seconds(600);
        let token = signer.issue_at(&identity(), issued).unwrap();

        match signer.verify(&token) {
            Err(AppError::Unauthorized(message)) => assert_eq!(message, "token expired"),
            other => panic!("expected expiry, got {:?}", other),
        }
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let token = TokenSigner::new("secret-a", 60).issue(&identity()).unwrap();
        let result = TokenSigner::new("secret-b", 60).verify(&token);

        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_tampered_payload_is_rejected() {
        let signer = TokenSigner::new("test-secret", 60);
        let token = signer.issue(&identity()).unwrap();

        let elevated = Identity {
            role: Role::SuperAdmin,
            ..identity()
        };
        let other = TokenSigner::new("attacker", 60).issue(&elevated).unwrap();

        let parts: Vec<&str> = token.split('.').collect();
        let other_parts: Vec<&str> = other.split('.').collect();
        let forged = format!("{}.{}.{}", parts[0], other_parts[1], parts[2]);

        assert!(signer.verify(&forged).is_err());
        assert!(signer.verify("garbage").is_err());
    }
}
