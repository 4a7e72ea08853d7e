use chrono::Duration;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::directory::{RefreshTokenStore, UserDirectory};
use crate::auth::password::PasswordHasher;
use crate::auth::token::{Claims, TokenCodec, TokenKind};
use crate::config::AuthConfig;
use crate::db::models::User;
use crate::error::AuthError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Issues and rotates session tokens.
///
/// Holds no per-session state: everything that outlives a call lives in the
/// refresh-token store, which keeps at most one token per user.
pub struct SessionService {
    directory: Arc<dyn UserDirectory>,
    store: Arc<dyn RefreshTokenStore>,
    codec: TokenCodec,
    hasher: PasswordHasher,
    /// Checked instead of a stored hash when the email is unknown.
    dummy_hash: String,
    access_lifetime: Duration,
    refresh_lifetime: Duration,
}

impl SessionService {
    pub fn new(
        directory: Arc<dyn UserDirectory>,
        store: Arc<dyn RefreshTokenStore>,
        config: &AuthConfig,
    ) -> Self {
        let hasher = PasswordHasher::new(config.bcrypt_cost);
        let dummy_hash = hasher.hash(&Uuid::new_v4().to_string()).unwrap_or_else(|e| {
            warn!("Could not prepare dummy password hash: {}", e);
            String::new()
        });

        Self {
            directory,
            store,
            codec: TokenCodec::new(&config.secret_key),
            hasher,
            dummy_hash,
            access_lifetime: Duration::minutes(config.access_token_lifetime_minutes),
            refresh_lifetime: Duration::minutes(config.refresh_token_lifetime_minutes),
        }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Exchange credentials for a fresh token pair, replacing any refresh
    /// token the user already had.
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair, AuthError> {
        let user = self.directory.find_by_email(email).await?;

        let hasher = self.hasher;
        let plaintext = password.to_owned();
        let hash = self.hash_to_check(user.as_ref()).to_owned();
        let matches = tokio::task::spawn_blocking(move || hasher.verify(&plaintext, &hash))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))?;

        let user = user.ok_or(AuthError::UserNotFound)?;
        if !matches {
            return Err(AuthError::InvalidCredentials);
        }

        let pair = self.mint(&user)?;
        self.store.upsert(user.id, &pair.refresh_token).await?;

        info!(user_id = user.id, "Issued session on login");
        Ok(pair)
    }

    /// Exchange a current refresh token for a new pair. The presented token
    /// stops working as soon as this returns successfully.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let claims = self.codec.decode(refresh_token, TokenKind::Refresh)?;

        let owner = self
            .directory
            .find_owner_of_refresh_token(refresh_token)
            .await?
            .ok_or_else(|| {
                warn!(user_id = claims.id, "Refresh token is not the stored one");
                AuthError::SessionMismatch
            })?;

        if owner.id != claims.id || owner.email != claims.email {
            warn!(
                user_id = owner.id,
                claimed_id = claims.id,
                "Refresh token claims do not match its owner"
            );
            return Err(AuthError::SessionMismatch);
        }

        let pair = self.mint(&owner)?;

        // A concurrent refresh with the same token may have rotated it already.
        if !self.store.rotate(owner.id, refresh_token, &pair.refresh_token).await? {
            warn!(user_id = owner.id, "Refresh token was rotated concurrently");
            return Err(AuthError::SessionMismatch);
        }

        info!(user_id = owner.id, "Rotated session");
        Ok(pair)
    }

    /// Drop the user's refresh token. Access tokens already issued stay valid
    /// until they expire.
    pub async fn logout(&self, user: &User) -> Result<(), AuthError> {
        self.store.revoke(user.id).await?;
        info!(user_id = user.id, "Revoked session");
        Ok(())
    }

    fn hash_to_check<'a>(&'a self, user: Option<&'a User>) -> &'a str {
        user.map_or(self.dummy_hash.as_str(), |u| u.password_hash.as_str())
    }

    fn mint(&self, user: &User) -> Result<TokenPair, AuthError> {
        let access = Claims::for_user(user, TokenKind::Access, self.access_lifetime);
        let refresh = Claims::for_user(user, TokenKind::Refresh, self.refresh_lifetime);

        Ok(TokenPair {
            access_token: self.codec.encode(&access)?,
            refresh_token: self.codec.encode(&refresh)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::directory::{MockRefreshTokenStore, MockUserDirectory};
    use crate::config::Settings;
    use crate::db::models::UserRecord;
    use crate::db::repository::UserRepository;
    use crate::db::MemoryStore;
    use crate::error::DatabaseError;

    fn auth_config() -> AuthConfig {
        Settings::new_for_test().expect("Failed to load test config").auth
    }

    async fn setup() -> (SessionService, MemoryStore, User) {
        let config = auth_config();
        let store = MemoryStore::new();
        let hash = PasswordHasher::new(config.bcrypt_cost).hash("secret123").unwrap();
        let user = store
            .create_user(&UserRecord {
                first_name: "Alice".into(),
                last_name: "Liddell".into(),
                email: "alice@example.com".into(),
                password_hash: hash,
                user_type_id: None,
            })
            .await
            .unwrap();

        let backend = Arc::new(store.clone());
        let service = SessionService::new(backend.clone(), backend, &config);
        (service, store, user)
    }

    #[tokio::test]
    async fn test_login_issues_distinct_tokens() {
        let (service, store, user) = setup().await;

        let pair = service.login("alice@example.com", "secret123").await.unwrap();
        assert_ne!(pair.access_token, pair.refresh_token);

        let claims = service.codec().decode(&pair.access_token, TokenKind::Access).unwrap();
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(claims.id, user.id);

        assert_eq!(store.refresh_token_for(user.id).await, Some(pair.refresh_token));
    }

    #[tokio::test]
    async fn test_login_rejects_unknown_user_and_bad_password() {
        let (service, _, _) = setup().await;

        assert!(matches!(
            service.login("bob@example.com", "secret123").await,
            Err(AuthError::UserNotFound)
        ));
        assert!(matches!(
            service.login("alice@example.com", "wrong").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            service.login("ALICE@example.com", "secret123").await,
            Err(AuthError::UserNotFound)
        ));
    }

    #[tokio::test]
    async fn test_unknown_email_still_checks_a_bcrypt_hash() {
        let (service, _, user) = setup().await;

        let dummy = service.hash_to_check(None);
        assert!(dummy.starts_with("$2"));
        assert_eq!(dummy.len(), 60);
        assert_ne!(dummy, user.password_hash);
        assert_eq!(service.hash_to_check(Some(&user)), user.password_hash);
    }

    #[tokio::test]
    async fn test_second_login_supersedes_first_refresh_token() {
        let (service, _, _) = setup().await;

        let first = service.login("alice@example.com", "secret123").await.unwrap();
        let second = service.login("alice@example.com", "secret123").await.unwrap();

        assert!(matches!(
            service.refresh(&first.refresh_token).await,
            Err(AuthError::SessionMismatch)
        ));
        assert!(service.refresh(&second.refresh_token).await.is_ok());
    }

    #[tokio::test]
    async fn test_refresh_rotates() {
        let (service, _, _) = setup().await;

        let (a1, r1) = {
            let pair = service.login("alice@example.com", "secret123").await.unwrap();
            (pair.access_token, pair.refresh_token)
        };
        let second = service.refresh(&r1).await.unwrap();
        assert_ne!(second.access_token, a1);
        assert_ne!(second.refresh_token, r1);

        assert!(matches!(service.refresh(&r1).await, Err(AuthError::SessionMismatch)));

        let third = service.refresh(&second.refresh_token).await.unwrap();
        assert_ne!(third.refresh_token, second.refresh_token);
    }

    #[tokio::test]
    async fn test_refresh_rejects_access_token() {
        let (service, _, _) = setup().await;
        let pair = service.login("alice@example.com", "secret123").await.unwrap();

        assert!(matches!(
            service.refresh(&pair.access_token).await,
            Err(AuthError::TokenInvalid)
        ));
    }

    #[tokio::test]
    async fn test_refresh_rejects_expired_token_before_store_lookup() {
        let config = auth_config();
        let mut directory = MockUserDirectory::new();
        directory.expect_find_owner_of_refresh_token().never();
        let store = MockRefreshTokenStore::new();
        let service = SessionService::new(Arc::new(directory), Arc::new(store), &config);

        let user = User {
            id: 1,
            first_name: "Alice".into(),
            last_name: "Liddell".into(),
            email: "alice@example.com".into(),
            password_hash: String::new(),
            last_login_utc: chrono::Utc::now(),
            user_type_id: None,
        };
        let mut claims = Claims::for_user(&user, TokenKind::Refresh, Duration::minutes(1));
        claims.exp = chrono::Utc::now().timestamp() - 5;
        let token = service.codec().encode(&claims).unwrap();

        assert!(matches!(service.refresh(&token).await, Err(AuthError::TokenExpired)));
    }

    #[tokio::test]
    async fn test_refresh_rejects_expired_access_token_as_invalid() {
        let (service, _, user) = setup().await;
        let mut claims = Claims::for_user(&user, TokenKind::Access, Duration::minutes(5));
        claims.exp = chrono::Utc::now().timestamp() - 60;
        let token = service.codec().encode(&claims).unwrap();

        assert!(matches!(service.refresh(&token).await, Err(AuthError::TokenInvalid)));
    }

    #[tokio::test]
    async fn test_refresh_detects_identity_mismatch() {
        let config = auth_config();
        let codec = TokenCodec::new(&config.secret_key);
        let claimed = User {
            id: 1,
            first_name: "Alice".into(),
            last_name: "Liddell".into(),
            email: "alice@example.com".into(),
            password_hash: String::new(),
            last_login_utc: chrono::Utc::now(),
            user_type_id: None,
        };
        let token = codec
            .encode(&Claims::for_user(&claimed, TokenKind::Refresh, Duration::days(1)))
            .unwrap();

        let mut directory = MockUserDirectory::new();
        let mut owner = claimed.clone();
        owner.email = "someone-else@example.com".into();
        directory
            .expect_find_owner_of_refresh_token()
            .times(1)
            .returning(move |_| Ok(Some(owner.clone())));
        let mut store = MockRefreshTokenStore::new();
        store.expect_rotate().never();

        let service = SessionService::new(Arc::new(directory), Arc::new(store), &config);
        assert!(matches!(service.refresh(&token).await, Err(AuthError::SessionMismatch)));
    }

    #[tokio::test]
    async fn test_store_failure_surfaces_as_store_error() {
        let config = auth_config();
        let hash = PasswordHasher::new(config.bcrypt_cost).hash("secret123").unwrap();
        let user = User {
            id: 1,
            first_name: "Alice".into(),
            last_name: "Liddell".into(),
            email: "alice@example.com".into(),
            password_hash: hash,
            last_login_utc: chrono::Utc::now(),
            user_type_id: None,
        };

        let mut directory = MockUserDirectory::new();
        directory
            .expect_find_by_email()
            .times(1)
            .returning(move |_| Ok(Some(user.clone())));
        let mut store = MockRefreshTokenStore::new();
        store
            .expect_upsert()
            .times(1)
            .returning(|_, _| Err(DatabaseError::ConnectionError("pool closed".into())));

        let service = SessionService::new(Arc::new(directory), Arc::new(store), &config);
        let err = service.login("alice@example.com", "secret123").await.unwrap_err();
        assert!(matches!(err, AuthError::Store(_)));
        assert!(err.is_server_fault());
    }

    #[tokio::test]
    async fn test_concurrent_refresh_with_same_token_succeeds_once() {
        let (service, _, _) = setup().await;
        let pair = service.login("alice@example.com", "secret123").await.unwrap();

        let (a, b) = tokio::join!(
            service.refresh(&pair.refresh_token),
            service.refresh(&pair.refresh_token)
        );

        let successes = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
        assert_eq!(successes, 1);
    }

    #[tokio::test]
    async fn test_logout_revokes_refresh_token() {
        let (service, store, user) = setup().await;
        let pair = service.login("alice@example.com", "secret123").await.unwrap();

        service.logout(&user).await.unwrap();

        assert!(store.refresh_token_for(user.id).await.is_none());
        assert!(matches!(
            service.refresh(&pair.refresh_token).await,
            Err(AuthError::SessionMismatch)
        ));
    }
}
