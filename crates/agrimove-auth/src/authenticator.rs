use std::sync::Arc;

use agrimove_core::{
    CredentialStore, Error, Identity, IssuedToken, NewUser, Result, UserProfile, ValidationErrors,
};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::{PasswordHasher, TokenManager};

/// Ties the credential store, password hasher and token manager together
/// into the login, registration and bearer validation flows.
pub struct Authenticator {
    store: Arc<dyn CredentialStore>,
    hasher: Arc<PasswordHasher>,
    tokens: TokenManager,
}

impl Authenticator {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        hasher: PasswordHasher,
        tokens: TokenManager,
    ) -> Self {
        Self {
            store,
            hasher: Arc::new(hasher),
            tokens,
        }
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    /// Every failure is reported as `InvalidCredentials`; unknown users cost
    /// the same hashing work as a wrong password.
    pub async fn login(&self, username: &str, password: &str) -> Result<IssuedToken> {
        let username = username.trim();
        let stored_hash = self
            .store
            .lookup(username)
            .await?
            .map(|identity| identity.password_hash);
        let password = password.to_string();
        let verified = self
            .run_hasher(move |hasher| match stored_hash {
                Some(material) => hasher.verify(&password, &material),
                None => {
                    hasher.verify_dummy(&password);
                    false
                }
            })
            .await?;
        if !verified {
            debug!(username = %username, "login rejected");
            return Err(Error::InvalidCredentials);
        }
        let issued = self.tokens.issue(username, None)?;
        info!(username = %username, expires_at = issued.claims.exp, "access token issued");
        Ok(issued)
    }

    pub async fn register(&self, user: NewUser) -> Result<UserProfile> {
        let username = user.username.trim().to_string();
        let mut errors = ValidationErrors::new();
        if username.is_empty() {
            errors.add("username", "is required");
        }
        if user.password.is_empty() {
            errors.add("password", "is required");
        }
        if user.confirm_password.is_empty() {
            errors.add("confirm_password", "is required");
        } else if user.password != user.confirm_password {
            errors.add("confirm_password", "does not match password");
        }
        errors.into_result()?;

        let password = user.password;
        let password_hash = self
            .run_hasher(move |hasher| hasher.hash(&password))
            .await??;
        let identity = Identity {
            username,
            password_hash,
            full_name: non_blank(user.full_name),
            email: non_blank(user.email),
            disabled: false,
        };
        let profile = UserProfile::from(&identity);
        self.store.register(identity).await?;
        info!(username = %profile.username, "user registered");
        Ok(profile)
    }

    /// Resolves a presented bearer token back to its identity.
    pub async fn authenticate(&self, token: &str) -> Result<Identity> {
        self.authenticate_at(token, Utc::now()).await
    }

    pub async fn authenticate_at(&self, token: &str, now: DateTime<Utc>) -> Result<Identity> {
        let claims = self.tokens.decode_at(token, now)?;
        self.store
            .lookup(&claims.sub)
            .await?
            .ok_or(Error::UnknownSubject)
    }

    /// PBKDF2 is CPU-bound; keep it off the async worker threads.
    async fn run_hasher<T, F>(&self, work: F) -> Result<T>
    where
        F: FnOnce(&PasswordHasher) -> T + Send + 'static,
        T: Send + 'static,
    {
        let hasher = Arc::clone(&self.hasher);
        tokio::task::spawn_blocking(move || work(&hasher))
            .await
            .map_err(|e| Error::Internal(format!("password hashing task failed: {}", e)))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryCredentialStore;
    use chrono::Duration;

    fn new_user(username: &str, password: &str) -> NewUser {
        NewUser {
            username: username.into(),
            password: password.into(),
            confirm_password: password.into(),
            ..Default::default()
        }
    }

    async fn authenticator() -> Authenticator {
        let secret = TokenManager::generate_secret().unwrap();
        let authenticator = Authenticator::new(
            Arc::new(InMemoryCredentialStore::new()),
            PasswordHasher::new(1_000).unwrap(),
            TokenManager::new(&secret),
        );
        authenticator
            .register(NewUser {
                full_name: Some("John Farmer".into()),
                email: Some("farmer1@example.com".into()),
                ..new_user("farmer1", "password")
            })
            .await
            .unwrap();
        authenticator
    }

    #[tokio::test]
    async fn test_login_then_authenticate_resolves_identity() {
        let auth = authenticator().await;
        auth.register(new_user("trucker", "diesel")).await.unwrap();

        for (username, password) in [("farmer1", "password"), ("trucker", "diesel")] {
            let issued = auth.login(username, password).await.unwrap();
            let identity = auth.authenticate(&issued.token).await.unwrap();
            assert_eq!(identity.username, username);
        }

        let identity = auth
            .authenticate(&auth.login("farmer1", "password").await.unwrap().token)
            .await
            .unwrap();
        assert_eq!(identity.full_name.as_deref(), Some("John Farmer"));
    }

    #[tokio::test]
    async fn test_login_failures_are_uniform() {
        let auth = authenticator().await;
        assert!(matches!(
            auth.login("farmer1", "wrong").await,
            Err(Error::InvalidCredentials)
        ));
        assert!(matches!(
            auth.login("nobody", "password").await,
            Err(Error::InvalidCredentials)
        ));
        assert!(matches!(
            auth.login("", "").await,
            Err(Error::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_unknown_subject_rejected() {
        let auth = authenticator().await;
        let issued = auth.tokens().issue("ghost", None).unwrap();
        assert!(matches!(
            auth.authenticate(&issued.token).await,
            Err(Error::UnknownSubject)
        ));
    }

    #[tokio::test]
    async fn test_expired_token_rejected_before_lookup() {
        let auth = authenticator().await;
        let now = Utc::now();
        let issued = auth
            .tokens()
            .issue_at("farmer1", None, now - Duration::hours(2))
            .unwrap();
        assert!(matches!(
            auth.authenticate_at(&issued.token, now).await,
            Err(Error::TokenExpired)
        ));
    }

    #[tokio::test]
    async fn test_register_validation() {
        let auth = authenticator().await;

        let mismatch = NewUser {
            confirm_password: "other".into(),
            ..new_user("trucker", "diesel")
        };
        match auth.register(mismatch).await {
            Err(Error::Validation(errors)) => {
                assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["confirm_password"]);
            }
            other => panic!("unexpected result: {other:?}"),
        }

        match auth.register(NewUser::default()).await {
            Err(Error::Validation(errors)) => {
                assert_eq!(
                    errors.fields().collect::<Vec<_>>(),
                    vec!["username", "password", "confirm_password"]
                );
            }
            other => panic!("unexpected result: {other:?}"),
        }

        assert!(matches!(
            auth.register(new_user("farmer1", "again")).await,
            Err(Error::UsernameTaken(_))
        ));
        assert!(auth.login("farmer1", "password").await.is_ok());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_hashing_does_not_block_runtime() {
        let auth = Arc::new(authenticator().await);
        let ticks = Arc::new(std::sync::atomic::AtomicUsize::new(0));

        let ticker = {
            let ticks = ticks.clone();
            tokio::spawn(async move {
                loop {
                    ticks.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                    tokio::task::yield_now().await;
                }
            })
        };
        for _ in 0..5 {
            auth.login("farmer1", "password").await.unwrap();
        }
        ticker.abort();

        assert!(ticks.load(std::sync::atomic::Ordering::SeqCst) > 0);
    }

    #[tokio::test]
    async fn test_stored_hash_is_not_plaintext() {
        let auth = authenticator().await;
        let identity = auth.store().lookup("farmer1").await.unwrap().unwrap();
        assert_ne!(identity.password_hash, "password");
        assert!(identity.password_hash.starts_with("$pbkdf2-sha256$"));
    }
}
