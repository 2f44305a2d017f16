use std::sync::Arc;

use crate::{
    error::{Error, Result},
    management::{CredentialStore, StoreKey},
    types::{PhoneNumber, SessionToken},
};

/// Typed view over the credential store.
///
/// Owns the session token and the values of a pending authorization attempt
/// (CSRF nonce, PKCE verifier). Cloning shares the underlying store.
///
/// # Example
///
/// ```rust,ignore
/// let tokens = TokenManager::new(Arc::new(MemoryStore::new()));
/// tokens.commit(&SessionToken::bearer("abc", Some(3600))).await?;
/// assert_eq!(tokens.require().await?.access_token, "abc");
/// ```
#[derive(Clone)]
pub struct TokenManager {
    store: Arc<dyn CredentialStore>,
}

/// Nonce and verifier of an authorization attempt, taken out of the store.
#[derive(Debug, Clone, Default)]
pub struct PendingAttempt {
    pub state: Option<String>,
    pub code_verifier: Option<String>,
}

impl TokenManager {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        TokenManager { store }
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    /// Loads the stored token.
    ///
    /// An unreadable entry counts as no token and is dropped.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(token))` - a token is stored
    /// - `Ok(None)` - nothing (usable) is stored
    /// - `Err(Error::Store)` - the store itself failed
    pub async fn load(&self) -> Result<Option<SessionToken>> {
        let Some(raw) = self.store.get(StoreKey::AccessToken).await? else {
            return Ok(None);
        };

        match serde_json::from_str::<SessionToken>(&raw) {
            Ok(token) => Ok(Some(token)),
            Err(e) => {
                log::warn!("discarding unreadable stored token: {}", e);
                self.store.remove(StoreKey::AccessToken).await?;
                Ok(None)
            }
        }
    }

    /// Like [`TokenManager::load`], but a missing token is
    /// [`Error::TokenAbsent`].
    pub async fn require(&self) -> Result<SessionToken> {
        self.load().await?.ok_or(Error::TokenAbsent)
    }

    /// Replaces any previous token in a single write.
    pub async fn commit(&self, token: &SessionToken) -> Result<()> {
        let json = serde_json::to_string(token)?;
        self.store.set(StoreKey::AccessToken, &json).await
    }

    /// Records a new attempt, overwriting whatever an abandoned attempt left.
    ///
    /// # Arguments
    ///
    /// * `state` - the anti-CSRF nonce sent with the authorization request
    /// * `code_verifier` - PKCE verifier for the code flow, `None` for the
    ///   token flow (a stale verifier is removed)
    pub async fn begin_attempt(&self, state: &str, code_verifier: Option<&str>) -> Result<()> {
        self.store.set(StoreKey::AuthState, state).await?;
        match code_verifier {
            Some(verifier) => self.store.set(StoreKey::CodeVerifier, verifier).await,
            None => self.store.remove(StoreKey::CodeVerifier).await,
        }
    }

    /// Removes and returns the pending attempt; a nonce is good for one
    /// redirect only.
    pub async fn take_attempt(&self) -> Result<PendingAttempt> {
        let attempt = PendingAttempt {
            state: self.store.get(StoreKey::AuthState).await?,
            code_verifier: self.store.get(StoreKey::CodeVerifier).await?,
        };
        self.store.remove(StoreKey::AuthState).await?;
        self.store.remove(StoreKey::CodeVerifier).await?;
        Ok(attempt)
    }

    /// Drops the token and any pending attempt. The phone number stays.
    pub async fn clear(&self) -> Result<()> {
        self.store.clear().await
    }

    pub async fn phone_number(&self) -> Result<Option<String>> {
        self.store.get(StoreKey::PhoneNumber).await
    }

    pub async fn save_phone_number(&self, phone: &PhoneNumber) -> Result<()> {
        self.store.set(StoreKey::PhoneNumber, phone.as_str()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::management::MemoryStore;

    fn manager() -> TokenManager {
        TokenManager::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_commit_and_load() {
        let mgr = manager();
        assert!(mgr.load().await.unwrap().is_none());
        assert!(matches!(mgr.require().await, Err(Error::TokenAbsent)));

        let token = SessionToken::bearer("abc", Some(3600));
        mgr.commit(&token).await.unwrap();
        assert_eq!(mgr.load().await.unwrap(), Some(token));
    }

    #[tokio::test]
    async fn test_corrupt_token_is_dropped() {
        let mgr = manager();
        mgr.store().set(StoreKey::AccessToken, "not json").await.unwrap();
        assert!(mgr.load().await.unwrap().is_none());
        assert!(mgr.store().get(StoreKey::AccessToken).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_take_attempt_is_single_use() {
        let mgr = manager();
        mgr.begin_attempt("nonce", Some("verifier")).await.unwrap();

        let first = mgr.take_attempt().await.unwrap();
        assert_eq!(first.state.as_deref(), Some("nonce"));
        assert_eq!(first.code_verifier.as_deref(), Some("verifier"));

        let second = mgr.take_attempt().await.unwrap();
        assert!(second.state.is_none());
        assert!(second.code_verifier.is_none());
    }

    #[tokio::test]
    async fn test_begin_attempt_overwrites_stale_values() {
        let mgr = manager();
        mgr.begin_attempt("old", Some("old-verifier")).await.unwrap();
        mgr.begin_attempt("new", None).await.unwrap();

        let attempt = mgr.take_attempt().await.unwrap();
        assert_eq!(attempt.state.as_deref(), Some("new"));
        assert!(attempt.code_verifier.is_none());
    }
}
