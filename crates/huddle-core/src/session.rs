use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use crate::auth::AuthApi;
use crate::backend::{CallService, CallServiceFactory};
use crate::config::ClientConfig;
use crate::errors::HuddleError;
use crate::session_store::{Credential, Identity, SessionStore};

/// The single authenticated connection context, bound to one identity.
pub struct ClientSession {
    identity: Identity,
    credential: RwLock<Credential>,
    api_key: String,
    calls: Arc<dyn CallService>,
}

impl ClientSession {
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn user_id(&self) -> &str {
        &self.identity.id
    }

    pub fn credential(&self) -> Credential {
        self.credential
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn calls(&self) -> Arc<dyn CallService> {
        self.calls.clone()
    }

    fn replace_credential(&self, credential: Credential) {
        self.calls.update_token(&credential.token);
        *self
            .credential
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = credential;
    }
}

/// What [`SessionManager::ensure_signed_in`] ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignInOutcome {
    SignedIn,
    AlreadySignedIn,
    InProgress,
    NoIdentity,
}

/// Clears the in-flight flag however the sign-in attempt ends.
struct SignInFlag<'a>(&'a AtomicBool);

impl Drop for SignInFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Owns the client session: the only place that creates or destroys it.
///
/// Screens get read access through [`SessionManager::current`].
pub struct SessionManager {
    config: ClientConfig,
    store: Arc<SessionStore>,
    auth: Arc<dyn AuthApi>,
    factory: Arc<dyn CallServiceFactory>,
    client: RwLock<Option<Arc<ClientSession>>>,
    signing_in: AtomicBool,
}

impl SessionManager {
    pub fn new(
        config: ClientConfig,
        store: Arc<SessionStore>,
        auth: Arc<dyn AuthApi>,
        factory: Arc<dyn CallServiceFactory>,
    ) -> Self {
        Self {
            config,
            store,
            auth,
            factory,
            client: RwLock::new(None),
            signing_in: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    pub fn current(&self) -> Option<Arc<ClientSession>> {
        self.client
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Like [`current`](Self::current) but an error when signed out.
    pub fn require(&self) -> Result<Arc<ClientSession>, HuddleError> {
        self.current().ok_or(HuddleError::NotSignedIn)
    }

    pub fn is_signing_in(&self) -> bool {
        self.signing_in.load(Ordering::SeqCst)
    }

    /// Sign in `candidate`, or the persisted identity when `None`.
    ///
    /// A no-op when a session exists or another attempt is in flight.
    pub async fn ensure_signed_in(
        &self,
        candidate: Option<Identity>,
    ) -> Result<SignInOutcome, HuddleError> {
        if self.current().is_some() {
            tracing::warn!("client session already exists");
            return Ok(SignInOutcome::AlreadySignedIn);
        }

        if self
            .signing_in
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!("sign-in already in progress");
            return Ok(SignInOutcome::InProgress);
        }
        let _flag = SignInFlag(&self.signing_in);
        // Another attempt may have finished between the first check and the swap.
        if self.current().is_some() {
            tracing::debug!("client session appeared while acquiring the sign-in flag");
            return Ok(SignInOutcome::AlreadySignedIn);
        }

        let Some(identity) = candidate.or_else(|| self.store.user()) else {
            tracing::debug!("no identity to sign in with");
            return Ok(SignInOutcome::NoIdentity);
        };

        let auth = self
            .auth
            .auth_data(&self.config.environment, &identity.id)
            .await?;
        let calls = self.factory.connect(&identity, &auth)?;

        let credential = Credential {
            token: auth.token.clone(),
            environment: self.config.environment.clone(),
        };
        let session = Arc::new(ClientSession {
            identity: identity.clone(),
            credential: RwLock::new(credential.clone()),
            api_key: auth.api_key,
            calls,
        });
        *self
            .client
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(session);

        if let Err(e) = self
            .store
            .update_user(Some(identity.clone()))
            .and_then(|()| self.store.update_credential(Some(credential)))
        {
            tracing::warn!("signed in but the session was not persisted: {e}");
        }
        tracing::info!("signed in as {}", identity.id);
        Ok(SignInOutcome::SignedIn)
    }

    /// Fetch a fresh credential for the signed-in user.
    pub async fn refresh_token(&self) -> Result<Credential, HuddleError> {
        let session = self.require()?;
        let auth = self
            .auth
            .auth_data(&self.config.environment, session.user_id())
            .await?;
        let credential = Credential {
            token: auth.token,
            environment: self.config.environment.clone(),
        };
        session.replace_credential(credential.clone());
        self.store.update_credential(Some(credential.clone()))?;
        tracing::info!("refreshed token for {}", session.user_id());
        Ok(credential)
    }

    /// Forget the user, log the session out and drop it.
    pub async fn sign_out(&self) {
        if let Err(e) = self.store.clear() {
            tracing::warn!("sign-out could not clear the stored session: {e}");
        }

        if let Some(session) = self.current() {
            if let Err(e) = session.calls().log_out().await {
                tracing::warn!("log out failed: {e}");
            }
            tokio::time::sleep(self.config.sign_out_grace()).await;
            tracing::info!("signed out {}", session.user_id());
        }

        self.client
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
    }
}
