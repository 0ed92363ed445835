use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::contract::client::{AuthApi, PersonnelApi};
use crate::contract::error::PersonnelResult;
use crate::contract::model::Identity;
use crate::domain::ports::{TokenSource, TokenStore};

#[derive(Debug, Clone, Default)]
struct SessionState {
    token: Option<String>,
    identity: Option<Identity>,
}

/// Shared view of the session state. Cloned into the HTTP adapters so every
/// call reads the current token; once the token is gone, nothing is signed.
#[derive(Clone, Default)]
pub struct SessionHandle {
    state: Arc<RwLock<SessionState>>,
}

impl SessionHandle {
    pub fn token(&self) -> Option<String> {
        self.state.read().token.clone()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.state.read().identity.clone()
    }

    /// Both a token and an identity are present.
    pub fn is_authenticated(&self) -> bool {
        let s = self.state.read();
        s.token.is_some() && s.identity.is_some()
    }

    fn establish(&self, token: String, identity: Option<Identity>) {
        let mut s = self.state.write();
        s.token = Some(token);
        s.identity = identity;
    }

    fn clear(&self) {
        *self.state.write() = SessionState::default();
    }

    /// Replace the identity only while `token` is still the current one.
    fn set_identity_for(&self, token: &str, identity: Identity) -> bool {
        let mut s = self.state.write();
        if s.token.as_deref() != Some(token) {
            return false;
        }
        s.identity = Some(identity);
        true
    }
}

impl TokenSource for SessionHandle {
    fn bearer_token(&self) -> Option<String> {
        self.token()
    }
}

/// Owns the auth token and the current identity.
pub struct Session {
    auth: Arc<dyn AuthApi>,
    directory: Arc<dyn PersonnelApi>,
    store: Arc<dyn TokenStore>,
    handle: SessionHandle,
}

impl Session {
    /// `handle` must be the same one the `directory` adapter signs with.
    pub fn new(
        auth: Arc<dyn AuthApi>,
        directory: Arc<dyn PersonnelApi>,
        store: Arc<dyn TokenStore>,
        handle: SessionHandle,
    ) -> Self {
        Self {
            auth,
            directory,
            store,
            handle,
        }
    }

    pub fn handle(&self) -> &SessionHandle {
        &self.handle
    }

    pub fn is_authenticated(&self) -> bool {
        self.handle.is_authenticated()
    }

    pub fn token(&self) -> Option<String> {
        self.handle.token()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.handle.identity()
    }

    /// Exchange credentials for a session and confirm the new token with the
    /// auth service. Existing state is untouched when the credentials are
    /// rejected; a token that then fails confirmation ends the session.
    #[instrument(name = "personnel.session.login", skip(self, password), fields(email = %email))]
    pub async fn try_login(&self, email: &str, password: &str) -> PersonnelResult<Identity> {
        let grant = self.auth.login(email, password).await?;
        self.handle
            .establish(grant.token.clone(), Some(grant.identity.clone()));
        if let Err(e) = self.store.save(&grant.token) {
            warn!(error = %e, "failed to persist session token");
        }
        info!(role = %grant.identity.role, "signed in");

        self.confirm(&grant.token).await?;
        Ok(self.identity().unwrap_or(grant.identity))
    }

    pub async fn login(&self, email: &str, password: &str) -> bool {
        match self.try_login(email, password).await {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "login failed");
                false
            }
        }
    }

    #[instrument(name = "personnel.session.logout", skip(self))]
    pub fn logout(&self) {
        self.handle.clear();
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "failed to remove persisted session token");
        }
        info!("signed out");
    }

    /// Confirm the current token with the auth service. Any failure,
    /// including an unreachable service, ends the session.
    #[instrument(name = "personnel.session.validate_token", skip(self))]
    pub async fn validate_token(&self) -> bool {
        let Some(token) = self.handle.token() else {
            return false;
        };
        self.confirm(&token).await.is_ok() && self.is_authenticated()
    }

    /// Validate `token`, adopt the identity the auth service reports and
    /// enrich it. On failure the session is dropped if `token` is still
    /// the current one.
    async fn confirm(&self, token: &str) -> PersonnelResult<()> {
        match self.auth.validate(token).await {
            Ok(identity) => {
                if self.handle.set_identity_for(token, identity) {
                    self.get_user_details().await;
                } else {
                    debug!("token changed during validation; result ignored");
                }
                Ok(())
            }
            Err(e) => {
                if self.handle.token().as_deref() == Some(token) {
                    warn!(error = %e, "token rejected; signing out");
                    self.logout();
                }
                Err(e)
            }
        }
    }

    /// Pick up a persisted token and validate it.
    #[instrument(name = "personnel.session.restore", skip(self))]
    pub async fn restore(&self) -> bool {
        let token = match self.store.load() {
            Ok(Some(token)) => token,
            Ok(None) => return false,
            Err(e) => {
                warn!(error = %e, "failed to read persisted session token");
                return false;
            }
        };
        self.handle.establish(token, None);
        self.validate_token().await
    }

    /// Attach department affiliation to the identity by looking up the
    /// person with the session email. Failures leave the identity as is.
    #[instrument(name = "personnel.session.get_user_details", skip(self))]
    pub async fn get_user_details(&self) {
        let (Some(token), Some(identity)) = (self.handle.token(), self.handle.identity()) else {
            return;
        };
        if identity.email.is_empty() {
            return;
        }

        match self.directory.find_person_by_email(&identity.email).await {
            Ok(Some(person)) => {
                let enriched = Identity {
                    department_id: person.department_id(),
                    department_name: person.department.as_ref().map(|d| d.name.clone()),
                    ..identity
                };
                debug!(department_id = ?enriched.department_id, "identity enriched");
                self.handle.set_identity_for(&token, enriched);
            }
            Ok(None) => debug!("no person record for session email"),
            Err(e) => warn!(error = %e, "identity enrichment failed"),
        }
    }
}
