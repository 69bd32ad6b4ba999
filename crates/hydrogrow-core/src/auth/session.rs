use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::api::{ApiClient, ApiError, Gateway};
use crate::config::Config;
use crate::models::{AccountProfile, RegisterConfirmation, UserProfile};
use crate::storage::{PersistenceError, SessionStorage};

use super::error::{LOGIN_FALLBACK_MESSAGE, REGISTER_FALLBACK_MESSAGE};
use super::inflight::InFlight;
use super::{validation, AuthError};

/// Storage key for the bearer token
pub const TOKEN_KEY: &str = "hydro_grow_token";

/// Storage key for the JSON-serialized profile
pub const USER_KEY: &str = "hydro_grow_user";

/// Storage key for the login timestamp (RFC 3339)
pub const LOGGED_IN_AT_KEY: &str = "hydro_grow_logged_in_at";

const SESSION_KEYS: [&str; 3] = [TOKEN_KEY, USER_KEY, LOGGED_IN_AT_KEY];

/// A token paired with the profile returned alongside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub credential: String,
    pub profile: UserProfile,
    /// Absent for sessions written without a timestamp
    pub logged_in_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn age_display(&self) -> String {
        let Some(at) = self.logged_in_at else {
            return "unknown".to_string();
        };
        let minutes = (Utc::now() - at).num_minutes();
        if minutes < 1 {
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            format!("{}h ago", minutes / 60)
        } else {
            format!("{}d ago", minutes / 1440)
        }
    }
}

enum SessionState {
    /// Nothing read from storage yet
    Unloaded,
    Loaded {
        session: Option<Session>,
        /// False when the live session could not be written to storage
        durable: bool,
    },
}

struct Inner {
    api: ApiClient,
    storage: Arc<dyn SessionStorage>,
    /// Held across every session mutation so memory, storage and the
    /// gateway always change together
    state: Mutex<SessionState>,
    login_guard: InFlight<Result<UserProfile, AuthError>>,
    register_guard: InFlight<Result<RegisterConfirmation, AuthError>>,
}

/// Owns the persisted session and the gateway attachment.
///
/// This is the only path that mutates either. Clone is cheap and clones
/// share state.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

impl SessionManager {
    pub fn new(api: ApiClient, storage: Arc<dyn SessionStorage>) -> Self {
        Self {
            inner: Arc::new(Inner {
                api,
                storage,
                state: Mutex::new(SessionState::Unloaded),
                login_guard: InFlight::new(),
                register_guard: InFlight::new(),
            }),
        }
    }

    /// Build a manager with its own isolated gateway
    pub fn from_config(config: &Config, storage: Arc<dyn SessionStorage>) -> Result<Self, ApiError> {
        let api = ApiClient::new(config, Gateway::new())?;
        Ok(Self::new(api, storage))
    }

    /// Client for authenticated reads; requests carry the current credential
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    pub fn gateway(&self) -> &Gateway {
        self.inner.api.gateway()
    }

    /// Restore the persisted session and attach its token. No network access.
    ///
    /// Only the first call (before any login/logout) reads storage.
    pub async fn initialize(&self) {
        let mut state = self.inner.state.lock().await;
        if matches!(*state, SessionState::Loaded { .. }) {
            return;
        }

        let session = self.inner.read_persisted().await;
        if let Some(ref s) = session {
            self.gateway().set_credential(Some(s.credential.clone()));
            info!(email = %s.profile.email, "Restored persisted session");
        }
        *state = SessionState::Loaded {
            session,
            durable: true,
        };
    }

    /// The live session, or the persisted one if nothing has been loaded yet
    pub async fn current_session(&self) -> Option<Session> {
        let state = self.inner.state.lock().await;
        match &*state {
            SessionState::Unloaded => self.inner.read_persisted().await,
            SessionState::Loaded { session, .. } => session.clone(),
        }
    }

    pub async fn is_logged_in(&self) -> bool {
        self.current_session().await.is_some()
    }

    /// False when the last login worked remotely but was not persisted,
    /// meaning the session will not survive a restart
    pub async fn is_session_durable(&self) -> bool {
        match &*self.inner.state.lock().await {
            SessionState::Unloaded => true,
            SessionState::Loaded { durable, .. } => *durable,
        }
    }

    /// True while a login exchange is outstanding, for disabling the submit button
    pub fn is_login_pending(&self) -> bool {
        self.inner.login_guard.is_pending()
    }

    pub fn is_register_pending(&self) -> bool {
        self.inner.register_guard.is_pending()
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<UserProfile, AuthError> {
        validation::validate_login(email, password)?;

        let inner = Arc::clone(&self.inner);
        let email = email.trim().to_string();
        let password = password.to_string();
        self.inner
            .login_guard
            .run("login", move || async move { inner.login(&email, &password).await })
            .await
            .unwrap_or_else(|| Err(AuthError::Authentication(LOGIN_FALLBACK_MESSAGE.to_string())))
    }

    /// Create an account. Does not log in.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<RegisterConfirmation, AuthError> {
        validation::validate_registration(email, password, display_name)?;

        let inner = Arc::clone(&self.inner);
        let email = email.trim().to_string();
        let password = password.to_string();
        let display_name = display_name.trim().to_string();
        self.inner
            .register_guard
            .run("register", move || async move {
                inner
                    .api
                    .register(&email, &password, Some(display_name.as_str()))
                    .await
                    .map_err(|e| AuthError::from_api(e, REGISTER_FALLBACK_MESSAGE))
            })
            .await
            .unwrap_or_else(|| Err(AuthError::Authentication(REGISTER_FALLBACK_MESSAGE.to_string())))
    }

    /// Fetch `/api/me` and replace the cached profile with it.
    ///
    /// Errors are returned as-is; a 401 is for the caller to turn into a logout.
    pub async fn refresh_profile(&self) -> Result<AccountProfile, ApiError> {
        let sent_with = self.gateway().current_credential();
        let account = self.inner.api.fetch_profile().await?;

        let mut state = self.inner.state.lock().await;
        if let SessionState::Loaded { session: Some(session), .. } = &mut *state {
            // Skip if a login or logout replaced the session meanwhile
            let profile = UserProfile::from(account.clone());
            if sent_with.as_ref() == Some(&session.credential) && session.profile != profile {
                let stored = profile.clone();
                if let Err(e) = self.inner.with_storage(move |s| write_profile(s, &stored)).await {
                    warn!(error = %e, "Failed to persist refreshed profile");
                }
                session.profile = profile;
            }
        }
        Ok(account)
    }

    /// Drop the session. Always succeeds; storage failures are logged.
    pub async fn logout(&self) {
        let mut state = self.inner.state.lock().await;
        self.gateway().set_credential(None);
        *state = SessionState::Loaded {
            session: None,
            durable: true,
        };

        if let Err(e) = self.inner.with_storage(clear_persisted).await {
            warn!(error = %e, "Failed to clear persisted session; it may reappear after restart");
        }
        info!("Logged out");
    }
}

impl Inner {
    async fn login(&self, email: &str, password: &str) -> Result<UserProfile, AuthError> {
        let resp = self
            .api
            .login(email, password)
            .await
            .map_err(|e| AuthError::from_api(e, LOGIN_FALLBACK_MESSAGE))?;

        if resp.access_token.is_empty() {
            warn!("Login response carried an empty token");
            return Err(AuthError::Authentication(LOGIN_FALLBACK_MESSAGE.to_string()));
        }

        let session = Session {
            credential: resp.access_token,
            profile: resp.user,
            logged_in_at: Some(Utc::now()),
        };

        let mut state = self.state.lock().await;
        let to_store = session.clone();
        let written = self
            .with_storage(move |s| match persist(s, &to_store) {
                Ok(()) => Ok(()),
                Err(e) => {
                    // Never leave a new token beside an old profile
                    if let Err(clear_err) = clear_persisted(s) {
                        warn!(error = %clear_err, "Failed to clear partially written session");
                    }
                    Err(e)
                }
            })
            .await;
        let durable = match written {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Failed to persist session; it will not survive a restart");
                false
            }
        };

        self.api.gateway().set_credential(Some(session.credential.clone()));
        let profile = session.profile.clone();
        info!(email = %profile.email, durable, "Logged in");
        *state = SessionState::Loaded {
            session: Some(session),
            durable,
        };
        Ok(profile)
    }

    /// Run storage I/O on the blocking pool
    async fn with_storage<R, F>(&self, f: F) -> Result<R, PersistenceError>
    where
        F: FnOnce(&dyn SessionStorage) -> Result<R, PersistenceError> + Send + 'static,
        R: Send + 'static,
    {
        let storage = Arc::clone(&self.storage);
        tokio::task::spawn_blocking(move || f(storage.as_ref())).await?
    }

    /// Read the stored session. A failure or a half-written pair counts as none.
    async fn read_persisted(&self) -> Option<Session> {
        match self.with_storage(read_persisted).await {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "Failed to read persisted session; treating as logged out");
                None
            }
        }
    }
}

fn persist(storage: &dyn SessionStorage, session: &Session) -> Result<(), PersistenceError> {
    storage.set(TOKEN_KEY, &session.credential)?;
    write_profile(storage, &session.profile)?;
    match session.logged_in_at {
        Some(at) => storage.set(LOGGED_IN_AT_KEY, &at.to_rfc3339())?,
        None => storage.remove(LOGGED_IN_AT_KEY)?,
    }
    Ok(())
}

fn write_profile(storage: &dyn SessionStorage, profile: &UserProfile) -> Result<(), PersistenceError> {
    storage.set(USER_KEY, &serde_json::to_string(profile)?)
}

/// Remove every key, reporting the first failure
fn clear_persisted(storage: &dyn SessionStorage) -> Result<(), PersistenceError> {
    let mut first_error = None;
    for key in SESSION_KEYS {
        if let Err(e) = storage.remove(key) {
            first_error.get_or_insert(e);
        }
    }
    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn read_persisted(storage: &dyn SessionStorage) -> Result<Option<Session>, PersistenceError> {
    let Some(credential) = storage.get(TOKEN_KEY)?.filter(|t| !t.is_empty()) else {
        return Ok(None);
    };
    let Some(profile_json) = storage.get(USER_KEY)? else {
        warn!("Persisted token has no profile; ignoring it");
        return Ok(None);
    };
    let profile: UserProfile = serde_json::from_str(&profile_json)?;
    let logged_in_at = storage
        .get(LOGGED_IN_AT_KEY)?
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&Utc));

    Ok(Some(Session {
        credential,
        profile,
        logged_in_at,
    }))
}
