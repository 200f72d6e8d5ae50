//! Session state holder.
//!
//! `SessionManager` is the single source of truth for the current credential
//! triple (access token, refresh token, username). The triple is swapped as a
//! unit under one lock and written through to durable storage on every
//! commit and clear. Authentication is derived from the access token's
//! embedded expiry on every read, so a token that silently expired is
//! reported as signed out without any timer.

use crate::token;
use catalog_storage::SessionStore;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::RwLock;
use tracing::{debug, info, warn};

/// Change notifications for observers of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A login, registration, or refresh committed new credentials.
    SignedIn { username: String },
    /// The session was cleared. Observers showing protected content should
    /// navigate away.
    SignedOut,
}

/// Callback type for session change notifications.
pub type SessionCallback = Box<dyn Fn(&SessionEvent) + Send + Sync>;

/// Read-only view of the session for status reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub authenticated: bool,
    pub username: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
struct Credentials {
    access_token: Option<String>,
    refresh_token: Option<String>,
    username: Option<String>,
}

/// Owns the live credential pair.
pub struct SessionManager {
    store: SessionStore,
    state: RwLock<Credentials>,
    subscribers: RwLock<Vec<SessionCallback>>,
}

impl SessionManager {
    /// Create a session manager, restoring any persisted credentials.
    ///
    /// A storage read failure starts an empty session rather than failing.
    pub fn new(store: SessionStore) -> Self {
        let restored = match Self::restore(&store) {
            Ok(credentials) => credentials,
            Err(e) => {
                warn!(error = %e, "Failed to restore persisted session, starting signed out");
                Credentials::default()
            }
        };

        debug!(
            has_access_token = restored.access_token.is_some(),
            username = ?restored.username,
            "Session restored"
        );

        Self {
            store,
            state: RwLock::new(restored),
            subscribers: RwLock::new(Vec::new()),
        }
    }

    fn restore(store: &SessionStore) -> catalog_storage::StorageResult<Credentials> {
        Ok(match store.load_session()? {
            Some(stored) => Credentials {
                access_token: Some(stored.access_token),
                refresh_token: Some(stored.refresh_token),
                username: Some(stored.user),
            },
            None => Credentials::default(),
        })
    }

    /// Register an observer for session changes.
    ///
    /// Callbacks run synchronously after the change is applied and must not
    /// call `subscribe` themselves.
    pub fn subscribe(&self, callback: SessionCallback) {
        self.subscribers.write().push(callback);
    }

    fn notify(&self, event: &SessionEvent) {
        for callback in self.subscribers.read().iter() {
            callback(event);
        }
    }

    pub fn get_access_token(&self) -> Option<String> {
        self.state.read().access_token.clone()
    }

    pub fn get_refresh_token(&self) -> Option<String> {
        self.state.read().refresh_token.clone()
    }

    pub fn current_user(&self) -> Option<String> {
        self.state.read().username.clone()
    }

    /// True iff an access token is present and not yet expired.
    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated_at(Utc::now().timestamp_millis())
    }

    /// Same as [`is_authenticated`](Self::is_authenticated) against an explicit clock.
    pub fn is_authenticated_at(&self, now_millis: i64) -> bool {
        self.state
            .read()
            .access_token
            .as_deref()
            .is_some_and(|t| token::is_token_valid_at(t, now_millis))
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.read();
        let expires_at = state
            .access_token
            .as_deref()
            .and_then(token::expiry_millis)
            .and_then(|ms| Utc.timestamp_millis_opt(ms as i64).single());

        SessionSnapshot {
            authenticated: state
                .access_token
                .as_deref()
                .is_some_and(|t| token::is_token_valid_at(t, Utc::now().timestamp_millis())),
            username: state.username.clone(),
            expires_at,
        }
    }

    /// Replace the credential triple and persist it.
    ///
    /// Persistence is best-effort: a storage failure is logged and the
    /// session stays valid in memory for this run.
    pub fn commit_session(&self, access_token: &str, refresh_token: &str, username: &str) {
        {
            let mut state = self.state.write();
            *state = Credentials {
                access_token: Some(access_token.to_string()),
                refresh_token: Some(refresh_token.to_string()),
                username: Some(username.to_string()),
            };

            if let Err(e) = self
                .store
                .set_session(access_token, refresh_token, username)
            {
                warn!(error = %e, "Failed to persist session, continuing with in-memory session");
            }
        }

        info!(
            username = %username,
            access_token = %token::mask_token(access_token),
            "Session committed"
        );
        self.notify(&SessionEvent::SignedIn {
            username: username.to_string(),
        });
    }

    /// Clear the credential triple and the persisted copy.
    pub fn clear_session(&self) {
        {
            let mut state = self.state.write();
            *state = Credentials::default();

            if let Err(e) = self.store.clear_session() {
                warn!(error = %e, "Failed to clear persisted session");
            }
        }

        info!("Session cleared");
        self.notify(&SessionEvent::SignedOut);
    }
}
