//! SessionStore - single owner of the authentication session
//!
//! The store is the only writer. Everything else observes the session through
//! a [`SessionReader`], a watch-channel receiver that always yields the most
//! recent value.

use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::storage::{SessionStorage, StoredSession};

/// The identity a token was issued to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Credentials {
    token: String,
    user: User,
}

/// The client's view of who it is
///
/// Token and user are held together, so one can never be present without the
/// other.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    credentials: Option<Credentials>,
}

impl Session {
    /// An empty, unauthenticated session
    pub fn anonymous() -> Self {
        Self::default()
    }

    fn authenticated(token: String, username: String) -> Self {
        Self {
            credentials: Some(Credentials {
                token,
                user: User { username },
            }),
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.credentials.as_ref().map(|c| c.token.as_str())
    }

    pub fn user(&self) -> Option<&User> {
        self.credentials.as_ref().map(|c| &c.user)
    }

    pub fn username(&self) -> Option<&str> {
        self.user().map(|u| u.username.as_str())
    }

    pub fn is_authenticated(&self) -> bool {
        self.credentials.is_some()
    }
}

/// Read-only handle on the current session
#[derive(Debug, Clone)]
pub struct SessionReader {
    rx: watch::Receiver<Session>,
}

impl SessionReader {
    pub fn is_authenticated(&self) -> bool {
        self.rx.borrow().is_authenticated()
    }

    /// Current bearer token, if any
    pub fn token(&self) -> Option<String> {
        self.rx.borrow().token().map(str::to_string)
    }
}

/// Owner of the session and its durable copy
pub struct SessionStore {
    tx: watch::Sender<Session>,
    storage: Box<dyn SessionStorage>,
    /// False once storage has failed; the session then lives in memory only
    persistent: bool,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("session", &*self.tx.borrow())
            .field("persistent", &self.persistent)
            .finish()
    }
}

impl SessionStore {
    /// Build the store from whatever the storage holds
    ///
    /// The persisted token is trusted as-is; an expired token is only
    /// discovered when an authenticated call is rejected.
    pub fn initialize(storage: impl SessionStorage + 'static) -> Self {
        debug!("SessionStore::initialize: called");
        let (session, persistent) = match storage.load() {
            Ok(Some(StoredSession { token, username })) => {
                info!(%username, "Restored persisted session");
                (Session::authenticated(token, username), true)
            }
            Ok(None) => {
                debug!("SessionStore::initialize: no persisted session");
                (Session::anonymous(), true)
            }
            Err(e) => {
                warn!(error = %e, "Session storage unreadable, continuing with in-memory session");
                (Session::anonymous(), false)
            }
        };

        let (tx, _) = watch::channel(session);
        Self {
            tx,
            storage: Box::new(storage),
            persistent,
        }
    }

    /// A reader that follows this store
    pub fn reader(&self) -> SessionReader {
        SessionReader {
            rx: self.tx.subscribe(),
        }
    }

    /// Snapshot of the current session
    pub fn session(&self) -> Session {
        self.tx.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.tx.borrow().is_authenticated()
    }

    /// Whether writes still reach durable storage
    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    /// Establish a session for `username` holding `token`
    pub fn login(&mut self, token: impl Into<String>, username: impl Into<String>) {
        let token = token.into();
        let username = username.into();
        debug!(%username, "SessionStore::login: called");

        if self.persistent {
            let stored = StoredSession {
                token: token.clone(),
                username: username.clone(),
            };
            if let Err(e) = self.storage.save(&stored) {
                warn!(error = %e, "Failed to persist session, continuing in memory only");
                self.persistent = false;
                // The write may have landed before the error; leave nothing behind
                if let Err(e) = self.storage.clear() {
                    warn!(error = %e, "Failed to remove partly persisted session");
                }
            }
        }

        self.tx.send_replace(Session::authenticated(token, username.clone()));
        info!(%username, "Logged in");
    }

    /// Drop the session, locally only
    ///
    /// The persisted entry is removed even after storage has degraded, since
    /// an earlier failed save may still have left a token on disk.
    pub fn logout(&mut self) {
        debug!("SessionStore::logout: called");
        if let Err(e) = self.storage.clear() {
            warn!(error = %e, "Failed to clear persisted session, continuing in memory only");
            self.persistent = false;
        }

        let previous = self.tx.send_replace(Session::anonymous());
        if let Some(username) = previous.username() {
            info!(%username, "Logged out");
        }
    }
}
