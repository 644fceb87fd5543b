//! Authentication session
//!
//! [`SessionStore`] owns the session and its persisted copy; readers see it
//! through [`SessionReader`].

mod storage;
mod store;

pub use storage::{FileStorage, MemoryStorage, SessionStorage, StorageError, StoredSession};
pub use store::{Session, SessionReader, SessionStore, User};
