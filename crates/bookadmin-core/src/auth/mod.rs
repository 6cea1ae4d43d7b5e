//! Authentication module for managing the admin session.
//!
//! This module provides:
//! - `SessionStore`: login/logout, restore on startup, local expiry checks,
//!   and a watch channel carrying the current `SessionState`
//! - `SessionStorage`: where the session is persisted (file, OS keychain,
//!   or memory)
//! - `token`: JWT `exp` decoding without contacting the server

pub mod error;
pub mod session;
pub mod storage;
pub mod token;

pub use error::AuthError;
pub use session::{SessionState, SessionStore};
pub use storage::{
    FileStorage, KeyringStorage, MemoryStorage, SessionStorage, StorageError, TOKEN_KEY, USER_KEY,
};
