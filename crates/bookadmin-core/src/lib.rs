//! Core library for bookadmin.
//!
//! Client-side plumbing for the booking platform's admin API:
//!
//! - `api`: the `ApiClient` (base URL, bearer token, JSON and multipart
//!   requests, typed errors) and the admin endpoint wrappers
//! - `auth`: the `SessionStore` that logs in, persists and restores the
//!   session, and checks token expiry locally
//! - `config`: configuration file and environment resolution
//! - `models`: identity and admin payload types
//!
//! The client is built once and passed to whoever needs it; there is no
//! global instance. A 401 from any call drops the session and emits
//! `ClientEvent::SessionInvalidated`, which the application shell listens
//! for to send the user back to the login screen.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;

pub use api::{ApiClient, ApiError, ClientEvent, Envelope};
pub use auth::{AuthError, SessionState, SessionStore};
pub use config::Config;
