use thiserror::Error;

use crate::api::ApiError;

use super::storage::StorageError;

#[derive(Error, Debug)]
pub enum AuthError {
    /// The login call itself failed; passed through unchanged
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Login failed: {0}")]
    LoginRejected(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
