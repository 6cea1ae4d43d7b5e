//! Data models shared by the API client and the session store.
//!
//! - `UserIdentity`, `UserId`, `LoginData`: the authenticated account
//! - `ListFilters`: page/limit/search query parameters for list endpoints
//! - `VerificationStatus`, `VerificationUpdate`, `UserStatus`, `ImageKind`:
//!   admin request payloads
//! - `BookingStatus`, `PaymentStatus`, `BookingStatusUpdate`: booking updates

pub mod admin;
pub mod user;

pub use admin::{
    BookingStatus, BookingStatusUpdate, ImageKind, ListFilters, PaymentStatus, UserStatus,
    VerificationStatus, VerificationUpdate,
};
pub use user::{LoginData, UserId, UserIdentity};
