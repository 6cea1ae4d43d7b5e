use std::fmt;

use serde::{Deserialize, Serialize};

/// Review state of vendors, shops and vendor documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    Pending,
    Approved,
    Rejected,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Pending => "pending",
            VerificationStatus::Approved => "approved",
            VerificationStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Account status set through `/admin/users/{id}/status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Inactive,
    Suspended,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "active",
            UserStatus::Inactive => "inactive",
            UserStatus::Suspended => "suspended",
        }
    }
}

/// Body of the vendor, shop and document verification endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationUpdate {
    pub verification_status: VerificationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_comments: Option<String>,
}

impl VerificationUpdate {
    pub fn new(status: VerificationStatus) -> Self {
        Self {
            verification_status: status,
            admin_comments: None,
        }
    }

    pub fn with_comments(mut self, comments: impl Into<String>) -> Self {
        self.admin_comments = Some(comments.into());
        self
    }
}

/// Which shop image slot an image belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
    Profile,
    Gallery,
}

impl ImageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageKind::Profile => "profile",
            ImageKind::Gallery => "gallery",
        }
    }
}

/// Lifecycle of a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Confirmed,
    Completed,
    Cancelled,
    NoShow,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::NoShow => "no_show",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

/// Body of `/admin/bookings/{id}/status`. Unset fields are left alone
/// by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingStatusUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booking_status: Option<BookingStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<PaymentStatus>,
}

impl BookingStatusUpdate {
    pub fn booking(status: BookingStatus) -> Self {
        Self {
            booking_status: Some(status),
            payment_status: None,
        }
    }

    pub fn with_payment(mut self, status: PaymentStatus) -> Self {
        self.payment_status = Some(status);
        self
    }
}

/// Page/limit/search filters shared by every list endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilters {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
    pub status: Option<String>,
    pub extra: Vec<(String, String)>,
}

impl ListFilters {
    pub fn page(page: u32, limit: u32) -> Self {
        Self {
            page: Some(page),
            limit: Some(limit),
            ..Self::default()
        }
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.push((key.into(), value.into()));
        self
    }

    /// Query pairs in a stable order; blank search/status are dropped
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        if let Some(page) = self.page {
            query.push(("page".to_string(), page.to_string()));
        }
        if let Some(limit) = self.limit {
            query.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(search) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            query.push(("search".to_string(), search.to_string()));
        }
        if let Some(status) = self.status.as_deref().filter(|s| !s.is_empty()) {
            query.push(("status".to_string(), status.to_string()));
        }
        query.extend(self.extra.iter().cloned());
        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_list_filters_query_order() {
        let filters = ListFilters::page(2, 25)
            .with_search("  spa ")
            .with_status("active")
            .with("user_type", "vendor");
        assert_eq!(
            filters.to_query(),
            vec![
                ("page".to_string(), "2".to_string()),
                ("limit".to_string(), "25".to_string()),
                ("search".to_string(), "spa".to_string()),
                ("status".to_string(), "active".to_string()),
                ("user_type".to_string(), "vendor".to_string()),
            ]
        );
    }

    #[test]
    fn test_list_filters_drop_blank_values() {
        let filters = ListFilters::default().with_search("   ").with_status("");
        assert!(filters.to_query().is_empty());
    }

    #[test]
    fn test_verification_update_serialization() {
        let update = VerificationUpdate::new(VerificationStatus::Rejected).with_comments("blurry");
        assert_eq!(
            serde_json::to_value(&update).expect("serializes"),
            json!({ "verification_status": "rejected", "admin_comments": "blurry" })
        );

        let update = VerificationUpdate::new(VerificationStatus::Approved);
        assert_eq!(
            serde_json::to_value(&update).expect("serializes"),
            json!({ "verification_status": "approved" })
        );
    }

    #[test]
    fn test_status_strings_match_serde() {
        for status in [
            VerificationStatus::Pending,
            VerificationStatus::Approved,
            VerificationStatus::Rejected,
        ] {
            assert_eq!(serde_json::to_value(status).expect("serializes"), json!(status.as_str()));
        }
        assert_eq!(serde_json::to_value(UserStatus::Suspended).expect("serializes"), json!("suspended"));
        assert_eq!(ImageKind::Gallery.as_str(), "gallery");
    }

    #[test]
    fn test_booking_status_update_serialization() {
        let update = BookingStatusUpdate::booking(BookingStatus::NoShow).with_payment(PaymentStatus::Refunded);
        assert_eq!(
            serde_json::to_value(&update).expect("serializes"),
            json!({ "booking_status": "no_show", "payment_status": "refunded" })
        );

        let update = BookingStatusUpdate {
            payment_status: Some(PaymentStatus::Paid),
            ..BookingStatusUpdate::default()
        };
        assert_eq!(
            serde_json::to_value(&update).expect("serializes"),
            json!({ "payment_status": "paid" })
        );
        assert_eq!(BookingStatus::NoShow.as_str(), "no_show");
        assert_eq!(PaymentStatus::Failed.as_str(), "failed");
    }
}
