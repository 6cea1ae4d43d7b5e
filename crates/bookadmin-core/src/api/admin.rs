//! Admin endpoint surface.
//!
//! Thin wrappers over the generic verbs on `ApiClient`, one per backend
//! route used by the dashboard. Responses are returned as the raw envelope;
//! callers that want typed data go through `Envelope::from_value`.

use std::fmt::Display;

use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;

use crate::models::{
    BookingStatusUpdate, ImageKind, ListFilters, LoginData, UserStatus, VerificationUpdate,
};

use super::envelope::Envelope;
use super::request::{FileUpload, Method, MultipartForm, Request};
use super::{ApiClient, ApiError};

impl ApiClient {
    // ===== Auth =====

    /// Log in with phone number and password.
    /// On success the returned token is installed on this client.
    /// A `success: false` envelope is returned as-is, without `data`.
    pub async fn login(
        &self,
        phone_number: &str,
        password: &str,
    ) -> Result<Envelope<LoginData>, ApiError> {
        let value = self
            .post(
                "/auth/login",
                &json!({ "phone_number": phone_number, "password": password }),
            )
            .await?;

        let envelope: Envelope<Value> = Envelope::from_value(value)?;
        if !envelope.success {
            return Ok(Envelope {
                success: false,
                message: envelope.message,
                data: None,
            });
        }

        let message = envelope.message.clone();
        let data: LoginData = serde_json::from_value(envelope.into_data()?)
            .map_err(|e| ApiError::ContractViolation(format!("login data: {}", e)))?;
        self.set_auth_token(data.token.clone());
        info!(user_id = %data.user_id, user_type = %data.user_type, "Authenticated");

        Ok(Envelope {
            success: true,
            message,
            data: Some(data),
        })
    }

    pub async fn register<B: Serialize + ?Sized>(&self, user: &B) -> Result<Value, ApiError> {
        self.post("/auth/register", user).await
    }

    pub async fn get_profile(&self) -> Result<Value, ApiError> {
        self.get("/auth/profile", no_query()).await
    }

    pub async fn update_profile<B: Serialize + ?Sized>(&self, profile: &B) -> Result<Value, ApiError> {
        self.put("/auth/profile", profile).await
    }

    // ===== Dashboard =====

    pub async fn get_dashboard_stats(&self) -> Result<Value, ApiError> {
        self.get("/admin/dashboard/stats", no_query()).await
    }

    // ===== Users =====

    pub async fn get_all_users(&self, filters: &ListFilters) -> Result<Value, ApiError> {
        self.get("/admin/users", filters.to_query()).await
    }

    pub async fn get_user_by_id(&self, user_id: impl Display) -> Result<Value, ApiError> {
        self.get(&format!("/admin/users/{}", user_id), no_query()).await
    }

    pub async fn create_admin<B: Serialize + ?Sized>(&self, admin: &B) -> Result<Value, ApiError> {
        self.post("/admin/users/admin", admin).await
    }

    pub async fn update_user_status(
        &self,
        user_id: impl Display,
        status: UserStatus,
    ) -> Result<Value, ApiError> {
        self.put(
            &format!("/admin/users/{}/status", user_id),
            &json!({ "status": status }),
        )
        .await
    }

    pub async fn delete_user(&self, user_id: impl Display) -> Result<Value, ApiError> {
        self.delete(&format!("/admin/users/{}", user_id)).await
    }

    // ===== Vendors =====

    pub async fn get_all_vendors(&self, filters: &ListFilters) -> Result<Value, ApiError> {
        self.get("/admin/vendors", filters.to_query()).await
    }

    pub async fn get_vendor_by_id(&self, vendor_id: impl Display) -> Result<Value, ApiError> {
        self.get(&format!("/admin/vendors/{}", vendor_id), no_query()).await
    }

    pub async fn update_vendor_verification(
        &self,
        vendor_id: impl Display,
        update: &VerificationUpdate,
    ) -> Result<Value, ApiError> {
        self.put(&format!("/admin/vendors/{}/verification", vendor_id), update)
            .await
    }

    /// Create a vendor account together with its shop
    pub async fn create_vendor_with_shop<B: Serialize + ?Sized>(
        &self,
        vendor: &B,
    ) -> Result<Value, ApiError> {
        self.post("/admin/vendors", vendor).await
    }

    pub async fn update_vendor_shop_details<B: Serialize + ?Sized>(
        &self,
        user_id: impl Display,
        shop: &B,
    ) -> Result<Value, ApiError> {
        self.put(&format!("/admin/vendors/{}/shop", user_id), shop).await
    }

    // ===== Shops =====

    pub async fn get_all_shops(&self, filters: &ListFilters) -> Result<Value, ApiError> {
        self.get("/admin/shops", filters.to_query()).await
    }

    pub async fn get_shop_by_id(&self, shop_id: impl Display) -> Result<Value, ApiError> {
        self.get(&format!("/admin/shops/{}", shop_id), no_query()).await
    }

    pub async fn create_shop<B: Serialize + ?Sized>(&self, shop: &B) -> Result<Value, ApiError> {
        self.post("/admin/shops", shop).await
    }

    pub async fn update_shop<B: Serialize + ?Sized>(
        &self,
        shop_id: impl Display,
        shop: &B,
    ) -> Result<Value, ApiError> {
        self.put(&format!("/admin/shops/{}", shop_id), shop).await
    }

    pub async fn delete_shop(&self, shop_id: impl Display) -> Result<Value, ApiError> {
        self.delete(&format!("/admin/shops/{}", shop_id)).await
    }

    pub async fn update_shop_verification(
        &self,
        shop_id: impl Display,
        update: &VerificationUpdate,
    ) -> Result<Value, ApiError> {
        self.put(&format!("/admin/shops/{}/verification", shop_id), update)
            .await
    }

    // ===== Shop images =====

    pub async fn upload_shop_profile_image(
        &self,
        user_id: impl Display,
        image: FileUpload,
    ) -> Result<Value, ApiError> {
        let form = MultipartForm::new()
            .file("image", image)
            .text("type", ImageKind::Profile.as_str());
        self.upload_with(
            Method::Put,
            &format!("/admin/vendors/{}/shop/profile-image", user_id),
            form,
        )
        .await
    }

    pub async fn upload_shop_gallery_images(
        &self,
        user_id: impl Display,
        images: Vec<FileUpload>,
    ) -> Result<Value, ApiError> {
        if images.is_empty() {
            return Err(ApiError::InvalidRequest("no images to upload".to_string()));
        }
        let form = images
            .into_iter()
            .fold(MultipartForm::new(), |form, image| form.file("images", image));
        self.upload(&format!("/admin/vendors/{}/shop/gallery-images", user_id), form)
            .await
    }

    pub async fn delete_shop_image(
        &self,
        user_id: impl Display,
        image_id: impl Display,
        kind: ImageKind,
    ) -> Result<Value, ApiError> {
        self.request(
            Request::new(
                Method::Delete,
                format!("/admin/vendors/{}/shop/images/{}", user_id, image_id),
            )
            .query([("type", kind.as_str())]),
        )
        .await
    }

    pub async fn set_shop_primary_image(
        &self,
        user_id: impl Display,
        image_id: impl Display,
    ) -> Result<Value, ApiError> {
        self.put(
            &format!("/admin/vendors/{}/shop/images/{}/primary", user_id, image_id),
            &json!({}),
        )
        .await
    }

    // ===== Vendor documents =====

    pub async fn get_vendor_documents(&self, vendor_id: impl Display) -> Result<Value, ApiError> {
        self.get(&format!("/admin/vendors/{}/documents", vendor_id), no_query())
            .await
    }

    pub async fn upload_vendor_document(
        &self,
        vendor_id: impl Display,
        document: FileUpload,
        document_type: &str,
    ) -> Result<Value, ApiError> {
        let form = MultipartForm::new()
            .file("document", document)
            .text("document_type", document_type);
        self.upload(&format!("/admin/vendors/{}/documents", vendor_id), form)
            .await
    }

    pub async fn update_document_verification(
        &self,
        document_id: impl Display,
        update: &VerificationUpdate,
    ) -> Result<Value, ApiError> {
        self.put(&format!("/admin/documents/{}/verification", document_id), update)
            .await
    }

    pub async fn delete_vendor_document(&self, document_id: impl Display) -> Result<Value, ApiError> {
        self.delete(&format!("/admin/documents/{}", document_id)).await
    }

    pub async fn approve_all_documents(
        &self,
        vendor_id: impl Display,
        admin_comments: Option<&str>,
    ) -> Result<Value, ApiError> {
        self.put(
            &format!("/admin/vendors/{}/documents/approve-all", vendor_id),
            &json!({ "admin_comments": admin_comments }),
        )
        .await
    }

    // ===== Services =====

    pub async fn get_all_services(&self, filters: &ListFilters) -> Result<Value, ApiError> {
        self.get("/admin/services", filters.to_query()).await
    }

    pub async fn get_service_by_id(&self, service_id: impl Display) -> Result<Value, ApiError> {
        self.get(&format!("/admin/services/{}", service_id), no_query())
            .await
    }

    pub async fn create_service<B: Serialize + ?Sized>(&self, service: &B) -> Result<Value, ApiError> {
        self.post("/admin/services", service).await
    }

    pub async fn update_service<B: Serialize + ?Sized>(
        &self,
        service_id: impl Display,
        service: &B,
    ) -> Result<Value, ApiError> {
        self.put(&format!("/admin/services/{}", service_id), service).await
    }

    pub async fn delete_service(&self, service_id: impl Display) -> Result<Value, ApiError> {
        self.delete(&format!("/admin/services/{}", service_id)).await
    }

    pub async fn toggle_service_availability(
        &self,
        service_id: impl Display,
        is_available: bool,
    ) -> Result<Value, ApiError> {
        self.put(
            &format!("/admin/services/{}/availability", service_id),
            &json!({ "is_available": is_available }),
        )
        .await
    }

    // ===== Bookings =====

    /// List bookings. Booking-specific filters (`booking_status`,
    /// `payment_status`, `date_from`, `date_to`) go in `ListFilters::with`.
    pub async fn get_all_bookings(&self, filters: &ListFilters) -> Result<Value, ApiError> {
        self.get("/admin/bookings", filters.to_query()).await
    }

    pub async fn get_booking_by_id(&self, booking_id: impl Display) -> Result<Value, ApiError> {
        self.get(&format!("/admin/bookings/{}", booking_id), no_query())
            .await
    }

    pub async fn create_booking<B: Serialize + ?Sized>(&self, booking: &B) -> Result<Value, ApiError> {
        self.post("/admin/bookings", booking).await
    }

    pub async fn update_booking_status(
        &self,
        booking_id: impl Display,
        update: &BookingStatusUpdate,
    ) -> Result<Value, ApiError> {
        self.put(&format!("/admin/bookings/{}/status", booking_id), update)
            .await
    }

    /// Cancel on behalf of the admin. A reason is required.
    pub async fn cancel_booking(
        &self,
        booking_id: impl Display,
        reason: &str,
    ) -> Result<Value, ApiError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(ApiError::InvalidRequest(
                "a cancellation reason is required".to_string(),
            ));
        }
        info!(booking_id = %booking_id, "Cancelling booking");
        self.put(
            &format!("/admin/bookings/{}/cancel", booking_id),
            &json!({ "cancellation_reason": reason, "cancelled_by": "admin" }),
        )
        .await
    }

    /// Services a vendor offers, for building a booking
    pub async fn get_vendor_services_for_booking(
        &self,
        vendor_id: impl Display,
    ) -> Result<Value, ApiError> {
        self.get(&format!("/admin/vendors/{}/services", vendor_id), no_query())
            .await
    }

    // ===== Categories =====

    pub async fn get_all_categories(&self, filters: &ListFilters) -> Result<Value, ApiError> {
        self.get("/admin/categories", filters.to_query()).await
    }

    pub async fn get_category_by_id(&self, category_id: impl Display) -> Result<Value, ApiError> {
        self.get(&format!("/admin/categories/{}", category_id), no_query())
            .await
    }

    pub async fn create_category<B: Serialize + ?Sized>(&self, category: &B) -> Result<Value, ApiError> {
        self.post("/admin/categories", category).await
    }

    pub async fn update_category<B: Serialize + ?Sized>(
        &self,
        category_id: impl Display,
        category: &B,
    ) -> Result<Value, ApiError> {
        self.put(&format!("/admin/categories/{}", category_id), category)
            .await
    }

    pub async fn delete_category(&self, category_id: impl Display) -> Result<Value, ApiError> {
        self.delete(&format!("/admin/categories/{}", category_id)).await
    }
}

fn no_query() -> Vec<(String, String)> {
    Vec::new()
}
