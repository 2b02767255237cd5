//! Admin panel operations. Every call requires an admin bearer token; a 401
//! clears the session like any other request.

#[cfg(test)]
#[path = "admin_test.rs"]
mod admin_test;

use std::sync::Arc;

use serde_json::{Value, json};
use time::{Date, OffsetDateTime};

use super::{endpoints, to_body};
use super::types::{
    Analytics, DashboardStats, ExportedReport, ListEnvelope, Order, OrderStatus, Product, ProductInput, ReportKind,
    Reports, SiteSettings, TimeRange, report_file_name,
};
use crate::http::{ApiClient, ApiError, RequestOptions};
use crate::session::User;

pub struct AdminApi {
    api: Arc<ApiClient>,
}

impl AdminApi {
    #[must_use]
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// # Errors
    ///
    /// Fails on transport errors or non-2xx responses.
    pub async fn dashboard_stats(&self) -> Result<DashboardStats, ApiError> {
        let stats: Option<DashboardStats> = self.api.request(endpoints::ADMIN_DASHBOARD, RequestOptions::get()).await?;
        Ok(stats.unwrap_or_default())
    }

    // -------------------------------------------------------------------------
    // products
    // -------------------------------------------------------------------------

    /// # Errors
    ///
    /// See [`AdminApi::dashboard_stats`].
    pub async fn list_products(&self) -> Result<Vec<Product>, ApiError> {
        let options = RequestOptions::get().no_cache();
        let products = self.api.request::<ListEnvelope<Product>>(endpoints::ADMIN_PRODUCTS, options).await?;
        Ok(products.into_vec())
    }

    /// # Errors
    ///
    /// Input is validated locally first; see [`AdminApi::dashboard_stats`].
    pub async fn create_product(&self, input: &ProductInput) -> Result<Product, ApiError> {
        input.validate()?;
        let product: Product = self.api.request(endpoints::ADMIN_PRODUCTS, RequestOptions::post(to_body(input)?)).await?;
        tracing::info!(product_id = %product.id, "product created");
        Ok(product)
    }

    /// # Errors
    ///
    /// See [`AdminApi::create_product`].
    pub async fn update_product(&self, id: &str, input: &ProductInput) -> Result<Product, ApiError> {
        input.validate()?;
        let options = RequestOptions::put(to_body(input)?);
        self.api.request(&endpoints::admin_product(id), options).await
    }

    /// # Errors
    ///
    /// See [`AdminApi::dashboard_stats`].
    pub async fn delete_product(&self, id: &str) -> Result<Value, ApiError> {
        let response: Value = self.api.request(&endpoints::admin_product(id), RequestOptions::delete()).await?;
        tracing::info!(product_id = %id, "product deleted");
        Ok(response)
    }

    // -------------------------------------------------------------------------
    // orders
    // -------------------------------------------------------------------------

    /// # Errors
    ///
    /// See [`AdminApi::dashboard_stats`].
    pub async fn list_orders(&self) -> Result<Vec<Order>, ApiError> {
        let orders = self.api.request::<ListEnvelope<Order>>(endpoints::ADMIN_ORDERS, RequestOptions::get()).await?;
        Ok(orders.into_vec())
    }

    /// # Errors
    ///
    /// Rejects `OrderStatus::Unknown` locally; see [`AdminApi::dashboard_stats`].
    pub async fn update_order_status(&self, id: &str, status: OrderStatus) -> Result<Value, ApiError> {
        if status == OrderStatus::Unknown {
            return Err(ApiError::InvalidRequest("cannot set an unknown order status".into()));
        }
        let options = RequestOptions::put(json!({ "status": status.as_str() }));
        let response = self.api.request(&endpoints::admin_order_status(id), options).await?;
        tracing::info!(order_id = %id, %status, "order status updated");
        Ok(response)
    }

    // -------------------------------------------------------------------------
    // analytics and reports
    // -------------------------------------------------------------------------

    /// # Errors
    ///
    /// See [`AdminApi::dashboard_stats`].
    pub async fn analytics(&self, range: TimeRange) -> Result<Analytics, ApiError> {
        let options = RequestOptions::get().with_query("timeRange", range.as_str());
        let analytics: Option<Analytics> = self.api.request(endpoints::ADMIN_ANALYTICS, options).await?;
        Ok(analytics.unwrap_or_default())
    }

    /// # Errors
    ///
    /// See [`AdminApi::dashboard_stats`].
    pub async fn reports(&self, kind: ReportKind, range: TimeRange) -> Result<Reports, ApiError> {
        let options = report_query(kind, range);
        let reports: Option<Reports> = self.api.request(endpoints::ADMIN_REPORTS, options).await?;
        Ok(reports.unwrap_or_default())
    }

    /// Download a report as CSV, named for today's UTC date.
    ///
    /// # Errors
    ///
    /// See [`AdminApi::dashboard_stats`].
    pub async fn export_report(&self, kind: ReportKind, range: TimeRange) -> Result<ExportedReport, ApiError> {
        self.export_report_on(kind, range, OffsetDateTime::now_utc().date()).await
    }

    /// [`AdminApi::export_report`] with an explicit date for the file name.
    ///
    /// # Errors
    ///
    /// See [`AdminApi::dashboard_stats`].
    pub async fn export_report_on(&self, kind: ReportKind, range: TimeRange, date: Date) -> Result<ExportedReport, ApiError> {
        let bytes = self.api.request_bytes(endpoints::ADMIN_REPORTS_EXPORT, report_query(kind, range)).await?;
        let file_name = report_file_name(kind, date);
        tracing::info!(%file_name, size = bytes.len(), "report exported");
        Ok(ExportedReport { file_name, bytes })
    }

    // -------------------------------------------------------------------------
    // users
    // -------------------------------------------------------------------------

    /// # Errors
    ///
    /// See [`AdminApi::dashboard_stats`].
    pub async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        let users = self.api.request::<ListEnvelope<User>>(endpoints::ADMIN_USERS, RequestOptions::get()).await?;
        Ok(users.into_vec())
    }

    /// # Errors
    ///
    /// See [`AdminApi::dashboard_stats`].
    pub async fn set_admin_status(&self, user_id: &str, is_admin: bool) -> Result<Value, ApiError> {
        let options = RequestOptions::put(json!({ "isAdmin": is_admin }));
        let response = self.api.request(&endpoints::admin_user_admin_status(user_id), options).await?;
        tracing::info!(%user_id, is_admin, "admin status changed");
        Ok(response)
    }

    /// # Errors
    ///
    /// See [`AdminApi::dashboard_stats`].
    pub async fn delete_user(&self, user_id: &str) -> Result<Value, ApiError> {
        let response = self.api.request(&endpoints::admin_user(user_id), RequestOptions::delete()).await?;
        tracing::info!(%user_id, "user deleted");
        Ok(response)
    }

    // -------------------------------------------------------------------------
    // settings
    // -------------------------------------------------------------------------

    /// Site settings; fields the backend omits keep their default values.
    ///
    /// # Errors
    ///
    /// See [`AdminApi::dashboard_stats`].
    pub async fn settings(&self) -> Result<SiteSettings, ApiError> {
        let settings: Option<SiteSettings> = self.api.request(endpoints::ADMIN_SETTINGS, RequestOptions::get()).await?;
        Ok(settings.unwrap_or_default())
    }

    /// # Errors
    ///
    /// See [`AdminApi::dashboard_stats`].
    pub async fn update_settings(&self, settings: &SiteSettings) -> Result<Value, ApiError> {
        self.api.request(endpoints::ADMIN_SETTINGS, RequestOptions::put(to_body(settings)?)).await
    }
}

fn report_query(kind: ReportKind, range: TimeRange) -> RequestOptions {
    RequestOptions::get()
        .with_query("type", kind.as_str())
        .with_query("dateRange", range.as_str())
}
