//! Customer-facing operations: catalogue, orders, account, newsletter.

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use std::sync::Arc;

use serde_json::{Value, json};

use super::{endpoints, to_body};
use super::types::{ChangePassword, ListEnvelope, Order, PaymentSettings, PlaceOrder, Product, UserProfile, UserStats};
use crate::http::{ApiClient, ApiError, RequestOptions};

/// Filters for `GET /products`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductQuery {
    pub category: Option<String>,
    pub limit: Option<u32>,
}

pub struct StoreApi {
    api: Arc<ApiClient>,
}

impl StoreApi {
    #[must_use]
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// # Errors
    ///
    /// Fails on transport errors, non-2xx responses, or an unrecognized list shape.
    pub async fn list_products(&self, query: &ProductQuery) -> Result<Vec<Product>, ApiError> {
        let mut options = RequestOptions::get().no_cache();
        if let Some(category) = query.category.as_deref().filter(|c| !c.is_empty()) {
            options = options.with_query("category", category);
        }
        if let Some(limit) = query.limit {
            options = options.with_query("limit", limit);
        }
        let products = self.api.request::<ListEnvelope<Product>>(endpoints::PRODUCTS, options).await?.into_vec();
        tracing::debug!(count = products.len(), "loaded products");
        Ok(products)
    }

    /// # Errors
    ///
    /// See [`StoreApi::list_products`].
    pub async fn get_product(&self, id: &str) -> Result<Product, ApiError> {
        self.api.request(&endpoints::product_detail(id), RequestOptions::get()).await
    }

    /// # Errors
    ///
    /// See [`StoreApi::list_products`].
    pub async fn place_order(&self, order: &PlaceOrder) -> Result<Order, ApiError> {
        let body = to_body(order)?;
        let order: Order = self.api.request(endpoints::ORDERS, RequestOptions::post(body)).await?;
        tracing::info!(order_id = %order.id, total = order.total_amount, "order placed");
        Ok(order)
    }

    /// # Errors
    ///
    /// See [`StoreApi::list_products`].
    pub async fn list_orders(&self) -> Result<Vec<Order>, ApiError> {
        let orders = self.api.request::<ListEnvelope<Order>>(endpoints::ORDERS, RequestOptions::get()).await?;
        Ok(orders.into_vec())
    }

    /// # Errors
    ///
    /// See [`StoreApi::list_products`].
    pub async fn get_order(&self, id: &str) -> Result<Order, ApiError> {
        self.api.request(&endpoints::order_detail(id), RequestOptions::get()).await
    }

    /// Account statistics. A 404 (no orders yet on some backends) reads as zeroes.
    ///
    /// # Errors
    ///
    /// Other failures propagate.
    pub async fn user_stats(&self) -> Result<UserStats, ApiError> {
        match self.api.request::<Option<UserStats>>(endpoints::USER_STATS, RequestOptions::get()).await {
            Ok(stats) => Ok(stats.unwrap_or_default()),
            Err(ApiError::Status { status: 404, .. }) => Ok(UserStats::default()),
            Err(error) => Err(error),
        }
    }

    /// # Errors
    ///
    /// See [`StoreApi::list_products`].
    pub async fn profile(&self) -> Result<UserProfile, ApiError> {
        let profile: Option<UserProfile> = self.api.request(endpoints::USER_PROFILE, RequestOptions::get()).await?;
        Ok(profile.unwrap_or_default())
    }

    /// # Errors
    ///
    /// See [`StoreApi::list_products`].
    pub async fn update_profile(&self, profile: &UserProfile) -> Result<Value, ApiError> {
        let body = to_body(profile)?;
        self.api.request(endpoints::USER_PROFILE, RequestOptions::put(body)).await
    }

    /// # Errors
    ///
    /// See [`StoreApi::list_products`].
    pub async fn change_password(&self, change: &ChangePassword) -> Result<Value, ApiError> {
        let body = to_body(change)?;
        self.api.request(endpoints::CHANGE_PASSWORD, RequestOptions::put(body)).await
    }

    /// # Errors
    ///
    /// Rejects an address without `@` locally; otherwise see [`StoreApi::list_products`].
    pub async fn subscribe_newsletter(&self, email: &str) -> Result<Value, ApiError> {
        let email = email.trim().to_lowercase();
        if !email.contains('@') {
            return Err(ApiError::InvalidRequest("Please enter a valid email address".into()));
        }
        let options = RequestOptions::post(json!({ "email": email })).anonymous();
        self.api.request(endpoints::NEWSLETTER_SUBSCRIBE, options).await
    }

    /// # Errors
    ///
    /// See [`StoreApi::list_products`].
    pub async fn payment_settings(&self) -> Result<PaymentSettings, ApiError> {
        let settings: Option<PaymentSettings> = self.api.request(endpoints::PAYMENT_SETTINGS, RequestOptions::get()).await?;
        Ok(settings.unwrap_or_default())
    }

    /// # Errors
    ///
    /// See [`StoreApi::list_products`].
    pub async fn update_payment_settings(&self, settings: &PaymentSettings) -> Result<PaymentSettings, ApiError> {
        let body = Value::Object(settings.clone());
        let updated: Option<PaymentSettings> =
            self.api.request(endpoints::PAYMENT_SETTINGS, RequestOptions::put(body)).await?;
        Ok(updated.unwrap_or_else(|| settings.clone()))
    }
}
