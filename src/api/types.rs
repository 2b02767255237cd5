//! Wire types for storefront and admin endpoints.
//!
//! The backend is loose about shapes: ids arrive as `_id`, lists arrive bare
//! or wrapped, and many numeric fields are simply absent on fresh stores.
//! Every type here defaults missing fields rather than failing the decode.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::Date;

use crate::auth::service::MIN_PASSWORD_LEN;
use crate::cart::CartItem;
use crate::http::ApiError;

// =============================================================================
// LISTS
// =============================================================================

/// A list response in any of the shapes the backend uses.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ListEnvelope<T> {
    Bare(Vec<T>),
    Data { data: Vec<T> },
    Products { products: Vec<T> },
    Orders { orders: Vec<T> },
    Users { users: Vec<T> },
}

impl<T> ListEnvelope<T> {
    #[must_use]
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::Bare(items)
            | Self::Data { data: items }
            | Self::Products { products: items }
            | Self::Orders { orders: items }
            | Self::Users { users: items } => items,
        }
    }
}

// =============================================================================
// PRODUCTS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Body for admin product create/update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<u32>,
}

impl ProductInput {
    /// # Errors
    ///
    /// Rejects an empty name or a negative/non-finite price.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.name.trim().is_empty() {
            return Err(ApiError::InvalidRequest("Product name is required".into()));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(ApiError::InvalidRequest("Price must be a non-negative number".into()));
        }
        Ok(())
    }
}

// =============================================================================
// ORDERS
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    #[serde(other)]
    Unknown,
}

impl OrderStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}

/// An order line's product: either an id or the populated document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProductRef {
    Id(String),
    Populated(Box<Product>),
}

impl ProductRef {
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Id(id) => id,
            Self::Populated(product) => &product.id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product: ProductRef,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default)]
    pub quantity: u32,
    #[serde(default)]
    pub price: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShippingAddress {
    pub name: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub total_amount: f64,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_address: Option<ShippingAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Body for `POST /orders`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrder {
    pub items: Vec<OrderItem>,
    pub shipping_address: ShippingAddress,
    pub payment_method: String,
    pub total_amount: f64,
}

impl PlaceOrder {
    /// Build an order from cart lines; the total is recomputed from the lines.
    ///
    /// # Errors
    ///
    /// Rejects an empty cart.
    pub fn from_cart(lines: &[CartItem], shipping_address: ShippingAddress, payment_method: &str) -> Result<Self, ApiError> {
        if lines.is_empty() {
            return Err(ApiError::InvalidRequest("Cart is empty".into()));
        }
        let items: Vec<OrderItem> = lines
            .iter()
            .map(|line| OrderItem {
                product: ProductRef::Id(line.product_id.clone()),
                name: line.name.clone(),
                size: Some(line.size.clone()).filter(|size| !size.is_empty()),
                quantity: line.quantity,
                price: line.price,
            })
            .collect();
        let total_amount = lines.iter().map(CartItem::line_total).sum();
        Ok(Self { items, shipping_address, payment_method: payment_method.to_owned(), total_amount })
    }
}

// =============================================================================
// ACCOUNT
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserStats {
    pub total_orders: u64,
    pub total_spent: f64,
    pub member_since: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
}

/// Body for `PUT /users/change-password`. The confirmation never leaves the client.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePassword {
    current_password: String,
    new_password: String,
}

impl ChangePassword {
    /// # Errors
    ///
    /// Fails locally when the confirmation differs or the new password is too short.
    pub fn new(current: &str, new: &str, confirm: &str) -> Result<Self, ApiError> {
        if new != confirm {
            return Err(ApiError::InvalidRequest("New passwords do not match".into()));
        }
        if new.chars().count() < MIN_PASSWORD_LEN {
            return Err(ApiError::InvalidRequest("New password must be at least 6 characters long".into()));
        }
        Ok(Self { current_password: current.to_owned(), new_password: new.to_owned() })
    }
}

impl fmt::Debug for ChangePassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ChangePassword { .. }")
    }
}

// =============================================================================
// ADMIN
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardStats {
    pub total_products: u64,
    pub total_orders: u64,
    pub total_users: u64,
    pub total_revenue: f64,
    pub recent_orders: Vec<Order>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Analytics {
    pub total_revenue: f64,
    pub total_orders: u64,
    pub total_users: u64,
    pub average_order_value: f64,
    pub sales_data: Vec<Value>,
    pub user_growth: Vec<Value>,
    pub top_products: Vec<Value>,
    pub revenue_by_month: Vec<Value>,
    pub order_status: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_revenue: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_orders: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_order_value: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Reports {
    pub sales_report: ReportData,
    pub inventory_report: ReportData,
    pub customer_report: ReportData,
    pub order_report: ReportData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Sales,
    Inventory,
    Customer,
    Order,
}

impl ReportKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sales => "sales",
            Self::Inventory => "inventory",
            Self::Customer => "customer",
            Self::Order => "order",
        }
    }
}

impl FromStr for ReportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sales" => Ok(Self::Sales),
            "inventory" => Ok(Self::Inventory),
            "customer" => Ok(Self::Customer),
            "order" => Ok(Self::Order),
            other => Err(format!("unknown report type: {other}")),
        }
    }
}

/// Window for analytics and reports, as the backend spells it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimeRange {
    SevenDays,
    #[default]
    ThirtyDays,
    NinetyDays,
    OneYear,
    Custom,
}

impl TimeRange {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SevenDays => "7days",
            Self::ThirtyDays => "30days",
            Self::NinetyDays => "90days",
            Self::OneYear => "1year",
            Self::Custom => "custom",
        }
    }
}

impl FromStr for TimeRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "7days" => Ok(Self::SevenDays),
            "30days" => Ok(Self::ThirtyDays),
            "90days" => Ok(Self::NinetyDays),
            "1year" => Ok(Self::OneYear),
            "custom" => Ok(Self::Custom),
            other => Err(format!("unknown time range: {other}")),
        }
    }
}

/// A downloaded CSV report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedReport {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// `{type}-report-{YYYY-MM-DD}.csv`
#[must_use]
pub fn report_file_name(kind: ReportKind, date: Date) -> String {
    format!("{}-report-{date}.csv", kind.as_str())
}

// =============================================================================
// SETTINGS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SiteSettings {
    pub site_name: String,
    pub site_description: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub address: String,
    pub social_media: SocialMedia,
    pub business_hours: BusinessHours,
    pub shipping_settings: ShippingSettings,
    pub tax_settings: TaxSettings,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            site_name: "Storefront".into(),
            site_description: "Premium fashion and lifestyle products".into(),
            contact_email: String::new(),
            contact_phone: String::new(),
            address: String::new(),
            social_media: SocialMedia::default(),
            business_hours: BusinessHours::default(),
            shipping_settings: ShippingSettings::default(),
            tax_settings: TaxSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialMedia {
    pub facebook: String,
    pub instagram: String,
    pub twitter: String,
    pub whatsapp: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusinessHours {
    pub monday: String,
    pub tuesday: String,
    pub wednesday: String,
    pub thursday: String,
    pub friday: String,
    pub saturday: String,
    pub sunday: String,
}

impl Default for BusinessHours {
    fn default() -> Self {
        let weekday = || "9:00 AM - 6:00 PM".to_owned();
        Self {
            monday: weekday(),
            tuesday: weekday(),
            wednesday: weekday(),
            thursday: weekday(),
            friday: weekday(),
            saturday: "10:00 AM - 4:00 PM".into(),
            sunday: "Closed".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShippingSettings {
    pub free_shipping_threshold: f64,
    pub standard_shipping_cost: f64,
    pub express_shipping_cost: f64,
}

impl Default for ShippingSettings {
    fn default() -> Self {
        Self { free_shipping_threshold: 1000.0, standard_shipping_cost: 50.0, express_shipping_cost: 100.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaxSettings {
    pub tax_rate: f64,
    pub tax_included: bool,
}

impl Default for TaxSettings {
    fn default() -> Self {
        Self { tax_rate: 18.0, tax_included: true }
    }
}

/// Payment gateway settings are opaque to the client.
pub type PaymentSettings = Map<String, Value>;
