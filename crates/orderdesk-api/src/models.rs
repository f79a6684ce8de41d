use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use garde::Validate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use orderdesk_db::entities::{order, order_line_item, product, supplier, user, user_group};

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Field-level validation messages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<BTreeMap<String, Vec<String>>>,
}

// ============================================================================
// Authentication and user models
// ============================================================================

/// Group a user can belong to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Group {
    /// Staff member
    Employee,
    /// Buyer
    Customer,
}

impl From<user_group::Group> for Group {
    fn from(group: user_group::Group) -> Self {
        match group {
            user_group::Group::Employee => Group::Employee,
            user_group::Group::Customer => Group::Customer,
        }
    }
}

impl From<Group> for user_group::Group {
    fn from(group: Group) -> Self {
        match group {
            Group::Employee => user_group::Group::Employee,
            Group::Customer => user_group::Group::Customer,
        }
    }
}

/// User login request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct LoginRequest {
    #[garde(length(min = 1))]
    pub username: String,
    #[garde(length(min = 1))]
    pub password: String,
}

/// User login response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    /// Logged in user
    pub user: User,
    /// Session token
    pub token: String,
    /// Token expiration timestamp
    pub expires_at: DateTime<Utc>,
}

/// User information
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: i32,
    pub username: String,
    /// Whether the account can log in
    pub is_active: bool,
    pub groups: Vec<Group>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn from_model(model: user::Model, groups: Vec<user_group::Group>) -> Self {
        Self {
            id: model.id,
            username: model.username,
            is_active: model.is_active,
            groups: groups.into_iter().map(Group::from).collect(),
            created_at: model.created_at,
        }
    }
}

/// List of users
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserList {
    pub users: Vec<User>,
    pub total: usize,
}

/// Request to create a user
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct CreateUserRequest {
    /// Login name (unique)
    #[garde(length(min = 1, max = 150))]
    pub username: String,
    /// Password (minimum 8 characters)
    #[garde(skip)]
    pub password: String,
    /// Group memberships
    #[serde(default)]
    #[garde(skip)]
    pub groups: Vec<Group>,
}

// ============================================================================
// Supplier and product models
// ============================================================================

/// Supplier information
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Supplier {
    pub id: i32,
    pub name: String,
    pub status: String,
    pub email: String,
    pub phone_number: String,
    pub postal_code: String,
    pub city: String,
    pub address: String,
    /// "{name}, {address}, {postal_code} {city}"
    pub full_address: String,
}

impl From<supplier::Model> for Supplier {
    fn from(model: supplier::Model) -> Self {
        let full_address = model.full_address();
        Self {
            id: model.id,
            name: model.name,
            status: model.status,
            email: model.email,
            phone_number: model.phone_number,
            postal_code: model.postal_code,
            city: model.city,
            address: model.address,
            full_address,
        }
    }
}

/// List of suppliers
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SupplierList {
    pub suppliers: Vec<Supplier>,
    pub total: usize,
}

/// Create or replace a supplier
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct SupplierRequest {
    /// Supplier name (unique)
    #[garde(length(min = 1, max = 50))]
    pub name: String,
    /// Status label (may be blank)
    #[serde(default)]
    #[garde(length(max = 30))]
    pub status: String,
    #[garde(email)]
    pub email: String,
    #[garde(length(min = 1, max = 32), custom(valid_phone_number))]
    pub phone_number: String,
    #[garde(length(min = 1, max = 10))]
    pub postal_code: String,
    #[garde(length(min = 1, max = 50))]
    pub city: String,
    /// Street address
    #[garde(length(min = 1, max = 70))]
    pub address: String,
}

fn valid_phone_number(value: &str, _ctx: &()) -> garde::Result {
    let valid = value
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' '))
        && value.chars().any(|c| c.is_ascii_digit());
    if valid {
        Ok(())
    } else {
        Err(garde::Error::new("enter a valid phone number"))
    }
}

/// Product category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProductCategory {
    Pipes,
    Fittings,
    Valves,
    /// Welds and threads
    WeldsThreads,
}

impl From<product::ProductCategory> for ProductCategory {
    fn from(category: product::ProductCategory) -> Self {
        match category {
            product::ProductCategory::Pipes => ProductCategory::Pipes,
            product::ProductCategory::Fittings => ProductCategory::Fittings,
            product::ProductCategory::Valves => ProductCategory::Valves,
            product::ProductCategory::WeldsThreads => ProductCategory::WeldsThreads,
        }
    }
}

impl From<ProductCategory> for product::ProductCategory {
    fn from(category: ProductCategory) -> Self {
        match category {
            ProductCategory::Pipes => product::ProductCategory::Pipes,
            ProductCategory::Fittings => product::ProductCategory::Fittings,
            ProductCategory::Valves => product::ProductCategory::Valves,
            ProductCategory::WeldsThreads => product::ProductCategory::WeldsThreads,
        }
    }
}

/// Product information
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: i32,
    pub name: String,
    pub category: ProductCategory,
    /// Unit price with two decimal places
    #[schema(value_type = String, example = "100.00")]
    pub price: Decimal,
    pub supplier_id: i32,
}

impl From<product::Model> for Product {
    fn from(model: product::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            category: model.category.into(),
            price: crate::pricing::money(model.price),
            supplier_id: model.supplier_id,
        }
    }
}

/// List of products
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductList {
    pub products: Vec<Product>,
    pub total: usize,
}

/// Create or replace a product
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct ProductRequest {
    #[garde(length(min = 1, max = 100))]
    pub name: String,
    #[garde(skip)]
    pub category: ProductCategory,
    /// Unit price, non-negative, at most 99999999.99 with two decimal places
    #[schema(value_type = String, example = "100.00")]
    #[garde(custom(valid_price))]
    pub price: Decimal,
    #[garde(skip)]
    pub supplier_id: i32,
}

fn valid_price(value: &Decimal, _ctx: &()) -> garde::Result {
    if value.is_sign_negative() {
        return Err(garde::Error::new("price cannot be negative"));
    }
    if *value > crate::pricing::max_price() {
        return Err(garde::Error::new("price cannot exceed 99999999.99"));
    }
    if value.normalize().scale() > 2 {
        return Err(garde::Error::new("price has more than 2 decimal places"));
    }
    Ok(())
}

// ============================================================================
// Order models
// ============================================================================

/// Order information
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: i32,
    /// Owning user
    pub owner_id: i32,
    pub created_at: DateTime<Utc>,
    pub is_finished: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_date: Option<DateTime<Utc>>,
    pub is_sent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sent_date: Option<DateTime<Utc>>,
}

impl From<order::Model> for Order {
    fn from(model: order::Model) -> Self {
        Self {
            id: model.id,
            owner_id: model.owner_id,
            created_at: model.created_at,
            is_finished: model.is_finished,
            finish_date: model.finish_date,
            is_sent: model.is_sent,
            sent_date: model.sent_date,
        }
    }
}

/// List of orders
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderList {
    pub orders: Vec<Order>,
    pub total: usize,
}

/// Order with its line items and total price
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderDetail {
    pub order: Order,
    pub items: Vec<OrderItemDetail>,
    /// Sum of amount × unit price over all items
    #[schema(value_type = String, example = "950.00")]
    pub total_price: Decimal,
}

/// Line item as shown inside an order
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderItemDetail {
    pub id: i32,
    pub product_id: i32,
    pub product_name: String,
    #[schema(value_type = String, example = "100.00")]
    pub product_price: Decimal,
    pub amount: i32,
    /// amount × product_price
    #[schema(value_type = String, example = "300.00")]
    pub line_total: Decimal,
}

/// Request to create an order
///
/// `owner_id` is required for employees and ignored for customers.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, Validate)]
pub struct CreateOrderRequest {
    #[serde(default)]
    #[garde(skip)]
    pub owner_id: Option<i32>,
}

/// Partial order update (employees); customers may send an empty body
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, Validate)]
pub struct UpdateOrderRequest {
    #[serde(default)]
    #[garde(skip)]
    pub is_finished: Option<bool>,
    #[serde(default)]
    #[garde(skip)]
    pub finish_date: Option<DateTime<Utc>>,
    #[serde(default)]
    #[garde(skip)]
    pub is_sent: Option<bool>,
    #[serde(default)]
    #[garde(skip)]
    pub sent_date: Option<DateTime<Utc>>,
    #[serde(default)]
    #[garde(skip)]
    pub owner_id: Option<i32>,
}

impl UpdateOrderRequest {
    pub fn is_empty(&self) -> bool {
        self.is_finished.is_none()
            && self.finish_date.is_none()
            && self.is_sent.is_none()
            && self.sent_date.is_none()
            && self.owner_id.is_none()
    }
}

/// Line item
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LineItem {
    pub id: i32,
    pub order_id: i32,
    pub product_id: i32,
    pub amount: i32,
}

impl From<order_line_item::Model> for LineItem {
    fn from(model: order_line_item::Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            product_id: model.product_id,
            amount: model.amount,
        }
    }
}

/// Request to add a product to an order
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct CreateLineItemRequest {
    #[garde(skip)]
    pub product_id: i32,
    /// Quantity, at least 1
    #[garde(range(min = 1))]
    pub amount: i32,
}

/// Request to change the quantity of a line item
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct UpdateLineItemRequest {
    /// Quantity, at least 1
    #[garde(range(min = 1))]
    pub amount: i32,
}
