use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use orderdesk_db::entities::{self, order_line_item, product};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use std::sync::Arc;
use tracing::{debug, info};

use crate::access::Employee;
use crate::error::{ApiError, ApiResult};
use crate::extract::ValidatedJson;
use crate::models::*;
use crate::AppState;

async fn load_product(db: &DatabaseConnection, id: i32) -> ApiResult<product::Model> {
    entities::Product::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| {
            ApiError::not_found(format!("Product {} not found", id), "PRODUCT_NOT_FOUND")
        })
}

async fn ensure_supplier_exists(db: &DatabaseConnection, supplier_id: i32) -> ApiResult<()> {
    if entities::Supplier::find_by_id(supplier_id)
        .one(db)
        .await?
        .is_none()
    {
        return Err(ApiError::field(
            "supplier_id",
            format!("Supplier {} does not exist.", supplier_id),
        ));
    }
    Ok(())
}

/// List all products
#[utoipa::path(
    get,
    path = "/api/products",
    responses(
        (status = 200, description = "List of products", body = ProductList)
    ),
    tag = "catalog"
)]
pub async fn list_products(State(state): State<Arc<AppState>>) -> ApiResult<Json<ProductList>> {
    debug!("Listing products");

    let products: Vec<Product> = entities::Product::find()
        .order_by_asc(product::Column::Id)
        .all(&state.db)
        .await?
        .into_iter()
        .map(Product::from)
        .collect();
    let total = products.len();

    Ok(Json(ProductList { products, total }))
}

/// Get a product
#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(
        ("id" = i32, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Product", body = Product),
        (status = 404, description = "Product not found", body = ErrorResponse)
    ),
    tag = "catalog"
)]
pub async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> ApiResult<Json<Product>> {
    let found = load_product(&state.db, id).await?;
    Ok(Json(found.into()))
}

/// Create a product
#[utoipa::path(
    post,
    path = "/api/products",
    request_body = ProductRequest,
    responses(
        (status = 201, description = "Product created", body = Product),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 403, description = "Employees only", body = ErrorResponse)
    ),
    tag = "catalog"
)]
pub async fn create_product(
    State(state): State<Arc<AppState>>,
    _employee: Employee,
    ValidatedJson(req): ValidatedJson<ProductRequest>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    ensure_supplier_exists(&state.db, req.supplier_id).await?;

    let created = product::ActiveModel {
        name: Set(req.name),
        category: Set(req.category.into()),
        price: Set(req.price),
        supplier_id: Set(req.supplier_id),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    info!("Created product '{}' (id {})", created.name, created.id);

    Ok((StatusCode::CREATED, Json(created.into())))
}

/// Replace a product
#[utoipa::path(
    put,
    path = "/api/products/{id}",
    params(
        ("id" = i32, Path, description = "Product ID")
    ),
    request_body = ProductRequest,
    responses(
        (status = 200, description = "Product updated", body = Product),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 404, description = "Product not found", body = ErrorResponse)
    ),
    tag = "catalog"
)]
pub async fn update_product(
    State(state): State<Arc<AppState>>,
    _employee: Employee,
    Path(id): Path<i32>,
    ValidatedJson(req): ValidatedJson<ProductRequest>,
) -> ApiResult<Json<Product>> {
    let existing = load_product(&state.db, id).await?;
    ensure_supplier_exists(&state.db, req.supplier_id).await?;

    let mut active: product::ActiveModel = existing.into();
    active.name = Set(req.name);
    active.category = Set(req.category.into());
    active.price = Set(req.price);
    active.supplier_id = Set(req.supplier_id);

    let updated = active.update(&state.db).await?;
    info!("Updated product {}", updated.id);

    Ok(Json(updated.into()))
}

/// Delete a product
///
/// Refused while any order line still references the product.
#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    params(
        ("id" = i32, Path, description = "Product ID")
    ),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 404, description = "Product not found", body = ErrorResponse),
        (status = 409, description = "Product is used by orders", body = ErrorResponse)
    ),
    tag = "catalog"
)]
pub async fn delete_product(
    State(state): State<Arc<AppState>>,
    _employee: Employee,
    Path(id): Path<i32>,
) -> ApiResult<StatusCode> {
    let existing = load_product(&state.db, id).await?;

    let lines = entities::OrderLineItem::find()
        .filter(order_line_item::Column::ProductId.eq(id))
        .count(&state.db)
        .await?;
    if lines > 0 {
        return Err(ApiError::conflict(
            format!(
                "Product '{}' is still used by {} order line(s)",
                existing.name, lines
            ),
            "PRODUCT_IN_USE",
        ));
    }

    entities::Product::delete_by_id(id).exec(&state.db).await?;
    info!("Deleted product {}", id);

    Ok(StatusCode::NO_CONTENT)
}
