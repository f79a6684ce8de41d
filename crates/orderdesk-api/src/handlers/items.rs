use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use orderdesk_db::entities::{self, order_line_item};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
    SqlErr,
};
use std::sync::Arc;
use tracing::{info, warn};

use crate::access::{self, Caller};
use crate::error::{ApiError, ApiResult};
use crate::extract::parse_json;
use crate::handlers::orders::load_order;
use crate::models::*;
use crate::AppState;

fn duplicate_item(product_id: i32) -> ApiError {
    ApiError::bad_request(
        format!(
            "Product {} is already in this order. Change the amount of the existing item instead.",
            product_id
        ),
        "DUPLICATE_ITEM",
    )
}

/// Line item by id, scoped to its parent order
async fn load_item(
    db: &DatabaseConnection,
    order_id: i32,
    item_id: i32,
) -> ApiResult<order_line_item::Model> {
    entities::OrderLineItem::find_by_id(item_id)
        .filter(order_line_item::Column::OrderId.eq(order_id))
        .one(db)
        .await?
        .ok_or_else(|| {
            ApiError::not_found(
                format!("Item {} not found in order {}", item_id, order_id),
                "ITEM_NOT_FOUND",
            )
        })
}

/// Add a product to an order
#[utoipa::path(
    post,
    path = "/api/orders/{id}/items",
    params(
        ("id" = i32, Path, description = "Order ID")
    ),
    request_body = CreateLineItemRequest,
    responses(
        (status = 201, description = "Item added", body = LineItem),
        (status = 400, description = "Not owned, finished, invalid or duplicate product", body = ErrorResponse),
        (status = 404, description = "Order not found", body = ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn create_item(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(order_id): Path<i32>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<LineItem>)> {
    let parent = load_order(&state.db, order_id).await?;
    access::can_change_items(&caller, &parent)?;

    let req: CreateLineItemRequest = parse_json(&body)?;

    if entities::Product::find_by_id(req.product_id)
        .one(&state.db)
        .await?
        .is_none()
    {
        return Err(ApiError::field(
            "product_id",
            format!("Product {} does not exist.", req.product_id),
        ));
    }

    let existing = entities::OrderLineItem::find()
        .filter(order_line_item::Column::OrderId.eq(order_id))
        .filter(order_line_item::Column::ProductId.eq(req.product_id))
        .one(&state.db)
        .await?;
    if existing.is_some() {
        return Err(duplicate_item(req.product_id));
    }

    let created = order_line_item::ActiveModel {
        order_id: Set(order_id),
        product_id: Set(req.product_id),
        amount: Set(req.amount),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(|e: DbErr| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            warn!(
                "Concurrent insert of product {} into order {}",
                req.product_id, order_id
            );
            duplicate_item(req.product_id)
        }
        _ => e.into(),
    })?;

    info!(
        "Added product {} x{} to order {}",
        created.product_id, created.amount, order_id
    );

    Ok((StatusCode::CREATED, Json(created.into())))
}

/// Change the amount of a line item
#[utoipa::path(
    put,
    path = "/api/orders/{id}/items/{item_id}",
    params(
        ("id" = i32, Path, description = "Order ID"),
        ("item_id" = i32, Path, description = "Line item ID")
    ),
    request_body = UpdateLineItemRequest,
    responses(
        (status = 200, description = "Item updated", body = LineItem),
        (status = 400, description = "Not owned, finished or invalid", body = ErrorResponse),
        (status = 404, description = "Order or item not found", body = ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn update_item(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path((order_id, item_id)): Path<(i32, i32)>,
    body: Bytes,
) -> ApiResult<Json<LineItem>> {
    let parent = load_order(&state.db, order_id).await?;
    let item = load_item(&state.db, order_id, item_id).await?;
    access::can_change_items(&caller, &parent)?;

    let req: UpdateLineItemRequest = parse_json(&body)?;

    let mut active: order_line_item::ActiveModel = item.into();
    active.amount = Set(req.amount);
    let updated = active.update(&state.db).await?;

    info!(
        "Set amount of item {} in order {} to {}",
        updated.id, order_id, updated.amount
    );

    Ok(Json(updated.into()))
}

/// Remove a line item from an order
#[utoipa::path(
    delete,
    path = "/api/orders/{id}/items/{item_id}",
    params(
        ("id" = i32, Path, description = "Order ID"),
        ("item_id" = i32, Path, description = "Line item ID")
    ),
    responses(
        (status = 204, description = "Item removed"),
        (status = 400, description = "Not owned or finished", body = ErrorResponse),
        (status = 404, description = "Order or item not found", body = ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn delete_item(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path((order_id, item_id)): Path<(i32, i32)>,
) -> ApiResult<StatusCode> {
    let parent = load_order(&state.db, order_id).await?;
    let item = load_item(&state.db, order_id, item_id).await?;
    access::can_change_items(&caller, &parent)?;

    entities::OrderLineItem::delete_by_id(item.id)
        .exec(&state.db)
        .await?;
    info!("Removed item {} from order {}", item.id, order_id);

    Ok(StatusCode::NO_CONTENT)
}
