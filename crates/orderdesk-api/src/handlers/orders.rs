use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use orderdesk_db::entities::{self, order, order_line_item};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::access::{self, Caller, OrderScope, Role};
use crate::error::{ApiError, ApiResult};
use crate::extract::parse_optional_json;
use crate::models::*;
use crate::pricing;
use crate::AppState;

pub(crate) async fn load_order(db: &DatabaseConnection, id: i32) -> ApiResult<order::Model> {
    entities::Order::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Order {} not found", id), "ORDER_NOT_FOUND"))
}

async fn ensure_user_exists(db: &DatabaseConnection, user_id: i32) -> ApiResult<()> {
    if entities::User::find_by_id(user_id).one(db).await?.is_none() {
        return Err(ApiError::field(
            "owner_id",
            format!("User {} does not exist.", user_id),
        ));
    }
    Ok(())
}

fn total_overflow(order_id: i32) -> ApiError {
    error!("Total of order {} overflows", order_id);
    ApiError::new(
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("Total of order {} cannot be computed", order_id),
        "TOTAL_OVERFLOW",
    )
}

/// Order with its line items and exact total
async fn order_detail(db: &DatabaseConnection, order: order::Model) -> ApiResult<OrderDetail> {
    let rows = entities::OrderLineItem::find()
        .filter(order_line_item::Column::OrderId.eq(order.id))
        .order_by_asc(order_line_item::Column::Id)
        .find_also_related(entities::Product)
        .all(db)
        .await?;

    let mut items = Vec::with_capacity(rows.len());
    for (item, product) in rows {
        // Products referenced by line items cannot be deleted
        let Some(product) = product else {
            return Err(ApiError::database(sea_orm::DbErr::RecordNotFound(format!(
                "product {} of line item {}",
                item.product_id, item.id
            ))));
        };
        items.push(OrderItemDetail {
            id: item.id,
            product_id: product.id,
            product_name: product.name,
            product_price: pricing::money(product.price),
            amount: item.amount,
            line_total: pricing::line_total(item.amount, product.price)
                .ok_or_else(|| total_overflow(order.id))?,
        });
    }

    let total_price = pricing::order_total(items.iter().map(|i| (i.amount, i.product_price)))
        .ok_or_else(|| total_overflow(order.id))?;

    Ok(OrderDetail {
        order: order.into(),
        items,
        total_price,
    })
}

/// List orders
///
/// Customers see their own orders, employees see all of them.
#[utoipa::path(
    get,
    path = "/api/orders",
    responses(
        (status = 200, description = "List of orders", body = OrderList),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "No customer or employee group", body = ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn list_orders(
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> ApiResult<Json<OrderList>> {
    debug!("Listing orders for user {}", caller.user_id);

    let mut query = entities::Order::find().order_by_asc(order::Column::Id);
    if let OrderScope::OwnedBy(owner_id) = access::order_scope(&caller) {
        query = query.filter(order::Column::OwnerId.eq(owner_id));
    }

    let orders: Vec<Order> = query
        .all(&state.db)
        .await?
        .into_iter()
        .map(Order::from)
        .collect();
    let total = orders.len();

    Ok(Json(OrderList { orders, total }))
}

/// Create an empty order
///
/// Customers always own the orders they create; employees must name the
/// owner with `owner_id`.
#[utoipa::path(
    post,
    path = "/api/orders",
    request_body(content = CreateOrderRequest, description = "Optional for customers"),
    responses(
        (status = 201, description = "Order created", body = Order),
        (status = 400, description = "Missing or unknown owner", body = ErrorResponse),
        (status = 403, description = "No customer or employee group", body = ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn create_order(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<Order>)> {
    let requested = match caller.role {
        Role::Employee => parse_optional_json::<CreateOrderRequest>(&body)?.owner_id,
        Role::Customer => None,
    };

    let owner_id = access::owner_for_new_order(&caller, requested)
        .ok_or_else(|| ApiError::field("owner_id", "This field is required."))?;
    ensure_user_exists(&state.db, owner_id).await?;

    let created = order::ActiveModel {
        owner_id: Set(owner_id),
        created_at: Set(Utc::now()),
        is_finished: Set(false),
        finish_date: Set(None),
        is_sent: Set(false),
        sent_date: Set(None),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    info!(
        "User {} created order {} for user {}",
        caller.user_id, created.id, owner_id
    );

    Ok((StatusCode::CREATED, Json(created.into())))
}

/// Get an order with its line items and total price
#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(
        ("id" = i32, Path, description = "Order ID")
    ),
    responses(
        (status = 200, description = "Order details", body = OrderDetail),
        (status = 400, description = "Order belongs to another customer", body = ErrorResponse),
        (status = 404, description = "Order not found", body = ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn get_order(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<i32>,
) -> ApiResult<Json<OrderDetail>> {
    let found = load_order(&state.db, id).await?;
    access::can_access_order(&caller, &found)?;

    Ok(Json(order_detail(&state.db, found).await?))
}

/// Update an order
///
/// Customers can only mark their open order as finished; the body is
/// ignored. Employees may change the finished and sent flags, their dates
/// and the owner.
#[utoipa::path(
    put,
    path = "/api/orders/{id}",
    params(
        ("id" = i32, Path, description = "Order ID")
    ),
    request_body(content = UpdateOrderRequest, description = "Ignored for customers"),
    responses(
        (status = 200, description = "Order updated", body = Order),
        (status = 400, description = "Not owned, already finished or invalid", body = ErrorResponse),
        (status = 404, description = "Order not found", body = ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn update_order(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<i32>,
    body: Bytes,
) -> ApiResult<Json<Order>> {
    let found = load_order(&state.db, id).await?;
    access::can_access_order(&caller, &found)?;

    let updated = match caller.role {
        Role::Customer => {
            access::can_finish_order(&caller, &found)?;

            let mut active: order::ActiveModel = found.into();
            active.is_finished = Set(true);
            active.finish_date = Set(Some(Utc::now()));
            let updated = active.update(&state.db).await?;

            info!("Customer {} finished order {}", caller.user_id, updated.id);
            updated
        }
        Role::Employee => {
            let req: UpdateOrderRequest = parse_optional_json(&body)?;
            apply_employee_update(&state.db, found, req).await?
        }
    };

    Ok(Json(updated.into()))
}

async fn apply_employee_update(
    db: &DatabaseConnection,
    found: order::Model,
    req: UpdateOrderRequest,
) -> ApiResult<order::Model> {
    if req.is_finished == Some(false) && found.is_finished {
        return Err(ApiError::field(
            "is_finished",
            "A finished order cannot be reopened.",
        ));
    }

    if let Some(owner_id) = req.owner_id {
        ensure_user_exists(db, owner_id).await?;
    }

    if req.is_empty() {
        return Ok(found);
    }

    let now = Utc::now();
    let mut active: order::ActiveModel = found.clone().into();

    if let Some(owner_id) = req.owner_id {
        active.owner_id = Set(owner_id);
    }

    if req.is_finished == Some(true) {
        active.is_finished = Set(true);
        active.finish_date = Set(Some(req.finish_date.or(found.finish_date).unwrap_or(now)));
    } else if let Some(finish_date) = req.finish_date {
        active.finish_date = Set(Some(finish_date));
    }

    match req.is_sent {
        Some(true) => {
            active.is_sent = Set(true);
            active.sent_date = Set(Some(req.sent_date.or(found.sent_date).unwrap_or(now)));
        }
        Some(false) => {
            active.is_sent = Set(false);
            if let Some(sent_date) = req.sent_date {
                active.sent_date = Set(Some(sent_date));
            }
        }
        None => {
            if let Some(sent_date) = req.sent_date {
                active.sent_date = Set(Some(sent_date));
            }
        }
    }

    if !active.is_changed() {
        return Ok(found);
    }

    let updated = active.update(db).await?;
    info!("Employee updated order {}", updated.id);

    Ok(updated)
}

/// Delete an order and its line items
#[utoipa::path(
    delete,
    path = "/api/orders/{id}",
    params(
        ("id" = i32, Path, description = "Order ID")
    ),
    responses(
        (status = 204, description = "Order deleted"),
        (status = 400, description = "Order belongs to another customer", body = ErrorResponse),
        (status = 404, description = "Order not found", body = ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn delete_order(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<i32>,
) -> ApiResult<StatusCode> {
    let found = load_order(&state.db, id).await?;
    access::can_access_order(&caller, &found)?;

    entities::Order::delete_by_id(found.id).exec(&state.db).await?;
    info!("User {} deleted order {}", caller.user_id, found.id);

    Ok(StatusCode::NO_CONTENT)
}
