use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use orderdesk_db::entities::{self, product, supplier};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, SqlErr,
};
use std::sync::Arc;
use tracing::{debug, info};

use crate::access::Employee;
use crate::error::{ApiError, ApiResult};
use crate::extract::ValidatedJson;
use crate::models::*;
use crate::AppState;

fn not_found(id: i32) -> ApiError {
    ApiError::not_found(format!("Supplier {} not found", id), "SUPPLIER_NOT_FOUND")
}

fn name_taken(name: &str) -> ApiError {
    ApiError::bad_request(
        format!("Supplier with name '{}' already exists", name),
        "SUPPLIER_NAME_EXISTS",
    )
}

async fn load_supplier(db: &DatabaseConnection, id: i32) -> ApiResult<supplier::Model> {
    entities::Supplier::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| not_found(id))
}

/// Reject a name already used by another supplier
async fn ensure_unique_name(
    db: &DatabaseConnection,
    name: &str,
    except: Option<i32>,
) -> ApiResult<()> {
    let mut query = entities::Supplier::find().filter(supplier::Column::Name.eq(name));
    if let Some(id) = except {
        query = query.filter(supplier::Column::Id.ne(id));
    }
    if query.count(db).await? > 0 {
        return Err(name_taken(name));
    }
    Ok(())
}

fn map_write_error(err: DbErr, name: &str) -> ApiError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => name_taken(name),
        _ => err.into(),
    }
}

/// List all suppliers
#[utoipa::path(
    get,
    path = "/api/suppliers",
    responses(
        (status = 200, description = "List of suppliers", body = SupplierList),
        (status = 403, description = "Employees only", body = ErrorResponse)
    ),
    tag = "catalog"
)]
pub async fn list_suppliers(
    State(state): State<Arc<AppState>>,
    _employee: Employee,
) -> ApiResult<Json<SupplierList>> {
    debug!("Listing suppliers");

    let suppliers: Vec<Supplier> = entities::Supplier::find()
        .order_by_asc(supplier::Column::Id)
        .all(&state.db)
        .await?
        .into_iter()
        .map(Supplier::from)
        .collect();
    let total = suppliers.len();

    Ok(Json(SupplierList { suppliers, total }))
}

/// Create a supplier
#[utoipa::path(
    post,
    path = "/api/suppliers",
    request_body = SupplierRequest,
    responses(
        (status = 201, description = "Supplier created", body = Supplier),
        (status = 400, description = "Validation failed or name taken", body = ErrorResponse),
        (status = 403, description = "Employees only", body = ErrorResponse)
    ),
    tag = "catalog"
)]
pub async fn create_supplier(
    State(state): State<Arc<AppState>>,
    _employee: Employee,
    ValidatedJson(req): ValidatedJson<SupplierRequest>,
) -> ApiResult<(StatusCode, Json<Supplier>)> {
    ensure_unique_name(&state.db, &req.name, None).await?;

    let created = supplier::ActiveModel {
        name: Set(req.name.clone()),
        status: Set(req.status),
        email: Set(req.email),
        phone_number: Set(req.phone_number),
        postal_code: Set(req.postal_code),
        city: Set(req.city),
        address: Set(req.address),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(|e| map_write_error(e, &req.name))?;

    info!("Created supplier '{}' (id {})", created.name, created.id);

    Ok((StatusCode::CREATED, Json(created.into())))
}

/// Get a supplier
#[utoipa::path(
    get,
    path = "/api/suppliers/{id}",
    params(
        ("id" = i32, Path, description = "Supplier ID")
    ),
    responses(
        (status = 200, description = "Supplier", body = Supplier),
        (status = 404, description = "Supplier not found", body = ErrorResponse)
    ),
    tag = "catalog"
)]
pub async fn get_supplier(
    State(state): State<Arc<AppState>>,
    _employee: Employee,
    Path(id): Path<i32>,
) -> ApiResult<Json<Supplier>> {
    let found = load_supplier(&state.db, id).await?;
    Ok(Json(found.into()))
}

/// Replace a supplier
#[utoipa::path(
    put,
    path = "/api/suppliers/{id}",
    params(
        ("id" = i32, Path, description = "Supplier ID")
    ),
    request_body = SupplierRequest,
    responses(
        (status = 200, description = "Supplier updated", body = Supplier),
        (status = 400, description = "Validation failed or name taken", body = ErrorResponse),
        (status = 404, description = "Supplier not found", body = ErrorResponse)
    ),
    tag = "catalog"
)]
pub async fn update_supplier(
    State(state): State<Arc<AppState>>,
    _employee: Employee,
    Path(id): Path<i32>,
    ValidatedJson(req): ValidatedJson<SupplierRequest>,
) -> ApiResult<Json<Supplier>> {
    let existing = load_supplier(&state.db, id).await?;
    ensure_unique_name(&state.db, &req.name, Some(id)).await?;

    let mut active: supplier::ActiveModel = existing.into();
    active.name = Set(req.name.clone());
    active.status = Set(req.status);
    active.email = Set(req.email);
    active.phone_number = Set(req.phone_number);
    active.postal_code = Set(req.postal_code);
    active.city = Set(req.city);
    active.address = Set(req.address);

    let updated = active
        .update(&state.db)
        .await
        .map_err(|e| map_write_error(e, &req.name))?;

    info!("Updated supplier {}", updated.id);

    Ok(Json(updated.into()))
}

/// Delete a supplier
///
/// Refused while any product still references the supplier.
#[utoipa::path(
    delete,
    path = "/api/suppliers/{id}",
    params(
        ("id" = i32, Path, description = "Supplier ID")
    ),
    responses(
        (status = 204, description = "Supplier deleted"),
        (status = 404, description = "Supplier not found", body = ErrorResponse),
        (status = 409, description = "Supplier still has products", body = ErrorResponse)
    ),
    tag = "catalog"
)]
pub async fn delete_supplier(
    State(state): State<Arc<AppState>>,
    _employee: Employee,
    Path(id): Path<i32>,
) -> ApiResult<StatusCode> {
    let existing = load_supplier(&state.db, id).await?;

    let products = entities::Product::find()
        .filter(product::Column::SupplierId.eq(id))
        .count(&state.db)
        .await?;
    if products > 0 {
        return Err(ApiError::conflict(
            format!(
                "Supplier '{}' is still referenced by {} product(s)",
                existing.name, products
            ),
            "SUPPLIER_IN_USE",
        ));
    }

    entities::Supplier::delete_by_id(id).exec(&state.db).await?;
    info!("Deleted supplier {}", id);

    Ok(StatusCode::NO_CONTENT)
}
