pub mod access;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod pricing;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use sea_orm::DatabaseConnection;

use handlers::{auth, items, orders, products, suppliers, system, users};

/// Application state shared across handlers
pub struct AppState {
    pub db: DatabaseConnection,
    /// Secret used to sign session tokens
    pub jwt_secret: String,
    /// Lifetime of issued session tokens
    pub session_ttl: chrono::Duration,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Orderdesk API",
        version = "0.1.0",
        description = "REST API for B2B ordering: suppliers, products and customer orders",
        contact(
            name = "Orderdesk Team",
            email = "team@orderdesk.dev"
        )
    ),
    paths(
        system::health_check,
        auth::login,
        auth::logout,
        auth::get_current_user,
        users::list_users,
        users::create_user,
        users::delete_user,
        suppliers::list_suppliers,
        suppliers::create_supplier,
        suppliers::get_supplier,
        suppliers::update_supplier,
        suppliers::delete_supplier,
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        orders::list_orders,
        orders::create_order,
        orders::get_order,
        orders::update_order,
        orders::delete_order,
        items::create_item,
        items::update_item,
        items::delete_item,
    ),
    components(
        schemas(
            models::HealthResponse,
            models::ErrorResponse,
            models::Group,
            models::LoginRequest,
            models::LoginResponse,
            models::User,
            models::UserList,
            models::CreateUserRequest,
            models::Supplier,
            models::SupplierList,
            models::SupplierRequest,
            models::ProductCategory,
            models::Product,
            models::ProductList,
            models::ProductRequest,
            models::Order,
            models::OrderList,
            models::OrderDetail,
            models::OrderItemDetail,
            models::CreateOrderRequest,
            models::UpdateOrderRequest,
            models::LineItem,
            models::CreateLineItemRequest,
            models::UpdateLineItemRequest,
        )
    ),
    tags(
        (name = "orders", description = "Orders and their line items"),
        (name = "catalog", description = "Suppliers and products"),
        (name = "auth", description = "Login and session endpoints"),
        (name = "users", description = "User administration"),
        (name = "system", description = "System health and info endpoints")
    )
)]
pub struct ApiDoc;

/// API server configuration
pub struct ApiServerConfig {
    /// Address to bind the API server
    pub bind_addr: SocketAddr,
    /// Enable CORS
    pub enable_cors: bool,
    /// Allowed CORS origins (if empty, localhost origins are allowed)
    pub cors_origins: Vec<String>,
    /// Secret for signing session tokens
    pub jwt_secret: String,
    /// Session token lifetime in hours
    pub session_hours: i64,
    /// Upper bound for handling a single request
    pub request_timeout: Duration,
}

impl ApiServerConfig {
    pub fn new(bind_addr: SocketAddr, jwt_secret: String) -> Self {
        Self {
            bind_addr,
            enable_cors: true,
            cors_origins: Vec::new(),
            jwt_secret,
            session_hours: 24,
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// API Server
pub struct ApiServer {
    config: ApiServerConfig,
    state: Arc<AppState>,
}

impl ApiServer {
    /// Create a new API server
    pub fn new(config: ApiServerConfig, db: DatabaseConnection) -> Self {
        let state = Arc::new(AppState {
            db,
            jwt_secret: config.jwt_secret.clone(),
            session_ttl: chrono::Duration::hours(config.session_hours),
        });

        Self { config, state }
    }

    /// Build the router with all routes
    pub fn build_router(&self) -> Router {
        let api_doc = ApiDoc::openapi();

        let auth_state = Arc::new(middleware::AuthState::new(
            self.config.jwt_secret.as_bytes(),
            self.state.db.clone(),
        ));

        // PUBLIC routes (no authentication required)
        let public_router = Router::new()
            .route("/api/health", get(system::health_check))
            .route("/api/auth/login", post(auth::login))
            .route("/api/auth/logout", post(auth::logout))
            .route("/api/products", get(products::list_products))
            .route("/api/products/{id}", get(products::get_product))
            .with_state(self.state.clone());

        // PROTECTED routes (require a session token)
        let protected_router = Router::new()
            .route("/api/auth/me", get(auth::get_current_user))
            .route(
                "/api/users",
                get(users::list_users).post(users::create_user),
            )
            .route("/api/users/{id}", axum::routing::delete(users::delete_user))
            .route(
                "/api/suppliers",
                get(suppliers::list_suppliers).post(suppliers::create_supplier),
            )
            .route(
                "/api/suppliers/{id}",
                get(suppliers::get_supplier)
                    .put(suppliers::update_supplier)
                    .delete(suppliers::delete_supplier),
            )
            .route("/api/products", post(products::create_product))
            .route(
                "/api/products/{id}",
                put(products::update_product).delete(products::delete_product),
            )
            .route(
                "/api/orders",
                get(orders::list_orders).post(orders::create_order),
            )
            .route(
                "/api/orders/{id}",
                get(orders::get_order)
                    .put(orders::update_order)
                    .delete(orders::delete_order),
            )
            .route("/api/orders/{id}/items", post(items::create_item))
            .route(
                "/api/orders/{id}/items/{item_id}",
                put(items::update_item).delete(items::delete_item),
            )
            .with_state(self.state.clone())
            .layer(axum_middleware::from_fn_with_state(
                auth_state,
                middleware::require_auth,
            ));

        // Same paths with different methods merge into one method router
        let api_router = public_router.merge(protected_router);

        let router = Router::new()
            .merge(SwaggerUi::new("/swagger-ui").url("/api/openapi.json", api_doc))
            .merge(api_router);

        let mut router = router
            .layer(TimeoutLayer::new(self.config.request_timeout))
            .layer(TraceLayer::new_for_http());

        if self.config.enable_cors {
            router = router.layer(self.cors_layer());
        }

        router
    }

    fn cors_layer(&self) -> CorsLayer {
        let allow_origin = if self.config.cors_origins.is_empty() {
            AllowOrigin::predicate(|origin: &HeaderValue, _| {
                let origin_str = origin.to_str().unwrap_or("");
                origin_str.starts_with("http://localhost:")
                    || origin_str.starts_with("http://127.0.0.1:")
                    || origin_str.starts_with("https://localhost:")
                    || origin_str.starts_with("https://127.0.0.1:")
            })
        } else {
            AllowOrigin::list(
                self.config
                    .cors_origins
                    .iter()
                    .filter_map(|origin| HeaderValue::from_str(origin).ok()),
            )
        };

        // Cookie auth needs credentials, which rules out a wildcard origin
        CorsLayer::new()
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
            .allow_credentials(true)
            .allow_origin(allow_origin)
    }

    /// Start the API server
    pub async fn start(self) -> Result<(), anyhow::Error> {
        let router = self.build_router();

        info!("Starting API server on {}", self.config.bind_addr);
        info!(
            "OpenAPI spec: http://{}/api/openapi.json",
            self.config.bind_addr
        );
        info!("Swagger UI: http://{}/swagger-ui", self.config.bind_addr);

        let listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;

        axum::serve(listener, router)
            .await
            .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_generation() {
        let doc = ApiDoc::openapi();
        let json = serde_json::to_value(&doc).unwrap();

        assert!(json["paths"]["/api/orders/{id}/items/{item_id}"].is_object());
        assert!(json["components"]["schemas"]["OrderDetail"].is_object());
    }
}
