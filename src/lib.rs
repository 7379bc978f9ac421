//! Brigade API Library
//!
//! Back-of-house service for a restaurant: menu, recipes, ingredient
//! inventory, tables, orders and settlement.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod openapi;
pub mod services;

use axum::{extract::State, response::Json, routing::get, Router};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::db::DbPool;

/// The service layer, built once at startup and shared by all handlers.
#[derive(Clone)]
pub struct AppServices {
    pub inventory: services::inventory::InventoryService,
    pub menu: services::menu::MenuService,
    pub recipes: services::recipes::RecipeService,
    pub orders: services::orders::OrderService,
    pub payments: services::payments::PaymentService,
    pub tables: services::tables::TableService,
}

impl AppServices {
    pub fn new(db: Arc<DbPool>, event_sender: events::EventSender) -> Self {
        let inventory =
            services::inventory::InventoryService::new(db.clone(), event_sender.clone());
        Self {
            menu: services::menu::MenuService::new(db.clone()),
            recipes: services::recipes::RecipeService::new(db.clone(), event_sender.clone()),
            orders: services::orders::OrderService::new(
                db.clone(),
                event_sender.clone(),
                inventory.clone(),
            ),
            payments: services::payments::PaymentService::new(db.clone(), event_sender.clone()),
            tables: services::tables::TableService::new(db, event_sender),
            inventory,
        }
    }
}

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbPool>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: AppServices,
}

impl AppState {
    pub fn new(db: Arc<DbPool>, config: config::AppConfig, event_sender: events::EventSender) -> Self {
        let services = AppServices::new(db.clone(), event_sender.clone());
        Self {
            db,
            config,
            event_sender,
            services,
        }
    }
}

/// All v1 API routes, to be nested under `/api/v1`.
pub fn api_v1_routes() -> Router<AppState> {
    use axum::routing::{patch, post};

    let inventory = Router::new()
        .route(
            "/inventory",
            get(handlers::inventory::list_items).post(handlers::inventory::create_item),
        )
        .route(
            "/inventory/:id",
            get(handlers::inventory::get_item)
                .put(handlers::inventory::update_item)
                .delete(handlers::inventory::delete_item),
        )
        .route("/inventory/:id/restock", patch(handlers::inventory::restock_item));

    let menu = Router::new()
        .route(
            "/menu",
            get(handlers::menu::list_items).post(handlers::menu::create_item),
        )
        .route(
            "/menu/:id",
            get(handlers::menu::get_item)
                .put(handlers::menu::update_item)
                .delete(handlers::menu::delete_item),
        );

    let recipes = Router::new()
        .route("/recipes", post(handlers::recipes::set_recipe))
        .route("/recipes/:menu_item_id", get(handlers::recipes::get_recipe));

    let tables = Router::new()
        .route(
            "/tables",
            get(handlers::tables::list_tables).post(handlers::tables::create_table),
        )
        .route("/tables/:id", get(handlers::tables::get_table))
        .route("/tables/:id/status", patch(handlers::tables::update_table_status));

    let orders = Router::new()
        .route(
            "/orders",
            get(handlers::orders::list_orders).post(handlers::orders::place_order),
        )
        .route(
            "/orders/:id",
            get(handlers::orders::get_order).delete(handlers::orders::delete_order),
        )
        .route("/orders/:id/status", patch(handlers::orders::update_order_status));

    let pos = Router::new()
        .route("/pos/pending", get(handlers::pos::list_pending))
        .route("/pos/pay/:id", post(handlers::pos::settle_order))
        .route("/pos/payments/:order_id", get(handlers::pos::get_payment));

    Router::new()
        .merge(inventory)
        .merge(menu)
        .merge(recipes)
        .merge(tables)
        .merge(orders)
        .merge(pos)
}

/// Liveness/status endpoint payload.
pub async fn status_handler(State(state): State<AppState>) -> Json<Value> {
    let db_ok = db::check_connection(&state.db).await.is_ok();
    Json(json!({
        "service": "brigade-api",
        "status": if db_ok { "up" } else { "degraded" },
        "database": if db_ok { "connected" } else { "unreachable" },
        "environment": state.config.environment,
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// Readiness endpoint: 200 while the database answers, 503 otherwise.
pub async fn health_handler(
    State(state): State<AppState>,
) -> (axum::http::StatusCode, Json<Value>) {
    match db::check_connection(&state.db).await {
        Ok(()) => (axum::http::StatusCode::OK, Json(json!({ "status": "up" }))),
        Err(_) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "down" })),
        ),
    }
}

/// Builds the complete application router: status, health, v1 API and
/// Swagger UI. Middleware layers are applied by the binary.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "brigade-api up" }))
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        .nest("/api/v1", api_v1_routes())
        .merge(openapi::swagger_ui())
        .with_state(state)
}
