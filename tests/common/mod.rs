// Not every test binary uses every helper.
#![allow(dead_code)]

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request},
    Router,
};
use rust_decimal::Decimal;
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

use brigade_api::{
    config::AppConfig,
    db,
    entities::{dining_table, inventory_item, menu_item},
    events::{self, EventSender},
    services::inventory::CreateInventoryItemRequest,
    services::menu::CreateMenuItemRequest,
    services::recipes::{RecipeIngredientInput, SetRecipeRequest},
    services::tables::CreateTableRequest,
    AppState,
};

/// Test harness backed by a throwaway SQLite database file.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    db_path: PathBuf,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let db_path =
            std::env::temp_dir().join(format!("brigade_test_{}.db", Uuid::new_v4()));

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            "test",
        );
        // A single connection keeps SQLite writers serialized in tests.
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let state = AppState::new(db_arc, cfg, event_sender);
        let router = Router::new()
            .nest("/api/v1", brigade_api::api_v1_routes())
            .with_state(state.clone());

        Self {
            router,
            state,
            db_path,
            _event_task: event_task,
        }
    }

    /// Send a request against the router, optionally with a JSON body.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Read a response body as JSON.
    pub async fn read_json(response: axum::response::Response) -> Value {
        use http_body_util::BodyExt;
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("failed to read response body")
            .to_bytes();
        serde_json::from_slice(&bytes).expect("response body was not valid JSON")
    }

    pub async fn seed_ingredient(
        &self,
        name: &str,
        quantity: Decimal,
        unit: &str,
        min_quantity: Decimal,
    ) -> inventory_item::Model {
        self.state
            .services
            .inventory
            .create_item(CreateInventoryItemRequest {
                name: name.to_string(),
                category: None,
                quantity,
                unit: unit.to_string(),
                min_quantity,
                cost_per_unit: Decimal::ZERO,
                supplier: None,
            })
            .await
            .expect("seed ingredient")
    }

    pub async fn seed_menu_item(&self, name: &str, price: Decimal) -> menu_item::Model {
        self.state
            .services
            .menu
            .create_item(CreateMenuItemRequest {
                name: name.to_string(),
                description: None,
                price,
                category: "mains".to_string(),
                available: true,
            })
            .await
            .expect("seed menu item")
    }

    pub async fn seed_recipe(&self, menu_item_id: Uuid, ingredients: &[(Uuid, Decimal)]) {
        self.state
            .services
            .recipes
            .set_recipe(
                menu_item_id,
                SetRecipeRequest {
                    ingredients: ingredients
                        .iter()
                        .map(|(id, qty)| RecipeIngredientInput {
                            inventory_item_id: *id,
                            quantity_required: *qty,
                        })
                        .collect(),
                },
            )
            .await
            .expect("seed recipe");
    }

    pub async fn seed_table(&self, number: &str, capacity: i32) -> dining_table::Model {
        self.state
            .services
            .tables
            .create_table(CreateTableRequest {
                number: number.to_string(),
                capacity,
            })
            .await
            .expect("seed table")
    }

    /// Current stock of an ingredient, straight from the service.
    pub async fn stock_of(&self, item_id: Uuid) -> Decimal {
        self.state
            .services
            .inventory
            .get_item(item_id)
            .await
            .expect("ingredient should exist")
            .quantity
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
        let _ = std::fs::remove_file(&self.db_path);
    }
}

/// Parse a Decimal out of a JSON field that may be a string or a number.
pub fn decimal_field(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).expect("field was not a decimal"),
        Value::Number(n) => Decimal::from_str(&n.to_string()).expect("field was not a decimal"),
        other => panic!("expected decimal-like JSON value, got {:?}", other),
    }
}
