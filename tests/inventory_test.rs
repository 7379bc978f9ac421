mod common;

use axum::http::{Method, StatusCode};
use common::{decimal_field, TestApp};
use rust_decimal_macros::dec;
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn inventory_crud_round_trip() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/inventory",
            Some(json!({
                "name": "Farine",
                "category": "dry goods",
                "quantity": "25.0",
                "unit": "kg",
                "min_quantity": "5.0",
                "cost_per_unit": "1.20"
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let item = TestApp::read_json(response).await;
    let item_id = item["id"].as_str().unwrap().to_string();
    assert_eq!(item["name"], "Farine");

    let response = app
        .request(Method::GET, &format!("/api/v1/inventory/{}", item_id), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/inventory/{}", item_id),
            Some(json!({ "supplier": "Moulin Dupont", "min_quantity": "8.0" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = TestApp::read_json(response).await;
    assert_eq!(updated["supplier"], "Moulin Dupont");
    assert_eq!(decimal_field(&updated["min_quantity"]), dec!(8.0));
    // Stock levels are not writable through the general update.
    assert_eq!(decimal_field(&updated["quantity"]), dec!(25.0));

    let response = app
        .request(
            Method::DELETE,
            &format!("/api/v1/inventory/{}", item_id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .request(Method::GET, &format!("/api/v1/inventory/{}", item_id), None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn restock_adds_to_the_current_level() {
    let app = TestApp::new().await;
    let beurre = app
        .seed_ingredient("Beurre", dec!(2.0), "kg", dec!(1.0))
        .await;

    let response = app
        .request(
            Method::PATCH,
            &format!("/api/v1/inventory/{}/restock", beurre.id),
            Some(json!({ "quantity": "3.5" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let item = TestApp::read_json(response).await;
    assert_eq!(decimal_field(&item["quantity"]), dec!(5.5));

    // Zero and negative restocks are rejected.
    for bad in ["0", "-1"] {
        let response = app
            .request(
                Method::PATCH,
                &format!("/api/v1/inventory/{}/restock", beurre.id),
                Some(json!({ "quantity": bad })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    // Unknown items 404.
    let response = app
        .request(
            Method::PATCH,
            &format!("/api/v1/inventory/{}/restock", Uuid::new_v4()),
            Some(json!({ "quantity": "1" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn low_stock_filter_returns_items_at_or_below_threshold() {
    let app = TestApp::new().await;
    app.seed_ingredient("Sel", dec!(10.0), "kg", dec!(1.0)).await;
    let saumon = app
        .seed_ingredient("Saumon", dec!(0.2), "kg", dec!(0.5))
        .await;

    let response = app
        .request(Method::GET, "/api/v1/inventory?low_stock=true", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let items = TestApp::read_json(response).await;
    let items = items.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"].as_str().unwrap(), saumon.id.to_string());
}

#[tokio::test]
async fn ingredients_used_by_recipes_cannot_be_deleted() {
    let app = TestApp::new().await;
    let oeuf = app
        .seed_ingredient("Oeuf", dec!(100), "piece", dec!(20))
        .await;
    let omelette = app.seed_menu_item("Omelette", dec!(8.00)).await;
    app.seed_recipe(omelette.id, &[(oeuf.id, dec!(3))]).await;

    let response = app
        .request(Method::DELETE, &format!("/api/v1/inventory/{}", oeuf.id), None)
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Clearing the recipe frees the ingredient.
    app.seed_recipe(omelette.id, &[]).await;
    let response = app
        .request(Method::DELETE, &format!("/api/v1/inventory/{}", oeuf.id), None)
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn negative_quantities_are_rejected_at_creation() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/inventory",
            Some(json!({
                "name": "Huile",
                "quantity": "-1.0",
                "unit": "l"
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
