mod common;

use axum::http::{Method, StatusCode};
use common::{decimal_field, TestApp};
use rust_decimal_macros::dec;
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn placing_an_order_deducts_stock_and_computes_total() {
    let app = TestApp::new().await;

    let saumon = app
        .seed_ingredient("Saumon", dec!(1.0), "kg", dec!(0.2))
        .await;
    let tartare = app.seed_menu_item("Tartare de saumon", dec!(14.50)).await;
    app.seed_recipe(tartare.id, &[(saumon.id, dec!(0.2))]).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "order_type": "takeaway",
                "items": [{ "menu_item_id": tartare.id, "quantity": 2 }]
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let order = TestApp::read_json(response).await;
    assert_eq!(order["status"], "pending");
    assert_eq!(order["order_type"], "takeaway");
    assert_eq!(decimal_field(&order["total_amount"]), dec!(29.00));
    assert_eq!(order["items"].as_array().unwrap().len(), 1);
    assert_eq!(order["items"][0]["name"], "Tartare de saumon");

    // 1.0 - 2 * 0.2
    assert_eq!(app.stock_of(saumon.id).await, dec!(0.6));
}

#[tokio::test]
async fn insufficient_stock_rejects_the_whole_order() {
    let app = TestApp::new().await;

    let saumon = app
        .seed_ingredient("Saumon", dec!(0.6), "kg", dec!(0.2))
        .await;
    let tartare = app.seed_menu_item("Tartare de saumon", dec!(14.50)).await;
    app.seed_recipe(tartare.id, &[(saumon.id, dec!(0.2))]).await;

    // 4 portions need 0.8 kg, only 0.6 on hand.
    let response = app
        .request(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "order_type": "takeaway",
                "items": [{ "menu_item_id": tartare.id, "quantity": 4 }]
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body = TestApp::read_json(response).await;
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("Saumon"), "message was: {}", message);

    // Nothing changed.
    assert_eq!(app.stock_of(saumon.id).await, dec!(0.6));
    let list = TestApp::read_json(
        app.request(Method::GET, "/api/v1/orders", None).await,
    )
    .await;
    assert_eq!(list["total"], 0);
}

#[tokio::test]
async fn shortfall_in_one_ingredient_rolls_back_the_others() {
    let app = TestApp::new().await;

    let rice = app.seed_ingredient("Riz", dec!(10.0), "kg", dec!(1)).await;
    let saumon = app
        .seed_ingredient("Saumon", dec!(0.1), "kg", dec!(0.2))
        .await;
    let bowl = app.seed_menu_item("Poke bowl", dec!(12.00)).await;
    app.seed_recipe(bowl.id, &[(rice.id, dec!(0.15)), (saumon.id, dec!(0.2))])
        .await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "order_type": "takeaway",
                "items": [{ "menu_item_id": bowl.id, "quantity": 1 }]
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // The rice decrement, if it ran first, must have been rolled back.
    assert_eq!(app.stock_of(rice.id).await, dec!(10.0));
    assert_eq!(app.stock_of(saumon.id).await, dec!(0.1));
}

#[tokio::test]
async fn duplicate_lines_are_merged_before_the_stock_check() {
    let app = TestApp::new().await;

    let saumon = app
        .seed_ingredient("Saumon", dec!(1.0), "kg", dec!(0.2))
        .await;
    let tartare = app.seed_menu_item("Tartare de saumon", dec!(14.50)).await;
    app.seed_recipe(tartare.id, &[(saumon.id, dec!(0.2))]).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "order_type": "takeaway",
                "items": [
                    { "menu_item_id": tartare.id, "quantity": 1 },
                    { "menu_item_id": tartare.id, "quantity": 1 }
                ]
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let order = TestApp::read_json(response).await;
    assert_eq!(order["items"].as_array().unwrap().len(), 1);
    assert_eq!(order["items"][0]["quantity"], 2);
    assert_eq!(app.stock_of(saumon.id).await, dec!(0.6));
}

#[tokio::test]
async fn dishes_without_a_recipe_do_not_touch_inventory() {
    let app = TestApp::new().await;

    let coffee = app.seed_menu_item("Cafe", dec!(2.50)).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "order_type": "takeaway",
                "items": [{ "menu_item_id": coffee.id, "quantity": 3 }]
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let order = TestApp::read_json(response).await;
    assert_eq!(decimal_field(&order["total_amount"]), dec!(7.50));
}

#[tokio::test]
async fn invalid_orders_are_rejected_up_front() {
    let app = TestApp::new().await;
    let coffee = app.seed_menu_item("Cafe", dec!(2.50)).await;

    // Unknown menu item.
    let response = app
        .request(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "order_type": "takeaway",
                "items": [{ "menu_item_id": Uuid::new_v4(), "quantity": 1 }]
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Empty item list.
    let response = app
        .request(
            Method::POST,
            "/api/v1/orders",
            Some(json!({ "order_type": "takeaway", "items": [] })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Unknown order type.
    let response = app
        .request(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "order_type": "drive-through",
                "items": [{ "menu_item_id": coffee.id, "quantity": 1 }]
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Dine-in without a table.
    let response = app
        .request(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "order_type": "dine-in",
                "items": [{ "menu_item_id": coffee.id, "quantity": 1 }]
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Non-positive quantity.
    let response = app
        .request(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "order_type": "takeaway",
                "items": [{ "menu_item_id": coffee.id, "quantity": 0 }]
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn orders_for_deleted_dishes_are_not_found() {
    let app = TestApp::new().await;
    let dish = app.seed_menu_item("Plat retire", dec!(9.00)).await;

    let response = app
        .request(Method::DELETE, &format!("/api/v1/menu/{}", dish.id), None)
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .request(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "order_type": "takeaway",
                "items": [{ "menu_item_id": dish.id, "quantity": 1 }]
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unavailable_dishes_cannot_be_ordered() {
    let app = TestApp::new().await;
    let special = app.seed_menu_item("Plat du jour", dec!(18.00)).await;
    app.state
        .services
        .menu
        .update_item(
            special.id,
            brigade_api::services::menu::UpdateMenuItemRequest {
                name: None,
                description: None,
                price: None,
                category: None,
                available: Some(false),
            },
        )
        .await
        .unwrap();

    let response = app
        .request(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "order_type": "takeaway",
                "items": [{ "menu_item_id": special.id, "quantity": 1 }]
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
