mod common;

use axum::http::{Method, StatusCode};
use common::{decimal_field, TestApp};
use rust_decimal_macros::dec;
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn recipes_join_ingredient_details() {
    let app = TestApp::new().await;
    let saumon = app
        .seed_ingredient("Saumon", dec!(1.0), "kg", dec!(0.2))
        .await;
    let avocat = app
        .seed_ingredient("Avocat", dec!(12), "piece", dec!(4))
        .await;
    let tartare = app.seed_menu_item("Tartare de saumon", dec!(14.50)).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/recipes",
            Some(json!({
                "menu_item_id": tartare.id,
                "ingredients": [
                    { "inventory_item_id": saumon.id, "quantity_required": "0.2" },
                    { "inventory_item_id": avocat.id, "quantity_required": "0.5" }
                ]
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let recipe = TestApp::read_json(
        app.request(
            Method::GET,
            &format!("/api/v1/recipes/{}", tartare.id),
            None,
        )
        .await,
    )
    .await;
    assert_eq!(recipe["menu_item_name"], "Tartare de saumon");
    let ingredients = recipe["ingredients"].as_array().unwrap();
    assert_eq!(ingredients.len(), 2);
    let salmon_line = ingredients
        .iter()
        .find(|i| i["name"] == "Saumon")
        .expect("salmon in recipe");
    assert_eq!(salmon_line["unit"], "kg");
    assert_eq!(decimal_field(&salmon_line["quantity_required"]), dec!(0.2));
    assert_eq!(decimal_field(&salmon_line["available"]), dec!(1.0));
}

#[tokio::test]
async fn setting_a_recipe_replaces_the_previous_one_entirely() {
    let app = TestApp::new().await;
    let saumon = app
        .seed_ingredient("Saumon", dec!(1.0), "kg", dec!(0.2))
        .await;
    let riz = app.seed_ingredient("Riz", dec!(10.0), "kg", dec!(1)).await;
    let bowl = app.seed_menu_item("Poke bowl", dec!(12.00)).await;

    app.seed_recipe(bowl.id, &[(saumon.id, dec!(0.2)), (riz.id, dec!(0.15))])
        .await;
    app.seed_recipe(bowl.id, &[(riz.id, dec!(0.2))]).await;

    let recipe = TestApp::read_json(
        app.request(Method::GET, &format!("/api/v1/recipes/{}", bowl.id), None)
            .await,
    )
    .await;
    let ingredients = recipe["ingredients"].as_array().unwrap();
    assert_eq!(ingredients.len(), 1);
    assert_eq!(ingredients[0]["name"], "Riz");
    assert_eq!(decimal_field(&ingredients[0]["quantity_required"]), dec!(0.2));
}

#[tokio::test]
async fn invalid_recipe_requests_are_rejected() {
    let app = TestApp::new().await;
    let saumon = app
        .seed_ingredient("Saumon", dec!(1.0), "kg", dec!(0.2))
        .await;
    let tartare = app.seed_menu_item("Tartare de saumon", dec!(14.50)).await;

    // Duplicate ingredient rows.
    let response = app
        .request(
            Method::POST,
            "/api/v1/recipes",
            Some(json!({
                "menu_item_id": tartare.id,
                "ingredients": [
                    { "inventory_item_id": saumon.id, "quantity_required": "0.1" },
                    { "inventory_item_id": saumon.id, "quantity_required": "0.2" }
                ]
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Non-positive quantity.
    let response = app
        .request(
            Method::POST,
            "/api/v1/recipes",
            Some(json!({
                "menu_item_id": tartare.id,
                "ingredients": [
                    { "inventory_item_id": saumon.id, "quantity_required": "0" }
                ]
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Unknown ingredient.
    let response = app
        .request(
            Method::POST,
            "/api/v1/recipes",
            Some(json!({
                "menu_item_id": tartare.id,
                "ingredients": [
                    { "inventory_item_id": Uuid::new_v4(), "quantity_required": "0.1" }
                ]
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Unknown menu item.
    let response = app
        .request(
            Method::POST,
            "/api/v1/recipes",
            Some(json!({ "menu_item_id": Uuid::new_v4(), "ingredients": [] })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // A failed replace leaves the old recipe untouched.
    app.seed_recipe(tartare.id, &[(saumon.id, dec!(0.2))]).await;
    let response = app
        .request(
            Method::POST,
            "/api/v1/recipes",
            Some(json!({
                "menu_item_id": tartare.id,
                "ingredients": [
                    { "inventory_item_id": Uuid::new_v4(), "quantity_required": "1" }
                ]
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let recipe = TestApp::read_json(
        app.request(
            Method::GET,
            &format!("/api/v1/recipes/{}", tartare.id),
            None,
        )
        .await,
    )
    .await;
    assert_eq!(recipe["ingredients"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn identical_orders_resolve_identical_requirements() {
    let app = TestApp::new().await;
    let saumon = app
        .seed_ingredient("Saumon", dec!(2.0), "kg", dec!(0.2))
        .await;
    let riz = app.seed_ingredient("Riz", dec!(10.0), "kg", dec!(1)).await;
    let bowl = app.seed_menu_item("Poke bowl", dec!(12.00)).await;
    app.seed_recipe(bowl.id, &[(saumon.id, dec!(0.2)), (riz.id, dec!(0.15))])
        .await;

    let order = json!({
        "order_type": "takeaway",
        "items": [{ "menu_item_id": bowl.id, "quantity": 2 }]
    });

    let first = TestApp::read_json(
        app.request(Method::POST, "/api/v1/orders", Some(order.clone()))
            .await,
    )
    .await;
    let saumon_after_first = app.stock_of(saumon.id).await;
    let riz_after_first = app.stock_of(riz.id).await;

    // The same order against the unchanged recipe deducts the exact same
    // amounts and prices out the same total.
    let second = TestApp::read_json(
        app.request(Method::POST, "/api/v1/orders", Some(order)).await,
    )
    .await;
    assert_eq!(
        saumon_after_first - app.stock_of(saumon.id).await,
        dec!(2.0) - saumon_after_first,
    );
    assert_eq!(
        riz_after_first - app.stock_of(riz.id).await,
        dec!(10.0) - riz_after_first,
    );
    assert_eq!(app.stock_of(saumon.id).await, dec!(1.2));
    assert_eq!(app.stock_of(riz.id).await, dec!(9.4));
    assert_eq!(
        decimal_field(&first["total_amount"]),
        decimal_field(&second["total_amount"])
    );
    assert_eq!(first["items"], second["items"]);
}

#[tokio::test]
async fn menu_crud_and_table_management() {
    let app = TestApp::new().await;

    // Menu item create/update.
    let response = app
        .request(
            Method::POST,
            "/api/v1/menu",
            Some(json!({
                "name": "Salade verte",
                "price": "7.00",
                "category": "starters"
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let dish = TestApp::read_json(response).await;
    let dish_id = dish["id"].as_str().unwrap().to_string();
    assert_eq!(dish["available"], true);

    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/menu/{}", dish_id),
            Some(json!({ "price": "7.50", "available": false })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = TestApp::read_json(response).await;
    assert_eq!(decimal_field(&updated["price"]), dec!(7.50));
    assert_eq!(updated["available"], false);

    // Category filter.
    let response = app
        .request(Method::GET, "/api/v1/menu?category=starters", None)
        .await;
    let items = TestApp::read_json(response).await;
    assert_eq!(items.as_array().unwrap().len(), 1);

    // Tables: duplicate numbers conflict.
    let response = app
        .request(
            Method::POST,
            "/api/v1/tables",
            Some(json!({ "number": "T1", "capacity": 4 })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let response = app
        .request(
            Method::POST,
            "/api/v1/tables",
            Some(json!({ "number": "T1", "capacity": 2 })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Staff status override.
    let table = app.seed_table("T2", 6).await;
    let response = app
        .request(
            Method::PATCH,
            &format!("/api/v1/tables/{}/status", table.id),
            Some(json!({ "status": "reserved" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = TestApp::read_json(response).await;
    assert_eq!(updated["status"], "reserved");

    let response = app
        .request(
            Method::PATCH,
            &format!("/api/v1/tables/{}/status", table.id),
            Some(json!({ "status": "sideways" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
