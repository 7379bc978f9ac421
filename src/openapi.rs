use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Brigade API",
        version = "1.0.0",
        description = r#"
# Brigade Restaurant Back Office API

Back-of-house API for a restaurant: menu and recipes, ingredient
inventory, table management, order workflow and settlement.

Placing an order is atomic: ingredient stock is checked and decremented,
the order and its line items are written, and the table is occupied for
dine-in service, all in one transaction. If any ingredient runs short
the whole placement is rejected with 409 and nothing changes.

## Error Handling

Errors use a consistent JSON shape:

```json
{
  "error": "Conflict",
  "message": "Insufficient stock for Saumon: required 0.2, available 0.1",
  "timestamp": "2024-01-01T00:00:00Z"
}
```
        "#
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "inventory", description = "Ingredient stock management"),
        (name = "menu", description = "Dishes offered to customers"),
        (name = "recipes", description = "Ingredient requirements per dish"),
        (name = "tables", description = "Dining floor plan"),
        (name = "orders", description = "Order lifecycle"),
        (name = "pos", description = "Register: pending orders and settlement")
    ),
    paths(
        crate::handlers::inventory::create_item,
        crate::handlers::inventory::list_items,
        crate::handlers::inventory::get_item,
        crate::handlers::inventory::update_item,
        crate::handlers::inventory::restock_item,
        crate::handlers::inventory::delete_item,

        crate::handlers::menu::create_item,
        crate::handlers::menu::list_items,
        crate::handlers::menu::get_item,
        crate::handlers::menu::update_item,
        crate::handlers::menu::delete_item,

        crate::handlers::recipes::set_recipe,
        crate::handlers::recipes::get_recipe,

        crate::handlers::tables::create_table,
        crate::handlers::tables::list_tables,
        crate::handlers::tables::get_table,
        crate::handlers::tables::update_table_status,

        crate::handlers::orders::place_order,
        crate::handlers::orders::list_orders,
        crate::handlers::orders::get_order,
        crate::handlers::orders::update_order_status,
        crate::handlers::orders::delete_order,

        crate::handlers::pos::list_pending,
        crate::handlers::pos::settle_order,
        crate::handlers::pos::get_payment,
    ),
    components(
        schemas(
            crate::entities::inventory_item::Model,
            crate::entities::menu_item::Model,
            crate::entities::dining_table::Model,

            crate::services::inventory::CreateInventoryItemRequest,
            crate::services::inventory::UpdateInventoryItemRequest,
            crate::services::inventory::RestockRequest,

            crate::services::menu::CreateMenuItemRequest,
            crate::services::menu::UpdateMenuItemRequest,

            crate::handlers::recipes::ReplaceRecipeRequest,
            crate::services::recipes::RecipeIngredientInput,
            crate::services::recipes::RecipeIngredient,
            crate::services::recipes::RecipeResponse,

            crate::services::tables::CreateTableRequest,
            crate::services::tables::UpdateTableStatusRequest,
            crate::services::tables::TableStatus,

            crate::services::orders::PlaceOrderRequest,
            crate::services::orders::OrderLineInput,
            crate::services::orders::UpdateOrderStatusRequest,
            crate::services::orders::OrderResponse,
            crate::services::orders::OrderItemResponse,
            crate::services::orders::OrderListResponse,
            crate::services::orders::OrderStatus,
            crate::services::orders::OrderType,

            crate::services::payments::SettleOrderRequest,
            crate::services::payments::PaymentResponse,
            crate::services::payments::PendingOrderResponse,
            crate::services::payments::PaymentMethod,

            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
