use axum::{
    extract::{Path, Query, State},
    response::Response,
    Json,
};
use uuid::Uuid;

use crate::entities::inventory_item;
use crate::errors::ServiceError;
use crate::handlers::common::{created_response, no_content_response, success_response};
use crate::services::inventory::{
    CreateInventoryItemRequest, InventoryFilter, RestockRequest, UpdateInventoryItemRequest,
};
use crate::AppState;

#[utoipa::path(
    post,
    path = "/api/v1/inventory",
    request_body = CreateInventoryItemRequest,
    responses(
        (status = 201, description = "Inventory item created", body = inventory_item::Model),
        (status = 400, description = "Invalid input"),
    ),
    tag = "inventory"
)]
pub async fn create_item(
    State(state): State<AppState>,
    Json(payload): Json<CreateInventoryItemRequest>,
) -> Result<Response, ServiceError> {
    let item = state.services.inventory.create_item(payload).await?;
    Ok(created_response(item))
}

#[utoipa::path(
    get,
    path = "/api/v1/inventory",
    params(InventoryFilter),
    responses(
        (status = 200, description = "List of inventory items", body = [inventory_item::Model]),
    ),
    tag = "inventory"
)]
pub async fn list_items(
    State(state): State<AppState>,
    Query(filter): Query<InventoryFilter>,
) -> Result<Response, ServiceError> {
    let items = state.services.inventory.list_items(filter).await?;
    Ok(success_response(items))
}

#[utoipa::path(
    get,
    path = "/api/v1/inventory/{id}",
    params(("id" = Uuid, Path, description = "Inventory item id")),
    responses(
        (status = 200, description = "Inventory item", body = inventory_item::Model),
        (status = 404, description = "Item not found"),
    ),
    tag = "inventory"
)]
pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    let item = state.services.inventory.get_item(id).await?;
    Ok(success_response(item))
}

#[utoipa::path(
    put,
    path = "/api/v1/inventory/{id}",
    params(("id" = Uuid, Path, description = "Inventory item id")),
    request_body = UpdateInventoryItemRequest,
    responses(
        (status = 200, description = "Updated inventory item", body = inventory_item::Model),
        (status = 404, description = "Item not found"),
    ),
    tag = "inventory"
)]
pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateInventoryItemRequest>,
) -> Result<Response, ServiceError> {
    let item = state.services.inventory.update_item(id, payload).await?;
    Ok(success_response(item))
}

#[utoipa::path(
    patch,
    path = "/api/v1/inventory/{id}/restock",
    params(("id" = Uuid, Path, description = "Inventory item id")),
    request_body = RestockRequest,
    responses(
        (status = 200, description = "Item after restock", body = inventory_item::Model),
        (status = 400, description = "Non-positive quantity"),
        (status = 404, description = "Item not found"),
    ),
    tag = "inventory"
)]
pub async fn restock_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RestockRequest>,
) -> Result<Response, ServiceError> {
    let item = state.services.inventory.restock(id, payload).await?;
    Ok(success_response(item))
}

#[utoipa::path(
    delete,
    path = "/api/v1/inventory/{id}",
    params(("id" = Uuid, Path, description = "Inventory item id")),
    responses(
        (status = 204, description = "Item deleted"),
        (status = 404, description = "Item not found"),
        (status = 409, description = "Item still referenced by recipes"),
    ),
    tag = "inventory"
)]
pub async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    state.services.inventory.delete_item(id).await?;
    Ok(no_content_response())
}
