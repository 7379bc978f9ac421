use axum::{
    extract::{Path, Query, State},
    response::Response,
    Json,
};
use uuid::Uuid;

use crate::entities::menu_item;
use crate::errors::ServiceError;
use crate::handlers::common::{created_response, no_content_response, success_response};
use crate::services::menu::{CreateMenuItemRequest, MenuFilter, UpdateMenuItemRequest};
use crate::AppState;

#[utoipa::path(
    post,
    path = "/api/v1/menu",
    request_body = CreateMenuItemRequest,
    responses(
        (status = 201, description = "Menu item created", body = menu_item::Model),
        (status = 400, description = "Invalid input"),
    ),
    tag = "menu"
)]
pub async fn create_item(
    State(state): State<AppState>,
    Json(payload): Json<CreateMenuItemRequest>,
) -> Result<Response, ServiceError> {
    let item = state.services.menu.create_item(payload).await?;
    Ok(created_response(item))
}

#[utoipa::path(
    get,
    path = "/api/v1/menu",
    params(MenuFilter),
    responses(
        (status = 200, description = "List of menu items", body = [menu_item::Model]),
    ),
    tag = "menu"
)]
pub async fn list_items(
    State(state): State<AppState>,
    Query(filter): Query<MenuFilter>,
) -> Result<Response, ServiceError> {
    let items = state.services.menu.list_items(filter).await?;
    Ok(success_response(items))
}

#[utoipa::path(
    get,
    path = "/api/v1/menu/{id}",
    params(("id" = Uuid, Path, description = "Menu item id")),
    responses(
        (status = 200, description = "Menu item", body = menu_item::Model),
        (status = 404, description = "Item not found"),
    ),
    tag = "menu"
)]
pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    let item = state.services.menu.get_item(id).await?;
    Ok(success_response(item))
}

#[utoipa::path(
    put,
    path = "/api/v1/menu/{id}",
    params(("id" = Uuid, Path, description = "Menu item id")),
    request_body = UpdateMenuItemRequest,
    responses(
        (status = 200, description = "Updated menu item", body = menu_item::Model),
        (status = 404, description = "Item not found"),
    ),
    tag = "menu"
)]
pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateMenuItemRequest>,
) -> Result<Response, ServiceError> {
    let item = state.services.menu.update_item(id, payload).await?;
    Ok(success_response(item))
}

#[utoipa::path(
    delete,
    path = "/api/v1/menu/{id}",
    params(("id" = Uuid, Path, description = "Menu item id")),
    responses(
        (status = 204, description = "Menu item deleted"),
        (status = 404, description = "Item not found"),
        (status = 409, description = "Item referenced by existing orders"),
    ),
    tag = "menu"
)]
pub async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    state.services.menu.delete_item(id).await?;
    Ok(no_content_response())
}
