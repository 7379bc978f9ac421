use axum::{
    extract::{Path, State},
    response::Response,
    Json,
};
use uuid::Uuid;

use crate::entities::dining_table;
use crate::errors::ServiceError;
use crate::handlers::common::{created_response, success_response};
use crate::services::tables::{CreateTableRequest, UpdateTableStatusRequest};
use crate::AppState;

#[utoipa::path(
    post,
    path = "/api/v1/tables",
    request_body = CreateTableRequest,
    responses(
        (status = 201, description = "Table created", body = dining_table::Model),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Table number already exists"),
    ),
    tag = "tables"
)]
pub async fn create_table(
    State(state): State<AppState>,
    Json(payload): Json<CreateTableRequest>,
) -> Result<Response, ServiceError> {
    let table = state.services.tables.create_table(payload).await?;
    Ok(created_response(table))
}

#[utoipa::path(
    get,
    path = "/api/v1/tables",
    responses(
        (status = 200, description = "All tables", body = [dining_table::Model]),
    ),
    tag = "tables"
)]
pub async fn list_tables(State(state): State<AppState>) -> Result<Response, ServiceError> {
    let tables = state.services.tables.list_tables().await?;
    Ok(success_response(tables))
}

#[utoipa::path(
    get,
    path = "/api/v1/tables/{id}",
    params(("id" = Uuid, Path, description = "Table id")),
    responses(
        (status = 200, description = "Table", body = dining_table::Model),
        (status = 404, description = "Table not found"),
    ),
    tag = "tables"
)]
pub async fn get_table(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    let table = state.services.tables.get_table(id).await?;
    Ok(success_response(table))
}

#[utoipa::path(
    patch,
    path = "/api/v1/tables/{id}/status",
    params(("id" = Uuid, Path, description = "Table id")),
    request_body = UpdateTableStatusRequest,
    responses(
        (status = 200, description = "Table after status change", body = dining_table::Model),
        (status = 400, description = "Unknown status"),
        (status = 404, description = "Table not found"),
    ),
    tag = "tables"
)]
pub async fn update_table_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTableStatusRequest>,
) -> Result<Response, ServiceError> {
    let table = state.services.tables.update_status(id, payload).await?;
    Ok(success_response(table))
}
