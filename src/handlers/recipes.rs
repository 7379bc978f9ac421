use axum::{
    extract::{Path, State},
    response::Response,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::handlers::common::{created_response, success_response};
use crate::services::recipes::{RecipeIngredientInput, RecipeResponse, SetRecipeRequest};
use crate::AppState;

/// Full recipe replacement for one menu item.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReplaceRecipeRequest {
    pub menu_item_id: Uuid,
    pub ingredients: Vec<RecipeIngredientInput>,
}

#[utoipa::path(
    post,
    path = "/api/v1/recipes",
    request_body = ReplaceRecipeRequest,
    responses(
        (status = 201, description = "Recipe replaced", body = RecipeResponse),
        (status = 400, description = "Invalid ingredient list"),
        (status = 404, description = "Menu item or ingredient not found"),
    ),
    tag = "recipes"
)]
pub async fn set_recipe(
    State(state): State<AppState>,
    Json(payload): Json<ReplaceRecipeRequest>,
) -> Result<Response, ServiceError> {
    let recipe = state
        .services
        .recipes
        .set_recipe(
            payload.menu_item_id,
            SetRecipeRequest {
                ingredients: payload.ingredients,
            },
        )
        .await?;
    Ok(created_response(recipe))
}

#[utoipa::path(
    get,
    path = "/api/v1/recipes/{menu_item_id}",
    params(("menu_item_id" = Uuid, Path, description = "Menu item id")),
    responses(
        (status = 200, description = "Recipe with ingredient details", body = RecipeResponse),
        (status = 404, description = "Menu item not found"),
    ),
    tag = "recipes"
)]
pub async fn get_recipe(
    State(state): State<AppState>,
    Path(menu_item_id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    let recipe = state.services.recipes.get_recipe(menu_item_id).await?;
    Ok(success_response(recipe))
}
