use crate::{
    db::DbPool,
    entities::inventory_item::{self, Entity as InventoryItemEntity},
    entities::menu_item::{self, Entity as MenuItemEntity},
    entities::recipe::{self, Entity as RecipeEntity},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RecipeIngredientInput {
    pub inventory_item_id: Uuid,
    pub quantity_required: Decimal,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct SetRecipeRequest {
    pub ingredients: Vec<RecipeIngredientInput>,
}

/// One resolved line of a recipe, joined with its ingredient for display.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RecipeIngredient {
    pub inventory_item_id: Uuid,
    pub name: String,
    pub unit: String,
    pub quantity_required: Decimal,
    pub available: Decimal,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RecipeResponse {
    pub menu_item_id: Uuid,
    pub menu_item_name: String,
    pub ingredients: Vec<RecipeIngredient>,
}

/// An aggregated ingredient requirement for a whole order.
#[derive(Debug, Clone)]
pub struct IngredientRequirement {
    pub item: inventory_item::Model,
    pub required: Decimal,
}

/// Service linking menu items to the inventory items they consume.
#[derive(Clone)]
pub struct RecipeService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
}

impl RecipeService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Replaces the full recipe of a menu item in one transaction: delete
    /// existing rows, insert the new set. Duplicated ingredients in the
    /// request are rejected up front rather than left to the unique index.
    #[instrument(skip(self, request), fields(menu_item_id = %menu_item_id))]
    pub async fn set_recipe(
        &self,
        menu_item_id: Uuid,
        request: SetRecipeRequest,
    ) -> Result<RecipeResponse, ServiceError> {
        request.validate()?;
        for ingredient in &request.ingredients {
            if ingredient.quantity_required <= Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "Ingredient quantities must be positive".to_string(),
                ));
            }
        }
        let mut seen = std::collections::HashSet::new();
        for ingredient in &request.ingredients {
            if !seen.insert(ingredient.inventory_item_id) {
                return Err(ServiceError::ValidationError(format!(
                    "Ingredient {} listed more than once",
                    ingredient.inventory_item_id
                )));
            }
        }

        let db = &*self.db_pool;

        let menu_item = MenuItemEntity::find_by_id(menu_item_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Menu item {} not found", menu_item_id))
            })?;

        let referenced: Vec<Uuid> = request
            .ingredients
            .iter()
            .map(|i| i.inventory_item_id)
            .collect();
        let known = InventoryItemEntity::find()
            .filter(inventory_item::Column::Id.is_in(referenced.clone()))
            .all(db)
            .await?;
        if known.len() != referenced.len() {
            let known_ids: std::collections::HashSet<Uuid> =
                known.iter().map(|i| i.id).collect();
            let missing = referenced
                .iter()
                .find(|id| !known_ids.contains(id))
                .copied()
                .unwrap_or_default();
            return Err(ServiceError::NotFound(format!(
                "Inventory item {} not found",
                missing
            )));
        }

        let txn = db.begin().await?;

        RecipeEntity::delete_many()
            .filter(recipe::Column::MenuItemId.eq(menu_item_id))
            .exec(&txn)
            .await?;

        let now = Utc::now();
        let ingredient_count = request.ingredients.len();
        if !request.ingredients.is_empty() {
            let rows: Vec<recipe::ActiveModel> = request
                .ingredients
                .into_iter()
                .map(|i| recipe::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    menu_item_id: Set(menu_item_id),
                    inventory_item_id: Set(i.inventory_item_id),
                    quantity_required: Set(i.quantity_required),
                    created_at: Set(now),
                })
                .collect();
            RecipeEntity::insert_many(rows).exec(&txn).await?;
        }

        txn.commit().await?;

        if let Err(e) = self
            .event_sender
            .send(Event::RecipeReplaced {
                menu_item_id,
                ingredient_count,
            })
            .await
        {
            warn!(error = %e, "Failed to publish recipe event");
        }
        info!(menu_item_id = %menu_item_id, ingredients = ingredient_count, "Recipe replaced");

        self.build_response(menu_item).await
    }

    #[instrument(skip(self), fields(menu_item_id = %menu_item_id))]
    pub async fn get_recipe(&self, menu_item_id: Uuid) -> Result<RecipeResponse, ServiceError> {
        let db = &*self.db_pool;
        let menu_item = MenuItemEntity::find_by_id(menu_item_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Menu item {} not found", menu_item_id))
            })?;
        self.build_response(menu_item).await
    }

    async fn build_response(
        &self,
        menu_item: menu_item::Model,
    ) -> Result<RecipeResponse, ServiceError> {
        let db = &*self.db_pool;
        let rows = RecipeEntity::find()
            .filter(recipe::Column::MenuItemId.eq(menu_item.id))
            .find_also_related(InventoryItemEntity)
            .all(db)
            .await?;

        let mut ingredients = Vec::with_capacity(rows.len());
        for (row, item) in rows {
            let item = item.ok_or_else(|| {
                ServiceError::InternalError(format!(
                    "Recipe row {} references a missing inventory item",
                    row.id
                ))
            })?;
            ingredients.push(RecipeIngredient {
                inventory_item_id: item.id,
                name: item.name,
                unit: item.unit,
                quantity_required: row.quantity_required,
                available: item.quantity,
            });
        }

        Ok(RecipeResponse {
            menu_item_id: menu_item.id,
            menu_item_name: menu_item.name,
            ingredients,
        })
    }

    /// Aggregates ingredient demand for a whole order.
    ///
    /// Line quantities multiply the per-portion recipe amounts, and demand
    /// for the same ingredient across different dishes is summed before any
    /// stock check. Menu items without a recipe contribute nothing.
    pub(crate) async fn resolve_requirements<C: ConnectionTrait>(
        conn: &C,
        lines: &[(Uuid, i32)],
    ) -> Result<Vec<IngredientRequirement>, ServiceError> {
        let menu_item_ids: Vec<Uuid> = lines.iter().map(|(id, _)| *id).collect();
        let recipe_rows = RecipeEntity::find()
            .filter(recipe::Column::MenuItemId.is_in(menu_item_ids))
            .all(conn)
            .await?;

        let mut demand: HashMap<Uuid, Decimal> = HashMap::new();
        for (menu_item_id, quantity) in lines {
            let portions = Decimal::from(*quantity);
            for row in recipe_rows
                .iter()
                .filter(|r| r.menu_item_id == *menu_item_id)
            {
                *demand.entry(row.inventory_item_id).or_insert(Decimal::ZERO) +=
                    row.quantity_required * portions;
            }
        }

        if demand.is_empty() {
            return Ok(Vec::new());
        }

        let item_ids: Vec<Uuid> = demand.keys().copied().collect();
        let items = InventoryItemEntity::find()
            .filter(inventory_item::Column::Id.is_in(item_ids))
            .all(conn)
            .await?;

        let mut requirements = Vec::with_capacity(items.len());
        for item in items {
            let required = demand.remove(&item.id).unwrap_or(Decimal::ZERO);
            requirements.push(IngredientRequirement { item, required });
        }
        if !demand.is_empty() {
            // A recipe row pointing at a deleted ingredient; the RESTRICT
            // foreign key should make this unreachable.
            return Err(ServiceError::InternalError(
                "Recipe references a missing inventory item".to_string(),
            ));
        }

        // Deterministic order keeps lock acquisition consistent across
        // concurrent placements.
        requirements.sort_by_key(|r| r.item.id);
        Ok(requirements)
    }
}
