use crate::{
    db::DbPool,
    entities::menu_item::{self, Entity as MenuItemEntity},
    errors::ServiceError,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, SqlErr,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateMenuItemRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    #[validate(length(min = 1, message = "Category is required"))]
    pub category: String,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateMenuItemRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub category: Option<String>,
    pub available: Option<bool>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct MenuFilter {
    pub category: Option<String>,
    pub available: Option<bool>,
}

/// Service for the dishes offered to customers.
#[derive(Clone)]
pub struct MenuService {
    db_pool: Arc<DbPool>,
}

impl MenuService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_item(
        &self,
        request: CreateMenuItemRequest,
    ) -> Result<menu_item::Model, ServiceError> {
        request.validate()?;
        if request.price < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Price cannot be negative".to_string(),
            ));
        }

        let db = &*self.db_pool;
        let item = menu_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name),
            description: Set(request.description),
            price: Set(request.price),
            category: Set(request.category),
            available: Set(request.available),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        };

        let model = item.insert(db).await?;
        info!(menu_item_id = %model.id, "Menu item created");
        Ok(model)
    }

    #[instrument(skip(self))]
    pub async fn list_items(&self, filter: MenuFilter) -> Result<Vec<menu_item::Model>, ServiceError> {
        let db = &*self.db_pool;
        let mut query = MenuItemEntity::find()
            .order_by_asc(menu_item::Column::Category)
            .order_by_asc(menu_item::Column::Name);
        if let Some(category) = filter.category {
            query = query.filter(menu_item::Column::Category.eq(category));
        }
        if let Some(available) = filter.available {
            query = query.filter(menu_item::Column::Available.eq(available));
        }
        Ok(query.all(db).await?)
    }

    #[instrument(skip(self), fields(menu_item_id = %menu_item_id))]
    pub async fn get_item(&self, menu_item_id: Uuid) -> Result<menu_item::Model, ServiceError> {
        let db = &*self.db_pool;
        MenuItemEntity::find_by_id(menu_item_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Menu item {} not found", menu_item_id)))
    }

    #[instrument(skip(self, request), fields(menu_item_id = %menu_item_id))]
    pub async fn update_item(
        &self,
        menu_item_id: Uuid,
        request: UpdateMenuItemRequest,
    ) -> Result<menu_item::Model, ServiceError> {
        request.validate()?;
        if matches!(request.price, Some(p) if p < Decimal::ZERO) {
            return Err(ServiceError::ValidationError(
                "Price cannot be negative".to_string(),
            ));
        }
        if matches!(&request.name, Some(n) if n.trim().is_empty()) {
            return Err(ServiceError::ValidationError(
                "Name cannot be empty".to_string(),
            ));
        }

        let existing = self.get_item(menu_item_id).await?;
        let mut active: menu_item::ActiveModel = existing.into();

        if let Some(name) = request.name {
            active.name = Set(name);
        }
        if let Some(description) = request.description {
            active.description = Set(Some(description));
        }
        if let Some(price) = request.price {
            active.price = Set(price);
        }
        if let Some(category) = request.category {
            active.category = Set(category);
        }
        if let Some(available) = request.available {
            active.available = Set(available);
        }
        active.updated_at = Set(Some(Utc::now()));

        let db = &*self.db_pool;
        Ok(active.update(db).await?)
    }

    /// Deletes a menu item. Its recipe rows cascade; order history keeps
    /// its own name/price snapshots, but the foreign key from order items
    /// blocks deletion while orders still reference the dish.
    #[instrument(skip(self), fields(menu_item_id = %menu_item_id))]
    pub async fn delete_item(&self, menu_item_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let result = MenuItemEntity::delete_by_id(menu_item_id)
            .exec(db)
            .await
            .map_err(|e| match e.sql_err() {
                Some(SqlErr::ForeignKeyConstraintViolation(_)) => ServiceError::Conflict(
                    "Menu item is referenced by existing orders".to_string(),
                ),
                _ => ServiceError::DatabaseError(e),
            })?;

        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Menu item {} not found",
                menu_item_id
            )));
        }
        info!(menu_item_id = %menu_item_id, "Menu item deleted");
        Ok(())
    }
}
