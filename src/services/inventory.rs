use crate::{
    db::DbPool,
    entities::inventory_item::{self, Entity as InventoryItemEntity},
    entities::recipe,
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateInventoryItemRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    pub category: Option<String>,
    pub quantity: Decimal,
    #[validate(length(min = 1, message = "Unit is required"))]
    pub unit: String,
    #[serde(default)]
    pub min_quantity: Decimal,
    #[serde(default)]
    pub cost_per_unit: Decimal,
    pub supplier: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateInventoryItemRequest {
    pub name: Option<String>,
    pub category: Option<String>,
    pub unit: Option<String>,
    pub min_quantity: Option<Decimal>,
    pub cost_per_unit: Option<Decimal>,
    pub supplier: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct RestockRequest {
    pub quantity: Decimal,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct InventoryFilter {
    pub category: Option<String>,
    #[serde(default)]
    pub low_stock: bool,
}

/// Service for managing stock of raw ingredients.
///
/// All stock movements go through conditional SQL updates so that quantity
/// can never be driven below zero, even under concurrent writers.
#[derive(Clone)]
pub struct InventoryService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
}

impl InventoryService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_item(
        &self,
        request: CreateInventoryItemRequest,
    ) -> Result<inventory_item::Model, ServiceError> {
        request.validate()?;
        if request.quantity < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Quantity cannot be negative".to_string(),
            ));
        }
        if request.min_quantity < Decimal::ZERO || request.cost_per_unit < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Min quantity and cost per unit cannot be negative".to_string(),
            ));
        }

        let db = &*self.db_pool;
        let item = inventory_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name),
            category: Set(request.category),
            quantity: Set(request.quantity),
            unit: Set(request.unit),
            min_quantity: Set(request.min_quantity),
            cost_per_unit: Set(request.cost_per_unit),
            supplier: Set(request.supplier),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        };

        let model = item.insert(db).await?;
        info!(item_id = %model.id, "Inventory item created");
        Ok(model)
    }

    #[instrument(skip(self))]
    pub async fn list_items(
        &self,
        filter: InventoryFilter,
    ) -> Result<Vec<inventory_item::Model>, ServiceError> {
        let db = &*self.db_pool;

        let mut query = InventoryItemEntity::find().order_by_asc(inventory_item::Column::Name);
        if let Some(category) = filter.category {
            query = query.filter(inventory_item::Column::Category.eq(category));
        }
        if filter.low_stock {
            query = query.filter(
                Expr::col(inventory_item::Column::Quantity)
                    .lte(Expr::col(inventory_item::Column::MinQuantity)),
            );
        }

        Ok(query.all(db).await?)
    }

    #[instrument(skip(self), fields(item_id = %item_id))]
    pub async fn get_item(&self, item_id: Uuid) -> Result<inventory_item::Model, ServiceError> {
        let db = &*self.db_pool;
        InventoryItemEntity::find_by_id(item_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Inventory item {} not found", item_id)))
    }

    /// Updates descriptive fields. Stock levels change only through
    /// [`Self::restock`] and order placement.
    #[instrument(skip(self, request), fields(item_id = %item_id))]
    pub async fn update_item(
        &self,
        item_id: Uuid,
        request: UpdateInventoryItemRequest,
    ) -> Result<inventory_item::Model, ServiceError> {
        request.validate()?;
        if matches!(request.min_quantity, Some(q) if q < Decimal::ZERO)
            || matches!(request.cost_per_unit, Some(c) if c < Decimal::ZERO)
        {
            return Err(ServiceError::ValidationError(
                "Min quantity and cost per unit cannot be negative".to_string(),
            ));
        }
        if matches!(&request.name, Some(n) if n.trim().is_empty()) {
            return Err(ServiceError::ValidationError(
                "Name cannot be empty".to_string(),
            ));
        }

        let existing = self.get_item(item_id).await?;
        let mut active: inventory_item::ActiveModel = existing.into();

        if let Some(name) = request.name {
            active.name = Set(name);
        }
        if let Some(category) = request.category {
            active.category = Set(Some(category));
        }
        if let Some(unit) = request.unit {
            active.unit = Set(unit);
        }
        if let Some(min_quantity) = request.min_quantity {
            active.min_quantity = Set(min_quantity);
        }
        if let Some(cost_per_unit) = request.cost_per_unit {
            active.cost_per_unit = Set(cost_per_unit);
        }
        if let Some(supplier) = request.supplier {
            active.supplier = Set(Some(supplier));
        }
        active.updated_at = Set(Some(Utc::now()));

        let db = &*self.db_pool;
        Ok(active.update(db).await?)
    }

    /// Adds stock atomically. The increment runs as a single UPDATE so
    /// concurrent restocks and consumptions never lose writes.
    #[instrument(skip(self), fields(item_id = %item_id, quantity = %request.quantity))]
    pub async fn restock(
        &self,
        item_id: Uuid,
        request: RestockRequest,
    ) -> Result<inventory_item::Model, ServiceError> {
        if request.quantity <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Restock quantity must be positive".to_string(),
            ));
        }

        let db = &*self.db_pool;
        let result = InventoryItemEntity::update_many()
            .col_expr(
                inventory_item::Column::Quantity,
                Expr::col(inventory_item::Column::Quantity).add(Expr::val(request.quantity)),
            )
            .col_expr(
                inventory_item::Column::UpdatedAt,
                Expr::value(Utc::now()),
            )
            .filter(inventory_item::Column::Id.eq(item_id))
            .exec(db)
            .await?;

        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Inventory item {} not found",
                item_id
            )));
        }

        let item = self.get_item(item_id).await?;
        if let Err(e) = self
            .event_sender
            .send(Event::InventoryRestocked {
                item_id,
                quantity_added: request.quantity,
            })
            .await
        {
            warn!(error = %e, "Failed to publish restock event");
        }
        info!(item_id = %item_id, new_quantity = %item.quantity, "Inventory restocked");
        Ok(item)
    }

    /// Deletes an item unless a recipe still references it.
    #[instrument(skip(self), fields(item_id = %item_id))]
    pub async fn delete_item(&self, item_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;

        let references = recipe::Entity::find()
            .filter(recipe::Column::InventoryItemId.eq(item_id))
            .count(db)
            .await?;
        if references > 0 {
            return Err(ServiceError::Conflict(format!(
                "Inventory item is used by {} recipe(s); remove those first",
                references
            )));
        }

        let result = InventoryItemEntity::delete_by_id(item_id).exec(db).await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Inventory item {} not found",
                item_id
            )));
        }
        info!(item_id = %item_id, "Inventory item deleted");
        Ok(())
    }

    /// Decrements stock for one ingredient inside a caller-owned transaction.
    ///
    /// The guard `quantity >= amount` lives in the UPDATE itself; a zero
    /// `rows_affected` means another writer got there first and the caller
    /// must roll back.
    pub(crate) async fn consume<C: ConnectionTrait>(
        conn: &C,
        item: &inventory_item::Model,
        amount: Decimal,
    ) -> Result<(), ServiceError> {
        let result = InventoryItemEntity::update_many()
            .col_expr(
                inventory_item::Column::Quantity,
                Expr::col(inventory_item::Column::Quantity).sub(Expr::val(amount)),
            )
            .col_expr(
                inventory_item::Column::UpdatedAt,
                Expr::value(Utc::now()),
            )
            .filter(inventory_item::Column::Id.eq(item.id))
            .filter(inventory_item::Column::Quantity.gte(amount))
            .exec(conn)
            .await?;

        if result.rows_affected == 0 {
            return Err(ServiceError::InsufficientStock {
                ingredient: item.name.clone(),
                required: amount,
                available: item.quantity,
            });
        }
        Ok(())
    }

    /// Emits low-stock warnings for the given items based on their current
    /// quantities. Called after a consuming transaction commits.
    pub(crate) async fn notify_if_low(&self, item_ids: &[Uuid]) {
        let db = &*self.db_pool;
        let items = match InventoryItemEntity::find()
            .filter(inventory_item::Column::Id.is_in(item_ids.to_vec()))
            .all(db)
            .await
        {
            Ok(items) => items,
            Err(e) => {
                warn!(error = %e, "Failed to load items for low-stock check");
                return;
            }
        };

        for item in items {
            if item.quantity <= item.min_quantity {
                if let Err(e) = self
                    .event_sender
                    .send(Event::LowStock {
                        item_id: item.id,
                        name: item.name.clone(),
                        quantity: item.quantity,
                        min_quantity: item.min_quantity,
                    })
                    .await
                {
                    warn!(error = %e, "Failed to publish low-stock event");
                }
            }
        }
    }
}
