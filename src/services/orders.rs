use crate::{
    db::DbPool,
    entities::menu_item::{self, Entity as MenuItemEntity},
    entities::order::{self, Entity as OrderEntity},
    entities::order_item::{self, Entity as OrderItemEntity},
    errors::ServiceError,
    events::{Event, EventSender},
    services::inventory::InventoryService,
    services::recipes::RecipeService,
    services::tables::TableService,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use strum::{Display, EnumString};
use tracing::{error, info, instrument, warn};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// How the order reaches the customer. Stored as its kebab-case string form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize, ToSchema)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum OrderType {
    DineIn,
    Takeaway,
    Delivery,
}

/// Kitchen workflow state. Stored as its snake_case string form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize, ToSchema)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Preparing,
    Ready,
    Served,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// Position in the forward workflow. Cancelled sits outside it.
    fn rank(self) -> Option<u8> {
        match self {
            Self::Pending => Some(0),
            Self::Preparing => Some(1),
            Self::Ready => Some(2),
            Self::Served => Some(3),
            Self::Completed => Some(4),
            Self::Cancelled => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Forward-only transitions, skipping allowed. Any live order can be
    /// cancelled; terminal orders never move again.
    pub fn can_transition_to(self, target: OrderStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match target {
            Self::Cancelled => true,
            _ => match (self.rank(), target.rank()) {
                (Some(from), Some(to)) => to > from,
                _ => false,
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderLineInput {
    pub menu_item_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct PlaceOrderRequest {
    pub table_id: Option<Uuid>,
    pub customer_name: Option<String>,
    pub order_type: String,
    pub notes: Option<String>,
    #[validate(length(min = 1, message = "Order must contain at least one item"))]
    pub items: Vec<OrderLineInput>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderItemResponse {
    pub menu_item_id: Uuid,
    pub name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub table_id: Option<Uuid>,
    pub customer_name: Option<String>,
    pub order_type: String,
    pub status: String,
    pub total_amount: Decimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub items: Vec<OrderItemResponse>,
}

impl OrderResponse {
    fn from_parts(model: order::Model, items: Vec<order_item::Model>) -> Self {
        Self {
            id: model.id,
            table_id: model.table_id,
            customer_name: model.customer_name,
            order_type: model.order_type,
            status: model.status,
            total_amount: model.total_amount,
            notes: model.notes,
            created_at: model.created_at,
            updated_at: model.updated_at,
            items: items
                .into_iter()
                .map(|i| OrderItemResponse {
                    menu_item_id: i.menu_item_id,
                    name: i.name,
                    quantity: i.quantity,
                    unit_price: i.unit_price,
                    line_total: i.unit_price * Decimal::from(i.quantity),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct OrderListQuery {
    pub status: Option<String>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderListResponse {
    pub orders: Vec<OrderResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Service for the order lifecycle: placement, kitchen workflow, deletion.
///
/// Placement is the one write path that touches orders, order items,
/// inventory and tables together, and it runs as a single transaction so a
/// failed stock check leaves no trace.
#[derive(Clone)]
pub struct OrderService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
    inventory: InventoryService,
}

impl OrderService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender, inventory: InventoryService) -> Self {
        Self {
            db_pool,
            event_sender,
            inventory,
        }
    }

    /// Places an order atomically.
    ///
    /// Within one transaction: resolve the aggregated ingredient demand,
    /// decrement stock with a `quantity >= needed` guard on each UPDATE,
    /// insert the order and its line snapshots, and occupy the table for
    /// dine-in. Any insufficient ingredient rolls the whole thing back.
    #[instrument(skip(self, request), fields(order_type = %request.order_type, items = request.items.len()))]
    pub async fn place_order(&self, request: PlaceOrderRequest) -> Result<OrderResponse, ServiceError> {
        request.validate()?;

        let order_type = OrderType::from_str(&request.order_type).map_err(|_| {
            ServiceError::ValidationError(format!("Unknown order type: {}", request.order_type))
        })?;
        if order_type == OrderType::DineIn && request.table_id.is_none() {
            return Err(ServiceError::ValidationError(
                "Dine-in orders require a table".to_string(),
            ));
        }
        for line in &request.items {
            if line.quantity <= 0 {
                return Err(ServiceError::ValidationError(
                    "Item quantities must be positive".to_string(),
                ));
            }
        }

        // Collapse duplicate menu item lines before resolving demand.
        let mut lines: Vec<(Uuid, i32)> = Vec::new();
        for line in &request.items {
            match lines.iter_mut().find(|(id, _)| *id == line.menu_item_id) {
                Some((_, qty)) => *qty += line.quantity,
                None => lines.push((line.menu_item_id, line.quantity)),
            }
        }

        let db = &*self.db_pool;

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start order placement transaction");
            ServiceError::DatabaseError(e)
        })?;

        // Menu items are read inside the transaction so a dish deleted by a
        // concurrent writer surfaces as NotFound rather than a foreign key
        // failure at the line item insert.
        let menu_item_ids: Vec<Uuid> = lines.iter().map(|(id, _)| *id).collect();
        let menu_items: HashMap<Uuid, menu_item::Model> = MenuItemEntity::find()
            .filter(menu_item::Column::Id.is_in(menu_item_ids))
            .all(&txn)
            .await?
            .into_iter()
            .map(|m| (m.id, m))
            .collect();

        for (menu_item_id, _) in &lines {
            let item = menu_items.get(menu_item_id).ok_or_else(|| {
                ServiceError::NotFound(format!("Menu item {} not found", menu_item_id))
            })?;
            if !item.available {
                return Err(ServiceError::InvalidOperation(format!(
                    "{} is not available",
                    item.name
                )));
            }
        }

        // Total is always recomputed from current menu prices; clients never
        // send amounts.
        let total: Decimal = lines
            .iter()
            .map(|(id, qty)| menu_items[id].price * Decimal::from(*qty))
            .sum();

        let requirements = RecipeService::resolve_requirements(&txn, &lines).await?;
        let consumed_ids: Vec<Uuid> = requirements.iter().map(|r| r.item.id).collect();
        for requirement in &requirements {
            InventoryService::consume(&txn, &requirement.item, requirement.required).await?;
        }

        let order_id = Uuid::new_v4();
        let now = Utc::now();
        let order_model = order::ActiveModel {
            id: Set(order_id),
            table_id: Set(request.table_id),
            customer_name: Set(request.customer_name),
            order_type: Set(order_type.to_string()),
            total_amount: Set(total),
            status: Set(OrderStatus::Pending.to_string()),
            notes: Set(request.notes),
            created_at: Set(now),
            updated_at: Set(None),
        }
        .insert(&txn)
        .await?;

        let item_rows: Vec<order_item::ActiveModel> = lines
            .iter()
            .map(|(menu_item_id, quantity)| {
                let menu_item = &menu_items[menu_item_id];
                order_item::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    order_id: Set(order_id),
                    menu_item_id: Set(*menu_item_id),
                    name: Set(menu_item.name.clone()),
                    quantity: Set(*quantity),
                    unit_price: Set(menu_item.price),
                    created_at: Set(now),
                }
            })
            .collect();
        OrderItemEntity::insert_many(item_rows).exec(&txn).await?;

        if order_type == OrderType::DineIn {
            if let Some(table_id) = request.table_id {
                TableService::occupy(&txn, table_id).await?;
            }
        }

        txn.commit().await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to commit order placement");
            ServiceError::DatabaseError(e)
        })?;

        if let Err(e) = self.event_sender.send(Event::OrderCreated(order_id)).await {
            warn!(error = %e, "Failed to publish order created event");
        }
        for requirement in &requirements {
            if let Err(e) = self
                .event_sender
                .send(Event::InventoryConsumed {
                    item_id: requirement.item.id,
                    amount: requirement.required,
                })
                .await
            {
                warn!(error = %e, "Failed to publish consumption event");
            }
        }
        self.inventory.notify_if_low(&consumed_ids).await;

        info!(order_id = %order_id, total = %total, "Order placed");
        self.get_order(order_id).await
    }

    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn get_order(&self, order_id: Uuid) -> Result<OrderResponse, ServiceError> {
        let db = &*self.db_pool;
        let order = OrderEntity::find_by_id(order_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;
        let items = OrderItemEntity::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .all(db)
            .await?;
        Ok(OrderResponse::from_parts(order, items))
    }

    #[instrument(skip(self))]
    pub async fn list_orders(&self, query: OrderListQuery) -> Result<OrderListResponse, ServiceError> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(20).clamp(1, 100);

        if let Some(status) = &query.status {
            OrderStatus::from_str(status).map_err(|_| {
                ServiceError::ValidationError(format!("Unknown order status: {}", status))
            })?;
        }

        let db = &*self.db_pool;
        let mut finder = OrderEntity::find().order_by_desc(order::Column::CreatedAt);
        if let Some(status) = &query.status {
            finder = finder.filter(order::Column::Status.eq(status.clone()));
        }

        let paginator = finder.paginate(db, per_page);
        let total = paginator.num_items().await?;
        let orders = paginator.fetch_page(page - 1).await?;

        let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
        let mut items_by_order: HashMap<Uuid, Vec<order_item::Model>> = HashMap::new();
        for item in OrderItemEntity::find()
            .filter(order_item::Column::OrderId.is_in(order_ids))
            .all(db)
            .await?
        {
            items_by_order.entry(item.order_id).or_default().push(item);
        }

        let orders = orders
            .into_iter()
            .map(|o| {
                let items = items_by_order.remove(&o.id).unwrap_or_default();
                OrderResponse::from_parts(o, items)
            })
            .collect();

        Ok(OrderListResponse {
            orders,
            total,
            page,
            per_page,
        })
    }

    /// Moves an order along the kitchen workflow. Reaching a terminal state
    /// releases the order's table in the same transaction.
    #[instrument(skip(self, request), fields(order_id = %order_id, new_status = %request.status))]
    pub async fn update_status(
        &self,
        order_id: Uuid,
        request: UpdateOrderStatusRequest,
    ) -> Result<OrderResponse, ServiceError> {
        let new_status = OrderStatus::from_str(&request.status).map_err(|_| {
            ServiceError::ValidationError(format!("Unknown order status: {}", request.status))
        })?;

        let db = &*self.db_pool;
        let txn = db.begin().await?;

        let existing = OrderEntity::find_by_id(order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        let current = OrderStatus::from_str(&existing.status).map_err(|_| {
            ServiceError::InternalError(format!(
                "Order {} has unrecognized status {}",
                order_id, existing.status
            ))
        })?;
        if !current.can_transition_to(new_status) {
            return Err(ServiceError::InvalidOperation(format!(
                "Cannot move order from {} to {}",
                current, new_status
            )));
        }

        let old_status = existing.status.clone();
        let table_id = existing.table_id;
        let mut active: order::ActiveModel = existing.into();
        active.status = Set(new_status.to_string());
        active.updated_at = Set(Some(Utc::now()));
        active.update(&txn).await?;

        if new_status.is_terminal() {
            if let Some(table_id) = table_id {
                TableService::release(&txn, table_id).await?;
            }
        }

        txn.commit().await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to commit status update");
            ServiceError::DatabaseError(e)
        })?;

        if let Err(e) = self
            .event_sender
            .send(Event::OrderStatusChanged {
                order_id,
                old_status,
                new_status: new_status.to_string(),
            })
            .await
        {
            warn!(error = %e, "Failed to publish status change event");
        }
        match new_status {
            OrderStatus::Completed => {
                let _ = self.event_sender.send(Event::OrderCompleted(order_id)).await;
            }
            OrderStatus::Cancelled => {
                let _ = self.event_sender.send(Event::OrderCancelled(order_id)).await;
            }
            _ => {}
        }

        self.get_order(order_id).await
    }

    /// Deletes an order and its line items. Completed orders are financial
    /// records and cannot be deleted; consumed stock is not restored.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn delete_order(&self, order_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let txn = db.begin().await?;

        let existing = OrderEntity::find_by_id(order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        let status = OrderStatus::from_str(&existing.status).map_err(|_| {
            ServiceError::InternalError(format!(
                "Order {} has unrecognized status {}",
                order_id, existing.status
            ))
        })?;
        if status == OrderStatus::Completed {
            return Err(ServiceError::InvalidOperation(
                "Completed orders cannot be deleted".to_string(),
            ));
        }

        if !status.is_terminal() {
            if let Some(table_id) = existing.table_id {
                TableService::release(&txn, table_id).await?;
            }
        }

        OrderItemEntity::delete_many()
            .filter(order_item::Column::OrderId.eq(order_id))
            .exec(&txn)
            .await?;
        OrderEntity::delete_by_id(order_id).exec(&txn).await?;

        txn.commit().await?;

        if let Err(e) = self.event_sender.send(Event::OrderDeleted(order_id)).await {
            warn!(error = %e, "Failed to publish order deleted event");
        }
        info!(order_id = %order_id, "Order deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_type_uses_kebab_case_strings() {
        assert_eq!(OrderType::DineIn.to_string(), "dine-in");
        assert_eq!(OrderType::from_str("takeaway").unwrap(), OrderType::Takeaway);
        assert!(OrderType::from_str("drive-through").is_err());
    }

    #[test]
    fn workflow_moves_forward_only() {
        use OrderStatus::*;
        assert!(Pending.can_transition_to(Preparing));
        assert!(Pending.can_transition_to(Served));
        assert!(Preparing.can_transition_to(Completed));
        assert!(!Ready.can_transition_to(Preparing));
        assert!(!Served.can_transition_to(Pending));
    }

    #[test]
    fn any_live_order_can_be_cancelled() {
        use OrderStatus::*;
        for status in [Pending, Preparing, Ready, Served] {
            assert!(status.can_transition_to(Cancelled));
        }
    }

    #[test]
    fn terminal_states_are_frozen() {
        use OrderStatus::*;
        for target in [Pending, Preparing, Ready, Served, Completed, Cancelled] {
            assert!(!Completed.can_transition_to(target));
            assert!(!Cancelled.can_transition_to(target));
        }
    }
}
