use crate::{
    db::DbPool,
    entities::dining_table::Entity as TableEntity,
    entities::order::{self, Entity as OrderEntity},
    entities::order_item::{self, Entity as OrderItemEntity},
    entities::payment::{self, Entity as PaymentEntity},
    errors::ServiceError,
    events::{Event, EventSender},
    services::orders::{OrderItemResponse, OrderStatus},
    services::tables::TableService,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, SqlErr,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use strum::{Display, EnumString};
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

/// Accepted tender types. Stored as the lowercase string form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize, ToSchema)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Mobile,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SettleOrderRequest {
    pub payment_method: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaymentResponse {
    pub id: Uuid,
    pub order_id: Uuid,
    pub method: String,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
}

impl From<payment::Model> for PaymentResponse {
    fn from(model: payment::Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            method: model.method,
            amount: model.amount,
            created_at: model.created_at,
        }
    }
}

/// An unsettled order as shown on the register screen.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PendingOrderResponse {
    pub id: Uuid,
    pub table_id: Option<Uuid>,
    pub table_number: Option<String>,
    pub customer_name: Option<String>,
    pub order_type: String,
    pub status: String,
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItemResponse>,
}

/// Service for settling orders at the register.
///
/// Settlement charges exactly the stored order total, writes the payment
/// record, completes the order and releases its table in one transaction.
/// The unique index on `payments.order_id` makes double settlement
/// impossible even under concurrent cashiers.
#[derive(Clone)]
pub struct PaymentService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
}

impl PaymentService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self, request), fields(order_id = %order_id, method = %request.payment_method))]
    pub async fn settle_order(
        &self,
        order_id: Uuid,
        request: SettleOrderRequest,
    ) -> Result<PaymentResponse, ServiceError> {
        let method = PaymentMethod::from_str(&request.payment_method).map_err(|_| {
            ServiceError::ValidationError(format!(
                "Unknown payment method: {}",
                request.payment_method
            ))
        })?;

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
        match status {
            OrderStatus::Completed => {
                return Err(ServiceError::Conflict(
                    "Order has already been settled".to_string(),
                ));
            }
            OrderStatus::Cancelled => {
                return Err(ServiceError::InvalidOperation(
                    "Cancelled orders cannot be settled".to_string(),
                ));
            }
            _ => {}
        }

        let amount = existing.total_amount;
        let table_id = existing.table_id;
        let old_status = existing.status.clone();

        let payment_model = payment::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(order_id),
            method: Set(method.to_string()),
            amount: Set(amount),
            created_at: Set(Utc::now()),
        }
        .insert(&txn)
        .await
        .map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                ServiceError::Conflict("Order has already been settled".to_string())
            }
            _ => ServiceError::DatabaseError(e),
        })?;

        let mut active: order::ActiveModel = existing.into();
        active.status = Set(OrderStatus::Completed.to_string());
        active.updated_at = Set(Some(Utc::now()));
        active.update(&txn).await?;

        if let Some(table_id) = table_id {
            TableService::release(&txn, table_id).await?;
        }

        txn.commit().await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to commit settlement");
            ServiceError::DatabaseError(e)
        })?;

        if let Err(e) = self
            .event_sender
            .send(Event::PaymentRecorded {
                order_id,
                method: method.to_string(),
                amount,
            })
            .await
        {
            warn!(error = %e, "Failed to publish payment event");
        }
        let _ = self
            .event_sender
            .send(Event::OrderStatusChanged {
                order_id,
                old_status,
                new_status: OrderStatus::Completed.to_string(),
            })
            .await;
        let _ = self.event_sender.send(Event::OrderCompleted(order_id)).await;

        info!(order_id = %order_id, amount = %amount, "Order settled");
        Ok(payment_model.into())
    }

    /// Lists orders still awaiting settlement, oldest first, with their
    /// table numbers and line items for the register display.
    #[instrument(skip(self))]
    pub async fn list_pending(&self) -> Result<Vec<PendingOrderResponse>, ServiceError> {
        let db = &*self.db_pool;

        let rows = OrderEntity::find()
            .filter(
                order::Column::Status.is_not_in([
                    OrderStatus::Completed.to_string(),
                    OrderStatus::Cancelled.to_string(),
                ]),
            )
            .order_by_asc(order::Column::CreatedAt)
            .find_also_related(TableEntity)
            .all(db)
            .await?;

        let order_ids: Vec<Uuid> = rows.iter().map(|(o, _)| o.id).collect();
        let mut items_by_order: HashMap<Uuid, Vec<OrderItemResponse>> = HashMap::new();
        for item in OrderItemEntity::find()
            .filter(order_item::Column::OrderId.is_in(order_ids))
            .all(db)
            .await?
        {
            items_by_order
                .entry(item.order_id)
                .or_default()
                .push(OrderItemResponse {
                    menu_item_id: item.menu_item_id,
                    name: item.name,
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                    line_total: item.unit_price * Decimal::from(item.quantity),
                });
        }

        Ok(rows
            .into_iter()
            .map(|(o, table)| PendingOrderResponse {
                id: o.id,
                table_id: o.table_id,
                table_number: table.map(|t| t.number),
                customer_name: o.customer_name,
                order_type: o.order_type,
                status: o.status,
                total_amount: o.total_amount,
                created_at: o.created_at,
                items: items_by_order.remove(&o.id).unwrap_or_default(),
            })
            .collect())
    }

    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn get_payment(&self, order_id: Uuid) -> Result<PaymentResponse, ServiceError> {
        let db = &*self.db_pool;
        PaymentEntity::find()
            .filter(payment::Column::OrderId.eq(order_id))
            .one(db)
            .await?
            .map(PaymentResponse::from)
            .ok_or_else(|| {
                ServiceError::NotFound(format!("No payment recorded for order {}", order_id))
            })
    }
}
