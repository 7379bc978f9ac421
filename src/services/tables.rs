use crate::{
    db::DbPool,
    entities::dining_table::{self, Entity as TableEntity},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    SqlErr,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use strum::{Display, EnumString};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Floor status of a table. Stored as its lowercase string form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize, ToSchema)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TableStatus {
    Available,
    Occupied,
    Reserved,
    Maintenance,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateTableRequest {
    #[validate(length(min = 1, message = "Table number is required"))]
    pub number: String,
    pub capacity: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateTableStatusRequest {
    pub status: String,
}

/// Service for the dining floor plan.
///
/// Table status is advisory: placing a dine-in order marks the table
/// occupied and settling or cancelling releases it, but staff can override
/// either way (reservations, maintenance).
#[derive(Clone)]
pub struct TableService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
}

impl TableService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self, request), fields(number = %request.number))]
    pub async fn create_table(
        &self,
        request: CreateTableRequest,
    ) -> Result<dining_table::Model, ServiceError> {
        request.validate()?;
        if request.capacity <= 0 {
            return Err(ServiceError::ValidationError(
                "Capacity must be positive".to_string(),
            ));
        }

        let db = &*self.db_pool;
        let table = dining_table::ActiveModel {
            id: Set(Uuid::new_v4()),
            number: Set(request.number.clone()),
            capacity: Set(request.capacity),
            status: Set(TableStatus::Available.to_string()),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        };

        let model = table.insert(db).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => ServiceError::Conflict(format!(
                "Table number {} already exists",
                request.number
            )),
            _ => ServiceError::DatabaseError(e),
        })?;
        info!(table_id = %model.id, number = %model.number, "Table created");
        Ok(model)
    }

    #[instrument(skip(self))]
    pub async fn list_tables(&self) -> Result<Vec<dining_table::Model>, ServiceError> {
        let db = &*self.db_pool;
        Ok(TableEntity::find()
            .order_by_asc(dining_table::Column::Number)
            .all(db)
            .await?)
    }

    #[instrument(skip(self), fields(table_id = %table_id))]
    pub async fn get_table(&self, table_id: Uuid) -> Result<dining_table::Model, ServiceError> {
        let db = &*self.db_pool;
        TableEntity::find_by_id(table_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Table {} not found", table_id)))
    }

    /// Staff override of a table's status (reservations, maintenance,
    /// manual release).
    #[instrument(skip(self, request), fields(table_id = %table_id))]
    pub async fn update_status(
        &self,
        table_id: Uuid,
        request: UpdateTableStatusRequest,
    ) -> Result<dining_table::Model, ServiceError> {
        let status = TableStatus::from_str(&request.status).map_err(|_| {
            ServiceError::ValidationError(format!("Unknown table status: {}", request.status))
        })?;

        let table = self.get_table(table_id).await?;
        let old_status = table.status.clone();

        let mut active: dining_table::ActiveModel = table.into();
        active.status = Set(status.to_string());
        active.updated_at = Set(Some(Utc::now()));

        let db = &*self.db_pool;
        let updated = active.update(db).await?;

        if old_status != updated.status {
            if let Err(e) = self
                .event_sender
                .send(Event::TableStatusChanged {
                    table_id,
                    old_status,
                    new_status: updated.status.clone(),
                })
                .await
            {
                warn!(error = %e, "Failed to publish table status event");
            }
        }
        Ok(updated)
    }

    /// Marks a table occupied inside a caller-owned transaction. Fails with
    /// NotFound when the table does not exist; occupying an already occupied
    /// table is allowed (shared or merged seatings).
    pub(crate) async fn occupy<C: ConnectionTrait>(
        conn: &C,
        table_id: Uuid,
    ) -> Result<(), ServiceError> {
        let result = TableEntity::update_many()
            .col_expr(
                dining_table::Column::Status,
                Expr::value(TableStatus::Occupied.to_string()),
            )
            .col_expr(dining_table::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(dining_table::Column::Id.eq(table_id))
            .exec(conn)
            .await?;

        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Table {} not found",
                table_id
            )));
        }
        Ok(())
    }

    /// Releases a table if it is currently occupied. A table a staff member
    /// already moved to another status is left alone.
    pub(crate) async fn release<C: ConnectionTrait>(
        conn: &C,
        table_id: Uuid,
    ) -> Result<(), ServiceError> {
        TableEntity::update_many()
            .col_expr(
                dining_table::Column::Status,
                Expr::value(TableStatus::Available.to_string()),
            )
            .col_expr(dining_table::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(dining_table::Column::Id.eq(table_id))
            .filter(dining_table::Column::Status.eq(TableStatus::Occupied.to_string()))
            .exec(conn)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_status_round_trips_through_strings() {
        for status in [
            TableStatus::Available,
            TableStatus::Occupied,
            TableStatus::Reserved,
            TableStatus::Maintenance,
        ] {
            let parsed = TableStatus::from_str(&status.to_string()).unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!(TableStatus::from_str("broken").is_err());
    }
}
