use crate::{
    db::DbPool,
    entities::{
        order::{ActiveModel as OrderActiveModel, Entity as OrderEntity, Model as OrderModel},
        order_line_item::{
            self, ActiveModel as LineItemActiveModel, Entity as LineItemEntity,
            Model as LineItemModel, UnitType,
        },
    },
    errors::ServiceError,
    services::{
        orders::{
            contains_literal, find_order_for_update, non_blank, resolve_update_miss,
            validate_quantity, validate_unit_price, NewLineItem, OrderLineItemResponse,
        },
        totals,
    },
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseTransaction,
    EntityTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Adds a line item to an existing order
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderLineItemRequest {
    #[schema(example = 1)]
    pub order_id: i32,
    #[serde(flatten)]
    #[validate]
    pub item: NewLineItem,
}

/// Partial line-item update; absent fields are left unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderLineItemRequest {
    #[validate(length(min = 1, max = 100))]
    pub product_name: Option<String>,
    #[validate(length(max = 50))]
    pub product_code: Option<String>,
    #[validate(length(max = 250))]
    pub description: Option<String>,
    #[validate(custom = "validate_quantity")]
    #[schema(value_type = Option<f64>)]
    pub quantity: Option<Decimal>,
    #[schema(value_type = Option<i32>)]
    pub unit: Option<UnitType>,
    #[validate(custom = "validate_unit_price")]
    #[schema(value_type = Option<f64>)]
    pub unit_price: Option<Decimal>,
}

/// Raw list filters as they arrive on the query string
#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct LineItemQuery {
    /// Owning order id
    pub order_id: Option<String>,
    /// Substring of the product name
    pub product_name: Option<String>,
    /// Substring of the product code; items without a code never match
    pub product_code: Option<String>,
}

/// Parsed line-item list filters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineItemFilter {
    pub order_id: Option<i32>,
    pub product_name: Option<String>,
    pub product_code: Option<String>,
}

impl TryFrom<LineItemQuery> for LineItemFilter {
    type Error = ServiceError;

    fn try_from(query: LineItemQuery) -> Result<Self, Self::Error> {
        let order_id = match non_blank(query.order_id) {
            Some(raw) => Some(raw.parse::<i32>().map_err(|_| {
                ServiceError::ValidationError(format!("'{}' is not a valid orderId", raw))
            })?),
            None => None,
        };

        Ok(Self {
            order_id,
            product_name: non_blank(query.product_name),
            product_code: non_blank(query.product_code),
        })
    }
}

/// Service for line items; every write keeps the owning order's total in step
#[derive(Clone)]
pub struct OrderLineItemService {
    db_pool: Arc<DbPool>,
}

impl OrderLineItemService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn list_line_items(
        &self,
        filter: LineItemFilter,
    ) -> Result<Vec<OrderLineItemResponse>, ServiceError> {
        let db = &*self.db_pool;
        let backend = db.get_database_backend();

        let mut query = LineItemEntity::find();
        if let Some(order_id) = filter.order_id {
            query = query.filter(order_line_item::Column::OrderId.eq(order_id));
        }
        if let Some(name) = &filter.product_name {
            query = query.filter(contains_literal(
                backend,
                order_line_item::Column::ProductName,
                name,
            ));
        }
        if let Some(code) = &filter.product_code {
            query = query.filter(contains_literal(
                backend,
                order_line_item::Column::ProductCode,
                code,
            ));
        }

        let items = query
            .order_by_desc(order_line_item::Column::Id)
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to list order line items");
                ServiceError::DatabaseError(e)
            })?;

        Ok(items.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self), fields(item_id = %item_id))]
    pub async fn get_line_item(&self, item_id: i32) -> Result<OrderLineItemResponse, ServiceError> {
        let db = &*self.db_pool;
        find_line_item(db, item_id).await.map(Into::into)
    }

    #[instrument(skip(self, request), fields(order_id = %request.order_id))]
    pub async fn create_line_item(
        &self,
        request: CreateOrderLineItemRequest,
    ) -> Result<OrderLineItemResponse, ServiceError> {
        request.validate()?;

        let db = &*self.db_pool;
        let order_id = request.order_id;
        let item = request.item;
        let line_total = totals::line_total(item.quantity, item.unit_price)?;

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, order_id, "Failed to start transaction for line item creation");
            ServiceError::DatabaseError(e)
        })?;

        let order = find_order_for_update(&txn, order_id).await?;
        let new_total = totals::adjust_total(order.total_amount, Decimal::ZERO, line_total)?;

        let inserted = LineItemActiveModel {
            order_id: Set(order_id),
            product_name: Set(item.product_name),
            product_code: Set(item.product_code),
            description: Set(item.description),
            quantity: Set(item.quantity),
            unit: Set(item.unit.unwrap_or_default()),
            unit_price: Set(item.unit_price),
            line_total: Set(line_total),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            error!(error = %e, order_id, "Failed to insert order line item");
            ServiceError::DatabaseError(e)
        })?;

        write_order_total(&txn, order, new_total).await?;

        commit(txn, order_id).await?;

        metrics::counter!("store_orders.line_items.written", 1, "op" => "create");
        info!(order_id, item_id = inserted.id, %line_total, "Order line item created");
        Ok(inserted.into())
    }

    #[instrument(skip(self, request), fields(item_id = %item_id))]
    pub async fn update_line_item(
        &self,
        item_id: i32,
        request: UpdateOrderLineItemRequest,
    ) -> Result<(), ServiceError> {
        request.validate()?;

        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, item_id, "Failed to start transaction for line item update");
            ServiceError::DatabaseError(e)
        })?;

        let (order, existing) = lock_order_of_item(&txn, item_id).await?;
        let order_id = order.id;
        let old_total = existing.line_total;
        let quantity = request.quantity.unwrap_or(existing.quantity);
        let unit_price = request.unit_price.unwrap_or(existing.unit_price);
        let new_total = totals::line_total(quantity, unit_price)?;
        let adjusted = totals::adjust_total(order.total_amount, old_total, new_total)?;

        let mut active: LineItemActiveModel = existing.into();
        if let Some(name) = request.product_name {
            active.product_name = Set(name);
        }
        if let Some(code) = request.product_code {
            active.product_code = Set(Some(code));
        }
        if let Some(description) = request.description {
            active.description = Set(Some(description));
        }
        if let Some(unit) = request.unit {
            active.unit = Set(unit);
        }
        active.quantity = Set(quantity);
        active.unit_price = Set(unit_price);
        active.line_total = Set(new_total);

        if let Err(e) = active.update(&txn).await {
            return Err(
                resolve_update_miss::<LineItemEntity, _>(&txn, "OrderLineItem", item_id, e).await,
            );
        }

        if new_total != old_total {
            write_order_total(&txn, order, adjusted).await?;
        }

        commit(txn, order_id).await?;

        metrics::counter!("store_orders.line_items.written", 1, "op" => "update");
        info!(order_id, item_id, %old_total, %new_total, "Order line item updated");
        Ok(())
    }

    #[instrument(skip(self), fields(item_id = %item_id))]
    pub async fn delete_line_item(&self, item_id: i32) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, item_id, "Failed to start transaction for line item deletion");
            ServiceError::DatabaseError(e)
        })?;

        let (order, existing) = lock_order_of_item(&txn, item_id).await?;
        let order_id = order.id;
        let adjusted = totals::adjust_total(order.total_amount, existing.line_total, Decimal::ZERO)?;

        LineItemEntity::delete_by_id(item_id)
            .exec(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, item_id, "Failed to delete order line item");
                ServiceError::DatabaseError(e)
            })?;

        write_order_total(&txn, order, adjusted).await?;

        commit(txn, order_id).await?;

        metrics::counter!("store_orders.line_items.written", 1, "op" => "delete");
        info!(order_id, item_id, "Order line item deleted");
        Ok(())
    }
}

async fn find_line_item<C: ConnectionTrait>(
    conn: &C,
    item_id: i32,
) -> Result<LineItemModel, ServiceError> {
    LineItemEntity::find_by_id(item_id)
        .one(conn)
        .await
        .map_err(|e| {
            error!(error = %e, item_id, "Failed to fetch order line item");
            ServiceError::DatabaseError(e)
        })?
        .ok_or_else(|| {
            ServiceError::NotFound(format!("OrderLineItem with ID {} not found", item_id))
        })
}

/// Locks the owning order, then re-reads the item so its line total is current under the lock
async fn lock_order_of_item(
    txn: &DatabaseTransaction,
    item_id: i32,
) -> Result<(OrderModel, LineItemModel), ServiceError> {
    let order_id = find_line_item(txn, item_id).await?.order_id;
    let order = find_order_for_update(txn, order_id).await?;
    let item = find_line_item(txn, item_id).await?;
    Ok((order, item))
}

/// Stores the adjusted total and stamps `updated_at` on the owning order
async fn write_order_total(
    txn: &DatabaseTransaction,
    order: OrderModel,
    total: Decimal,
) -> Result<(), ServiceError> {
    let order_id = order.id;
    let mut order: OrderActiveModel = order.into();
    order.total_amount = Set(total);
    order.updated_at = Set(Some(Utc::now()));

    match order.update(txn).await {
        Ok(_) => Ok(()),
        Err(e) => Err(resolve_update_miss::<OrderEntity, _>(txn, "Order", order_id, e).await),
    }
}

async fn commit(txn: DatabaseTransaction, order_id: i32) -> Result<(), ServiceError> {
    txn.commit().await.map_err(|e| {
        error!(error = %e, order_id, "Failed to commit line item transaction");
        ServiceError::DatabaseError(e)
    })
}
