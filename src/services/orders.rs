use crate::{
    common::{parse_optional_date_bound, DateBound},
    db::DbPool,
    entities::{
        order::{
            self, ActiveModel as OrderActiveModel, Entity as OrderEntity, Model as OrderModel,
            OrderStatus,
        },
        order_line_item::{
            self, ActiveModel as LineItemActiveModel, Entity as LineItemEntity,
            Model as LineItemModel, UnitType,
        },
        WireEnum,
    },
    errors::ServiceError,
    services::{
        order_status::{append_status_note, apply_transition},
        totals,
    },
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::{Expr, SimpleExpr},
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DbBackend, DbErr,
    EntityTrait, LoaderTrait, QueryFilter, QueryOrder, QuerySelect, Select, SqlErr,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

pub(crate) fn validate_quantity(quantity: &Decimal) -> Result<(), ValidationError> {
    if *quantity < Decimal::new(1, 3) {
        let mut err = ValidationError::new("quantity");
        err.message = Some("Quantity must be at least 0.001".into());
        return Err(err);
    }
    validate_precision(quantity, "quantity")
}

pub(crate) fn validate_unit_price(price: &Decimal) -> Result<(), ValidationError> {
    if price.is_sign_negative() && !price.is_zero() {
        let mut err = ValidationError::new("unit_price");
        err.message = Some("Unit price cannot be negative".into());
        return Err(err);
    }
    validate_precision(price, "unit_price")
}

fn validate_precision(value: &Decimal, code: &'static str) -> Result<(), ValidationError> {
    if totals::is_storable(*value) {
        return Ok(());
    }
    let mut err = ValidationError::new(code);
    err.message = Some(
        format!(
            "At most {} significant digits are allowed",
            totals::MAX_SIGNIFICANT_DIGITS
        )
        .into(),
    );
    Err(err)
}

/// Line item supplied inline when creating an order
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewLineItem {
    #[validate(length(min = 1, max = 100, message = "Product name must be between 1 and 100 characters"))]
    #[schema(example = "Steel bolts M8")]
    pub product_name: String,
    #[validate(length(max = 50))]
    pub product_code: Option<String>,
    #[validate(length(max = 250))]
    pub description: Option<String>,
    #[validate(custom = "validate_quantity")]
    #[schema(value_type = f64, example = 10)]
    pub quantity: Decimal,
    /// Unit ordinal or name; defaults to Piece
    #[serde(default)]
    #[schema(value_type = Option<i32>, example = 0)]
    pub unit: Option<UnitType>,
    #[validate(custom = "validate_unit_price")]
    #[schema(value_type = f64, example = 25.5)]
    pub unit_price: Decimal,
}

/// Request/Response types for the order service
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    /// Generated as `PO-YYYYMMDD-XXXXXXXX` when omitted
    #[validate(length(max = 50, message = "Order number cannot exceed 50 characters"))]
    pub order_number: Option<String>,
    pub order_date: Option<DateTime<Utc>>,
    #[validate(length(min = 1, max = 100, message = "Supplier name must be between 1 and 100 characters"))]
    #[schema(example = "Acme Fasteners")]
    pub supplier_name: String,
    #[validate(length(max = 100))]
    pub supplier_contact: Option<String>,
    #[validate(email, length(max = 100))]
    pub supplier_email: Option<String>,
    #[validate(length(max = 20))]
    pub supplier_phone: Option<String>,
    pub expected_delivery_date: Option<DateTime<Utc>>,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
    #[validate(length(max = 100))]
    pub created_by: Option<String>,
    #[validate(length(min = 1, message = "At least one line item is required"))]
    pub order_line_items: Vec<NewLineItem>,
}

/// Partial order update; absent fields are left unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderRequest {
    #[validate(length(min = 1, max = 100))]
    pub supplier_name: Option<String>,
    #[validate(length(max = 100))]
    pub supplier_contact: Option<String>,
    #[validate(email, length(max = 100))]
    pub supplier_email: Option<String>,
    #[validate(length(max = 20))]
    pub supplier_phone: Option<String>,
    pub expected_delivery_date: Option<DateTime<Utc>>,
    pub received_date: Option<DateTime<Utc>>,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
    #[schema(value_type = Option<i32>)]
    pub status: Option<OrderStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderStatusRequest {
    #[schema(value_type = i32, example = 2)]
    pub status: OrderStatus,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

/// Raw list filters as they arrive on the query string
#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct OrderQuery {
    /// Status ordinal or name
    pub status: Option<String>,
    /// Substring of the supplier name
    pub supplier_name: Option<String>,
    /// Substring of the order number
    pub order_number: Option<String>,
    /// Inclusive lower bound on the order date
    pub start_date: Option<String>,
    /// Inclusive upper bound on the order date; a bare date covers the whole day
    pub end_date: Option<String>,
}

/// Parsed list filters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub supplier_name: Option<String>,
    pub order_number: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl TryFrom<OrderQuery> for OrderFilter {
    type Error = ServiceError;

    fn try_from(query: OrderQuery) -> Result<Self, Self::Error> {
        let status = match non_blank(query.status) {
            Some(raw) => Some(OrderStatus::parse(&raw).ok_or_else(|| {
                ServiceError::ValidationError(format!("'{}' is not a valid order status", raw))
            })?),
            None => None,
        };

        let start_date =
            parse_optional_date_bound(query.start_date.as_deref(), "startDate", DateBound::Start)?;
        let end_date =
            parse_optional_date_bound(query.end_date.as_deref(), "endDate", DateBound::End)?;

        Ok(Self {
            status,
            supplier_name: non_blank(query.supplier_name),
            order_number: non_blank(query.order_number),
            start_date,
            end_date,
        })
    }
}

pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineItemResponse {
    pub id: i32,
    pub order_id: i32,
    pub product_name: String,
    pub product_code: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = f64)]
    pub quantity: Decimal,
    #[schema(value_type = i32)]
    pub unit: UnitType,
    #[schema(value_type = f64)]
    pub unit_price: Decimal,
    #[schema(value_type = f64)]
    pub line_total: Decimal,
}

impl From<LineItemModel> for OrderLineItemResponse {
    fn from(model: LineItemModel) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            product_name: model.product_name,
            product_code: model.product_code,
            description: model.description,
            quantity: model.quantity,
            unit: model.unit,
            unit_price: model.unit_price,
            line_total: model.line_total,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: i32,
    pub order_number: String,
    pub order_date: DateTime<Utc>,
    pub supplier_name: String,
    pub supplier_contact: Option<String>,
    pub supplier_email: Option<String>,
    pub supplier_phone: Option<String>,
    #[schema(value_type = f64)]
    pub total_amount: Decimal,
    #[schema(value_type = i32)]
    pub status: OrderStatus,
    pub expected_delivery_date: Option<DateTime<Utc>>,
    pub received_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub order_line_items: Vec<OrderLineItemResponse>,
}

impl OrderResponse {
    fn from_parts(model: OrderModel, mut items: Vec<LineItemModel>) -> Self {
        items.sort_by_key(|item| item.id);
        Self {
            id: model.id,
            order_number: model.order_number,
            order_date: model.order_date,
            supplier_name: model.supplier_name,
            supplier_contact: model.supplier_contact,
            supplier_email: model.supplier_email,
            supplier_phone: model.supplier_phone,
            total_amount: model.total_amount,
            status: model.status,
            expected_delivery_date: model.expected_delivery_date,
            received_date: model.received_date,
            notes: model.notes,
            created_by: model.created_by,
            created_at: model.created_at,
            updated_at: model.updated_at,
            order_line_items: items.into_iter().map(Into::into).collect(),
        }
    }
}

/// `PO-<UTC yyyymmdd>-<8 uppercase hex chars>`
pub fn generate_order_number(now: DateTime<Utc>) -> String {
    let suffix: String = Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(8)
        .collect::<String>()
        .to_uppercase();
    format!("PO-{}-{}", now.format("%Y%m%d"), suffix)
}

/// Turns an update that touched no row into NotFound or a concurrency conflict
pub(crate) async fn resolve_update_miss<E, C>(
    conn: &C,
    entity: &'static str,
    id: i32,
    err: DbErr,
) -> ServiceError
where
    E: EntityTrait,
    <E::PrimaryKey as sea_orm::PrimaryKeyTrait>::ValueType: From<i32>,
    C: ConnectionTrait,
{
    if !matches!(err, DbErr::RecordNotUpdated) {
        error!(error = %err, entity, id, "Failed to update record");
        return ServiceError::DatabaseError(err);
    }

    match E::find_by_id(id).one(conn).await {
        Ok(None) => ServiceError::NotFound(format!("{} with ID {} not found", entity, id)),
        Ok(Some(_)) => {
            warn!(entity, id, "Record changed concurrently");
            ServiceError::ConcurrencyConflict { entity, id }
        }
        Err(e) => ServiceError::DatabaseError(e),
    }
}

/// Service for managing purchase orders
#[derive(Clone)]
pub struct OrderService {
    db_pool: Arc<DbPool>,
}

impl OrderService {
    /// Creates a new order service instance
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Lists orders matching `filter`, newest first, with their line items
    #[instrument(skip(self))]
    pub async fn list_orders(&self, filter: OrderFilter) -> Result<Vec<OrderResponse>, ServiceError> {
        let db = &*self.db_pool;

        let backend = db.get_database_backend();

        let mut query = OrderEntity::find();
        if let Some(status) = filter.status {
            query = query.filter(order::Column::Status.eq(status));
        }
        if let Some(supplier) = &filter.supplier_name {
            query = query.filter(contains_literal(backend, order::Column::SupplierName, supplier));
        }
        if let Some(number) = &filter.order_number {
            query = query.filter(contains_literal(backend, order::Column::OrderNumber, number));
        }
        if let Some(start) = filter.start_date {
            query = query.filter(order::Column::OrderDate.gte(start));
        }
        if let Some(end) = filter.end_date {
            query = query.filter(order::Column::OrderDate.lte(end));
        }

        let orders = query
            .order_by_desc(order::Column::OrderDate)
            .order_by_desc(order::Column::Id)
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to list orders");
                ServiceError::DatabaseError(e)
            })?;

        let items = orders.load_many(LineItemEntity, db).await.map_err(|e| {
            error!(error = %e, "Failed to load line items for orders");
            ServiceError::DatabaseError(e)
        })?;

        let responses: Vec<OrderResponse> = orders
            .into_iter()
            .zip(items)
            .map(|(order, items)| OrderResponse::from_parts(order, items))
            .collect();

        info!(returned_count = responses.len(), "Orders listed successfully");
        Ok(responses)
    }

    /// Retrieves an order with its line items
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn get_order(&self, order_id: i32) -> Result<OrderResponse, ServiceError> {
        let db = &*self.db_pool;
        let order = find_order(db, order_id).await?;
        let items = load_items(db, order_id).await?;
        Ok(OrderResponse::from_parts(order, items))
    }

    /// Line items of an existing order
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn get_order_items(
        &self,
        order_id: i32,
    ) -> Result<Vec<OrderLineItemResponse>, ServiceError> {
        let db = &*self.db_pool;
        find_order(db, order_id).await?;
        let items = load_items(db, order_id).await?;
        Ok(items.into_iter().map(Into::into).collect())
    }

    /// Creates an order together with its initial line items
    #[instrument(skip(self, request), fields(supplier = %request.supplier_name))]
    pub async fn create_order(
        &self,
        request: CreateOrderRequest,
    ) -> Result<OrderResponse, ServiceError> {
        request.validate()?;
        for item in &request.order_line_items {
            item.validate()?;
        }

        let db = &*self.db_pool;
        let now = Utc::now();
        let order_number =
            non_blank(request.order_number.clone()).unwrap_or_else(|| generate_order_number(now));

        let priced: Vec<(NewLineItem, Decimal)> = request
            .order_line_items
            .iter()
            .cloned()
            .map(|item| {
                let total = totals::line_total(item.quantity, item.unit_price)?;
                Ok((item, total))
            })
            .collect::<Result<_, ServiceError>>()?;
        let total_amount = totals::order_total(priced.iter().map(|(_, total)| *total))?;

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for order creation");
            ServiceError::DatabaseError(e)
        })?;

        let existing = OrderEntity::find()
            .filter(order::Column::OrderNumber.eq(order_number.as_str()))
            .one(&txn)
            .await?;
        if existing.is_some() {
            warn!(order_number = %order_number, "Duplicate order number rejected");
            return Err(ServiceError::DuplicateOrderNumber(order_number));
        }

        let order_active_model = OrderActiveModel {
            order_number: Set(order_number.clone()),
            order_date: Set(request.order_date.unwrap_or(now)),
            supplier_name: Set(request.supplier_name),
            supplier_contact: Set(request.supplier_contact),
            supplier_email: Set(request.supplier_email),
            supplier_phone: Set(request.supplier_phone),
            total_amount: Set(total_amount),
            status: Set(OrderStatus::Draft),
            expected_delivery_date: Set(request.expected_delivery_date),
            received_date: Set(None),
            notes: Set(request.notes),
            created_by: Set(request.created_by),
            created_at: Set(now),
            updated_at: Set(None),
            ..Default::default()
        };

        let order_model = order_active_model.insert(&txn).await.map_err(|e| {
            if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                return ServiceError::DuplicateOrderNumber(order_number.clone());
            }
            error!(error = %e, "Failed to create order in database");
            ServiceError::DatabaseError(e)
        })?;

        let mut items = Vec::with_capacity(priced.len());
        for (item, line_total) in priced {
            let inserted = LineItemActiveModel {
                order_id: Set(order_model.id),
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
                error!(error = %e, order_id = order_model.id, "Failed to insert order line item");
                ServiceError::DatabaseError(e)
            })?;
            items.push(inserted);
        }

        txn.commit().await.map_err(|e| {
            error!(error = %e, order_id = order_model.id, "Failed to commit order creation transaction");
            ServiceError::DatabaseError(e)
        })?;

        metrics::counter!("store_orders.orders.created", 1);
        info!(
            order_id = order_model.id,
            order_number = %order_model.order_number,
            line_items = items.len(),
            "Order created successfully"
        );

        Ok(OrderResponse::from_parts(order_model, items))
    }

    /// Applies the present fields of `request`; a changed status is validated
    #[instrument(skip(self, request), fields(order_id = %order_id))]
    pub async fn update_order(
        &self,
        order_id: i32,
        request: UpdateOrderRequest,
    ) -> Result<(), ServiceError> {
        request.validate()?;

        let db = &*self.db_pool;
        let now = Utc::now();

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, order_id, "Failed to start transaction for order update");
            ServiceError::DatabaseError(e)
        })?;

        let order = find_order(&txn, order_id).await?;
        let current_status = order.status;
        let mut active: OrderActiveModel = order.into();

        if let Some(name) = request.supplier_name {
            active.supplier_name = Set(name);
        }
        if let Some(contact) = request.supplier_contact {
            active.supplier_contact = Set(Some(contact));
        }
        if let Some(email) = request.supplier_email {
            active.supplier_email = Set(Some(email));
        }
        if let Some(phone) = request.supplier_phone {
            active.supplier_phone = Set(Some(phone));
        }
        if let Some(expected) = request.expected_delivery_date {
            active.expected_delivery_date = Set(Some(expected));
        }
        if let Some(received) = request.received_date {
            active.received_date = Set(Some(received));
        }
        if let Some(notes) = request.notes {
            active.notes = Set(Some(notes));
        }
        if let Some(status) = request.status.filter(|s| *s != current_status) {
            apply_transition(&mut active, current_status, status, now)?;
        }
        active.updated_at = Set(Some(now));

        if let Err(e) = active.update(&txn).await {
            return Err(resolve_update_miss::<OrderEntity, _>(&txn, "Order", order_id, e).await);
        }

        txn.commit().await.map_err(|e| {
            error!(error = %e, order_id, "Failed to commit order update transaction");
            ServiceError::DatabaseError(e)
        })?;

        info!(order_id, "Order updated successfully");
        Ok(())
    }

    /// Moves an order through the status workflow, appending any notes
    #[instrument(skip(self, request), fields(order_id = %order_id, new_status = %request.status))]
    pub async fn update_order_status(
        &self,
        order_id: i32,
        request: UpdateOrderStatusRequest,
    ) -> Result<(), ServiceError> {
        request.validate()?;

        let db = &*self.db_pool;
        let now = Utc::now();

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, order_id, "Failed to start transaction for status update");
            ServiceError::DatabaseError(e)
        })?;

        let order = find_order(&txn, order_id).await?;
        let old_status = order.status;
        let existing_notes = order.notes.clone();
        let mut active: OrderActiveModel = order.into();

        apply_transition(&mut active, old_status, request.status, now)?;

        if let Some(note) = non_blank(request.notes) {
            active.notes = Set(Some(append_status_note(
                existing_notes.as_deref(),
                &note,
                now,
            )));
        }

        if let Err(e) = active.update(&txn).await {
            return Err(resolve_update_miss::<OrderEntity, _>(&txn, "Order", order_id, e).await);
        }

        txn.commit().await.map_err(|e| {
            error!(error = %e, order_id, "Failed to commit status update transaction");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            order_id,
            old_status = %old_status,
            new_status = %request.status,
            "Order status updated successfully"
        );
        Ok(())
    }

    /// Deletes an order and all of its line items
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn delete_order(&self, order_id: i32) -> Result<(), ServiceError> {
        let db = &*self.db_pool;

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, order_id, "Failed to start transaction for order deletion");
            ServiceError::DatabaseError(e)
        })?;

        find_order(&txn, order_id).await?;

        let removed_items = LineItemEntity::delete_many()
            .filter(order_line_item::Column::OrderId.eq(order_id))
            .exec(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, order_id, "Failed to delete order line items");
                ServiceError::DatabaseError(e)
            })?;

        OrderEntity::delete_by_id(order_id)
            .exec(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, order_id, "Failed to delete order");
                ServiceError::DatabaseError(e)
            })?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, order_id, "Failed to commit order deletion transaction");
            ServiceError::DatabaseError(e)
        })?;

        metrics::counter!("store_orders.orders.deleted", 1);
        info!(
            order_id,
            removed_items = removed_items.rows_affected,
            "Order deleted successfully"
        );
        Ok(())
    }
}

pub(crate) async fn find_order<C: ConnectionTrait>(
    conn: &C,
    order_id: i32,
) -> Result<OrderModel, ServiceError> {
    fetch_order(conn, OrderEntity::find_by_id(order_id), order_id).await
}

/// Selects an order row with a write lock held until the transaction ends
pub(crate) fn order_for_update(order_id: i32) -> Select<OrderEntity> {
    OrderEntity::find_by_id(order_id).lock_exclusive()
}

/// Like [`find_order`], but serializes concurrent writers of the order's total
pub(crate) async fn find_order_for_update<C: ConnectionTrait>(
    conn: &C,
    order_id: i32,
) -> Result<OrderModel, ServiceError> {
    fetch_order(conn, order_for_update(order_id), order_id).await
}

async fn fetch_order<C: ConnectionTrait>(
    conn: &C,
    select: Select<OrderEntity>,
    order_id: i32,
) -> Result<OrderModel, ServiceError> {
    select
        .one(conn)
        .await
        .map_err(|e| {
            error!(error = %e, order_id, "Failed to fetch order from database");
            ServiceError::DatabaseError(e)
        })?
        .ok_or_else(|| {
            info!(order_id, "Order not found");
            ServiceError::NotFound(format!("Order with ID {} not found", order_id))
        })
}

/// Case-sensitive substring match on `column`; `%` and `_` in `needle` are plain characters
pub(crate) fn contains_literal<C: ColumnTrait>(
    backend: DbBackend,
    column: C,
    needle: &str,
) -> SimpleExpr {
    let template = match backend {
        DbBackend::Postgres => "strpos($1, $2) > 0",
        DbBackend::MySql | DbBackend::Sqlite => "instr(?, ?) > 0",
    };
    Expr::cust_with_exprs(
        template,
        [
            Expr::col(column.as_column_ref()).into(),
            Expr::val(needle).into(),
        ],
    )
}

async fn load_items<C: ConnectionTrait>(
    conn: &C,
    order_id: i32,
) -> Result<Vec<LineItemModel>, ServiceError> {
    LineItemEntity::find()
        .filter(order_line_item::Column::OrderId.eq(order_id))
        .order_by_asc(order_line_item::Column::Id)
        .all(conn)
        .await
        .map_err(|e| {
            error!(error = %e, order_id, "Failed to fetch order line items");
            ServiceError::DatabaseError(e)
        })
}
