use super::common::{
    created_response, no_content_response, success_response, ApiPath, ValidatedJson,
};
use crate::{
    entities::{EnumDescriptor, OrderStatus, UnitType, WireEnum},
    errors::ServiceError,
    handlers::AppState,
    services::orders::{
        CreateOrderRequest, OrderFilter, OrderLineItemResponse, OrderQuery, OrderResponse,
        UpdateOrderRequest, UpdateOrderStatusRequest,
    },
};
use axum::{
    extract::{Query, State},
    response::Response,
    routing::{get, put},
    Router,
};
use tracing::info;

/// List orders
#[utoipa::path(
    get,
    path = "/api/orders",
    summary = "List orders",
    description = "Orders matching every supplied filter, newest order date first, each with its line items",
    params(OrderQuery),
    responses(
        (status = 200, description = "Orders retrieved successfully", body = [OrderResponse],
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Invalid filter value", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<OrderQuery>,
) -> Result<Response, ServiceError> {
    let filter = OrderFilter::try_from(query)?;
    let orders = state.services.order.list_orders(filter).await?;
    Ok(success_response(orders))
}

/// Get an order with its line items
#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    summary = "Get order",
    params(("id" = i32, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order retrieved successfully", body = OrderResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    tag = "orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Response, ServiceError> {
    let order = state.services.order.get_order(id).await?;
    Ok(success_response(order))
}

/// Create an order with its initial line items
#[utoipa::path(
    post,
    path = "/api/orders",
    summary = "Create order",
    description = "Creates a Draft order. The order number is generated when omitted and must be unique.",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created successfully", body = OrderResponse),
        (status = 400, description = "Invalid request data or duplicate order number", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateOrderRequest>,
) -> Result<Response, ServiceError> {
    let order = state.services.order.create_order(payload).await?;
    info!(order_id = order.id, order_number = %order.order_number, "Order created via API");
    Ok(created_response(order))
}

/// Update order fields (PUT and PATCH share partial semantics)
#[utoipa::path(
    put,
    path = "/api/orders/{id}",
    summary = "Update order",
    description = "Applies only the supplied fields. A changed status must be an allowed transition.",
    params(("id" = i32, Path, description = "Order ID")),
    request_body = UpdateOrderRequest,
    responses(
        (status = 204, description = "Order updated"),
        (status = 400, description = "Invalid request data or status transition", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    tag = "orders"
)]
pub async fn update_order(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ValidatedJson(payload): ValidatedJson<UpdateOrderRequest>,
) -> Result<Response, ServiceError> {
    state.services.order.update_order(id, payload).await?;
    Ok(no_content_response())
}

/// Partially update an order
#[utoipa::path(
    patch,
    path = "/api/orders/{id}",
    summary = "Patch order",
    params(("id" = i32, Path, description = "Order ID")),
    request_body = UpdateOrderRequest,
    responses(
        (status = 204, description = "Order updated"),
        (status = 400, description = "Invalid request data or status transition", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    tag = "orders"
)]
pub async fn patch_order(
    state: State<AppState>,
    id: ApiPath<i32>,
    payload: ValidatedJson<UpdateOrderRequest>,
) -> Result<Response, ServiceError> {
    update_order(state, id, payload).await
}

/// Move an order through the status workflow
#[utoipa::path(
    put,
    path = "/api/orders/{id}/status",
    summary = "Update order status",
    description = "Validates the transition, stamps the received date for receipt statuses and appends any notes.",
    params(("id" = i32, Path, description = "Order ID")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 204, description = "Status updated"),
        (status = 400, description = "Transition not allowed", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    tag = "orders"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ValidatedJson(payload): ValidatedJson<UpdateOrderStatusRequest>,
) -> Result<Response, ServiceError> {
    state.services.order.update_order_status(id, payload).await?;
    Ok(no_content_response())
}

/// Delete an order and its line items
#[utoipa::path(
    delete,
    path = "/api/orders/{id}",
    summary = "Delete order",
    params(("id" = i32, Path, description = "Order ID")),
    responses(
        (status = 204, description = "Order deleted"),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    tag = "orders"
)]
pub async fn delete_order(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Response, ServiceError> {
    state.services.order.delete_order(id).await?;
    info!(order_id = id, "Order deleted via API");
    Ok(no_content_response())
}

/// Line items of one order
#[utoipa::path(
    get,
    path = "/api/orders/{id}/items",
    summary = "List order items",
    params(("id" = i32, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Line items retrieved successfully", body = [OrderLineItemResponse]),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    tag = "orders"
)]
pub async fn get_order_items(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Response, ServiceError> {
    let items = state.services.order.get_order_items(id).await?;
    Ok(success_response(items))
}

/// Every order status with its ordinal and display name
#[utoipa::path(
    get,
    path = "/api/orders/statuses",
    summary = "List order statuses",
    responses((status = 200, description = "Order statuses", body = [EnumDescriptor])),
    tag = "orders"
)]
pub async fn list_order_statuses() -> Response {
    success_response(OrderStatus::descriptors())
}

/// Every unit of measure with its ordinal and display name
#[utoipa::path(
    get,
    path = "/api/orders/units",
    summary = "List units of measure",
    responses((status = 200, description = "Units of measure", body = [EnumDescriptor])),
    tag = "orders"
)]
pub async fn list_unit_types() -> Response {
    success_response(UnitType::descriptors())
}

/// Creates the router for order endpoints
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route("/statuses", get(list_order_statuses))
        .route("/units", get(list_unit_types))
        .route(
            "/:id",
            get(get_order)
                .put(update_order)
                .patch(patch_order)
                .delete(delete_order),
        )
        .route("/:id/status", put(update_order_status))
        .route("/:id/items", get(get_order_items))
}
