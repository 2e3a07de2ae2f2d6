use super::common::{
    created_response, no_content_response, success_response, ApiPath, ValidatedJson,
};
use crate::{
    errors::ServiceError,
    handlers::AppState,
    services::{
        order_line_items::{
            CreateOrderLineItemRequest, LineItemFilter, LineItemQuery, UpdateOrderLineItemRequest,
        },
        orders::OrderLineItemResponse,
    },
};
use axum::{
    extract::{Query, State},
    response::Response,
    routing::get,
    Router,
};

/// List line items across orders
#[utoipa::path(
    get,
    path = "/api/orderlineitems",
    summary = "List order line items",
    description = "Line items matching every supplied filter, highest id first",
    params(LineItemQuery),
    responses(
        (status = 200, description = "Line items retrieved successfully", body = [OrderLineItemResponse]),
        (status = 400, description = "Invalid filter value", body = crate::errors::ErrorResponse),
    ),
    tag = "order-line-items"
)]
pub async fn list_line_items(
    State(state): State<AppState>,
    Query(query): Query<LineItemQuery>,
) -> Result<Response, ServiceError> {
    let filter = LineItemFilter::try_from(query)?;
    let items = state
        .services
        .order_line_items
        .list_line_items(filter)
        .await?;
    Ok(success_response(items))
}

#[utoipa::path(
    get,
    path = "/api/orderlineitems/{id}",
    summary = "Get order line item",
    params(("id" = i32, Path, description = "Line item ID")),
    responses(
        (status = 200, description = "Line item retrieved successfully", body = OrderLineItemResponse),
        (status = 404, description = "Line item not found", body = crate::errors::ErrorResponse),
    ),
    tag = "order-line-items"
)]
pub async fn get_line_item(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Response, ServiceError> {
    let item = state.services.order_line_items.get_line_item(id).await?;
    Ok(success_response(item))
}

/// Add a line item to an order; the order total grows by its line total
#[utoipa::path(
    post,
    path = "/api/orderlineitems",
    summary = "Create order line item",
    request_body = CreateOrderLineItemRequest,
    responses(
        (status = 201, description = "Line item created", body = OrderLineItemResponse),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    tag = "order-line-items"
)]
pub async fn create_line_item(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateOrderLineItemRequest>,
) -> Result<Response, ServiceError> {
    let item = state
        .services
        .order_line_items
        .create_line_item(payload)
        .await?;
    Ok(created_response(item))
}

/// Update line-item fields (PUT and PATCH share partial semantics)
#[utoipa::path(
    put,
    path = "/api/orderlineitems/{id}",
    summary = "Update order line item",
    description = "Applies only the supplied fields, recomputes the line total and adjusts the order total by the difference.",
    params(("id" = i32, Path, description = "Line item ID")),
    request_body = UpdateOrderLineItemRequest,
    responses(
        (status = 204, description = "Line item updated"),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 404, description = "Line item not found", body = crate::errors::ErrorResponse),
    ),
    tag = "order-line-items"
)]
pub async fn update_line_item(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ValidatedJson(payload): ValidatedJson<UpdateOrderLineItemRequest>,
) -> Result<Response, ServiceError> {
    state
        .services
        .order_line_items
        .update_line_item(id, payload)
        .await?;
    Ok(no_content_response())
}

#[utoipa::path(
    patch,
    path = "/api/orderlineitems/{id}",
    summary = "Patch order line item",
    params(("id" = i32, Path, description = "Line item ID")),
    request_body = UpdateOrderLineItemRequest,
    responses(
        (status = 204, description = "Line item updated"),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 404, description = "Line item not found", body = crate::errors::ErrorResponse),
    ),
    tag = "order-line-items"
)]
pub async fn patch_line_item(
    state: State<AppState>,
    id: ApiPath<i32>,
    payload: ValidatedJson<UpdateOrderLineItemRequest>,
) -> Result<Response, ServiceError> {
    update_line_item(state, id, payload).await
}

/// Remove a line item; the order total shrinks by its line total
#[utoipa::path(
    delete,
    path = "/api/orderlineitems/{id}",
    summary = "Delete order line item",
    params(("id" = i32, Path, description = "Line item ID")),
    responses(
        (status = 204, description = "Line item deleted"),
        (status = 404, description = "Line item not found", body = crate::errors::ErrorResponse),
    ),
    tag = "order-line-items"
)]
pub async fn delete_line_item(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Response, ServiceError> {
    state.services.order_line_items.delete_line_item(id).await?;
    Ok(no_content_response())
}

/// Creates the router for line-item endpoints
pub fn order_line_item_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_line_items).post(create_line_item))
        .route(
            "/:id",
            get(get_line_item)
                .put(update_line_item)
                .patch(patch_line_item)
                .delete(delete_line_item),
        )
}
