use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Store Order API",
        version = "1.0.0",
        description = r#"
# Purchase Order Management API

Create and track purchase orders placed with suppliers.

## Features

- **Orders**: Create, update, filter and delete purchase orders
- **Line Items**: Manage the priced lines of an order; order totals follow automatically
- **Status Workflow**: Draft through Received, with every transition checked

## Enumerations

Status and unit fields are exchanged as integer ordinals. The string name of a
variant is also accepted on input. `GET /api/orders/statuses` and
`GET /api/orders/units` list the known values.

## Error Handling

Failures return a consistent body:

```json
{
  "error": "Bad Request",
  "message": "Invalid status transition from Cancelled to Pending",
  "requestId": "req-abc123xyz",
  "timestamp": "2024-01-01T00:00:00Z"
}
```
"#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    tags(
        (name = "orders", description = "Purchase order management"),
        (name = "order-line-items", description = "Order line item management"),
    ),
    paths(
        crate::handlers::orders::list_orders,
        crate::handlers::orders::get_order,
        crate::handlers::orders::create_order,
        crate::handlers::orders::update_order,
        crate::handlers::orders::patch_order,
        crate::handlers::orders::update_order_status,
        crate::handlers::orders::delete_order,
        crate::handlers::orders::get_order_items,
        crate::handlers::orders::list_order_statuses,
        crate::handlers::orders::list_unit_types,
        crate::handlers::order_line_items::list_line_items,
        crate::handlers::order_line_items::get_line_item,
        crate::handlers::order_line_items::create_line_item,
        crate::handlers::order_line_items::update_line_item,
        crate::handlers::order_line_items::patch_line_item,
        crate::handlers::order_line_items::delete_line_item,
    ),
    components(
        schemas(
            crate::errors::ErrorResponse,
            crate::entities::EnumDescriptor,
            crate::services::orders::OrderResponse,
            crate::services::orders::OrderLineItemResponse,
            crate::services::orders::NewLineItem,
            crate::services::orders::CreateOrderRequest,
            crate::services::orders::UpdateOrderRequest,
            crate::services::orders::UpdateOrderStatusRequest,
            crate::services::order_line_items::CreateOrderLineItemRequest,
            crate::services::order_line_items::UpdateOrderLineItemRequest,
        )
    )
)]
pub struct ApiDoc;

/// Serve the generated document and the Swagger UI
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
