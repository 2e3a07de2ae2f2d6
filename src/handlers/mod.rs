pub mod common;
pub mod order_line_items;
pub mod orders;

use crate::db::DbPool;
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub order: Arc<crate::services::orders::OrderService>,
    pub order_line_items: Arc<crate::services::order_line_items::OrderLineItemService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self {
            order: Arc::new(crate::services::orders::OrderService::new(db_pool.clone())),
            order_line_items: Arc::new(
                crate::services::order_line_items::OrderLineItemService::new(db_pool),
            ),
        }
    }
}
