// Order and line-item services
pub mod order_line_items;
pub mod orders;

// Pure business rules shared by the services
pub mod order_status;
pub mod totals;
