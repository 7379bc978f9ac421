pub mod dining_table;
pub mod inventory_item;
pub mod menu_item;
pub mod order;
pub mod order_item;
pub mod payment;
pub mod recipe;
