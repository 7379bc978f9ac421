pub mod inventory;
pub mod menu;
pub mod orders;
pub mod payments;
pub mod recipes;
pub mod tables;
