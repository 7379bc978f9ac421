pub mod common;
pub mod inventory;
pub mod menu;
pub mod orders;
pub mod pos;
pub mod recipes;
pub mod tables;
