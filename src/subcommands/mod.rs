pub mod clear;
pub mod items;
pub mod list_tables;
pub mod remove;
pub mod update;
