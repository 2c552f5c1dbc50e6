pub mod aws;
pub mod config;
pub mod dynamodb;
pub mod grid;
pub mod util;
