pub mod catalog;
pub mod config;
pub mod generator;
pub mod lifecycle;
pub mod server;
pub mod util;
