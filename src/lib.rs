pub mod admin;
pub mod config;
pub mod error;
pub mod model;
pub mod security;
pub mod server;
pub mod storage;
pub mod uploads;
