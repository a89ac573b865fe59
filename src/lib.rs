pub mod ai;
pub mod app;
pub mod appointments;
pub mod auth;
pub mod config;
pub mod dates;
pub mod doctors;
pub mod error;
pub mod insurance;
pub mod manager;
pub mod notifications;
pub mod parser;
pub mod records;
pub mod state;
pub mod storage;
pub mod store;
pub mod users;
pub mod validation;
