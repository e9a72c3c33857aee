pub mod config;
pub mod gateway;
pub mod handlers;
pub mod identity;
pub mod models;
pub mod notify;
pub mod routes;
pub mod services;
pub mod utils;
