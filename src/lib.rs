pub mod auth;
pub mod business;
pub mod category;
pub mod config;
pub mod errors;
pub mod extractors;
pub mod health;
pub mod openapi;
