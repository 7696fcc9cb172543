pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod geo;
pub mod mapping;
pub mod models;
pub mod observability;
pub mod source;
pub mod state;
