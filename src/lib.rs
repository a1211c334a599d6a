pub mod api;
pub mod config;
pub mod conversation;
pub mod error;
pub mod extraction;
pub mod geo;
pub mod mirror;
pub mod models;
pub mod observability;
pub mod speech;
pub mod state;
pub mod store;
