// Library interface for skinai-server
// Exposes modules for integration testing

pub mod api;
pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod db;
pub mod dermato;
pub mod error_buffer;
pub mod health;
pub mod logging;
pub mod models;
pub mod news;
pub mod telegram;
