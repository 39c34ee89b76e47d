//! Todo items owned by users, served as a JSON API, plus a client view-model.

pub mod app;
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod memory;
pub mod state;
pub mod todos;
