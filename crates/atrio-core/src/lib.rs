//! Core atrio library (API clients, sessions, token storage, config).

pub mod api;
pub mod config;
pub mod session;
pub mod store;
