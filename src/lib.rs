//! Library exports for sessionguard, shared between the binary and tests.

pub mod auth;
pub mod bootstrap;
pub mod client;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod guard;
pub mod identity;
pub mod metrics;
pub mod models;
pub mod redirect;
pub mod relay;
pub mod routes;
pub mod startup;
pub mod state;
pub mod store;
pub mod utils;
