//! # Shopfront server
//! This module hosts the REST surface of the Shopfront e-commerce backend. It is responsible for:
//! Authenticating customers via JWT access tokens.
//! Exposing the cart store and its sync endpoint.
//! Exposing checkout, order queries and the admin order-status endpoints.
//! Driving Khalti payment sessions and the reconciliation callbacks (redirect and webhook).
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
pub mod auth;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod integrations;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
