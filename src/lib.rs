//! # Backoffice API Library
//!
//! Multi-tenant back-office service: companies, versioned provider contracts, points of
//! sale, payment orders, users and a knowledge base, behind a JWT-authenticated REST API.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod notifier;
pub mod repositories;
pub mod server;
pub mod services;
pub mod session;
pub mod telemetry;
pub use migration;
