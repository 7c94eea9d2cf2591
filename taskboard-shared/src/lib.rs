//! # Taskboard Shared Library
//!
//! Domain types, persistence and business rules used by the Taskboard API
//! server.
//!
//! ## Module Organization
//!
//! - `models`: Users, tasks and their input types
//! - `store`: Store capability with PostgreSQL and in-memory backends
//! - `db`: PostgreSQL pool and migrations
//! - `auth`: Passwords, JWTs, request authentication, ownership rule
//! - `tasks`: Board, listing and task lifecycle services
//! - `accounts`: Registration, login, token rotation and profiles
//! - `error`: Service error taxonomy

pub mod accounts;
pub mod auth;
pub mod db;
pub mod error;
pub mod models;
pub mod store;
pub mod tasks;

/// Current version of the Taskboard shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
