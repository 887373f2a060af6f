//! # Taskly Shared Library
//!
//! This crate contains the data layer, authentication primitives and
//! reporting logic used by the Taskly API server.
//!
//! ## Module Organization
//!
//! - `db`: SQLite connection pool and migrations
//! - `models`: Users, access tokens, categories and tasks with their store operations
//! - `auth`: Password hashing, bearer tokens, request sessions and policy checks
//! - `stats`: Aggregate dashboard statistics

pub mod auth;
pub mod db;
pub mod models;
pub mod stats;

/// Current version of the Taskly shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
