//! # Taskly API Server Library
//!
//! This library provides the HTTP surface of Taskly: a JSON API for
//! personal tasks grouped by category, with an admin surface for managing
//! users and tasks.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `bootstrap`: Startup tasks (bootstrap admin account)
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: Body and path extractors that reject with API errors
//! - `middleware`: Security headers
//! - `routes`: API route handlers

pub mod app;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
