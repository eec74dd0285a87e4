//! Folio Server
//!
//! Content and permissions backend: users, roles with bitmask permissions,
//! markdown posts, tags and an append-only audit trail.

pub mod api;
pub mod audit;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod observability;
pub mod permissions;
pub mod posts;
pub mod roles;
pub mod tags;
pub mod users;
