//! Murmur API service.
//!
//! JSON endpoints for signing in, editing profiles, following users and
//! reading timelines.
//!
//! # Configuration
//!
//! See [`config::MurmurApiConfig`]. The store is picked by the database URL,
//! see [`murmur_db::storage::connect`].
//!
//! # Authentication
//!
//! Stateless session cookies signed with HMAC-SHA256. See [`auth::signing`]
//! for implementation details.

pub mod auth;
pub mod config;
pub mod server;

pub(crate) mod context;
pub(crate) mod error;
pub(crate) mod handlers;
