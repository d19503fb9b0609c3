//! Persistence for Murmur: database models, the storage traits and their
//! Postgres and in-memory implementations, plus the account and social-graph
//! logic that sits directly on top of them.

pub mod accounts;
pub mod models;
pub mod schema;
pub mod storage;
