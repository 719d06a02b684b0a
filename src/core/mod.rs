//! Core module - board graph domain and persistence
//!
//! Contains the domain types and the storage, caching, and event layers.

pub mod aggregate;
pub mod board;
pub mod cache;
pub mod error;
pub mod events;
pub mod node;
pub mod relation;
pub mod schema;
pub mod store;
