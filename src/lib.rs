//! boardgraph - board graph persistence for a desktop knowledge board
//!
//! Durable storage for boards, typed nodes, and typed relations, with
//! referential integrity, versioned schema migration, a write-through
//! aggregate cache, and lifecycle event notifications.
//!
//! ## Key Concepts
//!
//! - **Board**: top-level container owning nodes and their relations
//! - **Node**: a typed entity (file, folder, link, function, AI model)
//!   placed on a board at a 2-D position
//! - **Relation**: a directed or bidirectional typed edge between two nodes
//!   on the same board
//! - **Aggregate**: the in-memory materialized view of one board, cached
//!   per board id and kept current by the store's write path
//! - **Events**: every committed mutation publishes a [`DomainEvent`],
//!   fire-and-forget, to decoupled subscribers

pub mod cli;
pub mod config;
pub mod core;

pub use config::Config;
pub use core::aggregate::BoardAggregate;
pub use core::board::{Board, BoardDraft, BoardPatch, Visibility};
pub use core::error::StoreError;
pub use core::events::{DomainEvent, EventBus};
pub use core::node::{Node, NodeDraft, NodePatch, NodePayload, NodeType, Position};
pub use core::relation::{NodeRelation, RelationDefinition, RelationDirection, RelationPatch};
pub use core::schema::{SchemaManager, SCHEMA_VERSION};
pub use core::store::GraphStore;
