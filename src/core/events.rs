//! Domain events for the board graph store
//!
//! Every committed mutation publishes one event so collaborators (UI,
//! search, future sync) can react without polling. Delivery is fire and
//! forget over a broadcast channel: the mutation has already committed by
//! the time the event goes out, and a missing or lagging subscriber never
//! affects it.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use ulid::Ulid;

use super::board::Board;
use super::node::Node;
use super::relation::NodeRelation;

/// Lifecycle events emitted by the store
///
/// Create/update events carry the entity; delete events carry only the ids
/// needed to identify what went away.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    BoardCreated(Board),
    BoardUpdated(Board),
    BoardDeleted { id: Ulid },

    NodeCreated(Node),
    NodeUpdated(Node),
    NodeDeleted { board_id: Ulid, id: Ulid },

    RelationCreated(NodeRelation),
    RelationUpdated(NodeRelation),
    RelationDeleted {
        board_id: Ulid,
        source_id: Ulid,
        target_id: Ulid,
    },
}

impl DomainEvent {
    /// Stable event-type name, useful for logging and routing
    pub fn event_type(&self) -> &'static str {
        match self {
            DomainEvent::BoardCreated(_) => "board:created",
            DomainEvent::BoardUpdated(_) => "board:updated",
            DomainEvent::BoardDeleted { .. } => "board:deleted",
            DomainEvent::NodeCreated(_) => "node:created",
            DomainEvent::NodeUpdated(_) => "node:updated",
            DomainEvent::NodeDeleted { .. } => "node:deleted",
            DomainEvent::RelationCreated(_) => "relation:created",
            DomainEvent::RelationUpdated(_) => "relation:updated",
            DomainEvent::RelationDeleted { .. } => "relation:deleted",
        }
    }
}

/// Publish/subscribe fan-out for [`DomainEvent`]s
///
/// The store holds a bus by injection rather than inheriting emitter
/// behavior; anything else that wants events calls [`EventBus::subscribe`].
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<DomainEvent>,
}

impl EventBus {
    /// Create a bus with room for `capacity` undelivered events per receiver
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish an event to all current subscribers
    ///
    /// Returns the number of receivers the event reached. Zero subscribers
    /// is not an error.
    pub fn publish(&self, event: DomainEvent) -> usize {
        let name = event.event_type();
        match self.tx.send(event) {
            Ok(count) => {
                tracing::debug!(event = name, receivers = count, "published");
                count
            }
            Err(_) => 0,
        }
    }

    /// Get an independent receiver for all future events
    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        // 256 pending events per receiver before a slow subscriber lags
        Self::new(256)
    }
}
