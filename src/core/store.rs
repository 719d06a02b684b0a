//! GraphStore - durable CRUD for boards, nodes, and relations
//!
//! One SQLite connection, opened and migrated by
//! [`SchemaManager`](super::schema::SchemaManager), serializes every durable
//! write. A write-through registry of [`BoardAggregate`]s sits in front of
//! reads; the registry is mutated only from this write path, so callers
//! never observe a cache state that disagrees with a committed write.
//!
//! Referential integrity is checked against the rows (the source of truth)
//! before any write, and FK cascades clean up dependents on deletion.

use std::path::Path;

use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};
use ulid::Ulid;

use super::aggregate::BoardAggregate;
use super::board::{Board, BoardDraft, BoardPatch};
use super::cache::MemoCache;
use super::error::{Result, StoreError};
use super::events::{DomainEvent, EventBus};
use super::node::{Node, NodeDraft, NodePatch};
use super::relation::{NodeRelation, RelationDirection, RelationPatch};
use super::schema::SchemaManager;

const BOARD_COLUMNS: &str = "id, owner_id, name, description, visibility, created_at, updated_at";
const NODE_COLUMNS: &str = "id, board_id, owner_id, node_type, name, description, visibility, \
                            position, payload, metadata, created_at, updated_at";
const RELATION_COLUMNS: &str =
    "id, board_id, source_id, target_id, direction, definition, metadata, created_at, updated_at";

/// The board graph persistence layer
pub struct GraphStore {
    conn: Connection,
    registry: MemoCache<Ulid, BoardAggregate>,
    events: EventBus,
}

impl GraphStore {
    /// Open the store at `path`, creating and migrating it as needed
    ///
    /// The event bus is injected so collaborators can hold their own clone
    /// and subscribe independently of the store's lifetime.
    pub fn open(path: &Path, key: Option<&str>, events: EventBus) -> Result<Self> {
        let conn = SchemaManager::open_or_initialize(path, key)?;
        Ok(Self {
            conn,
            registry: MemoCache::new(),
            events,
        })
    }

    /// Open an in-memory store (for testing)
    pub fn open_in_memory(events: EventBus) -> Result<Self> {
        Ok(Self {
            conn: SchemaManager::open_in_memory()?,
            registry: MemoCache::new(),
            events,
        })
    }

    /// The injected event bus
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Release the storage connection
    ///
    /// Consuming, so a double close cannot happen; safe to call during
    /// application shutdown.
    pub fn close(self) -> Result<()> {
        self.registry.clear();
        self.conn.close().map_err(|(_, e)| e.into())
    }

    // --- Board operations ---

    /// Create a board owned by `owner_id`
    pub fn create_board(&self, owner_id: &str, draft: BoardDraft) -> Result<Board> {
        if owner_id.trim().is_empty() {
            return Err(StoreError::validation("board owner must not be empty"));
        }

        let board = Board::new(owner_id, draft);
        self.conn.execute(
            &format!("INSERT INTO boards ({BOARD_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"),
            params![
                board.id.to_string(),
                board.owner_id,
                board.name,
                board.description,
                board.visibility.to_string(),
                board.created_at.to_rfc3339(),
                board.updated_at.to_rfc3339(),
            ],
        )?;

        tracing::debug!(board = %board.id, owner = %board.owner_id, "board created");
        self.registry.set(board.id, BoardAggregate::empty(board.clone()));
        self.events.publish(DomainEvent::BoardCreated(board.clone()));
        Ok(board)
    }

    /// Get a board as its materialized aggregate
    ///
    /// Served from the registry when present; otherwise the board row plus
    /// all node and relation rows are loaded in bulk, assembled, and cached.
    pub fn get_board(&self, id: Ulid) -> Result<Option<BoardAggregate>> {
        if let Some(aggregate) = self.registry.get(&id) {
            return Ok(Some(aggregate));
        }

        let Some(board) = self.get_board_row(id)? else {
            return Ok(None);
        };
        let nodes = self.get_board_nodes(id)?;
        let relations = self.get_board_relations(id)?;

        let aggregate = BoardAggregate::assemble(board, nodes, relations);
        self.registry.set(id, aggregate.clone());
        Ok(Some(aggregate))
    }

    /// Merge a partial update onto a board
    pub fn update_board(&self, id: Ulid, patch: BoardPatch) -> Result<Option<Board>> {
        let Some(mut board) = self.get_board_row(id)? else {
            return Ok(None);
        };
        board.apply(patch);

        self.conn.execute(
            "UPDATE boards SET name = ?2, description = ?3, visibility = ?4, updated_at = ?5
             WHERE id = ?1",
            params![
                board.id.to_string(),
                board.name,
                board.description,
                board.visibility.to_string(),
                board.updated_at.to_rfc3339(),
            ],
        )?;

        self.registry.update(&id, |aggregate| aggregate.board = board.clone());
        self.events.publish(DomainEvent::BoardUpdated(board.clone()));
        Ok(Some(board))
    }

    /// Delete a board; nodes and relations cascade with it
    pub fn delete_board(&self, id: Ulid) -> Result<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM boards WHERE id = ?1", [id.to_string()])?;

        self.registry.invalidate(&id);
        if removed > 0 {
            tracing::debug!(board = %id, "board deleted");
            self.events.publish(DomainEvent::BoardDeleted { id });
        }
        Ok(removed > 0)
    }

    /// List boards owned by `owner_id`, newest first
    pub fn get_user_boards(&self, owner_id: &str) -> Result<Vec<Board>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {BOARD_COLUMNS} FROM boards WHERE owner_id = ?1 ORDER BY created_at DESC"
        ))?;
        let boards = stmt
            .query_map([owner_id], row_to_board)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(boards)
    }

    // --- Node operations ---

    /// Create a node on an existing board
    pub fn create_node(&self, board_id: Ulid, draft: NodeDraft) -> Result<Node> {
        let Some(board) = self.get_board_row(board_id)? else {
            return Err(StoreError::not_found(format!("board {}", board_id)));
        };

        let owner = draft
            .owner_id
            .clone()
            .unwrap_or_else(|| board.owner_id.clone());
        let node = Node::new(board_id, owner, draft);

        self.conn.execute(
            &format!(
                "INSERT INTO nodes ({NODE_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
            ),
            params![
                node.id.to_string(),
                node.board_id.to_string(),
                node.owner_id,
                node.node_type.to_string(),
                node.name,
                node.description,
                node.visibility.to_string(),
                serde_json::to_string(&node.position)?,
                node.payload
                    .as_ref()
                    .map(serde_json::to_string)
                    .transpose()?,
                node.metadata
                    .as_ref()
                    .map(serde_json::to_string)
                    .transpose()?,
                node.created_at.to_rfc3339(),
                node.updated_at.to_rfc3339(),
            ],
        )?;

        tracing::debug!(board = %board_id, node = %node.id, kind = %node.node_type, "node created");
        self.registry
            .update(&board_id, |aggregate| aggregate.insert_node(node.clone()));
        self.events.publish(DomainEvent::NodeCreated(node.clone()));
        Ok(node)
    }

    /// Get one node scoped to its board
    pub fn get_node(&self, board_id: Ulid, id: Ulid) -> Result<Option<Node>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {NODE_COLUMNS} FROM nodes WHERE id = ?1 AND board_id = ?2"
        ))?;
        match stmt.query_row(
            params![id.to_string(), board_id.to_string()],
            row_to_node,
        ) {
            Ok(node) => Ok(Some(node)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Merge a partial update onto a node
    pub fn update_node(&self, board_id: Ulid, id: Ulid, patch: NodePatch) -> Result<Option<Node>> {
        let Some(mut node) = self.get_node(board_id, id)? else {
            return Ok(None);
        };
        node.apply(patch);

        self.conn.execute(
            "UPDATE nodes SET node_type = ?2, name = ?3, description = ?4, visibility = ?5,
                              position = ?6, payload = ?7, metadata = ?8, updated_at = ?9
             WHERE id = ?1",
            params![
                node.id.to_string(),
                node.node_type.to_string(),
                node.name,
                node.description,
                node.visibility.to_string(),
                serde_json::to_string(&node.position)?,
                node.payload
                    .as_ref()
                    .map(serde_json::to_string)
                    .transpose()?,
                node.metadata
                    .as_ref()
                    .map(serde_json::to_string)
                    .transpose()?,
                node.updated_at.to_rfc3339(),
            ],
        )?;

        self.registry
            .update(&board_id, |aggregate| aggregate.insert_node(node.clone()));
        self.events.publish(DomainEvent::NodeUpdated(node.clone()));
        Ok(Some(node))
    }

    /// Delete a node; every relation it is an endpoint of cascades with it
    pub fn delete_node(&self, board_id: Ulid, id: Ulid) -> Result<bool> {
        let removed = self.conn.execute(
            "DELETE FROM nodes WHERE id = ?1 AND board_id = ?2",
            params![id.to_string(), board_id.to_string()],
        )?;

        if removed > 0 {
            tracing::debug!(board = %board_id, node = %id, "node deleted");
            self.registry.update(&board_id, |aggregate| {
                aggregate.remove_node(&id);
            });
            self.events.publish(DomainEvent::NodeDeleted { board_id, id });
        }
        Ok(removed > 0)
    }

    /// Flat list of a board's nodes, in insertion order
    pub fn get_board_nodes(&self, board_id: Ulid) -> Result<Vec<Node>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {NODE_COLUMNS} FROM nodes WHERE board_id = ?1 ORDER BY rowid"
        ))?;
        let nodes = stmt
            .query_map([board_id.to_string()], row_to_node)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(nodes)
    }

    // --- Relation operations ---

    /// Create a relation between two nodes on the same board
    ///
    /// The board and both endpoints are verified before any write; on
    /// failure no row is written.
    pub fn create_relation(
        &self,
        board_id: Ulid,
        source_id: Ulid,
        target_id: Ulid,
        direction: RelationDirection,
    ) -> Result<NodeRelation> {
        if self.get_board_row(board_id)?.is_none() {
            return Err(StoreError::not_found(format!("board {}", board_id)));
        }
        self.require_node_on_board(board_id, source_id)?;
        self.require_node_on_board(board_id, target_id)?;

        let relation = NodeRelation::new(board_id, source_id, target_id, direction);
        self.insert_relation_row(&relation)?;

        tracing::debug!(
            board = %board_id, source = %source_id, target = %target_id,
            "relation created"
        );
        self.registry.update(&board_id, |aggregate| {
            aggregate.append_relation(relation.clone())
        });
        self.events
            .publish(DomainEvent::RelationCreated(relation.clone()));
        Ok(relation)
    }

    /// Merge a partial update onto a relation
    ///
    /// Changed endpoints are re-validated against the board before commit;
    /// a changed source moves the relation between adjacency buckets.
    pub fn update_relation(
        &self,
        board_id: Ulid,
        id: Ulid,
        patch: RelationPatch,
    ) -> Result<Option<NodeRelation>> {
        let Some(mut relation) = self.get_relation_row(board_id, id)? else {
            return Ok(None);
        };

        if let Some(source_id) = patch.source_id {
            if source_id != relation.source_id {
                self.require_node_on_board(board_id, source_id)?;
            }
        }
        if let Some(target_id) = patch.target_id {
            if target_id != relation.target_id {
                self.require_node_on_board(board_id, target_id)?;
            }
        }

        relation.apply(patch);

        self.conn.execute(
            "UPDATE relations SET source_id = ?2, target_id = ?3, direction = ?4,
                                  definition = ?5, metadata = ?6, updated_at = ?7
             WHERE id = ?1",
            params![
                relation.id.to_string(),
                relation.source_id.to_string(),
                relation.target_id.to_string(),
                relation.direction.to_string(),
                relation
                    .definition
                    .as_ref()
                    .map(serde_json::to_string)
                    .transpose()?,
                relation
                    .metadata
                    .as_ref()
                    .map(serde_json::to_string)
                    .transpose()?,
                relation.updated_at.to_rfc3339(),
            ],
        )?;

        self.registry.update(&board_id, |aggregate| {
            aggregate.replace_relation(relation.clone())
        });
        self.events
            .publish(DomainEvent::RelationUpdated(relation.clone()));
        Ok(Some(relation))
    }

    /// Delete every relation on an exact (source, target) pair
    ///
    /// This is a bulk operation: distinct relations sharing the endpoint
    /// pair (the row key is the relation id) all go together.
    pub fn delete_relation(
        &self,
        board_id: Ulid,
        source_id: Ulid,
        target_id: Ulid,
    ) -> Result<bool> {
        let removed = self.conn.execute(
            "DELETE FROM relations WHERE board_id = ?1 AND source_id = ?2 AND target_id = ?3",
            params![
                board_id.to_string(),
                source_id.to_string(),
                target_id.to_string(),
            ],
        )?;

        if removed > 0 {
            tracing::debug!(
                board = %board_id, source = %source_id, target = %target_id,
                count = removed, "relations deleted"
            );
            self.registry.update(&board_id, |aggregate| {
                aggregate.remove_relations_by_pair(&source_id, &target_id);
            });
            self.events.publish(DomainEvent::RelationDeleted {
                board_id,
                source_id,
                target_id,
            });
        }
        Ok(removed > 0)
    }

    /// Flat list of a board's relations, in insertion order
    pub fn get_board_relations(&self, board_id: Ulid) -> Result<Vec<NodeRelation>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {RELATION_COLUMNS} FROM relations WHERE board_id = ?1 ORDER BY rowid"
        ))?;
        let relations = stmt
            .query_map([board_id.to_string()], row_to_relation)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(relations)
    }

    /// Row counts per table
    pub fn stats(&self) -> Result<StoreStats> {
        let boards: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM boards", [], |row| row.get(0))?;
        let nodes: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM nodes", [], |row| row.get(0))?;
        let relations: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM relations", [], |row| row.get(0))?;

        Ok(StoreStats {
            boards,
            nodes,
            relations,
        })
    }

    // --- Row-level helpers ---

    fn get_board_row(&self, id: Ulid) -> Result<Option<Board>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {BOARD_COLUMNS} FROM boards WHERE id = ?1"))?;
        match stmt.query_row([id.to_string()], row_to_board) {
            Ok(board) => Ok(Some(board)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn get_relation_row(&self, board_id: Ulid, id: Ulid) -> Result<Option<NodeRelation>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {RELATION_COLUMNS} FROM relations WHERE id = ?1 AND board_id = ?2"
        ))?;
        match stmt.query_row(
            params![id.to_string(), board_id.to_string()],
            row_to_relation,
        ) {
            Ok(relation) => Ok(Some(relation)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn require_node_on_board(&self, board_id: Ulid, id: Ulid) -> Result<()> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM nodes WHERE id = ?1 AND board_id = ?2",
            params![id.to_string(), board_id.to_string()],
            |row| row.get(0),
        )?;
        if count == 0 {
            return Err(StoreError::not_found(format!(
                "node {} on board {}",
                id, board_id
            )));
        }
        Ok(())
    }

    fn insert_relation_row(&self, relation: &NodeRelation) -> Result<()> {
        self.conn.execute(
            &format!(
                "INSERT INTO relations ({RELATION_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
            ),
            params![
                relation.id.to_string(),
                relation.board_id.to_string(),
                relation.source_id.to_string(),
                relation.target_id.to_string(),
                relation.direction.to_string(),
                relation
                    .definition
                    .as_ref()
                    .map(serde_json::to_string)
                    .transpose()?,
                relation
                    .metadata
                    .as_ref()
                    .map(serde_json::to_string)
                    .transpose()?,
                relation.created_at.to_rfc3339(),
                relation.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}

/// Store statistics
#[derive(Debug, Clone, Copy)]
pub struct StoreStats {
    pub boards: i64,
    pub nodes: i64,
    pub relations: i64,
}

// --- Row mapping ---

fn conversion_failure(
    idx: usize,
    err: impl Into<Box<dyn std::error::Error + Send + Sync>>,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, err.into())
}

fn parse_ulid(idx: usize, raw: String) -> rusqlite::Result<Ulid> {
    Ulid::from_string(&raw).map_err(|e| conversion_failure(idx, e))
}

fn parse_time(idx: usize, raw: String) -> rusqlite::Result<chrono::DateTime<chrono::Utc>> {
    chrono::DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .map_err(|e| conversion_failure(idx, e))
}

fn parse_json<T: serde::de::DeserializeOwned>(
    idx: usize,
    raw: Option<String>,
) -> rusqlite::Result<Option<T>> {
    raw.map(|text| serde_json::from_str(&text).map_err(|e| conversion_failure(idx, e)))
        .transpose()
}

fn row_to_board(row: &Row) -> rusqlite::Result<Board> {
    Ok(Board {
        id: parse_ulid(0, row.get(0)?)?,
        owner_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        visibility: row
            .get::<_, String>(4)?
            .parse()
            .map_err(|e: String| conversion_failure(4, e))?,
        created_at: parse_time(5, row.get(5)?)?,
        updated_at: parse_time(6, row.get(6)?)?,
    })
}

fn row_to_node(row: &Row) -> rusqlite::Result<Node> {
    Ok(Node {
        id: parse_ulid(0, row.get(0)?)?,
        board_id: parse_ulid(1, row.get(1)?)?,
        owner_id: row.get(2)?,
        node_type: row
            .get::<_, String>(3)?
            .parse()
            .map_err(|e: String| conversion_failure(3, e))?,
        name: row.get(4)?,
        description: row.get(5)?,
        visibility: row
            .get::<_, String>(6)?
            .parse()
            .map_err(|e: String| conversion_failure(6, e))?,
        position: parse_json(7, row.get(7)?)?.unwrap_or_default(),
        payload: parse_json(8, row.get(8)?)?,
        metadata: parse_json(9, row.get(9)?)?,
        created_at: parse_time(10, row.get(10)?)?,
        updated_at: parse_time(11, row.get(11)?)?,
    })
}

fn row_to_relation(row: &Row) -> rusqlite::Result<NodeRelation> {
    Ok(NodeRelation {
        id: parse_ulid(0, row.get(0)?)?,
        board_id: parse_ulid(1, row.get(1)?)?,
        source_id: parse_ulid(2, row.get(2)?)?,
        target_id: parse_ulid(3, row.get(3)?)?,
        direction: row
            .get::<_, String>(4)?
            .parse()
            .map_err(|e: String| conversion_failure(4, e))?,
        definition: parse_json(5, row.get(5)?)?,
        metadata: parse_json(6, row.get(6)?)?,
        created_at: parse_time(7, row.get(7)?)?,
        updated_at: parse_time(8, row.get(8)?)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::node::{NodePayload, Position};
    use serde_json::json;

    fn store() -> GraphStore {
        GraphStore::open_in_memory(EventBus::default()).unwrap()
    }

    fn draft_named(name: &str) -> NodeDraft {
        NodeDraft {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_create_and_get_board() -> Result<()> {
        let store = store();

        let board = store.create_board("u1", BoardDraft::default())?;
        assert_eq!(board.name, "Untitled Board");

        let aggregate = store.get_board(board.id)?.unwrap();
        assert_eq!(aggregate.board, board);
        assert!(aggregate.nodes.is_empty());

        let other = store.create_board("u1", BoardDraft::default())?;
        assert_ne!(board.id, other.id);
        Ok(())
    }

    #[test]
    fn test_create_board_requires_owner() {
        let store = store();
        let result = store.create_board("  ", BoardDraft::default());
        assert!(matches!(result, Err(StoreError::Validation(_))));
    }

    #[test]
    fn test_get_missing_board_is_none() -> Result<()> {
        let store = store();
        assert!(store.get_board(Ulid::new())?.is_none());
        Ok(())
    }

    #[test]
    fn test_update_board_merges_fields() -> Result<()> {
        let store = store();
        let board = store.create_board("u1", BoardDraft::default())?;

        let updated = store
            .update_board(
                board.id,
                BoardPatch {
                    name: Some("Research".to_string()),
                    ..Default::default()
                },
            )?
            .unwrap();

        assert_eq!(updated.name, "Research");
        assert_eq!(updated.owner_id, "u1");
        assert_eq!(store.get_board(board.id)?.unwrap().board.name, "Research");

        assert!(store.update_board(Ulid::new(), BoardPatch::default())?.is_none());
        Ok(())
    }

    #[test]
    fn test_delete_board_cascades() -> Result<()> {
        let store = store();
        let board = store.create_board("u1", BoardDraft::default())?;
        let a = store.create_node(board.id, draft_named("a.txt"))?;
        let b = store.create_node(board.id, draft_named("b.txt"))?;
        store.create_relation(board.id, a.id, b.id, RelationDirection::Forward)?;

        assert!(store.delete_board(board.id)?);
        assert!(!store.delete_board(board.id)?);

        assert!(store.get_board(board.id)?.is_none());
        assert!(store.get_board_nodes(board.id)?.is_empty());
        assert!(store.get_board_relations(board.id)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_create_node_defaults_and_owner_inheritance() -> Result<()> {
        let store = store();
        let board = store.create_board("u1", BoardDraft::default())?;

        let node = store.create_node(board.id, NodeDraft::default())?;
        assert_eq!(node.node_type, crate::core::node::NodeType::File);
        assert_eq!(node.position, Position::new(0.0, 0.0));
        assert_eq!(node.owner_id, "u1");

        let result = store.create_node(Ulid::new(), NodeDraft::default());
        assert!(matches!(result, Err(StoreError::NotFound(_))));
        Ok(())
    }

    #[test]
    fn test_node_position_and_payload_round_trip() -> Result<()> {
        let store = store();
        let board = store.create_board("u1", BoardDraft::default())?;

        let payload = json!({"foo": "bar", "n": 2});
        let node = store.create_node(
            board.id,
            NodeDraft {
                position: Some(Position::new(3.0, -5.0)),
                payload: Some(NodePayload::Opaque(payload.clone())),
                ..Default::default()
            },
        )?;

        // Read back through the rows, not the registry
        store.registry.clear();
        let loaded = store.get_node(board.id, node.id)?.unwrap();
        assert_eq!(loaded.position, Position::new(3.0, -5.0));
        assert_eq!(loaded.payload, Some(NodePayload::Opaque(payload)));
        Ok(())
    }

    #[test]
    fn test_delete_node_cascades_relations_both_directions() -> Result<()> {
        let store = store();
        let board = store.create_board("u1", BoardDraft::default())?;
        let a = store.create_node(board.id, draft_named("a.txt"))?;
        let b = store.create_node(board.id, draft_named("b.txt"))?;
        let c = store.create_node(board.id, draft_named("c.txt"))?;

        store.create_relation(board.id, a.id, b.id, RelationDirection::Forward)?;
        store.create_relation(board.id, c.id, a.id, RelationDirection::Forward)?;
        store.create_relation(board.id, b.id, c.id, RelationDirection::Forward)?;

        assert!(store.delete_node(board.id, a.id)?);

        let remaining = store.get_board_relations(board.id)?;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].source_id, b.id);

        // Cached aggregate agrees with the rows
        let aggregate = store.get_board(board.id)?.unwrap();
        assert!(!aggregate.contains_node(&a.id));
        assert_eq!(aggregate.all_relations().len(), 1);
        Ok(())
    }

    #[test]
    fn test_create_relation_validates_before_write() -> Result<()> {
        let store = store();
        let board = store.create_board("u1", BoardDraft::default())?;
        let a = store.create_node(board.id, draft_named("a.txt"))?;

        let result = store.create_relation(board.id, a.id, Ulid::new(), RelationDirection::Forward);
        assert!(matches!(result, Err(StoreError::NotFound(_))));
        assert!(store.get_board_relations(board.id)?.is_empty());

        let result = store.create_relation(Ulid::new(), a.id, a.id, RelationDirection::Forward);
        assert!(matches!(result, Err(StoreError::NotFound(_))));

        // Endpoints on a different board do not count
        let other = store.create_board("u1", BoardDraft::default())?;
        let foreign = store.create_node(other.id, draft_named("x.txt"))?;
        let result = store.create_relation(board.id, a.id, foreign.id, RelationDirection::Forward);
        assert!(matches!(result, Err(StoreError::NotFound(_))));
        Ok(())
    }

    #[test]
    fn test_update_relation_revalidates_endpoints() -> Result<()> {
        let store = store();
        let board = store.create_board("u1", BoardDraft::default())?;
        let a = store.create_node(board.id, draft_named("a.txt"))?;
        let b = store.create_node(board.id, draft_named("b.txt"))?;
        let c = store.create_node(board.id, draft_named("c.txt"))?;
        let relation = store.create_relation(board.id, a.id, b.id, RelationDirection::Forward)?;

        let result = store.update_relation(
            board.id,
            relation.id,
            RelationPatch {
                target_id: Some(Ulid::new()),
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(StoreError::NotFound(_))));

        let moved = store
            .update_relation(
                board.id,
                relation.id,
                RelationPatch {
                    source_id: Some(c.id),
                    ..Default::default()
                },
            )?
            .unwrap();
        assert_eq!(moved.source_id, c.id);

        let aggregate = store.get_board(board.id)?.unwrap();
        assert!(aggregate.relations_from(&a.id).is_empty());
        assert_eq!(aggregate.relations_from(&c.id)[0].id, relation.id);

        assert!(store
            .update_relation(board.id, Ulid::new(), RelationPatch::default())?
            .is_none());
        Ok(())
    }

    #[test]
    fn test_delete_relation_by_pair_is_bulk() -> Result<()> {
        let store = store();
        let board = store.create_board("u1", BoardDraft::default())?;
        let a = store.create_node(board.id, draft_named("a.txt"))?;
        let b = store.create_node(board.id, draft_named("b.txt"))?;

        store.create_relation(board.id, a.id, b.id, RelationDirection::Forward)?;
        store.create_relation(board.id, a.id, b.id, RelationDirection::Bidirectional)?;
        store.create_relation(board.id, b.id, a.id, RelationDirection::Forward)?;

        assert!(store.delete_relation(board.id, a.id, b.id)?);
        assert!(!store.delete_relation(board.id, a.id, b.id)?);

        let remaining = store.get_board_relations(board.id)?;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].source_id, b.id);
        Ok(())
    }

    #[test]
    fn test_cache_coherence_after_node_update() -> Result<()> {
        let store = store();
        let board = store.create_board("u1", BoardDraft::default())?;
        let node = store.create_node(board.id, draft_named("a.txt"))?;

        // Warm the registry, then mutate
        store.get_board(board.id)?;
        store.update_node(
            board.id,
            node.id,
            NodePatch {
                name: Some("renamed.txt".to_string()),
                ..Default::default()
            },
        )?;

        let aggregate = store.get_board(board.id)?.unwrap();
        assert_eq!(aggregate.nodes[&node.id].name, "renamed.txt");
        Ok(())
    }

    #[test]
    fn test_adjacency_order_survives_cache_eviction() -> Result<()> {
        let store = store();
        let board = store.create_board("u1", BoardDraft::default())?;
        let a = store.create_node(board.id, draft_named("a.txt"))?;
        let b = store.create_node(board.id, draft_named("b.txt"))?;
        let c = store.create_node(board.id, draft_named("c.txt"))?;

        let r1 = store.create_relation(board.id, a.id, b.id, RelationDirection::Forward)?;
        let r2 = store.create_relation(board.id, a.id, c.id, RelationDirection::Forward)?;

        store.registry.clear();
        let aggregate = store.get_board(board.id)?.unwrap();
        let order: Vec<Ulid> = aggregate.relations_from(&a.id).iter().map(|r| r.id).collect();
        assert_eq!(order, vec![r1.id, r2.id]);
        Ok(())
    }

    #[test]
    fn test_get_user_boards() -> Result<()> {
        let store = store();
        store.create_board("u1", BoardDraft::default())?;
        store.create_board("u1", BoardDraft::default())?;
        store.create_board("u2", BoardDraft::default())?;

        assert_eq!(store.get_user_boards("u1")?.len(), 2);
        assert_eq!(store.get_user_boards("u2")?.len(), 1);
        assert!(store.get_user_boards("nobody")?.is_empty());
        Ok(())
    }

    #[test]
    fn test_mutations_publish_events() -> Result<()> {
        let store = store();
        let mut rx = store.events().subscribe();

        let board = store.create_board("u1", BoardDraft::default())?;
        let a = store.create_node(board.id, draft_named("a.txt"))?;
        let b = store.create_node(board.id, draft_named("b.txt"))?;
        store.create_relation(board.id, a.id, b.id, RelationDirection::Forward)?;
        store.delete_node(board.id, a.id)?;
        store.delete_board(board.id)?;

        let mut seen = Vec::new();
        while let Ok(event) = rx.try_recv() {
            seen.push(event.event_type());
        }
        assert_eq!(
            seen,
            vec![
                "board:created",
                "node:created",
                "node:created",
                "relation:created",
                "node:deleted",
                "board:deleted",
            ]
        );
        Ok(())
    }

    #[test]
    fn test_delete_missing_returns_false_without_events() -> Result<()> {
        let store = store();
        let board = store.create_board("u1", BoardDraft::default())?;
        let mut rx = store.events().subscribe();

        assert!(!store.delete_node(board.id, Ulid::new())?);
        assert!(!store.delete_relation(board.id, Ulid::new(), Ulid::new())?);
        assert!(rx.try_recv().is_err());
        Ok(())
    }

    #[test]
    fn test_full_scenario() -> Result<()> {
        let store = store();

        let b1 = store.create_board("u1", BoardDraft::default())?;
        let n1 = store.create_node(b1.id, draft_named("a.txt"))?;
        let n2 = store.create_node(b1.id, draft_named("b.txt"))?;
        let r1 = store.create_relation(b1.id, n1.id, n2.id, RelationDirection::Forward)?;

        store.delete_node(b1.id, n1.id)?;

        let relations = store.get_board_relations(b1.id)?;
        assert!(relations.iter().all(|r| r.id != r1.id));
        assert!(relations.is_empty());
        Ok(())
    }

    #[test]
    fn test_close_is_clean() -> Result<()> {
        let store = store();
        store.create_board("u1", BoardDraft::default())?;
        store.close()
    }

    #[test]
    fn test_persists_across_reopen() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("boards.db");

        let board_id = {
            let store = GraphStore::open(&path, None, EventBus::default())?;
            let board = store.create_board("u1", BoardDraft::default())?;
            store.create_node(board.id, draft_named("a.txt"))?;
            store.close()?;
            board.id
        };

        let store = GraphStore::open(&path, None, EventBus::default())?;
        let aggregate = store.get_board(board_id)?.unwrap();
        assert_eq!(aggregate.nodes.len(), 1);
        Ok(())
    }
}
