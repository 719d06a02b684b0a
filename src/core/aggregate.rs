//! BoardAggregate - materialized view of one board
//!
//! The aggregate is derived state: the store rebuilds it from rows on first
//! read and keeps it current on every write. Relations are bucketed by
//! source node id, preserving arrival order within a bucket.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use ulid::Ulid;

use super::board::Board;
use super::node::Node;
use super::relation::NodeRelation;

/// In-memory view of a board, its nodes, and its relation adjacency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardAggregate {
    /// The board row
    pub board: Board,

    /// Nodes keyed by id
    pub nodes: HashMap<Ulid, Node>,

    /// Relations keyed by source node id, in arrival order
    pub relations: HashMap<Ulid, Vec<NodeRelation>>,
}

impl BoardAggregate {
    /// An aggregate with no nodes or relations yet
    pub fn empty(board: Board) -> Self {
        Self {
            board,
            nodes: HashMap::new(),
            relations: HashMap::new(),
        }
    }

    /// Assemble from freshly loaded rows; `relations` must be in row order
    /// so bucket order matches insertion order
    pub fn assemble(board: Board, nodes: Vec<Node>, relations: Vec<NodeRelation>) -> Self {
        let nodes = nodes.into_iter().map(|n| (n.id, n)).collect();
        let mut buckets: HashMap<Ulid, Vec<NodeRelation>> = HashMap::new();
        for relation in relations {
            buckets.entry(relation.source_id).or_default().push(relation);
        }
        Self {
            board,
            nodes,
            relations: buckets,
        }
    }

    pub fn contains_node(&self, id: &Ulid) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn insert_node(&mut self, node: Node) {
        self.nodes.insert(node.id, node);
    }

    /// Remove a node along with every relation it is an endpoint of
    pub fn remove_node(&mut self, id: &Ulid) -> bool {
        if self.nodes.remove(id).is_none() {
            return false;
        }
        self.relations.remove(id);
        for bucket in self.relations.values_mut() {
            bucket.retain(|r| r.target_id != *id);
        }
        self.relations.retain(|_, bucket| !bucket.is_empty());
        true
    }

    /// Append a relation to its source bucket (arrival order, no sorting)
    pub fn append_relation(&mut self, relation: NodeRelation) {
        self.relations
            .entry(relation.source_id)
            .or_default()
            .push(relation);
    }

    /// Find a relation by id, wherever it is bucketed
    pub fn find_relation(&self, id: &Ulid) -> Option<&NodeRelation> {
        self.relations
            .values()
            .flat_map(|bucket| bucket.iter())
            .find(|r| r.id == *id)
    }

    /// Replace a relation in place, moving it between buckets when the
    /// source endpoint changed. The rest of each bucket keeps its order.
    pub fn replace_relation(&mut self, updated: NodeRelation) {
        let old_source = self
            .relations
            .iter()
            .find(|(_, bucket)| bucket.iter().any(|r| r.id == updated.id))
            .map(|(source, _)| *source);

        match old_source {
            Some(source) if source == updated.source_id => {
                if let Some(bucket) = self.relations.get_mut(&source) {
                    if let Some(slot) = bucket.iter_mut().find(|r| r.id == updated.id) {
                        *slot = updated;
                    }
                }
            }
            Some(source) => {
                if let Some(bucket) = self.relations.get_mut(&source) {
                    bucket.retain(|r| r.id != updated.id);
                    if bucket.is_empty() {
                        self.relations.remove(&source);
                    }
                }
                self.append_relation(updated);
            }
            None => self.append_relation(updated),
        }
    }

    /// Remove every relation on an exact (source, target) pair; returns how
    /// many were dropped
    pub fn remove_relations_by_pair(&mut self, source_id: &Ulid, target_id: &Ulid) -> usize {
        let Some(bucket) = self.relations.get_mut(source_id) else {
            return 0;
        };
        let before = bucket.len();
        bucket.retain(|r| r.target_id != *target_id);
        let removed = before - bucket.len();
        if bucket.is_empty() {
            self.relations.remove(source_id);
        }
        removed
    }

    /// Relations out of `source_id`, in arrival order
    pub fn relations_from(&self, source_id: &Ulid) -> &[NodeRelation] {
        self.relations
            .get(source_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Flat list of all relations on the board
    pub fn all_relations(&self) -> Vec<&NodeRelation> {
        self.relations.values().flatten().collect()
    }
}
