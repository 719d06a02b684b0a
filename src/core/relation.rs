//! NodeRelation - a typed edge between two nodes on the same board
//!
//! Relations are owned by their board and keyed in the aggregate by source
//! node id, in arrival order. Both endpoints must exist on the board before
//! a relation can be written.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use super::node::Metadata;

/// Edge direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RelationDirection {
    /// Source to target
    #[default]
    Forward,
    /// Target to source
    Backward,
    /// Both ways
    Bidirectional,
}

impl std::fmt::Display for RelationDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RelationDirection::Forward => write!(f, "forward"),
            RelationDirection::Backward => write!(f, "backward"),
            RelationDirection::Bidirectional => write!(f, "bidirectional"),
        }
    }
}

impl std::str::FromStr for RelationDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "forward" => Ok(RelationDirection::Forward),
            "backward" => Ok(RelationDirection::Backward),
            "bidirectional" => Ok(RelationDirection::Bidirectional),
            _ => Err(format!("unknown relation direction: {}", s)),
        }
    }
}

/// Human-facing description of what a relation means
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RelationDefinition {
    /// Human description
    pub description: String,

    /// Semantic-type tag (e.g. "depends-on")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semantic_type: Option<String>,

    /// Edge strength
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strength: Option<f64>,

    /// Free-form property map
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Metadata>,
}

/// A relation between two nodes on the same board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRelation {
    /// Unique identifier (ULID)
    pub id: Ulid,

    /// Board both endpoints belong to
    pub board_id: Ulid,

    /// Source node
    pub source_id: Ulid,

    /// Target node
    pub target_id: Ulid,

    /// Edge direction
    #[serde(default)]
    pub direction: RelationDirection,

    /// Optional semantic definition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition: Option<RelationDefinition>,

    /// Free-form metadata
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl NodeRelation {
    /// Create a new relation between `source_id` and `target_id`
    pub fn new(
        board_id: Ulid,
        source_id: Ulid,
        target_id: Ulid,
        direction: RelationDirection,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Ulid::new(),
            board_id,
            source_id,
            target_id,
            direction,
            definition: None,
            metadata: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Merge a partial update onto this relation and stamp a new updated_at
    pub fn apply(&mut self, patch: RelationPatch) {
        if let Some(source_id) = patch.source_id {
            self.source_id = source_id;
        }
        if let Some(target_id) = patch.target_id {
            self.target_id = target_id;
        }
        if let Some(direction) = patch.direction {
            self.direction = direction;
        }
        if let Some(definition) = patch.definition {
            self.definition = Some(definition);
        }
        if let Some(metadata) = patch.metadata {
            self.metadata = Some(metadata);
        }
        self.updated_at = Utc::now();
    }
}

/// Partial update for a relation; changed endpoints are re-validated by the
/// store before commit
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelationPatch {
    pub source_id: Option<Ulid>,
    pub target_id: Option<Ulid>,
    pub direction: Option<RelationDirection>,
    pub definition: Option<RelationDefinition>,
    pub metadata: Option<Metadata>,
}
