//! Board - top-level container
//!
//! A board owns a set of nodes and the relations between them. The struct
//! here is exactly the stored row; the materialized node/relation maps live
//! in [`BoardAggregate`](super::aggregate::BoardAggregate).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Who can see a board or node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Only the owner
    #[default]
    Private,
    /// Anyone
    Public,
    /// Explicitly shared
    Shared,
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Visibility::Private => write!(f, "private"),
            Visibility::Public => write!(f, "public"),
            Visibility::Shared => write!(f, "shared"),
        }
    }
}

impl std::str::FromStr for Visibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "private" => Ok(Visibility::Private),
            "public" => Ok(Visibility::Public),
            "shared" => Ok(Visibility::Shared),
            _ => Err(format!("unknown visibility: {}", s)),
        }
    }
}

/// A board - stored row fields only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Board {
    /// Unique identifier (ULID), immutable, never reused
    pub id: Ulid,

    /// Display name
    pub name: String,

    /// Free-form description
    #[serde(default)]
    pub description: String,

    /// Owning user, set at creation, never empty
    pub owner_id: String,

    /// Share setting
    #[serde(default)]
    pub visibility: Visibility,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Board {
    /// Create a new board owned by `owner_id` with defaults applied
    pub fn new(owner_id: impl Into<String>, draft: BoardDraft) -> Self {
        let now = Utc::now();
        Self {
            id: Ulid::new(),
            name: draft.name.unwrap_or_else(|| "Untitled Board".to_string()),
            description: draft.description.unwrap_or_default(),
            owner_id: owner_id.into(),
            visibility: draft.visibility.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Merge a partial update onto this board and stamp a new updated_at
    pub fn apply(&mut self, patch: BoardPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(visibility) = patch.visibility {
            self.visibility = visibility;
        }
        self.updated_at = Utc::now();
    }
}

/// Fields a caller may set at board creation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoardDraft {
    pub name: Option<String>,
    pub description: Option<String>,
    pub visibility: Option<Visibility>,
}

/// Partial update for a board; absent fields are left untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoardPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub visibility: Option<Visibility>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_board_defaults() {
        let board = Board::new("u1", BoardDraft::default());

        assert_eq!(board.name, "Untitled Board");
        assert_eq!(board.owner_id, "u1");
        assert_eq!(board.visibility, Visibility::Private);
        assert_eq!(board.created_at, board.updated_at);
    }

    #[test]
    fn test_new_board_with_fields() {
        let board = Board::new(
            "u1",
            BoardDraft {
                name: Some("Research".to_string()),
                description: Some("papers".to_string()),
                visibility: Some(Visibility::Shared),
            },
        );

        assert_eq!(board.name, "Research");
        assert_eq!(board.description, "papers");
        assert_eq!(board.visibility, Visibility::Shared);
    }

    #[test]
    fn test_apply_patch() {
        let mut board = Board::new("u1", BoardDraft::default());
        let created = board.created_at;

        board.apply(BoardPatch {
            name: Some("Renamed".to_string()),
            ..Default::default()
        });

        assert_eq!(board.name, "Renamed");
        assert_eq!(board.created_at, created);
        assert!(board.updated_at >= created);
    }

    #[test]
    fn test_unique_ids() {
        let a = Board::new("u1", BoardDraft::default());
        let b = Board::new("u1", BoardDraft::default());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_visibility_round_trip() {
        for v in [Visibility::Private, Visibility::Public, Visibility::Shared] {
            assert_eq!(v.to_string().parse::<Visibility>().unwrap(), v);
        }
        assert!("secret".parse::<Visibility>().is_err());
    }
}
