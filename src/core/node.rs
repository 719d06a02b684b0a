//! Node - a typed entity placed on a board
//!
//! Nodes carry a 2-D position and an optional type-specific payload. The
//! payload is a tagged union over the shapes the application knows about,
//! with an opaque JSON fallback for forward compatibility. Stored payloads
//! must round-trip through JSON exactly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use super::board::Visibility;

/// Free-form string-keyed metadata attached to nodes and relations
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Node type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    /// A file on disk
    #[default]
    File,
    /// A folder
    Folder,
    /// A web or local link
    Link,
    /// An executable function (tool or plugin)
    Function,
    /// A reference to an AI model
    AiModel,
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeType::File => write!(f, "file"),
            NodeType::Folder => write!(f, "folder"),
            NodeType::Link => write!(f, "link"),
            NodeType::Function => write!(f, "function"),
            NodeType::AiModel => write!(f, "ai_model"),
        }
    }
}

impl std::str::FromStr for NodeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "file" => Ok(NodeType::File),
            "folder" => Ok(NodeType::Folder),
            "link" => Ok(NodeType::Link),
            "function" => Ok(NodeType::Function),
            "ai_model" => Ok(NodeType::AiModel),
            _ => Err(format!("unknown node type: {}", s)),
        }
    }
}

/// 2-D position of a node on its board canvas
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// File classification for file-node payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Document,
    Image,
    Video,
    Audio,
    #[default]
    Other,
}

/// Link classification for link-node payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    Web,
    Local,
}

/// Function classification for function-node payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FunctionKind {
    Tool,
    Plugin,
}

/// Model classification for ai-model payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    Chat,
    Image,
}

/// Type-specific node payload
///
/// Known shapes carry a `kind` tag. Anything else (older or newer writers)
/// deserializes into `Opaque` and serializes back byte-equivalent, so the
/// stored JSON is never lossy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodePayload {
    File {
        file_type: FileKind,
        path: String,
        size: u64,
        mime_type: String,
    },
    Folder {
        path: String,
    },
    Link {
        link_type: LinkKind,
        url: String,
    },
    Function {
        function_type: FunctionKind,
        config: Metadata,
    },
    AiModel {
        model_type: ModelKind,
        provider: String,
        config: Metadata,
    },
    /// Unrecognized payload, preserved verbatim
    #[serde(untagged)]
    Opaque(serde_json::Value),
}

/// A node - stored row fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier (ULID)
    pub id: Ulid,

    /// Node type
    #[serde(default)]
    pub node_type: NodeType,

    /// Display name
    pub name: String,

    /// Free-form description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Owning user
    pub owner_id: String,

    /// Board this node belongs to (must reference an existing board)
    pub board_id: Ulid,

    /// Share setting
    #[serde(default)]
    pub visibility: Visibility,

    /// Canvas position
    #[serde(default)]
    pub position: Position,

    /// Type-specific payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<NodePayload>,

    /// Free-form metadata
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Node {
    /// Create a new node on `board_id` with defaults applied
    pub fn new(board_id: Ulid, owner_id: impl Into<String>, draft: NodeDraft) -> Self {
        let now = Utc::now();
        Self {
            id: Ulid::new(),
            node_type: draft.node_type.unwrap_or_default(),
            name: draft.name.unwrap_or_else(|| "Untitled".to_string()),
            description: draft.description,
            owner_id: owner_id.into(),
            board_id,
            visibility: draft.visibility.unwrap_or_default(),
            position: draft.position.unwrap_or_default(),
            payload: draft.payload,
            metadata: draft.metadata,
            created_at: now,
            updated_at: now,
        }
    }

    /// Merge a partial update onto this node and stamp a new updated_at
    pub fn apply(&mut self, patch: NodePatch) {
        if let Some(node_type) = patch.node_type {
            self.node_type = node_type;
        }
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        if let Some(visibility) = patch.visibility {
            self.visibility = visibility;
        }
        if let Some(position) = patch.position {
            self.position = position;
        }
        if let Some(payload) = patch.payload {
            self.payload = Some(payload);
        }
        if let Some(metadata) = patch.metadata {
            self.metadata = Some(metadata);
        }
        self.updated_at = Utc::now();
    }
}

/// Fields a caller may set at node creation
///
/// An absent `owner_id` inherits the owner of the board the node is
/// created on.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeDraft {
    pub owner_id: Option<String>,
    pub node_type: Option<NodeType>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub visibility: Option<Visibility>,
    pub position: Option<Position>,
    pub payload: Option<NodePayload>,
    pub metadata: Option<Metadata>,
}

/// Partial update for a node; absent fields are left untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodePatch {
    pub node_type: Option<NodeType>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub visibility: Option<Visibility>,
    pub position: Option<Position>,
    pub payload: Option<NodePayload>,
    pub metadata: Option<Metadata>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_node_defaults() {
        let board_id = Ulid::new();
        let node = Node::new(board_id, "u1", NodeDraft::default());

        assert_eq!(node.node_type, NodeType::File);
        assert_eq!(node.name, "Untitled");
        assert_eq!(node.board_id, board_id);
        assert_eq!(node.position, Position::new(0.0, 0.0));
        assert_eq!(node.visibility, Visibility::Private);
        assert!(node.payload.is_none());
    }

    #[test]
    fn test_apply_patch_keeps_unset_fields() {
        let mut node = Node::new(
            Ulid::new(),
            "u1",
            NodeDraft {
                name: Some("a.txt".to_string()),
                position: Some(Position::new(3.0, -5.0)),
                ..Default::default()
            },
        );

        node.apply(NodePatch {
            name: Some("b.txt".to_string()),
            ..Default::default()
        });

        assert_eq!(node.name, "b.txt");
        assert_eq!(node.position, Position::new(3.0, -5.0));
    }

    #[test]
    fn test_node_type_round_trip() {
        for t in [
            NodeType::File,
            NodeType::Folder,
            NodeType::Link,
            NodeType::Function,
            NodeType::AiModel,
        ] {
            assert_eq!(t.to_string().parse::<NodeType>().unwrap(), t);
        }
        assert!("widget".parse::<NodeType>().is_err());
    }

    #[test]
    fn test_payload_tagged_round_trip() {
        let payload = NodePayload::Link {
            link_type: LinkKind::Web,
            url: "https://example.com".to_string(),
        };

        let text = serde_json::to_string(&payload).unwrap();
        let back: NodePayload = serde_json::from_str(&text).unwrap();
        assert_eq!(back, payload);

        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["kind"], "link");
    }

    #[test]
    fn test_payload_opaque_round_trip() {
        let raw = json!({"foo": "bar", "n": 2});
        let payload: NodePayload = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(payload, NodePayload::Opaque(raw.clone()));

        // Serializing back must reproduce the original structure exactly
        assert_eq!(serde_json::to_value(&payload).unwrap(), raw);
    }

    #[test]
    fn test_position_round_trip() {
        let pos = Position::new(3.0, -5.0);
        let text = serde_json::to_string(&pos).unwrap();
        let back: Position = serde_json::from_str(&text).unwrap();
        assert_eq!(back, pos);
    }
}
