//! Item kinds
//!
//! An item is the version-less anchor of a DAG, identified by a client-supplied `source_key`
//! that is unique per kind.

use crate::ids::Id;
use crate::types::Tags;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub node_id: Id,
    pub source_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Tags>,
}

impl Node {
    pub fn new(node_id: Id, source_key: impl Into<String>) -> Self {
        Self {
            node_id,
            source_key: source_key.into(),
            name: None,
            tags: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_tags(mut self, tags: Tags) -> Self {
        self.tags = Some(tags);
        self
    }
}

/// Structural relation between two nodes
///
/// The endpoints reference node items, not node versions; edge versions narrow them down to
/// an interval of node history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub edge_id: Id,
    pub source_key: String,
    pub from_node_id: Id,
    pub to_node_id: Id,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Tags>,
}

impl Edge {
    pub fn new(
        edge_id: Id,
        source_key: impl Into<String>,
        from_node_id: Id,
        to_node_id: Id,
    ) -> Self {
        Self {
            edge_id,
            source_key: source_key.into(),
            from_node_id,
            to_node_id,
            name: None,
            tags: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_tags(mut self, tags: Tags) -> Self {
        self.tags = Some(tags);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Graph {
    pub graph_id: Id,
    pub source_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Tags>,
}

impl Graph {
    pub fn new(graph_id: Id, source_key: impl Into<String>) -> Self {
        Self {
            graph_id,
            source_key: source_key.into(),
            name: None,
            tags: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_tags(mut self, tags: Tags) -> Self {
        self.tags = Some(tags);
        self
    }
}

/// Schema anchor; its versions carry attribute definitions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Structure {
    pub structure_id: Id,
    pub source_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Tags>,
}

impl Structure {
    pub fn new(structure_id: Id, source_key: impl Into<String>) -> Self {
        Self {
            structure_id,
            source_key: source_key.into(),
            name: None,
            tags: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_tags(mut self, tags: Tags) -> Self {
        self.tags = Some(tags);
        self
    }
}

/// Derivation relation between rich versions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineageEdge {
    pub lineage_edge_id: Id,
    pub source_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Tags>,
}

impl LineageEdge {
    pub fn new(lineage_edge_id: Id, source_key: impl Into<String>) -> Self {
        Self {
            lineage_edge_id,
            source_key: source_key.into(),
            name: None,
            tags: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_tags(mut self, tags: Tags) -> Self {
        self.tags = Some(tags);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineageGraph {
    pub lineage_graph_id: Id,
    pub source_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Tags>,
}

impl LineageGraph {
    pub fn new(lineage_graph_id: Id, source_key: impl Into<String>) -> Self {
        Self {
            lineage_graph_id,
            source_key: source_key.into(),
            name: None,
            tags: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_tags(mut self, tags: Tags) -> Self {
        self.tags = Some(tags);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_node_attributes() {
        let mut tags = Tags::new();
        tags.insert("testKey".to_string(), json!("testValue"));
        let node = Node::new(0, "testSourceKey")
            .with_name("testName")
            .with_tags(tags.clone());

        assert_eq!(node.source_key, "testSourceKey");
        assert_eq!(node.name.as_deref(), Some("testName"));
        assert_eq!(node.tags, Some(tags));
    }

    #[test]
    fn test_minimal_items_have_no_name_or_tags() {
        let edge = Edge::new(2, "testSourceKey", 0, 1);
        assert_eq!(edge.from_node_id, 0);
        assert_eq!(edge.to_node_id, 1);
        assert!(edge.name.is_none());
        assert!(edge.tags.is_none());

        let structure = Structure::new(3, "schema");
        assert!(structure.name.is_none());
        assert!(structure.tags.is_none());
    }

    #[test]
    fn test_item_field_names() {
        let edge = Edge::new(2, "e", 0, 1).with_name("flows-to");
        assert_eq!(
            serde_json::to_value(&edge).unwrap(),
            json!({
                "edgeId": 2,
                "sourceKey": "e",
                "fromNodeId": 0,
                "toNodeId": 1,
                "name": "flows-to",
            })
        );

        let lineage_graph = LineageGraph::new(5, "lg");
        assert_eq!(
            serde_json::to_value(&lineage_graph).unwrap(),
            json!({ "lineageGraphId": 5, "sourceKey": "lg" })
        );
    }
}
