//! Version kinds
//!
//! Versions are immutable once created. Each one records its owning item's id and source key
//! so a serialized version can be regrouped under its item without the item record at hand.

use crate::ids::Id;
use crate::items::{Edge, Graph, LineageEdge, LineageGraph, Node, Structure};
use crate::types::{Attributes, EdgeEndpoints, VersionFields};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeVersion {
    pub node_version_id: Id,
    pub node_id: Id,
    pub source_key: String,
    #[serde(flatten)]
    pub fields: VersionFields,
}

impl NodeVersion {
    pub fn new(node_version_id: Id, node: &Node, fields: VersionFields) -> Self {
        Self {
            node_version_id,
            node_id: node.node_id,
            source_key: node.source_key.clone(),
            fields,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeVersion {
    pub edge_version_id: Id,
    pub edge_id: Id,
    pub source_key: String,
    #[serde(flatten)]
    pub endpoints: EdgeEndpoints,
    #[serde(flatten)]
    pub fields: VersionFields,
}

impl EdgeVersion {
    pub fn new(
        edge_version_id: Id,
        edge: &Edge,
        endpoints: EdgeEndpoints,
        fields: VersionFields,
    ) -> Self {
        Self {
            edge_version_id,
            edge_id: edge.edge_id,
            source_key: edge.source_key.clone(),
            endpoints,
            fields,
        }
    }
}

/// A graph version is the set of edge versions that made up the graph at that point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphVersion {
    pub graph_version_id: Id,
    pub graph_id: Id,
    pub source_key: String,
    pub edge_version_ids: Vec<Id>,
    #[serde(flatten)]
    pub fields: VersionFields,
}

impl GraphVersion {
    pub fn new(
        graph_version_id: Id,
        graph: &Graph,
        edge_version_ids: Vec<Id>,
        fields: VersionFields,
    ) -> Self {
        Self {
            graph_version_id,
            graph_id: graph.graph_id,
            source_key: graph.source_key.clone(),
            edge_version_ids,
            fields,
        }
    }
}

/// A schema definition
///
/// The version's own id is written as `structureVersionId`, so `fields.structure_version_id`
/// must stay unset; the store rejects structure versions that set it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureVersion {
    pub structure_version_id: Id,
    pub structure_id: Id,
    pub source_key: String,
    pub attributes: Attributes,
    #[serde(flatten)]
    pub fields: VersionFields,
}

impl StructureVersion {
    pub fn new(
        structure_version_id: Id,
        structure: &Structure,
        attributes: Attributes,
        fields: VersionFields,
    ) -> Self {
        Self {
            structure_version_id,
            structure_id: structure.structure_id,
            source_key: structure.source_key.clone(),
            attributes,
            fields,
        }
    }
}

/// Derivation of one rich version from another
///
/// The endpoints may be versions of any rich kind (node, edge, graph or structure).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineageEdgeVersion {
    pub lineage_edge_version_id: Id,
    pub lineage_edge_id: Id,
    pub source_key: String,
    pub from_rich_version_id: Id,
    pub to_rich_version_id: Id,
    #[serde(flatten)]
    pub fields: VersionFields,
}

impl LineageEdgeVersion {
    pub fn new(
        lineage_edge_version_id: Id,
        lineage_edge: &LineageEdge,
        from_rich_version_id: Id,
        to_rich_version_id: Id,
        fields: VersionFields,
    ) -> Self {
        Self {
            lineage_edge_version_id,
            lineage_edge_id: lineage_edge.lineage_edge_id,
            source_key: lineage_edge.source_key.clone(),
            from_rich_version_id,
            to_rich_version_id,
            fields,
        }
    }

    /// Whether `version_id` is either endpoint of this lineage edge
    pub fn touches(&self, version_id: Id) -> bool {
        self.from_rich_version_id == version_id || self.to_rich_version_id == version_id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineageGraphVersion {
    pub lineage_graph_version_id: Id,
    pub lineage_graph_id: Id,
    pub source_key: String,
    pub lineage_edge_version_ids: Vec<Id>,
    #[serde(flatten)]
    pub fields: VersionFields,
}

impl LineageGraphVersion {
    pub fn new(
        lineage_graph_version_id: Id,
        lineage_graph: &LineageGraph,
        lineage_edge_version_ids: Vec<Id>,
        fields: VersionFields,
    ) -> Self {
        Self {
            lineage_graph_version_id,
            lineage_graph_id: lineage_graph.lineage_graph_id,
            source_key: lineage_graph.source_key.clone(),
            lineage_edge_version_ids,
            fields,
        }
    }
}
