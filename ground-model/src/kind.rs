//! Item kinds and the traits tying each item type to its version type

use crate::error::ModelError;
use crate::ids::Id;
use crate::items::{Edge, Graph, LineageEdge, LineageGraph, Node, Structure};
use crate::record::Record;
use crate::types::{Tags, VersionFields};
use crate::versions::{
    EdgeVersion, GraphVersion, LineageEdgeVersion, LineageGraphVersion, NodeVersion,
    StructureVersion,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The six item kinds of a provenance graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Kind {
    Node,
    Edge,
    Graph,
    Structure,
    LineageEdge,
    LineageGraph,
}

impl Kind {
    pub const ALL: [Kind; 6] = [
        Kind::Node,
        Kind::Edge,
        Kind::Graph,
        Kind::Structure,
        Kind::LineageEdge,
        Kind::LineageGraph,
    ];

    /// Class discriminator of this kind's item records
    pub fn item_class(self) -> &'static str {
        match self {
            Kind::Node => "Node",
            Kind::Edge => "Edge",
            Kind::Graph => "Graph",
            Kind::Structure => "Structure",
            Kind::LineageEdge => "LineageEdge",
            Kind::LineageGraph => "LineageGraph",
        }
    }

    /// Class discriminator of this kind's version records
    pub fn version_class(self) -> &'static str {
        match self {
            Kind::Node => "NodeVersion",
            Kind::Edge => "EdgeVersion",
            Kind::Graph => "GraphVersion",
            Kind::Structure => "StructureVersion",
            Kind::LineageEdge => "LineageEdgeVersion",
            Kind::LineageGraph => "LineageGraphVersion",
        }
    }

    /// Whether versions of this kind may be endpoints of a lineage edge
    pub fn is_rich(self) -> bool {
        matches!(
            self,
            Kind::Node | Kind::Edge | Kind::Graph | Kind::Structure
        )
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.item_class())
    }
}

impl FromStr for Kind {
    type Err = ModelError;

    /// Accepts class names as well as `lineage-edge` / `lineage_edge` spellings, ignoring case
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_lowercase();

        Kind::ALL
            .into_iter()
            .find(|kind| kind.item_class().to_lowercase() == normalized)
            .ok_or_else(|| ModelError::UnknownKind(s.to_string()))
    }
}

/// Whether an id names an item or one of its versions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Item,
    Version,
}

/// An item type and the version type that belongs to it
pub trait Item: Clone + fmt::Debug + Serialize + DeserializeOwned + Into<Record> {
    const KIND: Kind;

    type Version: Version<Item = Self>;

    fn id(&self) -> Id;

    fn source_key(&self) -> &str;

    fn name(&self) -> Option<&str>;

    fn tags(&self) -> Option<&Tags>;
}

/// A version type and the item type that owns it
pub trait Version: Clone + fmt::Debug + Serialize + DeserializeOwned + Into<Record> {
    const KIND: Kind;

    type Item: Item<Version = Self>;

    fn version_id(&self) -> Id;

    /// Id of the owning item
    fn item_id(&self) -> Id;

    fn source_key(&self) -> &str;

    fn fields(&self) -> &VersionFields;

    fn parent_ids(&self) -> &[Id] {
        self.fields().parents()
    }
}

macro_rules! item_kind {
    ($kind:expr, $item:ident . $item_id:ident, $version:ident . $version_id:ident) => {
        impl Item for $item {
            const KIND: Kind = $kind;

            type Version = $version;

            fn id(&self) -> Id {
                self.$item_id
            }

            fn source_key(&self) -> &str {
                &self.source_key
            }

            fn name(&self) -> Option<&str> {
                self.name.as_deref()
            }

            fn tags(&self) -> Option<&Tags> {
                self.tags.as_ref()
            }
        }

        impl Version for $version {
            const KIND: Kind = $kind;

            type Item = $item;

            fn version_id(&self) -> Id {
                self.$version_id
            }

            fn item_id(&self) -> Id {
                self.$item_id
            }

            fn source_key(&self) -> &str {
                &self.source_key
            }

            fn fields(&self) -> &VersionFields {
                &self.fields
            }
        }

        impl From<$item> for Record {
            fn from(item: $item) -> Self {
                Record::$item(item)
            }
        }

        impl From<$version> for Record {
            fn from(version: $version) -> Self {
                Record::$version(version)
            }
        }
    };
}

item_kind!(Kind::Node, Node.node_id, NodeVersion.node_version_id);
item_kind!(Kind::Edge, Edge.edge_id, EdgeVersion.edge_version_id);
item_kind!(Kind::Graph, Graph.graph_id, GraphVersion.graph_version_id);
item_kind!(
    Kind::Structure,
    Structure.structure_id,
    StructureVersion.structure_version_id
);
item_kind!(
    Kind::LineageEdge,
    LineageEdge.lineage_edge_id,
    LineageEdgeVersion.lineage_edge_version_id
);
item_kind!(
    Kind::LineageGraph,
    LineageGraph.lineage_graph_id,
    LineageGraphVersion.lineage_graph_version_id
);
