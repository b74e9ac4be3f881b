//! Item and version model for the ground provenance store
//!
//! A graph instance holds six kinds of long-lived *items* (nodes, edges, graphs, structures,
//! lineage edges and lineage graphs). Each item accumulates immutable *versions* that point at
//! the versions they were derived from, forming one version DAG per item.
//!
//! This crate defines the records themselves, the shared identifier space, and the serialized
//! form written to snapshot artifacts. The engine that owns and queries them lives in
//! `ground-store`.
//!
//! ```
//! use ground_model::prelude::*;
//!
//! let mut ids = IdAllocator::new();
//! let node = Node::new(ids.allocate(), "dataset.csv").with_name("raw data");
//! let version = NodeVersion::new(
//!     ids.allocate(),
//!     &node,
//!     VersionFields::new().with_reference("s3://bucket/dataset.csv"),
//! );
//!
//! let record = Record::from(version.clone());
//! let json = record.to_json().unwrap();
//! assert_eq!(Record::from_json(&json).unwrap(), Record::NodeVersion(version));
//! ```

pub mod error;
pub mod ids;
pub mod items;
pub mod kind;
pub mod record;
pub mod types;
pub mod versions;

pub use error::{ModelError, ModelResult};
pub use ids::{Id, IdAllocator};
pub use items::{Edge, Graph, LineageEdge, LineageGraph, Node, Structure};
pub use kind::{Item, Kind, Role, Version};
pub use record::Record;
pub use types::{Attributes, EdgeEndpoints, ReferenceParameters, Tags, VersionFields};
pub use versions::{
    EdgeVersion, GraphVersion, LineageEdgeVersion, LineageGraphVersion, NodeVersion,
    StructureVersion,
};

pub mod prelude {
    pub use crate::error::*;
    pub use crate::ids::*;
    pub use crate::items::*;
    pub use crate::kind::*;
    pub use crate::record::*;
    pub use crate::types::*;
    pub use crate::versions::*;
}
