//! Versioning engine and git-backed persistence for ground provenance graphs
//!
//! - [`graph`]: the in-memory engine. Idempotent item creation, version DAGs, latest-version
//!   and history queries, lineage adjacency.
//! - [`snapshot`] and [`vcs`]: writing the graph as one JSON artifact per object into a
//!   numbered git repository, with a manifest of the commits that produced each file.
//! - [`client`]: the [`GroundApi`] façade and the [`connect`] factory.
//!
//! ```
//! use ground_store::prelude::*;
//!
//! let mut store = GraphStore::new();
//! let node = store.create_item("dataset.csv", |id| Node::new(id, "dataset.csv"));
//! let v1 = store
//!     .create_version::<Node>(node, VersionFields::new(), NodeVersion::new)
//!     .unwrap();
//! let v2 = store
//!     .create_version::<Node>(node, VersionFields::new().with_parents([v1]), NodeVersion::new)
//!     .unwrap();
//!
//! let latest = store.latest_versions::<Node>("dataset.csv").unwrap();
//! assert_eq!(latest[0].node_version_id, v2);
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod graph;
pub mod history;
pub mod lineage;
pub mod snapshot;
pub mod vcs;

pub use client::{connect, GitClient, GroundApi};
pub use config::{StoreConfig, VcsBackend};
pub use error::{PersistenceError, PersistenceResult, StoreError, StoreResult};
pub use graph::{GraphStore, KindTable, SharedStore, Stored};
pub use history::History;
pub use lineage::LineageIndex;
pub use snapshot::{CommitReport, Manifest, SnapshotLayout};
pub use vcs::{CommitId, VersionControl};

pub mod prelude {
    pub use crate::client::*;
    pub use crate::config::*;
    pub use crate::error::*;
    pub use crate::graph::*;
    pub use crate::history::History;
    pub use crate::snapshot::{CommitReport, Manifest, SnapshotLayout};
    pub use crate::vcs::{CommitId, GitCommand, LibGit2Repository, VersionControl};
    pub use ground_model::prelude::*;
}
