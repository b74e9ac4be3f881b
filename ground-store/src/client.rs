//! Client façade over the engine and its persistence
//!
//! [`GroundApi`] is the surface applications program against; [`connect`] picks the backend
//! by tag. The `git` backend ([`GitClient`]) keeps the graph in memory and writes it to a
//! numbered snapshot directory on [`GroundApi::commit`].
//!
//! ```no_run
//! use ground_store::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut client = connect("git", StoreConfig::default().with_snapshot_root("/tmp/ground"))?;
//! let node = client.create_node("dataset.csv", Some("raw data"), None)?;
//! let v1 = client.create_node_version(node, VersionFields::new())?;
//! client.create_node_version(node, VersionFields::new().with_parents([v1]))?;
//!
//! let report = client.commit()?;
//! println!("{} artifacts in {}", report.artifacts, report.directory.display());
//! # Ok(())
//! # }
//! ```

use crate::config::StoreConfig;
use crate::error::{PersistenceError, PersistenceResult, StoreError, StoreResult};
use crate::graph::{GraphStore, Stored};
use crate::history::History;
use crate::snapshot::{self, CommitReport, Manifest, SnapshotLayout};
use crate::vcs::{self, VersionControl};
use ground_model::{
    Attributes, Edge, EdgeEndpoints, EdgeVersion, Graph, GraphVersion, Id, LineageEdge,
    LineageEdgeVersion, LineageGraph, LineageGraphVersion, Node, NodeVersion, Structure,
    StructureVersion, Tags, VersionFields,
};
use std::path::Path;
use tracing::info;

/// Operations a client can perform against a graph instance
///
/// Item creation is idempotent per source key: asking for an existing key returns its id and
/// ignores the other arguments.
pub trait GroundApi: Send {
    fn backend_name(&self) -> &'static str;

    fn create_node(
        &mut self,
        source_key: &str,
        name: Option<&str>,
        tags: Option<Tags>,
    ) -> StoreResult<Id>;
    fn create_node_version(&mut self, node_id: Id, fields: VersionFields) -> StoreResult<Id>;
    fn get_node(&self, source_key: &str) -> StoreResult<Node>;
    fn get_node_latest_versions(&self, source_key: &str) -> StoreResult<Vec<NodeVersion>>;
    fn get_node_history(&self, source_key: &str) -> StoreResult<History>;
    fn get_node_version(&self, node_version_id: Id) -> StoreResult<NodeVersion>;
    fn get_node_version_adjacent_lineage(
        &self,
        node_version_id: Id,
    ) -> StoreResult<Vec<LineageEdgeVersion>>;

    fn create_edge(
        &mut self,
        source_key: &str,
        from_node_id: Id,
        to_node_id: Id,
        name: Option<&str>,
        tags: Option<Tags>,
    ) -> StoreResult<Id>;
    fn create_edge_version(
        &mut self,
        edge_id: Id,
        endpoints: EdgeEndpoints,
        fields: VersionFields,
    ) -> StoreResult<Id>;
    fn get_edge(&self, source_key: &str) -> StoreResult<Edge>;
    fn get_edge_latest_versions(&self, source_key: &str) -> StoreResult<Vec<EdgeVersion>>;
    fn get_edge_history(&self, source_key: &str) -> StoreResult<History>;
    fn get_edge_version(&self, edge_version_id: Id) -> StoreResult<EdgeVersion>;

    fn create_graph(
        &mut self,
        source_key: &str,
        name: Option<&str>,
        tags: Option<Tags>,
    ) -> StoreResult<Id>;
    fn create_graph_version(
        &mut self,
        graph_id: Id,
        edge_version_ids: Vec<Id>,
        fields: VersionFields,
    ) -> StoreResult<Id>;
    fn get_graph(&self, source_key: &str) -> StoreResult<Graph>;
    fn get_graph_latest_versions(&self, source_key: &str) -> StoreResult<Vec<GraphVersion>>;
    fn get_graph_history(&self, source_key: &str) -> StoreResult<History>;
    fn get_graph_version(&self, graph_version_id: Id) -> StoreResult<GraphVersion>;

    fn create_structure(
        &mut self,
        source_key: &str,
        name: Option<&str>,
        tags: Option<Tags>,
    ) -> StoreResult<Id>;
    fn create_structure_version(
        &mut self,
        structure_id: Id,
        attributes: Attributes,
        fields: VersionFields,
    ) -> StoreResult<Id>;
    fn get_structure(&self, source_key: &str) -> StoreResult<Structure>;
    fn get_structure_latest_versions(
        &self,
        source_key: &str,
    ) -> StoreResult<Vec<StructureVersion>>;
    fn get_structure_history(&self, source_key: &str) -> StoreResult<History>;
    fn get_structure_version(&self, structure_version_id: Id) -> StoreResult<StructureVersion>;

    fn create_lineage_edge(
        &mut self,
        source_key: &str,
        name: Option<&str>,
        tags: Option<Tags>,
    ) -> StoreResult<Id>;
    fn create_lineage_edge_version(
        &mut self,
        lineage_edge_id: Id,
        from_rich_version_id: Id,
        to_rich_version_id: Id,
        fields: VersionFields,
    ) -> StoreResult<Id>;
    fn get_lineage_edge(&self, source_key: &str) -> StoreResult<LineageEdge>;
    fn get_lineage_edge_latest_versions(
        &self,
        source_key: &str,
    ) -> StoreResult<Vec<LineageEdgeVersion>>;
    fn get_lineage_edge_history(&self, source_key: &str) -> StoreResult<History>;
    fn get_lineage_edge_version(
        &self,
        lineage_edge_version_id: Id,
    ) -> StoreResult<LineageEdgeVersion>;

    fn create_lineage_graph(
        &mut self,
        source_key: &str,
        name: Option<&str>,
        tags: Option<Tags>,
    ) -> StoreResult<Id>;
    fn create_lineage_graph_version(
        &mut self,
        lineage_graph_id: Id,
        lineage_edge_version_ids: Vec<Id>,
        fields: VersionFields,
    ) -> StoreResult<Id>;
    fn get_lineage_graph(&self, source_key: &str) -> StoreResult<LineageGraph>;
    fn get_lineage_graph_latest_versions(
        &self,
        source_key: &str,
    ) -> StoreResult<Vec<LineageGraphVersion>>;
    fn get_lineage_graph_history(&self, source_key: &str) -> StoreResult<History>;
    fn get_lineage_graph_version(
        &self,
        lineage_graph_version_id: Id,
    ) -> StoreResult<LineageGraphVersion>;

    /// Lineage edge versions touching any rich version
    fn get_adjacent_lineage(&self, rich_version_id: Id) -> StoreResult<Vec<LineageEdgeVersion>>;

    /// Persist every item and version held
    fn commit(&mut self) -> StoreResult<CommitReport>;

    /// Restore the most recent snapshot into an empty graph
    ///
    /// Returns the number of records read. A graph that already holds objects is left as is
    /// and `Ok(0)` is returned.
    fn load(&mut self) -> StoreResult<usize>;
}

/// Build a client for `backend`
///
/// `git` is the only backend compiled in; `ground` names the server-backed one, which is
/// recognized but unavailable.
pub fn connect(backend: &str, config: StoreConfig) -> StoreResult<Box<dyn GroundApi>> {
    match backend.trim().to_lowercase().as_str() {
        "git" => Ok(Box::new(GitClient::open(config)?)),
        "ground" => Err(StoreError::BackendUnavailable("ground".to_string())),
        other => Err(StoreError::UnsupportedBackend(other.to_string())),
    }
}

type VcsOpener = Box<dyn Fn(&Path) -> PersistenceResult<Box<dyn VersionControl>> + Send>;

/// In-memory graph persisted to git snapshot directories
///
/// A client claims the next free slot under the snapshot root when it is opened. Commits go
/// to that slot; [`GroundApi::load`] reads the slot before it. The slot's repository is only
/// created on the first commit.
pub struct GitClient {
    store: GraphStore,
    config: StoreConfig,
    layout: SnapshotLayout,
    slot: u64,
    opener: VcsOpener,
    vcs: Option<Box<dyn VersionControl>>,
}

impl GitClient {
    pub fn open(config: StoreConfig) -> StoreResult<Self> {
        let backend = config.clone();
        Self::open_with(config, move |workdir| vcs::open(workdir, &backend))
    }

    /// Like [`GitClient::open`], with `opener` providing the repository for the slot directory
    pub fn open_with(
        config: StoreConfig,
        opener: impl Fn(&Path) -> PersistenceResult<Box<dyn VersionControl>> + Send + 'static,
    ) -> StoreResult<Self> {
        config.validate().map_err(StoreError::InvalidConfig)?;

        let layout = SnapshotLayout::new(&config.snapshot_root);
        let slot = layout.next_free_slot()?;
        info!(
            "Using snapshot slot {} under {}",
            slot,
            layout.root().display()
        );

        Ok(Self {
            store: GraphStore::new().with_parent_validation(config.validate_parents),
            config,
            layout,
            slot,
            opener: Box::new(opener),
            vcs: None,
        })
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut GraphStore {
        &mut self.store
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn layout(&self) -> &SnapshotLayout {
        &self.layout
    }

    /// Slot this client commits to
    pub fn slot(&self) -> u64 {
        self.slot
    }

    pub fn read_manifest(&self, slot: u64) -> StoreResult<Manifest> {
        Ok(snapshot::read_manifest(&self.layout.slot_dir(slot))?)
    }

    fn create_item<I: Stored>(&mut self, source_key: &str, build: impl FnOnce(Id) -> I) -> Id {
        self.store.create_item(source_key, build)
    }

    fn get_item<I: Stored>(&self, source_key: &str) -> StoreResult<I> {
        self.store.item::<I>(source_key).cloned()
    }

    fn get_latest<I: Stored>(&self, source_key: &str) -> StoreResult<Vec<I::Version>> {
        Ok(self
            .store
            .latest_versions::<I>(source_key)?
            .into_iter()
            .cloned()
            .collect())
    }

    fn get_version<I: Stored>(&self, id: Id) -> StoreResult<I::Version> {
        self.store.version::<I>(id).cloned()
    }
}

/// Apply the optional display name and tags shared by every item kind
macro_rules! labelled {
    ($item:expr, $name:expr, $tags:expr) => {{
        let mut item = $item;
        item.name = $name.map(str::to_string);
        item.tags = $tags;
        item
    }};
}

impl GroundApi for GitClient {
    fn backend_name(&self) -> &'static str {
        "git"
    }

    fn create_node(
        &mut self,
        source_key: &str,
        name: Option<&str>,
        tags: Option<Tags>,
    ) -> StoreResult<Id> {
        Ok(self.create_item(source_key, |id| {
            labelled!(Node::new(id, source_key), name, tags)
        }))
    }

    fn create_node_version(&mut self, node_id: Id, fields: VersionFields) -> StoreResult<Id> {
        self.store
            .create_version::<Node>(node_id, fields, NodeVersion::new)
    }

    fn get_node(&self, source_key: &str) -> StoreResult<Node> {
        self.get_item(source_key)
    }

    fn get_node_latest_versions(&self, source_key: &str) -> StoreResult<Vec<NodeVersion>> {
        self.get_latest::<Node>(source_key)
    }

    fn get_node_history(&self, source_key: &str) -> StoreResult<History> {
        self.store.history::<Node>(source_key)
    }

    fn get_node_version(&self, node_version_id: Id) -> StoreResult<NodeVersion> {
        self.get_version::<Node>(node_version_id)
    }

    fn get_node_version_adjacent_lineage(
        &self,
        node_version_id: Id,
    ) -> StoreResult<Vec<LineageEdgeVersion>> {
        Ok(self
            .store
            .node_version_adjacent_lineage(node_version_id)?
            .into_iter()
            .cloned()
            .collect())
    }

    fn create_edge(
        &mut self,
        source_key: &str,
        from_node_id: Id,
        to_node_id: Id,
        name: Option<&str>,
        tags: Option<Tags>,
    ) -> StoreResult<Id> {
        Ok(self.create_item(source_key, |id| {
            labelled!(
                Edge::new(id, source_key, from_node_id, to_node_id),
                name,
                tags
            )
        }))
    }

    fn create_edge_version(
        &mut self,
        edge_id: Id,
        endpoints: EdgeEndpoints,
        fields: VersionFields,
    ) -> StoreResult<Id> {
        self.store
            .create_version::<Edge>(edge_id, fields, |id, edge, fields| {
                EdgeVersion::new(id, edge, endpoints, fields)
            })
    }

    fn get_edge(&self, source_key: &str) -> StoreResult<Edge> {
        self.get_item(source_key)
    }

    fn get_edge_latest_versions(&self, source_key: &str) -> StoreResult<Vec<EdgeVersion>> {
        self.get_latest::<Edge>(source_key)
    }

    fn get_edge_history(&self, source_key: &str) -> StoreResult<History> {
        self.store.history::<Edge>(source_key)
    }

    fn get_edge_version(&self, edge_version_id: Id) -> StoreResult<EdgeVersion> {
        self.get_version::<Edge>(edge_version_id)
    }

    fn create_graph(
        &mut self,
        source_key: &str,
        name: Option<&str>,
        tags: Option<Tags>,
    ) -> StoreResult<Id> {
        Ok(self.create_item(source_key, |id| {
            labelled!(Graph::new(id, source_key), name, tags)
        }))
    }

    fn create_graph_version(
        &mut self,
        graph_id: Id,
        edge_version_ids: Vec<Id>,
        fields: VersionFields,
    ) -> StoreResult<Id> {
        self.store
            .create_version::<Graph>(graph_id, fields, |id, graph, fields| {
                GraphVersion::new(id, graph, edge_version_ids, fields)
            })
    }

    fn get_graph(&self, source_key: &str) -> StoreResult<Graph> {
        self.get_item(source_key)
    }

    fn get_graph_latest_versions(&self, source_key: &str) -> StoreResult<Vec<GraphVersion>> {
        self.get_latest::<Graph>(source_key)
    }

    fn get_graph_history(&self, source_key: &str) -> StoreResult<History> {
        self.store.history::<Graph>(source_key)
    }

    fn get_graph_version(&self, graph_version_id: Id) -> StoreResult<GraphVersion> {
        self.get_version::<Graph>(graph_version_id)
    }

    fn create_structure(
        &mut self,
        source_key: &str,
        name: Option<&str>,
        tags: Option<Tags>,
    ) -> StoreResult<Id> {
        Ok(self.create_item(source_key, |id| {
            labelled!(Structure::new(id, source_key), name, tags)
        }))
    }

    fn create_structure_version(
        &mut self,
        structure_id: Id,
        attributes: Attributes,
        fields: VersionFields,
    ) -> StoreResult<Id> {
        self.store
            .create_version::<Structure>(structure_id, fields, |id, structure, fields| {
                StructureVersion::new(id, structure, attributes, fields)
            })
    }

    fn get_structure(&self, source_key: &str) -> StoreResult<Structure> {
        self.get_item(source_key)
    }

    fn get_structure_latest_versions(
        &self,
        source_key: &str,
    ) -> StoreResult<Vec<StructureVersion>> {
        self.get_latest::<Structure>(source_key)
    }

    fn get_structure_history(&self, source_key: &str) -> StoreResult<History> {
        self.store.history::<Structure>(source_key)
    }

    fn get_structure_version(&self, structure_version_id: Id) -> StoreResult<StructureVersion> {
        self.get_version::<Structure>(structure_version_id)
    }

    fn create_lineage_edge(
        &mut self,
        source_key: &str,
        name: Option<&str>,
        tags: Option<Tags>,
    ) -> StoreResult<Id> {
        Ok(self.create_item(source_key, |id| {
            labelled!(LineageEdge::new(id, source_key), name, tags)
        }))
    }

    fn create_lineage_edge_version(
        &mut self,
        lineage_edge_id: Id,
        from_rich_version_id: Id,
        to_rich_version_id: Id,
        fields: VersionFields,
    ) -> StoreResult<Id> {
        self.store.create_version::<LineageEdge>(
            lineage_edge_id,
            fields,
            |id, lineage_edge, fields| {
                LineageEdgeVersion::new(
                    id,
                    lineage_edge,
                    from_rich_version_id,
                    to_rich_version_id,
                    fields,
                )
            },
        )
    }

    fn get_lineage_edge(&self, source_key: &str) -> StoreResult<LineageEdge> {
        self.get_item(source_key)
    }

    fn get_lineage_edge_latest_versions(
        &self,
        source_key: &str,
    ) -> StoreResult<Vec<LineageEdgeVersion>> {
        self.get_latest::<LineageEdge>(source_key)
    }

    fn get_lineage_edge_history(&self, source_key: &str) -> StoreResult<History> {
        self.store.history::<LineageEdge>(source_key)
    }

    fn get_lineage_edge_version(
        &self,
        lineage_edge_version_id: Id,
    ) -> StoreResult<LineageEdgeVersion> {
        self.get_version::<LineageEdge>(lineage_edge_version_id)
    }

    fn create_lineage_graph(
        &mut self,
        source_key: &str,
        name: Option<&str>,
        tags: Option<Tags>,
    ) -> StoreResult<Id> {
        Ok(self.create_item(source_key, |id| {
            labelled!(LineageGraph::new(id, source_key), name, tags)
        }))
    }

    fn create_lineage_graph_version(
        &mut self,
        lineage_graph_id: Id,
        lineage_edge_version_ids: Vec<Id>,
        fields: VersionFields,
    ) -> StoreResult<Id> {
        self.store.create_version::<LineageGraph>(
            lineage_graph_id,
            fields,
            |id, lineage_graph, fields| {
                LineageGraphVersion::new(id, lineage_graph, lineage_edge_version_ids, fields)
            },
        )
    }

    fn get_lineage_graph(&self, source_key: &str) -> StoreResult<LineageGraph> {
        self.get_item(source_key)
    }

    fn get_lineage_graph_latest_versions(
        &self,
        source_key: &str,
    ) -> StoreResult<Vec<LineageGraphVersion>> {
        self.get_latest::<LineageGraph>(source_key)
    }

    fn get_lineage_graph_history(&self, source_key: &str) -> StoreResult<History> {
        self.store.history::<LineageGraph>(source_key)
    }

    fn get_lineage_graph_version(
        &self,
        lineage_graph_version_id: Id,
    ) -> StoreResult<LineageGraphVersion> {
        self.get_version::<LineageGraph>(lineage_graph_version_id)
    }

    fn get_adjacent_lineage(&self, rich_version_id: Id) -> StoreResult<Vec<LineageEdgeVersion>> {
        Ok(self
            .store
            .adjacent_lineage(rich_version_id)
            .into_iter()
            .cloned()
            .collect())
    }

    fn commit(&mut self) -> StoreResult<CommitReport> {
        let mut vcs = match self.vcs.take() {
            Some(vcs) => vcs,
            None => (self.opener)(&self.layout.slot_dir(self.slot))?,
        };

        let report = snapshot::commit_store(
            &self.store,
            &mut *vcs,
            self.slot,
            &self.config.commit_message,
        );
        self.vcs = Some(vcs);
        report
    }

    fn load(&mut self) -> StoreResult<usize> {
        if !self.store.is_empty() {
            info!(
                "Graph already holds {} records, not loading",
                self.store.len()
            );
            return Ok(0);
        }

        let slot = self
            .layout
            .slot_before(self.slot)?
            .ok_or_else(|| PersistenceError::NoSnapshots(self.layout.root().to_path_buf()))?;
        snapshot::load_into(&mut self.store, &self.layout.slot_dir(slot))
    }
}
