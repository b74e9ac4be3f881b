//! Versioning engine
//!
//! [`GraphStore`] owns every item and version of one graph instance. Items are created
//! idempotently per source key; versions hang off an existing item and name their parents,
//! forming one DAG per item. All ids come from a single [`IdAllocator`], so any id resolves to
//! exactly one object through [`GraphStore::record`].

use crate::error::{StoreError, StoreResult};
use crate::history::{self, History};
use crate::lineage::LineageIndex;
use ground_model::{
    Edge, Graph, Id, IdAllocator, Item, Kind, LineageEdge, LineageEdgeVersion, LineageGraph,
    Node, Record, Role, Structure, Version, VersionFields,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};
use tracing::debug;

/// A store shared between threads; every operation takes the lock for its whole duration
pub type SharedStore = Arc<RwLock<GraphStore>>;

/// Items and versions of one kind
#[derive(Debug, Clone)]
pub struct KindTable<I: Item> {
    items: BTreeMap<Id, I>,
    keys: HashMap<String, Id>,
    versions: BTreeMap<Id, I::Version>,
    // Version ids per source key, in creation order.
    versions_by_key: HashMap<String, Vec<Id>>,
}

impl<I: Item> Default for KindTable<I> {
    fn default() -> Self {
        Self {
            items: BTreeMap::new(),
            keys: HashMap::new(),
            versions: BTreeMap::new(),
            versions_by_key: HashMap::new(),
        }
    }
}

impl<I: Item> KindTable<I> {
    pub fn item(&self, id: Id) -> Option<&I> {
        self.items.get(&id)
    }

    pub fn item_by_key(&self, source_key: &str) -> Option<&I> {
        self.keys.get(source_key).and_then(|id| self.items.get(id))
    }

    pub fn version(&self, id: Id) -> Option<&I::Version> {
        self.versions.get(&id)
    }

    /// Versions created under `source_key`, oldest first
    pub fn versions_of(&self, source_key: &str) -> Vec<&I::Version> {
        self.versions_by_key
            .get(source_key)
            .into_iter()
            .flatten()
            .filter_map(|id| self.versions.get(id))
            .collect()
    }

    pub fn items(&self) -> impl Iterator<Item = &I> {
        self.items.values()
    }

    pub fn versions(&self) -> impl Iterator<Item = &I::Version> {
        self.versions.values()
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn version_count(&self) -> usize {
        self.versions.len()
    }

    fn insert_item(&mut self, item: I) {
        self.keys.insert(item.source_key().to_string(), item.id());
        self.items.insert(item.id(), item);
    }

    fn insert_version(&mut self, version: I::Version) {
        self.versions_by_key
            .entry(version.source_key().to_string())
            .or_default()
            .push(version.version_id());
        self.versions.insert(version.version_id(), version);
    }
}

/// One table per kind
#[derive(Debug, Clone, Default)]
pub struct Tables {
    nodes: KindTable<Node>,
    edges: KindTable<Edge>,
    graphs: KindTable<Graph>,
    structures: KindTable<Structure>,
    lineage_edges: KindTable<LineageEdge>,
    lineage_graphs: KindTable<LineageGraph>,
}

/// An item kind the store keeps a table for
pub trait Stored: Item + 'static {
    fn table(tables: &Tables) -> &KindTable<Self>;

    fn table_mut(tables: &mut Tables) -> &mut KindTable<Self>;

    /// Hook run after a version of this kind is stored
    fn index(_version: &Self::Version, _lineage: &mut LineageIndex) {}
}

macro_rules! stored {
    ($item:ty, $table:ident) => {
        impl Stored for $item {
            fn table(tables: &Tables) -> &KindTable<Self> {
                &tables.$table
            }

            fn table_mut(tables: &mut Tables) -> &mut KindTable<Self> {
                &mut tables.$table
            }
        }
    };
}

stored!(Node, nodes);
stored!(Edge, edges);
stored!(Graph, graphs);
stored!(Structure, structures);
stored!(LineageGraph, lineage_graphs);

impl Stored for LineageEdge {
    fn table(tables: &Tables) -> &KindTable<Self> {
        &tables.lineage_edges
    }

    fn table_mut(tables: &mut Tables) -> &mut KindTable<Self> {
        &mut tables.lineage_edges
    }

    fn index(version: &LineageEdgeVersion, lineage: &mut LineageIndex) {
        lineage.insert(version);
    }
}

#[derive(Debug, Clone)]
pub struct GraphStore {
    ids: IdAllocator,
    tables: Tables,
    owners: BTreeMap<Id, (Kind, Role)>,
    lineage: LineageIndex,
    validate_parents: bool,
}

impl Default for GraphStore {
    fn default() -> Self {
        Self {
            ids: IdAllocator::new(),
            tables: Tables::default(),
            owners: BTreeMap::new(),
            lineage: LineageIndex::new(),
            validate_parents: true,
        }
    }
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept versions whose parents are unknown or of another kind
    pub fn with_parent_validation(mut self, validate: bool) -> Self {
        self.validate_parents = validate;
        self
    }

    pub fn into_shared(self) -> SharedStore {
        Arc::new(RwLock::new(self))
    }

    pub fn ids(&self) -> &IdAllocator {
        &self.ids
    }

    /// Number of items and versions held
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    pub fn table<I: Stored>(&self) -> &KindTable<I> {
        I::table(&self.tables)
    }

    /// Create the item for `source_key`, or return the id of the one that already exists
    ///
    /// `build` receives the freshly allocated id and is only called when the key is new.
    pub fn create_item<I: Stored>(&mut self, source_key: &str, build: impl FnOnce(Id) -> I) -> Id {
        let table = I::table_mut(&mut self.tables);
        if let Some(item) = table.item_by_key(source_key) {
            debug!("{} '{}' already exists as {}", I::KIND, source_key, item.id());
            return item.id();
        }

        let id = self.ids.allocate();
        let item = build(id);
        debug_assert_eq!(item.id(), id);
        debug_assert_eq!(item.source_key(), source_key);
        table.insert_item(item);
        self.owners.insert(id, (I::KIND, Role::Item));

        debug!("Created {} '{}' with id {}", I::KIND, source_key, id);
        id
    }

    /// Create a new version of item `item_id`
    ///
    /// Parents must be existing versions of the same kind, though not necessarily of the same
    /// source key. Fields are checked before an id is allocated, so a rejected version leaves
    /// the id counter untouched.
    pub fn create_version<I: Stored>(
        &mut self,
        item_id: Id,
        fields: VersionFields,
        build: impl FnOnce(Id, &I, VersionFields) -> I::Version,
    ) -> StoreResult<Id> {
        let table = I::table_mut(&mut self.tables);
        let item = table.item(item_id).ok_or(StoreError::UnknownItem {
            kind: I::KIND,
            id: item_id,
        })?;

        // A structure version's own id already occupies `structureVersionId`.
        if I::KIND == Kind::Structure && fields.structure_version_id.is_some() {
            return Err(StoreError::UnsupportedField {
                kind: I::KIND,
                field: "structureVersionId",
            });
        }

        if self.validate_parents {
            if let Some(&parent) = fields
                .parents()
                .iter()
                .find(|parent| table.version(**parent).is_none())
            {
                return Err(StoreError::MalformedParent {
                    kind: I::KIND,
                    parent,
                });
            }
        }

        let id = self.ids.allocate();
        let version = build(id, item, fields);
        debug_assert_eq!(version.version_id(), id);
        I::index(&version, &mut self.lineage);
        table.insert_version(version);
        self.owners.insert(id, (I::KIND, Role::Version));

        debug!("Created {} {} of item {}", I::KIND.version_class(), id, item_id);
        Ok(id)
    }

    pub fn item<I: Stored>(&self, source_key: &str) -> StoreResult<&I> {
        self.table::<I>().item_by_key(source_key).ok_or_else(|| {
            StoreError::NotFound(format!("{} with source key '{}'", I::KIND, source_key))
        })
    }

    pub fn item_by_id<I: Stored>(&self, id: Id) -> StoreResult<&I> {
        self.table::<I>()
            .item(id)
            .ok_or_else(|| StoreError::NotFound(format!("{} {}", I::KIND, id)))
    }

    pub fn version<I: Stored>(&self, id: Id) -> StoreResult<&I::Version> {
        self.table::<I>()
            .version(id)
            .ok_or_else(|| StoreError::NotFound(format!("{} {}", I::KIND.version_class(), id)))
    }

    fn versions_of<I: Stored>(&self, source_key: &str) -> StoreResult<Vec<&I::Version>> {
        let versions = self.table::<I>().versions_of(source_key);
        if versions.is_empty() {
            return Err(StoreError::NotFound(format!(
                "{} versions for source key '{}'",
                I::KIND,
                source_key
            )));
        }
        Ok(versions)
    }

    /// Versions of `source_key` that are not the parent of any other version of that key
    pub fn latest_versions<I: Stored>(&self, source_key: &str) -> StoreResult<Vec<&I::Version>> {
        Ok(history::heads(&self.versions_of::<I>(source_key)?))
    }

    /// Flattened parent to child map of `source_key`'s versions; see [`History`]
    pub fn history<I: Stored>(&self, source_key: &str) -> StoreResult<History> {
        Ok(history::parent_child_map(&self.versions_of::<I>(source_key)?))
    }

    /// Lineage edge versions that start or end at `rich_version_id`, ascending by id
    ///
    /// The id is not checked; an id nothing points at has no adjacent lineage.
    pub fn adjacent_lineage(&self, rich_version_id: Id) -> Vec<&LineageEdgeVersion> {
        let table = self.table::<LineageEdge>();
        self.lineage
            .adjacent(rich_version_id)
            .filter_map(|id| table.version(id))
            .collect()
    }

    /// Like [`GraphStore::adjacent_lineage`], but `node_version_id` must name a node version
    pub fn node_version_adjacent_lineage(
        &self,
        node_version_id: Id,
    ) -> StoreResult<Vec<&LineageEdgeVersion>> {
        self.version::<Node>(node_version_id)?;
        Ok(self.adjacent_lineage(node_version_id))
    }

    pub fn kind_of(&self, id: Id) -> Option<(Kind, Role)> {
        self.owners.get(&id).copied()
    }

    /// The object `id` belongs to, in its serialized form
    pub fn record(&self, id: Id) -> Option<Record> {
        let (kind, role) = self.kind_of(id)?;
        match kind {
            Kind::Node => self.record_of::<Node>(id, role),
            Kind::Edge => self.record_of::<Edge>(id, role),
            Kind::Graph => self.record_of::<Graph>(id, role),
            Kind::Structure => self.record_of::<Structure>(id, role),
            Kind::LineageEdge => self.record_of::<LineageEdge>(id, role),
            Kind::LineageGraph => self.record_of::<LineageGraph>(id, role),
        }
    }

    fn record_of<I: Stored>(&self, id: Id, role: Role) -> Option<Record> {
        let table = self.table::<I>();
        match role {
            Role::Item => table.item(id).cloned().map(Into::into),
            Role::Version => table.version(id).cloned().map(Into::into),
        }
    }

    /// Every item and version, ascending by id
    pub fn records(&self) -> impl Iterator<Item = Record> + '_ {
        self.owners.keys().filter_map(|id| self.record(*id))
    }

    /// Insert a previously serialized object under its stored id
    ///
    /// Parents are not validated, so records may arrive in any order. The id counter moves
    /// past the restored id.
    pub fn restore(&mut self, record: Record) -> StoreResult<()> {
        let id = record.id();
        if !self.ids.register(id) {
            return Err(StoreError::DuplicateId(id));
        }
        self.owners.insert(id, (record.kind(), record.role()));

        match record {
            Record::Node(item) => self.restore_item(item),
            Record::NodeVersion(version) => self.restore_version::<Node>(version),
            Record::Edge(item) => self.restore_item(item),
            Record::EdgeVersion(version) => self.restore_version::<Edge>(version),
            Record::Graph(item) => self.restore_item(item),
            Record::GraphVersion(version) => self.restore_version::<Graph>(version),
            Record::Structure(item) => self.restore_item(item),
            Record::StructureVersion(version) => self.restore_version::<Structure>(version),
            Record::LineageEdge(item) => self.restore_item(item),
            Record::LineageEdgeVersion(version) => self.restore_version::<LineageEdge>(version),
            Record::LineageGraph(item) => self.restore_item(item),
            Record::LineageGraphVersion(version) => {
                self.restore_version::<LineageGraph>(version)
            }
        }
        Ok(())
    }

    /// Restore every record or none of them
    ///
    /// Records are staged on a copy of the store, which replaces it only once all of them were
    /// accepted.
    pub fn restore_all(&mut self, records: impl IntoIterator<Item = Record>) -> StoreResult<usize> {
        let mut staged = self.clone();
        let mut count = 0;
        for record in records {
            staged.restore(record)?;
            count += 1;
        }

        *self = staged;
        debug!("Restored {} records, next id {}", count, self.ids.next_id());
        Ok(count)
    }

    fn restore_item<I: Stored>(&mut self, item: I) {
        I::table_mut(&mut self.tables).insert_item(item);
    }

    fn restore_version<I: Stored>(&mut self, version: I::Version) {
        I::index(&version, &mut self.lineage);
        I::table_mut(&mut self.tables).insert_version(version);
    }
}
