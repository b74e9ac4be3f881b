//! Endpoint index over lineage edge versions

use ground_model::{Id, LineageEdgeVersion};
use std::collections::{BTreeSet, HashMap};

/// Maps a rich version id to the lineage edge versions that start or end at it
#[derive(Debug, Clone, Default)]
pub struct LineageIndex {
    by_endpoint: HashMap<Id, BTreeSet<Id>>,
}

impl LineageIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, version: &LineageEdgeVersion) {
        for endpoint in [version.from_rich_version_id, version.to_rich_version_id] {
            self.by_endpoint
                .entry(endpoint)
                .or_default()
                .insert(version.lineage_edge_version_id);
        }
    }

    /// Lineage edge version ids touching `rich_version_id`, ascending
    pub fn adjacent(&self, rich_version_id: Id) -> impl Iterator<Item = Id> + '_ {
        self.by_endpoint
            .get(&rich_version_id)
            .into_iter()
            .flat_map(|ids| ids.iter().copied())
    }
}
