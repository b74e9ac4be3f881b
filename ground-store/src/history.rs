//! Queries over one source key's version DAG

use ground_model::{Id, Version};
use std::collections::{BTreeMap, HashSet};

/// Parent id to child id pairs of one source key's versions
///
/// This is a flattened view, not the DAG: a parent with several children keeps only the last
/// child visited, and the owning item's id is seeded with the first parent seen so the root of
/// the chain can be found from the item.
pub type History = BTreeMap<Id, Id>;

/// Versions that no other version of the same key names as a parent
///
/// Input order is preserved. A key with a single version is its own head.
pub fn heads<'a, V: Version>(versions: &[&'a V]) -> Vec<&'a V> {
    let referenced: HashSet<Id> = versions
        .iter()
        .flat_map(|version| version.parent_ids().iter().copied())
        .collect();

    versions
        .iter()
        .copied()
        .filter(|version| !referenced.contains(&version.version_id()))
        .collect()
}

/// Build the flattened parent to child map, visiting versions in creation order
///
/// Later children overwrite earlier ones under the same parent. Before the first pair is
/// written, the item id is mapped to that first parent.
pub fn parent_child_map<V: Version>(versions: &[&V]) -> History {
    let mut history = History::new();

    for version in versions {
        for &parent in version.parent_ids() {
            if history.is_empty() {
                history.insert(version.item_id(), parent);
            }
            history.insert(parent, version.version_id());
        }
    }

    history
}
