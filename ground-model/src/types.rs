//! Field groups shared across item and version kinds

use crate::ids::Id;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Arbitrary metadata attached to an item or version
pub type Tags = BTreeMap<String, Value>;

/// Schema definition carried by a structure version
pub type Attributes = BTreeMap<String, Value>;

/// Parameters describing how to retrieve externally stored content
pub type ReferenceParameters = BTreeMap<String, String>;

/// Fields every version kind carries next to its kind-specific payload
///
/// Unset fields are left out of the serialized form entirely and decode back to `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionFields {
    /// Pointer to externally stored content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_parameters: Option<ReferenceParameters>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Tags>,

    /// Structure version describing this version's schema
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structure_version_id: Option<Id>,

    /// Versions of the same kind this one was derived from; absent or empty for a root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_ids: Option<Vec<Id>>,
}

impl VersionFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn with_reference_parameter(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.reference_parameters
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn with_reference_parameters(mut self, parameters: ReferenceParameters) -> Self {
        self.reference_parameters = Some(parameters);
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.tags
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn with_tags(mut self, tags: Tags) -> Self {
        self.tags = Some(tags);
        self
    }

    pub fn with_structure_version(mut self, structure_version_id: Id) -> Self {
        self.structure_version_id = Some(structure_version_id);
        self
    }

    pub fn with_parents(mut self, parent_ids: impl IntoIterator<Item = Id>) -> Self {
        self.parent_ids = Some(parent_ids.into_iter().collect());
        self
    }

    /// Parent ids, empty for a root version
    pub fn parents(&self) -> &[Id] {
        self.parent_ids.as_deref().unwrap_or(&[])
    }
}

/// Validity interval of an edge version over the history of its two nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeEndpoints {
    pub from_node_version_start_id: Id,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_node_version_end_id: Option<Id>,

    pub to_node_version_start_id: Id,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_node_version_end_id: Option<Id>,
}

impl EdgeEndpoints {
    /// Open-ended interval starting at the given node versions
    pub fn starting_at(from_node_version_id: Id, to_node_version_id: Id) -> Self {
        Self {
            from_node_version_start_id: from_node_version_id,
            from_node_version_end_id: None,
            to_node_version_start_id: to_node_version_id,
            to_node_version_end_id: None,
        }
    }

    pub fn ending_at(mut self, from_node_version_id: Id, to_node_version_id: Id) -> Self {
        self.from_node_version_end_id = Some(from_node_version_id);
        self.to_node_version_end_id = Some(to_node_version_id);
        self
    }
}
