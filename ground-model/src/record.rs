//! Serialized form of items and versions
//!
//! Every object is written as one JSON record whose fields are the object's own, plus a
//! `class` discriminator naming its kind. Unset optional fields are omitted.

use crate::error::{ModelError, ModelResult};
use crate::ids::Id;
use crate::items::{Edge, Graph, LineageEdge, LineageGraph, Node, Structure};
use crate::kind::{Item, Kind, Role, Version};
use crate::versions::{
    EdgeVersion, GraphVersion, LineageEdgeVersion, LineageGraphVersion, NodeVersion,
    StructureVersion,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Any item or version, tagged by its class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "class")]
pub enum Record {
    Node(Node),
    NodeVersion(NodeVersion),
    Edge(Edge),
    EdgeVersion(EdgeVersion),
    Graph(Graph),
    GraphVersion(GraphVersion),
    Structure(Structure),
    StructureVersion(StructureVersion),
    LineageEdge(LineageEdge),
    LineageEdgeVersion(LineageEdgeVersion),
    LineageGraph(LineageGraph),
    LineageGraphVersion(LineageGraphVersion),
}

impl Record {
    /// Every recognized `class` value
    pub const CLASSES: [&'static str; 12] = [
        "Node",
        "NodeVersion",
        "Edge",
        "EdgeVersion",
        "Graph",
        "GraphVersion",
        "Structure",
        "StructureVersion",
        "LineageEdge",
        "LineageEdgeVersion",
        "LineageGraph",
        "LineageGraphVersion",
    ];

    /// Item id or version id, depending on the record's role
    pub fn id(&self) -> Id {
        match self {
            Record::Node(r) => r.id(),
            Record::NodeVersion(r) => r.version_id(),
            Record::Edge(r) => r.id(),
            Record::EdgeVersion(r) => r.version_id(),
            Record::Graph(r) => r.id(),
            Record::GraphVersion(r) => r.version_id(),
            Record::Structure(r) => r.id(),
            Record::StructureVersion(r) => r.version_id(),
            Record::LineageEdge(r) => r.id(),
            Record::LineageEdgeVersion(r) => r.version_id(),
            Record::LineageGraph(r) => r.id(),
            Record::LineageGraphVersion(r) => r.version_id(),
        }
    }

    pub fn kind(&self) -> Kind {
        match self {
            Record::Node(_) | Record::NodeVersion(_) => Kind::Node,
            Record::Edge(_) | Record::EdgeVersion(_) => Kind::Edge,
            Record::Graph(_) | Record::GraphVersion(_) => Kind::Graph,
            Record::Structure(_) | Record::StructureVersion(_) => Kind::Structure,
            Record::LineageEdge(_) | Record::LineageEdgeVersion(_) => Kind::LineageEdge,
            Record::LineageGraph(_) | Record::LineageGraphVersion(_) => Kind::LineageGraph,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Record::Node(_)
            | Record::Edge(_)
            | Record::Graph(_)
            | Record::Structure(_)
            | Record::LineageEdge(_)
            | Record::LineageGraph(_) => Role::Item,
            _ => Role::Version,
        }
    }

    pub fn class(&self) -> &'static str {
        match self.role() {
            Role::Item => self.kind().item_class(),
            Role::Version => self.kind().version_class(),
        }
    }

    pub fn source_key(&self) -> &str {
        match self {
            Record::Node(r) => Item::source_key(r),
            Record::NodeVersion(r) => Version::source_key(r),
            Record::Edge(r) => Item::source_key(r),
            Record::EdgeVersion(r) => Version::source_key(r),
            Record::Graph(r) => Item::source_key(r),
            Record::GraphVersion(r) => Version::source_key(r),
            Record::Structure(r) => Item::source_key(r),
            Record::StructureVersion(r) => Version::source_key(r),
            Record::LineageEdge(r) => Item::source_key(r),
            Record::LineageEdgeVersion(r) => Version::source_key(r),
            Record::LineageGraph(r) => Item::source_key(r),
            Record::LineageGraphVersion(r) => Version::source_key(r),
        }
    }

    /// Structured form of this record, including the `class` field
    pub fn to_value(&self) -> ModelResult<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Rebuild a record from its structured form
    ///
    /// The `class` field is checked before decoding so an unrecognized kind is reported as
    /// such rather than as a generic decoding failure.
    pub fn from_value(value: Value) -> ModelResult<Self> {
        let class = value
            .get("class")
            .and_then(Value::as_str)
            .ok_or(ModelError::MissingClass)?;

        if !Self::CLASSES.contains(&class) {
            return Err(ModelError::UnknownClass(class.to_string()));
        }

        Ok(serde_json::from_value(value)?)
    }

    pub fn to_json(&self) -> ModelResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> ModelResult<Self> {
        Self::from_value(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EdgeEndpoints, VersionFields};
    use serde_json::json;

    #[test]
    fn test_class_discriminator_is_written() {
        let record = Record::from(Node::new(0, "testSourceKey"));
        assert_eq!(
            record.to_value().unwrap(),
            json!({ "class": "Node", "nodeId": 0, "sourceKey": "testSourceKey" })
        );
        assert_eq!(record.class(), "Node");
        assert_eq!(record.role(), Role::Item);
    }

    #[test]
    fn test_sparse_version_round_trip() {
        let node = Node::new(0, "k");
        let record = Record::from(NodeVersion::new(1, &node, VersionFields::new()));

        let value = record.to_value().unwrap();
        let object = value.as_object().unwrap();
        for absent in ["reference", "referenceParameters", "tags", "structureVersionId", "parentIds"] {
            assert!(!object.contains_key(absent), "{} should be omitted", absent);
        }

        match Record::from_value(value).unwrap() {
            Record::NodeVersion(decoded) => {
                assert_eq!(decoded.fields, VersionFields::default());
                assert!(decoded.fields.parent_ids.is_none());
            }
            other => panic!("Expected NodeVersion, got {:?}", other),
        }
    }

    #[test]
    fn test_populated_edge_version_round_trip() {
        let edge = Edge::new(0, "e", 10, 11).with_name("flows");
        let version = EdgeVersion::new(
            1,
            &edge,
            EdgeEndpoints::starting_at(5, 4).ending_at(7, 6),
            VersionFields::new()
                .with_reference("testReference")
                .with_reference_parameter("format", "parquet")
                .with_tag("testKey", "testValue")
                .with_structure_version(1)
                .with_parents([2, 3]),
        );

        let json = Record::from(version.clone()).to_json().unwrap();
        assert_eq!(
            Record::from_json(&json).unwrap(),
            Record::EdgeVersion(version)
        );
    }

    #[test]
    fn test_structure_version_keeps_attributes() {
        let structure = Structure::new(0, "schema");
        let mut attributes = crate::types::Attributes::new();
        attributes.insert("id".to_string(), json!("int"));
        attributes.insert("nested".to_string(), json!({ "a": [1, 2] }));
        let version = StructureVersion::new(1, &structure, attributes, VersionFields::new());

        let decoded = Record::from_value(Record::from(version.clone()).to_value().unwrap()).unwrap();
        assert_eq!(decoded, Record::StructureVersion(version));
        assert_eq!(decoded.kind(), Kind::Structure);
        assert_eq!(decoded.id(), 1);
        assert_eq!(decoded.source_key(), "schema");
    }

    fn populated_fields(parents: [Id; 2]) -> VersionFields {
        VersionFields::new()
            .with_reference("s3://bucket/key")
            .with_reference_parameter("format", "parquet")
            .with_tag("testKey", "testValue")
            .with_tag("rows", 10)
            .with_structure_version(40)
            .with_parents(parents)
    }

    #[test]
    fn test_populated_records_round_trip_for_every_kind() {
        let mut tags = crate::types::Tags::new();
        tags.insert("owner".to_string(), json!("etl"));
        let mut attributes = crate::types::Attributes::new();
        attributes.insert("id".to_string(), json!("int"));

        let node = Node::new(0, "n").with_name("input").with_tags(tags.clone());
        let edge = Edge::new(1, "e", 0, 0).with_name("flows").with_tags(tags.clone());
        let graph = Graph::new(2, "g").with_name("pipeline").with_tags(tags.clone());
        let structure = Structure::new(3, "s").with_name("schema").with_tags(tags.clone());
        let lineage_edge = LineageEdge::new(4, "l").with_name("derived").with_tags(tags.clone());
        let lineage_graph = LineageGraph::new(5, "lg").with_name("run").with_tags(tags);

        // Structure versions carry no schema reference of their own.
        let mut structure_fields = populated_fields([21, 22]);
        structure_fields.structure_version_id = None;

        let records: Vec<Record> = vec![
            NodeVersion::new(10, &node, populated_fields([11, 12])).into(),
            EdgeVersion::new(
                13,
                &edge,
                EdgeEndpoints::starting_at(10, 11).ending_at(12, 11),
                populated_fields([14, 15]),
            )
            .into(),
            GraphVersion::new(16, &graph, vec![13], populated_fields([17, 18])).into(),
            StructureVersion::new(20, &structure, attributes, structure_fields).into(),
            LineageEdgeVersion::new(23, &lineage_edge, 10, 20, populated_fields([24, 25])).into(),
            LineageGraphVersion::new(26, &lineage_graph, vec![23], populated_fields([27, 28]))
                .into(),
            node.into(),
            edge.into(),
            graph.into(),
            structure.into(),
            lineage_edge.into(),
            lineage_graph.into(),
        ];

        for record in records {
            let json = record.to_json().unwrap();
            let decoded = Record::from_json(&json).unwrap();
            assert_eq!(decoded, record, "{} changed in a round trip", record.class());
            assert_eq!(decoded.id(), record.id());
        }
    }

    #[test]
    fn test_unknown_class_is_rejected() {
        let result = Record::from_value(json!({ "class": "Table", "tableId": 0 }));
        match result {
            Err(ModelError::UnknownClass(class)) => assert_eq!(class, "Table"),
            other => panic!("Expected UnknownClass, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_class_is_rejected() {
        let result = Record::from_json(r#"{ "nodeId": 0, "sourceKey": "k" }"#);
        assert!(matches!(result, Err(ModelError::MissingClass)));
    }

    #[test]
    fn test_missing_required_field_is_serialization_error() {
        let result = Record::from_value(json!({ "class": "Edge", "edgeId": 0, "sourceKey": "e" }));
        assert!(matches!(result, Err(ModelError::Serialization(_))));
    }

    #[test]
    fn test_classes_match_kinds() {
        for kind in Kind::ALL {
            assert!(Record::CLASSES.contains(&kind.item_class()));
            assert!(Record::CLASSES.contains(&kind.version_class()));
        }
    }
}
