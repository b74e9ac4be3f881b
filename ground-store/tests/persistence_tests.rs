//! Commit/load round trips against real git repositories.

use ground_store::prelude::*;
use ground_store::snapshot::{self, MANIFEST_FILE};
use serde_json::json;
use std::process::{Command, Stdio};
use tempfile::TempDir;

fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|status| status.success())
}

/// Every field a caller can set
fn populated(tags: &Tags, parents: Vec<Id>) -> VersionFields {
    VersionFields::new()
        .with_reference("testReference")
        .with_reference_parameter("format", "csv")
        .with_tags(tags.clone())
        .with_parents(parents)
}

/// One item of every kind, each with a sparse root version and a fully populated child
fn populate(client: &mut dyn GroundApi) {
    let mut tags = Tags::new();
    tags.insert("testKey".to_string(), json!("testValue"));

    let structure = client
        .create_structure("schema", Some("schema"), Some(tags.clone()))
        .unwrap();
    let mut attributes = Attributes::new();
    attributes.insert("id".to_string(), json!("int"));
    let sv1 = client
        .create_structure_version(structure, attributes.clone(), VersionFields::new())
        .unwrap();
    let sv = client
        .create_structure_version(structure, attributes, populated(&tags, vec![sv1]))
        .unwrap();

    let from = client.create_node("from", Some("source"), Some(tags.clone())).unwrap();
    let to = client.create_node("to", None, None).unwrap();
    let v1 = client.create_node_version(from, VersionFields::new()).unwrap();
    let v2 = client
        .create_node_version(from, populated(&tags, vec![v1]).with_structure_version(sv))
        .unwrap();
    let w1 = client.create_node_version(to, VersionFields::new()).unwrap();

    let edge = client.create_edge("edge", from, to, Some("flows"), Some(tags.clone())).unwrap();
    let ev1 = client
        .create_edge_version(edge, EdgeEndpoints::starting_at(v1, w1), VersionFields::new())
        .unwrap();
    let ev = client
        .create_edge_version(
            edge,
            EdgeEndpoints::starting_at(v1, w1).ending_at(v2, w1),
            populated(&tags, vec![ev1]).with_structure_version(sv),
        )
        .unwrap();

    let graph = client.create_graph("graph", Some("pipeline"), Some(tags.clone())).unwrap();
    let gv1 = client
        .create_graph_version(graph, vec![ev1], VersionFields::new())
        .unwrap();
    let gv = client
        .create_graph_version(
            graph,
            vec![ev1, ev],
            populated(&tags, vec![gv1]).with_structure_version(sv),
        )
        .unwrap();

    let lineage_edge = client
        .create_lineage_edge("derived", Some("derived"), Some(tags.clone()))
        .unwrap();
    let lv1 = client
        .create_lineage_edge_version(lineage_edge, v1, gv1, VersionFields::new())
        .unwrap();
    let lv = client
        .create_lineage_edge_version(
            lineage_edge,
            v2,
            gv,
            populated(&tags, vec![lv1]).with_structure_version(sv),
        )
        .unwrap();

    let lineage_graph = client
        .create_lineage_graph("run", Some("run"), Some(tags.clone()))
        .unwrap();
    let lgv1 = client
        .create_lineage_graph_version(lineage_graph, vec![lv1], VersionFields::new())
        .unwrap();
    client
        .create_lineage_graph_version(
            lineage_graph,
            vec![lv1, lv],
            populated(&tags, vec![lgv1]).with_structure_version(sv),
        )
        .unwrap();
}

fn round_trip(vcs: VcsBackend) {
    let root = TempDir::new().unwrap();
    let config = StoreConfig::default()
        .with_snapshot_root(root.path())
        .with_vcs(vcs);

    let mut committed = GitClient::open(config.clone()).unwrap();
    populate(&mut committed);
    let report = committed.commit().unwrap();
    assert_eq!(report.slot, 0);
    assert_eq!(report.artifacts, committed.store().len());
    assert_ne!(report.data_commit, report.manifest_commit);

    let manifest = committed.read_manifest(0).unwrap();
    assert_eq!(manifest.len(), committed.store().len());
    assert!(manifest.get(MANIFEST_FILE).is_none());
    assert!(manifest
        .iter()
        .all(|(_, commit)| commit == report.data_commit));

    let mut restored = GitClient::open(config).unwrap();
    assert_eq!(restored.slot(), 1);
    assert_eq!(restored.load().unwrap(), committed.store().len());

    assert_eq!(
        restored.store().records().collect::<Vec<_>>(),
        committed.store().records().collect::<Vec<_>>()
    );
    assert_eq!(
        restored.store().ids().next_id(),
        committed.store().ids().next_id()
    );
    assert_eq!(
        restored.get_node_latest_versions("from").unwrap(),
        committed.get_node_latest_versions("from").unwrap()
    );

    // New objects continue after the largest restored id.
    let next = restored.create_node("late", None, None).unwrap();
    assert_eq!(next, committed.store().ids().next_id());
}

#[test]
fn test_round_trip_with_libgit2() {
    round_trip(VcsBackend::Libgit2);
}

#[test]
fn test_round_trip_with_git_binary() {
    if !git_available() {
        eprintln!("Skipping test: git not found");
        return;
    }
    round_trip(VcsBackend::Cli);
}

#[test]
fn test_second_commit_only_moves_changed_artifacts() {
    let root = TempDir::new().unwrap();
    let mut client =
        GitClient::open(StoreConfig::default().with_snapshot_root(root.path())).unwrap();

    let node = client.create_node("k", None, None).unwrap();
    let first = client.commit().unwrap();
    let version = client.create_node_version(node, VersionFields::new()).unwrap();
    let second = client.commit().unwrap();

    let manifest = client.read_manifest(client.slot()).unwrap();
    assert_eq!(
        manifest.get(&snapshot::artifact_name(node)),
        Some(&first.data_commit)
    );
    assert_eq!(
        manifest.get(&snapshot::artifact_name(version)),
        Some(&second.data_commit)
    );
}

#[test]
fn test_load_is_a_no_op_on_a_populated_graph() {
    let root = TempDir::new().unwrap();
    let config = StoreConfig::default().with_snapshot_root(root.path());

    let mut first = GitClient::open(config.clone()).unwrap();
    first.create_node("a", None, None).unwrap();
    first.commit().unwrap();

    let mut second = GitClient::open(config).unwrap();
    second.create_node("b", None, None).unwrap();
    assert_eq!(second.load().unwrap(), 0);
    assert!(second.get_node("a").is_err());
}

#[test]
fn test_unknown_class_fails_load() {
    let root = TempDir::new().unwrap();
    let slot = root.path().join("0");
    std::fs::create_dir_all(&slot).unwrap();
    std::fs::write(slot.join("0.json"), r#"{"class": "Table", "tableId": 0}"#).unwrap();

    let mut client =
        connect("git", StoreConfig::default().with_snapshot_root(root.path())).unwrap();
    match client.load() {
        Err(StoreError::Persistence(PersistenceError::Artifact { source, .. })) => {
            assert!(matches!(source, ModelError::UnknownClass(_)))
        }
        other => panic!("Expected Artifact error, got {:?}", other),
    }
}

#[test]
fn test_rejected_snapshot_leaves_graph_empty() {
    let root = TempDir::new().unwrap();
    let slot = root.path().join("0");
    std::fs::create_dir_all(&slot).unwrap();
    std::fs::write(slot.join("0.json"), r#"{"class": "Node", "nodeId": 0, "sourceKey": "a"}"#)
        .unwrap();
    std::fs::write(slot.join("1.json"), r#"{"class": "Node", "nodeId": 0, "sourceKey": "b"}"#)
        .unwrap();

    let mut client =
        GitClient::open(StoreConfig::default().with_snapshot_root(root.path())).unwrap();
    assert!(matches!(client.load(), Err(StoreError::DuplicateId(0))));
    assert!(client.store().is_empty());

    // Retrying reports the same failure instead of keeping a partial graph.
    assert!(matches!(client.load(), Err(StoreError::DuplicateId(0))));
    assert!(client.store().is_empty());
}

#[test]
fn test_structure_version_with_schema_reference_is_rejected() {
    let root = TempDir::new().unwrap();
    let mut client =
        GitClient::open(StoreConfig::default().with_snapshot_root(root.path())).unwrap();
    let structure = client.create_structure("schema", None, None).unwrap();
    let sv = client
        .create_structure_version(structure, Attributes::new(), VersionFields::new())
        .unwrap();

    let result = client.create_structure_version(
        structure,
        Attributes::new(),
        VersionFields::new().with_structure_version(sv),
    );
    assert!(matches!(result, Err(StoreError::UnsupportedField { .. })));

    // What was accepted still survives a commit and load.
    client.commit().unwrap();
    let mut restored =
        GitClient::open(StoreConfig::default().with_snapshot_root(root.path())).unwrap();
    assert_eq!(restored.load().unwrap(), 2);
    assert_eq!(
        restored.get_structure_version(sv).unwrap(),
        client.get_structure_version(sv).unwrap()
    );
}
