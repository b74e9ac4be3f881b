//! Behavior of the versioning engine through the client façade.

use ground_store::prelude::*;
use std::collections::BTreeSet;
use std::thread;
use tempfile::TempDir;

fn client(root: &TempDir) -> GitClient {
    GitClient::open(StoreConfig::default().with_snapshot_root(root.path())).unwrap()
}

fn parents(ids: &[Id]) -> VersionFields {
    VersionFields::new().with_parents(ids.to_vec())
}

fn version_ids(versions: &[NodeVersion]) -> BTreeSet<Id> {
    versions.iter().map(|v| v.node_version_id).collect()
}

/// Node "testSourceKey" with V1 (root), V2 (V1), V3 (V1, V2), V4 (V2), V5 (V3) and V6 with
/// the given parents. Returns the node id and [V1..V6].
fn six_version_dag(client: &mut GitClient, v6_parents: &[usize]) -> (Id, Vec<Id>) {
    let node = client.create_node("testSourceKey", None, None).unwrap();
    let mut ids: Vec<Id> = Vec::new();
    let shape: [&[usize]; 5] = [&[], &[0], &[0, 1], &[1], &[2]];
    for parent_positions in shape.iter().copied().chain([v6_parents]) {
        let parent_ids: Vec<Id> = parent_positions.iter().map(|p| ids[*p]).collect();
        ids.push(
            client
                .create_node_version(node, parents(&parent_ids))
                .unwrap(),
        );
    }
    (node, ids)
}

#[test]
fn test_idempotent_create() {
    let root = TempDir::new().unwrap();
    let mut client = client(&root);

    let first = client.create_node("k", Some("first"), None).unwrap();
    let second = client.create_node("k", Some("second"), None).unwrap();

    assert_eq!(first, second);
    assert_eq!(client.store().table::<Node>().item_count(), 1);
    assert_eq!(client.get_node("k").unwrap().name.as_deref(), Some("first"));
}

#[test]
fn test_ids_are_unique_across_kinds() {
    let root = TempDir::new().unwrap();
    let mut client = client(&root);

    let node = client.create_node("n", None, None).unwrap();
    let nv = client.create_node_version(node, VersionFields::new()).unwrap();
    let edge = client.create_edge("e", node, node, None, None).unwrap();
    let ev = client
        .create_edge_version(edge, EdgeEndpoints::starting_at(nv, nv), VersionFields::new())
        .unwrap();
    let graph = client.create_graph("g", None, None).unwrap();
    let gv = client
        .create_graph_version(graph, vec![ev], VersionFields::new())
        .unwrap();
    let structure = client.create_structure("s", None, None).unwrap();
    let sv = client
        .create_structure_version(structure, Attributes::new(), VersionFields::new())
        .unwrap();
    let lineage_edge = client.create_lineage_edge("l", None, None).unwrap();
    let lv = client
        .create_lineage_edge_version(lineage_edge, nv, gv, VersionFields::new())
        .unwrap();
    let lineage_graph = client.create_lineage_graph("lg", None, None).unwrap();
    let lgv = client
        .create_lineage_graph_version(lineage_graph, vec![lv], VersionFields::new())
        .unwrap();

    let ids = vec![
        node,
        nv,
        edge,
        ev,
        graph,
        gv,
        structure,
        sv,
        lineage_edge,
        lv,
        lineage_graph,
        lgv,
    ];
    assert_eq!(ids, (0..12).collect::<Vec<Id>>());

    let classes: Vec<&str> = client.store().records().map(|r| r.class()).collect();
    assert_eq!(classes, Record::CLASSES.to_vec());
}

#[test]
fn test_head_set() {
    let root = TempDir::new().unwrap();
    let mut client = client(&root);
    let (_, v) = six_version_dag(&mut client, &[1, 2]);

    let latest = client.get_node_latest_versions("testSourceKey").unwrap();

    assert_eq!(version_ids(&latest), [v[3], v[4], v[5]].into_iter().collect());
}

#[test]
fn test_history_keeps_last_child_per_parent() {
    let root = TempDir::new().unwrap();
    let mut client = client(&root);
    let (node, v) = six_version_dag(&mut client, &[2]);

    let history = client.get_node_history("testSourceKey").unwrap();

    let expected: History = [(node, v[0]), (v[0], v[2]), (v[2], v[5]), (v[1], v[3])]
        .into_iter()
        .collect();
    assert_eq!(history, expected);
}

#[test]
fn test_history_when_a_merge_is_visited_last() {
    let root = TempDir::new().unwrap();
    let mut client = client(&root);
    let (node, v) = six_version_dag(&mut client, &[1, 2]);

    let history = client.get_node_history("testSourceKey").unwrap();

    // V6 names V2 as a parent after V4 did, so V2 maps to V6.
    let expected: History = [(node, v[0]), (v[0], v[2]), (v[1], v[5]), (v[2], v[5])]
        .into_iter()
        .collect();
    assert_eq!(history, expected);
}

#[test]
fn test_node_version_adjacent_lineage() {
    let root = TempDir::new().unwrap();
    let mut client = client(&root);

    let node = client.create_node("testSourceKey", None, None).unwrap();
    let nv: Vec<Id> = (0..6)
        .map(|_| {
            client
                .create_node_version(node, VersionFields::new())
                .unwrap()
        })
        .collect();
    assert_eq!(nv, vec![1, 2, 3, 4, 5, 6]);

    let lineage_edge = client.create_lineage_edge("derived", None, None).unwrap();
    // (to, from, parent positions)
    let edges: [(Id, Id, &[usize]); 6] = [
        (5, 3, &[]),
        (3, 2, &[0]),
        (4, 1, &[0, 1]),
        (5, 2, &[1]),
        (6, 4, &[2]),
        (6, 1, &[2]),
    ];
    let mut lev: Vec<Id> = Vec::new();
    for (to, from, parent_positions) in edges {
        let parent_ids: Vec<Id> = parent_positions.iter().map(|p| lev[*p]).collect();
        lev.push(
            client
                .create_lineage_edge_version(lineage_edge, from, to, parents(&parent_ids))
                .unwrap(),
        );
    }
    assert_eq!(lev, vec![8, 9, 10, 11, 12, 13]);

    let adjacent = |id: Id| -> Vec<Id> {
        client
            .get_node_version_adjacent_lineage(id)
            .unwrap()
            .iter()
            .map(|l| l.lineage_edge_version_id)
            .collect()
    };
    assert_eq!(adjacent(1), vec![10, 13]);
    assert_eq!(adjacent(2), vec![9, 11]);
    assert_eq!(adjacent(3), vec![8, 9]);
    assert_eq!(adjacent(4), vec![10, 12]);
    assert_eq!(adjacent(5), vec![8, 11]);
    assert_eq!(adjacent(6), vec![12, 13]);

    // Each result matches a full scan of the lineage edge versions.
    for id in 1..=6 {
        let scanned: Vec<Id> = client
            .store()
            .table::<LineageEdge>()
            .versions()
            .filter(|l| l.touches(id))
            .map(|l| l.lineage_edge_version_id)
            .collect();
        assert_eq!(adjacent(id), scanned);
    }

    assert!(matches!(
        client.get_node_version_adjacent_lineage(lev[0]),
        Err(StoreError::NotFound(_))
    ));
}

#[test]
fn test_lineage_between_kinds() {
    let root = TempDir::new().unwrap();
    let mut client = client(&root);

    let structure = client.create_structure("schema", None, None).unwrap();
    let sv = client
        .create_structure_version(structure, Attributes::new(), VersionFields::new())
        .unwrap();
    let graph = client.create_graph("pipeline", None, None).unwrap();
    let gv = client
        .create_graph_version(graph, Vec::new(), VersionFields::new())
        .unwrap();
    let lineage_edge = client.create_lineage_edge("uses", None, None).unwrap();
    let lv = client
        .create_lineage_edge_version(lineage_edge, sv, gv, VersionFields::new())
        .unwrap();

    let from_structure = client.get_adjacent_lineage(sv).unwrap();
    assert_eq!(from_structure.len(), 1);
    assert_eq!(from_structure[0].lineage_edge_version_id, lv);
    assert_eq!(client.get_adjacent_lineage(gv).unwrap(), from_structure);
}

#[test]
fn test_edge_versions_keep_endpoints() {
    let root = TempDir::new().unwrap();
    let mut client = client(&root);

    let from = client.create_node("from", None, None).unwrap();
    let to = client.create_node("to", None, None).unwrap();
    let edge = client.create_edge("edge", from, to, Some("feeds"), None).unwrap();
    let endpoints = EdgeEndpoints::starting_at(from, to);
    let ev = client
        .create_edge_version(edge, endpoints, VersionFields::new())
        .unwrap();

    let version = client.get_edge_version(ev).unwrap();
    assert_eq!(version.endpoints, endpoints);
    assert_eq!(version.edge_id, edge);
    assert_eq!(client.get_edge("edge").unwrap().from_node_id, from);
    assert_eq!(client.get_edge_latest_versions("edge").unwrap(), vec![version]);
}

#[test]
fn test_failures_are_typed() {
    let root = TempDir::new().unwrap();
    let mut client = client(&root);
    let node = client.create_node("n", None, None).unwrap();
    let graph = client.create_graph("g", None, None).unwrap();
    let gv = client
        .create_graph_version(graph, Vec::new(), VersionFields::new())
        .unwrap();

    assert!(matches!(
        client.create_structure_version(99, Attributes::new(), VersionFields::new()),
        Err(StoreError::UnknownItem {
            kind: Kind::Structure,
            id: 99
        })
    ));
    assert!(matches!(
        client.create_node_version(node, parents(&[gv])),
        Err(StoreError::MalformedParent {
            kind: Kind::Node,
            ..
        })
    ));
    assert!(matches!(
        client.get_graph("missing"),
        Err(StoreError::NotFound(_))
    ));
    assert!(matches!(
        client.get_node_version(gv),
        Err(StoreError::NotFound(_))
    ));
    assert!(matches!(
        client.get_node_latest_versions("n"),
        Err(StoreError::NotFound(_))
    ));
}

#[test]
fn test_shared_store_across_threads() {
    let store = GraphStore::new().into_shared();

    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let store = store.clone();
            thread::spawn(move || {
                let key = format!("worker-{}", worker);
                for _ in 0..25 {
                    let mut guard = store.write().unwrap();
                    let node = guard.create_item(&key, |id| Node::new(id, key.as_str()));
                    guard
                        .create_version::<Node>(node, VersionFields::new(), NodeVersion::new)
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let guard = store.read().unwrap();
    assert_eq!(guard.len(), 4 + 4 * 25);
    assert_eq!(guard.ids().next_id(), 104);
    for worker in 0..4 {
        let latest = guard
            .latest_versions::<Node>(&format!("worker-{}", worker))
            .unwrap();
        assert_eq!(latest.len(), 25);
    }
}
