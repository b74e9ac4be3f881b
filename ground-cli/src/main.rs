mod args;

use args::{into_map, parse_id_pair, parse_pair, parse_tag};
use clap::{Args, Parser, Subcommand};
use ground_store::prelude::*;
use serde::Serialize;
use serde_json::{json, Value};
use std::error::Error;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "groundctl")]
#[command(about = "Inspect and extend a git-backed ground provenance store")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// Snapshot root, overriding the configuration
    #[arg(short, long, global = true)]
    root: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an item, or print the id of the existing one with that source key
    CreateItem(ItemArgs),
    /// Create a version of an existing item
    CreateVersion(VersionArgs),
    /// Print the item or version with the given id
    Show { id: Id },
    /// Print the versions of a source key that no other version names as a parent
    Latest { kind: Kind, source_key: String },
    /// Print the parent to child map of a source key's versions
    History { kind: Kind, source_key: String },
    /// Print the lineage edge versions that start or end at a version
    Lineage { version_id: Id },
    /// List snapshot directories
    Snapshots,
    /// Print the manifest of a snapshot (the latest by default)
    Manifest { slot: Option<u64> },
}

#[derive(Args)]
struct ItemArgs {
    kind: Kind,
    source_key: String,
    #[arg(long)]
    name: Option<String>,
    /// Tag as KEY=VALUE (repeatable)
    #[arg(long = "tag", value_parser = parse_tag)]
    tags: Vec<(String, Value)>,
    /// Edges only: id of the source node
    #[arg(long)]
    from_node: Option<Id>,
    /// Edges only: id of the target node
    #[arg(long)]
    to_node: Option<Id>,
}

#[derive(Args)]
struct VersionArgs {
    kind: Kind,
    /// Id of the item to version
    item_id: Id,
    #[arg(long)]
    reference: Option<String>,
    /// Reference parameter as KEY=VALUE (repeatable)
    #[arg(long = "reference-parameter", value_parser = parse_pair)]
    reference_parameters: Vec<(String, String)>,
    /// Tag as KEY=VALUE (repeatable)
    #[arg(long = "tag", value_parser = parse_tag)]
    tags: Vec<(String, Value)>,
    /// Structure version describing the schema (not for structure versions)
    #[arg(long)]
    structure_version: Option<Id>,
    /// Parent version id (repeatable)
    #[arg(long = "parent")]
    parents: Vec<Id>,
    /// Edge versions: FROM,TO node version ids the edge is valid from
    #[arg(long, value_parser = parse_id_pair)]
    start: Option<(Id, Id)>,
    /// Edge versions: FROM,TO node version ids the edge is valid until
    #[arg(long, value_parser = parse_id_pair)]
    end: Option<(Id, Id)>,
    /// Graph and lineage graph versions: member version id (repeatable)
    #[arg(long = "member")]
    members: Vec<Id>,
    /// Lineage edge versions: version the lineage starts at
    #[arg(long)]
    from_rich: Option<Id>,
    /// Lineage edge versions: version the lineage ends at
    #[arg(long)]
    to_rich: Option<Id>,
    /// Structure versions: attribute as KEY=VALUE (repeatable)
    #[arg(long = "attribute", value_parser = parse_tag)]
    attributes: Vec<(String, Value)>,
}

#[derive(Serialize)]
struct Created {
    id: Id,
    commit: CommitReport,
}

/// Call a function generic over the item type picked by a [`Kind`]
macro_rules! for_kind {
    ($kind:expr, $f:ident($($arg:expr),*)) => {
        match $kind {
            Kind::Node => $f::<Node>($($arg),*),
            Kind::Edge => $f::<Edge>($($arg),*),
            Kind::Graph => $f::<Graph>($($arg),*),
            Kind::Structure => $f::<Structure>($($arg),*),
            Kind::LineageEdge => $f::<LineageEdge>($($arg),*),
            Kind::LineageGraph => $f::<LineageGraph>($($arg),*),
        }
    };
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref(), cli.root)?;
    let mut client = GitClient::open(config)?;

    match cli.command {
        Commands::Snapshots => list_snapshots(&client)?,
        Commands::Manifest { slot } => show_manifest(&client, slot)?,
        Commands::CreateItem(args) => {
            restore(&mut client)?;
            let id = create_item(&mut client, args)?;
            commit(&mut client, id)?;
        }
        Commands::CreateVersion(args) => {
            restore(&mut client)?;
            let id = create_version(&mut client, args)?;
            commit(&mut client, id)?;
        }
        Commands::Show { id } => {
            restore(&mut client)?;
            let record = client
                .store()
                .record(id)
                .ok_or_else(|| StoreError::NotFound(format!("id {}", id)))?;
            print_json(&record)?;
        }
        Commands::Latest { kind, source_key } => {
            restore(&mut client)?;
            print_json(&for_kind!(kind, latest(client.store(), &source_key))?)?;
        }
        Commands::History { kind, source_key } => {
            restore(&mut client)?;
            print_json(&for_kind!(kind, history(client.store(), &source_key))?)?;
        }
        Commands::Lineage { version_id } => {
            restore(&mut client)?;
            print_json(&client.get_adjacent_lineage(version_id)?)?;
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>, root: Option<PathBuf>) -> StoreResult<StoreConfig> {
    let config = match path {
        Some(path) => StoreConfig::from_file(path)?,
        None => StoreConfig::default(),
    };
    Ok(match root {
        Some(root) => config.with_snapshot_root(root),
        None => config,
    })
}

/// Load the latest snapshot; an empty root starts an empty graph
fn restore(client: &mut GitClient) -> StoreResult<()> {
    match client.load() {
        Ok(count) => {
            info!("Restored {} records", count);
            Ok(())
        }
        Err(StoreError::Persistence(PersistenceError::NoSnapshots(root))) => {
            info!("No snapshots under {}, starting empty", root.display());
            Ok(())
        }
        Err(e) => Err(e),
    }
}

fn commit(client: &mut GitClient, id: Id) -> Result<(), Box<dyn Error>> {
    let report = client.commit()?;
    print_json(&Created { id, commit: report })
}

fn create_item(client: &mut GitClient, args: ItemArgs) -> Result<Id, Box<dyn Error>> {
    let key = args.source_key.as_str();
    let name = args.name.as_deref();
    let tags = into_map(args.tags);

    let id = match args.kind {
        Kind::Node => client.create_node(key, name, tags)?,
        Kind::Edge => {
            let (from, to) = args
                .from_node
                .zip(args.to_node)
                .ok_or("edges need --from-node and --to-node")?;
            client.create_edge(key, from, to, name, tags)?
        }
        Kind::Graph => client.create_graph(key, name, tags)?,
        Kind::Structure => client.create_structure(key, name, tags)?,
        Kind::LineageEdge => client.create_lineage_edge(key, name, tags)?,
        Kind::LineageGraph => client.create_lineage_graph(key, name, tags)?,
    };
    Ok(id)
}

fn version_fields(args: &mut VersionArgs) -> VersionFields {
    let mut fields = VersionFields::new();
    if let Some(reference) = args.reference.take() {
        fields = fields.with_reference(reference);
    }
    if let Some(parameters) = into_map(std::mem::take(&mut args.reference_parameters)) {
        fields = fields.with_reference_parameters(parameters);
    }
    if let Some(tags) = into_map(std::mem::take(&mut args.tags)) {
        fields = fields.with_tags(tags);
    }
    if let Some(structure_version) = args.structure_version {
        fields = fields.with_structure_version(structure_version);
    }
    if !args.parents.is_empty() {
        fields = fields.with_parents(std::mem::take(&mut args.parents));
    }
    fields
}

fn create_version(client: &mut GitClient, mut args: VersionArgs) -> Result<Id, Box<dyn Error>> {
    let fields = version_fields(&mut args);
    let item_id = args.item_id;

    let id = match args.kind {
        Kind::Node => client.create_node_version(item_id, fields)?,
        Kind::Edge => {
            let (from, to) = args.start.ok_or("edge versions need --start FROM,TO")?;
            let mut endpoints = EdgeEndpoints::starting_at(from, to);
            if let Some((from, to)) = args.end {
                endpoints = endpoints.ending_at(from, to);
            }
            client.create_edge_version(item_id, endpoints, fields)?
        }
        Kind::Graph => client.create_graph_version(item_id, args.members, fields)?,
        Kind::Structure => {
            let attributes = into_map(args.attributes).unwrap_or_default();
            client.create_structure_version(item_id, attributes, fields)?
        }
        Kind::LineageEdge => {
            let from = args.from_rich.ok_or("lineage edge versions need --from-rich")?;
            let to = args.to_rich.ok_or("lineage edge versions need --to-rich")?;
            client.create_lineage_edge_version(item_id, from, to, fields)?
        }
        Kind::LineageGraph => client.create_lineage_graph_version(item_id, args.members, fields)?,
    };
    Ok(id)
}

fn latest<I: Stored>(store: &GraphStore, source_key: &str) -> StoreResult<Vec<Record>> {
    Ok(store
        .latest_versions::<I>(source_key)?
        .into_iter()
        .map(|version| version.clone().into())
        .collect())
}

fn history<I: Stored>(store: &GraphStore, source_key: &str) -> StoreResult<History> {
    store.history::<I>(source_key)
}

fn list_snapshots(client: &GitClient) -> Result<(), Box<dyn Error>> {
    let layout = client.layout();
    let slots: Vec<Value> = layout
        .slots()?
        .into_iter()
        .map(|slot| {
            json!({
                "slot": slot,
                "directory": layout.slot_dir(slot),
                "manifestEntries": client.read_manifest(slot).ok().map(|m| m.len()),
            })
        })
        .collect();
    print_json(&slots)
}

fn show_manifest(client: &GitClient, slot: Option<u64>) -> Result<(), Box<dyn Error>> {
    let slot = match slot {
        Some(slot) => slot,
        None => client
            .layout()
            .latest_slot()?
            .ok_or_else(|| PersistenceError::NoSnapshots(client.layout().root().to_path_buf()))?,
    };
    let manifest = client.read_manifest(slot)?;
    let entries: serde_json::Map<String, Value> = manifest
        .iter()
        .map(|(path, commit)| (path.to_string(), Value::String(commit.to_string())))
        .collect();
    print_json(&json!({ "slot": slot, "entries": entries }))
}

fn print_json(value: &impl Serialize) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
