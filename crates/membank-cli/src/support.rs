use crate::cli::GlobalArgs;
use membank_graph::{Diagnostic, Edge, GraphStore, MemoryBankConfig, NodeView, SnapshotMetadata};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt::Display;
use std::fs;
use std::io::{self, Read};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Install the stderr log subscriber. `RUST_LOG` wins over `--debug`.
pub fn init_logging(debug: bool) {
    let level = if debug { "debug" } else { "warn" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

pub fn fail(message: impl Display) -> ! {
    eprintln!("error: {message}");
    std::process::exit(1);
}

pub fn load_config_or_exit(global: &GlobalArgs) -> MemoryBankConfig {
    MemoryBankConfig::resolve(global.config.as_deref(), global.path.clone())
        .unwrap_or_else(|e| fail(e))
}

pub fn store_for(config: &MemoryBankConfig) -> GraphStore {
    GraphStore::new(&config.base_path)
}

/// Parse a JSON request from a file path, or from stdin when `input` is `-`.
pub fn read_request_or_exit<T: DeserializeOwned>(input: &str) -> T {
    let text = if input == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .unwrap_or_else(|e| fail(format!("failed to read request from stdin: {e}")));
        buf
    } else {
        fs::read_to_string(input)
            .unwrap_or_else(|e| fail(format!("failed to read request {input}: {e}")))
    };
    serde_json::from_str(&text).unwrap_or_else(|e| fail(format!("invalid request json: {e}")))
}

pub fn print_json(payload: &impl Serialize) {
    let text = serde_json::to_string_pretty(payload)
        .unwrap_or_else(|e| fail(format!("json serialization: {e}")));
    println!("{text}");
}

pub fn print_snapshot(snapshot: Option<&SnapshotMetadata>) {
    if let Some(meta) = snapshot {
        println!(
            "  Saved: version {} ({} nodes, {} edges)",
            meta.version, meta.node_count, meta.edge_count
        );
    }
}

pub fn print_diagnostics(diagnostics: &[Diagnostic]) {
    if diagnostics.is_empty() {
        return;
    }
    println!("  Diagnostics ({}):", diagnostics.len());
    for diagnostic in diagnostics {
        println!("    - [{:?}] {}", diagnostic.kind, diagnostic.message);
    }
}

/// Shown when a read fell back to an empty graph.
pub fn print_recovered(reason: Option<&str>) {
    if let Some(reason) = reason {
        println!("  Recovered: stored graph unreadable ({reason}); showing an empty graph");
    }
}

pub fn print_nodes_and_edges(nodes: &[NodeView], edges: &[Edge]) {
    println!("  Nodes ({}):", nodes.len());
    for view in nodes {
        println!(
            "    - {} [{}] {}",
            view.id, view.attributes.node_type, view.attributes.label
        );
    }
    println!("  Edges ({}):", edges.len());
    for edge in edges {
        println!(
            "    - {} -[{}]-> {}",
            edge.source,
            edge.relationship_type(),
            edge.target
        );
    }
}

pub fn yes_no(ok: bool) -> &'static str {
    if ok { "yes" } else { "no" }
}
