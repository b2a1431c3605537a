use crate::support::{fail, print_json, print_nodes_and_edges, print_recovered, store_for};
use membank_graph::{MemoryBankConfig, OpenNodesRequest, open_nodes};

pub fn run(
    config: &MemoryBankConfig,
    project: &str,
    ids: Vec<String>,
    no_relations: bool,
    json_output: bool,
) {
    let request = OpenNodesRequest {
        node_ids: ids,
        include_relations: !no_relations,
    };
    let result = open_nodes(&store_for(config), project, &request).unwrap_or_else(|e| fail(e));

    if json_output {
        print_json(&result);
    } else {
        println!("membank open\n  Project: {project}");
        print_recovered(result.recovered.as_deref());
        print_nodes_and_edges(&result.nodes, &result.edges);
        if !result.missing.is_empty() {
            println!("  Missing: {}", result.missing.join(", "));
        }
    }
}
