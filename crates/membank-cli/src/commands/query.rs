use crate::support::{
    fail, print_json, print_nodes_and_edges, print_recovered, read_request_or_exit, store_for,
};
use membank_graph::{GraphQuery, MemoryBankConfig, query};

pub fn run(config: &MemoryBankConfig, project: &str, input: &str, json_output: bool) {
    let mut request: GraphQuery = read_request_or_exit(input);
    if request.limit.is_none() {
        request.limit = Some(config.query_limit);
    }

    let result = query(&store_for(config), project, &request).unwrap_or_else(|e| fail(e));

    if json_output {
        print_json(&result);
    } else {
        println!("membank query\n  Project: {project}");
        print_recovered(result.recovered.as_deref());
        if let Some(seed) = &result.not_found {
            println!("  Not found: {seed}");
        }
        print_nodes_and_edges(&result.nodes, &result.edges);
    }
}
