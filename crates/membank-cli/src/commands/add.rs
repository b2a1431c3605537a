use crate::support::{
    fail, print_diagnostics, print_json, print_snapshot, read_request_or_exit, store_for,
};
use membank_graph::{BatchAddRequest, MemoryBankConfig, batch_add};

pub fn run(config: &MemoryBankConfig, project: &str, input: &str, json_output: bool) {
    let request: BatchAddRequest = read_request_or_exit(input);
    let report = batch_add(&store_for(config), project, &request).unwrap_or_else(|e| fail(e));

    if json_output {
        print_json(&report);
    } else {
        println!(
            "membank add\n  Project: {project}\n  Nodes added: {} (skipped {})\n  Edges added: {} (skipped {})",
            report.nodes_added, report.nodes_skipped, report.edges_added, report.edges_skipped
        );
        print_snapshot(report.snapshot.as_ref());
        print_diagnostics(&report.diagnostics);
    }
}
