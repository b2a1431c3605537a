use crate::support::{
    fail, print_diagnostics, print_json, print_snapshot, read_request_or_exit, store_for,
};
use membank_graph::{BatchUpdateRequest, MemoryBankConfig, batch_update};

pub fn run(config: &MemoryBankConfig, project: &str, input: &str, json_output: bool) {
    let request: BatchUpdateRequest = read_request_or_exit(input);
    let report =
        batch_update(&store_for(config), project, &request).unwrap_or_else(|e| fail(e));

    if json_output {
        print_json(&report);
    } else {
        println!(
            "membank update\n  Project: {project}\n  Nodes updated: {} (skipped {})",
            report.nodes_updated, report.nodes_skipped
        );
        print_snapshot(report.snapshot.as_ref());
        print_diagnostics(&report.diagnostics);
    }
}
