use crate::support::{
    fail, print_diagnostics, print_json, print_snapshot, read_request_or_exit, store_for,
};
use membank_graph::{BatchDeleteRequest, MemoryBankConfig, batch_delete};

pub fn run(config: &MemoryBankConfig, project: &str, input: &str, json_output: bool) {
    let request: BatchDeleteRequest = read_request_or_exit(input);
    let report =
        batch_delete(&store_for(config), project, &request).unwrap_or_else(|e| fail(e));

    if json_output {
        print_json(&report);
    } else {
        println!(
            "membank delete\n  Project: {project}\n  Nodes deleted: {} (skipped {}, cascaded edges {})\n  Edges deleted: {} (skipped {})",
            report.nodes_deleted,
            report.nodes_skipped,
            report.cascaded_edges,
            report.edges_deleted,
            report.edges_skipped
        );
        print_snapshot(report.snapshot.as_ref());
        print_diagnostics(&report.diagnostics);
    }
}
