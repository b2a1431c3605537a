use crate::support::{fail, print_json, yes_no};
use membank_graph::{MemoryBankConfig, init_memory_bank};

pub fn run(config: &MemoryBankConfig, json_output: bool) {
    let report = init_memory_bank(&config.base_path).unwrap_or_else(|e| fail(e));

    if json_output {
        print_json(&report);
    } else {
        println!(
            "membank init\n  Base: {}\n  Already existed: {}",
            report.base_path.display(),
            yes_no(report.already_existed)
        );
    }
}
