use crate::cli::ProjectCommands;
use crate::support::{fail, print_json, store_for};
use membank_graph::{MemoryBankConfig, create_project, list_projects};
use serde_json::json;

pub fn run(config: &MemoryBankConfig, command: ProjectCommands) {
    match command {
        ProjectCommands::Create { name, json } => run_create(config, &name, json),
        ProjectCommands::List { json } => run_list(config, json),
    }
}

fn run_create(config: &MemoryBankConfig, name: &str, json_output: bool) {
    let created = create_project(&store_for(config), name).unwrap_or_else(|e| fail(e));

    if json_output {
        print_json(&created);
    } else {
        println!(
            "membank project create\n  Created: {}\n  Path: {}",
            created.name,
            created.path.display()
        );
    }
}

fn run_list(config: &MemoryBankConfig, json_output: bool) {
    let projects = list_projects(&config.base_path).unwrap_or_else(|e| fail(e));

    if json_output {
        print_json(&json!({
            "basePath": config.base_path.display().to_string(),
            "projects": projects,
        }));
    } else {
        println!("membank project list\n  Base: {}", config.base_path.display());
        if projects.is_empty() {
            println!("  (no projects)");
        }
        for name in &projects {
            println!("  - {name}");
        }
    }
}
