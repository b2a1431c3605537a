//! Membank CLI: the `membank` command.

mod cli;
mod commands;
mod support;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    support::init_logging(cli.global.debug);
    let config = support::load_config_or_exit(&cli.global);
    tracing::debug!(
        base = %config.base_path.display(),
        search_limit = config.search_limit,
        query_limit = config.query_limit,
        "configuration resolved"
    );

    match cli.command {
        Commands::Init { json } => commands::init::run(&config, json),

        Commands::Project { command } => commands::project::run(&config, command),

        Commands::Add {
            project,
            input,
            json,
        } => commands::add::run(&config, &project, &input, json),

        Commands::Update {
            project,
            input,
            json,
        } => commands::update::run(&config, &project, &input, json),

        Commands::Delete {
            project,
            input,
            json,
        } => commands::delete::run(&config, &project, &input, json),

        Commands::Query {
            project,
            input,
            json,
        } => commands::query::run(&config, &project, &input, json),

        Commands::Search {
            project,
            query,
            fields,
            case_sensitive,
            limit,
            json,
        } => commands::search::run(
            &config,
            commands::search::Args {
                project,
                query,
                fields,
                case_sensitive,
                limit,
                json,
            },
        ),

        Commands::Open {
            project,
            ids,
            no_relations,
            json,
        } => commands::open::run(&config, &project, ids, no_relations, json),
    }
}
