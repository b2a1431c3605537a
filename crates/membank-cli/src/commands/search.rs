use crate::cli::SearchFieldArg;
use crate::support::{fail, print_json, print_nodes_and_edges, print_recovered, store_for};
use membank_graph::{MemoryBankConfig, SearchField, SearchRequest, search};

pub struct Args {
    pub project: String,
    pub query: String,
    pub fields: Vec<SearchFieldArg>,
    pub case_sensitive: bool,
    pub limit: Option<usize>,
    pub json: bool,
}

pub fn run(config: &MemoryBankConfig, args: Args) {
    let mut request = SearchRequest::new(args.query);
    if !args.fields.is_empty() {
        request.search_in = args.fields.into_iter().map(map_field).collect();
    }
    request.case_sensitive = args.case_sensitive;
    request.limit = args.limit.unwrap_or(config.search_limit);

    let result =
        search(&store_for(config), &args.project, &request).unwrap_or_else(|e| fail(e));

    if args.json {
        print_json(&result);
    } else {
        println!(
            "membank search\n  Project: {}\n  Query: {:?}",
            args.project, request.query
        );
        print_recovered(result.recovered.as_deref());
        print_nodes_and_edges(&result.nodes, &result.edges);
    }
}

fn map_field(field: SearchFieldArg) -> SearchField {
    match field {
        SearchFieldArg::Id => SearchField::Id,
        SearchFieldArg::Type => SearchField::Type,
        SearchFieldArg::Label => SearchField::Label,
        SearchFieldArg::Data => SearchField::Data,
    }
}
