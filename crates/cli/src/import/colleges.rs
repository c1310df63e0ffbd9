//! `mainsite colleges`: link college terms to their search-service ids.

use clap::Subcommand;
use tracing::info;

use mainsite_config::{required, SEARCH_URL_ENV};
use mainsite_recon::taxonomy::sync_college_ids;
use mainsite_recon::RecordError;

use super::Context;
use crate::CliError;

#[derive(Subcommand)]
pub enum CollegeCommands {
    /// Look up every college term in the search service and store its id
    #[command(after_help = "\
Examples:
  mainsite colleges import --search-url https://search.example.edu/api/v1/ --store store.json")]
    Import {
        /// Search service base URL (default: $MAINSITE_SEARCH_URL, then [search] base_url)
        #[arg(long)]
        search_url: Option<String>,
    },
}

pub fn cmd_colleges(ctx: &Context, cmd: CollegeCommands) -> Result<(), CliError> {
    match cmd {
        CollegeCommands::Import { search_url } => {
            let settings = &ctx.settings.search;
            let search_url = required(
                search_url.as_deref().or(settings.base_url.as_deref()),
                "search service URL",
                "--search-url",
                Some(SEARCH_URL_ENV),
            )?;
            let client = ctx.client(settings.timeout_secs)?;

            // One lookup per term; a failed lookup fails that term only.
            let (path, mut repo) = ctx.open_store()?;
            info!(url = %search_url, "looking up colleges");
            let outcome = sync_college_ids(&mut repo, |lookup| {
                client
                    .first_result_id(&search_url, &[("in", "organizations"), ("search", lookup.search_value.as_str())])
                    .map_err(|err| RecordError::SubFetch {
                        key: lookup.name.clone(),
                        resource: "organizations".to_string(),
                        message: err.to_string(),
                    })
            });
            let stats = ctx.finish(&path, &repo, outcome)?;
            ctx.report(&stats)
        }
    }
}
