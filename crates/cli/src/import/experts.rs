//! `mainsite experts`: media experts from a spreadsheet export.

use clap::Subcommand;
use tracing::info;

use mainsite_config::required;
use mainsite_recon::normalize::expert::{ExpertRow, CONTENT_TYPE, KEY_FIELD};
use mainsite_recon::{normalize, Reconciler, RecordError, RemoteRecord, RunOptions};

use super::Context;
use crate::CliError;

#[derive(Subcommand)]
pub enum ExpertCommands {
    /// Create and update expert records from the CSV export (nothing is removed)
    #[command(after_help = "\
Examples:
  mainsite experts import --csv-url 'https://docs.example.edu/experts/export?format=csv' --store store.json
  mainsite experts import --force-template")]
    Import {
        /// CSV export URL (default: [experts] csv_url)
        #[arg(long)]
        csv_url: Option<String>,

        /// Write the page template on existing records too
        #[arg(long)]
        force_template: bool,
    },
}

pub fn cmd_experts(ctx: &Context, cmd: ExpertCommands) -> Result<(), CliError> {
    match cmd {
        ExpertCommands::Import { csv_url, force_template } => {
            let settings = &ctx.settings.experts;
            let url = required(csv_url.as_deref().or(settings.csv_url.as_deref()), "experts CSV URL", "--csv-url", None)?;
            let client = ctx.client(settings.timeout_secs)?;

            info!(url = %url, "fetching experts");
            let rows = client.fetch_csv::<ExpertRow>(&url)?;
            info!(rows = rows.len(), "experts fetched");
            let records: Vec<_> = rows
                .into_iter()
                .map(|row| {
                    let row = row.map_err(|e| RecordError::Invalid(e.to_string()))?;
                    normalize(&RemoteRecord::Expert(row), &[])
                })
                .collect();

            let mut options = RunOptions::merge(CONTENT_TYPE, KEY_FIELD);
            options.force_initial_fields = force_template;

            let (path, mut repo) = ctx.open_store()?;
            let outcome = Reconciler::new(&mut repo, options).and_then(|reconciler| reconciler.run(records));
            let stats = ctx.finish(&path, &repo, outcome)?;
            ctx.report(&stats)
        }
    }
}
