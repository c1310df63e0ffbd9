//! `mainsite resources`: resource links from an A-Z index export.

use std::path::PathBuf;

use clap::Subcommand;
use tracing::info;

use mainsite_recon::normalize::resource::{ResourceLink, CONTENT_TYPE, KEY_FIELD};
use mainsite_recon::{normalize, wxr, Reconciler, RemoteRecord, RunOptions};

use super::{read_source, Context};
use crate::CliError;

#[derive(Subcommand)]
pub enum ResourceCommands {
    /// Create or update one resource link per exported index entry (nothing is removed)
    #[command(after_help = "\
Examples:
  mainsite resources import --wp-export azindex.xml --store store.json")]
    Import {
        /// WordPress export (WXR) of the A-Z index links
        #[arg(long, value_name = "FILE")]
        wp_export: PathBuf,
    },
}

pub fn cmd_resources(ctx: &Context, cmd: ResourceCommands) -> Result<(), CliError> {
    match cmd {
        ResourceCommands::Import { wp_export } => {
            let doc = wxr::parse(&read_source(&wp_export)?)?;
            info!(items = doc.items.len(), "resource export parsed");
            let records: Vec<_> = doc
                .items
                .iter()
                .map(|item| normalize(&RemoteRecord::Resource(ResourceLink::from_item(item)), &[]))
                .collect();

            let (path, mut repo) = ctx.open_store()?;
            let outcome = Reconciler::new(&mut repo, RunOptions::merge(CONTENT_TYPE, KEY_FIELD))
                .and_then(|reconciler| reconciler.run(records));
            let stats = ctx.finish(&path, &repo, outcome)?;
            ctx.report(&stats)
        }
    }
}
