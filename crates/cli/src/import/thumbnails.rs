//! `mainsite thumbnails`: person photos from another site's export.

use std::path::PathBuf;

use clap::Subcommand;
use tracing::info;

use mainsite_config::ConfigError;
use mainsite_recon::thumbnails::{
    absolute_media_url, import_thumbnails, parse_thumbnail_csv, parse_wp_export, MediaRef, ThumbnailSource,
};
use mainsite_recon::RecordError;
use mainsite_source_client::{SourceClient, DEFAULT_TIMEOUT};

use super::{read_source, Context};
use crate::CliError;

#[derive(Subcommand)]
pub enum ThumbnailCommands {
    /// Attach thumbnails to people matched by email
    #[command(after_help = "\
Examples:
  mainsite thumbnails import --wp-export people.xml --store store.json
  mainsite thumbnails import --wp-export people.xml --base-url https://old.example.edu --force
  mainsite thumbnails import --csv photos.csv      # columns: email,rawPhotoUrl")]
    Import {
        /// WordPress export (WXR) of the source site
        #[arg(long, value_name = "FILE", conflicts_with = "csv", required_unless_present = "csv")]
        wp_export: Option<PathBuf>,

        /// CSV with `email` and `rawPhotoUrl` columns
        #[arg(long, value_name = "FILE")]
        csv: Option<PathBuf>,

        /// Source site for attachment lookups (default: [thumbnails] base_url, then the export's own)
        #[arg(long)]
        base_url: Option<String>,

        /// Postmeta key holding the email (default: [thumbnails] meta_key)
        #[arg(long)]
        meta_key: Option<String>,

        /// Replace thumbnails people already have
        #[arg(long)]
        force: bool,
    },
}

pub fn cmd_thumbnails(ctx: &Context, cmd: ThumbnailCommands) -> Result<(), CliError> {
    match cmd {
        ThumbnailCommands::Import { wp_export, csv, base_url, meta_key, force } => {
            let settings = &ctx.settings.thumbnails;
            let (sources, export_base) = match (wp_export, csv) {
                (Some(path), _) => {
                    let meta_key = meta_key.as_deref().unwrap_or(&settings.meta_key);
                    let export = parse_wp_export(&read_source(&path)?, meta_key)?;
                    (export.entries, export.base_url)
                }
                (None, Some(path)) => (parse_thumbnail_csv(&read_source(&path)?)?, None),
                (None, None) => return Err(CliError::usage("no thumbnail source").with_hint("pass --wp-export or --csv")),
            };
            info!(entries = sources.len(), "thumbnail source parsed");

            let base_url = base_url.or_else(|| settings.base_url.clone()).or(export_base);
            let base_url = match base_url {
                Some(url) => url,
                None if needs_lookup(&sources) => {
                    return Err(ConfigError::Missing {
                        name: "source site URL".into(),
                        flag: "--base-url".into(),
                        env: None,
                    }
                    .into())
                }
                None => String::new(),
            };
            let client = SourceClient::new(DEFAULT_TIMEOUT)?;

            let (path, mut repo) = ctx.open_store()?;
            let outcome = import_thumbnails(&mut repo, &sources, force, |media| resolve(&client, &base_url, media));
            let stats = ctx.finish(&path, &repo, outcome)?;
            ctx.report(&stats)
        }
    }
}

fn needs_lookup(sources: &[ThumbnailSource]) -> bool {
    sources.iter().any(|s| matches!(s.media, Some(MediaRef::Attachment(_))))
}

/// Image URL for a media reference; attachments go through the source site's media API.
fn resolve(client: &SourceClient, base_url: &str, media: &MediaRef) -> Result<Option<String>, RecordError> {
    match media {
        MediaRef::Url(url) => Ok(Some(url.clone())),
        MediaRef::Attachment(id) => {
            let source = client.media_source_url(base_url, id).map_err(|err| RecordError::SubFetch {
                key: id.clone(),
                resource: "media".to_string(),
                message: err.to_string(),
            })?;
            Ok(Some(absolute_media_url(base_url, &source)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    #[test]
    fn attachments_resolve_against_the_source_site() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/wp-json/wp/v2/media/7");
            then.status(200).json_body(json!({"source_url": "/wp-content/uploads/ada.jpg"}));
        });
        let client = SourceClient::new(DEFAULT_TIMEOUT).unwrap();
        let base = server.base_url();

        let url = resolve(&client, &base, &MediaRef::Attachment("7".into())).unwrap();
        assert_eq!(url, Some(format!("{base}/wp-content/uploads/ada.jpg")));

        let direct = resolve(&client, &base, &MediaRef::Url("https://cdn.example.edu/a.jpg".into())).unwrap();
        assert_eq!(direct.as_deref(), Some("https://cdn.example.edu/a.jpg"));
    }

    #[test]
    fn failed_lookup_is_a_record_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/wp-json/wp/v2/media/8");
            then.status(404);
        });
        let client = SourceClient::new(DEFAULT_TIMEOUT).unwrap();
        let err = resolve(&client, &server.base_url(), &MediaRef::Attachment("8".into())).unwrap_err();
        assert!(matches!(err, RecordError::SubFetch { ref resource, .. } if resource == "media"));
    }

    #[test]
    fn only_attachments_need_a_site() {
        let url = ThumbnailSource { email: Some("a@example.edu".into()), media: Some(MediaRef::Url("https://x/a.jpg".into())) };
        let attachment = ThumbnailSource { email: None, media: Some(MediaRef::Attachment("1".into())) };
        assert!(!needs_lookup(&[url.clone()]));
        assert!(needs_lookup(&[url, attachment]));
    }
}
