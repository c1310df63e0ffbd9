//! Person thumbnails from another site's export.
//!
//! Two source formats: a WordPress export (WXR) whose items reference
//! attachments by id, and a CSV with direct photo URLs. Entries are
//! matched to local `person` records by email.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{RecordError, SourceError, SyncError};
use crate::model::LocalId;
use crate::store::{ContentRepository, Criteria, FieldFilter};
use crate::wxr;

pub const PERSON_TYPE: &str = "person";
pub const EMAIL_FIELD: &str = "person_email";
pub const DEFAULT_META_KEY: &str = "person_email";
const THUMBNAIL_META_KEY: &str = "_thumbnail_id";

/// Where a thumbnail comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaRef {
    /// Attachment id on the exporting site, resolved through its media API.
    Attachment(String),
    /// Direct image URL.
    Url(String),
}

/// One published person from the source, possibly incomplete.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThumbnailSource {
    pub email: Option<String>,
    pub media: Option<MediaRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WpExport {
    /// `wp:base_blog_url` of the exporting site.
    pub base_url: Option<String>,
    /// Published items only.
    pub entries: Vec<ThumbnailSource>,
}

/// Parse a WordPress export, keeping items whose `wp:status` is `publish`.
/// The email is read from the postmeta named `meta_key`.
pub fn parse_wp_export(xml: &str, meta_key: &str) -> Result<WpExport, SourceError> {
    let doc = wxr::parse(xml)?;
    let entries = doc
        .items
        .iter()
        .filter(|item| item.is_published())
        .map(|item| ThumbnailSource {
            email: item.meta(meta_key).filter(|v| !v.is_empty()).map(String::from),
            media: item
                .meta(THUMBNAIL_META_KEY)
                .filter(|v| !v.is_empty())
                .map(|id| MediaRef::Attachment(id.to_string())),
        })
        .collect();
    Ok(WpExport { base_url: doc.base_url, entries })
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(default)]
    email: String,
    #[serde(default, rename = "rawPhotoUrl")]
    raw_photo_url: String,
}

/// Parse the `email,rawPhotoUrl` CSV. Photo URLs not starting with `http` are ignored.
///
/// Short rows are padded with empty columns. A row that cannot be read is
/// kept as an empty entry, which the import counts as missing data.
pub fn parse_thumbnail_csv(data: &str) -> Result<Vec<ThumbnailSource>, SourceError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(data.trim_start_matches('\u{feff}').as_bytes());
    let headers = reader.headers().map_err(|e| SourceError::Csv(e.to_string()))?.clone();

    let rows = reader
        .records()
        .enumerate()
        .map(|(index, record)| {
            let row = record.and_then(|mut record| {
                while record.len() < headers.len() {
                    record.push_field("");
                }
                record.deserialize::<CsvRow>(Some(&headers))
            });
            match row {
                Ok(row) => ThumbnailSource {
                    email: Some(row.email).filter(|v| !v.is_empty()),
                    media: Some(row.raw_photo_url).filter(|v| v.starts_with("http")).map(MediaRef::Url),
                },
                Err(err) => {
                    warn!(row = index + 1, error = %err, "unreadable thumbnail row");
                    ThumbnailSource::default()
                }
            }
        })
        .collect();
    Ok(rows)
}

/// Make a media `source_url` absolute against the exporting site.
pub fn absolute_media_url(base_url: &str, source_url: &str) -> String {
    if base_url.is_empty() || source_url.contains(base_url) || source_url.starts_with("http") {
        source_url.to_string()
    } else {
        format!("{}/{}", base_url.trim_end_matches('/'), source_url.trim_start_matches('/'))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ThumbnailStats {
    pub processed: usize,
    pub matched: usize,
    pub skipped_missing: usize,
    pub skipped_no_match: usize,
    pub added: usize,
    pub unchanged: usize,
    pub deleted: usize,
    pub errors: usize,
}

impl fmt::Display for ThumbnailStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Records")?;
        writeln!(f, "======================================")?;
        writeln!(f, "Records Processed : {}", self.processed)?;
        writeln!(f, "Records Matched   : {}", self.matched)?;
        writeln!(f, "Skipped (Missing) : {}", self.skipped_missing)?;
        writeln!(f, "Skipped (No Match): {}", self.skipped_no_match)?;
        writeln!(f)?;
        writeln!(f, "Thumbnails")?;
        writeln!(f, "======================================")?;
        writeln!(f, "Added             : {}", self.added)?;
        writeln!(f, "Unchanged         : {}", self.unchanged)?;
        writeln!(f, "Deleted           : {}", self.deleted)?;
        write!(f, "Errors            : {}", self.errors)
    }
}

fn match_person<R: ContentRepository + ?Sized>(repo: &R, email: &str) -> Result<Option<LocalId>, SyncError> {
    let criteria = Criteria::new(PERSON_TYPE, EMAIL_FIELD)
        .with_field(FieldFilter::equals_ignore_case(EMAIL_FIELD, email.to_lowercase()));
    Ok(repo.find_by(&criteria)?.first().map(|r| r.local_id))
}

/// Attach thumbnails to matched people.
///
/// A person who already has a thumbnail is left alone unless `force`, in
/// which case the old one is deleted first. `resolve` turns a [`MediaRef`]
/// into an image URL; `Ok(None)` or an error counts as an error.
pub fn import_thumbnails<R, F>(
    repo: &mut R,
    sources: &[ThumbnailSource],
    force: bool,
    mut resolve: F,
) -> Result<ThumbnailStats, SyncError>
where
    R: ContentRepository + ?Sized,
    F: FnMut(&MediaRef) -> Result<Option<String>, RecordError>,
{
    let mut stats = ThumbnailStats::default();
    let mut matched = Vec::new();

    for source in sources {
        stats.processed += 1;
        let (Some(email), Some(media)) = (&source.email, &source.media) else {
            stats.skipped_missing += 1;
            continue;
        };
        match match_person(&*repo, email)? {
            Some(id) => {
                stats.matched += 1;
                matched.push((id, media));
            }
            None => stats.skipped_no_match += 1,
        }
    }
    info!(processed = stats.processed, matched = stats.matched, "thumbnail sources matched");

    for (id, media) in matched {
        if repo.thumbnail(id)?.is_some() {
            if !force {
                stats.unchanged += 1;
                continue;
            }
            repo.set_thumbnail(id, None)?;
            stats.deleted += 1;
        }

        match resolve(media) {
            Ok(Some(url)) => {
                repo.set_thumbnail(id, Some(&url))?;
                debug!(local_id = id, url = %url, "thumbnail attached");
                stats.added += 1;
            }
            Ok(None) => {
                warn!(local_id = id, media = ?media, "media has no image URL");
                stats.errors += 1;
            }
            Err(err) => {
                warn!(local_id = id, error = %err, "media lookup failed");
                stats.errors += 1;
            }
        }
    }

    Ok(stats)
}
