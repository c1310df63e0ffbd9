//! Resource links converted from an A-Z index export.

use super::names::slugify;
use crate::error::RecordError;
use crate::model::NormalizedRecord;
use crate::store::TITLE_KEY;
use crate::wxr::WxrItem;

pub const CONTENT_TYPE: &str = "ucf_resource_link";
/// Links are matched to existing ones by title.
pub const KEY_FIELD: &str = TITLE_KEY;
pub const URL_FIELD: &str = "ucf_resource_link_url";
/// Postmeta holding the link target in the exported index.
pub const SOURCE_URL_META: &str = "azindexlink_url";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceLink {
    pub title: String,
    pub url: String,
}

impl ResourceLink {
    /// Every exported item becomes a link, whatever its status.
    pub fn from_item(item: &WxrItem) -> Self {
        Self {
            title: item.title.trim().to_string(),
            url: item.meta(SOURCE_URL_META).unwrap_or_default().trim().to_string(),
        }
    }
}

pub fn normalize(link: &ResourceLink) -> Result<NormalizedRecord, RecordError> {
    let title = link.title.trim();
    if title.is_empty() {
        return Err(RecordError::MissingKey);
    }

    let mut out = NormalizedRecord::new(title, title);
    out.slug = slugify(title);
    out.kind = "resource_link".to_string();
    // Always written, so a link whose target was removed is cleared.
    out.set_field(URL_FIELD, link.url.as_str());
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn item_to_link() {
        let item = WxrItem {
            title: " Registrar ".into(),
            status: "draft".into(),
            postmeta: vec![(SOURCE_URL_META.into(), "https://registrar.example.edu ".into())],
        };
        let out = normalize(&ResourceLink::from_item(&item)).unwrap();
        assert_eq!(out.stable_key, "Registrar");
        assert_eq!(out.slug, "registrar");
        assert_eq!(out.fields[URL_FIELD], json!("https://registrar.example.edu"));
    }

    #[test]
    fn missing_url_is_written_empty() {
        let link = ResourceLink::from_item(&WxrItem { title: "Parking".into(), ..Default::default() });
        assert_eq!(normalize(&link).unwrap().fields[URL_FIELD], json!(""));
    }

    #[test]
    fn untitled_item_has_no_key() {
        assert!(matches!(normalize(&ResourceLink::default()), Err(RecordError::MissingKey)));
    }
}
