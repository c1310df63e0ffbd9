//! WordPress export (WXR) reader.
//!
//! Only what the importers use is kept: the channel's base URL and, per
//! item, its title, status and postmeta pairs.

use std::fmt;

use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::SourceError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WxrItem {
    pub title: String,
    /// `wp:status`, e.g. `publish` or `draft`.
    pub status: String,
    /// `(meta_key, meta_value)` in document order.
    pub postmeta: Vec<(String, String)>,
}

impl WxrItem {
    /// Last value stored under `key`.
    pub fn meta(&self, key: &str) -> Option<&str> {
        self.postmeta.iter().rev().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn is_published(&self) -> bool {
        self.status == "publish"
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WxrDocument {
    /// `wp:base_blog_url` of the exporting site.
    pub base_url: Option<String>,
    pub items: Vec<WxrItem>,
}

#[derive(Default)]
struct Pending {
    item: WxrItem,
    meta_key: String,
    meta_value: String,
}

fn xml_error(err: impl fmt::Display) -> SourceError {
    SourceError::Xml(err.to_string())
}

pub fn parse(xml: &str) -> Result<WxrDocument, SourceError> {
    let mut reader = Reader::from_str(xml);
    let mut doc = WxrDocument::default();
    let mut pending: Option<Pending> = None;
    let mut text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                text.clear();
                if e.name().as_ref() == b"item" {
                    pending = Some(Pending::default());
                }
            }
            Ok(Event::Text(t)) => text.push_str(&t.decode().map_err(xml_error)?),
            Ok(Event::CData(c)) => text.push_str(&c.decode().map_err(xml_error)?),
            Ok(Event::GeneralRef(r)) => match r.resolve_char_ref().map_err(xml_error)? {
                Some(ch) => text.push(ch),
                None => {
                    let name = r.decode().map_err(xml_error)?;
                    text.push_str(resolve_predefined_entity(&name).unwrap_or_default());
                }
            },
            Ok(Event::End(e)) => {
                let value = text.trim().to_string();
                text.clear();
                let qname = e.name();
                let name = qname.as_ref();

                if name == b"item" {
                    if let Some(done) = pending.take() {
                        doc.items.push(done.item);
                    }
                    continue;
                }

                match (name, pending.as_mut()) {
                    (b"wp:base_blog_url", None) => doc.base_url = Some(value).filter(|v| !v.is_empty()),
                    (b"title", Some(state)) => state.item.title = value,
                    (b"wp:status", Some(state)) => state.item.status = value,
                    (b"wp:meta_key", Some(state)) => state.meta_key = value,
                    (b"wp:meta_value", Some(state)) => state.meta_value = value,
                    (b"wp:postmeta", Some(state)) => {
                        let key = std::mem::take(&mut state.meta_key);
                        let value = std::mem::take(&mut state.meta_value);
                        state.item.postmeta.push((key, value));
                    }
                    (b"wp:commentmeta", Some(state)) => {
                        state.meta_key.clear();
                        state.meta_value.clear();
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(SourceError::Xml(format!("at byte {}: {e}", reader.error_position())));
            }
        }
    }

    Ok(doc)
}
