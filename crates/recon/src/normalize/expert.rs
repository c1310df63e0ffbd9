//! Expert rows from the media-relations spreadsheet export.

use serde::Deserialize;
use serde_json::{json, Value};

use super::names::slugify;
use crate::error::RecordError;
use crate::model::{NormalizedRecord, TermRef};
use crate::store::TITLE_KEY;

pub const CONTENT_TYPE: &str = "person";
/// Experts match any existing person with the same title, faculty included.
pub const KEY_FIELD: &str = TITLE_KEY;
pub const TEMPLATE: &str = "template-expert.php";
pub const PEOPLE_GROUP: &str = "Expert";

pub const TAX_PEOPLE_GROUP: &str = "people_group";
pub const TAX_EXPERTISE: &str = "expertise";
pub const TAX_TAGS: &str = "post_tag";

/// Language answers that do not make an expert bilingual.
const NOT_A_SECOND_LANGUAGE: [&str; 2] = ["Eng", "No"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExpertRow {
    pub first_name: String,
    pub last_name: String,
    pub title: String,
    pub cluster: String,
    pub languages: String,
    pub association: String,
    pub linkedin: String,
    pub facebook: String,
    pub twitter: String,
    pub instagram: String,
    pub other: String,
    pub expertise: String,
    pub tags: String,
}

impl ExpertRow {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim()).trim().to_string()
    }
}

/// Languages other than English, in sheet order.
pub fn second_languages(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|lang| !lang.is_empty() && !NOT_A_SECOND_LANGUAGE.contains(lang))
        .map(String::from)
        .collect()
}

fn split_terms(raw: &str, separator: char, lowercase: bool) -> Vec<String> {
    raw.split(separator)
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .map(|term| if lowercase { term.to_lowercase() } else { term.to_string() })
        .collect()
}

pub fn normalize(row: &ExpertRow) -> Result<NormalizedRecord, RecordError> {
    let name = row.full_name();
    let slug = slugify(&name);
    if slug.is_empty() {
        return Err(RecordError::MissingKey);
    }

    let mut out = NormalizedRecord::new(name.as_str(), name.as_str());
    out.slug = slug;
    out.kind = "expert".to_string();

    let optional = [
        ("expert_first_name", &row.first_name),
        ("expert_last_name", &row.last_name),
        ("expert_title", &row.title),
        ("expert_institute", &row.cluster),
        ("expert_association_fellow", &row.association),
        ("expert_linkedin_url", &row.linkedin),
        ("expert_facebook_url", &row.facebook),
        ("expert_twitter_url", &row.twitter),
        ("expert_instagram_url", &row.instagram),
        ("expert_other_url", &row.other),
    ];
    for (field, value) in optional {
        let value = value.trim();
        if !value.is_empty() {
            out.set_field(field, value);
        }
    }

    let languages = second_languages(&row.languages);
    if !languages.is_empty() {
        let rows: Vec<Value> = languages.iter().map(|l| json!({ "language": l })).collect();
        out.set_field("expert_bilingual", true);
        out.set_field("expert_languages", Value::Array(rows));
    }

    out.set_initial_field("_wp_page_template", TEMPLATE);

    out.add_term(TAX_PEOPLE_GROUP, TermRef::named(PEOPLE_GROUP));
    out.clear_terms(TAX_EXPERTISE);
    for term in split_terms(&row.expertise, ';', false) {
        out.add_term(TAX_EXPERTISE, TermRef::named(term));
    }
    out.clear_terms(TAX_TAGS);
    for tag in split_terms(&row.tags, ',', true) {
        out.add_term(TAX_TAGS, TermRef::named(tag));
    }

    Ok(out)
}
