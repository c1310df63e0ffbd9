//! Degree records from the search service's `programSearch` view.

use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::lenient;
use super::names::{decode_entities, slugify};
use crate::classify::{catalog_type_token, slug_suffix, ProgramType};
use crate::error::RecordError;
use crate::matcher::{catalog_pdf, CatalogEntry, DegreeProbe};
use crate::model::{NormalizedRecord, TermRef};

pub const CONTENT_TYPE: &str = "degree";
pub const KEY_FIELD: &str = "degree_key";

pub const TAX_PROGRAM_TYPES: &str = "program_types";
pub const TAX_COLLEGES: &str = "colleges";
pub const TAX_DEPARTMENTS: &str = "departments";

pub const COLLEGE_ALIAS_META: &str = "colleges_alias";

/// Search-service college names that differ from the ones used on site.
/// An empty replacement means the program has no college.
const COLLEGE_SUBSTITUTIONS: [(&str, &str); 3] = [
    ("College of Hospitality Management", "Rosen College of Hospitality Management"),
    ("Office of Undergraduate Studies", "College of Undergraduate Studies"),
    ("College of Nondegree", ""),
];

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DegreeRecord {
    #[serde(deserialize_with = "lenient::string")]
    pub degree_id: String,
    #[serde(deserialize_with = "lenient::string")]
    pub type_id: String,
    #[serde(deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(rename = "type", deserialize_with = "lenient::string")]
    pub program_type: String,
    #[serde(deserialize_with = "lenient::flag")]
    pub graduate: bool,
    #[serde(deserialize_with = "lenient::string")]
    pub college_name: String,
    #[serde(deserialize_with = "lenient::string")]
    pub department_name: String,
    pub required_hours: Value,
    #[serde(deserialize_with = "lenient::string")]
    pub description: String,
    #[serde(deserialize_with = "lenient::string")]
    pub website: String,
    #[serde(deserialize_with = "lenient::string")]
    pub phone: String,
    #[serde(deserialize_with = "lenient::string")]
    pub email: String,
    /// Kept raw; entries are validated one by one.
    pub contacts: Value,
}

impl DegreeRecord {
    pub fn from_json(value: Value) -> Result<Self, RecordError> {
        serde_json::from_value(value).map_err(|e| RecordError::Invalid(format!("degree record: {e}")))
    }

    pub fn stable_key(&self) -> String {
        if self.type_id.is_empty() {
            self.degree_id.clone()
        } else {
            format!("{}:{}", self.degree_id, self.type_id)
        }
    }
}

/// Site college name for a search-service college name. `None` = no college.
pub fn college_name(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let name = COLLEGE_SUBSTITUTIONS
        .iter()
        .find(|(from, _)| *from == raw)
        .map_or(raw, |(_, to)| *to);
    (!name.is_empty()).then(|| name.to_string())
}

/// Short college name: "College of" and "Rosen" removed.
pub fn college_alias(name: &str) -> String {
    name.replace("College of", "").replace("Rosen", "").trim().to_string()
}

/// The college term, slugged by its alias and carrying the alias as meta.
pub fn college_term(name: &str) -> TermRef {
    let alias = college_alias(name);
    TermRef::named(name).with_slug(slugify(&alias)).with_meta(COLLEGE_ALIAS_META, alias)
}

/// A usable degree website: one scheme separator, http(s), parseable.
pub fn valid_website(url: &str) -> bool {
    url.matches("://").count() == 1
        && (url.starts_with("http://") || url.starts_with("https://"))
        && url::Url::parse(url).is_ok()
}

/// Split "Name, Title" on the first comma.
pub fn split_contact_name(raw: &str) -> (String, String) {
    match raw.split_once(',') {
        Some((name, title)) => (name.trim().to_string(), title.trim().to_string()),
        None => (raw.trim().to_string(), String::new()),
    }
}

fn format_contacts(contacts: &Value, warnings: &mut Vec<String>) -> Value {
    let entries = match contacts {
        Value::Null => return Value::Null,
        Value::Array(entries) => entries,
        other => {
            warnings.push(format!("contacts: expected a list, got {}", json_kind(other)));
            return Value::Null;
        }
    };

    let mut rows = Vec::with_capacity(entries.len());
    for (i, contact) in entries.iter().enumerate() {
        let raw_name = lenient::field(contact, "contact_name");
        if !contact.is_object() || raw_name.is_empty() {
            warnings.push(format!("contacts[{i}]: missing contact_name, skipped"));
            continue;
        }
        let (name, title) = split_contact_name(&raw_name);
        let mut row = Map::new();
        row.insert("degree_contact_name".into(), name.into());
        row.insert("degree_contact_title".into(), title.into());
        row.insert("degree_contact_phone".into(), lenient::field(contact, "contact_phone").into());
        row.insert("degree_contact_email".into(), lenient::field(contact, "contact_email").into());
        rows.push(Value::Object(row));
    }

    if rows.is_empty() {
        Value::Null
    } else {
        Value::Array(rows)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

pub fn normalize(record: &DegreeRecord, catalog: &[CatalogEntry]) -> Result<NormalizedRecord, RecordError> {
    if record.degree_id.is_empty() {
        return Err(RecordError::MissingKey);
    }

    let name = record.name.trim();
    let program_type = ProgramType::classify(&record.program_type, record.graduate, name);
    let college = college_name(&record.college_name);

    let mut out = NormalizedRecord::new(record.stable_key(), name);
    out.slug = slugify(&format!("{name}{}", slug_suffix(&record.program_type, name)));
    out.kind = program_type.label().to_string();

    let pdf = if record.graduate {
        String::new()
    } else {
        let type_token = catalog_type_token(&record.program_type);
        let probe = DegreeProbe {
            name,
            type_token: &type_token,
            college_name: college.as_deref().unwrap_or(""),
        };
        catalog_pdf(&probe, catalog)
    };

    let website = if record.website.is_empty() || valid_website(&record.website) {
        record.website.clone()
    } else {
        out.warn(format!("website '{}' is not a valid http(s) URL, cleared", record.website));
        String::new()
    };

    let contacts = format_contacts(&record.contacts, &mut out.warnings);

    out.set_field(KEY_FIELD, out.stable_key.clone());
    out.set_field("degree_id", record.degree_id.as_str());
    out.set_field("degree_type_id", record.type_id.as_str());
    out.set_field("degree_hours", record.required_hours.clone());
    out.set_field("degree_description", decode_entities(&record.description));
    out.set_field("degree_website", website);
    out.set_field("degree_phone", record.phone.as_str());
    out.set_field("degree_email", record.email.as_str());
    out.set_field("degree_contacts", contacts);
    out.set_field("degree_pdf", pdf);
    out.set_field("degree_is_graduate", record.graduate);
    out.set_field("page_header_height", json!("header-media-default"));

    let mut type_term = TermRef::named(program_type.label());
    if let Some(parent) = program_type.parent() {
        type_term = type_term.with_parent(parent);
    }
    out.add_term(TAX_PROGRAM_TYPES, type_term);

    match &college {
        Some(name) => out.add_term(TAX_COLLEGES, college_term(name)),
        None => out.clear_terms(TAX_COLLEGES),
    }

    match record.department_name.trim() {
        "" => out.clear_terms(TAX_DEPARTMENTS),
        department => out.add_term(TAX_DEPARTMENTS, TermRef::named(department)),
    }

    Ok(out)
}
