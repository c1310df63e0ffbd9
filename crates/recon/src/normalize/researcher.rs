//! Researcher records from the research service.
//!
//! The listing carries profile data plus one URL per publication kind.
//! Those URLs are fetched separately and attached with
//! [`ResearcherRecord::citations`] before normalizing.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::lenient;
use super::names::slugify;
use crate::error::RecordError;
use crate::model::{NormalizedRecord, TermRef};

pub const CONTENT_TYPE: &str = "person";
pub const KEY_FIELD: &str = "person_employee_id";
pub const PERSON_TYPE: &str = "faculty";
pub const TEMPLATE: &str = "template-faculty.php";

/// Publication lists hanging off a researcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CitationKind {
    Books,
    Articles,
    BookChapters,
    ConferenceProceedings,
    Grants,
    HonorificAwards,
    Patents,
    ClinicalTrials,
}

impl CitationKind {
    pub const ALL: [CitationKind; 8] = [
        Self::Books,
        Self::Articles,
        Self::BookChapters,
        Self::ConferenceProceedings,
        Self::Grants,
        Self::HonorificAwards,
        Self::Patents,
        Self::ClinicalTrials,
    ];

    /// Name of the URL field on the remote record.
    pub fn resource(&self) -> &'static str {
        match self {
            Self::Books => "books",
            Self::Articles => "articles",
            Self::BookChapters => "book_chapters",
            Self::ConferenceProceedings => "conference_proceedings",
            Self::Grants => "grants",
            Self::HonorificAwards => "honorific_awards",
            Self::Patents => "patents",
            Self::ClinicalTrials => "clinical_trials",
        }
    }

    /// Local field receiving the `{citation}` rows.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Books => "person_books",
            Self::Articles => "person_articles",
            Self::BookChapters => "person_chapters",
            Self::ConferenceProceedings => "person_proceedings",
            Self::Grants => "person_grants",
            Self::HonorificAwards => "person_awards",
            Self::Patents => "person_patents",
            Self::ClinicalTrials => "person_trials",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct EmployeeRecord {
    #[serde(deserialize_with = "lenient::string")]
    pub ext_employee_id: String,
    #[serde(deserialize_with = "lenient::string")]
    pub last_name: String,
    pub job_titles: Value,
    pub departments: Value,
    pub colleges: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TeledataRecord {
    #[serde(deserialize_with = "lenient::string")]
    pub email: String,
    #[serde(deserialize_with = "lenient::string")]
    pub phone: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ResearcherRecord {
    #[serde(deserialize_with = "lenient::string")]
    pub name_formatted_title: String,
    #[serde(deserialize_with = "lenient::string")]
    pub name_formatted_no_title: String,
    pub employee_record: Option<EmployeeRecord>,
    pub teledata_record: Option<TeledataRecord>,
    pub education: Value,
    /// Every other field, including the publication URLs.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    /// Citations per kind, attached after the sub-fetches.
    #[serde(skip)]
    pub citations: BTreeMap<CitationKind, Vec<String>>,
}

impl ResearcherRecord {
    pub fn from_json(value: Value) -> Result<Self, RecordError> {
        serde_json::from_value(value).map_err(|e| RecordError::Invalid(format!("researcher record: {e}")))
    }

    pub fn employee_id(&self) -> &str {
        self.employee_record.as_ref().map_or("", |e| e.ext_employee_id.as_str())
    }

    /// URL of one publication list, when the record links it.
    pub fn citation_url(&self, kind: CitationKind) -> Option<&str> {
        self.extra
            .get(kind.resource())
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

/// `simple_citation_html` of every result on a publication page.
pub fn citations_from_page(page: &Value) -> Vec<String> {
    page.get("results")
        .and_then(Value::as_array)
        .map(|results| {
            results
                .iter()
                .filter_map(|r| r.get("simple_citation_html").and_then(Value::as_str))
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

/// Map a list of objects to rows of `{to: object[from]}`, warning on junk.
fn rows(value: &Value, label: &str, columns: &[(&str, &str)], warnings: &mut Vec<String>) -> Value {
    let items = match value {
        Value::Null => return json!([]),
        Value::Array(items) => items,
        _ => {
            warnings.push(format!("{label}: expected a list, ignored"));
            return json!([]);
        }
    };

    let mut out = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        if !item.is_object() {
            warnings.push(format!("{label}[{i}]: not an object, skipped"));
            continue;
        }
        let row: Map<String, Value> = columns
            .iter()
            .map(|(to, from)| (to.to_string(), Value::String(lenient::field(item, from))))
            .collect();
        out.push(Value::Object(row));
    }
    Value::Array(out)
}

/// Names of the `{name}` objects in a list.
fn term_names(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .map(|item| lenient::field(item, "name"))
                .filter(|name| !name.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

pub fn normalize(record: &ResearcherRecord) -> Result<NormalizedRecord, RecordError> {
    let employee = record.employee_record.clone().unwrap_or_default();
    if employee.ext_employee_id.is_empty() {
        return Err(RecordError::MissingKey);
    }
    let teledata = record.teledata_record.clone().unwrap_or_default();

    let mut out = NormalizedRecord::new(employee.ext_employee_id.as_str(), record.name_formatted_title.as_str());
    out.slug = slugify(&record.name_formatted_no_title);
    out.kind = PERSON_TYPE.to_string();

    let titles = rows(&employee.job_titles, "job_titles", &[("job_title", "name")], &mut out.warnings);
    let degrees = rows(
        &record.education,
        "education",
        &[
            ("institution_name", "institution_name"),
            ("role_name", "role_name"),
            ("start_date", "start_date"),
            ("end_date", "end_date"),
            ("department_name", "department_name"),
        ],
        &mut out.warnings,
    );

    out.set_field(KEY_FIELD, employee.ext_employee_id.as_str());
    out.set_field("person_last_name", employee.last_name.as_str());
    out.set_field("person_titles", titles);
    out.set_field("person_email", teledata.email.as_str());
    out.set_field("person_phone", teledata.phone.as_str());
    out.set_field("person_degrees", degrees);

    for kind in CitationKind::ALL {
        let citations: Vec<Value> = record
            .citations
            .get(&kind)
            .map(|list| list.iter().map(|c| json!({ "citation": c })).collect())
            .unwrap_or_default();
        out.set_field(kind.field(), Value::Array(citations));
    }

    out.set_field("person_type", PERSON_TYPE);
    out.set_initial_field("_wp_page_template", TEMPLATE);

    for (taxonomy, value) in [("departments", &employee.departments), ("colleges", &employee.colleges)] {
        out.clear_terms(taxonomy);
        for name in term_names(value) {
            out.add_term(taxonomy, TermRef::named(name));
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ResearcherRecord {
        ResearcherRecord::from_json(json!({
            "name_formatted_title": "Dr. Grace Hopper",
            "name_formatted_no_title": "Grace Hopper",
            "employee_record": {
                "ext_employee_id": 4521,
                "last_name": "Hopper",
                "job_titles": [{"name": "Professor"}, "bogus"],
                "departments": [{"name": "Computer Science"}],
                "colleges": [{"name": "College of Engineering and Computer Science"}]
            },
            "teledata_record": {"email": "grace@example.edu", "phone": null},
            "education": [{
                "institution_name": "Yale",
                "role_name": "PhD",
                "start_date": "1930",
                "end_date": "1934",
                "department_name": "Mathematics"
            }],
            "books": "https://research.example.edu/books/4521/",
            "patents": ""
        }))
        .unwrap()
    }

    #[test]
    fn normalizes_profile() {
        let mut record = sample();
        record.citations.insert(CitationKind::Books, vec!["<i>COBOL</i>".into()]);
        let out = normalize(&record).unwrap();

        assert_eq!(out.stable_key, "4521");
        assert_eq!(out.title, "Dr. Grace Hopper");
        assert_eq!(out.slug, "grace-hopper");
        assert_eq!(out.fields["person_titles"], json!([{"job_title": "Professor"}]));
        assert_eq!(out.fields["person_phone"], json!(""));
        assert_eq!(out.fields["person_degrees"][0]["institution_name"], json!("Yale"));
        assert_eq!(out.fields["person_books"], json!([{"citation": "<i>COBOL</i>"}]));
        assert_eq!(out.fields["person_trials"], json!([]));
        assert_eq!(out.initial_fields["_wp_page_template"], json!(TEMPLATE));
        assert_eq!(out.terms["departments"][0].name, "Computer Science");
        assert_eq!(out.warnings, vec!["job_titles[1]: not an object, skipped".to_string()]);
    }

    #[test]
    fn citation_urls_come_from_record() {
        let record = sample();
        assert_eq!(record.citation_url(CitationKind::Books), Some("https://research.example.edu/books/4521/"));
        assert_eq!(record.citation_url(CitationKind::Patents), None);
        assert_eq!(record.citation_url(CitationKind::Grants), None);
    }

    #[test]
    fn missing_employee_record_fails() {
        let record = ResearcherRecord::from_json(json!({"name_formatted_title": "Nobody"})).unwrap();
        assert!(matches!(normalize(&record), Err(RecordError::MissingKey)));
    }

    #[test]
    fn citation_page_extraction() {
        let page = json!({"results": [
            {"simple_citation_html": "A"},
            {"title": "no citation"},
            {"simple_citation_html": "B"}
        ]});
        assert_eq!(citations_from_page(&page), vec!["A", "B"]);
        assert!(citations_from_page(&json!({})).is_empty());
    }
}
