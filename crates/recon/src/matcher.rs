//! Catalog cross-matcher: links a search-service degree to an entry in
//! the undergraduate catalog, an independently shaped dataset.

use serde::{Deserialize, Serialize};

use crate::normalize::names::clean_name;

/// One program from the catalog's `programs` array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub program_type: String,
    pub college: String,
    pub pdf: Option<String>,
}

/// The degree-side view the matcher needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DegreeProbe<'a> {
    pub name: &'a str,
    /// Catalog-facing type token, see [`crate::classify::catalog_type_token`].
    pub type_token: &'a str,
    /// College name after alias substitution.
    pub college_name: &'a str,
}

/// Containment that never treats an empty needle as a match.
fn contains_nonempty(haystack: &str, needle: &str) -> bool {
    !needle.is_empty() && haystack.contains(needle)
}

/// First catalog entry satisfying every match rule, in catalog order.
///
/// 1. the degree's type token is a case-insensitive substring of the entry type;
/// 2. cleaned names are equal, or the degree is `accelerated` and its cleaned
///    name contains the entry's, or the entry's name+type contains the degree's;
/// 3. cleaned college names are equal or one contains the other.
///
/// No scoring: when two entries qualify the earlier one is returned.
pub fn find_catalog_entry<'c>(probe: &DegreeProbe<'_>, catalog: &'c [CatalogEntry]) -> Option<&'c CatalogEntry> {
    let name = clean_name(probe.name);
    let college = clean_name(probe.college_name);
    let type_token = probe.type_token.to_lowercase();
    let accelerated = probe.type_token.eq_ignore_ascii_case("accelerated");

    catalog.iter().find(|entry| {
        if !entry.program_type.to_lowercase().contains(&type_token) {
            return false;
        }

        let entry_name = clean_name(&entry.name);
        let names_match = name == entry_name
            || (accelerated
                && (contains_nonempty(&name, &entry_name)
                    || contains_nonempty(&format!("{entry_name}{}", clean_name(&entry.program_type)), &name)));
        if !names_match {
            return false;
        }

        let entry_college = clean_name(&entry.college);
        college == entry_college
            || contains_nonempty(&college, &entry_college)
            || contains_nonempty(&entry_college, &college)
    })
}

/// PDF reference of the first matching entry, or `""`.
pub fn catalog_pdf(probe: &DegreeProbe<'_>, catalog: &[CatalogEntry]) -> String {
    find_catalog_entry(probe, catalog)
        .and_then(|entry| entry.pdf.clone())
        .unwrap_or_default()
}
