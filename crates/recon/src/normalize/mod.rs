//! Field normalizers: typed remote records in, [`NormalizedRecord`]s out.
//!
//! Every function here is pure and deterministic. Malformed sub-fields are
//! skipped and reported through [`NormalizedRecord::warnings`]; only a
//! record that cannot be keyed at all fails.

pub mod degree;
pub mod expert;
pub mod names;
pub mod researcher;
pub mod resource;

pub use degree::DegreeRecord;
pub use expert::ExpertRow;
pub use researcher::{CitationKind, ResearcherRecord};
pub use resource::ResourceLink;

use crate::error::RecordError;
use crate::matcher::CatalogEntry;
use crate::model::{NormalizedRecord, RemoteRecord};

/// Normalize one remote record. `catalog` is only consulted for degrees.
pub fn normalize(raw: &RemoteRecord, catalog: &[CatalogEntry]) -> Result<NormalizedRecord, RecordError> {
    match raw {
        RemoteRecord::Degree(record) => degree::normalize(record, catalog),
        RemoteRecord::Researcher(record) => researcher::normalize(record),
        RemoteRecord::Expert(row) => expert::normalize(row),
        RemoteRecord::Resource(link) => resource::normalize(link),
    }
}

/// Lenient scalar decoding for remote JSON, where ids arrive as numbers
/// or strings and flags as `0`/`1`, `"true"` or booleans.
pub(crate) mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn scalar_to_string(value: &Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
            _ => None,
        }
    }

    pub fn string<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
        let value = Value::deserialize(de)?;
        Ok(scalar_to_string(&value).unwrap_or_default())
    }

    pub fn flag<'de, D: Deserializer<'de>>(de: D) -> Result<bool, D::Error> {
        Ok(match Value::deserialize(de)? {
            Value::Bool(b) => b,
            Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
            Value::String(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"),
            _ => false,
        })
    }

    /// String field of a JSON object, empty when absent or not scalar.
    pub fn field(object: &Value, key: &str) -> String {
        object.get(key).and_then(scalar_to_string).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::lenient;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "lenient::string")]
        id: String,
        #[serde(default, deserialize_with = "lenient::flag")]
        on: bool,
    }

    #[test]
    fn lenient_scalars() {
        let p: Probe = serde_json::from_value(json!({"id": 42, "on": 1})).unwrap();
        assert_eq!((p.id.as_str(), p.on), ("42", true));

        let p: Probe = serde_json::from_value(json!({"id": " A7 ", "on": "false"})).unwrap();
        assert_eq!((p.id.as_str(), p.on), ("A7", false));

        let p: Probe = serde_json::from_value(json!({"id": null, "on": null})).unwrap();
        assert_eq!((p.id.as_str(), p.on), ("", false));

        let p: Probe = serde_json::from_value(json!({})).unwrap();
        assert_eq!((p.id.as_str(), p.on), ("", false));
    }
}
