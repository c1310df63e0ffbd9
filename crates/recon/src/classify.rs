//! Program type classification for degree records.

use std::fmt;

use crate::normalize::names::title_case;

/// Name fragments that mark a graduate major as a doctorate. First hit wins.
pub const DOCTORAL_SUFFIXES: [&str; 5] = ["DPT", "DNP", "EdD", "PhD", "MD"];

/// Parent term -> child terms of the `program_types` taxonomy.
pub const PROGRAM_TYPE_GROUPS: [(&str, &[&str]); 2] = [
    (
        "Undergraduate Program",
        &["Undergraduate Degree", "Minor", "Articulated Program", "Accelerated Program"],
    ),
    ("Graduate Program", &["Master", "Doctorate", "Certificate"]),
];

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProgramType {
    UndergraduateDegree,
    Master,
    Doctorate,
    Minor,
    Certificate,
    ArticulatedProgram,
    AcceleratedProgram,
    /// Unknown raw type, title-cased.
    Other(String),
}

impl ProgramType {
    /// Classify a search-service `type` plus its `graduate` flag.
    ///
    /// | raw type                   | graduate | result                         |
    /// |----------------------------|----------|--------------------------------|
    /// | `major`                    | false    | Undergraduate Degree           |
    /// | `major`                    | true     | Doctorate if a doctoral suffix is in the name, else Master |
    /// | `articulated`/`accelerated`| any      | Articulated/Accelerated Program |
    /// | `minor`, `certificate`     | any      | Minor, Certificate             |
    /// | anything else              | any      | title-cased raw type           |
    pub fn classify(raw_type: &str, graduate: bool, name: &str) -> Self {
        match raw_type.trim().to_ascii_lowercase().as_str() {
            "major" if !graduate => Self::UndergraduateDegree,
            "major" => match doctoral_suffix(name) {
                Some(_) => Self::Doctorate,
                None => Self::Master,
            },
            "articulated" => Self::ArticulatedProgram,
            "accelerated" => Self::AcceleratedProgram,
            "minor" => Self::Minor,
            "certificate" => Self::Certificate,
            _ => Self::Other(title_case(raw_type.trim())),
        }
    }

    /// Term name in the `program_types` taxonomy.
    pub fn label(&self) -> &str {
        match self {
            Self::UndergraduateDegree => "Undergraduate Degree",
            Self::Master => "Master",
            Self::Doctorate => "Doctorate",
            Self::Minor => "Minor",
            Self::Certificate => "Certificate",
            Self::ArticulatedProgram => "Articulated Program",
            Self::AcceleratedProgram => "Accelerated Program",
            Self::Other(label) => label,
        }
    }

    /// Parent group term, when the type belongs to the seeded hierarchy.
    pub fn parent(&self) -> Option<&'static str> {
        let label = self.label();
        PROGRAM_TYPE_GROUPS
            .iter()
            .find(|(_, children)| children.contains(&label))
            .map(|(parent, _)| *parent)
    }
}

impl fmt::Display for ProgramType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// First doctoral suffix found in `name`, case-insensitively.
pub fn doctoral_suffix(name: &str) -> Option<&'static str> {
    let lower = name.to_lowercase();
    DOCTORAL_SUFFIXES
        .iter()
        .copied()
        .find(|suffix| lower.contains(&suffix.to_lowercase()))
}

/// Slug suffix keeping minors and certificates off the major's permalink.
pub fn slug_suffix(raw_type: &str, name: &str) -> &'static str {
    match raw_type.trim().to_ascii_lowercase().as_str() {
        "minor" => "-minor",
        "certificate" if !name.to_lowercase().contains("certificate") => "-certificate",
        _ => "",
    }
}

/// The token the catalog uses for this raw type (`major` -> `Degree Program`).
pub fn catalog_type_token(raw_type: &str) -> String {
    if raw_type.trim().eq_ignore_ascii_case("major") {
        "Degree Program".to_string()
    } else {
        raw_type.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doctorate_by_suffix() {
        let t = ProgramType::classify("major", true, "Doctor of Philosophy in Physics (PhD)");
        assert_eq!(t, ProgramType::Doctorate);
        assert_eq!(t.parent(), Some("Graduate Program"));
    }

    #[test]
    fn graduate_major_without_suffix_is_master() {
        let t = ProgramType::classify("major", true, "Master of Science in Physics");
        assert_eq!(t, ProgramType::Master);
    }

    #[test]
    fn undergraduate_major_ignores_suffix() {
        let t = ProgramType::classify("major", false, "Pre-MD Track");
        assert_eq!(t, ProgramType::UndergraduateDegree);
    }

    #[test]
    fn first_doctoral_suffix_wins() {
        assert_eq!(doctoral_suffix("Nursing Practice (DNP) and PhD"), Some("DNP"));
        assert_eq!(doctoral_suffix("Education (edd)"), Some("EdD"));
        assert_eq!(doctoral_suffix("Master of Arts"), None);
    }

    #[test]
    fn program_variants() {
        assert_eq!(ProgramType::classify("articulated", false, "x").label(), "Articulated Program");
        assert_eq!(ProgramType::classify("accelerated", true, "x").label(), "Accelerated Program");
        assert_eq!(ProgramType::classify("minor", false, "x"), ProgramType::Minor);
        assert_eq!(ProgramType::classify("certificate", true, "x"), ProgramType::Certificate);
        let other = ProgramType::classify("specialist track", true, "x");
        assert_eq!(other.label(), "Specialist Track");
        assert_eq!(other.parent(), None);
    }

    #[test]
    fn slug_suffixes() {
        assert_eq!(slug_suffix("minor", "History"), "-minor");
        assert_eq!(slug_suffix("certificate", "Data Science"), "-certificate");
        assert_eq!(slug_suffix("certificate", "Data Science Certificate"), "");
        assert_eq!(slug_suffix("major", "History"), "");
    }

    #[test]
    fn catalog_tokens() {
        assert_eq!(catalog_type_token("major"), "Degree Program");
        assert_eq!(catalog_type_token("accelerated"), "accelerated");
    }
}
