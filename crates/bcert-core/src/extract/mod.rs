//! Birth certificate field extraction from OCR text.

pub mod patterns;

use tracing::{debug, trace};

use crate::models::record::{FieldName, FieldRecord};

/// Extracts a field record from raw OCR text.
pub trait RecordExtractor {
    /// Extract all fields. Fields that are not found are left empty.
    fn extract(&self, text: &str) -> FieldRecord;
}

/// Rule-based extractor matching the fixed certificate labels.
///
/// Matching is case-sensitive. When a label appears more than once, the
/// first occurrence wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct CertificateExtractor;

impl CertificateExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract a single field, or `None` if its label is absent.
    pub fn extract_field(&self, text: &str, field: FieldName) -> Option<String> {
        let caps = patterns::pattern_for(field).captures(text)?;
        let value = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
        trace!("{} -> {:?}", field, value);
        Some(value.to_string())
    }
}

impl RecordExtractor for CertificateExtractor {
    fn extract(&self, text: &str) -> FieldRecord {
        let mut record = FieldRecord::default();
        for field in FieldName::ALL {
            if let Some(value) = self.extract_field(text, field) {
                record.set(field, value);
            }
        }

        debug!(
            "Extracted {} of {} fields",
            record.values().iter().filter(|v| !v.is_empty()).count(),
            FieldName::ALL.len()
        );
        record
    }
}

/// Extract a field record using the default extractor.
pub fn extract_fields(text: &str) -> FieldRecord {
    CertificateExtractor::new().extract(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_no_labels_gives_empty_record() {
        assert_eq!(extract_fields(""), FieldRecord::default());
        assert_eq!(
            extract_fields("CERTIFICATE OF LIVE BIRTH\nState of Illinois\n"),
            FieldRecord::default()
        );
    }

    #[test]
    fn test_name_on_own_line_is_trimmed() {
        let record = extract_fields("Name:   Jane Doe   \nother text");
        assert_eq!(record.name, "Jane Doe");
    }

    #[test]
    fn test_all_fields() {
        let text = "\
CERTIFICATE OF BIRTH
Name: Jane Doe
Date of Birth: 1990-05-01
Place of Birth: Springfield, Illinois
Registrar: J. Smith
";
        assert_eq!(
            extract_fields(text),
            FieldRecord {
                name: "Jane Doe".to_string(),
                date_of_birth: "1990-05-01".to_string(),
                place_of_birth: "Springfield, Illinois".to_string(),
            }
        );
    }

    #[test]
    fn test_label_order_does_not_matter() {
        let text = "Place of Birth: Boston\nDate of Birth: 1985-01-01\nName: John Roe\n";
        assert_eq!(
            extract_fields(text),
            FieldRecord {
                name: "John Roe".to_string(),
                date_of_birth: "1985-01-01".to_string(),
                place_of_birth: "Boston".to_string(),
            }
        );
    }

    #[test]
    fn test_first_occurrence_wins() {
        let text = "Name: First Person\nName: Second Person\n";
        assert_eq!(extract_fields(text).name, "First Person");
    }

    #[test]
    fn test_labels_are_case_sensitive() {
        let record = extract_fields("NAME: Jane\ndate of birth: 1990-05-01\n");
        assert_eq!(record, FieldRecord::default());
    }

    #[test]
    fn test_value_on_following_line() {
        let record = extract_fields("Name:\nJane Doe\nDate of Birth:\n1990-05-01\n");
        assert_eq!(record.name, "Jane Doe");
        assert_eq!(record.date_of_birth, "1990-05-01");
    }

    #[test]
    fn test_value_stops_at_end_of_line() {
        let record = extract_fields("Date of Birth:\t 01/02/1990\r\nPlace of Birth:");
        assert_eq!(record.date_of_birth, "01/02/1990");
        assert_eq!(record.place_of_birth, "");
    }

    #[test]
    fn test_label_inside_line_still_matches() {
        let record = extract_fields("Child's Name: Ann Lee\n");
        assert_eq!(record.name, "Ann Lee");
    }

    #[test]
    fn test_extract_field_absent() {
        let extractor = CertificateExtractor::new();
        assert_eq!(extractor.extract_field("nothing", FieldName::PlaceOfBirth), None);
        assert_eq!(
            extractor.extract_field("Place of Birth: Rome", FieldName::PlaceOfBirth),
            Some("Rome".to_string())
        );
    }
}
