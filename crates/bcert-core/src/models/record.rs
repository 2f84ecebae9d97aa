//! Birth certificate field record.

use serde::{Deserialize, Serialize};

/// The fixed set of fields read from a birth certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldName {
    Name,
    DateOfBirth,
    PlaceOfBirth,
}

impl FieldName {
    /// All fields in column order.
    pub const ALL: [FieldName; 3] = [
        FieldName::Name,
        FieldName::DateOfBirth,
        FieldName::PlaceOfBirth,
    ];

    /// Column header used in tables and exports.
    pub fn column(&self) -> &'static str {
        match self {
            FieldName::Name => "Name",
            FieldName::DateOfBirth => "Date of Birth",
            FieldName::PlaceOfBirth => "Place of Birth",
        }
    }

    /// Label that introduces the field on the certificate.
    pub fn label(&self) -> &'static str {
        match self {
            FieldName::Name => "Name:",
            FieldName::DateOfBirth => "Date of Birth:",
            FieldName::PlaceOfBirth => "Place of Birth:",
        }
    }
}

impl std::fmt::Display for FieldName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.column())
    }
}

/// Fields extracted from one document.
///
/// Every field is always present; a label that was not found leaves its
/// value empty so that all records share the same columns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRecord {
    #[serde(rename = "Name", default)]
    pub name: String,

    #[serde(rename = "Date of Birth", default)]
    pub date_of_birth: String,

    #[serde(rename = "Place of Birth", default)]
    pub place_of_birth: String,
}

impl FieldRecord {
    /// Get a field value.
    pub fn get(&self, field: FieldName) -> &str {
        match field {
            FieldName::Name => &self.name,
            FieldName::DateOfBirth => &self.date_of_birth,
            FieldName::PlaceOfBirth => &self.place_of_birth,
        }
    }

    /// Set a field value.
    pub fn set(&mut self, field: FieldName, value: impl Into<String>) {
        let value = value.into();
        match field {
            FieldName::Name => self.name = value,
            FieldName::DateOfBirth => self.date_of_birth = value,
            FieldName::PlaceOfBirth => self.place_of_birth = value,
        }
    }

    /// Values in column order.
    pub fn values(&self) -> [&str; 3] {
        FieldName::ALL.map(|field| self.get(field))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_serializes_with_column_names() {
        let mut record = FieldRecord::default();
        record.set(FieldName::Name, "Jane Doe");
        record.set(FieldName::DateOfBirth, "1990-05-01");

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "Name": "Jane Doe",
                "Date of Birth": "1990-05-01",
                "Place of Birth": "",
            })
        );
    }

    #[test]
    fn test_values_follow_column_order() {
        let record = FieldRecord {
            name: "A".to_string(),
            date_of_birth: "B".to_string(),
            place_of_birth: "C".to_string(),
        };
        assert_eq!(record.values(), ["A", "B", "C"]);
    }
}
