//! Label patterns for birth certificate fields.

use lazy_static::lazy_static;
use regex::Regex;

use crate::models::record::FieldName;

lazy_static! {
    // Label, colon, any whitespace (newlines included), then the rest of that line
    pub static ref NAME: Regex = Regex::new(r"Name:\s*([^\r\n]*)").unwrap();

    pub static ref DATE_OF_BIRTH: Regex = Regex::new(r"Date of Birth:\s*([^\r\n]*)").unwrap();

    pub static ref PLACE_OF_BIRTH: Regex = Regex::new(r"Place of Birth:\s*([^\r\n]*)").unwrap();
}

/// Pattern for a field.
pub fn pattern_for(field: FieldName) -> &'static Regex {
    match field {
        FieldName::Name => &*NAME,
        FieldName::DateOfBirth => &*DATE_OF_BIRTH,
        FieldName::PlaceOfBirth => &*PLACE_OF_BIRTH,
    }
}
