//! Reporting: year of birth derivation and births-per-year chart.

mod chart;
mod dates;

pub use chart::{BirthsPerYear, CHART_TITLE, X_LABEL, Y_LABEL, birth_years};
pub use dates::parse_birth_date;
