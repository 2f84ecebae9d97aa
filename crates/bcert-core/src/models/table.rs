//! Result table: one field record per processed document.

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use super::record::{FieldName, FieldRecord};
use crate::error::Result;

/// Ordered collection of field records with a fixed column set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultTable {
    rows: Vec<FieldRecord>,
}

impl ResultTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Column headers in order.
    pub fn columns() -> [&'static str; 3] {
        FieldName::ALL.map(|field| field.column())
    }

    /// Append a row.
    pub fn push(&mut self, record: FieldRecord) {
        self.rows.push(record);
    }

    pub fn rows(&self) -> &[FieldRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of one column, in row order.
    pub fn column(&self, field: FieldName) -> impl Iterator<Item = &str> {
        self.rows.iter().map(move |row| row.get(field))
    }

    /// Write the table as CSV with a header row.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(Self::columns())?;
        for row in &self.rows {
            wtr.write_record(row.values())?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Read a table previously written by [`ResultTable::write_csv`].
    ///
    /// Columns are matched by header name; unknown columns are ignored and
    /// missing ones read as empty.
    pub fn read_csv<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::Reader::from_reader(reader);
        let mut table = Self::new();
        for record in rdr.deserialize() {
            table.push(record?);
        }
        Ok(table)
    }

    /// Render the table as aligned text with a leading row index.
    pub fn render_text(&self) -> String {
        let columns = Self::columns();
        let index_width = self.rows.len().saturating_sub(1).to_string().len();

        let mut widths = columns.map(|c| c.chars().count());
        for row in &self.rows {
            for (width, value) in widths.iter_mut().zip(row.values()) {
                *width = (*width).max(value.chars().count());
            }
        }

        let mut output = String::new();
        output.push_str(&" ".repeat(index_width));
        for (column, width) in columns.iter().zip(widths) {
            output.push_str(&format!("  {:<width$}", column, width = width));
        }
        output.truncate(output.trim_end().len());
        output.push('\n');

        if self.rows.is_empty() {
            output.push_str("(no rows)\n");
            return output;
        }

        for (index, row) in self.rows.iter().enumerate() {
            let mut line = format!("{:<width$}", index, width = index_width);
            for (value, width) in row.values().iter().zip(widths) {
                line.push_str(&format!("  {:<width$}", value, width = width));
            }
            output.push_str(line.trim_end());
            output.push('\n');
        }

        output
    }
}

impl FromIterator<FieldRecord> for ResultTable {
    fn from_iter<I: IntoIterator<Item = FieldRecord>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}
