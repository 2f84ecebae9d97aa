//! Births-per-year grouping and bar chart rendering.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::Datelike;
use image::{ImageResult, Rgb, RgbImage};
use tracing::debug;

use super::dates::parse_birth_date;
use crate::error::ParseError;
use crate::models::record::FieldName;
use crate::models::table::ResultTable;

pub const CHART_TITLE: &str = "Births per Year";
pub const X_LABEL: &str = "Year";
pub const Y_LABEL: &str = "Number of Births";

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const AXIS: Rgb<u8> = Rgb([40, 40, 40]);
const BAR: Rgb<u8> = Rgb([31, 119, 180]);
const MARGIN: u32 = 40;

/// Derive the "Year of Birth" column from the table.
///
/// Every row must hold a recognizable date; the first row that does not
/// fails the whole table.
pub fn birth_years(table: &ResultTable) -> Result<Vec<i32>, ParseError> {
    table
        .column(FieldName::DateOfBirth)
        .enumerate()
        .map(|(row, value)| {
            if value.trim().is_empty() {
                return Err(ParseError::EmptyDate { row });
            }
            parse_birth_date(value)
                .map(|date| date.year())
                .ok_or_else(|| ParseError::InvalidDate {
                    row,
                    value: value.to_string(),
                })
        })
        .collect()
}

/// Number of births per year, ordered by year.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BirthsPerYear {
    counts: BTreeMap<i32, usize>,
}

impl BirthsPerYear {
    /// Group the table's rows by year of birth.
    pub fn from_table(table: &ResultTable) -> Result<Self, ParseError> {
        let chart = Self::from_years(birth_years(table)?);
        debug!("{} rows over {} years", table.len(), chart.counts.len());
        Ok(chart)
    }

    pub fn from_years(years: impl IntoIterator<Item = i32>) -> Self {
        let mut counts = BTreeMap::new();
        for year in years {
            *counts.entry(year).or_insert(0) += 1;
        }
        Self { counts }
    }

    pub fn counts(&self) -> &BTreeMap<i32, usize> {
        &self.counts
    }

    /// Chart categories, ascending.
    pub fn years(&self) -> Vec<i32> {
        self.counts.keys().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    fn max_count(&self) -> usize {
        self.counts.values().copied().max().unwrap_or(0)
    }

    /// Render a horizontal bar chart for the terminal.
    ///
    /// The tallest bar is `width` characters long; any non-zero count gets
    /// at least one character.
    pub fn render_text(&self, width: usize) -> String {
        let mut output = format!("{}\n", CHART_TITLE);
        if self.counts.is_empty() {
            output.push_str("(no data)\n");
            return output;
        }

        let max = self.max_count();
        let label_width = self
            .counts
            .keys()
            .map(|y| y.to_string().len())
            .max()
            .unwrap_or(0)
            .max(X_LABEL.len());

        output.push_str(&format!("{:<w$}  {}\n", X_LABEL, Y_LABEL, w = label_width));
        for (year, count) in &self.counts {
            let len = (count * width).div_ceil(max).max(1);
            output.push_str(&format!(
                "{:<w$}  {} {}\n",
                year,
                "█".repeat(len),
                count,
                w = label_width
            ));
        }
        output
    }

    /// Render a vertical bar chart as a PNG image.
    pub fn render_png(&self, path: &Path, width: u32, height: u32) -> ImageResult<()> {
        let image = self.render_image(width, height);
        image.save(path)?;
        debug!("Wrote {}x{} chart to {}", width, height, path.display());
        Ok(())
    }

    fn render_image(&self, width: u32, height: u32) -> RgbImage {
        let width = width.max(MARGIN * 3);
        let height = height.max(MARGIN * 3);
        let mut image = RgbImage::from_pixel(width, height, BACKGROUND);

        let left = MARGIN;
        let right = width - MARGIN;
        let top = MARGIN;
        let baseline = height - MARGIN;

        fill_rect(&mut image, left, baseline, right, baseline + 2, AXIS);
        fill_rect(&mut image, left - 2, top, left, baseline + 2, AXIS);

        if self.counts.is_empty() {
            return image;
        }

        let max = self.max_count() as u64;
        let plot_height = (baseline - top) as u64;
        let plot_width = (right - left) as u64;
        let slots = self.counts.len() as u64;

        // Slots narrower than a pixel collapse onto shared one-pixel bars
        for (i, count) in self.counts.values().enumerate() {
            let i = i as u64;
            let slot_start = left as u64 + i * plot_width / slots;
            let slot_end = left as u64 + (i + 1) * plot_width / slots;
            let slot = slot_end - slot_start;
            let bar_width = (slot * 7 / 10).max(1);
            let x0 = (slot_start + slot.saturating_sub(bar_width) / 2).min(right as u64 - 1) as u32;

            let bar_height = (*count as u64 * plot_height / max) as u32;
            fill_rect(&mut image, x0, baseline - bar_height, x0 + bar_width as u32, baseline, BAR);
        }

        image
    }
}

fn fill_rect(image: &mut RgbImage, x0: u32, y0: u32, x1: u32, y1: u32, color: Rgb<u8>) {
    let x1 = x1.min(image.width());
    let y1 = y1.min(image.height());
    for y in y0..y1 {
        for x in x0..x1 {
            image.put_pixel(x, y, color);
        }
    }
}
