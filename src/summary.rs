use thiserror::Error;

use crate::classifier::Record;

pub const SUMMARY_HEADERS: [&str; 2] = ["Proper emails number", "Wrong emails number"];

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SummaryError {
    #[error("cannot compute email shares: division by zero (no records were classified)")]
    DivisionByZero,
}

/// Counts and percentage shares of one classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub proper_count: usize,
    pub wrong_count: usize,
    pub proper_percentage: String,
    pub wrong_percentage: String,
}

impl Summary {
    pub fn total(&self) -> usize {
        self.proper_count + self.wrong_count
    }

    pub fn header_row() -> [&'static str; 2] {
        SUMMARY_HEADERS
    }

    pub fn data_row(&self) -> [String; 2] {
        [
            format!("{} ({})", self.proper_count, self.proper_percentage),
            format!("{} ({})", self.wrong_count, self.wrong_percentage),
        ]
    }

    pub fn message(&self, file_name: &str) -> String {
        format!(
            "File {} was successfully processed. There were {} proper emails and {} wrong emails",
            file_name, self.proper_count, self.wrong_count
        )
    }
}

/// Fails with `DivisionByZero` when both sequences are empty.
/// The two percentages are rounded independently and may not add up to exactly 100.00%.
pub fn summarize(proper: &[Record], wrong: &[Record]) -> Result<Summary, SummaryError> {
    let proper_count = proper.len();
    let wrong_count = wrong.len();
    let total = proper_count + wrong_count;
    if total == 0 {
        return Err(SummaryError::DivisionByZero);
    }

    let proper_share = proper_count as f64 / total as f64;
    let wrong_share = 1.0 - proper_share;

    Ok(Summary {
        proper_count,
        wrong_count,
        proper_percentage: format_percentage(proper_share),
        wrong_percentage: format_percentage(wrong_share),
    })
}

fn format_percentage(share: f64) -> String {
    format!("{:.2}%", share * 100.0)
}
