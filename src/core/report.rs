use crate::domain::model::NormalizedRecord;
use crate::utils::error::{Result, SplitError};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct SummaryRow<'a> {
    species: &'a str,
    count_a: u64,
    count_b: u64,
    percent_a: Option<f64>,
    percent_b: Option<f64>,
}

/// Console table of counts and splits; undefined splits show as `-`.
pub fn format_table(records: &[NormalizedRecord], label_a: &str, label_b: &str) -> String {
    let name_width = records
        .iter()
        .map(|r| r.species.chars().count())
        .chain(std::iter::once("Species".len()))
        .max()
        .unwrap_or(0);
    let count_width = label_a.len().max(label_b.len()).max(6);

    let mut lines = vec![format!(
        "{:<name_width$}  {:>count_width$}  {:>count_width$}  {:>8}  {:>8}",
        "Species",
        label_a,
        label_b,
        format!("%{}", short_label(label_a)),
        format!("%{}", short_label(label_b)),
    )];

    for record in records {
        let (percent_a, percent_b) = match record.split {
            Some(split) => (
                format!("{:.2}", split.percent_a),
                format!("{:.2}", split.percent_b),
            ),
            None => ("-".to_string(), "-".to_string()),
        };
        lines.push(format!(
            "{:<name_width$}  {:>count_width$}  {:>count_width$}  {:>8}  {:>8}",
            record.species, record.count_a, record.count_b, percent_a, percent_b
        ));
    }

    lines.join("\n")
}

/// Truncates a habitat label for the narrow percentage column headers.
fn short_label(label: &str) -> String {
    label.chars().take(5).collect()
}

/// Per-species CSV; undefined percentages are left empty.
pub fn summary_csv(records: &[NormalizedRecord]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for record in records {
        writer.serialize(SummaryRow {
            species: &record.species,
            count_a: record.count_a,
            count_b: record.count_b,
            percent_a: record.split.map(|s| s.percent_a),
            percent_b: record.split.map(|s| s.percent_b),
        })?;
    }
    writer
        .into_inner()
        .map_err(|e| SplitError::Io(e.into_error()))
}
