use crate::core::loader::require_column;
use crate::domain::model::{SpeciesCounts, Table};
use crate::utils::error::{Result, SplitError};
use serde_json::Value;

/// Counts rows per species, or sums `count_column` per species when given.
/// Rows with a blank identifier are skipped.
pub fn aggregate(table: &Table, id_column: &str, count_column: Option<&str>) -> Result<SpeciesCounts> {
    require_column(table, id_column)?;
    if let Some(column) = count_column {
        require_column(table, column)?;
    }

    let mut counts = SpeciesCounts::new();
    let mut skipped = 0usize;

    for row in &table.rows {
        let Some(species) = row.get(id_column).and_then(species_key) else {
            skipped += 1;
            continue;
        };

        let amount = match count_column {
            Some(column) => row.get(column).map(count_value).unwrap_or(0),
            None => 1,
        };
        let total = counts.entry(species).or_insert(0);
        *total = total.checked_add(amount).ok_or_else(|| SplitError::Parse {
            path: table.source.clone(),
            message: format!(
                "counts in column '{}' overflow a 64-bit total",
                count_column.unwrap_or(id_column)
            ),
        })?;
    }

    if skipped > 0 {
        tracing::warn!(
            "Skipped {} row(s) in {} with an empty '{}' value",
            skipped,
            table.source,
            id_column
        );
    }
    tracing::debug!("{}: {} distinct species", table.source, counts.len());

    Ok(counts)
}

/// Identifiers are used verbatim; only missing or empty cells are rejected.
fn species_key(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Non-negative finite numbers round to the nearest integer; anything else is zero.
fn count_value(value: &Value) -> u64 {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match number {
        Some(n) if n.is_finite() && n >= 0.0 => n.round() as u64,
        _ => 0,
    }
}
