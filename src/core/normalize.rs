use crate::domain::model::{MergedRecord, NormalizeMode, NormalizedRecord, Split};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HabitatTotals {
    pub total_a: u64,
    pub total_b: u64,
}

impl HabitatTotals {
    /// Totals saturate at `u64::MAX` rather than wrap.
    pub fn of(records: &[MergedRecord]) -> Self {
        records.iter().fold(
            Self {
                total_a: 0,
                total_b: 0,
            },
            |acc, r| Self {
                total_a: acc.total_a.saturating_add(r.count_a),
                total_b: acc.total_b.saturating_add(r.count_b),
            },
        )
    }
}

/// Turns merged counts into per-species percentage pairs.
///
/// In [`NormalizeMode::Effort`] each count is first divided by its habitat's
/// grand total, so habitats sampled with different effort compare as rates.
/// A species whose two weights sum to zero gets no split.
pub fn normalize(records: &[MergedRecord], mode: NormalizeMode) -> Vec<NormalizedRecord> {
    let totals = HabitatTotals::of(records);
    if mode == NormalizeMode::Effort {
        if totals.total_a == 0 {
            tracing::warn!("Habitat A has no observations; its rates are all zero");
        }
        if totals.total_b == 0 {
            tracing::warn!("Habitat B has no observations; its rates are all zero");
        }
    }

    records
        .iter()
        .map(|record| {
            let (weight_a, weight_b) = match mode {
                NormalizeMode::Raw => (record.count_a as f64, record.count_b as f64),
                NormalizeMode::Effort => (
                    rate(record.count_a, totals.total_a),
                    rate(record.count_b, totals.total_b),
                ),
            };

            NormalizedRecord {
                species: record.species.clone(),
                count_a: record.count_a,
                count_b: record.count_b,
                split: split(weight_a, weight_b),
            }
        })
        .collect()
}

fn rate(count: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}

fn split(weight_a: f64, weight_b: f64) -> Option<Split> {
    let sum = weight_a + weight_b;
    if sum <= 0.0 {
        return None;
    }
    let percent_a = weight_a / sum * 100.0;
    Some(Split {
        percent_a,
        percent_b: 100.0 - percent_a,
    })
}
