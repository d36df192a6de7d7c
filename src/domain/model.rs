use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// One row of an input table, keyed by header name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Record {
    pub data: HashMap<String, serde_json::Value>,
}

impl Record {
    pub fn get(&self, column: &str) -> Option<&serde_json::Value> {
        self.data.get(column)
    }
}

/// An input file held in memory. Column order follows the header row.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub source: String,
    pub columns: Vec<String>,
    pub rows: Vec<Record>,
}

impl Table {
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Observations per species for one habitat.
pub type SpeciesCounts = BTreeMap<String, u64>;

#[derive(Debug, Clone, Default)]
pub struct HabitatCounts {
    pub counts_a: SpeciesCounts,
    pub counts_b: SpeciesCounts,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergedRecord {
    pub species: String,
    pub count_a: u64,
    pub count_b: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Split {
    pub percent_a: f64,
    pub percent_b: f64,
}

/// `split` is `None` when the species carries no weight in either habitat.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedRecord {
    pub species: String,
    pub count_a: u64,
    pub count_b: u64,
    pub split: Option<Split>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum NormalizeMode {
    /// Split each species' raw counts.
    #[default]
    Raw,
    /// Divide counts by each habitat's grand total before splitting.
    Effort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Horizontal,
    Vertical,
}

/// Records with a defined split, ordered by `percent_a` descending.
#[derive(Debug, Clone, Default)]
pub struct PlotSpec {
    pub bars: Vec<PlotBar>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlotBar {
    pub species: String,
    pub percent_a: f64,
    pub percent_b: f64,
}

impl PlotSpec {
    pub fn from_normalized(records: &[NormalizedRecord]) -> Self {
        let mut bars: Vec<PlotBar> = records
            .iter()
            .filter_map(|record| {
                record.split.map(|split| PlotBar {
                    species: record.species.clone(),
                    percent_a: split.percent_a,
                    percent_b: split.percent_b,
                })
            })
            .collect();

        // Stable, so ties keep merge order.
        bars.sort_by(|a, b| b.percent_a.total_cmp(&a.percent_a));
        Self { bars }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct TransformResult {
    pub merged: Vec<MergedRecord>,
    pub normalized: Vec<NormalizedRecord>,
    pub plot: PlotSpec,
    pub total_a: u64,
    pub total_b: u64,
}
