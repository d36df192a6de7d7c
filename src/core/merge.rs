use crate::domain::model::{MergedRecord, SpeciesCounts};
use std::collections::BTreeSet;

/// Full outer join on exact identifier equality. Output is ordered by species.
pub fn merge(counts_a: &SpeciesCounts, counts_b: &SpeciesCounts) -> Vec<MergedRecord> {
    let species: BTreeSet<&String> = counts_a.keys().chain(counts_b.keys()).collect();

    species
        .into_iter()
        .map(|name| MergedRecord {
            species: name.clone(),
            count_a: counts_a.get(name).copied().unwrap_or(0),
            count_b: counts_b.get(name).copied().unwrap_or(0),
        })
        .collect()
}
