use std::collections::{BTreeSet, HashMap};

use crate::models::StudioOptions;
use crate::services::catalog::Catalog;

/// Default size of the popular studio bucket
pub const POPULAR_STUDIO_COUNT: usize = 10;

/// Every distinct genre tag in the catalog, sorted lexicographically
pub fn list_genres(catalog: &Catalog) -> Vec<String> {
    catalog
        .movies()
        .iter()
        .flat_map(|m| m.genres.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Partitions the retained studios into a popular bucket and the long tail.
///
/// `popular` holds the `top_k` most frequent studios, descending frequency,
/// ties resolved by first appearance in catalog order. `others` holds the
/// remaining studios sorted by name.
pub fn list_studios(catalog: &Catalog, top_k: usize) -> StudioOptions {
    // studio -> (count, first seen index)
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for movie in catalog.movies() {
        if let Some(studio) = movie.studio.as_deref() {
            counts.entry(studio).or_insert((0, movie.index)).0 += 1;
        }
    }

    let mut ranked: Vec<(&str, usize, usize)> = counts
        .into_iter()
        .map(|(name, (count, first_seen))| (name, count, first_seen))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

    let split = top_k.min(ranked.len());
    let popular = ranked[..split]
        .iter()
        .map(|(name, _, _)| name.to_string())
        .collect();
    let mut others: Vec<String> = ranked[split..]
        .iter()
        .map(|(name, _, _)| name.to_string())
        .collect();
    others.sort();

    StudioOptions { popular, others }
}
