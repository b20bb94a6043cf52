use std::collections::BTreeSet;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::models::{Movie, MovieFilter, RatingRange};
use crate::services::catalog::Catalog;

/// A single filter over movies
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// At least one shared genre tag
    Genres(BTreeSet<String>),
    /// Retained studio is in the set
    Studios(BTreeSet<String>),
    Rating(RatingRange),
    /// Lowercased title prefix
    TitlePrefix(String),
}

impl Predicate {
    pub fn matches(&self, movie: &Movie) -> bool {
        match self {
            Predicate::Genres(genres) => movie.has_any_genre(genres),
            Predicate::Studios(studios) => movie
                .studio
                .as_ref()
                .is_some_and(|studio| studios.contains(studio)),
            Predicate::Rating(range) => range.contains(movie.rating),
            Predicate::TitlePrefix(prefix) => movie.title.to_lowercase().starts_with(prefix),
        }
    }
}

/// A compiled predicate set, every predicate must hold
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MovieQuery {
    predicates: Vec<Predicate>,
    search: Option<String>,
}

impl MovieQuery {
    /// Compiles a caller filter.
    ///
    /// `popular_studios` is the current popular bucket; selecting the popular
    /// pseudo-option adds all of it to the literal studio selection.
    pub fn compile(filter: &MovieFilter, popular_studios: &[String]) -> Self {
        let mut predicates = Vec::new();

        if !filter.genres.is_empty() {
            predicates.push(Predicate::Genres(filter.genres.clone()));
        }

        let mut studios = filter.studios.clone();
        if filter.popular_studios {
            studios.extend(popular_studios.iter().cloned());
        }
        if !studios.is_empty() {
            predicates.push(Predicate::Studios(studios));
        }

        if let Some(range) = filter.rating_range {
            predicates.push(Predicate::Rating(range));
        }

        let search = filter.search_text().map(str::to_lowercase);
        if let Some(prefix) = &search {
            predicates.push(Predicate::TitlePrefix(prefix.clone()));
        }

        Self { predicates, search }
    }

    /// Query from explicit predicates, in the given order
    pub fn from_predicates(predicates: Vec<Predicate>) -> Self {
        let search = predicates.iter().find_map(|p| match p {
            Predicate::TitlePrefix(prefix) => Some(prefix.clone()),
            _ => None,
        });
        Self { predicates, search }
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// Lowercased search text, if any
    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    pub fn matches(&self, movie: &Movie) -> bool {
        self.predicates.iter().all(|p| p.matches(movie))
    }

    /// Matching movies in catalog order
    pub fn apply<'a>(&self, catalog: &'a Catalog) -> Vec<&'a Movie> {
        catalog.movies().iter().filter(|m| self.matches(m)).collect()
    }
}

/// Matching movies in display order.
///
/// Without search text: year descending. With search text: the exact
/// case-insensitive title match first, then the remaining prefix matches
/// by title. Remaining ties keep catalog order.
pub fn browse<'a>(catalog: &'a Catalog, query: &MovieQuery) -> Vec<&'a Movie> {
    let mut movies = query.apply(catalog);

    match query.search() {
        Some(search) => movies.sort_by_cached_key(|m| search_sort_key(*m, search)),
        None => movies.sort_by(|a, b| b.year.cmp(&a.year).then(a.index.cmp(&b.index))),
    }

    movies
}

/// Exact match first, then lowercase title, raw title and catalog index.
/// Each title is lowercased once per sort.
fn search_sort_key<'a>(movie: &'a Movie, search: &str) -> (bool, String, &'a str, usize) {
    let lower = movie.title.to_lowercase();
    (lower != search, lower, movie.title.as_str(), movie.index)
}

/// Up to `count` distinct matching movies drawn uniformly without replacement
pub fn sample<'a, R>(
    catalog: &'a Catalog,
    query: &MovieQuery,
    count: usize,
    rng: &mut R,
) -> Vec<&'a Movie>
where
    R: Rng + ?Sized,
{
    let candidates = query.apply(catalog);
    candidates.choose_multiple(rng, count).copied().collect()
}

/// Keeps the ranked candidates that match, preserving rank order
pub fn filter_ranked<'a>(
    catalog: &'a Catalog,
    ranked: &[(usize, f64)],
    query: &MovieQuery,
) -> Vec<(&'a Movie, f64)> {
    ranked
        .iter()
        .filter_map(|&(index, score)| catalog.get(index).map(|m| (m, score)))
        .filter(|(movie, _)| query.matches(movie))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MovieId;
    use crate::services::catalog::CatalogRow;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    const GENRES: [&str; 5] = ["Action", "Comedy", "Drama", "Horror", "Sci-Fi"];
    const STUDIOS: [&str; 4] = ["A24", "Gaumont", "Pathé", "Warner Bros."];

    fn row(
        id: &str,
        title: &str,
        year: i32,
        genres: &[&str],
        studio: Option<&str>,
        rating: f64,
    ) -> CatalogRow {
        CatalogRow {
            id: MovieId::from(id),
            title: title.to_string(),
            genres: genres.iter().map(|g| g.to_string()).collect(),
            studios: studio.map(str::to_string),
            rating,
            year,
            runtime_minutes: Some(100),
            poster_path: None,
            combined_features: title.to_lowercase(),
        }
    }

    fn fixture() -> Catalog {
        Catalog::from_rows(vec![
            row("tt1", "Avatar", 2009, &["Action", "Sci-Fi"], Some("Fox"), 7.9),
            row("tt2", "Avatar: The Way of Water", 2022, &["Action", "Sci-Fi"], Some("Fox"), 7.5),
            row("tt3", "Amélie", 2001, &["Comedy"], Some("UGC"), 8.3),
            row("tt4", "Avanti!", 1972, &["Comedy"], Some("Mirisch"), 7.1),
            row("tt5", "Heat", 1995, &["Crime", "Drama"], Some("Regency"), 8.3),
            row("tt6", "Arrival", 2016, &["Drama", "Sci-Fi"], None, 7.9),
        ])
    }

    fn generated(size: usize) -> Catalog {
        Catalog::from_rows(
            (0..size)
                .map(|i| {
                    let genres = [GENRES[i % 5], GENRES[(i * 3 + 1) % 5]];
                    let studio = (i % 5 != 0).then(|| STUDIOS[i % 4]);
                    let rating = ((i * 37) % 101) as f64 / 10.0;
                    let year = 1980 + (i % 40) as i32;
                    row(&format!("tt{i}"), &format!("Title {i}"), year, &genres, studio, rating)
                })
                .collect(),
        )
    }

    fn ids(movies: &[&Movie]) -> Vec<String> {
        movies.iter().map(|m| m.id.0.clone()).collect()
    }

    fn set<const N: usize>(items: [&str; N]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_filter_browses_by_year_descending() {
        let catalog = fixture();
        let movies = browse(&catalog, &MovieQuery::default());
        assert_eq!(ids(&movies), vec!["tt2", "tt6", "tt1", "tt3", "tt5", "tt4"]);
    }

    #[test]
    fn test_year_ties_keep_catalog_order() {
        let catalog = Catalog::from_rows(vec![
            row("b", "B", 2000, &[], None, 5.0),
            row("a", "A", 2000, &[], None, 5.0),
            row("c", "C", 2001, &[], None, 5.0),
        ]);
        let movies = browse(&catalog, &MovieQuery::default());
        assert_eq!(ids(&movies), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_search_ranks_exact_match_first() {
        let catalog = fixture();
        let filter = MovieFilter {
            search_text: Some("avatar".to_string()),
            ..Default::default()
        };
        let movies = browse(&catalog, &MovieQuery::compile(&filter, &[]));
        assert_eq!(ids(&movies), vec!["tt1", "tt2"]);
    }

    #[test]
    fn test_search_orders_prefix_matches_by_title() {
        let catalog = fixture();
        let filter = MovieFilter {
            search_text: Some(" AV".to_string()),
            ..Default::default()
        };
        let movies = browse(&catalog, &MovieQuery::compile(&filter, &[]));
        let titles: Vec<&str> = movies.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, vec!["Avanti!", "Avatar", "Avatar: The Way of Water"]);
    }

    #[test]
    fn test_exact_match_beats_alphabetical_order() {
        let catalog = Catalog::from_rows(vec![
            row("1", "Up in the Air", 2009, &[], None, 7.4),
            row("2", "Up", 2009, &[], None, 8.3),
            row("3", "Unforgiven", 1992, &[], None, 8.2),
        ]);
        let filter = MovieFilter {
            search_text: Some("Up".to_string()),
            ..Default::default()
        };
        let movies = browse(&catalog, &MovieQuery::compile(&filter, &[]));
        assert_eq!(ids(&movies), vec!["2", "1"]);
    }

    #[test]
    fn test_search_ties_fall_back_to_raw_title_then_index() {
        let catalog = Catalog::from_rows(vec![
            row("a", "heat 2", 2001, &[], None, 6.0),
            row("b", "Heat 2", 2002, &[], None, 6.0),
            row("c", "Heat 2", 2003, &[], None, 6.0),
            row("d", "HEAT", 1995, &[], None, 8.3),
        ]);
        let filter = MovieFilter {
            search_text: Some("heat".to_string()),
            ..Default::default()
        };
        let movies = browse(&catalog, &MovieQuery::compile(&filter, &[]));
        assert_eq!(ids(&movies), vec!["d", "b", "c", "a"]);
    }

    #[test]
    fn test_genre_filter_uses_or_semantics() {
        let catalog = fixture();
        let filter = MovieFilter {
            genres: set(["Comedy", "Crime"]),
            ..Default::default()
        };
        let movies = MovieQuery::compile(&filter, &[]).apply(&catalog);
        assert_eq!(ids(&movies), vec!["tt3", "tt4", "tt5"]);
    }

    #[test]
    fn test_studio_filter_skips_movies_without_studio() {
        let catalog = fixture();
        let filter = MovieFilter {
            studios: set(["Fox", "Regency"]),
            ..Default::default()
        };
        let movies = MovieQuery::compile(&filter, &[]).apply(&catalog);
        assert_eq!(ids(&movies), vec!["tt1", "tt2", "tt5"]);
    }

    #[test]
    fn test_popular_option_unions_with_literal_studios() {
        let catalog = fixture();
        let filter = MovieFilter {
            studios: set(["Mirisch"]),
            popular_studios: true,
            ..Default::default()
        };
        let popular = vec!["Fox".to_string(), "UGC".to_string()];
        let query = MovieQuery::compile(&filter, &popular);

        assert_eq!(
            query.predicates(),
            &[Predicate::Studios(set(["Fox", "Mirisch", "UGC"]))]
        );
        assert_eq!(ids(&query.apply(&catalog)), vec!["tt1", "tt2", "tt3", "tt4"]);
    }

    #[test]
    fn test_rating_range_is_inclusive() {
        let catalog = fixture();
        let filter = MovieFilter {
            rating_range: Some(RatingRange::new(7.9, 8.3).unwrap()),
            ..Default::default()
        };
        let movies = MovieQuery::compile(&filter, &[]).apply(&catalog);
        assert_eq!(ids(&movies), vec!["tt1", "tt3", "tt5", "tt6"]);
    }

    #[test]
    fn test_predicates_combine_with_and() {
        let catalog = fixture();
        let filter = MovieFilter {
            genres: set(["Sci-Fi"]),
            rating_range: Some(RatingRange::new(7.8, 10.0).unwrap()),
            search_text: Some("a".to_string()),
            ..Default::default()
        };
        let movies = browse(&catalog, &MovieQuery::compile(&filter, &[]));
        assert_eq!(ids(&movies), vec!["tt6", "tt1"]);
    }

    #[test]
    fn test_no_match_is_an_empty_result() {
        let catalog = fixture();
        let filter = MovieFilter {
            genres: set(["Western"]),
            ..Default::default()
        };
        assert!(browse(&catalog, &MovieQuery::compile(&filter, &[])).is_empty());
    }

    #[test]
    fn test_sample_returns_distinct_movies() {
        let catalog = generated(20);
        let mut rng = StdRng::seed_from_u64(7);

        let picked = sample(&catalog, &MovieQuery::default(), 8, &mut rng);
        assert_eq!(picked.len(), 8);
        let unique: HashSet<_> = picked.iter().map(|m| m.index).collect();
        assert_eq!(unique.len(), 8);
    }

    #[test]
    fn test_sample_returns_everything_when_short() {
        let catalog = generated(5);
        let mut rng = StdRng::seed_from_u64(7);

        let picked = sample(&catalog, &MovieQuery::default(), 8, &mut rng);
        assert_eq!(picked.len(), 5);
    }

    #[test]
    fn test_sample_only_draws_matching_movies() {
        let catalog = generated(40);
        let filter = MovieFilter {
            genres: set(["Horror"]),
            ..Default::default()
        };
        let query = MovieQuery::compile(&filter, &[]);
        let mut rng = StdRng::seed_from_u64(11);

        for _ in 0..10 {
            for movie in sample(&catalog, &query, 8, &mut rng) {
                assert!(query.matches(movie));
            }
        }
    }

    #[test]
    fn test_filter_ranked_preserves_rank_order() {
        let catalog = fixture();
        let ranked = vec![(4, 0.9), (0, 0.7), (2, 0.7), (5, 0.1), (1, 0.0)];
        let filter = MovieFilter {
            genres: set(["Sci-Fi", "Crime"]),
            ..Default::default()
        };
        let kept = filter_ranked(&catalog, &ranked, &MovieQuery::compile(&filter, &[]));
        let kept: Vec<(usize, f64)> = kept.iter().map(|(m, s)| (m.index, *s)).collect();
        assert_eq!(kept, vec![(4, 0.9), (0, 0.7), (5, 0.1), (1, 0.0)]);
    }

    const ORDERINGS: [[usize; 3]; 6] = [
        [0, 1, 2],
        [0, 2, 1],
        [1, 0, 2],
        [1, 2, 0],
        [2, 0, 1],
        [2, 1, 0],
    ];

    proptest! {
        #[test]
        fn prop_predicate_order_does_not_change_result(
            genres in proptest::sample::subsequence(GENRES.to_vec(), 1..=3),
            studios in proptest::sample::subsequence(STUDIOS.to_vec(), 1..=3),
            low in 0u8..=10,
            span in 0u8..=10,
        ) {
            let catalog = generated(60);
            let predicates = [
                Predicate::Genres(genres.iter().map(|g| g.to_string()).collect()),
                Predicate::Studios(studios.iter().map(|s| s.to_string()).collect()),
                Predicate::Rating(RatingRange {
                    min: low as f64,
                    max: (low + span).min(10) as f64,
                }),
            ];

            let baseline =
                ids(&MovieQuery::from_predicates(predicates.to_vec()).apply(&catalog));

            for order in ORDERINGS {
                let ordered: Vec<Predicate> =
                    order.iter().map(|&i| predicates[i].clone()).collect();
                let combined = MovieQuery::from_predicates(ordered.clone()).apply(&catalog);
                prop_assert_eq!(&ids(&combined), &baseline);

                // one predicate at a time, narrowing the previous stage
                let mut staged: Vec<&Movie> = catalog.movies().iter().collect();
                for predicate in &ordered {
                    staged.retain(|m| predicate.matches(m));
                }
                prop_assert_eq!(&ids(&staged), &baseline);
            }
        }
    }
}
