use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod filters;
pub mod movie;

pub use filters::{MovieFilter, Page, RatingRange};
pub use movie::{Movie, MovieId};

/// Movie record returned to clients, enough to render a card
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieCard {
    pub id: MovieId,
    pub title: String,
    pub year: i32,
    pub runtime_minutes: Option<u32>,
    pub genres: Vec<String>,
    pub rating: f64,
    pub studio: Option<String>,
    pub poster_path: Option<String>,
}

impl From<&Movie> for MovieCard {
    fn from(movie: &Movie) -> Self {
        Self {
            id: movie.id.clone(),
            title: movie.title.clone(),
            year: movie.year,
            runtime_minutes: movie.runtime_minutes,
            genres: movie.genres.clone(),
            rating: movie.rating,
            studio: movie.studio.clone(),
            poster_path: movie.poster_path.clone(),
        }
    }
}

/// Studio filter options: most frequent first, then the long tail
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StudioOptions {
    /// Most frequent studios, descending frequency
    pub popular: Vec<String>,
    /// Every other studio, sorted by name
    pub others: Vec<String>,
}

/// A window of an ordered result list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MoviePage {
    pub movies: Vec<MovieCard>,
    /// Number of movies matching before windowing
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
    /// Offset to request for the next page, absent at the end
    pub next_offset: Option<usize>,
}

impl MoviePage {
    /// Windows an already ordered list
    pub fn from_ordered(movies: &[&Movie], page: Page) -> Self {
        Self {
            movies: page.window(movies).iter().map(|m| MovieCard::from(*m)).collect(),
            total: movies.len(),
            offset: page.offset,
            limit: page.limit,
            next_offset: page.next_offset(movies.len()),
        }
    }
}

/// Summary of the catalog snapshot currently served
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogInfo {
    pub source: String,
    pub movie_count: usize,
    pub loaded_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie(index: usize, title: &str) -> Movie {
        Movie {
            id: MovieId(format!("tt{:07}", index)),
            index,
            title: title.to_string(),
            genres: vec!["Drama".to_string()],
            studio: None,
            rating: 7.5,
            year: 2000 + index as i32,
            runtime_minutes: None,
            poster_path: None,
            combined_features: String::new(),
        }
    }

    #[test]
    fn test_movie_card_from_movie() {
        let m = movie(3, "Heat");
        let card = MovieCard::from(&m);
        assert_eq!(card.id, MovieId::from("tt0000003"));
        assert_eq!(card.title, "Heat");
        assert_eq!(card.year, 2003);
        assert_eq!(card.genres, vec!["Drama".to_string()]);
    }

    #[test]
    fn test_movie_card_omits_internal_fields() {
        let card = MovieCard::from(&movie(0, "Heat"));
        let json = serde_json::to_value(&card).unwrap();
        assert!(json.get("combined_features").is_none());
        assert!(json.get("index").is_none());
    }

    #[test]
    fn test_movie_page_from_ordered() {
        let movies: Vec<Movie> = (0..5).map(|i| movie(i, "M")).collect();
        let refs: Vec<&Movie> = movies.iter().collect();

        let page = MoviePage::from_ordered(&refs, Page { offset: 2, limit: 2 });
        assert_eq!(page.total, 5);
        assert_eq!(page.movies.len(), 2);
        assert_eq!(page.movies[0].id, MovieId::from("tt0000002"));
        assert_eq!(page.next_offset, Some(4));

        let last = MoviePage::from_ordered(&refs, Page { offset: 4, limit: 2 });
        assert_eq!(last.movies.len(), 1);
        assert_eq!(last.next_offset, None);
    }
}
