use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::path::PathBuf;

use thiserror::Error;

use crate::models::{filters::in_rating_domain, Movie, MovieId};

/// Columns a source must provide
pub const REQUIRED_COLUMNS: [&str; 5] = [
    "title",
    "combined_features",
    "genres",
    "averageRating",
    "startYear",
];

const ID_COLUMN: &str = "tconst";
const RUNTIME_COLUMN: &str = "runtimeMinutes";
const STUDIOS_COLUMN: &str = "production_companies_name_y";
const POSTER_COLUMN: &str = "poster_path_y";

/// Marker used by IMDb dumps for missing values
const NULL_MARKER: &str = "\\N";

/// Error types for catalog loading
#[derive(Debug, Error)]
pub enum DataLoadError {
    #[error("Failed to read catalog source {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed catalog source: {0}")]
    Csv(#[from] csv::Error),
    #[error("Catalog source is missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("Invalid {column} value {value:?} on line {line}")]
    InvalidValue {
        line: u64,
        column: &'static str,
        value: String,
    },
}

/// One source row before normalization
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogRow {
    pub id: MovieId,
    pub title: String,
    pub genres: Vec<String>,
    /// Raw comma-delimited studio list
    pub studios: Option<String>,
    pub rating: f64,
    pub year: i32,
    pub runtime_minutes: Option<u32>,
    pub poster_path: Option<String>,
    pub combined_features: String,
}

/// Immutable, indexed movie table.
///
/// `movies[i].index == i` for every movie, and no id appears twice.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    movies: Vec<Movie>,
    by_id: HashMap<MovieId, usize>,
    /// Lowercased title to the first movie carrying it
    by_title: HashMap<String, usize>,
}

impl Catalog {
    /// Runs the normalization pipeline over raw rows:
    /// explode studios, keep the first row per id, then assign dense indices.
    pub fn from_rows(rows: Vec<CatalogRow>) -> Self {
        let mut seen = HashSet::new();
        let movies: Vec<Movie> = rows
            .into_iter()
            .filter(|row| seen.insert(row.id.clone()))
            .enumerate()
            .map(|(index, row)| Movie {
                studio: first_listed_studio(row.studios.as_deref()),
                id: row.id,
                index,
                title: row.title,
                genres: row.genres,
                rating: row.rating,
                year: row.year,
                runtime_minutes: row.runtime_minutes,
                poster_path: row.poster_path,
                combined_features: row.combined_features,
            })
            .collect();

        let by_id = movies.iter().map(|m| (m.id.clone(), m.index)).collect();

        let mut by_title = HashMap::new();
        for movie in &movies {
            by_title
                .entry(movie.title.to_lowercase())
                .or_insert(movie.index);
        }

        Self {
            movies,
            by_id,
            by_title,
        }
    }

    /// Parses a CSV source. All-or-nothing: any bad row fails the whole load.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DataLoadError> {
        let mut reader = csv::ReaderBuilder::new().flexible(false).from_reader(reader);
        let columns = Columns::locate(reader.headers()?)?;

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(columns.parse_row(&record)?);
        }

        let catalog = Self::from_rows(rows);
        tracing::info!(movie_count = catalog.len(), "Catalog normalized");
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    /// Movies in index order
    pub fn movies(&self) -> &[Movie] {
        &self.movies
    }

    pub fn get(&self, index: usize) -> Option<&Movie> {
        self.movies.get(index)
    }

    pub fn get_by_id(&self, id: &MovieId) -> Option<&Movie> {
        self.by_id.get(id).map(|&i| &self.movies[i])
    }

    /// Case-insensitive exact title lookup; the lowest index wins on duplicates
    pub fn find_by_title(&self, title: &str) -> Option<&Movie> {
        self.by_title
            .get(&title.trim().to_lowercase())
            .map(|&i| &self.movies[i])
    }
}

/// Studio a movie keeps once its studio list is exploded into one row per
/// studio and deduplicated by id: the first non-empty entry.
fn first_listed_studio(raw: Option<&str>) -> Option<String> {
    raw.and_then(|list| split_studios(list).into_iter().next())
}

/// Splits a studio list, trimming whitespace and stripping quote characters
pub fn split_studios(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().replace(['"', '\''], ""))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Splits a delimited genre string into tags, dropping blanks and duplicates
pub fn split_genres(raw: &str) -> Vec<String> {
    let mut genres: Vec<String> = Vec::new();
    for tag in raw.split(',').map(str::trim) {
        if tag.is_empty() || tag == NULL_MARKER || genres.iter().any(|g| g == tag) {
            continue;
        }
        genres.push(tag.to_string());
    }
    genres
}

/// Header positions of the columns the loader reads
struct Columns {
    id: Option<usize>,
    title: usize,
    combined_features: usize,
    genres: usize,
    rating: usize,
    year: usize,
    runtime: Option<usize>,
    studios: Option<usize>,
    poster: Option<usize>,
}

impl Columns {
    fn locate(headers: &csv::StringRecord) -> Result<Self, DataLoadError> {
        let position = |name: &str| headers.iter().position(|h| h.trim() == name);

        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|name| position(**name).is_none())
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(DataLoadError::MissingColumns(missing));
        }

        let required = |name: &str| position(name).unwrap_or_default();
        Ok(Self {
            id: position(ID_COLUMN),
            title: required("title"),
            combined_features: required("combined_features"),
            genres: required("genres"),
            rating: required("averageRating"),
            year: required("startYear"),
            runtime: position(RUNTIME_COLUMN),
            studios: position(STUDIOS_COLUMN),
            poster: position(POSTER_COLUMN),
        })
    }

    fn parse_row(&self, record: &csv::StringRecord) -> Result<CatalogRow, DataLoadError> {
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let field = |i: usize| record.get(i).unwrap_or_default().trim();
        let optional = |i: Option<usize>| {
            i.map(field)
                .filter(|v| !v.is_empty() && *v != NULL_MARKER)
                .map(str::to_string)
        };
        let invalid = |column: &'static str, value: &str| DataLoadError::InvalidValue {
            line,
            column,
            value: value.to_string(),
        };

        let title = field(self.title).to_string();
        if title.is_empty() {
            return Err(invalid("title", &title));
        }

        let raw_rating = field(self.rating);
        let rating: f64 = raw_rating
            .parse()
            .ok()
            .filter(|r: &f64| in_rating_domain(*r))
            .ok_or_else(|| invalid("averageRating", raw_rating))?;

        let raw_year = field(self.year);
        let year = parse_whole_number(raw_year)
            .and_then(|y| i32::try_from(y).ok())
            .ok_or_else(|| invalid("startYear", raw_year))?;

        let runtime_minutes = optional(self.runtime)
            .and_then(|r| parse_whole_number(&r))
            .and_then(|r| u32::try_from(r).ok());

        let id = optional(self.id)
            .map(MovieId)
            .unwrap_or_else(|| MovieId(title.clone()));

        Ok(CatalogRow {
            id,
            title,
            genres: split_genres(field(self.genres)),
            studios: optional(self.studios),
            rating,
            year,
            runtime_minutes,
            poster_path: optional(self.poster),
            combined_features: field(self.combined_features).to_string(),
        })
    }
}

/// Accepts "1999" as well as "1999.0", which dataframe exports produce
fn parse_whole_number(raw: &str) -> Option<i64> {
    if let Ok(n) = raw.parse::<i64>() {
        return Some(n);
    }
    let f: f64 = raw.parse().ok()?;
    (f.is_finite() && f.fract() == 0.0).then_some(f as i64)
}

/// Where a catalog snapshot comes from
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogSource: Send + Sync {
    /// Loads a complete catalog snapshot
    async fn load(&self) -> Result<Catalog, DataLoadError>;

    /// Human readable source identity for logging
    fn describe(&self) -> String;
}

/// Catalog read from a CSV file on disk
#[derive(Debug, Clone)]
pub struct CsvCatalogSource {
    path: PathBuf,
}

impl CsvCatalogSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl CatalogSource for CsvCatalogSource {
    #[tracing::instrument(skip(self), fields(path = %self.path.display()))]
    async fn load(&self) -> Result<Catalog, DataLoadError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|source| DataLoadError::Io {
                path: self.path.display().to_string(),
                source,
            })?;
        tracing::debug!(bytes = bytes.len(), "Catalog source read");
        Catalog::from_reader(bytes.as_slice())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
