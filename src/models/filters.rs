use std::collections::BTreeSet;

/// Lowest rating a movie can carry
pub const MIN_RATING: f64 = 0.0;
/// Highest rating a movie can carry
pub const MAX_RATING: f64 = 10.0;

/// True for ratings inside [`MIN_RATING`, `MAX_RATING`]; NaN is outside
pub fn in_rating_domain(rating: f64) -> bool {
    (MIN_RATING..=MAX_RATING).contains(&rating)
}

/// Inclusive bounds on the average rating
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingRange {
    pub min: f64,
    pub max: f64,
}

impl Default for RatingRange {
    fn default() -> Self {
        Self {
            min: MIN_RATING,
            max: MAX_RATING,
        }
    }
}

impl RatingRange {
    /// Builds a range, rejecting inverted or out-of-domain bounds
    pub fn new(min: f64, max: f64) -> Result<Self, String> {
        if !in_rating_domain(min) || !in_rating_domain(max) {
            return Err(format!(
                "rating bounds must lie within [{}, {}], got [{}, {}]",
                MIN_RATING, MAX_RATING, min, max
            ));
        }
        if min > max {
            return Err(format!("min rating {} is above max rating {}", min, max));
        }
        Ok(Self { min, max })
    }

    pub fn contains(&self, rating: f64) -> bool {
        self.min <= rating && rating <= self.max
    }
}

/// The predicate set a caller applies to browse, discover and recommend queries.
///
/// Every field left at its default disables that predicate. Active predicates
/// are combined with logical AND.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MovieFilter {
    /// Keep movies carrying at least one of these genres
    pub genres: BTreeSet<String>,
    /// Keep movies whose retained studio is one of these
    pub studios: BTreeSet<String>,
    /// The "popular" pseudo-option: adds the top studios to `studios`
    pub popular_studios: bool,
    pub rating_range: Option<RatingRange>,
    /// Case-insensitive title prefix
    pub search_text: Option<String>,
}

impl MovieFilter {
    /// True when no predicate is active
    pub fn is_empty(&self) -> bool {
        self.genres.is_empty()
            && self.studios.is_empty()
            && !self.popular_studios
            && self.rating_range.is_none()
            && self.search_text().is_none()
    }

    /// Search text with surrounding whitespace removed, `None` when blank
    pub fn search_text(&self) -> Option<&str> {
        self.search_text
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// A window over an ordered result list.
///
/// The caller keeps track of what it already displayed and passes the window
/// back in; nothing about previous requests is remembered server side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub offset: usize,
    pub limit: usize,
}

impl Page {
    pub fn first(limit: usize) -> Self {
        Self { offset: 0, limit }
    }

    /// Slice of `items` covered by this window
    pub fn window<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = self.offset.min(items.len());
        let end = self.offset.saturating_add(self.limit).min(items.len());
        &items[start..end]
    }

    /// Offset of the following page, `None` once the window reaches the end
    pub fn next_offset(&self, total: usize) -> Option<usize> {
        let end = self.offset.saturating_add(self.limit);
        (end < total).then_some(end)
    }
}
