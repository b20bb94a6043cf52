use std::collections::BTreeSet;

use serde::Deserialize;

use crate::{
    error::{AppError, AppResult},
    models::{
        filters::{MAX_RATING, MIN_RATING},
        MovieFilter, Page, RatingRange,
    },
};

/// Filter query parameters shared by browse, discover and recommend
#[derive(Debug, Default, Deserialize)]
pub struct FilterParams {
    /// Comma-separated genre tags
    pub genres: Option<String>,
    /// Comma-separated studio names
    pub studios: Option<String>,
    /// Select the popular studio bucket
    pub popular: Option<bool>,
    pub min_rating: Option<f64>,
    pub max_rating: Option<f64>,
    /// Title search text
    pub q: Option<String>,
}

impl FilterParams {
    pub fn into_filter(self) -> AppResult<MovieFilter> {
        let rating_range = match (self.min_rating, self.max_rating) {
            (None, None) => None,
            (min, max) => Some(
                RatingRange::new(min.unwrap_or(MIN_RATING), max.unwrap_or(MAX_RATING))
                    .map_err(AppError::InvalidInput)?,
            ),
        };

        Ok(MovieFilter {
            genres: split_list(self.genres.as_deref()),
            studios: split_list(self.studios.as_deref()),
            popular_studios: self.popular.unwrap_or(false),
            rating_range,
            search_text: self.q,
        })
    }
}

/// Paging query parameters
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

impl PageParams {
    pub fn into_page(self, default_limit: usize) -> AppResult<Page> {
        let limit = self.limit.unwrap_or(default_limit);
        if limit == 0 {
            return Err(AppError::InvalidInput("limit must be positive".to_string()));
        }
        Ok(Page {
            offset: self.offset.unwrap_or(0),
            limit,
        })
    }
}

fn split_list(raw: Option<&str>) -> BTreeSet<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}
