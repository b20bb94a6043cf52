pub mod catalog;
pub mod features;
pub mod query;
pub mod recommendations;
pub mod similarity;

pub use catalog::{Catalog, CatalogSource, CsvCatalogSource};
pub use recommendations::RecommendationService;
