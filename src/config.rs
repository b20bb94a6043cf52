use serde::Deserialize;

use crate::services::features::POPULAR_STUDIO_COUNT;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// CSV file holding the movie catalog
    #[serde(default = "default_catalog_path")]
    pub catalog_path: String,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Movies per browse page
    #[serde(default = "default_browse_page_size")]
    pub browse_page_size: usize,

    /// Movies per recommendation page
    #[serde(default = "default_recommendation_page_size")]
    pub recommendation_page_size: usize,

    /// Most similar movies considered before filters are applied
    #[serde(default = "default_recommendation_pool")]
    pub recommendation_pool: usize,

    /// Movies drawn per random discovery
    #[serde(default = "default_discover_count")]
    pub discover_count: usize,

    /// Size of the popular studio bucket
    #[serde(default = "default_popular_studio_count")]
    pub popular_studio_count: usize,

    /// Build the similarity matrix at startup instead of on first use
    #[serde(default = "default_warm_similarity")]
    pub warm_similarity: bool,
}

fn default_catalog_path() -> String {
    "./data/movies.csv".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_browse_page_size() -> usize {
    52
}

fn default_recommendation_page_size() -> usize {
    16
}

fn default_recommendation_pool() -> usize {
    100
}

fn default_discover_count() -> usize {
    8
}

fn default_popular_studio_count() -> usize {
    POPULAR_STUDIO_COUNT
}

fn default_warm_similarity() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog_path: default_catalog_path(),
            host: default_host(),
            port: default_port(),
            browse_page_size: default_browse_page_size(),
            recommendation_page_size: default_recommendation_page_size(),
            recommendation_pool: default_recommendation_pool(),
            discover_count: default_discover_count(),
            popular_studio_count: default_popular_studio_count(),
            warm_similarity: default_warm_similarity(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    /// Load configuration from explicit key/value pairs
    pub fn from_vars<I>(vars: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config: Config = envy::from_iter(vars)
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.browse_page_size == 0 || self.recommendation_page_size == 0 {
            anyhow::bail!("Page sizes must be positive");
        }
        if self.recommendation_pool == 0 {
            anyhow::bail!("RECOMMENDATION_POOL must be positive");
        }
        Ok(())
    }

    /// Address the server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_apply_when_unset() {
        let config = Config::from_vars(vars(&[])).unwrap();
        assert_eq!(config.catalog_path, "./data/movies.csv");
        assert_eq!(config.browse_page_size, 52);
        assert_eq!(config.recommendation_page_size, 16);
        assert_eq!(config.recommendation_pool, 100);
        assert_eq!(config.discover_count, 8);
        assert_eq!(config.popular_studio_count, 10);
        assert!(config.warm_similarity);
        assert_eq!(config.bind_address(), "127.0.0.1:3000");
    }

    #[test]
    fn test_overrides_from_environment_names() {
        let config = Config::from_vars(vars(&[
            ("CATALOG_PATH", "/srv/movies.csv"),
            ("PORT", "8080"),
            ("WARM_SIMILARITY", "false"),
            ("POPULAR_STUDIO_COUNT", "5"),
        ]))
        .unwrap();
        assert_eq!(config.catalog_path, "/srv/movies.csv");
        assert_eq!(config.port, 8080);
        assert!(!config.warm_similarity);
        assert_eq!(config.popular_studio_count, 5);
    }

    #[test]
    fn test_rejects_zero_page_size() {
        assert!(Config::from_vars(vars(&[("BROWSE_PAGE_SIZE", "0")])).is_err());
    }

    #[test]
    fn test_rejects_unparseable_port() {
        assert!(Config::from_vars(vars(&[("PORT", "not-a-port")])).is_err());
    }
}
