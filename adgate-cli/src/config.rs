use adgate_filter::FilterOptions;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Contents of an `adfilter` config file.
///
/// ```toml
/// [filter]
/// max_depth = 10
/// escape_values = true
/// allowed_attributes = ["cn", "mail", "memberOf"]
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub filter: FilterOptions,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_is_default() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.filter, FilterOptions::new());
    }

    #[test]
    fn test_filter_table() {
        let config = Config::parse(
            r#"
            [filter]
            max_depth = 4
            validate_attributes = true
            allowed_attributes = ["cn", "memberOf"]
            "#,
        )
        .unwrap();
        assert_eq!(config.filter.max_depth, 4);
        assert_eq!(config.filter.max_nodes, FilterOptions::new().max_nodes);
        assert!(config.filter.validate_attributes);
        assert!(!config.filter.escape_values);
        assert_eq!(config.filter.allowed_attributes, vec!["cn", "memberOf"]);
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(Config::parse("[filter]\nmax_dept = 4\n").is_err());
        assert!(Config::parse("[server]\nport = 1\n").is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = Config::load(Path::new("/nonexistent/adfilter.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
