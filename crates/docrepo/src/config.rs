//! Repository configuration.

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::types::{DEFAULT_TAKE, MAX_TAKE};
use crate::{Error, Result};

/// Page-size and pagination settings shared by repositories.
///
/// ## Example
///
/// ```rust
/// use docrepo::RepositoryConfig;
///
/// let config = RepositoryConfig::default().with_default_take(20);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct RepositoryConfig {
    /// Page size used when the caller does not request one (1-100)
    #[cfg_attr(
        feature = "config",
        arg(
            long = "docrepo-default-take",
            env = "DOCREPO_DEFAULT_TAKE",
            default_value = "50"
        )
    )]
    #[serde(default = "default_take")]
    pub default_take: usize,

    /// Largest page size a caller may request (1-100)
    #[cfg_attr(
        feature = "config",
        arg(
            long = "docrepo-max-take",
            env = "DOCREPO_MAX_TAKE",
            default_value = "100"
        )
    )]
    #[serde(default = "max_take")]
    pub max_take: usize,

    /// Fetch one extra row to decide whether a next page exists.
    ///
    /// When disabled, a page that comes back full is assumed to have a
    /// successor, which yields an empty trailing page when the result set
    /// ends exactly on a page boundary.
    #[cfg_attr(
        feature = "config",
        arg(
            long = "docrepo-exact-next-page",
            env = "DOCREPO_EXACT_NEXT_PAGE",
            default_value = "false"
        )
    )]
    #[serde(default)]
    pub exact_next_page: bool,
}

fn default_take() -> usize {
    DEFAULT_TAKE
}

fn max_take() -> usize {
    MAX_TAKE
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            default_take: DEFAULT_TAKE,
            max_take: MAX_TAKE,
            exact_next_page: false,
        }
    }
}

impl RepositoryConfig {
    /// Sets the default page size.
    pub fn with_default_take(mut self, take: usize) -> Self {
        self.default_take = take;
        self
    }

    /// Sets the maximum page size.
    pub fn with_max_take(mut self, take: usize) -> Self {
        self.max_take = take;
        self
    }

    /// Enables or disables exact next-page detection.
    pub fn with_exact_next_page(mut self, enabled: bool) -> Self {
        self.exact_next_page = enabled;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] unless `1 <= default_take <= max_take <= 100`.
    pub fn validate(&self) -> Result<()> {
        if self.max_take == 0 || self.max_take > MAX_TAKE {
            return Err(Error::invalid_config(format!(
                "max_take must be between 1 and {MAX_TAKE}, got {}",
                self.max_take
            )));
        }

        if self.default_take == 0 || self.default_take > self.max_take {
            return Err(Error::invalid_config(format!(
                "default_take must be between 1 and max_take ({}), got {}",
                self.max_take, self.default_take
            )));
        }

        Ok(())
    }

    /// Resolves a requested page size: the default when absent, otherwise
    /// clamped to `[1, max_take]`.
    pub fn resolve_take(&self, requested: Option<usize>) -> usize {
        requested.map_or(self.default_take, |take| {
            take.clamp(1, self.max_take.max(1))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let config = RepositoryConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.default_take, 50);
        assert_eq!(config.max_take, 100);
        assert!(!config.exact_next_page);
    }

    #[test]
    fn validate_rejects_out_of_range() {
        assert!(RepositoryConfig::default().with_max_take(101).validate().is_err());
        assert!(RepositoryConfig::default().with_max_take(0).validate().is_err());
        assert!(RepositoryConfig::default().with_default_take(0).validate().is_err());
        assert!(
            RepositoryConfig::default()
                .with_max_take(10)
                .with_default_take(20)
                .validate()
                .is_err()
        );
    }

    #[test]
    fn resolve_take_clamps() {
        let config = RepositoryConfig::default();
        assert_eq!(config.resolve_take(None), 50);
        assert_eq!(config.resolve_take(Some(0)), 1);
        assert_eq!(config.resolve_take(Some(20)), 20);
        assert_eq!(config.resolve_take(Some(500)), 100);
    }

    #[test]
    fn deserialize_fills_defaults() {
        let config: RepositoryConfig = serde_json::from_str(r#"{ "max_take": 80 }"#).unwrap();
        assert_eq!(config.default_take, 50);
        assert_eq!(config.max_take, 80);
    }
}
