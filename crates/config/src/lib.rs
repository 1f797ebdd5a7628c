//! Layered configuration.
//!
//! Sources, lowest precedence first:
//!
//! 1. built-in defaults,
//! 2. a configuration file (`folio.toml` in the working directory unless
//!    another path is given; `.yaml`, `.yml` and `.json` files work too),
//! 3. the legacy `OLContact` variable, for the contact string only,
//! 4. `FOLIO_`-prefixed environment variables, with `__` separating nested
//!    keys (`FOLIO_ENRICHMENT__QUEUE_CAPACITY=64`).

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::instrument;

pub const DEFAULT_FILE: &str = "folio.toml";
const ENV_PREFIX: &str = "FOLIO_";
const ENV_SEPARATOR: &str = "__";
const LEGACY_CONTACT_VAR: &str = "OLContact";
const DATABASE_FILE: &str = "folio.sqlite";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub library: LibraryConfig,
    pub enrichment: EnrichmentConfig,
}

/// Where books, covers and the catalogue live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Folder scanned for `.epub` archives on import.
    pub books_dir: PathBuf,
    /// Cover cache; one `<title>.jpg` per book.
    pub cache_dir: PathBuf,
    /// SQLite catalogue file.
    pub database: PathBuf,
}
impl Default for LibraryConfig {
    fn default() -> Self {
        let database = ProjectDirs::from("", "", "folio")
            .map(|dirs| dirs.data_dir().join(DATABASE_FILE))
            .unwrap_or_else(|| PathBuf::from(DATABASE_FILE));
        Self {
            books_dir: PathBuf::from("./books"),
            cache_dir: PathBuf::from("./cache/covers"),
            database,
        }
    }
}

/// Background cover enrichment against the external bibliographic service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    /// Contact string sent in the `User-Agent` of every request.
    pub contact: String,
    /// Pending books the queue holds before producers have to wait.
    pub queue_capacity: usize,
    /// Seconds the worker waits between two books.
    #[serde(rename = "pace")]
    pub pace_secs: u64,
    /// Per-request timeout, in seconds.
    #[serde(rename = "timeout")]
    pub timeout_secs: u64,
    /// Seconds a producer waits for room on a full queue before giving up.
    #[serde(rename = "enqueue_timeout")]
    pub enqueue_timeout_secs: u64,
}
impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            contact: String::new(),
            queue_capacity: 128,
            pace_secs: 3,
            timeout_secs: 5,
            enqueue_timeout_secs: 2,
        }
    }
}
impl EnrichmentConfig {
    pub fn pace(&self) -> Duration {
        Duration::from_secs(self.pace_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn enqueue_timeout(&self) -> Duration {
        Duration::from_secs(self.enqueue_timeout_secs)
    }
}

impl Config {
    /// The provider stack described in the [crate docs](crate).
    pub fn figment(file: Option<&Path>) -> Figment {
        let file = file.unwrap_or(Path::new(DEFAULT_FILE));
        let extension = file.extension().and_then(|ext| ext.to_str()).map(str::to_ascii_lowercase);
        let figment = Figment::from(Serialized::defaults(Config::default()));
        let figment = match extension.as_deref() {
            Some("yaml" | "yml") => figment.merge(Yaml::file(file)),
            Some("json") => figment.merge(Json::file(file)),
            _ => figment.merge(Toml::file(file)),
        };
        figment
            .merge(Env::raw().only(&[LEGACY_CONTACT_VAR]).map(|_| "enrichment.contact".into()))
            .merge(Env::prefixed(ENV_PREFIX).split(ENV_SEPARATOR))
    }

    /// Loads and validates the configuration.
    ///
    /// A missing file is not an error (defaults and environment still
    /// apply), an explicitly named one that doesn't exist is.
    #[instrument]
    pub fn load(file: Option<&Path>) -> Result<Self> {
        if let Some(path) = file
            && !path.exists()
        {
            tracing::error!(path = %path.display(), "Configuration file does not exist");
            exn::bail!(ErrorKind::Load);
        }
        let config: Self = Self::figment(file).extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        tracing::debug!(?config, "Configuration loaded");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.enrichment.queue_capacity == 0 {
            exn::bail!(ErrorKind::Invalid("enrichment.queue_capacity"));
        }
        if self.enrichment.timeout_secs == 0 {
            exn::bail!(ErrorKind::Invalid("enrichment.timeout"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use rstest::rstest;

    #[test]
    fn test_defaults() {
        Jail::expect_with(|_jail| {
            let config = Config::load(None).unwrap();
            assert_eq!(config.library.books_dir, PathBuf::from("./books"));
            assert_eq!(config.library.cache_dir, PathBuf::from("./cache/covers"));
            assert!(config.library.database.ends_with(DATABASE_FILE));
            assert_eq!(config.enrichment.queue_capacity, 128);
            assert_eq!(config.enrichment.pace(), Duration::from_secs(3));
            assert_eq!(config.enrichment.timeout(), Duration::from_secs(5));
            assert_eq!(config.enrichment.enqueue_timeout(), Duration::from_secs(2));
            assert_eq!(config.enrichment.contact, "");
            Ok(())
        });
    }

    #[test]
    fn test_file_then_env() {
        Jail::expect_with(|jail| {
            jail.create_file(
                DEFAULT_FILE,
                r#"
                    [library]
                    books_dir = "/srv/books"

                    [enrichment]
                    pace = 10
                    queue_capacity = 16
                "#,
            )?;
            jail.set_env("FOLIO_ENRICHMENT__PACE", "1");
            let config = Config::load(None).unwrap();
            assert_eq!(config.library.books_dir, PathBuf::from("/srv/books"));
            assert_eq!(config.library.cache_dir, PathBuf::from("./cache/covers"));
            assert_eq!(config.enrichment.queue_capacity, 16);
            assert_eq!(config.enrichment.pace_secs, 1);
            Ok(())
        });
    }

    #[test]
    fn test_explicit_yaml_file() {
        Jail::expect_with(|jail| {
            jail.create_file("custom.yaml", "enrichment:\n  timeout: 9\n")?;
            let config = Config::load(Some(Path::new("custom.yaml"))).unwrap();
            assert_eq!(config.enrichment.timeout_secs, 9);
            Ok(())
        });
    }

    #[test]
    fn test_missing_explicit_file() {
        Jail::expect_with(|_jail| {
            let err = Config::load(Some(Path::new("nope.toml"))).unwrap_err();
            assert_eq!(*err, ErrorKind::Load);
            Ok(())
        });
    }

    #[rstest]
    #[case::legacy_only(Some("legacy@example.com"), None, "legacy@example.com")]
    #[case::prefixed_only(None, Some("new@example.com"), "new@example.com")]
    #[case::prefixed_wins(Some("legacy@example.com"), Some("new@example.com"), "new@example.com")]
    fn test_contact_sources(#[case] legacy: Option<&str>, #[case] prefixed: Option<&str>, #[case] expected: &str) {
        Jail::expect_with(|jail| {
            if let Some(legacy) = legacy {
                jail.set_env(LEGACY_CONTACT_VAR, legacy);
            }
            if let Some(prefixed) = prefixed {
                jail.set_env("FOLIO_ENRICHMENT__CONTACT", prefixed);
            }
            assert_eq!(Config::load(None).unwrap().enrichment.contact, expected);
            Ok(())
        });
    }

    #[rstest]
    #[case("FOLIO_ENRICHMENT__QUEUE_CAPACITY", ErrorKind::Invalid("enrichment.queue_capacity"))]
    #[case("FOLIO_ENRICHMENT__TIMEOUT", ErrorKind::Invalid("enrichment.timeout"))]
    fn test_rejects_zero(#[case] var: &str, #[case] expected: ErrorKind) {
        Jail::expect_with(|jail| {
            jail.set_env(var, "0");
            let err = Config::load(None).unwrap_err();
            assert_eq!(*err, expected);
            Ok(())
        });
    }

    #[test]
    fn test_wrong_type() {
        Jail::expect_with(|jail| {
            jail.set_env("FOLIO_ENRICHMENT__PACE", "soon");
            assert_eq!(*Config::load(None).unwrap_err(), ErrorKind::Load);
            Ok(())
        });
    }
}
