//! Message localization.
//!
//! # Data Flow
//! ```text
//! locales/<locale>.json  ({"phrase": "translation", ...})
//!     → CatalogTranslator::load_dir (startup)
//!     → Arc<dyn Translator> handed to the controller
//!     → NormalizedError::localize(translator, locale)
//! ```
//!
//! # Design Decisions
//! - The locale is resolved once from configuration, default `"en"`
//! - Missing phrases translate to themselves, like the i18n backends the
//!   API clients already expect
//! - Catalogs are immutable after load and shared read-only

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use thiserror::Error;

/// Locale used when configuration does not name one.
pub const DEFAULT_LOCALE: &str = "en";

/// Locale-aware phrase lookup.
pub trait Translator: Send + Sync {
    fn translate(&self, phrase: &str, locale: &str) -> String;
}

/// Returns every phrase unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughTranslator;

impl Translator for PassthroughTranslator {
    fn translate(&self, phrase: &str, _locale: &str) -> String {
        phrase.to_string()
    }
}

/// Error loading a translation catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalog {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// In-memory catalogs keyed by locale, then phrase.
#[derive(Debug, Clone, Default)]
pub struct CatalogTranslator {
    catalogs: HashMap<String, HashMap<String, String>>,
}

impl CatalogTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the catalog for a locale.
    pub fn with_catalog(
        mut self,
        locale: impl Into<String>,
        entries: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        self.catalogs
            .insert(locale.into(), entries.into_iter().collect());
        self
    }

    /// Load every `<locale>.json` file in a directory.
    pub fn load_dir(dir: &Path) -> Result<Self, CatalogError> {
        let io_err = |source: std::io::Error| CatalogError::Io {
            path: dir.display().to_string(),
            source,
        };

        let mut translator = Self::new();
        for entry in fs::read_dir(dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(locale) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let content = fs::read_to_string(&path).map_err(|source| CatalogError::Io {
                path: path.display().to_string(),
                source,
            })?;
            let entries: HashMap<String, String> =
                serde_json::from_str(&content).map_err(|source| CatalogError::Parse {
                    path: path.display().to_string(),
                    source,
                })?;

            tracing::debug!(locale = %locale, phrases = entries.len(), "Loaded translation catalog");
            translator.catalogs.insert(locale.to_string(), entries);
        }
        Ok(translator)
    }

    pub fn locales(&self) -> impl Iterator<Item = &str> {
        self.catalogs.keys().map(String::as_str)
    }
}

impl Translator for CatalogTranslator {
    fn translate(&self, phrase: &str, locale: &str) -> String {
        self.catalogs
            .get(locale)
            .and_then(|catalog| catalog.get(phrase))
            .cloned()
            .unwrap_or_else(|| phrase.to_string())
    }
}
