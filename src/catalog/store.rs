//! Loading the catalog from its flat content file.

use super::Catalog;
use crate::error::{GriotError, Result};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info, instrument};

impl Catalog {
    /// Load a catalog from a `.yaml`, `.toml` or `.json` file.
    #[instrument]
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            GriotError::Catalog(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        let catalog = match extension.as_deref() {
            Some("yaml" | "yml") => Self::from_yaml(&content)?,
            Some("toml") => Self::from_toml(&content)?,
            Some("json") => Self::from_json(&content)?,
            _ => {
                return Err(GriotError::Catalog(format!(
                    "Unsupported catalog format: {} (expected .yaml, .toml or .json)",
                    path.display()
                )))
            }
        };

        info!(
            "Loaded {} videos, {} tags, {} people",
            catalog.videos.len(),
            catalog.tags.len(),
            catalog.people.len()
        );
        Ok(catalog)
    }

    /// Parse a catalog from YAML text.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let catalog: Catalog =
            serde_yaml::from_str(content).map_err(|e| GriotError::Catalog(e.to_string()))?;
        catalog.validated()
    }

    /// Parse a catalog from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        let catalog: Catalog =
            toml::from_str(content).map_err(|e| GriotError::Catalog(e.to_string()))?;
        catalog.validated()
    }

    /// Parse a catalog from JSON text.
    pub fn from_json(content: &str) -> Result<Self> {
        let catalog: Catalog =
            serde_json::from_str(content).map_err(|e| GriotError::Catalog(e.to_string()))?;
        catalog.validated()
    }

    /// Reject snapshots where two videos share an id.
    fn validated(self) -> Result<Self> {
        let mut seen = HashSet::new();
        for video in &self.videos {
            if !seen.insert(video.id.as_str()) {
                return Err(GriotError::Catalog(format!(
                    "Duplicate video id: {}",
                    video.id
                )));
            }
        }
        debug!("Catalog ids are unique");
        Ok(self)
    }
}
