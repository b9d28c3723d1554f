//! CLI command implementations.

mod ask;
mod chat;
mod config;
mod facets;
mod search;
mod serve;

pub use ask::run_ask;
pub use chat::run_chat;
pub use config::run_config;
pub use facets::run_facets;
pub use search::run_search;
pub use serve::{router, run_serve, AppState};

use crate::catalog::Catalog;
use crate::config::Settings;
use anyhow::{Context, Result};

/// Load the catalog named by the settings.
pub(crate) fn load_catalog(settings: &Settings) -> Result<Catalog> {
    let path = settings.catalog_path();
    Catalog::load(&path).with_context(|| format!("Could not open catalog at {}", path.display()))
}
