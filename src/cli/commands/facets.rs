//! Facets command implementation.

use super::load_catalog;
use crate::catalog::default_visible;
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;

/// Run the facets command.
pub fn run_facets(limit: usize, settings: &Settings) -> Result<()> {
    let catalog = load_catalog(settings)?;

    let tags = catalog.ranked_tags();
    Output::header(&format!("Tags ({})", tags.len()));
    for entry in default_visible(&tags, limit) {
        Output::facet(entry);
    }

    let people = catalog.ranked_people();
    Output::header(&format!("People ({})", people.len()));
    for entry in default_visible(&people, limit) {
        Output::facet(entry);
    }

    let locations = catalog.location_groups();
    Output::header(&format!("Locations ({})", locations.len()));
    for group in &locations {
        Output::list_item(&format!(
            "{} ({:.4}, {:.4}): {} videos",
            group.name,
            group.coordinates.0,
            group.coordinates.1,
            group.videos.len()
        ));
    }

    Ok(())
}
