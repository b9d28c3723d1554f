//! Search command implementation.

use super::load_catalog;
use crate::catalog::VideoQuery;
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;

/// Run the search command.
pub fn run_search(
    query: &str,
    facets: &[String],
    location: Option<String>,
    limit: Option<usize>,
    settings: &Settings,
) -> Result<()> {
    let catalog = load_catalog(settings)?;

    let query = VideoQuery::new()
        .with_text(query)
        .with_facets(facets.iter().cloned())
        .with_location(location);

    let results = catalog.search(&query);

    if results.is_empty() {
        Output::warning("No videos match your search.");
        return Ok(());
    }

    let shown = limit.unwrap_or(results.len()).min(results.len());
    if query.is_empty() {
        Output::success(&format!("{} videos in the collection", results.len()));
    } else {
        Output::success(&format!("Found {} videos", results.len()));
    }

    for video in &results[..shown] {
        Output::video(video);
    }

    if shown < results.len() {
        println!();
        Output::info(&format!("{} more not shown (use --limit)", results.len() - shown));
    }

    Ok(())
}
