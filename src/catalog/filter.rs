//! Search and facet queries over a catalog snapshot.
//!
//! Everything here is a pure function of its arguments. Records are never
//! mutated and no state is kept between calls.

use super::{FacetEntry, LocationGroup, VideoRecord};
use std::collections::{HashMap, HashSet};

/// Criteria for [`filter_videos`].
///
/// Each criterion is a no-op when empty. Facets match with OR semantics: a
/// video passes if any selected name equals one of its tags or people.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoQuery {
    /// Case-insensitive substring searched in title, description,
    /// interviewees, tags and people.
    pub text: String,
    /// Selected tag or person names.
    pub facets: Vec<String>,
    /// Exact location name. A blank name selects no location.
    pub location: Option<String>,
}

impl VideoQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_facet(mut self, facet: impl Into<String>) -> Self {
        self.facets.push(facet.into());
        self
    }

    pub fn with_facets<I, S>(mut self, facets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.facets.extend(facets.into_iter().map(Into::into));
        self
    }

    pub fn with_location(mut self, location: Option<String>) -> Self {
        self.location = location.filter(|l| !l.trim().is_empty());
        self
    }

    /// The selected location, if it names anything.
    pub fn selected_location(&self) -> Option<&str> {
        self.location.as_deref().filter(|l| !l.trim().is_empty())
    }

    /// True when no criterion would remove any record.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.facets.is_empty() && self.selected_location().is_none()
    }
}

/// Keep the entries of `all_entries` that at least one record uses, most
/// popular first.
///
/// Entries with equal popularity keep their order from `all_entries`.
pub fn ranked_facets<F>(records: &[VideoRecord], all_entries: &[FacetEntry], pick: F) -> Vec<FacetEntry>
where
    F: Fn(&VideoRecord) -> &[String],
{
    let used: HashSet<&str> = records
        .iter()
        .flat_map(|record| pick(record).iter().map(String::as_str))
        .collect();

    let mut ranked: Vec<FacetEntry> = all_entries
        .iter()
        .filter(|entry| used.contains(entry.name.as_str()))
        .cloned()
        .collect();

    // Vec::sort_by is stable.
    ranked.sort_by(|a, b| b.popularity.cmp(&a.popularity));
    ranked
}

pub fn ranked_tags(records: &[VideoRecord], all_tags: &[FacetEntry]) -> Vec<FacetEntry> {
    ranked_facets(records, all_tags, |record| record.tags.as_slice())
}

pub fn ranked_people(records: &[VideoRecord], all_people: &[FacetEntry]) -> Vec<FacetEntry> {
    ranked_facets(records, all_people, |record| record.people.as_slice())
}

/// The first `count` entries of a ranking.
pub fn default_visible(ranked: &[FacetEntry], count: usize) -> &[FacetEntry] {
    &ranked[..count.min(ranked.len())]
}

/// Every location name referenced by any record, each once, in first-seen order.
pub fn distinct_location_names(records: &[VideoRecord]) -> Vec<String> {
    let mut seen = HashSet::new();
    records
        .iter()
        .flat_map(|record| record.locations.iter())
        .filter(|location| seen.insert(location.name.as_str()))
        .map(|location| location.name.clone())
        .collect()
}

/// Group records by location name for map display.
///
/// Groups appear in first-seen order and take the coordinates of the first
/// occurrence. Each group lists the ids of the records that reference it,
/// in record order, each id once.
pub fn location_groups(records: &[VideoRecord]) -> Vec<LocationGroup> {
    let mut groups: Vec<LocationGroup> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for record in records {
        for location in &record.locations {
            let slot = *index.entry(location.name.as_str()).or_insert_with(|| {
                groups.push(LocationGroup {
                    name: location.name.clone(),
                    coordinates: location.coordinates,
                    videos: Vec::new(),
                });
                groups.len() - 1
            });

            let videos = &mut groups[slot].videos;
            if videos.last() != Some(&record.id) {
                videos.push(record.id.clone());
            }
        }
    }

    groups
}

/// Apply `query` to `records` and return the survivors, newest first.
///
/// The date ordering is applied even for an empty query. Records created on
/// the same date keep their input order.
pub fn filter_videos<'a>(records: &'a [VideoRecord], query: &VideoQuery) -> Vec<&'a VideoRecord> {
    let needle = query.text.to_lowercase();

    let mut matches: Vec<&VideoRecord> = records
        .iter()
        .filter(|record| needle.is_empty() || matches_text(record, &needle))
        .filter(|record| query.facets.is_empty() || matches_facets(record, &query.facets))
        .filter(|record| match query.selected_location() {
            Some(location) => record.locations.iter().any(|l| l.name == location),
            None => true,
        })
        .collect();

    matches.sort_by(|a, b| b.created_date.cmp(&a.created_date));
    matches
}

/// `needle` must already be lowercase.
fn matches_text(record: &VideoRecord, needle: &str) -> bool {
    let contains = |haystack: &String| haystack.to_lowercase().contains(needle);

    contains(&record.title)
        || contains(&record.description)
        || record.interviewees.iter().any(contains)
        || record.tags.iter().any(contains)
        || record.people.iter().any(contains)
}

fn matches_facets(record: &VideoRecord, selected: &[String]) -> bool {
    selected
        .iter()
        .any(|facet| record.tags.contains(facet) || record.people.contains(facet))
}
