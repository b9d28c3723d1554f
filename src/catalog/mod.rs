//! Video catalog for the oral-history archive.
//!
//! The catalog is an immutable snapshot loaded once at startup. Browsing
//! and search run as pure functions over it (see [`filter`]).

pub mod filter;
mod store;

pub use filter::{
    default_visible, distinct_location_names, filter_videos, location_groups, ranked_facets,
    ranked_people, ranked_tags, VideoQuery,
};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A named place referenced by a video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    /// Latitude and longitude.
    pub coordinates: (f64, f64),
}

/// One archived oral-history video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRecord {
    /// Unique within a catalog snapshot.
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// People appearing in the video, in display order.
    #[serde(default)]
    pub interviewees: Vec<String>,
    /// Display-only duration such as "12:34".
    #[serde(rename = "duration", default)]
    pub duration_label: String,
    pub created_date: NaiveDate,
    #[serde(rename = "videoUrl", default)]
    pub media_url: String,
    #[serde(rename = "thumbnail", default)]
    pub thumbnail_url: String,
    #[serde(default)]
    pub locations: Vec<Location>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Names used for facet filtering.
    #[serde(default)]
    pub people: Vec<String>,
}

/// Every video at one named place, for map markers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationGroup {
    pub name: String,
    /// Coordinates of the first occurrence.
    pub coordinates: (f64, f64),
    /// Ids of the videos referencing this place.
    pub videos: Vec<String>,
}

/// A tag or person name with its global popularity score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetEntry {
    pub name: String,
    pub popularity: u32,
}

impl FacetEntry {
    pub fn new(name: impl Into<String>, popularity: u32) -> Self {
        Self {
            name: name.into(),
            popularity,
        }
    }
}

/// The full set of videos plus the precomputed facet rankings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub videos: Vec<VideoRecord>,
    /// Global tag popularity ranking.
    #[serde(default)]
    pub tags: Vec<FacetEntry>,
    /// Global people popularity ranking.
    #[serde(default)]
    pub people: Vec<FacetEntry>,
}

impl Catalog {
    /// Run a query against every video in the catalog.
    pub fn search(&self, query: &VideoQuery) -> Vec<&VideoRecord> {
        filter_videos(&self.videos, query)
    }

    /// Tags used by at least one video, most popular first.
    pub fn ranked_tags(&self) -> Vec<FacetEntry> {
        ranked_tags(&self.videos, &self.tags)
    }

    /// People used by at least one video, most popular first.
    pub fn ranked_people(&self) -> Vec<FacetEntry> {
        ranked_people(&self.videos, &self.people)
    }

    pub fn location_names(&self) -> Vec<String> {
        distinct_location_names(&self.videos)
    }

    pub fn location_groups(&self) -> Vec<LocationGroup> {
        location_groups(&self.videos)
    }

    pub fn get(&self, id: &str) -> Option<&VideoRecord> {
        self.videos.iter().find(|v| v.id == id)
    }
}
