//! CLI output formatting utilities.

use crate::catalog::{FacetEntry, VideoRecord};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a list item.
    pub fn list_item(msg: &str) {
        println!("  {} {}", style("*").cyan(), msg);
    }

    /// Print one catalog entry.
    pub fn video(video: &VideoRecord) {
        println!(
            "\n{} {} ({}, {}, {})",
            style(">>").green(),
            style(&video.title).bold(),
            style(&video.id).dim(),
            video.created_date.format("%Y-%m-%d"),
            video.duration_label
        );
        if !video.interviewees.is_empty() {
            println!("   {}", video.interviewees.join(", "));
        }
        if !video.description.is_empty() {
            println!("   {}", content_preview(&video.description, 200));
        }
        if !video.tags.is_empty() {
            println!("   {}", style(format!("#{}", video.tags.join(" #"))).cyan());
        }
        if !video.locations.is_empty() {
            let places: Vec<&str> = video.locations.iter().map(|l| l.name.as_str()).collect();
            println!("   {}", style(places.join(" / ")).dim());
        }
        if !video.media_url.is_empty() {
            println!("   {}", style(&video.media_url).dim());
        }
    }

    /// Print a ranked facet.
    pub fn facet(entry: &FacetEntry) {
        println!(
            "  {} {} {}",
            style("*").cyan(),
            entry.name,
            style(format!("({})", entry.popularity)).dim()
        );
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(template) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(template);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Truncate content with ellipsis, respecting character boundaries.
fn content_preview(content: &str, max_chars: usize) -> String {
    let content = content.replace('\n', " ");
    if content.chars().count() <= max_chars {
        content
    } else {
        let truncated: String = content.chars().take(max_chars).collect();
        format!("{}...", truncated)
    }
}
