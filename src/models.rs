//! Page data records and the small derivations page modules make from them.

use chrono::{Datelike, NaiveDate};
use lightframe_common::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize};

/// One photo in a gallery or a cat profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    #[serde(default)]
    pub thumb: String,
    #[serde(default)]
    pub full: String,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub date: String,
    /// Display date that overrides `date` in gallery captions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imp_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera: Option<String>,
}

impl Photo {
    /// A gallery photo needs an image pair and a caption.
    pub fn is_valid(&self) -> bool {
        !self.thumb.is_empty() && !self.full.is_empty() && !self.caption.is_empty()
    }

    /// Parsed `date`, when it is a recognizable calendar date.
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        parse_date(&self.date)
    }

    /// The meta line shown under a gallery caption.
    pub fn meta_line(&self) -> String {
        let date = self
            .imp_date
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or(&self.date);
        [Some(date), self.location.as_deref(), self.camera.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" • ")
    }
}

/// Keep only displayable gallery photos.
pub fn validate_photos(photos: Vec<Photo>) -> Result<Vec<Photo>> {
    let total = photos.len();
    let valid: Vec<Photo> = photos.into_iter().filter(Photo::is_valid).collect();
    if valid.is_empty() {
        return Err(Error::validation("No valid images found in gallery data"));
    }
    if valid.len() < total {
        tracing::warn!(skipped = total - valid.len(), "skipping invalid gallery items");
    }
    Ok(valid)
}

/// A video project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub title: String,
    pub video_url: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub client: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub mdy_date: Option<String>,
    #[serde(default)]
    pub tools: Option<String>,
}

/// Where a project's video is hosted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoKind {
    YouTube,
    Vimeo,
    SelfHosted,
    Embedded,
}

impl VideoKind {
    pub fn label(self) -> &'static str {
        match self {
            VideoKind::YouTube => "YouTube Video",
            VideoKind::Vimeo => "Vimeo Video",
            VideoKind::SelfHosted => "Self-Hosted Video",
            VideoKind::Embedded => "Embedded Video",
        }
    }
}

const VIDEO_EXTENSIONS: [&str; 3] = [".mp4", ".webm", ".ogg"];

fn mentions_video_file(url: &str) -> bool {
    VIDEO_EXTENSIONS.iter().any(|ext| url.contains(ext))
}

impl Project {
    /// Served from this site and played through the custom controls.
    pub fn is_local_video(&self) -> bool {
        let url = &self.video_url;
        url.starts_with('/') || url.starts_with("./") || mentions_video_file(url)
    }

    pub fn video_kind(&self) -> VideoKind {
        let url = &self.video_url;
        if url.contains("youtube") || url.contains("youtu.be") {
            VideoKind::YouTube
        } else if url.contains("vimeo") {
            VideoKind::Vimeo
        } else if mentions_video_file(url) {
            VideoKind::SelfHosted
        } else {
            VideoKind::Embedded
        }
    }

    /// The thumbnail, or the conventional poster path derived from the
    /// video file name.
    pub fn poster(&self) -> String {
        if let Some(thumbnail) = self.thumbnail.as_deref().filter(|t| !t.is_empty()) {
            return thumbnail.to_string();
        }
        let file = self.video_url.rsplit('/').next().unwrap_or_default();
        let lower = file.to_ascii_lowercase();
        let stem = VIDEO_EXTENSIONS
            .iter()
            .find(|ext| lower.ends_with(*ext))
            .map_or(file, |ext| &file[..file.len() - ext.len()]);
        format!("assets/video/gallery/thumbs/{stem}.webp")
    }

    pub fn client_label(&self) -> &str {
        non_blank(self.client.as_deref()).unwrap_or("Personal Project")
    }

    pub fn date_label(&self) -> &str {
        non_blank(self.mdy_date.as_deref())
            .or(non_blank(self.date.as_deref()))
            .unwrap_or_default()
    }

    pub fn tools_label(&self) -> &str {
        non_blank(self.tools.as_deref()).unwrap_or("Tool Not Listed")
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// A cat profile page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatProfile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub card_thumbnail: Option<String>,
    #[serde(default, deserialize_with = "flag")]
    pub memorial: bool,
    #[serde(default)]
    pub photos: Vec<Photo>,
}

impl CatProfile {
    pub fn validate(self) -> Result<Self> {
        if self.name.trim().is_empty() {
            return Err(Error::validation("Invalid cat data format"));
        }
        Ok(self)
    }
}

/// Accepts `true`, `"true"`, and their negatives.
fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Text(s) => s.trim().eq_ignore_ascii_case("true"),
    })
}

fn sanitize(raw: Option<&str>, keep: impl Fn(char) -> bool, max: usize) -> Option<String> {
    let cleaned: String = raw?.chars().filter(|&c| keep(c)).take(max).collect();
    (!cleaned.is_empty()).then_some(cleaned)
}

/// Project ids keep `[A-Za-z0-9_-]`, at most 50 characters.
pub fn sanitize_project_id(raw: Option<&str>) -> Option<String> {
    sanitize(raw, |c| c.is_ascii_alphanumeric() || c == '-' || c == '_', 50)
}

/// Cat names keep `[A-Za-z0-9-]`.
pub fn sanitize_cat_name(raw: Option<&str>) -> Option<String> {
    sanitize(raw, |c| c.is_ascii_alphanumeric() || c == '-', usize::MAX)
}

/// Parse the date formats found in page data: ISO dates (optionally with a
/// time part) and already-formatted `Month D, YYYY`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Some(prefix) = raw.get(..10) {
        if let Ok(date) = NaiveDate::parse_from_str(prefix, "%Y-%m-%d") {
            return Some(date);
        }
    }
    ["%B %d, %Y", "%b %d, %Y", "%m/%d/%Y"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
}

/// `Month D, YYYY`, or the raw text when it is not a date.
pub fn format_photo_date(raw: &str) -> String {
    match parse_date(raw) {
        Some(date) => date.format("%B %-d, %Y").to_string(),
        None => raw.trim().to_string(),
    }
}

/// Photos grouped by year, years ascending and photos in their original
/// order. Photos without a usable date come last under `None`.
pub fn group_by_year(photos: &[Photo]) -> Vec<(Option<i32>, Vec<&Photo>)> {
    let mut groups: Vec<(Option<i32>, Vec<&Photo>)> = Vec::new();
    for photo in photos {
        let year = photo.parsed_date().map(|d| d.year());
        match groups.iter_mut().find(|(y, _)| *y == year) {
            Some((_, members)) => members.push(photo),
            None => groups.push((year, vec![photo])),
        }
    }
    groups.sort_by_key(|(year, _)| (year.is_none(), *year));
    groups
}
