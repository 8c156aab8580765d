// Askama template definitions and the view models they render

use askama::Template;
use std::collections::BTreeMap;

use super::format::{emotion_badge, format_seconds, thumbnail_url, youtube_id};
use crate::models::{Clip, Face, Source};
use crate::session::SessionContext;

/// Status filter for the projects grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Processed,
    Pending,
}

impl StatusFilter {
    pub const ALL: [StatusFilter; 3] = [
        StatusFilter::All,
        StatusFilter::Processed,
        StatusFilter::Pending,
    ];

    /// Unknown values fall back to `All`
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("processed") => StatusFilter::Processed,
            Some("pending") | Some("processing") => StatusFilter::Pending,
            _ => StatusFilter::All,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusFilter::All => "all",
            StatusFilter::Processed => "processed",
            StatusFilter::Pending => "pending",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StatusFilter::All => "All",
            StatusFilter::Processed => "Processed",
            StatusFilter::Pending => "Processing",
        }
    }

    pub fn matches(&self, source: &Source) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Processed => source.processed,
            StatusFilter::Pending => !source.processed,
        }
    }
}

/// Sources matching the search text and status filter, in upstream order.
///
/// Search is a case-insensitive substring match on the URL, the id, or the
/// YouTube video id.
pub fn filter_sources<'a>(
    sources: &'a [Source],
    search: &str,
    status: StatusFilter,
) -> Vec<&'a Source> {
    let needle = search.trim().to_lowercase();

    sources
        .iter()
        .filter(|s| status.matches(s))
        .filter(|s| {
            needle.is_empty()
                || s.url.to_lowercase().contains(&needle)
                || s.id.to_string().contains(&needle)
                || youtube_id(&s.url)
                    .map(|id| id.to_lowercase().contains(&needle))
                    .unwrap_or(false)
        })
        .collect()
}

fn status_label(processed: bool) -> (&'static str, &'static str) {
    if processed {
        ("Processed", "badge-green")
    } else {
        ("Processing", "badge-yellow")
    }
}

// Only http and https URLs are safe to put in an href
fn link_target(url: &str) -> String {
    match reqwest::Url::parse(url.trim()) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => parsed.to_string(),
        _ => String::new(),
    }
}

fn time_range(time_from: f64, time_to: f64) -> String {
    format!("{} - {}", format_seconds(time_from), format_seconds(time_to))
}

// Aggregate tiles above the grid, always computed over the full fetched set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardStats {
    pub total: usize,
    pub processed: usize,
    pub pending: usize,
    pub faces: usize,
    pub total_duration: String,
}

impl DashboardStats {
    pub fn from_sources(sources: &[Source]) -> Self {
        let processed = sources.iter().filter(|s| s.processed).count();
        let seconds: f64 = sources.iter().map(Source::duration_secs).sum();

        Self {
            total: sources.len(),
            processed,
            pending: sources.len() - processed,
            faces: sources.iter().map(|s| s.faces.len()).sum(),
            total_duration: format_seconds(seconds),
        }
    }
}

// Option for the status <select>
pub struct StatusOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

impl StatusOption {
    pub fn all(current: StatusFilter) -> Vec<StatusOption> {
        StatusFilter::ALL
            .iter()
            .map(|f| StatusOption {
                value: f.as_str(),
                label: f.label(),
                selected: *f == current,
            })
            .collect()
    }
}

// Card in the projects grid (Strings instead of Options for templates)
pub struct ProjectCard {
    pub id: i64,
    pub url: String,
    pub thumbnail: String, // Empty if not a YouTube URL
    pub status_label: &'static str,
    pub status_class: &'static str,
    pub duration: String,
    pub time_range: String,
    pub face_count: usize,
}

impl From<&Source> for ProjectCard {
    fn from(source: &Source) -> Self {
        let (status_label, status_class) = status_label(source.processed);
        Self {
            id: source.id,
            url: source.url.clone(),
            thumbnail: youtube_id(&source.url)
                .map(|id| thumbnail_url(&id))
                .unwrap_or_default(),
            status_label,
            status_class,
            duration: format_seconds(source.duration_secs()),
            time_range: time_range(source.time_from, source.time_to),
            face_count: source.faces.len(),
        }
    }
}

// Average of one emotion across a face's scores
#[derive(Debug, Clone, PartialEq)]
pub struct EmotionBadge {
    pub name: String,
    pub average: String,
    pub samples: usize,
    pub class: &'static str,
}

pub struct ClipRow {
    pub time_range: String,
    pub duration: String,
    pub speaker: bool,
    pub visible: bool,
    pub score: String,
    pub transcript: String,
}

impl From<&Clip> for ClipRow {
    fn from(clip: &Clip) -> Self {
        Self {
            time_range: time_range(clip.time_from, clip.time_to),
            duration: format_seconds(clip.time_to - clip.time_from),
            speaker: clip.speaker,
            visible: clip.visible,
            score: format!("{:.2}", clip.clip_score),
            transcript: clip.transcribed.clone(),
        }
    }
}

pub struct FaceView {
    pub face_index: i64,
    pub clip_count: usize,
    pub speaking_clips: usize,
    pub visible_clips: usize,
    pub emotions: Vec<EmotionBadge>,
    pub clips: Vec<ClipRow>,
}

impl From<&Face> for FaceView {
    fn from(face: &Face) -> Self {
        let mut totals: BTreeMap<String, (f64, usize)> = BTreeMap::new();
        for score in &face.scores {
            let name = if score.score_type.is_empty() {
                "unknown".to_string()
            } else {
                score.score_type.clone()
            };
            let entry = totals.entry(name).or_insert((0.0, 0));
            entry.0 += score.score;
            entry.1 += 1;
        }

        let emotions = totals
            .into_iter()
            .map(|(name, (sum, samples))| EmotionBadge {
                class: emotion_badge(&name),
                average: format!("{:.2}", sum / samples as f64),
                samples,
                name,
            })
            .collect();

        Self {
            face_index: face.face_index,
            clip_count: face.clips.len(),
            speaking_clips: face.clips.iter().filter(|c| c.speaker).count(),
            visible_clips: face.clips.iter().filter(|c| c.visible).count(),
            emotions,
            clips: face.clips.iter().map(ClipRow::from).collect(),
        }
    }
}

pub struct ProjectDetail {
    pub id: i64,
    pub url: String,
    pub href: String,      // Empty unless the URL is http(s); rendered as text then
    pub video_id: String,  // Empty if not a YouTube URL
    pub thumbnail: String, // Empty if not a YouTube URL
    pub status_label: &'static str,
    pub status_class: &'static str,
    pub time_range: String,
    pub duration: String,
    pub user_id: String,
    pub analysis_url: String,
    pub faces: Vec<FaceView>,
}

impl From<&Source> for ProjectDetail {
    fn from(source: &Source) -> Self {
        let (status_label, status_class) = status_label(source.processed);
        let video_id = youtube_id(&source.url).unwrap_or_default();
        let thumbnail = if video_id.is_empty() {
            String::new()
        } else {
            thumbnail_url(&video_id)
        };

        Self {
            id: source.id,
            url: source.url.clone(),
            href: link_target(&source.url),
            video_id,
            thumbnail,
            status_label,
            status_class,
            time_range: time_range(source.time_from, source.time_to),
            duration: format_seconds(source.duration_secs()),
            user_id: source.user_id.clone(),
            analysis_url: format!("/analysis/{}", source.id),
            faces: source.faces.iter().map(FaceView::from).collect(),
        }
    }
}

// Login template
#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub error: String, // Empty when there is nothing to report
    pub user_name: String,
    pub version: String,
}

// Projects grid template
#[derive(Template)]
#[template(path = "projects.html")]
pub struct ProjectsTemplate {
    pub session: SessionContext,
    pub error: String, // Raw upstream error text; empty on success
    pub stats: DashboardStats,
    pub projects: Vec<ProjectCard>,
    pub search: String,
    pub statuses: Vec<StatusOption>,
}

// Project detail template
#[derive(Template)]
#[template(path = "project_detail.html")]
pub struct ProjectDetailTemplate {
    pub session: SessionContext,
    pub error: String,
    pub project: Option<ProjectDetail>,
}
