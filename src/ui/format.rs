//! Display helpers shared by the dashboard views.

use lazy_static::lazy_static;
use regex::Regex;
use reqwest::Url;

lazy_static! {
    /// YouTube video ids are URL-safe base64-ish tokens
    static ref YOUTUBE_ID_REGEX: Regex = Regex::new(r"^[A-Za-z0-9_-]+$").unwrap();
}

/// Format the span between two second offsets as `m:ss`, or `h:mm:ss` from one hour up.
/// Negative spans clamp to zero and fractional seconds are dropped.
pub fn format_duration(time_from: f64, time_to: f64) -> String {
    format_seconds(time_to - time_from)
}

/// Format a second count as `m:ss` or `h:mm:ss`
pub fn format_seconds(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.trunc() as u64
    } else {
        0
    };

    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

/// Extract the video id from a YouTube URL.
///
/// Understands `watch?v=`, `youtu.be/`, `shorts/` and `embed/` forms.
pub fn youtube_id(url: &str) -> Option<String> {
    let parsed = Url::parse(url.trim()).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();
    let host = host
        .strip_prefix("www.")
        .or_else(|| host.strip_prefix("m."))
        .unwrap_or(host.as_str());

    let mut segments = parsed.path_segments()?.filter(|s| !s.is_empty());

    let id = match host {
        "youtu.be" => segments.next().map(str::to_string),
        "youtube.com" | "youtube-nocookie.com" => match segments.next() {
            Some("watch") => parsed
                .query_pairs()
                .find(|(key, _)| key == "v")
                .map(|(_, value)| value.into_owned()),
            Some("shorts") | Some("embed") | Some("live") => segments.next().map(str::to_string),
            _ => None,
        },
        _ => None,
    }?;

    YOUTUBE_ID_REGEX.is_match(&id).then_some(id)
}

/// Thumbnail image for a YouTube video id
pub fn thumbnail_url(video_id: &str) -> String {
    format!("https://img.youtube.com/vi/{}/hqdefault.jpg", video_id)
}

/// Badge colour class for an emotion name
pub fn emotion_badge(score_type: &str) -> &'static str {
    match score_type.trim().to_ascii_lowercase().as_str() {
        "happy" | "happiness" | "joy" => "badge-green",
        "sad" | "sadness" => "badge-blue",
        "angry" | "anger" => "badge-red",
        "surprise" | "surprised" => "badge-yellow",
        "fear" | "fearful" => "badge-purple",
        "disgust" | "disgusted" => "badge-orange",
        _ => "badge-gray",
    }
}
