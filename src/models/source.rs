//! Source ("project") payloads returned by the Pelios API.
//!
//! These are read-only projections of the upstream response. Everything except
//! the source id is defaulted when missing so that partially processed sources
//! still render.

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    pub id: i64,
    #[serde(default)]
    pub url: String,
    /// Start of the analysed range, in seconds
    #[serde(default)]
    pub time_from: f64,
    /// End of the analysed range, in seconds
    #[serde(default)]
    pub time_to: f64,
    #[serde(default)]
    pub processed: bool,
    #[serde(default, deserialize_with = "string_or_number")]
    pub user_id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub faces: Vec<Face>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Face {
    #[serde(default)]
    pub face_id: i64,
    #[serde(default)]
    pub source_id: i64,
    #[serde(default)]
    pub face_index: i64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub clips: Vec<Clip>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub scores: Vec<Score>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clip {
    #[serde(default)]
    pub clip_id: i64,
    #[serde(default)]
    pub time_from: f64,
    #[serde(default)]
    pub time_to: f64,
    #[serde(default)]
    pub face_id: i64,
    #[serde(default)]
    pub speaker: bool,
    #[serde(default)]
    pub visible: bool,
    #[serde(default)]
    pub clip_score: f64,
    #[serde(default, deserialize_with = "string_or_number")]
    pub transcribed: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub text: Vec<TextItem>,
}

/// Transcript fragments are carried through without interpretation.
pub type TextItem = serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Score {
    #[serde(default)]
    pub score_id: i64,
    #[serde(default)]
    pub face_id: i64,
    /// Emotion name, e.g. `happy`
    #[serde(default, deserialize_with = "string_or_number")]
    pub score_type: String,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub time_index: f64,
}

impl Source {
    /// Length of the analysed range in seconds, clamped at zero
    pub fn duration_secs(&self) -> f64 {
        (self.time_to - self.time_from).max(0.0)
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}
